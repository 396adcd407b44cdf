//! Password strength rules
//!
//! Registration runs every candidate password through a [`PasswordPolicy`].
//! The default policy applies four checks and reports every failure, not only
//! the first:
//!
//! - similarity to the username or email
//! - minimum length
//! - membership in a list of common passwords
//! - entirely numeric

use std::collections::HashSet;

/// Account attributes a password is compared against
#[derive(Debug, Clone, Copy)]
pub struct UserAttributes<'a> {
    /// Requested username
    pub username: &'a str,
    /// Requested email address
    pub email: &'a str,
}

/// Pluggable password strength policy
pub trait PasswordPolicy: Send + Sync {
    /// Return one message per failed rule; empty means the password is acceptable
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Vec<String>;
}

/// Similarity ratio at or above which a password is rejected
const MAX_SIMILARITY: f64 = 0.7;

const COMMON_PASSWORDS: &[&str] = &[
    "123456", "password", "12345678", "qwerty", "123456789", "12345", "1234", "111111",
    "1234567", "dragon", "123123", "baseball", "abc123", "football", "monkey", "letmein",
    "696969", "shadow", "master", "666666", "qwertyuiop", "123321", "mustang", "1234567890",
    "michael", "654321", "superman", "1qaz2wsx", "7777777", "121212", "000000", "qazwsx",
    "123qwe", "killer", "trustno1", "jordan", "jennifer", "zxcvbnm", "asdfgh", "hunter",
    "buster", "soccer", "harley", "batman", "andrew", "tigger", "sunshine", "iloveyou",
    "2000", "charlie", "robert", "thomas", "hockey", "ranger", "daniel", "starwars",
    "klaster", "112233", "george", "computer", "michelle", "jessica", "pepper", "1111",
    "zxcvbn", "555555", "11111111", "131313", "freedom", "777777", "pass", "maggie",
    "159753", "aaaaaa", "ginger", "princess", "joshua", "cheese", "amanda", "summer",
    "love", "ashley", "nicole", "chelsea", "biteme", "matthew", "access", "yankees",
    "987654321", "dallas", "austin", "thunder", "taylor", "matrix", "password1",
    "password123", "welcome", "welcome1", "admin", "admin123", "administrator", "root",
    "toor", "changeme", "secret", "passw0rd", "p@ssw0rd", "qwerty123", "qwerty1",
    "iloveyou1", "letmein1", "football1", "baseball1", "abcdef", "abcd1234", "1q2w3e4r",
    "1q2w3e4r5t", "zaq12wsx", "asdfghjkl", "qweasdzxc", "default", "guest", "login",
];

/// Default policy: similarity, length, common list and numeric checks
#[derive(Debug, Clone)]
pub struct DefaultPasswordPolicy {
    min_length: usize,
    common: HashSet<&'static str>,
}

impl DefaultPasswordPolicy {
    /// Create the default policy with the given minimum length
    pub fn new(min_length: usize) -> Self {
        Self {
            min_length,
            common: COMMON_PASSWORDS.iter().copied().collect(),
        }
    }

    fn similarity_errors(&self, password: &str, user: &UserAttributes<'_>) -> Option<String> {
        let password = password.to_lowercase();
        let attributes = [("username", user.username), ("email address", user.email)];

        for (label, value) in attributes {
            if value.is_empty() {
                continue;
            }
            let value = value.to_lowercase();
            let mut parts: Vec<&str> = value
                .split(|c: char| !c.is_alphanumeric() && c != '_')
                .filter(|part| !part.is_empty())
                .collect();
            parts.push(value.as_str());

            if parts
                .iter()
                .any(|part| similarity_ratio(&password, part) >= MAX_SIMILARITY)
            {
                return Some(format!("The password is too similar to the {}.", label));
            }
        }
        None
    }
}

impl Default for DefaultPasswordPolicy {
    fn default() -> Self {
        Self::new(8)
    }
}

impl PasswordPolicy for DefaultPasswordPolicy {
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(error) = self.similarity_errors(password, user) {
            errors.push(error);
        }

        if password.chars().count() < self.min_length {
            let unit = if self.min_length == 1 { "character" } else { "characters" };
            errors.push(format!(
                "This password is too short. It must contain at least {} {}.",
                self.min_length, unit
            ));
        }

        if self.common.contains(password.trim().to_lowercase().as_str()) {
            errors.push("This password is too common.".to_string());
        }

        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            errors.push("This password is entirely numeric.".to_string());
        }

        errors
    }
}

/// Ratio of matching characters, `2 * M / T`
///
/// `M` is found by repeatedly taking the longest common block and recursing
/// on both sides of it, the same measure difflib-style matchers report.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + len..], &b[start_b + len..])
}

fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // Row of run lengths ending at (i, j)
    let mut previous = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut current = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                let run = previous[j] + 1;
                current[j + 1] = run;
                if run > best.2 {
                    best = (i + 1 - run, j + 1 - run, run);
                }
            }
        }
        previous = current;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserAttributes<'static> {
        UserAttributes {
            username: "alice",
            email: "alice@example.com",
        }
    }

    #[test]
    fn test_strong_password_passes() {
        let policy = DefaultPasswordPolicy::default();
        assert!(policy.validate("Tr0ub4dor&3-horse", &user()).is_empty());
    }

    #[test]
    fn test_short_password() {
        let policy = DefaultPasswordPolicy::default();
        let errors = policy.validate("x9#kQ", &user());
        assert_eq!(
            errors,
            vec!["This password is too short. It must contain at least 8 characters."]
        );
    }

    #[test]
    fn test_common_and_numeric_reported_together() {
        let policy = DefaultPasswordPolicy::default();
        let errors = policy.validate("12345678", &user());
        assert!(errors.contains(&"This password is too common.".to_string()));
        assert!(errors.contains(&"This password is entirely numeric.".to_string()));
    }

    #[test]
    fn test_similar_to_username() {
        let policy = DefaultPasswordPolicy::default();
        let errors = policy.validate("alice123", &user());
        assert!(errors.contains(&"The password is too similar to the username.".to_string()));
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity_ratio("abcd", "abcd"), 1.0);
        assert_eq!(similarity_ratio("abcd", "wxyz"), 0.0);
        assert_eq!(similarity_ratio("abcd", "bcde"), 0.75);
    }

    #[test]
    fn test_configurable_min_length() {
        let policy = DefaultPasswordPolicy::new(12);
        let errors = policy.validate("Zebra#Lamp9", &user());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least 12 characters"));
    }
}
