//! Registration and credential checks
//!
//! Registration validates in two passes. Field rules run first and report
//! every failing field. The role/custom_role rule only runs once all fields
//! are individually valid. Admin accounts are created like any other and then
//! elevated in a separate step.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

use super::model::{Account, NewAccount};
use super::repository::{AccountRepository, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use super::role::{Role, CUSTOM_ROLE_MAX_LENGTH, ROLE_MAX_LENGTH};
use crate::auth::policy::{PasswordPolicy, UserAttributes};
use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::input::{is_valid_email, Fields, TextRule, INVALID_EMAIL};
use crate::responses::FieldErrors;

/// Longest accepted username
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Longest accepted email address
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Login lookup failed
pub const USER_NOT_FOUND: &str = "User not found";

/// Login password mismatch
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";
const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, \
                                numbers, and @/./+/-/_ characters.";

/// Letters, digits and `@.+-_`, as Unicode word characters
static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+\z").expect("username regex is valid"));

/// A validated registration request
#[derive(Debug, Clone)]
pub struct Registration {
    /// Requested username
    pub username: String,
    /// Requested email
    pub email: String,
    /// Plaintext password, already checked against the policy
    pub password: String,
    /// Parsed role
    pub role: Role,
    /// Role label, kept for every role
    pub custom_role: Option<String>,
}

/// Validated login input
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Email to look up
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Account workflows shared by the HTTP handlers and the CLI
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    hasher: PasswordHasher,
    policy: Arc<dyn PasswordPolicy>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    /// Create the service
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: PasswordHasher,
        policy: Arc<dyn PasswordPolicy>,
    ) -> Self {
        Self {
            accounts,
            hasher,
            policy,
        }
    }

    /// Underlying repository
    pub fn accounts(&self) -> &Arc<dyn AccountRepository> {
        &self.accounts
    }

    /// Validate a registration payload
    pub async fn validate_registration(&self, payload: &Map<String, Value>) -> Result<Registration> {
        let mut fields = Fields::new(payload);

        let username = fields.text(
            "username",
            TextRule::required().max_length(USERNAME_MAX_LENGTH),
        );
        let email = fields.text("email", TextRule::required().max_length(EMAIL_MAX_LENGTH));
        let password = fields.text("password", TextRule::required().untrimmed());
        let role = fields.text("role", TextRule::required().max_length(ROLE_MAX_LENGTH));
        let custom_role = fields.nullable_text("custom_role", CUSTOM_ROLE_MAX_LENGTH);

        if let Some(name) = username.as_deref() {
            if !is_valid_username(name) {
                fields.error("username", INVALID_USERNAME);
            } else if self.accounts.find_by_username(name).await?.is_some() {
                fields.error("username", USERNAME_TAKEN);
            }
        }

        if let Some(address) = email.as_deref() {
            if !is_valid_email(address) {
                fields.error("email", INVALID_EMAIL);
            } else if self.accounts.find_by_email(address).await?.is_some() {
                fields.error("email", EMAIL_TAKEN);
            }
        }

        if let Some(candidate) = password.as_deref() {
            let user = UserAttributes {
                username: username.as_deref().unwrap_or_default(),
                email: email.as_deref().unwrap_or_default(),
            };
            for message in self.policy.validate(candidate, &user) {
                fields.error("password", message);
            }
        }

        fields.finish()?;

        // All fields are present and valid past this point
        let (Some(username), Some(email), Some(password), Some(role)) =
            (username, email, password, role)
        else {
            return Err(Error::Internal(
                "registration fields missing after validation".to_string(),
            ));
        };

        let role = Role::parse(&role, custom_role.as_deref())
            .map_err(|message| Error::field("role", message))?;

        Ok(Registration {
            username,
            email,
            password,
            role,
            custom_role,
        })
    }

    /// Validate and persist a registration
    pub async fn register(&self, payload: &Map<String, Value>) -> Result<Account> {
        let registration = self.validate_registration(payload).await?;
        self.create_account(registration).await
    }

    /// Persist a validated registration, elevating admins afterwards
    pub async fn create_account(&self, registration: Registration) -> Result<Account> {
        let password_hash = self.hash(registration.password).await?;

        let account = self
            .accounts
            .create(NewAccount {
                username: registration.username,
                email: registration.email,
                password_hash,
                role: registration.role,
                custom_role: registration.custom_role,
            })
            .await
            .map_err(unique_violation_to_field_error)?;

        tracing::info!(
            account_id = account.id,
            username = %account.username,
            role = %account.role,
            "Account created"
        );

        if account.role.is_admin() {
            let elevated = self.accounts.elevate(account.id).await?;
            tracing::info!(account_id = elevated.id, "Account elevated to staff and superuser");
            return Ok(elevated);
        }

        Ok(account)
    }

    /// Create the bootstrap administrator unless the username is taken
    ///
    /// Returns `None` when an account with that username already exists.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        if self.accounts.find_by_username(username).await?.is_some() {
            return Ok(None);
        }

        let mut errors = FieldErrors::new();
        if !is_valid_username(username) {
            errors.add("username", INVALID_USERNAME);
        }
        if !is_valid_email(email) {
            errors.add("email", INVALID_EMAIL);
        }
        if password.is_empty() {
            errors.add("password", crate::input::BLANK);
        }
        errors.into_result()?;

        let account = self
            .create_account(Registration {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: Role::Admin,
                custom_role: None,
            })
            .await?;
        Ok(Some(account))
    }

    /// Validate a login payload
    pub fn validate_credentials(&self, payload: &Map<String, Value>) -> Result<Credentials> {
        let mut fields = Fields::new(payload);
        let email = fields.text("email", TextRule::required());
        let password = fields.text("password", TextRule::required().untrimmed());

        if let Some(address) = email.as_deref() {
            if !is_valid_email(address) {
                fields.error("email", INVALID_EMAIL);
            }
        }
        fields.finish()?;

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(Error::Internal(
                "login fields missing after validation".to_string(),
            )),
        }
    }

    /// Check credentials
    ///
    /// Unknown email is a 404 and a wrong password a 401, so the response
    /// reveals whether an address is registered.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Account> {
        let Some(account) = self.accounts.find_by_email(&credentials.email).await? else {
            tracing::warn!("Login attempt for unknown email");
            return Err(Error::NotFound(USER_NOT_FOUND.to_string()));
        };

        let hasher = self.hasher.clone();
        let password = credentials.password.clone();
        let hash = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))??;

        if !matches {
            tracing::warn!(account_id = account.id, "Login attempt with wrong password");
            return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!(account_id = account.id, "Login successful");
        Ok(account)
    }

    async fn hash(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
    }
}

/// Letters, digits and `@ . + - _`
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_PATTERN.is_match(username)
}

fn unique_violation_to_field_error(err: Error) -> Error {
    match &err {
        Error::Database(db) if db.is_constraint_violation() => match db.context.as_deref() {
            Some(USERNAME_CONSTRAINT) => Error::field("username", USERNAME_TAKEN),
            Some(EMAIL_CONSTRAINT) => Error::field("email", EMAIL_TAKEN),
            _ => err,
        },
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repository::MemoryAccountRepository;
    use crate::auth::config::PasswordConfig;
    use crate::auth::policy::DefaultPasswordPolicy;
    use serde_json::json;

    fn service() -> AccountService {
        let hasher = PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
            min_password_length: 8,
        })
        .unwrap();
        AccountService::new(
            Arc::new(MemoryAccountRepository::new()),
            hasher,
            Arc::new(DefaultPasswordPolicy::default()),
        )
    }

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    fn validation_errors(result: Result<impl std::fmt::Debug>) -> FieldErrors {
        match result {
            Err(Error::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_buyer() {
        let service = service();
        let account = service
            .register(&payload(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "Lantern#Orbit42",
                "role": "buyer"
            })))
            .await
            .unwrap();

        assert_eq!(account.role, Role::Buyer);
        assert!(!account.is_staff);
        assert!(!account.is_superuser);
        assert_ne!(account.password_hash, "Lantern#Orbit42");
    }

    #[tokio::test]
    async fn test_register_admin_is_elevated() {
        let service = service();
        let account = service
            .register(&payload(json!({
                "username": "boss",
                "email": "boss@example.com",
                "password": "Lantern#Orbit42",
                "role": "admin"
            })))
            .await
            .unwrap();

        assert!(account.is_staff);
        assert!(account.is_superuser);
    }

    #[tokio::test]
    async fn test_register_reports_all_missing_fields() {
        let errors = validation_errors(service().register(&payload(json!({}))).await);
        for field in ["username", "email", "password", "role"] {
            assert_eq!(
                errors.get(field),
                Some(&["This field is required.".to_string()][..]),
                "{field}"
            );
        }
        assert!(!errors.contains("custom_role"));
    }

    #[tokio::test]
    async fn test_custom_role_needs_label() {
        let service = service();
        let errors = validation_errors(
            service
                .register(&payload(json!({
                    "username": "carol",
                    "email": "carol@example.com",
                    "password": "Lantern#Orbit42",
                    "role": "contractor"
                })))
                .await,
        );
        assert_eq!(
            errors.get("role"),
            Some(&["For custom roles, please provide a custom_role value".to_string()][..])
        );

        let account = service
            .register(&payload(json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "Lantern#Orbit42",
                "role": "contractor",
                "custom_role": "Freelancer"
            })))
            .await
            .unwrap();
        assert_eq!(account.role, Role::Custom("contractor".to_string()));
        assert_eq!(account.custom_role.as_deref(), Some("Freelancer"));
    }

    #[tokio::test]
    async fn test_builtin_role_keeps_label() {
        let service = service();
        let account = service
            .register(&payload(json!({
                "username": "erin",
                "email": "erin@example.com",
                "password": "Lantern#Orbit42",
                "role": "buyer",
                "custom_role": "  Regional buyer "
            })))
            .await
            .unwrap();
        assert_eq!(account.role, Role::Buyer);
        assert_eq!(account.custom_role.as_deref(), Some("Regional buyer"));

        let stored = service
            .accounts()
            .find_by_email("erin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.custom_role.as_deref(), Some("Regional buyer"));

        let blank = service
            .register(&payload(json!({
                "username": "frank",
                "email": "frank@example.com",
                "password": "Lantern#Orbit42",
                "role": "supplier",
                "custom_role": ""
            })))
            .await
            .unwrap();
        assert_eq!(blank.custom_role, None);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let service = service();
        let body = json!({
            "username": "dave",
            "email": "dave@example.com",
            "password": "Lantern#Orbit42",
            "role": "supplier"
        });
        service.register(&payload(body.clone())).await.unwrap();

        let errors = validation_errors(service.register(&payload(body)).await);
        assert_eq!(errors.get("username"), Some(&[USERNAME_TAKEN.to_string()][..]));
        assert_eq!(errors.get("email"), Some(&[EMAIL_TAKEN.to_string()][..]));
    }

    #[tokio::test]
    async fn test_weak_password_and_bad_email() {
        let errors = validation_errors(
            service()
                .register(&payload(json!({
                    "username": "erin",
                    "email": "not-an-email",
                    "password": "123",
                    "role": "buyer"
                })))
                .await,
        );
        assert_eq!(errors.get("email"), Some(&[INVALID_EMAIL.to_string()][..]));
        let password_errors = errors.get("password").unwrap();
        assert!(password_errors.iter().any(|m| m.contains("too short")));
        assert!(password_errors.iter().any(|m| m.contains("entirely numeric")));
    }

    #[tokio::test]
    async fn test_invalid_username_characters() {
        let errors = validation_errors(
            service()
                .register(&payload(json!({
                    "username": "bad name!",
                    "email": "frank@example.com",
                    "password": "Lantern#Orbit42",
                    "role": "buyer"
                })))
                .await,
        );
        assert_eq!(errors.get("username"), Some(&[INVALID_USERNAME.to_string()][..]));
    }

    #[test]
    fn test_username_pattern() {
        assert!(is_valid_username("jane.doe+ops@corp_1-a"));
        assert!(is_valid_username("zoë"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("bad name"));
        assert!(!is_valid_username("bad/name"));
        assert!(!is_valid_username("trailing\n"));
    }

    #[tokio::test]
    async fn test_register_accepts_ip_literal_email() {
        let account = service()
            .register(&payload(json!({
                "username": "hank",
                "email": "hank@[127.0.0.1]",
                "password": "Lantern#Orbit42",
                "role": "supplier"
            })))
            .await
            .unwrap();
        assert_eq!(account.email, "hank@[127.0.0.1]");
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = service();
        service
            .register(&payload(json!({
                "username": "gina",
                "email": "gina@example.com",
                "password": "Lantern#Orbit42",
                "role": "buyer"
            })))
            .await
            .unwrap();

        let ok = Credentials {
            email: "gina@example.com".into(),
            password: "Lantern#Orbit42".into(),
        };
        assert_eq!(service.authenticate(&ok).await.unwrap().username, "gina");

        let wrong = Credentials {
            email: "gina@example.com".into(),
            password: "nope-nope-nope".into(),
        };
        assert!(matches!(
            service.authenticate(&wrong).await,
            Err(Error::Unauthorized(msg)) if msg == INVALID_CREDENTIALS
        ));

        let unknown = Credentials {
            email: "nobody@example.com".into(),
            password: "Lantern#Orbit42".into(),
        };
        assert!(matches!(
            service.authenticate(&unknown).await,
            Err(Error::NotFound(msg)) if msg == USER_NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_validate_credentials_shape() {
        let service = service();
        let errors = validation_errors(
            service.validate_credentials(&payload(json!({"email": "nope"}))),
        );
        assert_eq!(errors.get("email"), Some(&[INVALID_EMAIL.to_string()][..]));
        assert!(errors.contains("password"));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let service = service();
        let created = service
            .ensure_admin("admin", "admin@gmail.com", "admin")
            .await
            .unwrap()
            .unwrap();
        assert!(created.is_superuser);
        assert_eq!(created.role, Role::Admin);

        assert!(service
            .ensure_admin("admin", "admin@gmail.com", "admin")
            .await
            .unwrap()
            .is_none());
    }
}
