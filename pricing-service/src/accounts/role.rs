//! Account roles
//!
//! Three roles are built in. Anything else is a custom role and must carry a
//! human label (`custom_role`). The label is stored next to the role for
//! every account, built-in roles included, so it lives on the account rather
//! than inside [`Role`].

use std::fmt;

/// Longest accepted role name
pub const ROLE_MAX_LENGTH: usize = 20;

/// Longest accepted custom role label
pub const CUSTOM_ROLE_MAX_LENGTH: usize = 50;

/// Error reported on `role` when a custom role has no label
pub const CUSTOM_ROLE_REQUIRED: &str = "For custom roles, please provide a custom_role value";

/// Account role
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Administrator; implies staff and superuser flags
    Admin,
    /// Buyer
    Buyer,
    /// Supplier
    Supplier,
    /// Free-form role, raw text as submitted
    Custom(String),
}

impl Role {
    /// Build a role from request input
    ///
    /// Names are matched exactly. A non-enumerated name needs a non-blank
    /// `custom_role`; enumerated names accept one but do not need it.
    pub fn parse(role: &str, custom_role: Option<&str>) -> Result<Self, &'static str> {
        match role {
            "admin" | "buyer" | "supplier" => Ok(Self::from_column(role.to_string())),
            other => match custom_role.map(str::trim) {
                Some(label) if !label.is_empty() => Ok(Role::Custom(other.to_string())),
                _ => Err(CUSTOM_ROLE_REQUIRED),
            },
        }
    }

    /// Rebuild a role from the stored `role` column
    pub fn from_column(role: String) -> Self {
        match role.as_str() {
            "admin" => Role::Admin,
            "buyer" => Role::Buyer,
            "supplier" => Role::Supplier,
            _ => Role::Custom(role),
        }
    }

    /// Value of the `role` column
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Buyer => "buyer",
            Role::Supplier => "supplier",
            Role::Custom(name) => name,
        }
    }

    /// Whether this role grants staff and superuser flags
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
