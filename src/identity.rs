//! Session principal held client-side.
//!
//! DESIGN
//! ======
//! `user_id == 0` is the one canonical "no session" state. Every field is
//! defaulted on the wire because the backend's login payload is a user DTO
//! that may or may not carry `role`, and stored snapshots written by older
//! clients may lack the profile fields.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel user id meaning "not logged in".
pub const ANONYMOUS_USER_ID: i64 = 0;

// =============================================================================
// ROLE
// =============================================================================

/// Role granted to a principal. Compared case-sensitively with route
/// requirements, so `"admin"` is an unrecognized role, not `Admin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Admin,
    /// Any role string the client does not know about.
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "USER" => Self::User,
            "ADMIN" => Self::Admin,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// The authenticated principal, as returned by `GET /login`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub wallet: f64,
}

impl Identity {
    /// The empty identity representing "not logged in".
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id != ANONYMOUS_USER_ID
    }

    /// Name shown in greetings: full name when known, else the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.firstname.trim(), self.lastname.trim());
        let full = full.trim();
        if full.is_empty() { self.email.clone() } else { full.to_owned() }
    }
}
