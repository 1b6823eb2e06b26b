//! Caller identity: roles and the per-request session.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ROLE_ADMIN, ROLE_ATHLETE, ROLE_COACH};
use crate::error::DomainError;

/// Platform roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Coach,
    Athlete,
}

impl Role {
    /// Check if this role has superuser privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Coach => ROLE_COACH,
            Role::Athlete => ROLE_ATHLETE,
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_COACH => Ok(Role::Coach),
            ROLE_ATHLETE => Ok(Role::Athlete),
            other => Err(DomainError::validation(format!("unknown role '{}'", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated caller of a single request.
///
/// Built once by the transport layer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user_id: String,
    role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if the caller has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("COACH".parse::<Role>().unwrap(), Role::Coach);
        assert_eq!("Athlete".parse::<Role>().unwrap(), Role::Athlete);
    }

    #[test]
    fn test_role_parse_unknown() {
        assert!(matches!(
            "owner".parse::<Role>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_role_serializes_upper_case() {
        let json = serde_json::to_string(&Role::Coach).unwrap();
        assert_eq!(json, "\"COACH\"");
    }

    #[test]
    fn test_session_accessors() {
        let session = Session::new("u1", Role::Coach);
        assert_eq!(session.user_id(), "u1");
        assert_eq!(session.role(), Role::Coach);
        assert!(!session.is_admin());
    }
}
