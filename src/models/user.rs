use serde::{Deserialize, Serialize};

use crate::constants::MIN_PASSWORD_LEN;

/// Role claim attached to an account at sign-up
///
/// Owners may mutate the movie list; viewers only browse. Which emails
/// become owners is configuration, not business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Viewer,
}

/// Account record stored in redb, keyed by lowercase email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    /// Peppered SHA-256 of the password (hex)
    pub password_hash: String,
    pub role: Role,
    /// When the account was created (Unix timestamp)
    pub created_at: i64,
}

impl UserRecord {
    /// Minimal shape check on an email address
    pub fn validate_email(email: &str) -> bool {
        let trimmed = email.trim();
        match trimmed.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        }
    }

    /// Provider rule: passwords must be at least six characters
    pub fn validate_password(password: &str) -> bool {
        password.len() >= MIN_PASSWORD_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(UserRecord::validate_email("user@example.com"));
        assert!(UserRecord::validate_email("  user@example.com  "));

        assert!(!UserRecord::validate_email(""));
        assert!(!UserRecord::validate_email("userexample.com"));
        assert!(!UserRecord::validate_email("@example.com"));
        assert!(!UserRecord::validate_email("user@nodot"));
    }

    #[test]
    fn test_validate_password() {
        assert!(UserRecord::validate_password("123456"));
        assert!(UserRecord::validate_password("longer-password"));

        assert!(!UserRecord::validate_password(""));
        assert!(!UserRecord::validate_password("12345"));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"viewer\"");
    }
}
