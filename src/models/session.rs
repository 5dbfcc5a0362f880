use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Session record stored in redb, keyed by token hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub email: String,
    pub role: Role,
    /// When the session was opened (Unix timestamp)
    pub created_at: i64,
    /// When the session stops resolving (Unix timestamp)
    pub expires_at: i64,
}

impl SessionRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Identity resolved from a bearer token, passed to handlers that need it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub email: String,
    pub role: Role,
}

impl SessionContext {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expiry() {
        let session = SessionRecord {
            email: "user@example.com".to_string(),
            role: Role::Viewer,
            created_at: 1_000_000,
            expires_at: 1_086_400,
        };

        assert!(!session.is_expired(1_000_000));
        assert!(!session.is_expired(1_086_399));
        assert!(session.is_expired(1_086_400));
    }

    #[test]
    fn test_owner_check() {
        let owner = SessionContext {
            email: "owner@example.com".to_string(),
            role: Role::Owner,
        };
        let viewer = SessionContext {
            email: "viewer@example.com".to_string(),
            role: Role::Viewer,
        };

        assert!(owner.is_owner());
        assert!(!viewer.is_owner());
    }
}
