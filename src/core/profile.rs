//! Stored profile row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entitlement::UserEntitlement;
use crate::error::{Result, StudyGateError};

/// Longest accepted user id.
pub const MAX_USER_ID_LEN: usize = 128;

/// One user's persisted entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Owner of the profile.
    pub user_id: String,
    /// Counters, tier and streak.
    #[serde(flatten)]
    pub entitlement: UserEntitlement,
    /// When the row was first written.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Create a record with a fresh free-tier entitlement.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_entitlement(user_id, UserEntitlement::new())
    }

    /// Create a record around an existing entitlement.
    pub fn with_entitlement(user_id: impl Into<String>, entitlement: UserEntitlement) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            entitlement,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the record's updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Check that a user id is usable as a profile key (and file name).
///
/// Accepts 1..=128 ASCII alphanumerics, `-` and `_`.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let ok = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StudyGateError::invalid_user_id(user_id))
    }
}
