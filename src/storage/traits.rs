//! Profile storage traits for studygate.
//!
//! This module defines the `EntitlementStore` trait for profile persistence.

use std::sync::Arc;

use crate::core::{EntitlementPatch, ProfileRecord};
use crate::error::Result;

/// Trait for entitlement storage backends.
///
/// Implementations hold one [`ProfileRecord`] per user and support
/// field-level patches so concurrent sessions only overwrite the fields
/// they actually changed.
pub trait EntitlementStore: Send + Sync {
    /// Retrieve a profile by user id.
    ///
    /// Returns `Ok(None)` if the user has never been seen.
    fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>>;

    /// Save a whole profile, creating or replacing it.
    fn put(&self, record: &ProfileRecord) -> Result<()>;

    /// List profiles, most recently updated first.
    fn list(&self, limit: usize) -> Result<Vec<ProfileRecord>>;

    /// Delete a profile.
    ///
    /// Returns `Ok(())` even if the profile doesn't exist.
    fn delete(&self, user_id: &str) -> Result<()>;

    /// Apply a patch to a profile, creating it with defaults if missing.
    ///
    /// Returns the record as written.
    fn apply(&self, user_id: &str, patch: &EntitlementPatch) -> Result<ProfileRecord> {
        let mut record = self
            .get(user_id)?
            .unwrap_or_else(|| ProfileRecord::new(user_id));
        patch.apply_to(&mut record.entitlement);
        record.touch();
        self.put(&record)?;
        Ok(record)
    }

    /// Check if a profile exists.
    fn exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.get(user_id)?.is_some())
    }
}

/// Blanket implementation of EntitlementStore for Arc-wrapped stores.
///
/// Lets tests keep a handle on the store a session owns.
impl<T: EntitlementStore + ?Sized> EntitlementStore for Arc<T> {
    fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        (**self).get(user_id)
    }

    fn put(&self, record: &ProfileRecord) -> Result<()> {
        (**self).put(record)
    }

    fn list(&self, limit: usize) -> Result<Vec<ProfileRecord>> {
        (**self).list(limit)
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        (**self).delete(user_id)
    }

    fn apply(&self, user_id: &str, patch: &EntitlementPatch) -> Result<ProfileRecord> {
        (**self).apply(user_id, patch)
    }
}
