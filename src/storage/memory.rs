//! In-memory profile storage.
//!
//! Thread-safe implementation of the EntitlementStore trait, used by unit
//! tests and by embedders that keep entitlements elsewhere.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::{validate_user_id, EntitlementPatch, ProfileRecord};
use crate::error::Result;
use crate::storage::EntitlementStore;

/// In-memory profile store.
///
/// Profiles are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryEntitlementStore {
    profiles: RwLock<HashMap<String, ProfileRecord>>,
}

impl MemoryEntitlementStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of profiles in the store.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Clear all profiles from the store.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ProfileRecord>> {
        self.profiles.read().unwrap_or_else(|poisoned| {
            tracing::warn!("profile store lock poisoned on read, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ProfileRecord>> {
        self.profiles.write().unwrap_or_else(|poisoned| {
            tracing::warn!("profile store lock poisoned on write, recovering");
            poisoned.into_inner()
        })
    }
}

impl EntitlementStore for MemoryEntitlementStore {
    fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>> {
        Ok(self.read().get(user_id).cloned())
    }

    fn put(&self, record: &ProfileRecord) -> Result<()> {
        validate_user_id(&record.user_id)?;
        self.write()
            .insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<ProfileRecord>> {
        let mut result: Vec<ProfileRecord> = self.read().values().cloned().collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result.truncate(limit);
        Ok(result)
    }

    fn delete(&self, user_id: &str) -> Result<()> {
        self.write().remove(user_id);
        Ok(())
    }

    // Read-modify-write under one lock.
    fn apply(&self, user_id: &str, patch: &EntitlementPatch) -> Result<ProfileRecord> {
        validate_user_id(user_id)?;
        let mut profiles = self.write();
        let record = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| ProfileRecord::new(user_id));
        patch.apply_to(&mut record.entitlement);
        record.touch();
        Ok(record.clone())
    }
}
