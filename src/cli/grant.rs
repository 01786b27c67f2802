//! Grant command for studygate.
//!
//! Adds bonus credits to a profile, standing in for a purchase or reward
//! flow.

use serde::Serialize;

use crate::core::{validate_user_id, EntitlementPatch};
use crate::error::Result;
use crate::storage::EntitlementStore;

/// Options for the grant command.
#[derive(Debug, Clone, Default)]
pub struct GrantOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the grant command.
#[derive(Debug, Clone, Serialize)]
pub struct GrantOutput {
    pub success: bool,
    pub user_id: String,
    pub granted: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_credits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The grant command implementation.
pub struct GrantCommand<S: EntitlementStore> {
    store: S,
}

impl<S: EntitlementStore> GrantCommand<S> {
    /// Create a new grant command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Add `amount` bonus credits to `user_id`, creating the profile if needed.
    pub fn run(&self, user_id: &str, amount: u32) -> GrantOutput {
        match self.grant(user_id, amount) {
            Ok(balance) => GrantOutput {
                success: true,
                user_id: user_id.to_string(),
                granted: amount,
                bonus_credits: Some(balance),
                error: None,
            },
            Err(e) => GrantOutput {
                success: false,
                user_id: user_id.to_string(),
                granted: 0,
                bonus_credits: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn grant(&self, user_id: &str, amount: u32) -> Result<u32> {
        validate_user_id(user_id)?;
        let record = self
            .store
            .apply(user_id, &EntitlementPatch::add_bonus(amount))?;
        let balance = record.entitlement.bonus_credits;
        tracing::info!(user_id, amount, balance, "bonus credits granted");
        Ok(balance)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &GrantOutput, options: &GrantOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!(
                "Granted {} bonus credit(s) to {} (balance {}).\n",
                output.granted,
                output.user_id,
                output.bonus_credits.unwrap_or(0)
            )
        } else {
            format!(
                "Grant failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProfileRecord, UserEntitlement};
    use crate::storage::MemoryEntitlementStore;
    use std::sync::Arc;

    #[test]
    fn test_grant_creates_and_accumulates() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let cmd = GrantCommand::new(Arc::clone(&store));

        assert_eq!(cmd.run("alice", 3).bonus_credits, Some(3));
        assert_eq!(cmd.run("alice", 2).bonus_credits, Some(5));
        assert_eq!(
            store.get("alice").unwrap().unwrap().entitlement.bonus_credits,
            5
        );
    }

    #[test]
    fn test_grant_saturates() {
        let store = Arc::new(MemoryEntitlementStore::new());
        store
            .put(&ProfileRecord::with_entitlement(
                "alice",
                UserEntitlement {
                    bonus_credits: u32::MAX - 1,
                    ..Default::default()
                },
            ))
            .unwrap();
        let cmd = GrantCommand::new(Arc::clone(&store));

        assert_eq!(cmd.run("alice", 10).bonus_credits, Some(u32::MAX));
    }

    #[test]
    fn test_grant_keeps_other_fields() {
        let store = Arc::new(MemoryEntitlementStore::new());
        store
            .put(&ProfileRecord::with_entitlement(
                "alice",
                UserEntitlement {
                    daily_used: 3,
                    streak: 7,
                    last_visit_date: Some("2024-01-01".to_string()),
                    ..Default::default()
                },
            ))
            .unwrap();
        let cmd = GrantCommand::new(Arc::clone(&store));

        cmd.run("alice", 1);

        let ent = store.get("alice").unwrap().unwrap().entitlement;
        assert_eq!((ent.daily_used, ent.streak, ent.bonus_credits), (3, 7, 1));
    }

    #[test]
    fn test_concurrent_grants_and_debits_all_land() {
        let store = Arc::new(MemoryEntitlementStore::new());
        store.put(&ProfileRecord::new("alice")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        GrantCommand::new(store).run("alice", 1);
                    } else {
                        store
                            .apply("alice", &EntitlementPatch::daily_tokens(1))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ent = store.get("alice").unwrap().unwrap().entitlement;
        assert_eq!((ent.bonus_credits, ent.daily_used), (4, 1));
    }

    #[test]
    fn test_grant_rejects_invalid_user() {
        let cmd = GrantCommand::new(MemoryEntitlementStore::new());

        let output = cmd.run("../etc", 1);

        assert!(!output.success);
        assert!(cmd
            .format_output(&output, &GrantOptions::default())
            .starts_with("Grant failed"));
    }
}
