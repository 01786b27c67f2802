//! Users command for studygate.
//!
//! Lists stored profiles, most recently updated first.

use serde::Serialize;

use crate::cli::EntitlementSummary;
use crate::config::Config;
use crate::storage::EntitlementStore;

/// Default number of profiles to list.
pub const DEFAULT_LIMIT: usize = 20;

/// Options for the users command.
#[derive(Debug, Clone)]
pub struct UsersOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum profiles to show.
    pub limit: usize,
}

impl Default for UsersOptions {
    fn default() -> Self {
        Self {
            json: false,
            quiet: false,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Output format for the users command.
#[derive(Debug, Clone, Serialize)]
pub struct UsersOutput {
    pub success: bool,
    pub users: Vec<EntitlementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The users command implementation.
pub struct UsersCommand<S: EntitlementStore> {
    store: S,
    config: Config,
}

impl<S: EntitlementStore> UsersCommand<S> {
    /// Create a new users command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// List up to `options.limit` profiles.
    pub fn run(&self, options: &UsersOptions) -> UsersOutput {
        match self.store.list(options.limit) {
            Ok(records) => UsersOutput {
                success: true,
                users: records
                    .iter()
                    .map(|r| EntitlementSummary::new(&r.user_id, &r.entitlement, &self.config.limits))
                    .collect(),
                error: None,
            },
            Err(e) => UsersOutput {
                success: false,
                users: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &UsersOutput, options: &UsersOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Listing failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.users.is_empty() {
            return "No profiles.\n".to_string();
        }

        let mut text = String::new();
        for user in &output.users {
            text.push_str(&user.format_line());
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProfileRecord, Tier, UserEntitlement};
    use crate::storage::MemoryEntitlementStore;

    #[test]
    fn test_list_users() {
        let store = MemoryEntitlementStore::new();
        store.put(&ProfileRecord::new("alice")).unwrap();
        store
            .put(&ProfileRecord::with_entitlement(
                "bob",
                UserEntitlement::with_tier(Tier::Pro),
            ))
            .unwrap();
        let cmd = UsersCommand::new(store, Config::default());

        let output = cmd.run(&UsersOptions::default());

        assert!(output.success);
        let mut ids: Vec<_> = output.users.iter().map(|u| u.user_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["alice", "bob"]);

        let text = cmd.format_output(&output, &UsersOptions::default());
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_list_respects_limit() {
        let store = MemoryEntitlementStore::new();
        for id in ["a", "b", "c"] {
            store.put(&ProfileRecord::new(id)).unwrap();
        }
        let cmd = UsersCommand::new(store, Config::default());

        let output = cmd.run(&UsersOptions {
            limit: 2,
            ..Default::default()
        });

        assert_eq!(output.users.len(), 2);
    }

    #[test]
    fn test_empty_listing() {
        let cmd = UsersCommand::new(MemoryEntitlementStore::new(), Config::default());
        let output = cmd.run(&UsersOptions::default());
        assert_eq!(
            cmd.format_output(&output, &UsersOptions::default()),
            "No profiles.\n"
        );
    }
}
