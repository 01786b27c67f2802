//! Tier command for studygate.
//!
//! Sets a profile's tier, standing in for the billing webhook. The profile
//! must already exist.

use serde::Serialize;

use crate::core::{validate_user_id, EntitlementPatch, ProfileRecord, Tier};
use crate::error::{Result, StudyGateError};
use crate::storage::EntitlementStore;

/// Options for the tier command.
#[derive(Debug, Clone, Default)]
pub struct TierOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the tier command.
#[derive(Debug, Clone, Serialize)]
pub struct TierOutput {
    pub success: bool,
    pub user_id: String,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The tier command implementation.
pub struct TierCommand<S: EntitlementStore> {
    store: S,
}

impl<S: EntitlementStore> TierCommand<S> {
    /// Create a new tier command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Set `user_id` to `tier`.
    pub fn run(&self, user_id: &str, tier: Tier) -> TierOutput {
        match self.set_tier(user_id, tier) {
            Ok(record) => {
                tracing::info!(user_id, tier = %record.entitlement.tier, "tier updated");
                TierOutput {
                    success: true,
                    user_id: user_id.to_string(),
                    tier: record.entitlement.tier,
                    error: None,
                }
            }
            Err(e) => TierOutput {
                success: false,
                user_id: user_id.to_string(),
                tier,
                error: Some(e.to_string()),
            },
        }
    }

    fn set_tier(&self, user_id: &str, tier: Tier) -> Result<ProfileRecord> {
        validate_user_id(user_id)?;
        if !self.store.exists(user_id)? {
            return Err(StudyGateError::profile_not_found(user_id));
        }
        self.store.apply(user_id, &EntitlementPatch::tier(tier))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &TierOutput, options: &TierOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!("{} is now on the {} tier.\n", output.user_id, output.tier)
        } else {
            format!(
                "Tier change failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
