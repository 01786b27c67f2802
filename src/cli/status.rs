//! Status command for studygate.
//!
//! Shows the stored counters as they are. Does not run the daily reset, so
//! a stale `daily_used` from an earlier day is reported verbatim.

use serde::Serialize;

use crate::cli::EntitlementSummary;
use crate::config::Config;
use crate::core::validate_user_id;
use crate::storage::EntitlementStore;

/// Options for the status command.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the status command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub success: bool,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<EntitlementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            found: false,
            entitlement: None,
            updated_at: None,
            error: Some(error.into()),
        }
    }
}

/// The status command implementation.
pub struct StatusCommand<S: EntitlementStore> {
    store: S,
    config: Config,
}

impl<S: EntitlementStore> StatusCommand<S> {
    /// Create a new status command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Read the stored entitlement for `user_id`.
    pub fn run(&self, user_id: &str) -> StatusOutput {
        if let Err(e) = validate_user_id(user_id) {
            return StatusOutput::failure(e.to_string());
        }

        match self.store.get(user_id) {
            Ok(Some(record)) => StatusOutput {
                success: true,
                found: true,
                entitlement: Some(EntitlementSummary::new(
                    user_id,
                    &record.entitlement,
                    &self.config.limits,
                )),
                updated_at: Some(record.updated_at.to_rfc3339()),
                error: None,
            },
            Ok(None) => StatusOutput {
                success: true,
                found: false,
                entitlement: None,
                updated_at: None,
                error: None,
            },
            Err(e) => StatusOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatusOutput, options: &StatusOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &StatusOutput) -> String {
        if !output.success {
            return format!(
                "Status failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        match &output.entitlement {
            Some(summary) => {
                let mut text = format!("{}\n", summary.format_line());
                if let Some(date) = &summary.last_visit_date {
                    text.push_str(&format!("  last visit: {}\n", date));
                }
                text
            }
            None => "No profile yet.\n".to_string(),
        }
    }
}
