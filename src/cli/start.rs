//! Start command for studygate.
//!
//! Runs the session-start hook: loads the profile, applies the daily reset
//! and reports the reconciled counters.

use serde::Serialize;

use crate::cli::{resolve_today, EntitlementSummary};
use crate::config::Config;
use crate::core::{validate_user_id, EntitlementSession, ReconcileOutcome};
use crate::storage::EntitlementStore;

/// Options for the start command.
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Override today's date (`YYYY-MM-DD`).
    pub today: Option<String>,
}

/// Output format for the start command.
#[derive(Debug, Clone, Serialize)]
pub struct StartOutput {
    pub success: bool,
    /// Whether the profile loaded (false means gating is off this session).
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ReconcileOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<EntitlementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StartOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            loaded: false,
            today: None,
            outcome: None,
            entitlement: None,
            error: Some(error.into()),
        }
    }
}

/// The start command implementation.
pub struct StartCommand<S: EntitlementStore + Clone> {
    store: S,
    config: Config,
}

impl<S: EntitlementStore + Clone> StartCommand<S> {
    /// Create a new start command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the session-start hook for `user_id`.
    pub fn run(&self, user_id: &str, options: &StartOptions) -> StartOutput {
        if let Err(e) = validate_user_id(user_id) {
            return StartOutput::failure(e.to_string());
        }
        let today = match resolve_today(&self.config, options.today.as_deref()) {
            Ok(today) => today,
            Err(e) => return StartOutput::failure(e.to_string()),
        };

        let mut session = EntitlementSession::new(self.store.clone(), user_id, self.config.limits);
        let outcome = session.start(&today);

        StartOutput {
            success: true,
            loaded: session.is_loaded(),
            today: Some(today),
            outcome,
            entitlement: session
                .entitlement()
                .map(|e| EntitlementSummary::new(user_id, e, session.limits())),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StartOutput, options: &StartOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &StartOutput) -> String {
        if !output.success {
            return format!(
                "Start failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let Some(summary) = &output.entitlement else {
            return "Profile unavailable; AI features are ungated for this session.\n".to_string();
        };

        let headline = match output.outcome {
            Some(ReconcileOutcome::SameDay) => "Welcome back.",
            Some(ReconcileOutcome::Consecutive) => "New day, streak extended.",
            Some(ReconcileOutcome::Gap) => "New day, streak restarted.",
            Some(ReconcileOutcome::FirstVisit) | None => "Welcome!",
        };
        format!("{}\n{}\n", headline, summary.format_line())
    }
}
