//! Check command for studygate.
//!
//! Asks the credit gate whether an action may start, without spending
//! anything.

use serde::Serialize;

use crate::cli::resolve_today;
use crate::config::Config;
use crate::core::{
    validate_user_id, CapturedPaywall, EntitlementSession, GateDecision, PaywallPresenter,
    PaywallPrompt,
};
use crate::storage::EntitlementStore;

/// Which gate to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTarget {
    /// Gate before an AI action.
    Token,
    /// Gate before creating a course, given how many exist already.
    Course { current_count: u32 },
}

/// Options for the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Override today's date (`YYYY-MM-DD`).
    pub today: Option<String>,
}

/// Output format for the check command.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub success: bool,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<GateDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paywall: Option<PaywallPrompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckOutput {
    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            loaded: false,
            decision: None,
            paywall: None,
            error: Some(error.into()),
        }
    }

    /// Check if the gate said no.
    pub fn is_denied(&self) -> bool {
        self.decision.is_some_and(|d| !d.allowed)
    }
}

/// The check command implementation.
pub struct CheckCommand<S: EntitlementStore + Clone> {
    store: S,
    config: Config,
}

impl<S: EntitlementStore + Clone> CheckCommand<S> {
    /// Create a new check command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the gate for `user_id`.
    pub fn run(&self, user_id: &str, target: CheckTarget, options: &CheckOptions) -> CheckOutput {
        if let Err(e) = validate_user_id(user_id) {
            return CheckOutput::failure(e.to_string());
        }
        let today = match resolve_today(&self.config, options.today.as_deref()) {
            Ok(today) => today,
            Err(e) => return CheckOutput::failure(e.to_string()),
        };

        let mut session = EntitlementSession::new(self.store.clone(), user_id, self.config.limits);
        session.start(&today);

        let paywall = CapturedPaywall::new();
        let decision = match target {
            CheckTarget::Token => {
                let decision = session.check_token_limit();
                if let Some(reason) = decision.reason {
                    paywall.present(&PaywallPrompt::new(reason, None));
                }
                decision
            }
            CheckTarget::Course { current_count } => {
                session.begin_course_creation(current_count, &paywall)
            }
        };

        CheckOutput {
            success: true,
            loaded: session.is_loaded(),
            decision: Some(decision),
            paywall: paywall.take(),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CheckOutput, options: &CheckOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &CheckOutput) -> String {
        if !output.success {
            return format!(
                "Check failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        match (&output.decision, &output.paywall) {
            (Some(decision), Some(prompt)) if !decision.allowed => {
                format!("Denied ({}): {}\n{}\n", prompt.reason, prompt.headline, prompt.message)
            }
            _ if !output.loaded => "Allowed (profile unavailable).\n".to_string(),
            _ => "Allowed.\n".to_string(),
        }
    }
}
