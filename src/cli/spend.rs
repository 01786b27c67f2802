//! Spend command for studygate.
//!
//! Gates and debits one AI action, the way a feature screen does right
//! before it calls the AI backend.

use serde::Serialize;

use crate::cli::{resolve_today, EntitlementSummary};
use crate::config::Config;
use crate::core::{
    validate_user_id, ActionStart, AiFeature, CapturedPaywall, DebitOutcome, EntitlementSession,
    PaywallPrompt,
};
use crate::storage::EntitlementStore;

/// Options for the spend command.
#[derive(Debug, Clone, Default)]
pub struct SpendOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Override today's date (`YYYY-MM-DD`).
    pub today: Option<String>,
}

/// Output format for the spend command.
#[derive(Debug, Clone, Serialize)]
pub struct SpendOutput {
    pub success: bool,
    pub feature: AiFeature,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionStart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paywall: Option<PaywallPrompt>,
    /// Counters after the debit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<EntitlementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SpendOutput {
    /// Create a failed output.
    pub fn failure(feature: AiFeature, error: impl Into<String>) -> Self {
        Self {
            success: false,
            feature,
            action: None,
            paywall: None,
            entitlement: None,
            error: Some(error.into()),
        }
    }

    /// Check if the action was paywalled.
    pub fn is_denied(&self) -> bool {
        self.action.is_some_and(|a| !a.is_allowed())
    }
}

/// The spend command implementation.
pub struct SpendCommand<S: EntitlementStore + Clone> {
    store: S,
    config: Config,
}

impl<S: EntitlementStore + Clone> SpendCommand<S> {
    /// Create a new spend command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Start one `feature` action for `user_id`.
    pub fn run(&self, user_id: &str, feature: AiFeature, options: &SpendOptions) -> SpendOutput {
        if let Err(e) = validate_user_id(user_id) {
            return SpendOutput::failure(feature, e.to_string());
        }
        let today = match resolve_today(&self.config, options.today.as_deref()) {
            Ok(today) => today,
            Err(e) => return SpendOutput::failure(feature, e.to_string()),
        };

        let mut session = EntitlementSession::new(self.store.clone(), user_id, self.config.limits);
        session.start(&today);

        let paywall = CapturedPaywall::new();
        let action = session.begin_ai_action(feature, &paywall);

        SpendOutput {
            success: true,
            feature,
            action: Some(action),
            paywall: paywall.take(),
            entitlement: session
                .entitlement()
                .map(|e| EntitlementSummary::new(user_id, e, session.limits())),
            error: None,
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SpendOutput, options: &SpendOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &SpendOutput) -> String {
        if !output.success {
            return format!(
                "Spend failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if let Some(prompt) = &output.paywall {
            return format!("{}\n{}\n", prompt.headline, prompt.message);
        }

        let charged = match output.action {
            Some(ActionStart::Proceed { debit }) => debit,
            _ => DebitOutcome::Untracked,
        };
        let line = match charged {
            DebitOutcome::Daily => format!("{}: used 1 daily credit", output.feature),
            DebitOutcome::Bonus => format!("{}: used 1 bonus credit", output.feature),
            DebitOutcome::Unlimited => format!("{}: unlimited", output.feature),
            DebitOutcome::Untracked => format!("{}: not tracked this session", output.feature),
            DebitOutcome::Exhausted => format!("{}: no credit left to charge", output.feature),
        };

        match &output.entitlement {
            Some(summary) => format!("{}\n{}\n", line, summary.format_line()),
            None => format!("{}\n", line),
        }
    }
}
