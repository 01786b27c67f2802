//! Paywall trigger contract.
//!
//! The paywall itself is UI. The engine only decides when to show it and
//! with which reason; a [`PaywallPresenter`] receives that prompt.

use std::cell::RefCell;

use serde::Serialize;

use crate::core::entitlement::{AiFeature, DenyReason};

/// What the paywall should say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaywallPrompt {
    /// Why the action was blocked.
    pub reason: DenyReason,
    /// The feature the user tried to use, if it was an AI action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<AiFeature>,
    /// One-line title.
    pub headline: String,
    /// Body text.
    pub message: String,
}

impl PaywallPrompt {
    /// Build the stock prompt for a denial.
    pub fn new(reason: DenyReason, feature: Option<AiFeature>) -> Self {
        let (headline, message) = match reason {
            DenyReason::TokenLimit => (
                "You're out of AI credits for today",
                "Free accounts get a daily allowance that refills at midnight. \
                 Upgrade to Pro for unlimited AI help.",
            ),
            DenyReason::CourseLimit => (
                "Course limit reached",
                "Free accounts can track one course. Upgrade to Pro to add more.",
            ),
        };
        Self {
            reason,
            feature,
            headline: headline.to_string(),
            message: message.to_string(),
        }
    }
}

/// Receives paywall triggers.
pub trait PaywallPresenter {
    /// Show the paywall.
    fn present(&self, prompt: &PaywallPrompt);
}

/// Presenter that keeps the last prompt for the caller to render later.
#[derive(Debug, Default)]
pub struct CapturedPaywall {
    last: RefCell<Option<PaywallPrompt>>,
}

impl CapturedPaywall {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the captured prompt, if any.
    pub fn take(&self) -> Option<PaywallPrompt> {
        self.last.borrow_mut().take()
    }

    /// Check whether a prompt is waiting.
    pub fn is_triggered(&self) -> bool {
        self.last.borrow().is_some()
    }
}

impl PaywallPresenter for CapturedPaywall {
    fn present(&self, prompt: &PaywallPrompt) {
        *self.last.borrow_mut() = Some(prompt.clone());
    }
}
