//! Credit debiter.
//!
//! Consumes one unit of entitlement when a gated action begins. The daily
//! allowance is always spent before the bonus pool.

use serde::{Deserialize, Serialize};

use crate::core::entitlement::{Limits, UserEntitlement};
use crate::core::patch::EntitlementPatch;

/// Which pool paid for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitOutcome {
    /// Pro tier; nothing consumed.
    Unlimited,
    /// One unit of the daily allowance.
    Daily,
    /// One bonus credit.
    Bonus,
    /// Nothing left to take. Only reachable if the gate was skipped or raced.
    Exhausted,
    /// Entitlement not loaded yet; nothing recorded.
    Untracked,
}

impl DebitOutcome {
    /// The store write that makes this debit durable, if any.
    pub fn patch(&self, entitlement: &UserEntitlement) -> Option<EntitlementPatch> {
        match self {
            DebitOutcome::Daily => Some(EntitlementPatch::daily_tokens(entitlement.daily_used)),
            DebitOutcome::Bonus => Some(EntitlementPatch::bonus_credits(
                entitlement.bonus_credits,
            )),
            DebitOutcome::Unlimited | DebitOutcome::Exhausted | DebitOutcome::Untracked => None,
        }
    }
}

/// Consume one unit from `entitlement` in place.
pub fn debit(entitlement: &mut UserEntitlement, limits: &Limits) -> DebitOutcome {
    if entitlement.tier.is_unlimited() {
        return DebitOutcome::Unlimited;
    }
    if entitlement.daily_used < limits.daily_cap {
        entitlement.daily_used += 1;
        return DebitOutcome::Daily;
    }
    if entitlement.bonus_credits > 0 {
        entitlement.bonus_credits -= 1;
        return DebitOutcome::Bonus;
    }
    tracing::debug!("debit with nothing left to consume, ignoring");
    DebitOutcome::Exhausted
}
