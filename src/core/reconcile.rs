//! Daily reset reconciler.
//!
//! Brings `daily_used` and `streak` in line with the current calendar day.
//! Days are compared as stored strings, not instants: a user whose device
//! clock disagrees with the stored date sees the rollover the strings imply.

use serde::{Deserialize, Serialize};

use crate::core::calendar::previous_day;
use crate::core::entitlement::UserEntitlement;

/// What the reconciler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Already reconciled today; nothing changed.
    SameDay,
    /// Last visit was yesterday; streak extended.
    Consecutive,
    /// A day or more was missed; streak restarted.
    Gap,
    /// No previous visit on record.
    FirstVisit,
}

impl ReconcileOutcome {
    /// Check if counters were rolled over (and need persisting).
    pub fn is_rollover(&self) -> bool {
        !matches!(self, ReconcileOutcome::SameDay)
    }
}

/// Reconcile `entitlement` against `today` (`YYYY-MM-DD`).
///
/// Bonus credits are never touched.
pub fn reconcile(entitlement: &mut UserEntitlement, today: &str) -> ReconcileOutcome {
    if entitlement.last_visit_date.as_deref() == Some(today) {
        return ReconcileOutcome::SameDay;
    }

    let outcome = match entitlement.last_visit_date.as_deref() {
        None => ReconcileOutcome::FirstVisit,
        Some(last) => match previous_day(today) {
            Ok(yesterday) if last == yesterday => ReconcileOutcome::Consecutive,
            Ok(_) => ReconcileOutcome::Gap,
            Err(err) => {
                tracing::debug!(today, error = %err, "cannot step back from today, treating as gap");
                ReconcileOutcome::Gap
            }
        },
    };

    entitlement.streak = match outcome {
        ReconcileOutcome::Consecutive => entitlement.streak.saturating_add(1),
        _ => 1,
    };
    entitlement.daily_used = 0;
    entitlement.last_visit_date = Some(today.to_string());

    tracing::debug!(
        ?outcome,
        streak = entitlement.streak,
        today,
        "daily counters rolled over"
    );

    outcome
}
