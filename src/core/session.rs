//! Per-session entitlement context.
//!
//! One `EntitlementSession` is created per authenticated session and passed
//! to every feature that spends credits. It runs the daily reset once,
//! answers gate checks from its in-memory copy, and persists debits without
//! ever failing the caller.
//!
//! Until the profile has loaded, every check allows and every debit is a
//! no-op. A paying user must never be blocked because the store is slow or
//! down.

use serde::Serialize;

use crate::core::debit::{debit, DebitOutcome};
use crate::core::entitlement::{AiFeature, DenyReason, GateDecision, Limits, UserEntitlement};
use crate::core::gate;
use crate::core::paywall::{PaywallPresenter, PaywallPrompt};
use crate::core::patch::EntitlementPatch;
use crate::core::reconcile::{reconcile, ReconcileOutcome};
use crate::error::FailOpen;
use crate::storage::EntitlementStore;

/// Result of trying to start a credit-consuming action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStart {
    /// Go ahead; this is what was charged.
    Proceed { debit: DebitOutcome },
    /// Abort before calling the AI backend; the paywall has been shown.
    Paywalled { reason: DenyReason },
}

impl ActionStart {
    /// Check if the caller may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, ActionStart::Proceed { .. })
    }
}

/// Entitlement state for one authenticated session.
#[derive(Debug)]
pub struct EntitlementSession<S: EntitlementStore> {
    store: S,
    user_id: String,
    limits: Limits,
    /// `None` until the profile fetch succeeds.
    entitlement: Option<UserEntitlement>,
    /// Set once the daily reset has run for this session.
    reconciled: Option<ReconcileOutcome>,
}

impl<S: EntitlementStore> EntitlementSession<S> {
    /// Create a session for `user_id`. Nothing is loaded until [`start`].
    ///
    /// [`start`]: EntitlementSession::start
    pub fn new(store: S, user_id: impl Into<String>, limits: Limits) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            limits,
            entitlement: None,
            reconciled: None,
        }
    }

    /// Session-start hook: load the profile and run the daily reset.
    ///
    /// Runs the reset at most once per session; later calls return the
    /// first outcome. If the profile cannot be fetched the session stays
    /// unloaded (fail-open) and `None` is returned; calling again retries.
    pub fn start(&mut self, today: &str) -> Option<ReconcileOutcome> {
        if let Some(outcome) = self.reconciled {
            tracing::debug!(user_id = %self.user_id, "session already reconciled");
            return Some(outcome);
        }

        let mut entitlement = match self.store.get(&self.user_id) {
            Ok(Some(record)) => record.entitlement,
            Ok(None) => {
                tracing::debug!(user_id = %self.user_id, "no profile yet, starting fresh");
                UserEntitlement::new()
            }
            Err(err) => {
                tracing::warn!(
                    user_id = %self.user_id,
                    error = %err,
                    "failed to load entitlement (fail-open: gating disabled)"
                );
                return None;
            }
        };

        let outcome = reconcile(&mut entitlement, today);
        if outcome.is_rollover() {
            self.persist(&EntitlementPatch::rollover(&entitlement), "persisting daily reset");
        }

        tracing::debug!(
            user_id = %self.user_id,
            ?outcome,
            tier = %entitlement.tier,
            daily_used = entitlement.daily_used,
            bonus_credits = entitlement.bonus_credits,
            streak = entitlement.streak,
            "session started"
        );

        self.entitlement = Some(entitlement);
        self.reconciled = Some(outcome);
        Some(outcome)
    }

    /// Check if the profile has loaded.
    pub fn is_loaded(&self) -> bool {
        self.entitlement.is_some()
    }

    /// The in-memory entitlement, if loaded.
    pub fn entitlement(&self) -> Option<&UserEntitlement> {
        self.entitlement.as_ref()
    }

    /// The user this session belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Limits in force for this session.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Outcome of the daily reset, if it has run.
    pub fn reconcile_outcome(&self) -> Option<ReconcileOutcome> {
        self.reconciled
    }

    /// Gate check before any AI action.
    pub fn check_token_limit(&self) -> GateDecision {
        match &self.entitlement {
            Some(entitlement) => gate::check_token_limit(entitlement, &self.limits),
            None => GateDecision::allow(),
        }
    }

    /// Gate check before creating a course.
    pub fn check_course_limit(&self, current_course_count: u32) -> GateDecision {
        match &self.entitlement {
            Some(entitlement) => {
                gate::check_course_limit(entitlement, current_course_count, &self.limits)
            }
            None => GateDecision::allow(),
        }
    }

    /// Consume one credit. Call right after an allowing check.
    ///
    /// The in-memory counter changes first; the store write that follows is
    /// best effort and never reported to the caller.
    pub fn increment_token_usage(&mut self) -> DebitOutcome {
        let Some(entitlement) = self.entitlement.as_mut() else {
            return DebitOutcome::Untracked;
        };

        let outcome = debit(entitlement, &self.limits);
        if let Some(patch) = outcome.patch(entitlement) {
            self.persist(&patch, "persisting credit debit");
        }

        tracing::debug!(user_id = %self.user_id, ?outcome, "credit debited");
        outcome
    }

    /// Gate, and on success debit, before an AI action.
    ///
    /// On denial the paywall is presented and nothing is charged; the caller
    /// must not contact the AI backend.
    pub fn begin_ai_action(
        &mut self,
        feature: AiFeature,
        paywall: &dyn PaywallPresenter,
    ) -> ActionStart {
        let decision = self.check_token_limit();
        if let Some(reason) = decision.reason.filter(|_| !decision.allowed) {
            tracing::debug!(user_id = %self.user_id, %feature, %reason, "AI action paywalled");
            paywall.present(&PaywallPrompt::new(reason, Some(feature)));
            return ActionStart::Paywalled { reason };
        }

        let debit = self.increment_token_usage();
        ActionStart::Proceed { debit }
    }

    /// Gate before creating a course; presents the paywall on denial.
    pub fn begin_course_creation(
        &self,
        current_course_count: u32,
        paywall: &dyn PaywallPresenter,
    ) -> GateDecision {
        let decision = self.check_course_limit(current_course_count);
        if let Some(reason) = decision.reason.filter(|_| !decision.allowed) {
            paywall.present(&PaywallPrompt::new(reason, None));
        }
        decision
    }

    fn persist(&self, patch: &EntitlementPatch, context: &str) {
        self.store
            .apply(&self.user_id, patch)
            .map(|_| ())
            .fail_open_default(context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::entitlement::Tier;
    use crate::core::paywall::CapturedPaywall;
    use crate::core::profile::ProfileRecord;
    use crate::storage::traits::tests::FlakyStore;
    use crate::storage::MemoryEntitlementStore;

    fn store_with(user_id: &str, entitlement: UserEntitlement) -> Arc<MemoryEntitlementStore> {
        let store = Arc::new(MemoryEntitlementStore::new());
        store
            .put(&ProfileRecord::with_entitlement(user_id, entitlement))
            .unwrap();
        store
    }

    fn session(store: &Arc<MemoryEntitlementStore>) -> EntitlementSession<Arc<MemoryEntitlementStore>> {
        EntitlementSession::new(Arc::clone(store), "alice", Limits::default())
    }

    #[test]
    fn test_start_creates_profile_on_first_visit() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let mut session = session(&store);

        assert_eq!(session.start("2024-01-01"), Some(ReconcileOutcome::FirstVisit));

        let stored = store.get("alice").unwrap().unwrap();
        assert_eq!(stored.entitlement.streak, 1);
        assert_eq!(stored.entitlement.daily_used, 0);
        assert_eq!(stored.entitlement.last_visit_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_start_rolls_over_and_persists() {
        let store = store_with(
            "alice",
            UserEntitlement {
                daily_used: 5,
                bonus_credits: 2,
                last_visit_date: Some("2024-01-01".to_string()),
                streak: 3,
                ..Default::default()
            },
        );
        let mut session = session(&store);

        assert_eq!(session.start("2024-01-02"), Some(ReconcileOutcome::Consecutive));

        let ent = session.entitlement().unwrap();
        assert_eq!((ent.daily_used, ent.streak, ent.bonus_credits), (0, 4, 2));

        let stored = store.get("alice").unwrap().unwrap().entitlement;
        assert_eq!(stored, *ent);
    }

    #[test]
    fn test_start_runs_once_per_session() {
        let store = store_with(
            "alice",
            UserEntitlement {
                last_visit_date: Some("2024-01-01".to_string()),
                streak: 3,
                ..Default::default()
            },
        );
        let mut session = session(&store);

        session.start("2024-01-02");
        assert_eq!(session.start("2024-01-03"), Some(ReconcileOutcome::Consecutive));

        assert_eq!(session.entitlement().unwrap().streak, 4);
        assert_eq!(
            session.entitlement().unwrap().last_visit_date.as_deref(),
            Some("2024-01-02")
        );
    }

    #[test]
    fn test_same_day_sessions_keep_usage() {
        let store = Arc::new(MemoryEntitlementStore::new());

        let mut first = session(&store);
        first.start("2024-01-01");
        first.increment_token_usage();
        first.increment_token_usage();

        let mut second = session(&store);
        assert_eq!(second.start("2024-01-01"), Some(ReconcileOutcome::SameDay));
        assert_eq!(second.entitlement().unwrap().daily_used, 2);
        assert_eq!(second.entitlement().unwrap().streak, 1);
    }

    #[test]
    fn test_unloaded_session_fails_open() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let mut session = session(&store);

        assert!(!session.is_loaded());
        assert!(session.check_token_limit().allowed);
        assert!(session.check_course_limit(10).allowed);
        assert_eq!(session.increment_token_usage(), DebitOutcome::Untracked);
        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_failure_fails_open_and_can_retry() {
        let store = Arc::new(FlakyStore::new());
        store
            .inner
            .put(&ProfileRecord::with_entitlement(
                "alice",
                UserEntitlement {
                    daily_used: 5,
                    last_visit_date: Some("2024-01-01".to_string()),
                    ..Default::default()
                },
            ))
            .unwrap();
        store.set_fail_reads(true);

        let mut session =
            EntitlementSession::new(Arc::clone(&store), "alice", Limits::default());
        assert_eq!(session.start("2024-01-01"), None);
        assert!(!session.is_loaded());
        assert!(session.check_token_limit().allowed);

        store.set_fail_reads(false);
        assert_eq!(session.start("2024-01-01"), Some(ReconcileOutcome::SameDay));
        assert!(!session.check_token_limit().allowed);
    }

    #[test]
    fn test_write_failures_keep_in_memory_counters() {
        let store = Arc::new(FlakyStore::new());
        store.set_fail_writes(true);

        let mut session =
            EntitlementSession::new(Arc::clone(&store), "alice", Limits::default());
        assert_eq!(session.start("2024-01-01"), Some(ReconcileOutcome::FirstVisit));
        assert_eq!(session.increment_token_usage(), DebitOutcome::Daily);

        let ent = session.entitlement().unwrap();
        assert_eq!(ent.daily_used, 1);
        assert_eq!(ent.streak, 1);
        assert!(store.inner.is_empty());
    }

    #[test]
    fn test_debit_persists_only_touched_field() {
        let store = store_with(
            "alice",
            UserEntitlement {
                daily_used: 5,
                bonus_credits: 3,
                last_visit_date: Some("2024-01-01".to_string()),
                streak: 2,
                ..Default::default()
            },
        );
        let mut session = session(&store);
        session.start("2024-01-01");

        // Another device bumps the streak behind our back.
        store
            .apply(
                "alice",
                &EntitlementPatch {
                    streak: Some(9),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(session.increment_token_usage(), DebitOutcome::Bonus);

        let stored = store.get("alice").unwrap().unwrap().entitlement;
        assert_eq!(stored.bonus_credits, 2);
        assert_eq!(stored.streak, 9);
    }

    #[test]
    fn test_five_gated_actions_then_paywall() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let mut session = session(&store);
        session.start("2024-01-01");
        let paywall = CapturedPaywall::new();

        for _ in 0..5 {
            assert!(session.check_token_limit().allowed);
            let start = session.begin_ai_action(AiFeature::Chat, &paywall);
            assert_eq!(start, ActionStart::Proceed { debit: DebitOutcome::Daily });
        }
        assert_eq!(session.entitlement().unwrap().daily_used, 5);
        assert!(!paywall.is_triggered());

        let decision = session.check_token_limit();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenyReason::TokenLimit));

        let start = session.begin_ai_action(AiFeature::Quiz, &paywall);
        assert_eq!(start, ActionStart::Paywalled { reason: DenyReason::TokenLimit });
        assert!(!start.is_allowed());

        let prompt = paywall.take().unwrap();
        assert_eq!(prompt.reason, DenyReason::TokenLimit);
        assert_eq!(prompt.feature, Some(AiFeature::Quiz));
        assert_eq!(store.get("alice").unwrap().unwrap().entitlement.daily_used, 5);
    }

    #[test]
    fn test_bonus_spent_after_daily() {
        let store = store_with(
            "alice",
            UserEntitlement {
                daily_used: 4,
                bonus_credits: 3,
                last_visit_date: Some("2024-01-01".to_string()),
                ..Default::default()
            },
        );
        let mut session = session(&store);
        session.start("2024-01-01");

        assert_eq!(session.increment_token_usage(), DebitOutcome::Daily);
        assert_eq!(session.increment_token_usage(), DebitOutcome::Bonus);

        let stored = store.get("alice").unwrap().unwrap().entitlement;
        assert_eq!((stored.daily_used, stored.bonus_credits), (5, 2));
    }

    #[test]
    fn test_pro_user_never_paywalled() {
        let store = store_with(
            "alice",
            UserEntitlement {
                tier: Tier::Pro,
                daily_used: 5,
                last_visit_date: Some("2024-01-01".to_string()),
                ..Default::default()
            },
        );
        let mut session = session(&store);
        session.start("2024-01-01");
        let paywall = CapturedPaywall::new();

        for feature in AiFeature::ALL {
            let start = session.begin_ai_action(feature, &paywall);
            assert_eq!(start, ActionStart::Proceed { debit: DebitOutcome::Unlimited });
        }
        assert!(session.begin_course_creation(3, &paywall).allowed);
        assert!(!paywall.is_triggered());
    }

    #[test]
    fn test_course_creation_paywall() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let mut session = session(&store);
        session.start("2024-01-01");
        let paywall = CapturedPaywall::new();

        assert!(session.begin_course_creation(0, &paywall).allowed);
        assert!(!paywall.is_triggered());

        let decision = session.begin_course_creation(1, &paywall);
        assert_eq!(decision, GateDecision::deny(DenyReason::CourseLimit));
        assert_eq!(paywall.take().unwrap().reason, DenyReason::CourseLimit);
    }

    #[test]
    fn test_unloaded_session_never_paywalls() {
        let store = Arc::new(MemoryEntitlementStore::new());
        let mut session = session(&store);
        let paywall = CapturedPaywall::new();

        let start = session.begin_ai_action(AiFeature::EssayGrade, &paywall);
        assert_eq!(start, ActionStart::Proceed { debit: DebitOutcome::Untracked });
        assert!(session.begin_course_creation(5, &paywall).allowed);
        assert!(!paywall.is_triggered());
    }
}
