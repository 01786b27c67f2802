//! Credit gate.
//!
//! Pure allow/deny checks consulted immediately before a credit-consuming
//! action. No I/O and no caching: callers re-check before every action and
//! surface the paywall themselves on denial.

use crate::core::entitlement::{DenyReason, GateDecision, Limits, UserEntitlement};

/// Check whether one more AI action may start.
///
/// Pro always passes. Free passes while the daily allowance lasts, then
/// while any bonus credit remains.
pub fn check_token_limit(entitlement: &UserEntitlement, limits: &Limits) -> GateDecision {
    if entitlement.tier.is_unlimited() {
        return GateDecision::allow();
    }
    if entitlement.daily_used < limits.daily_cap {
        return GateDecision::allow();
    }
    if entitlement.bonus_credits > 0 {
        return GateDecision::allow();
    }
    GateDecision::deny(DenyReason::TokenLimit)
}

/// Check whether a new course may be created given how many the user owns.
pub fn check_course_limit(
    entitlement: &UserEntitlement,
    current_course_count: u32,
    limits: &Limits,
) -> GateDecision {
    if entitlement.tier.is_unlimited() {
        return GateDecision::allow();
    }
    if current_course_count >= limits.free_course_limit {
        return GateDecision::deny(DenyReason::CourseLimit);
    }
    GateDecision::allow()
}
