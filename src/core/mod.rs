//! Core types and logic for studygate.
//!
//! This module contains the entitlement data model, the daily reset
//! reconciler, the credit gate and debiter, and the per-session context
//! that ties them to a store.

pub mod calendar;
pub mod debit;
pub mod entitlement;
pub mod gate;
pub mod patch;
pub mod paywall;
pub mod profile;
pub mod reconcile;
pub mod session;

pub use calendar::{format_date, parse_date, previous_day, TimezonePolicy, DATE_FORMAT};
pub use debit::{debit, DebitOutcome};
pub use entitlement::{
    AiFeature, DenyReason, GateDecision, Limits, Tier, UserEntitlement, DAILY_CAP,
    FREE_COURSE_LIMIT,
};
pub use gate::{check_course_limit, check_token_limit};
pub use patch::EntitlementPatch;
pub use paywall::{CapturedPaywall, PaywallPresenter, PaywallPrompt};
pub use profile::{validate_user_id, ProfileRecord, MAX_USER_ID_LEN};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use session::{ActionStart, EntitlementSession};
