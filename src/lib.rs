//! studygate - freemium usage gate for AI study features
//!
//! Tracks a daily allowance of AI actions plus a bonus credit balance per
//! user, resets the allowance at the day boundary, keeps a visit streak, and
//! decides when a free user hits the paywall. Pro users are never gated.
//! A store that is slow or down never blocks a user.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

pub use config::Config;
pub use core::{
    check_course_limit, check_token_limit, debit, reconcile, ActionStart, AiFeature,
    DebitOutcome, DenyReason, EntitlementPatch, EntitlementSession, GateDecision, Limits,
    PaywallPresenter, PaywallPrompt, ProfileRecord, ReconcileOutcome, Tier, UserEntitlement,
};
pub use error::{FailOpen, Result, StudyGateError};
pub use storage::{EntitlementStore, FileEntitlementStore, MemoryEntitlementStore};

// CLI commands
pub use cli::{
    CheckCommand, GrantCommand, SpendCommand, StartCommand, StatusCommand, TierCommand,
    UsersCommand,
};
