//! CLI commands for studygate.
//!
//! - **Session commands**: start, check, spend (drive one session each)
//! - **Inspection**: status, users
//! - **Billing stand-ins**: grant, tier

use serde::Serialize;

use crate::config::Config;
use crate::core::{format_date, parse_date, Limits, Tier, UserEntitlement};
use crate::error::Result;

// Session commands
pub mod check;
pub mod spend;
pub mod start;

// Inspection
pub mod status;
pub mod users;

// Billing stand-ins
pub mod grant;
pub mod tier;

pub use check::CheckCommand;
pub use grant::GrantCommand;
pub use spend::SpendCommand;
pub use start::StartCommand;
pub use status::StatusCommand;
pub use tier::TierCommand;
pub use users::UsersCommand;

/// Resolve the session date: an explicit `YYYY-MM-DD`, or today under the
/// configured timezone policy.
pub fn resolve_today(config: &Config, explicit: Option<&str>) -> Result<String> {
    match explicit {
        Some(value) => parse_date(value).map(format_date),
        None => Ok(config.clock.policy().today()),
    }
}

/// Printable view of one user's entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementSummary {
    pub user_id: String,
    pub tier: Tier,
    pub daily_used: u32,
    pub daily_cap: u32,
    pub bonus_credits: u32,
    /// Actions left today; absent for unlimited tiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit_date: Option<String>,
}

impl EntitlementSummary {
    /// Build a summary.
    pub fn new(user_id: &str, entitlement: &UserEntitlement, limits: &Limits) -> Self {
        Self {
            user_id: user_id.to_string(),
            tier: entitlement.tier,
            daily_used: entitlement.daily_used,
            daily_cap: limits.daily_cap,
            bonus_credits: entitlement.bonus_credits,
            remaining: entitlement.remaining_total(limits),
            streak: entitlement.streak,
            last_visit_date: entitlement.last_visit_date.clone(),
        }
    }

    /// One-line human rendering.
    pub fn format_line(&self) -> String {
        let remaining = match self.remaining {
            Some(n) => format!("{} left", n),
            None => "unlimited".to_string(),
        };
        format!(
            "{} [{}] daily {}/{}, bonus {}, {}, streak {}",
            self.user_id,
            self.tier,
            self.daily_used,
            self.daily_cap,
            self.bonus_credits,
            remaining,
            self.streak
        )
    }
}
