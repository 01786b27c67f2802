//! Partial profile updates.
//!
//! Each mutation persists only the fields it touched, so a debit issued from
//! one session cannot clobber the streak written by another.

use serde::{Deserialize, Serialize};

use crate::core::entitlement::{Tier, UserEntitlement};

/// Field-level update to a stored entitlement. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_credits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// Credits added to whatever balance is stored when the patch lands.
    /// Applied after `bonus_credits`, saturating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus_grant: Option<u32>,
}

impl EntitlementPatch {
    /// Fields written by a day rollover.
    pub fn rollover(entitlement: &UserEntitlement) -> Self {
        Self {
            daily_tokens: Some(entitlement.daily_used),
            last_visit_date: entitlement.last_visit_date.clone(),
            streak: Some(entitlement.streak),
            ..Self::default()
        }
    }

    /// Daily counter after a debit.
    pub fn daily_tokens(value: u32) -> Self {
        Self {
            daily_tokens: Some(value),
            ..Self::default()
        }
    }

    /// Bonus pool after a debit or grant.
    pub fn bonus_credits(value: u32) -> Self {
        Self {
            bonus_credits: Some(value),
            ..Self::default()
        }
    }

    /// Bonus credits added on top of the stored balance.
    pub fn add_bonus(amount: u32) -> Self {
        Self {
            bonus_grant: Some(amount),
            ..Self::default()
        }
    }

    /// Tier change from the billing side.
    pub fn tier(tier: Tier) -> Self {
        Self {
            tier: Some(tier),
            ..Self::default()
        }
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the set fields to `entitlement`.
    pub fn apply_to(&self, entitlement: &mut UserEntitlement) {
        if let Some(tier) = self.tier {
            entitlement.tier = tier;
        }
        if let Some(daily) = self.daily_tokens {
            entitlement.daily_used = daily;
        }
        if let Some(bonus) = self.bonus_credits {
            entitlement.bonus_credits = bonus;
        }
        if let Some(ref date) = self.last_visit_date {
            entitlement.last_visit_date = Some(date.clone());
        }
        if let Some(streak) = self.streak {
            entitlement.streak = streak;
        }
        if let Some(amount) = self.bonus_grant {
            entitlement.bonus_credits = entitlement.bonus_credits.saturating_add(amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_touches_only_set_fields() {
        let mut ent = UserEntitlement {
            tier: Tier::Free,
            daily_used: 3,
            bonus_credits: 2,
            last_visit_date: Some("2024-01-01".to_string()),
            streak: 4,
        };

        EntitlementPatch::bonus_credits(1).apply_to(&mut ent);

        assert_eq!(ent.bonus_credits, 1);
        assert_eq!(ent.daily_used, 3);
        assert_eq!(ent.streak, 4);
        assert_eq!(ent.last_visit_date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_rollover_patch_fields() {
        let ent = UserEntitlement {
            daily_used: 0,
            bonus_credits: 9,
            last_visit_date: Some("2024-01-02".to_string()),
            streak: 4,
            ..Default::default()
        };
        let patch = EntitlementPatch::rollover(&ent);

        assert_eq!(patch.daily_tokens, Some(0));
        assert_eq!(patch.streak, Some(4));
        assert_eq!(patch.last_visit_date.as_deref(), Some("2024-01-02"));
        assert_eq!(patch.bonus_credits, None);
        assert_eq!(patch.tier, None);
    }

    #[test]
    fn test_add_bonus_is_relative() {
        let mut ent = UserEntitlement {
            daily_used: 4,
            bonus_credits: 2,
            ..Default::default()
        };

        EntitlementPatch::add_bonus(3).apply_to(&mut ent);
        assert_eq!((ent.bonus_credits, ent.daily_used), (5, 4));

        ent.bonus_credits = u32::MAX - 1;
        EntitlementPatch::add_bonus(10).apply_to(&mut ent);
        assert_eq!(ent.bonus_credits, u32::MAX);
    }

    #[test]
    fn test_empty_patch() {
        assert!(EntitlementPatch::default().is_empty());
        assert!(!EntitlementPatch::tier(Tier::Pro).is_empty());
    }

    #[test]
    fn test_serialization_omits_unset() {
        let json = serde_json::to_string(&EntitlementPatch::daily_tokens(2)).unwrap();
        assert_eq!(json, r#"{"daily_tokens":2}"#);
    }
}
