//! Entitlement data model.
//!
//! These types mirror the per-user profile fields the hosted backend keeps
//! for the freemium paywall, plus the ephemeral gate decision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Daily allowance of AI actions for the free tier.
pub const DAILY_CAP: u32 = 5;

/// Number of courses a free user may own before the paywall.
pub const FREE_COURSE_LIMIT: u32 = 1;

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Daily allowance plus bonus credits.
    #[default]
    Free,
    /// No caps.
    Pro,
}

impl Tier {
    /// Check if the tier bypasses all gating.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Tier::Pro)
    }

    /// Lowercase name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// Free-tier limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Daily allowance.
    pub daily_cap: u32,
    /// Courses a free user may own.
    pub free_course_limit: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            daily_cap: DAILY_CAP,
            free_course_limit: FREE_COURSE_LIMIT,
        }
    }
}

/// A user's usage counters, bonus pool, tier and streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserEntitlement {
    /// Subscription tier. Read-only for the engine.
    pub tier: Tier,
    /// Daily-allowance actions consumed today.
    #[serde(rename = "daily_tokens")]
    pub daily_used: u32,
    /// Non-expiring extra credits.
    pub bonus_credits: u32,
    /// `YYYY-MM-DD` of the last reconciled session, user-local.
    pub last_visit_date: Option<String>,
    /// Consecutive calendar days with a reconciled visit.
    pub streak: u32,
}

impl UserEntitlement {
    /// Fresh free-tier entitlement, as created on first sign-in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entitlement with the given tier and fresh counters.
    pub fn with_tier(tier: Tier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    /// Daily actions left before the bonus pool is touched.
    pub fn remaining_daily(&self, limits: &Limits) -> u32 {
        limits.daily_cap.saturating_sub(self.daily_used)
    }

    /// Total actions left today, or `None` for unlimited tiers.
    pub fn remaining_total(&self, limits: &Limits) -> Option<u32> {
        if self.tier.is_unlimited() {
            return None;
        }
        Some(
            self.remaining_daily(limits)
                .saturating_add(self.bonus_credits),
        )
    }
}

/// Why the gate denied an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Free user already owns the maximum number of courses.
    CourseLimit,
    /// Daily allowance and bonus pool both exhausted.
    TokenLimit,
}

impl DenyReason {
    /// Wire name of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::CourseLimit => "course_limit",
            DenyReason::TokenLimit => "token_limit",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a gate check. `reason` is set iff the action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
}

impl GateDecision {
    /// An allowing decision.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// A denying decision with its reason.
    pub fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Feature surfaces that spend one credit per use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiFeature {
    /// One tutor chat turn.
    Chat,
    /// Photo-of-a-problem solve.
    VisionSolve,
    /// Essay grading.
    EssayGrade,
    /// Flashcard deck generation.
    Flashcards,
    /// Quiz generation.
    Quiz,
    NoteSummarize,
    NoteCleanup,
    NoteExpand,
    /// Study guide from notes.
    StudyGuide,
    /// Assignment tip generation.
    AssignmentTip,
}

impl AiFeature {
    /// All gated features.
    pub const ALL: [AiFeature; 10] = [
        AiFeature::Chat,
        AiFeature::VisionSolve,
        AiFeature::EssayGrade,
        AiFeature::Flashcards,
        AiFeature::Quiz,
        AiFeature::NoteSummarize,
        AiFeature::NoteCleanup,
        AiFeature::NoteExpand,
        AiFeature::StudyGuide,
        AiFeature::AssignmentTip,
    ];

    /// Wire name of the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiFeature::Chat => "chat",
            AiFeature::VisionSolve => "vision_solve",
            AiFeature::EssayGrade => "essay_grade",
            AiFeature::Flashcards => "flashcards",
            AiFeature::Quiz => "quiz",
            AiFeature::NoteSummarize => "note_summarize",
            AiFeature::NoteCleanup => "note_cleanup",
            AiFeature::NoteExpand => "note_expand",
            AiFeature::StudyGuide => "study_guide",
            AiFeature::AssignmentTip => "assignment_tip",
        }
    }
}

impl fmt::Display for AiFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiFeature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        AiFeature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == wanted)
            .ok_or_else(|| format!("unknown feature: {}", s.trim()))
    }
}
