//! Proposed character actions and the adjudication error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validate::{validate_id, validate_text, validate_unit_interval, ValidationError};

pub const INTENT_MAX_CHARS: usize = 256;
pub const JUSTIFICATION_MAX_CHARS: usize = 512;

/// The fixed action vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Move,
    Attack,
    Parley,
    Regroup,
    Scan,
    Observe,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Parley => "parley",
            Self::Regroup => "regroup",
            Self::Scan => "scan",
            Self::Observe => "observe",
        }
    }

    /// Passive actions permitted to an incapacitated actor.
    pub fn is_passive(self) -> bool {
        matches!(self, Self::Scan | Self::Observe)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An anticipated world change attached to a proposed action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectedEffect {
    pub fact: String,
    pub delta: f64,
}

/// One proposed action, produced by the external decision process from a
/// turn brief and consumed exactly once by the adjudicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterAction {
    pub action_type: ActionType,
    pub target: Option<String>,
    pub intent: String,
    pub justification: String,
    #[serde(default)]
    pub expected_effects: Vec<ExpectedEffect>,
    pub doctrine_check: Option<String>,
    pub confidence: f64,
}

impl CharacterAction {
    /// Schema validation: text bounds, target id pattern, confidence range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("action.intent", &self.intent, 1, INTENT_MAX_CHARS)?;
        validate_text(
            "action.justification",
            &self.justification,
            1,
            JUSTIFICATION_MAX_CHARS,
        )?;
        if let Some(target) = &self.target {
            validate_id("action.target", target)?;
        }
        validate_unit_interval("action.confidence", self.confidence)?;
        Ok(())
    }

    /// One-line rendering for log summaries.
    pub fn summary(&self) -> String {
        match &self.target {
            Some(target) => format!("{} -> {}", self.action_type, target),
            None => self.action_type.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Iron Law codes
// ---------------------------------------------------------------------------

/// The five invariants every action must satisfy, in check order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LawCode {
    E001ResourceNegative,
    E002TargetInvalid,
    E003ActionImpossible,
    E004LogicViolation,
    E005CanonBreach,
}

impl LawCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::E001ResourceNegative => "E001_RESOURCE_NEGATIVE",
            Self::E002TargetInvalid => "E002_TARGET_INVALID",
            Self::E003ActionImpossible => "E003_ACTION_IMPOSSIBLE",
            Self::E004LogicViolation => "E004_LOGIC_VIOLATION",
            Self::E005CanonBreach => "E005_CANON_BREACH",
        }
    }

    /// Whether a failing check of this code has a defined substitute action.
    pub fn is_repairable(self) -> bool {
        matches!(
            self,
            Self::E001ResourceNegative | Self::E002TargetInvalid | Self::E003ActionImpossible
        )
    }
}

impl fmt::Display for LawCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A law violation: the code, a human-readable message, and the offending
/// action. Transient: it either triggers one repair attempt or is surfaced
/// to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct AdjudicationError {
    pub code: LawCode,
    pub message: String,
    pub action: CharacterAction,
}

impl AdjudicationError {
    pub fn new(code: LawCode, message: impl Into<String>, action: &CharacterAction) -> Self {
        Self {
            code,
            message: message.into(),
            action: action.clone(),
        }
    }
}
