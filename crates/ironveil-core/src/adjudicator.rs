//! The Iron Laws: five fixed invariants every proposed action must satisfy,
//! checked in a fixed order with fail-fast short-circuiting and at most one
//! keyed repair attempt per action.
//!
//! The adjudicator decides; it never mutates the world. Applying accepted
//! actions is the Director's job.

use contracts::{
    ActionType, AdjudicationError, CharacterAction, EngineConfig, LawCode, PersonaCard,
    VisibleSlice, WorldState, ASSET_ENERGY, ASSET_INCAPACITATED, ASSET_WEAPON,
};
use thiserror::Error;
use tracing::debug;

use crate::rules::RuleBook;
use crate::visibility::{SetupError, VisibilityEngine};

/// An accepted action, possibly the substitute from a successful repair.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjudicated {
    pub action: CharacterAction,
    /// The code the original proposal failed with, when the accepted action
    /// is a repair substitute.
    pub repaired_from: Option<LawCode>,
}

/// Failure modes of one adjudication: a fatal setup problem or a terminal
/// law violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdjudicatorError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Law(#[from] AdjudicationError),
}

/// Validates one proposed action against the current world state and the
/// acting persona.
pub struct Adjudicator<'a> {
    config: &'a EngineConfig,
    rules: &'a RuleBook,
}

impl<'a> Adjudicator<'a> {
    pub fn new(config: &'a EngineConfig, rules: &'a RuleBook) -> Self {
        Self { config, rules }
    }

    /// Run the full check sequence, attempting one keyed repair on failure.
    ///
    /// Bounded to two passes: the original action, and at most one
    /// substitute. A failing substitute surfaces the original error, so a
    /// repair never masks the original failure reason.
    pub fn adjudicate(
        &self,
        world: &WorldState,
        persona: &PersonaCard,
        action: CharacterAction,
    ) -> Result<Adjudicated, AdjudicatorError> {
        let visible = VisibilityEngine::visible_slice(world, persona)?;

        match self.run_checks(world, persona, &visible, &action) {
            Ok(()) => Ok(Adjudicated {
                action,
                repaired_from: None,
            }),
            Err(original) => {
                debug!(
                    persona = persona.id.as_str(),
                    code = original.code.as_str(),
                    "action failed adjudication"
                );
                let Some(substitute) = self.repair(&original, &visible, persona) else {
                    return Err(original.into());
                };
                match self.run_checks(world, persona, &visible, &substitute) {
                    Ok(()) => Ok(Adjudicated {
                        action: substitute,
                        repaired_from: Some(original.code),
                    }),
                    // The substitute failed too; report the original code.
                    Err(_) => Err(original.into()),
                }
            }
        }
    }

    /// The five checks in fixed order, each fail-fast.
    fn run_checks(
        &self,
        world: &WorldState,
        persona: &PersonaCard,
        visible: &VisibleSlice,
        action: &CharacterAction,
    ) -> Result<(), AdjudicationError> {
        self.check_resource_conservation(world, persona, action)?;
        self.check_information_limit(visible, action)?;
        self.check_state_consistency(world, persona, action)?;
        self.check_rule_adherence(world, action)?;
        self.check_canon_preservation(action)?;
        Ok(())
    }

    /// E001: an action must never drive a tracked resource below zero.
    fn check_resource_conservation(
        &self,
        world: &WorldState,
        persona: &PersonaCard,
        action: &CharacterAction,
    ) -> Result<(), AdjudicationError> {
        let cost = self.energy_cost(action.action_type);
        if cost == 0 {
            return Ok(());
        }
        let Some(actor) = world.entity(&persona.id) else {
            return Ok(());
        };
        // An entity without the energy asset has no tracked resource to
        // conserve.
        let Some(energy) = actor.asset(ASSET_ENERGY) else {
            return Ok(());
        };
        if energy - cost < 0 {
            return Err(AdjudicationError::new(
                LawCode::E001ResourceNegative,
                format!(
                    "{} costs {cost} energy but '{}' has {energy}",
                    action.action_type, persona.id
                ),
                action,
            ));
        }
        Ok(())
    }

    /// E002: a targeted action may only target the visible slice.
    fn check_information_limit(
        &self,
        visible: &VisibleSlice,
        action: &CharacterAction,
    ) -> Result<(), AdjudicationError> {
        let Some(target) = &action.target else {
            return Ok(());
        };
        if !visible.contains_entity(target) {
            return Err(AdjudicationError::new(
                LawCode::E002TargetInvalid,
                format!("target '{target}' is outside the visible slice"),
                action,
            ));
        }
        Ok(())
    }

    /// E003: the actor's own state must permit the action.
    fn check_state_consistency(
        &self,
        world: &WorldState,
        persona: &PersonaCard,
        action: &CharacterAction,
    ) -> Result<(), AdjudicationError> {
        let Some(actor) = world.entity(&persona.id) else {
            return Ok(());
        };
        let incapacitated = actor.asset(ASSET_INCAPACITATED).unwrap_or(0) != 0;
        if incapacitated && !action.action_type.is_passive() {
            return Err(AdjudicationError::new(
                LawCode::E003ActionImpossible,
                format!(
                    "'{}' is incapacitated and may only observe or scan",
                    persona.id
                ),
                action,
            ));
        }
        if matches!(action.action_type, ActionType::Attack)
            && actor.asset(ASSET_WEAPON).unwrap_or(0) <= 0
        {
            return Err(AdjudicationError::new(
                LawCode::E003ActionImpossible,
                format!("'{}' has no weapon to attack with", persona.id),
                action,
            ));
        }
        Ok(())
    }

    /// E004: the action must not contradict any world rule in force.
    fn check_rule_adherence(
        &self,
        world: &WorldState,
        action: &CharacterAction,
    ) -> Result<(), AdjudicationError> {
        for rule in &world.rules {
            if self.rules.violates(rule, action) {
                return Err(AdjudicationError::new(
                    LawCode::E004LogicViolation,
                    format!("action contradicts the '{}' rule", rule.name),
                    action,
                ));
            }
        }
        Ok(())
    }

    /// E005: intent and justification must stay clear of canon markers.
    fn check_canon_preservation(
        &self,
        action: &CharacterAction,
    ) -> Result<(), AdjudicationError> {
        let text = format!(
            "{} {}",
            action.intent.to_ascii_lowercase(),
            action.justification.to_ascii_lowercase()
        );
        for marker in &self.config.canon_markers {
            if text.contains(&marker.to_ascii_lowercase()) {
                return Err(AdjudicationError::new(
                    LawCode::E005CanonBreach,
                    format!("narrative references forbidden marker '{marker}'"),
                    action,
                ));
            }
        }
        Ok(())
    }

    /// The single substitute keyed by the failing code, if one is defined.
    fn repair(
        &self,
        error: &AdjudicationError,
        visible: &VisibleSlice,
        persona: &PersonaCard,
    ) -> Option<CharacterAction> {
        let original = &error.action;
        match error.code {
            LawCode::E001ResourceNegative | LawCode::E003ActionImpossible => {
                let action_type = match error.code {
                    LawCode::E001ResourceNegative => ActionType::Scan,
                    _ => ActionType::Observe,
                };
                Some(CharacterAction {
                    action_type,
                    target: None,
                    intent: format!("hold position and {action_type} the field"),
                    justification: format!(
                        "degraded from {} after {}",
                        original.action_type, error.code
                    ),
                    expected_effects: Vec::new(),
                    doctrine_check: original.doctrine_check.clone(),
                    confidence: scaled_confidence(original.confidence, self.config),
                })
            }
            LawCode::E002TargetInvalid => {
                let rejected = original.target.as_deref();
                let substitute_target = visible
                    .entities
                    .iter()
                    .find(|id| id.as_str() != persona.id && Some(id.as_str()) != rejected)?;
                Some(CharacterAction {
                    target: Some(substitute_target.clone()),
                    confidence: scaled_confidence(original.confidence, self.config),
                    ..original.clone()
                })
            }
            LawCode::E004LogicViolation | LawCode::E005CanonBreach => None,
        }
    }

    fn energy_cost(&self, action_type: ActionType) -> i64 {
        match action_type {
            ActionType::Attack => self.config.attack_energy_cost,
            ActionType::Move => self.config.move_energy_cost,
            _ => 0,
        }
    }
}

fn scaled_confidence(confidence: f64, config: &EngineConfig) -> f64 {
    (confidence * config.repair_confidence_scale).clamp(0.0, 1.0)
}
