//! The per-turn processing loop.

use std::collections::BTreeMap;

use contracts::{
    ActionOutcome, ActionType, PersonaCard, TurnBrief, TurnLogEntry, SCHEMA_VERSION_V1,
};
use tracing::{info, warn};

use super::{apply, synthetic_timestamp, Director, TurnPhase};
use crate::adjudicator::{Adjudicator, AdjudicatorError};
use crate::brief::BriefBuilder;
use crate::visibility::SetupError;

impl Director {
    /// Process one full turn for every participating agent.
    ///
    /// Briefs are built in parallel against the turn-start snapshot;
    /// decision, adjudication, and application run serially in initiative
    /// order, each agent adjudicated against the already-mutated world.
    /// Returns `false` without advancing once `max_turns` is reached.
    pub fn step(&mut self) -> bool {
        if self.world.turn >= self.config.max_turns {
            self.phase = TurnPhase::Idle;
            return false;
        }
        let turn = self.world.turn + 1;
        self.world.turn = turn;
        let mut sequence = 0_u64;

        self.phase = TurnPhase::BuildingBriefs;
        let order = self.turn_order(turn);
        let roster: Vec<PersonaCard> = order
            .iter()
            .filter_map(|id| self.personas.get(id))
            .cloned()
            .collect();
        let snapshot = self.world.clone();
        let briefs: BTreeMap<String, Result<TurnBrief, SetupError>> = {
            let builder = BriefBuilder::new(&self.config, self.knowledge.as_ref(), &self.log);
            builder
                .build_all(&snapshot, &roster, self.brief_pool.as_ref())
                .into_iter()
                .collect()
        };

        for persona_id in &order {
            let Some(persona) = self.personas.get(persona_id).cloned() else {
                continue;
            };
            let brief = match briefs.get(persona_id) {
                Some(Ok(brief)) => brief.clone(),
                Some(Err(setup)) => {
                    warn!(persona = persona_id.as_str(), error = %setup, "brief setup failed");
                    self.push_entry(
                        turn,
                        &mut sequence,
                        persona_id,
                        None,
                        "no brief built".to_string(),
                        ActionOutcome::SystemError {
                            reason: setup.to_string(),
                        },
                    );
                    continue;
                }
                None => continue,
            };

            self.phase = TurnPhase::AwaitingActions;
            let proposal = match self.decide_with_timeout(&brief) {
                Ok(action) => action,
                Err(err) => {
                    self.push_entry(
                        turn,
                        &mut sequence,
                        persona_id,
                        None,
                        "no action decided".to_string(),
                        ActionOutcome::DecisionFailed {
                            reason: err.to_string(),
                        },
                    );
                    continue;
                }
            };
            if let Err(err) = proposal.validate() {
                self.push_entry(
                    turn,
                    &mut sequence,
                    persona_id,
                    Some(proposal.action_type),
                    proposal.summary(),
                    ActionOutcome::DecisionFailed {
                        reason: format!("malformed action: {err}"),
                    },
                );
                continue;
            }

            self.phase = TurnPhase::Adjudicating;
            let verdict = {
                let adjudicator = Adjudicator::new(&self.config, &self.rules);
                adjudicator.adjudicate(&self.world, &persona, proposal)
            };
            match verdict {
                Ok(adjudicated) => {
                    self.phase = TurnPhase::Applying;
                    let mutation =
                        apply::mutation_for(&self.world, persona_id, &adjudicated.action, &self.config);
                    apply::apply_mutation(&mut self.world, &mutation);
                    let outcome = match adjudicated.repaired_from {
                        Some(code) => ActionOutcome::Repaired {
                            original_code: code,
                            mutation,
                        },
                        None => ActionOutcome::Applied { mutation },
                    };
                    self.push_entry(
                        turn,
                        &mut sequence,
                        persona_id,
                        Some(adjudicated.action.action_type),
                        adjudicated.action.summary(),
                        outcome,
                    );
                }
                Err(AdjudicatorError::Setup(setup)) => {
                    self.push_entry(
                        turn,
                        &mut sequence,
                        persona_id,
                        None,
                        "adjudication aborted".to_string(),
                        ActionOutcome::SystemError {
                            reason: setup.to_string(),
                        },
                    );
                }
                Err(AdjudicatorError::Law(violation)) => {
                    let halt = self.config.halt_on_rejection;
                    self.push_entry(
                        turn,
                        &mut sequence,
                        persona_id,
                        Some(violation.action.action_type),
                        violation.action.summary(),
                        ActionOutcome::Rejected {
                            code: violation.code,
                            message: violation.message.clone(),
                        },
                    );
                    if halt {
                        break;
                    }
                }
            }
        }

        self.phase = TurnPhase::Logged;
        info!(turn, processed = sequence, "turn complete");
        true
    }

    /// Advance up to `n` turns; returns how many committed.
    pub fn step_n(&mut self, n: u64) -> u64 {
        let mut committed = 0_u64;
        for _ in 0..n {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    /// Advance until the world reaches `turn` or the turn limit intervenes.
    pub fn run_to_turn(&mut self, turn: u64) -> u64 {
        let mut committed = 0_u64;
        while self.world.turn < turn {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    fn push_entry(
        &mut self,
        turn: u64,
        sequence: &mut u64,
        persona_id: &str,
        action_type: Option<ActionType>,
        summary: String,
        outcome: ActionOutcome,
    ) {
        let entry = TurnLogEntry {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn,
            sequence_in_turn: *sequence,
            created_at: synthetic_timestamp(turn, *sequence),
            persona_id: persona_id.to_string(),
            action_type,
            summary,
            outcome,
        };
        *sequence += 1;
        self.log.append(entry);
    }
}
