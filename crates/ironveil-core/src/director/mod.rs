//! The Director: turn-loop orchestrator over briefs, decisions,
//! adjudication, and world mutation.
//!
//! Brief construction is parallel over an immutable snapshot; adjudication
//! and application are serialized in initiative order, so one agent's
//! accepted action is visible to every later agent in the same turn. The
//! Director is the single writer of its world state.

mod apply;
pub mod log;
mod turn;

pub use log::CampaignLog;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use contracts::{CharacterAction, EngineConfig, PersonaCard, TurnBrief, WorldState};
use thiserror::Error;

use crate::knowledge::KnowledgeBase;
use crate::rules::RuleBook;

/// The external decision process: turns a brief into a proposed action.
///
/// Expected to be the slow, potentially blocking step (e.g. an LLM call);
/// the Director bounds each call with a configured timeout.
pub trait DecisionProcess: Send + Sync {
    fn decide(&self, brief: &TurnBrief) -> Result<CharacterAction, DecisionError>;
}

/// Failure of one decision call. Timeouts and errors are logged as
/// synthetic rejections and never stall the turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("decision process timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("decision process failed: {reason}")]
    Failed { reason: String },
}

/// Per-turn phases of the Director state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    BuildingBriefs,
    AwaitingActions,
    Adjudicating,
    Applying,
    Logged,
}

impl TurnPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::BuildingBriefs => "building_briefs",
            Self::AwaitingActions => "awaiting_actions",
            Self::Adjudicating => "adjudicating",
            Self::Applying => "applying",
            Self::Logged => "logged",
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The turn-loop orchestrator.
pub struct Director {
    config: EngineConfig,
    world: WorldState,
    personas: BTreeMap<String, PersonaCard>,
    knowledge: Arc<dyn KnowledgeBase>,
    decider: Arc<dyn DecisionProcess>,
    rules: RuleBook,
    log: CampaignLog,
    phase: TurnPhase,
    brief_pool: Option<rayon::ThreadPool>,
    initiative: Option<Vec<String>>,
}

impl fmt::Debug for Director {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Director")
            .field("turn", &self.world.turn)
            .field("phase", &self.phase)
            .field("personas", &self.personas.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Director {
    pub fn new(
        config: EngineConfig,
        world: WorldState,
        personas: Vec<PersonaCard>,
        knowledge: Arc<dyn KnowledgeBase>,
        decider: Arc<dyn DecisionProcess>,
    ) -> Self {
        let brief_pool = if config.worker_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.worker_threads)
                .build()
                .ok()
        } else {
            None
        };
        let log = CampaignLog::new(config.seed);
        Self {
            personas: personas
                .into_iter()
                .map(|card| (card.id.clone(), card))
                .collect(),
            log,
            brief_pool,
            config,
            world,
            knowledge,
            decider,
            rules: RuleBook::with_defaults(),
            phase: TurnPhase::Idle,
            initiative: None,
        }
    }

    /// Replace the default rule book.
    pub fn with_rule_book(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    /// Supply an explicit initiative order; unknown ids are ignored at turn
    /// time. Without one, a deterministic seeded order is derived per turn.
    pub fn set_initiative(&mut self, order: Vec<String>) {
        self.initiative = Some(order);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn log(&self) -> &CampaignLog {
        &self.log
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn replay_hash(&self) -> u64 {
        self.log.replay_hash()
    }

    /// The agent order for a turn: the caller-supplied initiative, or a
    /// deterministic order derived from `hash(seed, turn, persona_id)`.
    pub fn turn_order(&self, turn: u64) -> Vec<String> {
        match &self.initiative {
            Some(order) => order
                .iter()
                .filter(|id| self.personas.contains_key(id.as_str()))
                .cloned()
                .collect(),
            None => {
                let mut order: Vec<(u64, String)> = self
                    .personas
                    .keys()
                    .map(|id| (deterministic_priority(self.config.seed, turn, id), id.clone()))
                    .collect();
                order.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
                order.into_iter().map(|(_, id)| id).collect()
            }
        }
    }

    /// One decision call bounded by the configured timeout. The worker
    /// thread is detached on timeout; a late result is discarded.
    fn decide_with_timeout(&self, brief: &TurnBrief) -> Result<CharacterAction, DecisionError> {
        let timeout = Duration::from_millis(self.config.decision_timeout_ms);
        let decider = Arc::clone(&self.decider);
        let brief = brief.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(decider.decide(&brief));
        });
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(DecisionError::Timeout {
                timeout_ms: self.config.decision_timeout_ms,
            }),
        }
    }
}

/// Derive a deterministic priority for an agent at a given turn.
/// Lower value = earlier in the turn. SplitMix64-style mixing.
fn deterministic_priority(seed: u64, turn: u64, persona_id: &str) -> u64 {
    let mut h: u64 = seed;
    h = h.wrapping_add(turn.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    for b in persona_id.bytes() {
        h = h.wrapping_add(u64::from(b));
        h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    }
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

/// Synthetic wall-clock stamp derived from turn and sequence, keeping log
/// entries reproducible across runs.
fn synthetic_timestamp(turn: u64, sequence: u64) -> String {
    format!(
        "1970-01-01T{:02}:{:02}:{:02}Z",
        (turn / 3600) % 24,
        (turn / 60) % 60,
        (turn + sequence) % 60
    )
}
