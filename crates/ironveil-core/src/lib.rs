//! Turn-based multi-agent narrative simulation core.
//!
//! A shared objective [`contracts::WorldState`] evolves one turn at a time.
//! Each participating agent receives a subjective, visibility-limited
//! [`contracts::TurnBrief`], proposes a [`contracts::CharacterAction`]
//! through an external decision process, and every proposal is checked
//! against the five Iron Laws before it may mutate the world.
//!
//! The [`director::Director`] owns the turn loop; everything below it is a
//! pure function of its inputs.

pub mod adjudicator;
pub mod brief;
pub mod director;
pub mod knowledge;
pub mod rules;
pub mod threat;
pub mod visibility;

pub use adjudicator::{Adjudicated, Adjudicator, AdjudicatorError};
pub use brief::BriefBuilder;
pub use director::{DecisionError, DecisionProcess, Director, TurnPhase};
pub use knowledge::{KnowledgeBase, KnowledgeInjector, StaticKnowledgeBase};
pub use rules::RuleBook;
pub use threat::ThreatAssessor;
pub use visibility::{SetupError, VisibilityEngine};
