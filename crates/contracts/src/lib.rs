//! Cross-boundary contracts for the ironveil simulation core: world state,
//! persona cards, turn briefs, proposed actions, adjudication outcomes, and
//! the validation primitives every boundary shares.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub mod action;
pub mod persona;
pub mod validate;

pub use action::{ActionType, AdjudicationError, CharacterAction, ExpectedEffect, LawCode};
pub use persona::{Belief, KnowledgeChannel, KnowledgeScope, PersonaCard, TraitWeight};
pub use validate::{validate_id, validate_text, validate_unit_interval, ValidationError};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Hard cap on doctrine snippets per brief, regardless of configuration.
pub const MAX_DOCTRINE_SNIPPETS: usize = 8;

/// Asset key tracking an entity's spendable energy.
pub const ASSET_ENERGY: &str = "energy";
/// Asset key marking weapon possession (any positive value counts).
pub const ASSET_WEAPON: &str = "weapon";
/// Asset key marking incapacitation (any non-zero value counts).
pub const ASSET_INCAPACITATED: &str = "incapacitated";

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

/// One entity in the shared objective world.
///
/// Faction membership and radio capability are expressed through `tags`
/// (a tag equal to the faction name, and the `"radio"` tag respectively).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: Option<String>,
    /// Grid position as `"x,y"`. Absent or unparseable positions are treated
    /// as unknown and are never visually reachable.
    pub pos: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assets: BTreeMap<String, i64>,
}

impl Entity {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn asset(&self, key: &str) -> Option<i64> {
        self.assets.get(key).copied()
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A directed relation triple, e.g. `("npc-a", "hostile_to", "npc-b")`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    pub src: String,
    pub rel: String,
    pub dst: String,
}

/// A recorded fact about the world, with provenance and confidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fact {
    pub id: String,
    pub text: String,
    pub confidence: f64,
    pub source_id: String,
}

/// A world rule in force, identified by name with a free-text expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldRule {
    pub name: String,
    pub expr: String,
}

/// The shared objective world state for one turn.
///
/// The core treats a snapshot as read-only input; only the Director folds
/// accepted mutations back into its owned copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorldState {
    pub schema_version: String,
    pub turn: u64,
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub rules: Vec<WorldRule>,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn: 0,
            entities: Vec::new(),
            relations: Vec::new(),
            facts: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Check structural constraints: valid ids, unique entity ids, and
    /// confidence values inside the unit interval.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            validate_id("entity.id", &entity.id)?;
            if !seen.insert(entity.id.as_str()) {
                return Err(ValidationError::DuplicateEntityId {
                    id: entity.id.clone(),
                });
            }
        }
        for fact in &self.facts {
            validate_id("fact.id", &fact.id)?;
            validate_unit_interval("fact.confidence", fact.confidence)?;
        }
        Ok(())
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Turn brief
// ---------------------------------------------------------------------------

/// Distance band for a reported threat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    Close,
    Medium,
    Far,
}

impl DistanceBand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Medium => "medium",
            Self::Far => "far",
        }
    }
}

/// One prioritized threat in a turn brief.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Threat {
    pub id: String,
    pub distance: DistanceBand,
}

/// One retrieved knowledge snippet with provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctrineSnippet {
    pub text: String,
    pub source_id: String,
}

/// The query handed to the external knowledge base, built from the acting
/// persona's faction and a bounded set of currently visible entity names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeQuery {
    pub faction: String,
    pub entity_names: Vec<String>,
}

impl KnowledgeQuery {
    /// Flattened query terms: the faction followed by the entity names.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.faction.as_str()).chain(self.entity_names.iter().map(String::as_str))
    }
}

/// The entity and fact ids an agent may legitimately observe this turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibleSlice {
    pub entities: BTreeSet<String>,
    pub facts: BTreeSet<String>,
}

impl VisibleSlice {
    pub fn contains_entity(&self, id: &str) -> bool {
        self.entities.contains(id)
    }
}

/// The subjective per-agent input package built each turn and discarded
/// after it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnBrief {
    pub schema_version: String,
    pub turn: u64,
    pub for_persona: String,
    pub visible_slice: VisibleSlice,
    pub threats: Vec<Threat>,
    pub doctrine_snippets: Vec<DoctrineSnippet>,
    pub last_actions_summary: Option<String>,
}

impl TurnBrief {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id("for_persona", &self.for_persona)?;
        if self.doctrine_snippets.len() > MAX_DOCTRINE_SNIPPETS {
            return Err(ValidationError::TooManySnippets {
                len: self.doctrine_snippets.len(),
                max: MAX_DOCTRINE_SNIPPETS,
            });
        }
        if !self.visible_slice.contains_entity(&self.for_persona) {
            return Err(ValidationError::SelfNotVisible {
                persona_id: self.for_persona.clone(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// World mutation
// ---------------------------------------------------------------------------

/// A change to one numeric asset of one entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetDelta {
    pub entity_id: String,
    pub asset: String,
    pub delta: i64,
}

/// A replacement position for one entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionUpdate {
    pub entity_id: String,
    pub pos: String,
}

/// The world-mutation instruction emitted for an accepted action: asset
/// deltas, position updates, and appended facts, to be applied by whichever
/// store owns the world.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorldMutation {
    pub actor_id: String,
    #[serde(default)]
    pub asset_deltas: Vec<AssetDelta>,
    #[serde(default)]
    pub position_updates: Vec<PositionUpdate>,
    #[serde(default)]
    pub appended_facts: Vec<Fact>,
}

impl WorldMutation {
    pub fn is_empty(&self) -> bool {
        self.asset_deltas.is_empty()
            && self.position_updates.is_empty()
            && self.appended_facts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Campaign log entries
// ---------------------------------------------------------------------------

/// Outcome of processing one persona in one turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The proposed action passed all checks and was applied.
    Applied { mutation: WorldMutation },
    /// The proposed action failed one check; its keyed substitute passed.
    Repaired {
        original_code: LawCode,
        mutation: WorldMutation,
    },
    /// Terminal rejection with the original failure code.
    Rejected { code: LawCode, message: String },
    /// The external decision process timed out or errored.
    DecisionFailed { reason: String },
    /// Setup failure for this agent (e.g. persona entity missing), distinct
    /// from a law violation.
    SystemError { reason: String },
}

impl ActionOutcome {
    /// Short stable label used in summaries and replay hashing.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Repaired { .. } => "repaired",
            Self::Rejected { .. } => "rejected",
            Self::DecisionFailed { .. } => "decision_failed",
            Self::SystemError { .. } => "system_error",
        }
    }
}

/// One append-only campaign log record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnLogEntry {
    pub schema_version: String,
    pub turn: u64,
    pub sequence_in_turn: u64,
    pub created_at: String,
    pub persona_id: String,
    pub action_type: Option<ActionType>,
    pub summary: String,
    pub outcome: ActionOutcome,
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Tunable defaults for the core. The contract values below are defaults,
/// not fixed physics; callers override what their scenario needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub schema_version: String,
    /// Seed for deterministic initiative ordering.
    pub seed: u64,
    /// Turn count after which `step` refuses to advance.
    pub max_turns: u64,
    /// Energy cost of an `attack` action.
    pub attack_energy_cost: i64,
    /// Energy cost of a `move` action.
    pub move_energy_cost: i64,
    /// Energy removed from the target of an accepted `attack`.
    pub attack_damage: i64,
    /// Cells moved per accepted `move` action.
    pub move_step: i64,
    /// Manhattan distance at or under which a threat is `close`.
    pub close_distance: u64,
    /// Manhattan distance at or under which a threat is `medium`.
    pub medium_distance: u64,
    /// Snippet cap per brief; clamped to [`MAX_DOCTRINE_SNIPPETS`].
    pub max_doctrine_snippets: usize,
    /// Entity-name cap for knowledge queries.
    pub max_query_entities: usize,
    /// Confidence multiplier applied to repaired actions.
    pub repair_confidence_scale: f64,
    /// Wall-clock budget for one external decision call.
    pub decision_timeout_ms: u64,
    /// Abort the remainder of a turn after a terminal rejection.
    pub halt_on_rejection: bool,
    /// Markers whose presence in intent/justification breaches canon.
    pub canon_markers: Vec<String>,
    /// Worker threads for parallel brief construction; 0 runs serially.
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            seed: 1337,
            max_turns: 24,
            attack_energy_cost: 10,
            move_energy_cost: 5,
            attack_damage: 10,
            move_step: 1,
            close_distance: 2,
            medium_distance: 5,
            max_doctrine_snippets: MAX_DOCTRINE_SNIPPETS,
            max_query_entities: 5,
            repair_confidence_scale: 0.5,
            decision_timeout_ms: 2_000,
            halt_on_rejection: false,
            canon_markers: default_canon_markers(),
            worker_threads: 0,
        }
    }
}

impl EngineConfig {
    /// Effective snippet cap: configured value, never above the schema cap.
    pub fn snippet_cap(&self) -> usize {
        self.max_doctrine_snippets.min(MAX_DOCTRINE_SNIPPETS)
    }
}

fn default_canon_markers() -> Vec<String> {
    [
        "time travel",
        "timeline",
        "paradox",
        "teleport",
        "warp drive",
        "plasma rifle",
        "orbital strike",
        "from the future",
        "nanite",
    ]
    .iter()
    .map(|marker| (*marker).to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type: "unit".to_string(),
            name: None,
            pos: Some("0,0".to_string()),
            tags: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    #[test]
    fn world_validate_rejects_duplicate_entity_ids() {
        let mut world = WorldState::new();
        world.entities.push(entity("scout-1"));
        world.entities.push(entity("scout-1"));
        let err = world.validate().unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateEntityId { .. }));
    }

    #[test]
    fn world_validate_rejects_bad_fact_confidence() {
        let mut world = WorldState::new();
        world.facts.push(Fact {
            id: "fact-1".to_string(),
            text: "the bridge is down".to_string(),
            confidence: 1.5,
            source_id: "scout-1".to_string(),
        });
        assert!(world.validate().is_err());
    }

    #[test]
    fn brief_validate_enforces_snippet_cap_and_self_visibility() {
        let mut brief = TurnBrief {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn: 1,
            for_persona: "scout-1".to_string(),
            visible_slice: VisibleSlice::default(),
            threats: Vec::new(),
            doctrine_snippets: Vec::new(),
            last_actions_summary: None,
        };
        // Own id missing from the slice.
        assert!(matches!(
            brief.validate(),
            Err(ValidationError::SelfNotVisible { .. })
        ));

        brief.visible_slice.entities.insert("scout-1".to_string());
        assert!(brief.validate().is_ok());

        brief.doctrine_snippets = (0..9)
            .map(|i| DoctrineSnippet {
                text: format!("snippet {i}"),
                source_id: format!("doc-{i}"),
            })
            .collect();
        assert!(matches!(
            brief.validate(),
            Err(ValidationError::TooManySnippets { len: 9, .. })
        ));
    }

    #[test]
    fn engine_config_snippet_cap_never_exceeds_schema_cap() {
        let mut config = EngineConfig::default();
        config.max_doctrine_snippets = 32;
        assert_eq!(config.snippet_cap(), MAX_DOCTRINE_SNIPPETS);
        config.max_doctrine_snippets = 3;
        assert_eq!(config.snippet_cap(), 3);
    }

    #[test]
    fn engine_config_default_carries_contract_costs() {
        let config = EngineConfig::default();
        assert_eq!(config.attack_energy_cost, 10);
        assert_eq!(config.move_energy_cost, 5);
        assert_eq!(config.close_distance, 2);
        assert_eq!(config.medium_distance, 5);
    }

    #[test]
    fn turn_log_entry_round_trip_serialization() {
        let entry = TurnLogEntry {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn: 3,
            sequence_in_turn: 1,
            created_at: "1970-01-01T00:00:03Z".to_string(),
            persona_id: "scout-1".to_string(),
            action_type: Some(ActionType::Scan),
            summary: "scan of the ridge".to_string(),
            outcome: ActionOutcome::Rejected {
                code: LawCode::E002TargetInvalid,
                message: "target outside the visible slice".to_string(),
            },
        };
        let serialized = serde_json::to_string(&entry).expect("serialize");
        let decoded: TurnLogEntry = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(entry, decoded);
    }
}
