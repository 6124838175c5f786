//! The bundled demo campaign: a two-faction border skirmish with a static
//! doctrine knowledge base and a rule-based decision process.

use std::collections::BTreeMap;

use contracts::{
    ActionType, Belief, CharacterAction, DistanceBand, Entity, ExpectedEffect, KnowledgeChannel,
    KnowledgeScope, PersonaCard, Relation, TraitWeight, TurnBrief, WorldRule, WorldState,
    ASSET_ENERGY, ASSET_WEAPON,
};
use ironveil_core::director::{DecisionError, DecisionProcess};
use ironveil_core::knowledge::StaticKnowledgeBase;

const IRONBOUND: &str = "ironbound";
const VEILBORN: &str = "veilborn";

fn entity(
    id: &str,
    name: &str,
    entity_type: &str,
    pos: &str,
    tags: &[&str],
    assets: &[(&str, i64)],
) -> Entity {
    Entity {
        id: id.to_string(),
        entity_type: entity_type.to_string(),
        name: Some(name.to_string()),
        pos: Some(pos.to_string()),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        assets: assets
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn persona(id: &str, faction: &str, belief: &str, trait_name: &str) -> PersonaCard {
    PersonaCard {
        id: id.to_string(),
        faction: faction.to_string(),
        beliefs: vec![Belief {
            proposition: belief.to_string(),
            weight: 0.9,
        }],
        traits: vec![TraitWeight {
            name: trait_name.to_string(),
            weight: 0.7,
        }],
        knowledge_scope: vec![
            KnowledgeScope {
                channel: KnowledgeChannel::Visual,
                range: 5,
            },
            KnowledgeScope {
                channel: KnowledgeChannel::Radio,
                range: 8,
            },
            KnowledgeScope {
                channel: KnowledgeChannel::Intel,
                range: 0,
            },
        ],
        taboos: Vec::new(),
    }
}

fn hostile(src: &str, dst: &str) -> Relation {
    Relation {
        src: src.to_string(),
        rel: "hostile_to".to_string(),
        dst: dst.to_string(),
    }
}

/// The border-skirmish world and its four participating personas.
pub fn demo_world() -> (WorldState, Vec<PersonaCard>) {
    let mut world = WorldState::new();
    world.entities = vec![
        entity(
            "iron-warden",
            "Warden of the Gate",
            "unit",
            "0,0",
            &[IRONBOUND, "radio"],
            &[(ASSET_ENERGY, 40), (ASSET_WEAPON, 1)],
        ),
        entity(
            "iron-scout",
            "Gate Scout",
            "unit",
            "2,1",
            &[IRONBOUND, "radio"],
            &[(ASSET_ENERGY, 25), (ASSET_WEAPON, 1)],
        ),
        entity(
            "veil-reaver",
            "Reaver of the Veil",
            "unit",
            "4,0",
            &[VEILBORN],
            &[(ASSET_ENERGY, 35), (ASSET_WEAPON, 1)],
        ),
        entity(
            "veil-herald",
            "Herald of the Veil",
            "unit",
            "7,3",
            &[VEILBORN, "radio"],
            &[(ASSET_ENERGY, 25)],
        ),
        entity(
            "gate-tower",
            "Old Gate Tower",
            "structure",
            "1,3",
            &[IRONBOUND],
            &[],
        ),
    ];
    world.relations = vec![
        hostile("iron-warden", "veil-reaver"),
        hostile("iron-warden", "veil-herald"),
        hostile("iron-scout", "veil-reaver"),
        hostile("veil-reaver", "iron-warden"),
        hostile("veil-reaver", "iron-scout"),
        hostile("veil-herald", "iron-warden"),
    ];
    world.facts = vec![contracts::Fact {
        id: "fact-ford".to_string(),
        text: "veil-reaver crossed the ford at dusk".to_string(),
        confidence: 0.8,
        source_id: "gate-tower".to_string(),
    }];
    world.rules = vec![WorldRule {
        name: "no_flight".to_string(),
        expr: "movement by flight is prohibited".to_string(),
    }];

    let personas = vec![
        persona(
            "iron-warden",
            IRONBOUND,
            "the gate must not fall",
            "steadfast",
        ),
        persona("iron-scout", IRONBOUND, "eyes before blades", "cautious"),
        persona("veil-reaver", VEILBORN, "the gate will open", "reckless"),
        persona("veil-herald", VEILBORN, "words cut deeper", "patient"),
    ];
    (world, personas)
}

/// Doctrine entries for both factions, keyed for the faction and a few
/// entity names the knowledge query may carry.
pub fn demo_knowledge() -> StaticKnowledgeBase {
    let mut kb = StaticKnowledgeBase::new();
    kb.insert(IRONBOUND, "never leave the gate unwatched", "iron-doctrine-1");
    kb.insert(IRONBOUND, "meet raiders at the walls, not the fields", "iron-doctrine-2");
    kb.insert(VEILBORN, "strike where the watch is thin", "veil-doctrine-1");
    kb.insert(VEILBORN, "heralds speak before reavers strike", "veil-doctrine-2");
    kb.insert("Reaver of the Veil", "the reaver favors the ford crossing", "field-report-7");
    kb.insert("Warden of the Gate", "the warden never parleys at night", "field-report-9");
    kb
}

/// Rule-based decision process: engage the closest threat, close distance
/// to distant ones, and scan when nothing is in sight.
///
/// Deliberately blind to energy levels (the brief does not carry them),
/// so exhausted attacks exercise the adjudicator's repair path.
pub struct DoctrineDecider;

impl DecisionProcess for DoctrineDecider {
    fn decide(&self, brief: &TurnBrief) -> Result<CharacterAction, DecisionError> {
        let doctrine_check = brief
            .doctrine_snippets
            .first()
            .map(|snippet| snippet.source_id.clone());

        let action = match brief.threats.first() {
            Some(threat) if threat.distance == DistanceBand::Close => CharacterAction {
                action_type: ActionType::Attack,
                target: Some(threat.id.clone()),
                intent: format!("engage {} before it slips away", threat.id),
                justification: format!(
                    "{} is the closest standing threat this turn",
                    threat.id
                ),
                expected_effects: vec![ExpectedEffect {
                    fact: format!("{} pressed back by {}", threat.id, brief.for_persona),
                    delta: -0.2,
                }],
                doctrine_check,
                confidence: 0.75,
            },
            Some(threat) => CharacterAction {
                action_type: ActionType::Move,
                target: Some(threat.id.clone()),
                intent: format!("close the distance to {}", threat.id),
                justification: "a threat out of reach is a threat unanswered".to_string(),
                expected_effects: Vec::new(),
                doctrine_check,
                confidence: 0.7,
            },
            None => CharacterAction {
                action_type: ActionType::Scan,
                target: None,
                intent: "sweep the approaches".to_string(),
                justification: "no contact reported this turn".to_string(),
                expected_effects: Vec::new(),
                doctrine_check,
                confidence: 0.6,
            },
        };
        Ok(action)
    }
}
