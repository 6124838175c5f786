//! Turn brief construction: visibility + threats + doctrine + recent history
//! composed into one subjective package per agent.
//!
//! Building a brief is a pure function of the world snapshot, the persona
//! card, and the injected knowledge/log interfaces, which is what allows
//! briefs for distinct agents in the same turn to be built in parallel.

use contracts::{EngineConfig, PersonaCard, TurnBrief, WorldState, SCHEMA_VERSION_V1};
use rayon::prelude::*;

use crate::director::log::CampaignLog;
use crate::knowledge::{KnowledgeBase, KnowledgeInjector};
use crate::threat::ThreatAssessor;
use crate::visibility::{SetupError, VisibilityEngine};

/// Composes the visibility engine, threat assessor, and knowledge injector
/// into per-agent briefs.
pub struct BriefBuilder<'a> {
    config: &'a EngineConfig,
    knowledge: &'a dyn KnowledgeBase,
    log: &'a CampaignLog,
}

impl<'a> BriefBuilder<'a> {
    pub fn new(
        config: &'a EngineConfig,
        knowledge: &'a dyn KnowledgeBase,
        log: &'a CampaignLog,
    ) -> Self {
        Self {
            config,
            knowledge,
            log,
        }
    }

    /// Build the brief for one persona against a world snapshot.
    pub fn build(
        &self,
        world: &WorldState,
        persona: &PersonaCard,
    ) -> Result<TurnBrief, SetupError> {
        let visible_slice = VisibilityEngine::visible_slice(world, persona)?;
        let threats = ThreatAssessor::assess(world, &persona.id, &visible_slice, self.config);
        let query = KnowledgeInjector::build_query(world, persona, &visible_slice, self.config);
        let doctrine_snippets = KnowledgeInjector::inject(self.knowledge, &query, self.config);
        let last_actions_summary = self.log.last_summary_for(&persona.id);

        Ok(TurnBrief {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            turn: world.turn,
            for_persona: persona.id.clone(),
            visible_slice,
            threats,
            doctrine_snippets,
            last_actions_summary,
        })
    }

    /// Build briefs for every persona of the turn, on the worker pool when
    /// one is supplied. Output is sorted by persona id so parallelism never
    /// changes observable order.
    pub fn build_all(
        &self,
        world: &WorldState,
        personas: &[PersonaCard],
        pool: Option<&rayon::ThreadPool>,
    ) -> Vec<(String, Result<TurnBrief, SetupError>)> {
        let mut results: Vec<(String, Result<TurnBrief, SetupError>)> = match pool {
            Some(pool) => pool.install(|| {
                personas
                    .par_iter()
                    .map(|persona| (persona.id.clone(), self.build(world, persona)))
                    .collect()
            }),
            None => personas
                .iter()
                .map(|persona| (persona.id.clone(), self.build(world, persona)))
                .collect(),
        };
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::StaticKnowledgeBase;
    use contracts::{Belief, Entity, KnowledgeChannel, KnowledgeScope, Relation};
    use std::collections::BTreeMap;

    fn entity(id: &str, pos: &str, tags: &[&str]) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type: "unit".to_string(),
            name: Some(id.to_string()),
            pos: Some(pos.to_string()),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            assets: BTreeMap::new(),
        }
    }

    fn persona(id: &str, faction: &str) -> PersonaCard {
        PersonaCard {
            id: id.to_string(),
            faction: faction.to_string(),
            beliefs: vec![Belief {
                proposition: "hold the pass".to_string(),
                weight: 0.8,
            }],
            traits: Vec::new(),
            knowledge_scope: vec![KnowledgeScope {
                channel: KnowledgeChannel::Visual,
                range: 4,
            }],
            taboos: Vec::new(),
        }
    }

    fn small_world() -> WorldState {
        let mut world = WorldState::new();
        world.turn = 2;
        world.entities = vec![
            entity("scout-1", "0,0", &["ironbound"]),
            entity("scout-2", "2,0", &["ironbound"]),
            entity("raider-1", "1,1", &["veilborn"]),
        ];
        world.relations = vec![Relation {
            src: "scout-1".to_string(),
            rel: "hostile_to".to_string(),
            dst: "raider-1".to_string(),
        }];
        world
    }

    #[test]
    fn brief_composes_all_sections() {
        let world = small_world();
        let config = EngineConfig::default();
        let mut kb = StaticKnowledgeBase::new();
        kb.insert("ironbound", "never yield the pass", "fm-1");
        let log = CampaignLog::new(7);
        let builder = BriefBuilder::new(&config, &kb, &log);

        let brief = builder.build(&world, &persona("scout-1", "ironbound")).unwrap();
        assert_eq!(brief.turn, 2);
        assert_eq!(brief.for_persona, "scout-1");
        assert!(brief.visible_slice.contains_entity("scout-1"));
        assert!(brief.visible_slice.contains_entity("raider-1"));
        assert_eq!(brief.threats.len(), 1);
        assert_eq!(brief.doctrine_snippets.len(), 1);
        assert!(brief.last_actions_summary.is_none());
        assert!(brief.validate().is_ok());
    }

    #[test]
    fn unknown_persona_surfaces_setup_error() {
        let world = small_world();
        let config = EngineConfig::default();
        let kb = StaticKnowledgeBase::new();
        let log = CampaignLog::new(7);
        let builder = BriefBuilder::new(&config, &kb, &log);

        let result = builder.build(&world, &persona("nobody", "ironbound"));
        assert!(matches!(
            result,
            Err(SetupError::PersonaEntityMissing { .. })
        ));
    }

    #[test]
    fn parallel_and_serial_builds_agree() {
        let world = small_world();
        let config = EngineConfig::default();
        let mut kb = StaticKnowledgeBase::new();
        kb.insert("ironbound", "never yield the pass", "fm-1");
        let log = CampaignLog::new(7);
        let builder = BriefBuilder::new(&config, &kb, &log);

        let personas = vec![
            persona("scout-2", "ironbound"),
            persona("scout-1", "ironbound"),
        ];
        let serial = builder.build_all(&world, &personas, None);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let parallel = builder.build_all(&world, &personas, Some(&pool));

        let serial_ids: Vec<&str> = serial.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(serial_ids, vec!["scout-1", "scout-2"]);
        assert_eq!(
            serial
                .iter()
                .map(|(id, r)| (id.clone(), r.clone().unwrap()))
                .collect::<Vec<_>>(),
            parallel
                .iter()
                .map(|(id, r)| (id.clone(), r.clone().unwrap()))
                .collect::<Vec<_>>()
        );
    }
}
