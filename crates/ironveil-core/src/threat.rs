//! Threat assessment: hostile relations restricted to the visible set.

use contracts::{DistanceBand, EngineConfig, Threat, VisibleSlice, WorldState};

use crate::visibility::entity_distance;

/// Relation kinds that mark hostility toward the persona.
pub const HOSTILE_RELATIONS: [&str; 2] = ["hostile_to", "enemy_of"];

/// Derives a prioritized threat list from hostile relations.
pub struct ThreatAssessor;

impl ThreatAssessor {
    /// Scan relations for hostiles of `persona_id` inside the visible set.
    ///
    /// A hostile entity outside the visible set is never reported; the
    /// information limit holds even for known enemies. Output is ordered
    /// close before medium before far, ties broken by entity id.
    pub fn assess(
        world: &WorldState,
        persona_id: &str,
        visible: &VisibleSlice,
        config: &EngineConfig,
    ) -> Vec<Threat> {
        let own = world.entity(persona_id);

        let mut threats: Vec<Threat> = world
            .relations
            .iter()
            .filter(|relation| {
                relation.src == persona_id
                    && HOSTILE_RELATIONS.contains(&relation.rel.as_str())
                    && relation.dst != persona_id
                    && visible.contains_entity(&relation.dst)
            })
            .filter_map(|relation| world.entity(&relation.dst))
            .map(|hostile| {
                let distance = own.and_then(|own| entity_distance(own, hostile));
                Threat {
                    id: hostile.id.clone(),
                    distance: Self::band(distance, config),
                }
            })
            .collect();

        threats.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
        threats.dedup();
        threats
    }

    /// Classify a distance into a band; unknown distances are `far`.
    fn band(distance: Option<u64>, config: &EngineConfig) -> DistanceBand {
        match distance {
            Some(d) if d <= config.close_distance => DistanceBand::Close,
            Some(d) if d <= config.medium_distance => DistanceBand::Medium,
            _ => DistanceBand::Far,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Entity, Relation};
    use std::collections::{BTreeMap, BTreeSet};

    fn entity(id: &str, pos: Option<&str>) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type: "unit".to_string(),
            name: None,
            pos: pos.map(str::to_string),
            tags: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    fn hostile(src: &str, dst: &str) -> Relation {
        Relation {
            src: src.to_string(),
            rel: "hostile_to".to_string(),
            dst: dst.to_string(),
        }
    }

    fn visible(ids: &[&str]) -> VisibleSlice {
        VisibleSlice {
            entities: ids.iter().map(|id| (*id).to_string()).collect(),
            facts: BTreeSet::new(),
        }
    }

    fn assess_world(world: &WorldState, visible: &VisibleSlice) -> Vec<Threat> {
        ThreatAssessor::assess(world, "scout-1", visible, &EngineConfig::default())
    }

    #[test]
    fn hostiles_outside_the_visible_set_are_never_reported() {
        let mut world = WorldState::new();
        world.entities = vec![
            entity("scout-1", Some("0,0")),
            entity("raider-1", Some("1,1")),
            entity("raider-2", Some("30,30")),
        ];
        world.relations = vec![hostile("scout-1", "raider-1"), hostile("scout-1", "raider-2")];

        let threats = assess_world(&world, &visible(&["scout-1", "raider-1"]));
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].id, "raider-1");
    }

    #[test]
    fn distance_bands_follow_configured_thresholds() {
        let mut world = WorldState::new();
        world.entities = vec![
            entity("scout-1", Some("0,0")),
            entity("close-1", Some("1,1")),
            entity("medium-1", Some("2,3")),
            entity("far-1", Some("8,8")),
        ];
        world.relations = vec![
            hostile("scout-1", "close-1"),
            hostile("scout-1", "medium-1"),
            hostile("scout-1", "far-1"),
        ];

        let threats = assess_world(
            &world,
            &visible(&["scout-1", "close-1", "medium-1", "far-1"]),
        );
        let bands: Vec<(&str, DistanceBand)> = threats
            .iter()
            .map(|t| (t.id.as_str(), t.distance))
            .collect();
        assert_eq!(
            bands,
            vec![
                ("close-1", DistanceBand::Close),
                ("medium-1", DistanceBand::Medium),
                ("far-1", DistanceBand::Far),
            ]
        );
    }

    #[test]
    fn unknown_hostile_position_classifies_as_far() {
        let mut world = WorldState::new();
        world.entities = vec![entity("scout-1", Some("0,0")), entity("ghost", None)];
        world.relations = vec![hostile("scout-1", "ghost")];

        let threats = assess_world(&world, &visible(&["scout-1", "ghost"]));
        assert_eq!(threats[0].distance, DistanceBand::Far);
    }

    #[test]
    fn only_hostile_relation_kinds_count() {
        let mut world = WorldState::new();
        world.entities = vec![
            entity("scout-1", Some("0,0")),
            entity("friend", Some("1,0")),
            entity("nemesis", Some("1,1")),
        ];
        world.relations = vec![
            Relation {
                src: "scout-1".to_string(),
                rel: "allied_with".to_string(),
                dst: "friend".to_string(),
            },
            Relation {
                src: "scout-1".to_string(),
                rel: "enemy_of".to_string(),
                dst: "nemesis".to_string(),
            },
        ];

        let threats = assess_world(&world, &visible(&["scout-1", "friend", "nemesis"]));
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].id, "nemesis");
    }

    #[test]
    fn relations_from_other_entities_are_ignored() {
        let mut world = WorldState::new();
        world.entities = vec![entity("scout-1", Some("0,0")), entity("raider-1", Some("1,0"))];
        world.relations = vec![hostile("raider-1", "scout-1")];

        let threats = assess_world(&world, &visible(&["scout-1", "raider-1"]));
        assert!(threats.is_empty());
    }

    #[test]
    fn no_hostiles_is_an_empty_list_not_an_error() {
        let mut world = WorldState::new();
        world.entities = vec![entity("scout-1", Some("0,0"))];
        let threats = assess_world(&world, &visible(&["scout-1"]));
        assert!(threats.is_empty());
    }
}
