//! Fog-of-war visibility: per-channel reachable sets over the world state.
//!
//! Each knowledge channel has its own reachability rule: `visual` reaches
//! entities within Manhattan range of the persona's position, `radio`
//! reaches radio-capable entities within range, and `intel` reaches the
//! persona's whole faction irrespective of distance. The union of all
//! channel sets, plus the persona's own entity, is the visible slice.

use std::collections::BTreeSet;

use contracts::{
    Entity, KnowledgeChannel, KnowledgeScope, PersonaCard, VisibleSlice, WorldState,
};
use thiserror::Error;

/// Tag marking an entity as radio-capable.
pub const RADIO_TAG: &str = "radio";

/// Fatal per-agent setup failures, distinct from law violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// The acting persona has no entity in the world: a scenario wiring
    /// error, not a rule breach.
    #[error("persona '{persona_id}' has no entity in the world state")]
    PersonaEntityMissing { persona_id: String },
}

/// Parse a `"x,y"` position into integer coordinates.
///
/// Anything else is an unknown position: maximally far, never visually
/// reachable.
pub fn parse_pos(raw: &str) -> Option<(i64, i64)> {
    let (x, y) = raw.split_once(',')?;
    let x = x.trim().parse::<i64>().ok()?;
    let y = y.trim().parse::<i64>().ok()?;
    Some((x, y))
}

/// Manhattan distance between two entities, when both positions are known.
pub fn entity_distance(a: &Entity, b: &Entity) -> Option<u64> {
    let (ax, ay) = parse_pos(a.pos.as_deref()?)?;
    let (bx, by) = parse_pos(b.pos.as_deref()?)?;
    Some(ax.abs_diff(bx) + ay.abs_diff(by))
}

/// Computes the set of entity and fact ids one persona may observe.
pub struct VisibilityEngine;

impl VisibilityEngine {
    /// Compute the persona's visible slice for this world state.
    ///
    /// Fails fast when the persona's own entity is absent; an empty slice
    /// apart from the persona itself is a valid result, not an error.
    pub fn visible_slice(
        world: &WorldState,
        persona: &PersonaCard,
    ) -> Result<VisibleSlice, SetupError> {
        let own = world
            .entity(&persona.id)
            .ok_or_else(|| SetupError::PersonaEntityMissing {
                persona_id: persona.id.clone(),
            })?;

        let mut entities = BTreeSet::new();
        entities.insert(persona.id.clone());
        for scope in &persona.knowledge_scope {
            entities.extend(Self::channel_reachable(world, persona, own, *scope));
        }

        // A fact is visible only if it concerns something the agent can
        // currently perceive: its text must reference a visible entity id.
        let facts = world
            .facts
            .iter()
            .filter(|fact| entities.iter().any(|id| fact.text.contains(id.as_str())))
            .map(|fact| fact.id.clone())
            .collect();

        Ok(VisibleSlice { entities, facts })
    }

    /// The reachable set for one knowledge-scope entry.
    fn channel_reachable(
        world: &WorldState,
        persona: &PersonaCard,
        own: &Entity,
        scope: KnowledgeScope,
    ) -> BTreeSet<String> {
        world
            .entities
            .iter()
            .filter(|entity| entity.id != persona.id)
            .filter(|entity| match scope.channel {
                KnowledgeChannel::Visual => {
                    entity_distance(own, entity).is_some_and(|d| d <= scope.range)
                }
                KnowledgeChannel::Radio => {
                    entity.has_tag(RADIO_TAG)
                        && entity_distance(own, entity).is_some_and(|d| d <= scope.range)
                }
                KnowledgeChannel::Intel => entity.has_tag(&persona.faction),
            })
            .map(|entity| entity.id.clone())
            .collect()
    }
}
