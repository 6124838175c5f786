//! Translation of accepted actions into world mutations, and the fold of a
//! mutation into the Director's owned world state.

use contracts::{
    ActionType, AssetDelta, CharacterAction, EngineConfig, Fact, PositionUpdate, WorldMutation,
    WorldState, ASSET_ENERGY,
};

use crate::visibility::parse_pos;

/// Derive the world-mutation instruction for an accepted action.
///
/// Deltas are computed so that no tracked resource can go below zero: the
/// adjudicator already guarantees the actor can pay, and attack damage is
/// capped at the target's remaining energy.
pub(crate) fn mutation_for(
    world: &WorldState,
    persona_id: &str,
    action: &CharacterAction,
    config: &EngineConfig,
) -> WorldMutation {
    let mut mutation = WorldMutation {
        actor_id: persona_id.to_string(),
        ..WorldMutation::default()
    };

    let actor = world.entity(persona_id);
    let cost = match action.action_type {
        ActionType::Attack => config.attack_energy_cost,
        ActionType::Move => config.move_energy_cost,
        _ => 0,
    };
    if cost > 0 && actor.and_then(|a| a.asset(ASSET_ENERGY)).is_some() {
        mutation.asset_deltas.push(AssetDelta {
            entity_id: persona_id.to_string(),
            asset: ASSET_ENERGY.to_string(),
            delta: -cost,
        });
    }

    match action.action_type {
        ActionType::Attack => {
            if let Some(target) = action.target.as_deref().and_then(|id| world.entity(id)) {
                if let Some(energy) = target.asset(ASSET_ENERGY) {
                    let damage = config.attack_damage.min(energy.max(0));
                    if damage > 0 {
                        mutation.asset_deltas.push(AssetDelta {
                            entity_id: target.id.clone(),
                            asset: ASSET_ENERGY.to_string(),
                            delta: -damage,
                        });
                    }
                }
            }
        }
        ActionType::Move => {
            let from = actor.and_then(|a| a.pos.as_deref()).and_then(parse_pos);
            let to = action
                .target
                .as_deref()
                .and_then(|id| world.entity(id))
                .and_then(|t| t.pos.as_deref())
                .and_then(parse_pos);
            if let (Some(from), Some(to)) = (from, to) {
                let next = step_toward(from, to, config.move_step.max(0));
                if next != from {
                    mutation.position_updates.push(PositionUpdate {
                        entity_id: persona_id.to_string(),
                        pos: format!("{},{}", next.0, next.1),
                    });
                }
            }
        }
        _ => {}
    }

    for (index, effect) in action.expected_effects.iter().enumerate() {
        mutation.appended_facts.push(Fact {
            id: format!("fact-t{}-n{}", world.turn, world.facts.len() + index),
            text: effect.fact.clone(),
            confidence: action.confidence.clamp(0.0, 1.0),
            source_id: persona_id.to_string(),
        });
    }

    mutation
}

/// Fold a mutation into the world. Missing entities are skipped rather than
/// invented; asset values never drop below zero.
pub(crate) fn apply_mutation(world: &mut WorldState, mutation: &WorldMutation) {
    for delta in &mutation.asset_deltas {
        if let Some(entity) = world.entity_mut(&delta.entity_id) {
            let value = entity.assets.entry(delta.asset.clone()).or_insert(0);
            *value = (*value + delta.delta).max(0);
        }
    }
    for update in &mutation.position_updates {
        if let Some(entity) = world.entity_mut(&update.entity_id) {
            entity.pos = Some(update.pos.clone());
        }
    }
    world.facts.extend(mutation.appended_facts.iter().cloned());
}

/// One step of at most `step` cells along the axis of greatest distance.
fn step_toward(from: (i64, i64), to: (i64, i64), step: i64) -> (i64, i64) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if dx == 0 && dy == 0 {
        return from;
    }
    if dx.abs() >= dy.abs() {
        (from.0 + dx.signum() * step.min(dx.abs()), from.1)
    } else {
        (from.0, from.1 + dy.signum() * step.min(dy.abs()))
    }
}
