//! Pairwise collision resolution over solid entities.

use glam::Vec2;
use tank_arena_core::{EntityId, EntityKind, Event, GridPos};

use crate::registry::EntityRegistry;

/// Entities closer than this (Euclidean, cell units) are colliding. The
/// sub-unit threshold leaves a visual buffer between adjacent cells.
pub(crate) const COLLISION_THRESHOLD: f32 = 0.8;

/// Scans live, alive, solid entities and dispatches symmetric collision
/// reactions for every overlapping pair.
///
/// Candidates are filtered into a stable id-ordered list before any
/// reaction runs. Tank pairs never collide with each other, which keeps
/// transient occupancy overlap from causing damage; the exclusion is checked
/// before dispatch.
pub(crate) fn resolve(registry: &mut EntityRegistry, out_events: &mut Vec<Event>) {
    let candidates: Vec<EntityId> = registry
        .iter()
        .filter(|entity| entity.is_alive() && entity.is_solid())
        .map(|entity| entity.id)
        .collect();

    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            let first = candidates[i];
            let second = candidates[j];

            let Some((pos_a, kind_a)) = probe(registry, first) else {
                continue;
            };
            let Some((pos_b, kind_b)) = probe(registry, second) else {
                continue;
            };

            if !are_colliding(pos_a, pos_b) {
                continue;
            }
            if kind_a == EntityKind::Tank && kind_b == EntityKind::Tank {
                // Two tanks: occupancy overlap is not a damage event.
                continue;
            }

            dispatch(registry, first, second, out_events);
        }
    }
}

fn probe(registry: &EntityRegistry, id: EntityId) -> Option<(GridPos, EntityKind)> {
    let entity = registry.get(id)?;
    Some((entity.pos, entity.kind()))
}

fn are_colliding(a: GridPos, b: GridPos) -> bool {
    center_of(a).distance(center_of(b)) < COLLISION_THRESHOLD
}

fn center_of(pos: GridPos) -> Vec2 {
    Vec2::new(pos.x() as f32, pos.y() as f32)
}

fn dispatch(
    registry: &mut EntityRegistry,
    first: EntityId,
    second: EntityId,
    out_events: &mut Vec<Event>,
) {
    let Some(mut entity_a) = registry.take(first) else {
        return;
    };
    let Some(mut entity_b) = registry.take(second) else {
        registry.restore(entity_a);
        return;
    };

    if let Some(amount) = entity_a.on_collision(&entity_b) {
        out_events.push(Event::DamageInflicted {
            entity: entity_a.id,
            amount,
        });
    }
    if let Some(amount) = entity_b.on_collision(&entity_a) {
        out_events.push(Event::DamageInflicted {
            entity: entity_b.id,
            amount,
        });
    }

    registry.restore(entity_a);
    registry.restore(entity_b);
}
