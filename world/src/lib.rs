#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Tank Arena simulation.
//!
//! The world owns the terrain grid and the entity registry, and mutates them
//! exclusively through [`apply`]. One [`Command::Tick`] runs a full frame:
//! pending spawns become live, every alive entity updates against the same
//! membership snapshot, entities that ran out of health are swept, and the
//! collision resolver dispatches reactions for overlapping pairs.

use std::time::Duration;

use thiserror::Error;

use tank_arena_core::{Command, Controller, Direction, EntityId, Event, GridPos, TankCharacteristics};

mod collision;
mod entity;
pub mod map;
mod registry;

use entity::{Entity, EntityState};
use map::Grid;
use registry::EntityRegistry;

/// Maximum per-axis overlap at which a destination cell counts as occupied
/// by another tank.
const TANK_OVERLAP_TOLERANCE: f32 = 1.0;

/// Maximum per-axis offset at which a projectile registers a hit on a tank.
const PROJECTILE_HIT_TOLERANCE: f32 = 0.5;

/// Hard failure raised when a caller holds a stale entity id.
///
/// A miss here indicates a logic bug upstream, so it propagates instead of
/// degrading into a sentinel value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("no live entity with id {}", .id.get())]
pub struct EntityNotFound {
    /// Identifier that failed to resolve.
    pub id: EntityId,
}

/// Represents the authoritative arena state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    registry: EntityRegistry,
}

impl World {
    /// Creates a world around an already generated grid.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            registry: EntityRegistry::new(),
        }
    }

    /// Queues a tank into the pending-add buffer and returns its id.
    ///
    /// The tank becomes live at the next tick's flush. `health` lets the
    /// orchestrator carry a surviving tank's remaining health across levels;
    /// fresh tanks pass their profile's maximum.
    pub fn spawn_tank(
        &mut self,
        pos: GridPos,
        characteristics: TankCharacteristics,
        controller: Controller,
        health: i32,
    ) -> EntityId {
        let id = self.registry.allocate_id();
        log::debug!(
            "queueing tank {} at ({}, {})",
            id.get(),
            pos.x(),
            pos.y()
        );
        self.registry
            .queue_add(Entity::tank(id, pos, characteristics, controller, health));
        id
    }

    /// Applies damage directly to a live entity.
    pub fn inflict_damage(&mut self, id: EntityId, amount: i32) -> Result<(), EntityNotFound> {
        match self.registry.get_mut(id) {
            Some(entity) => {
                entity.take_damage(amount);
                Ok(())
            }
            None => Err(EntityNotFound { id }),
        }
    }
}

/// Applies the provided command to the world, mutating state
/// deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => tick(world, dt, out_events),
        Command::MoveTank { tank, direction } => move_tank(world, tank, direction, out_events),
        Command::ShootTank { tank } => shoot_tank(world, tank, out_events),
    }
}

fn tick(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    out_events.push(Event::TimeAdvanced { dt });
    world.registry.flush_adds(out_events);

    for id in world.registry.live_ids() {
        let Some(mut entity) = world.registry.take(id) else {
            continue;
        };
        if entity.is_alive() {
            tick_entity(
                &mut entity,
                dt,
                &mut world.grid,
                &mut world.registry,
                out_events,
            );
        } else {
            world.registry.queue_remove(id);
        }
        world.registry.restore(entity);
    }

    world.registry.sweep_dead();
    world.registry.flush_removals(out_events);
    collision::resolve(&mut world.registry, out_events);
}

fn tick_entity(
    entity: &mut Entity,
    dt: Duration,
    grid: &mut Grid,
    registry: &mut EntityRegistry,
    out_events: &mut Vec<Event>,
) {
    if let Some(tank) = entity.as_tank_mut() {
        tank.move_cooldown = tank.move_cooldown.saturating_sub(dt);
        tank.shoot_cooldown = tank.shoot_cooldown.saturating_sub(dt);
        return;
    }

    tick_projectile(entity, dt, grid, registry, out_events);
}

/// Advances a projectile: one whole-cell step per `1 / speed` seconds, then
/// a hit test against every tank other than its shooter.
fn tick_projectile(
    entity: &mut Entity,
    dt: Duration,
    grid: &mut Grid,
    registry: &mut EntityRegistry,
    out_events: &mut Vec<Event>,
) {
    let EntityState::Projectile(ref mut projectile) = entity.state else {
        return;
    };

    projectile.step_timer = projectile.step_timer.saturating_add(dt);
    if projectile.step_timer >= step_interval(projectile.speed) {
        projectile.step_timer = Duration::ZERO;
        let next = entity.pos.step(projectile.direction);

        if !grid.in_bounds(next) {
            entity.health = 0;
        } else if !grid.is_cell_passable_for_projectile(next) {
            if let Some(state) = grid.damage_wall(next) {
                out_events.push(Event::WallDamaged { cell: next, state });
            }
            entity.health = 0;
        } else {
            entity.pos = next;
        }
    }

    let damage = projectile.damage;
    let shooter = projectile.shooter;
    if entity.health <= 0 {
        return;
    }

    for other in registry.iter_mut() {
        if !other.is_alive() || other.as_tank().is_none() {
            continue;
        }
        if Some(other.id) == shooter {
            continue;
        }
        if axis_overlap(other.pos, entity.pos, PROJECTILE_HIT_TOLERANCE) {
            other.take_damage(damage);
            out_events.push(Event::DamageInflicted {
                entity: other.id,
                amount: damage,
            });
            // One hit is all a projectile gets.
            entity.health = 0;
            break;
        }
    }
}

fn step_interval(speed: f32) -> Duration {
    if speed > 0.0 {
        Duration::from_secs_f32(1.0 / speed)
    } else {
        Duration::MAX
    }
}

fn move_tank(world: &mut World, tank: EntityId, direction: Direction, out_events: &mut Vec<Event>) {
    let occupancy: Vec<(EntityId, GridPos)> = world
        .registry
        .iter()
        .filter(|entity| entity.is_alive() && entity.as_tank().is_some())
        .map(|entity| (entity.id, entity.pos))
        .collect();

    let grid = &world.grid;
    let Some(entity) = world.registry.get_mut(tank) else {
        return;
    };
    if !entity.is_alive() {
        return;
    }
    let from = entity.pos;
    let Some(state) = entity.as_tank_mut() else {
        return;
    };
    if state.move_cooldown > Duration::ZERO {
        return;
    }

    // Facing updates even when the step itself is blocked.
    state.facing = direction;

    let target = from.step(direction);
    if !grid.is_cell_passable(target) {
        return;
    }
    if occupancy
        .iter()
        .any(|(id, pos)| *id != tank && axis_overlap(*pos, target, TANK_OVERLAP_TOLERANCE))
    {
        return;
    }

    state.move_cooldown = state.characteristics.move_delay;
    entity.pos = target;
    out_events.push(Event::TankMoved {
        tank,
        from,
        to: target,
    });
}

fn shoot_tank(world: &mut World, tank: EntityId, out_events: &mut Vec<Event>) {
    let Some(entity) = world.registry.get(tank) else {
        return;
    };
    if !entity.is_alive() {
        return;
    }
    let pos = entity.pos;
    let Some(state) = entity.as_tank() else {
        return;
    };
    if state.shoot_cooldown > Duration::ZERO {
        return;
    }

    let facing = state.facing;
    let speed = state.characteristics.projectile_speed;
    let damage = state.characteristics.damage;
    let delay = state.characteristics.shoot_delay;

    let projectile = world.registry.allocate_id();
    world.registry.queue_add(Entity::projectile(
        projectile,
        pos,
        facing,
        speed,
        damage,
        Some(tank),
    ));
    if let Some(state) = world.registry.get_mut(tank).and_then(Entity::as_tank_mut) {
        state.shoot_cooldown = delay;
    }
    out_events.push(Event::ProjectileFired {
        projectile,
        shooter: tank,
    });
}

fn axis_overlap(a: GridPos, b: GridPos, tolerance: f32) -> bool {
    (a.x().abs_diff(b.x()) as f32) < tolerance && (a.y().abs_diff(b.y()) as f32) < tolerance
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tank_arena_core::{
        EntitySnapshot, ProjectileSnapshot, ProjectileView, TankSnapshot, TankView,
    };

    use super::{EntityId, EntityNotFound, World};
    use crate::map::Grid;

    /// Provides read-only access to the terrain grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Captures a read-only view of every live tank.
    #[must_use]
    pub fn tank_view(world: &World) -> TankView {
        let snapshots: Vec<TankSnapshot> = world
            .registry
            .iter()
            .filter_map(|entity| {
                let tank = entity.as_tank()?;
                Some(TankSnapshot {
                    id: entity.id,
                    pos: entity.pos,
                    facing: tank.facing,
                    health: entity.health,
                    characteristics: tank.characteristics,
                    controller: tank.controller,
                    move_ready: tank.move_cooldown.is_zero(),
                    shoot_ready: tank.shoot_cooldown.is_zero(),
                })
            })
            .collect();
        TankView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of every live projectile.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let snapshots: Vec<ProjectileSnapshot> = world
            .registry
            .iter()
            .filter_map(|entity| {
                let projectile = entity.as_projectile()?;
                Some(ProjectileSnapshot {
                    id: entity.id,
                    pos: entity.pos,
                    direction: projectile.direction,
                    damage: projectile.damage,
                    shooter: projectile.shooter,
                })
            })
            .collect();
        ProjectileView::from_snapshots(snapshots)
    }

    /// Finds the live player tank, if one exists.
    #[must_use]
    pub fn player_tank(world: &World) -> Option<TankSnapshot> {
        tank_view(world)
            .into_vec()
            .into_iter()
            .find(|tank| tank.is_player() && tank.is_alive())
    }

    /// Looks up a single live entity by id.
    ///
    /// A miss is a hard [`EntityNotFound`] error, never a sentinel.
    pub fn entity_snapshot(world: &World, id: EntityId) -> Result<EntitySnapshot, EntityNotFound> {
        match world.registry.get(id) {
            Some(entity) => Ok(EntitySnapshot {
                id: entity.id,
                pos: entity.pos,
                health: entity.health,
                kind: entity.kind(),
            }),
            None => Err(EntityNotFound { id }),
        }
    }

    /// Number of entities currently in the live set.
    #[must_use]
    pub fn live_entity_count(world: &World) -> usize {
        world.registry.live_count()
    }
}
