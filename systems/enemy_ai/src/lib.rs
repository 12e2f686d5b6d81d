#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy decision system: retargeting, steering, and fire control.
//!
//! The system consumes immutable world views each tick and responds with
//! [`Command`] values; it never touches world state directly. Per-enemy
//! cycle state (current wander target and the decision countdown) lives
//! inside the system keyed by entity id, while the per-tank behavior
//! constants ride on the tank's controller.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use tank_arena_core::{
    AiProfile, Command, Controller, Direction, EntityId, GridPos, TankSnapshot, TankView,
};
use tank_arena_world::map::Grid;

/// Bounded number of samples taken when hunting for a reachable wander
/// target; exhaustion keeps the last sample.
const RETARGET_ATTEMPTS: u32 = 10;

/// Maximum lateral offset at which the player still counts as straight
/// ahead of the muzzle.
const ALIGNMENT_TOLERANCE: f32 = 0.5;

/// Pure system that drives every AI-controlled tank.
#[derive(Debug, Default)]
pub struct EnemyAi {
    states: BTreeMap<EntityId, AiTankState>,
}

#[derive(Clone, Copy, Debug)]
struct AiTankState {
    target: GridPos,
    until_decision: Duration,
}

impl EnemyAi {
    /// Creates a new enemy system with no tracked tanks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every enemy's decision cycle and emits movement and fire
    /// commands.
    ///
    /// Enemies are processed in ascending id order and randomness is drawn
    /// from the shared stream, so identical inputs always produce identical
    /// command batches.
    pub fn handle<R: Rng>(
        &mut self,
        dt: Duration,
        grid: &Grid,
        tanks: &TankView,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        self.prune_missing(tanks);

        let player = tanks
            .iter()
            .find(|tank| tank.is_player() && tank.is_alive())
            .copied();

        for tank in tanks.iter() {
            if !tank.is_alive() {
                continue;
            }
            let Controller::Enemy(profile) = tank.controller else {
                continue;
            };

            let state = self.states.entry(tank.id).or_insert(AiTankState {
                target: tank.pos,
                until_decision: profile.decision_interval,
            });

            state.until_decision = state.until_decision.saturating_sub(dt);
            if state.until_decision.is_zero() {
                state.target = pick_wander_target(grid, rng);
                state.until_decision = profile.decision_interval;
            }
            let target = state.target;

            if let Some(direction) = steer(tank, target, grid, tanks, rng) {
                out.push(Command::MoveTank {
                    tank: tank.id,
                    direction,
                });
            }

            if let Some(player) = &player {
                if should_fire(tank, player, profile, grid) {
                    out.push(Command::ShootTank { tank: tank.id });
                }
            }
        }
    }

    fn prune_missing(&mut self, tanks: &TankView) {
        self.states.retain(|id, _| {
            tanks
                .iter()
                .any(|tank| tank.id == *id && tank.is_alive() && !tank.is_player())
        });
    }
}

/// Samples random interior cells until one is passable, keeping the final
/// sample when the attempt budget runs out.
fn pick_wander_target<R: Rng>(grid: &Grid, rng: &mut R) -> GridPos {
    let mut candidate = GridPos::new(1, 1);
    for _ in 0..RETARGET_ATTEMPTS {
        candidate = GridPos::new(
            rng.gen_range(1..grid.width() - 1),
            rng.gen_range(1..grid.height() - 1),
        );
        if grid.is_cell_passable(candidate) {
            break;
        }
    }
    candidate
}

/// Picks the next step toward the target, or `None` to stay put.
///
/// The axis with the larger displacement is preferred, ties steering
/// vertically. A blocked preferred direction falls back to the remaining
/// three in shuffled order.
fn steer<R: Rng>(
    tank: &TankSnapshot,
    target: GridPos,
    grid: &Grid,
    tanks: &TankView,
    rng: &mut R,
) -> Option<Direction> {
    if tank.pos == target {
        return None;
    }

    let dx = target.x() - tank.pos.x();
    let dy = target.y() - tank.pos.y();
    let preferred = if dx.abs() > dy.abs() {
        if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    };

    if can_enter(tank, preferred, grid, tanks) {
        return Some(preferred);
    }

    let mut fallbacks: Vec<Direction> = Direction::ALL
        .iter()
        .copied()
        .filter(|direction| *direction != preferred)
        .collect();
    fallbacks.shuffle(rng);
    fallbacks
        .into_iter()
        .find(|direction| can_enter(tank, *direction, grid, tanks))
}

/// The same feasibility check the world applies when committing a move:
/// terrain passability plus single-cell tank occupancy.
fn can_enter(tank: &TankSnapshot, direction: Direction, grid: &Grid, tanks: &TankView) -> bool {
    let destination = tank.pos.step(direction);
    if !grid.is_cell_passable(destination) {
        return false;
    }
    !tanks
        .iter()
        .any(|other| other.id != tank.id && other.is_alive() && other.pos == destination)
}

fn should_fire(
    tank: &TankSnapshot,
    player: &TankSnapshot,
    profile: AiProfile,
    grid: &Grid,
) -> bool {
    if center_of(player.pos).distance(center_of(tank.pos)) > profile.detection_range {
        return false;
    }
    aligned_with_facing(tank, player) && line_of_sight_clear(grid, tank.pos, player.pos)
}

/// The tank only fires along its current facing; the player must be ahead on
/// that axis and laterally within [`ALIGNMENT_TOLERANCE`].
fn aligned_with_facing(tank: &TankSnapshot, player: &TankSnapshot) -> bool {
    let lateral_x = (player.pos.x().abs_diff(tank.pos.x()) as f32) < ALIGNMENT_TOLERANCE;
    let lateral_y = (player.pos.y().abs_diff(tank.pos.y()) as f32) < ALIGNMENT_TOLERANCE;
    match tank.facing {
        Direction::Up => player.pos.y() < tank.pos.y() && lateral_x,
        Direction::Down => player.pos.y() > tank.pos.y() && lateral_x,
        Direction::Left => player.pos.x() < tank.pos.x() && lateral_y,
        Direction::Right => player.pos.x() > tank.pos.x() && lateral_y,
    }
}

/// Walks the integer line between two cells and reports whether every
/// intermediate cell is projectile-passable.
///
/// Both endpoints are excluded: the shooter stands on one and the target on
/// the other.
#[must_use]
pub fn line_of_sight_clear(grid: &Grid, from: GridPos, to: GridPos) -> bool {
    let dx = (to.x() - from.x()).abs();
    let dy = (to.y() - from.y()).abs();
    let step_x = if from.x() < to.x() { 1 } else { -1 };
    let step_y = if from.y() < to.y() { 1 } else { -1 };
    let mut err = dx - dy;
    let mut x = from.x();
    let mut y = from.y();

    loop {
        if x == to.x() && y == to.y() {
            break;
        }

        if (x != from.x() || y != from.y())
            && !grid.is_cell_passable_for_projectile(GridPos::new(x, y))
        {
            return false;
        }

        let double_err = 2 * err;
        if double_err > -dy {
            err -= dy;
            x += step_x;
        }
        if double_err < dx {
            err += dx;
            y += step_y;
        }
    }

    true
}

fn center_of(pos: GridPos) -> Vec2 {
    Vec2::new(pos.x() as f32, pos.y() as f32)
}
