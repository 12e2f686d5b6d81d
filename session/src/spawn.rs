//! Tank placement and enemy profile generation for level starts.

use glam::Vec2;
use rand::Rng;
use std::time::Duration;
use tank_arena_core::{GridPos, TankCharacteristics};
use tank_arena_world::map::Grid;

/// Attempt budget per enemy position before placement degrades to fewer
/// enemies.
const PLACEMENT_ATTEMPTS: u32 = 32;

/// Minimum Euclidean spacing between a fresh enemy and every tank placed
/// before it.
const MIN_TANK_SPACING: f32 = 2.0;

/// Finds the passable cell closest to `origin` in an expanding diamond.
///
/// Rings are visited by growing Manhattan radius in a fixed order, so the
/// result is deterministic. Returns `None` only when the grid has no
/// passable cell at all.
pub(crate) fn nearest_passable(grid: &Grid, origin: GridPos) -> Option<GridPos> {
    let max_radius = grid.width() + grid.height();
    for radius in 0..=max_radius {
        for dx in -radius..=radius {
            let dy = radius - dx.abs();
            let below = GridPos::new(origin.x() + dx, origin.y() + dy);
            if grid.is_cell_passable(below) {
                return Some(below);
            }
            if dy != 0 {
                let above = GridPos::new(origin.x() + dx, origin.y() - dy);
                if grid.is_cell_passable(above) {
                    return Some(above);
                }
            }
        }
    }
    None
}

/// Samples a passable interior cell at least [`MIN_TANK_SPACING`] away from
/// every already placed tank.
///
/// Gives up after a bounded number of attempts so a crowded map yields
/// fewer enemies instead of failing the session.
pub(crate) fn enemy_position<R: Rng>(
    grid: &Grid,
    taken: &[GridPos],
    rng: &mut R,
) -> Option<GridPos> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let candidate = GridPos::new(
            rng.gen_range(1..grid.width() - 1),
            rng.gen_range(1..grid.height() - 1),
        );
        if !grid.is_cell_passable(candidate) {
            continue;
        }
        if taken
            .iter()
            .any(|placed| center_of(*placed).distance(center_of(candidate)) < MIN_TANK_SPACING)
        {
            continue;
        }
        return Some(candidate);
    }
    None
}

/// Draws a randomized enemy combat profile from the shared stream.
///
/// The draw order (health, move delay, shoot delay, projectile speed) is
/// part of the determinism contract.
pub(crate) fn enemy_characteristics<R: Rng>(rng: &mut R) -> TankCharacteristics {
    TankCharacteristics {
        max_health: rng.gen_range(1..4),
        move_delay: Duration::from_millis(u64::from(rng.gen_range(2..6u32)) * 100),
        shoot_delay: Duration::from_millis(u64::from(rng.gen_range(3..8u32)) * 100),
        projectile_speed: rng.gen_range(4..7) as f32,
        damage: 1,
    }
}

fn center_of(pos: GridPos) -> Vec2 {
    Vec2::new(pos.x() as f32, pos.y() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tank_arena_core::CellType;

    fn walled_grid_with_opening(open: GridPos) -> Grid {
        let mut rows = vec![vec![CellType::Brick; 9]; 9];
        rows[open.y() as usize][open.x() as usize] = CellType::Empty;
        Grid::from_rows(rows)
    }

    #[test]
    fn nearest_passable_prefers_the_origin_itself() {
        let grid = walled_grid_with_opening(GridPos::new(1, 1));
        assert_eq!(
            nearest_passable(&grid, GridPos::new(1, 1)),
            Some(GridPos::new(1, 1))
        );
    }

    #[test]
    fn nearest_passable_walks_outward() {
        let grid = walled_grid_with_opening(GridPos::new(4, 3));
        assert_eq!(
            nearest_passable(&grid, GridPos::new(1, 1)),
            Some(GridPos::new(4, 3))
        );
    }

    #[test]
    fn nearest_passable_reports_a_sealed_grid() {
        let rows = vec![vec![CellType::Brick; 5]; 5];
        let grid = Grid::from_rows(rows);
        assert_eq!(nearest_passable(&grid, GridPos::new(1, 1)), None);
    }

    #[test]
    fn enemy_position_honors_spacing() {
        let mut rows = vec![vec![CellType::Brick; 9]; 9];
        for row in rows.iter_mut().take(8).skip(1) {
            for cell in row.iter_mut().take(8).skip(1) {
                *cell = CellType::Empty;
            }
        }
        let grid = Grid::from_rows(rows);
        let taken = vec![GridPos::new(4, 4)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..16 {
            if let Some(pos) = enemy_position(&grid, &taken, &mut rng) {
                let distance = center_of(pos).distance(center_of(taken[0]));
                assert!(distance >= MIN_TANK_SPACING);
            }
        }
    }

    #[test]
    fn enemy_position_gives_up_on_a_sealed_grid() {
        let grid = Grid::from_rows(vec![vec![CellType::Brick; 6]; 6]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(enemy_position(&grid, &[], &mut rng), None);
    }

    #[test]
    fn enemy_profiles_stay_inside_their_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..64 {
            let profile = enemy_characteristics(&mut rng);
            assert!((1..=3).contains(&profile.max_health));
            assert!((200..=500).contains(&(profile.move_delay.as_millis() as u64)));
            assert!((300..=700).contains(&(profile.shoot_delay.as_millis() as u64)));
            assert!((4.0..=6.0).contains(&profile.projectile_speed));
            assert_eq!(profile.damage, 1);
        }
    }
}
