//! Terrain grid and the deterministic map generator.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tank_arena_core::{CellType, GridPos, MapConfig, WallState, MIN_WATER_POOL};

/// Cell offsets used for maze neighbors and water spreading, in the fixed
/// up/right/down/left order the generator consumes them.
const NEIGHBOR_SHIFTS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Probability gate applied to every water-flood neighbor draw; a unit draw
/// must exceed this for the neighbor to join the frontier.
const WATER_SPREAD_GATE: f64 = 0.3;

/// Dense terrain grid with a parallel wall-damage layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<CellType>,
    walls: Vec<WallState>,
}

impl Grid {
    /// Builds a grid from explicit cell rows.
    ///
    /// All walls start [`WallState::Intact`]. Rows shorter than the longest
    /// row are padded with [`CellType::Empty`]. Intended for tests and
    /// adapters that need a handcrafted layout.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<CellType>>) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as i32;
        let mut grid = Self::filled(width, height, CellType::Empty);
        for (y, row) in rows.into_iter().enumerate() {
            for (x, cell) in row.into_iter().enumerate() {
                grid.set_cell(GridPos::new(x as i32, y as i32), cell);
            }
        }
        grid
    }

    fn filled(width: i32, height: i32, cell: CellType) -> Self {
        let capacity = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![cell; capacity],
            walls: vec![WallState::Intact; capacity],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x() >= 0 && pos.x() < self.width && pos.y() >= 0 && pos.y() < self.height
    }

    /// Terrain at the provided position, if it is in bounds.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<CellType> {
        self.index(pos).map(|index| self.cells[index])
    }

    /// Wall damage state at the provided position, if it is in bounds.
    #[must_use]
    pub fn wall_state(&self, pos: GridPos) -> Option<WallState> {
        self.index(pos).map(|index| self.walls[index])
    }

    /// Reports whether a tank may occupy the cell.
    ///
    /// Only open ground qualifies; water blocks tanks. Out-of-bounds
    /// positions are impassable rather than an error.
    #[must_use]
    pub fn is_cell_passable(&self, pos: GridPos) -> bool {
        matches!(self.cell(pos), Some(CellType::Empty))
    }

    /// Reports whether a projectile may fly over the cell.
    ///
    /// Projectiles cross water; everything a tank can enter is included.
    #[must_use]
    pub fn is_cell_passable_for_projectile(&self, pos: GridPos) -> bool {
        matches!(self.cell(pos), Some(CellType::Empty | CellType::Water))
    }

    /// Degrades the wall at the provided position by one step.
    ///
    /// No-op unless the cell is brick. `Intact` walls become `Damaged`;
    /// `Damaged` walls become `Destroyed` and the cell opens up. Returns the
    /// new state when a transition happened. Degradation is one-way.
    pub fn damage_wall(&mut self, pos: GridPos) -> Option<WallState> {
        let index = self.index(pos)?;
        if self.cells[index] != CellType::Brick {
            return None;
        }

        match self.walls[index] {
            WallState::Intact => {
                self.walls[index] = WallState::Damaged;
                Some(WallState::Damaged)
            }
            WallState::Damaged => {
                self.walls[index] = WallState::Destroyed;
                self.cells[index] = CellType::Empty;
                Some(WallState::Destroyed)
            }
            WallState::Destroyed => None,
        }
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y() as usize * self.width as usize + pos.x() as usize)
        } else {
            None
        }
    }

    fn set_cell(&mut self, pos: GridPos, cell: CellType) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = cell;
        }
    }

    fn interior(&self, pos: GridPos) -> bool {
        pos.x() >= 1 && pos.x() < self.width - 1 && pos.y() >= 1 && pos.y() < self.height - 1
    }
}

/// Generates a grid from the configuration alone.
///
/// Seeds a fresh ChaCha8 stream from `config.seed`, so identical
/// configurations always yield bit-identical grids.
#[must_use]
pub fn generate(config: &MapConfig) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    generate_with(config, &mut rng)
}

/// Generates a grid, consuming randomness from an externally owned stream.
///
/// The stream is consumed in a fixed order (maze walls, then water pools) so
/// callers can keep drawing from it afterwards without losing seed
/// reproducibility.
#[must_use]
pub fn generate_with<R: Rng>(config: &MapConfig, rng: &mut R) -> Grid {
    let mut grid = Grid::filled(config.width, config.height, CellType::Empty);

    stamp_perimeter(&mut grid);

    if config.generate_maze {
        build_maze(&mut grid, rng);
    }

    if config.generate_water {
        pour_water(&mut grid, config, rng);
    }

    grid
}

fn stamp_perimeter(grid: &mut Grid) {
    for x in 0..grid.width {
        grid.set_cell(GridPos::new(x, 0), CellType::Brick);
        grid.set_cell(GridPos::new(x, grid.height - 1), CellType::Brick);
    }
    for y in 0..grid.height {
        grid.set_cell(GridPos::new(0, y), CellType::Brick);
        grid.set_cell(GridPos::new(grid.width - 1, y), CellType::Brick);
    }
}

/// Randomized depth-first wall building.
///
/// Walks the interior on the even sub-lattice two cells at a time and raises
/// a brick wall on the midpoint between each newly visited pair, producing
/// maze-like corridors without ever touching the border.
fn build_maze<R: Rng>(grid: &mut Grid, rng: &mut R) {
    let mut visited = vec![false; grid.cells.len()];
    let mut stack: Vec<GridPos> = Vec::new();

    let mut start = GridPos::new(
        rng.gen_range(1..grid.width - 1),
        rng.gen_range(1..grid.height - 1),
    );
    if start.x() % 2 != 0 {
        start = GridPos::new(start.x() - 1, start.y());
    }
    if start.y() % 2 != 0 {
        start = GridPos::new(start.x(), start.y() - 1);
    }

    mark_visited(grid, &mut visited, start);
    stack.push(start);

    while let Some(current) = stack.pop() {
        let mut neighbors = unvisited_lattice_neighbors(grid, &visited, current);
        neighbors.shuffle(rng);

        for neighbor in neighbors {
            if is_visited(grid, &visited, neighbor) {
                continue;
            }

            let wall = GridPos::new(
                (current.x() + neighbor.x()) / 2,
                (current.y() + neighbor.y()) / 2,
            );
            if grid.interior(wall) {
                grid.set_cell(wall, CellType::Brick);
            }

            mark_visited(grid, &mut visited, neighbor);
            stack.push(neighbor);
        }
    }
}

fn unvisited_lattice_neighbors(grid: &Grid, visited: &[bool], cell: GridPos) -> Vec<GridPos> {
    let mut neighbors = Vec::new();
    for (dx, dy) in NEIGHBOR_SHIFTS {
        let neighbor = GridPos::new(cell.x() + dx * 2, cell.y() + dy * 2);
        if grid.interior(neighbor) && !is_visited(grid, visited, neighbor) {
            neighbors.push(neighbor);
        }
    }
    neighbors
}

fn is_visited(grid: &Grid, visited: &[bool], pos: GridPos) -> bool {
    grid.index(pos).map_or(true, |index| visited[index])
}

fn mark_visited(grid: &Grid, visited: &mut [bool], pos: GridPos) {
    if let Some(index) = grid.index(pos) {
        visited[index] = true;
    }
}

fn pour_water<R: Rng>(grid: &mut Grid, config: &MapConfig, rng: &mut R) {
    let mut open_cells: Vec<GridPos> = Vec::new();
    for y in 1..grid.height - 1 {
        for x in 1..grid.width - 1 {
            let pos = GridPos::new(x, y);
            if grid.cell(pos) == Some(CellType::Empty) {
                open_cells.push(pos);
            }
        }
    }

    if open_cells.is_empty() {
        return;
    }

    let sources = (rng.gen_range(1..=config.max_water_sources) as usize).min(open_cells.len());
    open_cells.shuffle(rng);

    for seed in open_cells.into_iter().take(sources) {
        flood_pool(grid, config, seed, rng);
    }
}

/// Bounded breadth-first flood from one seed cell.
///
/// Converts empty cells to water until the pool reaches a randomly drawn
/// target size; each neighbor joins the frontier only when its probability
/// gate passes, which keeps the pools organic rather than rectangular.
fn flood_pool<R: Rng>(grid: &mut Grid, config: &MapConfig, seed: GridPos, rng: &mut R) {
    if grid.cell(seed) != Some(CellType::Empty) {
        return;
    }

    let target = rng.gen_range(MIN_WATER_POOL..=config.max_water_amount);
    let mut created = 0;
    let mut visited = vec![false; grid.cells.len()];
    let mut frontier = std::collections::VecDeque::new();

    mark_visited(grid, &mut visited, seed);
    frontier.push_back(seed);

    while created < target {
        let Some(current) = frontier.pop_front() else {
            break;
        };

        if grid.cell(current) == Some(CellType::Empty) {
            grid.set_cell(current, CellType::Water);
            created += 1;
        }

        for (dx, dy) in NEIGHBOR_SHIFTS {
            let neighbor = GridPos::new(current.x() + dx, current.y() + dy);
            if grid.interior(neighbor)
                && !is_visited(grid, &visited, neighbor)
                && rng.gen::<f64>() > WATER_SPREAD_GATE
            {
                mark_visited(grid, &mut visited, neighbor);
                frontier.push_back(neighbor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn open_config() -> MapConfig {
        MapConfig {
            generate_maze: false,
            generate_water: false,
            ..MapConfig::default()
        }
    }

    #[test]
    fn generation_is_deterministic_for_identical_configs() {
        let config = MapConfig::default();
        assert_eq!(generate(&config), generate(&config));
    }

    #[test]
    fn different_seeds_produce_different_grids() {
        let first = generate(&MapConfig::default());
        let second = generate(&MapConfig {
            seed: 2,
            ..MapConfig::default()
        });
        assert_ne!(first, second);
    }

    #[test]
    fn generate_with_matches_generate_for_fresh_stream() {
        let config = MapConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        assert_eq!(generate_with(&config, &mut rng), generate(&config));
    }

    #[test]
    fn perimeter_is_intact_brick() {
        let grid = generate(&MapConfig::default());
        for x in 0..grid.width() {
            for y in [0, grid.height() - 1] {
                let pos = GridPos::new(x, y);
                assert_eq!(grid.cell(pos), Some(CellType::Brick));
                assert_eq!(grid.wall_state(pos), Some(WallState::Intact));
            }
        }
        for y in 0..grid.height() {
            for x in [0, grid.width() - 1] {
                assert_eq!(grid.cell(GridPos::new(x, y)), Some(CellType::Brick));
            }
        }
    }

    #[test]
    fn disabled_generators_leave_the_interior_open() {
        let grid = generate(&open_config());
        for y in 1..grid.height() - 1 {
            for x in 1..grid.width() - 1 {
                assert_eq!(grid.cell(GridPos::new(x, y)), Some(CellType::Empty));
            }
        }
    }

    #[test]
    fn water_never_replaces_brick() {
        let config = MapConfig::default();
        let walls_only = MapConfig {
            generate_water: false,
            ..config
        };

        let with_water = generate(&config);
        let without_water = generate(&walls_only);

        for y in 0..with_water.height() {
            for x in 0..with_water.width() {
                let pos = GridPos::new(x, y);
                if without_water.cell(pos) == Some(CellType::Brick) {
                    assert_eq!(with_water.cell(pos), Some(CellType::Brick));
                }
            }
        }
    }

    #[test]
    fn water_stays_inside_the_border() {
        let grid = generate(&MapConfig {
            generate_maze: false,
            ..MapConfig::default()
        });
        for x in 0..grid.width() {
            assert_ne!(grid.cell(GridPos::new(x, 0)), Some(CellType::Water));
            assert_ne!(
                grid.cell(GridPos::new(x, grid.height() - 1)),
                Some(CellType::Water)
            );
        }
    }

    #[test]
    fn passability_duality_holds_everywhere() {
        let grid = generate(&MapConfig::default());
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = GridPos::new(x, y);
                if grid.is_cell_passable(pos) {
                    assert!(grid.is_cell_passable_for_projectile(pos));
                }
            }
        }
    }

    #[test]
    fn water_is_projectile_passable_but_not_tank_passable() {
        let grid = Grid::from_rows(vec![vec![CellType::Water]]);
        let pos = GridPos::new(0, 0);
        assert!(!grid.is_cell_passable(pos));
        assert!(grid.is_cell_passable_for_projectile(pos));
    }

    #[test]
    fn out_of_bounds_is_impassable() {
        let grid = generate(&open_config());
        assert!(!grid.is_cell_passable(GridPos::new(-1, 3)));
        assert!(!grid.is_cell_passable_for_projectile(GridPos::new(3, grid.height())));
    }

    #[test]
    fn wall_degradation_is_monotonic() {
        let mut grid = generate(&open_config());
        let wall = GridPos::new(0, 0);

        assert_eq!(grid.damage_wall(wall), Some(WallState::Damaged));
        assert_eq!(grid.cell(wall), Some(CellType::Brick));

        assert_eq!(grid.damage_wall(wall), Some(WallState::Destroyed));
        assert_eq!(grid.cell(wall), Some(CellType::Empty));
        assert!(grid.is_cell_passable(wall));

        assert_eq!(grid.damage_wall(wall), None);
        assert_eq!(grid.wall_state(wall), Some(WallState::Destroyed));
    }

    #[test]
    fn damaging_open_ground_is_a_no_op() {
        let mut grid = generate(&open_config());
        let open = GridPos::new(2, 2);
        assert_eq!(grid.damage_wall(open), None);
        assert_eq!(grid.cell(open), Some(CellType::Empty));
    }

    #[test]
    fn maze_keeps_the_border_intact() {
        let config = MapConfig {
            generate_water: false,
            ..MapConfig::default()
        };
        let grid = generate(&config);
        for y in 0..grid.height() {
            for x in [0, grid.width() - 1] {
                let pos = GridPos::new(x, y);
                assert_eq!(grid.cell(pos), Some(CellType::Brick));
                assert_eq!(grid.wall_state(pos), Some(WallState::Intact));
            }
        }
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let grid = Grid::from_rows(vec![
            vec![CellType::Brick, CellType::Brick],
            vec![CellType::Water],
        ]);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.cell(GridPos::new(1, 1)), Some(CellType::Empty));
    }
}
