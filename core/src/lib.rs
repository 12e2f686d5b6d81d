#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tank Arena engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems and the orchestrator submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what actually happened. Read access goes through snapshot views
//! that are sorted by entity id so every consumer observes the same
//! deterministic order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest arena edge that still leaves room for the perimeter wall, maze
/// carving, and tank placement.
pub const MIN_MAP_SIZE: i32 = 5;

/// Smallest water pool the generator may be asked to produce.
pub const MIN_WATER_POOL: u32 = 3;

/// Unique identifier assigned to a simulation entity.
///
/// Identifiers are allocated monotonically by the registry that owns the
/// entity and are never reused within that registry's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Cardinal facing and movement directions available to tanks and
/// projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Every cardinal direction in declaration order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Single-cell displacement produced by moving one step this way.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Location of a single grid cell expressed as signed column and row
/// coordinates.
///
/// Signed coordinates let movement and projectile physics form candidate
/// positions outside the arena; the grid treats those as impassable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    x: i32,
    y: i32,
}

impl GridPos {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Neighboring cell one step in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Computes the Manhattan distance between two positions.
    #[must_use]
    pub const fn manhattan_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Terrain occupying a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Open ground that tanks and projectiles may cross.
    Empty,
    /// Wall segment that blocks movement until destroyed.
    Brick,
    /// Water that blocks tanks but lets projectiles pass over.
    Water,
}

/// Damage progression of a brick wall cell.
///
/// Only meaningful while the cell's terrain is [`CellType::Brick`]; the cell
/// turns [`CellType::Empty`] exactly when the wall reaches `Destroyed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WallState {
    /// Undamaged wall.
    Intact,
    /// Wall that absorbed one hit.
    Damaged,
    /// Wall that collapsed; the cell is open ground from here on.
    Destroyed,
}

/// Configuration that fully determines map generation.
///
/// This struct is the engine's only wire format: identical configurations
/// (including the seed) always produce bit-identical grids.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Number of grid columns, border included.
    pub width: i32,
    /// Number of grid rows, border included.
    pub height: i32,
    /// Horizontal screen cells spanned by one grid cell.
    pub cell_size_x: i32,
    /// Vertical screen cells spanned by one grid cell.
    pub cell_size_y: i32,
    /// Upper bound on the number of water pool seeds.
    pub max_water_sources: u32,
    /// Upper bound on the size of a single water pool.
    pub max_water_amount: u32,
    /// Whether the randomized wall maze is generated.
    pub generate_maze: bool,
    /// Whether water pools are generated.
    pub generate_water: bool,
    /// Seed feeding the level's random stream.
    pub seed: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            cell_size_x: 4,
            cell_size_y: 2,
            max_water_sources: 3,
            max_water_amount: 10,
            generate_maze: true,
            generate_water: true,
            seed: 1,
        }
    }
}

impl MapConfig {
    /// Checks that the configuration can produce a playable arena.
    ///
    /// Misconfiguration surfaces here, at construction time, never mid-tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_MAP_SIZE || self.height < MIN_MAP_SIZE {
            return Err(ConfigError::MapTooSmall {
                width: self.width,
                height: self.height,
            });
        }

        if self.cell_size_x < 1 || self.cell_size_y < 1 {
            return Err(ConfigError::InvalidCellSize {
                x: self.cell_size_x,
                y: self.cell_size_y,
            });
        }

        if self.generate_water
            && (self.max_water_sources < 1 || self.max_water_amount < MIN_WATER_POOL)
        {
            return Err(ConfigError::InvalidWaterBounds {
                sources: self.max_water_sources,
                amount: self.max_water_amount,
            });
        }

        Ok(())
    }
}

/// Reasons a [`MapConfig`] cannot produce a playable arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The requested grid leaves no interior once the border is stamped.
    #[error(
        "map of {width}x{height} cells is smaller than the {MIN_MAP_SIZE}x{MIN_MAP_SIZE} minimum"
    )]
    MapTooSmall {
        /// Requested number of columns.
        width: i32,
        /// Requested number of rows.
        height: i32,
    },
    /// A grid cell must span at least one screen cell on each axis.
    #[error("cell scale {x}x{y} must be at least 1x1")]
    InvalidCellSize {
        /// Requested horizontal scale.
        x: i32,
        /// Requested vertical scale.
        y: i32,
    },
    /// Water generation cannot satisfy its pool-size draw.
    #[error(
        "water bounds of {sources} sources and {amount} cells cannot seed a pool of at least {MIN_WATER_POOL}"
    )]
    InvalidWaterBounds {
        /// Requested source cap.
        sources: u32,
        /// Requested pool cap.
        amount: u32,
    },
}

/// Numeric combat profile shared by player and enemy tanks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TankCharacteristics {
    /// Health the tank spawns with.
    pub max_health: i32,
    /// Minimum time between successive moves.
    pub move_delay: Duration,
    /// Minimum time between successive shots.
    pub shoot_delay: Duration,
    /// Speed of fired projectiles in cells per second.
    pub projectile_speed: f32,
    /// Damage inflicted by fired projectiles.
    pub damage: i32,
}

impl TankCharacteristics {
    /// Fixed profile used by the player tank.
    #[must_use]
    pub const fn player() -> Self {
        Self {
            max_health: 3,
            move_delay: Duration::from_millis(100),
            shoot_delay: Duration::from_millis(300),
            projectile_speed: 6.0,
            damage: 1,
        }
    }
}

impl Default for TankCharacteristics {
    fn default() -> Self {
        Self {
            max_health: 3,
            move_delay: Duration::from_millis(200),
            shoot_delay: Duration::from_millis(500),
            projectile_speed: 5.0,
            damage: 1,
        }
    }
}

/// Behavior constants carried by every AI-controlled tank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiProfile {
    /// Interval between movement-target decisions.
    pub decision_interval: Duration,
    /// Maximum distance at which the player is considered for firing.
    pub detection_range: f32,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            decision_interval: Duration::from_secs(2),
            detection_range: 5.0,
        }
    }
}

/// Decides who steers a tank. Fixed at creation, never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Controller {
    /// The tank follows external input commands.
    Player,
    /// The tank is driven by the enemy decision system.
    Enemy(AiProfile),
}

impl Controller {
    /// Reports whether the tank is the player-controlled one.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self, Controller::Player)
    }
}

/// Discrete command delivered by the input collaborator.
///
/// The orchestrator consumes at most one of these per polled tick and maps
/// it 1:1 onto the player tank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCommand {
    /// Move the player tank one cell in the given direction.
    Move(Direction),
    /// Fire the player tank's cannon.
    Shoot,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a tank face and move one cell in a direction.
    MoveTank {
        /// Identifier of the tank attempting to move.
        tank: EntityId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Requests that a tank fire its cannon.
    ShootTank {
        /// Identifier of the tank attempting to shoot.
        tank: EntityId,
    },
}

/// Broad classification of a simulation entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A player or enemy tank.
    Tank,
    /// A projectile in flight.
    Projectile,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a pending entity became live.
    EntitySpawned {
        /// Identifier of the entity that joined the live set.
        entity: EntityId,
        /// Classification of the spawned entity.
        kind: EntityKind,
    },
    /// Confirms that an entity left the live set.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// Confirms that a tank moved between two cells.
    TankMoved {
        /// Identifier of the tank that moved.
        tank: EntityId,
        /// Cell the tank occupied before moving.
        from: GridPos,
        /// Cell the tank occupies after the move.
        to: GridPos,
    },
    /// Confirms that a tank fired a projectile.
    ProjectileFired {
        /// Identifier allocated to the projectile.
        projectile: EntityId,
        /// Identifier of the tank that fired it.
        shooter: EntityId,
    },
    /// Reports that a brick wall absorbed a projectile impact.
    WallDamaged {
        /// Cell containing the wall.
        cell: GridPos,
        /// Damage state the wall degraded to.
        state: WallState,
    },
    /// Reports that an entity took damage.
    DamageInflicted {
        /// Identifier of the damaged entity.
        entity: EntityId,
        /// Amount of health removed.
        amount: i32,
    },
}

/// Immutable representation of a single tank's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TankSnapshot {
    /// Unique identifier assigned to the tank.
    pub id: EntityId,
    /// Grid cell currently occupied by the tank.
    pub pos: GridPos,
    /// Direction the tank currently faces.
    pub facing: Direction,
    /// Remaining health.
    pub health: i32,
    /// Combat profile the tank was created with.
    pub characteristics: TankCharacteristics,
    /// Who steers the tank.
    pub controller: Controller,
    /// Whether the move cooldown has fully elapsed.
    pub move_ready: bool,
    /// Whether the shoot cooldown has fully elapsed.
    pub shoot_ready: bool,
}

impl TankSnapshot {
    /// Reports whether this snapshot describes the player tank.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        self.controller.is_player()
    }

    /// Reports whether the tank was alive when the snapshot was taken.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Read-only snapshot describing all tanks within the arena.
#[derive(Clone, Debug, Default)]
pub struct TankView {
    snapshots: Vec<TankSnapshot>,
}

impl TankView {
    /// Creates a new tank view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TankSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tank snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TankSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TankSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Unique identifier assigned to the projectile.
    pub id: EntityId,
    /// Grid cell currently occupied by the projectile.
    pub pos: GridPos,
    /// Direction of flight.
    pub direction: Direction,
    /// Damage the projectile inflicts on impact.
    pub damage: i32,
    /// Tank that fired the projectile, if it is still known.
    pub shooter: Option<EntityId>,
}

/// Read-only snapshot describing all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Kind-agnostic snapshot returned by direct entity lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Unique identifier assigned to the entity.
    pub id: EntityId,
    /// Grid cell currently occupied by the entity.
    pub pos: GridPos,
    /// Remaining health.
    pub health: i32,
    /// Classification of the entity.
    pub kind: EntityKind,
}
