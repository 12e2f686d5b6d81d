#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gameplay orchestration: the per-level loop of the Tank Arena experience.
//!
//! A [`GameplaySession`] ties the map generator, the entity registry, the
//! collision resolver, and the enemy decision system into one tick-driven
//! lifecycle: spawn a level, run ticks, detect win and loss, advance levels
//! behind a timed announcement, and reset back to level one on demand.
//! Randomness for a level flows through a single seeded stream consumed in a
//! fixed order: maze carving, water pools, enemy placement and
//! characteristics, then AI decisions.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use tank_arena_core::{
    AiProfile, Command, ConfigError, Controller, EntityId, Event, GridPos, InputCommand,
    MapConfig, TankCharacteristics,
};
use tank_arena_system_enemy_ai::EnemyAi;
use tank_arena_world::{self as world, map, query, World};

mod spawn;

/// Enemies on level N number `ENEMY_BASE_COUNT + N`.
const ENEMY_BASE_COUNT: u32 = 2;

/// How long level and game-over banners block the simulation.
const ANNOUNCEMENT_DURATION: Duration = Duration::from_secs(1);

const GAME_OVER_BANNER: &str = "Game Over";

/// Configuration for a gameplay session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionConfig {
    /// Arena layout and seeding; `map.seed` is the base seed that level one
    /// regenerates from.
    pub map: MapConfig,
}

impl SessionConfig {
    /// Checks that the configuration can host a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map.validate()
    }
}

/// Reasons a session cannot be constructed or restarted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The provided configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The generated map has no passable cell to spawn the player on.
    #[error("the generated map has no passable cell to spawn the player")]
    NoSpawnPosition,
}

#[derive(Clone, Debug)]
enum Phase {
    /// A banner blocks simulation ticking until its timer runs out.
    Announcing {
        banner: String,
        remaining: Duration,
        resume: bool,
    },
    Playing,
    Finished,
}

#[derive(Clone, Copy, Debug)]
struct PlayerCarryover {
    characteristics: TankCharacteristics,
    health: i32,
}

struct LevelSetup {
    world: World,
    rng: ChaCha8Rng,
    player: EntityId,
}

/// Orchestrates one arena play-through across levels.
#[derive(Debug)]
pub struct GameplaySession {
    config: SessionConfig,
    level: u32,
    world: World,
    rng: ChaCha8Rng,
    enemy_ai: EnemyAi,
    player: EntityId,
    pending_input: Option<InputCommand>,
    phase: Phase,
    done: bool,
}

impl GameplaySession {
    /// Builds a session and its first level.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let setup = build_level(&config, 1, None)?;
        Ok(Self {
            config,
            level: 1,
            world: setup.world,
            rng: setup.rng,
            enemy_ai: EnemyAi::new(),
            player: setup.player,
            pending_input: None,
            phase: announcing_level(1),
            done: false,
        })
    }

    /// Queues a discrete input command for the player tank.
    ///
    /// The queue holds a single slot: a command arriving before the previous
    /// one was consumed replaces it, and the session consumes at most one
    /// command per polled tick.
    pub fn push_input(&mut self, command: InputCommand) {
        self.pending_input = Some(command);
    }

    /// Advances the session by one tick of `dt` simulated time.
    ///
    /// While a banner is showing only its timer advances; the simulation
    /// itself is blocked and resumes when the banner expires.
    pub fn update(&mut self, dt: Duration) {
        match &mut self.phase {
            Phase::Announcing {
                remaining, resume, ..
            } => {
                *remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    let resume = *resume;
                    self.phase = if resume { Phase::Playing } else { Phase::Finished };
                }
            }
            Phase::Finished => {}
            Phase::Playing => self.run_tick(dt),
        }
    }

    /// True from the moment the player tank dies until [`Self::reset`].
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// One-based level counter.
    #[must_use]
    pub fn current_level(&self) -> u32 {
        self.level
    }

    /// Identifier of the player tank in the current level.
    #[must_use]
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Read access to the arena for rendering and inspection.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the arena for adapters that script scenarios.
    #[must_use]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The configuration the session was built from, including the base seed
    /// and the cell scale the renderer needs.
    #[must_use]
    pub fn map_config(&self) -> &MapConfig {
        &self.config.map
    }

    /// Banner text currently blocking the simulation, if any.
    #[must_use]
    pub fn active_banner(&self) -> Option<&str> {
        match &self.phase {
            Phase::Announcing { banner, .. } => Some(banner),
            Phase::Playing | Phase::Finished => None,
        }
    }

    /// Returns the session to level one, regenerated from the original seed,
    /// with a fresh player tank.
    pub fn reset(&mut self) {
        match build_level(&self.config, 1, None) {
            Ok(setup) => {
                self.level = 1;
                self.world = setup.world;
                self.rng = setup.rng;
                self.enemy_ai = EnemyAi::new();
                self.player = setup.player;
                self.pending_input = None;
                self.phase = announcing_level(1);
                self.done = false;
            }
            Err(error) => {
                // Level one was already built once from this exact seed, so
                // a failure here means the configuration changed under us.
                log::error!("reset failed: {error}");
                self.done = true;
                self.phase = Phase::Finished;
            }
        }
    }

    fn run_tick(&mut self, dt: Duration) {
        if self.done {
            return;
        }

        let mut events: Vec<Event> = Vec::new();

        if let Some(input) = self.pending_input.take() {
            let command = match input {
                InputCommand::Move(direction) => Command::MoveTank {
                    tank: self.player,
                    direction,
                },
                InputCommand::Shoot => Command::ShootTank { tank: self.player },
            };
            world::apply(&mut self.world, command, &mut events);
        }

        let mut orders: Vec<Command> = Vec::new();
        let tanks = query::tank_view(&self.world);
        self.enemy_ai.handle(
            dt,
            query::grid(&self.world),
            &tanks,
            &mut self.rng,
            &mut orders,
        );
        for order in orders {
            world::apply(&mut self.world, order, &mut events);
        }

        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        self.evaluate_outcome();
    }

    fn evaluate_outcome(&mut self) {
        let tanks = query::tank_view(&self.world);
        let player_alive = tanks.iter().any(|tank| tank.is_player() && tank.is_alive());
        if !player_alive {
            log::info!("player destroyed on level {}", self.level);
            self.done = true;
            self.phase = Phase::Announcing {
                banner: GAME_OVER_BANNER.to_string(),
                remaining: ANNOUNCEMENT_DURATION,
                resume: false,
            };
            return;
        }

        let enemies_alive = tanks
            .iter()
            .any(|tank| !tank.is_player() && tank.is_alive());
        if !enemies_alive {
            self.advance_level();
        }
    }

    fn advance_level(&mut self) {
        let carryover = query::tank_view(&self.world)
            .into_vec()
            .into_iter()
            .find(|tank| tank.is_player())
            .map(|tank| PlayerCarryover {
                characteristics: tank.characteristics,
                health: tank.health,
            });

        self.level += 1;
        log::info!("all enemies destroyed, advancing to level {}", self.level);

        match build_level(&self.config, self.level, carryover) {
            Ok(setup) => {
                self.world = setup.world;
                self.rng = setup.rng;
                self.enemy_ai = EnemyAi::new();
                self.player = setup.player;
                self.pending_input = None;
                self.phase = announcing_level(self.level);
            }
            Err(error) => {
                log::error!("level {} cannot start: {error}", self.level);
                self.done = true;
                self.phase = Phase::Finished;
            }
        }
    }
}

fn announcing_level(level: u32) -> Phase {
    Phase::Announcing {
        banner: format!("Level {level}"),
        remaining: ANNOUNCEMENT_DURATION,
        resume: true,
    }
}

/// Generates the level's grid and populates it with the player and enemies.
///
/// Consumes the level stream in the contractual order: maze, water, then per
/// enemy a position followed by a characteristics draw. The player's spot is
/// a deterministic expanding-diamond search and draws nothing.
fn build_level(
    config: &SessionConfig,
    level: u32,
    carryover: Option<PlayerCarryover>,
) -> Result<LevelSetup, SessionError> {
    let map_config = MapConfig {
        seed: config.map.seed.wrapping_add(u64::from(level - 1)),
        ..config.map
    };
    let mut rng = ChaCha8Rng::seed_from_u64(map_config.seed);
    let grid = map::generate_with(&map_config, &mut rng);

    let player_pos = spawn::nearest_passable(&grid, GridPos::new(1, 1))
        .ok_or(SessionError::NoSpawnPosition)?;

    let mut world = World::new(grid);
    let (characteristics, health) = match carryover {
        Some(carry) => (carry.characteristics, carry.health),
        None => {
            let profile = TankCharacteristics::player();
            (profile, profile.max_health)
        }
    };
    let player = world.spawn_tank(player_pos, characteristics, Controller::Player, health);

    let requested = ENEMY_BASE_COUNT + level;
    let mut placed = vec![player_pos];
    for _ in 0..requested {
        let Some(pos) = spawn::enemy_position(query::grid(&world), &placed, &mut rng) else {
            continue;
        };
        let profile = spawn::enemy_characteristics(&mut rng);
        let _ = world.spawn_tank(
            pos,
            profile,
            Controller::Enemy(AiProfile::default()),
            profile.max_health,
        );
        placed.push(pos);
    }

    let spawned = placed.len() as u32 - 1;
    if spawned < requested {
        log::warn!("placed {spawned} of {requested} enemies; the arena ran out of room");
    }

    // Flush the spawns so the level starts with a live roster.
    let mut events = Vec::new();
    world::apply(&mut world, Command::Tick { dt: Duration::ZERO }, &mut events);

    log::info!("level {level} ready with {spawned} enemies");
    Ok(LevelSetup { world, rng, player })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_arena_core::Direction;

    fn open_config() -> SessionConfig {
        SessionConfig {
            map: MapConfig {
                generate_maze: false,
                generate_water: false,
                ..MapConfig::default()
            },
        }
    }

    fn past_announcement(session: &mut GameplaySession) {
        session.update(ANNOUNCEMENT_DURATION);
        assert!(session.active_banner().is_none());
    }

    #[test]
    fn invalid_configuration_is_rejected_at_construction() {
        let config = SessionConfig {
            map: MapConfig {
                width: 3,
                ..MapConfig::default()
            },
        };
        assert_eq!(
            GameplaySession::new(config).err(),
            Some(SessionError::Config(ConfigError::MapTooSmall {
                width: 3,
                height: 15
            }))
        );
    }

    #[test]
    fn sessions_open_behind_a_level_banner() {
        let mut session = GameplaySession::new(open_config()).expect("session builds");
        assert_eq!(session.active_banner(), Some("Level 1"));
        assert_eq!(session.current_level(), 1);

        session.update(Duration::from_millis(400));
        assert_eq!(session.active_banner(), Some("Level 1"));

        session.update(Duration::from_millis(600));
        assert_eq!(session.active_banner(), None);
    }

    #[test]
    fn announcement_blocks_simulation_ticking() {
        let mut session = GameplaySession::new(open_config()).expect("session builds");
        let before = query::tank_view(session.world()).into_vec();

        // Half the banner is still up; nothing in the arena may change.
        session.update(Duration::from_millis(500));
        let after = query::tank_view(session.world()).into_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn player_spawns_on_the_cell_nearest_the_corner() {
        let session = GameplaySession::new(open_config()).expect("session builds");
        let player = query::player_tank(session.world()).expect("player is live");
        assert_eq!(player.pos, GridPos::new(1, 1));
        assert_eq!(player.health, TankCharacteristics::player().max_health);
    }

    #[test]
    fn level_one_hosts_base_plus_one_enemies() {
        let session = GameplaySession::new(open_config()).expect("session builds");
        let enemies = query::tank_view(session.world())
            .into_vec()
            .into_iter()
            .filter(|tank| !tank.is_player())
            .count();
        assert_eq!(enemies, 3);
    }

    #[test]
    fn input_slot_keeps_only_the_latest_command() {
        let mut session = GameplaySession::new(open_config()).expect("session builds");
        past_announcement(&mut session);

        session.push_input(InputCommand::Move(Direction::Right));
        session.push_input(InputCommand::Move(Direction::Up));
        session.update(Duration::from_millis(50));

        // Only the latest command ran: the tank faces up, and the border
        // blocked the step.
        let player = query::player_tank(session.world()).expect("player is live");
        assert_eq!(player.facing, Direction::Up);
        assert_eq!(player.pos, GridPos::new(1, 1));
    }

    #[test]
    fn input_is_consumed_exactly_once() {
        let mut session = GameplaySession::new(open_config()).expect("session builds");
        past_announcement(&mut session);

        session.push_input(InputCommand::Move(Direction::Down));
        session.update(Duration::from_millis(200));
        let after_first = query::player_tank(session.world()).expect("player").pos;
        assert_eq!(after_first, GridPos::new(1, 2));

        // No new input queued: the tank must stay put.
        session.update(Duration::from_millis(200));
        let after_second = query::player_tank(session.world()).expect("player").pos;
        assert_eq!(after_second, after_first);
    }

    #[test]
    fn reset_restores_level_one() {
        let mut session = GameplaySession::new(open_config()).expect("session builds");
        past_announcement(&mut session);

        let player = session.player();
        session
            .world_mut()
            .inflict_damage(player, 99)
            .expect("player is live");
        session.update(Duration::from_millis(50));
        assert!(session.is_done());
        assert_eq!(session.active_banner(), Some("Game Over"));

        session.reset();
        assert!(!session.is_done());
        assert_eq!(session.current_level(), 1);
        assert_eq!(session.active_banner(), Some("Level 1"));
        assert!(query::player_tank(session.world()).is_some());
    }

    #[test]
    fn done_stays_latched_until_reset() {
        let mut session = GameplaySession::new(open_config()).expect("session builds");
        past_announcement(&mut session);

        let player = session.player();
        session
            .world_mut()
            .inflict_damage(player, 99)
            .expect("player is live");
        session.update(Duration::from_millis(50));
        assert!(session.is_done());

        for _ in 0..30 {
            session.update(Duration::from_millis(100));
            assert!(session.is_done());
        }
    }
}
