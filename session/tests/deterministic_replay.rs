use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use tank_arena_core::{Direction, InputCommand};
use tank_arena_session::{GameplaySession, SessionConfig};
use tank_arena_world::query;

#[test]
fn deterministic_replay_produces_identical_fingerprints() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay() -> u64 {
    let mut session = GameplaySession::new(SessionConfig::default()).expect("session builds");
    let mut hasher = DefaultHasher::new();

    // Let the level banner pass, then run a scripted minute of play.
    session.update(Duration::from_secs(1));

    for frame in 0..600u32 {
        if let Some(input) = scripted_input(frame) {
            session.push_input(input);
        }
        session.update(Duration::from_millis(100));
        record_state(&session, &mut hasher);
        if session.is_done() {
            break;
        }
    }

    hasher.finish()
}

fn scripted_input(frame: u32) -> Option<InputCommand> {
    match frame % 7 {
        0 => Some(InputCommand::Move(Direction::Right)),
        2 => Some(InputCommand::Move(Direction::Down)),
        4 => Some(InputCommand::Shoot),
        5 => Some(InputCommand::Move(Direction::Up)),
        _ => None,
    }
}

fn record_state(session: &GameplaySession, hasher: &mut DefaultHasher) {
    session.current_level().hash(hasher);
    session.is_done().hash(hasher);

    for tank in query::tank_view(session.world()).into_vec() {
        tank.id.get().hash(hasher);
        tank.pos.x().hash(hasher);
        tank.pos.y().hash(hasher);
        tank.health.hash(hasher);
        direction_tag(tank.facing).hash(hasher);
        tank.is_player().hash(hasher);
    }

    for projectile in query::projectile_view(session.world()).into_vec() {
        projectile.id.get().hash(hasher);
        projectile.pos.x().hash(hasher);
        projectile.pos.y().hash(hasher);
        direction_tag(projectile.direction).hash(hasher);
    }
}

fn direction_tag(direction: Direction) -> u8 {
    match direction {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}
