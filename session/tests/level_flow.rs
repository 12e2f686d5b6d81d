use std::time::Duration;

use tank_arena_core::{EntityId, MapConfig, TankCharacteristics};
use tank_arena_session::{GameplaySession, SessionConfig};
use tank_arena_world::query;

fn open_config() -> SessionConfig {
    SessionConfig {
        map: MapConfig {
            generate_maze: false,
            generate_water: false,
            ..MapConfig::default()
        },
    }
}

fn dismiss_banner(session: &mut GameplaySession) {
    session.update(Duration::from_secs(1));
    assert!(session.active_banner().is_none(), "banner should have expired");
}

fn enemy_ids(session: &GameplaySession) -> Vec<EntityId> {
    query::tank_view(session.world())
        .into_vec()
        .into_iter()
        .filter(|tank| !tank.is_player())
        .map(|tank| tank.id)
        .collect()
}

#[test]
fn clearing_a_level_advances_and_carries_the_player_over() {
    let mut session = GameplaySession::new(open_config()).expect("session builds");
    dismiss_banner(&mut session);

    assert_eq!(session.current_level(), 1);
    assert_eq!(enemy_ids(&session).len(), 3, "level 1 hosts 2 + 1 enemies");

    // Scratch the player so the carryover is observable.
    let player = session.player();
    session
        .world_mut()
        .inflict_damage(player, 1)
        .expect("player is live");

    for enemy in enemy_ids(&session) {
        session
            .world_mut()
            .inflict_damage(enemy, 99)
            .expect("enemy is live");
    }
    session.update(Duration::from_millis(10));

    assert_eq!(session.current_level(), 2);
    assert_eq!(session.active_banner(), Some("Level 2"));
    assert!(!session.is_done());

    let carried = query::player_tank(session.world()).expect("player persists");
    assert_eq!(
        carried.health,
        TankCharacteristics::player().max_health - 1,
        "remaining health carries across levels"
    );
    assert_eq!(enemy_ids(&session).len(), 4, "level 2 hosts 2 + 2 enemies");
}

#[test]
fn the_reference_arena_spawns_the_expected_roster() {
    // 15x15, seed 1, maze and water enabled.
    let session = GameplaySession::new(SessionConfig::default()).expect("session builds");

    let player = query::player_tank(session.world()).expect("player is live");
    let grid = query::grid(session.world());
    assert!(grid.is_cell_passable(player.pos));
    assert!(
        player.pos.manhattan_distance(tank_arena_core::GridPos::new(1, 1)) <= 6,
        "player spawns near the corner, found {:?}",
        player.pos
    );

    assert_eq!(enemy_ids(&session).len(), 3);
}

#[test]
fn player_death_latches_the_session_done() {
    let mut session = GameplaySession::new(open_config()).expect("session builds");
    dismiss_banner(&mut session);

    let player = session.player();
    session
        .world_mut()
        .inflict_damage(player, 99)
        .expect("player is live");
    session.update(Duration::from_millis(10));

    assert!(session.is_done());
    assert_eq!(session.active_banner(), Some("Game Over"));

    // Further updates do not revive the session.
    for _ in 0..20 {
        session.update(Duration::from_millis(100));
    }
    assert!(session.is_done());

    session.reset();
    assert!(!session.is_done());
    assert_eq!(session.current_level(), 1);
    assert_eq!(enemy_ids(&session).len(), 3);
}

#[test]
fn levels_regenerate_from_per_level_seeds() {
    let mut session = GameplaySession::new(open_config()).expect("session builds");
    dismiss_banner(&mut session);

    let first_level_tanks = query::tank_view(session.world()).into_vec();

    for enemy in enemy_ids(&session) {
        session
            .world_mut()
            .inflict_damage(enemy, 99)
            .expect("enemy is live");
    }
    session.update(Duration::from_millis(10));
    session.reset();

    // Reset returns to the original seed, so level one is reproduced
    // exactly (modulo the player's restored health).
    let replayed = query::tank_view(session.world()).into_vec();
    let positions: Vec<_> = first_level_tanks.iter().map(|tank| tank.pos).collect();
    let replayed_positions: Vec<_> = replayed.iter().map(|tank| tank.pos).collect();
    assert_eq!(positions, replayed_positions);
}
