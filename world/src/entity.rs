//! Simulation entities: tanks and projectiles behind one closed sum type.

use std::time::Duration;

use tank_arena_core::{
    Controller, Direction, EntityId, EntityKind, GridPos, TankCharacteristics,
};

/// A live simulation entity owned by the registry.
#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) pos: GridPos,
    pub(crate) health: i32,
    pub(crate) state: EntityState,
}

/// Variant payload distinguishing tanks from projectiles.
#[derive(Clone, Debug)]
pub(crate) enum EntityState {
    Tank(TankState),
    Projectile(ProjectileState),
}

#[derive(Clone, Debug)]
pub(crate) struct TankState {
    pub(crate) facing: Direction,
    pub(crate) controller: Controller,
    pub(crate) characteristics: TankCharacteristics,
    pub(crate) move_cooldown: Duration,
    pub(crate) shoot_cooldown: Duration,
}

#[derive(Clone, Debug)]
pub(crate) struct ProjectileState {
    pub(crate) direction: Direction,
    pub(crate) speed: f32,
    pub(crate) damage: i32,
    pub(crate) shooter: Option<EntityId>,
    pub(crate) step_timer: Duration,
}

impl Entity {
    pub(crate) fn tank(
        id: EntityId,
        pos: GridPos,
        characteristics: TankCharacteristics,
        controller: Controller,
        health: i32,
    ) -> Self {
        Self {
            id,
            pos,
            health,
            state: EntityState::Tank(TankState {
                facing: Direction::Up,
                controller,
                characteristics,
                move_cooldown: Duration::ZERO,
                shoot_cooldown: Duration::ZERO,
            }),
        }
    }

    pub(crate) fn projectile(
        id: EntityId,
        pos: GridPos,
        direction: Direction,
        speed: f32,
        damage: i32,
        shooter: Option<EntityId>,
    ) -> Self {
        Self {
            id,
            pos,
            // A projectile dies to any damage event or terrain impact.
            health: 1,
            state: EntityState::Projectile(ProjectileState {
                direction,
                speed,
                damage,
                shooter,
                step_timer: Duration::ZERO,
            }),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the entity participates in pairwise collision detection.
    pub(crate) fn is_solid(&self) -> bool {
        matches!(self.state, EntityState::Tank(_))
    }

    pub(crate) fn kind(&self) -> EntityKind {
        match self.state {
            EntityState::Tank(_) => EntityKind::Tank,
            EntityState::Projectile(_) => EntityKind::Projectile,
        }
    }

    pub(crate) fn take_damage(&mut self, amount: i32) {
        self.health -= amount;
    }

    pub(crate) fn as_tank(&self) -> Option<&TankState> {
        match &self.state {
            EntityState::Tank(tank) => Some(tank),
            EntityState::Projectile(_) => None,
        }
    }

    pub(crate) fn as_tank_mut(&mut self) -> Option<&mut TankState> {
        match &mut self.state {
            EntityState::Tank(tank) => Some(tank),
            EntityState::Projectile(_) => None,
        }
    }

    pub(crate) fn as_projectile(&self) -> Option<&ProjectileState> {
        match &self.state {
            EntityState::Projectile(projectile) => Some(projectile),
            EntityState::Tank(_) => None,
        }
    }

    /// Symmetric collision reaction; each entity decides how it responds.
    ///
    /// A tank takes damage when struck by a projectile that is not its own.
    /// A projectile dies on contact with a foreign tank; the damage itself is
    /// booked by the tank's half of the dispatch so a pair produces exactly
    /// one damage event. Returns the damage this entity absorbed, if any.
    pub(crate) fn on_collision(&mut self, other: &Entity) -> Option<i32> {
        match (&self.state, &other.state) {
            (EntityState::Tank(_), EntityState::Projectile(projectile))
                if projectile.shooter != Some(self.id) =>
            {
                let amount = projectile.damage;
                self.health -= amount;
                Some(amount)
            }
            (EntityState::Projectile(projectile), EntityState::Tank(_))
                if projectile.shooter != Some(other.id) =>
            {
                self.health = 0;
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tank_at(id: u32, pos: GridPos) -> Entity {
        Entity::tank(
            EntityId::new(id),
            pos,
            TankCharacteristics::default(),
            Controller::Player,
            3,
        )
    }

    fn projectile_from(id: u32, shooter: Option<u32>) -> Entity {
        Entity::projectile(
            EntityId::new(id),
            GridPos::new(2, 2),
            Direction::Right,
            5.0,
            1,
            shooter.map(EntityId::new),
        )
    }

    #[test]
    fn tanks_are_solid_and_projectiles_are_not() {
        assert!(tank_at(1, GridPos::new(1, 1)).is_solid());
        assert!(!projectile_from(2, None).is_solid());
    }

    #[test]
    fn tank_takes_damage_from_foreign_projectile() {
        let mut tank = tank_at(1, GridPos::new(2, 2));
        let projectile = projectile_from(2, Some(9));

        assert_eq!(tank.on_collision(&projectile), Some(1));
        assert_eq!(tank.health, 2);
    }

    #[test]
    fn tank_ignores_its_own_projectile() {
        let mut tank = tank_at(1, GridPos::new(2, 2));
        let projectile = projectile_from(2, Some(1));

        assert_eq!(tank.on_collision(&projectile), None);
        assert_eq!(tank.health, 3);
    }

    #[test]
    fn projectile_dies_on_foreign_tank_contact() {
        let mut projectile = projectile_from(2, Some(9));
        let tank = tank_at(1, GridPos::new(2, 2));

        assert_eq!(projectile.on_collision(&tank), None);
        assert!(!projectile.is_alive());
    }

    #[test]
    fn projectile_survives_contact_with_its_shooter() {
        let mut projectile = projectile_from(2, Some(1));
        let tank = tank_at(1, GridPos::new(2, 2));

        assert_eq!(projectile.on_collision(&tank), None);
        assert!(projectile.is_alive());
    }
}
