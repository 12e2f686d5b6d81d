//! Entity lifecycle registry with deferred, frame-consistent mutation.

use std::collections::BTreeMap;

use tank_arena_core::{EntityId, Event};

use crate::entity::Entity;

/// Owns the authoritative entity set keyed by unique id.
///
/// Additions and removals are buffered so that every entity observes the
/// same membership for the whole of an update pass: adds queued during tick
/// N become live at the start of tick N + 1, removals queued during tick N
/// are applied at the end of tick N. Ids are allocated monotonically by this
/// registry and never reused within its lifetime.
#[derive(Debug, Default)]
pub(crate) struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    pending_add: Vec<Entity>,
    pending_remove: Vec<EntityId>,
    next_id: u32,
}

impl EntityRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            next_id: 1,
        }
    }

    /// Hands out the next unique entity id.
    pub(crate) fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Defers the entity into the pending-add buffer.
    pub(crate) fn queue_add(&mut self, entity: Entity) {
        self.pending_add.push(entity);
    }

    /// Defers the id into the pending-remove buffer.
    ///
    /// Unknown or stale ids are tolerated; they simply do nothing when the
    /// buffer is flushed.
    pub(crate) fn queue_remove(&mut self, id: EntityId) {
        self.pending_remove.push(id);
    }

    /// Moves every pending entity into the live set.
    pub(crate) fn flush_adds(&mut self, out_events: &mut Vec<Event>) {
        for entity in self.pending_add.drain(..) {
            log::debug!("entity {} joined the live set", entity.id.get());
            out_events.push(Event::EntitySpawned {
                entity: entity.id,
                kind: entity.kind(),
            });
            let _ = self.entities.insert(entity.id, entity);
        }
    }

    /// Applies every pending removal against the live set.
    pub(crate) fn flush_removals(&mut self, out_events: &mut Vec<Event>) {
        for id in std::mem::take(&mut self.pending_remove) {
            if self.entities.remove(&id).is_some() {
                log::debug!("entity {} left the live set", id.get());
                out_events.push(Event::EntityRemoved { entity: id });
            }
        }
    }

    /// Queues removal for every live entity whose health has run out.
    pub(crate) fn sweep_dead(&mut self) {
        let dead: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| !entity.is_alive())
            .map(|entity| entity.id)
            .collect();
        for id in dead {
            self.queue_remove(id);
        }
    }

    /// Snapshot of live ids in ascending order, taken before an update pass
    /// so structural mutation is never observed mid-pass.
    pub(crate) fn live_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Temporarily removes an entity so it can be ticked against the rest of
    /// the world. Pair with [`EntityRegistry::restore`].
    pub(crate) fn take(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub(crate) fn restore(&mut self, entity: Entity) {
        let _ = self.entities.insert(entity.id, entity);
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Live entities in ascending id order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.entities.len()
    }
}
