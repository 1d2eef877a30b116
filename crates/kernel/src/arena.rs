use serde::{Deserialize, Serialize};
use swarmspace_common::{Category, Collider, EntityId, Footprint};
use swarmspace_steering::SteeringTarget;

/// Per-entity simulation record.
///
/// One record with a category tag covers every kind of object; the optional
/// steering sub-record distinguishes movers from level geometry. Grid
/// bookkeeping (`cells_active`, `surrounding_cells`, `cell_edge_dist`) lives
/// here so membership survives the entity moving between cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub category: Category,
    pub footprint: Footprint,
    pub collider: Collider,
    pub speed: f32,
    /// Speed restored by a reset effect.
    pub base_speed: f32,
    pub steering: Option<SteeringTarget>,
    /// Update rate inherited from the cell that last drove this entity.
    pub update_rate: u32,
    /// Monotonic tick of the last movement pass; an entity spanning several
    /// cells moves only on its first visit per tick.
    pub last_pass: u64,
    /// `cells_active[i]` is true while this entity overlaps cell `i`.
    pub cells_active: Vec<bool>,
    /// Cached union of the Moore neighborhoods of all active cells.
    pub surrounding_cells: Vec<usize>,
    /// Remaining safe travel distance before membership must be re-checked.
    pub cell_edge_dist: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Dense generational arena of entities.
///
/// Slots are reused after despawn with a bumped generation, so a stale
/// [`EntityId`] held by a bucket or a steering target simply fails to
/// resolve instead of dangling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entity.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate a slot and build the entity with its assigned id.
    pub fn spawn_with(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = EntityId::new(index, slot.generation);
        slot.entity = Some(build(id));
        id
    }

    /// Remove an entity, invalidating its id for all holders.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.entity.is_none() {
            return None;
        }
        let entity = slot.entity.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        entity
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    /// Iterate live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|s| s.entity.as_ref())
    }
}
