use serde::{Deserialize, Serialize};
use swarmspace_collision::Contact;
use swarmspace_common::{
    Aabb, Category, Collider, ConfigError, Edge, EntityId, Footprint, SimConfig,
};
use swarmspace_steering::SteeringTarget;

use crate::arena::{Entity, EntityArena};
use crate::deferred::{DeferredEffect, DeferredQueue};
use crate::observer::{Notification, ObserverTable, Topic};

/// Frame counters wrap here back to 1, well clear of integer limits while
/// staying divisible by every stagger rate in use.
pub const FRAME_WRAP: u32 = 3600;

/// An event record produced by entity lifecycle and narrow-phase activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    Spawned { id: EntityId, category: Category },
    Despawned { id: EntityId, category: Category },
    /// Narrow-phase overlap between two movers, for the collision-response
    /// layer to consume.
    Contact { a: EntityId, b: EntityId, depth: f32 },
}

/// The authoritative world state.
///
/// Owns the entity arena, the destruction-notification table and the
/// deferred-effect queue. The spatial grid lives outside and drives entity
/// updates; it reads and writes entities through this type.
#[derive(Debug, Clone)]
pub struct World {
    config: SimConfig,
    arena: EntityArena,
    observers: ObserverTable,
    deferred: DeferredQueue,
    /// Monotonic tick count since startup.
    tick: u64,
    /// Wrapping frame counter used by the stagger arithmetic.
    frame: u32,
    delta: f32,
    seed: u64,
    viewport: Aabb,
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Build an empty world. The single fatal precondition lives here:
    /// invalid configuration is rejected before any simulation state exists.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, 0)
    }

    /// Build with a seed for deterministic cell phases downstream.
    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let viewport = Aabb::from_origin_size(
            glam::Vec2::ZERO,
            config.world_width,
            config.world_height,
        );
        Ok(Self {
            config,
            arena: EntityArena::new(),
            observers: ObserverTable::new(),
            deferred: DeferredQueue::new(),
            tick: 0,
            frame: 0,
            delta: 1.0,
            seed,
            viewport,
            event_log: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Region currently considered visible; defaults to the full world so an
    /// undriven viewport never throttles anything.
    pub fn viewport(&self) -> Aabb {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Aabb) {
        self.viewport = viewport;
    }

    pub fn entity_count(&self) -> usize {
        self.arena.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.arena.contains(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.arena.iter()
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    // --- Lifecycle ---

    /// Spawn with the default collider and speed for the category: movers get
    /// inflated circles and their configured speed, statics and items get
    /// corner-anchored boxes and stay put.
    pub fn spawn(&mut self, category: Category, footprint: Footprint) -> EntityId {
        let (collider, speed) = match category {
            Category::Player => (Collider::circle_for(&footprint), self.config.player_speed),
            Category::Friend | Category::Foe => {
                (Collider::circle_for(&footprint), self.config.ai_speed)
            }
            Category::Static | Category::Item => (Collider::box_for(&footprint), 0.0),
        };
        self.spawn_with_collider(category, footprint, collider, speed)
    }

    /// Spawn with an explicit collider (e.g. a centered box for a wall).
    pub fn spawn_with_collider(
        &mut self,
        category: Category,
        footprint: Footprint,
        collider: Collider,
        speed: f32,
    ) -> EntityId {
        let cell_count = self.config.cell_count;
        let id = self.arena.spawn_with(|id| Entity {
            id,
            category,
            footprint,
            collider,
            speed,
            base_speed: speed,
            steering: category.is_dynamic().then(|| SteeringTarget::idle(id)),
            update_rate: 1,
            last_pass: 0,
            cells_active: vec![false; cell_count],
            surrounding_cells: Vec::new(),
            cell_edge_dist: 0.0,
        });
        self.event_log.push(WorldEvent::Spawned { id, category });
        id
    }

    /// Destroy an entity.
    ///
    /// Order matters: pending deferred effects are cancelled and the
    /// entity's own subscriptions dropped first, then the destruction topic
    /// fires so trackers degrade to idle within this same tick, and only
    /// then is the slot invalidated. Bucket entries elsewhere go stale and
    /// are evicted lazily during the next iteration over them.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        let _ = self.deferred.cancel_owner(id);
        self.observers.unsubscribe_all(id);
        for (subscriber, note) in self.observers.publish(id, Topic::Destroyed) {
            self.apply_notification(subscriber, note);
        }
        self.observers.drop_publisher(id);
        if let Some(entity) = self.arena.despawn(id) {
            tracing::debug!(index = id.index, category = ?entity.category, "despawned");
            self.event_log.push(WorldEvent::Despawned {
                id,
                category: entity.category,
            });
        }
        true
    }

    fn apply_notification(&mut self, subscriber: EntityId, note: Notification) {
        match note {
            Notification::TargetDestroyed => {
                if let Some(entity) = self.arena.get_mut(subscriber) {
                    if let Some(steering) = entity.steering.as_mut() {
                        steering.on_target_destroyed();
                    }
                }
            }
        }
    }

    // --- Steering ---

    /// Point `seeker` at `target` (or back at itself when `None`).
    ///
    /// Re-targeting the current target only updates the reverse flag.
    /// Otherwise the destruction subscription moves from the old target to
    /// the new one and distance and direction are recomputed immediately,
    /// bypassing the arrival short-circuit. Returns whether the target
    /// actually changed.
    pub fn set_target(
        &mut self,
        seeker: EntityId,
        target: Option<EntityId>,
        reverse: bool,
    ) -> bool {
        let Some(entity) = self.arena.get(seeker) else {
            return false;
        };
        let Some(steering) = entity.steering else {
            return false;
        };
        let new_target = target.unwrap_or(seeker);
        let current = steering.target();

        if current == new_target {
            if let Some(entity) = self.arena.get_mut(seeker) {
                if let Some(steering) = entity.steering.as_mut() {
                    steering.set_reverse(reverse);
                }
            }
            return false;
        }

        if current != seeker {
            self.observers.unsubscribe(current, Topic::Destroyed, seeker);
        }
        if let Some(entity) = self.arena.get_mut(seeker) {
            if let Some(steering) = entity.steering.as_mut() {
                steering.adopt(new_target, reverse);
            }
        }
        if new_target != seeker {
            self.observers.subscribe(
                new_target,
                Topic::Destroyed,
                seeker,
                Notification::TargetDestroyed,
            );
        }
        self.refresh_target(seeker, true);
        true
    }

    /// Recompute a seeker's cached distance and direction from current
    /// positions. A target that cannot be resolved degrades the relation to
    /// idle instead of faulting.
    pub fn refresh_target(&mut self, seeker: EntityId, force: bool) {
        let Some(entity) = self.arena.get(seeker) else {
            return;
        };
        let Some(steering) = entity.steering else {
            return;
        };
        let seeker_pos = entity.footprint.position;
        let target_id = steering.target();
        let target_pos = if target_id == seeker {
            seeker_pos
        } else {
            match self.arena.get(target_id) {
                Some(target) => target.footprint.position,
                None => {
                    if let Some(entity) = self.arena.get_mut(seeker) {
                        if let Some(steering) = entity.steering.as_mut() {
                            steering.on_target_destroyed();
                        }
                    }
                    return;
                }
            }
        };
        if let Some(entity) = self.arena.get_mut(seeker) {
            if let Some(steering) = entity.steering.as_mut() {
                steering.refresh(seeker_pos, target_pos, force);
            }
        }
    }

    // --- Deferred effects ---

    /// Queue an effect against `owner`, due after `delay_ticks`.
    pub fn schedule_effect(&mut self, owner: EntityId, delay_ticks: u64, effect: DeferredEffect) {
        self.deferred.schedule(owner, self.tick, delay_ticks, effect);
    }

    /// Pending deferred effects for one entity.
    pub fn pending_effects(&self, owner: EntityId) -> usize {
        self.deferred.pending_for(owner)
    }

    /// Cancel every pending effect for `owner` without touching its state.
    pub fn cancel_effects(&mut self, owner: EntityId) -> usize {
        self.deferred.cancel_owner(owner)
    }

    /// Return an entity to its baseline: pending effects cancelled, base
    /// speed restored, reverse flag cleared.
    pub fn reset(&mut self, id: EntityId) {
        let _ = self.deferred.cancel_owner(id);
        self.apply_effect(id, DeferredEffect::Reset);
    }

    fn apply_effect(&mut self, owner: EntityId, effect: DeferredEffect) {
        match effect {
            DeferredEffect::SetSpeed(speed) => {
                if let Some(entity) = self.arena.get_mut(owner) {
                    entity.speed = speed;
                }
            }
            DeferredEffect::SetReverse(reverse) => {
                if let Some(entity) = self.arena.get_mut(owner) {
                    if let Some(steering) = entity.steering.as_mut() {
                        steering.set_reverse(reverse);
                    }
                }
            }
            DeferredEffect::Reset => {
                if let Some(entity) = self.arena.get_mut(owner) {
                    entity.speed = entity.base_speed;
                    if let Some(steering) = entity.steering.as_mut() {
                        steering.set_reverse(false);
                    }
                }
            }
            DeferredEffect::Despawn => {
                let _ = self.despawn(owner);
            }
        }
    }

    // --- Tick ---

    /// Advance the clock and fire due deferred effects. The grid drives cell
    /// and entity updates after this, within the same external tick call.
    pub fn begin_tick(&mut self, delta: f32) {
        self.tick += 1;
        self.frame += 1;
        if self.frame > FRAME_WRAP {
            self.frame = 1;
        }
        self.delta = delta;
        self.seed = splitmix64(self.seed);
        for (owner, effect) in self.deferred.drain_due(self.tick) {
            self.apply_effect(owner, effect);
        }
    }

    // --- Geometry helpers ---

    /// Narrow-phase test between two entities' shapes. A missing entity on
    /// either side means no collision.
    pub fn collide(&self, a: EntityId, b: EntityId) -> Option<Contact> {
        let ca = self.arena.get(a)?.collider;
        let cb = self.arena.get(b)?.collider;
        swarmspace_collision::collide(&ca, &cb)
    }

    /// Record a narrow-phase hit for the response layer.
    pub fn record_contact(&mut self, a: EntityId, b: EntityId, contact: &Contact) {
        self.event_log.push(WorldEvent::Contact {
            a,
            b,
            depth: contact.depth,
        });
    }

    /// Which world edge an entity has reached, if any.
    pub fn edge_reached(&self, id: EntityId) -> Option<Edge> {
        let entity = self.arena.get(id)?;
        self.config.edge_reached(&entity.footprint)
    }
}

/// Splitmix64: fast deterministic mixer used to advance the world seed and
/// derive per-cell counter phases without platform-dependent randomness.
pub fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
