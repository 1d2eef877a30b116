use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique identifier for an entity: dense arena slot plus generation.
///
/// The generation makes "does this entity still exist" a cheap comparison
/// instead of a delivered callback. Cell buckets and steering targets store
/// ids, never references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Gameplay category of an entity.
///
/// One record with a tag replaces the base/collidable/movable class tower;
/// systems branch on the tag instead of dispatching virtually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// The single externally controlled entity.
    Player,
    /// Follower-type mover.
    Friend,
    /// Hostile-type mover.
    Foe,
    /// Level geometry placed once at build time.
    Static,
    /// Pickup placed once at build time.
    Item,
}

impl Category {
    /// Movers are tracked incrementally; statics and items are registered once.
    pub fn is_dynamic(self) -> bool {
        matches!(self, Category::Player | Category::Friend | Category::Foe)
    }
}

/// Position and extents of an entity, anchored at the top-left corner.
///
/// This is the authoritative position record; colliders and cell membership
/// are derived from it after an external mover writes it back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            width,
            height,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}
