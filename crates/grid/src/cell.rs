use swarmspace_common::{Aabb, Category, EntityId};
use swarmspace_kernel::FRAME_WRAP;

/// How often (in cell frames) a cell re-tests itself against the viewport.
pub const VIEW_CHECK_RATE: u32 = 12;

/// Update rate adopted by cells outside the viewport; visible cells run at 1.
/// Movers compensate by scaling their step with the owning cell's rate.
pub const OFFSCREEN_UPDATE_RATE: u32 = 4;

/// A fixed rectangular bucket of the world grid.
///
/// Holds category-partitioned entity ids plus an independent frame counter.
/// The counter starts at a per-cell phase so the grid never updates all
/// cells in lockstep on the same frame.
#[derive(Debug, Clone)]
pub struct Cell {
    pub index: usize,
    pub bounds: Aabb,
    /// Singleton slot; a later placement overwrites an earlier one.
    pub player: Option<EntityId>,
    pub friends: Vec<EntityId>,
    pub foes: Vec<EntityId>,
    pub statics: Vec<EntityId>,
    pub items: Vec<EntityId>,
    pub update_rate: u32,
    counter: u32,
}

impl Cell {
    pub fn new(index: usize, bounds: Aabb, phase: u32) -> Self {
        Self {
            index,
            bounds,
            player: None,
            friends: Vec::new(),
            foes: Vec::new(),
            statics: Vec::new(),
            items: Vec::new(),
            update_rate: 1,
            counter: phase % FRAME_WRAP,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Advance the frame counter, wrapping well before integer limits.
    pub fn advance(&mut self) {
        self.counter += 1;
        if self.counter > FRAME_WRAP {
            self.counter = 1;
        }
    }

    /// Stagger check: does work gated at `rate` run this frame?
    pub fn due(&self, rate: u32) -> bool {
        rate > 0 && self.counter % rate == 0
    }

    /// The bucket for a category, the player slot viewed as a 0/1 bucket.
    pub fn bucket(&self, category: Category) -> &[EntityId] {
        match category {
            Category::Player => self.player.as_slice(),
            Category::Friend => &self.friends,
            Category::Foe => &self.foes,
            Category::Static => &self.statics,
            Category::Item => &self.items,
        }
    }
}
