use swarmspace_common::{Category, ConfigError, EntityId, Footprint, SimConfig};
use swarmspace_kernel::World;

use crate::grid::Grid;

/// World plus grid behind the single per-frame entry point.
///
/// The external driver supplies delta time; deferred effects, cell
/// scheduling, steering, movement and membership all happen synchronously
/// inside [`Simulation::tick`].
#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    grid: Grid,
}

impl Simulation {
    /// Validate the configuration and build an empty world with its grid.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, 0)
    }

    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        let world = World::with_seed(config, seed)?;
        let grid = Grid::new(world.config(), seed);
        Ok(Self { world, grid })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Advance one frame: clock and deferred effects first, then every
    /// cell's staggered update.
    pub fn tick(&mut self, delta: f32) {
        self.world.begin_tick(delta);
        self.grid.update(&mut self.world);
    }

    /// Spawn a mover and place it into its starting cells (full scan).
    pub fn spawn_mover(&mut self, category: Category, footprint: Footprint) -> EntityId {
        let id = self.world.spawn(category, footprint);
        self.grid.place(&mut self.world, id);
        id
    }

    /// Spawn a static or item entity and register it once.
    pub fn spawn_fixture(&mut self, category: Category, footprint: Footprint) -> EntityId {
        let id = self.world.spawn(category, footprint);
        self.grid.register_static(&self.world, id);
        id
    }
}
