use serde::{Deserialize, Serialize};

use crate::types::Footprint;

/// Errors detected while validating a [`SimConfig`].
///
/// These are startup configuration faults, rejected before the simulation
/// begins; nothing at runtime recovers from them.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cell_count {0} is not a perfect square")]
    CellCountNotSquare(usize),
    #[error("cell_count must be at least 1")]
    EmptyGrid,
    #[error("world extents {width}x{height} are degenerate")]
    DegenerateWorld { width: f32, height: f32 },
}

/// Frame-stagger cadences, in cell frames between runs of each concern.
///
/// A rate of 1 runs every frame the owning cell updates; 2 every other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StaggerRates {
    /// Frames between membership re-evaluations for movers.
    pub cell_update_rate: u32,
    /// Frames between membership re-evaluations for the player.
    pub player_cell_update_rate: u32,
    /// Frames between steering direction/distance refreshes for movers.
    pub direction_update_rate: u32,
    /// Frames between mover-versus-player narrow-phase checks.
    pub interact_update_rate: u32,
}

impl Default for StaggerRates {
    fn default() -> Self {
        Self {
            cell_update_rate: 2,
            player_cell_update_rate: 2,
            direction_update_rate: 2,
            interact_update_rate: 2,
        }
    }
}

/// Fixed startup configuration for the world and its grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub world_width: f32,
    pub world_height: f32,
    /// Total number of grid cells; must be a perfect square.
    pub cell_count: usize,
    #[serde(default)]
    pub rates: StaggerRates,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_ai_speed")]
    pub ai_speed: f32,
}

fn default_player_speed() -> f32 {
    0.5
}

fn default_ai_speed() -> f32 {
    0.3
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: 1920.0,
            world_height: 1080.0,
            cell_count: 64,
            rates: StaggerRates::default(),
            player_speed: default_player_speed(),
            ai_speed: default_ai_speed(),
        }
    }
}

impl SimConfig {
    /// Reject invalid configuration before any simulation state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_count == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if integer_sqrt(self.cell_count).is_none() {
            return Err(ConfigError::CellCountNotSquare(self.cell_count));
        }
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err(ConfigError::DegenerateWorld {
                width: self.world_width,
                height: self.world_height,
            });
        }
        Ok(())
    }

    /// Cells per grid row; valid only after [`SimConfig::validate`].
    pub fn grid_side(&self) -> usize {
        integer_sqrt(self.cell_count).unwrap_or(0)
    }

    /// Width and height of a single cell.
    pub fn cell_extent(&self) -> (f32, f32) {
        let side = self.grid_side().max(1) as f32;
        (self.world_width / side, self.world_height / side)
    }

    /// Which world edge a footprint has reached, if any.
    ///
    /// Checked against the fixed world bounds, never against a moving view.
    pub fn edge_reached(&self, footprint: &Footprint) -> Option<Edge> {
        if footprint.position.y < 1.0 {
            return Some(Edge::Top);
        }
        if footprint.position.y + footprint.height >= self.world_height {
            return Some(Edge::Bottom);
        }
        if footprint.position.x + footprint.width >= self.world_width {
            return Some(Edge::Right);
        }
        if footprint.position.x < 1.0 {
            return Some(Edge::Left);
        }
        None
    }
}

/// World edge classification for boundary handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

fn integer_sqrt(n: usize) -> Option<usize> {
    let root = (n as f64).sqrt().round() as usize;
    (root * root == n).then_some(root)
}
