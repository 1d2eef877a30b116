//! Spatial grid: fixed square cell layout over the world, category-bucketed
//! membership, and a per-cell staggered scheduler.
//!
//! # Invariants
//! - An entity's active-cell flags track actual shape overlap, within the
//!   staleness window its edge-distance budget allows.
//! - A cell's surrounding-cell cache is the deduplicated union of the Moore
//!   neighborhoods of every cell the entity is active in.
//! - Bucket eviction is lazy: destroyed or departed entities drop out during
//!   the next iteration over the bucket, never via an explicit removal call.

mod cell;
mod grid;
mod sim;

pub use cell::{Cell, OFFSCREEN_UPDATE_RATE, VIEW_CHECK_RATE};
pub use grid::{Grid, GridStats};
pub use sim::Simulation;
