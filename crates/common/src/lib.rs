//! Shared types for the swarmspace simulation core.
//!
//! # Invariants
//! - `EntityId` is a dense slot address plus generation; a stale id never
//!   resolves to a live entity.
//! - `SimConfig` is validated once at startup; the grid math downstream may
//!   assume a square cell layout.

pub mod config;
pub mod shapes;
pub mod types;

pub use config::{ConfigError, Edge, SimConfig, StaggerRates};
pub use shapes::{Aabb, Circle, Collider};
pub use types::{Category, EntityId, Footprint};
