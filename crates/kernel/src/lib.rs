//! World kernel: entity arena, destruction notifications, deferred effects,
//! and per-tick stepping.
//!
//! # Invariants
//! - All state mutation happens synchronously inside the external tick call.
//! - A despawned entity leaves no observable trace: its deferred effects are
//!   cancelled and its observer rows dropped before the slot is reused.

pub mod arena;
pub mod deferred;
pub mod observer;
pub mod world;

pub use arena::{Entity, EntityArena};
pub use deferred::{DeferredEffect, DeferredQueue};
pub use observer::{Notification, ObserverTable, Topic};
pub use world::{splitmix64, World, WorldEvent, FRAME_WRAP};
