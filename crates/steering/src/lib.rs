//! Steering: per-entity desired heading and distance toward a tracked target.
//!
//! # Invariants
//! - The target id equals the seeker's own id when idle; it is never left
//!   pointing at a destroyed entity across a tick boundary.
//! - Distance is cached squared; direction is cached as a unit vector,
//!   negated while the reverse flag is set.
//!
//! Subscription wiring for target destruction lives in the kernel; this
//! crate holds only the state machine over positions it is handed.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use swarmspace_collision::{direction, magnitude_sqr};
use swarmspace_common::EntityId;

/// Squared arrival threshold: within 25 units the seeker counts as arrived.
pub const ARRIVE_DIST_SQR: f32 = 625.0;

/// Tracks a target entity and caches the seeker's heading toward it.
///
/// States: idle (target == seeker), seeking, arrived (distance at or under
/// the threshold), with an orthogonal reverse flag that negates the heading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SteeringTarget {
    seeker: EntityId,
    target: EntityId,
    direction: Vec2,
    distance_sqr: f32,
    at_destination: bool,
    reverse: bool,
}

impl SteeringTarget {
    /// New idle steering state: the seeker targets itself.
    pub fn idle(seeker: EntityId) -> Self {
        Self {
            seeker,
            target: seeker,
            direction: Vec2::ZERO,
            distance_sqr: 0.0,
            at_destination: false,
            reverse: false,
        }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn is_idle(&self) -> bool {
        self.target == self.seeker
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn distance_sqr(&self) -> f32 {
        self.distance_sqr
    }

    pub fn at_destination(&self) -> bool {
        self.at_destination
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    /// Adopt a new target id. The kernel is responsible for moving the
    /// destruction subscription and for the forced refresh that follows.
    pub fn adopt(&mut self, target: EntityId, reverse: bool) {
        self.target = target;
        self.reverse = reverse;
    }

    /// Degrade to idle; invoked on the tracked target's destruction.
    pub fn on_target_destroyed(&mut self) {
        self.target = self.seeker;
    }

    /// Recompute the cached squared distance.
    ///
    /// `at_destination` becomes true exactly when the refresh is not forced
    /// and the squared distance is at or under [`ARRIVE_DIST_SQR`].
    pub fn update_distance(&mut self, seeker_pos: Vec2, target_pos: Vec2, force: bool) {
        if !force && self.is_idle() {
            return;
        }
        self.at_destination = false;
        self.distance_sqr = magnitude_sqr(seeker_pos, target_pos);
        if !force && self.distance_sqr <= ARRIVE_DIST_SQR {
            self.at_destination = true;
        }
    }

    /// Recompute the cached unit heading, negated while reversed.
    ///
    /// Skipped when already arrived and not forced; the cached heading is
    /// stale but unused until the seeker leaves the arrival radius.
    pub fn update_direction(&mut self, seeker_pos: Vec2, target_pos: Vec2, force: bool) {
        if !force && (self.is_idle() || self.at_destination) {
            return;
        }
        let heading = direction(seeker_pos, target_pos);
        self.direction = if self.reverse { -heading } else { heading };
    }

    /// Distance first, then direction, matching the arrival short-circuit.
    pub fn refresh(&mut self, seeker_pos: Vec2, target_pos: Vec2, force: bool) {
        self.update_distance(seeker_pos, target_pos, force);
        self.update_direction(seeker_pos, target_pos, force);
    }
}
