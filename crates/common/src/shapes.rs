use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::Footprint;

/// Factor by which mover circles are inflated relative to their footprint,
/// so near-misses still register for interaction checks.
pub const MOVER_COLLIDER_INFLATION: f32 = 1.25;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box anchored at its top-left corner, matching footprint anchoring.
    pub fn from_origin_size(origin: Vec2, width: f32, height: f32) -> Self {
        Self {
            min: origin,
            max: origin + Vec2::new(width, height),
        }
    }

    /// Box centered on `center`.
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        let half = Vec2::new(width, height) * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Move the box so its top-left corner sits at `origin`.
    pub fn set_origin(&mut self, origin: Vec2) {
        let size = self.max - self.min;
        self.min = origin;
        self.max = origin + size;
    }
}

/// Circle collider; `center` tracks the owning entity's footprint position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Collision shape carried by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    Box(Aabb),
    Circle(Circle),
}

impl Collider {
    /// Corner-anchored box matching the footprint.
    pub fn box_for(footprint: &Footprint) -> Self {
        Collider::Box(Aabb::from_origin_size(
            footprint.position,
            footprint.width,
            footprint.height,
        ))
    }

    /// Box centered on the footprint position.
    pub fn centered_box_for(footprint: &Footprint) -> Self {
        Collider::Box(Aabb::centered(
            footprint.position,
            footprint.width,
            footprint.height,
        ))
    }

    /// Inflated circle for a mover, centered on the footprint position.
    pub fn circle_for(footprint: &Footprint) -> Self {
        Collider::Circle(Circle::new(
            footprint.position,
            footprint.width * 0.5 * MOVER_COLLIDER_INFLATION,
        ))
    }

    /// Re-anchor the shape after the footprint position changed.
    pub fn set_position(&mut self, position: Vec2) {
        match self {
            Collider::Box(aabb) => aabb.set_origin(position),
            Collider::Circle(circle) => circle.center = position,
        }
    }

    /// Extent used by the membership re-check arithmetic: how far the shape
    /// can travel before a fresh edge test is owed.
    pub fn probe_diameter(&self) -> f32 {
        match self {
            Collider::Box(aabb) => aabb.width().min(aabb.height()),
            Collider::Circle(circle) => circle.radius * 2.0,
        }
    }
}
