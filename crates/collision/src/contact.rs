use glam::Vec2;
use swarmspace_common::{Aabb, Circle, Collider};

/// Result of an overlap test, returned by value per call.
///
/// `normal` points from the first shape toward the second; translating the
/// second shape by `vector` resolves the overlap. `depth` is the minimal
/// separating distance, so for a circle contained in a box it is the distance
/// to the nearest face plus the radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub depth: f32,
    pub vector: Vec2,
    pub normal: Vec2,
}

impl Contact {
    fn along(normal: Vec2, depth: f32) -> Self {
        Self {
            depth,
            vector: normal * depth,
            normal,
        }
    }

    fn flipped(self) -> Self {
        Self {
            depth: self.depth,
            vector: -self.vector,
            normal: -self.normal,
        }
    }
}

/// Axis-aligned box versus box. Touching edges do not count as overlap.
pub fn box_box(a: &Aabb, b: &Aabb) -> Option<Contact> {
    let overlap_x = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    if overlap_x <= 0.0 {
        return None;
    }
    let overlap_y = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if overlap_y <= 0.0 {
        return None;
    }

    let delta = b.center() - a.center();
    let normal = if overlap_x < overlap_y {
        Vec2::new(delta.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, delta.y.signum())
    };
    Some(Contact::along(normal, overlap_x.min(overlap_y)))
}

/// Axis-aligned box versus circle.
///
/// A circle whose center lies inside the box reports the depth needed to push
/// it out through the nearest face; the membership budget arithmetic relies
/// on that being face distance plus radius.
pub fn box_circle(b: &Aabb, c: &Circle) -> Option<Contact> {
    let closest = c.center.clamp(b.min, b.max);

    if closest == c.center {
        // Center inside the box: find the nearest face.
        let to_left = c.center.x - b.min.x;
        let to_right = b.max.x - c.center.x;
        let to_top = c.center.y - b.min.y;
        let to_bottom = b.max.y - c.center.y;

        let mut face_dist = to_left;
        let mut normal = Vec2::new(-1.0, 0.0);
        if to_right < face_dist {
            face_dist = to_right;
            normal = Vec2::new(1.0, 0.0);
        }
        if to_top < face_dist {
            face_dist = to_top;
            normal = Vec2::new(0.0, -1.0);
        }
        if to_bottom < face_dist {
            face_dist = to_bottom;
            normal = Vec2::new(0.0, 1.0);
        }
        return Some(Contact::along(normal, face_dist + c.radius));
    }

    let delta = c.center - closest;
    let dist_sqr = delta.length_squared();
    if dist_sqr >= c.radius * c.radius {
        return None;
    }
    let dist = dist_sqr.sqrt();
    Some(Contact::along(delta / dist, c.radius - dist))
}

/// Circle versus circle.
pub fn circle_circle(a: &Circle, b: &Circle) -> Option<Contact> {
    let radius_sum = a.radius + b.radius;
    let delta = b.center - a.center;
    let dist_sqr = delta.length_squared();
    if dist_sqr >= radius_sum * radius_sum {
        return None;
    }
    let dist = dist_sqr.sqrt();
    if dist == 0.0 {
        // Coincident centers; any separating axis works.
        return Some(Contact::along(Vec2::X, radius_sum));
    }
    Some(Contact::along(delta / dist, radius_sum - dist))
}

/// Dispatch on the shape pair. The normal always points from `a` toward `b`.
pub fn collide(a: &Collider, b: &Collider) -> Option<Contact> {
    match (a, b) {
        (Collider::Box(ba), Collider::Box(bb)) => box_box(ba, bb),
        (Collider::Box(ba), Collider::Circle(cb)) => box_circle(ba, cb),
        (Collider::Circle(ca), Collider::Box(bb)) => box_circle(bb, ca).map(Contact::flipped),
        (Collider::Circle(ca), Collider::Circle(cb)) => circle_circle(ca, cb),
    }
}
