use glam::Vec2;
use swarmspace_common::EntityId;

/// Unit vector from `a` toward `b`; zero when the points coincide.
pub fn direction(a: Vec2, b: Vec2) -> Vec2 {
    (b - a).normalize_or_zero()
}

/// Euclidean distance. Reserved for callers that need an absolute length;
/// per-tick loops use [`magnitude_sqr`].
pub fn magnitude(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Squared Euclidean distance.
pub fn magnitude_sqr(a: Vec2, b: Vec2) -> f32 {
    (b - a).length_squared()
}

/// Dot product of two position vectors.
pub fn dot(a: Vec2, b: Vec2) -> f32 {
    a.dot(b)
}

/// Direction paired with the rooted distance.
pub fn direction_and_magnitude(a: Vec2, b: Vec2) -> (Vec2, f32) {
    (direction(a, b), magnitude(a, b))
}

/// Direction paired with the squared distance.
pub fn direction_and_magnitude_sqr(a: Vec2, b: Vec2) -> (Vec2, f32) {
    (direction(a, b), magnitude_sqr(a, b))
}

/// Nearest candidate by squared distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestHit {
    pub id: EntityId,
    pub distance_sqr: f32,
}

/// Linear scan for the candidate nearest to `origin`.
///
/// Candidates at exactly zero distance are skipped so an entity scanning a
/// bucket it belongs to never finds itself. Returns `None` for an empty or
/// all-coincident candidate set.
pub fn closest<I>(origin: Vec2, candidates: I) -> Option<ClosestHit>
where
    I: IntoIterator<Item = (EntityId, Vec2)>,
{
    let mut best: Option<ClosestHit> = None;
    for (id, position) in candidates {
        let distance_sqr = magnitude_sqr(origin, position);
        if distance_sqr == 0.0 {
            continue;
        }
        if best.is_none_or(|b| distance_sqr < b.distance_sqr) {
            best = Some(ClosestHit { id, distance_sqr });
        }
    }
    best
}
