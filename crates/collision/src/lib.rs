//! Collision math: overlap tests producing contacts, plus vector helpers.
//!
//! # Invariants
//! - Every test returns an owned [`Contact`]; there is no shared scratch
//!   state between calls.
//! - Squared distances everywhere in per-tick paths; the rooted form exists
//!   only for callers that need an absolute length.

mod contact;
mod vector;

pub use contact::{box_box, box_circle, circle_circle, collide, Contact};
pub use vector::{
    closest, direction, direction_and_magnitude, direction_and_magnitude_sqr, dot, magnitude,
    magnitude_sqr, ClosestHit,
};
