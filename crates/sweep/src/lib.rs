//! # Sweep
//!
//! Collision queries for character traversal and melee resolution.
//!
//! Sweep answers the geometric questions an action-game character asks of its
//! surroundings every frame: what is directly ahead, where is the top of this
//! obstacle, does my capsule fit over there, and who did that swing pass
//! through. It is deliberately not a physics engine; nothing here moves.
//!
//! - **Shapes**: spheres, axis-aligned boxes and capsules in world space
//! - **Channels**: bitflag masks deciding which colliders a query sees
//! - **Casts**: rays and swept spheres, nearest hit or all hits
//! - **Overlaps**: which colliders intersect a shape right now
//!
//! ## Quick Start
//!
//! ```
//! use glam::Vec3;
//! use sweep::{Bounds, CollisionChannels, CollisionWorld, QueryFilter, Shape, StaticWorld};
//!
//! let mut world = StaticWorld::new();
//! world.insert(
//!     Shape::aabb(Bounds::from_min_max(Vec3::new(100.0, -50.0, 0.0), Vec3::new(200.0, 50.0, 120.0))),
//!     CollisionChannels::WORLD_STATIC,
//!     None,
//! );
//!
//! let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC);
//! let hit = world.raycast(Vec3::new(0.0, 0.0, 60.0), Vec3::X, 500.0, &filter);
//! assert!((hit.unwrap().distance - 100.0).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cast;
pub mod channel;
pub mod shape;
pub mod world;

pub use cast::Ray;
pub use channel::{CollisionChannels, QueryFilter};
pub use shape::Shape;
pub use world::{Collider, ColliderId, CollisionWorld, Hit, Overlap, StaticWorld};

use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Create bounds from dimensions (centered at origin).
    #[must_use]
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            min: Vec3::new(-width / 2.0, -height / 2.0, -depth / 2.0),
            max: Vec3::new(width / 2.0, height / 2.0, depth / 2.0),
        }
    }

    /// Create bounds from min/max corners.
    ///
    /// The corners are reordered per axis, so callers may pass them in any order.
    #[must_use]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create bounds from a center point and half extents.
    #[must_use]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Get the center of the bounds.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow the bounds by `amount` on every side.
    #[must_use]
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }

    /// Check if a point is inside the bounds.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if a point is strictly inside the bounds (not on a face).
    #[must_use]
    pub fn contains_strict(&self, point: Vec3) -> bool {
        point.x > self.min.x
            && point.x < self.max.x
            && point.y > self.min.y
            && point.y < self.max.y
            && point.z > self.min.z
            && point.z < self.max.z
    }

    /// Check if two boxes intersect (touching counts).
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Closest point inside the bounds to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Squared distance from `point` to the bounds (zero when inside).
    #[must_use]
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        point.distance_squared(self.closest_point(point))
    }

    /// Check if this bounds intersects a sphere.
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_squared(center) <= radius * radius
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(100.0, 100.0, 100.0)
    }
}
