//! World-space collision shapes and overlap tests.
//!
//! Spheres are treated as capsules whose segment has collapsed to a point, so
//! every overlap test reduces to one of three distance problems:
//! segment/segment, segment/box and box/box.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Shapes that are closer than this are touching, not overlapping.
pub const CONTACT_SLOP: f32 = 1.0e-3;

const SEGMENT_BOX_ITERATIONS: usize = 48;

/// A collision shape positioned in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Sphere defined by center and radius
    Sphere {
        /// Sphere center
        center: Vec3,
        /// Sphere radius
        radius: f32,
    },
    /// Axis-aligned box
    Box {
        /// Box extents
        bounds: Bounds,
    },
    /// Capsule (two endpoints + radius)
    Capsule {
        /// First segment endpoint
        p0: Vec3,
        /// Second segment endpoint
        p1: Vec3,
        /// Radius around the segment
        radius: f32,
    },
}

impl Shape {
    /// Create a sphere shape.
    #[must_use]
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::Sphere { center, radius }
    }

    /// Create a box shape from bounds.
    #[must_use]
    pub fn aabb(bounds: Bounds) -> Self {
        Self::Box { bounds }
    }

    /// Create a box shape from min/max corners.
    #[must_use]
    pub fn box_min_max(min: Vec3, max: Vec3) -> Self {
        Self::Box {
            bounds: Bounds::from_min_max(min, max),
        }
    }

    /// Create a capsule shape.
    #[must_use]
    pub fn capsule(p0: Vec3, p1: Vec3, radius: f32) -> Self {
        Self::Capsule { p0, p1, radius }
    }

    /// Create a Z-up character capsule.
    ///
    /// `half_height` is measured from `center` to the tip of a hemisphere, so
    /// the capsule spans `2 * half_height` vertically. A half height smaller
    /// than the radius degenerates into a sphere.
    #[must_use]
    pub fn upright_capsule(center: Vec3, radius: f32, half_height: f32) -> Self {
        let segment_half = (half_height - radius).max(0.0);
        Self::Capsule {
            p0: center - Vec3::Z * segment_half,
            p1: center + Vec3::Z * segment_half,
            radius,
        }
    }

    /// Get the bounding box of this shape.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Sphere { center, radius } => Bounds::from_min_max(
                *center - Vec3::splat(*radius),
                *center + Vec3::splat(*radius),
            ),
            Shape::Box { bounds } => *bounds,
            Shape::Capsule { p0, p1, radius } => {
                let min = p0.min(*p1) - Vec3::splat(*radius);
                let max = p0.max(*p1) + Vec3::splat(*radius);
                Bounds::from_min_max(min, max)
            }
        }
    }

    /// Same shape moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        match *self {
            Shape::Sphere { center, radius } => Shape::Sphere {
                center: center + offset,
                radius,
            },
            Shape::Box { bounds } => Shape::Box {
                bounds: Bounds::from_min_max(bounds.min + offset, bounds.max + offset),
            },
            Shape::Capsule { p0, p1, radius } => Shape::Capsule {
                p0: p0 + offset,
                p1: p1 + offset,
                radius,
            },
        }
    }

    /// Check if a point is inside this shape.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        match self {
            Shape::Box { bounds } => bounds.contains(point),
            _ => {
                let (a, b, radius) = self.as_segment().unwrap_or((point, point, 0.0));
                point_segment_distance_squared(point, a, b) <= radius * radius
            }
        }
    }

    /// Check whether two shapes overlap with positive depth.
    #[must_use]
    pub fn intersects(&self, other: &Shape) -> bool {
        match (self.as_segment(), other.as_segment()) {
            (Some((a0, a1, ra)), Some((b0, b1, rb))) => {
                let reach = (ra + rb - CONTACT_SLOP).max(0.0);
                segment_segment_distance_squared(a0, a1, b0, b1) < reach * reach
            }
            (Some((a0, a1, r)), None) => {
                let Shape::Box { bounds } = other else { return false };
                segment_box_overlaps(a0, a1, r, bounds)
            }
            (None, Some((b0, b1, r))) => {
                let Shape::Box { bounds } = self else { return false };
                segment_box_overlaps(b0, b1, r, bounds)
            }
            (None, None) => match (self, other) {
                (Shape::Box { bounds: a }, Shape::Box { bounds: b }) => boxes_overlap(a, b),
                _ => false,
            },
        }
    }

    /// Segment-and-radius form of spheres and capsules; `None` for boxes.
    #[must_use]
    pub fn as_segment(&self) -> Option<(Vec3, Vec3, f32)> {
        match *self {
            Shape::Sphere { center, radius } => Some((center, center, radius)),
            Shape::Capsule { p0, p1, radius } => Some((p0, p1, radius)),
            Shape::Box { .. } => None,
        }
    }
}

fn boxes_overlap(a: &Bounds, b: &Bounds) -> bool {
    a.min.x < b.max.x - CONTACT_SLOP
        && a.max.x > b.min.x + CONTACT_SLOP
        && a.min.y < b.max.y - CONTACT_SLOP
        && a.max.y > b.min.y + CONTACT_SLOP
        && a.min.z < b.max.z - CONTACT_SLOP
        && a.max.z > b.min.z + CONTACT_SLOP
}

fn segment_box_overlaps(a: Vec3, b: Vec3, radius: f32, bounds: &Bounds) -> bool {
    if radius <= CONTACT_SLOP {
        return bounds.contains_strict(a) || bounds.contains_strict(b);
    }
    let reach = radius - CONTACT_SLOP;
    segment_box_distance_squared(a, b, bounds) < reach * reach
}

/// Squared distance between a point and the segment `a..b`.
#[must_use]
pub fn point_segment_distance_squared(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance_squared(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance_squared(a + ab * t)
}

/// Squared distance between segments `p1..q1` and `p2..q2`.
#[must_use]
pub fn segment_segment_distance_squared(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> f32 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    if a <= f32::EPSILON && e <= f32::EPSILON {
        return r.length_squared();
    }

    let (s, t) = if a <= f32::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= f32::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let s = if denom.abs() > f32::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    (p1 + d1 * s).distance_squared(p2 + d2 * t)
}

/// Squared distance between the segment `a..b` and a box.
///
/// Distance to a convex set is convex along a line, so a ternary search over
/// the segment parameter converges to the minimum.
#[must_use]
pub fn segment_box_distance_squared(a: Vec3, b: Vec3, bounds: &Bounds) -> f32 {
    let ab = b - a;
    if ab.length_squared() <= f32::EPSILON {
        return bounds.distance_squared(a);
    }
    let at = |t: f32| bounds.distance_squared(a + ab * t);

    let mut lo = 0.0_f32;
    let mut hi = 1.0_f32;
    for _ in 0..SEGMENT_BOX_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if at(m1) < at(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    at((lo + hi) * 0.5).min(at(0.0)).min(at(1.0))
}
