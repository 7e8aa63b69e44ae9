//! Ray and swept-sphere casts against single shapes.
//!
//! A swept sphere of radius `r` hits a shape exactly where a ray hits the
//! shape grown by `r`, so every cast here is a ray cast against an inflated
//! primitive. Boxes are inflated as boxes rather than rounded boxes, which
//! makes sweeps report contact slightly early near box edges and corners.
//!
//! Casts starting inside a shape never report that shape.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::shape::{point_segment_distance_squared, Shape};
use crate::Bounds;

const PARALLEL_EPSILON: f32 = 1.0e-6;

/// A ray with a unit direction and a maximum travel distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
    /// Furthest distance a hit may be reported at
    pub max_distance: f32,
}

impl Ray {
    /// Create a ray; returns `None` for a zero direction.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self {
            origin,
            direction,
            max_distance: max_distance.max(0.0),
        })
    }

    /// Ray from `start` to `end`; `None` when the points coincide.
    #[must_use]
    pub fn between(start: Vec3, end: Vec3) -> Option<Self> {
        Self::new(start, end - start, start.distance(end))
    }

    /// Point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Endpoint of the ray.
    #[must_use]
    pub fn end(&self) -> Vec3 {
        self.at(self.max_distance)
    }
}

/// Result of a single-shape cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Distance travelled along the ray before contact
    pub distance: f32,
    /// Contact point on the target surface
    pub point: Vec3,
    /// Surface normal at the contact point
    pub normal: Vec3,
}

/// Cast a sphere of `radius` along `ray` against `shape`.
///
/// A radius of zero is a plain ray cast.
#[must_use]
pub fn cast_sphere(ray: &Ray, radius: f32, shape: &Shape) -> Option<CastHit> {
    let radius = radius.max(0.0);
    match *shape {
        Shape::Box { bounds } => {
            let (t, normal) = ray_aabb(ray, &bounds.expanded(radius))?;
            let center = ray.at(t);
            Some(CastHit {
                distance: t,
                point: bounds.closest_point(center),
                normal,
            })
        }
        Shape::Sphere { center, radius: target } => {
            let (t, normal) = ray_sphere(ray, center, target + radius)?;
            Some(CastHit {
                distance: t,
                point: ray.at(t) - normal * radius,
                normal,
            })
        }
        Shape::Capsule { p0, p1, radius: target } => {
            let (t, normal) = ray_capsule(ray, p0, p1, target + radius)?;
            Some(CastHit {
                distance: t,
                point: ray.at(t) - normal * radius,
                normal,
            })
        }
    }
}

/// Slab test. Returns the entry distance and the entry face normal.
#[must_use]
pub fn ray_aabb(ray: &Ray, bounds: &Bounds) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];
        let (min, max) = (bounds.min[axis], bounds.max[axis]);

        if dir.abs() < PARALLEL_EPSILON {
            if origin < min || origin > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / dir;
        let t1 = (min - origin) * inv;
        let t2 = (max - origin) * inv;
        let (near, far, sign) = if t1 < t2 { (t1, t2, -1.0) } else { (t2, t1, 1.0) };

        if near > t_enter {
            t_enter = near;
            let mut n = Vec3::ZERO;
            n[axis] = sign;
            normal = n;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 || t_enter > ray.max_distance {
        return None;
    }
    Some((t_enter, normal))
}

/// Ray against a sphere.
#[must_use]
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let m = ray.origin - center;
    let b = m.dot(ray.direction);
    let c = m.length_squared() - radius * radius;

    if c < 0.0 {
        return None;
    }
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()).max(0.0);
    if t > ray.max_distance {
        return None;
    }
    let normal = (ray.at(t) - center).normalize_or_zero();
    Some((t, normal))
}

/// Ray against a capsule: the nearer of the body cylinder and the two caps.
#[must_use]
pub fn ray_capsule(ray: &Ray, p0: Vec3, p1: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    if point_segment_distance_squared(ray.origin, p0, p1) < radius * radius {
        return None;
    }

    let mut best: Option<(f32, Vec3)> = None;
    let mut consider = |candidate: Option<(f32, Vec3)>| {
        if let Some((t, n)) = candidate {
            if best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, n));
            }
        }
    };

    consider(ray_cylinder_body(ray, p0, p1, radius));
    consider(ray_sphere(ray, p0, radius));
    consider(ray_sphere(ray, p1, radius));
    best
}

fn ray_cylinder_body(ray: &Ray, p0: Vec3, p1: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let ba = p1 - p0;
    let oa = ray.origin - p0;
    let baba = ba.length_squared();
    if baba <= PARALLEL_EPSILON {
        return None;
    }
    let bard = ba.dot(ray.direction);
    let baoa = ba.dot(oa);
    let rdoa = ray.direction.dot(oa);
    let oaoa = oa.length_squared();

    let a = baba - bard * bard;
    if a.abs() <= PARALLEL_EPSILON * baba {
        return None;
    }
    let b = baba * rdoa - baoa * bard;
    let c = baba * oaoa - baoa * baoa - radius * radius * baba;
    let h = b * b - a * c;
    if h < 0.0 {
        return None;
    }
    let t = (-b - h.sqrt()) / a;
    let y = baoa + t * bard;
    if t < 0.0 || t > ray.max_distance || y <= 0.0 || y >= baba {
        return None;
    }
    let point = ray.at(t);
    let axis_point = p0 + ba * (y / baba);
    Some((t, (point - axis_point).normalize_or_zero()))
}
