//! Collider storage and the query interface consumed by character code.
//!
//! # Architecture
//!
//! [`CollisionWorld`] is the seam: traversal probes and melee sweeps only ever
//! talk to the trait. [`StaticWorld`] is the in-memory implementation used by
//! headless simulation and tests. It keeps colliders in a `BTreeMap` so every
//! query visits them in id order and ties resolve the same way on every run.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cast::{cast_sphere, Ray};
use crate::channel::{CollisionChannels, QueryFilter};
use crate::shape::Shape;

/// Unique identifier for a collider within one world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

impl ColliderId {
    /// Create a new collider id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collider({})", self.0)
    }
}

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A shape placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Identifier assigned on insertion
    pub id: ColliderId,
    /// World-space shape
    pub shape: Shape,
    /// Channels this collider lives on
    pub channels: CollisionChannels,
    /// Owning entity, if any
    pub owner: Option<u64>,
    /// Disabled colliders are invisible to every query
    pub enabled: bool,
}

/// Nearest-contact result of a cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Collider that was hit
    pub collider: ColliderId,
    /// Owner tag of that collider
    pub owner: Option<u64>,
    /// Contact point on the collider surface
    pub point: Vec3,
    /// Surface normal at the contact
    pub normal: Vec3,
    /// Distance travelled before contact
    pub distance: f32,
}

/// A collider found intersecting a query shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// Collider that overlaps
    pub collider: ColliderId,
    /// Owner tag of that collider
    pub owner: Option<u64>,
}

/// World-query service.
pub trait CollisionWorld {
    /// Sweep a sphere from `start` along `direction` for up to `distance`.
    ///
    /// Returns the nearest accepted hit. A zero direction never hits.
    fn sphere_cast(
        &self,
        start: Vec3,
        direction: Vec3,
        distance: f32,
        radius: f32,
        filter: &QueryFilter,
    ) -> Option<Hit>;

    /// Every accepted collider along a sphere sweep, nearest first, one hit
    /// per collider.
    fn sphere_cast_all(
        &self,
        start: Vec3,
        direction: Vec3,
        distance: f32,
        radius: f32,
        filter: &QueryFilter,
    ) -> Vec<Hit>;

    /// Colliders intersecting `shape`.
    fn overlap(&self, shape: &Shape, filter: &QueryFilter) -> Vec<Overlap>;

    /// Line trace.
    fn raycast(&self, start: Vec3, direction: Vec3, distance: f32, filter: &QueryFilter) -> Option<Hit> {
        self.sphere_cast(start, direction, distance, 0.0, filter)
    }

    /// Whether anything accepted by `filter` intersects `shape`.
    fn overlaps_any(&self, shape: &Shape, filter: &QueryFilter) -> bool {
        !self.overlap(shape, filter).is_empty()
    }
}

/// In-memory collider set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticWorld {
    colliders: BTreeMap<ColliderId, Collider>,
    next_id: u32,
}

impl StaticWorld {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider and return its id.
    pub fn insert(&mut self, shape: Shape, channels: CollisionChannels, owner: Option<u64>) -> ColliderId {
        let id = ColliderId::new(self.next_id);
        self.next_id += 1;
        self.colliders.insert(
            id,
            Collider {
                id,
                shape,
                channels,
                owner,
                enabled: true,
            },
        );
        trace!(collider = %id, ?channels, ?owner, "collider inserted");
        id
    }

    /// Remove a collider. Returns it if it existed.
    pub fn remove(&mut self, id: ColliderId) -> Option<Collider> {
        self.colliders.remove(&id)
    }

    /// Replace the shape of an existing collider. Returns false if unknown.
    pub fn set_shape(&mut self, id: ColliderId, shape: Shape) -> bool {
        match self.colliders.get_mut(&id) {
            Some(collider) => {
                collider.shape = shape;
                true
            }
            None => false,
        }
    }

    /// Enable or disable a collider. Returns false if unknown.
    pub fn set_enabled(&mut self, id: ColliderId, enabled: bool) -> bool {
        match self.colliders.get_mut(&id) {
            Some(collider) => {
                collider.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Look up a collider.
    #[must_use]
    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Number of colliders, enabled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the world holds no colliders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Iterate colliders in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.values()
    }

    fn candidates<'a>(&'a self, filter: &'a QueryFilter) -> impl Iterator<Item = &'a Collider> + 'a {
        self.colliders
            .values()
            .filter(move |c| c.enabled && filter.accepts(c.id, c.channels, c.owner))
    }

    fn cast_hits(&self, ray: &Ray, radius: f32, filter: &QueryFilter) -> Vec<Hit> {
        self.candidates(filter)
            .filter_map(|collider| {
                cast_sphere(ray, radius, &collider.shape).map(|hit| Hit {
                    collider: collider.id,
                    owner: collider.owner,
                    point: hit.point,
                    normal: hit.normal,
                    distance: hit.distance,
                })
            })
            .collect()
    }
}

impl CollisionWorld for StaticWorld {
    fn sphere_cast(
        &self,
        start: Vec3,
        direction: Vec3,
        distance: f32,
        radius: f32,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        let ray = Ray::new(start, direction, distance)?;
        self.cast_hits(&ray, radius, filter)
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn sphere_cast_all(
        &self,
        start: Vec3,
        direction: Vec3,
        distance: f32,
        radius: f32,
        filter: &QueryFilter,
    ) -> Vec<Hit> {
        let Some(ray) = Ray::new(start, direction, distance) else {
            return Vec::new();
        };
        let mut hits = self.cast_hits(&ray, radius, filter);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.collider.cmp(&b.collider)));
        hits
    }

    fn overlap(&self, shape: &Shape, filter: &QueryFilter) -> Vec<Overlap> {
        self.candidates(filter)
            .filter(|c| c.shape.intersects(shape))
            .map(|c| Overlap {
                collider: c.id,
                owner: c.owner,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;

    fn wall_world() -> (StaticWorld, ColliderId) {
        let mut world = StaticWorld::new();
        let wall = world.insert(
            Shape::box_min_max(Vec3::new(100.0, -100.0, 0.0), Vec3::new(150.0, 100.0, 120.0)),
            CollisionChannels::WORLD_STATIC | CollisionChannels::VAULTABLE,
            None,
        );
        (world, wall)
    }

    mod storage_tests {
        use super::*;

        #[test]
        fn ids_are_sequential() {
            let mut world = StaticWorld::new();
            let a = world.insert(Shape::sphere(Vec3::ZERO, 1.0), CollisionChannels::PAWN, Some(1));
            let b = world.insert(Shape::sphere(Vec3::ZERO, 1.0), CollisionChannels::PAWN, Some(2));
            assert_eq!(a.as_u32(), 0);
            assert_eq!(b.as_u32(), 1);
            assert_eq!(world.len(), 2);
        }

        #[test]
        fn remove_and_update_unknown_ids() {
            let (mut world, wall) = wall_world();
            assert!(world.set_enabled(wall, false));
            assert!(!world.get(wall).unwrap().enabled);
            assert!(world.remove(wall).is_some());
            assert!(world.is_empty());
            assert!(!world.set_shape(wall, Shape::sphere(Vec3::ZERO, 1.0)));
        }

        #[test]
        fn debug_format() {
            assert_eq!(format!("{:?}", ColliderId::new(9)), "Collider(9)");
        }
    }

    mod cast_tests {
        use super::*;

        #[test]
        fn raycast_hits_wall() {
            let (world, wall) = wall_world();
            let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC);
            let hit = world.raycast(Vec3::new(0.0, 0.0, 50.0), Vec3::X, 200.0, &filter).unwrap();
            assert_eq!(hit.collider, wall);
            assert!((hit.distance - 100.0).abs() < 1e-3);
            assert_eq!(hit.normal, Vec3::NEG_X);
        }

        #[test]
        fn disabled_collider_is_invisible() {
            let (mut world, wall) = wall_world();
            world.set_enabled(wall, false);
            let filter = QueryFilter::new(CollisionChannels::all());
            assert!(world.raycast(Vec3::new(0.0, 0.0, 50.0), Vec3::X, 200.0, &filter).is_none());
        }

        #[test]
        fn channel_mask_filters_hits() {
            let (world, _) = wall_world();
            let filter = QueryFilter::new(CollisionChannels::PAWN);
            assert!(world.raycast(Vec3::new(0.0, 0.0, 50.0), Vec3::X, 200.0, &filter).is_none());
        }

        #[test]
        fn nearest_hit_wins() {
            let (mut world, _) = wall_world();
            let near = world.insert(
                Shape::sphere(Vec3::new(50.0, 0.0, 50.0), 10.0),
                CollisionChannels::WORLD_STATIC,
                None,
            );
            let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC);
            let hit = world.raycast(Vec3::new(0.0, 0.0, 50.0), Vec3::X, 500.0, &filter).unwrap();
            assert_eq!(hit.collider, near);
        }

        #[test]
        fn cast_all_sorted_and_owner_filtered() {
            let mut world = StaticWorld::new();
            let far = world.insert(Shape::sphere(Vec3::new(90.0, 0.0, 0.0), 20.0), CollisionChannels::PAWN, Some(2));
            let near = world.insert(Shape::sphere(Vec3::new(40.0, 0.0, 0.0), 20.0), CollisionChannels::PAWN, Some(3));
            world.insert(Shape::sphere(Vec3::new(60.0, 0.0, 0.0), 20.0), CollisionChannels::PAWN, Some(1));

            let filter = QueryFilter::new(CollisionChannels::PAWN).ignoring_owner(1);
            let hits = world.sphere_cast_all(Vec3::ZERO, Vec3::X, 100.0, 10.0, &filter);
            let ids: Vec<_> = hits.iter().map(|h| h.collider).collect();
            assert_eq!(ids, vec![near, far]);
        }

        #[test]
        fn zero_direction_never_hits() {
            let (world, _) = wall_world();
            let filter = QueryFilter::new(CollisionChannels::all());
            assert!(world.raycast(Vec3::ZERO, Vec3::ZERO, 100.0, &filter).is_none());
            assert!(world.sphere_cast_all(Vec3::ZERO, Vec3::ZERO, 100.0, 5.0, &filter).is_empty());
        }
    }

    mod overlap_tests {
        use super::*;

        #[test]
        fn capsule_overlaps_wall() {
            let (world, wall) = wall_world();
            let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC);
            let inside = Shape::upright_capsule(Vec3::new(120.0, 0.0, 96.0), 42.0, 96.0);
            let clear = Shape::upright_capsule(Vec3::new(120.0, 0.0, 230.0), 42.0, 96.0);
            let found = world.overlap(&inside, &filter);
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].collider, wall);
            assert!(!world.overlaps_any(&clear, &filter));
        }

        #[test]
        fn overlap_respects_ignored_collider() {
            let (world, wall) = wall_world();
            let filter = QueryFilter::new(CollisionChannels::WORLD_STATIC).ignoring_collider(wall);
            let probe = Shape::aabb(Bounds::from_center_half_extents(Vec3::new(120.0, 0.0, 60.0), Vec3::ONE));
            assert!(!world.overlaps_any(&probe, &filter));
        }
    }
}
