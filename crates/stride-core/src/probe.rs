//! Geometric queries behind traversal detection.
//!
//! Every query is side-effect free and runs against a [`CollisionWorld`].
//! Mantle detection chains three of them and gives up at the first failure:
//!
//! 1. **Forward probe**: a ray along the look direction, just above the
//!    lowest mantle height, finds the wall face.
//! 2. **Ledge probe**: a ray cast downward from `max_height` above the feet,
//!    slightly past the wall face, finds the top surface. If the obstacle is
//!    taller than `max_height` the ray starts inside it and reports nothing.
//! 3. **Landing clearance**: the standing capsule placed past the ledge must
//!    not overlap anything.

use glam::Vec3;
use sweep::{CollisionChannels, CollisionWorld, Hit, QueryFilter};
use tracing::trace;

use crate::config::MantleConfig;
use crate::motion::{horizontal, Capsule, MovementState};

/// Lift of the forward probe above `min_height`, so a ledge exactly at the
/// minimum height is still struck.
const FORWARD_PROBE_LIFT: f32 = 1.0;
/// Lowest normal Z of a ledge top.
const LEDGE_NORMAL_Z: f32 = 0.7;
/// Distance kept between the anchor capsule and the wall face.
const ANCHOR_GAP: f32 = 1.0;
/// Radius shrink of the headroom sweep, so walls the capsule already
/// touches do not count as a ceiling.
const HEADROOM_SKIN: f32 = 1.0;

/// Everything a mantle needs once detection succeeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgePlan {
    /// Forward probe result on the wall face
    pub wall: Hit,
    /// Ledge surface point
    pub ledge: Vec3,
    /// Capsule centre reached at the end of the reach phase
    pub anchor: Vec3,
    /// Capsule centre reached at the end of the push phase
    pub landing: Vec3,
    /// Horizontal unit direction of travel
    pub direction: Vec3,
}

/// Stateless probe bound to one world and one querying entity.
#[derive(Clone, Copy)]
pub struct EnvironmentProbe<'a> {
    world: &'a dyn CollisionWorld,
    owner: Option<u64>,
}

impl<'a> EnvironmentProbe<'a> {
    /// Probe `world`, ignoring colliders owned by `owner`.
    #[must_use]
    pub fn new(world: &'a dyn CollisionWorld, owner: Option<u64>) -> Self {
        Self { world, owner }
    }

    fn filter(&self, channels: CollisionChannels) -> QueryFilter {
        let filter = QueryFilter::new(channels);
        match self.owner {
            Some(owner) => filter.ignoring_owner(owner),
            None => filter,
        }
    }

    fn geometry(&self) -> QueryFilter {
        self.filter(CollisionChannels::WORLD_STATIC | CollisionChannels::WORLD_DYNAMIC | CollisionChannels::VAULTABLE)
    }

    /// Nearest solid surface straight ahead.
    #[must_use]
    pub fn forward_probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Hit> {
        self.world.raycast(origin, direction, max_distance, &self.geometry())
    }

    /// Top of the obstacle whose face was hit at `surface_hit`.
    ///
    /// Starts `inset` past the face at height `top_z` and looks down by
    /// `search_range`. Only walkable tops count.
    #[must_use]
    pub fn ledge_probe(
        &self,
        surface_hit: Vec3,
        direction: Vec3,
        inset: f32,
        top_z: f32,
        search_range: f32,
    ) -> Option<Hit> {
        let start = horizontal(surface_hit + direction * inset) + Vec3::Z * top_z;
        self.world
            .raycast(start, Vec3::NEG_Z, search_range, &self.geometry())
            .filter(|hit| hit.normal.z >= LEDGE_NORMAL_Z)
    }

    /// Whether a capsule centred at `point` would overlap geometry.
    #[must_use]
    pub fn landing_clearance_blocked(&self, point: Vec3, capsule: &Capsule) -> bool {
        self.world.overlaps_any(&capsule.shape_at(point), &self.geometry())
    }

    /// Whether growing a shrunken capsule back to `standing_half_height`,
    /// feet fixed, would hit a ceiling.
    #[must_use]
    pub fn headroom_blocked(&self, position: Vec3, capsule: &Capsule, standing_half_height: f32) -> bool {
        let growth = standing_half_height - capsule.half_height;
        if growth <= 0.0 {
            return false;
        }
        let top_sphere = position + Vec3::Z * (capsule.half_height - capsule.radius).max(0.0);
        let radius = (capsule.radius - HEADROOM_SKIN).max(0.0);
        self.world
            .sphere_cast(top_sphere, Vec3::Z, growth * 2.0, radius, &self.geometry())
            .is_some()
    }

    /// Run the forward, ledge and landing probes in order.
    #[must_use]
    pub fn find_ledge(&self, movement: &MovementState, direction: Vec3, config: &MantleConfig) -> Option<LedgePlan> {
        let direction = horizontal(direction).try_normalize()?;
        let feet = movement.feet_z();
        let origin = Vec3::new(
            movement.position.x,
            movement.position.y,
            feet + config.min_height + FORWARD_PROBE_LIFT,
        );

        let Some(wall) = self.forward_probe(origin, direction, config.trace_distance) else {
            trace!("mantle: nothing ahead");
            return None;
        };

        let Some(ledge_hit) = self.ledge_probe(
            wall.point,
            direction,
            config.ledge_inset,
            feet + config.max_height,
            config.max_height - config.min_height,
        ) else {
            trace!(wall = ?wall.point, "mantle: no ledge in range");
            return None;
        };
        let ledge = ledge_hit.point;

        let capsule = movement.capsule;
        let landing = ledge + direction * config.landing_offset + Vec3::Z * (capsule.half_height + config.landing_clearance);
        if self.landing_clearance_blocked(landing, &capsule) {
            trace!(?landing, "mantle: landing blocked");
            return None;
        }

        let anchor = horizontal(wall.point - direction * (capsule.radius + ANCHOR_GAP)) + Vec3::Z * (ledge.z + capsule.half_height);

        Some(LedgePlan {
            wall,
            ledge,
            anchor,
            landing,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementConfig;
    use sweep::{Shape, StaticWorld};

    /// Floor at z=0 and a box whose face is at x=150 with the given height.
    fn world_with_obstacle(height: f32) -> StaticWorld {
        let mut world = StaticWorld::new();
        world.insert(
            Shape::box_min_max(Vec3::new(-2000.0, -2000.0, -50.0), Vec3::new(2000.0, 2000.0, 0.0)),
            CollisionChannels::WORLD_STATIC,
            None,
        );
        world.insert(
            Shape::box_min_max(Vec3::new(150.0, -200.0, 0.0), Vec3::new(400.0, 200.0, height)),
            CollisionChannels::VAULTABLE,
            None,
        );
        world
    }

    fn airborne_at(feet: f32) -> MovementState {
        let mut m = MovementState::new(Vec3::new(0.0, 0.0, feet + 96.0), &MovementConfig::default());
        m.mode = crate::motion::MotionMode::Falling;
        m
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn reachable_ledge_produces_plan() {
            let world = world_with_obstacle(120.0);
            let probe = EnvironmentProbe::new(&world, None);
            let plan = probe
                .find_ledge(&airborne_at(20.0), Vec3::X, &MantleConfig::default())
                .unwrap();

            assert!((plan.wall.point.x - 150.0).abs() < 1e-3);
            assert!((plan.ledge.z - 120.0).abs() < 1e-3);
            assert!((plan.anchor.x - (150.0 - 43.0)).abs() < 1e-3);
            assert!((plan.anchor.z - (120.0 + 96.0)).abs() < 1e-3);
            assert!(plan.landing.x > 150.0);
            assert!((plan.landing.z - (120.0 + 96.0 + 2.0)).abs() < 1e-3);
        }

        #[test]
        fn obstacle_taller_than_max_fails_ledge_probe() {
            let world = world_with_obstacle(500.0);
            let probe = EnvironmentProbe::new(&world, None);
            assert!(probe
                .find_ledge(&airborne_at(20.0), Vec3::X, &MantleConfig::default())
                .is_none());
        }

        #[test]
        fn obstacle_lower_than_min_is_not_seen() {
            let world = world_with_obstacle(30.0);
            let probe = EnvironmentProbe::new(&world, None);
            assert!(probe
                .find_ledge(&airborne_at(0.0), Vec3::X, &MantleConfig::default())
                .is_none());
        }

        #[test]
        fn wall_out_of_range_fails_forward_probe() {
            let world = world_with_obstacle(120.0);
            let probe = EnvironmentProbe::new(&world, None);
            let config = MantleConfig {
                trace_distance: 100.0,
                ..MantleConfig::default()
            };
            assert!(probe.find_ledge(&airborne_at(20.0), Vec3::X, &config).is_none());
        }

        #[test]
        fn blocked_landing_fails() {
            let mut world = world_with_obstacle(120.0);
            world.insert(
                Shape::box_min_max(Vec3::new(190.0, -200.0, 120.0), Vec3::new(260.0, 200.0, 400.0)),
                CollisionChannels::WORLD_STATIC,
                None,
            );
            let probe = EnvironmentProbe::new(&world, None);
            assert!(probe
                .find_ledge(&airborne_at(20.0), Vec3::X, &MantleConfig::default())
                .is_none());
        }

        #[test]
        fn zero_direction_fails() {
            let world = world_with_obstacle(120.0);
            let probe = EnvironmentProbe::new(&world, None);
            assert!(probe
                .find_ledge(&airborne_at(20.0), Vec3::Z, &MantleConfig::default())
                .is_none());
        }
    }

    mod headroom_tests {
        use super::*;

        #[test]
        fn open_sky_has_headroom() {
            let world = world_with_obstacle(120.0);
            let probe = EnvironmentProbe::new(&world, None);
            let capsule = Capsule {
                radius: 42.0,
                half_height: 48.0,
            };
            assert!(!probe.headroom_blocked(Vec3::new(-500.0, 0.0, 48.0), &capsule, 96.0));
        }

        #[test]
        fn low_ceiling_blocks() {
            let mut world = world_with_obstacle(120.0);
            world.insert(
                Shape::box_min_max(Vec3::new(-700.0, -200.0, 140.0), Vec3::new(-300.0, 200.0, 200.0)),
                CollisionChannels::WORLD_STATIC,
                None,
            );
            let probe = EnvironmentProbe::new(&world, None);
            let capsule = Capsule {
                radius: 42.0,
                half_height: 48.0,
            };
            assert!(probe.headroom_blocked(Vec3::new(-500.0, 0.0, 48.0), &capsule, 96.0));
        }

        #[test]
        fn wall_beside_capsule_is_not_a_ceiling() {
            let world = world_with_obstacle(120.0);
            let probe = EnvironmentProbe::new(&world, None);
            let capsule = Capsule {
                radius: 42.0,
                half_height: 48.0,
            };
            assert!(!probe.headroom_blocked(Vec3::new(107.5, 0.0, 48.0), &capsule, 96.0));
        }

        #[test]
        fn full_size_capsule_never_blocked() {
            let world = world_with_obstacle(120.0);
            let probe = EnvironmentProbe::new(&world, None);
            let capsule = Capsule {
                radius: 42.0,
                half_height: 96.0,
            };
            assert!(!probe.headroom_blocked(Vec3::new(0.0, 0.0, 96.0), &capsule, 96.0));
        }
    }
}
