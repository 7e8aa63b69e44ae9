//! Per-character motion record and a reference integrator.
//!
//! Controllers never simulate physics. They issue intents by writing to a
//! [`MovementState`]: launch velocities, motion-mode overrides, gravity and
//! friction overrides, capsule resizes, or a directly interpolated position
//! while mantling. Whatever integrator the host uses then moves the capsule.
//!
//! [`KinematicIntegrator`] is the integrator used for headless runs. It is
//! intentionally small: input acceleration with friction steering, braking,
//! gravity, capsule sweeps that stop at walls, and ground snapping.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sweep::{CollisionChannels, CollisionWorld, Hit, QueryFilter, Shape};

use crate::config::MovementConfig;

/// Gap kept between the capsule and whatever it rests on.
const SKIN: f32 = 1.0;
/// Distance kept from walls after a blocked sweep.
const WALL_GAP: f32 = 0.1;

/// How the integrator treats a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// On the ground, friction and braking apply
    Walking,
    /// Airborne under gravity
    Falling,
    /// Frictionless and gravity-free; position is driven externally
    Flying,
    /// No movement at all
    Disabled,
}

/// Collision capsule dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Radius
    pub radius: f32,
    /// Half height including the hemispheres
    pub half_height: f32,
}

impl Capsule {
    /// Upright capsule shape centred at `center`.
    #[must_use]
    pub fn shape_at(&self, center: Vec3) -> Shape {
        Shape::upright_capsule(center, self.radius, self.half_height)
    }
}

/// Motion record of one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    /// Capsule centre
    pub position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Horizontal unit facing
    pub facing: Vec3,
    /// Integrator mode
    pub mode: MotionMode,
    /// Gravity multiplier
    pub gravity_scale: f32,
    /// Ground friction coefficient
    pub ground_friction: f32,
    /// Deceleration with no input
    pub braking_deceleration: f32,
    /// Top walking speed
    pub max_walk_speed: f32,
    /// Input acceleration
    pub max_acceleration: f32,
    /// Air control fraction
    pub air_control: f32,
    /// Collision capsule
    pub capsule: Capsule,
    /// Whether vaultable obstacles block this character
    pub collides_with_vaultable: bool,
}

impl MovementState {
    /// Standing state at `position` facing +X.
    #[must_use]
    pub fn new(position: Vec3, config: &MovementConfig) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            facing: Vec3::X,
            mode: MotionMode::Walking,
            gravity_scale: 1.0,
            ground_friction: config.ground_friction,
            braking_deceleration: config.braking_deceleration,
            max_walk_speed: config.max_walk_speed,
            max_acceleration: config.max_acceleration,
            air_control: config.air_control,
            capsule: Capsule {
                radius: config.capsule_radius,
                half_height: config.capsule_half_height,
            },
            collides_with_vaultable: true,
        }
    }

    /// Replace the velocity outright.
    ///
    /// An upward launch while walking leaves the ground.
    pub fn launch(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        if self.mode == MotionMode::Walking && velocity.z > 0.0 {
            self.mode = MotionMode::Falling;
        }
    }

    /// Velocity with the vertical component removed.
    #[must_use]
    pub fn horizontal_velocity(&self) -> Vec3 {
        Vec3::new(self.velocity.x, self.velocity.y, 0.0)
    }

    /// Horizontal speed.
    #[must_use]
    pub fn horizontal_speed(&self) -> f32 {
        self.horizontal_velocity().length()
    }

    /// Whether the character stands on the ground.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.mode == MotionMode::Walking
    }

    /// Whether the character is in the air under gravity.
    #[must_use]
    pub fn is_airborne(&self) -> bool {
        self.mode == MotionMode::Falling
    }

    /// Height of the capsule bottom.
    #[must_use]
    pub fn feet_z(&self) -> f32 {
        self.position.z - self.capsule.half_height
    }

    /// Horizontal unit facing, +X if degenerate.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        horizontal(self.facing).try_normalize().unwrap_or(Vec3::X)
    }

    /// Current capsule in world space.
    #[must_use]
    pub fn capsule_shape(&self) -> Shape {
        self.capsule.shape_at(self.position)
    }

    /// Channels that block this character's movement.
    #[must_use]
    pub fn blocking_channels(&self) -> CollisionChannels {
        let mut channels = CollisionChannels::WORLD_STATIC | CollisionChannels::WORLD_DYNAMIC;
        if self.collides_with_vaultable {
            channels |= CollisionChannels::VAULTABLE;
        }
        channels
    }
}

/// Flatten a vector onto the ground plane.
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// Move `current` toward `target` by a fraction `dt * speed` of the gap.
///
/// Snaps onto the target once the gap is negligible.
#[must_use]
pub fn interp_to(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }
    let delta = target - current;
    if delta.length_squared() < 1.0e-8 {
        return target;
    }
    current + delta * (dt * speed).clamp(0.0, 1.0)
}

/// Reference motion integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicIntegrator {
    /// Downward acceleration before gravity scale
    pub gravity: f32,
    /// How far a walking character is pulled down to stay on the ground
    pub max_step_down: f32,
    /// Lowest normal Z a surface may have to be stood on
    pub walkable_normal_z: f32,
}

impl Default for KinematicIntegrator {
    fn default() -> Self {
        Self::new(980.0)
    }
}

impl KinematicIntegrator {
    /// Integrator with the given gravity.
    #[must_use]
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            max_step_down: 10.0,
            walkable_normal_z: 0.7,
        }
    }

    /// Advance one character by `dt` with a horizontal `input` of length <= 1.
    pub fn step(&self, state: &mut MovementState, input: Vec3, dt: f32, world: &dyn CollisionWorld) {
        if dt <= 0.0 {
            return;
        }
        let input = horizontal(input).clamp_length_max(1.0);

        match state.mode {
            MotionMode::Disabled => {
                state.velocity = Vec3::ZERO;
            }
            MotionMode::Flying => {
                state.position += state.velocity * dt;
            }
            MotionMode::Walking => self.walk(state, input, dt, world),
            MotionMode::Falling => self.fall(state, input, dt, world),
        }
    }

    fn walk(&self, state: &mut MovementState, input: Vec3, dt: f32, world: &dyn CollisionWorld) {
        let mut v = state.horizontal_velocity();
        let old_speed = v.length();

        if let Some(dir) = input.try_normalize() {
            state.facing = dir;
            v -= (v - dir * old_speed) * (dt * state.ground_friction).min(1.0);
            v += dir * state.max_acceleration * input.length() * dt;
            let limit = state
                .max_walk_speed
                .max(old_speed - state.braking_deceleration * dt);
            v = v.clamp_length_max(limit);
        } else {
            let speed = (old_speed - (state.ground_friction * old_speed + state.braking_deceleration) * dt).max(0.0);
            v = v.normalize_or_zero() * speed;
        }

        state.velocity = v;
        move_horizontal(state, v * dt, world);

        match self.floor_below(state, SKIN + self.max_step_down, world) {
            Some(floor) => {
                state.position.z = floor.point.z + state.capsule.half_height;
                state.velocity.z = 0.0;
            }
            None => state.mode = MotionMode::Falling,
        }
    }

    fn fall(&self, state: &mut MovementState, input: Vec3, dt: f32, world: &dyn CollisionWorld) {
        let mut v = state.horizontal_velocity();
        let old_speed = v.length();
        if let Some(dir) = input.try_normalize() {
            state.facing = dir;
            v += dir * state.max_acceleration * state.air_control * input.length() * dt;
            v = v.clamp_length_max(state.max_walk_speed.max(old_speed));
        }
        let vz = state.velocity.z - self.gravity * state.gravity_scale * dt;
        state.velocity = Vec3::new(v.x, v.y, vz);

        move_horizontal(state, v * dt, world);

        let dz = state.velocity.z * dt;
        if state.velocity.z <= 0.0 {
            if let Some(floor) = self.floor_below(state, SKIN - dz, world) {
                state.position.z = floor.point.z + state.capsule.half_height;
                state.velocity.z = 0.0;
                state.mode = MotionMode::Walking;
                return;
            }
        }
        state.position.z += dz;
    }

    fn floor_below(&self, state: &MovementState, distance: f32, world: &dyn CollisionWorld) -> Option<Hit> {
        let radius = (state.capsule.radius - SKIN).max(0.0);
        let bottom = state.position - Vec3::Z * (state.capsule.half_height - state.capsule.radius);
        let filter = QueryFilter::new(state.blocking_channels());
        world
            .sphere_cast(bottom, Vec3::NEG_Z, distance, radius, &filter)
            .filter(|hit| hit.normal.z >= self.walkable_normal_z)
    }
}

/// Sweep the capsule horizontally by `delta`, stopping at the first wall and
/// dropping the velocity component into it.
fn move_horizontal(state: &mut MovementState, delta: Vec3, world: &dyn CollisionWorld) {
    let length = delta.length();
    if length < 1.0e-6 {
        return;
    }
    let dir = delta / length;
    let segment = (state.capsule.half_height - state.capsule.radius).max(0.0);
    let filter = QueryFilter::new(state.blocking_channels());

    let nearest = [
        state.position - Vec3::Z * segment,
        state.position,
        state.position + Vec3::Z * segment,
    ]
    .into_iter()
    .filter_map(|origin| world.sphere_cast(origin, dir, length, state.capsule.radius, &filter))
    .min_by(|a, b| a.distance.total_cmp(&b.distance));

    match nearest {
        Some(hit) => {
            state.position += dir * (hit.distance - WALL_GAP).max(0.0);
            if let Some(normal) = horizontal(hit.normal).try_normalize() {
                let into = state.velocity.dot(normal);
                if into < 0.0 {
                    state.velocity -= normal * into;
                }
            }
        }
        None => state.position += delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep::StaticWorld;

    const DT: f32 = 1.0 / 60.0;

    fn floor_world() -> StaticWorld {
        let mut world = StaticWorld::new();
        world.insert(
            Shape::box_min_max(Vec3::new(-5000.0, -5000.0, -100.0), Vec3::new(5000.0, 5000.0, 0.0)),
            CollisionChannels::WORLD_STATIC,
            None,
        );
        world
    }

    fn standing() -> MovementState {
        MovementState::new(Vec3::new(0.0, 0.0, 96.0), &MovementConfig::default())
    }

    mod state_tests {
        use super::*;

        #[test]
        fn upward_launch_leaves_ground() {
            let mut s = standing();
            s.launch(Vec3::new(0.0, 0.0, 800.0));
            assert!(s.is_airborne());
        }

        #[test]
        fn horizontal_launch_keeps_mode() {
            let mut s = standing();
            s.launch(Vec3::new(4000.0, 0.0, 0.0));
            assert!(s.is_grounded());
            assert_eq!(s.horizontal_speed(), 4000.0);
        }

        #[test]
        fn vaultable_collision_toggles_channel() {
            let mut s = standing();
            assert!(s.blocking_channels().contains(CollisionChannels::VAULTABLE));
            s.collides_with_vaultable = false;
            assert!(!s.blocking_channels().contains(CollisionChannels::VAULTABLE));
        }

        #[test]
        fn feet_height() {
            assert_eq!(standing().feet_z(), 0.0);
        }

        #[test]
        fn interp_to_converges() {
            let mut p = Vec3::ZERO;
            let target = Vec3::new(100.0, 0.0, 0.0);
            for _ in 0..200 {
                p = interp_to(p, target, DT, 12.0);
            }
            assert!(p.distance(target) < 0.01);
        }
    }

    mod integrator_tests {
        use super::*;

        #[test]
        fn standing_character_stays_put() {
            let world = floor_world();
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            for _ in 0..30 {
                integrator.step(&mut s, Vec3::ZERO, DT, &world);
            }
            assert!(s.is_grounded());
            assert!((s.position.z - 96.0).abs() < 1e-3);
        }

        #[test]
        fn falling_character_lands() {
            let world = floor_world();
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            s.position.z = 400.0;
            s.mode = MotionMode::Falling;
            for _ in 0..120 {
                integrator.step(&mut s, Vec3::ZERO, DT, &world);
            }
            assert!(s.is_grounded());
            assert!((s.position.z - 96.0).abs() < 1e-3);
            assert_eq!(s.velocity.z, 0.0);
        }

        #[test]
        fn walking_off_edge_starts_falling() {
            let mut world = StaticWorld::new();
            world.insert(
                Shape::box_min_max(Vec3::new(-500.0, -500.0, -100.0), Vec3::new(10.0, 500.0, 0.0)),
                CollisionChannels::WORLD_STATIC,
                None,
            );
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            s.velocity = Vec3::new(1000.0, 0.0, 0.0);
            for _ in 0..20 {
                integrator.step(&mut s, Vec3::X, DT, &world);
            }
            assert!(s.is_airborne());
        }

        #[test]
        fn wall_blocks_movement() {
            let mut world = floor_world();
            world.insert(
                Shape::box_min_max(Vec3::new(100.0, -500.0, 0.0), Vec3::new(150.0, 500.0, 300.0)),
                CollisionChannels::WORLD_STATIC,
                None,
            );
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            for _ in 0..60 {
                integrator.step(&mut s, Vec3::X, DT, &world);
            }
            assert!(s.position.x < 58.0);
            assert!(s.position.x > 50.0);
            assert!(s.velocity.x.abs() < 1e-3);
        }

        #[test]
        fn braking_stops_character() {
            let world = floor_world();
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            s.velocity = Vec3::new(600.0, 0.0, 0.0);
            for _ in 0..60 {
                integrator.step(&mut s, Vec3::ZERO, DT, &world);
            }
            assert_eq!(s.horizontal_speed(), 0.0);
        }

        #[test]
        fn walk_speed_capped() {
            let world = floor_world();
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            for _ in 0..240 {
                integrator.step(&mut s, Vec3::X, DT, &world);
            }
            assert!(s.horizontal_speed() <= s.max_walk_speed + 1e-3);
            assert!(s.horizontal_speed() > 900.0);
        }

        #[test]
        fn flying_ignores_gravity() {
            let world = floor_world();
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            s.position.z = 500.0;
            s.mode = MotionMode::Flying;
            integrator.step(&mut s, Vec3::ZERO, DT, &world);
            assert_eq!(s.position.z, 500.0);
        }

        #[test]
        fn disabled_does_not_move() {
            let world = floor_world();
            let integrator = KinematicIntegrator::default();
            let mut s = standing();
            s.mode = MotionMode::Disabled;
            s.velocity = Vec3::new(100.0, 0.0, 0.0);
            integrator.step(&mut s, Vec3::X, DT, &world);
            assert_eq!(s.position, Vec3::new(0.0, 0.0, 96.0));
            assert_eq!(s.velocity, Vec3::ZERO);
        }
    }
}
