//! Test helper functions for setting up simulations and characters.

use glam::Vec3;
use sweep::Shape;

use crate::config::{CharacterConfig, WeaponConfig};
use crate::entity::{CharacterInput, EntityCategories, EntityId, EntityKind};
use crate::events::CoreEvent;
use crate::motion::MotionMode;
use crate::services::ClipId;
use crate::simulation::Simulation;

/// Fixed tick used by every scenario.
pub const DT: f32 = 1.0 / 60.0;

/// One-second swing clip.
pub const SWING: ClipId = ClipId::new(1);

/// Cast clip lasting 0.8 s.
pub const CAST: ClipId = ClipId::new(2);

/// Capsule centre height of a default character standing on the floor.
pub const STAND_Z: f32 = 96.0;

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Character config with the test clips wired in.
pub fn fighter_config() -> CharacterConfig {
    let mut config = CharacterConfig::default();
    config.combat.attack_clip = Some(SWING);
    config.power.cast_clip = Some(CAST);
    config
}

/// Weapon that never hits players.
pub fn sword() -> WeaponConfig {
    WeaponConfig {
        ignore_categories: EntityCategories::PLAYER,
        ..WeaponConfig::default()
    }
}

/// Simulation with a floor at z = 0 and the test clips registered.
pub fn arena() -> Simulation {
    init_tracing();
    let mut sim = Simulation::new();
    sim.add_floor(0.0);
    sim.register_clip(SWING, 1.0);
    sim.register_clip(CAST, 0.8);
    sim
}

/// Spawn a standing character at `(x, y)`.
pub fn spawn(sim: &mut Simulation, kind: EntityKind, x: f32, y: f32) -> EntityId {
    sim.spawn_character(kind, Vec3::new(x, y, STAND_Z), &fighter_config())
        .expect("default config is valid")
}

/// Vaultable block spanning `x_min..x_min + 250` with its top at `height`.
pub fn add_block(sim: &mut Simulation, x_min: f32, height: f32) {
    sim.add_obstacle(
        Shape::box_min_max(Vec3::new(x_min, -200.0, 0.0), Vec3::new(x_min + 250.0, 200.0, height)),
        true,
    );
}

/// Put `id` in the air with its feet at `feet`, moving along +X at `speed`
/// and pushing toward +X.
pub fn launch_toward_x(sim: &mut Simulation, id: EntityId, feet: f32, speed: f32) {
    let character = sim.character_mut(id).expect("character exists");
    let movement = character.movement_mut();
    movement.position = Vec3::new(0.0, 0.0, feet + STAND_Z);
    movement.velocity = Vec3::new(speed, 0.0, 0.0);
    movement.mode = MotionMode::Falling;
    character.set_input(CharacterInput {
        move_direction: Vec3::X,
        look_direction: Vec3::X,
    });
}

/// Step `ticks` times.
pub fn run(sim: &mut Simulation, ticks: usize) {
    for _ in 0..ticks {
        sim.step(DT);
    }
}

/// Number of events matching `predicate`.
pub fn count(events: &[CoreEvent], predicate: impl Fn(&CoreEvent) -> bool) -> usize {
    events.iter().filter(|e| predicate(e)).count()
}
