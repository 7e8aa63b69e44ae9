//! End-to-end scenarios through the simulation.
//!
//! These tests drive characters only through [`Simulation`] entry points and
//! check the outcome through accessors and the drained event stream.

use glam::Vec3;

use crate::combat::DamageRequest;
use crate::entity::{EntityKind, LifeState};
use crate::events::CoreEvent;
use crate::motion::MotionMode;
use crate::resources::ResourceKind;
use crate::simulation::Simulation;
use crate::traversal::TraversalState;

use super::helpers::{add_block, arena, count, fighter_config, launch_toward_x, run, spawn, sword, DT};

// =============================================================================
// Resources and death
// =============================================================================

#[test]
fn lethal_damage_sequence_dies_once() {
    let mut sim = arena();
    let enemy = spawn(&mut sim, EntityKind::Enemy, 0.0, 0.0);

    assert_eq!(sim.apply_damage(&DamageRequest::new(enemy, 40.0)), 40.0);
    assert_eq!(sim.apply_damage(&DamageRequest::new(enemy, 70.0)), 60.0);
    assert_eq!(sim.apply_damage(&DamageRequest::new(enemy, 5.0)), 0.0);

    let events = sim.take_events();
    assert_eq!(
        events[0],
        CoreEvent::ResourceChanged { entity: enemy, kind: ResourceKind::Health, old: 100.0, new: 60.0 }
    );
    assert!(events.contains(&CoreEvent::ResourceChanged {
        entity: enemy,
        kind: ResourceKind::Health,
        old: 60.0,
        new: 0.0,
    }));
    assert_eq!(count(&events, |e| matches!(e, CoreEvent::Died { .. })), 1);
    assert!(events.contains(&CoreEvent::HealthBarVisibility { entity: enemy, visible: false }));
    assert!(events.contains(&CoreEvent::DespawnRequested { entity: enemy, after: 5.0 }));

    let character = sim.character(enemy).unwrap();
    assert_eq!(character.life(), LifeState::Dead);
    let collider = character.collider().unwrap();
    assert!(!sim.world().get(collider).unwrap().enabled);
}

#[test]
fn dead_player_requests_game_over_and_ignores_input() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    sim.apply_damage(&DamageRequest::new(player, 100.0));

    let events = sim.take_events();
    assert!(events.contains(&CoreEvent::GameOverRequested { entity: player }));

    assert!(!sim.dash(player));
    assert!(!sim.slide(player));
    assert!(!sim.attack(player));
    assert!(!sim.cast_power(player));
    assert!(!sim.use_heal_charge(player));

    run(&mut sim, 30);
    let character = sim.character(player).unwrap();
    assert_eq!(character.movement().mode, MotionMode::Disabled);
    assert_eq!(character.movement().position, Vec3::new(0.0, 0.0, 96.0));
}

#[test]
fn heal_charge_restores_health() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    assert!(!sim.use_heal_charge(player));

    sim.apply_damage(&DamageRequest::new(player, 80.0));
    assert!(sim.use_heal_charge(player));

    let resources = sim.character(player).unwrap().resources();
    assert_eq!(resources.health(), 70.0);
    assert_eq!(resources.charges(), 2);
}

// =============================================================================
// Weapons
// =============================================================================

#[test]
fn repeated_overlap_in_one_swing_hits_once() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    let enemy = spawn(&mut sim, EntityKind::Enemy, 120.0, 0.0);
    let weapon = sim.equip_weapon(player, &sword()).unwrap().unwrap();

    assert!(sim.attack(player));
    sim.step(DT);
    assert_eq!(sim.character(enemy).unwrap().resources().health(), 75.0);

    run(&mut sim, 5);
    sim.character_mut(enemy).unwrap().movement_mut().position.x = 1000.0;
    sim.step(DT);
    sim.character_mut(enemy).unwrap().movement_mut().position.x = 120.0;
    sim.step(DT);

    assert_eq!(sim.character(enemy).unwrap().resources().health(), 75.0);
    let events = sim.take_events();
    assert_eq!(count(&events, |e| matches!(e, CoreEvent::DamageApplied { .. })), 1);
    assert_eq!(
        count(&events, |e| matches!(e, CoreEvent::ItemOverlap { entering: true, .. })),
        2
    );
    assert!(events.contains(&CoreEvent::DamageApplied {
        target: enemy,
        instigator: Some(player),
        causer: Some(weapon),
        amount: 25.0,
    }));
}

#[test]
fn next_swing_hits_again() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    let enemy = spawn(&mut sim, EntityKind::Enemy, 120.0, 0.0);
    sim.equip_weapon(player, &sword()).unwrap();

    assert!(sim.attack(player));
    run(&mut sim, 30);
    assert!(!sim.attack(player));
    run(&mut sim, 40);
    assert!(sim.attack(player));
    sim.step(DT);

    assert_eq!(sim.character(enemy).unwrap().resources().health(), 50.0);
}

#[test]
fn weapon_never_hits_wielder_or_ignored_class() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    let ally = spawn(&mut sim, EntityKind::Player, 120.0, 0.0);
    sim.equip_weapon(player, &sword()).unwrap();

    assert!(sim.attack(player));
    run(&mut sim, 10);
    assert_eq!(sim.character(player).unwrap().resources().health(), 100.0);
    assert_eq!(sim.character(ally).unwrap().resources().health(), 100.0);
}

#[test]
fn blade_cuts_own_wielder_when_allowed() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    let config = crate::config::WeaponConfig {
        ignore_wielder: false,
        ..crate::config::WeaponConfig::default()
    };
    let weapon = sim.equip_weapon(player, &config).unwrap().unwrap();

    assert!(sim.attack(player));
    sim.step(DT);

    assert_eq!(sim.character(player).unwrap().resources().health(), 75.0);
    assert!(sim.take_events().contains(&CoreEvent::DamageApplied {
        target: player,
        instigator: Some(player),
        causer: Some(weapon),
        amount: 25.0,
    }));
}

#[test]
fn unequipped_character_falls_back_to_direct_sweep() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    let enemy = spawn(&mut sim, EntityKind::Enemy, 120.0, 0.0);
    sim.equip_weapon(player, &sword()).unwrap();

    assert!(sim.unequip_weapon(player));
    assert!(!sim.unequip_weapon(player));
    assert!(sim.character(player).unwrap().weapon().is_none());

    assert!(sim.attack(player));
    assert_eq!(sim.character(enemy).unwrap().resources().health(), 80.0);
}

#[test]
fn four_swings_kill_an_enemy() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    let enemy = spawn(&mut sim, EntityKind::Enemy, 120.0, 0.0);
    sim.equip_weapon(player, &sword()).unwrap();

    for _ in 0..4 {
        assert!(sim.attack(player));
        run(&mut sim, 70);
    }

    let events = sim.take_events();
    assert_eq!(count(&events, |e| *e == CoreEvent::Died { entity: enemy }), 1);
    let character = sim.character(enemy).unwrap();
    assert_eq!(character.resources().health(), 0.0);
    assert!(!character.collision_enabled());
}

#[test]
fn unarmed_attack_sweeps_immediately() {
    let mut sim = arena();
    let enemy = spawn(&mut sim, EntityKind::Enemy, 0.0, 0.0);
    let player = spawn(&mut sim, EntityKind::Player, 120.0, 0.0);
    let bystander = spawn(&mut sim, EntityKind::Player, -120.0, 0.0);

    assert!(sim.attack(enemy));
    assert_eq!(sim.character(player).unwrap().resources().health(), 80.0);
    assert_eq!(sim.character(bystander).unwrap().resources().health(), 100.0);
    assert!(sim.take_events().contains(&CoreEvent::DamageApplied {
        target: player,
        instigator: Some(enemy),
        causer: Some(enemy),
        amount: 20.0,
    }));
}

#[test]
fn attack_refused_while_sliding() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    sim.character_mut(player).unwrap().movement_mut().velocity = Vec3::new(800.0, 0.0, 0.0);
    assert!(sim.slide(player));
    assert!(!sim.attack(player));
    assert!(!sim.cast_power(player));
    assert!(!sim.character(player).unwrap().combat().attack_on_cooldown());
}

// =============================================================================
// Power
// =============================================================================

#[test]
fn cast_with_too_little_power_is_noop() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    sim.character_mut(player)
        .unwrap()
        .resources_mut()
        .apply_delta(ResourceKind::Power, -90.0);

    assert!(!sim.cast_power(player));
    let character = sim.character(player).unwrap();
    assert_eq!(character.resources().power(), 10.0);
    assert!(!character.combat().power_on_cooldown());
    assert!(sim.take_events().is_empty());
    assert!(sim.spawner().spawned().is_empty());
}

#[test]
fn cast_spawns_projectile_and_cools_down() {
    let mut sim = arena();
    let mut config = fighter_config();
    config.power.projectile = Some(crate::config::ProjectileConfig::default());
    let player = sim
        .spawn_character(EntityKind::Player, Vec3::new(0.0, 0.0, 96.0), &config)
        .unwrap();

    assert!(sim.cast_power(player));
    assert!(!sim.cast_power(player));
    assert_eq!(sim.spawner().spawned().len(), 1);

    let projectile = sim.spawner().spawned()[0].0;
    let events = sim.take_events();
    assert!(events.contains(&CoreEvent::PowerCast { entity: player, cost: 25.0 }));
    assert!(events.contains(&CoreEvent::ProjectileSpawned { owner: player, projectile }));

    run(&mut sim, 50);
    assert!(sim.cast_power(player));
    assert_eq!(sim.character(player).unwrap().resources().power(), 50.0);
}

// =============================================================================
// Traversal
// =============================================================================

#[test]
fn dash_on_cooldown_applies_no_impulse() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    assert!(sim.dash(player));
    run(&mut sim, 10);

    let before = sim.character(player).unwrap().movement().velocity;
    assert!(!sim.dash(player));
    assert_eq!(sim.character(player).unwrap().movement().velocity, before);
    assert_eq!(
        count(&sim.take_events(), |e| matches!(e, CoreEvent::DashStarted { .. })),
        1
    );
}

#[test]
fn slide_runs_out_and_restores() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    sim.character_mut(player).unwrap().movement_mut().velocity = Vec3::new(800.0, 0.0, 0.0);
    assert!(sim.slide(player));
    assert_eq!(sim.character(player).unwrap().movement().capsule.half_height, 48.0);

    let mut ended = false;
    for _ in 0..300 {
        sim.step(DT);
        if sim.character(player).unwrap().traversal().state() == TraversalState::Grounded {
            ended = true;
            break;
        }
    }
    assert!(ended);

    let movement = sim.character(player).unwrap().movement();
    assert_eq!(movement.ground_friction, 8.0);
    assert_eq!(movement.capsule.half_height, 96.0);
    assert!(movement.position.x > 100.0);
    assert!(sim.take_events().contains(&CoreEvent::SlideEnded { entity: player }));
}

#[test]
fn too_tall_obstacle_never_starts_mantle() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    add_block(&mut sim, 150.0, 500.0);
    launch_toward_x(&mut sim, player, 20.0, 300.0);

    run(&mut sim, 30);
    let character = sim.character(player).unwrap();
    assert_eq!(character.traversal().state(), TraversalState::Grounded);
    assert!(!character.traversal().mantle_on_cooldown());
    assert_eq!(
        count(&sim.take_events(), |e| matches!(e, CoreEvent::MantleStarted { .. })),
        0
    );
}

#[test]
fn mantle_over_block_end_to_end() {
    let mut sim = arena();
    let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
    add_block(&mut sim, 150.0, 120.0);
    launch_toward_x(&mut sim, player, 20.0, 300.0);

    sim.step(DT);
    assert!(sim.character(player).unwrap().traversal().is_mantling());

    let mut finished_at = None;
    for tick in 0..600 {
        sim.step(DT);
        if !sim.character(player).unwrap().traversal().is_mantling() {
            finished_at = Some(tick);
            break;
        }
    }
    assert!(finished_at.is_some());

    let character = sim.character(player).unwrap();
    assert!(character.movement().feet_z() > 115.0);
    assert!(character.movement().position.x > 150.0);
    assert_eq!(character.movement().gravity_scale, 1.0);
    assert!(character.movement().collides_with_vaultable);
    assert!(character.traversal().mantle_on_cooldown());

    let events = sim.take_events();
    assert_eq!(count(&events, |e| matches!(e, CoreEvent::MantleStarted { .. })), 1);
    assert_eq!(count(&events, |e| matches!(e, CoreEvent::MantleEnded { .. })), 1);
}

#[test]
fn deterministic_replay() {
    fn script() -> Vec<CoreEvent> {
        let mut sim: Simulation = arena();
        let player = spawn(&mut sim, EntityKind::Player, 0.0, 0.0);
        let enemy = spawn(&mut sim, EntityKind::Enemy, 120.0, 0.0);
        sim.equip_weapon(player, &sword()).unwrap();
        sim.dash(enemy);
        sim.attack(player);
        run(&mut sim, 90);
        sim.attack(enemy);
        run(&mut sim, 30);
        sim.take_events()
    }
    assert_eq!(script(), script());
}
