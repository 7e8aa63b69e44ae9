//! # Stride Core
//!
//! Per-character action and combat core for a third-person action game.
//!
//! This crate governs short, mutually exclusive movement abilities (dash,
//! slide, mantle) and melee combat resolution (attack cooldowns, combo
//! windows, weapon aggression, per-swing hit deduplication, damage and
//! death), all gated by a clamped resource model.
//!
//! ## Architecture
//!
//! - **Resources**: [`resources::ResourceStore`] holds clamped health, power and charges
//! - **Probes**: [`probe::EnvironmentProbe`] finds ledges with chained casts
//! - **Traversal**: [`traversal::TraversalController`] runs dash, slide and mantle
//! - **Combat**: [`combat::CombatController`], [`combat::WeaponHitRegistrar`] and
//!   [`combat::DamagePipeline`]
//! - **Host**: [`simulation::Simulation`] owns characters and steps them
//!
//! Collision queries come from the `sweep` crate through its
//! `CollisionWorld` trait. Animation playback and projectile spawning are
//! reached through the traits in [`services`]. Everything the rest of the
//! game needs to know is published as [`events::CoreEvent`]s.
//!
//! ## Usage
//!
//! ```
//! use glam::Vec3;
//! use stride_core::combat::DamageRequest;
//! use stride_core::config::CharacterConfig;
//! use stride_core::entity::EntityKind;
//! use stride_core::events::CoreEvent;
//! use stride_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new();
//! sim.add_floor(0.0);
//! let enemy = sim
//!     .spawn_character(EntityKind::Enemy, Vec3::new(0.0, 0.0, 96.0), &CharacterConfig::default())
//!     .unwrap();
//!
//! sim.apply_damage(&DamageRequest::new(enemy, 150.0));
//! assert!(sim.take_events().contains(&CoreEvent::Died { entity: enemy }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use sweep;

pub mod combat;
pub mod config;
pub mod entity;
pub mod events;
pub mod motion;
pub mod probe;
pub mod resources;
pub mod scheduler;
pub mod services;
pub mod simulation;
pub mod traversal;

#[cfg(test)]
mod tests;
