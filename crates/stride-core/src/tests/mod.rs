//! Cross-module scenario and property tests.
//!
//! - `helpers.rs`: arena setup and event counting
//! - `integration.rs`: end-to-end scenarios through [`crate::simulation::Simulation`]
//! - `properties.rs`: `proptest` properties over resources, weapons and traversal

mod helpers;
mod integration;

pub use helpers::*;
