//! Frame-stepped host for characters.
//!
//! The `Simulation` owns every character, the collision world, the headless
//! animation and spawn services and the outbound event queue. Each call to
//! [`Simulation::step`] runs one tick in a fixed order:
//!
//! 1. **ANIMATION**: advance playing clips
//! 2. **TIMERS**: count down every controller cooldown
//! 3. **TRAVERSAL**: advance running dash/slide/mantle
//! 4. **DETECTION**: probe for new mantles
//! 5. **COMBAT**: finish swings whose clip ended
//! 6. **INTEGRATION**: move characters
//! 7. **COLLIDERS**: sync capsule colliders with motion and life state
//! 8. **WEAPONS**: collect blade overlaps into damage requests
//! 9. **DAMAGE**: apply the requests
//!
//! Traversal update runs before detection, so a mantle that finishes in a
//! tick cannot restart in the same tick.
//!
//! # Determinism
//!
//! Characters are stored in a `BTreeMap` and visited in id order in every
//! phase.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use stride_core::config::CharacterConfig;
//! use stride_core::entity::EntityKind;
//! use stride_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new();
//! sim.add_floor(0.0);
//! let id = sim
//!     .spawn_character(EntityKind::Player, Vec3::new(0.0, 0.0, 96.0), &CharacterConfig::default())
//!     .unwrap();
//!
//! assert!(sim.dash(id));
//! for _ in 0..10 {
//!     sim.step(1.0 / 60.0);
//! }
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.character(id).unwrap().movement().position.x > 0.0);
//! ```

use std::collections::BTreeMap;

use glam::Vec3;
use sweep::{ColliderId, CollisionChannels, CollisionWorld, QueryFilter, Shape, StaticWorld};
use tracing::{debug, trace, warn};

use crate::combat::{CombatContext, DamagePipeline, DamageRequest, Weapon};
use crate::config::{CharacterConfig, ConfigError, ConfigResult, WeaponConfig};
use crate::entity::{Character, CharacterInput, EntityCategories, EntityId, EntityKind};
use crate::events::{CoreEvent, EventQueue};
use crate::motion::KinematicIntegrator;
use crate::services::{ClipId, ClipLibrary, SpawnRecorder};

// =============================================================================
// Simulation
// =============================================================================

/// Owns characters and collaborators and steps them in a fixed order.
#[derive(Debug)]
pub struct Simulation {
    characters: BTreeMap<EntityId, Character>,
    world: StaticWorld,
    animation: ClipLibrary,
    spawner: SpawnRecorder,
    events: EventQueue,
    integrator: KinematicIntegrator,
    pipeline: DamagePipeline,
    next_id: u64,
    tick: u64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Empty simulation at tick 0 with default gravity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_integrator(KinematicIntegrator::default())
    }

    /// Empty simulation using `integrator` for motion.
    #[must_use]
    pub fn with_integrator(integrator: KinematicIntegrator) -> Self {
        Self {
            characters: BTreeMap::new(),
            world: StaticWorld::new(),
            animation: ClipLibrary::new(),
            spawner: SpawnRecorder::new(),
            events: EventQueue::new(),
            integrator,
            pipeline: DamagePipeline::new(),
            next_id: 1,
            tick: 0,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // =========================================================================
    // World setup
    // =========================================================================

    /// Make `clip` known to the animation service.
    pub fn register_clip(&mut self, clip: ClipId, duration: f32) {
        self.animation.register(clip, duration);
    }

    /// Add static level geometry. Vaultable obstacles live only on the
    /// vaultable channel, so a mantling character passes through them.
    pub fn add_obstacle(&mut self, shape: Shape, vaultable: bool) -> ColliderId {
        let channels = if vaultable {
            CollisionChannels::VAULTABLE
        } else {
            CollisionChannels::WORLD_STATIC
        };
        self.world.insert(shape, channels, None)
    }

    /// Add a large floor slab whose top is at `z`.
    pub fn add_floor(&mut self, z: f32) -> ColliderId {
        self.add_obstacle(
            Shape::box_min_max(Vec3::new(-100_000.0, -100_000.0, z - 100.0), Vec3::new(100_000.0, 100_000.0, z)),
            false,
        )
    }

    /// Spawn a character with its capsule centre at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation or
    /// `kind` is not a character kind.
    pub fn spawn_character(
        &mut self,
        kind: EntityKind,
        position: Vec3,
        config: &CharacterConfig,
    ) -> ConfigResult<EntityId> {
        if !kind.is_character() {
            return Err(ConfigError::Invalid {
                field: "kind",
                reason: format!("{kind} is not a character kind"),
            });
        }
        config.validate()?;

        let id = self.allocate_id();
        let mut character = Character::new(id, kind, position, config);
        let collider = self.world.insert(
            character.movement().capsule_shape(),
            CollisionChannels::PAWN,
            Some(id.as_u64()),
        );
        character.set_collider(collider);
        debug!(entity = %id, %kind, ?position, "character spawned");
        self.characters.insert(id, character);
        Ok(id)
    }

    /// Give `wielder` a new weapon, replacing any weapon it held.
    ///
    /// Returns the weapon id, or `None` for an unknown wielder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation.
    pub fn equip_weapon(&mut self, wielder: EntityId, config: &WeaponConfig) -> ConfigResult<Option<EntityId>> {
        config.validate()?;
        if !self.characters.contains_key(&wielder) {
            return Ok(None);
        }
        let id = self.allocate_id();
        if let Some(character) = self.characters.get_mut(&wielder) {
            character.equip(Weapon::new(id, wielder, config), &mut self.events);
        }
        Ok(Some(id))
    }

    /// Take the weapon away from `wielder`.
    pub fn unequip_weapon(&mut self, wielder: EntityId) -> bool {
        self.characters
            .get_mut(&wielder)
            .and_then(|c| c.unequip(&mut self.events))
            .is_some()
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Set a character's input for the coming ticks.
    pub fn set_input(&mut self, id: EntityId, input: CharacterInput) -> bool {
        let Some(character) = self.characters.get_mut(&id) else {
            return false;
        };
        character.set_input(input);
        true
    }

    /// Dash. `false` when refused or unknown.
    pub fn dash(&mut self, id: EntityId) -> bool {
        self.characters
            .get_mut(&id)
            .is_some_and(|c| c.try_dash(&mut self.events))
    }

    /// Start sliding.
    pub fn slide(&mut self, id: EntityId) -> bool {
        self.characters
            .get_mut(&id)
            .is_some_and(|c| c.try_slide(&mut self.events))
    }

    /// Stop sliding.
    pub fn stop_slide(&mut self, id: EntityId) -> bool {
        self.characters
            .get_mut(&id)
            .is_some_and(|c| c.stop_slide(&mut self.events))
    }

    /// Attack. Hits from a direct sweep are applied immediately.
    pub fn attack(&mut self, id: EntityId) -> bool {
        let Some(character) = self.characters.get_mut(&id) else {
            return false;
        };
        let mut ctx = CombatContext {
            world: &self.world,
            animation: &mut self.animation,
            spawner: &mut self.spawner,
            events: &mut self.events,
        };
        let Some(requests) = character.try_attack(&mut ctx) else {
            return false;
        };
        for request in requests {
            self.apply_damage(&request);
        }
        true
    }

    /// Cast a power.
    pub fn cast_power(&mut self, id: EntityId) -> bool {
        let Some(character) = self.characters.get_mut(&id) else {
            return false;
        };
        let mut ctx = CombatContext {
            world: &self.world,
            animation: &mut self.animation,
            spawner: &mut self.spawner,
            events: &mut self.events,
        };
        character.try_cast_power(&mut ctx)
    }

    /// Spend a heal charge.
    pub fn use_heal_charge(&mut self, id: EntityId) -> bool {
        self.characters
            .get_mut(&id)
            .is_some_and(|c| c.try_use_heal_charge(&mut self.events))
    }

    /// Route a damage request through the pipeline. Returns the health
    /// removed; zero for an unknown target.
    pub fn apply_damage(&mut self, request: &DamageRequest) -> f32 {
        let Some(target) = self.characters.get_mut(&request.target) else {
            trace!(target = %request.target, "damage for unknown target dropped");
            return 0.0;
        };
        let dealt = self.pipeline.apply(request, target, &mut self.events);
        if let Some(collider) = target.collider() {
            self.world.set_enabled(collider, target.collision_enabled());
        }
        dealt
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance every character by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "ignoring invalid time step");
            return;
        }

        self.animation.advance(dt);

        for character in self.characters.values_mut() {
            character.advance_timers(dt, &mut self.events);
        }
        for character in self.characters.values_mut() {
            character.update_traversal(dt, &self.world, &self.animation, &mut self.events);
        }
        for character in self.characters.values_mut() {
            character.detect_traversal(&self.world, &mut self.animation, &mut self.events);
        }
        for character in self.characters.values_mut() {
            character.update_combat(&self.animation, &mut self.events);
        }
        for character in self.characters.values_mut() {
            character.integrate(&self.integrator, dt, &self.world);
        }

        self.sync_colliders();
        let requests = self.collect_weapon_hits();
        for request in &requests {
            self.apply_damage(request);
        }

        self.tick += 1;
    }

    fn sync_colliders(&mut self) {
        for character in self.characters.values() {
            if let Some(collider) = character.collider() {
                self.world.set_shape(collider, character.movement().capsule_shape());
                self.world.set_enabled(collider, character.collision_enabled());
            }
        }
    }

    fn collect_weapon_hits(&mut self) -> Vec<DamageRequest> {
        let categories: BTreeMap<u64, EntityCategories> = self
            .characters
            .values()
            .map(|c| (c.id().as_u64(), c.category()))
            .collect();
        let filter = QueryFilter::new(CollisionChannels::PAWN);

        let mut requests = Vec::new();
        for character in self.characters.values_mut() {
            let Some(blade) = character.blade_shape() else {
                continue;
            };
            let overlapping: Vec<(EntityId, EntityCategories)> = self
                .world
                .overlap(&blade, &filter)
                .into_iter()
                .filter_map(|overlap| overlap.owner)
                .map(|owner| {
                    let category = categories.get(&owner).copied().unwrap_or_default();
                    (EntityId::new(owner), category)
                })
                .collect();
            requests.extend(character.process_weapon_overlaps(&overlapping, &mut self.events));
        }
        requests
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Ticks stepped so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// One character.
    #[must_use]
    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.get(&id)
    }

    /// Mutable access to one character.
    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    /// Every character in id order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// The collision world.
    #[must_use]
    pub fn world(&self) -> &StaticWorld {
        &self.world
    }

    /// The animation service.
    #[must_use]
    pub fn animation(&self) -> &ClipLibrary {
        &self.animation
    }

    /// The spawn service.
    #[must_use]
    pub fn spawner(&self) -> &SpawnRecorder {
        &self.spawner
    }

    /// Pending events without draining.
    #[must_use]
    pub fn events(&self) -> &[CoreEvent] {
        self.events.events()
    }

    /// Drains and returns all events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        self.events.take_events()
    }
}
