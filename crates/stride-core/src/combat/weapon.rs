//! Weapons and per-swing hit registration.
//!
//! A [`Weapon`] is an item wielded by a character. While its
//! [`WeaponHitRegistrar`] is `Aggressive` the blade volume is checked for
//! overlaps every tick; each overlap-begin passes through the registrar,
//! which turns it into at most one [`DamageRequest`] per target per swing.
//!
//! # Example
//!
//! ```
//! use stride_core::combat::{AggressionState, WeaponHitRegistrar};
//! use stride_core::config::WeaponConfig;
//! use stride_core::entity::{EntityCategories, EntityId};
//!
//! let wielder = EntityId::new(1);
//! let mut registrar = WeaponHitRegistrar::new(EntityId::new(100), wielder, &WeaponConfig::default());
//! registrar.set_state(AggressionState::Aggressive);
//!
//! let target = EntityId::new(2);
//! assert!(registrar.on_overlap_begin(target, EntityCategories::ENEMY).is_some());
//! assert!(registrar.on_overlap_begin(target, EntityCategories::ENEMY).is_none());
//! assert!(registrar.on_overlap_begin(wielder, EntityCategories::PLAYER).is_none());
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sweep::Shape;
use tracing::{debug, trace, warn};

use super::damage::DamageRequest;
use super::item::ItemOverlapTracker;
use crate::config::WeaponConfig;
use crate::entity::{EntityCategories, EntityId};
use crate::events::EventQueue;
use crate::motion::MovementState;

/// Whether a weapon can currently deal damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggressionState {
    /// Harmless
    #[default]
    Passive,
    /// Registering hits
    Aggressive,
}

/// Targets a weapon never damages, by identity or by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entities: BTreeSet<EntityId>,
    categories: EntityCategories,
}

impl IgnoreList {
    /// Ignore list from explicit ids and categories.
    #[must_use]
    pub fn new(entities: impl IntoIterator<Item = EntityId>, categories: EntityCategories) -> Self {
        Self {
            entities: entities.into_iter().collect(),
            categories,
        }
    }

    /// Add one entity.
    pub fn insert(&mut self, entity: EntityId) {
        self.entities.insert(entity);
    }

    /// Whether a target with the given id and categories is ignored.
    #[must_use]
    pub fn contains(&self, entity: EntityId, categories: EntityCategories) -> bool {
        self.entities.contains(&entity) || self.categories.intersects(categories)
    }

    /// Ignored categories.
    #[must_use]
    pub fn categories(&self) -> EntityCategories {
        self.categories
    }
}

/// Aggression state plus the swing hit-set of one weapon.
#[derive(Debug, Clone)]
pub struct WeaponHitRegistrar {
    weapon: EntityId,
    wielder: EntityId,
    damage: f32,
    ignore_wielder: bool,
    ignore: IgnoreList,
    state: AggressionState,
    hit_set: BTreeSet<EntityId>,
}

impl WeaponHitRegistrar {
    /// Passive registrar for `weapon` held by `wielder`.
    #[must_use]
    pub fn new(weapon: EntityId, wielder: EntityId, config: &WeaponConfig) -> Self {
        if config.ignore_categories.is_empty() {
            warn!(%weapon, %wielder, "no ignore categories configured; weapon may hit allies");
        }
        Self {
            weapon,
            wielder,
            damage: config.damage,
            ignore_wielder: config.ignore_wielder,
            ignore: IgnoreList::new(config.ignore_entities.iter().copied(), config.ignore_categories),
            state: AggressionState::Passive,
            hit_set: BTreeSet::new(),
        }
    }

    /// Current aggression.
    #[must_use]
    pub fn state(&self) -> AggressionState {
        self.state
    }

    /// Whether hits are being registered.
    #[must_use]
    pub fn is_aggressive(&self) -> bool {
        self.state == AggressionState::Aggressive
    }

    /// Targets already hit in the current swing.
    #[must_use]
    pub fn hit_set(&self) -> &BTreeSet<EntityId> {
        &self.hit_set
    }

    /// The ignore list.
    #[must_use]
    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    /// Change aggression. Going passive clears the hit-set.
    pub fn set_state(&mut self, state: AggressionState) {
        if state == AggressionState::Passive {
            self.hit_set.clear();
        }
        if state != self.state {
            trace!(weapon = %self.weapon, ?state, "aggression changed");
        }
        self.state = state;
    }

    /// Register an overlap-begin with `other`.
    ///
    /// Returns a request only while aggressive, for a target that is neither
    /// ignored nor already hit this swing.
    pub fn on_overlap_begin(&mut self, other: EntityId, categories: EntityCategories) -> Option<DamageRequest> {
        if !self.is_aggressive() {
            return None;
        }
        if self.ignore_wielder && other == self.wielder {
            return None;
        }
        if other == self.weapon || self.ignore.contains(other, categories) {
            return None;
        }
        if !self.hit_set.insert(other) {
            return None;
        }

        debug!(weapon = %self.weapon, wielder = %self.wielder, target = %other, damage = self.damage, "weapon hit");
        Some(
            DamageRequest::new(other, self.damage)
                .with_instigator(self.wielder)
                .with_causer(self.weapon),
        )
    }
}

/// A melee weapon held by a character.
#[derive(Debug, Clone)]
pub struct Weapon {
    id: EntityId,
    config: WeaponConfig,
    registrar: WeaponHitRegistrar,
    tracker: ItemOverlapTracker,
}

impl Weapon {
    /// Passive weapon `id` held by `wielder`.
    #[must_use]
    pub fn new(id: EntityId, wielder: EntityId, config: &WeaponConfig) -> Self {
        Self {
            id,
            config: config.clone(),
            registrar: WeaponHitRegistrar::new(id, wielder, config),
            tracker: ItemOverlapTracker::new(id, config.ignore_wielder.then_some(wielder)),
        }
    }

    /// Weapon entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Configuration the weapon was built from.
    #[must_use]
    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    /// Hit registration state.
    #[must_use]
    pub fn registrar(&self) -> &WeaponHitRegistrar {
        &self.registrar
    }

    /// Entities the blade currently touches.
    #[must_use]
    pub fn tracker(&self) -> &ItemOverlapTracker {
        &self.tracker
    }

    /// Whether a swing is in progress.
    #[must_use]
    pub fn is_swinging(&self) -> bool {
        self.registrar.is_aggressive()
    }

    /// Open the aggression window for a new swing.
    pub fn begin_swing(&mut self) {
        self.registrar.set_state(AggressionState::Aggressive);
    }

    /// Close the aggression window. The blade leaves everything it touched.
    pub fn end_swing(&mut self, events: &mut EventQueue) {
        if !self.is_swinging() {
            return;
        }
        self.tracker.clear(events);
        self.registrar.set_state(AggressionState::Passive);
    }

    /// Blade volume for a wielder in `movement`: a capsule from the front of
    /// the wielder's capsule out to `reach` along facing.
    #[must_use]
    pub fn blade_shape(&self, movement: &MovementState) -> Shape {
        let forward = movement.forward();
        let base = movement.position + forward * movement.capsule.radius;
        let tip = movement.position + forward * self.config.reach.max(movement.capsule.radius);
        Shape::capsule(base, tip, self.config.blade_radius)
    }

    /// Feed this tick's overlap set, given as `(entity, categories)` pairs.
    ///
    /// Only entities that newly entered the blade reach the registrar.
    pub fn process_overlaps(
        &mut self,
        overlapping: &[(EntityId, EntityCategories)],
        events: &mut EventQueue,
    ) -> Vec<DamageRequest> {
        if !self.is_swinging() {
            return Vec::new();
        }
        let entered = self.tracker.sync(overlapping.iter().map(|(id, _)| *id), events);
        entered
            .into_iter()
            .filter_map(|other| {
                let categories = overlapping
                    .iter()
                    .find(|(id, _)| *id == other)
                    .map_or(EntityCategories::empty(), |(_, c)| *c);
                self.registrar.on_overlap_begin(other, categories)
            })
            .collect()
    }
}
