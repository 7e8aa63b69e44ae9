//! The per-character aggregate.
//!
//! A [`Character`] owns everything one player or enemy needs: resources,
//! motion record, traversal and combat controllers, the equipped weapon and
//! the death strategy. Controllers never reach across characters; damage to
//! another character goes through [`crate::combat::DamagePipeline`].
//!
//! Every action is refused once the character is dead.

use glam::Vec3;
use sweep::{ColliderId, CollisionWorld, Shape};
use tracing::{debug, info};

use super::{EntityCategories, EntityId, EntityKind, LifeState};
use crate::combat::{CombatContext, CombatController, DamageRequest, DeathStrategy, EnemyDeath, PlayerDeath, Weapon};
use crate::config::CharacterConfig;
use crate::events::{CoreEvent, EventQueue};
use crate::motion::{KinematicIntegrator, MotionMode, MovementState};
use crate::probe::EnvironmentProbe;
use crate::resources::{ResourceKind, ResourceStore};
use crate::services::AnimationService;
use crate::traversal::TraversalController;

/// Per-tick intent from the input layer or AI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterInput {
    /// Horizontal movement intent, length up to 1
    pub move_direction: Vec3,
    /// View direction
    pub look_direction: Vec3,
}

impl Default for CharacterInput {
    fn default() -> Self {
        Self {
            move_direction: Vec3::ZERO,
            look_direction: Vec3::X,
        }
    }
}

/// One player or enemy.
#[derive(Debug)]
pub struct Character {
    id: EntityId,
    kind: EntityKind,
    config: CharacterConfig,
    life: LifeState,
    resources: ResourceStore,
    movement: MovementState,
    traversal: TraversalController,
    combat: CombatController,
    weapon: Option<Weapon>,
    input: CharacterInput,
    collider: Option<ColliderId>,
    collision_enabled: bool,
    death: Box<dyn DeathStrategy>,
}

impl Character {
    /// Living character with full resources, standing at `position`.
    ///
    /// Players get [`PlayerDeath`]; everything else gets [`EnemyDeath`] with
    /// the configured corpse lifespan.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, position: Vec3, config: &CharacterConfig) -> Self {
        let death: Box<dyn DeathStrategy> = match kind {
            EntityKind::Player => Box::new(PlayerDeath),
            _ => Box::new(EnemyDeath::new(config.combat.corpse_lifespan)),
        };
        Self {
            id,
            kind,
            config: config.clone(),
            life: LifeState::Alive,
            resources: ResourceStore::new(&config.resources),
            movement: MovementState::new(position, &config.movement),
            traversal: TraversalController::new(config),
            combat: CombatController::new(config),
            weapon: None,
            input: CharacterInput::default(),
            collider: None,
            collision_enabled: true,
            death,
        }
    }

    /// Replace the death strategy.
    #[must_use]
    pub fn with_death_strategy(mut self, death: Box<dyn DeathStrategy>) -> Self {
        self.death = death;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Category used by weapon ignore lists.
    #[must_use]
    pub fn category(&self) -> EntityCategories {
        self.kind.category()
    }

    /// Configuration the character was built from.
    #[must_use]
    pub fn config(&self) -> &CharacterConfig {
        &self.config
    }

    /// Alive or dead.
    #[must_use]
    pub fn life(&self) -> LifeState {
        self.life
    }

    /// Whether the character is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    /// Health, power and charges.
    #[must_use]
    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub(crate) fn resources_mut(&mut self) -> &mut ResourceStore {
        &mut self.resources
    }

    /// Motion record.
    #[must_use]
    pub fn movement(&self) -> &MovementState {
        &self.movement
    }

    /// Mutable motion record, for hosts that integrate motion themselves.
    pub fn movement_mut(&mut self) -> &mut MovementState {
        &mut self.movement
    }

    /// Traversal controller.
    #[must_use]
    pub fn traversal(&self) -> &TraversalController {
        &self.traversal
    }

    /// Combat controller.
    #[must_use]
    pub fn combat(&self) -> &CombatController {
        &self.combat
    }

    /// Equipped weapon.
    #[must_use]
    pub fn weapon(&self) -> Option<&Weapon> {
        self.weapon.as_ref()
    }

    /// Latest input.
    #[must_use]
    pub fn input(&self) -> CharacterInput {
        self.input
    }

    /// Capsule collider in the collision world.
    #[must_use]
    pub fn collider(&self) -> Option<ColliderId> {
        self.collider
    }

    /// Whether the capsule collider should be active.
    #[must_use]
    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    /// Whether a slide or mantle is running.
    #[must_use]
    pub fn is_mid_traversal(&self) -> bool {
        self.traversal.is_mid_traversal()
    }

    pub(crate) fn set_collider(&mut self, collider: ColliderId) {
        self.collider = Some(collider);
    }

    /// Set this tick's input. Ignored once dead.
    pub fn set_input(&mut self, input: CharacterInput) {
        if self.is_alive() {
            self.input = input;
        }
    }

    /// Equip `weapon`, returning the one it replaces.
    pub fn equip(&mut self, weapon: Weapon, events: &mut EventQueue) -> Option<Weapon> {
        let old = self.unequip(events);
        debug!(entity = %self.id, weapon = %weapon.id(), "weapon equipped");
        self.weapon = Some(weapon);
        old
    }

    /// Remove the equipped weapon, ending any swing in progress.
    pub fn unequip(&mut self, events: &mut EventQueue) -> Option<Weapon> {
        let mut weapon = self.weapon.take()?;
        weapon.end_swing(events);
        Some(weapon)
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Dash along facing.
    pub fn try_dash(&mut self, events: &mut EventQueue) -> bool {
        self.is_alive() && self.traversal.try_dash(self.id, &mut self.movement, events)
    }

    /// Start a slide.
    pub fn try_slide(&mut self, events: &mut EventQueue) -> bool {
        self.is_alive() && self.traversal.try_slide(self.id, &mut self.movement, events)
    }

    /// End a running slide.
    pub fn stop_slide(&mut self, events: &mut EventQueue) -> bool {
        self.is_alive() && self.traversal.stop_slide(self.id, &mut self.movement, events)
    }

    /// Attack with the equipped weapon, or with a direct sweep when unarmed.
    ///
    /// Returns `None` when refused, otherwise the direct-sweep hits (empty
    /// for a weapon swing).
    pub fn try_attack(&mut self, ctx: &mut CombatContext<'_>) -> Option<Vec<DamageRequest>> {
        if !self.is_alive() {
            return None;
        }
        let mid_traversal = self.traversal.is_mid_traversal();
        self.combat
            .try_attack(self.id, &self.movement, mid_traversal, self.weapon.as_mut(), ctx)
    }

    /// Cast a power along the look direction.
    pub fn try_cast_power(&mut self, ctx: &mut CombatContext<'_>) -> bool {
        if !self.is_alive() {
            return false;
        }
        let mid_traversal = self.traversal.is_mid_traversal();
        self.combat.try_cast_power(
            self.id,
            &self.movement,
            self.input.look_direction,
            mid_traversal,
            &mut self.resources,
            ctx,
        )
    }

    /// Spend one heal charge to restore health.
    ///
    /// Refused when dead, out of charges, or already at full health.
    pub fn try_use_heal_charge(&mut self, events: &mut EventQueue) -> bool {
        if !self.is_alive() || self.resources.charges() == 0 || self.resources.is_health_full() {
            return false;
        }
        self.resources
            .apply_delta_reported(self.id, ResourceKind::Charges, -1.0, events);
        self.resources.apply_delta_reported(
            self.id,
            ResourceKind::Health,
            self.config.resources.heal_per_charge,
            events,
        );
        info!(entity = %self.id, charges = self.resources.charges(), "heal charge used");
        true
    }

    /// Enter the terminal `Dead` state.
    ///
    /// Cancels traversal with every override restored, ends the swing, stops
    /// motion, disables collision, publishes `Died` and runs the death
    /// strategy. A second call does nothing.
    pub fn die(&mut self, events: &mut EventQueue) {
        if !self.is_alive() {
            return;
        }
        self.life = LifeState::Dead;
        self.traversal.cancel(self.id, &mut self.movement, events);
        self.combat.interrupt(self.weapon.as_mut(), events);
        self.movement.velocity = Vec3::ZERO;
        self.movement.mode = MotionMode::Disabled;
        self.collision_enabled = false;
        self.input = CharacterInput::default();

        info!(entity = %self.id, kind = %self.kind, strategy = self.death.name(), "character died");
        events.push(CoreEvent::Died { entity: self.id });
        self.death.on_death(self.id, events);
    }

    // =========================================================================
    // Tick phases
    // =========================================================================

    /// Count down traversal and combat timers.
    pub fn advance_timers(&mut self, dt: f32, events: &mut EventQueue) {
        self.traversal.advance_timers(self.id, dt, &mut self.movement);
        self.combat.advance_timers(self.id, dt, self.weapon.as_mut(), events);
    }

    /// Advance the running traversal ability.
    pub fn update_traversal(
        &mut self,
        dt: f32,
        world: &dyn CollisionWorld,
        animation: &dyn AnimationService,
        events: &mut EventQueue,
    ) {
        let probe = EnvironmentProbe::new(world, Some(self.id.as_u64()));
        self.traversal
            .update(self.id, dt, &mut self.movement, &probe, animation, events);
    }

    /// Probe for a mantle from the current input.
    pub fn detect_traversal(
        &mut self,
        world: &dyn CollisionWorld,
        animation: &mut dyn AnimationService,
        events: &mut EventQueue,
    ) -> bool {
        if !self.is_alive() {
            return false;
        }
        let probe = EnvironmentProbe::new(world, Some(self.id.as_u64()));
        self.traversal.try_mantle(
            self.id,
            self.input.move_direction,
            self.input.look_direction,
            &mut self.movement,
            &probe,
            animation,
            events,
        )
    }

    /// End the swing if its clip has finished.
    pub fn update_combat(&mut self, animation: &dyn AnimationService, events: &mut EventQueue) {
        self.combat.update(self.id, animation, self.weapon.as_mut(), events);
    }

    /// Move by one tick with the reference integrator.
    pub fn integrate(&mut self, integrator: &KinematicIntegrator, dt: f32, world: &dyn CollisionWorld) {
        let input = if self.is_alive() { self.input.move_direction } else { Vec3::ZERO };
        integrator.step(&mut self.movement, input, dt, world);
    }

    /// Current blade volume, if a swing is in progress.
    #[must_use]
    pub fn blade_shape(&self) -> Option<Shape> {
        self.weapon
            .as_ref()
            .filter(|weapon| weapon.is_swinging())
            .map(|weapon| weapon.blade_shape(&self.movement))
    }

    /// Feed blade overlaps to the weapon; returns the hits it registered.
    pub fn process_weapon_overlaps(
        &mut self,
        overlapping: &[(EntityId, EntityCategories)],
        events: &mut EventQueue,
    ) -> Vec<DamageRequest> {
        match self.weapon.as_mut() {
            Some(weapon) => weapon.process_overlaps(overlapping, events),
            None => Vec::new(),
        }
    }
}
