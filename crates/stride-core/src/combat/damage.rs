//! Damage requests and their application.
//!
//! A [`DamageRequest`] is produced by a weapon registrar, a direct melee
//! sweep or the host, and consumed exactly once by
//! [`DamagePipeline::apply`]. The pipeline is the only cross-entity writer of
//! health: it forwards the hit to the target's resource store and performs
//! the death transition when health crosses from positive to zero.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::entity::{Character, EntityId};
use crate::events::{CoreEvent, EventQueue};
use crate::resources::ResourceKind;

/// One hit to apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRequest {
    /// Health to remove; negative amounts are treated as zero
    pub amount: f32,
    /// Entity responsible for the hit
    pub instigator: Option<EntityId>,
    /// Entity that dealt it (weapon, projectile, or the instigator itself)
    pub causer: Option<EntityId>,
    /// Entity hit
    pub target: EntityId,
}

impl DamageRequest {
    /// Anonymous damage against `target`.
    #[must_use]
    pub fn new(target: EntityId, amount: f32) -> Self {
        Self {
            amount,
            instigator: None,
            causer: None,
            target,
        }
    }

    /// Set the responsible entity.
    #[must_use]
    pub fn with_instigator(mut self, instigator: EntityId) -> Self {
        self.instigator = Some(instigator);
        self
    }

    /// Set the entity that dealt the hit.
    #[must_use]
    pub fn with_causer(mut self, causer: EntityId) -> Self {
        self.causer = Some(causer);
        self
    }
}

/// Applies [`DamageRequest`]s to characters.
///
/// # Example
///
/// ```
/// use glam::Vec3;
/// use stride_core::combat::{DamagePipeline, DamageRequest};
/// use stride_core::config::CharacterConfig;
/// use stride_core::entity::{Character, EntityId, EntityKind};
/// use stride_core::events::EventQueue;
///
/// let target = EntityId::new(2);
/// let mut enemy = Character::new(target, EntityKind::Enemy, Vec3::ZERO, &CharacterConfig::default());
/// let mut events = EventQueue::new();
///
/// let dealt = DamagePipeline::new().apply(&DamageRequest::new(target, 40.0), &mut enemy, &mut events);
/// assert_eq!(dealt, 40.0);
/// assert_eq!(enemy.resources().health(), 60.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DamagePipeline;

impl DamagePipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply `request` to `target` and return the health actually removed.
    ///
    /// Dead targets are skipped. If health reaches zero from a positive
    /// value the target dies; [`Character::die`] guards against a second
    /// death notification.
    pub fn apply(&self, request: &DamageRequest, target: &mut Character, events: &mut EventQueue) -> f32 {
        if !target.is_alive() {
            trace!(target = %request.target, "damage ignored, target already dead");
            return 0.0;
        }

        let amount = if request.amount.is_nan() { 0.0 } else { request.amount.max(0.0) };
        let id = target.id();
        let outcome = target
            .resources_mut()
            .apply_delta_reported(id, ResourceKind::Health, -amount, events);
        let dealt = outcome.old - outcome.new;

        debug!(
            target = %request.target,
            instigator = ?request.instigator,
            causer = ?request.causer,
            requested = request.amount,
            dealt,
            "damage applied"
        );
        events.push(CoreEvent::DamageApplied {
            target: request.target,
            instigator: request.instigator,
            causer: request.causer,
            amount: dealt,
        });

        if outcome.new <= 0.0 && outcome.old > 0.0 {
            target.die(events);
        }
        dealt
    }
}
