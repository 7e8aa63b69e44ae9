//! What happens after a character dies.
//!
//! The shared part of dying (traversal cancelled, motion and collision
//! disabled, `Died` published) lives on [`crate::entity::Character`]. The
//! kind-specific consequences are a [`DeathStrategy`] the character holds.

use std::fmt;

use tracing::info;

use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};

/// Kind-specific reaction to a death.
pub trait DeathStrategy: fmt::Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Publish the consequences of `entity` dying.
    fn on_death(&self, entity: EntityId, events: &mut EventQueue);
}

/// Player death: the game mode ends or restarts the level.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerDeath;

impl DeathStrategy for PlayerDeath {
    fn name(&self) -> &'static str {
        "player"
    }

    fn on_death(&self, entity: EntityId, events: &mut EventQueue) {
        info!(%entity, "player died, requesting game over");
        events.push(CoreEvent::GameOverRequested { entity });
    }
}

/// Enemy death: hide the health bar and despawn after `lifespan` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyDeath {
    /// Seconds the corpse remains
    pub lifespan: f32,
}

impl EnemyDeath {
    /// Strategy with the given corpse lifespan.
    #[must_use]
    pub fn new(lifespan: f32) -> Self {
        Self {
            lifespan: lifespan.max(0.0),
        }
    }
}

impl Default for EnemyDeath {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl DeathStrategy for EnemyDeath {
    fn name(&self) -> &'static str {
        "enemy"
    }

    fn on_death(&self, entity: EntityId, events: &mut EventQueue) {
        events.push(CoreEvent::HealthBarVisibility { entity, visible: false });
        events.push(CoreEvent::DespawnRequested {
            entity,
            after: self.lifespan,
        });
    }
}
