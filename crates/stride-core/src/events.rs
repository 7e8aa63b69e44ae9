//! Outbound notifications for game-state, UI and AI collaborators.
//!
//! Controllers never call out to listeners. They push [`CoreEvent`]s into an
//! [`EventQueue`] which the surrounding game loop drains once per tick with
//! [`EventQueue::take_events`].

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::resources::ResourceKind;

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreEvent {
    /// A resource value actually changed
    ResourceChanged {
        /// Owner of the resource
        entity: EntityId,
        /// Which resource
        kind: ResourceKind,
        /// Value before
        old: f32,
        /// Value after
        new: f32,
    },
    /// Damage was applied to a target
    DamageApplied {
        /// Entity hit
        target: EntityId,
        /// Entity responsible
        instigator: Option<EntityId>,
        /// Entity that dealt the hit (weapon, projectile or the instigator)
        causer: Option<EntityId>,
        /// Health actually removed
        amount: f32,
    },
    /// A character died. Fires once per character.
    Died {
        /// The character
        entity: EntityId,
    },
    /// Another entity started or stopped overlapping an item
    ItemOverlap {
        /// The item
        item: EntityId,
        /// The other entity
        other: EntityId,
        /// `true` on entry, `false` on exit
        entering: bool,
    },
    /// A dash impulse was applied
    DashStarted {
        /// The character
        entity: EntityId,
    },
    /// A slide began
    SlideStarted {
        /// The character
        entity: EntityId,
    },
    /// A slide ended and the capsule was restored
    SlideEnded {
        /// The character
        entity: EntityId,
    },
    /// A mantle began
    MantleStarted {
        /// The character
        entity: EntityId,
        /// Whether the fast variant was chosen
        fast: bool,
    },
    /// A mantle finished or was cancelled
    MantleEnded {
        /// The character
        entity: EntityId,
        /// Horizontal speed the character left with
        exit_speed: f32,
    },
    /// A melee attack started
    AttackStarted {
        /// The character
        entity: EntityId,
        /// Combo step, zero without a combo
        combo_step: usize,
    },
    /// The combo window closed without input
    ComboReset {
        /// The character
        entity: EntityId,
    },
    /// Power was spent on a cast
    PowerCast {
        /// The character
        entity: EntityId,
        /// Power deducted
        cost: f32,
    },
    /// A projectile was spawned on behalf of a character
    ProjectileSpawned {
        /// Caster
        owner: EntityId,
        /// New projectile
        projectile: EntityId,
    },
    /// The player died; the game mode should end or restart the level
    GameOverRequested {
        /// The dead player
        entity: EntityId,
    },
    /// Show or hide a character's floating health bar
    HealthBarVisibility {
        /// The character
        entity: EntityId,
        /// New visibility
        visible: bool,
    },
    /// Remove the entity after a delay
    DespawnRequested {
        /// The entity
        entity: EntityId,
        /// Delay in seconds
        after: f32,
    },
}

/// FIFO of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<CoreEvent>,
}

impl EventQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    /// Drains and returns all recorded events in the order they were pushed.
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending events without draining.
    #[must_use]
    pub fn events(&self) -> &[CoreEvent] {
        &self.events
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_events_drains_in_order() {
        let mut queue = EventQueue::new();
        queue.push(CoreEvent::DashStarted { entity: EntityId::new(1) });
        queue.push(CoreEvent::Died { entity: EntityId::new(2) });
        assert_eq!(queue.len(), 2);

        let events = queue.take_events();
        assert_eq!(events[0], CoreEvent::DashStarted { entity: EntityId::new(1) });
        assert_eq!(events[1], CoreEvent::Died { entity: EntityId::new(2) });
        assert!(queue.is_empty());
    }

    #[test]
    fn events_serialize() {
        let event = CoreEvent::ResourceChanged {
            entity: EntityId::new(3),
            kind: ResourceKind::Health,
            old: 100.0,
            new: 60.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
