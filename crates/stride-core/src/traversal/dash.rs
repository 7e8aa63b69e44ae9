//! Dash: an instant launch along facing followed by a walk-speed boost.

use tracing::{debug, info};

use super::{Activity, TraversalController, TraversalTimer};
use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};
use crate::motion::MovementState;

#[derive(Debug, Clone, Copy)]
pub(super) struct DashRun {
    saved_walk_speed: f32,
}

impl TraversalController {
    /// Launch along facing and boost walk speed for a while.
    ///
    /// Refused while sliding, mantling, or with the dash cooldown armed. A
    /// dash during a running boost re-arms the boost instead of stacking it.
    pub fn try_dash(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) -> bool {
        if self.is_mid_traversal() || !self.can_dash() {
            return false;
        }

        let config = &self.dash_config;
        movement.launch(movement.forward() * config.impulse);

        if let Activity::Idle = self.activity {
            let saved_walk_speed = movement.max_walk_speed;
            movement.max_walk_speed = saved_walk_speed * config.speed_multiplier;
            self.activity = Activity::Dash(DashRun { saved_walk_speed });
        }

        self.timers.start(TraversalTimer::DashBoost, config.boost_duration);
        self.timers.start(TraversalTimer::DashCooldown, config.cooldown);

        info!(%entity, impulse = config.impulse, "dash");
        events.push(CoreEvent::DashStarted { entity });
        true
    }

    pub(super) fn end_dash(&mut self, entity: EntityId, movement: &mut MovementState) {
        if let Activity::Dash(run) = self.activity {
            movement.max_walk_speed = run.saved_walk_speed;
            self.activity = Activity::Idle;
            debug!(%entity, walk_speed = run.saved_walk_speed, "dash boost ended");
        }
    }
}
