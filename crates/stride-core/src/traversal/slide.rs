//! Slide: frictionless ground travel in a shortened capsule.

use tracing::{debug, info};

use super::{Activity, TraversalController};
use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};
use crate::motion::MovementState;
use crate::probe::EnvironmentProbe;

const MIN_START_SPEED: f32 = 1.0e-3;

#[derive(Debug, Clone, Copy)]
pub(super) struct SlideRun {
    saved_friction: f32,
    saved_half_height: f32,
}

impl TraversalController {
    /// Start sliding along the current ground velocity.
    ///
    /// Requires no other ability running, ground contact and a nonzero
    /// horizontal velocity.
    pub fn try_slide(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) -> bool {
        if !matches!(self.activity, Activity::Idle) || !movement.is_grounded() {
            return false;
        }
        let Some(direction) = movement
            .horizontal_velocity()
            .try_normalize()
            .filter(|_| movement.horizontal_speed() > MIN_START_SPEED)
        else {
            return false;
        };

        let run = SlideRun {
            saved_friction: movement.ground_friction,
            saved_half_height: movement.capsule.half_height,
        };

        let shrunk = (run.saved_half_height * self.slide_config.capsule_scale).max(movement.capsule.radius);
        movement.ground_friction = 0.0;
        movement.position.z -= run.saved_half_height - shrunk;
        movement.capsule.half_height = shrunk;
        movement.velocity += direction * self.slide_config.impulse;

        self.activity = Activity::Slide(run);
        info!(%entity, half_height = shrunk, "slide started");
        events.push(CoreEvent::SlideStarted { entity });
        true
    }

    /// End a running slide now. Returns `false` if not sliding.
    pub fn stop_slide(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) -> bool {
        if !self.is_sliding() {
            return false;
        }
        self.end_slide(entity, movement, events);
        true
    }

    pub(super) fn update_slide(
        &mut self,
        entity: EntityId,
        movement: &mut MovementState,
        probe: &EnvironmentProbe<'_>,
        events: &mut EventQueue,
    ) {
        let Activity::Slide(run) = self.activity else {
            return;
        };
        let too_slow = movement.horizontal_speed() < self.slide_config.min_speed;
        let no_headroom = probe.headroom_blocked(movement.position, &movement.capsule, run.saved_half_height);
        if too_slow || no_headroom {
            debug!(%entity, too_slow, no_headroom, "slide exit condition");
            self.end_slide(entity, movement, events);
        }
    }

    pub(super) fn end_slide(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) {
        let Activity::Slide(run) = self.activity else {
            return;
        };
        movement.position.z += run.saved_half_height - movement.capsule.half_height;
        movement.capsule.half_height = run.saved_half_height;
        movement.ground_friction = run.saved_friction;
        self.activity = Activity::Idle;

        info!(%entity, "slide ended");
        events.push(CoreEvent::SlideEnded { entity });
    }
}
