//! Dash, slide and mantle.
//!
//! [`TraversalController`] is a state machine over [`TraversalState`]. The
//! abilities are mutually exclusive by construction: the controller holds at
//! most one active run, and each run carries the values it overrode on the
//! [`MovementState`] so they can be put back exactly.
//!
//! # Architecture
//!
//! ```text
//! Grounded ──dash──────────────▶ Dashing ──boost timer──▶ Grounded
//! Grounded ──slide─────────────▶ Sliding ──slow | no headroom | stop──▶ Grounded
//! Grounded ──airborne + probes─▶ Mantling(Reaching) ──anchor──▶ Mantling(PushingForward)
//!                                   ──landing | clip done──▶ Grounded
//! ```
//!
//! Per tick the host calls [`TraversalController::advance_timers`], then
//! [`TraversalController::update`], then [`TraversalController::try_mantle`].
//! Updating before detecting means a mantle that just finished cannot start
//! again in the same tick. [`TraversalController::cancel`] leaves any state
//! with every override restored before it returns.
//!
//! Starting an ability while another one is running, or while its cooldown
//! is armed, is a silent no-op that returns `false`.

mod dash;
mod mantle;
mod slide;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{CharacterConfig, DashConfig, MantleConfig, SlideConfig};
use crate::entity::EntityId;
use crate::events::EventQueue;
use crate::motion::MovementState;
use crate::probe::EnvironmentProbe;
use crate::scheduler::Scheduler;
use crate::services::AnimationService;

use dash::DashRun;
use mantle::MantleRun;
use slide::SlideRun;

/// Sub-phase of a mantle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MantlePhase {
    /// Moving up to the ledge anchor
    Reaching,
    /// Moving over the ledge to the landing point
    PushingForward,
}

/// Which traversal ability, if any, is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalState {
    /// No ability running
    Grounded,
    /// Dash speed boost running
    Dashing,
    /// Sliding with reduced capsule and no friction
    Sliding,
    /// Climbing over a ledge
    Mantling(MantlePhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TraversalTimer {
    DashCooldown,
    DashBoost,
    MantleRecheck,
}

#[derive(Debug, Clone)]
enum Activity {
    Idle,
    Dash(DashRun),
    Slide(SlideRun),
    Mantle(MantleRun),
}

/// Traversal state machine for one character.
#[derive(Debug, Clone)]
pub struct TraversalController {
    dash_config: DashConfig,
    slide_config: SlideConfig,
    mantle_config: MantleConfig,
    activity: Activity,
    timers: Scheduler<TraversalTimer>,
}

impl TraversalController {
    /// Controller in `Grounded` with no cooldown armed.
    #[must_use]
    pub fn new(config: &CharacterConfig) -> Self {
        Self {
            dash_config: config.dash.clone(),
            slide_config: config.slide.clone(),
            mantle_config: config.mantle.clone(),
            activity: Activity::Idle,
            timers: Scheduler::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TraversalState {
        match &self.activity {
            Activity::Idle => TraversalState::Grounded,
            Activity::Dash(_) => TraversalState::Dashing,
            Activity::Slide(_) => TraversalState::Sliding,
            Activity::Mantle(run) => TraversalState::Mantling(run.phase),
        }
    }

    /// Whether a slide or mantle is running. Attacks and casts are refused
    /// while this holds.
    #[must_use]
    pub fn is_mid_traversal(&self) -> bool {
        matches!(self.activity, Activity::Slide(_) | Activity::Mantle(_))
    }

    /// Whether a mantle is running.
    #[must_use]
    pub fn is_mantling(&self) -> bool {
        matches!(self.activity, Activity::Mantle(_))
    }

    /// Whether a slide is running.
    #[must_use]
    pub fn is_sliding(&self) -> bool {
        matches!(self.activity, Activity::Slide(_))
    }

    /// Whether the dash cooldown has elapsed.
    #[must_use]
    pub fn can_dash(&self) -> bool {
        !self.timers.is_active(TraversalTimer::DashCooldown)
    }

    /// Whether the mantle probe is held off by the recheck cooldown.
    #[must_use]
    pub fn mantle_on_cooldown(&self) -> bool {
        self.timers.is_active(TraversalTimer::MantleRecheck)
    }

    /// Seconds left on the dash cooldown.
    #[must_use]
    pub fn dash_cooldown_remaining(&self) -> Option<f32> {
        self.timers.remaining(TraversalTimer::DashCooldown)
    }

    /// Count down cooldowns; ends the dash boost when it runs out.
    pub fn advance_timers(&mut self, entity: EntityId, dt: f32, movement: &mut MovementState) {
        for timer in self.timers.advance(dt) {
            match timer {
                TraversalTimer::DashBoost => self.end_dash(entity, movement),
                TraversalTimer::DashCooldown | TraversalTimer::MantleRecheck => {
                    trace!(%entity, ?timer, "traversal cooldown elapsed");
                }
            }
        }
    }

    /// Advance the running ability by one tick.
    pub fn update(
        &mut self,
        entity: EntityId,
        dt: f32,
        movement: &mut MovementState,
        probe: &EnvironmentProbe<'_>,
        animation: &dyn AnimationService,
        events: &mut EventQueue,
    ) {
        match self.activity {
            Activity::Idle | Activity::Dash(_) => {}
            Activity::Slide(_) => self.update_slide(entity, movement, probe, events),
            Activity::Mantle(_) => self.update_mantle(entity, dt, movement, animation, events),
        }
    }

    /// Leave whatever state is running, restoring every override now.
    pub fn cancel(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) {
        match self.activity {
            Activity::Idle => {}
            Activity::Dash(_) => {
                self.timers.cancel(TraversalTimer::DashBoost);
                self.end_dash(entity, movement);
            }
            Activity::Slide(_) => self.end_slide(entity, movement, events),
            Activity::Mantle(_) => self.abort_mantle(entity, movement, events),
        }
    }

    /// Anchor and landing points of a running mantle.
    #[must_use]
    pub fn mantle_targets(&self) -> Option<(Vec3, Vec3)> {
        match &self.activity {
            Activity::Mantle(run) => Some((run.anchor, run.landing)),
            _ => None,
        }
    }
}
