//! Mantle: climb over a ledge found by the environment probe.
//!
//! While mantling the character flies with gravity off and vaultable
//! obstacles ignored; its position is interpolated toward the anchor, then
//! toward the landing point. The push phase ends on reaching the landing
//! point or when the mantle clip stops playing, whichever comes first, so a
//! clip that is shorter or longer than the path cannot strand the character.

use glam::Vec3;
use tracing::{debug, info, warn};

use super::{Activity, MantlePhase, TraversalController, TraversalTimer};
use crate::entity::EntityId;
use crate::events::{CoreEvent, EventQueue};
use crate::motion::{horizontal, interp_to, MotionMode, MovementState};
use crate::probe::EnvironmentProbe;
use crate::services::{AnimationService, ClipId};

#[derive(Debug, Clone, Copy)]
struct SavedOverrides {
    gravity_scale: f32,
    collides_with_vaultable: bool,
}

#[derive(Debug, Clone)]
pub(super) struct MantleRun {
    pub(super) phase: MantlePhase,
    pub(super) anchor: Vec3,
    pub(super) landing: Vec3,
    direction: Vec3,
    lerp_speed: f32,
    clip: Option<ClipId>,
    exit_speed: f32,
    saved: SavedOverrides,
}

impl TraversalController {
    /// Start a mantle if every precondition and all three probes pass.
    ///
    /// `move_input` is the horizontal movement intent (length is the input
    /// magnitude); `look` is the view direction. On any failure nothing
    /// changes and no cooldown is spent.
    #[allow(clippy::too_many_arguments)]
    pub fn try_mantle(
        &mut self,
        entity: EntityId,
        move_input: Vec3,
        look: Vec3,
        movement: &mut MovementState,
        probe: &EnvironmentProbe<'_>,
        animation: &mut dyn AnimationService,
        events: &mut EventQueue,
    ) -> bool {
        if !matches!(self.activity, Activity::Idle) || !movement.is_airborne() || self.mantle_on_cooldown() {
            return false;
        }

        let config = &self.mantle_config;
        let move_input = horizontal(move_input);
        if move_input.length() <= config.forward_input_threshold {
            return false;
        }
        let (Some(move_dir), Some(look_dir)) = (move_input.try_normalize(), horizontal(look).try_normalize()) else {
            return false;
        };
        if look_dir.dot(move_dir) < config.activation_cosine {
            return false;
        }

        let Some(plan) = probe.find_ledge(movement, look_dir, config) else {
            return false;
        };

        let entry_speed = movement.horizontal_speed();
        let fast = entry_speed > config.fast_speed_threshold;
        let (lerp_speed, clip) = if fast {
            (config.fast_lerp_speed, config.fast_clip)
        } else {
            (config.normal_lerp_speed, config.normal_clip)
        };

        let clip = match clip {
            Some(clip) => {
                if animation.play(entity, clip).is_some() {
                    Some(clip)
                } else {
                    warn!(%entity, ?clip, "mantle clip unknown to animation service; ending on distance only");
                    None
                }
            }
            None => {
                warn!(%entity, fast, "no mantle clip configured; ending on distance only");
                None
            }
        };

        let saved = SavedOverrides {
            gravity_scale: movement.gravity_scale,
            collides_with_vaultable: movement.collides_with_vaultable,
        };
        movement.gravity_scale = 0.0;
        movement.velocity = Vec3::ZERO;
        movement.mode = MotionMode::Flying;
        movement.collides_with_vaultable = false;
        movement.facing = plan.direction;

        let exit_speed = (entry_speed * config.exit_boost).max(config.min_exit_speed);
        self.activity = Activity::Mantle(MantleRun {
            phase: MantlePhase::Reaching,
            anchor: plan.anchor,
            landing: plan.landing,
            direction: plan.direction,
            lerp_speed,
            clip,
            exit_speed,
            saved,
        });

        info!(%entity, fast, entry_speed, ledge = ?plan.ledge, "mantle started");
        events.push(CoreEvent::MantleStarted { entity, fast });
        true
    }

    pub(super) fn update_mantle(
        &mut self,
        entity: EntityId,
        dt: f32,
        movement: &mut MovementState,
        animation: &dyn AnimationService,
        events: &mut EventQueue,
    ) {
        let tolerance = self.mantle_config.tolerance;
        let Activity::Mantle(run) = &mut self.activity else {
            return;
        };
        let clip_done = run.clip.is_some_and(|clip| !animation.is_playing(entity, clip));

        if run.phase == MantlePhase::Reaching {
            movement.position = interp_to(movement.position, run.anchor, dt, run.lerp_speed);
            if movement.position.distance(run.anchor) <= tolerance || clip_done {
                run.phase = MantlePhase::PushingForward;
                debug!(%entity, clip_done, "mantle reached anchor");
            }
            return;
        }

        movement.position = interp_to(movement.position, run.landing, dt, run.lerp_speed);
        if movement.position.distance(run.landing) <= tolerance || clip_done {
            debug!(%entity, clip_done, "mantle reached landing");
            self.finish_mantle(entity, movement, events);
        }
    }

    fn finish_mantle(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) {
        let Activity::Mantle(run) = std::mem::replace(&mut self.activity, Activity::Idle) else {
            return;
        };
        restore(movement, run.saved);
        movement.launch(run.direction * run.exit_speed);
        self.timers
            .start(TraversalTimer::MantleRecheck, self.mantle_config.recheck_cooldown);

        info!(%entity, exit_speed = run.exit_speed, "mantle finished");
        events.push(CoreEvent::MantleEnded {
            entity,
            exit_speed: run.exit_speed,
        });
    }

    pub(super) fn abort_mantle(&mut self, entity: EntityId, movement: &mut MovementState, events: &mut EventQueue) {
        let Activity::Mantle(run) = std::mem::replace(&mut self.activity, Activity::Idle) else {
            return;
        };
        restore(movement, run.saved);
        movement.velocity = Vec3::ZERO;

        info!(%entity, "mantle cancelled");
        events.push(CoreEvent::MantleEnded {
            entity,
            exit_speed: 0.0,
        });
    }
}

fn restore(movement: &mut MovementState, saved: SavedOverrides) {
    movement.gravity_scale = saved.gravity_scale;
    movement.collides_with_vaultable = saved.collides_with_vaultable;
    movement.mode = MotionMode::Falling;
}
