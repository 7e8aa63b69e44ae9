//! External collaborators at their interface boundary.
//!
//! The core plays animation clips and requests projectile spawns, but it
//! never inspects clip content and never owns spawned entities. Both
//! capabilities are traits so an engine can plug in its own systems;
//! [`ClipLibrary`] and [`SpawnRecorder`] are the headless implementations
//! driven by [`crate::Simulation`].

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EntityId;

/// Opaque animation clip handle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClipId(u32);

impl ClipId {
    /// Wrap a raw handle.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClipId({})", self.0)
    }
}

/// Animation-clip service.
pub trait AnimationService {
    /// Start `clip` on `entity`, replacing whatever it was playing.
    ///
    /// Returns the clip duration, or `None` if the clip is unknown.
    fn play(&mut self, entity: EntityId, clip: ClipId) -> Option<f32>;

    /// Whether `entity` is currently playing `clip`.
    fn is_playing(&self, entity: EntityId, clip: ClipId) -> bool;

    /// Duration of `clip`, if known.
    fn duration(&self, clip: ClipId) -> Option<f32>;

    /// Stop whatever `entity` is playing.
    fn stop(&mut self, entity: EntityId);
}

#[derive(Debug, Clone, Copy)]
struct PlayingClip {
    clip: ClipId,
    remaining: f32,
}

/// Headless clip player: known durations, one clip slot per entity.
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    durations: BTreeMap<ClipId, f32>,
    playing: BTreeMap<EntityId, PlayingClip>,
}

impl ClipLibrary {
    /// Empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a clip duration.
    pub fn register(&mut self, clip: ClipId, duration: f32) {
        self.durations.insert(clip, duration.max(0.0));
    }

    /// Advance every playing clip; finished clips stop playing.
    pub fn advance(&mut self, dt: f32) {
        self.playing.retain(|entity, playing| {
            playing.remaining -= dt;
            let alive = playing.remaining > 0.0;
            if !alive {
                debug!(%entity, clip = ?playing.clip, "clip finished");
            }
            alive
        });
    }

    /// Clip currently playing on `entity`.
    #[must_use]
    pub fn current(&self, entity: EntityId) -> Option<ClipId> {
        self.playing.get(&entity).map(|p| p.clip)
    }
}

impl AnimationService for ClipLibrary {
    fn play(&mut self, entity: EntityId, clip: ClipId) -> Option<f32> {
        let duration = *self.durations.get(&clip)?;
        self.playing.insert(
            entity,
            PlayingClip {
                clip,
                remaining: duration,
            },
        );
        Some(duration)
    }

    fn is_playing(&self, entity: EntityId, clip: ClipId) -> bool {
        self.playing.get(&entity).is_some_and(|p| p.clip == clip)
    }

    fn duration(&self, clip: ClipId) -> Option<f32> {
        self.durations.get(&clip).copied()
    }

    fn stop(&mut self, entity: EntityId) {
        self.playing.remove(&entity);
    }
}

/// A projectile the core asks the world to create.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Entity that cast it
    pub owner: EntityId,
    /// Spawn position
    pub origin: Vec3,
    /// Unit flight direction
    pub direction: Vec3,
    /// Launch speed
    pub speed: f32,
    /// Damage on impact
    pub damage: f32,
}

/// Entity-spawn service.
pub trait SpawnService {
    /// Create a projectile owned by `spawn.owner`. Returns its id.
    fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> Option<EntityId>;
}

/// Headless spawner that records every request.
#[derive(Debug, Clone)]
pub struct SpawnRecorder {
    next_id: u64,
    spawned: Vec<(EntityId, ProjectileSpawn)>,
}

impl SpawnRecorder {
    /// First id handed out; keeps projectile ids clear of character ids.
    pub const FIRST_ID: u64 = 1 << 32;

    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Self::FIRST_ID,
            spawned: Vec::new(),
        }
    }

    /// Every spawn so far, in request order.
    #[must_use]
    pub fn spawned(&self) -> &[(EntityId, ProjectileSpawn)] {
        &self.spawned
    }
}

impl Default for SpawnRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpawnService for SpawnRecorder {
    fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> Option<EntityId> {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.spawned.push((id, spawn));
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWING: ClipId = ClipId::new(1);
    const CAST: ClipId = ClipId::new(2);

    mod clip_library_tests {
        use super::*;

        #[test]
        fn unknown_clip_does_not_play() {
            let mut lib = ClipLibrary::new();
            assert_eq!(lib.play(EntityId::new(1), SWING), None);
            assert!(!lib.is_playing(EntityId::new(1), SWING));
        }

        #[test]
        fn clip_plays_for_its_duration() {
            let mut lib = ClipLibrary::new();
            lib.register(SWING, 0.5);
            let e = EntityId::new(1);
            assert_eq!(lib.play(e, SWING), Some(0.5));
            lib.advance(0.25);
            assert!(lib.is_playing(e, SWING));
            lib.advance(0.25);
            assert!(!lib.is_playing(e, SWING));
        }

        #[test]
        fn new_clip_replaces_old() {
            let mut lib = ClipLibrary::new();
            lib.register(SWING, 1.0);
            lib.register(CAST, 1.0);
            let e = EntityId::new(1);
            lib.play(e, SWING);
            lib.play(e, CAST);
            assert!(!lib.is_playing(e, SWING));
            assert_eq!(lib.current(e), Some(CAST));
        }

        #[test]
        fn stop_clears_slot() {
            let mut lib = ClipLibrary::new();
            lib.register(SWING, 1.0);
            let e = EntityId::new(1);
            lib.play(e, SWING);
            lib.stop(e);
            assert_eq!(lib.current(e), None);
        }
    }

    mod spawn_recorder_tests {
        use super::*;

        #[test]
        fn ids_are_unique_and_recorded() {
            let mut recorder = SpawnRecorder::new();
            let spawn = ProjectileSpawn {
                owner: EntityId::new(1),
                origin: Vec3::ZERO,
                direction: Vec3::X,
                speed: 100.0,
                damage: 10.0,
            };
            let a = recorder.spawn_projectile(spawn).unwrap();
            let b = recorder.spawn_projectile(spawn).unwrap();
            assert_ne!(a, b);
            assert_eq!(a.as_u64(), SpawnRecorder::FIRST_ID);
            assert_eq!(recorder.spawned().len(), 2);
        }
    }
}
