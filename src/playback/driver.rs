use std::sync::Arc;

use crate::animation::HumanoidClip;
use crate::humanoid::HumanoidRig;
use crate::playback::state::{LoopMode, PlaybackState, PlaybackStatus};
use crate::retarget::RetargetBinding;
use crate::scene::SceneGraph;

/// Plays one retargeted clip on an avatar.
///
/// Holds at most one [`PlaybackState`]. Each [`advance`](Self::advance) moves
/// the clock, samples every track and writes the pose into the scene graph;
/// rendering is left to the caller.
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    state: Option<PlaybackState>,
    status: PlaybackStatus,
    pub loop_mode: LoopMode,
    pub time_scale: f32,
}

impl Default for PlaybackDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackDriver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: None,
            status: PlaybackStatus::Idle,
            loop_mode: LoopMode::default(),
            time_scale: 1.0,
        }
    }

    #[must_use]
    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Replaces the loaded clip. Elapsed time goes back to 0 and the driver
    /// waits in `Idle` for [`play`](Self::play).
    pub fn load_clip(&mut self, clip: Arc<HumanoidClip>, binding: Arc<RetargetBinding>) {
        log::debug!(
            "Loaded clip '{}' ({} tracks, {:.3}s)",
            clip.name,
            clip.tracks.len(),
            clip.duration
        );
        self.state = Some(PlaybackState::new(clip, binding));
        self.status = PlaybackStatus::Idle;
    }

    /// Swaps in a new clip/binding pair while keeping the current clip time.
    /// The status is left as it is.
    pub fn rebind_preserving_time(
        &mut self,
        clip: Arc<HumanoidClip>,
        binding: Arc<RetargetBinding>,
    ) {
        let cursor = self.state.as_ref().map_or(0.0, |s| s.cursor);
        let mut state = PlaybackState::new(clip, binding);
        state.seek(cursor, self.loop_mode);
        self.state = Some(state);
    }

    /// Drops the loaded clip.
    pub fn clear(&mut self) {
        self.state = None;
        self.status = PlaybackStatus::Idle;
    }

    pub fn play(&mut self) {
        let Some(state) = &mut self.state else {
            log::warn!("play() without a loaded clip");
            return;
        };
        // A finished one-shot clip starts over.
        if self.loop_mode == LoopMode::Once && state.elapsed >= state.duration() {
            state.seek(0.0, self.loop_mode);
            reset_cursors(state);
        }
        self.status = PlaybackStatus::Playing;
    }

    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
    }

    /// Back to `Idle` at time 0. The clip stays loaded.
    pub fn stop(&mut self) {
        if let Some(state) = &mut self.state {
            state.seek(0.0, self.loop_mode);
            reset_cursors(state);
        }
        self.status = PlaybackStatus::Idle;
    }

    /// Jumps to `time` (clip seconds, folded by the loop mode).
    pub fn seek(&mut self, time: f32) {
        if let Some(state) = &mut self.state {
            state.seek(time, self.loop_mode);
        }
    }

    /// Advances the clock by `dt * time_scale` and writes the sampled pose
    /// into `scene`. Does nothing unless playing.
    pub fn advance(&mut self, dt: f32, scene: &mut SceneGraph, rig: &HumanoidRig) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        let Some(state) = &mut self.state else {
            return;
        };

        let cursor = state.cursor + dt * self.time_scale;
        state.seek(cursor, self.loop_mode);

        apply_pose(state, scene, rig);

        if self.loop_mode == LoopMode::Once && state.elapsed >= state.duration() {
            log::debug!("Clip '{}' finished", state.clip.name);
            self.status = PlaybackStatus::Paused;
        }
    }

    /// Writes the pose at the current time without advancing the clock.
    pub fn apply_current_pose(&mut self, scene: &mut SceneGraph, rig: &HumanoidRig) {
        if let Some(state) = &mut self.state {
            apply_pose(state, scene, rig);
        }
    }

    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Current sample time within the clip, 0 when nothing is loaded.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.state.as_ref().map_or(0.0, PlaybackState::elapsed)
    }

    #[must_use]
    pub fn state(&self) -> Option<&PlaybackState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn clip(&self) -> Option<&Arc<HumanoidClip>> {
        self.state.as_ref().map(PlaybackState::clip)
    }

    #[must_use]
    pub fn binding(&self) -> Option<&Arc<RetargetBinding>> {
        self.state.as_ref().map(PlaybackState::binding)
    }
}

fn reset_cursors(state: &mut PlaybackState) {
    state
        .rotation_cursors
        .iter_mut()
        .chain(state.translation_cursors.iter_mut())
        .for_each(|c| c.reset());
}

fn apply_pose(state: &mut PlaybackState, scene: &mut SceneGraph, rig: &HumanoidRig) {
    let time = state.elapsed;

    for (i, track) in state.clip.tracks.iter().enumerate() {
        let Some(handle) = rig.node(track.target) else {
            continue;
        };
        let Some(node) = scene.get_node_mut(handle) else {
            continue;
        };

        if let Some(rotation) = track
            .rotation
            .sample_with_cursor(time, &mut state.rotation_cursors[i])
        {
            node.transform.rotation = rotation;
        }
        if let Some(translation) = track
            .translation
            .as_ref()
            .and_then(|t| t.sample_with_cursor(time, &mut state.translation_cursors[i]))
        {
            node.transform.position = translation;
        }
        node.transform.mark_dirty();
    }
}
