use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::animation::{HumanoidClip, KeyframeCursor};
use crate::retarget::RetargetBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Play to the end, then hold the last pose.
    #[default]
    Once,
    Loop,
    PingPong,
}

impl LoopMode {
    /// Folds an unbounded play cursor into `[0, duration]`.
    ///
    /// Returns `(bounded cursor, elapsed)`. The bounded cursor stays in one
    /// period so it never loses precision over long sessions.
    #[must_use]
    pub fn wrap(self, cursor: f32, duration: f32) -> (f32, f32) {
        if duration <= 0.0 {
            return (0.0, 0.0);
        }
        match self {
            LoopMode::Once => {
                let t = cursor.clamp(0.0, duration);
                (t, t)
            }
            LoopMode::Loop => {
                let t = cursor.rem_euclid(duration);
                (t, t)
            }
            LoopMode::PingPong => {
                let period = duration * 2.0;
                let c = cursor.rem_euclid(period);
                let t = if c > duration { period - c } else { c };
                (c, t)
            }
        }
    }
}

/// The clip currently loaded into the driver, with its binding and time
/// cursor. Replaced wholesale, never patched.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub(crate) clip: Arc<HumanoidClip>,
    pub(crate) binding: Arc<RetargetBinding>,
    /// Unfolded play cursor, kept within one loop period.
    pub(crate) cursor: f32,
    /// Sample time inside the clip.
    pub(crate) elapsed: f32,
    pub(crate) rotation_cursors: Vec<KeyframeCursor>,
    pub(crate) translation_cursors: Vec<KeyframeCursor>,
}

impl PlaybackState {
    #[must_use]
    pub fn new(clip: Arc<HumanoidClip>, binding: Arc<RetargetBinding>) -> Self {
        let track_count = clip.tracks.len();
        Self {
            clip,
            binding,
            cursor: 0.0,
            elapsed: 0.0,
            rotation_cursors: vec![KeyframeCursor::default(); track_count],
            translation_cursors: vec![KeyframeCursor::default(); track_count],
        }
    }

    #[must_use]
    pub fn clip(&self) -> &Arc<HumanoidClip> {
        &self.clip
    }

    #[must_use]
    pub fn binding(&self) -> &Arc<RetargetBinding> {
        &self.binding
    }

    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.clip.duration
    }

    pub(crate) fn seek(&mut self, cursor: f32, loop_mode: LoopMode) {
        let (cursor, elapsed) = loop_mode.wrap(cursor, self.clip.duration);
        self.cursor = cursor;
        self.elapsed = elapsed;
    }
}
