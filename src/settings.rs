//! Viewer configuration.
//!
//! Plain structs with defaults, readable from JSON:
//!
//! ```json
//! { "playback": { "loop_mode": "loop", "time_scale": 0.5 },
//!   "retarget": { "convention": "mixamo" } }
//! ```
//!
//! Missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::playback::LoopMode;
use crate::retarget::RigConvention;

/// What happens to playback when the avatar is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapPolicy {
    /// Rebind the motion and wait at time 0.
    #[default]
    Restart,
    /// Rebind the motion and play from time 0.
    RestartPlaying,
    /// Rebind the motion and continue from the current time and status.
    PreserveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub loop_mode: LoopMode,
    pub time_scale: f32,
    pub on_asset_swap: SwapPolicy,
    /// Start playing as soon as a motion is loaded.
    pub autoplay: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::Once,
            time_scale: 1.0,
            on_asset_swap: SwapPolicy::Restart,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetSettings {
    /// Naming convention of motion files. `None` detects it per file.
    pub convention: Option<RigConvention>,
    /// Rotate the motion about +Y so the source rig faces the avatar's way.
    pub align_facing: bool,
}

impl Default for RetargetSettings {
    fn default() -> Self {
        Self {
            convention: None,
            align_facing: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub playback: PlaybackSettings,
    pub retarget: RetargetSettings,
}

impl ViewerSettings {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
