//! Keyframe animation data
//!
//! - [`KeyframeTrack`]: times plus values with linear/step/cubic sampling
//! - [`AnimationClip`]: bone tracks keyed by source name or humanoid bone

pub mod clip;
pub mod tracks;
pub mod values;

pub use clip::{AnimationClip, HumanoidClip, SourceClip, Track};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
