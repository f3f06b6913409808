//! # rigmotion
//!
//! Loads humanoid avatars (VRM 0.x / 1.0, glTF) and motion capture (BVH,
//! animated glTF), retargets the motion onto a canonical humanoid skeleton
//! and plays it back on the avatar's scene graph.
//!
//! ```rust,ignore
//! use rigmotion::{AvatarViewer, ViewerSettings};
//!
//! let mut viewer = AvatarViewer::headless(ViewerSettings::default());
//! viewer.open("avatar.vrm")?;
//! viewer.open("walk.bvh")?;
//! loop {
//!     viewer.update(1.0 / 60.0);
//!     // render viewer.active_scene()
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod humanoid;
pub mod playback;
pub mod retarget;
pub mod scene;
pub mod settings;
pub mod viewer;

pub use animation::{AnimationClip, HumanoidClip, KeyframeTrack, SourceClip};
pub use assets::{AssetLifecycle, AvatarAsset, FileKind, LoadQueue, RenderBackend};
pub use errors::{Error, Result};
pub use humanoid::{HumanoidBone, HumanoidRig, HumanoidSchema};
pub use playback::{LoopMode, PlaybackDriver, PlaybackStatus};
pub use retarget::{BoneNameMapper, RetargetBinding, RigConvention, retarget_clip};
pub use scene::{SceneGraph, Skeleton};
pub use settings::{SwapPolicy, ViewerSettings};
pub use viewer::{AvatarViewer, ViewerEvent};
