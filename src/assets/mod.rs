//! Avatar and motion assets
//!
//! - [`FileKind`]: extension based dispatch
//! - [`AssetParser`] / [`MotionParser`]: format decoders (see [`loaders`])
//! - [`AvatarAsset`]: a loaded avatar with its humanoid rig
//! - [`AssetLifecycle`]: the single active avatar and swap protocol
//! - [`LoadQueue`]: background loads with generation tickets

pub mod avatar;
pub mod file_kind;
pub mod lifecycle;
pub mod loader;
pub mod loaders;

pub use avatar::{
    AssetParser, AssetResources, AvatarAsset, BindingHints, HintSource, MotionParser,
    ParsedAvatar, ParsedMotion,
};
pub use file_kind::FileKind;
pub use lifecycle::{AssetLifecycle, AvatarHandle, HeadlessBackend, RenderBackend, SwapOutcome};
pub use loader::{
    CompletedLoad, LoadKind, LoadPayload, LoadQueue, LoadTicket, read_avatar, read_motion,
};
pub use loaders::{BvhParser, sanitize_node_name};
#[cfg(feature = "gltf")]
pub use loaders::{GltfAvatarParser, GltfMotionParser};
