//! Skeleton retargeting
//!
//! - [`BoneNameMapper`]: source bone name to [`HumanoidBone`](crate::humanoid::HumanoidBone)
//! - [`RetargetBinding`]: per-bone rest-pose corrections for one source rig
//! - [`retarget_clip`]: source-named clip to humanoid clip

pub mod binding;
pub mod clip;
pub mod conventions;
pub mod mapper;

pub use binding::{BoneCorrection, BoundBone, RetargetBinding};
pub use clip::retarget_clip;
pub use conventions::{BVH_RIG_MAP, MIXAMO_RIG_MAP};
pub use mapper::{BoneNameMapper, HumanoidNameMapper, RigConvention, TableMapper};
