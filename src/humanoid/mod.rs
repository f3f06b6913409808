//! Standardized humanoid skeleton
//!
//! - [`HumanoidBone`]: the fixed set of canonical bone identifiers and their
//!   hierarchy
//! - [`HumanoidSchema`]: the rest pose retargeted clips are expressed against
//! - [`HumanoidRig`]: canonical bones resolved to an avatar's scene nodes

pub mod bone;
pub mod rig;
pub mod schema;

pub use bone::{HumanoidBone, UnknownHumanoidBone};
pub use rig::HumanoidRig;
pub use schema::{HumanoidSchema, SchemaBone, canonical_skeleton, canonical_skeleton_scaled};
