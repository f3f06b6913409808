//! Scene graph
//!
//! - [`Node`]: named scene node with parent/child links
//! - [`Transform`]: TRS component with cached matrices
//! - [`SceneGraph`]: node storage of one avatar
//! - [`Skeleton`]: validated bone tree with rest-pose queries
//! - `transform_system`: world-matrix propagation

pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use node::Node;
pub use scene::SceneGraph;
pub use skeleton::{Bone, RestPose, Skeleton};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
