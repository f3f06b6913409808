use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::humanoid::HumanoidBone;
use crate::scene::{NodeHandle, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq)]
struct RigBone {
    node: NodeHandle,
    rest_position: Vec3,
    rest_rotation: Quat,
}

/// Lookup from canonical bones to the scene nodes of one avatar.
///
/// Remembers each node's rest TRS at bind time so the pose can be reset when
/// playback stops or a clip leaves some bones unanimated.
#[derive(Debug, Clone, Default)]
pub struct HumanoidRig {
    bones: FxHashMap<HumanoidBone, RigBone>,
}

impl HumanoidRig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a rig from `(bone, node name)` pairs, resolving names in `scene`.
    /// Names that are not found are skipped.
    pub fn from_names<'a>(
        scene: &SceneGraph,
        names: impl IntoIterator<Item = (HumanoidBone, &'a str)>,
    ) -> Self {
        let mut rig = Self::new();
        for (bone, name) in names {
            match scene.find_by_name(name) {
                Some(node) => rig.bind(scene, bone, node),
                None => log::debug!("Humanoid {bone}: node '{name}' not in scene"),
            }
        }
        rig
    }

    /// Binds `bone` to `node`, capturing the node's current TRS as rest pose.
    pub fn bind(&mut self, scene: &SceneGraph, bone: HumanoidBone, node: NodeHandle) {
        let Some(n) = scene.get_node(node) else {
            log::warn!("Humanoid {bone}: node handle is not in the scene");
            return;
        };
        self.bones.insert(
            bone,
            RigBone {
                node,
                rest_position: n.transform.position,
                rest_rotation: n.transform.rotation,
            },
        );
    }

    #[inline]
    #[must_use]
    pub fn node(&self, bone: HumanoidBone) -> Option<NodeHandle> {
        self.bones.get(&bone).map(|b| b.node)
    }

    #[must_use]
    pub fn contains(&self, bone: HumanoidBone) -> bool {
        self.bones.contains_key(&bone)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanoidBone, NodeHandle)> + '_ {
        self.bones.iter().map(|(bone, b)| (*bone, b.node))
    }

    /// Writes every bound bone's rest TRS back into `scene`.
    pub fn reset_to_rest(&self, scene: &mut SceneGraph) {
        for b in self.bones.values() {
            if let Some(node) = scene.get_node_mut(b.node) {
                node.transform.position = b.rest_position;
                node.transform.rotation = b.rest_rotation;
                node.transform.mark_dirty();
            }
        }
    }
}
