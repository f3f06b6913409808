use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::errors::RetargetError;
use crate::humanoid::HumanoidBone;
use crate::scene::skeleton::{Bone, RestPose, Skeleton};

/// Rest-pose data of one canonical bone, in rig space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemaBone {
    /// Rest orientation of the bone.
    pub world_rotation: Quat,
    /// Rest orientation of the bone's actual parent in the rig (identity for a
    /// rig root).
    pub parent_world_rotation: Quat,
    /// Rest position of the bone.
    pub world_position: Vec3,
}

/// The humanoid rest pose a retargeted clip is expressed against.
///
/// Either the built-in normalized T-pose ([`HumanoidSchema::normalized`]),
/// where every bone has identity orientation, or the rest pose of a concrete
/// avatar rig ([`HumanoidSchema::from_skeleton`]). In the latter case the
/// retargeted rotations are directly the local rotations to write into that
/// avatar's bone nodes.
#[derive(Debug, Clone)]
pub struct HumanoidSchema {
    bones: FxHashMap<HumanoidBone, SchemaBone>,
}

impl HumanoidSchema {
    /// Builds a schema from every bone of `skeleton` that carries a humanoid id.
    ///
    /// Fails with [`RetargetError::MissingCanonicalRoot`] when no bone is bound
    /// to `hips`.
    pub fn from_skeleton(skeleton: &Skeleton) -> Result<Self, RetargetError> {
        let rotations = skeleton.world_rest_rotations();
        let transforms = skeleton.world_rest_transforms();

        let mut bones = FxHashMap::default();
        for index in skeleton.depth_first() {
            let bone = &skeleton.bones()[index];
            let Some(humanoid) = bone.humanoid else {
                continue;
            };
            let parent_world_rotation = bone.parent.map_or(Quat::IDENTITY, |p| rotations[p]);
            bones.entry(humanoid).or_insert(SchemaBone {
                world_rotation: rotations[index],
                parent_world_rotation,
                world_position: transforms[index].translation.into(),
            });
        }

        if !bones.contains_key(&HumanoidBone::ROOT) {
            return Err(RetargetError::MissingCanonicalRoot);
        }
        Ok(Self { bones })
    }

    /// The built-in normalized T-pose: identity orientation everywhere,
    /// +Y up, facing +Z, character's left on +X, hips 0.95 m above ground.
    #[must_use]
    pub fn normalized() -> Self {
        match Self::from_skeleton(&canonical_skeleton()) {
            Ok(schema) => schema,
            Err(err) => unreachable!("canonical skeleton binds hips: {err}"),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, bone: HumanoidBone) -> Option<&SchemaBone> {
        self.bones.get(&bone)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, bone: HumanoidBone) -> bool {
        self.bones.contains_key(&bone)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanoidBone, &SchemaBone)> {
        self.bones.iter().map(|(bone, data)| (*bone, data))
    }

    /// Rest height of the hips above the rig origin.
    #[must_use]
    pub fn hips_height(&self) -> f32 {
        self.get(HumanoidBone::Hips)
            .map_or(0.0, |hips| hips.world_position.y)
    }

    /// Direction from the right hip joint to the left one, when both legs are
    /// present. Used to align facing between rigs.
    #[must_use]
    pub fn lateral_axis(&self) -> Option<Vec3> {
        let left = self.get(HumanoidBone::LeftUpperLeg)?;
        let right = self.get(HumanoidBone::RightUpperLeg)?;
        Some(left.world_position - right.world_position)
    }

    /// Required VRM bones the rig lacks. Motion still plays; those bones
    /// stay at rest.
    pub fn missing_required(&self) -> impl Iterator<Item = HumanoidBone> + '_ {
        HumanoidBone::ALL
            .iter()
            .copied()
            .filter(|&bone| bone.is_required() && !self.contains(bone))
    }
}

impl Default for HumanoidSchema {
    fn default() -> Self {
        Self::normalized()
    }
}

/// A skeleton laid out in the normalized T-pose, one bone per canonical id,
/// named by [`HumanoidBone::as_str`].
#[must_use]
pub fn canonical_skeleton() -> Skeleton {
    canonical_skeleton_scaled(1.0)
}

/// [`canonical_skeleton`] with every offset multiplied by `scale`, e.g. `100.0`
/// for a centimeter rig.
#[must_use]
pub fn canonical_skeleton_scaled(scale: f32) -> Skeleton {
    let all = HumanoidBone::ALL;
    let bones = all
        .iter()
        .map(|&bone| {
            let parent = bone
                .parent()
                .and_then(|p| all.iter().position(|candidate| *candidate == p));
            Bone::new(
                bone.as_str(),
                parent,
                RestPose::from_translation(canonical_offset(bone) * scale),
            )
            .with_humanoid(bone)
        })
        .collect();

    match Skeleton::new("canonical", bones) {
        Ok(skeleton) => skeleton,
        Err(err) => unreachable!("canonical humanoid hierarchy is valid: {err}"),
    }
}

/// Local rest offset of a canonical bone from its canonical parent, in meters.
fn canonical_offset(bone: HumanoidBone) -> Vec3 {
    use HumanoidBone::*;

    let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    match bone {
        Hips => v(0.0, 0.95, 0.0),
        Spine => v(0.0, 0.10, 0.0),
        Chest => v(0.0, 0.12, 0.0),
        UpperChest => v(0.0, 0.12, 0.0),
        Neck => v(0.0, 0.14, 0.0),
        Head => v(0.0, 0.10, 0.0),
        LeftEye => v(0.03, 0.07, 0.08),
        RightEye => v(-0.03, 0.07, 0.08),
        Jaw => v(0.0, -0.02, 0.05),

        LeftUpperLeg => v(0.09, -0.05, 0.0),
        LeftLowerLeg | LeftFoot => v(0.0, -0.42, 0.0),
        LeftToes => v(0.0, -0.06, 0.12),
        RightUpperLeg => v(-0.09, -0.05, 0.0),
        RightLowerLeg | RightFoot => v(0.0, -0.42, 0.0),
        RightToes => v(0.0, -0.06, 0.12),

        LeftShoulder => v(0.03, 0.08, 0.0),
        LeftUpperArm => v(0.10, 0.0, 0.0),
        LeftLowerArm => v(0.26, 0.0, 0.0),
        LeftHand => v(0.24, 0.0, 0.0),
        RightShoulder => v(-0.03, 0.08, 0.0),
        RightUpperArm => v(-0.10, 0.0, 0.0),
        RightLowerArm => v(-0.26, 0.0, 0.0),
        RightHand => v(-0.24, 0.0, 0.0),

        LeftThumbMetacarpal => v(0.02, -0.01, 0.02),
        LeftThumbProximal => v(0.03, 0.0, 0.015),
        LeftThumbDistal => v(0.03, 0.0, 0.01),
        LeftIndexProximal => v(0.08, 0.0, 0.025),
        LeftIndexIntermediate => v(0.035, 0.0, 0.0),
        LeftIndexDistal => v(0.025, 0.0, 0.0),
        LeftMiddleProximal => v(0.085, 0.0, 0.005),
        LeftMiddleIntermediate => v(0.04, 0.0, 0.0),
        LeftMiddleDistal => v(0.028, 0.0, 0.0),
        LeftRingProximal => v(0.08, 0.0, -0.015),
        LeftRingIntermediate => v(0.035, 0.0, 0.0),
        LeftRingDistal => v(0.025, 0.0, 0.0),
        LeftLittleProximal => v(0.075, 0.0, -0.035),
        LeftLittleIntermediate => v(0.028, 0.0, 0.0),
        LeftLittleDistal => v(0.02, 0.0, 0.0),

        RightThumbMetacarpal => v(-0.02, -0.01, 0.02),
        RightThumbProximal => v(-0.03, 0.0, 0.015),
        RightThumbDistal => v(-0.03, 0.0, 0.01),
        RightIndexProximal => v(-0.08, 0.0, 0.025),
        RightIndexIntermediate => v(-0.035, 0.0, 0.0),
        RightIndexDistal => v(-0.025, 0.0, 0.0),
        RightMiddleProximal => v(-0.085, 0.0, 0.005),
        RightMiddleIntermediate => v(-0.04, 0.0, 0.0),
        RightMiddleDistal => v(-0.028, 0.0, 0.0),
        RightRingProximal => v(-0.08, 0.0, -0.015),
        RightRingIntermediate => v(-0.035, 0.0, 0.0),
        RightRingDistal => v(-0.025, 0.0, 0.0),
        RightLittleProximal => v(-0.075, 0.0, -0.035),
        RightLittleIntermediate => v(-0.028, 0.0, 0.0),
        RightLittleDistal => v(-0.02, 0.0, 0.0),
    }
}
