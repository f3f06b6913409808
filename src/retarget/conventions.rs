//! Built-in bone naming conventions.
//!
//! Mixamo exports prefix every joint with `mixamorig`; most BVH captures
//! re-exported from Mixamo (and many mocap suites) use the same joint names
//! without the prefix. Both tables are generated from one list so they can
//! never drift apart.

use crate::humanoid::HumanoidBone;

macro_rules! mixamo_tables {
    ($($name:literal => $bone:ident),* $(,)?) => {
        /// Mixamo joint names (`mixamorigHips`, ...) to humanoid bones.
        pub static MIXAMO_RIG_MAP: &[(&str, HumanoidBone)] = &[
            $((concat!("mixamorig", $name), HumanoidBone::$bone),)*
        ];

        /// Unprefixed Mixamo-style joint names (`Hips`, `LeftUpLeg`, ...), as
        /// found in BVH captures.
        pub static BVH_RIG_MAP: &[(&str, HumanoidBone)] = &[
            $(($name, HumanoidBone::$bone),)*
        ];
    };
}

mixamo_tables! {
    "Hips" => Hips,
    "Spine" => Spine,
    "Spine1" => Chest,
    "Spine2" => UpperChest,
    "Neck" => Neck,
    "Head" => Head,
    "LeftShoulder" => LeftShoulder,
    "LeftArm" => LeftUpperArm,
    "LeftForeArm" => LeftLowerArm,
    "LeftHand" => LeftHand,
    "LeftHandThumb1" => LeftThumbMetacarpal,
    "LeftHandThumb2" => LeftThumbProximal,
    "LeftHandThumb3" => LeftThumbDistal,
    "LeftHandIndex1" => LeftIndexProximal,
    "LeftHandIndex2" => LeftIndexIntermediate,
    "LeftHandIndex3" => LeftIndexDistal,
    "LeftHandMiddle1" => LeftMiddleProximal,
    "LeftHandMiddle2" => LeftMiddleIntermediate,
    "LeftHandMiddle3" => LeftMiddleDistal,
    "LeftHandRing1" => LeftRingProximal,
    "LeftHandRing2" => LeftRingIntermediate,
    "LeftHandRing3" => LeftRingDistal,
    "LeftHandPinky1" => LeftLittleProximal,
    "LeftHandPinky2" => LeftLittleIntermediate,
    "LeftHandPinky3" => LeftLittleDistal,
    "RightShoulder" => RightShoulder,
    "RightArm" => RightUpperArm,
    "RightForeArm" => RightLowerArm,
    "RightHand" => RightHand,
    "RightHandPinky1" => RightLittleProximal,
    "RightHandPinky2" => RightLittleIntermediate,
    "RightHandPinky3" => RightLittleDistal,
    "RightHandRing1" => RightRingProximal,
    "RightHandRing2" => RightRingIntermediate,
    "RightHandRing3" => RightRingDistal,
    "RightHandMiddle1" => RightMiddleProximal,
    "RightHandMiddle2" => RightMiddleIntermediate,
    "RightHandMiddle3" => RightMiddleDistal,
    "RightHandIndex1" => RightIndexProximal,
    "RightHandIndex2" => RightIndexIntermediate,
    "RightHandIndex3" => RightIndexDistal,
    "RightHandThumb1" => RightThumbMetacarpal,
    "RightHandThumb2" => RightThumbProximal,
    "RightHandThumb3" => RightThumbDistal,
    "LeftUpLeg" => LeftUpperLeg,
    "LeftLeg" => LeftLowerLeg,
    "LeftFoot" => LeftFoot,
    "LeftToeBase" => LeftToes,
    "RightUpLeg" => RightUpperLeg,
    "RightLeg" => RightLowerLeg,
    "RightFoot" => RightFoot,
    "RightToeBase" => RightToes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_parallel() {
        assert_eq!(MIXAMO_RIG_MAP.len(), 52);
        assert_eq!(MIXAMO_RIG_MAP.len(), BVH_RIG_MAP.len());
        for ((prefixed, a), (plain, b)) in MIXAMO_RIG_MAP.iter().zip(BVH_RIG_MAP) {
            assert_eq!(a, b);
            assert_eq!(prefixed.strip_prefix("mixamorig"), Some(*plain));
        }
    }

    #[test]
    fn each_humanoid_bone_appears_once() {
        let mut seen = std::collections::HashSet::new();
        for (_, bone) in MIXAMO_RIG_MAP {
            assert!(seen.insert(*bone), "{bone} mapped twice");
        }
    }
}
