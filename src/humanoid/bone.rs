use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! humanoid_bones {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Canonical humanoid bone identifier.
        ///
        /// The set matches the VRM 1.0 humanoid: 55 bones covering torso, head,
        /// legs, arms and fingers. Identifiers are stable across assets, so a
        /// clip keyed by `HumanoidBone` plays on any conforming avatar.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub enum HumanoidBone {
            $($variant,)*
        }

        impl HumanoidBone {
            /// Every canonical bone, parents listed before their children.
            pub const ALL: &'static [HumanoidBone] = &[$(HumanoidBone::$variant,)*];

            /// The camelCase name used by VRM and by the canonical name table.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(HumanoidBone::$variant => $name,)*
                }
            }
        }

        impl FromStr for HumanoidBone {
            type Err = UnknownHumanoidBone;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(HumanoidBone::$variant),)*
                    _ => Err(UnknownHumanoidBone(s.to_string())),
                }
            }
        }
    };
}

humanoid_bones! {
    // Torso
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    // Head
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",
    // Legs
    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",
    // Arms
    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",
    // Left fingers
    LeftThumbMetacarpal => "leftThumbMetacarpal",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",
    // Right fingers
    RightThumbMetacarpal => "rightThumbMetacarpal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl HumanoidBone {
    /// The canonical root of the hierarchy.
    pub const ROOT: HumanoidBone = HumanoidBone::Hips;

    /// Parent in the canonical hierarchy. `None` only for [`HumanoidBone::Hips`].
    ///
    /// This is the *nominal* parent. Optional bones (`chest`, `upperChest`,
    /// `neck`, `shoulder`s, …) may be absent from a concrete rig, in which
    /// case the nearest present ancestor takes their place.
    #[must_use]
    pub const fn parent(self) -> Option<HumanoidBone> {
        use HumanoidBone::*;
        Some(match self {
            Hips => return None,
            Spine | LeftUpperLeg | RightUpperLeg => Hips,
            Chest => Spine,
            UpperChest => Chest,
            Neck | LeftShoulder | RightShoulder => UpperChest,
            Head => Neck,
            LeftEye | RightEye | Jaw => Head,

            LeftLowerLeg => LeftUpperLeg,
            LeftFoot => LeftLowerLeg,
            LeftToes => LeftFoot,
            RightLowerLeg => RightUpperLeg,
            RightFoot => RightLowerLeg,
            RightToes => RightFoot,

            LeftUpperArm => LeftShoulder,
            LeftLowerArm => LeftUpperArm,
            LeftHand => LeftLowerArm,
            RightUpperArm => RightShoulder,
            RightLowerArm => RightUpperArm,
            RightHand => RightLowerArm,

            LeftThumbMetacarpal | LeftIndexProximal | LeftMiddleProximal | LeftRingProximal
            | LeftLittleProximal => LeftHand,
            LeftThumbProximal => LeftThumbMetacarpal,
            LeftThumbDistal => LeftThumbProximal,
            LeftIndexIntermediate => LeftIndexProximal,
            LeftIndexDistal => LeftIndexIntermediate,
            LeftMiddleIntermediate => LeftMiddleProximal,
            LeftMiddleDistal => LeftMiddleIntermediate,
            LeftRingIntermediate => LeftRingProximal,
            LeftRingDistal => LeftRingIntermediate,
            LeftLittleIntermediate => LeftLittleProximal,
            LeftLittleDistal => LeftLittleIntermediate,

            RightThumbMetacarpal | RightIndexProximal | RightMiddleProximal
            | RightRingProximal | RightLittleProximal => RightHand,
            RightThumbProximal => RightThumbMetacarpal,
            RightThumbDistal => RightThumbProximal,
            RightIndexIntermediate => RightIndexProximal,
            RightIndexDistal => RightIndexIntermediate,
            RightMiddleIntermediate => RightMiddleProximal,
            RightMiddleDistal => RightMiddleIntermediate,
            RightRingIntermediate => RightRingProximal,
            RightRingDistal => RightRingIntermediate,
            RightLittleIntermediate => RightLittleProximal,
            RightLittleDistal => RightLittleIntermediate,
        })
    }

    /// Bones a VRM 1.0 humanoid must provide.
    #[must_use]
    pub const fn is_required(self) -> bool {
        use HumanoidBone::*;
        matches!(
            self,
            Hips | Spine
                | Head
                | LeftUpperLeg
                | LeftLowerLeg
                | LeftFoot
                | RightUpperLeg
                | RightLowerLeg
                | RightFoot
                | LeftUpperArm
                | LeftLowerArm
                | LeftHand
                | RightUpperArm
                | RightLowerArm
                | RightHand
        )
    }

    /// Iterator over the nominal ancestors, nearest first.
    pub fn ancestors(self) -> impl Iterator<Item = HumanoidBone> {
        std::iter::successors(self.parent(), |bone| bone.parent())
    }
}

impl fmt::Display for HumanoidBone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`HumanoidBone::from_str`] for names outside the canonical set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHumanoidBone(pub String);

impl fmt::Display for UnknownHumanoidBone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown humanoid bone `{}`", self.0)
    }
}

impl std::error::Error for UnknownHumanoidBone {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_bones_are_unique_and_counted() {
        assert_eq!(HumanoidBone::ALL.len(), 55);
        let mut sorted = HumanoidBone::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 55);
    }

    #[test]
    fn parents_precede_children_in_all() {
        for (i, bone) in HumanoidBone::ALL.iter().enumerate() {
            if let Some(parent) = bone.parent() {
                let p = HumanoidBone::ALL.iter().position(|b| *b == parent).unwrap();
                assert!(p < i, "{bone} listed before its parent {parent}");
            }
        }
    }

    #[test]
    fn every_bone_reaches_hips() {
        for bone in HumanoidBone::ALL {
            if *bone != HumanoidBone::Hips {
                assert_eq!(bone.ancestors().last(), Some(HumanoidBone::Hips));
            }
        }
    }

    #[test]
    fn name_round_trip() {
        for bone in HumanoidBone::ALL {
            assert_eq!(bone.as_str().parse::<HumanoidBone>(), Ok(*bone));
        }
        assert!("Hips".parse::<HumanoidBone>().is_err());
    }
}
