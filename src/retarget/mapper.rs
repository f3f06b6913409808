use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::humanoid::HumanoidBone;
use crate::retarget::conventions::{BVH_RIG_MAP, MIXAMO_RIG_MAP};
use crate::scene::Skeleton;

/// Maps a source rig's bone name to a canonical humanoid bone.
///
/// Lookups are exact string matches. Unknown names yield `None`; a mapper
/// covering only part of the humanoid is perfectly valid.
pub trait BoneNameMapper {
    fn map(&self, source_name: &str) -> Option<HumanoidBone>;

    /// Number of bones of `skeleton` this mapper recognizes.
    fn coverage(&self, skeleton: &Skeleton) -> usize {
        skeleton
            .bones()
            .iter()
            .filter(|bone| self.map(&bone.name).is_some())
            .count()
    }
}

impl<M: BoneNameMapper + ?Sized> BoneNameMapper for &M {
    fn map(&self, source_name: &str) -> Option<HumanoidBone> {
        (**self).map(source_name)
    }
}

impl<M: BoneNameMapper + ?Sized> BoneNameMapper for Box<M> {
    fn map(&self, source_name: &str) -> Option<HumanoidBone> {
        (**self).map(source_name)
    }
}

/// Static tables are searched linearly; they hold a few dozen entries.
impl BoneNameMapper for [(&str, HumanoidBone)] {
    fn map(&self, source_name: &str) -> Option<HumanoidBone> {
        self.iter()
            .find(|(name, _)| *name == source_name)
            .map(|&(_, bone)| bone)
    }
}

/// Mapper over an owned name table, for rigs with their own conventions.
#[derive(Debug, Clone, Default)]
pub struct TableMapper {
    table: FxHashMap<String, HumanoidBone>,
}

impl TableMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapper from `(source name, bone)` pairs. Later pairs for the
    /// same name replace earlier ones.
    #[must_use]
    pub fn from_table(entries: &[(&str, HumanoidBone)]) -> Self {
        let table = entries
            .iter()
            .map(|&(name, bone)| (name.to_string(), bone))
            .collect();
        Self { table }
    }

    pub fn insert(&mut self, name: impl Into<String>, bone: HumanoidBone) {
        self.table.insert(name.into(), bone);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl BoneNameMapper for TableMapper {
    fn map(&self, source_name: &str) -> Option<HumanoidBone> {
        self.table.get(source_name).copied()
    }
}

/// Maps canonical camelCase names (`hips`, `leftUpperArm`, ...) to themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanoidNameMapper;

impl BoneNameMapper for HumanoidNameMapper {
    fn map(&self, source_name: &str) -> Option<HumanoidBone> {
        source_name.parse().ok()
    }
}

/// Built-in naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RigConvention {
    /// `mixamorigHips`, `mixamorigLeftArm`, ...
    Mixamo,
    /// `Hips`, `LeftArm`, ... (Mixamo names without prefix)
    Bvh,
    /// `hips`, `leftUpperArm`, ... (VRM humanoid names)
    Humanoid,
}

impl RigConvention {
    pub const ALL: [RigConvention; 3] = [
        RigConvention::Mixamo,
        RigConvention::Bvh,
        RigConvention::Humanoid,
    ];

    /// The convention that recognizes the most bones of `skeleton`, or `None`
    /// if none recognizes any. Ties go to the earlier entry of [`Self::ALL`].
    #[must_use]
    pub fn detect(skeleton: &Skeleton) -> Option<RigConvention> {
        Self::detect_names(skeleton.bones().iter().map(|b| b.name.as_str()))
    }

    /// [`Self::detect`] over a plain list of bone names.
    pub fn detect_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<RigConvention> {
        let mut counts = [0usize; 3];
        for name in names {
            for (count, convention) in counts.iter_mut().zip(Self::ALL) {
                if convention.map(name).is_some() {
                    *count += 1;
                }
            }
        }
        log::trace!("Convention coverage {:?}: {counts:?}", Self::ALL);

        let mut best: Option<(RigConvention, usize)> = None;
        for (convention, count) in Self::ALL.into_iter().zip(counts) {
            if count > 0 && best.is_none_or(|(_, c)| count > c) {
                best = Some((convention, count));
            }
        }
        best.map(|(convention, _)| convention)
    }
}

impl BoneNameMapper for RigConvention {
    fn map(&self, source_name: &str) -> Option<HumanoidBone> {
        match self {
            RigConvention::Mixamo => MIXAMO_RIG_MAP.map(source_name),
            RigConvention::Bvh => BVH_RIG_MAP.map(source_name),
            RigConvention::Humanoid => HumanoidNameMapper.map(source_name),
        }
    }
}
