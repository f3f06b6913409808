use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::errors::RetargetError;
use crate::humanoid::{HumanoidBone, HumanoidSchema};
use crate::retarget::mapper::BoneNameMapper;
use crate::scene::Skeleton;

/// Corrections closer than this to identity are snapped to exact identity.
const IDENTITY_EPSILON: f32 = 1e-6;

/// Source hips lower than this are treated as "no usable height".
const MIN_HIPS_HEIGHT: f32 = 1e-6;

/// Rest-pose difference between a source bone and its humanoid counterpart.
///
/// A source local rotation `q` becomes `pre * q * post` on the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneCorrection {
    pub pre: Quat,
    pub post: Quat,
}

impl BoneCorrection {
    pub const IDENTITY: Self = Self {
        pre: Quat::IDENTITY,
        post: Quat::IDENTITY,
    };

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.pre == Quat::IDENTITY && self.post == Quat::IDENTITY
    }

    /// Maps a source local rotation to the target. Identity sides are skipped
    /// so an identity correction returns `q` untouched.
    #[inline]
    #[must_use]
    pub fn apply(&self, q: Quat) -> Quat {
        let mut out = q;
        if self.pre != Quat::IDENTITY {
            out = self.pre * out;
        }
        if self.post != Quat::IDENTITY {
            out *= self.post;
        }
        out
    }

    /// Maps a source local translation into the target parent's frame.
    #[inline]
    #[must_use]
    pub fn apply_translation(&self, p: Vec3) -> Vec3 {
        if self.pre == Quat::IDENTITY {
            p
        } else {
            self.pre * p
        }
    }
}

/// One source bone bound to a humanoid bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBone {
    /// Index of the bone in the source skeleton.
    pub source_index: usize,
    pub humanoid: HumanoidBone,
    pub correction: BoneCorrection,
}

/// Source-bone to humanoid-bone binding, with per-bone rest-pose corrections.
///
/// Immutable once built. Valid only for the (source skeleton, schema) pair it
/// was built from; rebuild it whenever the target avatar changes.
#[derive(Debug, Clone)]
pub struct RetargetBinding {
    source_name: String,
    /// Bound bones in source depth-first order.
    bones: Vec<(String, BoundBone)>,
    lookup: FxHashMap<String, usize>,
    unmapped: Vec<String>,
    unit_scale: f32,
    facing: Quat,
}

impl RetargetBinding {
    /// Binds `source` to `schema` through `mapper`, aligning facing between
    /// the two rigs.
    pub fn build<M>(
        source: &Skeleton,
        schema: &HumanoidSchema,
        mapper: &M,
    ) -> Result<Self, RetargetError>
    where
        M: BoneNameMapper + ?Sized,
    {
        Self::build_with(source, schema, mapper, true)
    }

    /// Like [`Self::build`], with facing alignment optional.
    ///
    /// Walks the source skeleton depth-first. Unmapped bones are skipped but
    /// their descendants are still visited. If two source bones map to the
    /// same humanoid bone, the first one in traversal order wins.
    pub fn build_with<M>(
        source: &Skeleton,
        schema: &HumanoidSchema,
        mapper: &M,
        align_facing: bool,
    ) -> Result<Self, RetargetError>
    where
        M: BoneNameMapper + ?Sized,
    {
        let world_rotations = source.world_rest_rotations();
        let world_transforms = source.world_rest_transforms();

        let facing = if align_facing {
            facing_alignment(source, &world_transforms, schema, mapper)
        } else {
            Quat::IDENTITY
        };

        let mut bones = Vec::new();
        let mut lookup = FxHashMap::default();
        let mut unmapped = Vec::new();
        let mut bound: FxHashMap<HumanoidBone, usize> = FxHashMap::default();

        for index in source.depth_first() {
            let bone = &source.bones()[index];

            let Some(humanoid) = mapper.map(&bone.name) else {
                log::trace!("Bone '{}' has no humanoid mapping, skipped", bone.name);
                unmapped.push(bone.name.clone());
                continue;
            };
            let Some(target) = schema.get(humanoid) else {
                log::debug!(
                    "Bone '{}' maps to {humanoid}, which the target rig lacks",
                    bone.name
                );
                continue;
            };
            if let Some(&first) = bound.get(&humanoid) {
                log::warn!(
                    "Bone '{}' maps to {humanoid}, already bound to '{}'; skipped",
                    bone.name,
                    source.bones()[first].name
                );
                continue;
            }
            if lookup.contains_key(&bone.name) {
                log::warn!("Duplicate source bone name '{}'; skipped", bone.name);
                continue;
            }

            let s = world_rotations[index];
            let sp = bone.parent.map_or(Quat::IDENTITY, |p| world_rotations[p]);
            let correction = BoneCorrection {
                pre: snap_identity(target.parent_world_rotation.inverse() * facing * sp),
                post: snap_identity(s.inverse() * facing.inverse() * target.world_rotation),
            };
            log::trace!("Bound '{}' -> {humanoid}: {correction:?}", bone.name);

            bound.insert(humanoid, index);
            lookup.insert(bone.name.clone(), bones.len());
            bones.push((
                bone.name.clone(),
                BoundBone {
                    source_index: index,
                    humanoid,
                    correction,
                },
            ));
        }

        if bones.is_empty() {
            return Err(RetargetError::NoMappableBones);
        }

        let unit_scale = unit_scale(source, &world_transforms, schema, mapper);

        log::debug!(
            "Retarget binding for '{}': {} bound, {} unmapped, unit scale {unit_scale}",
            source.name,
            bones.len(),
            unmapped.len()
        );

        Ok(Self {
            source_name: source.name.clone(),
            bones,
            lookup,
            unmapped,
            unit_scale,
            facing,
        })
    }

    /// Name of the source skeleton this binding was built from.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    #[must_use]
    pub fn get(&self, source_name: &str) -> Option<&BoundBone> {
        self.lookup.get(source_name).map(|&i| &self.bones[i].1)
    }

    #[must_use]
    pub fn humanoid_for(&self, source_name: &str) -> Option<HumanoidBone> {
        self.get(source_name).map(|b| b.humanoid)
    }

    /// The source bone bound to `humanoid`, if any.
    #[must_use]
    pub fn source_for(&self, humanoid: HumanoidBone) -> Option<&str> {
        self.bones
            .iter()
            .find(|(_, b)| b.humanoid == humanoid)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundBone)> {
        self.bones.iter().map(|(name, b)| (name.as_str(), b))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Source bones the mapper did not recognize.
    #[must_use]
    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    /// Factor applied to root translations (target hips height over source
    /// hips height).
    #[must_use]
    pub fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    /// Yaw applied to align the source rig's facing with the target's.
    #[must_use]
    pub fn facing(&self) -> Quat {
        self.facing
    }
}

fn snap_identity(q: Quat) -> Quat {
    if q.abs_diff_eq(Quat::IDENTITY, IDENTITY_EPSILON)
        || q.abs_diff_eq(-Quat::IDENTITY, IDENTITY_EPSILON)
    {
        Quat::IDENTITY
    } else {
        q
    }
}

/// Yaw about +Y taking the source lateral axis (right hip to left hip) onto
/// the target's. Identity when either rig lacks both upper legs.
fn facing_alignment<M>(
    source: &Skeleton,
    world: &[glam::Affine3A],
    schema: &HumanoidSchema,
    mapper: &M,
) -> Quat
where
    M: BoneNameMapper + ?Sized,
{
    let find = |wanted: HumanoidBone| {
        source
            .depth_first()
            .find(|&i| mapper.map(&source.bones()[i].name) == Some(wanted))
            .map(|i| Vec3::from(world[i].translation))
    };

    let (Some(left), Some(right), Some(target)) = (
        find(HumanoidBone::LeftUpperLeg),
        find(HumanoidBone::RightUpperLeg),
        schema.lateral_axis(),
    ) else {
        return Quat::IDENTITY;
    };
    let src = left - right;

    let (Some(src_yaw), Some(dst_yaw)) = (planar_yaw(src), planar_yaw(target)) else {
        return Quat::IDENTITY;
    };

    snap_identity(Quat::from_rotation_y(dst_yaw - src_yaw))
}

/// Angle such that `Quat::from_rotation_y(angle) * X` points along `v`
/// projected onto the XZ plane.
fn planar_yaw(v: Vec3) -> Option<f32> {
    let planar = Vec3::new(v.x, 0.0, v.z);
    if planar.length_squared() < 1e-12 {
        return None;
    }
    Some((-planar.z).atan2(planar.x))
}

fn unit_scale<M>(
    source: &Skeleton,
    world: &[glam::Affine3A],
    schema: &HumanoidSchema,
    mapper: &M,
) -> f32
where
    M: BoneNameMapper + ?Sized,
{
    let root = source.root();
    if mapper.map(&source.bones()[root].name) != Some(HumanoidBone::ROOT) {
        return 1.0;
    }

    let source_height = world[root].translation.y;
    let target_height = schema.hips_height();
    if source_height.abs() < MIN_HIPS_HEIGHT || target_height.abs() < MIN_HIPS_HEIGHT {
        log::warn!(
            "Skeleton '{}': hips height too small to derive a unit scale, using 1.0",
            source.name
        );
        return 1.0;
    }
    target_height / source_height
}
