use glam::{Affine3A, Quat, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::errors::SkeletonError;
use crate::humanoid::HumanoidBone;

/// Local rest-pose transform of a bone, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl RestPose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            ..Self::IDENTITY
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for RestPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A single joint of a [`Skeleton`].
#[derive(Debug, Clone)]
pub struct Bone {
    /// Source-specific name (`mixamorigHips`, `LeftUpLeg`, …).
    pub name: String,
    /// Index of the parent bone in the owning skeleton. `None` for the root.
    pub parent: Option<usize>,
    /// Local rest transform.
    pub rest: RestPose,
    /// Canonical identity of this bone, when the rig declares one.
    pub humanoid: Option<HumanoidBone>,
}

impl Bone {
    #[must_use]
    pub fn new(name: impl Into<String>, parent: Option<usize>, rest: RestPose) -> Self {
        Self {
            name: name.into(),
            parent,
            rest,
            humanoid: None,
        }
    }

    #[must_use]
    pub fn with_humanoid(mut self, bone: HumanoidBone) -> Self {
        self.humanoid = Some(bone);
        self
    }
}

/// Validated bone tree.
///
/// # Invariants
///
/// - exactly one root bone
/// - every parent index refers to a bone of the same skeleton
/// - no cycles (every bone is reachable from the root)
///
/// Bones are stored in a flat `Vec` and reference their parent by index; the
/// skeleton owns every bone. Children lists and the name lookup are derived
/// once at construction.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub id: Uuid,
    pub name: String,

    bones: Vec<Bone>,
    root: usize,
    children: Vec<SmallVec<[usize; 4]>>,
    lookup: FxHashMap<String, usize>,
}

impl Skeleton {
    pub fn new(name: &str, bones: Vec<Bone>) -> Result<Self, SkeletonError> {
        if bones.is_empty() {
            return Err(SkeletonError::Empty);
        }

        let mut root = None;
        let mut children: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); bones.len()];

        for (index, bone) in bones.iter().enumerate() {
            match bone.parent {
                None => {
                    if let Some(first) = root {
                        let first: &Bone = &bones[first];
                        return Err(SkeletonError::MultipleRoots {
                            first: first.name.clone(),
                            second: bone.name.clone(),
                        });
                    }
                    root = Some(index);
                }
                Some(parent) if parent == index => {
                    return Err(SkeletonError::Cycle(bone.name.clone()));
                }
                Some(parent) if parent >= bones.len() => {
                    return Err(SkeletonError::MissingParent {
                        bone: bone.name.clone(),
                        parent,
                    });
                }
                Some(parent) => children[parent].push(index),
            }
        }

        let root = root.ok_or(SkeletonError::NoRoot)?;

        // With a single root and valid parent links, anything the root cannot
        // reach sits on a cycle.
        let mut visited = vec![false; bones.len()];
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            visited[index] = true;
            stack.extend(children[index].iter().copied());
        }
        if let Some(orphan) = visited.iter().position(|seen| !seen) {
            return Err(SkeletonError::Cycle(bones[orphan].name.clone()));
        }

        // Duplicate names resolve to the first occurrence.
        let mut lookup = FxHashMap::default();
        for (index, bone) in bones.iter().enumerate() {
            if lookup.contains_key(&bone.name) {
                log::warn!("Skeleton '{name}': duplicate bone name '{}'", bone.name);
            } else {
                lookup.insert(bone.name.clone(), index);
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bones,
            root,
            children,
            lookup,
        })
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> usize {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn root_bone(&self) -> &Bone {
        &self.bones[self.root]
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
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

    #[inline]
    #[must_use]
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map_or(&[], |c| c.as_slice())
    }

    /// Finds a bone by exact name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Finds the bone bound to a canonical humanoid bone.
    #[must_use]
    pub fn find_humanoid(&self, bone: HumanoidBone) -> Option<usize> {
        self.bones.iter().position(|b| b.humanoid == Some(bone))
    }

    /// Binds canonical ids to bones by name. Names not present are ignored.
    /// Returns the number of bones bound.
    pub fn bind_humanoid<'a>(
        &mut self,
        hints: impl IntoIterator<Item = (HumanoidBone, &'a str)>,
    ) -> usize {
        let mut bound = 0;
        for (humanoid, name) in hints {
            match self.lookup.get(name) {
                Some(&index) => {
                    self.bones[index].humanoid = Some(humanoid);
                    bound += 1;
                }
                None => log::debug!(
                    "Skeleton '{}': humanoid hint {humanoid} names missing bone '{name}'",
                    self.name
                ),
            }
        }
        bound
    }

    /// Pre-order depth-first traversal from the root.
    #[must_use]
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            skeleton: self,
            stack: vec![self.root],
        }
    }

    /// Rest transforms of every bone in skeleton space, indexed like [`Self::bones`].
    #[must_use]
    pub fn world_rest_transforms(&self) -> Vec<Affine3A> {
        let mut world = vec![Affine3A::IDENTITY; self.bones.len()];
        for index in self.depth_first() {
            let bone = &self.bones[index];
            let local = bone.rest.to_affine();
            world[index] = match bone.parent {
                Some(parent) => world[parent] * local,
                None => local,
            };
        }
        world
    }

    /// Rest orientations of every bone in skeleton space.
    ///
    /// Composed from the local rotations only, so non-uniform scale never
    /// leaks into the orientation.
    #[must_use]
    pub fn world_rest_rotations(&self) -> Vec<Quat> {
        let mut world = vec![Quat::IDENTITY; self.bones.len()];
        for index in self.depth_first() {
            let bone = &self.bones[index];
            world[index] = match bone.parent {
                Some(parent) => world[parent] * bone.rest.rotation,
                None => bone.rest.rotation,
            };
        }
        world
    }
}

/// Iterator returned by [`Skeleton::depth_first`].
pub struct DepthFirst<'a> {
    skeleton: &'a Skeleton,
    stack: Vec<usize>,
}

impl Iterator for DepthFirst<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.stack.pop()?;
        // Push in reverse so children come out in declaration order.
        self.stack
            .extend(self.skeleton.children(index).iter().rev().copied());
        Some(index)
    }
}
