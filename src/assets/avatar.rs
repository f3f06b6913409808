use uuid::Uuid;

use crate::animation::SourceClip;
use crate::errors::{ParseError, RetargetError};
use crate::humanoid::{HumanoidBone, HumanoidRig, HumanoidSchema};
use crate::retarget::{BoneNameMapper, RigConvention};
use crate::scene::{SceneGraph, Skeleton};

/// Where an avatar's humanoid bone assignments came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintSource {
    /// `VRMC_vrm` extension (VRM 1.0).
    Vrm1,
    /// `VRM` extension (VRM 0.x).
    Vrm0,
    /// Guessed from node names.
    Convention(RigConvention),
    #[default]
    None,
}

/// Humanoid bone to node name assignments reported by a parser.
#[derive(Debug, Clone, Default)]
pub struct BindingHints {
    pub bones: Vec<(HumanoidBone, String)>,
    pub source: HintSource,
}

impl BindingHints {
    /// Hints derived from node names under a naming convention.
    #[must_use]
    pub fn from_convention(skeleton: &Skeleton, convention: RigConvention) -> Self {
        let bones = skeleton
            .bones()
            .iter()
            .filter_map(|b| convention.map(&b.name).map(|h| (h, b.name.clone())))
            .collect();
        Self {
            bones,
            source: HintSource::Convention(convention),
        }
    }

    /// Hints from whichever built-in convention recognizes the skeleton best.
    #[must_use]
    pub fn detect(skeleton: &Skeleton) -> Self {
        RigConvention::detect(skeleton)
            .map(|c| Self::from_convention(skeleton, c))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanoidBone, &str)> {
        self.bones.iter().map(|(bone, name)| (*bone, name.as_str()))
    }
}

/// Counts of decoded render resources, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetResources {
    pub meshes: usize,
    pub materials: usize,
    pub textures: usize,
}

/// Output of an [`AssetParser`].
#[derive(Debug, Clone)]
pub struct ParsedAvatar {
    pub name: String,
    pub scene: SceneGraph,
    pub skeleton: Skeleton,
    pub hints: BindingHints,
    pub resources: AssetResources,
}

/// Output of a [`MotionParser`].
#[derive(Debug, Clone)]
pub struct ParsedMotion {
    pub skeleton: Skeleton,
    pub clip: SourceClip,
}

/// Decodes avatar files (VRM, glTF).
pub trait AssetParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedAvatar, ParseError>;
}

/// Decodes motion files (BVH, animated glTF).
pub trait MotionParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedMotion, ParseError>;
}

/// A loaded avatar: live scene graph, skeleton and humanoid rig.
#[derive(Debug, Clone)]
pub struct AvatarAsset {
    pub id: Uuid,
    pub name: String,
    pub scene: SceneGraph,
    pub skeleton: Skeleton,
    pub rig: HumanoidRig,
    pub resources: AssetResources,
    hint_source: HintSource,
    schema: Result<HumanoidSchema, RetargetError>,
}

impl AvatarAsset {
    /// Applies the parser's humanoid hints to the skeleton and resolves the
    /// rig against the scene graph.
    ///
    /// An avatar without a `hips` assignment still loads; it just cannot play
    /// humanoid motion (see [`Self::schema`]).
    #[must_use]
    pub fn from_parsed(parsed: ParsedAvatar) -> Self {
        let ParsedAvatar {
            name,
            mut scene,
            mut skeleton,
            hints,
            resources,
        } = parsed;

        let bound = skeleton.bind_humanoid(hints.iter());
        scene.update_world_matrices();
        let rig = HumanoidRig::from_names(&scene, hints.iter());
        let schema = HumanoidSchema::from_skeleton(&skeleton);

        match &schema {
            Ok(schema) => {
                log::info!(
                    "Avatar '{name}': {bound} humanoid bones ({:?}), {} in schema, {} in rig",
                    hints.source,
                    schema.len(),
                    rig.len()
                );
                let missing: Vec<&str> = schema.missing_required().map(HumanoidBone::as_str).collect();
                if !missing.is_empty() {
                    log::warn!("Avatar '{name}' lacks required bones: {}", missing.join(", "));
                }
            }
            Err(err) => log::warn!("Avatar '{name}' is not a usable humanoid: {err}"),
        }

        Self {
            id: Uuid::new_v4(),
            name,
            scene,
            skeleton,
            rig,
            resources,
            hint_source: hints.source,
            schema,
        }
    }

    /// The avatar's own rest pose as humanoid schema, or why there is none.
    pub fn schema(&self) -> Result<&HumanoidSchema, RetargetError> {
        self.schema.as_ref().map_err(Clone::clone)
    }

    #[must_use]
    pub fn is_humanoid(&self) -> bool {
        self.schema.is_ok()
    }

    #[must_use]
    pub fn hint_source(&self) -> HintSource {
        self.hint_source
    }
}
