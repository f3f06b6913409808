//! glTF / VRM loading.
//!
//! [`GltfAvatarParser`] turns a `.vrm`/`.glb`/`.gltf` into a scene graph, a
//! skeleton and humanoid hints. Hints come from the `VRMC_vrm` (VRM 1.0) or
//! `VRM` (VRM 0.x) extension; plain glTF falls back to recognizing a naming
//! convention. Mesh and material decoding belong to the render backend; only
//! their counts are reported here.
//!
//! [`GltfMotionParser`] reads the first animation of a glTF file as a source
//! clip.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;

use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, Track};
use crate::assets::avatar::{
    AssetParser, AssetResources, BindingHints, HintSource, MotionParser, ParsedAvatar,
    ParsedMotion,
};
use crate::assets::loaders::sanitize_node_name;
use crate::errors::ParseError;
use crate::humanoid::HumanoidBone;
use crate::retarget::{BoneNameMapper, RigConvention};
use crate::scene::{Bone, Node, NodeHandle, RestPose, SceneGraph, Skeleton, Transform};

// ============================================================================
// Node tree
// ============================================================================

/// Flattened view of the glTF node hierarchy of the default scene.
struct NodeTree {
    /// Sanitized, unique names indexed by glTF node index.
    names: Vec<String>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    trs: Vec<(Vec3, Quat, Vec3)>,
    roots: Vec<usize>,
}

impl NodeTree {
    fn from_document(document: &gltf::Document) -> Self {
        let count = document.nodes().len();
        let mut parents = vec![None; count];
        let mut children = vec![Vec::new(); count];
        let mut trs = Vec::with_capacity(count);
        let mut names = Vec::with_capacity(count);
        let mut used = FxHashSet::default();

        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
                children[node.index()].push(child.index());
            }

            let (t, r, s) = node.transform().decomposed();
            trs.push((Vec3::from_array(t), Quat::from_array(r), Vec3::from_array(s)));

            let mut name = node.name().map_or_else(
                || format!("Node_{}", node.index()),
                sanitize_node_name,
            );
            if !used.insert(name.clone()) {
                log::warn!("glTF: duplicate node name '{name}', renaming");
                name = format!("{name}_{}", node.index());
                used.insert(name.clone());
            }
            names.push(name);
        }

        let roots = match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => scene.nodes().map(|n| n.index()).collect(),
            None => (0..count).filter(|&i| parents[i].is_none()).collect(),
        };

        Self {
            names,
            parents,
            children,
            trs,
            roots,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn root_of(&self, mut index: usize) -> usize {
        // Bounded walk; a malformed file could contain a parent cycle.
        for _ in 0..self.parents.len() {
            match self.parents[index] {
                Some(parent) => index = parent,
                None => break,
            }
        }
        index
    }

    /// Pre-order node indices of the subtree under `root`.
    fn subtree(&self, root: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.names.len()];
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            order.push(index);
            stack.extend(self.children[index].iter().rev().copied());
        }
        order
    }

    /// Turns every scene root by 180 degrees about +Y.
    fn rotate_roots_half_turn(&mut self) {
        let half_turn = Quat::from_rotation_y(std::f32::consts::PI);
        for &root in &self.roots {
            let (t, r, _) = &mut self.trs[root];
            *t = half_turn * *t;
            *r = half_turn * *r;
        }
    }

    fn build_scene(&self) -> SceneGraph {
        let mut scene = SceneGraph::new();
        let mut stack: Vec<(usize, Option<NodeHandle>)> =
            self.roots.iter().rev().map(|&r| (r, None)).collect();
        let mut created = vec![false; self.names.len()];

        while let Some((index, parent)) = stack.pop() {
            if std::mem::replace(&mut created[index], true) {
                continue;
            }
            let (t, r, s) = self.trs[index];
            let node = Node::with_name(self.names[index].clone())
                .with_transform(Transform::from_trs(t, r, s));
            let handle = match parent {
                Some(parent) => scene.add_to_parent(node, parent),
                None => scene.add_node(node),
            };
            stack.extend(self.children[index].iter().rev().map(|&c| (c, Some(handle))));
        }
        scene
    }

    fn build_skeleton(&self, root: usize) -> Result<Skeleton, ParseError> {
        let order = self.subtree(root);
        let mut bone_index = FxHashMap::default();
        let mut bones = Vec::with_capacity(order.len());

        for index in order {
            let parent = if index == root {
                None
            } else {
                self.parents[index].and_then(|p| bone_index.get(&p).copied())
            };
            let (translation, rotation, scale) = self.trs[index];
            bone_index.insert(index, bones.len());
            bones.push(Bone::new(
                self.names[index].clone(),
                parent,
                RestPose {
                    translation,
                    rotation,
                    scale,
                },
            ));
        }

        Ok(Skeleton::new(&self.names[root], bones)?)
    }
}

// ============================================================================
// Buffers
// ============================================================================

fn parse_document(bytes: &[u8]) -> Result<gltf::Gltf, ParseError> {
    gltf::Gltf::from_slice_without_validation(bytes).map_err(|e| ParseError::Gltf(e.to_string()))
}

fn load_buffers(gltf: &gltf::Gltf, base_path: Option<&Path>) -> Result<Vec<Vec<u8>>, ParseError> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| ParseError::Gltf("missing GLB binary chunk".into()))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                let Some(base) = base_path else {
                    return Err(ParseError::Gltf(format!(
                        "external buffer '{uri}' needs a base path"
                    )));
                };
                let buffer_path = base.join(uri);
                let data = fs::read(&buffer_path).map_err(|e| {
                    ParseError::Gltf(format!(
                        "failed to read buffer {}: {e}",
                        buffer_path.display()
                    ))
                })?;
                buffer_data.push(data);
            }
        }
    }
    Ok(buffer_data)
}

// ============================================================================
// VRM humanoid extensions
// ============================================================================

/// VRM 0.x thumb names are shifted by one joint relative to VRM 1.0.
fn vrm0_bone(name: &str) -> Option<HumanoidBone> {
    match name {
        "leftThumbProximal" => Some(HumanoidBone::LeftThumbMetacarpal),
        "leftThumbIntermediate" => Some(HumanoidBone::LeftThumbProximal),
        "rightThumbProximal" => Some(HumanoidBone::RightThumbMetacarpal),
        "rightThumbIntermediate" => Some(HumanoidBone::RightThumbProximal),
        other => other.parse().ok(),
    }
}

fn node_name(tree: &NodeTree, value: &Value) -> Option<String> {
    let node = usize::try_from(value.get("node")?.as_u64()?).ok()?;
    tree.names.get(node).cloned()
}

fn vrm1_hints(vrm: &Value, tree: &NodeTree) -> Vec<(HumanoidBone, String)> {
    let Some(bones) = vrm.pointer("/humanoid/humanBones").and_then(Value::as_object) else {
        return Vec::new();
    };
    bones
        .iter()
        .filter_map(|(name, entry)| {
            let Ok(bone) = name.parse::<HumanoidBone>() else {
                log::debug!("VRM: unknown humanoid bone '{name}'");
                return None;
            };
            Some((bone, node_name(tree, entry)?))
        })
        .collect()
}

fn vrm0_hints(vrm: &Value, tree: &NodeTree) -> Vec<(HumanoidBone, String)> {
    let Some(bones) = vrm.pointer("/humanoid/humanBones").and_then(Value::as_array) else {
        return Vec::new();
    };
    bones
        .iter()
        .filter_map(|entry| {
            let name = entry.get("bone")?.as_str()?;
            let Some(bone) = vrm0_bone(name) else {
                log::debug!("VRM0: unknown humanoid bone '{name}'");
                return None;
            };
            Some((bone, node_name(tree, entry)?))
        })
        .collect()
}

fn vrm_title(vrm: &Value, pointer: &str) -> Option<String> {
    vrm.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Avatar parser
// ============================================================================

/// Parses VRM / glTF avatars.
#[derive(Debug, Clone)]
pub struct GltfAvatarParser {
    /// Rotate VRM 0.x avatars, which face -Z, to face +Z like VRM 1.0.
    pub rotate_vrm0: bool,
}

impl GltfAvatarParser {
    #[must_use]
    pub fn new() -> Self {
        Self { rotate_vrm0: true }
    }
}

impl Default for GltfAvatarParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetParser for GltfAvatarParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedAvatar, ParseError> {
        let gltf = parse_document(bytes)?;
        let mut tree = NodeTree::from_document(&gltf);
        if tree.roots.is_empty() {
            return Err(ParseError::InvalidData("glTF scene has no nodes".into()));
        }

        let extensions = gltf.extensions();
        let vrm1 = extensions.and_then(|e| e.get("VRMC_vrm"));
        let vrm0 = extensions.and_then(|e| e.get("VRM"));

        let (hints, name) = if let Some(vrm) = vrm1 {
            let hints = BindingHints {
                bones: vrm1_hints(vrm, &tree),
                source: HintSource::Vrm1,
            };
            (hints, vrm_title(vrm, "/meta/name"))
        } else if let Some(vrm) = vrm0 {
            if self.rotate_vrm0 {
                tree.rotate_roots_half_turn();
            }
            let hints = BindingHints {
                bones: vrm0_hints(vrm, &tree),
                source: HintSource::Vrm0,
            };
            (hints, vrm_title(vrm, "/meta/title"))
        } else {
            (convention_hints(&tree), None)
        };

        let hips_node = hints
            .iter()
            .find(|(bone, _)| *bone == HumanoidBone::ROOT)
            .and_then(|(_, name)| tree.index_of(name));
        let skeleton_root = match hips_node {
            Some(hips) => tree.root_of(hips),
            None => {
                log::warn!("glTF: no hips node, skeleton spans the first scene root");
                tree.roots[0]
            }
        };

        let skeleton = tree.build_skeleton(skeleton_root)?;
        let scene = tree.build_scene();
        let resources = AssetResources {
            meshes: gltf.meshes().len(),
            materials: gltf.materials().len(),
            textures: gltf.textures().len(),
        };

        log::debug!(
            "glTF avatar: {} nodes, {} skeleton bones, {} hints ({:?})",
            scene.len(),
            skeleton.len(),
            hints.bones.len(),
            hints.source
        );

        Ok(ParsedAvatar {
            name: name.unwrap_or_default(),
            scene,
            skeleton,
            hints,
            resources,
        })
    }
}

fn convention_hints(tree: &NodeTree) -> BindingHints {
    let Some(convention) = RigConvention::detect_names(tree.names.iter().map(String::as_str))
    else {
        return BindingHints::default();
    };
    let mut seen = FxHashSet::default();
    let bones = tree
        .names
        .iter()
        .filter_map(|name| convention.map(name).map(|bone| (bone, name.clone())))
        .filter(|(bone, _)| seen.insert(*bone))
        .collect();
    BindingHints {
        bones,
        source: HintSource::Convention(convention),
    }
}

// ============================================================================
// Motion parser
// ============================================================================

/// Reads the first animation of a glTF file as a source clip.
///
/// Rotation and translation channels are kept per node; scale and morph
/// weight channels are ignored.
#[derive(Debug, Clone, Default)]
pub struct GltfMotionParser {
    /// Directory that external `.bin` buffers are resolved against.
    pub base_path: Option<PathBuf>,
}

impl GltfMotionParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: Some(base_path.into()),
        }
    }
}

#[derive(Default)]
struct NodeChannels {
    rotation: Option<KeyframeTrack<Quat>>,
    translation: Option<KeyframeTrack<Vec3>>,
}

impl MotionParser for GltfMotionParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedMotion, ParseError> {
        let gltf = parse_document(bytes)?;
        let buffers = load_buffers(&gltf, self.base_path.as_deref())?;
        let tree = NodeTree::from_document(&gltf);

        let animation = gltf
            .animations()
            .next()
            .ok_or_else(|| ParseError::InvalidData("glTF file has no animation".into()))?;

        let mut per_node: FxHashMap<usize, NodeChannels> = FxHashMap::default();
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let node = channel.target().node().index();

            let times: Vec<f32> = reader
                .read_inputs()
                .ok_or_else(|| ParseError::Gltf("animation sampler without input".into()))?
                .collect();

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
            };

            let entry = per_node.entry(node).or_default();
            match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Rotations(iter)) => {
                    let values = iter.into_f32().map(Quat::from_array).collect();
                    entry.rotation = Some(KeyframeTrack::new(times, values, interpolation));
                }
                Some(gltf::animation::util::ReadOutputs::Translations(iter)) => {
                    let values = iter.map(Vec3::from_array).collect();
                    entry.translation = Some(KeyframeTrack::new(times, values, interpolation));
                }
                Some(_) => {}
                None => {
                    return Err(ParseError::Gltf("animation sampler without output".into()));
                }
            }
        }

        let first_node = per_node
            .keys()
            .copied()
            .min()
            .ok_or_else(|| ParseError::InvalidData("animation has no usable channels".into()))?;
        let skeleton_root = motion_root(&tree).unwrap_or_else(|| tree.root_of(first_node));

        let mut nodes: Vec<_> = per_node.into_iter().collect();
        nodes.sort_unstable_by_key(|(index, _)| *index);
        let tracks = nodes
            .into_iter()
            .filter(|(index, _)| tree.root_of(*index) == skeleton_root)
            .map(|(index, channels)| {
                let rotation = channels
                    .rotation
                    .unwrap_or_else(|| KeyframeTrack::constant(tree.trs[index].1));
                Track {
                    target: tree.names[index].clone(),
                    rotation,
                    translation: channels.translation,
                }
            })
            .collect();

        let name = animation.name().unwrap_or_default();
        let clip = AnimationClip::new(name, tracks);
        clip.validate()?;
        let skeleton = tree.build_skeleton(skeleton_root)?;

        log::debug!(
            "glTF motion '{}': {} tracks over {:.3}s",
            clip.name,
            clip.tracks.len(),
            clip.duration
        );

        Ok(ParsedMotion { skeleton, clip })
    }
}

/// The scene root holding a recognizable hips node, if any.
fn motion_root(tree: &NodeTree) -> Option<usize> {
    let convention = RigConvention::detect_names(tree.names.iter().map(String::as_str))?;
    let hips = tree
        .names
        .iter()
        .position(|n| convention.map(n) == Some(HumanoidBone::ROOT))?;
    Some(tree.root_of(hips))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parser_turns_vrm0_avatars() {
        assert!(GltfAvatarParser::default().rotate_vrm0);
        assert_eq!(
            GltfAvatarParser::default().rotate_vrm0,
            GltfAvatarParser::new().rotate_vrm0
        );
    }

    #[test]
    fn vrm0_thumbs_shift() {
        assert_eq!(
            vrm0_bone("leftThumbProximal"),
            Some(HumanoidBone::LeftThumbMetacarpal)
        );
        assert_eq!(
            vrm0_bone("rightThumbIntermediate"),
            Some(HumanoidBone::RightThumbProximal)
        );
        assert_eq!(vrm0_bone("leftThumbDistal"), Some(HumanoidBone::LeftThumbDistal));
        assert_eq!(vrm0_bone("hips"), Some(HumanoidBone::Hips));
    }
}
