pub mod bvh;
#[cfg(feature = "gltf")]
pub mod gltf;

pub use bvh::BvhParser;
#[cfg(feature = "gltf")]
pub use gltf::{GltfAvatarParser, GltfMotionParser};

/// Makes a node name safe to use as an animation binding key: whitespace
/// becomes `_` and the reserved characters `[ ] . : /` are removed, so
/// `mixamorig:Hips` becomes `mixamorigHips`.
#[must_use]
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | ':' | '/'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_node_name("mixamorig:Hips"), "mixamorigHips");
        assert_eq!(sanitize_node_name("Left Arm.001"), "Left_Arm001");
        assert_eq!(sanitize_node_name("hips"), "hips");
    }
}
