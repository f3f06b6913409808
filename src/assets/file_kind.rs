use std::path::Path;

use crate::errors::{Error, Result};

/// What a dropped or opened file is loaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `.vrm`, `.glb`, `.gltf`: replaces the avatar.
    Avatar,
    /// `.bvh`: replaces the motion.
    Motion,
}

impl FileKind {
    /// Classifies a file by extension (ASCII case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "vrm" | "glb" | "gltf" => Ok(FileKind::Avatar),
            "bvh" => Ok(FileKind::Motion),
            _ => Err(Error::UnsupportedFileType(ext.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_extension() {
        assert_eq!(FileKind::from_path("a/model.vrm").ok(), Some(FileKind::Avatar));
        assert_eq!(FileKind::from_path("MODEL.GLB").ok(), Some(FileKind::Avatar));
        assert_eq!(FileKind::from_path("walk.bvh").ok(), Some(FileKind::Motion));
        assert!(matches!(
            FileKind::from_path("notes.txt"),
            Err(Error::UnsupportedFileType(ext)) if ext == "txt"
        ));
        assert!(matches!(
            FileKind::from_path("README"),
            Err(Error::UnsupportedFileType(_))
        ));
    }
}
