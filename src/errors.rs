//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`Error`] wraps the focused error enums of each
//! subsystem:
//! - [`ParseError`]: malformed avatar or motion files
//! - [`RetargetError`]: a source skeleton that cannot drive the current avatar
//! - [`SkeletonError`] / [`ClipError`]: structural invariants of the data model
//!
//! None of these are fatal. Every failure is local to one load or retarget
//! attempt and leaves the previously active asset and clip untouched.
//!
//! ```rust,ignore
//! use rigmotion::errors::{Error, Result};
//!
//! fn load() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Loading
    // ========================================================================
    /// An avatar or motion file could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The file extension is not one the viewer knows how to load.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The requested asset handle is not (or no longer) registered.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// No parser is registered for a recognized file kind.
    #[error("No parser registered for {0}")]
    ParserMissing(&'static str),

    // ========================================================================
    // Retargeting
    // ========================================================================
    /// The motion cannot be bound to the current avatar.
    #[error("Retarget error: {0}")]
    Retarget(#[from] RetargetError),

    // ========================================================================
    // Data model
    // ========================================================================
    /// A skeleton violated its structural invariants.
    #[error("Skeleton error: {0}")]
    Skeleton(#[from] SkeletonError),

    /// An animation clip violated its structural invariants.
    #[error("Clip error: {0}")]
    Clip(#[from] ClipError),

    // ========================================================================
    // I/O
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be decoded.
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

/// Malformed avatar or motion input.
#[derive(Error, Debug)]
pub enum ParseError {
    /// BVH syntax or semantic error at a given (1-based) line.
    #[error("BVH line {line}: {message}")]
    Bvh { line: usize, message: String },

    /// glTF container or JSON error.
    #[error("glTF: {0}")]
    Gltf(String),

    /// The file parsed but holds no data we can use.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The file describes an invalid bone hierarchy.
    #[error("Invalid skeleton: {0}")]
    InvalidSkeleton(#[from] SkeletonError),

    /// The file describes an invalid animation.
    #[error("Invalid clip: {0}")]
    InvalidClip(#[from] ClipError),
}

/// Failure to bind a source skeleton to the humanoid schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetargetError {
    /// Not a single source bone maps onto a humanoid bone of the target.
    #[error("No source bone maps onto the humanoid skeleton")]
    NoMappableBones,

    /// The target rig has no `hips` bone and cannot anchor a humanoid schema.
    #[error("Target rig has no canonical root (hips)")]
    MissingCanonicalRoot,
}

/// Structural problems with a [`Skeleton`](crate::scene::Skeleton).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkeletonError {
    #[error("Skeleton has no bones")]
    Empty,

    #[error("Skeleton has no root bone")]
    NoRoot,

    #[error("Skeleton has multiple roots: {first} and {second}")]
    MultipleRoots { first: String, second: String },

    #[error("Bone {bone} refers to missing parent index {parent}")]
    MissingParent { bone: String, parent: usize },

    #[error("Bone {0} is part of a cycle")]
    Cycle(String),
}

/// Structural problems with an [`AnimationClip`](crate::animation::AnimationClip).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipError {
    #[error("Track {track}: keyframe times not strictly increasing at index {index}")]
    NonIncreasingTimes { track: String, index: usize },

    #[error("Track {track}: expected {expected} values, found {found}")]
    ValueCountMismatch {
        track: String,
        expected: usize,
        found: usize,
    },

    #[error("Track {0} has no keyframes")]
    EmptyTrack(String),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
