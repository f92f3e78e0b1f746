//! Error Types
//!
//! This module defines the error type used throughout the crate.
//!
//! # Overview
//!
//! [`PoseLabError`] covers the failure modes that are fatal to a requested
//! operation:
//! - Missing prerequisites (no rig loaded, rig without a humanoid layer)
//! - Empty results that a caller explicitly asked to reject
//! - Asset parsing and decoding errors
//! - I/O and serialization errors
//!
//! Bone resolution misses are **not** errors. Unknown joint names and bones
//! a rig does not have are skipped silently by every operation.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, PoseLabError>`.
//!
//! ```rust,ignore
//! use poselab::errors::{PoseLabError, Result};
//!
//! fn apply_current(session: &mut PoseSession, pose: &Pose) -> Result<()> {
//!     session.apply_pose(pose)
//! }
//! ```

use thiserror::Error;

/// The main error type for the pose engine.
#[derive(Error, Debug)]
pub enum PoseLabError {
    // ========================================================================
    // Missing Prerequisites
    // ========================================================================
    /// An operation needed a loaded rig but none is loaded.
    #[error("No rig loaded: load an avatar first")]
    RigNotLoaded,

    /// The loaded rig has no humanoid bone layer.
    #[error("Rig '{0}' has no humanoid bone mapping")]
    HumanoidMissing(String),

    // ========================================================================
    // Empty Results
    // ========================================================================
    /// Sampling produced no bone rotations.
    #[error("Motion did not contain pose data")]
    EmptyPose,

    /// Source motion carried no animation clips.
    #[error("Motion '{0}' contains no animation clips")]
    NoAnimation(String),

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// A pose identifier outside the closed catalog.
    #[error("Unknown pose identifier: {0}")]
    UnknownPoseId(String),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// Asset bytes failed to parse.
    #[error("Failed to parse asset '{asset}': {reason}")]
    AssetParse {
        /// Name or path of the offending asset
        asset: String,
        /// Decoder message
        reason: String,
    },

    /// A motion source could not deliver the requested motion.
    #[error("Failed to fetch motion '{source_name}': {reason}")]
    MotionFetch {
        /// Source identifier (file name or URL)
        source_name: String,
        /// Underlying failure
        reason: String,
    },

    /// glTF parsing or loading error.
    #[cfg(feature = "gltf")]
    #[error("glTF error: {0}")]
    GltfError(String),

    // ========================================================================
    // I/O & Serialization Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Project file written by a newer version of the tool.
    #[error("Unsupported project version {found} (supported up to {supported})")]
    UnsupportedProjectVersion {
        /// Version stored in the file
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },
}

impl PoseLabError {
    /// Builds an [`PoseLabError::AssetParse`] from any displayable error.
    pub fn asset_parse(asset: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PoseLabError::AssetParse {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

#[cfg(feature = "gltf")]
impl From<gltf::Error> for PoseLabError {
    fn from(err: gltf::Error) -> Self {
        PoseLabError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, PoseLabError>`.
pub type Result<T> = std::result::Result<T, PoseLabError>;
