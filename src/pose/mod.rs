//! Poses
//!
//! - model: the immutable [`Pose`] value
//! - document: JSON pose documents
//! - sampler: reduces animation tracks to a pose
//! - applier: writes a pose onto a rig and frames it
//! - library: catalogued poses by [`PoseId`]

pub mod applier;
pub mod document;
pub mod library;
pub mod model;
pub mod sampler;

pub use applier::PoseApplier;
pub use document::{PoseDocument, PoseEntry};
pub use library::{PoseId, PoseLibrary};
pub use model::{BoneTransform, EulerDegrees, Pose};
pub use sampler::PoseSampler;
