//! Humanoid layer
//!
//! - BoneId: canonical semantic bone taxonomy
//! - HumanoidPose: pose API over a rig's bones, with normalized and legacy adapters
//! - Rig: a loaded avatar hierarchy plus its humanoid layer
//! - skeleton: procedural bind-pose skeleton construction

pub mod api;
pub mod bone;
pub mod rig;
pub mod skeleton;

pub use api::{HumanBones, HumanoidPose, LegacyPoseApi, NormalizedPoseApi, PoseApi, RestTransform};
pub use bone::{BoneId, Side};
pub use rig::Rig;
