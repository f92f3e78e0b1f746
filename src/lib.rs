//! # PoseLab
//!
//! Humanoid pose retargeting for VRM-style avatars.
//!
//! Motions authored against one skeleton naming convention (Mixamo) are
//! resolved onto canonical humanoid bones, reduced to static poses or
//! retargeted clips, and applied to a rig through whichever pose API
//! generation it exposes. Timestamped partial poses compile into clips.
//!
//! ## Layout
//!
//! - [`scene`]: node hierarchy, transforms and the framing camera
//! - [`humanoid`]: bone taxonomy, rigs and pose API adapters
//! - [`animation`]: keyframe tracks, clips, playback and timeline compilation
//! - [`retarget`]: joint-name resolution and clip retargeting
//! - [`pose`]: pose values, documents, sampling, application and the library
//! - [`session`]: the authoring session owning the loaded rig
//! - [`batch`]: batch pose export
//! - [`presets`] / [`project`]: reaction presets and project files
//! - [`assets`]: glTF / VRM loading (feature `gltf`)

pub mod animation;
pub mod assets;
pub mod batch;
pub mod errors;
pub mod humanoid;
pub mod pose;
pub mod presets;
pub mod project;
pub mod retarget;
pub mod scene;
pub mod session;

pub use animation::{AnimationAction, AnimationClip, LoopMode, TimelineCompiler, TimelineSequence};
pub use batch::{BatchExporter, BatchPoseConfig, BatchReport, MotionSource, PoseSink};
pub use errors::{PoseLabError, Result};
pub use humanoid::{BoneId, HumanoidPose, PoseApi, Rig};
pub use pose::{BoneTransform, EulerDegrees, Pose, PoseApplier, PoseDocument, PoseId, PoseLibrary, PoseSampler};
pub use retarget::{BoneNameResolver, CanonicalBoneNames, NameConvention, RigBoneNames, SourceMotion};
pub use scene::{Camera, FramingConfig, Node, NodeHandle, Scene};
pub use session::{LoadOutcome, LoadTicket, PoseSession};
