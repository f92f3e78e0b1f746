//! Motion retargeting
//!
//! - names: joint-name resolvers between naming conventions
//! - clip: converts a source skeleton's clip onto a humanoid rig

pub mod clip;
pub mod names;

pub use clip::{RetargetOptions, retarget_clip};
pub use names::{BoneNameResolver, CanonicalBoneNames, NameConvention, RigBoneNames};

use crate::animation::AnimationClip;
use crate::errors::{PoseLabError, Result};
use crate::scene::{NodeHandle, Scene};

/// A loaded motion file: the source skeleton in its rest pose plus the
/// clips authored against it.
#[derive(Debug, Clone)]
pub struct SourceMotion {
    pub name: String,
    pub scene: Scene,
    pub root: NodeHandle,
    pub clips: Vec<AnimationClip>,
}

impl SourceMotion {
    #[must_use]
    pub fn new(name: impl Into<String>, scene: Scene, root: NodeHandle, clips: Vec<AnimationClip>) -> Self {
        Self {
            name: name.into(),
            scene,
            root,
            clips,
        }
    }

    /// The first clip, or [`PoseLabError::NoAnimation`].
    pub fn first_clip(&self) -> Result<&AnimationClip> {
        self.clips
            .first()
            .ok_or_else(|| PoseLabError::NoAnimation(self.name.clone()))
    }
}
