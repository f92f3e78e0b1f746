//! Humanoid pose APIs.
//!
//! Avatar formats expose bone posing in two historical shapes: a combined
//! "normalized" API that resets and sets a whole pose at once, and a legacy
//! per-bone API. Both are modelled behind [`HumanoidPose`] so pose
//! application never needs to know which generation of rig it talks to.
//!
//! Pose rotations are relative to the rest pose captured when the humanoid
//! layer is created: `local = pose.rotation * rest.rotation` and
//! `local_position = pose.position + rest.position`.

use std::collections::BTreeMap;
use std::fmt;

use glam::{Quat, Vec3};

use crate::humanoid::BoneId;
use crate::pose::{BoneTransform, Pose};
use crate::scene::{NodeHandle, Scene};

/// Which pose API generation a humanoid layer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseApi {
    /// Combined reset/set over the whole humanoid.
    Normalized,
    /// Individual per-bone reset/set calls.
    Legacy,
}

/// Rest (bind) transform of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestTransform {
    pub rotation: Quat,
    pub position: Vec3,
    /// World rotation of the bone's parent node when rest was captured.
    pub parent_world_rotation: Quat,
}

/// Capability interface over a rig's humanoid layer.
///
/// All methods take the scene that owns the bone nodes explicitly; the
/// humanoid layer only stores handles and rest data.
pub trait HumanoidPose: fmt::Debug {
    fn api(&self) -> PoseApi;

    /// Node bound to `bone`, or `None` when the rig lacks that bone.
    fn bone_node(&self, bone: BoneId) -> Option<NodeHandle>;

    /// Bones present on this rig, in canonical order.
    fn bones(&self) -> Vec<BoneId>;

    /// Rest transform recorded for `bone`.
    fn rest(&self, bone: BoneId) -> Option<RestTransform>;

    /// Restores every bound bone to its rest transform.
    fn reset_pose(&self, scene: &mut Scene);

    /// Writes the bones present in `pose`; other bones are left as they are.
    /// Bones the rig lacks are skipped.
    fn set_pose(&self, scene: &mut Scene, pose: &Pose);

    /// Reads the current local transforms back as a pose relative to rest.
    fn get_pose(&self, scene: &Scene) -> Pose;
}

/// Bone bindings plus captured rest transforms.
#[derive(Debug, Clone, Default)]
pub struct HumanBones {
    nodes: BTreeMap<BoneId, NodeHandle>,
    rest: BTreeMap<BoneId, RestTransform>,
}

impl HumanBones {
    /// Binds `map` and records each node's current local transform as its
    /// rest pose. Entries pointing at nodes missing from `scene` are dropped.
    #[must_use]
    pub fn capture(scene: &Scene, map: &BTreeMap<BoneId, NodeHandle>) -> Self {
        let mut nodes = BTreeMap::new();
        let mut rest = BTreeMap::new();

        for (&bone, &handle) in map {
            let Some(node) = scene.get_node(handle) else {
                log::warn!("Humanoid bone {bone} points at a missing node; skipping");
                continue;
            };
            let parent_world_rotation = node
                .parent()
                .and_then(|parent| scene.compute_world_rotation(parent))
                .unwrap_or(Quat::IDENTITY);

            nodes.insert(bone, handle);
            rest.insert(
                bone,
                RestTransform {
                    rotation: node.transform.rotation,
                    position: node.transform.position,
                    parent_world_rotation,
                },
            );
        }

        Self { nodes, rest }
    }

    #[must_use]
    pub fn node(&self, bone: BoneId) -> Option<NodeHandle> {
        self.nodes.get(&bone).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn reset_bone(&self, scene: &mut Scene, bone: BoneId) {
        let (Some(handle), Some(rest)) = (self.node(bone), self.rest.get(&bone)) else {
            return;
        };
        if let Some(node) = scene.get_node_mut(handle) {
            node.transform.rotation = rest.rotation;
            node.transform.position = rest.position;
        }
    }

    fn set_bone(&self, scene: &mut Scene, bone: BoneId, transform: &BoneTransform) {
        let (Some(handle), Some(rest)) = (self.node(bone), self.rest.get(&bone)) else {
            log::debug!("Rig has no {bone} bone; skipping");
            return;
        };
        let Some(node) = scene.get_node_mut(handle) else {
            return;
        };

        node.transform.rotation = transform.rotation * rest.rotation;
        if bone.is_root_capable()
            && let Some(position) = transform.position
        {
            node.transform.position = rest.position + position;
        }
    }

    fn read_bone(&self, scene: &Scene, bone: BoneId) -> Option<BoneTransform> {
        let node = scene.get_node(self.node(bone)?)?;
        let rest = self.rest.get(&bone)?;

        let rotation = (node.transform.rotation * rest.rotation.inverse()).normalize();
        let position = bone
            .is_root_capable()
            .then(|| node.transform.position - rest.position);

        Some(BoneTransform { rotation, position })
    }
}

// ============================================================================
// Normalized (combined) API
// ============================================================================

/// Adapter for rigs exposing a combined normalized pose API.
#[derive(Debug, Clone)]
pub struct NormalizedPoseApi {
    bones: HumanBones,
}

impl NormalizedPoseApi {
    #[must_use]
    pub fn new(bones: HumanBones) -> Self {
        Self { bones }
    }
}

impl HumanoidPose for NormalizedPoseApi {
    fn api(&self) -> PoseApi {
        PoseApi::Normalized
    }

    fn bone_node(&self, bone: BoneId) -> Option<NodeHandle> {
        self.bones.node(bone)
    }

    fn bones(&self) -> Vec<BoneId> {
        self.bones.nodes.keys().copied().collect()
    }

    fn rest(&self, bone: BoneId) -> Option<RestTransform> {
        self.bones.rest.get(&bone).copied()
    }

    fn reset_pose(&self, scene: &mut Scene) {
        for (&handle, rest) in self.bones.nodes.values().zip(self.bones.rest.values()) {
            if let Some(node) = scene.get_node_mut(handle) {
                node.transform.rotation = rest.rotation;
                node.transform.position = rest.position;
            }
        }
    }

    fn set_pose(&self, scene: &mut Scene, pose: &Pose) {
        for (bone, transform) in pose.iter() {
            self.bones.set_bone(scene, bone, transform);
        }
    }

    fn get_pose(&self, scene: &Scene) -> Pose {
        self.bones
            .nodes
            .keys()
            .filter_map(|&bone| self.bones.read_bone(scene, bone).map(|t| (bone, t)))
            .collect()
    }
}

// ============================================================================
// Legacy (per-bone) API
// ============================================================================

/// Adapter for rigs exposing only per-bone pose calls.
#[derive(Debug, Clone)]
pub struct LegacyPoseApi {
    bones: HumanBones,
}

impl LegacyPoseApi {
    #[must_use]
    pub fn new(bones: HumanBones) -> Self {
        Self { bones }
    }

    /// Restores a single bone to rest.
    pub fn reset_bone(&self, scene: &mut Scene, bone: BoneId) {
        self.bones.reset_bone(scene, bone);
    }

    /// Writes a single bone.
    pub fn set_bone(&self, scene: &mut Scene, bone: BoneId, transform: &BoneTransform) {
        self.bones.set_bone(scene, bone, transform);
    }

    #[must_use]
    pub fn get_bone(&self, scene: &Scene, bone: BoneId) -> Option<BoneTransform> {
        self.bones.read_bone(scene, bone)
    }
}

impl HumanoidPose for LegacyPoseApi {
    fn api(&self) -> PoseApi {
        PoseApi::Legacy
    }

    fn bone_node(&self, bone: BoneId) -> Option<NodeHandle> {
        self.bones.node(bone)
    }

    fn bones(&self) -> Vec<BoneId> {
        BoneId::ALL
            .iter()
            .copied()
            .filter(|&bone| self.bones.node(bone).is_some())
            .collect()
    }

    fn rest(&self, bone: BoneId) -> Option<RestTransform> {
        self.bones.rest.get(&bone).copied()
    }

    fn reset_pose(&self, scene: &mut Scene) {
        for &bone in BoneId::ALL {
            self.reset_bone(scene, bone);
        }
    }

    fn set_pose(&self, scene: &mut Scene, pose: &Pose) {
        for &bone in BoneId::ALL {
            if let Some(transform) = pose.get(bone) {
                self.set_bone(scene, bone, transform);
            }
        }
    }

    fn get_pose(&self, scene: &Scene) -> Pose {
        BoneId::ALL
            .iter()
            .filter_map(|&bone| self.get_bone(scene, bone).map(|t| (bone, t)))
            .collect()
    }
}

/// Builds the adapter matching `api`.
#[must_use]
pub fn humanoid_for(api: PoseApi, bones: HumanBones) -> Box<dyn HumanoidPose> {
    match api {
        PoseApi::Normalized => Box::new(NormalizedPoseApi::new(bones)),
        PoseApi::Legacy => Box::new(LegacyPoseApi::new(bones)),
    }
}
