use std::collections::BTreeMap;

use glam::Quat;

use crate::errors::{PoseLabError, Result};
use crate::humanoid::api::{HumanBones, HumanoidPose, PoseApi, humanoid_for};
use crate::humanoid::BoneId;
use crate::pose::Pose;
use crate::scene::{BoundingBox, NodeHandle, Scene};

/// A loaded avatar: its scene hierarchy, the node acting as the avatar root,
/// an optional humanoid bone layer and expression weights.
///
/// The root node is where whole-rig facing (`sceneRotation`) is applied.
#[derive(Debug)]
pub struct Rig {
    pub name: String,
    pub scene: Scene,
    root: NodeHandle,
    humanoid: Option<Box<dyn HumanoidPose>>,
    expressions: BTreeMap<String, f32>,
}

impl Rig {
    /// Wraps a hierarchy without a humanoid layer.
    #[must_use]
    pub fn new(name: impl Into<String>, scene: Scene, root: NodeHandle) -> Self {
        Self {
            name: name.into(),
            scene,
            root,
            humanoid: None,
            expressions: BTreeMap::new(),
        }
    }

    /// Wraps a hierarchy and binds a humanoid layer of the given API
    /// generation. Rest transforms are captured from the scene as it is now.
    #[must_use]
    pub fn with_humanoid(
        name: impl Into<String>,
        mut scene: Scene,
        root: NodeHandle,
        bones: &BTreeMap<BoneId, NodeHandle>,
        api: PoseApi,
    ) -> Self {
        let human_bones = HumanBones::capture(&scene, bones);
        scene.update_subtree(root);

        let mut rig = Self::new(name, scene, root);
        rig.humanoid = Some(humanoid_for(api, human_bones));
        rig
    }

    /// Installs a custom humanoid layer.
    pub fn set_humanoid(&mut self, humanoid: Box<dyn HumanoidPose>) {
        self.humanoid = Some(humanoid);
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    #[must_use]
    pub fn has_humanoid(&self) -> bool {
        self.humanoid.is_some()
    }

    /// The humanoid layer, or [`PoseLabError::HumanoidMissing`].
    pub fn humanoid(&self) -> Result<&dyn HumanoidPose> {
        self.humanoid
            .as_deref()
            .ok_or_else(|| PoseLabError::HumanoidMissing(self.name.clone()))
    }

    /// Node bound to `bone`; `None` when the bone or the humanoid layer is
    /// missing.
    #[must_use]
    pub fn bone_node(&self, bone: BoneId) -> Option<NodeHandle> {
        self.humanoid.as_deref()?.bone_node(bone)
    }

    #[must_use]
    pub fn bone_local_rotation(&self, bone: BoneId) -> Option<Quat> {
        let handle = self.bone_node(bone)?;
        self.scene.get_node(handle).map(|n| n.transform.rotation)
    }

    // ========================================================================
    // Pose operations
    // ========================================================================

    /// Resets the humanoid to its rest pose and propagates transforms.
    pub fn reset_pose(&mut self) -> Result<()> {
        let humanoid = self
            .humanoid
            .as_deref()
            .ok_or_else(|| PoseLabError::HumanoidMissing(self.name.clone()))?;
        humanoid.reset_pose(&mut self.scene);
        self.scene.update_subtree(self.root);
        Ok(())
    }

    /// Writes `pose` onto the bones, optionally resetting to rest first.
    /// Neither propagates transforms nor touches the root node.
    pub(crate) fn write_pose(&mut self, pose: &Pose, reset_first: bool) -> Result<()> {
        let humanoid = self
            .humanoid
            .as_deref()
            .ok_or_else(|| PoseLabError::HumanoidMissing(self.name.clone()))?;
        if reset_first {
            humanoid.reset_pose(&mut self.scene);
        }
        humanoid.set_pose(&mut self.scene, pose);
        Ok(())
    }

    /// Reads the current humanoid pose relative to rest.
    pub fn current_pose(&self) -> Result<Pose> {
        Ok(self.humanoid()?.get_pose(&self.scene))
    }

    /// Propagates local transforms into world matrices for the whole rig.
    pub fn update(&mut self) {
        self.scene.update_subtree(self.root);
    }

    /// Sets the rotation of the rig root node.
    pub fn set_root_rotation(&mut self, rotation: Quat) {
        if let Some(node) = self.scene.get_node_mut(self.root) {
            node.transform.rotation = rotation;
        }
    }

    #[must_use]
    pub fn root_world_rotation(&self) -> Quat {
        self.scene
            .get_node(self.root)
            .map_or(Quat::IDENTITY, |n| n.transform.world_rotation())
    }

    /// Path of `node` relative to the rig root.
    #[must_use]
    pub fn node_path(&self, node: NodeHandle) -> Option<String> {
        self.scene.node_path(node, self.root)
    }

    /// Tight world bounds of the rig as of the last propagation.
    #[must_use]
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        self.scene.world_bounds(self.root)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn set_expression(&mut self, name: &str, weight: f32) {
        self.expressions.insert(name.to_string(), weight.clamp(0.0, 1.0));
    }

    #[must_use]
    pub fn expression(&self, name: &str) -> f32 {
        self.expressions.get(name).copied().unwrap_or(0.0)
    }
}
