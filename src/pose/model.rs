use std::collections::BTreeMap;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::humanoid::BoneId;

/// Euler rotation in degrees, applied in XYZ order. Missing axes are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerDegrees {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub y: f32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub z: f32,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &f32) -> bool {
    *value == 0.0
}

impl EulerDegrees {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotation about the vertical axis only.
    #[must_use]
    pub const fn yaw(y: f32) -> Self {
        Self::new(0.0, y, 0.0)
    }

    #[must_use]
    pub fn to_radians(self) -> Vec3 {
        Vec3::new(self.x.to_radians(), self.y.to_radians(), self.z.to_radians())
    }

    #[must_use]
    pub fn to_quat(self) -> Quat {
        let r = self.to_radians();
        Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z)
    }
}

/// Local transform of one bone inside a [`Pose`].
///
/// `rotation` is relative to the bone's rest orientation. `position` is only
/// ever present for root-capable bones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub rotation: Quat,
    pub position: Option<Vec3>,
}

impl BoneTransform {
    #[must_use]
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            position: None,
        }
    }
}

/// A partial snapshot of a humanoid: bone rotations (plus root position)
/// and an optional whole-rig facing offset.
///
/// Bones without an entry are not part of the pose. The applier resets the
/// rig to its rest pose first, so such bones end up at bind pose.
///
/// A `Pose` is a plain value. Builders consume and return it; there are no
/// in-place mutators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pose {
    bones: BTreeMap<BoneId, BoneTransform>,
    scene_rotation: Option<EulerDegrees>,
}

impl Pose {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a rotation-only pose from `(bone, rotation)` pairs. Later
    /// duplicates replace earlier ones.
    pub fn from_rotations(rotations: impl IntoIterator<Item = (BoneId, Quat)>) -> Self {
        Self {
            bones: rotations
                .into_iter()
                .map(|(bone, rotation)| (bone, BoneTransform::from_rotation(rotation)))
                .collect(),
            scene_rotation: None,
        }
    }

    /// Builds a pose from per-bone Euler angles in degrees (XYZ order).
    pub fn from_euler_degrees(rotations: impl IntoIterator<Item = (BoneId, EulerDegrees)>) -> Self {
        Self::from_rotations(rotations.into_iter().map(|(bone, euler)| (bone, euler.to_quat())))
    }

    // ========================================================================
    // Builders
    // ========================================================================

    #[must_use]
    pub fn with_rotation(mut self, bone: BoneId, rotation: Quat) -> Self {
        let position = self.bones.get(&bone).and_then(|t| t.position);
        self.bones.insert(bone, BoneTransform { rotation, position });
        self
    }

    /// Sets the position of a root-capable bone. Ignored for other bones.
    #[must_use]
    pub fn with_position(mut self, bone: BoneId, position: Vec3) -> Self {
        if !bone.is_root_capable() {
            log::debug!("Ignoring position for non-root bone {bone}");
            return self;
        }
        self.bones
            .entry(bone)
            .or_insert(BoneTransform::from_rotation(Quat::IDENTITY))
            .position = Some(position);
        self
    }

    #[must_use]
    pub fn with_scene_rotation(mut self, rotation: EulerDegrees) -> Self {
        self.scene_rotation = Some(rotation);
        self
    }

    /// Copy of this pose with every position removed.
    #[must_use]
    pub fn rotations_only(&self) -> Self {
        Self {
            bones: self
                .bones
                .iter()
                .map(|(&bone, t)| (bone, BoneTransform::from_rotation(t.rotation)))
                .collect(),
            scene_rotation: self.scene_rotation,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn get(&self, bone: BoneId) -> Option<&BoneTransform> {
        self.bones.get(&bone)
    }

    #[must_use]
    pub fn rotation(&self, bone: BoneId) -> Option<Quat> {
        self.bones.get(&bone).map(|t| t.rotation)
    }

    #[must_use]
    pub fn contains(&self, bone: BoneId) -> bool {
        self.bones.contains_key(&bone)
    }

    /// Bones in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &BoneTransform)> {
        self.bones.iter().map(|(&bone, t)| (bone, t))
    }

    pub fn bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.bones.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// `true` when the pose holds no bone data. The scene rotation alone does
    /// not make a pose non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Number of bones carrying a position.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.bones.values().filter(|t| t.position.is_some()).count()
    }

    #[must_use]
    pub fn scene_rotation(&self) -> Option<EulerDegrees> {
        self.scene_rotation
    }

    /// Scene rotation, defaulting to no rotation.
    #[must_use]
    pub fn scene_rotation_or_default(&self) -> EulerDegrees {
        self.scene_rotation.unwrap_or_default()
    }
}

impl FromIterator<(BoneId, BoneTransform)> for Pose {
    fn from_iter<I: IntoIterator<Item = (BoneId, BoneTransform)>>(iter: I) -> Self {
        Self {
            bones: iter
                .into_iter()
                .map(|(bone, mut t)| {
                    if !bone.is_root_capable() {
                        t.position = None;
                    }
                    (bone, t)
                })
                .collect(),
            scene_rotation: None,
        }
    }
}
