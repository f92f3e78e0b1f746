//! Pose documents: the JSON form of a [`Pose`].
//!
//! ```json
//! { "sceneRotation": { "y": 180 },
//!   "vrmPose": { "hips": { "rotation": [0, 0, 0, 1], "position": [0, 1, 0] } },
//!   "boneRotations": { "neck": { "x": 10 } } }
//! ```
//!
//! `vrmPose` holds rest-relative quaternions (`[x, y, z, w]`) and is
//! preferred; `boneRotations` is the older Euler-degree authoring form and
//! is only read when `vrmPose` is absent. Unknown bone names are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{PoseLabError, Result};
use crate::humanoid::BoneId;
use crate::pose::model::{EulerDegrees, Pose};

/// One bone of a `vrmPose` map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_rotation: Option<EulerDegrees>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrm_pose: Option<BTreeMap<String, PoseEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bone_rotations: Option<BTreeMap<String, EulerDegrees>>,
}

impl PoseDocument {
    /// Document form of `pose`. Positions are kept for root-capable bones
    /// only.
    #[must_use]
    pub fn from_pose(pose: &Pose) -> Self {
        let vrm_pose = pose
            .iter()
            .map(|(bone, t)| {
                let entry = PoseEntry {
                    rotation: Some(t.rotation.to_array()),
                    position: t
                        .position
                        .filter(|_| bone.is_root_capable())
                        .map(|p| p.to_array()),
                };
                (bone.as_str().to_string(), entry)
            })
            .collect();

        Self {
            scene_rotation: pose.scene_rotation(),
            vrm_pose: Some(vrm_pose),
            bone_rotations: None,
        }
    }

    /// Converts the document into a pose.
    #[must_use]
    pub fn to_pose(&self) -> Pose {
        let mut pose = if let Some(vrm_pose) = &self.vrm_pose {
            let mut pose = Pose::new();
            for (name, entry) in vrm_pose {
                let Some(bone) = BoneId::from_name(name) else {
                    log::debug!("Pose document: unknown bone '{name}' skipped");
                    continue;
                };
                if let Some(rotation) = entry.rotation {
                    pose = pose.with_rotation(bone, Quat::from_array(rotation));
                }
                if let Some(position) = entry.position {
                    pose = pose.with_position(bone, Vec3::from_array(position));
                }
            }
            pose
        } else if let Some(bone_rotations) = &self.bone_rotations {
            Pose::from_euler_degrees(bone_rotations.iter().filter_map(|(name, &euler)| {
                let bone = BoneId::from_name(name);
                if bone.is_none() {
                    log::debug!("Pose document: unknown bone '{name}' skipped");
                }
                bone.map(|b| (b, euler))
            }))
        } else {
            Pose::new()
        };

        if let Some(rotation) = self.scene_rotation {
            pose = pose.with_scene_rotation(rotation);
        }
        pose
    }

    /// Parses a document. `asset` names the source in error messages.
    pub fn from_json(asset: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PoseLabError::asset_parse(asset, e))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let asset = path.display().to_string();
        let json = fs::read_to_string(path).map_err(|e| PoseLabError::asset_parse(&asset, e))?;
        Self::from_json(&asset, &json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vrm_pose_wins_over_bone_rotations() {
        let json = r#"{
            "vrmPose": { "head": { "rotation": [0, 0, 0, 1] } },
            "boneRotations": { "neck": { "x": 10 } }
        }"#;
        let pose = PoseDocument::from_json("test", json).unwrap().to_pose();
        assert!(pose.contains(BoneId::Head));
        assert!(!pose.contains(BoneId::Neck));
    }

    #[test]
    fn bone_rotations_used_without_vrm_pose() {
        let json = r#"{ "boneRotations": { "neck": { "x": 90 }, "tail": { "y": 5 } } }"#;
        let pose = PoseDocument::from_json("test", json).unwrap().to_pose();
        assert_eq!(pose.len(), 1);
        let expected = Quat::from_rotation_x(90f32.to_radians());
        assert!(pose.rotation(BoneId::Neck).unwrap().dot(expected).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn missing_axes_default_to_zero() {
        let json = r#"{ "sceneRotation": { "y": 180 } }"#;
        let pose = PoseDocument::from_json("test", json).unwrap().to_pose();
        assert!(pose.is_empty());
        assert_eq!(pose.scene_rotation(), Some(EulerDegrees::yaw(180.0)));
    }

    #[test]
    fn malformed_json_names_asset() {
        let err = PoseDocument::from_json("poses/bad.json", "{ nope").unwrap_err();
        assert!(err.to_string().contains("poses/bad.json"));
    }

    #[test]
    fn export_drops_non_root_positions() {
        let mut doc = PoseDocument::default();
        doc.vrm_pose = Some(BTreeMap::from([(
            "head".to_string(),
            PoseEntry {
                rotation: Some([0.0, 0.0, 0.0, 1.0]),
                position: Some([1.0, 2.0, 3.0]),
            },
        )]));

        let exported = PoseDocument::from_pose(&doc.to_pose());
        let head = exported.vrm_pose.unwrap()["head"];
        assert_eq!(head.position, None);
    }
}
