//! Project files: the saved state of an authoring session.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::animation::TimelineSequence;
use crate::errors::{PoseLabError, Result};

/// Current version of the project file format.
pub const PROJECT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub version: u32,
    /// Milliseconds since the Unix epoch at save time.
    pub date: u64,
    pub metadata: ProjectMetadata,
    pub scene: SceneState,
    pub timeline: TimelineState,
    pub reaction: ReactionState,
    #[serde(default)]
    pub avatar: AvatarState,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneState {
    pub background_id: String,
    pub camera: CameraState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Xyz,
    pub target: Xyz,
}

/// `{x, y, z}` object form of a vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Xyz {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Xyz> for Vec3 {
    fn from(v: Xyz) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineState {
    pub sequence: TimelineSequence,
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionState {
    pub animation_mode: String,
    pub active_preset_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AvatarState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Display name when the URL is missing or transient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProjectState {
    /// Parses a project. Files from a newer format version are rejected.
    pub fn from_json(asset: &str, json: &str) -> Result<Self> {
        let project: Self = serde_json::from_str(json).map_err(|e| PoseLabError::asset_parse(asset, e))?;
        if project.version > PROJECT_VERSION {
            return Err(PoseLabError::UnsupportedProjectVersion {
                found: project.version,
                supported: PROJECT_VERSION,
            });
        }
        Ok(project)
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
