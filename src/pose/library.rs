use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{PoseLabError, Result};
use crate::pose::document::PoseDocument;
use crate::pose::model::Pose;

/// Identifier of a catalogued pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoseId {
    DawnRunner,
    GreenLoom,
    SunsetCall,
    CipherWhisper,
    NebulaDrift,
    LoomVanguard,
    SignalReverie,
    ProtocolEnforcer,
}

impl PoseId {
    pub const ALL: [PoseId; 8] = [
        PoseId::DawnRunner,
        PoseId::GreenLoom,
        PoseId::SunsetCall,
        PoseId::CipherWhisper,
        PoseId::NebulaDrift,
        PoseId::LoomVanguard,
        PoseId::SignalReverie,
        PoseId::ProtocolEnforcer,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PoseId::DawnRunner => "dawn-runner",
            PoseId::GreenLoom => "green-loom",
            PoseId::SunsetCall => "sunset-call",
            PoseId::CipherWhisper => "cipher-whisper",
            PoseId::NebulaDrift => "nebula-drift",
            PoseId::LoomVanguard => "loom-vanguard",
            PoseId::SignalReverie => "signal-reverie",
            PoseId::ProtocolEnforcer => "protocol-enforcer",
        }
    }

    /// File name used when a pose is stored on disk.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for PoseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoseId {
    type Err = PoseLabError;

    fn from_str(s: &str) -> Result<Self> {
        PoseId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PoseLabError::UnknownPoseId(s.to_string()))
    }
}

/// Poses keyed by [`PoseId`]. Not every id needs an entry.
#[derive(Debug, Clone, Default)]
pub struct PoseLibrary {
    poses: BTreeMap<PoseId, Pose>,
}

impl PoseLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: PoseId) -> Option<&Pose> {
        self.poses.get(&id)
    }

    /// Looks a pose up by its textual id. Unknown ids give `None`.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&Pose> {
        self.get(id.parse().ok()?)
    }

    /// Stores `pose` under `id`, returning the pose it replaces.
    pub fn insert(&mut self, id: PoseId, pose: Pose) -> Option<Pose> {
        self.poses.insert(id, pose)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoseId, &Pose)> {
        self.poses.iter().map(|(&id, pose)| (id, pose))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Reads `<id>.json` from `dir` for every id. Missing files leave the id
    /// without an entry; a malformed file fails the whole load.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut library = Self::new();

        for id in PoseId::ALL {
            let path = dir.join(id.file_name());
            if !path.is_file() {
                log::debug!("Pose library: no file for {id}");
                continue;
            }
            let document = PoseDocument::load(&path)?;
            library.insert(id, document.to_pose());
        }

        log::info!("Loaded {} poses from {}", library.len(), dir.display());
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_text() {
        for id in PoseId::ALL {
            assert_eq!(id.as_str().parse::<PoseId>().unwrap(), id);
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{id}\""));
        }
        assert!(matches!("moon-walk".parse::<PoseId>(), Err(PoseLabError::UnknownPoseId(_))));
    }
}
