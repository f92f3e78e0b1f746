//! Batch pose export.
//!
//! Runs every [`BatchPoseConfig`] through the same pipeline a user would
//! drive by hand: fetch the motion, retarget it onto the session rig,
//! reduce it to a pose, apply and frame it, then persist the pose document.
//! The first failure stops the run; poses persisted before it stay written.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{PoseLabError, Result};
use crate::pose::{EulerDegrees, PoseDocument, PoseId};
use crate::retarget::SourceMotion;
use crate::session::PoseSession;

/// Facing applied to every batch pose unless configured otherwise.
pub const DEFAULT_SCENE_ROTATION: EulerDegrees = EulerDegrees::yaw(180.0);

/// One pose to produce: which motion file it comes from and how the avatar
/// should face.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPoseConfig {
    pub id: PoseId,
    pub label: String,
    /// Motion file name, as the motion source knows it.
    pub file_name: String,
    pub scene_rotation: EulerDegrees,
}

impl BatchPoseConfig {
    #[must_use]
    pub fn new(id: PoseId, label: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            file_name: file_name.into(),
            scene_rotation: DEFAULT_SCENE_ROTATION,
        }
    }
}

/// The catalogue's eight poses and the motions they are cut from.
#[must_use]
pub fn default_batch_configs() -> Vec<BatchPoseConfig> {
    [
        (PoseId::DawnRunner, "Dawn Runner", "Male Dynamic Pose.fbx"),
        (PoseId::GreenLoom, "Green Loom", "Male Dance Pose.fbx"),
        (PoseId::SunsetCall, "Sunset Call", "Male Standing Pose.fbx"),
        (PoseId::CipherWhisper, "Cipher Whisper", "Male Sitting Pose.fbx"),
        (PoseId::NebulaDrift, "Nebula Drift", "Male Locomotion Pose.fbx"),
        (PoseId::LoomVanguard, "Loom Vanguard", "Male Standing Pose.fbx"),
        (PoseId::SignalReverie, "Signal Reverie", "Male Crouch Pose.fbx"),
        (PoseId::ProtocolEnforcer, "Protocol Enforcer", "Male Locomotion Pose.fbx"),
    ]
    .into_iter()
    .map(|(id, label, file)| BatchPoseConfig::new(id, label, file))
    .collect()
}

/// Delivers source motions for batch configs.
pub trait MotionSource {
    fn fetch(&mut self, config: &BatchPoseConfig) -> Result<SourceMotion>;
}

/// Receives finished pose documents.
pub trait PoseSink {
    fn persist(&mut self, id: PoseId, document: &PoseDocument) -> Result<()>;
}

impl PoseSink for BTreeMap<PoseId, PoseDocument> {
    fn persist(&mut self, id: PoseId, document: &PoseDocument) -> Result<()> {
        self.insert(id, document.clone());
        Ok(())
    }
}

/// Writes `<id>.json` files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryPoseSink {
    dir: PathBuf,
}

impl DirectoryPoseSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PoseSink for DirectoryPoseSink {
    fn persist(&mut self, id: PoseId, document: &PoseDocument) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(id.file_name());
        document.save(&path)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Loads glTF/GLB motions from a directory. A config's `.fbx` file name is
/// looked up as `.glb`, then `.gltf`, then verbatim.
#[cfg(feature = "gltf")]
#[derive(Debug, Clone)]
pub struct DirectoryMotionSource {
    dir: PathBuf,
}

#[cfg(feature = "gltf")]
impl DirectoryMotionSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn candidates(&self, file_name: &str) -> Vec<PathBuf> {
        let path = self.dir.join(file_name);
        vec![path.with_extension("glb"), path.with_extension("gltf"), path]
    }
}

#[cfg(feature = "gltf")]
impl MotionSource for DirectoryMotionSource {
    fn fetch(&mut self, config: &BatchPoseConfig) -> Result<SourceMotion> {
        let Some(path) = self.candidates(&config.file_name).into_iter().find(|p| p.is_file()) else {
            return Err(PoseLabError::MotionFetch {
                source_name: config.file_name.clone(),
                reason: format!("not found in {}", self.dir.display()),
            });
        };

        let bytes = fs::read(&path).map_err(|e| PoseLabError::MotionFetch {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        crate::assets::load_source_motion(&path.display().to_string(), &bytes)
    }
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Poses persisted, in run order.
    pub completed: Vec<PoseId>,
    /// The pose that stopped the run, and why.
    pub failure: Option<(PoseId, PoseLabError)>,
}

impl BatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct BatchExporter {
    configs: Vec<BatchPoseConfig>,
}

impl Default for BatchExporter {
    fn default() -> Self {
        Self::new(default_batch_configs())
    }
}

impl BatchExporter {
    #[must_use]
    pub fn new(configs: Vec<BatchPoseConfig>) -> Self {
        Self { configs }
    }

    #[must_use]
    pub fn configs(&self) -> &[BatchPoseConfig] {
        &self.configs
    }

    /// Runs every config in order against the session rig. Each produced
    /// pose is also stored in the session library.
    ///
    /// Fails up front with [`PoseLabError::RigNotLoaded`] when no rig is
    /// loaded; failures of individual poses are reported in the
    /// [`BatchReport`].
    pub fn run(
        &self,
        session: &mut PoseSession,
        source: &mut dyn MotionSource,
        sink: &mut dyn PoseSink,
    ) -> Result<BatchReport> {
        session.rig()?;

        let mut completed = Vec::with_capacity(self.configs.len());
        for config in &self.configs {
            log::info!("Exporting {}", config.label);
            if let Err(err) = Self::export_one(config, session, source, sink) {
                log::warn!("Batch export stopped at {}: {err}", config.id);
                return Ok(BatchReport {
                    completed,
                    failure: Some((config.id, err)),
                });
            }
            completed.push(config.id);
        }

        log::info!("Batch export complete: {} poses", completed.len());
        Ok(BatchReport {
            completed,
            failure: None,
        })
    }

    fn export_one(
        config: &BatchPoseConfig,
        session: &mut PoseSession,
        source: &mut dyn MotionSource,
        sink: &mut dyn PoseSink,
    ) -> Result<()> {
        let motion = source.fetch(config)?;
        let pose = session
            .retarget_motion(&motion)?
            .with_scene_rotation(config.scene_rotation);

        session.apply_pose(&pose)?;
        sink.persist(config.id, &PoseDocument::from_pose(&pose))?;
        session.library.insert(config.id, pose);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_cover_every_pose_once() {
        let configs = default_batch_configs();
        let ids: Vec<PoseId> = configs.iter().map(|c| c.id).collect();
        assert_eq!(ids, PoseId::ALL);
        assert!(configs.iter().all(|c| c.scene_rotation == EulerDegrees::yaw(180.0)));
    }

    #[test]
    fn run_without_rig_fails_up_front() {
        struct NoMotion;
        impl MotionSource for NoMotion {
            fn fetch(&mut self, config: &BatchPoseConfig) -> Result<SourceMotion> {
                Err(PoseLabError::MotionFetch {
                    source_name: config.file_name.clone(),
                    reason: "offline".into(),
                })
            }
        }

        let mut session = PoseSession::default();
        let mut sink = BTreeMap::new();
        let result = BatchExporter::default().run(&mut session, &mut NoMotion, &mut sink);
        assert!(matches!(result, Err(PoseLabError::RigNotLoaded)));
    }
}
