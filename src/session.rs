//! Authoring session.
//!
//! [`PoseSession`] owns everything a single editing context needs: the
//! loaded rig, the pose library, the active pose and preset, the authored
//! timeline, recorded clips and the framing camera. There is no global
//! state; independent sessions do not interact.
//!
//! Avatar loads are split into [`begin_avatar_load`](PoseSession::begin_avatar_load)
//! and [`finish_avatar_load`](PoseSession::finish_avatar_load) so the caller
//! can fetch and parse in between. Each begin bumps a generation counter,
//! and a finish whose ticket is older than the latest begin is discarded.

use std::sync::Arc;

use crate::animation::{
    AnimationAction, AnimationClip, Keyframe, LoopMode, TimelineCompiler, TimelineSequence,
};
use crate::animation::library::AnimationLibrary;
use crate::errors::{PoseLabError, Result};
use crate::humanoid::Rig;
use crate::pose::{EulerDegrees, Pose, PoseApplier, PoseDocument, PoseId, PoseLibrary, PoseSampler};
use crate::presets::{ReactionPreset, default_preset, find_preset_by_id};
use crate::project::{
    AvatarState, CameraState, PROJECT_VERSION, ProjectMetadata, ProjectState, ReactionState, SceneState,
    TimelineState,
};
use crate::retarget::{NameConvention, RetargetOptions, RigBoneNames, SourceMotion, retarget_clip};
use crate::scene::{Camera, FramingConfig};

/// Facing written into captured pose documents: the avatar turned to face
/// the default camera.
pub const CAPTURE_SCENE_ROTATION: EulerDegrees = EulerDegrees::yaw(180.0);

/// Proof that an avatar load was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    url: String,
    already_loaded: bool,
}

impl LoadTicket {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `true` when the URL was already loaded and nothing needs fetching.
    #[must_use]
    pub fn is_already_loaded(&self) -> bool {
        self.already_loaded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The rig was installed.
    Applied,
    /// A newer load began after this one; the rig was discarded.
    Superseded,
    /// The URL was already loaded; the rig was discarded.
    AlreadyLoaded,
}

/// Playback of a pose-space clip on the session rig.
#[derive(Debug)]
struct Playback {
    action: AnimationAction,
    names: RigBoneNames,
}

#[derive(Debug)]
pub struct PoseSession {
    rig: Option<Rig>,
    current_url: Option<String>,
    load_generation: u64,

    active_pose: Option<PoseId>,
    active_preset: &'static ReactionPreset,

    pub library: PoseLibrary,
    pub animations: AnimationLibrary,
    pub timeline: TimelineSequence,
    pub camera: Camera,
    pub framing: FramingConfig,
    pub convention: NameConvention,

    sampler: PoseSampler,
    playback: Option<Playback>,
}

impl Default for PoseSession {
    fn default() -> Self {
        Self::new(PoseLibrary::default())
    }
}

impl PoseSession {
    #[must_use]
    pub fn new(library: PoseLibrary) -> Self {
        Self {
            rig: None,
            current_url: None,
            load_generation: 0,
            active_pose: None,
            active_preset: default_preset(),
            library,
            animations: AnimationLibrary::new(),
            timeline: TimelineSequence::new(5.0),
            camera: Camera::default(),
            framing: FramingConfig::default(),
            convention: NameConvention::MIXAMO,
            sampler: PoseSampler::new(),
            playback: None,
        }
    }

    // ========================================================================
    // Avatar loading
    // ========================================================================

    /// Starts loading the avatar at `url`. Loading the URL that is already
    /// loaded is a no-op and does not cancel a pending load.
    pub fn begin_avatar_load(&mut self, url: &str) -> LoadTicket {
        if self.rig.is_some() && self.current_url.as_deref() == Some(url) {
            return LoadTicket {
                generation: self.load_generation,
                url: url.to_string(),
                already_loaded: true,
            };
        }

        self.load_generation += 1;
        log::info!("Loading avatar {url} (generation {})", self.load_generation);
        LoadTicket {
            generation: self.load_generation,
            url: url.to_string(),
            already_loaded: false,
        }
    }

    /// Completes the load started by `ticket`. An installed rig gets the
    /// active pose and preset expression re-applied.
    pub fn finish_avatar_load(&mut self, ticket: LoadTicket, mut rig: Rig) -> LoadOutcome {
        if ticket.already_loaded {
            return LoadOutcome::AlreadyLoaded;
        }
        if ticket.generation != self.load_generation {
            log::info!("Discarding superseded avatar load {}", ticket.url);
            return LoadOutcome::Superseded;
        }

        self.active_preset.expression.apply(&mut rig);
        self.rig = Some(rig);
        self.current_url = Some(ticket.url);
        self.playback = None;

        if let Some(id) = self.active_pose
            && let Err(err) = self.apply_library_pose(id)
        {
            log::warn!("Could not re-apply pose {id} to new avatar: {err}");
        }

        LoadOutcome::Applied
    }

    #[must_use]
    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// The loaded rig, or [`PoseLabError::RigNotLoaded`].
    pub fn rig(&self) -> Result<&Rig> {
        self.rig.as_ref().ok_or(PoseLabError::RigNotLoaded)
    }

    pub fn rig_mut(&mut self) -> Result<&mut Rig> {
        self.rig.as_mut().ok_or(PoseLabError::RigNotLoaded)
    }

    #[must_use]
    pub fn active_pose(&self) -> Option<PoseId> {
        self.active_pose
    }

    #[must_use]
    pub fn active_preset(&self) -> &'static ReactionPreset {
        self.active_preset
    }

    // ========================================================================
    // Posing
    // ========================================================================

    /// Applies `pose` to the loaded rig and reframes the camera.
    pub fn apply_pose(&mut self, pose: &Pose) -> Result<()> {
        let rig = self.rig.as_mut().ok_or(PoseLabError::RigNotLoaded)?;
        PoseApplier::apply(pose, rig)?;
        PoseApplier::frame(rig, &mut self.camera, self.framing);
        Ok(())
    }

    /// Applies a catalogued pose and makes it the active pose.
    pub fn apply_library_pose(&mut self, id: PoseId) -> Result<()> {
        let pose = self
            .library
            .get(id)
            .cloned()
            .ok_or_else(|| PoseLabError::UnknownPoseId(id.to_string()))?;
        self.apply_pose(&pose)?;
        self.active_pose = Some(id);
        Ok(())
    }

    /// Makes `preset` active: applies its pose when the library has it and
    /// its expression. Without a rig only the selection changes.
    pub fn apply_preset(&mut self, preset: &'static ReactionPreset) -> Result<()> {
        self.active_preset = preset;
        self.active_pose = Some(preset.pose);

        let Some(rig) = self.rig.as_mut() else {
            return Ok(());
        };
        preset.expression.apply(rig);

        if self.library.get(preset.pose).is_some() {
            self.apply_library_pose(preset.pose)?;
        } else {
            log::debug!("Preset {} has no pose in the library", preset.id);
        }
        Ok(())
    }

    /// Returns the rig to its bind pose.
    pub fn reset_pose(&mut self) -> Result<()> {
        self.rig_mut()?.reset_pose()
    }

    // ========================================================================
    // Retargeting & capture
    // ========================================================================

    /// Retargets the first clip of `motion` onto the rig and reduces it to
    /// its first frame. Fails with [`PoseLabError::EmptyPose`] when nothing
    /// survives.
    pub fn retarget_motion(&mut self, motion: &SourceMotion) -> Result<Pose> {
        let rig = self.rig.as_ref().ok_or(PoseLabError::RigNotLoaded)?;
        let clip = motion.first_clip()?;

        let retargeted = retarget_clip(motion, clip, rig, &self.convention, RetargetOptions::for_rig(rig))?;
        let pose = self
            .sampler
            .sample_clip(&retargeted, &RigBoneNames::from_rig(rig));
        PoseSampler::require_pose(pose)
    }

    /// Reads the rig's current pose as a document facing the camera.
    pub fn capture_document(&self) -> Result<PoseDocument> {
        let pose = self.rig()?.current_pose()?;
        Ok(PoseDocument::from_pose(&pose.with_scene_rotation(CAPTURE_SCENE_ROTATION)))
    }

    // ========================================================================
    // Timeline & playback
    // ========================================================================

    /// Adds the rig's current pose to the timeline at `time`.
    pub fn capture_keyframe(&mut self, time: f32) -> Result<()> {
        let pose = self.rig()?.current_pose()?;
        self.timeline.push(Keyframe::from_pose(time, &pose));
        Ok(())
    }

    /// Compiles the session timeline against the loaded rig.
    pub fn compile_timeline(&self) -> Result<AnimationClip> {
        Ok(TimelineCompiler::compile(&self.timeline, self.rig()?))
    }

    /// Compiles the timeline and stores it as a recorded animation.
    pub fn record_timeline(&mut self, name: &str) -> Result<uuid::Uuid> {
        let clip = self.compile_timeline()?;
        Ok(self.animations.add(clip, name))
    }

    /// Starts playing a pose-space clip (compiled or retargeted) on the rig.
    pub fn play(&mut self, clip: Arc<AnimationClip>, loop_mode: LoopMode) -> Result<()> {
        let rig = self.rig()?;
        rig.humanoid()?;
        let names = RigBoneNames::from_rig(rig);
        let action = AnimationAction::new(clip).with_loop_mode(loop_mode);
        self.playback = Some(Playback { action, names });
        Ok(())
    }

    pub fn stop(&mut self) {
        self.playback = None;
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    /// Advances playback by `dt` seconds and poses the rig at the new time.
    /// Returns the playback time, or `None` when nothing is playing.
    pub fn advance(&mut self, dt: f32) -> Result<Option<f32>> {
        let Some(playback) = self.playback.as_mut() else {
            return Ok(None);
        };
        let rig = self.rig.as_mut().ok_or(PoseLabError::RigNotLoaded)?;

        playback.action.update(dt);
        let time = playback.action.time;
        let scene_rotation = self
            .active_pose
            .and_then(|id| self.library.get(id))
            .and_then(Pose::scene_rotation);

        let mut pose = self.sampler.sample_at(playback.action.clip(), time, &playback.names);
        if let Some(rotation) = scene_rotation {
            pose = pose.with_scene_rotation(rotation);
        }
        PoseApplier::apply(&pose, rig)?;
        Ok(Some(time))
    }

    // ========================================================================
    // Projects
    // ========================================================================

    /// Snapshot of the session as a project file.
    #[must_use]
    pub fn to_project(&self, name: &str, date: u64) -> ProjectState {
        ProjectState {
            version: PROJECT_VERSION,
            date,
            metadata: ProjectMetadata {
                name: name.to_string(),
                description: None,
            },
            scene: SceneState {
                background_id: self.active_preset.background.as_str().to_string(),
                camera: CameraState {
                    position: self.camera.position.into(),
                    target: self.camera.target.into(),
                },
            },
            timeline: TimelineState {
                sequence: self.timeline.clone(),
                duration: self.timeline.duration,
            },
            reaction: ReactionState {
                animation_mode: if self.is_playing() { "timeline" } else { "static" }.to_string(),
                active_preset_id: self.active_preset.id.to_string(),
            },
            avatar: AvatarState {
                url: self.current_url.clone(),
                name: self.rig.as_ref().map(|r| r.name.clone()),
            },
        }
    }

    /// Restores timeline, camera and preset selection from `project`. The
    /// avatar is not reloaded; unknown preset ids keep the current preset.
    pub fn load_project(&mut self, project: &ProjectState) -> Result<()> {
        self.timeline = project.timeline.sequence.clone();
        self.timeline.duration = project.timeline.duration;

        match find_preset_by_id(&project.reaction.active_preset_id) {
            Some(preset) => self.apply_preset(preset)?,
            None => log::warn!("Project preset '{}' is unknown", project.reaction.active_preset_id),
        }
        // Applying the preset pose reframes the camera; the saved view wins.
        self.camera.position = project.scene.camera.position.into();
        self.camera.target = project.scene.camera.target.into();
        Ok(())
    }
}
