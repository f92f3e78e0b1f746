use crate::animation::{AnimationClip, KeyframeCursor, TargetPath, Track, TrackData};
use crate::errors::{PoseLabError, Result};
use crate::pose::model::Pose;
use crate::retarget::BoneNameResolver;

/// Reduces animation tracks to a static [`Pose`].
///
/// The sampler keeps one keyframe cursor per track so that playback
/// sampling every frame scans forward instead of searching from scratch.
/// Cursors are only search hints: results never depend on earlier calls.
#[derive(Debug, Default)]
pub struct PoseSampler {
    cursors: Vec<KeyframeCursor>,
}

impl PoseSampler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the first stored keyframe of every rotation track whose node
    /// resolves to a bone.
    ///
    /// Translation and scale tracks are ignored, including the root's, so
    /// the result is rotation-only. When several tracks resolve to the same
    /// bone the later one wins. Empty input gives an empty pose.
    #[allow(clippy::unused_self)]
    pub fn sample_first_frame(&self, tracks: &[Track], resolver: &dyn BoneNameResolver) -> Pose {
        let mut rotations = Vec::with_capacity(tracks.len());

        for track in tracks {
            let TrackData::Quaternion(keys) = &track.data else {
                continue;
            };
            if track.meta.target != TargetPath::Rotation {
                continue;
            }
            let Some(bone) = resolver.resolve_node_path(&track.meta.node_name) else {
                log::debug!("Sampler: '{}' does not resolve to a bone", track.meta.node_name);
                continue;
            };
            if let Some(first) = keys.first_value() {
                rotations.push((bone, first));
            }
        }

        Pose::from_rotations(rotations)
    }

    /// [`sample_first_frame`](Self::sample_first_frame) over a whole clip.
    pub fn sample_clip(&self, clip: &AnimationClip, resolver: &dyn BoneNameResolver) -> Pose {
        self.sample_first_frame(&clip.tracks, resolver)
    }

    /// Samples every rotation track at `time`, plus translation tracks of
    /// root-capable bones. Used to drive a rig from a pose-space clip.
    pub fn sample_at(&mut self, clip: &AnimationClip, time: f32, resolver: &dyn BoneNameResolver) -> Pose {
        let mut pose = Pose::new();
        if self.cursors.len() < clip.tracks.len() {
            self.cursors.resize(clip.tracks.len(), KeyframeCursor::default());
        }

        for (track, cursor) in clip.tracks.iter().zip(self.cursors.iter_mut()) {
            let Some(bone) = resolver.resolve_node_path(&track.meta.node_name) else {
                continue;
            };
            match (&track.data, track.meta.target) {
                (TrackData::Quaternion(keys), TargetPath::Rotation) => {
                    if let Some(rotation) = keys.sample_with_cursor(time, cursor) {
                        pose = pose.with_rotation(bone, rotation);
                    }
                }
                (TrackData::Vector3(keys), TargetPath::Translation) if bone.is_root_capable() => {
                    if let Some(position) = keys.sample_with_cursor(time, cursor) {
                        pose = pose.with_position(bone, position);
                    }
                }
                _ => {}
            }
        }

        pose
    }

    /// Rejects an empty pose with [`PoseLabError::EmptyPose`].
    pub fn require_pose(pose: Pose) -> Result<Pose> {
        if pose.is_empty() {
            return Err(PoseLabError::EmptyPose);
        }
        Ok(pose)
    }
}
