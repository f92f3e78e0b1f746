//! Timeline compilation.
//!
//! A [`TimelineSequence`] is a list of timestamped partial poses authored
//! by the user. [`TimelineCompiler`] turns it into an [`AnimationClip`]
//! whose tracks address the rig's bone nodes by path from the rig root.
//! Values stay in pose space (relative to rest), so playback goes through
//! [`PoseSampler::sample_at`](crate::pose::PoseSampler::sample_at) and the
//! pose applier.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::animation::clip::{AnimationClip, Track};
use crate::animation::tracks::KeyframeTrack;
use crate::animation::values::Interpolatable;
use crate::humanoid::{BoneId, Rig};
use crate::pose::Pose;

/// Name given to every compiled clip.
pub const TIMELINE_CLIP_NAME: &str = "TimelineAnimation";

/// One bone entry of a keyframe. Rotation is `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyframeBone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Quat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

/// A partial pose at a point in time (seconds).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    #[serde(default)]
    pub pose: BTreeMap<BoneId, KeyframeBone>,
}

impl Keyframe {
    #[must_use]
    pub fn new(time: f32) -> Self {
        Self {
            time,
            pose: BTreeMap::new(),
        }
    }

    /// Snapshot of `pose` at `time`. Positions survive only on root-capable
    /// bones, as in the pose itself.
    #[must_use]
    pub fn from_pose(time: f32, pose: &Pose) -> Self {
        let bones = pose
            .iter()
            .map(|(bone, t)| {
                (
                    bone,
                    KeyframeBone {
                        rotation: Some(t.rotation),
                        position: t.position,
                    },
                )
            })
            .collect();
        Self { time, pose: bones }
    }

    #[must_use]
    pub fn with_rotation(mut self, bone: BoneId, rotation: Quat) -> Self {
        self.pose.entry(bone).or_default().rotation = Some(rotation);
        self
    }

    #[must_use]
    pub fn with_position(mut self, bone: BoneId, position: Vec3) -> Self {
        self.pose.entry(bone).or_default().position = Some(position);
        self
    }
}

/// Keyframes in any order plus the declared clip length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineSequence {
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub duration: f32,
}

impl TimelineSequence {
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            keyframes: Vec::new(),
            duration,
        }
    }

    #[must_use]
    pub fn with_keyframe(mut self, keyframe: Keyframe) -> Self {
        self.keyframes.push(keyframe);
        self
    }

    pub fn push(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

/// Samples accumulated for one node path and channel.
struct Channel<T> {
    path: String,
    times: Vec<f32>,
    values: Vec<T>,
}

/// First-seen ordered channels keyed by node path.
struct Channels<T> {
    index: FxHashMap<String, usize>,
    list: Vec<Channel<T>>,
}

impl<T: Interpolatable> Channels<T> {
    fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            list: Vec::new(),
        }
    }

    /// Appends a sample; a sample at the same time as the previous one
    /// replaces it.
    fn push(&mut self, path: &str, time: f32, value: T) {
        let slot = match self.index.get(path) {
            Some(&slot) => slot,
            None => {
                self.index.insert(path.to_string(), self.list.len());
                self.list.push(Channel {
                    path: path.to_string(),
                    times: Vec::new(),
                    values: Vec::new(),
                });
                self.list.len() - 1
            }
        };

        let channel = &mut self.list[slot];
        if channel.times.last().is_some_and(|&last| last.total_cmp(&time).is_eq()) {
            if let Some(last) = channel.values.last_mut() {
                *last = value;
            }
        } else {
            channel.times.push(time);
            channel.values.push(value);
        }
    }

    fn into_tracks(self, make: impl Fn(String, KeyframeTrack<T>) -> Track) -> impl Iterator<Item = Track> {
        self.list
            .into_iter()
            .filter(|c| !c.times.is_empty())
            .map(move |c| make(c.path, KeyframeTrack::linear(c.times, c.values)))
    }
}

pub struct TimelineCompiler;

impl TimelineCompiler {
    /// Compiles `sequence` against `rig` into a clip named
    /// [`TIMELINE_CLIP_NAME`] with the sequence's declared duration.
    ///
    /// Keyframes are ordered by time with a stable sort, so among keyframes
    /// sharing a time the one appearing last in the input wins for each
    /// bone. Negative or non-finite times are dropped. Bones the rig lacks
    /// and nodes not reachable from the rig root are skipped. Tracks are
    /// emitted as all rotation tracks, then all position tracks, each in
    /// first-seen path order.
    #[must_use]
    pub fn compile(sequence: &TimelineSequence, rig: &Rig) -> AnimationClip {
        if !rig.has_humanoid() {
            log::warn!("Rig '{}' has no humanoid layer; compiled timeline is empty", rig.name);
            return AnimationClip::with_duration(TIMELINE_CLIP_NAME, sequence.duration, Vec::new());
        }

        let mut keyframes: Vec<&Keyframe> = sequence
            .keyframes
            .iter()
            .filter(|kf| {
                let valid = kf.time.is_finite() && kf.time >= 0.0;
                if !valid {
                    log::warn!("Dropping keyframe with invalid time {}", kf.time);
                }
                valid
            })
            .collect();
        keyframes.sort_by(|a, b| a.time.abs().total_cmp(&b.time.abs()));

        let mut rotations = Channels::<Quat>::new();
        let mut positions = Channels::<Vec3>::new();
        let mut paths: BTreeMap<BoneId, Option<String>> = BTreeMap::new();

        for keyframe in keyframes {
            // abs() folds -0.0 onto 0.0
            let time = keyframe.time.abs();

            for (&bone, entry) in &keyframe.pose {
                let path = paths.entry(bone).or_insert_with(|| {
                    let path = rig.bone_node(bone).and_then(|node| rig.node_path(node));
                    if path.is_none() {
                        log::debug!("Bone {bone} is not reachable on rig '{}'; skipping", rig.name);
                    }
                    path
                });
                let Some(path) = path.as_deref() else {
                    continue;
                };

                if let Some(rotation) = entry.rotation {
                    rotations.push(path, time, rotation);
                }
                if let Some(position) = entry.position {
                    positions.push(path, time, position);
                }
            }
        }

        let tracks: Vec<Track> = rotations
            .into_tracks(Track::rotation)
            .chain(positions.into_tracks(Track::translation))
            .collect();

        log::debug!(
            "Compiled timeline: {} keyframes -> {} tracks",
            sequence.keyframes.len(),
            tracks.len()
        );

        AnimationClip::with_duration(TIMELINE_CLIP_NAME, sequence.duration, tracks)
    }
}
