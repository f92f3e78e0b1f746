use glam::{Quat, Vec3};

use crate::animation::binding::TargetPath;
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};

/// Which node and property a track drives. `node_name` is a slash-separated
/// path relative to the animated root, or a bare node name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackMeta {
    pub node_name: String,
    pub target: TargetPath,
}

impl TrackMeta {
    #[must_use]
    pub fn new(node_name: impl Into<String>, target: TargetPath) -> Self {
        Self {
            node_name: node_name.into(),
            target,
        }
    }

    /// Binding name in `path.property` form, e.g. `Armature/Hips.quaternion`.
    #[must_use]
    pub fn binding_name(&self) -> String {
        format!("{}.{}", self.node_name, self.target.property_name())
    }

    /// Parses a `path.property` binding name. The property is split at the
    /// last dot so node names may contain dots.
    #[must_use]
    pub fn parse_binding_name(name: &str) -> Option<Self> {
        let (node_name, property) = name.rsplit_once('.')?;
        let target = TargetPath::from_property_name(property)?;
        Some(Self::new(node_name, target))
    }

    /// Last path segment of `node_name`.
    #[must_use]
    pub fn leaf_name(&self) -> &str {
        self.node_name.rsplit('/').next().unwrap_or(&self.node_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
}

impl TrackData {
    #[must_use]
    pub fn times(&self) -> &[f32] {
        match self {
            Self::Vector3(track) => &track.times,
            Self::Quaternion(track) => &track.times,
        }
    }

    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        match self {
            Self::Vector3(track) => track.interpolation,
            Self::Quaternion(track) => track.interpolation,
        }
    }

    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            Self::Vector3(track) => track.end_time(),
            Self::Quaternion(track) => track.end_time(),
        }
    }
}

/// A track: which property it drives plus its keyframes.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub meta: TrackMeta,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn rotation(node_name: impl Into<String>, track: KeyframeTrack<Quat>) -> Self {
        Self {
            meta: TrackMeta::new(node_name, TargetPath::Rotation),
            data: TrackData::Quaternion(track),
        }
    }

    #[must_use]
    pub fn translation(node_name: impl Into<String>, track: KeyframeTrack<Vec3>) -> Self {
        Self {
            meta: TrackMeta::new(node_name, TargetPath::Translation),
            data: TrackData::Vector3(track),
        }
    }

    #[must_use]
    pub fn scale(node_name: impl Into<String>, track: KeyframeTrack<Vec3>) -> Self {
        Self {
            meta: TrackMeta::new(node_name, TargetPath::Scale),
            data: TrackData::Vector3(track),
        }
    }

    #[must_use]
    pub fn binding_name(&self) -> String {
        self.meta.binding_name()
    }

    #[must_use]
    pub fn times(&self) -> &[f32] {
        self.data.times()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Builds a clip whose duration is the latest keyframe time of any track.
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// Builds a clip with an explicitly declared duration.
    #[must_use]
    pub fn with_duration(name: impl Into<String>, duration: f32, tracks: Vec<Track>) -> Self {
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// `true` when the clip carries no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First track with the given binding name.
    #[must_use]
    pub fn track_by_binding(&self, binding_name: &str) -> Option<&Track> {
        let meta = TrackMeta::parse_binding_name(binding_name)?;
        self.tracks.iter().find(|t| t.meta == meta)
    }
}
