//! Keyframe animation
//!
//! - tracks / clip: typed keyframe tracks grouped into clips
//! - action: playback clock for a clip
//! - timeline: compiles timestamped partial poses into a clip
//! - library: recorded clips

pub mod action;
pub mod binding;
pub mod clip;
pub mod library;
pub mod timeline;
pub mod tracks;
pub mod values;

pub use action::{AnimationAction, LoopMode};
pub use binding::TargetPath;
pub use clip::{AnimationClip, Track, TrackData, TrackMeta};
pub use library::{AnimationLibrary, RecordedAnimation};
pub use timeline::{Keyframe, KeyframeBone, TIMELINE_CLIP_NAME, TimelineCompiler, TimelineSequence};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
