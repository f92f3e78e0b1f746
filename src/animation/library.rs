use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::animation::clip::AnimationClip;

/// A clip recorded by the user, with bookkeeping for listing.
#[derive(Debug, Clone)]
pub struct RecordedAnimation {
    pub id: Uuid,
    pub name: String,
    /// Milliseconds since the Unix epoch at recording time.
    pub date: u64,
    pub duration: f32,
    pub clip: Arc<AnimationClip>,
}

/// In-memory store of recorded clips, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    animations: Vec<RecordedAnimation>,
}

impl AnimationLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `clip` under `name` and returns its new id.
    pub fn add(&mut self, clip: AnimationClip, name: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        let date = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);

        self.animations.push(RecordedAnimation {
            id,
            name: name.into(),
            date,
            duration: clip.duration,
            clip: Arc::new(clip),
        });
        id
    }

    /// Removes the recording with `id`; returns whether one was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.animations.len();
        self.animations.retain(|a| a.id != id);
        self.animations.len() != before
    }

    pub fn clear(&mut self) {
        self.animations.clear();
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&RecordedAnimation> {
        self.animations.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordedAnimation> {
        self.animations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
