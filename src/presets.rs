//! Reaction presets: a pose, a facial expression and a backdrop bundled
//! under one id, plus the name-based picker that assigns one to a user.

use serde::{Deserialize, Serialize};

use crate::humanoid::Rig;
use crate::pose::PoseId;

/// Facial expression of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionId {
    Calm,
    Joy,
    Surprise,
}

/// Expression channels a preset drives on the rig.
pub const EXPRESSION_CHANNELS: [&str; 3] = ["Joy", "Surprised", "Angry"];

impl ExpressionId {
    /// Weights for every channel in [`EXPRESSION_CHANNELS`].
    #[must_use]
    pub fn weights(self) -> [(&'static str, f32); 3] {
        let (joy, surprised) = match self {
            ExpressionId::Calm => (0.0, 0.0),
            ExpressionId::Joy => (0.8, 0.0),
            ExpressionId::Surprise => (0.0, 0.9),
        };
        [("Joy", joy), ("Surprised", surprised), ("Angry", 0.0)]
    }

    /// Clears every preset channel on `rig`, then sets this expression.
    pub fn apply(self, rig: &mut Rig) {
        for (channel, weight) in self.weights() {
            rig.set_expression(channel, weight);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundId {
    Midnight,
    Sunset,
    Matrix,
}

impl BackgroundId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BackgroundId::Midnight => "midnight",
            BackgroundId::Sunset => "sunset",
            BackgroundId::Matrix => "matrix",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionPreset {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub pose: PoseId,
    pub expression: ExpressionId,
    pub background: BackgroundId,
}

pub const REACTION_PRESETS: [ReactionPreset; 8] = [
    ReactionPreset {
        id: "dawn-runner",
        label: "Dawn Runner",
        description: "Calm focus for reconnaissance briefs.",
        pose: PoseId::DawnRunner,
        expression: ExpressionId::Calm,
        background: BackgroundId::Midnight,
    },
    ReactionPreset {
        id: "green-loom",
        label: "Green Loom",
        description: "Uplifted joy for alliance announcements.",
        pose: PoseId::GreenLoom,
        expression: ExpressionId::Joy,
        background: BackgroundId::Matrix,
    },
    ReactionPreset {
        id: "sunset-call",
        label: "Sunset Call",
        description: "Warm surprise for incoming intel.",
        pose: PoseId::SunsetCall,
        expression: ExpressionId::Surprise,
        background: BackgroundId::Sunset,
    },
    ReactionPreset {
        id: "cipher-whisper",
        label: "Cipher Whisper",
        description: "Quiet intel relay with a hand-over-comms hush.",
        pose: PoseId::CipherWhisper,
        expression: ExpressionId::Calm,
        background: BackgroundId::Midnight,
    },
    ReactionPreset {
        id: "nebula-drift",
        label: "Nebula Drift",
        description: "Zero-G serenity for meditative uplinks.",
        pose: PoseId::NebulaDrift,
        expression: ExpressionId::Joy,
        background: BackgroundId::Matrix,
    },
    ReactionPreset {
        id: "loom-vanguard",
        label: "Loom Vanguard",
        description: "Hands-on-hips command stance for rally calls.",
        pose: PoseId::LoomVanguard,
        expression: ExpressionId::Calm,
        background: BackgroundId::Sunset,
    },
    ReactionPreset {
        id: "signal-reverie",
        label: "Signal Reverie",
        description: "Introverted kinetic energy, eyes toward the floor.",
        pose: PoseId::SignalReverie,
        expression: ExpressionId::Surprise,
        background: BackgroundId::Midnight,
    },
    ReactionPreset {
        id: "protocol-enforcer",
        label: "Protocol Enforcer",
        description: "Squared shoulders, ready stance for field ops.",
        pose: PoseId::ProtocolEnforcer,
        expression: ExpressionId::Calm,
        background: BackgroundId::Matrix,
    },
];

#[must_use]
pub fn default_preset() -> &'static ReactionPreset {
    &REACTION_PRESETS[0]
}

#[must_use]
pub fn find_preset_by_id(id: &str) -> Option<&'static ReactionPreset> {
    REACTION_PRESETS.iter().find(|preset| preset.id == id)
}

/// Picks a preset for a user-supplied name.
///
/// A name mentioning a preset id (with its dash read as a space, e.g.
/// "the green loom crew") gets that preset. Any other name is hashed by
/// summing its UTF-16 code units, so the same name always gets the same
/// preset. An empty name gets the default preset.
#[must_use]
pub fn pick_preset_for_name(name: &str) -> &'static ReactionPreset {
    if name.is_empty() {
        return default_preset();
    }
    let normalized = name.trim().to_lowercase();

    if let Some(hit) = REACTION_PRESETS
        .iter()
        .find(|preset| normalized.contains(&preset.id.replacen('-', " ", 1)))
    {
        return hit;
    }

    let hash: usize = normalized.encode_utf16().map(usize::from).sum();
    &REACTION_PRESETS[hash % REACTION_PRESETS.len()]
}
