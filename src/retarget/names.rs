//! Joint-name resolution.
//!
//! Motion files and avatars name their joints differently. A
//! [`BoneNameResolver`] maps an asset's joint names to [`BoneId`]s:
//!
//! - [`NameConvention`]: prefix conventions such as Mixamo
//!   (`mixamorigLeftArm`, `mixamorig:LeftArm`)
//! - [`CanonicalBoneNames`]: names that already are canonical bone names
//! - [`RigBoneNames`]: the node names and paths of a loaded rig
//!
//! Unknown names resolve to `None`; resolution never fails.

use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};

use crate::animation::TrackMeta;
use crate::humanoid::{BoneId, Rig};
use crate::scene::{NodeHandle, Scene};

/// Maps joint names to canonical bones.
pub trait BoneNameResolver {
    /// Resolves a single joint name.
    fn resolve(&self, name: &str) -> Option<BoneId>;

    /// Resolves a slash-separated node path by its last segment.
    fn resolve_node_path(&self, path: &str) -> Option<BoneId> {
        let leaf = path.rsplit('/').next().unwrap_or(path);
        self.resolve(leaf)
    }

    /// Resolves a track binding name such as
    /// `Armature/mixamorig:Hips.quaternion`. Names without a recognised
    /// property suffix are treated as plain node paths.
    fn resolve_track_name(&self, binding_name: &str) -> Option<BoneId> {
        match TrackMeta::parse_binding_name(binding_name) {
            Some(meta) => self.resolve_node_path(&meta.node_name),
            None => self.resolve_node_path(binding_name),
        }
    }
}

// ============================================================================
// Prefix conventions
// ============================================================================

/// A joint naming convention of the form `<prefix><Suffix>`, with an
/// alternate `<prefix>:<Suffix>` spelling that some exporters produce.
#[derive(Debug, Clone, Copy)]
pub struct NameConvention {
    prefix: &'static str,
    /// Bare names (`<prefix><Suffix>`) and their bones.
    table: &'static [(&'static str, BoneId)],
}

const MIXAMO_TABLE: &[(&str, BoneId)] = &[
    ("mixamorigHips", BoneId::Hips),
    ("mixamorigSpine", BoneId::Spine),
    ("mixamorigSpine1", BoneId::Chest),
    ("mixamorigSpine2", BoneId::UpperChest),
    ("mixamorigNeck", BoneId::Neck),
    ("mixamorigHead", BoneId::Head),
    ("mixamorigLeftShoulder", BoneId::LeftShoulder),
    ("mixamorigLeftArm", BoneId::LeftUpperArm),
    ("mixamorigLeftForeArm", BoneId::LeftLowerArm),
    ("mixamorigLeftHand", BoneId::LeftHand),
    ("mixamorigLeftHandThumb1", BoneId::LeftThumbMetacarpal),
    ("mixamorigLeftHandThumb2", BoneId::LeftThumbProximal),
    ("mixamorigLeftHandThumb3", BoneId::LeftThumbDistal),
    ("mixamorigLeftHandIndex1", BoneId::LeftIndexProximal),
    ("mixamorigLeftHandIndex2", BoneId::LeftIndexIntermediate),
    ("mixamorigLeftHandIndex3", BoneId::LeftIndexDistal),
    ("mixamorigLeftHandMiddle1", BoneId::LeftMiddleProximal),
    ("mixamorigLeftHandMiddle2", BoneId::LeftMiddleIntermediate),
    ("mixamorigLeftHandMiddle3", BoneId::LeftMiddleDistal),
    ("mixamorigLeftHandRing1", BoneId::LeftRingProximal),
    ("mixamorigLeftHandRing2", BoneId::LeftRingIntermediate),
    ("mixamorigLeftHandRing3", BoneId::LeftRingDistal),
    ("mixamorigLeftHandPinky1", BoneId::LeftLittleProximal),
    ("mixamorigLeftHandPinky2", BoneId::LeftLittleIntermediate),
    ("mixamorigLeftHandPinky3", BoneId::LeftLittleDistal),
    ("mixamorigRightShoulder", BoneId::RightShoulder),
    ("mixamorigRightArm", BoneId::RightUpperArm),
    ("mixamorigRightForeArm", BoneId::RightLowerArm),
    ("mixamorigRightHand", BoneId::RightHand),
    ("mixamorigRightHandThumb1", BoneId::RightThumbMetacarpal),
    ("mixamorigRightHandThumb2", BoneId::RightThumbProximal),
    ("mixamorigRightHandThumb3", BoneId::RightThumbDistal),
    ("mixamorigRightHandIndex1", BoneId::RightIndexProximal),
    ("mixamorigRightHandIndex2", BoneId::RightIndexIntermediate),
    ("mixamorigRightHandIndex3", BoneId::RightIndexDistal),
    ("mixamorigRightHandMiddle1", BoneId::RightMiddleProximal),
    ("mixamorigRightHandMiddle2", BoneId::RightMiddleIntermediate),
    ("mixamorigRightHandMiddle3", BoneId::RightMiddleDistal),
    ("mixamorigRightHandRing1", BoneId::RightRingProximal),
    ("mixamorigRightHandRing2", BoneId::RightRingIntermediate),
    ("mixamorigRightHandRing3", BoneId::RightRingDistal),
    ("mixamorigRightHandPinky1", BoneId::RightLittleProximal),
    ("mixamorigRightHandPinky2", BoneId::RightLittleIntermediate),
    ("mixamorigRightHandPinky3", BoneId::RightLittleDistal),
    ("mixamorigLeftUpLeg", BoneId::LeftUpperLeg),
    ("mixamorigLeftLeg", BoneId::LeftLowerLeg),
    ("mixamorigLeftFoot", BoneId::LeftFoot),
    ("mixamorigLeftToeBase", BoneId::LeftToes),
    ("mixamorigRightUpLeg", BoneId::RightUpperLeg),
    ("mixamorigRightLeg", BoneId::RightLowerLeg),
    ("mixamorigRightFoot", BoneId::RightFoot),
    ("mixamorigRightToeBase", BoneId::RightToes),
];

impl NameConvention {
    /// Adobe Mixamo rigs.
    pub const MIXAMO: Self = Self::new("mixamorig", MIXAMO_TABLE);

    /// A convention from a prefix and a table of bare names. Every name in
    /// `table` must start with `prefix`.
    #[must_use]
    pub const fn new(prefix: &'static str, table: &'static [(&'static str, BoneId)]) -> Self {
        Self { prefix, table }
    }

    #[must_use]
    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Bones this convention names, in table order.
    pub fn bones(&self) -> impl Iterator<Item = BoneId> + '_ {
        self.table.iter().map(|&(_, bone)| bone)
    }

    /// The suffix of `name` in canonical capitalization, for either
    /// spelling. `None` when `name` does not carry the prefix.
    fn suffix_of<'a>(&self, name: &'a str) -> Option<(&'a str, bool)> {
        let rest = name.strip_prefix(self.prefix)?;
        match rest.strip_prefix(':') {
            Some(suffix) => Some((suffix, true)),
            None => Some((rest, false)),
        }
    }

    /// The convention's bare name for `bone`.
    #[must_use]
    pub fn source_name(&self, bone: BoneId) -> Option<&'static str> {
        self.table.iter().find(|&&(_, b)| b == bone).map(|&(name, _)| name)
    }

    /// `name` followed by its alternate spelling: bare names gain the colon
    /// form and colon names gain the bare form, the first suffix letter
    /// upper-cased in both. Names without the prefix have no alternate.
    #[must_use]
    pub fn name_variants(&self, name: &str) -> SmallVec<[String; 2]> {
        let mut variants: SmallVec<[String; 2]> = smallvec![name.to_string()];

        if let Some((suffix, colon)) = self.suffix_of(name) {
            let suffix = capitalize_first(suffix);
            let alternate = if colon {
                format!("{}{suffix}", self.prefix)
            } else {
                format!("{}:{suffix}", self.prefix)
            };
            if alternate != name {
                variants.push(alternate);
            }
        }

        variants
    }

    /// Finds the node below `root` named by any spelling of `name`, trying
    /// the spellings of [`name_variants`](Self::name_variants) in order.
    #[must_use]
    pub fn find_node_by_any_variant(&self, scene: &Scene, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        self.name_variants(name)
            .iter()
            .find_map(|candidate| scene.find_by_name(root, candidate))
    }

    /// Finds the node below `root` carrying `bone` under this convention.
    #[must_use]
    pub fn find_bone_node(&self, scene: &Scene, root: NodeHandle, bone: BoneId) -> Option<NodeHandle> {
        self.find_node_by_any_variant(scene, root, self.source_name(bone)?)
    }
}

impl BoneNameResolver for NameConvention {
    fn resolve(&self, name: &str) -> Option<BoneId> {
        let (suffix, _) = self.suffix_of(name)?;
        let suffix = capitalize_first(suffix);

        self.table
            .iter()
            .find(|&&(bare, _)| bare.get(self.prefix.len()..) == Some(suffix.as_str()))
            .map(|&(_, bone)| bone)
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Canonical names
// ============================================================================

/// Resolves canonical bone names (`leftUpperArm`) to themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalBoneNames;

impl BoneNameResolver for CanonicalBoneNames {
    fn resolve(&self, name: &str) -> Option<BoneId> {
        BoneId::from_name(name)
    }
}

// ============================================================================
// Rig node names
// ============================================================================

/// Resolves the node paths and node names of a rig's humanoid bones, as
/// produced by clip retargeting and timeline compilation.
#[derive(Debug, Clone, Default)]
pub struct RigBoneNames {
    by_path: FxHashMap<String, BoneId>,
    by_name: FxHashMap<String, BoneId>,
}

impl RigBoneNames {
    /// Indexes the humanoid bones of `rig`. A rig without a humanoid layer
    /// resolves nothing.
    #[must_use]
    pub fn from_rig(rig: &Rig) -> Self {
        let mut names = Self::default();
        let Ok(humanoid) = rig.humanoid() else {
            return names;
        };

        for bone in humanoid.bones() {
            let Some(node) = humanoid.bone_node(bone) else {
                continue;
            };
            if let Some(path) = rig.node_path(node) {
                names.by_path.insert(path, bone);
            }
            if let Some(name) = rig.scene.get_name(node) {
                names.by_name.entry(name.to_string()).or_insert(bone);
            }
        }

        names
    }
}

impl BoneNameResolver for RigBoneNames {
    fn resolve(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    fn resolve_node_path(&self, path: &str) -> Option<BoneId> {
        self.by_path.get(path).copied().or_else(|| {
            let leaf = path.rsplit('/').next().unwrap_or(path);
            self.resolve(leaf)
        })
    }
}
