//! Procedural humanoid skeletons.
//!
//! Builds a bone hierarchy in bind pose from the canonical [`BoneId`]
//! parent table, with rest offsets in meters for a roughly 1.7 m tall
//! character facing +Z (its left side is +X). Used to fabricate rigs and
//! source skeletons that follow a given naming convention.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::humanoid::BoneId;
use crate::scene::{Node, NodeHandle, Scene};

/// Local rest offset of `bone` relative to its canonical parent.
#[must_use]
pub fn rest_offset(bone: BoneId) -> Vec3 {
    use BoneId::*;

    let side = match bone.side() {
        Some(crate::humanoid::Side::Right) => -1.0,
        _ => 1.0,
    };

    let base = match bone {
        Hips => Vec3::new(0.0, 0.95, 0.0),
        Spine => Vec3::new(0.0, 0.1, 0.0),
        Chest => Vec3::new(0.0, 0.12, 0.0),
        UpperChest => Vec3::new(0.0, 0.12, 0.0),
        Neck => Vec3::new(0.0, 0.15, 0.0),
        Head => Vec3::new(0.0, 0.1, 0.0),
        LeftEye | RightEye => Vec3::new(0.03, 0.06, 0.08),
        Jaw => Vec3::new(0.0, 0.0, 0.04),

        LeftShoulder | RightShoulder => Vec3::new(0.03, 0.1, 0.0),
        LeftUpperArm | RightUpperArm => Vec3::new(0.1, 0.0, 0.0),
        LeftLowerArm | RightLowerArm => Vec3::new(0.26, 0.0, 0.0),
        LeftHand | RightHand => Vec3::new(0.24, 0.0, 0.0),

        LeftThumbMetacarpal | RightThumbMetacarpal => Vec3::new(0.02, -0.01, 0.03),
        LeftIndexProximal | RightIndexProximal => Vec3::new(0.08, 0.0, 0.03),
        LeftMiddleProximal | RightMiddleProximal => Vec3::new(0.085, 0.0, 0.01),
        LeftRingProximal | RightRingProximal => Vec3::new(0.08, 0.0, -0.01),
        LeftLittleProximal | RightLittleProximal => Vec3::new(0.075, 0.0, -0.03),
        _ if bone.is_finger() => Vec3::new(0.025, 0.0, 0.0),

        LeftUpperLeg | RightUpperLeg => Vec3::new(0.09, -0.05, 0.0),
        LeftLowerLeg | RightLowerLeg => Vec3::new(0.0, -0.42, 0.0),
        LeftFoot | RightFoot => Vec3::new(0.0, -0.42, 0.0),
        LeftToes | RightToes => Vec3::new(0.0, -0.05, 0.12),

        _ => Vec3::ZERO,
    };

    Vec3::new(base.x * side, base.y, base.z)
}

/// Builds the bones in `bones` under `parent`, naming each node with
/// `naming`. A bone whose canonical parent is not in `bones` attaches to
/// the nearest included ancestor, or to `parent` when there is none; its
/// offset then accumulates the skipped ancestors' offsets.
///
/// Returns the bone-to-node map.
pub fn build_skeleton(
    scene: &mut Scene,
    parent: NodeHandle,
    bones: &[BoneId],
    naming: impl Fn(BoneId) -> String,
) -> BTreeMap<BoneId, NodeHandle> {
    let mut map = BTreeMap::new();

    for &bone in BoneId::ALL.iter().filter(|b| bones.contains(b)) {
        let mut offset = rest_offset(bone);
        let mut ancestor = bone.parent();
        let attach_to = loop {
            match ancestor {
                Some(a) if map.contains_key(&a) => break map[&a],
                Some(a) => {
                    offset += rest_offset(a);
                    ancestor = a.parent();
                }
                None => break parent,
            }
        };

        let mut node = Node::with_name(naming(bone));
        node.transform.position = offset;
        let handle = scene.add_to_parent(node, attach_to);
        map.insert(bone, handle);
    }

    map
}

/// Every bone except eyes, jaw and fingers.
#[must_use]
pub fn body_bones() -> Vec<BoneId> {
    BoneId::ALL
        .iter()
        .copied()
        .filter(|b| !b.is_finger() && !matches!(b, BoneId::LeftEye | BoneId::RightEye | BoneId::Jaw))
        .collect()
}
