//! Shared fixtures: procedural avatars and Mixamo motions.

#![allow(dead_code)]

use std::collections::BTreeMap;

use glam::{Quat, Vec3};

use poselab::animation::{AnimationClip, KeyframeTrack, Track};
use poselab::humanoid::skeleton::{body_bones, build_skeleton};
use poselab::humanoid::{BoneId, PoseApi, Rig};
use poselab::retarget::{NameConvention, SourceMotion};
use poselab::scene::{Node, NodeHandle, Scene};

pub const EPSILON: f32 = 1e-4;

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Same rotation, either sign.
pub fn quat_approx(a: Quat, b: Quat) -> bool {
    a.dot(b).abs() > 1.0 - EPSILON
}

pub fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

// ============================================================================
// Avatars
// ============================================================================

/// Node name of `bone` on fixture avatars.
pub fn avatar_joint_name(bone: BoneId) -> String {
    format!("J_{}", bone.as_str())
}

/// A body-only avatar (no fingers, eyes or jaw) under
/// `AvatarRoot/Armature`.
pub fn avatar(api: PoseApi) -> Rig {
    avatar_with(api, &body_bones(), None)
}

/// An avatar with the given bones and optionally a custom hips height.
pub fn avatar_with(api: PoseApi, bones: &[BoneId], hips_height: Option<f32>) -> Rig {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("AvatarRoot");
    let armature = scene.add_to_parent(Node::with_name("Armature"), root);
    let map = build_skeleton(&mut scene, armature, bones, avatar_joint_name);

    if let (Some(height), Some(&hips)) = (hips_height, map.get(&BoneId::Hips)) {
        scene.get_node_mut(hips).unwrap().transform.position.y = height;
    }
    scene.update_subtree(root);

    Rig::with_humanoid("Fixture Avatar", scene, root, &map, api)
}

/// Every bone's current local rotation, for before/after comparisons.
pub fn local_rotations(rig: &Rig) -> BTreeMap<BoneId, Quat> {
    BoneId::ALL
        .iter()
        .filter_map(|&bone| Some((bone, rig.bone_local_rotation(bone)?)))
        .collect()
}

pub fn hips_local_position(rig: &Rig) -> Vec3 {
    let hips = rig.bone_node(BoneId::Hips).unwrap();
    rig.scene.get_node(hips).unwrap().transform.position
}

// ============================================================================
// Mixamo motions
// ============================================================================

pub fn mixamo_name(bone: BoneId) -> &'static str {
    NameConvention::MIXAMO.source_name(bone).unwrap()
}

/// A Mixamo skeleton in bind pose under `Scene/Armature`.
pub fn mixamo_skeleton() -> (Scene, NodeHandle, BTreeMap<BoneId, NodeHandle>) {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("Scene");
    let armature = scene.add_to_parent(Node::with_name("Armature"), root);
    let map = build_skeleton(&mut scene, armature, &body_bones(), |b| mixamo_name(b).to_string());
    scene.update_subtree(root);
    (scene, root, map)
}

/// A motion with one clip made of `tracks`.
pub fn mixamo_motion(name: &str, tracks: Vec<Track>) -> SourceMotion {
    let (scene, root, _) = mixamo_skeleton();
    SourceMotion::new(name, scene, root, vec![AnimationClip::new(name, tracks)])
}

/// Single-keyframe rotation track on a Mixamo joint.
pub fn mixamo_rotation(bone: BoneId, rotation: Quat) -> Track {
    Track::rotation(mixamo_name(bone), KeyframeTrack::linear(vec![0.0], vec![rotation]))
}

pub fn mixamo_translation(bone: BoneId, times: Vec<f32>, values: Vec<Vec3>) -> Track {
    Track::translation(mixamo_name(bone), KeyframeTrack::linear(times, values))
}

/// A small pose used across tests.
pub fn sample_rotation(seed: f32) -> Quat {
    Quat::from_euler(glam::EulerRot::XYZ, 0.1 * seed, 0.2 * seed, -0.15 * seed)
}
