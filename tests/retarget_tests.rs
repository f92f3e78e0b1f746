//! Clip Retargeting Tests
//!
//! Tests for:
//! - Rotation conversion through source rest frames
//! - Hips translation scaling
//! - Legacy rig axis flip
//! - Dropped tracks and missing prerequisites

mod common;

use glam::{EulerRot, Quat, Vec3};

use poselab::animation::{InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData};
use poselab::errors::PoseLabError;
use poselab::humanoid::skeleton::body_bones;
use poselab::humanoid::{BoneId, PoseApi, Rig};
use poselab::pose::PoseSampler;
use poselab::retarget::{NameConvention, RetargetOptions, RigBoneNames, SourceMotion, retarget_clip};
use poselab::scene::{Node, Scene};

use common::*;

fn retarget(motion: &SourceMotion, rig: &Rig) -> poselab::animation::AnimationClip {
    let clip = motion.first_clip().unwrap();
    retarget_clip(motion, clip, rig, &NameConvention::MIXAMO, RetargetOptions::for_rig(rig)).unwrap()
}

fn first_rotation(clip: &poselab::animation::AnimationClip, path: &str) -> Quat {
    let track = clip
        .tracks
        .iter()
        .find(|t| t.meta.node_name == path && t.meta.target == TargetPath::Rotation)
        .unwrap_or_else(|| panic!("no rotation track for {path}"));
    match &track.data {
        TrackData::Quaternion(keys) => keys.first_value().unwrap(),
        TrackData::Vector3(_) => panic!("unexpected vector data"),
    }
}

fn first_translation(clip: &poselab::animation::AnimationClip) -> Vec3 {
    let track = clip
        .tracks
        .iter()
        .find(|t| t.meta.target == TargetPath::Translation)
        .expect("no translation track");
    match &track.data {
        TrackData::Vector3(keys) => keys.first_value().unwrap(),
        TrackData::Quaternion(_) => panic!("unexpected quaternion data"),
    }
}

fn bone_path(rig: &Rig, bone: BoneId) -> String {
    rig.node_path(rig.bone_node(bone).unwrap()).unwrap()
}

// ============================================================================
// Rotations
// ============================================================================

#[test]
fn aligned_rest_frames_pass_rotations_through() {
    let rig = avatar(PoseApi::Normalized);
    let q = sample_rotation(1.0);
    let motion = mixamo_motion("wave", vec![mixamo_rotation(BoneId::LeftUpperArm, q)]);

    let clip = retarget(&motion, &rig);
    assert_eq!(clip.tracks.len(), 1);
    assert!(quat_approx(first_rotation(&clip, &bone_path(&rig, BoneId::LeftUpperArm)), q));
}

#[test]
fn source_rest_pose_maps_to_identity() {
    let (mut scene, root, bones) = mixamo_skeleton();
    let hips_rest = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    let spine_rest = Quat::from_euler(EulerRot::XYZ, 0.5, 0.0, 0.2);
    scene.get_node_mut(bones[&BoneId::Hips]).unwrap().transform.rotation = hips_rest;
    scene.get_node_mut(bones[&BoneId::Spine]).unwrap().transform.rotation = spine_rest;

    let tracks = vec![
        mixamo_rotation(BoneId::Hips, hips_rest),
        mixamo_rotation(BoneId::Spine, spine_rest),
        mixamo_rotation(BoneId::Chest, Quat::IDENTITY),
    ];
    let motion = SourceMotion::new(
        "rest",
        scene,
        root,
        vec![poselab::animation::AnimationClip::new("rest", tracks)],
    );

    let rig = avatar(PoseApi::Normalized);
    let clip = retarget(&motion, &rig);
    for bone in [BoneId::Hips, BoneId::Spine, BoneId::Chest] {
        assert!(
            quat_approx(first_rotation(&clip, &bone_path(&rig, bone)), Quat::IDENTITY),
            "{bone} not at identity"
        );
    }
}

#[test]
fn legacy_rigs_flip_x_and_z() {
    let rig = avatar(PoseApi::Legacy);
    let q = sample_rotation(1.0);
    let motion = mixamo_motion("wave", vec![mixamo_rotation(BoneId::Head, q)]);

    let clip = retarget(&motion, &rig);
    let expected = Quat::from_xyzw(-q.x, q.y, -q.z, q.w);
    assert!(quat_approx(first_rotation(&clip, &bone_path(&rig, BoneId::Head)), expected));
}

#[test]
fn keyframe_times_and_interpolation_survive() {
    let rig = avatar(PoseApi::Normalized);
    let track = Track::rotation(
        mixamo_name(BoneId::Neck),
        KeyframeTrack::new(
            vec![0.0, 0.5, 1.0],
            vec![sample_rotation(0.0), sample_rotation(1.0), sample_rotation(2.0)],
            InterpolationMode::Step,
        ),
    );
    let motion = mixamo_motion("nod", vec![track]);

    let clip = retarget(&motion, &rig);
    assert_eq!(clip.name, "nod");
    assert!(approx(clip.duration, 1.0));

    let TrackData::Quaternion(keys) = &clip.tracks[0].data else {
        panic!("expected rotation data");
    };
    assert_eq!(keys.times, vec![0.0, 0.5, 1.0]);
    assert_eq!(keys.interpolation, InterpolationMode::Step);
}

// ============================================================================
// Hips translation
// ============================================================================

#[test]
fn hips_translation_is_scaled_by_height_ratio() {
    // Source hips rest at 0.95, rig hips at 1.9
    let rig = avatar_with(PoseApi::Normalized, &body_bones(), Some(1.9));
    let motion = mixamo_motion(
        "jump",
        vec![mixamo_translation(
            BoneId::Hips,
            vec![0.0, 1.0],
            vec![Vec3::new(0.0, 1.05, 0.1), Vec3::new(0.0, 0.95, 0.0)],
        )],
    );

    let clip = retarget(&motion, &rig);
    assert!(vec3_approx(first_translation(&clip), Vec3::new(0.0, 0.2, 0.2)));
}

#[test]
fn translation_on_other_bones_is_dropped() {
    let rig = avatar(PoseApi::Normalized);
    let motion = mixamo_motion(
        "slide",
        vec![
            mixamo_translation(BoneId::LeftHand, vec![0.0], vec![Vec3::X]),
            Track::scale(mixamo_name(BoneId::Hips), KeyframeTrack::linear(vec![0.0], vec![Vec3::ONE])),
        ],
    );
    assert!(retarget(&motion, &rig).is_empty());
}

// ============================================================================
// Dropped tracks & prerequisites
// ============================================================================

#[test]
fn unresolvable_tracks_are_dropped() {
    let rig = avatar(PoseApi::Normalized);
    let motion = mixamo_motion(
        "mixed",
        vec![
            Track::rotation("Camera", KeyframeTrack::linear(vec![0.0], vec![sample_rotation(1.0)])),
            // Rig has no fingers
            mixamo_rotation(BoneId::LeftIndexProximal, sample_rotation(1.0)),
            mixamo_rotation(BoneId::Neck, sample_rotation(2.0)),
        ],
    );

    let clip = retarget(&motion, &rig);
    assert_eq!(clip.tracks.len(), 1);
    assert_eq!(clip.tracks[0].meta.node_name, bone_path(&rig, BoneId::Neck));
}

#[test]
fn retargeted_clip_samples_into_rig_pose() {
    let rig = avatar(PoseApi::Normalized);
    let motion = mixamo_motion(
        "pose",
        vec![
            mixamo_rotation(BoneId::LeftLowerArm, sample_rotation(1.0)),
            mixamo_rotation(BoneId::RightUpperLeg, sample_rotation(-1.0)),
        ],
    );

    let clip = retarget(&motion, &rig);
    let pose = PoseSampler::new().sample_clip(&clip, &RigBoneNames::from_rig(&rig));
    assert_eq!(pose.len(), 2);
    assert!(quat_approx(pose.rotation(BoneId::LeftLowerArm).unwrap(), sample_rotation(1.0)));
}

#[test]
fn rig_without_humanoid_fails() {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("Prop");
    scene.add_to_parent(Node::with_name("J_hips"), root);
    let rig = Rig::new("Prop", scene, root);

    let motion = mixamo_motion("wave", vec![mixamo_rotation(BoneId::Head, sample_rotation(1.0))]);
    let clip = motion.first_clip().unwrap();
    let result = retarget_clip(&motion, clip, &rig, &NameConvention::MIXAMO, RetargetOptions::default());
    assert!(matches!(result, Err(PoseLabError::HumanoidMissing(_))));
}

#[test]
fn motion_without_clips_reports_no_animation() {
    let (scene, root, _) = mixamo_skeleton();
    let motion = SourceMotion::new("idle.glb", scene, root, Vec::new());
    assert!(matches!(motion.first_clip(), Err(PoseLabError::NoAnimation(name)) if name == "idle.glb"));
}
