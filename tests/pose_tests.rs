//! Pose Sampling & Application Tests
//!
//! Tests for:
//! - PoseSampler determinism, rotation-only output, empty inputs
//! - PoseApplier idempotence and implicit reset
//! - Normalized / legacy adapter equivalence
//! - Scene rotation independence
//! - Camera framing after application

mod common;

use glam::{Quat, Vec3};

use poselab::animation::{AnimationClip, KeyframeTrack, Track};
use poselab::errors::PoseLabError;
use poselab::humanoid::{BoneId, PoseApi, Rig};
use poselab::pose::{EulerDegrees, Pose, PoseApplier, PoseSampler};
use poselab::retarget::NameConvention;
use poselab::scene::{Camera, FramingConfig, Node, Scene};

use common::*;

fn pose_a() -> Pose {
    Pose::new()
        .with_rotation(BoneId::LeftUpperArm, sample_rotation(1.0))
        .with_rotation(BoneId::Spine, sample_rotation(0.5))
        .with_position(BoneId::Hips, Vec3::new(0.0, -0.2, 0.1))
}

fn pose_b() -> Pose {
    Pose::new()
        .with_rotation(BoneId::Head, sample_rotation(-1.0))
        .with_rotation(BoneId::RightLowerLeg, sample_rotation(2.0))
}

fn motion_tracks() -> Vec<Track> {
    vec![
        mixamo_rotation(BoneId::Hips, sample_rotation(1.0)),
        mixamo_rotation(BoneId::LeftLowerArm, sample_rotation(2.0)),
        mixamo_rotation(BoneId::RightUpperLeg, sample_rotation(-1.5)),
        mixamo_translation(BoneId::Hips, vec![0.0, 1.0], vec![Vec3::Y, Vec3::new(0.0, 1.2, 0.3)]),
        Track::scale(mixamo_name(BoneId::Head), KeyframeTrack::linear(vec![0.0], vec![Vec3::splat(2.0)])),
        Track::rotation("Camera", KeyframeTrack::linear(vec![0.0], vec![sample_rotation(4.0)])),
    ]
}

// ============================================================================
// PoseSampler
// ============================================================================

#[test]
fn sampler_takes_first_stored_keyframe() {
    let track = Track::rotation(
        mixamo_name(BoneId::Neck),
        KeyframeTrack::linear(vec![0.5, 1.0], vec![sample_rotation(1.0), sample_rotation(3.0)]),
    );
    let pose = PoseSampler::new().sample_first_frame(&[track], &NameConvention::MIXAMO);

    assert_eq!(pose.len(), 1);
    assert!(quat_approx(pose.rotation(BoneId::Neck).unwrap(), sample_rotation(1.0)));
}

#[test]
fn sampler_is_deterministic_across_calls() {
    let tracks = motion_tracks();
    let sampler = PoseSampler::new();

    let first = sampler.sample_first_frame(&tracks, &NameConvention::MIXAMO);
    let second = sampler.sample_first_frame(&tracks, &NameConvention::MIXAMO);
    let fresh = PoseSampler::new().sample_first_frame(&tracks, &NameConvention::MIXAMO);

    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn sample_at_does_not_depend_on_previous_times() {
    let clip = AnimationClip::new("walk", motion_tracks());
    let mut playing = PoseSampler::new();

    // Forward playback, a loop wrap and a scrub back
    for &time in &[0.0, 0.25, 0.5, 0.75, 1.0, 0.1, 0.9, 0.3] {
        let reused = playing.sample_at(&clip, time, &NameConvention::MIXAMO);
        let fresh = PoseSampler::new().sample_at(&clip, time, &NameConvention::MIXAMO);
        assert_eq!(reused, fresh, "t={time}");
    }
}

#[test]
fn sampler_output_is_rotation_only() {
    let pose = PoseSampler::new().sample_first_frame(&motion_tracks(), &NameConvention::MIXAMO);

    assert_eq!(pose.position_count(), 0, "root translation must be ignored");
    assert_eq!(
        pose.bones().collect::<Vec<_>>(),
        vec![BoneId::Hips, BoneId::LeftLowerArm, BoneId::RightUpperLeg]
    );
    assert!(pose.scene_rotation().is_none());
}

#[test]
fn sampler_later_duplicate_track_wins() {
    let tracks = vec![
        mixamo_rotation(BoneId::Head, sample_rotation(1.0)),
        Track::rotation("mixamorig:Head", KeyframeTrack::linear(vec![0.0], vec![sample_rotation(2.0)])),
    ];
    let pose = PoseSampler::new().sample_first_frame(&tracks, &NameConvention::MIXAMO);
    assert!(quat_approx(pose.rotation(BoneId::Head).unwrap(), sample_rotation(2.0)));
}

#[test]
fn sampler_empty_input_gives_empty_pose() {
    let sampler = PoseSampler::new();
    let pose = sampler.sample_first_frame(&[], &NameConvention::MIXAMO);
    assert!(pose.is_empty());

    let pose = sampler.sample_clip(&AnimationClip::new("empty", Vec::new()), &NameConvention::MIXAMO);
    assert!(pose.is_empty());
    assert!(matches!(PoseSampler::require_pose(pose), Err(PoseLabError::EmptyPose)));
}

#[test]
fn sampler_skips_tracks_without_keyframes() {
    let tracks = vec![Track::rotation(
        mixamo_name(BoneId::Head),
        KeyframeTrack::linear(Vec::new(), Vec::new()),
    )];
    assert!(PoseSampler::new().sample_first_frame(&tracks, &NameConvention::MIXAMO).is_empty());
}

#[test]
fn sample_at_interpolates_and_keeps_root_translation() {
    let clip = AnimationClip::new("walk", motion_tracks());
    let pose = PoseSampler::new().sample_at(&clip, 0.5, &NameConvention::MIXAMO);

    let hips = pose.get(BoneId::Hips).unwrap();
    assert!(vec3_approx(hips.position.unwrap(), Vec3::new(0.0, 1.1, 0.15)));
    assert!(!pose.contains(BoneId::Head), "scale tracks are not pose data");
}

// ============================================================================
// PoseApplier
// ============================================================================

#[test]
fn apply_writes_rest_relative_rotations() {
    let mut rig = avatar(PoseApi::Normalized);
    PoseApplier::apply(&pose_a(), &mut rig).unwrap();

    assert!(quat_approx(
        rig.bone_local_rotation(BoneId::LeftUpperArm).unwrap(),
        sample_rotation(1.0)
    ));
    assert!(vec3_approx(hips_local_position(&rig), Vec3::new(0.0, 0.95 - 0.2, 0.1)));
    assert!(quat_approx(rig.bone_local_rotation(BoneId::Head).unwrap(), Quat::IDENTITY));
}

#[test]
fn apply_reset_apply_is_idempotent() {
    let mut rig = avatar(PoseApi::Normalized);

    PoseApplier::apply(&pose_a(), &mut rig).unwrap();
    let after_a = local_rotations(&rig);
    let hips_after_a = hips_local_position(&rig);

    PoseApplier::apply(&pose_b(), &mut rig).unwrap();
    PoseApplier::apply(&pose_a(), &mut rig).unwrap();

    let again = local_rotations(&rig);
    assert_eq!(after_a.len(), again.len());
    for (bone, rotation) in &after_a {
        assert!(quat_approx(*rotation, again[bone]), "{bone} differs");
    }
    assert!(vec3_approx(hips_after_a, hips_local_position(&rig)));
}

#[test]
fn bones_absent_from_new_pose_revert_to_bind_pose() {
    let mut rig = avatar(PoseApi::Legacy);
    let bind = local_rotations(&rig);
    let bind_hips = hips_local_position(&rig);

    PoseApplier::apply(&pose_a(), &mut rig).unwrap();
    PoseApplier::apply(&pose_b(), &mut rig).unwrap();

    assert!(quat_approx(rig.bone_local_rotation(BoneId::LeftUpperArm).unwrap(), bind[&BoneId::LeftUpperArm]));
    assert!(quat_approx(rig.bone_local_rotation(BoneId::Spine).unwrap(), bind[&BoneId::Spine]));
    assert!(vec3_approx(hips_local_position(&rig), bind_hips));
    assert!(quat_approx(rig.bone_local_rotation(BoneId::Head).unwrap(), sample_rotation(-1.0)));
}

#[test]
fn empty_pose_resets_to_bind_pose() {
    let mut rig = avatar(PoseApi::Normalized);
    let bind = local_rotations(&rig);

    PoseApplier::apply(&pose_a(), &mut rig).unwrap();
    PoseApplier::apply(&Pose::new(), &mut rig).unwrap();

    for (bone, rotation) in local_rotations(&rig) {
        assert!(quat_approx(rotation, bind[&bone]), "{bone} not at bind pose");
    }
}

#[test]
fn normalized_and_legacy_adapters_agree() {
    let mut normalized = avatar(PoseApi::Normalized);
    let mut legacy = avatar(PoseApi::Legacy);

    for pose in [pose_a(), pose_b(), pose_a().with_scene_rotation(EulerDegrees::yaw(90.0))] {
        PoseApplier::apply(&pose, &mut normalized).unwrap();
        PoseApplier::apply(&pose, &mut legacy).unwrap();

        let n = local_rotations(&normalized);
        let l = local_rotations(&legacy);
        for (bone, rotation) in &n {
            assert!(quat_approx(*rotation, l[bone]), "{bone} differs between adapters");
        }
        assert!(vec3_approx(hips_local_position(&normalized), hips_local_position(&legacy)));
        assert_eq!(normalized.current_pose().unwrap().len(), legacy.current_pose().unwrap().len());
    }
}

#[test]
fn scene_rotation_only_turns_the_root() {
    let mut plain = avatar(PoseApi::Normalized);
    let mut turned = avatar(PoseApi::Normalized);

    PoseApplier::apply(&pose_a(), &mut plain).unwrap();
    PoseApplier::apply(&pose_a().with_scene_rotation(EulerDegrees::yaw(180.0)), &mut turned).unwrap();

    let p = local_rotations(&plain);
    let t = local_rotations(&turned);
    for (bone, rotation) in &p {
        assert!(quat_approx(*rotation, t[bone]), "{bone} changed with scene rotation");
    }
    assert!(quat_approx(plain.root_world_rotation(), Quat::IDENTITY));
    assert!(quat_approx(turned.root_world_rotation(), Quat::from_rotation_y(std::f32::consts::PI)));
}

#[test]
fn missing_scene_rotation_clears_previous_facing() {
    let mut rig = avatar(PoseApi::Normalized);
    PoseApplier::apply(&pose_a().with_scene_rotation(EulerDegrees::yaw(180.0)), &mut rig).unwrap();
    PoseApplier::apply(&pose_b(), &mut rig).unwrap();
    assert!(quat_approx(rig.root_world_rotation(), Quat::IDENTITY));
}

#[test]
fn bones_the_rig_lacks_are_skipped() {
    let mut rig = avatar(PoseApi::Legacy);
    let pose = pose_b()
        .with_rotation(BoneId::LeftIndexProximal, sample_rotation(3.0))
        .with_rotation(BoneId::Jaw, sample_rotation(1.0));

    PoseApplier::apply(&pose, &mut rig).unwrap();
    assert!(rig.bone_node(BoneId::LeftIndexProximal).is_none());
    assert!(quat_approx(rig.bone_local_rotation(BoneId::Head).unwrap(), sample_rotation(-1.0)));
}

#[test]
fn rig_without_humanoid_is_rejected_untouched() {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("Prop");
    let child = scene.add_to_parent(Node::with_name("J_hips"), root);
    let mut rig = Rig::new("Prop", scene, root);

    let result = PoseApplier::apply(&pose_a().with_scene_rotation(EulerDegrees::yaw(90.0)), &mut rig);
    assert!(matches!(result, Err(PoseLabError::HumanoidMissing(name)) if name == "Prop"));
    assert!(quat_approx(rig.root_world_rotation(), Quat::IDENTITY));
    assert!(quat_approx(rig.scene.get_node(child).unwrap().transform.rotation, Quat::IDENTITY));
}

#[test]
fn current_pose_reads_back_applied_pose() {
    let mut rig = avatar(PoseApi::Normalized);
    PoseApplier::apply(&pose_a(), &mut rig).unwrap();

    let read = rig.current_pose().unwrap();
    assert!(quat_approx(read.rotation(BoneId::LeftUpperArm).unwrap(), sample_rotation(1.0)));
    assert!(vec3_approx(
        read.get(BoneId::Hips).unwrap().position.unwrap(),
        Vec3::new(0.0, -0.2, 0.1)
    ));
    assert!(quat_approx(read.rotation(BoneId::Head).unwrap(), Quat::IDENTITY));
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn framing_centers_camera_on_posed_rig() {
    let mut rig = avatar(PoseApi::Normalized);
    PoseApplier::apply(&Pose::new(), &mut rig).unwrap();

    let mut camera = Camera::default();
    let config = FramingConfig::default();
    let distance = PoseApplier::frame(&rig, &mut camera, config);

    let bounds = rig.world_bounds().unwrap();
    assert!(distance > 0.0);
    assert!(vec3_approx(camera.target, bounds.center()));
    assert!(approx(camera.position.z - camera.target.z, distance));
    assert!(approx(distance, camera.fit_distance(bounds.size().y, config.padding)));
}
