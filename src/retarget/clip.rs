//! Clip retargeting.
//!
//! Source rotations are first moved into a world-aligned frame using the
//! source skeleton's rest pose:
//!
//! ```text
//! q_aligned = parent_rest_world * q * rest_world⁻¹
//! ```
//!
//! and then into the rig's rest-relative pose space through the rig
//! bone's parent rest world rotation `P`: `pose = P⁻¹ * q_aligned * P`.
//! The hips translation becomes a displacement from the source rest
//! position, scaled by the ratio of rig hips height to source hips height.
//!
//! The resulting clip addresses the rig's bone nodes by path from the rig
//! root and holds pose-space values, so it can be sampled straight into a
//! [`Pose`](crate::pose::Pose) with [`RigBoneNames`](super::RigBoneNames).

use glam::{Quat, Vec3};

use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData};
use crate::errors::Result;
use crate::humanoid::{BoneId, PoseApi, Rig};
use crate::retarget::SourceMotion;
use crate::retarget::names::BoneNameResolver;
use crate::scene::NodeHandle;

const MIN_HIPS_HEIGHT: f32 = 1e-4;

/// Per-rig adjustments applied while retargeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetargetOptions {
    /// Negate the x and z components of rotations and translations, for
    /// rigs modelled facing -Z.
    pub flip_xz: bool,
}

impl RetargetOptions {
    /// Options suited to `rig`. Legacy (VRM 0.x) rigs face -Z.
    #[must_use]
    pub fn for_rig(rig: &Rig) -> Self {
        let flip_xz = rig.humanoid().is_ok_and(|h| h.api() == PoseApi::Legacy);
        Self { flip_xz }
    }
}

/// Retargets `clip`, authored against `source`, onto `rig`.
///
/// Tracks whose node does not resolve to a bone, whose bone the rig lacks,
/// or whose node is missing from the source skeleton are dropped, as are
/// scale tracks and translation tracks on bones other than the hips.
pub fn retarget_clip(
    source: &SourceMotion,
    clip: &AnimationClip,
    rig: &Rig,
    resolver: &dyn BoneNameResolver,
    options: RetargetOptions,
) -> Result<AnimationClip> {
    let humanoid = rig.humanoid()?;
    let hips_scale = hips_height_ratio(source, rig, resolver);

    let mut tracks = Vec::with_capacity(clip.tracks.len());

    for track in &clip.tracks {
        let Some(bone) = resolver.resolve_node_path(&track.meta.node_name) else {
            log::debug!("Retarget: '{}' is not a known joint; dropped", track.meta.node_name);
            continue;
        };
        let (Some(rig_node), Some(rest)) = (humanoid.bone_node(bone), humanoid.rest(bone)) else {
            log::debug!("Retarget: rig '{}' has no {bone}; dropped", rig.name);
            continue;
        };
        let Some(path) = rig.node_path(rig_node) else {
            continue;
        };
        let Some(source_node) = source
            .scene
            .find_by_path(source.root, &track.meta.node_name)
            .or_else(|| source.scene.find_by_name(source.root, track.meta.leaf_name()))
        else {
            log::debug!("Retarget: '{}' missing from source skeleton; dropped", track.meta.node_name);
            continue;
        };

        let rig_parent = rest.parent_world_rotation;
        let rig_parent_inv = rig_parent.inverse();

        match (&track.data, track.meta.target) {
            (TrackData::Quaternion(keys), TargetPath::Rotation) => {
                let (parent_rest_world, rest_world_inv) = source_rest_frame(source, source_node);
                let values = keys
                    .values
                    .iter()
                    .map(|&q| {
                        let aligned = parent_rest_world * q * rest_world_inv;
                        flip_quat(rig_parent_inv * aligned * rig_parent, options.flip_xz)
                    })
                    .collect();
                tracks.push(Track::rotation(path, KeyframeTrack::new(keys.times.clone(), values, keys.interpolation)));
            }
            (TrackData::Vector3(keys), TargetPath::Translation) if bone == BoneId::Hips => {
                let rest_position = source
                    .scene
                    .get_node(source_node)
                    .map_or(Vec3::ZERO, |n| n.transform.position);
                let (parent_rest_world, _) = source_rest_frame(source, source_node);
                let cubic = keys.interpolation == InterpolationMode::CubicSpline;

                let values = keys
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| {
                        // Cubic tangents are derivatives: scale only
                        let delta = if cubic && i % 3 != 1 { v } else { v - rest_position };
                        let aligned = parent_rest_world * (delta * hips_scale);
                        flip_vec(rig_parent_inv * aligned, options.flip_xz)
                    })
                    .collect();
                tracks.push(Track::translation(path, KeyframeTrack::new(keys.times.clone(), values, keys.interpolation)));
            }
            _ => {
                log::debug!("Retarget: '{}' not retargetable; dropped", track.binding_name());
            }
        }
    }

    log::debug!(
        "Retargeted '{}' onto '{}': {} of {} tracks kept",
        clip.name,
        rig.name,
        tracks.len(),
        clip.tracks.len()
    );

    Ok(AnimationClip::with_duration(clip.name.clone(), clip.duration, tracks))
}

/// `(parent_rest_world, rest_world⁻¹)` of a source node.
fn source_rest_frame(source: &SourceMotion, node: NodeHandle) -> (Quat, Quat) {
    let scene = &source.scene;
    let rest_world = scene.compute_world_rotation(node).unwrap_or(Quat::IDENTITY);
    let parent_rest_world = scene
        .get_node(node)
        .and_then(|n| n.parent())
        .and_then(|p| scene.compute_world_rotation(p))
        .unwrap_or(Quat::IDENTITY);
    (parent_rest_world, rest_world.inverse())
}

/// Rig hips height above the rig root over source hips rest height.
/// Falls back to 1.0 when either height is unavailable or degenerate.
fn hips_height_ratio(source: &SourceMotion, rig: &Rig, resolver: &dyn BoneNameResolver) -> f32 {
    let source_height = source
        .scene
        .descendants(source.root)
        .into_iter()
        .find(|&h| {
            source
                .scene
                .get_name(h)
                .and_then(|name| resolver.resolve(name))
                == Some(BoneId::Hips)
        })
        .and_then(|h| source.scene.get_node(h))
        .map(|n| n.transform.position.y);

    let rig_height = rig.bone_node(BoneId::Hips).and_then(|hips| {
        let hips_y = rig.scene.compute_world_matrix(hips)?.translation.y;
        let root_y = rig.scene.compute_world_matrix(rig.root())?.translation.y;
        Some((hips_y - root_y).abs())
    });

    match (source_height, rig_height) {
        (Some(s), Some(r)) if s.abs() > MIN_HIPS_HEIGHT && r > MIN_HIPS_HEIGHT => r / s,
        _ => 1.0,
    }
}

fn flip_quat(q: Quat, flip: bool) -> Quat {
    if flip { Quat::from_xyzw(-q.x, q.y, -q.z, q.w) } else { q }
}

fn flip_vec(v: Vec3, flip: bool) -> Vec3 {
    if flip { Vec3::new(-v.x, v.y, -v.z) } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_negates_x_and_z() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);
        assert_eq!(flip_quat(q, true), Quat::from_xyzw(-0.1, 0.2, -0.3, 0.9));
        assert_eq!(flip_quat(q, false), q);
        assert_eq!(flip_vec(Vec3::new(1.0, 2.0, 3.0), true), Vec3::new(-1.0, 2.0, -3.0));
    }
}
