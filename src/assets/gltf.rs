use std::borrow::Cow;
use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::animation::{AnimationClip, InterpolationMode, KeyframeTrack, TargetPath, Track, TrackData, TrackMeta};
use crate::errors::{PoseLabError, Result};
use crate::humanoid::{BoneId, PoseApi, Rig};
use crate::retarget::{NameConvention, SourceMotion};
use crate::scene::{NodeHandle, Scene};

/// Name of the synthetic node every loaded hierarchy hangs from.
pub const GLTF_ROOT_NAME: &str = "gltf_root";

/// Parses an avatar. The humanoid layer comes from the `VRMC_vrm` (1.0)
/// or `VRM` (0.x) extension; plain glTF rigs are matched by Mixamo joint
/// names. A file with neither yields a rig without a humanoid layer.
pub fn load_rig(name: &str, bytes: &[u8]) -> Result<Rig> {
    let loaded = GltfLoader::load(name, bytes)?;

    let humanoid = match &loaded.vrm {
        Some(vrm) => Some((vrm.api, loaded.map_vrm_bones(vrm))),
        None => loaded.match_mixamo_bones().map(|bones| (PoseApi::Normalized, bones)),
    };
    let rig_name = loaded
        .vrm
        .as_ref()
        .and_then(|vrm| vrm.title.clone())
        .unwrap_or_else(|| name.to_string());

    match humanoid {
        Some((api, bones)) => {
            log::info!("Loaded rig '{rig_name}' with {} humanoid bones ({api:?})", bones.len());
            Ok(Rig::with_humanoid(rig_name, loaded.scene, loaded.root, &bones, api))
        }
        None => {
            log::warn!("Asset '{name}' has no humanoid bone mapping");
            Ok(Rig::new(rig_name, loaded.scene, loaded.root))
        }
    }
}

/// Parses a motion file into its rest skeleton and animation clips.
pub fn load_source_motion(name: &str, bytes: &[u8]) -> Result<SourceMotion> {
    let loaded = GltfLoader::load(name, bytes)?;
    log::debug!("Loaded motion '{name}' with {} clips", loaded.clips.len());
    Ok(SourceMotion::new(name, loaded.scene, loaded.root, loaded.clips))
}

/// Humanoid description read from a VRM extension.
#[derive(Debug, Clone)]
pub struct VrmHumanoid {
    pub api: PoseApi,
    /// Bone to glTF node index.
    pub bones: BTreeMap<BoneId, usize>,
    pub title: Option<String>,
}

/// Everything a glTF document contributes: the node hierarchy under a
/// synthetic root, its clips and any VRM humanoid.
#[derive(Debug)]
pub struct GltfLoader {
    pub scene: Scene,
    pub root: NodeHandle,
    /// glTF node index to scene handle.
    pub node_mapping: Vec<NodeHandle>,
    pub clips: Vec<AnimationClip>,
    pub vrm: Option<VrmHumanoid>,
}

impl GltfLoader {
    /// Entry point. `name` labels parse errors.
    pub fn load(name: &str, bytes: &[u8]) -> Result<Self> {
        let gltf = gltf::Gltf::from_slice_without_validation(bytes).map_err(|e| PoseLabError::asset_parse(name, e))?;
        validate_structure(name, &gltf.document)?;
        let vrm = read_vrm_extension(name, bytes)?;

        let gltf::Gltf { document, blob } = gltf;
        let buffers = gltf::import_buffers(&document, None, blob)?;

        let mut scene = Scene::new();

        // Nodes first, then hierarchy: children may precede their parents.
        let node_mapping: Vec<NodeHandle> = document
            .nodes()
            .map(|node| create_node_shallow(&mut scene, &node))
            .collect();

        let root = scene.create_node_with_name(GLTF_ROOT_NAME);
        for node in document.nodes() {
            let parent = node_mapping[node.index()];
            for child in node.children() {
                if let Some(&child) = node_mapping.get(child.index()) {
                    scene.attach(child, parent);
                }
            }
        }
        if let Some(default_scene) = document.default_scene().or_else(|| document.scenes().next()) {
            for node in default_scene.nodes() {
                if let Some(&node) = node_mapping.get(node.index()) {
                    scene.attach(node, root);
                }
            }
        }
        scene.update_subtree(root);

        let clips = load_animations(&document, &buffers, &scene, root, &node_mapping);

        Ok(Self {
            scene,
            root,
            node_mapping,
            clips,
            vrm,
        })
    }

    fn map_vrm_bones(&self, vrm: &VrmHumanoid) -> BTreeMap<BoneId, NodeHandle> {
        vrm.bones
            .iter()
            .filter_map(|(&bone, &index)| {
                let handle = self.node_mapping.get(index).copied();
                if handle.is_none() {
                    log::debug!("VRM bone {bone} points at missing node {index}");
                }
                Some((bone, handle?))
            })
            .collect()
    }

    fn match_mixamo_bones(&self) -> Option<BTreeMap<BoneId, NodeHandle>> {
        let convention = NameConvention::MIXAMO;
        let bones: BTreeMap<BoneId, NodeHandle> = convention
            .bones()
            .filter_map(|bone| Some((bone, convention.find_bone_node(&self.scene, self.root, bone)?)))
            .collect();
        bones.contains_key(&BoneId::Hips).then_some(bones)
    }
}

/// Rejects documents whose indices point outside their arrays, since the
/// `gltf` accessors panic on them. Unsupported required extensions are
/// tolerated: only the node hierarchy and animations are read.
fn validate_structure(name: &str, document: &gltf::Document) -> Result<()> {
    use gltf::json::validation::{Checked, Error, Validate};

    let root = document.as_json();
    let mut problems = Vec::new();
    root.validate(root, gltf::json::Path::new, &mut |path, error| {
        if error != Error::Unsupported {
            problems.push(format!("{}: {error}", path()));
        }
    });

    // Channel targets are not covered by the crate's own validation.
    for (a, animation) in root.animations.iter().enumerate() {
        for (c, channel) in animation.channels.iter().enumerate() {
            if channel.target.node.value() >= root.nodes.len() {
                problems.push(format!("animations[{a}].channels[{c}].target.node: index out of bounds"));
            }
            if matches!(channel.target.path, Checked::Invalid) {
                problems.push(format!("animations[{a}].channels[{c}].target.path: invalid value"));
            }
        }
    }

    match problems.first() {
        None => Ok(()),
        Some(first) => {
            log::debug!("'{name}' failed validation: {problems:?}");
            Err(PoseLabError::asset_parse(
                name,
                format!("invalid glTF ({} problems), first: {first}", problems.len()),
            ))
        }
    }
}

fn create_node_shallow(scene: &mut Scene, node: &gltf::Node) -> NodeHandle {
    let node_name = node
        .name()
        .map_or_else(|| format!("Node_{}", node.index()), ToString::to_string);
    let handle = scene.create_node_with_name(&node_name);

    if let Some(scene_node) = scene.get_node_mut(handle) {
        let (t, r, s) = node.transform().decomposed();
        scene_node.transform.position = Vec3::from_array(t);
        scene_node.transform.rotation = Quat::from_array(r);
        scene_node.transform.scale = Vec3::from_array(s);
    }
    handle
}

/// Reads every animation. Channels whose data cannot be read and morph
/// weight channels are skipped. Tracks are keyed by node path below `root`.
fn load_animations(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    scene: &Scene,
    root: NodeHandle,
    node_mapping: &[NodeHandle],
) -> Vec<AnimationClip> {
    use gltf::animation::Property;
    use gltf::animation::util::ReadOutputs;

    let mut animations = Vec::new();

    for anim in document.animations() {
        let mut tracks = Vec::new();

        for channel in anim.channels() {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
            let target = channel.target();
            let gltf_node = target.node();

            let Some(&handle) = node_mapping.get(gltf_node.index()) else {
                continue;
            };
            let node_name = scene
                .node_path(handle, root)
                .or_else(|| scene.get_name(handle).map(ToString::to_string))
                .unwrap_or_else(|| format!("Node_{}", gltf_node.index()));

            let Some(inputs) = reader.read_inputs() else {
                log::debug!("Channel on '{node_name}' has no input data; skipping");
                continue;
            };
            let times: Vec<f32> = inputs.collect();

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                gltf::animation::Interpolation::Step => InterpolationMode::Step,
                gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
            };

            let (target_path, data) = match (target.property(), reader.read_outputs()) {
                (Property::Translation, Some(ReadOutputs::Translations(iter))) => {
                    let values = iter.map(Vec3::from_array).collect();
                    (
                        TargetPath::Translation,
                        TrackData::Vector3(KeyframeTrack::new(times, values, interpolation)),
                    )
                }
                (Property::Rotation, Some(ReadOutputs::Rotations(iter))) => {
                    let values = iter.into_f32().map(Quat::from_array).collect();
                    (
                        TargetPath::Rotation,
                        TrackData::Quaternion(KeyframeTrack::new(times, values, interpolation)),
                    )
                }
                (Property::Scale, Some(ReadOutputs::Scales(iter))) => {
                    let values = iter.map(Vec3::from_array).collect();
                    (
                        TargetPath::Scale,
                        TrackData::Vector3(KeyframeTrack::new(times, values, interpolation)),
                    )
                }
                (property, _) => {
                    log::debug!("Skipping {property:?} channel on '{node_name}'");
                    continue;
                }
            };

            tracks.push(Track {
                meta: TrackMeta::new(node_name, target_path),
                data,
            });
        }

        animations.push(AnimationClip::new(anim.name().unwrap_or("anim"), tracks));
    }

    animations
}

// ============================================================================
// VRM extensions
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawRoot {
    #[serde(default)]
    extensions: RawExtensions,
}

#[derive(Debug, Default, Deserialize)]
struct RawExtensions {
    #[serde(rename = "VRMC_vrm")]
    vrm1: Option<Vrm1>,
    #[serde(rename = "VRM")]
    vrm0: Option<Vrm0>,
}

#[derive(Debug, Deserialize)]
struct Vrm1 {
    humanoid: Vrm1Humanoid,
    #[serde(default)]
    meta: Option<Vrm1Meta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vrm1Humanoid {
    human_bones: BTreeMap<String, Vrm1Bone>,
}

#[derive(Debug, Deserialize)]
struct Vrm1Bone {
    node: usize,
}

#[derive(Debug, Deserialize)]
struct Vrm1Meta {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Vrm0 {
    humanoid: Vrm0Humanoid,
    #[serde(default)]
    meta: Option<Vrm0Meta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Vrm0Humanoid {
    #[serde(default)]
    human_bones: Vec<Vrm0Bone>,
}

#[derive(Debug, Deserialize)]
struct Vrm0Bone {
    bone: String,
    /// `-1` marks an unassigned bone in some exporters.
    node: i64,
}

#[derive(Debug, Deserialize)]
struct Vrm0Meta {
    title: Option<String>,
}

/// JSON chunk of a GLB, or the bytes themselves for text glTF.
fn json_chunk<'a>(name: &str, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    if bytes.starts_with(b"glTF") {
        let glb = gltf::Glb::from_slice(bytes).map_err(|e| PoseLabError::asset_parse(name, e))?;
        Ok(glb.json)
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

fn read_vrm_extension(name: &str, bytes: &[u8]) -> Result<Option<VrmHumanoid>> {
    let json = json_chunk(name, bytes)?;
    let raw: RawRoot = serde_json::from_slice(&json).map_err(|e| PoseLabError::asset_parse(name, e))?;

    if let Some(vrm) = raw.extensions.vrm1 {
        let bones = vrm
            .humanoid
            .human_bones
            .iter()
            .filter_map(|(bone_name, bone)| Some((known_bone(bone_name)?, bone.node)))
            .collect();
        return Ok(Some(VrmHumanoid {
            api: PoseApi::Normalized,
            bones,
            title: vrm.meta.and_then(|m| m.name),
        }));
    }

    if let Some(vrm) = raw.extensions.vrm0 {
        let bones = vrm
            .humanoid
            .human_bones
            .iter()
            .filter_map(|entry| {
                let node = usize::try_from(entry.node).ok()?;
                Some((known_bone(&vrm0_bone_name(&entry.bone))?, node))
            })
            .collect();
        return Ok(Some(VrmHumanoid {
            api: PoseApi::Legacy,
            bones,
            title: vrm.meta.and_then(|m| m.title),
        }));
    }

    Ok(None)
}

fn known_bone(name: &str) -> Option<BoneId> {
    let bone = BoneId::from_name(name);
    if bone.is_none() {
        log::debug!("Ignoring unknown humanoid bone '{name}'");
    }
    bone
}

/// VRM 0.x thumbs are one segment off from the current names.
fn vrm0_bone_name(name: &str) -> Cow<'_, str> {
    for side in ["left", "right"] {
        if let Some(rest) = name.strip_prefix(side) {
            match rest {
                "ThumbProximal" => return Cow::Owned(format!("{side}ThumbMetacarpal")),
                "ThumbIntermediate" => return Cow::Owned(format!("{side}ThumbProximal")),
                _ => {}
            }
        }
    }
    Cow::Borrowed(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VRM1_JSON: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Root", "children": [1] },
            { "name": "J_Hips", "translation": [0, 1, 0], "children": [2] },
            { "name": "J_Spine", "translation": [0, 0.1, 0] }
        ],
        "extensions": {
            "VRMC_vrm": {
                "meta": { "name": "Tester" },
                "humanoid": { "humanBones": {
                    "hips": { "node": 1 },
                    "spine": { "node": 2 },
                    "tail": { "node": 0 }
                } }
            }
        }
    }"#;

    #[test]
    fn vrm1_document_builds_normalized_rig() {
        let rig = load_rig("tester.vrm", VRM1_JSON.as_bytes()).unwrap();
        assert_eq!(rig.name, "Tester");
        assert!(rig.has_humanoid());
        let hips = rig.bone_node(BoneId::Hips).unwrap();
        assert_eq!(rig.node_path(hips).as_deref(), Some("Root/J_Hips"));
        assert!(rig.bone_node(BoneId::Spine).is_some());
        assert!(rig.bone_node(BoneId::Chest).is_none());
    }

    #[test]
    fn vrm0_thumbs_are_renamed() {
        assert_eq!(vrm0_bone_name("leftThumbProximal"), "leftThumbMetacarpal");
        assert_eq!(vrm0_bone_name("rightThumbIntermediate"), "rightThumbProximal");
        assert_eq!(vrm0_bone_name("leftThumbDistal"), "leftThumbDistal");
        assert_eq!(vrm0_bone_name("hips"), "hips");
    }

    #[test]
    fn malformed_bytes_name_the_asset() {
        let err = load_source_motion("broken.glb", b"not a gltf").unwrap_err();
        match err {
            PoseLabError::AssetParse { asset, .. } => assert_eq!(asset, "broken.glb"),
            other => panic!("unexpected error: {other}"),
        }
    }

    /// One-keyframe identity rotation on node `target`.
    fn animated_json(target: usize) -> String {
        format!(
            r#"{{
            "asset": {{ "version": "2.0" }},
            "nodes": [{{ "name": "A" }}],
            "buffers": [{{ "byteLength": 20, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAAAAAgD8=" }}],
            "bufferViews": [
                {{ "buffer": 0, "byteLength": 4 }},
                {{ "buffer": 0, "byteOffset": 4, "byteLength": 16 }}
            ],
            "accessors": [
                {{ "bufferView": 0, "componentType": 5126, "count": 1, "type": "SCALAR" }},
                {{ "bufferView": 1, "componentType": 5126, "count": 1, "type": "VEC4" }}
            ],
            "animations": [{{
                "name": "turn",
                "samplers": [{{ "input": 0, "output": 1 }}],
                "channels": [{{ "sampler": 0, "target": {{ "node": {target}, "path": "rotation" }} }}]
            }}]
        }}"#
        )
    }

    fn assert_parse_error(result: Result<SourceMotion>, expected_asset: &str) -> String {
        match result {
            Err(PoseLabError::AssetParse { asset, reason }) => {
                assert_eq!(asset, expected_asset);
                reason
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("malformed document loaded"),
        }
    }

    #[test]
    fn out_of_range_child_is_a_parse_error() {
        let json = r#"{ "asset": { "version": "2.0" }, "nodes": [{ "name": "A", "children": [7] }] }"#;
        let reason = assert_parse_error(load_source_motion("bad.gltf", json.as_bytes()), "bad.gltf");
        assert!(reason.contains("children"), "{reason}");
    }

    #[test]
    fn out_of_range_scene_node_is_a_parse_error() {
        let json = r#"{ "asset": { "version": "2.0" }, "scene": 0, "scenes": [{ "nodes": [3] }], "nodes": [] }"#;
        assert_parse_error(load_source_motion("scene.gltf", json.as_bytes()), "scene.gltf");
    }

    #[test]
    fn out_of_range_channel_target_is_a_parse_error() {
        let json = animated_json(9);
        let reason = assert_parse_error(load_source_motion("anim.gltf", json.as_bytes()), "anim.gltf");
        assert!(reason.contains("target.node"), "{reason}");
    }

    #[test]
    fn channel_becomes_rotation_track() {
        let motion = load_source_motion("anim.gltf", animated_json(0).as_bytes()).unwrap();
        let clip = motion.first_clip().unwrap();
        assert_eq!(clip.name, "turn");
        assert_eq!(clip.tracks.len(), 1);
        assert_eq!(clip.tracks[0].meta.node_name, "A");
        assert_eq!(clip.tracks[0].meta.target, TargetPath::Rotation);
        match &clip.tracks[0].data {
            TrackData::Quaternion(keys) => assert_eq!(keys.first_value(), Some(Quat::IDENTITY)),
            TrackData::Vector3(_) => panic!("rotation channel decoded as vectors"),
        }
    }

    #[test]
    fn unsupported_required_extension_is_tolerated() {
        let json = VRM1_JSON.replacen(
            r#""asset": { "version": "2.0" },"#,
            r#""asset": { "version": "2.0" }, "extensionsRequired": ["KHR_materials_variants"],"#,
            1,
        );
        let rig = load_rig("tester.vrm", json.as_bytes()).unwrap();
        assert!(rig.has_humanoid());
    }

    #[test]
    fn file_without_animations_has_no_clips() {
        let motion = load_source_motion("still.gltf", VRM1_JSON.as_bytes()).unwrap();
        assert!(motion.clips.is_empty());
        assert!(matches!(motion.first_clip(), Err(PoseLabError::NoAnimation(_))));
    }
}
