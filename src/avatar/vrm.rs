//! VRM model loader.
//!
//! Reads the glTF node hierarchy with the `gltf` crate and the VRM humanoid
//! and expression extensions from the raw JSON chunk. Supports VRM 1.0
//! (`VRMC_vrm`) and VRM 0.x (`VRM`). Only rest transforms and metadata are
//! loaded; mesh data stays with the browser renderer.
//!
//! Bone transforms live in normalized humanoid space, the space three-vrm
//! exposes through `getNormalizedBoneNode`: every bone rests at identity
//! rotation and only the hips keep their rest translation. The raw glTF node
//! transforms are kept separately in `rest_transform`.

use glam::{Quat, Vec3};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{Avatar, BoneTransform, ExpressionPreset, LookTarget, Skeleton};
use crate::error::AvatarError;
use crate::rig::HumanoidBone;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;

/// Which VRM extension the model was authored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrmVersion {
    V0,
    V1,
}

/// A loaded VRM avatar whose humanoid bones start at the normalized rest pose.
#[derive(Debug, Clone)]
pub struct VrmAvatar {
    skeleton: Skeleton,
    version: VrmVersion,
    /// Humanoid bone → glTF node index
    bone_nodes: HashMap<HumanoidBone, usize>,
    /// Raw glTF node transforms
    rest: HashMap<HumanoidBone, BoneTransform>,
    /// Expression presets the model defines
    presets: HashSet<ExpressionPreset>,
    title: Option<String>,
    source: Option<PathBuf>,
}

impl VrmAvatar {
    /// Load a `.vrm`/`.glb` (binary) or `.gltf` (JSON) file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AvatarError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| AvatarError::ReadModel {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut avatar = Self::from_slice(&data)?;
        avatar.source = Some(path.to_path_buf());

        tracing::info!(
            "Loaded VRM {:?} avatar from {} ({} humanoid bones, {} expression presets)",
            avatar.version,
            path.display(),
            avatar.bone_nodes.len(),
            avatar.presets.len()
        );

        Ok(avatar)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, AvatarError> {
        let gltf = gltf::Gltf::from_slice(data)
            .map_err(|e| AvatarError::InvalidModel(e.to_string()))?;

        let mut node_rest = Vec::new();
        for node in gltf.document.nodes() {
            let (t, r, _s) = node.transform().decomposed();
            node_rest.push(BoneTransform {
                rotation: Quat::from_array(r),
                position: Vec3::from(t),
            });
        }

        let root = json_root(data)?;
        let (version, bone_nodes) = parse_humanoid(&root);
        if bone_nodes.is_empty() {
            return Err(AvatarError::NoHumanoid);
        }

        let mut skeleton = Skeleton::new();
        let mut rest = HashMap::new();
        for (&bone, &node) in &bone_nodes {
            match node_rest.get(node) {
                Some(&transform) => {
                    skeleton.insert_bone(bone, normalized_rest(bone, &transform));
                    rest.insert(bone, transform);
                }
                None => tracing::warn!("Bone {} points at missing node {}", bone, node),
            }
        }

        Ok(Self {
            skeleton,
            version,
            bone_nodes,
            rest,
            presets: parse_expression_presets(&root, version),
            title: parse_title(&root, version),
            source: None,
        })
    }

    pub fn version(&self) -> VrmVersion {
        self.version
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn node_index(&self, bone: HumanoidBone) -> Option<usize> {
        self.bone_nodes.get(&bone).copied()
    }

    pub fn rest_transform(&self, bone: HumanoidBone) -> Option<&BoneTransform> {
        self.rest.get(&bone)
    }

    pub fn has_preset(&self, preset: ExpressionPreset) -> bool {
        self.presets.contains(&preset)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Put every bone back to the normalized rest pose and clear expressions.
    pub fn reset_pose(&mut self) {
        let mut skeleton = Skeleton::new();
        for (&bone, transform) in &self.rest {
            skeleton.insert_bone(bone, normalized_rest(bone, transform));
        }
        self.skeleton = skeleton;
    }
}

impl Avatar for VrmAvatar {
    fn bone(&self, bone: HumanoidBone) -> Option<&BoneTransform> {
        self.skeleton.bone(bone)
    }

    fn bone_mut(&mut self, bone: HumanoidBone) -> Option<&mut BoneTransform> {
        self.skeleton.bone_mut(bone)
    }

    fn expression(&self, preset: ExpressionPreset) -> f32 {
        self.skeleton.expression(preset)
    }

    fn set_expression(&mut self, preset: ExpressionPreset, value: f32) {
        self.skeleton.set_expression(preset, value);
    }

    fn look_at(&mut self, target: LookTarget) {
        self.skeleton.look_at(target);
    }

    fn look_target(&self) -> LookTarget {
        self.skeleton.look_target()
    }
}

/// Rest transform of `bone` in normalized humanoid space.
fn normalized_rest(bone: HumanoidBone, raw: &BoneTransform) -> BoneTransform {
    BoneTransform {
        rotation: Quat::IDENTITY,
        position: if bone == HumanoidBone::Hips {
            raw.position
        } else {
            Vec3::ZERO
        },
    }
}

/// Extract the JSON document from a GLB container, or parse the whole input
/// as JSON for plain `.gltf` files.
fn json_root(data: &[u8]) -> Result<serde_json::Value, AvatarError> {
    let json_data = if data.len() >= 20 && &data[0..4] == GLB_MAGIC {
        // Header: magic(4) + version(4) + length(4), then chunk length(4) + type(4)
        let json_length = u32::from_le_bytes([data[12], data[13], data[14], data[15]]) as usize;
        let chunk_type = u32::from_le_bytes([data[16], data[17], data[18], data[19]]);
        if chunk_type != GLB_CHUNK_JSON || data.len() < 20 + json_length {
            return Err(AvatarError::InvalidModel(
                "GLB does not start with a JSON chunk".to_string(),
            ));
        }
        &data[20..20 + json_length]
    } else {
        data
    };

    serde_json::from_slice(json_data)
        .map_err(|e| AvatarError::InvalidModel(format!("JSON parse error: {}", e)))
}

fn parse_humanoid(root: &serde_json::Value) -> (VrmVersion, HashMap<HumanoidBone, usize>) {
    let mut map = HashMap::new();
    let extensions = root.get("extensions");

    // VRM 1.0: humanBones is an object keyed by bone name
    if let Some(bones) = extensions
        .and_then(|e| e.get("VRMC_vrm"))
        .and_then(|v| v.get("humanoid"))
        .and_then(|h| h.get("humanBones"))
        .and_then(|b| b.as_object())
    {
        for (name, data) in bones {
            let node = data.get("node").and_then(|n| n.as_u64());
            match (HumanoidBone::from_vrm1_name(name), node) {
                (Some(bone), Some(node)) => {
                    map.insert(bone, node as usize);
                }
                (None, _) => tracing::debug!("Ignoring unknown VRM 1.0 bone: {}", name),
                _ => {}
            }
        }
        if !map.is_empty() {
            return (VrmVersion::V1, map);
        }
    }

    // VRM 0.x: humanBones is an array of { bone, node }
    if let Some(bones) = extensions
        .and_then(|e| e.get("VRM"))
        .and_then(|v| v.get("humanoid"))
        .and_then(|h| h.get("humanBones"))
        .and_then(|b| b.as_array())
    {
        for entry in bones {
            if let (Some(name), Some(node)) = (
                entry.get("bone").and_then(|b| b.as_str()),
                entry.get("node").and_then(|n| n.as_u64()),
            ) {
                match HumanoidBone::from_vrm_name(name) {
                    Some(bone) => {
                        map.insert(bone, node as usize);
                    }
                    None => tracing::debug!("Ignoring unknown VRM 0.x bone: {}", name),
                }
            }
        }
    }

    (VrmVersion::V0, map)
}

fn parse_expression_presets(
    root: &serde_json::Value,
    version: VrmVersion,
) -> HashSet<ExpressionPreset> {
    let extensions = root.get("extensions");

    match version {
        VrmVersion::V1 => extensions
            .and_then(|e| e.get("VRMC_vrm"))
            .and_then(|v| v.get("expressions"))
            .and_then(|e| e.get("preset"))
            .and_then(|p| p.as_object())
            .map(|preset| {
                preset
                    .keys()
                    .filter_map(|k| ExpressionPreset::from_vrm_name(k))
                    .collect()
            })
            .unwrap_or_default(),
        VrmVersion::V0 => extensions
            .and_then(|e| e.get("VRM"))
            .and_then(|v| v.get("blendShapeMaster"))
            .and_then(|m| m.get("blendShapeGroups"))
            .and_then(|g| g.as_array())
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|g| {
                        g.get("presetName")
                            .and_then(|n| n.as_str())
                            .or_else(|| g.get("name").and_then(|n| n.as_str()))
                    })
                    .filter_map(ExpressionPreset::from_vrm_name)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn parse_title(root: &serde_json::Value, version: VrmVersion) -> Option<String> {
    let extensions = root.get("extensions")?;
    let title = match version {
        VrmVersion::V1 => extensions.get("VRMC_vrm")?.get("meta")?.get("name")?,
        VrmVersion::V0 => extensions.get("VRM")?.get("meta")?.get("title")?,
    };
    title.as_str().map(String::from)
}
