//! Serializable avatar pose published to browser viewers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::avatar::{Avatar, ExpressionPreset, LookTarget};
use crate::retarget::FrameReport;
use crate::rig::HumanoidBone;
use crate::tracking::{DetectionFrame, ImageSize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneSnapshot {
    /// Quaternion as `[x, y, z, w]`
    pub rotation: [f32; 4],
    pub position: [f32; 3],
}

/// Everything a viewer needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub sequence: u64,
    pub avatar_loaded: bool,
    /// Hidden whenever the frame carried no 2D pose landmarks
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
    /// Normalized local bone transforms keyed by VRM 1.0 humanoid name
    pub bones: BTreeMap<String, BoneSnapshot>,
    /// Expression values keyed by VRM 1.0 preset name
    pub expressions: BTreeMap<String, f32>,
    pub look_at: LookTarget,
    /// Groups retargeted this frame
    pub groups: FrameReport,
}

impl PoseSnapshot {
    pub fn capture(
        sequence: u64,
        avatar: Option<&dyn Avatar>,
        frame: &DetectionFrame,
        video_size: Option<ImageSize>,
        report: FrameReport,
    ) -> Self {
        let mut snapshot = Self {
            sequence,
            avatar_loaded: avatar.is_some(),
            visible: frame.avatar_visible(),
            image_uri: frame.image_uri.clone(),
            size: frame.size.or(video_size),
            groups: report,
            ..Default::default()
        };

        if let Some(avatar) = avatar {
            for bone in HumanoidBone::all() {
                if let Some(t) = avatar.bone(bone) {
                    snapshot.bones.insert(
                        bone.vrm1_name(),
                        BoneSnapshot {
                            rotation: t.rotation.to_array(),
                            position: t.position.to_array(),
                        },
                    );
                }
            }
            for preset in ExpressionPreset::ALL {
                snapshot
                    .expressions
                    .insert(preset.vrm1_name().to_string(), avatar.expression(preset));
            }
            snapshot.look_at = avatar.look_target();
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::Skeleton;
    use crate::tracking::Landmark;
    use glam::{Quat, Vec3};

    #[test]
    fn test_capture_without_avatar() {
        let frame = DetectionFrame {
            image_uri: Some("data:image/jpeg;base64,AA".to_string()),
            ..Default::default()
        };
        let size = ImageSize {
            width: 640,
            height: 360,
        };
        let snapshot = PoseSnapshot::capture(3, None, &frame, Some(size), FrameReport::default());

        assert_eq!(snapshot.sequence, 3);
        assert!(!snapshot.avatar_loaded);
        assert!(!snapshot.visible);
        assert!(snapshot.bones.is_empty());
        assert_eq!(snapshot.size, Some(size));
        assert_eq!(snapshot.image_uri.as_deref(), Some("data:image/jpeg;base64,AA"));
    }

    #[test]
    fn test_capture_with_avatar() {
        let mut skeleton = Skeleton::with_bones([HumanoidBone::Hips, HumanoidBone::Neck]);
        skeleton.bone_mut(HumanoidBone::Hips).unwrap().position = Vec3::new(0.0, 1.0, 0.0);
        skeleton.bone_mut(HumanoidBone::Neck).unwrap().rotation = Quat::from_rotation_y(0.5);
        skeleton.set_expression(ExpressionPreset::A, 0.25);
        skeleton.look_at(LookTarget {
            pitch: 0.1,
            yaw: 0.2,
        });

        let frame = DetectionFrame {
            pose_landmarks: Some(vec![Landmark::default(); 33]),
            ..Default::default()
        };
        let report = FrameReport {
            pose: true,
            ..Default::default()
        };
        let snapshot = PoseSnapshot::capture(1, Some(&skeleton), &frame, None, report);

        assert!(snapshot.visible);
        assert!(snapshot.groups.pose);
        assert_eq!(snapshot.bones.len(), 2);
        assert_eq!(snapshot.bones["hips"].position, [0.0, 1.0, 0.0]);
        let neck = Quat::from_rotation_y(0.5).to_array();
        assert_eq!(snapshot.bones["neck"].rotation, neck);
        assert_eq!(snapshot.expressions["aa"], 0.25);
        assert_eq!(snapshot.expressions["blink"], 0.0);
        assert_eq!(snapshot.look_at.yaw, 0.2);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("image_uri").is_none());
        assert_eq!(json["bones"]["hips"]["position"][1], 1.0);
    }

    #[test]
    fn test_bones_keyed_by_vrm1_names() {
        let skeleton = Skeleton::full();
        let snapshot = PoseSnapshot::capture(
            0,
            Some(&skeleton),
            &DetectionFrame::default(),
            None,
            FrameReport::default(),
        );

        let thumbs: Vec<&str> = snapshot
            .bones
            .keys()
            .map(String::as_str)
            .filter(|k| k.starts_with("leftThumb"))
            .collect();
        assert_eq!(
            thumbs,
            ["leftThumbDistal", "leftThumbMetacarpal", "leftThumbProximal"]
        );
        assert_eq!(snapshot.bones.len(), 55);
        assert!(snapshot.bones.contains_key("rightLittleIntermediate"));
    }
}
