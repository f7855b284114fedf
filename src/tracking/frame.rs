//! Detection frame data as produced by the holistic tracker.

use serde::{Deserialize, Serialize};

use crate::rig::Side;
use crate::solver::SolvedFrame;

/// One detected landmark. `x`/`y` are normalized image coordinates for 2D
/// groups and meters for world groups.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

/// Pixel size of the tracked video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// All landmark groups detected in one video frame.
///
/// Hand channels are named from the detector's point of view: the avatar's
/// left hand consumes `right_hand_landmarks` and vice versa.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Passthrough video frame (usually a `data:image/jpeg;base64,` URI)
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_world_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_landmarks: Option<Vec<Landmark>>,
    /// Rotations already solved upstream for this frame
    #[serde(default)]
    pub solved: SolvedFrame,
}

impl DetectionFrame {
    pub fn face(&self) -> Option<&[Landmark]> {
        non_empty(&self.face_landmarks)
    }

    /// Both pose groups, or `None` unless 2D and 3D landmarks are present.
    pub fn pose(&self) -> Option<(&[Landmark], &[Landmark])> {
        Some((
            non_empty(&self.pose_world_landmarks)?,
            non_empty(&self.pose_landmarks)?,
        ))
    }

    /// Landmarks that drive the avatar's `side` hand (mirrored channel).
    pub fn hand_for(&self, side: Side) -> Option<&[Landmark]> {
        match side {
            Side::Left => non_empty(&self.right_hand_landmarks),
            Side::Right => non_empty(&self.left_hand_landmarks),
        }
    }

    /// The avatar is shown only while 2D pose landmarks are present.
    pub fn avatar_visible(&self) -> bool {
        non_empty(&self.pose_landmarks).is_some()
    }
}

fn non_empty(group: &Option<Vec<Landmark>>) -> Option<&[Landmark]> {
    group.as_deref().filter(|g| !g.is_empty())
}
