//! Blink stabilization against head rotation and one-eye noise.
//!
//! When the head is turned far enough that one eye is occluded, both eyes
//! copy the visible one. Otherwise the eyes are pulled together unless the
//! difference looks like a real wink.

use serde::{Deserialize, Serialize};

use crate::rig::{clamp, lerp};

/// Difference between eyes that still counts as a deliberate wink.
const WINK_THRESHOLD: f32 = 0.8;
/// Head yaw (radians) beyond which the far eye is ignored.
const MAX_HEAD_ROTATION: f32 = 0.5;

/// Per-eye value, left and right from the avatar's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EyePair {
    #[serde(default)]
    pub l: f32,
    #[serde(default)]
    pub r: f32,
}

impl EyePair {
    pub fn new(l: f32, r: f32) -> Self {
        Self { l, r }
    }
}

/// Stabilize a blink pair given the head yaw in radians.
pub fn stabilize_blink(eye: EyePair, head_yaw: f32) -> EyePair {
    let l = clamp(eye.l, 0.0, 1.0);
    let r = clamp(eye.r, 0.0, 1.0);

    if head_yaw > MAX_HEAD_ROTATION {
        return EyePair::new(r, r);
    }
    if head_yaw < -MAX_HEAD_ROTATION {
        return EyePair::new(l, l);
    }

    let closing = l < 0.3 && r < 0.3;
    let open = l > 0.6 && r > 0.6;
    if (l - r).abs() >= WINK_THRESHOLD && !closing && !open {
        return EyePair::new(l, r);
    }

    // Both eyes collapse onto one value biased toward the more open side
    let merged = if r > l {
        lerp(r, l, 0.95)
    } else {
        lerp(r, l, 0.05)
    };
    EyePair::new(merged, merged)
}
