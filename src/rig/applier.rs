//! Damped, interpolated writes into avatar bones.
//!
//! Every retargeter goes through these two functions so the smoothing
//! behaviour stays the same for face, body and hands.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{EulerRotation, HumanoidBone};
use crate::avatar::Avatar;

/// Damping and interpolation factor for one bone write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigParams {
    /// Scales the solved value before interpolation
    pub damping: f32,
    /// Fraction of the remaining distance covered per frame
    pub lerp: f32,
}

impl RigParams {
    pub const fn new(damping: f32, lerp: f32) -> Self {
        Self { damping, lerp }
    }
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            damping: 1.0,
            lerp: 0.3,
        }
    }
}

/// Slerp a bone's local rotation toward `rotation * damping`.
///
/// Returns `false` when the avatar has no such bone.
pub fn rig_rotation<A: Avatar + ?Sized>(
    avatar: &mut A,
    bone: HumanoidBone,
    rotation: EulerRotation,
    damping: f32,
    lerp_amount: f32,
) -> bool {
    let Some(transform) = avatar.bone_mut(bone) else {
        tracing::trace!("No {} bone on avatar, skipping rotation", bone);
        return false;
    };

    let target = rotation.scaled(damping).to_quat();
    transform.rotation = transform.rotation.slerp(target, lerp_amount);
    true
}

/// Lerp a bone's local position toward `position * damping`.
///
/// Returns `false` when the avatar has no such bone.
pub fn rig_position<A: Avatar + ?Sized>(
    avatar: &mut A,
    bone: HumanoidBone,
    position: Vec3,
    damping: f32,
    lerp_amount: f32,
) -> bool {
    let Some(transform) = avatar.bone_mut(bone) else {
        tracing::trace!("No {} bone on avatar, skipping position", bone);
        return false;
    };

    transform.position = transform.position.lerp(position * damping, lerp_amount);
    true
}
