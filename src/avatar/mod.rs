//! Avatar skeleton and expression state
//!
//! The `Avatar` trait is the seam between retargeting and whatever owns the
//! bone transforms. `Skeleton` is the in-memory implementation; `VrmAvatar`
//! fills a skeleton from a VRM model file.

pub mod expression;
pub mod skeleton;
pub mod vrm;

#[cfg(test)]
pub(crate) mod testing;

pub use expression::{ExpressionPreset, ExpressionStore};
pub use skeleton::Skeleton;
pub use vrm::VrmAvatar;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::rig::HumanoidBone;

/// Local transform of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneTransform {
    pub rotation: Quat,
    pub position: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

/// Eye-look directive in radians (pitch around X, yaw around Y).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LookTarget {
    pub pitch: f32,
    pub yaw: f32,
}

/// Skeleton provider consumed by the retargeters.
///
/// Bone lookups return `None` when the avatar has no such bone; callers treat
/// that as a no-op.
pub trait Avatar: Send + Sync {
    fn bone(&self, bone: HumanoidBone) -> Option<&BoneTransform>;

    fn bone_mut(&mut self, bone: HumanoidBone) -> Option<&mut BoneTransform>;

    /// Current expression value in [0, 1] (0 when the preset is unset).
    fn expression(&self, preset: ExpressionPreset) -> f32;

    /// Set an expression value; implementations clamp to [0, 1].
    fn set_expression(&mut self, preset: ExpressionPreset, value: f32);

    fn look_at(&mut self, target: LookTarget);

    fn look_target(&self) -> LookTarget;
}
