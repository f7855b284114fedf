//! Rig primitives
//!
//! Bone vocabulary, smoothing math, and the damped/interpolated bone applier
//! that every retargeter writes through.

pub mod applier;
pub mod bone;
pub mod math;

pub use applier::{rig_position, rig_rotation, RigParams};
pub use bone::{Finger, HumanoidBone, Phalanx, Side};
pub use math::{clamp, lerp, EulerRotation, RotationOrder};
