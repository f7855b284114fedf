//! Scalar smoothing helpers and Euler rotation handling.

use glam::Quat;
use serde::{Deserialize, Serialize};

/// Linear interpolation `a + (b - a) * t`. `t` is not clamped.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp `v` into `[min, max]`.
#[inline]
pub fn clamp(v: f32, min: f32, max: f32) -> f32 {
    v.max(min).min(max)
}

/// Axis order used to build a quaternion from Euler angles.
///
/// The order names the intrinsic rotation sequence: `Xyz` composes
/// `qx * qy * qz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotationOrder {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

/// A solved joint rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerRotation {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default, rename = "rotationOrder", alias = "order")]
    pub order: RotationOrder,
}

impl EulerRotation {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        order: RotationOrder::Xyz,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            order: RotationOrder::Xyz,
        }
    }

    pub fn with_order(mut self, order: RotationOrder) -> Self {
        self.order = order;
        self
    }

    /// Multiply every component by `factor`, keeping the order.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
            order: self.order,
        }
    }

    pub fn to_quat(self) -> Quat {
        let qx = Quat::from_rotation_x(self.x);
        let qy = Quat::from_rotation_y(self.y);
        let qz = Quat::from_rotation_z(self.z);
        match self.order {
            RotationOrder::Xyz => qx * qy * qz,
            RotationOrder::Xzy => qx * qz * qy,
            RotationOrder::Yxz => qy * qx * qz,
            RotationOrder::Yzx => qy * qz * qx,
            RotationOrder::Zxy => qz * qx * qy,
            RotationOrder::Zyx => qz * qy * qx,
        }
        .normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
        assert_eq!(lerp(2.0, 6.0, 0.5), 4.0);
        // Not clamped
        assert_eq!(lerp(0.0, 1.0, 2.0), 2.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-0.2, 0.0, 1.0), 0.0);
        assert_eq!(clamp(1.3, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.4, 0.0, 1.0), 0.4);
    }

    #[test]
    fn test_single_axis_matches_axis_rotation() {
        let q = EulerRotation::new(0.0, 0.8, 0.0).to_quat();
        assert!(q.angle_between(Quat::from_rotation_y(0.8)) < 1e-5);
    }

    #[test]
    fn test_order_changes_composition() {
        let e = EulerRotation::new(0.5, 0.7, 0.0);
        let xyz = e.to_quat();
        let yxz = e.with_order(RotationOrder::Yxz).to_quat();
        assert!(xyz.angle_between(yxz) > 1e-3);

        // XYZ applies the Z rotation first to a vector, then Y, then X
        let v = Vec3::new(0.0, 0.0, 1.0);
        let expected = Quat::from_rotation_x(0.5) * (Quat::from_rotation_y(0.7) * v);
        assert!((xyz * v - expected).length() < 1e-5);
    }

    #[test]
    fn test_scaled_keeps_order() {
        let e = EulerRotation::new(1.0, -2.0, 0.5).with_order(RotationOrder::Zyx);
        let s = e.scaled(0.25);
        assert_eq!(s.x, 0.25);
        assert_eq!(s.y, -0.5);
        assert_eq!(s.z, 0.125);
        assert_eq!(s.order, RotationOrder::Zyx);
    }

    #[test]
    fn test_deserialize_with_and_without_order() {
        let e: EulerRotation = serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":0.3}"#).unwrap();
        assert_eq!(e.order, RotationOrder::Xyz);

        let e: EulerRotation =
            serde_json::from_str(r#"{"x":0.1,"y":0.2,"z":0.3,"rotationOrder":"ZYX"}"#).unwrap();
        assert_eq!(e.order, RotationOrder::Zyx);
    }
}
