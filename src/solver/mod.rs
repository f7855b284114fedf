//! Solved pose records and the solver seam
//!
//! A `Solver` turns landmark groups into joint rotations. Solving itself
//! happens in the tracker pipeline; `UpstreamSolver` hands back the records
//! that arrived alongside the landmarks.

pub mod stabilize;

pub use stabilize::{stabilize_blink, EyePair};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::rig::{EulerRotation, Finger, Phalanx, Side};
use crate::tracking::{ImageSize, Landmark};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl From<Point2> for Vec2 {
    fn from(p: Point2) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<Point3> for Vec3 {
    fn from(p: Point3) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Vowel mouth shape weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct MouthShape {
    #[serde(default)]
    pub a: f32,
    #[serde(default)]
    pub e: f32,
    #[serde(default)]
    pub i: f32,
    #[serde(default)]
    pub o: f32,
    #[serde(default)]
    pub u: f32,
}

impl MouthShape {
    /// Weights in I, A, E, O, U order.
    pub fn iaeou(&self) -> [f32; 5] {
        [self.i, self.a, self.e, self.o, self.u]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Mouth {
    #[serde(default)]
    pub shape: MouthShape,
}

/// Face solve: head rotation, per-eye openness, mouth shapes, pupil offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiggedFace {
    #[serde(default)]
    pub head: EulerRotation,
    /// Eye openness, 1 = fully open
    #[serde(default)]
    pub eye: EyePair,
    #[serde(default)]
    pub mouth: Mouth,
    #[serde(default)]
    pub pupil: Point2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiggedHips {
    #[serde(default)]
    pub rotation: EulerRotation,
    #[serde(default)]
    pub position: Point3,
}

/// Body solve. Segment sides are already the avatar's sides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RiggedPose {
    #[serde(default)]
    pub hips: RiggedHips,
    #[serde(default)]
    pub spine: EulerRotation,
    #[serde(default)]
    pub left_upper_arm: EulerRotation,
    #[serde(default)]
    pub left_lower_arm: EulerRotation,
    #[serde(default)]
    pub right_upper_arm: EulerRotation,
    #[serde(default)]
    pub right_lower_arm: EulerRotation,
    #[serde(default)]
    pub left_upper_leg: EulerRotation,
    #[serde(default)]
    pub left_lower_leg: EulerRotation,
    #[serde(default)]
    pub right_upper_leg: EulerRotation,
    #[serde(default)]
    pub right_lower_leg: EulerRotation,
    /// Hand segment; only `z` is used, to merge with the hand solve
    #[serde(default)]
    pub left_hand: EulerRotation,
    #[serde(default)]
    pub right_hand: EulerRotation,
}

impl RiggedPose {
    pub fn upper_arm(&self, side: Side) -> EulerRotation {
        match side {
            Side::Left => self.left_upper_arm,
            Side::Right => self.right_upper_arm,
        }
    }

    pub fn lower_arm(&self, side: Side) -> EulerRotation {
        match side {
            Side::Left => self.left_lower_arm,
            Side::Right => self.right_lower_arm,
        }
    }

    pub fn upper_leg(&self, side: Side) -> EulerRotation {
        match side {
            Side::Left => self.left_upper_leg,
            Side::Right => self.right_upper_leg,
        }
    }

    pub fn lower_leg(&self, side: Side) -> EulerRotation {
        match side {
            Side::Left => self.left_lower_leg,
            Side::Right => self.right_lower_leg,
        }
    }

    pub fn hand(&self, side: Side) -> EulerRotation {
        match side {
            Side::Left => self.left_hand,
            Side::Right => self.right_hand,
        }
    }
}

/// Hand solve: wrist plus proximal/intermediate/distal per finger.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiggedHand {
    #[serde(default)]
    pub wrist: EulerRotation,
    #[serde(default)]
    pub thumb: [EulerRotation; 3],
    #[serde(default)]
    pub index: [EulerRotation; 3],
    #[serde(default)]
    pub middle: [EulerRotation; 3],
    #[serde(default)]
    pub ring: [EulerRotation; 3],
    #[serde(default)]
    pub little: [EulerRotation; 3],
}

impl RiggedHand {
    pub fn phalanx(&self, finger: Finger, phalanx: Phalanx) -> EulerRotation {
        let chain = match finger {
            Finger::Thumb => &self.thumb,
            Finger::Index => &self.index,
            Finger::Middle => &self.middle,
            Finger::Ring => &self.ring,
            Finger::Little => &self.little,
        };
        match phalanx {
            Phalanx::Proximal => chain[0],
            Phalanx::Intermediate => chain[1],
            Phalanx::Distal => chain[2],
        }
    }
}

/// Records solved upstream and shipped with the frame. Hands are keyed by
/// the avatar side they drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<RiggedFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<RiggedPose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand: Option<RiggedHand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand: Option<RiggedHand>,
}

/// Extra inputs a solver may need besides the landmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveContext {
    pub image_size: Option<ImageSize>,
    /// Landmark runtime name (`mediapipe`, `tfjs`)
    pub runtime: String,
}

impl Default for SolveContext {
    fn default() -> Self {
        Self {
            image_size: None,
            runtime: "mediapipe".to_string(),
        }
    }
}

/// Landmarks → joint rotations. `None` means the group could not be solved.
pub trait Solver {
    fn solve_face(&mut self, landmarks: &[Landmark], ctx: &SolveContext) -> Option<RiggedFace>;

    fn solve_pose(
        &mut self,
        world: &[Landmark],
        image: &[Landmark],
        ctx: &SolveContext,
    ) -> Option<RiggedPose>;

    /// Solve the hand that drives the avatar's `side`.
    fn solve_hand(
        &mut self,
        landmarks: &[Landmark],
        side: Side,
        ctx: &SolveContext,
    ) -> Option<RiggedHand>;
}

/// Solver that returns the records already attached to a frame.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamSolver<'a> {
    solved: &'a SolvedFrame,
}

impl<'a> UpstreamSolver<'a> {
    pub fn new(solved: &'a SolvedFrame) -> Self {
        Self { solved }
    }
}

impl Solver for UpstreamSolver<'_> {
    fn solve_face(&mut self, _landmarks: &[Landmark], _ctx: &SolveContext) -> Option<RiggedFace> {
        self.solved.face
    }

    fn solve_pose(
        &mut self,
        _world: &[Landmark],
        _image: &[Landmark],
        _ctx: &SolveContext,
    ) -> Option<RiggedPose> {
        self.solved.pose
    }

    fn solve_hand(
        &mut self,
        _landmarks: &[Landmark],
        side: Side,
        _ctx: &SolveContext,
    ) -> Option<RiggedHand> {
        match side {
            Side::Left => self.solved.left_hand,
            Side::Right => self.solved.right_hand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_solved_block() {
        let solved: SolvedFrame = serde_json::from_str(
            r#"{
                "face": {
                    "head": {"x": 0.1, "y": -0.2, "z": 0.0},
                    "eye": {"l": 1.0, "r": 0.8},
                    "mouth": {"x": 0, "y": 0, "shape": {"A": 0.5, "I": 0.1}},
                    "pupil": {"x": 0.05, "y": -0.02}
                },
                "pose": {
                    "Hips": {"rotation": {"x": 0, "y": 0.3, "z": 0}, "position": {"x": 0.1, "y": 0.2, "z": 0.3}},
                    "Spine": {"x": 0.1, "y": 0, "z": 0},
                    "LeftUpperArm": {"x": 0, "y": 0, "z": 1.2, "rotationOrder": "XYZ"},
                    "RightHand": {"x": 0, "y": 0, "z": -0.4}
                },
                "leftHand": {
                    "wrist": {"x": 0.2, "y": 0.1, "z": 0},
                    "index": [{"x": 0, "y": 0, "z": 0.5}, {"x": 0, "y": 0, "z": 0.6}, {"x": 0, "y": 0, "z": 0.7}]
                }
            }"#,
        )
        .unwrap();

        let face = solved.face.unwrap();
        assert_eq!(face.mouth.shape.a, 0.5);
        assert_eq!(face.mouth.shape.iaeou(), [0.1, 0.5, 0.0, 0.0, 0.0]);
        assert_eq!(face.eye.r, 0.8);

        let pose = solved.pose.unwrap();
        assert_eq!(pose.hips.position.z, 0.3);
        assert_eq!(pose.upper_arm(Side::Left).z, 1.2);
        assert_eq!(pose.hand(Side::Right).z, -0.4);
        assert_eq!(pose.lower_leg(Side::Left), EulerRotation::ZERO);

        let hand = solved.left_hand.unwrap();
        assert_eq!(hand.phalanx(Finger::Index, Phalanx::Distal).z, 0.7);
        assert_eq!(hand.phalanx(Finger::Thumb, Phalanx::Proximal), EulerRotation::ZERO);
        assert!(solved.right_hand.is_none());
    }

    #[test]
    fn test_upstream_solver_returns_attached_records() {
        let solved = SolvedFrame {
            right_hand: Some(RiggedHand::default()),
            ..Default::default()
        };
        let mut solver = UpstreamSolver::new(&solved);
        let ctx = SolveContext::default();

        assert!(solver.solve_face(&[], &ctx).is_none());
        assert!(solver.solve_pose(&[], &[], &ctx).is_none());
        assert!(solver.solve_hand(&[], Side::Right, &ctx).is_some());
        assert!(solver.solve_hand(&[], Side::Left, &ctx).is_none());
    }
}
