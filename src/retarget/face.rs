//! Face retargeting: neck rotation, blink, vowels and eye gaze.

use glam::Vec2;

use crate::avatar::{Avatar, ExpressionPreset, LookTarget};
use crate::config::RetargetTuning;
use crate::rig::{clamp, lerp, rig_rotation, HumanoidBone};
use crate::solver::{stabilize_blink, EyePair, RiggedFace};

/// Values carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FaceState {
    /// Last committed blink value
    pub blink: f32,
    /// Last committed vowel values in I, A, E, O, U order
    pub vowels: [f32; 5],
    /// Rolling gaze, `x` is pitch and `y` is yaw
    pub gaze: Vec2,
}

pub struct FaceRetargeter {
    tuning: RetargetTuning,
    state: FaceState,
}

impl FaceRetargeter {
    pub fn new(tuning: &RetargetTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            state: FaceState::default(),
        }
    }

    pub fn state(&self) -> &FaceState {
        &self.state
    }

    /// Apply one face solve. Without an avatar nothing happens and the
    /// carried state stays where it was.
    pub fn apply<A: Avatar + ?Sized>(&mut self, avatar: Option<&mut A>, face: &RiggedFace) {
        let Some(avatar) = avatar else {
            return;
        };
        let t = &self.tuning;

        rig_rotation(
            avatar,
            HumanoidBone::Neck,
            face.head,
            t.neck_damping,
            t.default_lerp,
        );

        // Blink: eye openness → closedness, blended with the previous blink
        let eyes = EyePair::new(
            lerp(clamp(1.0 - face.eye.l, 0.0, 1.0), self.state.blink, t.blink_mix),
            lerp(clamp(1.0 - face.eye.r, 0.0, 1.0), self.state.blink, t.blink_mix),
        );
        let eyes = stabilize_blink(eyes, face.head.y);
        let blink = clamp(eyes.l, 0.0, 1.0);
        avatar.set_expression(ExpressionPreset::Blink, blink);
        self.state.blink = blink;

        for (i, (&preset, target)) in ExpressionPreset::VOWELS
            .iter()
            .zip(face.mouth.shape.iaeou())
            .enumerate()
        {
            let value = clamp(lerp(target, self.state.vowels[i], t.vowel_mix), 0.0, 1.0);
            avatar.set_expression(preset, value);
            self.state.vowels[i] = value;
        }

        // Pupil axes are swapped: vertical offset drives pitch
        let gaze = Vec2::new(
            lerp(self.state.gaze.x, face.pupil.y, t.gaze_mix),
            lerp(self.state.gaze.y, face.pupil.x, t.gaze_mix),
        );
        self.state.gaze = gaze;
        avatar.look_at(LookTarget {
            pitch: gaze.x,
            yaw: gaze.y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::testing::RecordingAvatar;
    use crate::avatar::Skeleton;
    use crate::rig::EulerRotation;
    use crate::solver::{Mouth, MouthShape, Point2};

    fn face() -> RiggedFace {
        RiggedFace {
            head: EulerRotation::new(0.1, 0.2, 0.0),
            eye: EyePair::new(0.0, 0.0),
            mouth: Mouth {
                shape: MouthShape {
                    a: 0.8,
                    ..Default::default()
                },
            },
            pupil: Point2 { x: 0.3, y: -0.1 },
        }
    }

    #[test]
    fn test_no_avatar_keeps_state() {
        let mut face_rt = FaceRetargeter::new(&RetargetTuning::default());
        face_rt.apply(None::<&mut Skeleton>, &face());
        assert_eq!(*face_rt.state(), FaceState::default());
    }

    #[test]
    fn test_only_neck_bone_is_touched() {
        let mut avatar = RecordingAvatar::full();
        let mut face_rt = FaceRetargeter::new(&RetargetTuning::default());
        face_rt.apply(Some(&mut avatar), &face());

        assert_eq!(avatar.touched, vec![HumanoidBone::Neck]);
        assert_eq!(avatar.look_calls, 1);
        assert!(avatar.expressions_set.contains(&ExpressionPreset::Blink));
        for vowel in ExpressionPreset::VOWELS {
            assert!(avatar.expressions_set.contains(&vowel));
        }
    }

    #[test]
    fn test_blink_blends_with_previous_value() {
        let mut avatar = Skeleton::full();
        let mut face_rt = FaceRetargeter::new(&RetargetTuning::default());

        // Both eyes shut: each eye is lerp(1, 0, 0.5) = 0.5, merged to 0.5
        face_rt.apply(Some(&mut avatar), &face());
        assert!((avatar.expression(ExpressionPreset::Blink) - 0.5).abs() < 1e-5);

        // Second frame: lerp(1, 0.5, 0.5) = 0.75
        face_rt.apply(Some(&mut avatar), &face());
        assert!((face_rt.state().blink - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_blink_stays_in_unit_range() {
        let mut avatar = Skeleton::full();
        let mut face_rt = FaceRetargeter::new(&RetargetTuning::default());

        for &(l, r, yaw) in &[(-3.0, 4.0, 0.0), (5.0, -5.0, 0.9), (0.5, 0.2, -0.9), (2.0, 2.0, 0.1)] {
            let mut f = face();
            f.eye = EyePair::new(l, r);
            f.head.y = yaw;
            face_rt.apply(Some(&mut avatar), &f);
            let blink = avatar.expression(ExpressionPreset::Blink);
            assert!((0.0..=1.0).contains(&blink), "blink out of range: {}", blink);
        }
    }

    #[test]
    fn test_vowels_blend_with_previous() {
        let mut avatar = Skeleton::full();
        let mut face_rt = FaceRetargeter::new(&RetargetTuning::default());

        face_rt.apply(Some(&mut avatar), &face());
        assert!((avatar.expression(ExpressionPreset::A) - 0.4).abs() < 1e-5);
        face_rt.apply(Some(&mut avatar), &face());
        assert!((avatar.expression(ExpressionPreset::A) - 0.6).abs() < 1e-5);
        assert_eq!(avatar.expression(ExpressionPreset::O), 0.0);
    }

    #[test]
    fn test_gaze_converges_to_constant_pupil() {
        let mut avatar = Skeleton::full();
        let mut face_rt = FaceRetargeter::new(&RetargetTuning::default());

        face_rt.apply(Some(&mut avatar), &face());
        let first = avatar.look_target();
        assert!((first.pitch - (-0.04)).abs() < 1e-5);
        assert!((first.yaw - 0.12).abs() < 1e-5);

        // Each frame closes 40% of the remaining distance to the pupil
        let target = Vec2::new(-0.1, 0.3);
        let mut previous_error = (target - Vec2::new(first.pitch, first.yaw)).length();
        for n in 2..=20 {
            face_rt.apply(Some(&mut avatar), &face());
            let look = avatar.look_target();
            let error = (target - Vec2::new(look.pitch, look.yaw)).length();
            let expected = target.length() * 0.6f32.powi(n);
            assert!(
                (error - expected).abs() < 1e-5,
                "frame {}: error {} expected {}",
                n,
                error,
                expected
            );
            assert!(error <= previous_error, "frame {}: error grew", n);
            previous_error = error;
        }

        for _ in 0..40 {
            face_rt.apply(Some(&mut avatar), &face());
        }
        let look = avatar.look_target();
        assert!((look.pitch - (-0.1)).abs() < 1e-4);
        assert!((look.yaw - 0.3).abs() < 1e-4);
        assert_eq!(face_rt.state().gaze, Vec2::new(look.pitch, look.yaw));
    }
}
