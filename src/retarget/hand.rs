//! Hand retargeting: wrist merge and finger phalanges.

use crate::avatar::Avatar;
use crate::config::{RetargetTuning, WristFallback};
use crate::rig::{rig_rotation, EulerRotation, Finger, HumanoidBone, Phalanx, Side};
use crate::solver::{RiggedHand, RiggedPose};

pub struct HandRetargeter {
    tuning: RetargetTuning,
    /// Last pose-solved wrist Z per side, indexed by `side_index`
    last_pose_z: [f32; 2],
}

fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

impl HandRetargeter {
    pub fn new(tuning: &RetargetTuning) -> Self {
        Self {
            tuning: tuning.clone(),
            last_pose_z: [0.0; 2],
        }
    }

    /// Remember the hand-segment Z of a pose solve for both sides.
    pub fn observe_pose(&mut self, pose: &RiggedPose) {
        for side in Side::BOTH {
            self.last_pose_z[side_index(side)] = pose.hand(side).z;
        }
    }

    pub fn last_pose_z(&self, side: Side) -> f32 {
        self.last_pose_z[side_index(side)]
    }

    /// Wrist Z to use when the current frame has no pose solve.
    fn fallback_z(&self, side: Side) -> f32 {
        match self.tuning.wrist_fallback {
            WristFallback::Zero => 0.0,
            WristFallback::LastKnown => self.last_pose_z(side),
        }
    }

    /// Apply one hand solve to the avatar's `side` hand. `pose` is the
    /// same-frame pose solve, if any.
    pub fn apply<A: Avatar + ?Sized>(
        &mut self,
        avatar: Option<&mut A>,
        side: Side,
        hand: &RiggedHand,
        pose: Option<&RiggedPose>,
    ) {
        let Some(avatar) = avatar else {
            return;
        };
        let lerp = self.tuning.default_lerp;

        let pose_z = match pose {
            Some(pose) => {
                let z = pose.hand(side).z;
                self.last_pose_z[side_index(side)] = z;
                z
            }
            None => self.fallback_z(side),
        };

        let wrist = EulerRotation {
            x: hand.wrist.x,
            y: hand.wrist.y,
            z: pose_z,
            order: hand.wrist.order,
        };
        rig_rotation(avatar, HumanoidBone::Hand(side), wrist, 1.0, lerp);

        for finger in Finger::ALL {
            for phalanx in Phalanx::ALL {
                rig_rotation(
                    avatar,
                    HumanoidBone::Finger(side, finger, phalanx),
                    hand.phalanx(finger, phalanx),
                    1.0,
                    lerp,
                );
            }
        }
    }
}
