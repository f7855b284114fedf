//! Body retargeting: hips, torso and limbs.

use glam::Vec3;

use crate::avatar::Avatar;
use crate::config::RetargetTuning;
use crate::rig::{rig_position, rig_rotation, HumanoidBone, Side};
use crate::solver::RiggedPose;

/// Map a solved hip position into avatar space: mirror X and Z, lift Y.
pub fn hip_position_target(solved: Vec3, height_offset: f32) -> Vec3 {
    Vec3::new(-solved.x, solved.y + height_offset, -solved.z)
}

pub struct BodyRetargeter {
    tuning: RetargetTuning,
}

impl BodyRetargeter {
    pub fn new(tuning: &RetargetTuning) -> Self {
        Self {
            tuning: tuning.clone(),
        }
    }

    pub fn apply<A: Avatar + ?Sized>(&self, avatar: Option<&mut A>, pose: &RiggedPose) {
        let Some(avatar) = avatar else {
            return;
        };
        let t = &self.tuning;

        rig_rotation(
            avatar,
            HumanoidBone::Hips,
            pose.hips.rotation,
            t.hips_rotation_damping,
            t.default_lerp,
        );
        rig_position(
            avatar,
            HumanoidBone::Hips,
            hip_position_target(pose.hips.position.into(), t.hips_height_offset),
            t.hips_position_damping,
            t.hips_position_lerp,
        );

        // The single spine estimate is split across chest and spine
        rig_rotation(avatar, HumanoidBone::Chest, pose.spine, t.chest_damping, t.default_lerp);
        rig_rotation(avatar, HumanoidBone::Spine, pose.spine, t.spine_damping, t.default_lerp);

        for side in Side::BOTH {
            let limbs = [
                (HumanoidBone::UpperArm(side), pose.upper_arm(side)),
                (HumanoidBone::LowerArm(side), pose.lower_arm(side)),
                (HumanoidBone::UpperLeg(side), pose.upper_leg(side)),
                (HumanoidBone::LowerLeg(side), pose.lower_leg(side)),
            ];
            for (bone, rotation) in limbs {
                rig_rotation(avatar, bone, rotation, t.limb_damping, t.default_lerp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::testing::RecordingAvatar;
    use crate::avatar::Skeleton;
    use crate::rig::EulerRotation;
    use crate::solver::{Point3, RiggedHips};
    use std::collections::HashSet;

    fn pose() -> RiggedPose {
        RiggedPose {
            hips: RiggedHips {
                rotation: EulerRotation::new(0.0, 0.4, 0.0),
                position: Point3 {
                    x: 0.2,
                    y: 0.1,
                    z: -0.3,
                },
            },
            spine: EulerRotation::new(0.2, 0.0, 0.0),
            left_upper_arm: EulerRotation::new(0.0, 0.0, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_hip_position_target() {
        let target = hip_position_target(Vec3::new(0.2, 0.1, -0.3), 1.0);
        assert!((target - Vec3::new(-0.2, 1.1, 0.3)).length() < 1e-6);
    }

    #[test]
    fn test_hips_reach_mapped_position_at_full_interpolation() {
        let tuning = RetargetTuning {
            hips_position_damping: 1.0,
            hips_position_lerp: 1.0,
            ..Default::default()
        };
        let mut hips_pose = pose();
        hips_pose.hips.position = Point3 {
            x: 0.1,
            y: 0.2,
            z: 0.3,
        };

        let target = hip_position_target(Vec3::new(0.1, 0.2, 0.3), 1.0);
        assert!((target - Vec3::new(-0.1, 1.2, -0.3)).length() < 1e-6);

        let mut avatar = Skeleton::full();
        BodyRetargeter::new(&tuning).apply(Some(&mut avatar), &hips_pose);
        let p = avatar.bone(HumanoidBone::Hips).unwrap().position;
        assert!((p - Vec3::new(-0.1, 1.2, -0.3)).length() < 1e-6);
    }

    #[test]
    fn test_hips_move_toward_mapped_position() {
        let mut avatar = Skeleton::full();
        BodyRetargeter::new(&RetargetTuning::default()).apply(Some(&mut avatar), &pose());

        // Damping 1, interpolation 0.07 from the origin
        let p = avatar.bone(HumanoidBone::Hips).unwrap().position;
        let expected = Vec3::new(-0.2, 1.1, 0.3) * 0.07;
        assert!((p - expected).length() < 1e-6);
    }

    #[test]
    fn test_touches_torso_and_limbs_only() {
        let mut avatar = RecordingAvatar::full();
        BodyRetargeter::new(&RetargetTuning::default()).apply(Some(&mut avatar), &pose());

        let mut expected: HashSet<HumanoidBone> =
            [HumanoidBone::Hips, HumanoidBone::Chest, HumanoidBone::Spine].into();
        for side in Side::BOTH {
            expected.insert(HumanoidBone::UpperArm(side));
            expected.insert(HumanoidBone::LowerArm(side));
            expected.insert(HumanoidBone::UpperLeg(side));
            expected.insert(HumanoidBone::LowerLeg(side));
        }
        assert_eq!(avatar.touched_set(), expected);
        assert!(avatar.expressions_set.is_empty());
    }

    #[test]
    fn test_spine_estimate_split_by_damping() {
        let mut avatar = Skeleton::full();
        let tuning = RetargetTuning {
            default_lerp: 1.0,
            ..Default::default()
        };
        BodyRetargeter::new(&tuning).apply(Some(&mut avatar), &pose());

        let chest = avatar.bone(HumanoidBone::Chest).unwrap().rotation;
        let spine = avatar.bone(HumanoidBone::Spine).unwrap().rotation;
        assert!(chest.angle_between(EulerRotation::new(0.05, 0.0, 0.0).to_quat()) < 1e-4);
        assert!(spine.angle_between(EulerRotation::new(0.09, 0.0, 0.0).to_quat()) < 1e-4);
    }

    #[test]
    fn test_no_avatar_is_noop() {
        BodyRetargeter::new(&RetargetTuning::default()).apply(None::<&mut Skeleton>, &pose());
    }
}
