//! Test avatar that records every bone lookup and expression write.

use std::collections::HashSet;

use super::{Avatar, BoneTransform, ExpressionPreset, LookTarget, Skeleton};
use crate::rig::HumanoidBone;

pub(crate) struct RecordingAvatar {
    pub skeleton: Skeleton,
    pub touched: Vec<HumanoidBone>,
    pub expressions_set: Vec<ExpressionPreset>,
    pub look_calls: usize,
}

impl RecordingAvatar {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            touched: Vec::new(),
            expressions_set: Vec::new(),
            look_calls: 0,
        }
    }

    pub fn full() -> Self {
        Self::new(Skeleton::full())
    }

    pub fn touched_set(&self) -> HashSet<HumanoidBone> {
        self.touched.iter().copied().collect()
    }
}

impl Avatar for RecordingAvatar {
    fn bone(&self, bone: HumanoidBone) -> Option<&BoneTransform> {
        self.skeleton.bone(bone)
    }

    fn bone_mut(&mut self, bone: HumanoidBone) -> Option<&mut BoneTransform> {
        self.touched.push(bone);
        self.skeleton.bone_mut(bone)
    }

    fn expression(&self, preset: ExpressionPreset) -> f32 {
        self.skeleton.expression(preset)
    }

    fn set_expression(&mut self, preset: ExpressionPreset, value: f32) {
        self.expressions_set.push(preset);
        self.skeleton.set_expression(preset, value);
    }

    fn look_at(&mut self, target: LookTarget) {
        self.look_calls += 1;
        self.skeleton.look_at(target);
    }

    fn look_target(&self) -> LookTarget {
        self.skeleton.look_target()
    }
}
