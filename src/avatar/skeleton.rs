//! In-memory skeleton: bone transforms, expression values, look target.

use std::collections::HashMap;

use super::{Avatar, BoneTransform, ExpressionPreset, ExpressionStore, LookTarget};
use crate::rig::HumanoidBone;

#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: HashMap<HumanoidBone, BoneTransform>,
    expressions: ExpressionStore,
    look_target: LookTarget,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// A skeleton with every bone in the vocabulary at identity.
    pub fn full() -> Self {
        Self::with_bones(HumanoidBone::all())
    }

    pub fn with_bones<I: IntoIterator<Item = HumanoidBone>>(bones: I) -> Self {
        let mut skeleton = Self::new();
        for bone in bones {
            skeleton.insert_bone(bone, BoneTransform::default());
        }
        skeleton
    }

    pub fn insert_bone(&mut self, bone: HumanoidBone, transform: BoneTransform) {
        self.bones.insert(bone, transform);
    }

    pub fn bones(&self) -> impl Iterator<Item = (HumanoidBone, &BoneTransform)> + '_ {
        self.bones.iter().map(|(&b, t)| (b, t))
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn expressions(&self) -> &ExpressionStore {
        &self.expressions
    }
}

impl Avatar for Skeleton {
    fn bone(&self, bone: HumanoidBone) -> Option<&BoneTransform> {
        self.bones.get(&bone)
    }

    fn bone_mut(&mut self, bone: HumanoidBone) -> Option<&mut BoneTransform> {
        self.bones.get_mut(&bone)
    }

    fn expression(&self, preset: ExpressionPreset) -> f32 {
        self.expressions.get(preset)
    }

    fn set_expression(&mut self, preset: ExpressionPreset, value: f32) {
        self.expressions.set(preset, value);
    }

    fn look_at(&mut self, target: LookTarget) {
        self.look_target = target;
    }

    fn look_target(&self) -> LookTarget {
        self.look_target
    }
}
