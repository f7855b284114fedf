//! Expression presets and the clamped value store

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::rig::clamp;

/// VRM expression presets driven by retargeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionPreset {
    Neutral,
    Blink,
    BlinkLeft,
    BlinkRight,
    A,
    I,
    U,
    E,
    O,
    Joy,
    Angry,
    Sorrow,
    Fun,
}

impl ExpressionPreset {
    /// Mouth shapes in the order the face retargeter commits them.
    pub const VOWELS: [ExpressionPreset; 5] = [
        ExpressionPreset::I,
        ExpressionPreset::A,
        ExpressionPreset::E,
        ExpressionPreset::O,
        ExpressionPreset::U,
    ];

    pub const ALL: [ExpressionPreset; 13] = [
        ExpressionPreset::Neutral,
        ExpressionPreset::Blink,
        ExpressionPreset::BlinkLeft,
        ExpressionPreset::BlinkRight,
        ExpressionPreset::A,
        ExpressionPreset::I,
        ExpressionPreset::U,
        ExpressionPreset::E,
        ExpressionPreset::O,
        ExpressionPreset::Joy,
        ExpressionPreset::Angry,
        ExpressionPreset::Sorrow,
        ExpressionPreset::Fun,
    ];

    /// VRM 0.x `presetName` as stored in `blendShapeMaster`.
    pub fn vrm0_name(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Blink => "blink",
            Self::BlinkLeft => "blink_l",
            Self::BlinkRight => "blink_r",
            Self::A => "a",
            Self::I => "i",
            Self::U => "u",
            Self::E => "e",
            Self::O => "o",
            Self::Joy => "joy",
            Self::Angry => "angry",
            Self::Sorrow => "sorrow",
            Self::Fun => "fun",
        }
    }

    /// VRM 1.0 preset key in `VRMC_vrm.expressions.preset`.
    pub fn vrm1_name(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Blink => "blink",
            Self::BlinkLeft => "blinkLeft",
            Self::BlinkRight => "blinkRight",
            Self::A => "aa",
            Self::I => "ih",
            Self::U => "ou",
            Self::E => "ee",
            Self::O => "oh",
            Self::Joy => "happy",
            Self::Angry => "angry",
            Self::Sorrow => "sad",
            Self::Fun => "relaxed",
        }
    }

    /// Resolve either a VRM 0.x or VRM 1.0 preset name (case-insensitive).
    pub fn from_vrm_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        Self::ALL.into_iter().find(|p| {
            p.vrm0_name() == lower || p.vrm1_name().to_lowercase() == lower
        })
    }
}

impl fmt::Display for ExpressionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.vrm1_name())
    }
}

/// Expression values keyed by preset. Every write is clamped to [0, 1].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionStore {
    values: HashMap<ExpressionPreset, f32>,
}

impl ExpressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, preset: ExpressionPreset) -> f32 {
        self.values.get(&preset).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, preset: ExpressionPreset, value: f32) {
        // NaN from a misbehaving solver collapses to 0
        let v = if value.is_nan() { 0.0 } else { clamp(value, 0.0, 1.0) };
        self.values.insert(preset, v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExpressionPreset, f32)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_defaults_to_zero() {
        let store = ExpressionStore::new();
        assert_eq!(store.get(ExpressionPreset::Blink), 0.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_clamps_writes() {
        let mut store = ExpressionStore::new();
        store.set(ExpressionPreset::A, 1.7);
        store.set(ExpressionPreset::O, -0.3);
        store.set(ExpressionPreset::U, f32::NAN);
        assert_eq!(store.get(ExpressionPreset::A), 1.0);
        assert_eq!(store.get(ExpressionPreset::O), 0.0);
        assert_eq!(store.get(ExpressionPreset::U), 0.0);
    }

    #[test]
    fn test_preset_names_resolve_both_versions() {
        assert_eq!(ExpressionPreset::from_vrm_name("a"), Some(ExpressionPreset::A));
        assert_eq!(ExpressionPreset::from_vrm_name("aa"), Some(ExpressionPreset::A));
        assert_eq!(
            ExpressionPreset::from_vrm_name("blinkLeft"),
            Some(ExpressionPreset::BlinkLeft)
        );
        assert_eq!(
            ExpressionPreset::from_vrm_name("Blink_L"),
            Some(ExpressionPreset::BlinkLeft)
        );
        assert_eq!(ExpressionPreset::from_vrm_name("Joy"), Some(ExpressionPreset::Joy));
        assert_eq!(ExpressionPreset::from_vrm_name("surprised"), None);
    }
}
