//! Humanoid bone vocabulary.
//!
//! A closed set of bone identifiers following the VRM humanoid naming. Names
//! use the VRM 0.x phalanx convention for thumbs (proximal/intermediate/
//! distal); VRM 1.0 thumb names are translated on lookup.

use std::fmt;

/// Body side, from the avatar's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    fn prefix(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Little,
    ];

    fn name(self) -> &'static str {
        match self {
            Finger::Thumb => "Thumb",
            Finger::Index => "Index",
            Finger::Middle => "Middle",
            Finger::Ring => "Ring",
            Finger::Little => "Little",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phalanx {
    Proximal,
    Intermediate,
    Distal,
}

impl Phalanx {
    pub const ALL: [Phalanx; 3] = [Phalanx::Proximal, Phalanx::Intermediate, Phalanx::Distal];

    fn name(self) -> &'static str {
        match self {
            Phalanx::Proximal => "Proximal",
            Phalanx::Intermediate => "Intermediate",
            Phalanx::Distal => "Distal",
        }
    }
}

/// A humanoid bone identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HumanoidBone {
    Hips,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    Jaw,
    Eye(Side),
    Shoulder(Side),
    UpperArm(Side),
    LowerArm(Side),
    Hand(Side),
    UpperLeg(Side),
    LowerLeg(Side),
    Foot(Side),
    Toes(Side),
    Finger(Side, Finger, Phalanx),
}

impl HumanoidBone {
    /// Every bone in the vocabulary.
    pub fn all() -> impl Iterator<Item = HumanoidBone> {
        use HumanoidBone::*;

        let torso = [Hips, Spine, Chest, UpperChest, Neck, Head, Jaw];
        let sided = Side::BOTH.into_iter().flat_map(|s| {
            [
                Eye(s),
                Shoulder(s),
                UpperArm(s),
                LowerArm(s),
                Hand(s),
                UpperLeg(s),
                LowerLeg(s),
                Foot(s),
                Toes(s),
            ]
        });
        let fingers = Side::BOTH.into_iter().flat_map(Self::phalanges);

        torso.into_iter().chain(sided).chain(fingers)
    }

    /// The 15 finger bones of one hand.
    pub fn phalanges(side: Side) -> impl Iterator<Item = HumanoidBone> {
        Finger::ALL.into_iter().flat_map(move |f| {
            Phalanx::ALL
                .into_iter()
                .map(move |p| HumanoidBone::Finger(side, f, p))
        })
    }

    pub fn side(&self) -> Option<Side> {
        use HumanoidBone::*;
        match *self {
            Eye(s) | Shoulder(s) | UpperArm(s) | LowerArm(s) | Hand(s) | UpperLeg(s)
            | LowerLeg(s) | Foot(s) | Toes(s) | Finger(s, _, _) => Some(s),
            _ => None,
        }
    }

    /// VRM humanoid bone name (`leftUpperArm`, `rightIndexDistal`, ...).
    pub fn vrm_name(&self) -> String {
        use HumanoidBone::*;
        let (side, base) = match *self {
            Hips => return "hips".to_string(),
            Spine => return "spine".to_string(),
            Chest => return "chest".to_string(),
            UpperChest => return "upperChest".to_string(),
            Neck => return "neck".to_string(),
            Head => return "head".to_string(),
            Jaw => return "jaw".to_string(),
            Eye(s) => (s, "Eye"),
            Shoulder(s) => (s, "Shoulder"),
            UpperArm(s) => (s, "UpperArm"),
            LowerArm(s) => (s, "LowerArm"),
            Hand(s) => (s, "Hand"),
            UpperLeg(s) => (s, "UpperLeg"),
            LowerLeg(s) => (s, "LowerLeg"),
            Foot(s) => (s, "Foot"),
            Toes(s) => (s, "Toes"),
            Finger(s, f, p) => return format!("{}{}{}", s.prefix(), f.name(), p.name()),
        };
        format!("{}{}", side.prefix(), base)
    }

    /// VRM 1.0 humanoid bone name. Matches `vrm_name` except for the thumb,
    /// whose chain is `ThumbMetacarpal`, `ThumbProximal`, `ThumbDistal`.
    pub fn vrm1_name(&self) -> String {
        match *self {
            HumanoidBone::Finger(side, Finger::Thumb, phalanx) => {
                let joint = match phalanx {
                    Phalanx::Proximal => "Metacarpal",
                    Phalanx::Intermediate => "Proximal",
                    Phalanx::Distal => "Distal",
                };
                format!("{}Thumb{}", side.prefix(), joint)
            }
            _ => self.vrm_name(),
        }
    }

    /// Resolve a VRM 0.x bone name. Leading capitals (`LeftUpperArm`) are accepted.
    pub fn from_vrm_name(name: &str) -> Option<Self> {
        let normalized = lower_first(name);
        Self::all().find(|b| b.vrm_name() == normalized)
    }

    /// Resolve a VRM 1.0 bone name. VRM 1.0 shifts the thumb chain by one
    /// (`ThumbMetacarpal`, `ThumbProximal`, `ThumbDistal`).
    pub fn from_vrm1_name(name: &str) -> Option<Self> {
        let normalized = lower_first(name);
        for side in Side::BOTH {
            let prefix = side.prefix();
            if let Some(rest) = normalized.strip_prefix(prefix) {
                let phalanx = match rest {
                    "ThumbMetacarpal" => Some(Phalanx::Proximal),
                    "ThumbProximal" => Some(Phalanx::Intermediate),
                    "ThumbDistal" => Some(Phalanx::Distal),
                    _ => None,
                };
                if let Some(p) = phalanx {
                    return Some(HumanoidBone::Finger(side, Finger::Thumb, p));
                }
            }
        }
        Self::from_vrm_name(&normalized)
    }
}

impl fmt::Display for HumanoidBone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.vrm_name())
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_size_and_uniqueness() {
        let names: Vec<String> = HumanoidBone::all().map(|b| b.vrm_name()).collect();
        // 7 torso + 2 * 9 sided + 2 * 15 fingers
        assert_eq!(names.len(), 55);
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_names() {
        assert_eq!(HumanoidBone::Hips.vrm_name(), "hips");
        assert_eq!(HumanoidBone::UpperArm(Side::Left).vrm_name(), "leftUpperArm");
        assert_eq!(
            HumanoidBone::Finger(Side::Right, Finger::Little, Phalanx::Intermediate).vrm_name(),
            "rightLittleIntermediate"
        );
    }

    #[test]
    fn test_from_vrm_name_round_trip_and_capitalized() {
        for bone in HumanoidBone::all() {
            assert_eq!(HumanoidBone::from_vrm_name(&bone.vrm_name()), Some(bone));
        }
        assert_eq!(
            HumanoidBone::from_vrm_name("LeftUpperArm"),
            Some(HumanoidBone::UpperArm(Side::Left))
        );
        assert_eq!(HumanoidBone::from_vrm_name("tail"), None);
    }

    #[test]
    fn test_vrm1_thumb_names_shift() {
        assert_eq!(
            HumanoidBone::from_vrm1_name("leftThumbMetacarpal"),
            Some(HumanoidBone::Finger(Side::Left, Finger::Thumb, Phalanx::Proximal))
        );
        assert_eq!(
            HumanoidBone::from_vrm1_name("rightThumbProximal"),
            Some(HumanoidBone::Finger(Side::Right, Finger::Thumb, Phalanx::Intermediate))
        );
        assert_eq!(
            HumanoidBone::from_vrm1_name("rightIndexProximal"),
            Some(HumanoidBone::Finger(Side::Right, Finger::Index, Phalanx::Proximal))
        );
        assert_eq!(HumanoidBone::from_vrm1_name("neck"), Some(HumanoidBone::Neck));
    }

    #[test]
    fn test_vrm1_names_shift_thumb_only() {
        assert_eq!(
            HumanoidBone::Finger(Side::Left, Finger::Thumb, Phalanx::Proximal).vrm1_name(),
            "leftThumbMetacarpal"
        );
        assert_eq!(
            HumanoidBone::Finger(Side::Right, Finger::Thumb, Phalanx::Intermediate).vrm1_name(),
            "rightThumbProximal"
        );
        assert_eq!(
            HumanoidBone::Finger(Side::Right, Finger::Thumb, Phalanx::Distal).vrm1_name(),
            "rightThumbDistal"
        );
        assert_eq!(
            HumanoidBone::Finger(Side::Left, Finger::Index, Phalanx::Intermediate).vrm1_name(),
            "leftIndexIntermediate"
        );
        assert_eq!(HumanoidBone::UpperChest.vrm1_name(), "upperChest");

        for bone in HumanoidBone::all() {
            assert_eq!(HumanoidBone::from_vrm1_name(&bone.vrm1_name()), Some(bone));
        }
        let names: HashSet<String> = HumanoidBone::all().map(|b| b.vrm1_name()).collect();
        assert!(!names.contains("leftThumbIntermediate"));
        assert_eq!(names.len(), 55);
    }

    #[test]
    fn test_phalanges_per_side() {
        let left: Vec<_> = HumanoidBone::phalanges(Side::Left).collect();
        assert_eq!(left.len(), 15);
        assert!(left.iter().all(|b| b.side() == Some(Side::Left)));
    }
}
