use serde::{Deserialize, Serialize};
use std::fmt;

/// What an animation drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnimationKind {
    /// Local position along the axis
    #[default]
    Transform,
    /// Local Euler rotation along the axis
    Rotate,
    /// Local scale per non-zero axis component
    Scale,
    /// Material alpha
    Fade,
    /// Growth hook progress
    Grow,
    /// Removes the owning object
    Destroy,
    /// Clones the owning object once per activation
    Duplicate,
}

impl AnimationKind {
    /// Parse an authored kind keyword
    ///
    /// Matching is by case-insensitive containment; anything unrecognized
    /// is a `Transform`.
    pub fn parse(keyword: &str) -> Self {
        let keyword = keyword.to_lowercase();
        [
            ("rotate", Self::Rotate),
            ("scale", Self::Scale),
            ("destroy", Self::Destroy),
            ("duplicate", Self::Duplicate),
            ("fade", Self::Fade),
            ("grow", Self::Grow),
        ]
        .into_iter()
        .find(|(name, _)| keyword.contains(name))
        .map(|(_, kind)| kind)
        .unwrap_or_default()
    }

    /// Lifecycle kinds have no transform to restore on stop
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Destroy | Self::Duplicate)
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transform => "transform",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
            Self::Fade => "fade",
            Self::Grow => "grow",
            Self::Destroy => "destroy",
            Self::Duplicate => "duplicate",
        };
        f.write_str(name)
    }
}

/// Phase shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Ping-pong: from to to in the first half, back in the second
    Cyclic,
    /// `(cos 2πp - 1) / 2`, mirrored positive
    Sine,
    /// `sin πp`
    Halfsine,
}

impl Interpolation {
    pub fn parse(keyword: &str) -> Self {
        let keyword = keyword.to_lowercase();
        // "halfsine" contains "sine", test it first
        if keyword.contains("cyclic") {
            Self::Cyclic
        } else if keyword.contains("halfsine") {
            Self::Halfsine
        } else if keyword.contains("sine") {
            Self::Sine
        } else {
            Self::Linear
        }
    }

    /// Shape phase `p` and produce the value between `from` and `to`
    pub fn value(&self, phase: f64, from: f64, to: f64) -> f64 {
        let (mut p, mut from, mut to) = (phase, from, to);
        match self {
            Self::Cyclic => {
                if p >= 0.5 {
                    p -= 0.5;
                    std::mem::swap(&mut from, &mut to);
                }
                p *= 2.0;
            }
            Self::Halfsine => p = (std::f64::consts::PI * p).sin(),
            Self::Sine => p = ((2.0 * std::f64::consts::PI * p).cos() - 1.0) / 2.0,
            Self::Linear => {}
        }
        if p < 0.0 {
            p = -p;
        }
        from + (to - from) * p
    }
}

/// Event class that activates an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerBucket {
    OnCreate,
    OnFollow,
    OnFocus,
    InFocus,
    OnClick,
}

impl TriggerBucket {
    pub const ALL: [TriggerBucket; 5] = [
        Self::OnCreate,
        Self::OnFocus,
        Self::InFocus,
        Self::OnClick,
        Self::OnFollow,
    ];

    /// Instances in this bucket start out active
    pub fn starts_active(&self) -> bool {
        matches!(self, Self::OnCreate)
    }

    /// Name of the wrapper node that carries instances of this bucket
    pub fn wrapper_name(&self) -> &'static str {
        match self {
            Self::OnCreate => "OnCreateWrapper",
            Self::OnFollow => "OnFollowWrapper",
            Self::OnFocus => "OnFocusWrapper",
            Self::InFocus => "InFocusWrapper",
            Self::OnClick => "OnClickWrapper",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(AnimationKind::parse("Rotate"), AnimationKind::Rotate);
        assert_eq!(AnimationKind::parse("slowScale"), AnimationKind::Scale);
        assert_eq!(AnimationKind::parse("DESTROY"), AnimationKind::Destroy);
        assert_eq!(AnimationKind::parse("duplicate"), AnimationKind::Duplicate);
        assert_eq!(AnimationKind::parse("fadeOut"), AnimationKind::Fade);
        assert_eq!(AnimationKind::parse("grow"), AnimationKind::Grow);
        assert_eq!(AnimationKind::parse("wobble"), AnimationKind::Transform);
        assert_eq!(AnimationKind::parse(""), AnimationKind::Transform);
    }

    #[test]
    fn test_interpolation_parsing() {
        assert_eq!(Interpolation::parse("Cyclic"), Interpolation::Cyclic);
        assert_eq!(Interpolation::parse("halfSine"), Interpolation::Halfsine);
        assert_eq!(Interpolation::parse("sine"), Interpolation::Sine);
        assert_eq!(Interpolation::parse("bounce"), Interpolation::Linear);
    }

    #[test]
    fn test_shaped_values() {
        assert!((Interpolation::Linear.value(0.25, 0.0, 4.0) - 1.0).abs() < 1e-12);
        assert!((Interpolation::Halfsine.value(0.5, 0.0, 2.0) - 2.0).abs() < 1e-12);
        assert!(Interpolation::Halfsine.value(0.0, 0.0, 2.0).abs() < 1e-12);
        // Sine is mirrored positive and peaks mid-phase
        assert!((Interpolation::Sine.value(0.5, 0.0, 1.0) - 1.0).abs() < 1e-12);
        assert!(Interpolation::Sine.value(0.0, 0.0, 1.0).abs() < 1e-12);
        // Cyclic reaches `to` at half phase and comes back
        assert!((Interpolation::Cyclic.value(0.25, 0.0, 10.0) - 5.0).abs() < 1e-12);
        assert!((Interpolation::Cyclic.value(0.5, 0.0, 10.0) - 10.0).abs() < 1e-12);
        assert!((Interpolation::Cyclic.value(0.75, 0.0, 10.0) - 5.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn cyclic_is_symmetric(p in 0.0f64..1.0, from in -100.0f64..100.0, to in -100.0f64..100.0) {
            let a = Interpolation::Cyclic.value(p, from, to);
            let b = Interpolation::Cyclic.value((p + 0.5) % 1.0, from, to);
            prop_assert!((a + b - (from + to)).abs() < 1e-9);
        }
    }
}
