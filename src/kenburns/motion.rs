use rand::Rng;
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionPattern {
    Linear,
    Arc,
    Wave,
    SpiralIn,
    Zigzag,
}

impl MotionPattern {
    pub const ALL: [MotionPattern; 5] = [
        MotionPattern::Linear,
        MotionPattern::Arc,
        MotionPattern::Wave,
        MotionPattern::SpiralIn,
        MotionPattern::Zigzag,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Arc => "arc",
            Self::Wave => "wave",
            Self::SpiralIn => "spiral_in",
            Self::Zigzag => "zigzag",
        }
    }
}

/// A motion pattern together with the random parameters it keeps for one slide.
///
/// Generated once when the slide starts and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionParameters {
    Linear,
    Arc { bulge_direction: f64 },
    Wave { cycles: f64 },
    SpiralIn { rotations: f64, start_angle: f64 },
    Zigzag { segments: u32 },
}

impl MotionParameters {
    pub fn generate<R: Rng + ?Sized>(pattern: MotionPattern, rng: &mut R) -> Self {
        match pattern {
            MotionPattern::Linear => Self::Linear,
            MotionPattern::Arc => Self::Arc {
                bulge_direction: random_sign(rng),
            },
            MotionPattern::Wave => Self::Wave {
                cycles: rng.random_range(1.5..3.0),
            },
            MotionPattern::SpiralIn => Self::SpiralIn {
                rotations: rng.random_range(2.0..3.5),
                start_angle: rng.random_range(0.0..TAU),
            },
            MotionPattern::Zigzag => Self::Zigzag {
                segments: rng.random_range(3..=5),
            },
        }
    }

    pub fn pattern(&self) -> MotionPattern {
        match self {
            Self::Linear => MotionPattern::Linear,
            Self::Arc { .. } => MotionPattern::Arc,
            Self::Wave { .. } => MotionPattern::Wave,
            Self::SpiralIn { .. } => MotionPattern::SpiralIn,
            Self::Zigzag { .. } => MotionPattern::Zigzag,
        }
    }
}

pub(crate) fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}
