//! Ken-Burns motion synthesis: zoom range, pan offsets and the five motion curves.

pub mod motion;
pub mod path;

use kurbo::{Size, Vec2};
use rand::Rng;

use crate::config::FitMode;
pub use motion::{MotionParameters, MotionPattern};
pub use path::{base_scale, compute_offsets, compute_scales, max_offset, position_at};

/// One layer's trajectory for its current display. Immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub start_scale: f64,
    pub end_scale: f64,
    pub start_offset: Vec2,
    pub end_offset: Vec2,
    pub motion: MotionParameters,
    pub intensity: u8,
}

impl AnimationState {
    /// `image` is the size the bitmap is drawn at before Ken-Burns zoom. The session passes
    /// the bitmap already scaled for `viewport`, whose base scale is then about 1.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        image: Size,
        viewport: Size,
        fit: FitMode,
        intensity: u8,
    ) -> Self {
        let (start_scale, end_scale) = compute_scales(rng, intensity);
        let (motion, start_offset, end_offset) = compute_offsets(
            rng,
            image,
            viewport,
            fit,
            start_scale,
            end_scale,
            intensity,
        );
        Self {
            start_scale,
            end_scale,
            start_offset,
            end_offset,
            motion,
            intensity,
        }
    }

    /// A motionless state: centered, unscaled.
    pub fn fixed() -> Self {
        Self::still(Vec2::ZERO)
    }

    /// Unscaled and held at `offset` from the centered placement. Used when Ken Burns is off.
    pub fn still(offset: Vec2) -> Self {
        Self {
            start_scale: 1.0,
            end_scale: 1.0,
            start_offset: offset,
            end_offset: offset,
            motion: MotionParameters::Linear,
            intensity: 1,
        }
    }

    pub fn scale_at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        self.start_scale + (self.end_scale - self.start_scale) * t
    }

    pub fn offset_at(&self, t: f64) -> Vec2 {
        position_at(
            t,
            &self.motion,
            self.start_offset,
            self.end_offset,
            self.intensity,
        )
    }
}
