use kurbo::{Size, Vec2};
use rand::Rng;
use std::f64::consts::TAU;

use super::motion::{MotionParameters, MotionPattern, random_sign};
use crate::config::FitMode;

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.random::<f64>()
}

fn intensity_factor(intensity: u8) -> f64 {
    f64::from(intensity.clamp(1, 10)) / 10.0
}

/// Start and end zoom for one slide. Start lands in `[1.05, 2.0]`, end in `[1.0, 1.05)`.
pub fn compute_scales<R: Rng + ?Sized>(rng: &mut R, intensity: u8) -> (f64, f64) {
    let zoom = f64::from(intensity.clamp(1, 10)) * 0.1 + uniform(rng, -0.1, 0.1);
    let start = (1.0 + zoom).clamp(1.05, 2.0);
    let end = 1.0 + uniform(rng, 0.0, 0.05);
    (start, end)
}

pub fn base_scale(image: Size, viewport: Size, fit: FitMode) -> f64 {
    if image.width <= 0.0 || image.height <= 0.0 {
        return 1.0;
    }
    let sx = viewport.width / image.width;
    let sy = viewport.height / image.height;
    match fit {
        FitMode::Cover => sx.max(sy),
        FitMode::Contain => sx.min(sy),
    }
}

/// Slack per axis that keeps an image scaled by `base * total` covering the viewport.
pub fn max_offset(image: Size, viewport: Size, base: f64, total: f64) -> Vec2 {
    Vec2::new(
        ((image.width * base * total - viewport.width) / 2.0).max(0.0),
        ((image.height * base * total - viewport.height) / 2.0).max(0.0),
    )
}

/// Picks a motion pattern uniformly and derives the start/end offsets for it.
pub fn compute_offsets<R: Rng + ?Sized>(
    rng: &mut R,
    image: Size,
    viewport: Size,
    fit: FitMode,
    start_scale: f64,
    end_scale: f64,
    intensity: u8,
) -> (MotionParameters, Vec2, Vec2) {
    let motion = MotionParameters::generate(MotionPattern::random(rng), rng);
    let (start, end) = compute_offsets_for(
        rng,
        &motion,
        image,
        viewport,
        fit,
        start_scale,
        end_scale,
        intensity,
    );
    (motion, start, end)
}

#[allow(clippy::too_many_arguments)]
pub fn compute_offsets_for<R: Rng + ?Sized>(
    rng: &mut R,
    motion: &MotionParameters,
    image: Size,
    viewport: Size,
    fit: FitMode,
    start_scale: f64,
    end_scale: f64,
    intensity: u8,
) -> (Vec2, Vec2) {
    let base = base_scale(image, viewport, fit);
    let start_max = max_offset(image, viewport, base, start_scale);
    let end_max = match fit {
        FitMode::Cover => max_offset(image, viewport, base, end_scale),
        FitMode::Contain => Vec2::ZERO,
    };
    let factor = intensity_factor(intensity);

    let start = match *motion {
        MotionParameters::SpiralIn { start_angle, .. } => {
            let distance = uniform(rng, 0.5, 0.7);
            Vec2::new(
                start_angle.cos() * start_max.x * distance,
                start_angle.sin() * start_max.y * distance,
            )
        }
        MotionParameters::Arc { .. } => {
            let edge = uniform(rng, 0.7, 0.9);
            let center = uniform(rng, 0.3, 0.6);
            let (fx, fy) = if rng.random_bool(0.5) {
                (edge, center)
            } else {
                (center, edge)
            };
            Vec2::new(
                random_sign(rng) * start_max.x * fx,
                random_sign(rng) * start_max.y * fy,
            )
        }
        _ => {
            let distance = uniform(rng, 0.7, 0.9);
            Vec2::new(
                random_sign(rng) * start_max.x * distance,
                random_sign(rng) * start_max.y * distance,
            )
        }
    } * factor;

    let end = match (fit, motion.pattern()) {
        (FitMode::Contain, _) | (FitMode::Cover, MotionPattern::SpiralIn) => Vec2::ZERO,
        (FitMode::Cover, MotionPattern::Wave | MotionPattern::Zigzag) => Vec2::new(
            uniform(rng, -0.3, 0.3) * end_max.x,
            uniform(rng, -0.3, 0.3) * end_max.y,
        ),
        (FitMode::Cover, _) => {
            let distance = uniform(rng, 0.0, 0.4);
            Vec2::new(
                uniform(rng, -end_max.x, end_max.x) * distance,
                uniform(rng, -end_max.y, end_max.y) * distance,
            )
        }
    };

    (truncate(start), truncate(end))
}

fn truncate(v: Vec2) -> Vec2 {
    Vec2::new(v.x.trunc(), v.y.trunc())
}

/// Offset of the slide at eased progress `t` along its motion curve.
pub fn position_at(
    t: f64,
    motion: &MotionParameters,
    start: Vec2,
    end: Vec2,
    intensity: u8,
) -> Vec2 {
    let t = t.clamp(0.0, 1.0);
    let factor = intensity_factor(intensity);
    let delta = end - start;
    let base = start + delta * t;
    let horizontal = delta.x.abs() > delta.y.abs();
    let perpendicular = |amount: f64| {
        if horizontal {
            Vec2::new(0.0, amount)
        } else {
            Vec2::new(amount, 0.0)
        }
    };

    match *motion {
        MotionParameters::Linear => base,
        MotionParameters::Arc { bulge_direction } => {
            let bulge = 0.3 * factor * bulge_direction;
            let mid = start.lerp(end, 0.5);
            let control = if horizontal {
                Vec2::new(mid.x, mid.y + delta.x * bulge)
            } else {
                Vec2::new(mid.x + delta.y * bulge, mid.y)
            };
            let u = 1.0 - t;
            start * (u * u) + control * (2.0 * u * t) + end * (t * t)
        }
        MotionParameters::Wave { cycles } => {
            let amplitude = 50.0 * factor * (1.0 - t);
            base + perpendicular(amplitude * (t * TAU * cycles).sin())
        }
        MotionParameters::SpiralIn {
            rotations,
            start_angle,
        } => {
            let angle = start_angle + t * rotations * TAU;
            let radius = if t < 0.2 {
                1.0 + (t / 0.2) * 0.3
            } else {
                1.3 * (1.0 - (t - 0.2) / 0.8)
            };
            let amplitude = 120.0 * factor * radius;
            base + Vec2::new(angle.cos(), angle.sin()) * amplitude
        }
        MotionParameters::Zigzag { segments } => {
            let amplitude = 60.0 * factor * (1.0 - t);
            base + perpendicular(amplitude * triangle(t, segments))
        }
    }
}

/// Triangle wave in `[-1, 1]` made of `segments * 2` half-cycles over `t ∈ [0, 1]`.
fn triangle(t: f64, segments: u32) -> f64 {
    let position = t * f64::from(segments) * 2.0;
    let half_cycle = position.floor();
    let frac = position - half_cycle;
    if (half_cycle as u64) % 2 == 0 {
        frac * 2.0 - 1.0
    } else {
        1.0 - frac * 2.0
    }
}
