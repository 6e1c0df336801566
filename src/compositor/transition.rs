use kurbo::{Size, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::layer::Pose;
use crate::config::EffectOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Crossfade,
    Slide,
    Zoom,
    Wipe,
    FadeToBlack,
}

impl TransitionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Crossfade => "crossfade",
            Self::Slide => "slide",
            Self::Zoom => "zoom",
            Self::Wipe => "wipe",
            Self::FadeToBlack => "fade_to_black",
        }
    }
}

/// Direction the slide effect pushes both images toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDirection {
    pub const ALL: [SlideDirection; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    fn unit(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
        }
    }
}

/// Direction the incoming image travels while it wipes over the outgoing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeDirection {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
    TopLeftToBottomRight,
    TopRightToBottomLeft,
    BottomLeftToTopRight,
    BottomRightToTopLeft,
}

impl WipeDirection {
    pub const ALL: [WipeDirection; 8] = [
        Self::LeftToRight,
        Self::RightToLeft,
        Self::TopToBottom,
        Self::BottomToTop,
        Self::TopLeftToBottomRight,
        Self::TopRightToBottomLeft,
        Self::BottomLeftToTopRight,
        Self::BottomRightToTopLeft,
    ];

    fn unit(self) -> Vec2 {
        match self {
            Self::LeftToRight => Vec2::new(1.0, 0.0),
            Self::RightToLeft => Vec2::new(-1.0, 0.0),
            Self::TopToBottom => Vec2::new(0.0, 1.0),
            Self::BottomToTop => Vec2::new(0.0, -1.0),
            Self::TopLeftToBottomRight => Vec2::new(1.0, 1.0),
            Self::TopRightToBottomLeft => Vec2::new(-1.0, 1.0),
            Self::BottomLeftToTopRight => Vec2::new(1.0, -1.0),
            Self::BottomRightToTopLeft => Vec2::new(-1.0, -1.0),
        }
    }
}

/// A transition effect with the random choices it made when it started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Crossfade,
    /// `anchor` is a ratio point inside the outgoing image's visual rect.
    Zoom { anchor: Vec2 },
    Slide(SlideDirection),
    Wipe(WipeDirection),
    FadeToBlack,
}

impl Transition {
    pub fn pick<R: Rng + ?Sized>(kind: TransitionKind, rng: &mut R) -> Self {
        match kind {
            TransitionKind::Crossfade => Self::Crossfade,
            TransitionKind::Zoom => Self::Zoom {
                anchor: Vec2::new(rng.random::<f64>(), rng.random::<f64>()),
            },
            TransitionKind::Slide => {
                Self::Slide(SlideDirection::ALL[rng.random_range(0..SlideDirection::ALL.len())])
            }
            TransitionKind::Wipe => {
                Self::Wipe(WipeDirection::ALL[rng.random_range(0..WipeDirection::ALL.len())])
            }
            TransitionKind::FadeToBlack => Self::FadeToBlack,
        }
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::Crossfade => TransitionKind::Crossfade,
            Self::Zoom { .. } => TransitionKind::Zoom,
            Self::Slide(_) => TransitionKind::Slide,
            Self::Wipe(_) => TransitionKind::Wipe,
            Self::FadeToBlack => TransitionKind::FadeToBlack,
        }
    }

    /// Layer placement at eased progress `t`.
    ///
    /// `frozen` is the outgoing pose captured when the transition started, `incoming` the
    /// Ken-Burns pose of the incoming image at this instant.
    pub fn frame(
        &self,
        t: f64,
        frozen: Pose,
        outgoing_size: Size,
        incoming: Pose,
        viewport: Size,
    ) -> TransitionFrame {
        let t = t.clamp(0.0, 1.0);
        let mut frame = TransitionFrame {
            current: frozen,
            current_opacity: 1.0 - t,
            next: incoming,
            next_opacity: t,
            caption_opacity: t,
            next_z: 1,
        };
        match *self {
            Self::Crossfade => {}
            Self::Zoom { anchor } => {
                frame.current = zoom_about(frozen, outgoing_size, anchor, 1.0 + t);
                frame.next.scale = incoming.scale * (0.5 + 0.5 * t);
            }
            Self::Slide(direction) => {
                let travel = scale_by(direction.unit(), viewport);
                frame.current.position = frozen.position + travel * t;
                frame.next.position = incoming.position - travel * (1.0 - t);
                frame.current_opacity = 1.0;
                frame.next_opacity = 1.0;
            }
            Self::Wipe(direction) => {
                let travel = scale_by(direction.unit(), viewport);
                frame.next.position = incoming.position - travel * (1.0 - t);
                frame.current_opacity = if t >= 1.0 { 0.0 } else { 1.0 };
                frame.next_opacity = 1.0;
                frame.next_z = 2;
            }
            Self::FadeToBlack => {
                let (current, next) = fade_to_black(t);
                frame.current_opacity = current;
                frame.next_opacity = next;
                frame.caption_opacity = next;
            }
        }
        frame
    }
}

fn scale_by(unit: Vec2, viewport: Size) -> Vec2 {
    Vec2::new(unit.x * viewport.width, unit.y * viewport.height)
}

/// Scales `pose` by `factor` keeping the point at `anchor` (ratios of the visual rect) fixed.
fn zoom_about(pose: Pose, size: Size, anchor: Vec2, factor: f64) -> Pose {
    let visual = Vec2::new(size.width * pose.scale, size.height * pose.scale);
    let center = pose.position.to_vec2() + size.to_vec2() * 0.5;
    let left = center - visual * 0.5;
    let fixed = left + Vec2::new(visual.x * anchor.x, visual.y * anchor.y);
    let zoomed = visual * factor;
    let new_left = fixed - Vec2::new(zoomed.x * anchor.x, zoomed.y * anchor.y);
    let new_center = new_left + zoomed * 0.5;
    Pose {
        position: (new_center - size.to_vec2() * 0.5).to_point(),
        scale: pose.scale * factor,
    }
}

/// Outgoing and incoming opacity for the three fade-to-black phases.
pub fn fade_to_black(t: f64) -> (f64, f64) {
    if t < 0.4 {
        (1.0 - t / 0.4, 0.0)
    } else if t < 0.6 {
        (0.0, 0.0)
    } else {
        (0.0, ((t - 0.6) / 0.4).min(1.0))
    }
}

/// Computed placement for both layers at one instant of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionFrame {
    pub current: Pose,
    pub current_opacity: f64,
    pub next: Pose,
    pub next_opacity: f64,
    pub caption_opacity: f64,
    pub next_z: i32,
}

impl TransitionFrame {
    pub fn is_finite(&self) -> bool {
        self.current.is_finite()
            && self.next.is_finite()
            && self.current_opacity.is_finite()
            && self.next_opacity.is_finite()
            && self.caption_opacity.is_finite()
    }
}

/// Chooses the effect for each transition among the enabled kinds.
#[derive(Debug, Clone)]
pub struct EffectSelector {
    order: EffectOrder,
    cursor: usize,
}

impl EffectSelector {
    pub fn new(order: EffectOrder) -> Self {
        Self { order, cursor: 0 }
    }

    /// Falls back to crossfade when nothing is enabled.
    pub fn next<R: Rng + ?Sized>(
        &mut self,
        enabled: &[TransitionKind],
        rng: &mut R,
    ) -> TransitionKind {
        if enabled.is_empty() {
            return TransitionKind::Crossfade;
        }
        match self.order {
            EffectOrder::Random => enabled[rng.random_range(0..enabled.len())],
            EffectOrder::Sequential => {
                let kind = enabled[self.cursor % enabled.len()];
                self.cursor = (self.cursor + 1) % enabled.len();
                kind
            }
        }
    }

    pub fn reset(&mut self, order: EffectOrder) {
        self.order = order;
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const VIEWPORT: Size = Size::new(800.0, 600.0);

    fn pose(x: f64, y: f64, scale: f64) -> Pose {
        Pose {
            position: Point::new(x, y),
            scale,
        }
    }

    #[test]
    fn crossfade_opacities_sum_to_one() {
        for step in 0..=10 {
            let t = f64::from(step) / 10.0;
            let frame = Transition::Crossfade.frame(
                t,
                pose(-400.0, -300.0, 1.0),
                VIEWPORT,
                pose(-400.0, -300.0, 1.2),
                VIEWPORT,
            );
            assert!((frame.current_opacity + frame.next_opacity - 1.0).abs() < 1e-12);
            assert_eq!(frame.caption_opacity, t);
            assert_eq!(frame.next.scale, 1.2);
        }
    }

    #[test]
    fn slide_moves_both_layers_one_viewport() {
        let frozen = pose(-400.0, -300.0, 1.0);
        let incoming = pose(-400.0, -300.0, 1.0);
        let effect = Transition::Slide(SlideDirection::Left);
        let start = effect.frame(0.0, frozen, VIEWPORT, incoming, VIEWPORT);
        assert_eq!(start.next.position, Point::new(400.0, -300.0));
        assert_eq!(start.current.position, frozen.position);
        let end = effect.frame(1.0, frozen, VIEWPORT, incoming, VIEWPORT);
        assert_eq!(end.next.position, incoming.position);
        assert_eq!(end.current.position, Point::new(-1200.0, -300.0));
        assert_eq!((end.current_opacity, end.next_opacity), (1.0, 1.0));
    }

    #[test]
    fn wipe_keeps_outgoing_still_and_snaps_it_hidden() {
        let frozen = pose(-400.0, -300.0, 1.1);
        let incoming = pose(-400.0, -300.0, 1.0);
        let effect = Transition::Wipe(WipeDirection::BottomRightToTopLeft);
        let mid = effect.frame(0.5, frozen, VIEWPORT, incoming, VIEWPORT);
        assert_eq!(mid.current, frozen);
        assert_eq!(mid.current_opacity, 1.0);
        assert_eq!(mid.next.position, Point::new(0.0, 0.0));
        assert_eq!(mid.next_z, 2);
        let end = effect.frame(1.0, frozen, VIEWPORT, incoming, VIEWPORT);
        assert_eq!(end.current_opacity, 0.0);
        assert_eq!(end.next.position, incoming.position);
    }

    #[test]
    fn zoom_keeps_anchor_point_fixed() {
        let size = Size::new(1000.0, 800.0);
        let frozen = pose(-500.0, -400.0, 1.2);
        let anchor = Vec2::new(0.25, 0.75);
        let effect = Transition::Zoom { anchor };
        let anchor_at = |p: Pose| {
            let w = size.width * p.scale;
            let h = size.height * p.scale;
            let cx = p.position.x + size.width / 2.0;
            let cy = p.position.y + size.height / 2.0;
            Point::new(cx - w / 2.0 + w * anchor.x, cy - h / 2.0 + h * anchor.y)
        };
        let before = anchor_at(frozen);
        let frame = effect.frame(0.6, frozen, size, pose(-400.0, -300.0, 1.1), VIEWPORT);
        assert!((frame.current.scale - 1.2 * 1.6).abs() < 1e-12);
        assert!((anchor_at(frame.current) - before).hypot() < 1e-9);
        assert!((frame.next.scale - 1.1 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn fade_to_black_phases() {
        assert_eq!(fade_to_black(0.0), (1.0, 0.0));
        assert!((fade_to_black(0.2).0 - 0.5).abs() < 1e-12);
        assert_eq!(fade_to_black(0.5), (0.0, 0.0));
        assert!((fade_to_black(0.8).1 - 0.5).abs() < 1e-12);
        assert_eq!(fade_to_black(1.0), (0.0, 1.0));

        let frame = Transition::FadeToBlack.frame(
            0.9,
            pose(0.0, 0.0, 1.0),
            VIEWPORT,
            pose(0.0, 0.0, 1.0),
            VIEWPORT,
        );
        assert_eq!(frame.caption_opacity, frame.next_opacity);
    }

    #[test]
    fn sequential_selector_round_robins() {
        let mut rng = StdRng::seed_from_u64(0);
        let enabled = [TransitionKind::Crossfade, TransitionKind::Wipe, TransitionKind::Zoom];
        let mut selector = EffectSelector::new(EffectOrder::Sequential);
        let picked: Vec<_> = (0..5).map(|_| selector.next(&enabled, &mut rng)).collect();
        assert_eq!(
            picked,
            [
                TransitionKind::Crossfade,
                TransitionKind::Wipe,
                TransitionKind::Zoom,
                TransitionKind::Crossfade,
                TransitionKind::Wipe
            ]
        );
    }

    #[test]
    fn selector_falls_back_to_crossfade() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut selector = EffectSelector::new(EffectOrder::Random);
        assert_eq!(selector.next(&[], &mut rng), TransitionKind::Crossfade);
    }

    #[test]
    fn random_selector_only_returns_enabled() {
        let mut rng = StdRng::seed_from_u64(4);
        let enabled = [TransitionKind::Slide, TransitionKind::FadeToBlack];
        let mut selector = EffectSelector::new(EffectOrder::Random);
        for _ in 0..100 {
            assert!(enabled.contains(&selector.next(&enabled, &mut rng)));
        }
    }

    #[test]
    fn picked_transition_matches_kind() {
        let mut rng = StdRng::seed_from_u64(8);
        for kind in [
            TransitionKind::Crossfade,
            TransitionKind::Slide,
            TransitionKind::Zoom,
            TransitionKind::Wipe,
            TransitionKind::FadeToBlack,
        ] {
            assert_eq!(Transition::pick(kind, &mut rng).kind(), kind);
        }
    }
}
