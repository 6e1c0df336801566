//! The two live layers and how each transition kind places them.

pub mod layer;
pub mod overlay;
pub mod transition;

use kurbo::Size;
use tracing::debug;

use crate::error::{SlideshowError, SlideshowResult};
pub use layer::{Layer, Pose};
pub use overlay::{Caption, CaptionStyle};
pub use transition::{EffectSelector, Transition, TransitionFrame, TransitionKind};

#[derive(Debug, Clone, Copy)]
struct ActiveTransition {
    effect: Transition,
    frozen: Pose,
}

/// Owns the outgoing (`current`) and incoming (`next`) layers.
///
/// `next` exists exactly while a transition is in flight.
#[derive(Debug)]
pub struct Compositor {
    viewport: Size,
    current: Option<Layer>,
    next: Option<Layer>,
    transition: Option<ActiveTransition>,
    caption: Option<Caption>,
    captions: bool,
}

impl Compositor {
    pub fn new(viewport: Size, captions: bool) -> Self {
        Self {
            viewport,
            current: None,
            next: None,
            transition: None,
            caption: None,
            captions,
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn set_captions(&mut self, enabled: bool) {
        self.captions = enabled;
        if !enabled {
            self.caption = None;
        }
    }

    pub fn current(&self) -> Option<&Layer> {
        self.current.as_ref()
    }

    pub fn next(&self) -> Option<&Layer> {
        self.next.as_ref()
    }

    pub fn caption(&self) -> Option<&Caption> {
        self.caption.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition(&self) -> Option<Transition> {
        self.transition.map(|active| active.effect)
    }

    /// Layers back to front.
    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.current.iter().chain(self.next.iter()).collect();
        layers.sort_by_key(|layer| layer.z);
        layers
    }

    /// Replaces everything on screen with `layer`, shown at the start of its motion.
    pub fn show(&mut self, mut layer: Layer) {
        layer.pose = layer.pose_at(0.0);
        layer.opacity = 1.0;
        layer.z = 0;
        self.caption = self.captions.then(|| Caption {
            text: layer.file_name(),
            opacity: 1.0,
        });
        self.next = None;
        self.transition = None;
        self.current = Some(layer);
    }

    /// Starts blending from the current layer to `next`, freezing the current pose.
    ///
    /// Without a current layer the incoming image is simply shown.
    pub fn begin_transition(&mut self, mut next: Layer, effect: Transition) {
        let Some(current) = self.current.as_mut() else {
            self.show(next);
            return;
        };
        current.z = 0;
        let frozen = current.pose;
        next.pose = next.pose_at(0.0);
        next.opacity = 0.0;
        next.z = 1;
        debug!(effect = effect.kind().name(), next = %next.source.display(), "transition started");
        self.caption = self.captions.then(|| Caption {
            text: next.file_name(),
            opacity: 0.0,
        });
        self.next = Some(next);
        self.transition = Some(ActiveTransition { effect, frozen });
    }

    /// Moves the current layer along its Ken-Burns path. No-op during a transition.
    pub fn apply_ken_burns(&mut self, slide_t: f64) -> SlideshowResult<()> {
        if self.transition.is_some() {
            return Ok(());
        }
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        let pose = current.pose_at(slide_t);
        if !pose.is_finite() {
            return Err(SlideshowError::compositing(format!(
                "non-finite ken burns pose for {}",
                current.source.display()
            )));
        }
        current.pose = pose;
        current.opacity = 1.0;
        Ok(())
    }

    /// Places both layers for eased transition progress `effect_t`; the incoming layer also
    /// follows its own Ken-Burns path at `slide_t`.
    ///
    /// The frame is validated before anything is committed, so an error leaves the
    /// previous frame untouched.
    pub fn apply_transition(&mut self, slide_t: f64, effect_t: f64) -> SlideshowResult<()> {
        let (Some(active), Some(current), Some(next)) =
            (self.transition, self.current.as_mut(), self.next.as_mut())
        else {
            return Err(SlideshowError::compositing("no transition in flight"));
        };
        let frame = active.effect.frame(
            effect_t,
            active.frozen,
            current.size(),
            next.pose_at(slide_t),
            self.viewport,
        );
        if !frame.is_finite() {
            return Err(SlideshowError::compositing(format!(
                "non-finite {} frame at t={effect_t}",
                active.effect.kind().name()
            )));
        }
        current.pose = frame.current;
        current.opacity = frame.current_opacity.clamp(0.0, 1.0);
        next.pose = frame.next;
        next.opacity = frame.next_opacity.clamp(0.0, 1.0);
        next.z = frame.next_z;
        if let Some(caption) = self.caption.as_mut() {
            caption.opacity = frame.caption_opacity.clamp(0.0, 1.0);
        }
        Ok(())
    }

    /// Promotes `next` to `current` and drops the outgoing layer.
    pub fn settle(&mut self) {
        self.transition = None;
        if let Some(mut next) = self.next.take() {
            next.opacity = 1.0;
            next.z = 0;
            self.current = Some(next);
        }
        if let Some(caption) = self.caption.as_mut() {
            caption.opacity = 1.0;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.next = None;
        self.transition = None;
        self.caption = None;
    }
}
