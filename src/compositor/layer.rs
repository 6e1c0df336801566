use kurbo::{Point, Rect, Size, Vec2};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::ScaledImage;
use crate::kenburns::AnimationState;

/// Placement of a layer in scene coordinates, whose origin is the viewport center.
///
/// `position` is the top-left of the unscaled bitmap; `scale` applies about the bitmap center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point,
    pub scale: f64,
}

impl Pose {
    /// Pose for a bitmap of `size` displaced by `offset` from the centered placement.
    pub fn centered(size: Size, offset: Vec2, scale: f64) -> Self {
        Self {
            position: Point::new(-size.width / 2.0 + offset.x, -size.height / 2.0 + offset.y),
            scale,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.scale.is_finite()
    }

    /// On-screen rectangle in viewport coordinates (origin top-left).
    pub fn visual_rect(&self, size: Size, viewport: Size) -> Rect {
        let center = Point::new(
            self.position.x + size.width / 2.0 + viewport.width / 2.0,
            self.position.y + size.height / 2.0 + viewport.height / 2.0,
        );
        Rect::from_center_size(center, size * self.scale)
    }
}

/// One image's visual presentation: bitmap, transform, opacity and stacking order.
#[derive(Debug, Clone)]
pub struct Layer {
    pub source: PathBuf,
    pub image: Arc<ScaledImage>,
    pub pose: Pose,
    pub opacity: f64,
    pub z: i32,
    pub motion: AnimationState,
}

impl Layer {
    pub fn new(
        source: impl Into<PathBuf>,
        image: Arc<ScaledImage>,
        motion: AnimationState,
    ) -> Self {
        let mut layer = Self {
            source: source.into(),
            image,
            pose: Pose::centered(Size::ZERO, Vec2::ZERO, 1.0),
            opacity: 1.0,
            z: 0,
            motion,
        };
        layer.pose = layer.pose_at(0.0);
        layer
    }

    pub fn size(&self) -> Size {
        self.image.size()
    }

    pub fn path(&self) -> &Path {
        &self.source
    }

    /// Ken-Burns pose at eased slide progress `t`.
    pub fn pose_at(&self, t: f64) -> Pose {
        Pose::centered(self.size(), self.motion.offset_at(t), self.motion.scale_at(t))
    }

    pub fn visual_rect(&self, viewport: Size) -> Rect {
        self.pose.visual_rect(self.size(), viewport)
    }

    /// File name shown in the caption overlay.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}
