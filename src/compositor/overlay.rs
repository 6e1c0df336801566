use kurbo::{Point, Size};

use crate::config::{HorizontalAnchor, Profile, VerticalAnchor};
use crate::constants::CAPTION_PADDING;

/// How the filename caption is placed and drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionStyle {
    pub vertical: VerticalAnchor,
    pub horizontal: HorizontalAnchor,
    pub v_offset: i32,
    pub h_offset: i32,
    pub font_family: String,
    pub font_size: u32,
    pub font_bold: bool,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self::from_profile(&Profile::default())
    }
}

impl CaptionStyle {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            vertical: profile.filename_v_pos,
            horizontal: profile.filename_h_pos,
            v_offset: profile.filename_v_offset,
            h_offset: profile.filename_h_offset,
            font_family: profile.font_family.clone(),
            font_size: profile.font_size,
            font_bold: profile.font_bold,
        }
    }

    /// Top-left corner of a caption box of `text` size, in viewport coordinates.
    pub fn position(&self, text: Size, viewport: Size) -> Point {
        let y = match self.vertical {
            VerticalAnchor::Top => CAPTION_PADDING,
            VerticalAnchor::Middle => (viewport.height - text.height) / 2.0,
            VerticalAnchor::Bottom => viewport.height - text.height - CAPTION_PADDING,
        };
        let x = match self.horizontal {
            HorizontalAnchor::Left => CAPTION_PADDING,
            HorizontalAnchor::Center => (viewport.width - text.width) / 2.0,
            HorizontalAnchor::Right => viewport.width - text.width - CAPTION_PADDING,
        };
        Point::new(x + f64::from(self.h_offset), y + f64::from(self.v_offset))
    }
}

/// The filename currently shown and its opacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub opacity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(1000.0, 500.0);
    const TEXT: Size = Size::new(200.0, 30.0);

    #[test]
    fn default_is_bottom_center() {
        let style = CaptionStyle::default();
        assert_eq!(style.position(TEXT, VIEWPORT), Point::new(400.0, 450.0));
    }

    #[test]
    fn corners_respect_padding_and_offsets() {
        let mut style = CaptionStyle {
            vertical: VerticalAnchor::Top,
            horizontal: HorizontalAnchor::Left,
            ..CaptionStyle::default()
        };
        assert_eq!(style.position(TEXT, VIEWPORT), Point::new(20.0, 20.0));

        style.vertical = VerticalAnchor::Bottom;
        style.horizontal = HorizontalAnchor::Right;
        style.h_offset = -5;
        style.v_offset = 7;
        assert_eq!(style.position(TEXT, VIEWPORT), Point::new(775.0, 457.0));
    }
}
