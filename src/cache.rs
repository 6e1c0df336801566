use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{Size, Vec2};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::FitMode;
use crate::constants::CACHE_CAPACITY;
use crate::decoder::Bitmap;
use crate::kenburns::base_scale;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub image: PathBuf,
    pub viewport: (u32, u32),
    pub for_animation: bool,
    pub ken_burns: bool,
    pub fit: FitMode,
}

/// A bitmap resized to the viewport under a fit mode.
///
/// `offset` is the top-left placement that centers the bitmap in the viewport for static
/// display. Animated layers are positioned by their motion instead and carry a zero offset.
#[derive(Debug, Clone)]
pub struct ScaledImage {
    pub image: RgbaImage,
    pub offset: Vec2,
}

impl ScaledImage {
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.image.width()), f64::from(self.image.height()))
    }

    /// Displacement from the centered placement that puts the top-left corner on `offset`,
    /// i.e. on whole viewport pixels.
    pub fn snap_offset(&self, viewport: Size) -> Vec2 {
        self.offset + self.size().to_vec2() / 2.0 - viewport.to_vec2() / 2.0
    }
}

/// Scales `bitmap` so it covers or fits the viewport.
///
/// When the target would collapse below one pixel the original bitmap is kept as is.
pub fn scale_for_viewport(
    bitmap: &Bitmap,
    viewport: (u32, u32),
    fit: FitMode,
    for_animation: bool,
    ken_burns: bool,
) -> ScaledImage {
    let vw = viewport.0.max(1);
    let vh = viewport.1.max(1);
    let scale = base_scale(
        bitmap.size(),
        Size::new(f64::from(vw), f64::from(vh)),
        fit,
    );
    let new_w = (f64::from(bitmap.width()) * scale) as i64;
    let new_h = (f64::from(bitmap.height()) * scale) as i64;

    if new_w < 1 || new_h < 1 {
        warn!(
            path = %bitmap.source.display(),
            width = new_w,
            height = new_h,
            "scaled size is invalid, keeping original"
        );
        return ScaledImage {
            image: bitmap.image.clone(),
            offset: Vec2::ZERO,
        };
    }

    let image = if new_w as u32 == bitmap.width() && new_h as u32 == bitmap.height() {
        bitmap.image.clone()
    } else {
        imageops::resize(&bitmap.image, new_w as u32, new_h as u32, FilterType::Triangle)
    };
    let offset = if ken_burns && for_animation {
        Vec2::ZERO
    } else {
        Vec2::new(
            (i64::from(vw) - new_w).div_euclid(2) as f64,
            (i64::from(vh) - new_h).div_euclid(2) as f64,
        )
    };
    ScaledImage { image, offset }
}

/// Bounded memo of scaled bitmaps, evicting the oldest insertion first.
#[derive(Debug)]
pub struct ScaledImageCache {
    capacity: usize,
    entries: VecDeque<(CacheKey, Arc<ScaledImage>)>,
}

impl Default for ScaledImageCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY)
    }
}

impl ScaledImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<ScaledImage>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Arc::clone(v))
    }

    pub fn insert(&mut self, key: CacheKey, value: Arc<ScaledImage>) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.pop_front() {
                debug!(path = %evicted.image.display(), "evicting scaled image");
            }
        }
        self.entries.push_back((key, value));
    }

    /// Returns the cached entry for `key` or scales `bitmap` and stores it.
    pub fn get_or_scale(&mut self, key: CacheKey, bitmap: &Bitmap) -> Arc<ScaledImage> {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let scaled = Arc::new(scale_for_viewport(
            bitmap,
            key.viewport,
            key.fit,
            key.for_animation,
            key.ken_burns,
        ));
        self.insert(key, Arc::clone(&scaled));
        scaled
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
