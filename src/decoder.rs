use exif::{In, Reader, Tag, Value};
use image::{DynamicImage, ImageFormat, RgbaImage};
use kurbo::Size;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{SlideshowError, SlideshowResult};

/// A decoded, orientation-corrected image.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub source: PathBuf,
    pub image: RgbaImage,
}

impl Bitmap {
    pub fn new(source: impl Into<PathBuf>, image: RgbaImage) -> Self {
        Self {
            source: source.into(),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Turns a path into a bitmap. Failures must be reported, never a partial image.
pub trait Decoder {
    fn decode(&mut self, path: &Path) -> SlideshowResult<Bitmap>;
}

/// File decoder backed by the `image` crate with EXIF orientation applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    fn decode(&mut self, path: &Path) -> SlideshowResult<Bitmap> {
        let bytes = fs::read(path).map_err(|e| SlideshowError::decode(path, e.to_string()))?;
        let image = decode_bytes(path, &bytes)?;
        let image = apply_orientation(image, read_orientation(path, &bytes));
        let bitmap = Bitmap::new(path, image.into_rgba8());
        if bitmap.is_empty() {
            return Err(SlideshowError::decode(path, "decoded image is empty"));
        }
        Ok(bitmap)
    }
}

/// Tries the format implied by the extension first, then content sniffing.
fn decode_bytes(path: &Path, bytes: &[u8]) -> SlideshowResult<DynamicImage> {
    if let Ok(format) = ImageFormat::from_path(path) {
        match image::load_from_memory_with_format(bytes, format) {
            Ok(image) => return Ok(image),
            Err(e) => debug!(
                path = %path.display(),
                error = %e,
                "extension format rejected, sniffing"
            ),
        }
    }
    image::load_from_memory(bytes).map_err(|e| SlideshowError::decode(path, e.to_string()))
}

fn read_orientation(path: &Path, bytes: &[u8]) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| match &field.value {
                Value::Short(values) => values.first().copied(),
                _ => None,
            })
            .unwrap_or(1),
        Err(exif::Error::NotFound(_)) => 1,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read EXIF data");
            1
        }
    }
}

/// Maps an EXIF orientation tag (1..=8) onto the upright image.
pub fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}
