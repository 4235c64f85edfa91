// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image normaliser: decode, grayscale, border trimming and upscaling to a
// minimum working height. Produces the canonical single-channel bitmap every
// enhancement variant starts from.

use std::path::PathBuf;

use chitravachaka_core::error::ChitraError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use imageproc::contrast::otsu_level;
use tracing::{debug, info, instrument};

/// Padding kept around the detected content box, in pixels.
pub const BORDER_PAD: u32 = 4;

/// Default minimum working height. Roughly a 300 DPI page fragment.
pub const DEFAULT_MIN_HEIGHT: u32 = 1200;

/// The forms an input image can arrive in.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded bytes (JPEG, PNG, TIFF, ...).
    Bytes(Vec<u8>),
    /// An already-decoded image in any colour layout.
    Decoded(DynamicImage),
    /// A single-channel bitmap.
    Gray(GrayImage),
}

impl ImageInput {
    /// Decode into a `DynamicImage`.
    ///
    /// # Errors
    ///
    /// Returns [`ChitraError::Decode`] for unreadable or corrupt input.
    pub fn decode(self) -> Result<DynamicImage, ChitraError> {
        match self {
            Self::Path(path) => image::open(&path).map_err(|err| {
                ChitraError::Decode(format!("failed to open {}: {}", path.display(), err))
            }),
            Self::Bytes(data) => image::load_from_memory(&data)
                .map_err(|err| ChitraError::Decode(format!("failed to decode image: {}", err))),
            Self::Decoded(image) => Ok(image),
            Self::Gray(gray) => Ok(DynamicImage::ImageLuma8(gray)),
        }
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        Self::Decoded(image)
    }
}

impl From<GrayImage> for ImageInput {
    fn from(gray: GrayImage) -> Self {
        Self::Gray(gray)
    }
}

/// Turns any input image into the canonical grayscale working bitmap.
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    min_height: u32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_HEIGHT)
    }
}

impl ImageNormalizer {
    pub fn new(min_height: u32) -> Self {
        Self {
            min_height: min_height.max(1),
        }
    }

    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    /// Decode, convert to grayscale, trim borders, then upscale.
    #[instrument(skip_all, fields(min_height = self.min_height))]
    pub fn normalize(&self, input: ImageInput) -> Result<GrayImage, ChitraError> {
        let decoded = input.decode()?;
        info!(
            width = decoded.width(),
            height = decoded.height(),
            "Image loaded"
        );

        let gray = to_grayscale(decoded);
        let trimmed = remove_borders(&gray);
        let normalized = upscale_to_min_height(&trimmed, self.min_height);

        debug!(
            width = normalized.width(),
            height = normalized.height(),
            "Normalization complete"
        );
        Ok(normalized)
    }
}

/// Luma conversion; single-channel input passes through untouched.
pub fn to_grayscale(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        other => other.to_luma8(),
    }
}

/// Crop to the bounding box of the ink, plus [`BORDER_PAD`] on each side.
///
/// Ink is every pixel at or below the Otsu level. When the page has no ink
/// the image is returned as-is.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn remove_borders(gray: &GrayImage) -> GrayImage {
    let Some((x0, y0, x1, y1)) = content_bounds(gray) else {
        debug!("No content found; skipping border removal");
        return gray.clone();
    };

    let (width, height) = gray.dimensions();
    let left = x0.saturating_sub(BORDER_PAD);
    let top = y0.saturating_sub(BORDER_PAD);
    let right = (x1 + 1 + BORDER_PAD).min(width);
    let bottom = (y1 + 1 + BORDER_PAD).min(height);

    debug!(left, top, right, bottom, "Cropping to content");
    imageops::crop_imm(gray, left, top, right - left, bottom - top).to_image()
}

/// Inclusive `(min_x, min_y, max_x, max_y)` of the ink pixels. `None` for a
/// uniform image.
pub fn content_bounds(gray: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    if gray.width() == 0 || gray.height() == 0 {
        return None;
    }
    // A flat page has nothing to separate from its background.
    let first = gray.get_pixel(0, 0).0[0];
    if gray.pixels().all(|p| p.0[0] == first) {
        return None;
    }
    let level = otsu_level(gray);

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] > level {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    bounds
}

/// Scale proportionally so the height is exactly `min_height`.
///
/// Uses cubic interpolation. Images already tall enough are returned as-is.
pub fn upscale_to_min_height(gray: &GrayImage, min_height: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if height >= min_height || height == 0 {
        return gray.clone();
    }

    let scale = min_height as f64 / height as f64;
    let new_width = ((width as f64 * scale) as u32).max(1);
    info!(
        from_w = width,
        from_h = height,
        to_w = new_width,
        to_h = min_height,
        "Upscaling for recognition"
    );
    imageops::resize(gray, new_width, min_height, FilterType::CatmullRom)
}
