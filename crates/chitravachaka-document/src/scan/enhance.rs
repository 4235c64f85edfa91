// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement variants: four independent preprocessing recipes applied to the
// same normalised page, each giving the recognition engine a differently
// cleaned-up view of the text.

use image::{GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::filter::{median_filter, separable_filter_equal};
use imageproc::morphology::{close, open};
use tracing::{debug, info, instrument};

/// Unsharp mask strength.
const UNSHARP_AMOUNT: f32 = 1.2;
/// CLAHE clip limit, relative to a uniform histogram.
const CLAHE_CLIP_LIMIT: f32 = 3.0;
/// CLAHE tiles per axis.
const CLAHE_TILES: u32 = 8;
/// Bilateral neighbourhood diameter.
const BILATERAL_DIAMETER: u32 = 9;
const BILATERAL_SIGMA_COLOR: f32 = 75.0;
const BILATERAL_SIGMA_SPACE: f32 = 75.0;
/// Subtracted from the local weighted mean before thresholding.
const ADAPTIVE_C: i32 = 2;
const GAMMA: f32 = 0.85;

/// One preprocessed copy of the page.
#[derive(Debug, Clone)]
pub struct Variant {
    /// Recipe name, for diagnostics only.
    pub label: &'static str,
    pub image: GrayImage,
}

/// Builds the enhancement variants for a normalised page.
///
/// Every recipe reads the same source bitmap; no variant depends on another.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanEnhancer;

impl ScanEnhancer {
    pub fn new() -> Self {
        Self
    }

    /// Produce the four variants, in sweep order.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn variants(&self, gray: &GrayImage) -> Vec<Variant> {
        info!("Generating enhancement variants");
        let variants = vec![
            Variant {
                label: "hist_unsharp",
                image: hist_unsharp(gray),
            },
            Variant {
                label: "clahe_median",
                image: clahe_median(gray),
            },
            Variant {
                label: "bilateral_adapt_morph",
                image: bilateral_adapt_morph(gray),
            },
            Variant {
                label: "gamma_hist",
                image: gamma_hist(gray),
            },
        ];
        debug!(count = variants.len(), "Variants ready");
        variants
    }
}

// -- Recipes ------------------------------------------------------------------

/// Global histogram equalisation followed by a 3x3 unsharp mask.
pub fn hist_unsharp(gray: &GrayImage) -> GrayImage {
    let equalized = equalize_histogram(gray);
    unsharp_mask(&equalized, UNSHARP_AMOUNT)
}

/// Contrast-limited adaptive equalisation followed by a 3x3 median.
pub fn clahe_median(gray: &GrayImage) -> GrayImage {
    let equalized = clahe(gray, CLAHE_CLIP_LIMIT, CLAHE_TILES, CLAHE_TILES);
    median_filter(&equalized, 1, 1)
}

/// Edge-preserving smoothing, local Gaussian binarisation, then a close/open
/// pass to knock out speckle and fill pinholes.
pub fn bilateral_adapt_morph(gray: &GrayImage) -> GrayImage {
    let smoothed = bilateral_filter(
        gray,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    let smoothed = median_filter(&smoothed, 1, 1);

    let block = adaptive_block_size(gray.width(), gray.height());
    debug!(block, "Adaptive threshold block size");
    let binary = adaptive_threshold_gaussian(&smoothed, block, ADAPTIVE_C);

    let closed = close(&binary, Norm::LInf, 1);
    open(&closed, Norm::LInf, 1)
}

/// Gamma correction followed by global histogram equalisation.
pub fn gamma_hist(gray: &GrayImage) -> GrayImage {
    let corrected = apply_lut(gray, &gamma_lut(GAMMA));
    equalize_histogram(&corrected)
}

// -- Filters ------------------------------------------------------------------

/// `src * (1 + amount) - blur * amount`, with a 3x3 Gaussian blur.
pub fn unsharp_mask(gray: &GrayImage, amount: f32) -> GrayImage {
    let blurred = reflect_101_blur(gray, &gaussian_kernel(3));
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let src = gray.get_pixel(x, y).0[0] as f32;
        let blur = blurred.get_pixel(x, y).0[0] as f32;
        let value = src * (1.0 + amount) - blur * amount;
        *pixel = Luma([saturate(value)]);
    }
    out
}

/// Block size for adaptive thresholding: 1/16 of the short side, forced odd,
/// never below 11.
pub fn adaptive_block_size(width: u32, height: u32) -> u32 {
    (width.min(height) / 16 | 1).max(11)
}

/// Binarise against a Gaussian-weighted local mean.
///
/// A pixel becomes white when it is brighter than `mean - c`.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, c: i32) -> GrayImage {
    let mean = separable_filter_equal(gray, &gaussian_kernel(block_size as usize));
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let src = gray.get_pixel(x, y).0[0] as i32;
        let local = mean.get_pixel(x, y).0[0] as i32;
        *pixel = Luma([if src - local > -c { 255 } else { 0 }]);
    }
    out
}

/// Lookup table for `255 * (i / 255) ^ (1 / gamma)`, truncated.
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let inv = 1.0 / gamma as f64;
    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = ((i as f64 / 255.0).powf(inv) * 255.0) as u8;
    }
    table
}

fn apply_lut(gray: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}

/// Bilateral filter over a circular neighbourhood of the given diameter.
pub fn bilateral_filter(
    gray: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = (diameter / 2) as i64;

    let color_coeff = -0.5 / (sigma_color as f64 * sigma_color as f64);
    let space_coeff = -0.5 / (sigma_space as f64 * sigma_space as f64);

    let mut color_weight = [0f64; 256];
    for (diff, weight) in color_weight.iter_mut().enumerate() {
        *weight = ((diff * diff) as f64 * color_coeff).exp();
    }

    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let dist_sq = (dx * dx + dy * dy) as f64;
            if dist_sq.sqrt() > radius as f64 {
                continue;
            }
            offsets.push((dx, dy, (dist_sq * space_coeff).exp()));
        }
    }

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let center = gray.get_pixel(x, y).0[0];
        let mut sum = 0f64;
        let mut norm = 0f64;
        for &(dx, dy, space_w) in &offsets {
            let sx = reflect_101(x as i64 + dx, width as i64);
            let sy = reflect_101(y as i64 + dy, height as i64);
            let value = gray.get_pixel(sx, sy).0[0];
            let weight = space_w * color_weight[value.abs_diff(center) as usize];
            sum += value as f64 * weight;
            norm += weight;
        }
        *pixel = Luma([saturate((sum / norm) as f32)]);
    }
    out
}

/// Contrast-limited adaptive histogram equalisation.
///
/// The page is split into `tiles_x * tiles_y` tiles (padded by reflection when
/// the dimensions do not divide evenly). Each tile gets a clipped, equalised
/// lookup table, and every pixel blends the tables of its four nearest tile
/// centres.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles_x: u32, tiles_y: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tile_w = width.div_ceil(tiles_x);
    let tile_h = height.div_ceil(tiles_y);
    let tile_area = (tile_w * tile_h) as f32;
    let clip = ((clip_limit * tile_area / 256.0) as u32).max(1);
    let lut_scale = 255.0 / tile_area;

    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let mut hist = [0u32; 256];
            for y in ty * tile_h..(ty + 1) * tile_h {
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let sx = reflect_101(x as i64, width as i64);
                    let sy = reflect_101(y as i64, height as i64);
                    hist[gray.get_pixel(sx, sy).0[0] as usize] += 1;
                }
            }
            clip_histogram(&mut hist, clip);

            let lut = &mut luts[(ty * tiles_x + tx) as usize];
            let mut cumulative = 0u32;
            for (value, &count) in hist.iter().enumerate() {
                cumulative += count;
                lut[value] = saturate(cumulative as f32 * lut_scale);
            }
        }
    }

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;
    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (tx1, tx2, xa) = tile_neighbours(x as f32 * inv_tw - 0.5, tiles_x);
        let (ty1, ty2, ya) = tile_neighbours(y as f32 * inv_th - 0.5, tiles_y);
        let v = gray.get_pixel(x, y).0[0] as usize;
        let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v] as f32;

        let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
        let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
        *pixel = Luma([saturate(top * (1.0 - ya) + bottom * ya)]);
    }
    out
}

/// Clip every bin at `limit` and spread the excess evenly, with the
/// remainder handed out at a regular stride.
fn clip_histogram(hist: &mut [u32; 256], limit: u32) {
    let mut clipped = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            clipped += *count - limit;
            *count = limit;
        }
    }

    let batch = clipped / 256;
    let mut residual = clipped - batch * 256;
    for count in hist.iter_mut() {
        *count += batch;
    }

    if residual > 0 {
        let step = (256 / residual as usize).max(1);
        let mut i = 0;
        while i < 256 && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// The two tiles bracketing a fractional tile coordinate, and the weight of
/// the second.
fn tile_neighbours(position: f32, tiles: u32) -> (u32, u32, f32) {
    let lower = position.floor();
    let weight = position - lower;
    let first = (lower as i64).max(0) as u32;
    let second = ((lower as i64 + 1).min(tiles as i64 - 1)).max(0) as u32;
    (first.min(tiles - 1), second, weight)
}

// -- Convolution helpers ------------------------------------------------------

fn reflect_101(mut i: i64, len: i64) -> u32 {
    if len == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as u32;
        }
    }
}

/// Normalised 1-D Gaussian kernel of odd `size`.
///
/// Size 3 uses the binomial `[1, 2, 1] / 4`; larger sizes derive sigma from
/// the size as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    if size == 3 {
        return vec![0.25, 0.5, 0.25];
    }
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f64 - 1.0) / 2.0;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.iter().map(|w| (w / total) as f32).collect()
}

/// Horizontal then vertical pass of a symmetric kernel, rounded to u8.
///
/// Edges mirror without repeating the border pixel (`dcb|abcd|cba`), the
/// border OpenCV blurs with. The imageproc filters only pad by continuity.
fn reflect_101_blur(gray: &GrayImage, kernel: &[f32]) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as i64, height as i64);
    let half = (kernel.len() / 2) as i64;

    let mut horizontal = vec![0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x + k as i64 - half, w);
                acc += weight * gray.get_pixel(sx, y).0[0] as f32;
            }
            horizontal[(y * width) as usize + x as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..width {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y + k as i64 - half, h);
                acc += weight * horizontal[(sy * width + x) as usize];
            }
            out.put_pixel(x, y as u32, Luma([saturate(acc)]));
        }
    }
    out
}

fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_like_page(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if (x / 7 + y / 11) % 3 == 0 {
                Luma([30u8])
            } else {
                Luma([((x * 3 + y) % 60 + 180) as u8])
            }
        })
    }

    #[test]
    fn four_variants_with_input_dimensions() {
        let page = text_like_page(97, 64);
        let variants = ScanEnhancer::new().variants(&page);
        assert_eq!(variants.len(), 4);
        for variant in &variants {
            assert_eq!(variant.image.dimensions(), (97, 64), "{}", variant.label);
        }
        let labels: Vec<_> = variants.iter().map(|v| v.label).collect();
        assert_eq!(
            labels,
            ["hist_unsharp", "clahe_median", "bilateral_adapt_morph", "gamma_hist"]
        );
    }

    #[test]
    fn variants_are_deterministic() {
        let page = text_like_page(40, 30);
        let a = ScanEnhancer::new().variants(&page);
        let b = ScanEnhancer::new().variants(&page);
        for (left, right) in a.iter().zip(&b) {
            assert_eq!(left.image, right.image);
        }
    }

    #[test]
    fn binarized_variant_is_two_level() {
        let page = text_like_page(64, 64);
        let binary = bilateral_adapt_morph(&page);
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn block_size_floor_and_parity() {
        assert_eq!(adaptive_block_size(100, 100), 11);
        assert_eq!(adaptive_block_size(1600, 1200), 75);
        assert_eq!(adaptive_block_size(1200, 1280), 75);
        assert_eq!(adaptive_block_size(2000, 3000), 125);
    }

    #[test]
    fn gamma_table_darkens_midtones() {
        let lut = gamma_lut(0.85);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        assert!(lut[128] < 128, "gamma < 1 darkens midtones: {}", lut[128]);
    }

    #[test]
    fn unsharp_on_flat_image_is_identity() {
        let flat = GrayImage::from_pixel(10, 10, Luma([90u8]));
        assert_eq!(unsharp_mask(&flat, 1.2), flat);
    }

    #[test]
    fn unsharp_increases_edge_contrast() {
        let edge = GrayImage::from_fn(10, 4, |x, _| Luma([if x < 5 { 100 } else { 150 }]));
        let sharp = unsharp_mask(&edge, 1.2);
        assert!(sharp.get_pixel(4, 1).0[0] < 100);
        assert!(sharp.get_pixel(5, 1).0[0] > 150);
    }

    #[test]
    fn clahe_keeps_flat_image_flat() {
        let flat = GrayImage::from_pixel(32, 32, Luma([77u8]));
        let out = clahe(&flat, 3.0, 8, 8);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn clahe_handles_uneven_tiles() {
        let page = text_like_page(37, 13);
        let out = clahe(&page, 3.0, 8, 8);
        assert_eq!(out.dimensions(), (37, 13));
    }

    #[test]
    fn clip_histogram_preserves_mass() {
        let mut hist = [0u32; 256];
        hist[10] = 1000;
        hist[200] = 24;
        clip_histogram(&mut hist, 40);
        assert_eq!(hist.iter().sum::<u32>(), 1024);
        assert!(hist[10] <= 40 + 4);
    }

    #[test]
    fn bilateral_on_flat_image_is_identity() {
        let flat = GrayImage::from_pixel(12, 12, Luma([200u8]));
        assert_eq!(bilateral_filter(&flat, 9, 75.0, 75.0), flat);
    }

    #[test]
    fn kernels_are_normalized() {
        for size in [3usize, 11, 75] {
            let sum: f32 = gaussian_kernel(size).iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "size {size}: {sum}");
        }
    }

    #[test]
    fn adaptive_threshold_marks_dark_ink() {
        let mut page = GrayImage::from_pixel(40, 40, Luma([220u8]));
        for y in 19..22 {
            for x in 19..22 {
                page.put_pixel(x, y, Luma([10u8]));
            }
        }
        let binary = adaptive_threshold_gaussian(&page, 11, ADAPTIVE_C);
        assert_eq!(binary.get_pixel(20, 20).0[0], 0);
        assert_eq!(binary.get_pixel(0, 0).0[0], 255);
        assert_eq!(binary.get_pixel(39, 5).0[0], 255);
    }

    #[test]
    fn reflect_101_mirrors_without_edge_repeat() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(0, 1), 0);
    }
}
