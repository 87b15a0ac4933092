//! Image repair
//!
//! Rescales an image into the allowed physical size box while keeping its aspect ratio,
//! binarizes it, and re-encodes it as a bilevel TIFF at the target resolution. The
//! input buffer is never modified.

use super::inspect::{inspect, TiffInfo};
use super::tiff_writer::encode_bitonal;
use crate::config::ImageRequirements;
use crate::types::X9Error;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::{debug, info, instrument};

/// Reason reported when no scale fits both dimensions
pub const ASPECT_RATIO_REASON: &str = "not resized due to aspect ratio";

/// A successfully repaired image
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    /// Re-encoded TIFF bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
}

/// Scale factor that brings both physical dimensions into range, closest to 1
fn fitting_scale(width_in: f64, height_in: f64, req: &ImageRequirements) -> Option<f64> {
    let low = (req.min_width_inches / width_in).max(req.min_height_inches / height_in);
    let high = (req.max_width_inches / width_in).min(req.max_height_inches / height_in);
    (low <= high).then(|| 1.0f64.clamp(low, high))
}

fn unpack_bitonal(data: &[u8], width: u32, height: u32, white_is_zero: bool) -> GrayImage {
    let stride = (width as usize).div_ceil(8);
    GrayImage::from_fn(width, height, |x, y| {
        let byte = data
            .get(y as usize * stride + x as usize / 8)
            .copied()
            .unwrap_or(0);
        let set = byte & (0x80 >> (x % 8)) != 0;
        let black = set == white_is_zero;
        Luma([if black { 0 } else { 255 }])
    })
}

/// Decode any supported TIFF into 8-bit grayscale
fn decode_gray(bytes: &[u8], info: &TiffInfo) -> Result<GrayImage, X9Error> {
    let decoded = Decoder::new(Cursor::new(bytes)).and_then(|mut d| d.read_image());
    let (width, height) = (info.width, info.height);
    let white_is_zero = info.photometric == 0;

    let gray = match (decoded, info.bits_per_sample, info.samples_per_pixel) {
        (Ok(DecodingResult::U8(data)), 1, 1) => Some(unpack_bitonal(&data, width, height, white_is_zero)),
        (Ok(DecodingResult::U8(data)), 8, 1) => GrayImage::from_raw(width, height, data).map(|mut gray| {
            if white_is_zero {
                imageops::invert(&mut gray);
            }
            gray
        }),
        (Ok(DecodingResult::U8(data)), 8, 3) => RgbImage::from_raw(width, height, data)
            .map(|rgb| DynamicImage::ImageRgb8(rgb).to_luma8()),
        _ => None,
    };

    match gray {
        Some(gray) => Ok(gray),
        None => {
            debug!("Falling back to generic image decoding");
            Ok(image::load_from_memory(bytes)?.to_luma8())
        }
    }
}

/// Otsu threshold: the gray level that best separates dark and light pixels
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 128;
    }
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best = (0u8, 0.0f64);
    let mut background = 0u64;
    let mut background_sum = 0.0f64;
    for (level, &count) in histogram.iter().enumerate() {
        background += count;
        if background == 0 {
            continue;
        }
        let foreground = total - background;
        if foreground == 0 {
            break;
        }
        background_sum += level as f64 * count as f64;
        let mean_b = background_sum / background as f64;
        let mean_f = (weighted_total - background_sum) / foreground as f64;
        let variance = background as f64 * foreground as f64 * (mean_b - mean_f).powi(2);
        if variance > best.1 {
            best = (level as u8, variance);
        }
    }
    best.0.saturating_add(1)
}

/// Resize an image into the allowed size box and re-encode it as a bilevel TIFF
///
/// Images without a resolution are assumed to be at the target resolution.
///
/// # Errors
///
/// - `ImageDecode` when the input cannot be decoded
/// - `ImageNotRepairable` with reason "not resized due to aspect ratio" when no scale
///   fits both dimensions
#[instrument(skip(bytes, requirements), fields(len = bytes.len()))]
pub fn repair(
    bytes: &[u8],
    item_sequence: &str,
    requirements: &ImageRequirements,
) -> Result<RepairOutcome, X9Error> {
    let info = inspect(bytes)?;
    let target = f64::from(requirements.target_dpi);
    let width_in = f64::from(info.width) / info.x_dpi.unwrap_or(target);
    let height_in = f64::from(info.height) / info.y_dpi.unwrap_or(target);

    let scale = fitting_scale(width_in, height_in, requirements)
        .ok_or_else(|| X9Error::image_not_repairable(item_sequence, ASPECT_RATIO_REASON))?;

    let width = ((width_in * scale * target).round() as u32).max(1);
    let height = ((height_in * scale * target).round() as u32).max(1);

    let gray = decode_gray(bytes, &info)?;
    let resized = if (width, height) == gray.dimensions() {
        gray
    } else {
        imageops::resize(&gray, width, height, FilterType::Triangle)
    };

    let threshold = otsu_threshold(&resized);
    let bitonal = GrayImage::from_fn(width, height, |x, y| {
        Luma([if resized.get_pixel(x, y).0[0] < threshold { 0 } else { 255 }])
    });

    let data = encode_bitonal(&bitonal, requirements.target_dpi);
    info!(
        from_w = info.width,
        from_h = info.height,
        to_w = width,
        to_h = height,
        dpi = requirements.target_dpi,
        "Image repaired"
    );
    Ok(RepairOutcome {
        data,
        width,
        height,
        dpi: requirements.target_dpi,
    })
}
