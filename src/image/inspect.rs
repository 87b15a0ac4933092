//! TIFF inspection and requirement checks
//!
//! Reads the tags that decide whether an image is acceptable for exchange (dimensions,
//! resolution, bit depth, compression) without decoding the pixel data.

use crate::config::ImageRequirements;
use crate::types::X9Error;
use std::fmt;
use std::io::Cursor;
use tiff::decoder::{ifd::Value, Decoder};
use tiff::tags::Tag;
use tracing::{debug, instrument};

const RESOLUTION_UNIT_INCH: u32 = 2;
const RESOLUTION_UNIT_CENTIMETER: u32 = 3;

/// Properties of a TIFF image relevant to exchange
#[derive(Debug, Clone, PartialEq)]
pub struct TiffInfo {
    pub width: u32,
    pub height: u32,
    /// Horizontal resolution in dots per inch; `None` when absent or unitless
    pub x_dpi: Option<f64>,
    /// Vertical resolution in dots per inch; `None` when absent or unitless
    pub y_dpi: Option<f64>,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    /// TIFF compression tag (1 = none, 4 = CCITT Group 4)
    pub compression: u16,
    /// TIFF photometric interpretation tag (0 = white is zero, 1 = black is zero)
    pub photometric: u16,
}

impl TiffInfo {
    pub fn is_bitonal(&self) -> bool {
        self.bits_per_sample == 1 && self.samples_per_pixel == 1
    }

    /// Physical width in inches, when the resolution is known
    pub fn width_inches(&self) -> Option<f64> {
        self.x_dpi.map(|dpi| f64::from(self.width) / dpi)
    }

    /// Physical height in inches, when the resolution is known
    pub fn height_inches(&self) -> Option<f64> {
        self.y_dpi.map(|dpi| f64::from(self.height) / dpi)
    }
}

/// One way an image fails its requirements
#[derive(Debug, Clone, PartialEq)]
pub enum ImageDefect {
    WidthOutOfRange { inches: f64 },
    HeightOutOfRange { inches: f64 },
    NotBitonal { bits_per_sample: u16, samples_per_pixel: u16 },
    UnsupportedCompression(u16),
    MissingResolution,
    UnsupportedResolution(u32),
}

impl fmt::Display for ImageDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageDefect::WidthOutOfRange { inches } => {
                write!(f, "width {:.2} inches out of range", inches)
            }
            ImageDefect::HeightOutOfRange { inches } => {
                write!(f, "height {:.2} inches out of range", inches)
            }
            ImageDefect::NotBitonal {
                bits_per_sample,
                samples_per_pixel,
            } => write!(
                f,
                "not bitonal ({} bits x {} samples)",
                bits_per_sample, samples_per_pixel
            ),
            ImageDefect::UnsupportedCompression(code) => {
                write!(f, "unsupported compression {}", code)
            }
            ImageDefect::MissingResolution => f.write_str("resolution missing"),
            ImageDefect::UnsupportedResolution(dpi) => {
                write!(f, "unsupported resolution {} dpi", dpi)
            }
        }
    }
}

fn value_as_u32(value: Value) -> Option<u32> {
    match value {
        Value::Byte(v) => Some(u32::from(v)),
        Value::Short(v) => Some(u32::from(v)),
        Value::Unsigned(v) => Some(v),
        Value::UnsignedBig(v) => u32::try_from(v).ok(),
        Value::List(values) => values.into_iter().next().and_then(value_as_u32),
        _ => None,
    }
}

fn value_as_f64(value: Value) -> Option<f64> {
    match value {
        Value::Rational(n, d) if d != 0 => Some(f64::from(n) / f64::from(d)),
        Value::RationalBig(n, d) if d != 0 => Some(n as f64 / d as f64),
        Value::Float(v) => Some(f64::from(v)),
        Value::Double(v) => Some(v),
        other => value_as_u32(other).map(f64::from),
    }
}

/// Read the exchange-relevant properties of a TIFF
///
/// # Errors
///
/// Returns `ImageDecode` when the bytes are not a readable TIFF.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn inspect(bytes: &[u8]) -> Result<TiffInfo, X9Error> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?;
    let (width, height) = decoder.dimensions()?;

    let mut tag_u32 = |tag: Tag, default: u32| -> Result<u32, X9Error> {
        Ok(decoder
            .find_tag(tag)?
            .and_then(value_as_u32)
            .unwrap_or(default))
    };
    let bits_per_sample = tag_u32(Tag::BitsPerSample, 1)?;
    let samples_per_pixel = tag_u32(Tag::SamplesPerPixel, 1)?;
    let compression = tag_u32(Tag::Compression, 1)?;
    let photometric = tag_u32(Tag::PhotometricInterpretation, 0)?;
    let unit = tag_u32(Tag::ResolutionUnit, RESOLUTION_UNIT_INCH)?;

    let scale = match unit {
        RESOLUTION_UNIT_INCH => Some(1.0),
        RESOLUTION_UNIT_CENTIMETER => Some(2.54),
        _ => None,
    };
    let mut dpi = |tag: Tag| -> Result<Option<f64>, X9Error> {
        let value = decoder.find_tag(tag)?.and_then(value_as_f64);
        Ok(value
            .zip(scale)
            .map(|(v, s)| v * s)
            .filter(|v| *v > 0.0))
    };
    let x_dpi = dpi(Tag::XResolution)?;
    let y_dpi = dpi(Tag::YResolution)?;

    let info = TiffInfo {
        width,
        height,
        x_dpi,
        y_dpi,
        bits_per_sample: u16::try_from(bits_per_sample).unwrap_or(u16::MAX),
        samples_per_pixel: u16::try_from(samples_per_pixel).unwrap_or(u16::MAX),
        compression: u16::try_from(compression).unwrap_or(u16::MAX),
        photometric: u16::try_from(photometric).unwrap_or(u16::MAX),
    };
    debug!(?info, "Image inspected");
    Ok(info)
}

fn within(value: f64, min: f64, max: f64) -> bool {
    // Tolerate rounding of whole-pixel dimensions.
    const EPSILON: f64 = 1e-6;
    value >= min - EPSILON && value <= max + EPSILON
}

/// List every way an image fails its requirements; empty when it conforms
pub fn validate(info: &TiffInfo, requirements: &ImageRequirements) -> Vec<ImageDefect> {
    let mut defects = Vec::new();

    match (info.x_dpi, info.y_dpi) {
        (Some(x_dpi), Some(y_dpi)) => {
            for dpi in [x_dpi, y_dpi] {
                let rounded = dpi.round() as u32;
                if !requirements.allowed_dpi.contains(&rounded) {
                    defects.push(ImageDefect::UnsupportedResolution(rounded));
                    break;
                }
            }
        }
        _ => defects.push(ImageDefect::MissingResolution),
    }

    if let Some(inches) = info.width_inches() {
        if !within(inches, requirements.min_width_inches, requirements.max_width_inches) {
            defects.push(ImageDefect::WidthOutOfRange { inches });
        }
    }
    if let Some(inches) = info.height_inches() {
        if !within(inches, requirements.min_height_inches, requirements.max_height_inches) {
            defects.push(ImageDefect::HeightOutOfRange { inches });
        }
    }

    if requirements.require_bitonal && !info.is_bitonal() {
        defects.push(ImageDefect::NotBitonal {
            bits_per_sample: info.bits_per_sample,
            samples_per_pixel: info.samples_per_pixel,
        });
    }
    if !requirements.allowed_compressions.contains(&info.compression) {
        defects.push(ImageDefect::UnsupportedCompression(info.compression));
    }

    defects
}
