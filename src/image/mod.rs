//! Image attachment layer
//!
//! Checks every image before it is attached to an item:
//!
//! 1. The declared size must equal the payload length (`ImageSizeMismatch`)
//! 2. When image requirements are configured, the TIFF must satisfy them
//! 3. With `repair_images` on, size fields are corrected and non-conforming images are
//!    rescaled and re-encoded; an image that cannot be repaired is written through
//!
//! None of these conditions abort the file. They are recorded as diagnostics.
//!
//! # Components
//!
//! - `inspect` - TIFF tag inspection and requirement checks
//! - `repair` - aspect-preserving rescale and bilevel re-encoding
//! - `tiff_writer` - uncompressed 1-bit TIFF encoder

pub mod inspect;
pub mod repair;
pub mod tiff_writer;

pub use inspect::{inspect, validate, ImageDefect, TiffInfo};
pub use repair::{repair, RepairOutcome, ASPECT_RATIO_REASON};
pub use tiff_writer::encode_bitonal;

use crate::config::WriterConfig;
use crate::types::{Diagnostics, ItemImage, Resolution, X9Error};
use tracing::debug;

/// Image bytes and size field as they will be written
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub declared_size: usize,
}

/// Apply the size check and the configured requirements to one image
///
/// # Arguments
///
/// * `image` - The caller's image; never modified
/// * `item_sequence` - Sequence number of the owning item, for diagnostics
/// * `config` - Decides whether requirements are checked and repairs attempted
/// * `diagnostics` - Receives every recoverable condition found
///
/// # Returns
///
/// The payload and declared size to write
pub fn prepare(
    image: &ItemImage,
    item_sequence: &str,
    config: &WriterConfig,
    diagnostics: &mut Diagnostics,
) -> PreparedImage {
    let actual = image.data.len();
    let mut declared_size = image.effective_size();

    if declared_size != actual {
        let error = X9Error::image_size_mismatch(item_sequence, declared_size, actual);
        if config.repair_images {
            diagnostics.push(error, Resolution::Repaired);
            declared_size = actual;
        } else {
            diagnostics.push(error, Resolution::Reported);
        }
    }

    let Some(requirements) = &config.image_requirements else {
        return PreparedImage {
            data: image.data.clone(),
            declared_size,
        };
    };

    let defects = match inspect(&image.data) {
        Ok(info) => validate(&info, requirements)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        Err(e) => vec![e.to_string()],
    };
    if defects.is_empty() {
        debug!(item_sequence, "Image conforms");
        return PreparedImage {
            data: image.data.clone(),
            declared_size,
        };
    }

    if !config.repair_images {
        diagnostics.push(
            X9Error::image_not_repairable(item_sequence, defects.join("; ")),
            Resolution::Reported,
        );
        return PreparedImage {
            data: image.data.clone(),
            declared_size,
        };
    }

    match repair(&image.data, item_sequence, requirements) {
        Ok(outcome) => PreparedImage {
            declared_size: outcome.data.len(),
            data: outcome.data,
        },
        Err(e) => {
            let error = match e {
                X9Error::ImageNotRepairable { .. } => e,
                other => X9Error::image_not_repairable(item_sequence, other.to_string()),
            };
            diagnostics.push(error, Resolution::FellBack);
            PreparedImage {
                data: image.data.clone(),
                declared_size,
            }
        }
    }
}
