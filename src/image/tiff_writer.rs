//! Bilevel TIFF encoder
//!
//! Writes a single-strip, uncompressed, 1-bit TIFF (little-endian, white is zero) with
//! the resolution stored in dots per inch. This is the form repaired images take.
//!
//! `tiff::encoder` only offers 8-bit and wider colour types, so the bilevel container
//! is laid out here; reading it back goes through `tiff::decoder` in `inspect`.

use image::GrayImage;

const ENTRY_COUNT: u16 = 12;
const IFD_OFFSET: u32 = 8;
/// Header (8) + entry count (2) + entries (12 x 12) + next IFD offset (4)
const X_RESOLUTION_OFFSET: u32 = IFD_OFFSET + 2 + ENTRY_COUNT as u32 * 12 + 4;
const Y_RESOLUTION_OFFSET: u32 = X_RESOLUTION_OFFSET + 8;
const STRIP_OFFSET: u32 = Y_RESOLUTION_OFFSET + 8;

const SHORT: u16 = 3;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;

const COMPRESSION_NONE: u32 = 1;
const PHOTOMETRIC_WHITE_IS_ZERO: u32 = 0;
const RESOLUTION_UNIT_INCH: u32 = 2;

fn entry(out: &mut Vec<u8>, tag: u16, field_type: u16, value: u32) {
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&field_type.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    if field_type == SHORT {
        // SHORT values are left-justified in the 4-byte value field
        out.extend_from_slice(&(value as u16).to_le_bytes());
        out.extend_from_slice(&[0, 0]);
    } else {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Pack a grayscale image into 1-bit rows: pixels of value 0 become black
fn pack_rows(image: &GrayImage) -> Vec<u8> {
    let stride = (image.width() as usize).div_ceil(8);
    let mut packed = vec![0u8; stride * image.height() as usize];
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] == 0 {
            packed[y as usize * stride + x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    packed
}

/// Encode a black-and-white image as an uncompressed 1-bit TIFF
///
/// Pixels with value 0 are black; every other value is white. Callers threshold
/// grayscale input first.
pub fn encode_bitonal(image: &GrayImage, dpi: u32) -> Vec<u8> {
    let strip = pack_rows(image);
    let mut out = Vec::with_capacity(STRIP_OFFSET as usize + strip.len());

    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&IFD_OFFSET.to_le_bytes());

    out.extend_from_slice(&ENTRY_COUNT.to_le_bytes());
    entry(&mut out, 256, LONG, image.width());
    entry(&mut out, 257, LONG, image.height());
    entry(&mut out, 258, SHORT, 1);
    entry(&mut out, 259, SHORT, COMPRESSION_NONE);
    entry(&mut out, 262, SHORT, PHOTOMETRIC_WHITE_IS_ZERO);
    entry(&mut out, 273, LONG, STRIP_OFFSET);
    entry(&mut out, 277, SHORT, 1);
    entry(&mut out, 278, LONG, image.height());
    entry(&mut out, 279, LONG, strip.len() as u32);
    entry(&mut out, 282, RATIONAL, X_RESOLUTION_OFFSET);
    entry(&mut out, 283, RATIONAL, Y_RESOLUTION_OFFSET);
    entry(&mut out, 296, SHORT, RESOLUTION_UNIT_INCH);
    out.extend_from_slice(&0u32.to_le_bytes());

    for _ in 0..2 {
        out.extend_from_slice(&dpi.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
    }
    debug_assert_eq!(out.len(), STRIP_OFFSET as usize);
    out.extend_from_slice(&strip);
    out
}
