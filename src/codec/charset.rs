//! Character encodings for text fields
//!
//! Exchange files are either ASCII or EBCDIC (code page 037). The choice is made once
//! per file, when the writer or reader is opened. Binary sections (image data,
//! digital signatures) are never transcoded.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Text encoding of an exchange file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Ascii,
    Ebcdic,
}

/// Printable ASCII 0x20..=0x7E mapped to code page 037
const ASCII_TO_EBCDIC: [u8; 95] = [
    0x40, 0x5A, 0x7F, 0x7B, 0x5B, 0x6C, 0x50, 0x7D, // space ! " # $ % & '
    0x4D, 0x5D, 0x5C, 0x4E, 0x6B, 0x60, 0x4B, 0x61, // ( ) * + , - . /
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, // 0-7
    0xF8, 0xF9, 0x7A, 0x5E, 0x4C, 0x7E, 0x6E, 0x6F, // 8 9 : ; < = > ?
    0x7C, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, // @ A-G
    0xC8, 0xC9, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, // H-O
    0xD7, 0xD8, 0xD9, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, // P-W
    0xE7, 0xE8, 0xE9, 0xBA, 0xE0, 0xBB, 0xB0, 0x6D, // X Y Z [ \ ] ^ _
    0x79, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, // ` a-g
    0x88, 0x89, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, // h-o
    0x97, 0x98, 0x99, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, // p-w
    0xA7, 0xA8, 0xA9, 0xC0, 0x4F, 0xD0, 0xA1, // x y z { | } ~
];

/// Reverse table; unmapped EBCDIC bytes decode to `?`
const EBCDIC_TO_ASCII: [u8; 256] = build_reverse_table();

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [b'?'; 256];
    let mut i = 0;
    while i < ASCII_TO_EBCDIC.len() {
        table[ASCII_TO_EBCDIC[i] as usize] = 0x20 + i as u8;
        i += 1;
    }
    table
}

impl Charset {
    /// Encode printable ASCII text into file bytes
    ///
    /// Characters outside printable ASCII are written as `?`. Field formatting
    /// rejects such characters before they reach this point.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Ascii => text
                .bytes()
                .map(|b| if (0x20..=0x7E).contains(&b) { b } else { b'?' })
                .collect(),
            Charset::Ebcdic => text
                .bytes()
                .map(|b| {
                    if (0x20..=0x7E).contains(&b) {
                        ASCII_TO_EBCDIC[(b - 0x20) as usize]
                    } else {
                        0x6F
                    }
                })
                .collect(),
        }
    }

    /// Decode file bytes into text
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '?' })
                .collect(),
            Charset::Ebcdic => bytes
                .iter()
                .map(|&b| EBCDIC_TO_ASCII[b as usize] as char)
                .collect(),
        }
    }

    /// Guess the charset from the first two bytes of a record (its type digits)
    pub fn detect(record_type_bytes: &[u8]) -> Option<Charset> {
        match record_type_bytes {
            [a, b, ..] if a.is_ascii_digit() && b.is_ascii_digit() => Some(Charset::Ascii),
            [a, b, ..] if (0xF0..=0xF9).contains(a) && (0xF0..=0xF9).contains(b) => {
                Some(Charset::Ebcdic)
            }
            _ => None,
        }
    }
}
