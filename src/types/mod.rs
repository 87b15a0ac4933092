//! Types module
//!
//! Contains the core data structures used throughout the toolkit.
//! This module organizes types into logical submodules:
//! - `header`: File, cash letter, and bundle header attributes
//! - `item`: Check items, endorsements, and attached images
//! - `diagnostics`: Report of recoverable conditions
//! - `error`: Error types for the toolkit

pub mod diagnostics;
pub mod error;
pub mod header;
pub mod item;

pub use diagnostics::{Diagnostic, Diagnostics, Resolution};
pub use error::X9Error;
pub use header::{BundleHeader, CashLetterHeader, FileHeader, FileMode};
pub use item::{
    split_on_us, CheckItem, Endorsement, EndorsementKind, ImageSide, ItemImage, ItemSequence,
};
