//! Diagnostics report for recoverable conditions
//!
//! Recoverable conditions (trailer mismatches, image size mismatches, images that could
//! not be repaired) do not abort a file operation. They are accumulated here, logged
//! as warnings, and returned to the caller alongside the finished output.

use super::error::X9Error;
use tracing::warn;

/// How a recoverable condition was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The condition was reported and the data written as supplied
    Reported,
    /// The condition was corrected automatically before writing
    Repaired,
    /// The original data was written through after a failed repair
    FellBack,
}

/// One recoverable condition
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The condition
    pub error: X9Error,
    /// What the writer did about it
    pub resolution: Resolution,
}

/// Ordered collection of diagnostics for one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a condition and log it
    pub fn push(&mut self, error: X9Error, resolution: Resolution) {
        warn!(resolution = ?resolution, "{}", error);
        self.entries.push(Diagnostic { error, resolution });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Count the diagnostics matching a predicate on the error
    pub fn count_where(&self, predicate: impl Fn(&X9Error) -> bool) -> usize {
        self.entries.iter().filter(|d| predicate(&d.error)).count()
    }

    /// Append every entry of another report
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
