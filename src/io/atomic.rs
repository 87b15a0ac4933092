//! Atomic output files
//!
//! Output is written to a temporary file in the target's directory and renamed over
//! the target on `commit`. Dropping an `AtomicOutput` without committing deletes the
//! temporary file, so a failed run never leaves a truncated file at the target path.

use crate::types::X9Error;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A file that appears at its target path only once complete
#[derive(Debug)]
pub struct AtomicOutput {
    target: PathBuf,
    temp: BufWriter<NamedTempFile>,
}

impl AtomicOutput {
    /// Start writing a new output for `target`
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the temporary file cannot be created next to the target.
    pub fn create(target: &Path) -> Result<Self, X9Error> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = NamedTempFile::new_in(&dir)?;
        debug!(target = %target.display(), temp = %temp.path().display(), "Output staged");
        Ok(Self {
            target: target.to_path_buf(),
            temp: BufWriter::with_capacity(64 * 1024, temp),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush, sync and move the finished file to its target path
    pub fn commit(self) -> Result<(), X9Error> {
        let temp = self
            .temp
            .into_inner()
            .map_err(|e| X9Error::from(e.into_error()))?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target)
            .map_err(|e| X9Error::from(e.error))?;
        debug!(target = %self.target.display(), "Output committed");
        Ok(())
    }
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.temp.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.temp.flush()
    }
}
