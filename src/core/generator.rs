//! Exchange file generation
//!
//! Writes a complete file (one cash letter) from a stream of check items. Bundles are
//! cut automatically whenever the writer reports that the configured bundle size has
//! been reached.

use super::traits::RecordSink;
use super::writer::{WriteSummary, X9Writer};
use crate::codec::RecordWriter;
use crate::config::{FileHeaderDefaults, WriterConfig};
use crate::io::{AtomicOutput, ItemReader};
use crate::types::{CheckItem, X9Error};
use chrono::NaiveDateTime;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Builds exchange files from check items with fixed settings
#[derive(Debug, Clone)]
pub struct Generator {
    config: Arc<WriterConfig>,
    headers: FileHeaderDefaults,
}

impl Generator {
    pub fn new(config: Arc<WriterConfig>, headers: FileHeaderDefaults) -> Self {
        Self { config, headers }
    }

    /// Write one file of items into a sink
    ///
    /// # Arguments
    ///
    /// * `sink` - Receives every record
    /// * `items` - Items in file order; the first error aborts the file
    /// * `now` - Creation timestamp of every header
    ///
    /// # Returns
    ///
    /// The sink (for committing its output) and the file summary
    pub fn write<S, I>(&self, sink: S, items: I, now: NaiveDateTime) -> Result<(S, WriteSummary), X9Error>
    where
        S: RecordSink,
        I: IntoIterator<Item = Result<CheckItem, X9Error>>,
    {
        let bundle = self.headers.bundle_header(now);
        let mut writer = X9Writer::new(sink, Arc::clone(&self.config))?;
        writer.open_file(&self.headers.file_header(now))?;
        writer.open_cash_letter(&self.headers.cash_letter_header(now))?;
        writer.open_bundle(&bundle)?;

        for item in items {
            if writer.is_bundle_cutoff_reached() {
                writer.close_bundle()?;
                writer.open_bundle(&bundle)?;
            }
            writer.write_item(&item?)?;
        }

        writer.close_bundle()?;
        writer.close_cash_letter()?;
        let summary = writer.close_file()?;
        Ok((writer.into_inner(), summary))
    }

    /// Generate a file from an item CSV
    ///
    /// The output only appears at `output` when every item was written.
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub fn generate_file(
        &self,
        input: &Path,
        output: &Path,
        now: NaiveDateTime,
    ) -> Result<WriteSummary, X9Error> {
        let items = ItemReader::new(input)?;
        let sink = RecordWriter::new(
            AtomicOutput::create(output)?,
            self.config.charset,
            self.config.framing,
        );
        let (sink, summary) = self.write(sink, items, now)?;
        sink.into_inner().commit()?;
        info!(
            items = summary.totals.item_count,
            bundles = summary.totals.bundle_count,
            "Generated exchange file"
        );
        Ok(summary)
    }
}
