//! Whole-file operations on existing exchange files
//!
//! Each operation reads an input file completely, transforms the decoded records, and
//! writes its result through an `AtomicOutput` in the input's own character set and
//! framing. A failure at any point leaves no output behind.

use super::reader::{collect_items, X9Reader};
use super::trailer::{repair_trailers, verify};
use crate::ach::{AchAssembler, AchFile, AchTransaction};
use crate::codec::{Charset, Framing, Record, RecordType, RecordWriter};
use crate::config::{AchConfig, ImageRequirements, WriterConfig};
use crate::image;
use crate::io::{write_listing, AtomicOutput};
use crate::types::{Diagnostics, ImageSide, ItemImage, X9Error};
use chrono::NaiveDateTime;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Decoded file contents with the format they were read in
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub records: Vec<Record>,
    pub charset: Charset,
    pub framing: Framing,
}

/// Read and decode a whole file
pub fn load(path: &Path) -> Result<LoadedFile, X9Error> {
    let reader = X9Reader::open(path)?;
    let charset = reader.charset();
    let framing = reader.framing();
    Ok(LoadedFile {
        records: reader.read_all()?,
        charset,
        framing,
    })
}

/// Encode records to `output` atomically
pub fn save(records: &[Record], output: &Path, charset: Charset, framing: Framing) -> Result<(), X9Error> {
    let mut writer = RecordWriter::new(AtomicOutput::create(output)?, charset, framing);
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    writer.into_inner().commit()
}

/// Write a CSV listing of every record in a file
pub fn list_file(path: &Path, output: &mut dyn Write) -> Result<usize, X9Error> {
    let file = load(path)?;
    write_listing(&file.records, output)?;
    Ok(file.records.len())
}

/// Recompute every trailer of a file and report the disagreements
#[instrument(fields(path = %path.display()))]
pub fn verify_file(path: &Path) -> Result<Diagnostics, X9Error> {
    let file = load(path)?;
    let diagnostics = verify(&file.records)?;
    info!(
        records = file.records.len(),
        mismatches = diagnostics.len(),
        "Verified trailers"
    );
    Ok(diagnostics)
}

/// Rewrite every trailer of `input` from recomputed totals into `output`
#[instrument(fields(input = %input.display(), output = %output.display()))]
pub fn repair_trailers_file(input: &Path, output: &Path) -> Result<Diagnostics, X9Error> {
    let file = load(input)?;
    let (records, diagnostics) = repair_trailers(file.records)?;
    save(&records, output, file.charset, file.framing)?;
    info!(repaired = diagnostics.len(), "Repaired trailers");
    Ok(diagnostics)
}

/// Check every image of `records` against `requirements`, repairing what can be repaired
///
/// Size fields are corrected to the payload length. Images that cannot be repaired are
/// left as they are and reported.
pub fn repair_images(records: &mut [Record], requirements: &ImageRequirements) -> Result<Diagnostics, X9Error> {
    let config = WriterConfig {
        repair_images: true,
        image_requirements: Some(requirements.clone()),
        ..WriterConfig::default()
    };
    let mut diagnostics = Diagnostics::new();
    let mut index = 0;

    while index + 1 < records.len() {
        if records[index].record_type() != RecordType::ImageViewDetail
            || records[index + 1].record_type() != RecordType::ImageViewData
        {
            index += 1;
            continue;
        }
        let (details, rest) = records.split_at_mut(index + 1);
        let detail = &mut details[index];
        let data = &mut rest[0];

        let Some(mut variable) = data.variable().cloned() else {
            index += 2;
            continue;
        };
        let side = ImageSide::from_code(detail.text("ViewSideIndicator")).unwrap_or(ImageSide::Front);
        let mut item_image = ItemImage::new(side, std::mem::take(&mut variable.image_data));
        item_image.declared_size = Some(detail.number("ImageViewDataSize")? as usize);
        let sequence = data.text("EceInstitutionItemSequenceNumber").to_string();

        let prepared = image::prepare(&item_image, &sequence, &config, &mut diagnostics);
        detail.set_number("ImageViewDataSize", prepared.declared_size as u64)?;
        variable.image_data = prepared.data;
        data.set_variable(variable)?;
        debug!(item_sequence = %sequence, "Image checked");
        index += 2;
    }
    Ok(diagnostics)
}

/// Repair the images of `input` into `output`
#[instrument(skip(requirements), fields(input = %input.display(), output = %output.display()))]
pub fn repair_images_file(
    input: &Path,
    output: &Path,
    requirements: &ImageRequirements,
) -> Result<Diagnostics, X9Error> {
    let mut file = load(input)?;
    let diagnostics = repair_images(&mut file.records, requirements)?;
    save(&file.records, output, file.charset, file.framing)?;
    info!(diagnostics = diagnostics.len(), "Repaired images");
    Ok(diagnostics)
}

/// Write an assembled ACH file atomically
pub fn save_ach(file: &AchFile, output: &Path) -> Result<(), X9Error> {
    let mut out = AtomicOutput::create(output)?;
    file.write_to(&mut out)?;
    out.commit()
}

/// Convert the check details of an exchange file into an ACH debit file
#[instrument(skip(config), fields(input = %input.display(), output = %output.display()))]
pub fn x9_to_ach(
    input: &Path,
    output: &Path,
    config: &AchConfig,
    now: NaiveDateTime,
) -> Result<AchFile, X9Error> {
    let file = load(input)?;
    let transactions: Vec<AchTransaction> = collect_items(&file.records)?
        .iter()
        .map(AchTransaction::from_check_item)
        .collect();
    let ach = AchAssembler::new(config).assemble(&transactions, now)?;
    save_ach(&ach, output)?;
    info!(entries = transactions.len(), "Converted exchange file to ACH");
    Ok(ach)
}
