//! ACH batch assembly
//!
//! Turns an unordered list of transactions into a complete ACH file.
//!
//! # Batching
//!
//! Transactions are grouped by (standard entry class, service class code). Each group
//! becomes one batch; batches keep the order in which their first transaction was seen
//! and entries keep their input order within a batch.
//!
//! # Trace Numbers
//!
//! Every entry gets the originating DFI identification followed by a 7-digit sequence.
//! The sequence restarts at the configured start for each batch and wraps to 0 after
//! 9,999,999.

use super::entry_class;
use super::record::{
    self, BatchIdentity, ControlTotals, EntryLine, FileHeaderLine, BLOCKING_FACTOR,
    ENTRY_HASH_MODULUS,
};
use super::transaction::{AchTransaction, EntryDirection};
use crate::codec::field::to_cents;
use crate::config::AchConfig;
use crate::types::X9Error;
use chrono::NaiveDateTime;
use std::io::Write;
use tracing::{debug, info};

/// Largest 7-digit trace sequence
pub const MAX_TRACE_SEQUENCE: u32 = 9_999_999;

/// Advance a trace sequence, wrapping to 0 after the largest value
pub fn next_trace_sequence(current: u32) -> u32 {
    if current >= MAX_TRACE_SEQUENCE {
        0
    } else {
        current + 1
    }
}

/// Summary of one assembled batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_number: u64,
    pub entry_class: String,
    pub service_class: &'static str,
    pub entry_count: usize,
    pub totals: ControlTotals,
}

/// A complete ACH file
#[derive(Debug, Clone)]
pub struct AchFile {
    /// 94-character record lines, including block filler
    pub lines: Vec<String>,
    pub batches: Vec<BatchSummary>,
    pub totals: ControlTotals,
    pub block_count: u64,
}

impl AchFile {
    /// Write every line followed by a newline
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), X9Error> {
        for line in &self.lines {
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}

struct Batch<'t> {
    entry_class: String,
    direction: EntryDirection,
    entries: Vec<&'t AchTransaction>,
}

/// Partition transactions by (entry class, direction) in first-seen order
fn partition<'t>(transactions: &'t [AchTransaction], default_class: &str) -> Vec<Batch<'t>> {
    let mut batches: Vec<Batch<'t>> = Vec::new();
    for tx in transactions {
        let entry_class = tx
            .entry_class
            .as_deref()
            .map(str::trim)
            .filter(|sec| !sec.is_empty())
            .unwrap_or(default_class)
            .to_ascii_uppercase();
        let direction = tx.direction();
        match batches
            .iter_mut()
            .find(|b| b.entry_class == entry_class && b.direction == direction)
        {
            Some(batch) => batch.entries.push(tx),
            None => batches.push(Batch {
                entry_class,
                direction,
                entries: vec![tx],
            }),
        }
    }
    batches
}

/// Builds ACH files from transactions with a fixed configuration
#[derive(Debug, Clone)]
pub struct AchAssembler<'c> {
    config: &'c AchConfig,
}

impl<'c> AchAssembler<'c> {
    pub fn new(config: &'c AchConfig) -> Self {
        Self { config }
    }

    /// Assemble a complete file
    ///
    /// # Arguments
    ///
    /// * `transactions` - Entries in input order
    /// * `now` - File creation timestamp; also the effective date unless configured
    ///
    /// # Errors
    ///
    /// Any invalid transaction (bad routing number, negative amount, oversize field)
    /// aborts the whole file.
    pub fn assemble(
        &self,
        transactions: &[AchTransaction],
        now: NaiveDateTime,
    ) -> Result<AchFile, X9Error> {
        self.config.validate()?;
        let creation_date = now.format("%y%m%d").to_string();
        let effective_date = self
            .config
            .effective_date
            .unwrap_or_else(|| now.date())
            .format("%y%m%d")
            .to_string();

        let mut lines = vec![record::file_header(&FileHeaderLine {
            immediate_destination: &self.config.immediate_destination,
            immediate_origin: &self.config.immediate_origin,
            creation_date: &creation_date,
            creation_time: &now.format("%H%M").to_string(),
            file_id_modifier: &self.config.file_id_modifier,
            destination_name: &self.config.destination_name,
            origin_name: &self.config.origin_name,
        })?];

        let mut file_totals = ControlTotals::default();
        let mut summaries = Vec::new();

        for (index, batch) in partition(transactions, &self.config.entry_class)
            .into_iter()
            .enumerate()
        {
            let identity = BatchIdentity {
                service_class: batch.direction.service_class(),
                company_name: &self.config.company_name,
                company_id: &self.config.company_id,
                entry_class: &batch.entry_class,
                entry_description: &self.config.company_entry_description,
                effective_date: &effective_date,
                originating_dfi: &self.config.originating_dfi,
                batch_number: index as u64 + 1,
            };
            let totals = self.write_batch(&identity, &batch, &mut lines)?;
            debug!(
                batch_number = identity.batch_number,
                entry_class = %batch.entry_class,
                service_class = identity.service_class,
                entries = batch.entries.len(),
                "Batch assembled"
            );
            file_totals.add(&totals)?;
            summaries.push(BatchSummary {
                batch_number: identity.batch_number,
                entry_class: batch.entry_class.clone(),
                service_class: batch.direction.service_class(),
                entry_count: batch.entries.len(),
                totals,
            });
        }

        // The file control line itself counts toward the blocks
        let block_count = (lines.len() + 1).div_ceil(BLOCKING_FACTOR) as u64;
        lines.push(record::file_control(
            summaries.len() as u64,
            block_count,
            &file_totals,
        )?);
        while lines.len() % BLOCKING_FACTOR != 0 {
            lines.push(record::filler());
        }

        info!(
            batches = summaries.len(),
            entries = transactions.len(),
            blocks = block_count,
            "ACH file assembled"
        );
        Ok(AchFile {
            lines,
            batches: summaries,
            totals: file_totals,
            block_count,
        })
    }

    fn write_batch(
        &self,
        identity: &BatchIdentity<'_>,
        batch: &Batch<'_>,
        lines: &mut Vec<String>,
    ) -> Result<ControlTotals, X9Error> {
        lines.push(record::batch_header(identity)?);

        let mut totals = ControlTotals::default();
        let mut sequence = self.config.trace_start;
        for tx in &batch.entries {
            let (receiving_dfi, check_digit) = tx.receiving_dfi()?;
            let cents = to_cents(tx.amount)?;
            let (identification, name) = entry_class::populate(&batch.entry_class, tx);
            let entry_sequence = format!("{:07}", sequence);
            let trace_number = format!("{}{}", self.config.originating_dfi, entry_sequence);
            let addenda = tx
                .addenda
                .as_deref()
                .map(str::trim)
                .filter(|info| !info.is_empty());

            lines.push(record::entry_detail(&EntryLine {
                transaction_code: batch.direction.transaction_code(),
                receiving_dfi,
                check_digit,
                account: &tx.account,
                amount_cents: cents,
                identification: &identification,
                name: &name,
                discretionary_data: &tx.discretionary_data,
                has_addenda: addenda.is_some(),
                trace_number: &trace_number,
            })?);
            totals.entry_addenda_count += 1;

            if let Some(info) = addenda {
                lines.push(record::addenda(info, 1, &entry_sequence)?);
                totals.entry_addenda_count += 1;
            }

            let hash_part: u64 = receiving_dfi.parse().map_err(|_| {
                X9Error::invalid_input(None, format!("invalid receiving DFI '{}'", receiving_dfi))
            })?;
            totals.entry_hash = (totals.entry_hash + hash_part) % ENTRY_HASH_MODULUS;
            let sum = match batch.direction {
                EntryDirection::Debit => &mut totals.debit_cents,
                EntryDirection::Credit => &mut totals.credit_cents,
            };
            *sum = sum
                .checked_add(cents)
                .ok_or_else(|| X9Error::invalid_amount(tx.amount, "batch total overflowed"))?;
            sequence = next_trace_sequence(sequence);
        }

        lines.push(record::batch_control(identity, &totals)?);
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    fn tx(source: &str, routing: &str, cents: i64) -> AchTransaction {
        AchTransaction {
            source_record_type: source.to_string(),
            routing: routing.to_string(),
            account: "12345678".to_string(),
            process_control: "123456".to_string(),
            amount: Decimal::new(cents, 2),
            identification: String::new(),
            name: "JANE DOE".to_string(),
            discretionary_data: String::new(),
            sequence: "0000000000000001".to_string(),
            addenda: None,
            entry_class: None,
        }
    }

    #[fixture]
    fn config() -> AchConfig {
        AchConfig {
            company_name: "ACME".to_string(),
            company_id: "1234567890".to_string(),
            ..AchConfig::default()
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap()
    }

    fn entries(file: &AchFile) -> Vec<&String> {
        file.lines.iter().filter(|l| l.starts_with('6')).collect()
    }

    #[rstest]
    #[case::start(1, 2)]
    #[case::middle(500, 501)]
    #[case::wrap(MAX_TRACE_SEQUENCE, 0)]
    fn test_next_trace_sequence(#[case] current: u32, #[case] expected: u32) {
        assert_eq!(next_trace_sequence(current), expected);
    }

    #[rstest]
    fn test_arc_identification_fallback(config: AchConfig) {
        let file = AchAssembler::new(&config)
            .assemble(&[tx("25", "011000015", 1000)], now())
            .unwrap();
        let entry = entries(&file)[0];
        assert_eq!(&entry[39..54], "123456000000001");
        assert_eq!(&entry[1..3], "27");
    }

    #[rstest]
    fn test_batches_split_by_direction_in_first_seen_order(config: AchConfig) {
        let input = vec![
            tx("61", "011000015", 500),
            tx("25", "011000015", 1000),
            tx("61", "021000021", 700),
        ];
        let file = AchAssembler::new(&config).assemble(&input, now()).unwrap();

        assert_eq!(file.batches.len(), 2);
        assert_eq!(file.batches[0].service_class, "220");
        assert_eq!(file.batches[0].entry_count, 2);
        assert_eq!(file.batches[0].totals.credit_cents, 1200);
        assert_eq!(file.batches[1].service_class, "225");
        assert_eq!(file.batches[1].totals.debit_cents, 1000);
        assert_eq!(file.totals.debit_cents, 1000);
        assert_eq!(file.totals.credit_cents, 1200);
    }

    #[rstest]
    fn test_entry_class_override_creates_batch(config: AchConfig) {
        let mut other = tx("25", "011000015", 100);
        other.entry_class = Some("boc".to_string());
        let file = AchAssembler::new(&config)
            .assemble(&[tx("25", "011000015", 100), other], now())
            .unwrap();
        let classes: Vec<_> = file.batches.iter().map(|b| b.entry_class.as_str()).collect();
        assert_eq!(classes, vec!["ARC", "BOC"]);
    }

    #[rstest]
    fn test_trace_numbers_restart_per_batch(mut config: AchConfig) {
        config.trace_start = 9_999_999;
        let input = vec![
            tx("25", "011000015", 100),
            tx("25", "011000015", 100),
            tx("61", "011000015", 100),
        ];
        let file = AchAssembler::new(&config).assemble(&input, now()).unwrap();
        let traces: Vec<_> = entries(&file).iter().map(|e| &e[79..94]).collect();
        assert_eq!(
            traces,
            vec!["011000019999999", "011000010000000", "011000019999999"]
        );
    }

    #[rstest]
    fn test_entry_hash_sums_receiving_dfi(config: AchConfig) {
        let input = vec![tx("25", "011000015", 100), tx("25", "021000021", 100)];
        let file = AchAssembler::new(&config).assemble(&input, now()).unwrap();
        assert_eq!(file.totals.entry_hash, 1_100_001 + 2_100_002);
        let control = file.lines.iter().find(|l| l.starts_with('8')).unwrap();
        assert_eq!(&control[10..20], "0003200003");
    }

    #[rstest]
    fn test_file_is_blocked(config: AchConfig) {
        let input: Vec<_> = (0..3).map(|_| tx("25", "011000015", 100)).collect();
        let file = AchAssembler::new(&config).assemble(&input, now()).unwrap();

        // header, batch header, 3 entries, batch control, file control = 7 lines
        assert_eq!(file.lines.len(), 10);
        assert_eq!(file.block_count, 1);
        assert!(file.lines.iter().all(|l| l.len() == 94));
        assert_eq!(file.lines[7], "9".repeat(94));
        let control = &file.lines[6];
        assert!(control.starts_with("9000001000001"));
        assert_eq!(&control[13..21], "00000003");
    }

    #[rstest]
    fn test_addenda_counted(config: AchConfig) {
        let mut with_addenda = tx("25", "011000015", 100);
        with_addenda.addenda = Some("INVOICE 42".to_string());
        let file = AchAssembler::new(&config)
            .assemble(&[with_addenda], now())
            .unwrap();

        let entry = entries(&file)[0];
        assert_eq!(&entry[78..79], "1");
        let addenda = file.lines.iter().find(|l| l.starts_with('7')).unwrap();
        assert!(addenda.starts_with("705INVOICE 42"));
        assert_eq!(&addenda[87..94], "0000001");
        assert_eq!(file.totals.entry_addenda_count, 2);
    }

    #[rstest]
    fn test_invalid_routing_aborts(config: AchConfig) {
        let result = AchAssembler::new(&config).assemble(&[tx("25", "12", 100)], now());
        assert!(matches!(result, Err(X9Error::InvalidInputRecord { .. })));
    }

    #[rstest]
    fn test_empty_input_still_builds_file(config: AchConfig) {
        let file = AchAssembler::new(&config).assemble(&[], now()).unwrap();
        assert_eq!(file.lines.len(), 10);
        assert!(file.lines[0].starts_with("101"));
        assert!(file.lines[1].starts_with("9000000000001"));
    }

    #[rstest]
    fn test_write_to_terminates_lines(config: AchConfig) {
        let file = AchAssembler::new(&config).assemble(&[], now()).unwrap();
        let mut out = Vec::new();
        file.write_to(&mut out).unwrap();
        assert_eq!(out.len(), 10 * 95);
        assert_eq!(out[94], b'\n');
    }
}
