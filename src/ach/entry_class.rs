//! Standard Entry Class rules
//!
//! The SEC code of a batch decides how the identification number and individual name
//! of each entry are populated. Check conversion classes carry the check serial
//! instead of a free-form receiver identification.

use super::transaction::AchTransaction;

/// Width of the individual identification number field
const IDENTIFICATION_WIDTH: usize = 15;
/// Width of the individual name field
const NAME_WIDTH: usize = 22;
/// Width of the process control prefix in truncated-check names
const PROCESS_CONTROL_WIDTH: usize = 6;

/// How an entry class fills identification and name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationRule {
    /// Check serial as identification; process control + item research number as name
    TruncatedCheck,
    /// Check number as identification (process control + sequence when blank);
    /// receiver name as name
    ConvertedCheck,
    /// Identification and name copied from the input
    Passthrough,
}

const RULES: &[(&str, PopulationRule)] = &[
    ("TRC", PopulationRule::TruncatedCheck),
    ("XCK", PopulationRule::TruncatedCheck),
    ("ARC", PopulationRule::ConvertedCheck),
    ("BOC", PopulationRule::ConvertedCheck),
    ("POP", PopulationRule::ConvertedCheck),
    ("RCK", PopulationRule::ConvertedCheck),
];

/// Look up the population rule of an SEC code
pub fn rule_for(sec: &str) -> PopulationRule {
    let sec = sec.trim();
    RULES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(sec))
        .map(|(_, rule)| *rule)
        .unwrap_or(PopulationRule::Passthrough)
}

/// Identification number and individual name of an entry under the given SEC code
///
/// # Returns
///
/// `(identification, name)`, both untruncated for copied values and trimmed to their
/// field widths for composed ones.
pub fn populate(sec: &str, tx: &AchTransaction) -> (String, String) {
    match rule_for(sec) {
        PopulationRule::TruncatedCheck => {
            let serial = if tx.identification.trim().is_empty() {
                tx.process_control.trim()
            } else {
                tx.identification.trim()
            };
            let name = format!(
                "{:<width$}{}",
                tx.process_control.trim(),
                tx.sequence.trim(),
                width = PROCESS_CONTROL_WIDTH
            );
            (serial.to_string(), keep_right(&name, NAME_WIDTH).to_string())
        }
        PopulationRule::ConvertedCheck => {
            let identification = if tx.identification.trim().is_empty() {
                composite_identification(&tx.process_control, &tx.sequence)
            } else {
                tx.identification.trim().to_string()
            };
            (identification, tx.name.trim().to_string())
        }
        PopulationRule::Passthrough => (
            tx.identification.trim().to_string(),
            tx.name.trim().to_string(),
        ),
    }
}

/// Process control followed by as much of the sequence as fits, keeping its
/// low-order digits
fn composite_identification(process_control: &str, sequence: &str) -> String {
    let process_control = keep_right(process_control.trim(), IDENTIFICATION_WIDTH);
    let room = IDENTIFICATION_WIDTH - process_control.len();
    format!("{}{}", process_control, keep_right(sequence.trim(), room))
}

fn keep_right(value: &str, width: usize) -> &str {
    let skip = value.len().saturating_sub(width);
    value.get(skip..).unwrap_or(value)
}
