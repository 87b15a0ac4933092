//! File operations run by the processing strategies
//!
//! Each operation bundles the immutable settings it needs and maps one input path to
//! one output path. All outputs are committed atomically.

use crate::ach::AchAssembler;
use crate::config::{AchConfig, ImageRequirements};
use crate::core::generator::Generator;
use crate::core::operations::{
    list_file, repair_images_file, repair_trailers_file, save_ach, verify_file, x9_to_ach,
};
use crate::io::{read_ach_transactions, AtomicOutput};
use crate::strategy::{FileOperation, FileReport};
use crate::types::{Diagnostics, X9Error};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Where an operation writes its output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    /// Exact output path; only meaningful for a single input
    pub output: Option<PathBuf>,
    /// Directory for derived output names; the input's directory when absent
    pub output_dir: Option<PathBuf>,
}

impl OutputPlan {
    /// Output path for `input`: `<dir>/<stem><suffix>.<extension>`
    pub fn path_for(&self, input: &Path, suffix: &str, extension: &str) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let dir = self
            .output_dir
            .clone()
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(format!("{}{}.{}", stem, suffix, extension))
    }
}

fn extension_of(input: &Path) -> String {
    input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "x9".to_string())
}

/// Generate an exchange file from an item CSV
#[derive(Debug, Clone)]
pub struct GenerateOperation {
    pub generator: Generator,
    pub plan: OutputPlan,
    pub now: NaiveDateTime,
}

impl FileOperation for GenerateOperation {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let output = self.plan.path_for(input, "", "x9");
        let summary = self.generator.generate_file(input, &output, self.now)?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(output),
            count: summary.totals.item_count,
            diagnostics: summary.diagnostics,
        })
    }
}

/// Write a CSV listing of every record
#[derive(Debug, Clone, Default)]
pub struct ListOperation {
    pub plan: OutputPlan,
}

impl FileOperation for ListOperation {
    fn name(&self) -> &'static str {
        "read"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let output = self.plan.path_for(input, "", "csv");
        let mut out = AtomicOutput::create(&output)?;
        let count = list_file(input, &mut out)?;
        out.commit()?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(output),
            count: count as u64,
            diagnostics: Diagnostics::new(),
        })
    }
}

/// Recompute trailers and report mismatches without writing
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOperation;

impl FileOperation for VerifyOperation {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let diagnostics = verify_file(input)?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: None,
            count: diagnostics.len() as u64,
            diagnostics,
        })
    }
}

/// Rewrite trailers from recomputed totals
#[derive(Debug, Clone, Default)]
pub struct RepairTrailersOperation {
    pub plan: OutputPlan,
}

impl FileOperation for RepairTrailersOperation {
    fn name(&self) -> &'static str {
        "repair-trailers"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let output = self.plan.path_for(input, "-repaired", &extension_of(input));
        let diagnostics = repair_trailers_file(input, &output)?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(output),
            count: diagnostics.len() as u64,
            diagnostics,
        })
    }
}

/// Check and repair every attached image
#[derive(Debug, Clone)]
pub struct RepairImagesOperation {
    pub plan: OutputPlan,
    pub requirements: ImageRequirements,
}

impl FileOperation for RepairImagesOperation {
    fn name(&self) -> &'static str {
        "repair-images"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let output = self.plan.path_for(input, "-repaired", &extension_of(input));
        let diagnostics = repair_images_file(input, &output, &self.requirements)?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(output),
            count: diagnostics.len() as u64,
            diagnostics,
        })
    }
}

/// Assemble an ACH file from a transaction CSV
#[derive(Debug, Clone)]
pub struct AchOperation {
    pub config: AchConfig,
    pub plan: OutputPlan,
    pub now: NaiveDateTime,
}

impl FileOperation for AchOperation {
    fn name(&self) -> &'static str {
        "ach"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let output = self.plan.path_for(input, "", "ach");
        let transactions = read_ach_transactions(input)?;
        let file = AchAssembler::new(&self.config).assemble(&transactions, self.now)?;
        save_ach(&file, &output)?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(output),
            count: transactions.len() as u64,
            diagnostics: Diagnostics::new(),
        })
    }
}

/// Convert an exchange file's check details to an ACH file
#[derive(Debug, Clone)]
pub struct X9ToAchOperation {
    pub config: AchConfig,
    pub plan: OutputPlan,
    pub now: NaiveDateTime,
}

impl FileOperation for X9ToAchOperation {
    fn name(&self) -> &'static str {
        "x9-to-ach"
    }

    fn run(&self, input: &Path) -> Result<FileReport, X9Error> {
        let output = self.plan.path_for(input, "", "ach");
        let file = x9_to_ach(input, &output, &self.config, self.now)?;
        Ok(FileReport {
            input: input.to_path_buf(),
            output: Some(output),
            count: file.batches.iter().map(|b| b.entry_count as u64).sum(),
            diagnostics: Diagnostics::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::beside_input(OutputPlan::default(), "in/items.csv", "in/items.x9")]
    #[case::output_dir(
        OutputPlan { output: None, output_dir: Some(PathBuf::from("out")) },
        "in/items.csv",
        "out/items.x9"
    )]
    #[case::explicit(
        OutputPlan { output: Some(PathBuf::from("final.x9")), output_dir: Some(PathBuf::from("out")) },
        "in/items.csv",
        "final.x9"
    )]
    fn test_output_plan(#[case] plan: OutputPlan, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(plan.path_for(Path::new(input), "", "x9"), PathBuf::from(expected));
    }

    #[test]
    fn test_repaired_name_keeps_extension() {
        let plan = OutputPlan::default();
        let input = Path::new("files/cash.icl");
        assert_eq!(
            plan.path_for(input, "-repaired", &extension_of(input)),
            PathBuf::from("files/cash-repaired.icl")
        );
    }

    #[test]
    fn test_verify_missing_file_fails() {
        let result = VerifyOperation.run(Path::new("missing.x9"));
        assert!(matches!(result, Err(X9Error::FileNotFound { .. })));
    }
}
