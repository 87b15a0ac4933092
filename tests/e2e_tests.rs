//! End-to-end integration tests
//!
//! These tests drive complete file operations through the public library surface:
//! 1. Generate exchange files from the item CSV fixtures in tests/fixtures/
//! 2. Read them back, verify and repair their trailers and images
//! 3. Assemble ACH files from transaction CSVs and from exchange files
//!
//! Operations that run over many files are exercised with both strategies.

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;
    use x9_cashletter::cli::StrategyType;
    use x9_cashletter::codec::{Charset, Framing, Record, RecordType, RecordWriter};
    use x9_cashletter::config::{AchConfig, FileHeaderDefaults, ImageRequirements, WriterConfig};
    use x9_cashletter::core::operations::{
        load, repair_images_file, repair_trailers_file, save, verify_file, x9_to_ach,
    };
    use x9_cashletter::core::{Generator, X9Reader, X9Writer};
    use x9_cashletter::io::AtomicOutput;
    use x9_cashletter::strategy::{
        create_strategy, AchOperation, BatchConfig, GenerateOperation, OutputPlan,
        VerifyOperation,
    };
    use x9_cashletter::types::{CheckItem, ImageSide, ItemImage, Resolution, X9Error};

    fn fixture_path(name: &str) -> PathBuf {
        Path::new("tests/fixtures").join(name)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap()
    }

    fn generator(config: WriterConfig) -> Generator {
        Generator::new(Arc::new(config), FileHeaderDefaults::default())
    }

    fn ach_config() -> AchConfig {
        AchConfig {
            company_name: "ACME".to_string(),
            company_id: "1234567890".to_string(),
            ..AchConfig::default()
        }
    }

    fn count(records: &[Record], record_type: RecordType) -> usize {
        records.iter().filter(|r| r.record_type() == record_type).count()
    }

    #[fixture]
    fn workdir() -> TempDir {
        TempDir::new().expect("Failed to create temp dir")
    }

    /// Generate the 25-item fixture into `dir` and return the output path
    fn generate_scenario_a(dir: &Path, config: WriterConfig) -> PathBuf {
        let output = dir.join("cashletter.x9");
        generator(config)
            .generate_file(&fixture_path("scenario_a/items.csv"), &output, now())
            .unwrap_or_else(|e| panic!("Failed to generate: {}", e));
        output
    }

    #[rstest]
    #[case::ascii_framed(Charset::Ascii, Framing::LengthPrefixed)]
    #[case::ebcdic_framed(Charset::Ebcdic, Framing::LengthPrefixed)]
    #[case::ebcdic_unframed(Charset::Ebcdic, Framing::Unframed)]
    fn test_generate_single_bundle(
        workdir: TempDir,
        #[case] charset: Charset,
        #[case] framing: Framing,
    ) {
        let config = WriterConfig {
            charset,
            framing,
            ..WriterConfig::default()
        };
        let output = generate_scenario_a(workdir.path(), config);

        let reader = X9Reader::open(&output).unwrap();
        assert_eq!(reader.charset(), charset);
        assert_eq!(reader.framing(), framing);
        let records = reader.read_all().unwrap();

        assert_eq!(records.len(), 31);
        let file_control = records.last().unwrap();
        assert_eq!(file_control.record_type(), RecordType::FileControl);
        assert_eq!(file_control.number("TotalItemCount").unwrap(), 25);
        assert_eq!(
            file_control.amount("FileTotalAmount").unwrap(),
            Decimal::new(25000, 2)
        );
        assert_eq!(file_control.number("TotalRecordCount").unwrap(), 31);
        assert_eq!(count(&records, RecordType::BundleHeader), 1);
        assert!(verify_file(&output).unwrap().is_empty());
    }

    #[rstest]
    fn test_generate_with_bundle_cutoff(workdir: TempDir) {
        let config = WriterConfig {
            max_items_per_bundle: Some(10),
            ..WriterConfig::default()
        };
        let output = generate_scenario_a(workdir.path(), config);
        let records = load(&output).unwrap().records;

        let bundle_items: Vec<u64> = records
            .iter()
            .filter(|r| r.record_type() == RecordType::BundleControl)
            .map(|r| r.number("ItemsWithinBundleCount").unwrap())
            .collect();
        assert_eq!(bundle_items, vec![10, 10, 5]);

        let cash_letter_control = records
            .iter()
            .find(|r| r.record_type() == RecordType::CashLetterControl)
            .unwrap();
        assert_eq!(cash_letter_control.number("ItemsWithinCashLetterCount").unwrap(), 25);
        assert_eq!(cash_letter_control.number("BundleCount").unwrap(), 3);
    }

    #[rstest]
    fn test_generate_leaves_no_output_on_bad_row(workdir: TempDir) {
        let input = workdir.path().join("items.csv");
        std::fs::write(
            &input,
            "routing,on_us,auxiliary_on_us,epc,amount,item_sequence,front_image,back_image\n\
             011000015,12345678/1001,,,10.00,,,\n\
             011000015,12345678/1002,,,ten,,,\n",
        )
        .unwrap();
        let output = workdir.path().join("out.x9");

        let result = generator(WriterConfig::default()).generate_file(&input, &output, now());

        assert!(matches!(
            result,
            Err(X9Error::InvalidInputRecord { line: Some(3), .. })
        ));
        assert!(!output.exists());
    }

    #[rstest]
    fn test_repair_trailers_round_trip(workdir: TempDir) {
        let output = generate_scenario_a(workdir.path(), WriterConfig::default());
        let mut file = load(&output).unwrap();

        let last = file.records.len() - 1;
        file.records[last]
            .set_number("TotalItemCount", 24)
            .unwrap()
            .set_amount("FileTotalAmount", Decimal::new(1, 2))
            .unwrap();
        let tampered = workdir.path().join("tampered.x9");
        save(&file.records, &tampered, file.charset, file.framing).unwrap();

        let mismatches = verify_file(&tampered).unwrap();
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches
            .iter()
            .all(|d| matches!(d.error, X9Error::TrailerMismatch { .. })));

        let repaired = workdir.path().join("repaired.x9");
        let diagnostics = repair_trailers_file(&tampered, &repaired).unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert!(verify_file(&repaired).unwrap().is_empty());
        assert_eq!(
            std::fs::read(&repaired).unwrap(),
            std::fs::read(&output).unwrap()
        );
    }

    /// Write one item whose front image declares 5000 bytes but carries 4998
    fn write_mismatched_image(path: &Path) -> x9_cashletter::WriteSummary {
        let config = Arc::new(WriterConfig::default());
        let headers = FileHeaderDefaults::default();
        let sink = RecordWriter::new(
            AtomicOutput::create(path).unwrap(),
            config.charset,
            config.framing,
        );
        let mut writer = X9Writer::new(sink, Arc::clone(&config)).unwrap();
        writer.open_file(&headers.file_header(now())).unwrap();
        writer
            .open_cash_letter(&headers.cash_letter_header(now()))
            .unwrap();
        writer.open_bundle(&headers.bundle_header(now())).unwrap();

        let mut item = CheckItem::new("011000015", "12345678/1001", Decimal::new(1000, 2));
        let mut front = ItemImage::new(ImageSide::Front, vec![0x55; 4998]);
        front.declared_size = Some(5000);
        item.images.push(front);
        writer.write_item(&item).unwrap();

        writer.close_bundle().unwrap();
        writer.close_cash_letter().unwrap();
        let summary = writer.close_file().unwrap();
        writer.into_inner().into_inner().commit().unwrap();
        summary
    }

    #[rstest]
    fn test_image_size_mismatch_written_through(workdir: TempDir) {
        let path = workdir.path().join("images.x9");
        let summary = write_mismatched_image(&path);

        assert_eq!(summary.diagnostics.len(), 1);
        let diagnostic = summary.diagnostics.iter().next().unwrap();
        assert!(matches!(
            diagnostic.error,
            X9Error::ImageSizeMismatch {
                declared: 5000,
                actual: 4998,
                ..
            }
        ));
        assert_eq!(diagnostic.resolution, Resolution::Reported);

        let records = load(&path).unwrap().records;
        let detail = records
            .iter()
            .find(|r| r.record_type() == RecordType::ImageViewDetail)
            .unwrap();
        let data = records
            .iter()
            .find(|r| r.record_type() == RecordType::ImageViewData)
            .unwrap();
        assert_eq!(detail.number("ImageViewDataSize").unwrap(), 5000);
        assert_eq!(data.variable().unwrap().image_data.len(), 4998);
    }

    #[rstest]
    fn test_repair_images_corrects_size_and_keeps_payload(workdir: TempDir) {
        let path = workdir.path().join("images.x9");
        write_mismatched_image(&path);
        let repaired = workdir.path().join("images-repaired.x9");

        let diagnostics =
            repair_images_file(&path, &repaired, &ImageRequirements::default()).unwrap();

        let resolutions: Vec<Resolution> = diagnostics.iter().map(|d| d.resolution).collect();
        assert_eq!(resolutions, vec![Resolution::Repaired, Resolution::FellBack]);
        let records = load(&repaired).unwrap().records;
        let detail = records
            .iter()
            .find(|r| r.record_type() == RecordType::ImageViewDetail)
            .unwrap();
        assert_eq!(detail.number("ImageViewDataSize").unwrap(), 4998);
        assert!(verify_file(&repaired).unwrap().is_empty());
    }

    #[rstest]
    fn test_ach_from_transaction_csv(workdir: TempDir) {
        let operation = AchOperation {
            config: ach_config(),
            plan: OutputPlan {
                output: None,
                output_dir: Some(workdir.path().to_path_buf()),
            },
            now: now(),
        };
        let strategy = create_strategy(StrategyType::Sync, None);
        let outcomes = strategy
            .process(&[fixture_path("ach/entries.csv")], Arc::new(operation))
            .unwrap();

        let report = outcomes[0].result.as_ref().unwrap();
        assert_eq!(report.count, 3);
        let output = report.output.clone().unwrap();
        assert_eq!(output, workdir.path().join("entries.ach"));

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len() % 10, 0);
        assert!(lines.iter().all(|l| l.len() == 94));

        let entries: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with('6')).collect();
        assert_eq!(entries.len(), 3);
        // process control + right-most sequence digits when the check serial is blank
        assert_eq!(&entries[0][39..54], "123456000000001");
        assert_eq!(entries[1][39..54].trim_end(), "2002");
        assert_eq!(&entries[1][78..79], "1");
        assert!(lines.iter().any(|l| l.starts_with("705CHECK 2002 CONVERTED")));

        let batch_headers = lines.iter().filter(|l| l.starts_with('5')).count();
        assert_eq!(batch_headers, 2);
    }

    #[rstest]
    fn test_ach_rejects_wrong_field_count(workdir: TempDir) {
        let operation = AchOperation {
            config: ach_config(),
            plan: OutputPlan {
                output: Some(workdir.path().join("out.ach")),
                output_dir: None,
            },
            now: now(),
        };
        let outcomes = create_strategy(StrategyType::Sync, None)
            .process(&[fixture_path("ach/wrong_field_count.csv")], Arc::new(operation))
            .unwrap();

        assert!(matches!(
            outcomes[0].result,
            Err(X9Error::InvalidInputRecord { line: Some(2), .. })
        ));
        assert!(!workdir.path().join("out.ach").exists());
    }

    #[rstest]
    fn test_x9_to_ach(workdir: TempDir) {
        let input = generate_scenario_a(workdir.path(), WriterConfig::default());
        let output = workdir.path().join("cashletter.ach");

        let file = x9_to_ach(&input, &output, &ach_config(), now()).unwrap();

        assert_eq!(file.batches.len(), 1);
        assert_eq!(file.batches[0].entry_count, 25);
        assert_eq!(file.batches[0].service_class, "225");
        assert_eq!(file.totals.debit_cents, 25_000);
        assert_eq!(file.totals.credit_cents, 0);
        assert!(output.exists());
    }

    #[rstest]
    #[case::sync(StrategyType::Sync)]
    #[case::parallel(StrategyType::Async)]
    fn test_generate_and_verify_many_files(workdir: TempDir, #[case] strategy_type: StrategyType) {
        let inputs: Vec<PathBuf> = (0..4)
            .map(|i| {
                let path = workdir.path().join(format!("items{}.csv", i));
                std::fs::copy(fixture_path("scenario_a/items.csv"), &path).unwrap();
                path
            })
            .collect();
        let mut all = inputs.clone();
        all.insert(2, workdir.path().join("missing.csv"));

        let strategy = create_strategy(strategy_type, Some(BatchConfig::new(2, 2)));
        let generate = GenerateOperation {
            generator: generator(WriterConfig::default()),
            plan: OutputPlan::default(),
            now: now(),
        };
        let outcomes = strategy.process(&all, Arc::new(generate)).unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(matches!(
            outcomes[2].result,
            Err(X9Error::FileNotFound { .. })
        ));
        let outputs: Vec<PathBuf> = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| {
                assert_eq!(r.count, 25);
                r.output.clone().unwrap()
            })
            .collect();
        assert_eq!(outputs.len(), 4);

        let verified = strategy.process(&outputs, Arc::new(VerifyOperation)).unwrap();
        assert!(verified
            .iter()
            .all(|o| o.result.as_ref().map(|r| r.diagnostics.is_empty()).unwrap_or(false)));
    }
}
