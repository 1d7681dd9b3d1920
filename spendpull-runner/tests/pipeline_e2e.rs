//! End-to-end pipeline tests against a scripted transaction source.
//!
//! These drive the full split → fetch → frame → write flow into a temp
//! directory and check both the files on disk and the returned report.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;
use spendpull_core::api::{
    ApiError, Record, SilentProgress, TransactionPage, TransactionRequest, TransactionSource,
};
use spendpull_runner::{run_chunked_pull, run_single_pull, PullConfig};

// ── Scripted source ──────────────────────────────────────────────────

/// Returns queued pages per time-period window and records every request.
struct ScriptedWindows {
    pages: RefCell<HashMap<NaiveDate, Vec<Result<TransactionPage, ApiError>>>>,
    seen: RefCell<Vec<SeenRequest>>,
}

#[derive(Debug, Clone)]
struct SeenRequest {
    window_start: NaiveDate,
    page: u32,
    object_class: Option<Vec<String>>,
}

impl ScriptedWindows {
    fn new(pages: HashMap<NaiveDate, Vec<Result<TransactionPage, ApiError>>>) -> Self {
        Self {
            pages: RefCell::new(pages),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<SeenRequest> {
        self.seen.borrow().clone()
    }
}

impl TransactionSource for ScriptedWindows {
    fn fetch_page(&self, request: &TransactionRequest) -> Result<TransactionPage, ApiError> {
        let window_start = request.filters.time_period[0].start_date;
        self.seen.borrow_mut().push(SeenRequest {
            window_start,
            page: request.page,
            object_class: request.filters.object_class.clone(),
        });

        let mut pages = self.pages.borrow_mut();
        let queue = pages
            .get_mut(&window_start)
            .unwrap_or_else(|| panic!("request for unscripted window {window_start}"));
        if queue.is_empty() {
            return Ok(TransactionPage::default());
        }
        queue.remove(0)
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

fn tx(award_id: &str, date: &str, amount: f64, sub_agency: &str, award_type: &str) -> Record {
    let mut rec = Record::new();
    rec.insert("Award ID".into(), json!(award_id));
    rec.insert("Mod".into(), json!("0"));
    rec.insert("Recipient Name".into(), json!("ACME FACILITIES LLC"));
    rec.insert("Action Date".into(), json!(date));
    rec.insert("Transaction Amount".into(), json!(amount));
    rec.insert(
        "Awarding Agency".into(),
        json!("Department of the Interior"),
    );
    rec.insert("Awarding Sub Agency".into(), json!(sub_agency));
    rec.insert("Award Type".into(), json!(award_type));
    rec
}

fn page(records: Vec<Record>) -> Result<TransactionPage, ApiError> {
    Ok(TransactionPage {
        results: records,
        page_metadata: None,
    })
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Two-week awards config with delays zeroed and output under `dir`.
fn awards_config(dir: &std::path::Path) -> PullConfig {
    let mut config = PullConfig::awards_fiscal_year(2024, "Department of the Interior");
    config.query.start_date = "2023-10-01".into();
    config.query.end_date = "2023-10-14".into();
    config.fetch.page_delay_ms = 0;
    config.fetch.chunk_delay_ms = 0;
    config.output.dir = dir.to_path_buf();
    config
}

// ── Chunked pull ─────────────────────────────────────────────────────

#[test]
fn chunked_pull_writes_chunk_and_complete_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = ScriptedWindows::new(HashMap::from([
        (
            d(2023, 10, 1),
            vec![page(vec![
                tx("AWD-1", "2023-10-02", 100.0, "Bureau of Land Management", "A"),
                tx("AWD-2", "2023-10-05", 50.0, "National Park Service", "02"),
            ])],
        ),
        (
            d(2023, 10, 8),
            vec![page(vec![tx(
                "AWD-3",
                "2023-10-10",
                25.0,
                "Bureau of Land Management",
                "A",
            )])],
        ),
    ]));

    let config = awards_config(dir.path());
    let report = run_chunked_pull(&source, &config, &SilentProgress).unwrap();

    // exactly the two weekly windows were queried
    let windows: Vec<NaiveDate> = source.seen().iter().map(|r| r.window_start).collect();
    assert_eq!(windows, vec![d(2023, 10, 1), d(2023, 10, 8)]);

    assert_eq!(report.total_records, 3);
    assert!((report.total_amount - 175.0).abs() < 1e-9);
    assert!(report.all_chunks_complete());
    assert_eq!(report.chunks.len(), 2);
    assert_eq!(report.chunks[0].records, 2);
    assert_eq!(report.chunks[1].records, 1);

    let run_dir = dir.path().join("fy2024");
    assert!(run_dir.join("awards_week_1.csv").is_file());
    assert!(run_dir.join("awards_week_2.csv").is_file());
    let complete = run_dir.join("awards_fy2024_complete.csv");
    assert_eq!(report.output_file.as_deref(), Some(complete.as_path()));

    let mut reader = csv::Reader::from_path(&complete).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 3);

    // summaries come from the merged frame
    assert_eq!(report.monthly.len(), 1);
    assert_eq!(report.monthly[0].key, "2023-10");
    assert_eq!(report.monthly[0].count, 3);

    assert_eq!(report.by_category.len(), 2);
    assert_eq!(report.by_category[0].key, "Contracts");
    assert_eq!(report.by_category[0].sum, 125.0);
    assert_eq!(report.by_category[0].count, 2);
    assert_eq!(report.by_category[1].key, "Grants");
    assert_eq!(report.by_category[1].sum, 50.0);
}

#[test]
fn failed_chunk_keeps_partial_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = ScriptedWindows::new(HashMap::from([
        (
            d(2023, 10, 1),
            vec![page(vec![tx(
                "AWD-1",
                "2023-10-02",
                100.0,
                "Bureau of Land Management",
                "A",
            )])],
        ),
        (
            d(2023, 10, 8),
            vec![Err(ApiError::Status {
                status: 500,
                body: "upstream timeout".into(),
            })],
        ),
    ]));

    let config = awards_config(dir.path());
    let report = run_chunked_pull(&source, &config, &SilentProgress).unwrap();

    assert!(!report.all_chunks_complete());
    assert!(report.chunks[1].truncated);
    assert_eq!(report.chunks[1].records, 0);
    assert!(report.chunks[1].file.is_none());

    // the healthy chunk still landed, alone, in the complete file
    assert_eq!(report.total_records, 1);
    let run_dir = dir.path().join("fy2024");
    assert!(run_dir.join("awards_week_1.csv").is_file());
    assert!(!run_dir.join("awards_week_2.csv").exists());
    assert!(run_dir.join("awards_fy2024_complete.csv").is_file());
}

#[test]
fn empty_run_writes_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = ScriptedWindows::new(HashMap::from([
        (d(2023, 10, 1), vec![]),
        (d(2023, 10, 8), vec![]),
    ]));

    let config = awards_config(dir.path());
    let report = run_chunked_pull(&source, &config, &SilentProgress).unwrap();

    assert_eq!(report.total_records, 0);
    assert!(report.output_file.is_none());
    assert!(report.monthly.is_empty());
    assert!(report.by_category.is_empty());

    let run_dir = dir.path().join("fy2024");
    assert!(run_dir.is_dir());
    assert!(!run_dir.join("awards_week_1.csv").exists());
    assert!(!run_dir.join("awards_fy2024_complete.csv").exists());
}

// ── Single-pass pull ─────────────────────────────────────────────────

#[test]
fn personnel_pull_is_one_pass_with_object_class() {
    let dir = tempfile::tempdir().unwrap();
    let source = ScriptedWindows::new(HashMap::from([(
        d(2023, 10, 1),
        vec![page(vec![
            tx("AWD-1", "2023-10-02", 500.0, "Bureau of Land Management", "A"),
            tx("AWD-2", "2023-11-05", 150.0, "National Park Service", "A"),
            tx("AWD-3", "2023-11-06", 150.0, "National Park Service", "02"),
        ])],
    )]));

    let mut config = PullConfig::personnel_fiscal_year(2024, "Department of the Interior");
    config.query.start_date = "2023-10-01".into();
    config.query.end_date = "2023-10-14".into();
    config.fetch.page_delay_ms = 0;
    config.fetch.chunk_delay_ms = 0;
    config.output.dir = dir.path().to_path_buf();

    let report = run_single_pull(&source, &config, &SilentProgress).unwrap();

    // exactly one request window, carrying the personnel object class
    let seen = source.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].window_start, d(2023, 10, 1));
    assert_eq!(seen[0].page, 1);
    assert_eq!(seen[0].object_class, Some(vec!["10".to_string()]));

    assert_eq!(report.total_records, 3);
    assert!((report.total_amount - 800.0).abs() < 1e-9);

    let file = dir.path().join("fy2024").join("personnel_fy2024.csv");
    assert_eq!(report.output_file.as_deref(), Some(file.as_path()));

    // personnel field set has no Mod column: 7 requested + formatted
    let mut reader = csv::Reader::from_path(&file).unwrap();
    assert_eq!(reader.headers().unwrap().len(), 8);

    // sub-agency summary is descending by amount
    assert_eq!(report.by_sub_agency[0].key, "Bureau of Land Management");
    assert_eq!(report.by_sub_agency[0].sum, 500.0);
    assert_eq!(report.by_sub_agency[1].key, "National Park Service");
    assert_eq!(report.by_sub_agency[1].sum, 300.0);
    assert_eq!(report.by_sub_agency[1].count, 2);

    // award type summary groups the raw codes
    assert_eq!(report.by_award_type[0].key, "A");
    assert_eq!(report.by_award_type[0].sum, 650.0);
}
