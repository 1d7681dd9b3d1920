//! The two pull pipelines.
//!
//! Both are strictly sequential: one outstanding request at a time, chunks
//! in order, fetch and write never overlap across chunks. A chunk whose
//! fetch fails keeps its partial records and the run moves on; a filesystem
//! failure aborts the run.

use std::path::PathBuf;
use std::thread;

use anyhow::Result;
use spendpull_core::api::{
    award_history_fields, fetch_transactions, personnel_fields, FetchProgress, Filters,
    TransactionRequest, TransactionSource,
};
use spendpull_core::frame::TransactionFrame;
use spendpull_core::ranges::{DateChunks, DateRange};
use spendpull_core::summary::SummaryRow;

use crate::config::PullConfig;
use crate::export::{write_frame, OutputLayout};

/// Per-chunk accounting for a chunked pull. Single-pass pulls report one
/// entry covering the whole window.
#[derive(Debug)]
pub struct ChunkStat {
    /// 1-based chunk number.
    pub index: usize,
    pub range: DateRange,
    pub records: usize,
    pub pages: u32,
    /// True when the chunk's fetch ended on an error; `records` then counts
    /// only the pages gathered before the failure.
    pub truncated: bool,
    pub file: Option<PathBuf>,
}

/// Everything a finished run reports on.
#[derive(Debug)]
pub struct PullReport {
    pub label: String,
    pub range: DateRange,
    pub total_records: usize,
    pub total_amount: f64,
    pub monthly: Vec<SummaryRow>,
    pub by_category: Vec<SummaryRow>,
    pub by_sub_agency: Vec<SummaryRow>,
    pub by_award_type: Vec<SummaryRow>,
    pub chunks: Vec<ChunkStat>,
    /// The merged (`_complete`) or single-pass file, when any data landed.
    pub output_file: Option<PathBuf>,
}

impl PullReport {
    /// True when every chunk's fetch ran to the end of its feed.
    pub fn all_chunks_complete(&self) -> bool {
        self.chunks.iter().all(|c| !c.truncated)
    }
}

/// Split the configured window into chunks, fetch each one, write a CSV per
/// chunk with data, then merge everything into a `_complete` CSV.
pub fn run_chunked_pull(
    source: &dyn TransactionSource,
    config: &PullConfig,
    progress: &dyn FetchProgress,
) -> Result<PullReport> {
    let range = config.query_range()?;
    let layout = OutputLayout::create(&config.output.dir, &config.output.label)?;
    let fields = award_history_fields();

    let chunks = DateChunks::new(range, config.fetch.chunk_days);
    let total_chunks = chunks.clone().count();
    println!(
        "Processing {} in {total_chunks} chunks of up to {} days",
        config.output.label, config.fetch.chunk_days
    );

    let mut stats = Vec::with_capacity(total_chunks);
    let mut frames = Vec::new();

    for (index, chunk) in chunks.enumerate() {
        let week = index + 1;
        println!();
        println!("Chunk {week}/{total_chunks}: {chunk}");

        let outcome = fetch_transactions(
            source,
            request_for(config, chunk, &fields),
            config.page_delay(),
            progress,
        );

        let mut stat = ChunkStat {
            index: week,
            range: chunk,
            records: outcome.records.len(),
            pages: outcome.pages,
            truncated: outcome.truncated,
            file: None,
        };

        if outcome.records.is_empty() {
            if outcome.truncated {
                println!("Failed to fetch data for this chunk");
            } else {
                println!("No transactions found for this chunk");
            }
        } else {
            let frame = TransactionFrame::from_records(&outcome.records, &fields)?;
            println!("Found {} transactions", frame.len());

            let path = layout.chunk_path(&config.output.prefix, week);
            write_frame(&path, &frame)?;
            println!("Saved to: {}", path.display());

            stat.file = Some(path);
            frames.push(frame);
        }
        stats.push(stat);

        if !config.chunk_delay().is_zero() {
            thread::sleep(config.chunk_delay());
        }
    }

    let combined = TransactionFrame::concat(&frames)?;
    let output_file = if combined.is_empty() {
        None
    } else {
        let path = layout.complete_path(&config.output.prefix, &config.output.label);
        write_frame(&path, &combined)?;
        println!();
        println!(
            "Complete dataset saved to: {} ({} transactions)",
            path.display(),
            combined.len()
        );
        Some(path)
    };

    build_report(config, range, &combined, stats, output_file)
}

/// Fetch the whole configured window in one pass and write a single CSV.
pub fn run_single_pull(
    source: &dyn TransactionSource,
    config: &PullConfig,
    progress: &dyn FetchProgress,
) -> Result<PullReport> {
    let range = config.query_range()?;
    let layout = OutputLayout::create(&config.output.dir, &config.output.label)?;
    let fields = personnel_fields();

    println!("Fetching {} data for {range}", config.output.prefix);

    let outcome = fetch_transactions(
        source,
        request_for(config, range, &fields),
        config.page_delay(),
        progress,
    );

    let mut stat = ChunkStat {
        index: 1,
        range,
        records: outcome.records.len(),
        pages: outcome.pages,
        truncated: outcome.truncated,
        file: None,
    };

    let frame = TransactionFrame::from_records(&outcome.records, &fields)?;
    let output_file = if frame.is_empty() {
        println!("No data found");
        None
    } else {
        let path = layout.single_path(&config.output.prefix, &config.output.label);
        write_frame(&path, &frame)?;
        println!();
        println!("Data saved to: {} ({} records)", path.display(), frame.len());
        stat.file = Some(path.clone());
        Some(path)
    };

    build_report(config, range, &frame, vec![stat], output_file)
}

fn request_for(config: &PullConfig, window: DateRange, fields: &[String]) -> TransactionRequest {
    let mut filters = Filters::for_range(&config.query.agency, window);
    if let Some(codes) = &config.query.object_class {
        filters = filters.with_object_class(codes.clone());
    }
    TransactionRequest::new(filters, fields.to_vec()).with_limit(config.fetch.page_size)
}

fn build_report(
    config: &PullConfig,
    range: DateRange,
    combined: &TransactionFrame,
    chunks: Vec<ChunkStat>,
    output_file: Option<PathBuf>,
) -> Result<PullReport> {
    Ok(PullReport {
        label: config.output.label.clone(),
        range,
        total_records: combined.len(),
        total_amount: combined.total_amount(),
        monthly: combined.by_month()?,
        by_category: combined.by_category()?,
        by_sub_agency: combined.by_sub_agency()?,
        by_award_type: combined.by_award_type()?,
        chunks,
        output_file,
    })
}
