//! Pagination loop for the transaction search.
//!
//! Pages are requested from 1 upward until the feed ends. A page shorter
//! than the requested limit is taken as the final page; a server that pages
//! inconsistently will therefore end the scan early. There is no page cap
//! and no retry.

use std::thread;
use std::time::Duration;

use super::{ApiError, Record, TransactionRequest, TransactionSource};

/// Result of walking one filtered query to completion.
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<Record>,
    /// Pages that returned at least one record.
    pub pages: u32,
    /// True when an error ended the loop before the feed did; `records`
    /// then holds only what was accumulated up to the failing page.
    pub truncated: bool,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        !self.truncated
    }
}

/// Progress callbacks for a single paginated fetch.
pub trait FetchProgress {
    /// Called after each page that returned records.
    fn on_page(&self, page: u32, page_records: usize, total_records: usize);

    /// Called when a page request fails and the loop stops.
    fn on_error(&self, page: u32, error: &ApiError);

    /// Called once the loop has finished, however it ended.
    fn on_complete(&self, total_records: usize, pages: u32);
}

/// Progress reporter that prints to stdout every thousand records, so a
/// multi-thousand-page pull doesn't flood the console.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_page(&self, _page: u32, _page_records: usize, total_records: usize) {
        if total_records > 0 && total_records % 1000 == 0 {
            println!("Fetched {total_records} total records...");
        }
    }

    fn on_error(&self, page: u32, error: &ApiError) {
        println!("Error fetching page {page}: {error}");
    }

    fn on_complete(&self, total_records: usize, pages: u32) {
        println!("Final count: {total_records} records ({pages} pages)");
    }
}

/// No-op progress reporter.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_page(&self, _page: u32, _page_records: usize, _total_records: usize) {}
    fn on_error(&self, _page: u32, _error: &ApiError) {}
    fn on_complete(&self, _total_records: usize, _pages: u32) {}
}

/// Fetch every page for one filtered query, accumulating the results.
///
/// Termination checks per page, in order:
/// 1. request error — stop, keep the partial result (`truncated` is set);
/// 2. empty result list — normal end of data;
/// 3. short page — append it, it was the last page;
/// 4. full page — append, sleep `page_delay`, request the next page.
pub fn fetch_transactions(
    source: &dyn TransactionSource,
    mut request: TransactionRequest,
    page_delay: Duration,
    progress: &dyn FetchProgress,
) -> FetchOutcome {
    let limit = request.limit as usize;
    let mut records: Vec<Record> = Vec::new();
    let mut pages = 0u32;
    let mut truncated = false;

    request.page = 1;
    loop {
        let page = match source.fetch_page(&request) {
            Ok(page) => page,
            Err(e) => {
                progress.on_error(request.page, &e);
                truncated = true;
                break;
            }
        };

        if page.results.is_empty() {
            break;
        }

        pages += 1;
        let page_records = page.results.len();
        records.extend(page.results);
        progress.on_page(request.page, page_records, records.len());

        if page_records < limit {
            break;
        }

        request.page += 1;
        if !page_delay.is_zero() {
            thread::sleep(page_delay);
        }
    }

    progress.on_complete(records.len(), pages);
    FetchOutcome {
        records,
        pages,
        truncated,
    }
}
