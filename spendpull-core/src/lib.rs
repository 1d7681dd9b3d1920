//! spendpull core — USAspending transaction pulls as a library.
//!
//! - Date range chunking for fiscal-year windows
//! - Transaction search payload types and blocking HTTP client
//! - Pagination loop with partial-result error handling
//! - DataFrame construction and grouped summaries over fetched records

pub mod api;
pub mod awards;
pub mod frame;
pub mod ranges;
pub mod summary;
