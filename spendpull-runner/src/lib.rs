//! spendpull runner — pull orchestration on top of spendpull-core.
//!
//! - TOML pull configuration
//! - Chunked (weekly) and single-pass pipelines
//! - CSV output layout and run reports

pub mod config;
pub mod export;
pub mod pipeline;

pub use config::{fiscal_year_range, PullConfig};
pub use export::OutputLayout;
pub use pipeline::{run_chunked_pull, run_single_pull, ChunkStat, PullReport};
