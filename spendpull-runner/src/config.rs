//! Serializable pull configuration.
//!
//! A pull is described by a small TOML document: what to ask the API for
//! (`[query]`), how to walk it (`[fetch]`), and where the CSVs land
//! (`[output]`). Dates are carried as YYYY-MM-DD strings and validated when
//! the pipeline converts them with `query_range`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spendpull_core::ranges::DateRange;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullConfig {
    pub query: QuerySection,
    #[serde(default)]
    pub fetch: FetchSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySection {
    /// Toptier awarding agency name, exactly as USAspending spells it.
    pub agency: String,
    /// Inclusive window start, YYYY-MM-DD.
    pub start_date: String,
    /// Inclusive window end, YYYY-MM-DD.
    pub end_date: String,
    /// Object class filter, e.g. `["10"]` for personnel compensation.
    #[serde(default)]
    pub object_class: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub page_size: u32,
    pub page_delay_ms: u64,
    pub chunk_days: u32,
    pub chunk_delay_ms: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_delay_ms: 500,
            chunk_days: 7,
            chunk_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Root of the output tree; the run writes under `<dir>/<label>/`.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Run label, e.g. `fy2024`.
    pub label: String,
    /// Filename stem for this pull's CSVs.
    pub prefix: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl PullConfig {
    /// Load a pull config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse a pull config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse pull config TOML")
    }

    /// Award history pull over one federal fiscal year, weekly chunks.
    pub fn awards_fiscal_year(fy: i32, agency: impl Into<String>) -> Self {
        let window = fiscal_year_range(fy);
        Self {
            query: QuerySection {
                agency: agency.into(),
                start_date: window.start.to_string(),
                end_date: window.end.to_string(),
                object_class: None,
            },
            fetch: FetchSection::default(),
            output: OutputSection {
                dir: default_output_dir(),
                label: format!("fy{fy}"),
                prefix: "awards".into(),
            },
        }
    }

    /// Personnel-compensation pull over one federal fiscal year.
    pub fn personnel_fiscal_year(fy: i32, agency: impl Into<String>) -> Self {
        let mut config = Self::awards_fiscal_year(fy, agency);
        config.query.object_class = Some(vec!["10".into()]);
        config.output.prefix = "personnel".into();
        config
    }

    /// The configured window as a validated date range.
    pub fn query_range(&self) -> Result<DateRange> {
        let start = parse_date(&self.query.start_date)?;
        let end = parse_date(&self.query.end_date)?;
        DateRange::new(start, end).context("invalid query window")
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.fetch.page_delay_ms)
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.fetch.chunk_delay_ms)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

/// Federal fiscal year window: Oct 1 of the prior calendar year through Sep 30.
pub fn fiscal_year_range(fy: i32) -> DateRange {
    DateRange {
        start: NaiveDate::from_ymd_opt(fy - 1, 10, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(fy, 9, 30).unwrap(),
    }
}
