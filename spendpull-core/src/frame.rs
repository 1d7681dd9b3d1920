//! Tabular view of fetched transaction records.
//!
//! `TransactionFrame` turns the raw keyed records from the API into a polars
//! DataFrame: one row per record, one column per requested field (plus any
//! extra keys the upstream tacks on), with `Action Date` typed as a date,
//! `Transaction Amount` typed as a float, and a derived display column
//! holding the currency-formatted amount. The float column is the canonical
//! amount in the CSV output; the formatted string is a convenience.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

use crate::api::{fields, Record};

/// Derived display column, e.g. `$1,234.56`.
pub const FORMATTED_AMOUNT: &str = "Formatted Amount";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// One fetch's records as a table.
#[derive(Debug, Clone)]
pub struct TransactionFrame {
    df: DataFrame,
}

impl TransactionFrame {
    /// Build a frame from raw records.
    ///
    /// Column order is the requested field order, then any extra record keys
    /// in first-seen order. Zero records produce an empty frame with no
    /// derived columns.
    pub fn from_records(records: &[Record], fields_requested: &[String]) -> Result<Self, FrameError> {
        if records.is_empty() {
            return Ok(Self {
                df: DataFrame::empty(),
            });
        }

        let mut names: Vec<String> = fields_requested.to_vec();
        let mut seen: HashSet<String> = names.iter().cloned().collect();
        for rec in records {
            for key in rec.keys() {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }

        let mut columns: Vec<Column> = Vec::with_capacity(names.len() + 1);
        let mut amounts: Option<Vec<Option<f64>>> = None;

        for name in &names {
            match name.as_str() {
                fields::ACTION_DATE => columns.push(date_column(name, records)?),
                fields::TRANSACTION_AMOUNT => {
                    let values: Vec<Option<f64>> = records
                        .iter()
                        .map(|r| r.get(name).and_then(amount_value))
                        .collect();
                    columns.push(Column::new(name.as_str().into(), &values));
                    amounts = Some(values);
                }
                _ => columns.push(utf8_column(name, records)),
            }
        }

        if let Some(amounts) = amounts {
            let formatted: Vec<String> = amounts
                .iter()
                .map(|a| a.map(format_currency).unwrap_or_else(|| "$0.00".into()))
                .collect();
            columns.push(Column::new(FORMATTED_AMOUNT.into(), formatted));
        }

        Ok(Self {
            df: DataFrame::new(columns)?,
        })
    }

    /// Stack per-chunk frames into one table.
    ///
    /// The chunks of a run share one requested-field set, so a column
    /// mismatch means the upstream changed shape mid-run and is surfaced
    /// as an error rather than papered over.
    pub fn concat(frames: &[TransactionFrame]) -> Result<Self, FrameError> {
        let mut parts = frames.iter().filter(|f| !f.is_empty());
        let Some(first) = parts.next() else {
            return Ok(Self {
                df: DataFrame::empty(),
            });
        };
        let mut df = first.df.clone();
        for frame in parts {
            df.vstack_mut(&frame.df)?;
        }
        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// Row count.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Sum of the numeric amount column; 0.0 when the column is absent.
    pub fn total_amount(&self) -> f64 {
        self.df
            .column(fields::TRANSACTION_AMOUNT)
            .ok()
            .and_then(|c| c.f64().ok())
            .and_then(|ca| ca.sum())
            .unwrap_or(0.0)
    }

    /// Write the frame as CSV: header row, no index column, dates as
    /// YYYY-MM-DD, amounts as raw floats. Overwrites an existing file.
    pub fn write_csv(&self, path: &Path) -> Result<(), FrameError> {
        let mut file = File::create(path).map_err(|e| FrameError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut self.df.clone())?;
        Ok(())
    }
}

/// Format an amount the way the reports print money: `$1,234.56`,
/// sign ahead of the grouped digits (`$-1,234.56`).
pub fn format_currency(amount: f64) -> String {
    let raw = format!("{amount:.2}");
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac) = digits.split_once('.').unwrap_or((digits, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${sign}{grouped}.{frac}")
}

fn utf8_column(name: &str, records: &[Record]) -> Column {
    let values: Vec<Option<String>> = records
        .iter()
        .map(|r| r.get(name).and_then(string_value))
        .collect();
    Column::new(name.into(), values)
}

fn date_column(name: &str, records: &[Record]) -> Result<Column, FrameError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let days: Vec<Option<i32>> = records
        .iter()
        .map(|r| {
            r.get(name)
                .and_then(date_value)
                .map(|d| (d - epoch).num_days() as i32)
        })
        .collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

fn string_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn amount_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn date_value(value: &serde_json::Value) -> Option<NaiveDate> {
    // action dates sometimes carry a time suffix; the date is the first
    // ten characters either way
    let s = value.as_str()?;
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}
