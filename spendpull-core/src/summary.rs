//! Grouped summaries over a `TransactionFrame`.
//!
//! Each summary partitions the numeric amount column by one categorical
//! dimension and reports sum and count per group. A frame without the
//! needed columns yields an empty summary rather than an error, mirroring
//! how the pipelines only report on data they actually fetched.

use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::*;

use crate::api::fields;
use crate::awards::AwardCategory;
use crate::frame::{FrameError, TransactionFrame};

/// One group of a summary: grouping key, summed amount, record count.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub key: String,
    pub sum: f64,
    pub count: u32,
}

enum SortBy {
    KeyAscending,
    SumDescending,
}

impl TransactionFrame {
    /// Amounts per calendar month of the action date, ascending by month.
    /// Keys are `YYYY-MM`.
    pub fn by_month(&self) -> Result<Vec<SummaryRow>, FrameError> {
        if !self.has_columns(&[fields::ACTION_DATE, fields::TRANSACTION_AMOUNT]) {
            return Ok(Vec::new());
        }

        let dates = self.df().column(fields::ACTION_DATE)?.date()?;
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let months: Vec<Option<String>> = (0..dates.len())
            .map(|i| {
                dates.get(i).map(|days| {
                    let date = epoch + Duration::days(i64::from(days));
                    format!("{:04}-{:02}", date.year(), date.month())
                })
            })
            .collect();

        let keyed = DataFrame::new(vec![
            Column::new("Month".into(), months),
            self.df().column(fields::TRANSACTION_AMOUNT)?.clone(),
        ])?;
        grouped(keyed, "Month", SortBy::KeyAscending)
    }

    /// Amounts per award category, ascending by category label. Records
    /// whose award type code maps to no category are left out.
    pub fn by_category(&self) -> Result<Vec<SummaryRow>, FrameError> {
        if !self.has_columns(&[fields::AWARD_TYPE, fields::TRANSACTION_AMOUNT]) {
            return Ok(Vec::new());
        }

        let codes = self.df().column(fields::AWARD_TYPE)?.str()?;
        let categories: Vec<Option<String>> = codes
            .into_iter()
            .map(|c| {
                c.and_then(AwardCategory::from_code)
                    .map(|cat| cat.label().to_string())
            })
            .collect();

        let keyed = DataFrame::new(vec![
            Column::new("Award Category".into(), categories),
            self.df().column(fields::TRANSACTION_AMOUNT)?.clone(),
        ])?;
        grouped(keyed, "Award Category", SortBy::KeyAscending)
    }

    /// Amounts per awarding sub-agency, biggest spenders first.
    pub fn by_sub_agency(&self) -> Result<Vec<SummaryRow>, FrameError> {
        self.grouped_on(fields::AWARDING_SUB_AGENCY)
    }

    /// Amounts per raw award type code, biggest first.
    pub fn by_award_type(&self) -> Result<Vec<SummaryRow>, FrameError> {
        self.grouped_on(fields::AWARD_TYPE)
    }

    fn grouped_on(&self, key: &str) -> Result<Vec<SummaryRow>, FrameError> {
        if !self.has_columns(&[key, fields::TRANSACTION_AMOUNT]) {
            return Ok(Vec::new());
        }
        grouped(self.df().clone(), key, SortBy::SumDescending)
    }

    fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.df().column(n).is_ok())
    }
}

fn grouped(df: DataFrame, key: &str, sort: SortBy) -> Result<Vec<SummaryRow>, FrameError> {
    let aggregated = df
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg([
            col(fields::TRANSACTION_AMOUNT).sum().alias("sum"),
            col(fields::TRANSACTION_AMOUNT).count().alias("count"),
        ]);

    let out = match sort {
        SortBy::KeyAscending => aggregated.sort(
            [key],
            SortMultipleOptions::default().with_maintain_order(true),
        ),
        // ties broken by key so the ordering is deterministic
        SortBy::SumDescending => aggregated.sort(
            ["sum", key],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_maintain_order(true),
        ),
    }
    .collect()?;

    let keys = out.column(key)?.str()?;
    let sums = out.column("sum")?.f64()?;
    let counts = out.column("count")?.u32()?;

    let mut rows = Vec::with_capacity(out.height());
    for i in 0..out.height() {
        rows.push(SummaryRow {
            key: keys.get(i).unwrap_or_default().to_string(),
            sum: sums.get(i).unwrap_or(0.0),
            count: counts.get(i).unwrap_or(0),
        });
    }
    Ok(rows)
}
