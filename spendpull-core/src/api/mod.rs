//! USAspending transaction search API: payload types, the transport trait,
//! and structured errors.
//!
//! The `TransactionSource` trait abstracts the HTTP layer so the pagination
//! loop and the pipelines can run against a scripted mock in tests.

pub mod client;
pub mod paginate;

pub use client::UsaSpendingClient;
pub use paginate::{
    fetch_transactions, FetchOutcome, FetchProgress, SilentProgress, StdoutProgress,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::awards::AWARD_TYPE_CODES;
use crate::ranges::DateRange;

/// Default page size for the transaction search.
pub const PAGE_SIZE: u32 = 100;

/// One raw transaction record, keyed by the display names the API echoes
/// back for the requested fields. Kept untyped because the two pulls request
/// different field sets and the upstream adds bookkeeping keys of its own.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Display names of the transaction search fields this crate requests.
pub mod fields {
    pub const AWARD_ID: &str = "Award ID";
    pub const MOD: &str = "Mod";
    pub const RECIPIENT_NAME: &str = "Recipient Name";
    pub const ACTION_DATE: &str = "Action Date";
    pub const TRANSACTION_AMOUNT: &str = "Transaction Amount";
    pub const AWARDING_AGENCY: &str = "Awarding Agency";
    pub const AWARDING_SUB_AGENCY: &str = "Awarding Sub Agency";
    pub const AWARD_TYPE: &str = "Award Type";
}

/// Field list for the award history pull.
pub fn award_history_fields() -> Vec<String> {
    [
        fields::AWARD_ID,
        fields::MOD,
        fields::RECIPIENT_NAME,
        fields::ACTION_DATE,
        fields::TRANSACTION_AMOUNT,
        fields::AWARDING_AGENCY,
        fields::AWARDING_SUB_AGENCY,
        fields::AWARD_TYPE,
    ]
    .map(String::from)
    .to_vec()
}

/// Field list for the personnel spending pull (no modification number).
pub fn personnel_fields() -> Vec<String> {
    [
        fields::ACTION_DATE,
        fields::TRANSACTION_AMOUNT,
        fields::AWARD_ID,
        fields::RECIPIENT_NAME,
        fields::AWARDING_AGENCY,
        fields::AWARDING_SUB_AGENCY,
        fields::AWARD_TYPE,
    ]
    .map(String::from)
    .to_vec()
}

/// One `{start_date, end_date}` window, serialized as YYYY-MM-DD.
#[derive(Debug, Clone, Serialize)]
pub struct TimePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<DateRange> for TimePeriod {
    fn from(range: DateRange) -> Self {
        Self {
            start_date: range.start,
            end_date: range.end,
        }
    }
}

/// Agency filter entry. The transaction pull always filters on a toptier
/// awarding agency by name.
#[derive(Debug, Clone, Serialize)]
pub struct AgencyFilter {
    #[serde(rename = "type")]
    pub agency_type: String,
    pub tier: String,
    pub name: String,
}

impl AgencyFilter {
    pub fn awarding_toptier(name: impl Into<String>) -> Self {
        Self {
            agency_type: "awarding".into(),
            tier: "toptier".into(),
            name: name.into(),
        }
    }
}

/// The `filters` object of a transaction search payload.
#[derive(Debug, Clone, Serialize)]
pub struct Filters {
    pub award_type_codes: Vec<String>,
    pub time_period: Vec<TimePeriod>,
    pub agencies: Vec<AgencyFilter>,
    /// Object class codes, e.g. `["10"]` to isolate personnel compensation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<Vec<String>>,
}

impl Filters {
    /// All award types for one agency over one window.
    pub fn for_range(agency: impl Into<String>, range: DateRange) -> Self {
        Self {
            award_type_codes: AWARD_TYPE_CODES.map(String::from).to_vec(),
            time_period: vec![range.into()],
            agencies: vec![AgencyFilter::awarding_toptier(agency)],
            object_class: None,
        }
    }

    pub fn with_object_class(mut self, codes: Vec<String>) -> Self {
        self.object_class = Some(codes);
        self
    }
}

/// Full request payload for `/api/v2/search/spending_by_transaction/`.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub filters: Filters,
    pub fields: Vec<String>,
    pub page: u32,
    pub limit: u32,
    pub sort: String,
    pub order: String,
}

impl TransactionRequest {
    pub fn new(filters: Filters, fields: Vec<String>) -> Self {
        Self {
            filters,
            fields,
            page: 1,
            limit: PAGE_SIZE,
            sort: fields::ACTION_DATE.into(),
            order: "desc".into(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// One page of the transaction search response. Only `results` drives the
/// pagination loop; a missing list is the normal end-of-data signal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub results: Vec<Record>,
    #[serde(default)]
    pub page_metadata: Option<PageMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub page: u32,
    #[serde(default, rename = "hasNext")]
    pub has_next: bool,
}

/// Errors from one page request. All of them end the page loop; none of
/// them are retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

/// Transport seam for the transaction search.
pub trait TransactionSource {
    /// Fetch a single page for the given payload.
    fn fetch_page(&self, request: &TransactionRequest) -> Result<TransactionPage, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 10, 7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn payload_shape_matches_api() {
        let request = TransactionRequest::new(
            Filters::for_range("Department of the Interior", sample_range()),
            award_history_fields(),
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["filters"]["time_period"][0]["start_date"], "2023-10-01");
        assert_eq!(value["filters"]["time_period"][0]["end_date"], "2023-10-07");
        assert_eq!(value["filters"]["agencies"][0]["type"], "awarding");
        assert_eq!(value["filters"]["agencies"][0]["tier"], "toptier");
        assert_eq!(
            value["filters"]["agencies"][0]["name"],
            "Department of the Interior"
        );
        assert_eq!(value["filters"]["award_type_codes"].as_array().unwrap().len(), 14);
        assert_eq!(value["page"], 1);
        assert_eq!(value["limit"], 100);
        assert_eq!(value["sort"], "Action Date");
        assert_eq!(value["order"], "desc");
        // no object_class key unless one was set
        assert!(value["filters"].get("object_class").is_none());
    }

    #[test]
    fn object_class_filter_serializes_when_set() {
        let filters = Filters::for_range("Department of the Interior", sample_range())
            .with_object_class(vec!["10".into()]);
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value["object_class"][0], "10");
    }

    #[test]
    fn page_with_missing_results_is_empty() {
        let page: TransactionPage = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
        assert!(page.page_metadata.is_none());
    }

    #[test]
    fn page_metadata_parses() {
        let page: TransactionPage = serde_json::from_str(
            r#"{"results": [{"Award ID": "ABC-1"}], "page_metadata": {"page": 2, "hasNext": true}}"#,
        )
        .unwrap();
        assert_eq!(page.results.len(), 1);
        let meta = page.page_metadata.unwrap();
        assert_eq!(meta.page, 2);
        assert!(meta.has_next);
    }

    #[test]
    fn field_lists_differ_only_by_mod() {
        let awards = award_history_fields();
        let personnel = personnel_fields();
        assert_eq!(awards.len(), 8);
        assert_eq!(personnel.len(), 7);
        assert!(awards.contains(&fields::MOD.to_string()));
        assert!(!personnel.contains(&fields::MOD.to_string()));
    }
}
