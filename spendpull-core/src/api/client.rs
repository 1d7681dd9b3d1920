//! Blocking HTTP client for the USAspending transaction search.
//!
//! One POST per page, no retry: a failed page permanently ends that pull's
//! pagination, and the caller keeps whatever was accumulated.

use std::time::Duration;

use super::{ApiError, TransactionPage, TransactionRequest, TransactionSource};

/// Production endpoint for the transaction search.
pub const API_ENDPOINT: &str = "https://api.usaspending.gov/api/v2/search/spending_by_transaction/";

/// Client for `/api/v2/search/spending_by_transaction/`.
pub struct UsaSpendingClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl UsaSpendingClient {
    pub fn new() -> Self {
        Self::with_endpoint(API_ENDPOINT)
    }

    /// Point the client at a different endpoint (local stub, mirror).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("spendpull/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for UsaSpendingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionSource for UsaSpendingClient {
    fn fetch_page(&self, request: &TransactionRequest) -> Result<TransactionPage, ApiError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<TransactionPage>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
