use crate::error::SinkError;
use async_trait::async_trait;
use fieldreport_core::AccessTokenSource;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// A spreadsheet-like backend that accepts appended rows.
#[async_trait]
pub trait TabularBackend: Send + Sync {
    async fn append_row(&self, values: &[String]) -> Result<(), SinkError>;
}

/// Appends rows through the Google Sheets `values:append` API.
pub struct GoogleSheetsBackend {
    spreadsheet_id: String,
    range: String,
    tokens: Arc<dyn AccessTokenSource>,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl GoogleSheetsBackend {
    /// * `range` – A1 range the table lives in, e.g. `Sheet1!A:Z`.
    /// * `tokens` – Asked for a bearer token on every append.
    pub fn new(
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            tokens,
            api_base: "https://sheets.googleapis.com".to_string(),
            client,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn append_url(&self) -> Result<Url, SinkError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SinkError::Unreachable(format!("invalid Sheets base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SinkError::Unreachable("Sheets base URL cannot hold a path".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}:append", self.range));
        Ok(url)
    }
}

#[async_trait]
impl TabularBackend for GoogleSheetsBackend {
    async fn append_row(&self, values: &[String]) -> Result<(), SinkError> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| SinkError::Unreachable(format!("Sheets credentials: {e}")))?;
        let response = self
            .client
            .post(self.append_url()?)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [values] }))
            .send()
            .await
            .map_err(|e| SinkError::Unreachable(format!("Sheets append: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_default();
            return Err(SinkError::Rejected(format!("Sheets append HTTP {status}: {message}")));
        }

        debug!(cells = values.len(), "Row appended");
        Ok(())
    }
}
