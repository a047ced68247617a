use fieldreport_core::FieldreportError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Failure of one Bot API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No usable answer: connect error, timeout, or a non-JSON body.
    #[error("Telegram transport error: {0}")]
    Transport(String),

    /// Telegram answered `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),
}

impl From<ApiError> for FieldreportError {
    fn from(err: ApiError) -> Self {
        FieldreportError::Channel(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// Bot API client shared by the channel and the notifier.
#[derive(Clone)]
pub struct BotApi {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl BotApi {
    /// Client for the bot identified by `bot_token`.
    pub fn new(bot_token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            client,
        }
    }

    /// Point at another Bot API server (local server, test double).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// POST `payload` as JSON to `method` and decode `result`.
    pub async fn call<P, T>(&self, method: &str, payload: &P) -> Result<T, ApiError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.call_with_timeout(method, payload, None).await
    }

    /// Like [`call`](Self::call), overriding the client timeout. Long polls
    /// need a longer budget than ordinary calls.
    pub async fn call_with_timeout<P, T>(
        &self,
        method: &str,
        payload: &P,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{method}: {e}")))?;
        let status = response.status();

        let body: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("{method}: HTTP {status}: {e}")))?;

        if !body.ok {
            return Err(ApiError::Api(format!(
                "{method}: {}",
                body.description.unwrap_or_else(|| status.to_string())
            )));
        }
        body.result
            .ok_or_else(|| ApiError::Api(format!("{method}: response without result")))
    }
}
