use crate::error::RelayError;
use async_trait::async_trait;
use fieldreport_core::TransportFileRef;
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::debug;

/// Bytes fetched from the chat transport.
#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub bytes: Vec<u8>,
    /// MIME type reported by the transport's file server.
    pub mime_type: Option<String>,
    /// The transport's storage path (e.g. `photos/file_12.jpg`).
    pub source_path: Option<String>,
}

/// Fetches transport-hosted files by reference.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Download `file`, failing with [`RelayError::SourceFileTooLarge`] once
    /// more than `max_bytes` would be read.
    async fn fetch(&self, file: &TransportFileRef, max_bytes: u64) -> Result<FetchedFile, RelayError>;
}

// ── Telegram API response types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    file_path: Option<String>,
}

// ── Implementation ──────────────────────────────────────────────────────────

/// Downloads files through the Telegram Bot API (`getFile` + file endpoint).
pub struct TelegramFileSource {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramFileSource {
    /// Create a source for the bot identified by `bot_token`.
    pub fn new(bot_token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_base: "https://api.telegram.org".to_string(),
            client,
        }
    }

    /// Point at a different API host (local Bot API server, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_base, self.bot_token, file_path)
    }

    async fn lookup(&self, file_id: &str) -> Result<TelegramFile, RelayError> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| RelayError::SourceFetchFailed(format!("getFile request failed: {e}")))?;

        let body: TelegramResponse<TelegramFile> = response
            .json()
            .await
            .map_err(|e| RelayError::SourceFetchFailed(format!("getFile parse error: {e}")))?;

        if !body.ok {
            return Err(RelayError::SourceFetchFailed(format!(
                "getFile failed: {}",
                body.description.unwrap_or_default()
            )));
        }
        body.result
            .ok_or_else(|| RelayError::SourceFetchFailed("getFile returned no result".into()))
    }
}

#[async_trait]
impl FileSource for TelegramFileSource {
    async fn fetch(&self, file: &TransportFileRef, max_bytes: u64) -> Result<FetchedFile, RelayError> {
        let info = self.lookup(&file.file_id).await?;
        if let Some(size) = info.file_size {
            if size > max_bytes {
                return Err(RelayError::SourceFileTooLarge { size, limit: max_bytes });
            }
        }
        let path = info
            .file_path
            .ok_or_else(|| RelayError::SourceFetchFailed("file has no download path".into()))?;

        let response = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| RelayError::SourceFetchFailed(format!("download failed: {e}")))?;
        if !response.status().is_success() {
            return Err(RelayError::SourceFetchFailed(format!(
                "download returned HTTP {}",
                response.status()
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| *v != "application/octet-stream")
            .map(String::from);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| RelayError::SourceFetchFailed(format!("download interrupted: {e}")))?;
            let size = (bytes.len() + chunk.len()) as u64;
            if size > max_bytes {
                return Err(RelayError::SourceFileTooLarge { size, limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(file_id = %file.file_id, path = %path, bytes = bytes.len(), "Fetched transport file");
        Ok(FetchedFile {
            bytes,
            mime_type,
            source_path: Some(path),
        })
    }
}
