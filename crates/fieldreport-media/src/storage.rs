use crate::error::RelayError;
use async_trait::async_trait;
use fieldreport_core::AccessTokenSource;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;

/// A backend that keeps relayed files and serves them publicly.
#[async_trait]
pub trait DurableStorage: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;
    /// Store `bytes` under `name`, returning the backend's object id.
    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, RelayError>;
    /// Grant anonymous read access to the object.
    async fn make_public(&self, object_id: &str) -> Result<(), RelayError>;
    /// The object's public URL as the backend reports it.
    async fn public_url(&self, object_id: &str) -> Result<String, RelayError>;
}

fn unavailable(context: &str, err: impl std::fmt::Display) -> RelayError {
    RelayError::RelayUnavailable(format!("{context}: {err}"))
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, RelayError> {
    let mut url = Url::parse(base).map_err(|e| unavailable("invalid storage base URL", e))?;
    url.path_segments_mut()
        .map_err(|()| RelayError::RelayUnavailable("storage base URL cannot hold a path".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn bearer(tokens: &dyn AccessTokenSource) -> Result<String, RelayError> {
    tokens
        .access_token()
        .await
        .map_err(|e| unavailable("storage credentials", e))
}

async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RelayError::RelayUnavailable(format!(
        "{context} returned HTTP {status}: {body}"
    )))
}

// ── Google Cloud Storage ────────────────────────────────────────────────────

/// Google Cloud Storage bucket; objects are made public through an
/// `allUsers:READER` ACL entry.
pub struct GcsStorage {
    bucket: String,
    tokens: Arc<dyn AccessTokenSource>,
    api_base: String,
    public_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GcsObject {
    name: String,
}

impl GcsStorage {
    /// Store into `bucket`, authorizing each request with a token from `tokens`.
    pub fn new(bucket: impl Into<String>, tokens: Arc<dyn AccessTokenSource>, client: reqwest::Client) -> Self {
        Self {
            bucket: bucket.into(),
            tokens,
            api_base: "https://storage.googleapis.com".to_string(),
            public_base: "https://storage.googleapis.com".to_string(),
            client,
        }
    }

    /// Point the JSON API and the public host elsewhere (emulators, tests).
    pub fn with_endpoints(mut self, api_base: impl Into<String>, public_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.public_base = public_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl DurableStorage for GcsStorage {
    fn name(&self) -> &str {
        "gcs"
    }

    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, RelayError> {
        let url = endpoint(&self.api_base, &["upload", "storage", "v1", "b", self.bucket.as_str(), "o"])?;
        let token = bearer(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", name)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| unavailable("GCS upload", e))?;
        let object: GcsObject = check(response, "GCS upload")
            .await?
            .json()
            .await
            .map_err(|e| unavailable("GCS upload response", e))?;
        Ok(object.name)
    }

    async fn make_public(&self, object_id: &str) -> Result<(), RelayError> {
        let url = endpoint(
            &self.api_base,
            &["storage", "v1", "b", self.bucket.as_str(), "o", object_id, "acl"],
        )?;
        let token = bearer(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({"entity": "allUsers", "role": "READER"}))
            .send()
            .await
            .map_err(|e| unavailable("GCS ACL update", e))?;
        check(response, "GCS ACL update").await?;
        Ok(())
    }

    async fn public_url(&self, object_id: &str) -> Result<String, RelayError> {
        let url = endpoint(&self.public_base, &[self.bucket.as_str(), object_id])?;
        Ok(url.to_string())
    }
}

// ── Google Drive ────────────────────────────────────────────────────────────

/// Part separator of Drive multipart uploads.
const UPLOAD_BOUNDARY: &str = "fieldreport_upload_7f3a91c2";

/// `multipart/related` body: JSON metadata, then the file bytes.
fn related_body(metadata: &str, bytes: &[u8], content_type: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{UPLOAD_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{UPLOAD_BOUNDARY}\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{UPLOAD_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Google Drive folder; files are shared as anyone-with-link readers.
///
/// Drive reports viewer links (`/file/d/<id>/view`); the relay normalizes
/// them into direct-download links.
pub struct DriveStorage {
    folder_id: String,
    tokens: Arc<dyn AccessTokenSource>,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveStorage {
    /// Store into the folder `folder_id`, authorizing each request with a
    /// token from `tokens`.
    pub fn new(folder_id: impl Into<String>, tokens: Arc<dyn AccessTokenSource>, client: reqwest::Client) -> Self {
        Self {
            folder_id: folder_id.into(),
            tokens,
            api_base: "https://www.googleapis.com".to_string(),
            client,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl DurableStorage for DriveStorage {
    fn name(&self) -> &str {
        "drive"
    }

    async fn put(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, RelayError> {
        let url = endpoint(&self.api_base, &["upload", "drive", "v3", "files"])?;
        let metadata = serde_json::json!({"name": name, "parents": [self.folder_id]});
        let body = related_body(&metadata.to_string(), &bytes, content_type);
        let token = bearer(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={UPLOAD_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| unavailable("Drive upload", e))?;
        let created: DriveFile = check(response, "Drive upload")
            .await?
            .json()
            .await
            .map_err(|e| unavailable("Drive upload response", e))?;
        created
            .id
            .ok_or_else(|| RelayError::RelayUnavailable("Drive upload returned no file id".into()))
    }

    async fn make_public(&self, object_id: &str) -> Result<(), RelayError> {
        let url = endpoint(&self.api_base, &["drive", "v3", "files", object_id, "permissions"])?;
        let token = bearer(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({"role": "reader", "type": "anyone"}))
            .send()
            .await
            .map_err(|e| unavailable("Drive permission update", e))?;
        check(response, "Drive permission update").await?;
        Ok(())
    }

    async fn public_url(&self, object_id: &str) -> Result<String, RelayError> {
        let url = endpoint(&self.api_base, &["drive", "v3", "files", object_id])?;
        let response = self
            .client
            .get(url)
            .query(&[("fields", "webViewLink")])
            .bearer_auth(bearer(self.tokens.as_ref()).await?)
            .send()
            .await
            .map_err(|e| unavailable("Drive metadata", e))?;
        let file: DriveFile = check(response, "Drive metadata")
            .await?
            .json()
            .await
            .map_err(|e| unavailable("Drive metadata response", e))?;
        Ok(file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{object_id}/view")))
    }
}
