//! Google credentials for the storage and spreadsheet backends.

use crate::config::GoogleConfig;
use async_trait::async_trait;
use fieldreport_core::{AccessTokenSource, FieldreportError, FieldreportResult, StaticToken};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use std::sync::Arc;
use tracing::{info, warn};

/// Scopes covering every backend the bot can be configured with.
const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/devstorage.read_write",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Tokens minted from service-account credentials. `gcp_auth` caches them
/// and fetches a new one shortly before expiry.
pub struct ServiceAccountTokens {
    provider: Arc<dyn TokenProvider>,
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> FieldreportResult<String> {
        let token = self
            .provider
            .token(GOOGLE_SCOPES)
            .await
            .map_err(|e| FieldreportError::Auth(e.to_string()))?;
        Ok(token.as_str().to_string())
    }
}

/// Choose where Google tokens come from: a service-account key file, then a
/// fixed token, then application default credentials (metadata server,
/// gcloud).
pub async fn token_source(config: &GoogleConfig) -> FieldreportResult<Arc<dyn AccessTokenSource>> {
    if let Some(path) = &config.credentials_file {
        let account = CustomServiceAccount::from_file(path).map_err(|e| {
            FieldreportError::Auth(format!(
                "Failed to load service account '{}': {e}",
                path.display()
            ))
        })?;
        info!(path = %path.display(), "Using service-account credentials");
        return Ok(Arc::new(ServiceAccountTokens {
            provider: Arc::new(account),
        }));
    }

    if !config.access_token.trim().is_empty() {
        warn!("Using a fixed Google access token; it is never refreshed");
        return Ok(Arc::new(StaticToken::new(config.access_token.as_str())));
    }

    let provider = gcp_auth::provider()
        .await
        .map_err(|e| FieldreportError::Auth(format!("No Google credentials found: {e}")))?;
    info!("Using application default credentials");
    Ok(Arc::new(ServiceAccountTokens { provider }))
}
