use crate::FieldreportResult;
use async_trait::async_trait;

/// Supplies bearer tokens for the Google APIs behind storage and sheets.
///
/// Called once per request; implementations cache and refresh on their own.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// A token that is valid right now.
    async fn access_token(&self) -> FieldreportResult<String>;
}

/// A token fixed at startup. It is never refreshed, so it stops working
/// once Google expires it (about an hour for user OAuth tokens).
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wrap a token obtained elsewhere.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> FieldreportResult<String> {
        Ok(self.0.clone())
    }
}
