use crate::error::SinkError;
use crate::format::MediaAttachment;
use async_trait::async_trait;

/// Posts notifications to the team chat configured out-of-band.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), SinkError>;
    async fn send_media_with_caption(&self, media: &MediaAttachment, caption: &str) -> Result<(), SinkError>;
}
