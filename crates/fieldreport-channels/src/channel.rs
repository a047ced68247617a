use async_trait::async_trait;
use fieldreport_core::{FieldreportResult, InboundEvent, OutboundPrompt};

/// One update received from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUpdate {
    /// The mapped user action; `None` for button payloads nothing understands.
    pub event: Option<InboundEvent>,
    /// Handle to acknowledge a button press with.
    pub callback_id: Option<String>,
}

/// What a receiving channel emits.
#[derive(Debug)]
pub enum ChannelEvent {
    UpdateReceived(ChannelUpdate),
    Disconnected(String),
}

/// A chat transport the bot talks through.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Send a prompt, with its keyboard, into `chat_id`.
    async fn send(&self, chat_id: &str, prompt: &OutboundPrompt) -> FieldreportResult<()>;

    /// Stop the client-side spinner on a pressed button.
    async fn acknowledge(&self, callback_id: &str) -> FieldreportResult<()> {
        let _ = callback_id;
        Ok(())
    }
}
