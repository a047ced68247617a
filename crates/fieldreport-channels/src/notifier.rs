use crate::api::{ApiError, BotApi};
use crate::text::{split_message, MAX_MESSAGE_CHARS};
use async_trait::async_trait;
use fieldreport_sinks::{MediaAttachment, MediaKind, NotificationDispatcher, SinkError};
use serde::Serialize;

/// Posts report notifications into a team chat, optionally inside one forum
/// topic.
pub struct TelegramNotifier {
    api: BotApi,
    chat_id: String,
    thread_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    chat_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct MediaRequest<'a> {
    chat_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a str>,
    caption: &'a str,
}

fn sink_error(err: ApiError) -> SinkError {
    match err {
        ApiError::Transport(msg) => SinkError::Unreachable(msg),
        ApiError::Api(msg) => SinkError::Rejected(msg),
    }
}

impl TelegramNotifier {
    /// Notify `chat_id` through `api`.
    pub fn new(api: BotApi, chat_id: impl Into<String>) -> Self {
        Self {
            api,
            chat_id: chat_id.into(),
            thread_id: None,
        }
    }

    /// Post into a forum topic of the chat.
    pub fn with_thread(mut self, thread_id: Option<i64>) -> Self {
        self.thread_id = thread_id;
        self
    }
}

#[async_trait]
impl NotificationDispatcher for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<(), SinkError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let request = TextRequest {
                chat_id: &self.chat_id,
                message_thread_id: self.thread_id,
                text: chunk,
            };
            self.api
                .call::<_, serde_json::Value>("sendMessage", &request)
                .await
                .map_err(sink_error)?;
        }
        Ok(())
    }

    async fn send_media_with_caption(&self, media: &MediaAttachment, caption: &str) -> Result<(), SinkError> {
        let (method, photo, document) = match media.kind {
            MediaKind::Photo => ("sendPhoto", Some(media.reference.as_str()), None),
            MediaKind::Document => ("sendDocument", None, Some(media.reference.as_str())),
        };
        let request = MediaRequest {
            chat_id: &self.chat_id,
            message_thread_id: self.thread_id,
            photo,
            document,
            caption,
        };
        self.api
            .call::<_, serde_json::Value>(method, &request)
            .await
            .map_err(sink_error)?;
        Ok(())
    }
}
