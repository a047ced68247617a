use crate::api::{ApiError, BotApi};
use crate::channel::{Channel, ChannelEvent};
use crate::text::{split_message, MAX_MESSAGE_CHARS};
use crate::update::{parse_update, Update};
use async_trait::async_trait;
use fieldreport_core::{FieldreportResult, OutboundPrompt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Seconds Telegram holds a `getUpdates` call open.
const LONG_POLL_SECS: u64 = 30;
/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Telegram Bot API channel adapter.
///
/// Sends prompts with `sendMessage` and an inline keyboard; prompts over the
/// message limit go out as several messages with the keyboard on the last.
/// Receives updates
/// either by long polling (`getUpdates`, see [`poll_updates`](Self::poll_updates))
/// or through a webhook registered with [`set_webhook`](Self::set_webhook).
/// Polled updates are forwarded through a `tokio::sync::mpsc` channel as
/// [`ChannelEvent`]s.
pub struct TelegramChannel {
    api: BotApi,
    event_tx: mpsc::Sender<ChannelEvent>,
    event_rx: Option<mpsc::Receiver<ChannelEvent>>,
}

// ── Request types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SetWebhookRequest<'a> {
    url: &'a str,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

fn keyboard(prompt: &OutboundPrompt) -> Option<InlineKeyboardMarkup<'_>> {
    if prompt.keyboard.is_empty() {
        return None;
    }
    Some(InlineKeyboardMarkup {
        inline_keyboard: prompt
            .keyboard
            .iter()
            .map(|button| {
                vec![InlineKeyboardButton {
                    text: &button.label,
                    callback_data: &button.action,
                }]
            })
            .collect(),
    })
}

// ── Implementation ──────────────────────────────────────────────────────────

impl TelegramChannel {
    /// Create a new `TelegramChannel`.
    ///
    /// * `api` – Bot API client carrying the token from @BotFather.
    /// * `event_buffer` – Capacity of the internal mpsc event buffer.
    pub fn new(api: BotApi, event_buffer: usize) -> Self {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        Self {
            api,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the receiving half of the event channel.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<ChannelEvent>> {
        self.event_rx.take()
    }

    /// Start long-polling the Telegram `getUpdates` endpoint.
    ///
    /// Runs until Telegram rejects the poll (bad token, a webhook is still
    /// set) or the receiver is dropped. Transport errors are logged and
    /// retried. It should be spawned onto a Tokio task.
    pub async fn poll_updates(&self) -> FieldreportResult<()> {
        let mut offset: Option<i64> = None;
        info!("Polling Telegram for updates");

        loop {
            let request = GetUpdatesRequest {
                timeout: LONG_POLL_SECS,
                offset,
                allowed_updates: ALLOWED_UPDATES,
            };
            let budget = Some(Duration::from_secs(LONG_POLL_SECS + 10));

            let updates: Vec<Update> = match self
                .api
                .call_with_timeout("getUpdates", &request, budget)
                .await
            {
                Ok(updates) => updates,
                Err(ApiError::Transport(e)) => {
                    warn!(error = %e, "Telegram poll failed, retrying");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
                Err(e) => {
                    let _ = self
                        .event_tx
                        .send(ChannelEvent::Disconnected(e.to_string()))
                        .await;
                    return Err(e.into());
                }
            };

            for update in updates {
                // Advance the offset so we do not receive this update again.
                offset = Some(update.update_id + 1);

                let Some(parsed) = parse_update(&update) else {
                    debug!(update_id = update.update_id, "Skipping update without an action");
                    continue;
                };
                if self
                    .event_tx
                    .send(ChannelEvent::UpdateReceived(parsed))
                    .await
                    .is_err()
                {
                    return Ok(());
                }
            }
        }
    }

    /// Register `url` as the webhook for updates.
    pub async fn set_webhook(&self, url: &str) -> FieldreportResult<()> {
        let request = SetWebhookRequest {
            url,
            allowed_updates: ALLOWED_UPDATES,
        };
        self.api.call::<_, bool>("setWebhook", &request).await?;
        info!(url = %url, "Telegram webhook registered");
        Ok(())
    }

    /// Remove any webhook so `getUpdates` is allowed.
    pub async fn delete_webhook(&self) -> FieldreportResult<()> {
        self.api
            .call::<_, bool>("deleteWebhook", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Acknowledge a button press, optionally with a short toast.
    pub async fn answer_callback_query(&self, callback_query_id: &str, text: Option<&str>) -> FieldreportResult<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id,
            text,
        };
        self.api.call::<_, bool>("answerCallbackQuery", &request).await?;
        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, chat_id: &str, prompt: &OutboundPrompt) -> FieldreportResult<()> {
        let chunks = split_message(&prompt.text, MAX_MESSAGE_CHARS);
        let last = chunks.len().saturating_sub(1);
        for (index, text) in chunks.into_iter().enumerate() {
            let request = SendMessageRequest {
                chat_id,
                text,
                reply_markup: if index == last { keyboard(prompt) } else { None },
            };
            self.api
                .call::<_, serde_json::Value>("sendMessage", &request)
                .await?;
        }
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> FieldreportResult<()> {
        self.answer_callback_query(callback_id, None).await
    }
}
