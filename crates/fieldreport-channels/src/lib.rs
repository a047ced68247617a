//! Chat transport adapters.
//!
//! Provides the [`Channel`] trait the gateway replies through, the Telegram
//! Bot API implementation of it, the mapping from raw Telegram updates to
//! [`InboundEvent`](fieldreport_core::InboundEvent)s, and a
//! [`NotificationDispatcher`](fieldreport_sinks::NotificationDispatcher) that
//! posts confirmed reports into a team chat.
//!
//! # Main types
//!
//! - [`Channel`]: Sends prompts to a user and acknowledges button presses.
//! - [`TelegramChannel`]: Bot API channel with long polling and webhook setup.
//! - [`TelegramNotifier`]: Posts reports to a chat and optional forum thread.
//! - [`Update`]: Raw Telegram update; see [`parse_update`].

/// Low-level Bot API client.
pub mod api;
/// Core channel trait and event types.
pub mod channel;
/// Team chat notifications.
pub mod notifier;
/// Telegram channel integration.
pub mod telegram;
/// Splitting text to the message size limit.
pub mod text;
/// Telegram update types and their mapping to inbound events.
pub mod update;

pub use api::{ApiError, BotApi};
pub use channel::{Channel, ChannelEvent, ChannelUpdate};
pub use notifier::TelegramNotifier;
pub use telegram::TelegramChannel;
pub use text::{split_message, MAX_MESSAGE_CHARS};
pub use update::{parse_update, Update};
