//! Core types and error definitions for the fieldreport bot.
//!
//! This crate provides the foundational types shared across all fieldreport
//! crates: the error enum, the answer and report data model, inbound events,
//! outbound prompts, and the static step schedule together with its pure
//! rendering functions.
//!
//! # Main types
//!
//! - [`FieldreportError`]: Unified error enum for infrastructure failures.
//! - [`FieldreportResult`]: Convenience alias for `Result<T, FieldreportError>`.
//! - [`AnswerValue`]: One collected answer (text, choice, choice set, media).
//! - [`InboundEvent`]: A user action received from the chat transport.
//! - [`OutboundPrompt`]: A message plus optional inline keyboard to send back.
//! - [`StepSchedule`]: The ordered, validated list of report steps.
//! - [`Report`]: Immutable snapshot handed to the sinks on confirmation.

/// Keyboard action identifiers and their wire encoding.
pub mod action;
/// Bearer tokens for outbound Google API calls.
pub mod auth;
/// Answer values and the per-session answer map.
pub mod answer;
/// Inbound events from the chat transport.
pub mod event;
/// Outbound prompts and keyboards.
pub mod prompt;
/// Pure prompt, summary, and answer rendering.
pub mod render;
/// Confirmed report snapshot.
pub mod report;
/// Static step definitions.
pub mod schedule;

pub use action::ActionId;
pub use answer::{AnswerValue, Answers};
pub use auth::{AccessTokenSource, StaticToken};
pub use event::{EventKind, InboundEvent, MediaKind, TransportFileRef};
pub use prompt::{KeyboardButton, OutboundPrompt};
pub use report::Report;
pub use schedule::{Choice, InputKind, StepDefinition, StepSchedule};

// --- Error types ---

/// Top-level error type for the fieldreport workspace.
///
/// Each variant corresponds to a subsystem that can produce errors. Domain
/// failures of the media relay and the report sinks have their own enums in
/// their crates; this type covers infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum FieldreportError {
    /// An error related to session persistence or lookup.
    #[error("Session error: {0}")]
    Session(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An invalid step schedule.
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// An error from a communication channel (e.g. Telegram).
    #[error("Channel error: {0}")]
    Channel(String),

    /// No usable credentials for an outbound API.
    #[error("Auth error: {0}")]
    Auth(String),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`FieldreportError`].
pub type FieldreportResult<T> = Result<T, FieldreportError>;
