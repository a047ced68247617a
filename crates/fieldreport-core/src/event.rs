use serde::{Deserialize, Serialize};

/// How the transport delivered a file. A transport file id can only be
/// re-sent the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A compressed chat photo.
    Photo,
    /// A file sent as-is.
    #[default]
    Document,
}

/// Opaque locator for a file hosted by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFileRef {
    /// Id usable to fetch or re-send the file.
    pub file_id: String,
    /// Id stable across bots and re-uploads; used to name relayed copies.
    pub file_unique_id: String,
    /// Original file name, when the user sent a document.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type declared by the transport.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes declared by the transport.
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Photo or document; decides how the file id can be re-sent.
    #[serde(default)]
    pub kind: MediaKind,
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Begin (or restart) a report.
    Start,
    /// Pressed a single-choice option.
    ChoiceSelected(String),
    /// Pressed a multi-choice option.
    ToggleChoice(String),
    /// Finished a multi-choice step.
    Done,
    /// Skipped an optional step.
    Skip,
    /// Typed a message.
    Text(String),
    /// Sent a photo or document.
    MediaSubmitted(TransportFileRef),
    /// Confirmed the summary.
    Confirm,
    /// Abandoned the report.
    Cancel,
}

impl EventKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::ChoiceSelected(_) => "choice_selected",
            EventKind::ToggleChoice(_) => "toggle_choice",
            EventKind::Done => "done",
            EventKind::Skip => "skip",
            EventKind::Text(_) => "text",
            EventKind::MediaSubmitted(_) => "media_submitted",
            EventKind::Confirm => "confirm",
            EventKind::Cancel => "cancel",
        }
    }

    /// Whether the user typed or uploaded something, as opposed to pressing a button.
    pub fn is_typed(&self) -> bool {
        matches!(self, EventKind::Text(_) | EventKind::MediaSubmitted(_))
    }
}

/// A user action received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Stable identity of the user; sessions are keyed by it.
    pub user_id: String,
    /// Conversation to reply into.
    pub chat_id: String,
    /// Public handle, when the user has one.
    pub username: Option<String>,
    /// The action itself.
    pub kind: EventKind,
}

impl InboundEvent {
    /// Create an event without a username.
    pub fn new(user_id: impl Into<String>, chat_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id: chat_id.into(),
            username: None,
            kind,
        }
    }

    /// Attach a username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Identity recorded on submitted reports: `@username`, or the user id.
    pub fn submitter(&self) -> String {
        match &self.username {
            Some(name) if !name.is_empty() => format!("@{name}"),
            _ => self.user_id.clone(),
        }
    }
}
