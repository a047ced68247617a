use crate::answer::{AnswerValue, Answers};
use crate::event::MediaKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of a confirmed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Who submitted it (`@username` or user id).
    pub submitter: String,
    /// Collected answers keyed by step key.
    pub answers: Answers,
    /// UTC time of confirmation.
    pub submitted_at: DateTime<Utc>,
}

impl Report {
    /// Snapshot `answers` as submitted now.
    pub fn new(submitter: impl Into<String>, answers: Answers) -> Self {
        Self {
            submitter: submitter.into(),
            answers,
            submitted_at: Utc::now(),
        }
    }

    /// The first relayed media answer, as `(url, transport_id, kind)`.
    pub fn media(&self) -> Option<(&str, &str, MediaKind)> {
        self.answers.values().find_map(|value| match value {
            AnswerValue::MediaRef {
                url,
                transport_id,
                kind,
            } => Some((url.as_str(), transport_id.as_str(), *kind)),
            _ => None,
        })
    }
}
