use chrono::{DateTime, Utc};
use fieldreport_core::{AnswerValue, Answers};
use serde::{Deserialize, Serialize};

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Collecting answers; `current_step` points at the open question.
    InProgress,
    /// All steps answered; the summary is waiting for confirm or cancel.
    AwaitingConfirmation,
    /// Submitted. Stores drop completed sessions.
    Completed,
}

/// The mutable dialogue state of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Owner; the store key.
    pub user_id: String,
    /// Index of the open step; equals the step count once all are answered.
    pub current_step: usize,
    /// Answers given so far, keyed by step key.
    pub answers: Answers,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    /// Last answer or status change.
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// A fresh session at step 0.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            current_step: 0,
            answers: Answers::new(),
            status: SessionStatus::InProgress,
            created_at: now,
            updated_at: now,
        }
    }

    /// The stored answer for a step key.
    pub fn answer(&self, key: &str) -> Option<&AnswerValue> {
        self.answers.get(key)
    }

    /// Store or replace the answer for a step key.
    pub fn set_answer(&mut self, key: impl Into<String>, value: AnswerValue) {
        self.updated_at = Utc::now();
        self.answers.insert(key.into(), value);
    }

    /// Move past the current step. Reaching `step_count` switches the session
    /// to [`SessionStatus::AwaitingConfirmation`]. The index never decreases.
    pub fn advance(&mut self, step_count: usize) -> SessionStatus {
        if self.status == SessionStatus::InProgress {
            self.current_step = (self.current_step + 1).min(step_count);
            if self.current_step >= step_count {
                self.status = SessionStatus::AwaitingConfirmation;
            }
            self.updated_at = Utc::now();
        }
        self.status
    }

    /// Mark submitted.
    pub fn complete(&mut self) {
        self.status = SessionStatus::Completed;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_at_zero() {
        let session = ConversationSession::new("u1");
        assert_eq!(session.current_step, 0);
        assert!(session.answers.is_empty());
        assert_eq!(session.status, SessionStatus::InProgress);
    }

    #[test]
    fn advance_reaches_confirmation() {
        let mut session = ConversationSession::new("u1");
        assert_eq!(session.advance(2), SessionStatus::InProgress);
        assert_eq!(session.current_step, 1);
        assert_eq!(session.advance(2), SessionStatus::AwaitingConfirmation);
        assert_eq!(session.current_step, 2);

        // Further advances are inert.
        assert_eq!(session.advance(2), SessionStatus::AwaitingConfirmation);
        assert_eq!(session.current_step, 2);
    }

    #[test]
    fn json_round_trip_keeps_answers() {
        let mut session = ConversationSession::new("u1");
        session.set_answer("managers", AnswerValue::ChoiceSet(vec!["b".into(), "a".into()]));
        let json = serde_json::to_string(&session).unwrap();
        let back: ConversationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
