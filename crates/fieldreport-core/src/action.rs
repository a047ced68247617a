use crate::event::EventKind;

/// What a keyboard button asks for when pressed.
///
/// Encoded as the button's callback payload: `start`, `pick:<id>`,
/// `toggle:<id>`, `done`, `skip`, `confirm`, `cancel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionId {
    /// Begin a new report.
    Start,
    /// Select one option of a single-choice step.
    Pick(String),
    /// Flip one option of a multi-choice step.
    Toggle(String),
    /// Finish a multi-choice step.
    Done,
    /// Leave an optional step unanswered.
    Skip,
    /// Submit the summarized report.
    Confirm,
    /// Abandon the report.
    Cancel,
}

impl ActionId {
    /// Encode as a callback payload.
    pub fn encode(&self) -> String {
        match self {
            ActionId::Start => "start".to_string(),
            ActionId::Pick(id) => format!("pick:{id}"),
            ActionId::Toggle(id) => format!("toggle:{id}"),
            ActionId::Done => "done".to_string(),
            ActionId::Skip => "skip".to_string(),
            ActionId::Confirm => "confirm".to_string(),
            ActionId::Cancel => "cancel".to_string(),
        }
    }

    /// Parse a callback payload. Unknown payloads yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(id) = raw.strip_prefix("pick:") {
            return (!id.is_empty()).then(|| ActionId::Pick(id.to_string()));
        }
        if let Some(id) = raw.strip_prefix("toggle:") {
            return (!id.is_empty()).then(|| ActionId::Toggle(id.to_string()));
        }
        match raw {
            "start" => Some(ActionId::Start),
            "done" => Some(ActionId::Done),
            "skip" => Some(ActionId::Skip),
            "confirm" => Some(ActionId::Confirm),
            "cancel" => Some(ActionId::Cancel),
            _ => None,
        }
    }
}

impl From<ActionId> for EventKind {
    fn from(action: ActionId) -> Self {
        match action {
            ActionId::Start => EventKind::Start,
            ActionId::Pick(id) => EventKind::ChoiceSelected(id),
            ActionId::Toggle(id) => EventKind::ToggleChoice(id),
            ActionId::Done => EventKind::Done,
            ActionId::Skip => EventKind::Skip,
            ActionId::Confirm => EventKind::Confirm,
            ActionId::Cancel => EventKind::Cancel,
        }
    }
}
