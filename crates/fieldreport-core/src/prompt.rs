use crate::action::ActionId;
use serde::{Deserialize, Serialize};

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardButton {
    /// Text shown on the button.
    pub label: String,
    /// Encoded [`ActionId`] sent back when pressed.
    pub action: String,
}

/// A message to send to the user, optionally with buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutboundPrompt {
    /// Message text.
    pub text: String,
    /// Buttons in display order, one per row.
    #[serde(default)]
    pub keyboard: Vec<KeyboardButton>,
}

impl OutboundPrompt {
    /// A prompt without buttons.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    /// Append a button.
    pub fn with_button(mut self, label: impl Into<String>, action: &ActionId) -> Self {
        self.keyboard.push(KeyboardButton {
            label: label.into(),
            action: action.encode(),
        });
        self
    }

    /// Prepend a notice line above the prompt text, keeping the keyboard.
    pub fn with_notice(mut self, notice: &str) -> Self {
        self.text = format!("{notice}\n\n{}", self.text);
        self
    }
}
