use crate::event::MediaKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answers collected so far, keyed by step key.
pub type Answers = BTreeMap<String, AnswerValue>;

/// One collected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// Free text, stored verbatim.
    Text(String),
    /// A single choice identifier.
    Choice(String),
    /// Choice identifiers in first-selected order, without duplicates.
    ChoiceSet(Vec<String>),
    /// A relayed media file.
    MediaRef {
        /// Durable public URL of the relayed copy.
        url: String,
        /// The transport's own file id, re-sendable through the transport.
        transport_id: String,
        /// How the transport delivered it.
        #[serde(default)]
        kind: MediaKind,
    },
}

impl AnswerValue {
    /// Toggle `id` in a choice set: remove it when present, append it otherwise.
    ///
    /// Returns the updated set. A non-set value is treated as an empty set.
    pub fn toggled(current: Option<&AnswerValue>, id: &str) -> Vec<String> {
        let mut set = match current {
            Some(AnswerValue::ChoiceSet(ids)) => ids.clone(),
            _ => Vec::new(),
        };
        if let Some(pos) = set.iter().position(|existing| existing == id) {
            set.remove(pos);
        } else {
            set.push(id.to_string());
        }
        set
    }

    /// Whether the value carries no information (empty text or empty set).
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::ChoiceSet(ids) => ids.is_empty(),
            AnswerValue::Choice(_) | AnswerValue::MediaRef { .. } => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn toggle_appends_then_removes() {
        let first = AnswerValue::toggled(None, "a");
        assert_eq!(first, vec!["a"]);

        let current = AnswerValue::ChoiceSet(first);
        let second = AnswerValue::toggled(Some(&current), "b");
        assert_eq!(second, vec!["a", "b"]);

        let current = AnswerValue::ChoiceSet(second);
        let third = AnswerValue::toggled(Some(&current), "a");
        assert_eq!(third, vec!["b"]);
    }

    #[test]
    fn toggle_on_non_set_starts_fresh() {
        let current = AnswerValue::Text("stray".into());
        assert_eq!(AnswerValue::toggled(Some(&current), "x"), vec!["x"]);
    }

    #[test]
    fn serialized_shape_is_tagged() {
        let value = AnswerValue::MediaRef {
            url: "https://example.com/a.jpg".into(),
            transport_id: "tg-1".into(),
            kind: MediaKind::Photo,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["kind"], "media_ref");
        assert_eq!(json["value"]["transport_id"], "tg-1");
        assert_eq!(json["value"]["kind"], "photo");

        let text: AnswerValue =
            serde_json::from_str(r#"{"kind":"text","value":"hello"}"#).unwrap();
        assert_eq!(text, AnswerValue::Text("hello".into()));
    }

    #[test]
    fn emptiness() {
        assert!(AnswerValue::Text("   ".into()).is_empty());
        assert!(AnswerValue::ChoiceSet(vec![]).is_empty());
        assert!(!AnswerValue::Choice("x".into()).is_empty());
    }
}
