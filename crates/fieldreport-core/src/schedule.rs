use crate::{FieldreportError, FieldreportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Longest accepted choice id. Encoded actions (`toggle:<id>`) must fit the
/// 64-byte callback payload limit of inline keyboards.
pub const MAX_CHOICE_ID_LEN: usize = 56;

/// The shape of input a step expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Exactly one of the step's choices.
    SingleChoice,
    /// Any subset of the step's choices, finished with `done`.
    MultiChoice,
    /// Non-empty text.
    FreeText,
    /// A photo or document.
    Media,
}

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable identifier, unique within its step.
    pub id: String,
    /// Text shown on the button and in summaries.
    pub label: String,
}

impl Choice {
    /// Create a choice.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// One question of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique key; answers are stored under it.
    pub key: String,
    /// Human-readable field name for summaries and notifications.
    pub label: String,
    /// Expected input.
    pub kind: InputKind,
    /// Prompt template. `{{selected}}` expands to the current selection.
    pub prompt: String,
    /// Options for choice steps, in display order.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Whether the step may be skipped.
    #[serde(default)]
    pub optional: bool,
}

impl StepDefinition {
    fn build(key: &str, label: &str, kind: InputKind, prompt: &str, choices: Vec<Choice>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            prompt: prompt.to_string(),
            choices,
            optional: false,
        }
    }

    /// A free-text step.
    pub fn free_text(key: &str, label: &str, prompt: &str) -> Self {
        Self::build(key, label, InputKind::FreeText, prompt, Vec::new())
    }

    /// A single-choice step.
    pub fn single_choice(key: &str, label: &str, prompt: &str, choices: Vec<Choice>) -> Self {
        Self::build(key, label, InputKind::SingleChoice, prompt, choices)
    }

    /// A multi-choice step.
    pub fn multi_choice(key: &str, label: &str, prompt: &str, choices: Vec<Choice>) -> Self {
        Self::build(key, label, InputKind::MultiChoice, prompt, choices)
    }

    /// A media step.
    pub fn media(key: &str, label: &str, prompt: &str) -> Self {
        Self::build(key, label, InputKind::Media, prompt, Vec::new())
    }

    /// Mark the step as skippable.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Look up a choice by id.
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// The ordered, validated list of steps. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSchedule {
    steps: Vec<StepDefinition>,
}

impl StepSchedule {
    /// Validate and wrap `steps`.
    pub fn new(steps: Vec<StepDefinition>) -> FieldreportResult<Self> {
        if steps.is_empty() {
            return Err(FieldreportError::Schedule("schedule has no steps".into()));
        }

        let mut keys = HashSet::new();
        for step in &steps {
            if step.key.trim().is_empty() {
                return Err(FieldreportError::Schedule("step key must not be empty".into()));
            }
            if !keys.insert(step.key.as_str()) {
                return Err(FieldreportError::Schedule(format!(
                    "duplicate step key '{}'",
                    step.key
                )));
            }

            let is_choice = matches!(step.kind, InputKind::SingleChoice | InputKind::MultiChoice);
            if is_choice && step.choices.is_empty() {
                return Err(FieldreportError::Schedule(format!(
                    "choice step '{}' has no choices",
                    step.key
                )));
            }
            if !is_choice && !step.choices.is_empty() {
                return Err(FieldreportError::Schedule(format!(
                    "step '{}' is not a choice step but defines choices",
                    step.key
                )));
            }

            let mut ids = HashSet::new();
            for choice in &step.choices {
                if choice.id.is_empty() || choice.id.len() > MAX_CHOICE_ID_LEN {
                    return Err(FieldreportError::Schedule(format!(
                        "choice id '{}' in step '{}' must be 1..={MAX_CHOICE_ID_LEN} bytes",
                        choice.id, step.key
                    )));
                }
                if !ids.insert(choice.id.as_str()) {
                    return Err(FieldreportError::Schedule(format!(
                        "duplicate choice id '{}' in step '{}'",
                        choice.id, step.key
                    )));
                }
            }
        }

        Ok(Self { steps })
    }

    /// The field-report questionnaire: managers, visit type, nine text fields,
    /// next action, and an optional photo.
    pub fn field_report(managers: &[String]) -> FieldreportResult<Self> {
        let manager_choices = managers
            .iter()
            .map(|handle| Choice::new(handle.as_str(), handle.as_str()))
            .collect();

        Self::new(vec![
            StepDefinition::multi_choice(
                "managers",
                "Managers",
                "Select the managers on this visit.\nSelected: {{selected}}",
                manager_choices,
            ),
            StepDefinition::single_choice(
                "visit_type",
                "Visit type",
                "Visit type:",
                vec![
                    Choice::new("success", "Productive"),
                    Choice::new("no_result", "No result"),
                    Choice::new("outdated", "Outdated"),
                ],
            ),
            StepDefinition::free_text("object", "Object", "Object:"),
            StepDefinition::free_text("address", "Address", "Address:"),
            StepDefinition::free_text("source", "Source", "Source:"),
            StepDefinition::free_text("client", "Client", "Client:"),
            StepDefinition::free_text("contractor", "General contractor", "General contractor:"),
            StepDefinition::free_text("contacts", "Contacts", "Contacts:"),
            StepDefinition::free_text("report", "Report", "Report:"),
            StepDefinition::free_text("structures", "Structures", "Structures:"),
            StepDefinition::free_text("timeline", "Timeline", "Timeline:"),
            StepDefinition::single_choice(
                "next_action",
                "Next action",
                "What next?",
                vec![Choice::new("lead", "Create a lead"), Choice::new("pause", "Pause")],
            ),
            StepDefinition::media("photo", "Photo", "Send a photo or a file:").optional(),
        ])
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`; an empty schedule is rejected by [`StepSchedule::new`].
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    /// Steps in order.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}
