//! Pure rendering of prompts, answers, and the confirmation summary.
//!
//! Everything here is a function of its arguments only, so re-rendering a
//! prompt after a replayed event always produces the same text and keyboard.

use crate::action::ActionId;
use crate::answer::{AnswerValue, Answers};
use crate::prompt::OutboundPrompt;
use crate::schedule::{InputKind, StepDefinition, StepSchedule};

/// Shown for unanswered fields.
pub const PLACEHOLDER: &str = "—";
/// Joins the labels of a choice set.
pub const CHOICE_DELIMITER: &str = ", ";
/// Prefix on selected multi-choice buttons.
pub const SELECTED_MARK: &str = "✅ ";

const SELECTED_TOKEN: &str = "{{selected}}";

/// Replace `{{selected}}` in the template with the given selection text.
pub fn render_template(template: &str, selected: &str) -> String {
    template.replace(SELECTED_TOKEN, selected)
}

/// Human-readable form of an answer: choice ids become labels, sets are joined.
pub fn format_answer(step: &StepDefinition, value: &AnswerValue) -> String {
    match value {
        AnswerValue::Text(text) => text.clone(),
        AnswerValue::Choice(id) => choice_label(step, id),
        AnswerValue::ChoiceSet(ids) => ids
            .iter()
            .map(|id| choice_label(step, id))
            .collect::<Vec<_>>()
            .join(CHOICE_DELIMITER),
        AnswerValue::MediaRef { url, .. } => url.clone(),
    }
}

/// Like [`format_answer`], with [`PLACEHOLDER`] for missing or empty answers.
pub fn display_answer(step: &StepDefinition, value: Option<&AnswerValue>) -> String {
    match value {
        Some(v) if !v.is_empty() => format_answer(step, v),
        _ => PLACEHOLDER.to_string(),
    }
}

fn choice_label(step: &StepDefinition, id: &str) -> String {
    step.choice(id)
        .map_or_else(|| id.to_string(), |c| c.label.clone())
}

/// Render the prompt for `step` given its current (partial) answer.
pub fn render_prompt(step: &StepDefinition, answer: Option<&AnswerValue>) -> OutboundPrompt {
    let text = render_template(&step.prompt, &display_answer(step, answer));
    let mut prompt = OutboundPrompt::text(text);

    match step.kind {
        InputKind::SingleChoice => {
            for choice in &step.choices {
                prompt = prompt.with_button(choice.label.as_str(), &ActionId::Pick(choice.id.clone()));
            }
        }
        InputKind::MultiChoice => {
            let selected: &[String] = match answer {
                Some(AnswerValue::ChoiceSet(ids)) => ids,
                _ => &[],
            };
            for choice in &step.choices {
                let label = if selected.contains(&choice.id) {
                    format!("{SELECTED_MARK}{}", choice.label)
                } else {
                    choice.label.clone()
                };
                prompt = prompt.with_button(label, &ActionId::Toggle(choice.id.clone()));
            }
            prompt = prompt.with_button("Done", &ActionId::Done);
        }
        InputKind::FreeText | InputKind::Media => {}
    }

    if step.optional {
        prompt = prompt.with_button("Skip", &ActionId::Skip);
    }
    prompt
}

/// Render the confirmation summary: every step in order with its answer.
pub fn render_summary(schedule: &StepSchedule, answers: &Answers) -> OutboundPrompt {
    let lines: Vec<String> = schedule
        .steps()
        .iter()
        .map(|step| format!("{}: {}", step.label, display_answer(step, answers.get(&step.key))))
        .collect();

    OutboundPrompt::text(format!("Please check the report:\n\n{}", lines.join("\n")))
        .with_button("Confirm", &ActionId::Confirm)
        .with_button("Cancel", &ActionId::Cancel)
}
