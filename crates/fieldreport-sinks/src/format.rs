use fieldreport_core::render::{display_answer, format_answer};
use fieldreport_core::{Report, StepSchedule};
pub use fieldreport_core::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which reference to the media file the notification attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// The durable URL produced by the relay.
    #[default]
    Rehosted,
    /// The original transport file id.
    Transport,
}

/// A file to attach to the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    /// URL or transport file id, depending on [`MediaSource`].
    pub reference: String,
    pub kind: MediaKind,
}

/// A formatted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// First line; used alone as caption when the full text is too long.
    pub header: String,
    /// Header plus one line per step.
    pub text: String,
    pub media: Option<MediaAttachment>,
}

const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Photo or document for a URL, judged by its extension.
fn url_kind(url: &str) -> MediaKind {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let is_photo = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
    if is_photo {
        MediaKind::Photo
    } else {
        MediaKind::Document
    }
}

/// Spreadsheet row: submitter, then one cell per step in schedule order.
///
/// Unanswered steps produce an empty cell so columns never shift.
pub fn report_row(schedule: &StepSchedule, report: &Report) -> Vec<String> {
    let mut row = Vec::with_capacity(schedule.len() + 1);
    row.push(report.submitter.clone());
    for step in schedule.steps() {
        let cell = report
            .answers
            .get(&step.key)
            .map(|value| format_answer(step, value))
            .unwrap_or_default();
        row.push(cell);
    }
    row
}

/// Human-readable notification for the team chat.
pub fn format_notification(schedule: &StepSchedule, report: &Report, source: MediaSource) -> Notification {
    let header = format!("New report from {}", report.submitter);
    let lines: Vec<String> = schedule
        .steps()
        .iter()
        .map(|step| format!("{}: {}", step.label, display_answer(step, report.answers.get(&step.key))))
        .collect();

    let media = report.media().map(|(url, transport_id, delivered)| match source {
        MediaSource::Rehosted => MediaAttachment {
            reference: url.to_string(),
            kind: url_kind(url),
        },
        MediaSource::Transport => MediaAttachment {
            reference: transport_id.to_string(),
            kind: delivered,
        },
    });

    Notification {
        text: format!("{header}\n\n{}", lines.join("\n")),
        header,
        media,
    }
}
