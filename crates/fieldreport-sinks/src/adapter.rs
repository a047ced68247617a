use crate::error::SinkError;
use crate::format::{format_notification, report_row, MediaSource, Notification};
use crate::notify::NotificationDispatcher;
use crate::tabular::TabularBackend;
use async_trait::async_trait;
use fieldreport_core::{Report, StepSchedule};
use std::sync::Arc;
use tracing::{info, warn};

/// Telegram's limit on media captions.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Overall result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    /// Both sinks accepted the report.
    Delivered,
    /// Exactly one sink accepted the report.
    PartialFailure,
    /// Neither sink accepted the report.
    TotalFailure,
}

/// Per-sink outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    /// Spreadsheet append.
    pub tabular: Result<(), SinkError>,
    /// Team chat notification.
    pub notification: Result<(), SinkError>,
}

impl SinkReport {
    /// Collapse both outcomes into one status.
    pub fn status(&self) -> SinkStatus {
        match (self.tabular.is_ok(), self.notification.is_ok()) {
            (true, true) => SinkStatus::Delivered,
            (false, false) => SinkStatus::TotalFailure,
            _ => SinkStatus::PartialFailure,
        }
    }
}

/// Accepts confirmed reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Dispatch `report`. Never fails as a whole; see [`SinkReport`].
    async fn submit(&self, report: &Report) -> SinkReport;
}

/// Sends a report to a [`TabularBackend`] and a [`NotificationDispatcher`].
pub struct ReportSinkAdapter {
    schedule: Arc<StepSchedule>,
    tabular: Arc<dyn TabularBackend>,
    notifier: Arc<dyn NotificationDispatcher>,
    media_source: MediaSource,
}

impl ReportSinkAdapter {
    /// Rows and notifications follow the step order of `schedule`.
    pub fn new(
        schedule: Arc<StepSchedule>,
        tabular: Arc<dyn TabularBackend>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            schedule,
            tabular,
            notifier,
            media_source: MediaSource::default(),
        }
    }

    /// Which media reference notifications attach.
    pub fn with_media_source(mut self, source: MediaSource) -> Self {
        self.media_source = source;
        self
    }

    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        match &notification.media {
            None => self.notifier.send_text(&notification.text).await,
            Some(media) if notification.text.chars().count() <= MAX_CAPTION_CHARS => {
                self.notifier.send_media_with_caption(media, &notification.text).await
            }
            Some(media) => {
                self.notifier
                    .send_media_with_caption(media, &notification.header)
                    .await?;
                self.notifier.send_text(&notification.text).await
            }
        }
    }
}

#[async_trait]
impl ReportSink for ReportSinkAdapter {
    async fn submit(&self, report: &Report) -> SinkReport {
        let row = report_row(&self.schedule, report);
        let notification = format_notification(&self.schedule, report, self.media_source);

        let (tabular, notification) =
            tokio::join!(self.tabular.append_row(&row), self.notify(&notification));
        let result = SinkReport { tabular, notification };

        match result.status() {
            SinkStatus::Delivered => {
                info!(submitter = %report.submitter, "Report delivered to all sinks");
            }
            status => {
                warn!(
                    submitter = %report.submitter,
                    ?status,
                    tabular = ?result.tabular,
                    notification = ?result.notification,
                    "Report delivery incomplete"
                );
            }
        }
        result
    }
}
