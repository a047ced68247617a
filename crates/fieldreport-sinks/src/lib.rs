//! Report sinks: where a confirmed report goes.
//!
//! A [`ReportSinkAdapter`] turns a [`Report`](fieldreport_core::Report) into a
//! spreadsheet row and a chat notification and dispatches both
//! independently. The [`SinkReport`] it returns records each outcome so a
//! partial failure is never mistaken for success or for total failure.

pub mod adapter;
pub mod error;
pub mod format;
pub mod notify;
pub mod tabular;

pub use adapter::{ReportSink, ReportSinkAdapter, SinkReport, SinkStatus};
pub use error::SinkError;
pub use format::{format_notification, report_row, MediaAttachment, MediaKind, MediaSource, Notification};
pub use notify::NotificationDispatcher;
pub use tabular::{GoogleSheetsBackend, TabularBackend};
