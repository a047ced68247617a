use fieldreport_core::OutboundPrompt;
use fieldreport_media::RelayError;
use fieldreport_sinks::SinkReport;

/// What handling an event did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A fresh session was created at step 0.
    Started,
    /// The step was answered; `step` is the new current index.
    Advanced { step: usize },
    /// The last step was answered; the summary was rendered.
    AwaitingConfirmation,
    /// A multi-choice selection changed; the prompt was re-rendered.
    Toggled,
    /// The event did not fit the current step or state. No state changed.
    Unrecognized,
    /// The input had the right kind but an unusable value (empty text, empty
    /// required selection). No state changed; the prompt was re-sent.
    Reprompted,
    /// The media relay failed. No state changed; the user may resend.
    MediaFailed(RelayError),
    /// The report reached at least one sink; the session is gone.
    Submitted(SinkReport),
    /// Neither sink accepted the report; confirmation is still pending.
    SubmitFailed(SinkReport),
    /// The session was discarded.
    Cancelled,
    /// An earlier event for this user is still waiting on I/O.
    Busy,
}

/// Result of [`StepEngine::handle`](crate::StepEngine::handle).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReply {
    pub outcome: Outcome,
    /// Messages to send to the user, in order. May be empty.
    pub prompts: Vec<OutboundPrompt>,
}

impl EngineReply {
    pub(crate) fn new(outcome: Outcome, prompts: Vec<OutboundPrompt>) -> Self {
        Self { outcome, prompts }
    }

    pub(crate) fn silent(outcome: Outcome) -> Self {
        Self::new(outcome, Vec::new())
    }

    pub(crate) fn one(outcome: Outcome, prompt: OutboundPrompt) -> Self {
        Self::new(outcome, vec![prompt])
    }
}
