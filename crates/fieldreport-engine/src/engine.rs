use crate::locks::{IdentityGuard, IdentityLocks};
use crate::outcome::{EngineReply, Outcome};
use fieldreport_core::render::{render_prompt, render_summary};
use fieldreport_core::{
    ActionId, AnswerValue, EventKind, FieldreportError, FieldreportResult, InboundEvent, InputKind,
    OutboundPrompt, Report, StepDefinition, StepSchedule,
};
use fieldreport_media::MediaRelay;
use fieldreport_session::{ConversationSession, SessionStatus, SessionStore};
use fieldreport_sinks::{ReportSink, SinkReport, SinkStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

const BUSY: &str = "Still working on your previous message, please wait a moment.";
const USE_BUTTONS: &str = "Please use the buttons below.";
const TEXT_EXPECTED: &str = "Please type your answer as a text message.";
const MEDIA_EXPECTED: &str = "Please send a photo or a file.";
const EMPTY_TEXT: &str = "The answer cannot be empty. Please type it again.";
const EMPTY_SELECTION: &str = "Select at least one option, then press Done.";
const CONFIRM_OR_CANCEL: &str = "Please confirm or cancel the report.";
const SUBMIT_FAILED: &str = "Could not submit the report. Please press Confirm to try again.";
const SUBMITTED: &str = "Report submitted. Thank you!";
const SUBMITTED_NO_TABLE: &str =
    "Report sent to the team chat, but it could not be saved to the spreadsheet.";
const SUBMITTED_NO_NOTIFY: &str = "Report saved, but the team chat could not be notified.";
const CANCELLED: &str = "Report cancelled.";

/// How an event relates to the current step.
enum StepInput {
    /// Store the value and advance.
    Answer(AnswerValue),
    /// Advance without storing anything.
    Skip,
    /// New multi-choice selection; stay on the step.
    Selection(Vec<String>),
    /// Right kind of input, unusable value.
    Invalid(&'static str),
    Unrecognized,
}

fn single_choice(step: &StepDefinition, kind: &EventKind) -> StepInput {
    match kind {
        EventKind::ChoiceSelected(id) if step.choice(id).is_some() => {
            StepInput::Answer(AnswerValue::Choice(id.clone()))
        }
        _ => StepInput::Unrecognized,
    }
}

fn multi_choice(step: &StepDefinition, current: Option<&AnswerValue>, kind: &EventKind) -> StepInput {
    match kind {
        EventKind::ToggleChoice(id) if step.choice(id).is_some() => {
            StepInput::Selection(AnswerValue::toggled(current, id))
        }
        EventKind::Done => match current {
            Some(AnswerValue::ChoiceSet(ids)) if !ids.is_empty() => {
                StepInput::Answer(AnswerValue::ChoiceSet(ids.clone()))
            }
            _ if step.optional => StepInput::Skip,
            _ => StepInput::Invalid(EMPTY_SELECTION),
        },
        _ => StepInput::Unrecognized,
    }
}

fn free_text(kind: &EventKind) -> StepInput {
    match kind {
        EventKind::Text(text) if text.trim().is_empty() => StepInput::Invalid(EMPTY_TEXT),
        EventKind::Text(text) => StepInput::Answer(AnswerValue::Text(text.clone())),
        _ => StepInput::Unrecognized,
    }
}

fn mismatch_notice(step: &StepDefinition) -> &'static str {
    match step.kind {
        InputKind::SingleChoice | InputKind::MultiChoice => USE_BUTTONS,
        InputKind::FreeText => TEXT_EXPECTED,
        InputKind::Media => MEDIA_EXPECTED,
    }
}

fn new_report_button(prompt: OutboundPrompt) -> OutboundPrompt {
    prompt.with_button("New report", &ActionId::Start)
}

/// Drives the report dialogue.
///
/// Stateless between calls: all per-user state lives in the session store,
/// and per-user ordering is enforced by [`IdentityLocks`].
pub struct StepEngine {
    schedule: Arc<StepSchedule>,
    sessions: Arc<dyn SessionStore>,
    relay: Arc<dyn MediaRelay>,
    sink: Arc<dyn ReportSink>,
    locks: IdentityLocks,
}

impl StepEngine {
    /// Create an engine over a validated schedule.
    pub fn new(
        schedule: Arc<StepSchedule>,
        sessions: Arc<dyn SessionStore>,
        relay: Arc<dyn MediaRelay>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            schedule,
            sessions,
            relay,
            sink,
            locks: IdentityLocks::new(),
        }
    }

    /// The schedule being walked.
    pub fn schedule(&self) -> &StepSchedule {
        &self.schedule
    }

    /// Handle one inbound event.
    ///
    /// Only session store failures are returned as errors; every user-level
    /// problem is an [`Outcome`].
    pub async fn handle(&self, event: &InboundEvent) -> FieldreportResult<EngineReply> {
        let Some(guard) = self.locks.acquire(&event.user_id).await else {
            debug!(user_id = %event.user_id, event = event.kind.name(), "Identity busy");
            return Ok(EngineReply::one(Outcome::Busy, OutboundPrompt::text(BUSY)));
        };

        match &event.kind {
            EventKind::Start => return self.start(&event.user_id).await,
            EventKind::Cancel => return self.cancel(&event.user_id).await,
            _ => {}
        }

        let stored = match self.sessions.get(&event.user_id).await {
            Ok(stored) => stored,
            Err(FieldreportError::Session(e)) => {
                warn!(user_id = %event.user_id, error = %e, "Unreadable session, discarding it");
                None
            }
            Err(e) => return Err(e),
        };

        let (session, recovered) = match stored {
            Some(session) if session.status != SessionStatus::Completed => (session, false),
            _ => {
                warn!(user_id = %event.user_id, event = event.kind.name(), "No active session, starting a fresh one");
                let session = ConversationSession::new(event.user_id.as_str());
                self.sessions.put(&session).await?;
                (session, true)
            }
        };

        let mut reply = match session.status {
            SessionStatus::AwaitingConfirmation => self.on_confirmation(&guard, session, event).await?,
            _ => self.on_step(&guard, session, event).await?,
        };

        // A stale button on a recovered session would otherwise leave the user
        // with no visible response.
        if recovered && reply.prompts.is_empty() {
            if let Some(first) = self.schedule.get(0) {
                reply.prompts.push(render_prompt(first, None));
            }
        }
        Ok(reply)
    }

    async fn start(&self, user_id: &str) -> FieldreportResult<EngineReply> {
        let session = ConversationSession::new(user_id);
        self.sessions.put(&session).await?;
        info!(user_id = %user_id, "Report started");

        let prompts = self
            .schedule
            .get(0)
            .map(|step| render_prompt(step, None))
            .into_iter()
            .collect();
        Ok(EngineReply::new(Outcome::Started, prompts))
    }

    async fn cancel(&self, user_id: &str) -> FieldreportResult<EngineReply> {
        self.sessions.remove(user_id).await?;
        info!(user_id = %user_id, "Report cancelled");
        Ok(EngineReply::one(
            Outcome::Cancelled,
            new_report_button(OutboundPrompt::text(CANCELLED)),
        ))
    }

    async fn on_step(
        &self,
        guard: &IdentityGuard,
        mut session: ConversationSession,
        event: &InboundEvent,
    ) -> FieldreportResult<EngineReply> {
        let schedule = self.schedule.clone();
        let Some(step) = schedule.get(session.current_step) else {
            // Index past the end while still in progress: finish the schedule.
            session.status = SessionStatus::AwaitingConfirmation;
            self.sessions.put(&session).await?;
            return Ok(EngineReply::one(
                Outcome::AwaitingConfirmation,
                render_summary(&schedule, &session.answers),
            ));
        };

        let input = match (&event.kind, step.kind) {
            (EventKind::Skip, _) if step.optional => StepInput::Skip,
            (EventKind::Skip | EventKind::Confirm, _) => StepInput::Unrecognized,
            (kind, InputKind::SingleChoice) => single_choice(step, kind),
            (kind, InputKind::MultiChoice) => multi_choice(step, session.answer(&step.key), kind),
            (kind, InputKind::FreeText) => free_text(kind),
            (EventKind::MediaSubmitted(file), InputKind::Media) => {
                let relayed = {
                    let _busy = guard.in_flight();
                    self.relay.relay(file).await
                };
                match relayed {
                    Ok(media) => StepInput::Answer(AnswerValue::MediaRef {
                        url: media.url,
                        transport_id: media.transport_id,
                        kind: file.kind,
                    }),
                    Err(e) => {
                        warn!(user_id = %event.user_id, step = %step.key, error = %e, "Media relay failed");
                        let prompt = render_prompt(step, session.answer(&step.key))
                            .with_notice(&e.user_message());
                        return Ok(EngineReply::one(Outcome::MediaFailed(e), prompt));
                    }
                }
            }
            (_, InputKind::Media) => StepInput::Unrecognized,
        };

        match input {
            StepInput::Answer(value) => {
                session.set_answer(step.key.as_str(), value);
                self.advance(session, step).await
            }
            StepInput::Skip => {
                session.answers.remove(&step.key);
                self.advance(session, step).await
            }
            StepInput::Selection(ids) => {
                if ids.is_empty() {
                    session.answers.remove(&step.key);
                } else {
                    session.set_answer(step.key.as_str(), AnswerValue::ChoiceSet(ids));
                }
                self.sessions.put(&session).await?;
                Ok(EngineReply::one(
                    Outcome::Toggled,
                    render_prompt(step, session.answer(&step.key)),
                ))
            }
            StepInput::Invalid(notice) => Ok(EngineReply::one(
                Outcome::Reprompted,
                render_prompt(step, session.answer(&step.key)).with_notice(notice),
            )),
            StepInput::Unrecognized => {
                debug!(user_id = %event.user_id, step = %step.key, event = event.kind.name(), "Unrecognized input");
                if event.kind.is_typed() {
                    Ok(EngineReply::one(
                        Outcome::Unrecognized,
                        render_prompt(step, session.answer(&step.key)).with_notice(mismatch_notice(step)),
                    ))
                } else {
                    Ok(EngineReply::silent(Outcome::Unrecognized))
                }
            }
        }
    }

    async fn advance(
        &self,
        mut session: ConversationSession,
        answered: &StepDefinition,
    ) -> FieldreportResult<EngineReply> {
        let status = session.advance(self.schedule.len());
        self.sessions.put(&session).await?;
        info!(user_id = %session.user_id, step = %answered.key, next = session.current_step, "Step answered");

        match (status, self.schedule.get(session.current_step)) {
            (SessionStatus::InProgress, Some(next)) => Ok(EngineReply::one(
                Outcome::Advanced {
                    step: session.current_step,
                },
                render_prompt(next, session.answer(&next.key)),
            )),
            _ => Ok(EngineReply::one(
                Outcome::AwaitingConfirmation,
                render_summary(&self.schedule, &session.answers),
            )),
        }
    }

    async fn on_confirmation(
        &self,
        guard: &IdentityGuard,
        mut session: ConversationSession,
        event: &InboundEvent,
    ) -> FieldreportResult<EngineReply> {
        if event.kind != EventKind::Confirm {
            debug!(user_id = %event.user_id, event = event.kind.name(), "Unrecognized input while awaiting confirmation");
            if event.kind.is_typed() {
                return Ok(EngineReply::one(
                    Outcome::Unrecognized,
                    render_summary(&self.schedule, &session.answers).with_notice(CONFIRM_OR_CANCEL),
                ));
            }
            return Ok(EngineReply::silent(Outcome::Unrecognized));
        }

        let report = Report::new(event.submitter(), session.answers.clone());
        let result = {
            let _busy = guard.in_flight();
            self.sink.submit(&report).await
        };

        if result.status() == SinkStatus::TotalFailure {
            warn!(user_id = %event.user_id, "Report submission failed on all sinks");
            return Ok(EngineReply::one(
                Outcome::SubmitFailed(result),
                render_summary(&self.schedule, &session.answers).with_notice(SUBMIT_FAILED),
            ));
        }

        session.complete();
        self.sessions.remove(&session.user_id).await?;
        info!(user_id = %event.user_id, status = ?result.status(), "Report submitted");

        let message = submitted_message(&result);
        Ok(EngineReply::one(
            Outcome::Submitted(result),
            new_report_button(OutboundPrompt::text(message)),
        ))
    }
}

fn submitted_message(result: &SinkReport) -> &'static str {
    match (&result.tabular, &result.notification) {
        (Err(_), _) => SUBMITTED_NO_TABLE,
        (_, Err(_)) => SUBMITTED_NO_NOTIFY,
        _ => SUBMITTED,
    }
}
