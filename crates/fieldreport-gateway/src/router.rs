use fieldreport_channels::{Channel, ChannelEvent, ChannelUpdate};
use fieldreport_core::FieldreportResult;
use fieldreport_engine::StepEngine;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Routes channel updates through the engine and sends the replies back.
pub struct EventRouter {
    engine: Arc<StepEngine>,
    channel: Arc<dyn Channel>,
}

impl EventRouter {
    /// Route through `engine` and reply on `channel`.
    pub fn new(engine: Arc<StepEngine>, channel: Arc<dyn Channel>) -> Self {
        Self { engine, channel }
    }

    /// Acknowledge, run the engine, send every reply prompt in order.
    pub async fn route(&self, update: ChannelUpdate) -> FieldreportResult<()> {
        if let Some(callback_id) = &update.callback_id {
            // A failed acknowledgement only leaves a spinner on the button.
            if let Err(e) = self.channel.acknowledge(callback_id).await {
                warn!(callback_id = %callback_id, error = %e, "Callback acknowledgement failed");
            }
        }

        let Some(event) = update.event else {
            debug!("Ignoring update without a recognized action");
            return Ok(());
        };

        let reply = self.engine.handle(&event).await?;
        debug!(
            user_id = %event.user_id,
            event = event.kind.name(),
            outcome = ?reply.outcome,
            prompts = reply.prompts.len(),
            "Event handled"
        );

        for prompt in &reply.prompts {
            self.channel.send(&event.chat_id, prompt).await?;
        }
        Ok(())
    }

    /// Route `update` on its own task so slow I/O for one user never holds
    /// up another.
    pub fn dispatch(self: &Arc<Self>, update: ChannelUpdate) {
        let router = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = router.route(update).await {
                error!(channel = router.channel.name(), error = %e, "Failed to route update");
            }
        });
    }

    /// Drain a channel's event receiver until the channel disconnects.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<ChannelEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ChannelEvent::UpdateReceived(update) => self.dispatch(update),
                ChannelEvent::Disconnected(reason) => {
                    warn!(channel = self.channel.name(), reason = %reason, "Channel disconnected");
                    break;
                }
            }
        }
        info!(channel = self.channel.name(), "Event loop finished");
    }
}
