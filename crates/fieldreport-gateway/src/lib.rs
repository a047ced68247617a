//! HTTP gateway for the field-report bot.
//!
//! [`GatewayServer`] exposes the Telegram webhook and a health check;
//! [`EventRouter`] connects channel updates to the
//! [`StepEngine`](fieldreport_engine::StepEngine) and sends the replies back.
//! Polling mode reuses the same router through [`EventRouter::run`].

pub mod router;
pub mod server;
pub mod webhook;

pub use router::EventRouter;
pub use server::{GatewayServer, GatewayState};
