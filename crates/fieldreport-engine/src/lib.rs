//! The conversation step engine.
//!
//! [`StepEngine`] consumes one [`InboundEvent`](fieldreport_core::InboundEvent)
//! at a time per user, validates it against the current step, updates the
//! user's session in the [`SessionStore`](fieldreport_session::SessionStore),
//! and returns the prompts to send back. The engine itself keeps no session
//! state between calls.
//!
//! # Main types
//!
//! - [`StepEngine`]: Event handler over a schedule, a store, a relay, and a sink.
//! - [`EngineReply`]: What happened plus the prompts to send.
//! - [`Outcome`]: Classification of a handled event.
//! - [`IdentityLocks`]: Per-user serialization with busy detection.

pub mod engine;
pub mod locks;
pub mod outcome;

pub use engine::StepEngine;
pub use locks::{IdentityGuard, IdentityLocks, InFlight};
pub use outcome::{EngineReply, Outcome};
