//! Conversation sessions for the fieldreport bot.
//!
//! One [`ConversationSession`] exists per user identity. Stores implement
//! [`SessionStore`]; the engine holds no session state of its own.

pub mod session;
pub mod store;

pub use session::{ConversationSession, SessionStatus};
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore};
