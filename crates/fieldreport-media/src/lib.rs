//! Media relay: moves a file from the chat transport to durable storage.
//!
//! The relay fetches bytes through a [`FileSource`], uploads them to a
//! [`DurableStorage`] backend under a collision-resistant name, makes the
//! object public, and returns a direct-download URL.
//!
//! # Main types
//!
//! - [`MediaRelay`]: Trait the step engine calls on media steps.
//! - [`StorageRelay`]: The standard relay over a source and a storage.
//! - [`RelayError`]: Retryable failure kinds.
//! - [`TelegramFileSource`]: Downloads files via the Telegram Bot API.
//! - [`GcsStorage`], [`DriveStorage`]: Google Cloud Storage and Google Drive backends.

/// Relay failure kinds.
pub mod error;
/// Object naming and URL normalization.
pub mod naming;
/// The relay trait and its storage-backed implementation.
pub mod relay;
/// Transport file sources.
pub mod source;
/// Durable storage backends.
pub mod storage;

pub use error::RelayError;
pub use naming::{normalize_download_url, object_name};
pub use relay::{MediaRelay, RelayedMedia, StorageRelay};
pub use source::{FetchedFile, FileSource, TelegramFileSource};
pub use storage::{DriveStorage, DurableStorage, GcsStorage};
