use crate::error::RelayError;
use crate::naming::{normalize_download_url, object_name};
use crate::source::FileSource;
use crate::storage::DurableStorage;
use async_trait::async_trait;
use fieldreport_core::TransportFileRef;
use std::sync::Arc;
use tracing::{info, warn};

/// Default size ceiling: the Bot API's own download limit.
pub const DEFAULT_MAX_BYTES: u64 = 20 * 1024 * 1024;

/// A file now hosted durably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedMedia {
    /// Public direct-download URL.
    pub url: String,
    /// The transport's file id, still usable to re-send the original.
    pub transport_id: String,
}

/// Turns a transport file reference into a durable URL.
#[async_trait]
pub trait MediaRelay: Send + Sync {
    async fn relay(&self, file: &TransportFileRef) -> Result<RelayedMedia, RelayError>;
}

/// Relay over a [`FileSource`] and a [`DurableStorage`].
pub struct StorageRelay {
    source: Arc<dyn FileSource>,
    storage: Arc<dyn DurableStorage>,
    max_bytes: u64,
    default_extension: String,
}

impl StorageRelay {
    /// Relay from `source` into `storage` with the default size ceiling.
    pub fn new(source: Arc<dyn FileSource>, storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            source,
            storage,
            max_bytes: DEFAULT_MAX_BYTES,
            default_extension: "jpg".to_string(),
        }
    }

    /// Refuse files larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Extension used when neither the file name nor the transport path has one.
    pub fn with_default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }
}

#[async_trait]
impl MediaRelay for StorageRelay {
    async fn relay(&self, file: &TransportFileRef) -> Result<RelayedMedia, RelayError> {
        if let Some(size) = file.file_size {
            if size > self.max_bytes {
                return Err(RelayError::SourceFileTooLarge {
                    size,
                    limit: self.max_bytes,
                });
            }
        }

        let fetched = self.source.fetch(file, self.max_bytes).await?;
        let name = object_name(file, fetched.source_path.as_deref(), &self.default_extension);
        let content_type = file
            .mime_type
            .clone()
            .or(fetched.mime_type)
            .unwrap_or_else(|| mime_guess::from_path(&name).first_or_octet_stream().to_string());
        let size = fetched.bytes.len();

        let object_id = self.storage.put(&name, fetched.bytes, &content_type).await?;
        if let Err(e) = self.storage.make_public(&object_id).await {
            warn!(backend = self.storage.name(), object = %object_id, error = %e, "Could not publish object");
            return Err(e);
        }
        let url = normalize_download_url(&self.storage.public_url(&object_id).await?);

        info!(
            backend = self.storage.name(),
            object = %name,
            bytes = size,
            content_type = %content_type,
            "Media relayed"
        );
        Ok(RelayedMedia {
            url,
            transport_id: file.file_id.clone(),
        })
    }
}
