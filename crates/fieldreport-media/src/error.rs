use thiserror::Error;

/// Why a media file could not be relayed. Every kind is retryable by
/// resubmitting the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The storage backend could not be reached or refused the upload.
    #[error("media storage unavailable: {0}")]
    RelayUnavailable(String),

    /// The file could not be retrieved from the chat transport.
    #[error("could not fetch source file: {0}")]
    SourceFetchFailed(String),

    /// The file exceeds the configured size ceiling.
    #[error("source file is {size} bytes, limit is {limit} bytes")]
    SourceFileTooLarge { size: u64, limit: u64 },
}

impl RelayError {
    /// Message shown to the user when asking them to resend.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::RelayUnavailable(_) => {
                "The file storage is unavailable right now. Please send the file again.".into()
            }
            RelayError::SourceFetchFailed(_) => {
                "Could not download your file. Please send it again.".into()
            }
            RelayError::SourceFileTooLarge { limit, .. } => format!(
                "The file is too large (limit {}). Please send a smaller file.",
                readable_size(*limit)
            ),
        }
    }
}

/// Whole MB, or whole KB below one MB, rounded up so a limit never reads as 0.
fn readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{} MB", bytes.div_ceil(MB))
    } else {
        format!("{} KB", bytes.div_ceil(KB))
    }
}
