use crate::session::ConversationSession;
use async_trait::async_trait;
use fieldreport_core::{FieldreportError, FieldreportResult};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Maps user identity to that user's single session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored session, or `None`. A stored session that cannot be read
    /// is a [`FieldreportError::Session`].
    async fn get(&self, user_id: &str) -> FieldreportResult<Option<ConversationSession>>;
    /// Insert or overwrite the session for `session.user_id`.
    async fn put(&self, session: &ConversationSession) -> FieldreportResult<()>;
    /// Removing a missing session is not an error.
    async fn remove(&self, user_id: &str) -> FieldreportResult<()>;
    /// User ids with a readable stored session.
    async fn list(&self) -> FieldreportResult<Vec<String>>;
}

/// Sessions held in process memory; lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> FieldreportResult<Option<ConversationSession>> {
        Ok(self.sessions.read().await.get(user_id).cloned())
    }

    async fn put(&self, session: &ConversationSession) -> FieldreportResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> FieldreportResult<()> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }

    async fn list(&self) -> FieldreportResult<Vec<String>> {
        Ok(self.sessions.read().await.keys().cloned().collect())
    }
}

/// File-based session store: one JSON file per user, survives restarts.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: PathBuf) -> FieldreportResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn session_path(&self, user_id: &str) -> PathBuf {
        let stem: String = user_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{stem}.json"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, user_id: &str) -> FieldreportResult<Option<ConversationSession>> {
        let path = self.session_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(path).await?;
        let session: ConversationSession = serde_json::from_str(&data)
            .map_err(|e| FieldreportError::Session(format!("Failed to parse session: {e}")))?;
        Ok(Some(session))
    }

    async fn put(&self, session: &ConversationSession) -> FieldreportResult<()> {
        let path = self.session_path(&session.user_id);
        let json = serde_json::to_string_pretty(session)?;
        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> FieldreportResult<()> {
        let path = self.session_path(user_id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn list(&self) -> FieldreportResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<ConversationSession>(&data) {
                Ok(session) => ids.push(session.user_id),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                }
            }
        }
        Ok(ids)
    }
}
