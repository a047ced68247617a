//! `fieldreport.toml` loading.
//!
//! Values come from the TOML file, then from environment variables (a `.env`
//! file is loaded first), which win. Secrets are usually supplied only through
//! the environment.

use fieldreport_core::{FieldreportError, FieldreportResult, StepDefinition, StepSchedule};
use fieldreport_media::relay::DEFAULT_MAX_BYTES;
use fieldreport_sinks::MediaSource;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct FieldreportConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Manager handles offered by the built-in schedule.
    #[serde(default = "default_managers")]
    pub managers: Vec<String>,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Custom schedule; the built-in field-report schedule when empty.
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Public URL Telegram should deliver updates to in `serve` mode.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            webhook_url: None,
            api_base: default_telegram_api(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Credentials shared by the storage and spreadsheet backends.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleConfig {
    /// Service-account key; tokens are refreshed from it automatically.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Fixed bearer token, used only without a key file.
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Gcs,
    Drive,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// GCS bucket.
    #[serde(default)]
    pub bucket: String,
    /// Drive folder.
    #[serde(default)]
    pub folder_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_range")]
    pub range: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: default_range(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_extension")]
    pub default_extension: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            default_extension: default_extension(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub chat_id: String,
    /// Forum topic inside the chat.
    #[serde(default)]
    pub thread_id: Option<i64>,
    #[serde(default)]
    pub media_source: MediaSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionsConfig {
    #[serde(default)]
    pub backend: SessionBackend,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_managers() -> Vec<String> {
    vec!["@alice".into(), "@bob".into(), "@charlie".into()]
}
fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_range() -> String {
    "Sheet1!A:Z".to_string()
}
fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}
fn default_extension() -> String {
    "jpg".to_string()
}

fn config_err(msg: impl Into<String>) -> FieldreportError {
    FieldreportError::Config(msg.into())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> FieldreportResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| config_err(format!("{key} is not valid: {value:?}")))
}

impl FieldreportConfig {
    pub fn from_toml_str(source: &str) -> FieldreportResult<Self> {
        toml::from_str(source).map_err(|e| config_err(e.to_string()))
    }

    /// Read `path` (defaults only when it does not exist) and apply the
    /// process environment.
    pub async fn load(path: &Path) -> FieldreportResult<Self> {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults and environment");
                String::new()
            }
            Err(e) => {
                return Err(config_err(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                )))
            }
        };
        let mut config = Self::from_toml_str(&source)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override values from environment variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> FieldreportResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("WEBHOOK_URL") {
            self.telegram.webhook_url = Some(v);
        }
        if let Some(v) = get("TARGET_CHAT_ID") {
            self.notification.chat_id = v;
        }
        if let Some(v) = get("TARGET_TOPIC_ID") {
            self.notification.thread_id = Some(parse_env("TARGET_TOPIC_ID", &v)?);
        }
        if let Some(v) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            self.google.credentials_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("GOOGLE_ACCESS_TOKEN") {
            self.google.access_token = v;
        }
        if let Some(v) = get("SHEET_ID") {
            self.sheets.spreadsheet_id = v;
        }
        if let Some(v) = get("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        Ok(())
    }

    /// Check everything the running bot needs.
    pub fn validate(&self) -> FieldreportResult<()> {
        let require = |value: &str, what: &str| {
            if value.trim().is_empty() {
                Err(config_err(format!("{what} is required")))
            } else {
                Ok(())
            }
        };

        require(&self.telegram.bot_token, "telegram.bot_token (BOT_TOKEN)")?;
        require(&self.notification.chat_id, "notification.chat_id (TARGET_CHAT_ID)")?;
        require(&self.sheets.spreadsheet_id, "sheets.spreadsheet_id (SHEET_ID)")?;
        match self.storage.backend {
            StorageBackend::Gcs => require(&self.storage.bucket, "storage.bucket (STORAGE_BUCKET)")?,
            StorageBackend::Drive => require(&self.storage.folder_id, "storage.folder_id")?,
        }

        if self.http_timeout_secs == 0 {
            return Err(config_err("http_timeout_secs must be positive"));
        }
        if self.media.max_bytes == 0 {
            return Err(config_err("media.max_bytes must be positive"));
        }
        self.schedule().map(|_| ())
    }

    /// The configured schedule, or the built-in one.
    pub fn schedule(&self) -> FieldreportResult<StepSchedule> {
        if self.steps.is_empty() {
            StepSchedule::field_report(&self.managers)
        } else {
            StepSchedule::new(self.steps.clone())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use fieldreport_core::InputKind;
    use std::collections::HashMap;

    const FULL: &str = r#"
        data_dir = "/var/lib/fieldreport"

        [telegram]
        bot_token = "123:abc"

        [google]
        credentials_file = "/etc/fieldreport/service-account.json"

        [storage]
        backend = "drive"
        folder_id = "folder-1"

        [sheets]
        spreadsheet_id = "sheet-1"

        [notification]
        chat_id = "-1001234"
        thread_id = 7
        media_source = "transport"

        [sessions]
        backend = "file"
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = FieldreportConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.sheets.range, "Sheet1!A:Z");
        assert_eq!(config.media.max_bytes, 20 * 1024 * 1024);
        assert_eq!(config.storage.backend, StorageBackend::Gcs);
        assert_eq!(config.sessions.backend, SessionBackend::Memory);
        assert_eq!(config.notification.media_source, MediaSource::Rehosted);
        assert!(config.validate().is_err());
    }

    #[test]
    fn full_file_validates() {
        let config = FieldreportConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Drive);
        assert_eq!(config.notification.thread_id, Some(7));
        assert_eq!(config.notification.media_source, MediaSource::Transport);
        assert_eq!(config.sessions.backend, SessionBackend::File);
        assert_eq!(
            config.google.credentials_file,
            Some(PathBuf::from("/etc/fieldreport/service-account.json"))
        );
        config.validate().unwrap();
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = FieldreportConfig::from_toml_str(FULL).unwrap();
        config
            .apply_env(env(&[
                ("BOT_TOKEN", "999:zzz"),
                ("TARGET_TOPIC_ID", "12"),
                ("GOOGLE_ACCESS_TOKEN", "fresh"),
                ("GOOGLE_APPLICATION_CREDENTIALS", "/run/secrets/sa.json"),
                ("PORT", "8080"),
                ("WEBHOOK_URL", "https://bot.example.com/webhook"),
                ("SHEET_ID", "  "),
            ]))
            .unwrap();

        assert_eq!(config.telegram.bot_token, "999:zzz");
        assert_eq!(config.notification.thread_id, Some(12));
        assert_eq!(config.google.access_token, "fresh");
        assert_eq!(
            config.google.credentials_file,
            Some(PathBuf::from("/run/secrets/sa.json"))
        );
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.telegram.webhook_url.as_deref(),
            Some("https://bot.example.com/webhook")
        );
        // Blank values do not clobber the file.
        assert_eq!(config.sheets.spreadsheet_id, "sheet-1");
    }

    #[test]
    fn invalid_numeric_env_is_config_error() {
        let mut config = FieldreportConfig::from_toml_str("").unwrap();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, FieldreportError::Config(msg) if msg.contains("PORT")));
    }

    #[test]
    fn gcs_backend_needs_bucket() {
        let source = FULL.replace("backend = \"drive\"", "backend = \"gcs\"");
        let config = FieldreportConfig::from_toml_str(&source).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("storage.bucket"));
    }

    #[test]
    fn builtin_schedule_uses_managers() {
        let config = FieldreportConfig::from_toml_str(r#"managers = ["@kim", "@lee"]"#).unwrap();
        let schedule = config.schedule().unwrap();
        assert_eq!(schedule.len(), 13);
        let managers = schedule.get(0).unwrap();
        assert_eq!(managers.kind, InputKind::MultiChoice);
        assert_eq!(managers.choices.len(), 2);
        assert_eq!(managers.choices[0].id, "@kim");
    }

    #[test]
    fn custom_steps_replace_builtin_schedule() {
        let config = FieldreportConfig::from_toml_str(
            r#"
            [[steps]]
            key = "site"
            label = "Site"
            kind = "free_text"
            prompt = "Which site?"

            [[steps]]
            key = "status"
            label = "Status"
            kind = "single_choice"
            prompt = "Status?"
            choices = [{ id = "ok", label = "OK" }, { id = "late", label = "Late" }]

            [[steps]]
            key = "photo"
            label = "Photo"
            kind = "media"
            prompt = "Photo?"
            optional = true
            "#,
        )
        .unwrap();
        let schedule = config.schedule().unwrap();
        assert_eq!(schedule.len(), 3);
        assert!(schedule.get(2).unwrap().optional);
    }

    #[test]
    fn invalid_custom_steps_are_rejected() {
        let config = FieldreportConfig::from_toml_str(
            r#"
            [[steps]]
            key = "status"
            label = "Status"
            kind = "single_choice"
            prompt = "Status?"
            "#,
        )
        .unwrap();
        assert!(config.schedule().is_err());
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fieldreport.toml");
        tokio::fs::write(&path, FULL).await.unwrap();

        let config = FieldreportConfig::load(&path).await.unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/fieldreport"));
    }

    #[tokio::test]
    async fn load_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FieldreportConfig::load(&dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config.sheets.range, "Sheet1!A:Z");
    }
}
