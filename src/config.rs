//! Settings file handling and environment-derived configuration.
//!
//! Both are constructed explicitly and passed into the components that need
//! them; nothing else in the crate reads the process environment.

use std::{collections::HashMap, env, fs};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::dao::{StoreError, StoreResult, Workspace};

/// Default API server port.
const DEFAULT_PORT: u16 = 3010;
/// Default archive label prefixed to retired summary messages.
const DEFAULT_ARCHIVE_LABEL: &str = "アーカイブ";
/// Default Discord summary embed title.
const DEFAULT_TITLE: &str = "集計（最新）";

/// Persistent options from `setting.json`.
///
/// Missing keys fall back to defaults on load; [`ensure_settings`] backfills
/// them into the file while preserving keys it does not recognize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Write one audit JSON file per update.
    pub event_json_log: bool,
    /// Auto-start the companion API server for non-serve commands.
    pub auto_serve: bool,
    /// Port the API server listens on.
    pub server_port: u16,
    /// Master switch for Discord notifications.
    pub discord_enabled: bool,
    /// Track one summary message per session instead of a single global one.
    pub discord_new_message_per_session: bool,
    /// Relabel prior-session summaries when a new session starts.
    pub discord_archive_old_summary: bool,
    /// Label used in the archive header.
    pub discord_archive_label: String,
    /// Title of the live summary embed.
    pub discord_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            event_json_log: false,
            auto_serve: true,
            server_port: DEFAULT_PORT,
            discord_enabled: true,
            discord_new_message_per_session: true,
            discord_archive_old_summary: true,
            discord_archive_label: DEFAULT_ARCHIVE_LABEL.to_string(),
            discord_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable. Never fails; a corrupt file is logged and ignored.
    pub fn load(ws: &Workspace) -> Self {
        let path = ws.settings_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        let mut settings = match serde_json::from_str::<Self>(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "settings file is corrupt; using defaults");
                return Self::default();
            }
        };
        if settings.server_port == 0 {
            settings.server_port = DEFAULT_PORT;
        }
        settings
    }
}

/// Create `setting.json` with defaults if absent, or backfill any recognized
/// keys that are missing while preserving unknown keys already present.
pub fn ensure_settings(ws: &Workspace) -> StoreResult<()> {
    let path = ws.settings_path();
    let encode = |source| StoreError::Encode {
        path: path.clone(),
        source,
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let body = serde_json::to_vec_pretty(&Settings::default()).map_err(encode)?;
            return ws.write_atomic(&path, &body);
        }
        Err(source) => return Err(StoreError::Read { path, source }),
    };

    // A corrupt file is left alone; load() already degrades to defaults.
    let Ok(mut current) = serde_json::from_str::<serde_json::Map<String, Value>>(&raw) else {
        return Ok(());
    };

    let defaults = serde_json::to_value(Settings::default()).map_err(encode)?;
    let Value::Object(defaults) = defaults else {
        return Ok(());
    };

    let mut changed = false;
    for (key, value) in defaults {
        if !current.contains_key(&key) {
            current.insert(key, value);
            changed = true;
        }
    }

    if changed {
        let body = serde_json::to_vec_pretty(&current).map_err(encode)?;
        ws.write_atomic(&path, &body)?;
    }
    Ok(())
}

/// Discord credentials and overrides resolved once at startup.
///
/// Values come from the process environment, with a `.env.local` file in the
/// workspace filling in anything unset; process values take precedence.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// `DISCORD_NOTIFY` truthy: force notifications on regardless of settings.
    pub notify_override: bool,
    /// `DISCORD_BOT_TOKEN`.
    pub bot_token: Option<String>,
    /// `DISCORD_CHANNEL_ID`.
    pub channel_id: Option<String>,
    /// `DISCORD_WEBHOOK_URL`.
    pub webhook_url: Option<String>,
}

impl EnvConfig {
    /// Resolve the configuration from the environment and the workspace's
    /// `.env.local` file.
    pub fn load(ws: &Workspace) -> Self {
        let file_vars = read_dotenv(ws);
        let lookup = |key: &str| {
            env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            notify_override: lookup("DISCORD_NOTIFY").is_some_and(|v| is_truthy(&v)),
            bot_token: lookup("DISCORD_BOT_TOKEN"),
            channel_id: lookup("DISCORD_CHANNEL_ID"),
            webhook_url: lookup("DISCORD_WEBHOOK_URL"),
        }
    }
}

/// Parse the workspace's `.env.local`: `key=value` lines, `#` comments,
/// optional single or double quotes, UTF-8 BOM tolerated.
fn read_dotenv(ws: &Workspace) -> HashMap<String, String> {
    let Ok(content) = fs::read_to_string(ws.dotenv_path()) else {
        return HashMap::new();
    };
    parse_dotenv(&content)
}

fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.trim_start_matches('\u{feff}').lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();
        if (value.starts_with('"') && value.ends_with('"') && value.len() >= 2)
            || (value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2)
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            vars.insert(key.to_string(), value.to_string());
        }
    }
    vars
}

/// Interpret common truthy strings.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
