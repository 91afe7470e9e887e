//! Workspace directory layout and atomic file writes.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use super::{StoreError, StoreResult};

/// Environment variable overriding the workspace base directory.
const HOME_ENV: &str = "GACHA_TALLY_HOME";

/// Handle to the on-disk workspace holding all tally files.
///
/// Layout under the base directory: `data/` (state, export, session, message
/// map), `logs/` (audit events), `backups/`, plus `setting.json` and
/// `.env.local` at the root.
#[derive(Debug, Clone)]
pub struct Workspace {
    base: PathBuf,
}

impl Workspace {
    /// Resolve the workspace base: the `GACHA_TALLY_HOME` override, else the
    /// executable's directory, else the current directory.
    pub fn discover() -> Self {
        if let Some(base) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self::at(PathBuf::from(base));
        }
        let base = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(base)
    }

    /// Workspace rooted at an explicit base directory.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Create the `data/`, `logs/`, and `backups/` directories if absent.
    pub fn ensure_dirs(&self) -> StoreResult<()> {
        for dir in ["data", "logs", "backups"] {
            let path = self.base.join(dir);
            fs::create_dir_all(&path).map_err(|source| StoreError::Write { path, source })?;
        }
        Ok(())
    }

    /// Live tally state document.
    pub fn state_path(&self) -> PathBuf {
        self.base.join("data").join("current.json")
    }

    /// Browser export file.
    pub fn data_js_path(&self) -> PathBuf {
        self.base.join("data").join("data.js")
    }

    /// Settings file (workspace root, next to the executable).
    pub fn settings_path(&self) -> PathBuf {
        self.base.join("setting.json")
    }

    /// Per-run session document.
    pub fn session_path(&self) -> PathBuf {
        self.base.join("data").join("session.json")
    }

    /// Discord logical-key to message-id map.
    pub fn message_map_path(&self) -> PathBuf {
        self.base.join("data").join("discord_map.json")
    }

    /// Directory receiving audit event files.
    pub fn event_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    /// Directory receiving backup snapshots and the backup index.
    pub fn backup_dir(&self) -> PathBuf {
        self.base.join("backups")
    }

    /// Optional dotenv-style file merged into the environment configuration.
    pub fn dotenv_path(&self) -> PathBuf {
        self.base.join(".env.local")
    }

    /// Write a file atomically: write to a hidden temp file in the same
    /// directory, flush, then rename over the destination.
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        write_atomic(path, data)
    }
}

/// Atomic write-to-temp-then-rename, creating parent directories as needed.
pub fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    use std::io::Write;

    let as_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(as_err)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".into());
    let tmp = dir.join(format!(".{file_name}.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        // Windows refuses to rename over an existing file.
        #[cfg(windows)]
        let _ = fs::remove_file(path);
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(as_err)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::Workspace;

    /// Unique throwaway workspace under the system temp directory.
    pub(crate) fn temp_workspace() -> Workspace {
        let base = std::env::temp_dir().join(format!("gacha-tally-test-{}", uuid::Uuid::new_v4()));
        let ws = Workspace::at(base);
        ws.ensure_dirs().unwrap();
        ws
    }
}
