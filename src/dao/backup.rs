//! Timestamped state backups, restore lookup, and the browser-facing index.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::warn;

use crate::{clock, model::TallyState};

use super::{StoreError, StoreResult, Workspace, write_atomic};

/// One row of `backups/index.js`: the data file and its wrapper.
///
/// Field capitalization is part of the published index format.
#[derive(Debug, Serialize)]
struct IndexItem {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "JS")]
    js: String,
}

/// Snapshot the given state into a new timestamp-named backup file.
///
/// The companion `.js` wrapper and the index refresh are best-effort; a
/// failure there is logged and does not fail the backup.
pub fn create_backup(ws: &Workspace, state: &TallyState) -> StoreResult<PathBuf> {
    let path = ws
        .backup_dir()
        .join(format!("{}.json", clock::backup_stamp()));
    let body = serde_json::to_vec_pretty(state).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    write_atomic(&path, &body)?;

    if let Err(err) = ensure_wrapper_js(&path) {
        warn!(error = %err, "writing backup wrapper failed");
    }
    if let Err(err) = regenerate_index(ws) {
        warn!(error = %err, "refreshing backup index failed");
    }
    Ok(path)
}

/// List backup data-file names, newest first.
pub fn list_backups(ws: &Workspace) -> StoreResult<Vec<String>> {
    let dir = ws.backup_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(StoreError::Read { path: dir, source }),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.to_lowercase().ends_with(".json"))
        .collect();
    // Timestamp-named files, so lexicographic descending is newest first.
    names.sort_by(|a, b| b.cmp(a));
    Ok(names)
}

/// Load a backup by name and parse it as a state document.
///
/// Accepts the data file name or its wrapper name, with or without extension.
/// A missing file is a not-found error; malformed content is a parse error
/// (fatal for an explicit restore, unlike the live state file).
pub fn read_backup(ws: &Workspace, name: &str) -> StoreResult<TallyState> {
    let file_name = normalize_name(name);
    let path = ws.backup_dir().join(&file_name);

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::BackupNotFound(file_name));
        }
        Err(source) => return Err(StoreError::Read { path, source }),
    };
    serde_json::from_str(&raw).map_err(|source| StoreError::Parse { path, source })
}

/// Rebuild `backups/index.js`, creating any missing `.js` wrappers on the way.
pub fn regenerate_index(ws: &Workspace) -> StoreResult<()> {
    let dir = ws.backup_dir();
    let names = list_backups(ws)?;

    let mut items = Vec::with_capacity(names.len());
    for name in names {
        let stem = name.trim_end_matches(".json").trim_end_matches(".JSON");
        if let Err(err) = ensure_wrapper_js(&dir.join(&name)) {
            warn!(backup = %name, error = %err, "writing backup wrapper failed");
        }
        items.push(IndexItem {
            js: format!("{stem}.js"),
            name,
        });
    }

    let path = dir.join("index.js");
    let payload = serde_json::to_string(&items).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    write_atomic(
        &path,
        format!("window.__GACHA_BACKUPS__ = {payload};\n").as_bytes(),
    )
}

/// Write the `window.__GACHA_BACKUP__` wrapper next to a backup data file.
fn ensure_wrapper_js(json_path: &Path) -> StoreResult<()> {
    let data = fs::read(json_path).map_err(|source| StoreError::Read {
        path: json_path.to_path_buf(),
        source,
    })?;

    let js_path = json_path.with_extension("js");
    let mut body = Vec::with_capacity(data.len() + 32);
    body.extend_from_slice(b"window.__GACHA_BACKUP__ = ");
    body.extend_from_slice(&data);
    body.extend_from_slice(b";\n");
    write_atomic(&js_path, &body)
}

/// Map a user-supplied backup name to the data file name.
fn normalize_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let lower = base.to_lowercase();
    if lower.ends_with(".js") {
        format!("{}.json", base.trim_end_matches(".js").trim_end_matches(".JS"))
    } else if lower.ends_with(".json") {
        base
    } else {
        format!("{base}.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{tally, testutil::temp_workspace};
    use crate::model::Outcome;

    fn sample_state() -> TallyState {
        let mut state = TallyState::empty_now();
        state.record_win("alice", Outcome::Hit);
        state.record_win("bob", Outcome::Jackpot);
        state
    }

    #[test]
    fn test_backup_then_restore_roundtrip() {
        let ws = temp_workspace();
        let state = sample_state();
        tally::save_state(&ws, &state).unwrap();

        let path = create_backup(&ws, &state).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        let restored = read_backup(&ws, &name).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_read_backup_accepts_wrapper_and_bare_names() {
        let ws = temp_workspace();
        let state = sample_state();
        let path = create_backup(&ws, &state).unwrap();
        let stem = path.file_stem().unwrap().to_string_lossy().into_owned();

        assert_eq!(read_backup(&ws, &format!("{stem}.js")).unwrap(), state);
        assert_eq!(read_backup(&ws, &stem).unwrap(), state);
        assert_eq!(read_backup(&ws, &format!("{stem}.json")).unwrap(), state);
    }

    #[test]
    fn test_read_backup_missing_is_not_found() {
        let ws = temp_workspace();
        match read_backup(&ws, "2099-01-01_000000") {
            Err(StoreError::BackupNotFound(name)) => {
                assert_eq!(name, "2099-01-01_000000.json");
            }
            other => panic!("expected BackupNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_read_backup_rejects_malformed_content() {
        let ws = temp_workspace();
        write_atomic(&ws.backup_dir().join("broken.json"), b"[1,2,3]").unwrap();

        assert!(matches!(
            read_backup(&ws, "broken"),
            Err(StoreError::Parse { .. })
        ));
    }

    #[test]
    fn test_index_lists_newest_first_with_wrappers() {
        let ws = temp_workspace();
        let state = sample_state();
        write_atomic(
            &ws.backup_dir().join("2024-01-01_000000.json"),
            &serde_json::to_vec(&state).unwrap(),
        )
        .unwrap();
        write_atomic(
            &ws.backup_dir().join("2025-06-15_120000.json"),
            &serde_json::to_vec(&state).unwrap(),
        )
        .unwrap();

        regenerate_index(&ws).unwrap();

        let index = fs::read_to_string(ws.backup_dir().join("index.js")).unwrap();
        assert!(index.starts_with("window.__GACHA_BACKUPS__ = ["));
        let newest = index.find("2025-06-15_120000.json").unwrap();
        let oldest = index.find("2024-01-01_000000.json").unwrap();
        assert!(newest < oldest);
        assert!(index.contains(r#""JS":"2025-06-15_120000.js""#));
        assert!(ws.backup_dir().join("2024-01-01_000000.js").is_file());
    }

    #[test]
    fn test_wrapper_has_assignment_shape() {
        let ws = temp_workspace();
        let path = create_backup(&ws, &sample_state()).unwrap();
        let wrapper = fs::read_to_string(path.with_extension("js")).unwrap();
        assert!(wrapper.starts_with("window.__GACHA_BACKUP__ = {"));
        assert!(wrapper.ends_with(";\n"));
    }
}
