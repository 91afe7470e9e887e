//! Load/save of the tally state plus session and audit-event documents.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{
    clock,
    model::{Outcome, TallyState},
};

use super::{StoreError, StoreResult, Workspace};

/// Per-run session scoping Discord summary messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque session identifier.
    pub id: String,
    /// RFC 3339 UTC start time.
    pub started_at: String,
}

impl Session {
    /// Fresh session with a random identifier.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: clock::now_utc_rfc3339(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// One immutable audit record written per update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// RFC 3339 UTC timestamp of the update.
    pub at: String,
    /// Winner name the update applied to.
    pub winner: String,
    /// Outcome tier: 0 ordinary win, 1 jackpot.
    pub hit_flag: u8,
    /// Operation that produced the event.
    pub operation: String,
}

impl AuditEvent {
    /// Audit record for a just-recorded win.
    pub fn for_update(winner: &str, outcome: Outcome) -> Self {
        Self {
            at: clock::now_utc_rfc3339(),
            winner: winner.to_string(),
            hit_flag: outcome.as_flag(),
            operation: "update".to_string(),
        }
    }
}

/// Load the live tally state.
///
/// A missing file yields an empty state; a corrupt file is logged and also
/// degrades to an empty state so a damaged document never bricks the tool.
/// Only genuine I/O failures propagate.
pub fn load_state(ws: &Workspace) -> StoreResult<TallyState> {
    let path = ws.state_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TallyState::empty_now());
        }
        Err(source) => return Err(StoreError::Read { path, source }),
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Ok(state),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "state file is corrupt; starting empty");
            Ok(TallyState::empty_now())
        }
    }
}

/// Persist the tally state atomically as pretty-printed JSON.
pub fn save_state(ws: &Workspace, state: &TallyState) -> StoreResult<()> {
    let path = ws.state_path();
    let body = serde_json::to_vec_pretty(state).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    ws.write_atomic(&path, &body)
}

/// Load the current session, if a valid one exists on disk.
pub fn load_session(ws: &Workspace) -> Option<Session> {
    let raw = fs::read_to_string(ws.session_path()).ok()?;
    let session: Session = serde_json::from_str(&raw).ok()?;
    (!session.id.is_empty()).then_some(session)
}

/// Persist the session atomically.
pub fn write_session(ws: &Workspace, session: &Session) -> StoreResult<()> {
    let path = ws.session_path();
    let body = serde_json::to_vec_pretty(session).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    ws.write_atomic(&path, &body)
}

/// Write one timestamp-named audit event file.
pub fn append_event(ws: &Workspace, event: &AuditEvent) -> StoreResult<()> {
    let path = ws.event_dir().join(format!("{}.json", clock::event_stamp()));
    let body = serde_json::to_vec_pretty(event).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    ws.write_atomic(&path, &body)
}
