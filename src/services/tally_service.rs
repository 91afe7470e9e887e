//! Core tally operations shared by the CLI and the HTTP API.
//!
//! Every operation is a full load-mutate-save cycle against the workspace
//! files. Once the state mutation is committed, auxiliary steps (export
//! regeneration, notification, audit logging) are logged and swallowed.

use std::path::PathBuf;

use tracing::warn;

use crate::{
    config::{EnvConfig, Settings},
    dao::{self, Workspace},
    dto::validation,
    error::ServiceError,
    export,
    model::{Outcome, RecordStatus, TallyState},
    services::notify_service,
};

/// Record one win for the named winner.
///
/// Validates the name and outcome flag before touching anything; the state
/// write and export regeneration follow, then the best-effort side effects.
pub async fn record_win(
    ws: &Workspace,
    env: &EnvConfig,
    winner: &str,
    flag: &str,
) -> Result<(), ServiceError> {
    let winner = winner.trim();
    validation::validate_winner_name(winner).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string()),
        )
    })?;
    let outcome = Outcome::parse(flag)
        .ok_or_else(|| ServiceError::InvalidInput("hitFlag must be 0 or 1".into()))?;

    let mut state = dao::tally::load_state(ws)?;
    state.record_win(winner, outcome);
    dao::tally::save_state(ws, &state)?;

    regenerate_export_lenient(ws);
    notify_service::push_summary(ws, env, &state).await;

    if Settings::load(ws).event_json_log {
        let event = dao::tally::AuditEvent::for_update(winner, outcome);
        if let Err(err) = dao::tally::append_event(ws, &event) {
            warn!(error = %err, "writing audit event failed");
        }
    }
    Ok(())
}

/// Back up the current state, then clear it and start a new session.
pub async fn reset(ws: &Workspace, env: &EnvConfig) -> Result<(), ServiceError> {
    backup(ws)?;

    let state = TallyState::empty_now();
    dao::tally::save_state(ws, &state)?;
    regenerate_export_lenient(ws);

    notify_service::start_session(ws, env).await;
    Ok(())
}

/// Snapshot the current state into a timestamped backup file.
pub fn backup(ws: &Workspace) -> Result<PathBuf, ServiceError> {
    let state = dao::tally::load_state(ws)?;
    Ok(dao::backup::create_backup(ws, &state)?)
}

/// Restore a named backup over the live state.
pub fn restore(ws: &Workspace, name: &str) -> Result<(), ServiceError> {
    let state = dao::backup::read_backup(ws, name)?;
    dao::tally::save_state(ws, &state)?;
    regenerate_export_lenient(ws);
    Ok(())
}

/// Regenerate the browser export file.
pub fn regenerate_export(ws: &Workspace) -> Result<(), ServiceError> {
    Ok(export::generate(ws)?)
}

/// Rebuild the backup index and any missing wrapper files.
pub fn regenerate_backup_index(ws: &Workspace) -> Result<(), ServiceError> {
    Ok(dao::backup::regenerate_index(ws)?)
}

/// Backup data-file names, newest first.
pub fn list_backups(ws: &Workspace) -> Result<Vec<String>, ServiceError> {
    Ok(dao::backup::list_backups(ws)?)
}

/// Set the completion flag on a record, then refresh export and summary.
pub async fn set_done(
    ws: &Workspace,
    env: &EnvConfig,
    name: &str,
    done: bool,
) -> Result<(), ServiceError> {
    mutate_record(ws, env, name, |state, name| state.set_done(name, done)).await
}

/// Set the workflow status on a record, then refresh export and summary.
pub async fn set_status(
    ws: &Workspace,
    env: &EnvConfig,
    name: &str,
    status: &str,
) -> Result<(), ServiceError> {
    let status = RecordStatus::parse(status)
        .ok_or_else(|| ServiceError::InvalidInput("bad status".into()))?;
    mutate_record(ws, env, name, |state, name| state.set_status(name, status)).await
}

async fn mutate_record(
    ws: &Workspace,
    env: &EnvConfig,
    name: &str,
    apply: impl FnOnce(&mut TallyState, &str) -> bool,
) -> Result<(), ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("missing name".into()));
    }

    let mut state = dao::tally::load_state(ws)?;
    if !apply(&mut state, name) {
        return Err(ServiceError::NotFound(format!("user `{name}` not found")));
    }
    dao::tally::save_state(ws, &state)?;

    regenerate_export_lenient(ws);
    notify_service::push_summary(ws, env, &state).await;
    Ok(())
}

/// Export regeneration after a committed mutation; failure is logged, never
/// propagated, so the committed write stands.
fn regenerate_export_lenient(ws: &Workspace) {
    if let Err(err) = export::generate(ws) {
        warn!(error = %err, "regenerating data.js failed");
    }
}
