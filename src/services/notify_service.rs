//! Best-effort Discord notification orchestration.
//!
//! Nothing here returns an error to the caller: a notification failure must
//! never undo or block a state mutation that already committed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::{EnvConfig, Settings},
    dao::{
        self, Workspace,
        message_map::{FileMessageIdStore, MessageIdStore},
        tally::Session,
    },
    discord::{self, Notifier},
    model::TallyState,
};

/// Upsert the summary message for the current state, if notifications are on.
///
/// Honors the settings toggle and the `DISCORD_NOTIFY` override, lazily
/// creating a session when per-session messages are enabled.
pub async fn push_summary(ws: &Workspace, env: &EnvConfig, state: &TallyState) {
    let settings = Settings::load(ws);
    if !settings.discord_enabled && !env.notify_override {
        return;
    }

    let Some(notifier) = build_notifier(ws, env) else {
        return;
    };

    let session = ensure_session(ws, &settings, &notifier).await;
    let key = discord::summary_key(&settings, session.as_ref());
    let payload = discord::build_summary(state, &settings);

    match notifier.upsert(&key, payload).await {
        Ok(()) => info!(%key, "discord summary upsert ok"),
        Err(err) => warn!(%key, error = %err, "discord summary upsert failed"),
    }
}

/// Start a brand-new session (used by reset), archiving prior summaries.
pub async fn start_session(ws: &Workspace, env: &EnvConfig) {
    let settings = Settings::load(ws);
    let notifier = build_notifier(ws, env);
    let _ = begin_session(ws, &settings, notifier.as_ref()).await;
}

/// Return the current session, creating one (and archiving old summaries)
/// when none exists yet.
async fn ensure_session(
    ws: &Workspace,
    settings: &Settings,
    notifier: &Notifier,
) -> Option<Session> {
    if let Some(existing) = dao::tally::load_session(ws) {
        return Some(existing);
    }
    begin_session(ws, settings, Some(notifier)).await
}

async fn begin_session(
    ws: &Workspace,
    settings: &Settings,
    notifier: Option<&Notifier>,
) -> Option<Session> {
    let session = Session::new();
    if let Err(err) = dao::tally::write_session(ws, &session) {
        warn!(error = %err, "writing session failed");
        return None;
    }

    if settings.discord_enabled && settings.discord_archive_old_summary {
        if let Some(notifier) = notifier {
            let keep_key = discord::session_summary_key(&session.id);
            notifier.archive_summaries(settings, &keep_key).await;
        }
    }
    Some(session)
}

/// Construct the notifier from the configured credentials, logging the
/// reasons it cannot be built.
fn build_notifier(ws: &Workspace, env: &EnvConfig) -> Option<Notifier> {
    let map: Arc<dyn MessageIdStore> = Arc::new(FileMessageIdStore::new(ws.message_map_path()));
    match Notifier::from_env(env, map) {
        Ok(Some(notifier)) => Some(notifier),
        Ok(None) => {
            info!("discord notifications enabled but no credentials; skipping");
            None
        }
        Err(err) => {
            warn!(error = %err, "building discord notifier failed");
            None
        }
    }
}
