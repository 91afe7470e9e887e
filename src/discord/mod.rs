//! Discord summary notifier: builds the tally embed and keeps exactly one
//! live remote message per logical key up to date.

pub mod error;
pub mod transport;

use std::sync::Arc;

use tracing::warn;

use crate::{
    clock,
    config::{EnvConfig, Settings},
    dao::{message_map::MessageIdStore, tally::Session},
    model::{RecordStatus, TallyState, UserRecord},
};

pub use error::{DiscordError, DiscordResult};
pub use transport::{
    BotTransport, Embed, EmbedField, EmbedFooter, MessagePayload, MessageTransport, RemoteMessage,
    WebhookTransport,
};

/// Base logical key under which summary messages are tracked.
pub const SUMMARY_KEY: &str = "__SUMMARY__";
/// Accent color of the live summary embed (emerald).
const SUMMARY_COLOR: u32 = 0x10B981;
/// Accent color applied to archived summaries (gray).
const ARCHIVE_COLOR: u32 = 0x9CA3AF;
/// Placeholder rendered for an empty winner group.
const EMPTY_GROUP: &str = "なし";
/// Label of the animated-tier winners field.
const GIF_FIELD: &str = "---大当たり（Gif）---";
/// Label of the illustration-tier winners field.
const ILLUST_FIELD: &str = "---当たり（イラスト）---";
/// Footer shown under the summary embed.
const SUMMARY_FOOTER: &str = "最終更新";
/// Archive label fallback when the setting is blank.
const DEFAULT_ARCHIVE_LABEL: &str = "アーカイブ";
/// Summary title fallback when the setting is blank.
const DEFAULT_TITLE: &str = "集計（最新）";

/// Upserts summary messages through a transport, remembering message ids in a
/// [`MessageIdStore`].
pub struct Notifier {
    transport: Arc<dyn MessageTransport>,
    map: Arc<dyn MessageIdStore>,
}

impl Notifier {
    /// Notifier over an explicit transport and message-id store.
    pub fn new(transport: Arc<dyn MessageTransport>, map: Arc<dyn MessageIdStore>) -> Self {
        Self { transport, map }
    }

    /// Build a notifier from the configured credentials.
    ///
    /// The bot token takes precedence over the webhook URL; with neither
    /// configured the result is `Ok(None)`.
    pub fn from_env(env: &EnvConfig, map: Arc<dyn MessageIdStore>) -> DiscordResult<Option<Self>> {
        let transport: Arc<dyn MessageTransport> =
            match (env.bot_token.as_deref(), env.channel_id.as_deref()) {
                (Some(token), Some(channel_id)) => Arc::new(BotTransport::new(token, channel_id)?),
                _ => match env.webhook_url.as_deref() {
                    Some(url) => Arc::new(WebhookTransport::from_url(url)?),
                    None => return Ok(None),
                },
            };
        Ok(Some(Self::new(transport, map)))
    }

    /// Create or edit the remote message tracked under `key`.
    ///
    /// A failed edit (e.g. the remote message was deleted) falls back to
    /// posting a new message and re-pointing the key at it, so the tracked
    /// message converges without querying the remote side first.
    pub async fn upsert(&self, key: &str, payload: MessagePayload) -> DiscordResult<()> {
        let Some(existing) = self.map.get(key) else {
            if let Some(id) = self.transport.post(payload).await? {
                self.map.set(key, &id)?;
            }
            return Ok(());
        };

        match self.transport.edit(existing, payload.clone()).await {
            Ok(()) => Ok(()),
            Err(edit_err) => {
                if let Ok(Some(id)) = self.transport.post(payload).await {
                    self.map.set(key, &id)?;
                    return Ok(());
                }
                Err(edit_err)
            }
        }
    }

    /// Relabel every tracked summary message from a prior session.
    ///
    /// `keep_key` (the new session's own key) is left alone, as is any message
    /// that already carries the archive header. Entirely best-effort: each
    /// failure is logged and the loop moves on.
    pub async fn archive_summaries(&self, settings: &Settings, keep_key: &str) {
        let header = archive_header(settings);
        for (key, message_id) in self.map.entries() {
            if !key.starts_with(SUMMARY_KEY) || key == keep_key || message_id.is_empty() {
                continue;
            }

            let message = match self.transport.get(message_id.clone()).await {
                Ok(message) => message,
                Err(err) => {
                    warn!(%key, error = %err, "fetching summary for archiving failed");
                    continue;
                }
            };

            let payload = if let Some(first) = message.embeds.into_iter().next() {
                MessagePayload::embed(Embed {
                    title: Some(header.clone()),
                    color: Some(ARCHIVE_COLOR),
                    ..first
                })
            } else if !has_archive_header(&message.content, settings) {
                MessagePayload::embed(Embed {
                    title: Some(header.clone()),
                    description: Some(message.content),
                    color: Some(ARCHIVE_COLOR),
                    ..Embed::default()
                })
            } else {
                continue;
            };

            if let Err(err) = self.transport.edit(message_id, payload).await {
                warn!(%key, error = %err, "archiving summary failed");
            }
        }
    }
}

/// Logical key the current summary message is tracked under.
pub fn summary_key(settings: &Settings, session: Option<&Session>) -> String {
    match session {
        Some(session) if settings.discord_new_message_per_session && !session.id.is_empty() => {
            format!("{SUMMARY_KEY}::{}", session.id)
        }
        _ => SUMMARY_KEY.to_string(),
    }
}

/// Summary key belonging to a specific session id.
pub fn session_summary_key(session_id: &str) -> String {
    format!("{SUMMARY_KEY}::{session_id}")
}

/// Compose the live summary embed for the given state.
///
/// Winners are grouped by their derived eligibility (gif tier wins over
/// illustration tier), sorted by name, and prefixed with a status glyph.
pub fn build_summary(state: &TallyState, settings: &Settings) -> MessagePayload {
    let mut gif_names = Vec::new();
    let mut illust_names = Vec::new();
    for user in &state.users {
        if user.flags.gif {
            gif_names.push(format!("{}{}", status_glyph(user), user.name));
        } else if user.flags.illust {
            illust_names.push(format!("{}{}", status_glyph(user), user.name));
        }
    }
    gif_names.sort();
    illust_names.sort();

    let group_value = |names: Vec<String>| {
        if names.is_empty() {
            EMPTY_GROUP.to_string()
        } else {
            names.join("\n")
        }
    };

    let title = if settings.discord_title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        settings.discord_title.clone()
    };

    MessagePayload::embed(Embed {
        title: Some(title),
        description: None,
        color: Some(SUMMARY_COLOR),
        fields: vec![
            EmbedField {
                name: GIF_FIELD.to_string(),
                value: group_value(gif_names),
                inline: false,
            },
            EmbedField {
                name: ILLUST_FIELD.to_string(),
                value: group_value(illust_names),
                inline: false,
            },
        ],
        timestamp: (!state.updated_at.is_empty()).then(|| state.updated_at.clone()),
        footer: Some(EmbedFooter {
            text: SUMMARY_FOOTER.to_string(),
        }),
    })
}

fn status_glyph(user: &UserRecord) -> &'static str {
    if user.done || user.status == RecordStatus::Done {
        "✅ "
    } else if user.status == RecordStatus::Progress {
        "🔄 "
    } else {
        "⏳ "
    }
}

/// Header prefixed to archived summaries: `[<label> YYYY/MM/DD HH:MM]`.
pub fn archive_header(settings: &Settings) -> String {
    format!("[{} {}]", trimmed_label(settings), clock::archive_stamp())
}

fn trimmed_label(settings: &Settings) -> String {
    let label = settings.discord_archive_label.trim();
    let label = if label.is_empty() {
        DEFAULT_ARCHIVE_LABEL
    } else {
        label
    };
    label
        .trim_matches(|c| matches!(c, '[' | ']' | ' ' | '　'))
        .to_string()
}

/// Heuristic duplicate check: does the first line (clamped to 64 bytes)
/// already look like an archive header with this label? Best-effort only;
/// label/timestamp collisions can fool it.
fn has_archive_header(content: &str, settings: &Settings) -> bool {
    let first = content.lines().next().unwrap_or("");
    if !first.starts_with('[') {
        return false;
    }
    let mut end = first.len().min(64);
    while !first.is_char_boundary(end) {
        end -= 1;
    }
    first[..end].contains(&trimmed_label(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::message_map::memory::MemoryMessageIdStore;
    use crate::model::{Outcome, UserRecord};
    use futures::future::BoxFuture;
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    /// Transport double recording calls; `fail_edits` simulates a deleted
    /// remote message.
    #[derive(Default)]
    struct FakeTransport {
        posts: Mutex<Vec<MessagePayload>>,
        edits: Mutex<Vec<(String, MessagePayload)>>,
        remote: Mutex<Option<RemoteMessage>>,
        fail_edits: AtomicBool,
        next_id: Mutex<u64>,
    }

    impl FakeTransport {
        fn post_count(&self) -> usize {
            self.posts.lock().unwrap().len()
        }

        fn edit_count(&self) -> usize {
            self.edits.lock().unwrap().len()
        }
    }

    impl MessageTransport for Arc<FakeTransport> {
        fn post(
            &self,
            payload: MessagePayload,
        ) -> BoxFuture<'static, DiscordResult<Option<String>>> {
            let this = self.clone();
            Box::pin(async move {
                this.posts.lock().unwrap().push(payload);
                let mut next = this.next_id.lock().unwrap();
                *next += 1;
                Ok(Some(format!("msg-{next}")))
            })
        }

        fn edit(
            &self,
            message_id: String,
            payload: MessagePayload,
        ) -> BoxFuture<'static, DiscordResult<()>> {
            let this = self.clone();
            Box::pin(async move {
                if this.fail_edits.load(Ordering::SeqCst) {
                    return Err(DiscordError::RequestStatus {
                        path: "fake edit".into(),
                        status: reqwest::StatusCode::NOT_FOUND,
                    });
                }
                this.edits.lock().unwrap().push((message_id, payload));
                Ok(())
            })
        }

        fn get(&self, _message_id: String) -> BoxFuture<'static, DiscordResult<RemoteMessage>> {
            let this = self.clone();
            Box::pin(async move {
                Ok(this.remote.lock().unwrap().clone().unwrap_or_default())
            })
        }
    }

    fn notifier_with(transport: Arc<FakeTransport>) -> Notifier {
        Notifier::new(
            Arc::new(transport),
            Arc::new(MemoryMessageIdStore::default()),
        )
    }

    fn payload() -> MessagePayload {
        MessagePayload::embed(Embed {
            title: Some("summary".into()),
            ..Embed::default()
        })
    }

    #[tokio::test]
    async fn test_upsert_creates_once_then_edits() {
        let transport = Arc::new(FakeTransport::default());
        let notifier = notifier_with(transport.clone());

        notifier.upsert("__SUMMARY__", payload()).await.unwrap();
        notifier.upsert("__SUMMARY__", payload()).await.unwrap();
        notifier.upsert("__SUMMARY__", payload()).await.unwrap();

        assert_eq!(transport.post_count(), 1);
        assert_eq!(transport.edit_count(), 2);
        assert_eq!(
            transport.edits.lock().unwrap()[0].0,
            "msg-1",
            "edits target the recorded id"
        );
    }

    #[tokio::test]
    async fn test_failed_edit_falls_back_to_post_and_remaps() {
        let transport = Arc::new(FakeTransport::default());
        let map = Arc::new(MemoryMessageIdStore::with(&[("__SUMMARY__", "stale-id")]));
        let notifier = Notifier::new(Arc::new(transport.clone()), map.clone());

        transport.fail_edits.store(true, Ordering::SeqCst);
        notifier.upsert("__SUMMARY__", payload()).await.unwrap();

        assert_eq!(transport.post_count(), 1);
        assert_eq!(map.get("__SUMMARY__").as_deref(), Some("msg-1"));

        // Once the map points at the fresh message, edits resume.
        transport.fail_edits.store(false, Ordering::SeqCst);
        notifier.upsert("__SUMMARY__", payload()).await.unwrap();
        assert_eq!(transport.post_count(), 1);
        assert_eq!(transport.edit_count(), 1);
    }

    #[tokio::test]
    async fn test_archive_retitles_embeds_and_skips_current_key() {
        let transport = Arc::new(FakeTransport::default());
        *transport.remote.lock().unwrap() = Some(RemoteMessage {
            content: String::new(),
            embeds: vec![Embed {
                title: Some("old summary".into()),
                color: Some(SUMMARY_COLOR),
                ..Embed::default()
            }],
        });
        let map = Arc::new(MemoryMessageIdStore::with(&[
            ("__SUMMARY__::old", "m1"),
            ("__SUMMARY__::new", "m2"),
            ("unrelated", "m3"),
        ]));
        let notifier = Notifier::new(Arc::new(transport.clone()), map);

        notifier
            .archive_summaries(&Settings::default(), "__SUMMARY__::new")
            .await;

        let edits = transport.edits.lock().unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, "m1");
        let embed = &edits[0].1.embeds[0];
        assert_eq!(embed.color, Some(ARCHIVE_COLOR));
        assert!(embed.title.as_deref().unwrap().starts_with("[アーカイブ "));
    }

    #[tokio::test]
    async fn test_archive_skips_already_archived_content() {
        let transport = Arc::new(FakeTransport::default());
        *transport.remote.lock().unwrap() = Some(RemoteMessage {
            content: "[アーカイブ 2025/01/01 10:00]\nold body".into(),
            embeds: vec![],
        });
        let map = Arc::new(MemoryMessageIdStore::with(&[("__SUMMARY__::old", "m1")]));
        let notifier = Notifier::new(Arc::new(transport.clone()), map);

        notifier
            .archive_summaries(&Settings::default(), "__SUMMARY__::new")
            .await;
        assert_eq!(transport.edit_count(), 0);
    }

    #[test]
    fn test_summary_groups_glyphs_and_placeholder() {
        let mut state = TallyState::empty_now();
        state.record_win("zoe", Outcome::Jackpot);
        state.record_win("amy", Outcome::Hit);
        state.record_win("bob", Outcome::Jackpot);
        state.set_status("bob", RecordStatus::Progress);
        state.set_done("zoe", true);

        let payload = build_summary(&state, &Settings::default());
        let embed = &payload.embeds[0];
        assert_eq!(embed.color, Some(SUMMARY_COLOR));
        assert_eq!(embed.fields[0].name, GIF_FIELD);
        // Sorted by the full prefixed line; glyphs reflect status.
        assert_eq!(embed.fields[0].value, "✅ zoe\n🔄 bob");
        assert_eq!(embed.fields[1].value, "⏳ amy");
        assert_eq!(embed.footer.as_ref().unwrap().text, SUMMARY_FOOTER);
        assert_eq!(embed.timestamp.as_deref(), Some(state.updated_at.as_str()));

        let empty = build_summary(&TallyState::empty_now(), &Settings::default());
        assert_eq!(empty.embeds[0].fields[0].value, EMPTY_GROUP);
        assert_eq!(empty.embeds[0].fields[1].value, EMPTY_GROUP);
    }

    #[test]
    fn test_summary_key_scoping() {
        let mut settings = Settings::default();
        let session = Session::new();

        assert_eq!(
            summary_key(&settings, Some(&session)),
            format!("__SUMMARY__::{}", session.id)
        );
        assert_eq!(summary_key(&settings, None), SUMMARY_KEY);

        settings.discord_new_message_per_session = false;
        assert_eq!(summary_key(&settings, Some(&session)), SUMMARY_KEY);
    }

    #[test]
    fn test_archive_header_and_heuristic() {
        let mut settings = Settings::default();
        settings.discord_archive_label = "[ Archived ]".into();

        let header = archive_header(&settings);
        assert!(header.starts_with("[Archived "));
        assert!(header.ends_with(']'));

        assert!(has_archive_header(&format!("{header}\nbody"), &settings));
        assert!(!has_archive_header("plain summary text", &settings));
        // Label mentioned beyond the first line does not count.
        assert!(!has_archive_header("first\n[Archived 2025]", &settings));
    }
}
