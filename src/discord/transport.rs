//! Message transports: one capability, two backends (webhook and bot token).

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Url, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};

use super::error::{DiscordError, DiscordResult};

/// Default timeout applied to every outbound Discord call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Discord REST API root used by the bot transport.
const API_BASE: &str = "https://discord.com/api/v10";

/// One labeled field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field label.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Render inline with neighbors.
    #[serde(default)]
    pub inline: bool,
}

/// Footer line of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
}

/// A Discord rich embed, limited to the fields this tool uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Embed body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accent color as 0xRRGGBB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// Labeled fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// ISO 8601 timestamp shown with the embed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Footer line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

/// Outbound message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Plain-text content.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Rich embeds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl MessagePayload {
    /// Message carrying a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: String::new(),
            embeds: vec![embed],
        }
    }
}

/// The parts of a fetched remote message the notifier inspects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteMessage {
    /// Plain-text content.
    #[serde(default)]
    pub content: String,
    /// Rich embeds.
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// Capability for posting, editing, and fetching channel messages.
///
/// Implemented by the webhook and bot backends; tests substitute their own.
pub trait MessageTransport: Send + Sync {
    /// Post a new message, returning its id when the API provides one.
    fn post(&self, payload: MessagePayload) -> BoxFuture<'static, DiscordResult<Option<String>>>;
    /// Edit an existing message in place.
    fn edit(
        &self,
        message_id: String,
        payload: MessagePayload,
    ) -> BoxFuture<'static, DiscordResult<()>>;
    /// Fetch an existing message.
    fn get(&self, message_id: String) -> BoxFuture<'static, DiscordResult<RemoteMessage>>;
}

fn build_client() -> DiscordResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(DiscordError::ClientBuilder)
}

/// Incoming-webhook backend. Can only see messages it posted itself.
#[derive(Clone)]
pub struct WebhookTransport {
    client: Client,
    base: Arc<str>,
}

impl WebhookTransport {
    /// Build from a `https://discord.com/api/webhooks/{id}/{token}` URL.
    pub fn from_url(raw: &str) -> DiscordResult<Self> {
        let url = Url::parse(raw).map_err(|_| DiscordError::InvalidWebhookUrl)?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|part| !part.is_empty()).collect())
            .unwrap_or_default();

        let mut id_token = None;
        for window in segments.windows(4) {
            if window[0] == "api" && window[1] == "webhooks" {
                id_token = Some((window[2], window[3]));
                break;
            }
        }
        let (id, token) = id_token.ok_or(DiscordError::InvalidWebhookUrl)?;

        let host = url.host_str().ok_or(DiscordError::InvalidWebhookUrl)?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let base = format!("{}://{authority}/api/webhooks/{id}/{token}", url.scheme());

        Ok(Self {
            client: build_client()?,
            base: Arc::from(base.as_str()),
        })
    }

    async fn post_inner(self, payload: MessagePayload) -> DiscordResult<Option<String>> {
        let url = format!("{}?wait=true", self.base);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: "webhook post".into(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(DiscordError::RequestStatus {
                path: "webhook post".into(),
                status: response.status(),
            });
        }
        // Some webhook responses carry no body; tolerate that.
        Ok(response
            .json::<MessageRef>()
            .await
            .ok()
            .map(|message| message.id))
    }

    async fn edit_inner(self, message_id: String, payload: MessagePayload) -> DiscordResult<()> {
        let url = format!("{}/messages/{message_id}", self.base);
        let response = self
            .client
            .patch(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: "webhook edit".into(),
                source,
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DiscordError::RequestStatus {
                path: "webhook edit".into(),
                status: response.status(),
            })
        }
    }

    async fn get_inner(self, message_id: String) -> DiscordResult<RemoteMessage> {
        let url = format!("{}/messages/{message_id}", self.base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: "webhook get".into(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(DiscordError::RequestStatus {
                path: "webhook get".into(),
                status: response.status(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| DiscordError::DecodeResponse {
                path: "webhook get".into(),
                source,
            })
    }
}

impl MessageTransport for WebhookTransport {
    fn post(&self, payload: MessagePayload) -> BoxFuture<'static, DiscordResult<Option<String>>> {
        let transport = self.clone();
        Box::pin(transport.post_inner(payload))
    }

    fn edit(
        &self,
        message_id: String,
        payload: MessagePayload,
    ) -> BoxFuture<'static, DiscordResult<()>> {
        let transport = self.clone();
        Box::pin(transport.edit_inner(message_id, payload))
    }

    fn get(&self, message_id: String) -> BoxFuture<'static, DiscordResult<RemoteMessage>> {
        let transport = self.clone();
        Box::pin(transport.get_inner(message_id))
    }
}

/// Bot-token backend with full channel access.
#[derive(Clone)]
pub struct BotTransport {
    client: Client,
    token: Arc<str>,
    channel_id: Arc<str>,
}

impl BotTransport {
    /// Build from a bot token and the target channel id.
    pub fn new(token: &str, channel_id: &str) -> DiscordResult<Self> {
        Ok(Self {
            client: build_client()?,
            token: Arc::from(token),
            channel_id: Arc::from(channel_id),
        })
    }

    fn messages_url(&self) -> String {
        format!("{API_BASE}/channels/{}/messages", self.channel_id)
    }

    fn auth_value(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn post_inner(self, payload: MessagePayload) -> DiscordResult<Option<String>> {
        let response = self
            .client
            .post(self.messages_url())
            .header(AUTHORIZATION, self.auth_value())
            .json(&payload)
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: "bot post".into(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(DiscordError::RequestStatus {
                path: "bot post".into(),
                status: response.status(),
            });
        }
        Ok(response
            .json::<MessageRef>()
            .await
            .ok()
            .map(|message| message.id))
    }

    async fn edit_inner(self, message_id: String, payload: MessagePayload) -> DiscordResult<()> {
        let url = format!("{}/{message_id}", self.messages_url());
        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, self.auth_value())
            .json(&payload)
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: "bot edit".into(),
                source,
            })?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DiscordError::RequestStatus {
                path: "bot edit".into(),
                status: response.status(),
            })
        }
    }

    async fn get_inner(self, message_id: String) -> DiscordResult<RemoteMessage> {
        let url = format!("{}/{message_id}", self.messages_url());
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth_value())
            .send()
            .await
            .map_err(|source| DiscordError::RequestSend {
                path: "bot get".into(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(DiscordError::RequestStatus {
                path: "bot get".into(),
                status: response.status(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| DiscordError::DecodeResponse {
                path: "bot get".into(),
                source,
            })
    }
}

impl MessageTransport for BotTransport {
    fn post(&self, payload: MessagePayload) -> BoxFuture<'static, DiscordResult<Option<String>>> {
        let transport = self.clone();
        Box::pin(transport.post_inner(payload))
    }

    fn edit(
        &self,
        message_id: String,
        payload: MessagePayload,
    ) -> BoxFuture<'static, DiscordResult<()>> {
        let transport = self.clone();
        Box::pin(transport.edit_inner(message_id, payload))
    }

    fn get(&self, message_id: String) -> BoxFuture<'static, DiscordResult<RemoteMessage>> {
        let transport = self.clone();
        Box::pin(transport.get_inner(message_id))
    }
}
