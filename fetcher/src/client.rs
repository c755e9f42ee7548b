/// HTTP client for the Kick v2 API.
///
/// Two endpoints are used: the channel lookup (`/channels/{username}`) and the
/// message page starting at a given second
/// (`/channels/{id}/messages?start_time=...`).
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use tracing::{debug, warn};

use chatlog_shared::config::Config;
use chatlog_shared::errors::{ChatlogError, ChatlogResult};
use chatlog_shared::models::{Channel, ChatMessage, MessagePage};
use chatlog_shared::timefmt;

#[derive(Clone)]
pub struct KickClient {
    client: Client,
    api_base: Url,
}

impl KickClient {
    pub fn new(config: &Config) -> ChatlogResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(8)
            .user_agent(concat!("chatlog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| ChatlogError::Config(format!("KICK_API_BASE is not a URL: {}", e)))?;
        if api_base.cannot_be_a_base() {
            return Err(ChatlogError::Config(format!(
                "KICK_API_BASE cannot be used as a base: {}",
                config.api_base
            )));
        }
        Ok(Self { client, api_base })
    }

    /// Append path segments to the API base. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> ChatlogResult<T> {
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChatlogError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Resolve a channel's numeric id from its username.
    pub async fn resolve_channel(&self, username: &str) -> ChatlogResult<u64> {
        let url = self.endpoint(&["channels", username]);
        debug!("Resolving channel: {}", url);
        let channel: Channel = self.get_json(url).await?;
        channel
            .id
            .ok_or_else(|| ChatlogError::ChannelNotFound(username.to_string()))
    }

    /// Fetch the message page starting at `start_time`.
    ///
    /// Entries that do not decode are logged and left out.
    pub async fn fetch_page(
        &self,
        channel_id: u64,
        start_time: DateTime<Utc>,
    ) -> ChatlogResult<Vec<ChatMessage>> {
        let mut url = self.endpoint(&["channels", &channel_id.to_string(), "messages"]);
        url.query_pairs_mut()
            .append_pair("start_time", &timefmt::to_query_iso(&start_time));
        debug!("Fetching page: {}", url);
        let page: MessagePage = self.get_json(url).await?;
        let (messages, errors) = page.decode_messages();
        for e in &errors {
            warn!("Skipping malformed message at {}: {}", start_time, e);
        }
        Ok(messages)
    }
}
