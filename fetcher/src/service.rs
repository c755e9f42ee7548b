/// Entry point used by the HTTP surface: start, abort and inspect sessions.
use tracing::info;

use chatlog_shared::config::Config;
use chatlog_shared::errors::ChatlogResult;
use chatlog_shared::models::{FetchRange, RecordedMessage, SessionSnapshot};

use crate::client::KickClient;
use crate::session::{run_session, SessionOptions};
use crate::tracker::SessionTracker;

#[derive(Clone)]
pub struct FetchService {
    client: KickClient,
    tracker: SessionTracker,
    options: SessionOptions,
}

impl FetchService {
    pub fn new(config: &Config) -> ChatlogResult<Self> {
        Ok(Self::with_client(KickClient::new(config)?, SessionOptions::from(config)))
    }

    pub fn with_client(client: KickClient, options: SessionOptions) -> Self {
        Self {
            client,
            tracker: SessionTracker::new(),
            options,
        }
    }

    /// Spawn a session for `range`. Returns its id.
    pub async fn start(&self, range: FetchRange) -> ChatlogResult<String> {
        let (session_id, cancel) = self.tracker.begin(&range.username).await?;

        let client = self.client.clone();
        let tracker = self.tracker.clone();
        let options = self.options.clone();
        let id = session_id.clone();
        tokio::spawn(async move {
            run_session(&client, &tracker, &id, &range, &options, cancel).await;
        });

        info!("Session {} spawned", session_id);
        Ok(session_id)
    }

    pub async fn abort(&self) -> ChatlogResult<String> {
        self.tracker.abort().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.tracker.snapshot().await
    }

    pub async fn records(&self) -> Vec<RecordedMessage> {
        self.tracker.records().await
    }
}
