/// The fetch loop: resolve the channel, then walk the range one second at a time.
use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chatlog_shared::config::Config;
use chatlog_shared::models::{ChatMessage, FetchRange, RecordedMessage};

use crate::client::KickClient;
use crate::tracker::SessionTracker;

/// Per-session knobs taken from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub emote_base: String,
    pub step_delay: Duration,
    pub excluded_sender: Option<String>,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            emote_base: config.emote_base.clone(),
            step_delay: config.step_delay,
            excluded_sender: config.excluded_sender.clone(),
        }
    }
}

/// What happened to one incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Recorded,
    Duplicate,
    Excluded,
}

/// Content-keyed dedup plus the excluded-sender rule. Lives as long as one session.
#[derive(Debug, Default)]
pub struct MessageFilter {
    seen: HashSet<String>,
    excluded_sender: Option<String>,
}

impl MessageFilter {
    pub fn new(excluded_sender: Option<String>) -> Self {
        Self {
            seen: HashSet::new(),
            excluded_sender,
        }
    }

    /// Decide whether to record `message`. Only recorded content is remembered.
    pub fn admit(&mut self, message: &ChatMessage) -> Admission {
        if self.seen.contains(&message.content) {
            return Admission::Duplicate;
        }
        if self.excluded_sender.as_deref() == Some(message.sender.username.as_str()) {
            return Admission::Excluded;
        }
        self.seen.insert(message.content.clone());
        Admission::Recorded
    }
}

/// Share of the range covered once the cursor reached `cursor`, in percent.
pub fn progress_percent(start: DateTime<Utc>, cursor: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 100.0;
    }
    let elapsed = (cursor - start).num_milliseconds() as f64;
    (elapsed / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// The cursor one second later, or `None` past the last representable instant.
fn next_second(cursor: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cursor.checked_add_signed(chrono::Duration::seconds(1))
}

/// Counters for one session run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    pub channel_id: Option<u64>,
    pub requests: u64,
    pub failed_pages: u64,
    pub recorded: usize,
    pub duplicates: usize,
    pub excluded: usize,
    pub cancelled: bool,
}

/// Run one session to completion, failure or cancellation.
///
/// Upstream failures never escape: a failed lookup marks the session failed,
/// a failed page is logged and its second skipped.
pub async fn run_session(
    client: &KickClient,
    tracker: &SessionTracker,
    session_id: &str,
    range: &FetchRange,
    options: &SessionOptions,
    cancel: CancellationToken,
) -> SessionOutcome {
    let mut outcome = SessionOutcome::default();

    let lookup = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            outcome.cancelled = true;
            return outcome;
        }
        result = client.resolve_channel(&range.username) => result,
    };
    let channel_id = match lookup {
        Ok(id) => id,
        Err(e) => {
            warn!("Channel lookup for {} failed: {}", range.username, e);
            tracker.fail(session_id).await;
            return outcome;
        }
    };
    outcome.channel_id = Some(channel_id);

    if !tracker.start_running(session_id).await {
        outcome.cancelled = true;
        return outcome;
    }
    info!(
        "Session {}: channel {} ({}) resolved, {} steps from {} to {}",
        session_id,
        range.username,
        channel_id,
        range.steps(),
        range.start,
        range.end
    );

    let mut filter = MessageFilter::new(options.excluded_sender.clone());
    let mut cursor = range.start;

    while cursor <= range.end {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }

        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                outcome.cancelled = true;
                break;
            }
            result = client.fetch_page(channel_id, cursor) => result,
        };
        outcome.requests += 1;

        match page {
            Ok(messages) => {
                for message in &messages {
                    match filter.admit(message) {
                        Admission::Recorded => {
                            let record = RecordedMessage::from_chat(message, &options.emote_base);
                            if tracker.record(session_id, record).await {
                                outcome.recorded += 1;
                            }
                        }
                        Admission::Duplicate => outcome.duplicates += 1,
                        Admission::Excluded => outcome.excluded += 1,
                    }
                }
                debug!("Page at {}: {} messages", cursor, messages.len());
            }
            Err(e) => {
                outcome.failed_pages += 1;
                warn!("Fetching messages at {} failed: {}", cursor, e);
            }
        }

        let Some(next) = next_second(cursor) else {
            debug!("Cursor reached the last representable instant");
            break;
        };
        cursor = next;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                outcome.cancelled = true;
                break;
            }
            _ = tokio::time::sleep(options.step_delay) => {}
        }

        tracker
            .update_progress(session_id, progress_percent(range.start, cursor, range.end))
            .await;
    }

    if !outcome.cancelled {
        tracker.complete(session_id).await;
    }

    info!(
        "Session {} finished: requests={} recorded={} duplicates={} excluded={} failed_pages={} cancelled={}",
        session_id,
        outcome.requests,
        outcome.recorded,
        outcome.duplicates,
        outcome.excluded,
        outcome.failed_pages,
        outcome.cancelled
    );
    outcome
}
