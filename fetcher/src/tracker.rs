/// Shared view of the current fetch session.
///
/// The fetch loop writes into it between awaits; the HTTP surface reads
/// snapshots and records from it. Every write is tagged with the session id so
/// a loop that was aborted and replaced cannot touch its successor's state.
use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chatlog_shared::errors::{ChatlogError, ChatlogResult};
use chatlog_shared::models::{RecordedMessage, SessionSnapshot, SessionStatus};

#[derive(Debug)]
struct TrackerState {
    session_id: Option<String>,
    username: Option<String>,
    status: SessionStatus,
    progress: f64,
    /// Newest first.
    records: VecDeque<RecordedMessage>,
    download_ready: bool,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cancel: Option<CancellationToken>,
}

impl TrackerState {
    fn owns(&self, session_id: &str) -> bool {
        self.status.is_active() && self.session_id.as_deref() == Some(session_id)
    }

    fn finish(&mut self, status: SessionStatus) {
        self.status = status;
        self.progress = 100.0;
        self.finished_at = Some(Utc::now());
        self.cancel = None;
    }
}

/// Thread-safe session tracker.
#[derive(Clone)]
pub struct SessionTracker {
    inner: Arc<Mutex<TrackerState>>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerState {
                session_id: None,
                username: None,
                status: SessionStatus::Idle,
                progress: 0.0,
                records: VecDeque::new(),
                download_ready: false,
                started_at: None,
                finished_at: None,
                cancel: None,
            })),
        }
    }

    /// Open a new session. Fails while another one is active.
    ///
    /// Records of the previous session stay visible until the channel lookup
    /// of the new one succeeds.
    pub async fn begin(&self, username: &str) -> ChatlogResult<(String, CancellationToken)> {
        let mut state = self.inner.lock().await;
        if state.status.is_active() {
            warn!("Refusing to start session for {}: one is already running", username);
            return Err(ChatlogError::SessionRunning);
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let token = CancellationToken::new();

        state.session_id = Some(session_id.clone());
        state.username = Some(username.to_string());
        state.status = SessionStatus::Resolving;
        state.download_ready = false;
        state.started_at = Some(Utc::now());
        state.finished_at = None;
        state.cancel = Some(token.clone());

        info!("Session {} opened for {}", session_id, username);
        Ok((session_id, token))
    }

    /// Channel resolved: drop the previous records and start at 0%.
    pub async fn start_running(&self, session_id: &str) -> bool {
        let mut state = self.inner.lock().await;
        if !state.owns(session_id) {
            return false;
        }
        state.records.clear();
        state.progress = 0.0;
        state.status = SessionStatus::Running;
        true
    }

    /// Prepend a record (newest first).
    pub async fn record(&self, session_id: &str, record: RecordedMessage) -> bool {
        let mut state = self.inner.lock().await;
        if !state.owns(session_id) {
            return false;
        }
        state.records.push_front(record);
        true
    }

    /// Raise progress. Lower values are ignored so progress never goes back.
    pub async fn update_progress(&self, session_id: &str, percent: f64) {
        let mut state = self.inner.lock().await;
        if state.owns(session_id) && percent > state.progress {
            state.progress = percent.min(100.0);
        }
    }

    /// Loop ran to the end of the range.
    pub async fn complete(&self, session_id: &str) {
        let mut state = self.inner.lock().await;
        if !state.owns(session_id) {
            return;
        }
        state.finish(SessionStatus::Completed);
        state.download_ready = !state.records.is_empty();
        info!(
            "Session {} completed with {} messages",
            session_id,
            state.records.len()
        );
    }

    /// Channel lookup failed; the page goes back to ready with nothing new.
    pub async fn fail(&self, session_id: &str) {
        let mut state = self.inner.lock().await;
        if !state.owns(session_id) {
            return;
        }
        state.finish(SessionStatus::Failed);
        warn!("Session {} failed", session_id);
    }

    /// Cancel the active session. Returns its id.
    pub async fn abort(&self) -> ChatlogResult<String> {
        let mut state = self.inner.lock().await;
        if !state.status.is_active() {
            return Err(ChatlogError::NoSession);
        }
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        state.finish(SessionStatus::Aborted);
        state.download_ready = true;

        let session_id = state.session_id.clone().unwrap_or_default();
        info!("Session {} aborted with {} messages", session_id, state.records.len());
        Ok(session_id)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock().await;
        SessionSnapshot {
            session_id: state.session_id.clone(),
            username: state.username.clone(),
            status: state.status,
            progress: state.progress,
            message_count: state.records.len(),
            download_ready: state.download_ready,
            started_at: state.started_at,
            finished_at: state.finished_at,
        }
    }

    /// Copy of the recorded messages, newest first.
    pub async fn records(&self) -> Vec<RecordedMessage> {
        self.inner.lock().await.records.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> RecordedMessage {
        RecordedMessage {
            sender: "alice".into(),
            content: content.into(),
            text: content.into(),
            html: content.into(),
            created_at: Utc::now(),
            timestamp: "2024-05-01 12:00:00".into(),
        }
    }

    #[tokio::test]
    async fn test_single_active_session() {
        let tracker = SessionTracker::new();
        tracker.begin("a").await.unwrap();
        assert!(matches!(tracker.begin("b").await, Err(ChatlogError::SessionRunning)));
    }

    #[tokio::test]
    async fn test_records_newest_first() {
        let tracker = SessionTracker::new();
        let (id, _) = tracker.begin("a").await.unwrap();
        assert!(tracker.start_running(&id).await);
        tracker.record(&id, record("first")).await;
        tracker.record(&id, record("second")).await;

        let contents: Vec<_> = tracker.records().await.into_iter().map(|r| r.content).collect();
        assert_eq!(contents, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_progress_monotonic() {
        let tracker = SessionTracker::new();
        let (id, _) = tracker.begin("a").await.unwrap();
        tracker.start_running(&id).await;
        tracker.update_progress(&id, 40.0).await;
        tracker.update_progress(&id, 10.0).await;
        assert_eq!(tracker.snapshot().await.progress, 40.0);
        tracker.update_progress(&id, 250.0).await;
        assert_eq!(tracker.snapshot().await.progress, 100.0);
    }

    #[tokio::test]
    async fn test_complete_download_ready_only_with_records() {
        let tracker = SessionTracker::new();
        let (id, _) = tracker.begin("a").await.unwrap();
        tracker.start_running(&id).await;
        tracker.complete(&id).await;
        let snap = tracker.snapshot().await;
        assert_eq!(snap.status, SessionStatus::Completed);
        assert_eq!(snap.progress, 100.0);
        assert!(!snap.download_ready);

        let (id, _) = tracker.begin("a").await.unwrap();
        tracker.start_running(&id).await;
        tracker.record(&id, record("x")).await;
        tracker.complete(&id).await;
        assert!(tracker.snapshot().await.download_ready);
    }

    #[tokio::test]
    async fn test_abort_cancels_and_fences_writes() {
        let tracker = SessionTracker::new();
        let (id, token) = tracker.begin("a").await.unwrap();
        tracker.start_running(&id).await;

        assert_eq!(tracker.abort().await.unwrap(), id);
        assert!(token.is_cancelled());

        let snap = tracker.snapshot().await;
        assert_eq!(snap.status, SessionStatus::Aborted);
        assert_eq!(snap.progress, 100.0);
        assert!(snap.download_ready);

        // A late write from the aborted loop is dropped.
        assert!(!tracker.record(&id, record("late")).await);
        tracker.complete(&id).await;
        assert_eq!(tracker.snapshot().await.status, SessionStatus::Aborted);

        assert!(matches!(tracker.abort().await, Err(ChatlogError::NoSession)));
    }

    #[tokio::test]
    async fn test_failed_lookup_keeps_previous_records() {
        let tracker = SessionTracker::new();
        let (id, _) = tracker.begin("a").await.unwrap();
        tracker.start_running(&id).await;
        tracker.record(&id, record("kept")).await;
        tracker.complete(&id).await;

        let (id, _) = tracker.begin("nobody").await.unwrap();
        tracker.fail(&id).await;
        let snap = tracker.snapshot().await;
        assert_eq!(snap.status, SessionStatus::Failed);
        assert_eq!(snap.progress, 100.0);
        assert_eq!(snap.message_count, 1);
        assert!(!snap.download_ready);
    }
}
