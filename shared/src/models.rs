/// Wire and session models shared across all Chatlog crates.
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::emote;
use crate::errors::InputError;
use crate::timefmt;

// ====== UPSTREAM (Kick API) ======

/// Channel lookup response. Only the numeric id is used.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: Option<u64>,
}

/// Chat message as returned by the message page endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender: Sender,
}

/// Message author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub username: String,
}

/// One page of messages starting at a given second.
///
/// Messages are kept as raw JSON so one malformed entry does not sink the
/// whole page; see [`MessagePage::decode_messages`].
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePage {
    pub data: MessagePageData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePageData {
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

impl MessagePage {
    /// Decode each message on its own. Returns the good ones in page order
    /// and the errors of the entries that did not decode.
    pub fn decode_messages(self) -> (Vec<ChatMessage>, Vec<serde_json::Error>) {
        let mut messages = Vec::with_capacity(self.data.messages.len());
        let mut errors = Vec::new();
        for raw in self.data.messages {
            match serde_json::from_value::<ChatMessage>(raw) {
                Ok(message) => messages.push(message),
                Err(e) => errors.push(e),
            }
        }
        (messages, errors)
    }
}

// ====== SESSION ======

/// A message that survived filtering and deduplication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedMessage {
    pub sender: String,
    /// Raw content as sent by Kick; the dedup key.
    pub content: String,
    /// Visible text (emote tokens removed). Used by search and export.
    pub text: String,
    /// Escaped content with emotes rendered as images.
    pub html: String,
    pub created_at: DateTime<Utc>,
    /// `created_at` rendered as `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
}

impl RecordedMessage {
    /// Build a record, formatting the timestamp in `tz`.
    pub fn from_chat_in<Tz: TimeZone>(message: &ChatMessage, emote_base: &str, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            sender: message.sender.username.clone(),
            content: message.content.clone(),
            text: emote::plain_text(&message.content),
            html: emote::render_html(&message.content, emote_base),
            created_at: message.created_at,
            timestamp: timefmt::format_display_in(&message.created_at, tz),
        }
    }

    /// Build a record with the timestamp in local time.
    pub fn from_chat(message: &ChatMessage, emote_base: &str) -> Self {
        Self::from_chat_in(message, emote_base, &chrono::Local)
    }

    /// The `sender @ timestamp` line shown under each message.
    pub fn info_line(&self) -> String {
        format!("{} @ {}", self.sender, self.timestamp)
    }
}

/// Fetch session lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Resolving,
    Running,
    Completed,
    Aborted,
    Failed,
}

impl SessionStatus {
    /// Whether a session in this state still owns the fetch loop.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Resolving | SessionStatus::Running)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Resolving => write!(f, "resolving"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Aborted => write!(f, "aborted"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Raw fetch request as submitted by the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub username: String,
    pub start: String,
    pub end: String,
}

impl FetchRequest {
    /// Validate the request, reading the range as wall-clock time in `tz`.
    pub fn validate_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<FetchRange, InputError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(InputError::EmptyUsername);
        }
        Ok(FetchRange {
            username: username.to_string(),
            start: timefmt::parse_input_in(&self.start, tz)?,
            end: timefmt::parse_input_in(&self.end, tz)?,
        })
    }

    /// Validate the request in the server's local time zone.
    pub fn validate(&self) -> Result<FetchRange, InputError> {
        self.validate_in(&chrono::Local)
    }
}

/// Validated fetch parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRange {
    pub username: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchRange {
    /// Number of one-second steps the loop will take. Zero when `start > end`.
    pub fn steps(&self) -> u64 {
        let span = (self.end - self.start).num_seconds();
        if span < 0 {
            0
        } else {
            span as u64 + 1
        }
    }
}

/// Point-in-time view of the current session for the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub status: SessionStatus,
    pub progress: f64,
    pub message_count: usize,
    pub download_ready: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
