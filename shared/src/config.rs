/// Runtime configuration read from the environment (and `.env`).
use std::time::Duration;

use crate::emote::DEFAULT_EMOTE_BASE;
use crate::errors::{ChatlogError, ChatlogResult};

/// Default Kick API base.
pub const DEFAULT_API_BASE: &str = "https://kick.com/api/v2";

/// Sender whose messages are hidden unless overridden.
pub const DEFAULT_EXCLUDED_SENDER: &str = "BotRix";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_base: String,
    pub emote_base: String,
    /// Pause between two page requests.
    pub step_delay: Duration,
    /// `None` disables sender exclusion.
    pub excluded_sender: Option<String>,
    pub request_timeout: Duration,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            api_base: DEFAULT_API_BASE.to_string(),
            emote_base: DEFAULT_EMOTE_BASE.to_string(),
            step_delay: Duration::from_millis(200),
            excluded_sender: Some(DEFAULT_EXCLUDED_SENDER.to_string()),
            request_timeout: Duration::from_secs(30),
            static_dir: "./static".to_string(),
        }
    }
}

impl Config {
    /// Read from process environment variables.
    pub fn from_env() -> ChatlogResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> ChatlogResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let step_delay_ms = parse_var(&lookup, "CHATLOG_STEP_DELAY_MS")?
            .unwrap_or(defaults.step_delay.as_millis() as u64);
        let timeout_secs = parse_var(&lookup, "CHATLOG_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(defaults.request_timeout.as_secs());

        let excluded_sender = match lookup("CHATLOG_EXCLUDED_SENDER") {
            Some(name) if name.trim().is_empty() => None,
            Some(name) => Some(name.trim().to_string()),
            None => defaults.excluded_sender,
        };

        Ok(Self {
            host: lookup("CHATLOG_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "CHATLOG_PORT")?.unwrap_or(defaults.port),
            api_base: lookup("KICK_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            emote_base: lookup("KICK_EMOTE_BASE").unwrap_or(defaults.emote_base),
            step_delay: Duration::from_millis(step_delay_ms),
            excluded_sender,
            request_timeout: Duration::from_secs(timeout_secs),
            static_dir: lookup("CHATLOG_STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ChatlogResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ChatlogError::Config(format!("{} must be a number, got '{}'", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base, "https://kick.com/api/v2");
        assert_eq!(config.step_delay, Duration::from_millis(200));
        assert_eq!(config.excluded_sender.as_deref(), Some("BotRix"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8082");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CHATLOG_PORT", "9000"),
            ("CHATLOG_STEP_DELAY_MS", "0"),
            ("KICK_API_BASE", "http://127.0.0.1:1234/api/v2/"),
            ("CHATLOG_EXCLUDED_SENDER", ""),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.step_delay, Duration::ZERO);
        assert_eq!(config.api_base, "http://127.0.0.1:1234/api/v2");
        assert!(config.excluded_sender.is_none());
    }

    #[test]
    fn test_bad_number() {
        let err = Config::from_lookup(lookup_from(&[("CHATLOG_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ChatlogError::Config(_)));
    }
}
