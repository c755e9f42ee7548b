/// Live search over recorded messages.
///
/// A record matches when the lowercased query is a substring of its visible
/// text or of its `sender @ timestamp` line. An empty query matches everything.
use crate::models::RecordedMessage;

/// Case-insensitive substring query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(query: &str) -> Self {
        Self {
            needle: query.to_lowercase(),
        }
    }

    /// Build from an optional query string parameter.
    pub fn from_param(query: Option<&str>) -> Self {
        query.map(Self::new).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Whether the query occurs in either haystack.
    pub fn matches_parts(&self, text: &str, info: &str) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        text.to_lowercase().contains(&self.needle) || info.to_lowercase().contains(&self.needle)
    }

    pub fn matches(&self, record: &RecordedMessage) -> bool {
        self.matches_parts(&record.text, &record.info_line())
    }

    /// Records passing the query, order preserved.
    pub fn filter<'a>(
        &'a self,
        records: &'a [RecordedMessage],
    ) -> impl Iterator<Item = &'a RecordedMessage> + 'a {
        records.iter().filter(move |r| self.matches(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(sender: &str, text: &str) -> RecordedMessage {
        let created_at: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        RecordedMessage {
            sender: sender.into(),
            content: text.into(),
            text: text.into(),
            html: text.into(),
            created_at,
            timestamp: "2024-05-01 12:00:00".into(),
        }
    }

    #[test]
    fn test_matches_content() {
        assert!(SearchQuery::new("hello").matches_parts("alice hello", ""));
        assert!(!SearchQuery::new("bob").matches_parts("alice hello", ""));
    }

    #[test]
    fn test_matches_sender_case_insensitive() {
        let rec = record("Alice", "good game");
        assert!(SearchQuery::new("aLiCe").matches(&rec));
        assert!(SearchQuery::new("GAME").matches(&rec));
        assert!(!SearchQuery::new("bob").matches(&rec));
    }

    #[test]
    fn test_matches_timestamp() {
        let rec = record("alice", "hi");
        assert!(SearchQuery::new("12:00").matches(&rec));
        assert!(SearchQuery::new("alice @ 2024").matches(&rec));
    }

    #[test]
    fn test_empty_query_matches_all() {
        let records = vec![record("a", "x"), record("b", "y")];
        let query = SearchQuery::from_param(None);
        assert!(query.is_empty());
        assert_eq!(query.filter(&records).count(), 2);
    }

    #[test]
    fn test_filter_preserves_order() {
        let records = vec![record("a", "gg"), record("b", "no"), record("c", "gg wp")];
        let query = SearchQuery::new("gg");
        let senders: Vec<_> = query.filter(&records).map(|r| r.sender.as_str()).collect();
        assert_eq!(senders, vec!["a", "c"]);
    }
}
