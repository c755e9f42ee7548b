/// Plain-text export of recorded messages (`messages.txt`).
use crate::models::RecordedMessage;
use crate::search::SearchQuery;

/// File name offered to the browser.
pub const EXPORT_FILENAME: &str = "messages.txt";

/// One export block: `sender @ timestamp\ntext\n\n`.
pub fn format_entry(record: &RecordedMessage) -> String {
    format!("{}\n{}\n\n", record.info_line(), record.text)
}

/// Export the records that pass `query`, keeping list order (newest first).
pub fn render_export(records: &[RecordedMessage], query: &SearchQuery) -> String {
    query.filter(records).map(format_entry).collect()
}
