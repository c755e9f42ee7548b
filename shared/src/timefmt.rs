/// Timestamp parsing and formatting for range inputs, display and upstream queries.
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::errors::InputError;

/// Display format used by the page, the record info line and the export file.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted for range inputs. The `T` variants are what browser
/// `datetime-local` fields submit.
const INPUT_FORMATS: &[&str] = &[DISPLAY_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a range input as wall-clock time in `tz`.
pub fn parse_input_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>, InputError> {
    let trimmed = input.trim();
    let naive = INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| InputError::InvalidTimestamp(input.to_string()))?;

    // Ambiguous wall-clock times (DST fold) resolve to the first instant;
    // times inside a DST gap do not exist and are rejected.
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| InputError::InvalidTimestamp(input.to_string()))
}

/// Render an instant as `YYYY-MM-DD HH:MM:SS` in `tz`.
pub fn format_display_in<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string()
}

/// Render an instant as `YYYY-MM-DD HH:MM:SS` in local time.
pub fn format_display(instant: &DateTime<Utc>) -> String {
    format_display_in(instant, &Local)
}

/// The `start_time` query value: UTC, millisecond precision, `Z` suffix.
pub fn to_query_iso(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
