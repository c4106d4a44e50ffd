//! DateTime parsing and formatting for audit trail filters and CSV output
use crate::error::ConfigError;
use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Format accepted for --start_date / --end_date and used in the CSV
pub const FORMAT_DATETIME_SECOND: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format embedded in the default output filename
const FORMAT_FILENAME: &str = "%Y-%m-%d_%H-%M-%S";

/// Parse a `YYYY-MM-DD HH:MM:SS` UTC datetime into epoch milliseconds
///
/// # Arguments
///
/// * `datetime_str` - The datetime string, interpreted as UTC
/// * `field` - Flag name reported in the error (e.g. `--start_date`)
///
/// # Errors
///
/// Returns `ConfigError::InvalidTimestamp` naming `field` if the value does not
/// match the format or is not a real calendar date.
///
/// # Examples
///
/// ```
/// use audittrail_export::datetime::parse_utc_millis;
///
/// let millis = parse_utc_millis("2024-10-17 17:16:00", "--start_date").unwrap();
/// assert_eq!(millis, 1729185360000);
/// ```
pub fn parse_utc_millis(datetime_str: &str, field: &'static str) -> Result<i64, ConfigError> {
    NaiveDateTime::parse_from_str(datetime_str.trim(), FORMAT_DATETIME_SECOND)
        .map(|naive| naive.and_utc().timestamp_millis())
        .map_err(|_| ConfigError::InvalidTimestamp {
            field,
            value: datetime_str.to_string(),
        })
}

/// Render epoch milliseconds as `YYYY-MM-DD HH:MM:SS` in UTC
///
/// Returns `None` for values outside chrono's representable range.
#[must_use]
pub fn format_utc_millis(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format(FORMAT_DATETIME_SECOND).to_string())
}

/// Default CSV filename for an export started at `now`
#[must_use]
pub fn default_output_filename(now: DateTime<Local>) -> String {
    format!("audit_trail_export_{}.csv", now.format(FORMAT_FILENAME))
}
