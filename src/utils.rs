use chrono::{DateTime, FixedOffset};
use lazy_regex::regex;

pub(crate) fn get_now() -> DateTime<FixedOffset> {
    let now = chrono::offset::Local::now();
    now.with_timezone(now.offset())
}

/// RFC 3339 timestamp with millisecond precision.
pub(crate) fn rfc3339(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Timestamp safe to embed in a file name (`:` and `.` become `-`).
pub(crate) fn file_timestamp(time: &DateTime<FixedOffset>) -> String {
    regex!(r"[:.]").replace_all(&rfc3339(time), "-").into_owned()
}

/// Collapses runs of whitespace into a single space and trims.
pub(crate) fn clean_text(s: &str) -> String {
    regex!(r"\s+").replace_all(s, " ").trim().to_string()
}

/// Parses an "N of M" progress indicator.
pub(crate) fn parse_progress(s: &str) -> Option<(u32, u32)> {
    let caps = regex!(r"(\d+)\s*of\s*(\d+)").captures(s)?;
    let current = caps.get(1)?.as_str().parse().ok()?;
    let total = caps.get(2)?.as_str().parse().ok()?;
    Some((current, total))
}
