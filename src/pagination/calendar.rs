use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

// Moscow has had no DST since 2014
const MOSCOW_OFFSET_SECS: i32 = 3 * 3600;

pub fn moscow_offset() -> FixedOffset {
    FixedOffset::east_opt(MOSCOW_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Calendar date in Moscow at the given instant
pub fn today_in_moscow(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&moscow_offset()).date_naive()
}

/// Unix seconds of Moscow-local midnight starting `date`
pub fn midnight_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp() - MOSCOW_OFFSET_SECS as i64)
        .unwrap_or_default()
}

/// Parse the assorted timestamp shapes upstreams send into venue-local wall-clock time.
///
/// Timestamps with an explicit offset are converted to Moscow time; naive
/// ones are taken as already local.
pub fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&moscow_offset()).naive_local());
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}
