use chrono::{DateTime, FixedOffset, Offset, Utc};
use mongodb::bson;

const ASIA_BANGKOK_OFFSET_SECS: i32 = 7 * 3600;

/// Asia/Bangkok is UTC+7 with no daylight saving.
pub fn asia_bangkok() -> FixedOffset {
    FixedOffset::east_opt(ASIA_BANGKOK_OFFSET_SECS).unwrap_or(Utc.fix())
}

pub fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

pub fn from_chrono(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

/// Date path segment used by public post URLs, e.g. `2020/1/2`.
pub fn date_path(dt: bson::DateTime) -> String {
    to_chrono(dt)
        .with_timezone(&asia_bangkok())
        .format("%Y/%-m/%-d")
        .to_string()
}

/// Legacy documents carry a zero time instead of a missing field.
pub fn is_unset(dt: Option<bson::DateTime>) -> bool {
    dt.is_none_or(|dt| dt.timestamp_millis() <= 0)
}
