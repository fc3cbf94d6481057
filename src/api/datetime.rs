//! Lenient datetime parsing for API payloads.
//!
//! The server emits RFC 3339 timestamps in some places and naive ISO-8601
//! values (no offset) in others. Naive values are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse a timestamp in any of the formats the API produces.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(naive) = s.parse::<NaiveDateTime>() {
    return Some(naive.and_utc());
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
    return Some(naive.and_utc());
  }
  // Bare dates
  s.parse::<NaiveDate>()
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Serde adapter for `#[serde(deserialize_with = "datetime::deserialize")]`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{}'", raw)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_parse_rfc3339() {
    assert_eq!(
      parse("2024-01-01T00:00:00Z"),
      Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
      parse("2024-01-01T02:00:00+02:00"),
      Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn test_parse_naive_as_utc() {
    let parsed = parse("2024-03-05T14:30:15.123456").unwrap();
    assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    let whole_seconds = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15).unwrap();
    assert_eq!(parsed.timestamp(), whole_seconds.timestamp());
    assert_eq!(parsed.timestamp_subsec_micros(), 123456);

    assert_eq!(
      parse("2024-03-05 14:30:15"),
      Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15).unwrap())
    );
  }

  #[test]
  fn test_parse_date_only() {
    assert_eq!(
      parse("2024-03-05"),
      Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn test_parse_garbage() {
    assert_eq!(parse("yesterday"), None);
    assert_eq!(parse(""), None);
  }
}
