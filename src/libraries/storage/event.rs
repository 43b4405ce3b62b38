use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Queue entry decoding errors
#[derive(Error, Debug)]
pub enum EventDecodeError {
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
}

/// A single analytics event as read off the queue
///
/// Immutable once produced, stored verbatim as a historical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub site_id: String,
    pub event_type: String,
    pub path: String,
    /// `None` for anonymous events
    pub user_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl RawEvent {
    /// Decodes the string field map of a queue entry
    ///
    /// `site_id` and `event_type` are required and must be non-empty. `path`
    /// defaults to the site root, an empty `user_id` means anonymous and an
    /// unparsable timestamp silently falls back to the current wall-clock
    /// time.
    pub fn decode(fields: &HashMap<String, String>) -> Result<Self, EventDecodeError> {
        let site_id = require(fields, "site_id")?;
        let event_type = require(fields, "event_type")?;

        let path = match fields.get("path").map(String::as_str) {
            None | Some("") => "/".to_string(),
            Some(path) => path.to_string(),
        };

        let user_id = fields.get("user_id").filter(|id| !id.is_empty()).cloned();

        let occurred_at = fields
            .get("timestamp")
            .and_then(|raw| parse_timestamp(raw))
            .unwrap_or_else(Utc::now);

        Ok(Self {
            site_id,
            event_type,
            path,
            user_id,
            occurred_at,
        })
    }

    /// UTC calendar date the event occurred on
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}

fn require(
    fields: &HashMap<String, String>,
    name: &'static str,
) -> Result<String, EventDecodeError> {
    match fields.get(name) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(EventDecodeError::MissingField(name)),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    // Instants without an offset are interpreted as UTC
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decodes_complete_entry() {
        let event = RawEvent::decode(&fields(&[
            ("site_id", "s1"),
            ("event_type", "view"),
            ("path", "/home"),
            ("user_id", "u1"),
            ("timestamp", "2024-01-01T10:00:00Z"),
        ]))
        .unwrap();

        assert_eq!(event.site_id, "s1");
        assert_eq!(event.event_type, "view");
        assert_eq!(event.path, "/home");
        assert_eq!(event.user_id.as_deref(), Some("u1"));
        assert_eq!(event.occurred_at.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn rejects_missing_or_empty_site() {
        let missing = fields(&[("event_type", "view")]);
        let empty = fields(&[("site_id", ""), ("event_type", "view")]);

        assert!(RawEvent::decode(&missing).is_err());
        assert!(RawEvent::decode(&empty).is_err());
    }

    #[test]
    fn empty_user_is_anonymous() {
        let event = RawEvent::decode(&fields(&[
            ("site_id", "s1"),
            ("event_type", "view"),
            ("user_id", ""),
        ]))
        .unwrap();

        assert_eq!(event.user_id, None);
    }

    #[test]
    fn path_defaults_to_site_root() {
        let event =
            RawEvent::decode(&fields(&[("site_id", "s1"), ("event_type", "view")])).unwrap();

        assert_eq!(event.path, "/");
    }

    #[test]
    fn unparsable_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let event = RawEvent::decode(&fields(&[
            ("site_id", "s1"),
            ("event_type", "view"),
            ("timestamp", "five past noon"),
        ]))
        .unwrap();
        let after = Utc::now();

        assert!(event.occurred_at >= before && event.occurred_at <= after);
    }

    #[test]
    fn accepts_timestamp_without_offset() {
        let event = RawEvent::decode(&fields(&[
            ("site_id", "s1"),
            ("event_type", "view"),
            ("timestamp", "2024-01-01T10:00:00"),
        ]))
        .unwrap();

        assert_eq!(event.occurred_at.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn date_is_derived_in_utc() {
        let event = RawEvent::decode(&fields(&[
            ("site_id", "s1"),
            ("event_type", "view"),
            ("timestamp", "2024-01-02T01:30:00+05:00"),
        ]))
        .unwrap();

        // 01:30+05:00 is 20:30 UTC of the previous day
        assert_eq!(event.date().to_string(), "2024-01-01");
    }
}
