use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event submitted for ingestion
///
/// Mirrors the raw event model: `user_id` is optional and an omitted `path`
/// counts against the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSubmission {
    pub site_id: String,
    pub event_type: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn default_path() -> String {
    "/".to_string()
}

impl EventSubmission {
    /// Submissions require a non-empty site and event type
    pub fn is_valid(&self) -> bool {
        !self.site_id.is_empty() && !self.event_type.is_empty()
    }

    /// Flattens the submission into the string field map stored in the queue
    ///
    /// An anonymous user is stored as an empty string.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("site_id", self.site_id.clone()),
            ("event_type", self.event_type.clone()),
            ("path", self.path.clone()),
            ("user_id", self.user_id.clone().unwrap_or_default()),
            ("timestamp", self.timestamp.to_rfc3339()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::storage::RawEvent;
    use std::collections::HashMap;

    fn submission(user_id: Option<&str>) -> EventSubmission {
        EventSubmission {
            site_id: "s1".to_string(),
            event_type: "view".to_string(),
            path: "/home".to_string(),
            user_id: user_id.map(str::to_string),
            timestamp: "2024-01-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn anonymous_user_is_stored_as_empty_string() {
        let fields = submission(None).to_fields();
        let user_id = fields.iter().find(|(name, _)| *name == "user_id").unwrap();

        assert_eq!(user_id.1, "");
    }

    #[test]
    fn omitted_path_defaults_to_site_root() {
        let submission: EventSubmission = serde_json::from_value(serde_json::json!({
            "site_id": "s1",
            "event_type": "view",
            "timestamp": "2024-01-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(submission.path, "/");
        assert!(submission.is_valid());
    }

    #[test]
    fn empty_site_is_invalid() {
        let mut submission = submission(None);
        submission.site_id.clear();

        assert!(!submission.is_valid());
    }

    #[test]
    fn fields_decode_back_into_the_submitted_event() {
        let submission = submission(Some("u1"));
        let fields: HashMap<String, String> = submission
            .to_fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        let event = RawEvent::decode(&fields).unwrap();

        assert_eq!(event.site_id, submission.site_id);
        assert_eq!(event.event_type, submission.event_type);
        assert_eq!(event.path, submission.path);
        assert_eq!(event.user_id, submission.user_id);
        assert_eq!(event.occurred_at, submission.timestamp);
    }
}
