//! Plain serializable shapes handed to the persistence layer.
//!
//! Reminder state is deliberately absent: every reload starts with
//! "not yet notified".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Category, EventId};

/// Minute-granularity local date-time, e.g. `2024-01-01 10:00`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Key under which events are filed, e.g. `2024-01-01`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableEvent {
    pub text: String,
    /// Formatted with [`DATETIME_FORMAT`].
    pub datetime: String,
    pub reminder_minutes: u32,
    #[serde(default)]
    pub category: Category,
    /// Older snapshots may lack an id; one is generated on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
}

/// Full event collection keyed by date string, each value in insertion order.
pub type PortableSnapshot = BTreeMap<String, Vec<PortableEvent>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_record_without_category_or_id() {
        let json = r#"{"text":"Dentist","datetime":"2024-01-01 10:00","reminder_minutes":30}"#;
        let rec: PortableEvent = serde_json::from_str(json).unwrap();
        assert_eq!(rec.category, Category::General);
        assert!(rec.event_id.is_none());
    }

    #[test]
    fn negative_lead_is_rejected() {
        let json = r#"{"text":"x","datetime":"2024-01-01 10:00","reminder_minutes":-5}"#;
        assert!(serde_json::from_str::<PortableEvent>(json).is_err());
    }
}
