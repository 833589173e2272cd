use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of teaching session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Cm,
    Td,
    Tp,
    Exam,
    Holiday,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Cm => "CM",
            EventType::Td => "TD",
            EventType::Tp => "TP",
            EventType::Exam => "EXAM",
            EventType::Holiday => "HOLIDAY",
            EventType::Other => "OTHER",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, vendor-agnostic class session.
///
/// Built once by the normalizer; the merge step only ever sets
/// `is_secondary`. Serialized field names are camelCase, matching the
/// persisted cache layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub id: String,
    pub title: String,
    pub subject_name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub type_label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Minutes, rounded
    pub duration: i64,
    pub room: Option<String>,
    pub staff: Vec<String>,
    pub group: Option<String>,
    /// `None` means the session applies to every group
    pub group_number: Option<u32>,
    pub notes: Option<String>,
    pub module: String,
    pub module_code: Option<String>,
    pub categories: Option<String>,
    pub color: String,
    pub is_holiday: bool,
    #[serde(default)]
    pub is_secondary: bool,
}

impl DomainEvent {
    /// Key used to drop duplicates when feeds are merged
    pub fn dedup_key(&self) -> String {
        format!("{}_{}", self.id, self.start.timestamp_millis())
    }

    /// Start time as local HH:MM
    pub fn start_time(&self) -> String {
        self.start.with_timezone(&Local).format("%H:%M").to_string()
    }

    /// End time as local HH:MM
    pub fn end_time(&self) -> String {
        self.end.with_timezone(&Local).format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&EventType::Exam).unwrap(), "\"EXAM\"");
        assert_eq!(serde_json::from_str::<EventType>("\"TD\"").unwrap(), EventType::Td);
        assert_eq!(EventType::Holiday.to_string(), "HOLIDAY");
    }

    #[test]
    #[serial_test::serial]
    fn test_time_labels_are_local() {
        let start = Local.with_ymd_and_hms(2026, 1, 15, 8, 5, 0).unwrap().with_timezone(&Utc);
        let end = Local.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap().with_timezone(&Utc);
        let event = DomainEvent {
            id: "x".into(),
            title: "Algèbre".into(),
            subject_name: "Algèbre".into(),
            event_type: EventType::Cm,
            type_label: "Cours".into(),
            start,
            end,
            duration: 115,
            room: None,
            staff: vec![],
            group: None,
            group_number: None,
            notes: None,
            module: "Algèbre".into(),
            module_code: None,
            categories: None,
            color: "#6366f1".into(),
            is_holiday: false,
            is_secondary: false,
        };

        assert_eq!(event.start_time(), "08:05");
        assert_eq!(event.end_time(), "10:00");
        assert_eq!(event.dedup_key(), format!("x_{}", start.timestamp_millis()));
    }
}
