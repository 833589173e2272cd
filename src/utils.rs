//! Read-only queries over a normalized event list

use crate::event::{DomainEvent, EventType};
use crate::ics::local_midnight;
use chrono::{Datelike, Days, Duration, NaiveDate};
use std::collections::HashMap;

/// A subject and how many sessions it has
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSummary {
    pub name: String,
    pub color: String,
    pub count: usize,
}

/// A course type and how many sessions it has
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub event_type: EventType,
    pub label: String,
    pub count: usize,
}

/// Distinct subjects, most frequent first (first-seen order on ties)
pub fn unique_subjects(events: &[DomainEvent]) -> Vec<SubjectSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut subjects: Vec<SubjectSummary> = Vec::new();

    for event in events {
        let slot = *index.entry(&event.subject_name).or_insert_with(|| {
            subjects.push(SubjectSummary {
                name: event.subject_name.clone(),
                color: event.color.clone(),
                count: 0,
            });
            subjects.len() - 1
        });
        subjects[slot].count += 1;
    }

    subjects.sort_by(|a, b| b.count.cmp(&a.count));
    subjects
}

/// Distinct course types in first-seen order
pub fn unique_types(events: &[DomainEvent]) -> Vec<TypeSummary> {
    let mut types: Vec<TypeSummary> = Vec::new();

    for event in events {
        match types.iter_mut().find(|t| t.event_type == event.event_type) {
            Some(summary) => summary.count += 1,
            None => types.push(TypeSummary {
                event_type: event.event_type,
                label: event.type_label.clone(),
                count: 1,
            }),
        }
    }

    types
}

/// Events starting on `date`, local midnight to 23:59:59.999 inclusive
pub fn events_for_date(events: &[DomainEvent], date: NaiveDate) -> Vec<&DomainEvent> {
    let Some(day_start) = local_midnight(date) else {
        return Vec::new();
    };
    let day_end = date
        .succ_opt()
        .and_then(local_midnight)
        .map(|next| next - Duration::milliseconds(1))
        .unwrap_or(day_start + Duration::days(1) - Duration::milliseconds(1));

    events
        .iter()
        .filter(|e| e.start >= day_start && e.start <= day_end)
        .collect()
}

/// Monday to Sunday of the ISO week containing `date`
pub fn week_dates(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
    std::array::from_fn(|i| monday + Days::new(i as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::EventNormalizer;
    use crate::ics::{RawEventRecord, local_to_utc};
    use chrono::{DateTime, NaiveDateTime, Utc, Weekday};

    fn at(start: DateTime<Utc>, summary: &str) -> DomainEvent {
        EventNormalizer::default().normalize(&RawEventRecord {
            summary: Some(summary.to_string()),
            description: None,
            start,
            end: None,
            location: None,
            uid: None,
            categories: None,
        })
    }

    fn local(s: &str) -> DateTime<Utc> {
        local_to_utc(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f").unwrap()).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    #[serial_test::serial]
    fn test_unique_subjects_sorted_by_count() {
        let events = vec![
            at(local("2026-01-12 08:00:00.000"), "Algèbre CM"),
            at(local("2026-01-12 10:00:00.000"), "Analyse TD"),
            at(local("2026-01-13 08:00:00.000"), "Analyse CM"),
            at(local("2026-01-14 08:00:00.000"), "Physique TP"),
        ];

        let subjects = unique_subjects(&events);
        let names: Vec<_> = subjects.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Analyse", "Algèbre", "Physique"]);
        assert_eq!(subjects[0].count, 2);
        assert_eq!(subjects[0].color, events[1].color);
    }

    #[test]
    #[serial_test::serial]
    fn test_unique_types_first_seen_order() {
        let events = vec![
            at(local("2026-01-12 08:00:00.000"), "Analyse TD"),
            at(local("2026-01-12 10:00:00.000"), "Algèbre CM"),
            at(local("2026-01-13 08:00:00.000"), "Analyse TD"),
        ];

        let types = unique_types(&events);
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].event_type, EventType::Td);
        assert_eq!(types[0].count, 2);
        assert_eq!(types[1].label, "Cours");
    }

    #[test]
    #[serial_test::serial]
    fn test_events_for_date_boundaries() {
        let events = vec![
            at(local("2026-01-14 23:59:59.999"), "Veille"),
            at(local("2026-01-15 00:00:00.000"), "Minuit"),
            at(local("2026-01-15 23:59:59.999"), "Dernière"),
            at(local("2026-01-16 00:00:00.000"), "Lendemain"),
        ];

        let day: Vec<_> = events_for_date(&events, date(2026, 1, 15))
            .into_iter()
            .map(|e| e.subject_name.as_str())
            .collect();
        assert_eq!(day, vec!["Minuit", "Dernière"]);
    }

    #[test]
    fn test_week_dates_from_sunday() {
        let week = week_dates(date(2026, 1, 18));
        assert_eq!(week[0], date(2026, 1, 12));
        assert_eq!(week[0].weekday(), Weekday::Mon);
        assert_eq!(week[6], date(2026, 1, 18));
    }

    #[test]
    fn test_week_dates_midweek_and_month_edge() {
        assert_eq!(week_dates(date(2026, 1, 14))[0], date(2026, 1, 12));
        assert_eq!(week_dates(date(2026, 1, 12))[0], date(2026, 1, 12));
        let week = week_dates(date(2026, 3, 1));
        assert_eq!(week[0], date(2026, 2, 23));
        assert_eq!(week[6], date(2026, 3, 1));
    }
}
