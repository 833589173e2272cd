use crate::event::DomainEvent;
use std::collections::HashSet;

/// Combine the primary feed with an optional secondary one.
///
/// Secondary events are tagged `is_secondary`, the whole list is re-sorted
/// by start, and events sharing an id and a start instant are collapsed to
/// the first one seen (primary before secondary at equal starts).
pub fn merge_feeds(primary: Vec<DomainEvent>, secondary: Option<Vec<DomainEvent>>) -> Vec<DomainEvent> {
    let mut all: Vec<DomainEvent> = primary
        .into_iter()
        .map(|e| tag(e, false))
        .chain(secondary.into_iter().flatten().map(|e| tag(e, true)))
        .collect();
    all.sort_by_key(|e| e.start);
    dedup_events(all)
}

/// Drop later events whose `{id}_{start_ms}` key was already seen
pub fn dedup_events(events: Vec<DomainEvent>) -> Vec<DomainEvent> {
    let mut seen = HashSet::new();
    let before = events.len();

    let unique: Vec<DomainEvent> = events
        .into_iter()
        .filter(|e| seen.insert(e.dedup_key()))
        .collect();

    if unique.len() < before {
        log::debug!("Dropped {} duplicate events", before - unique.len());
    }
    unique
}

fn tag(mut event: DomainEvent, is_secondary: bool) -> DomainEvent {
    event.is_secondary = is_secondary;
    event
}
