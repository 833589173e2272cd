use crate::event::{DomainEvent, EventType};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A user-defined rule hiding events whose text matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannedPattern {
    pub pattern: String,
    #[serde(default)]
    pub is_regex: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl BannedPattern {
    pub fn plain(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            is_regex: false,
            enabled: true,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            is_regex: true,
            ..Self::plain(pattern)
        }
    }

    /// `None` for disabled, blank or invalid patterns
    fn compile(&self) -> Option<PatternMatcher> {
        if !self.enabled || self.pattern.trim().is_empty() {
            return None;
        }

        if self.is_regex {
            match RegexBuilder::new(&self.pattern).case_insensitive(true).build() {
                Ok(re) => Some(PatternMatcher::Regex(re)),
                Err(e) => {
                    log::warn!("Skipping invalid banned pattern {:?}: {}", self.pattern, e);
                    None
                }
            }
        } else {
            Some(PatternMatcher::Plain(self.pattern.to_lowercase()))
        }
    }
}

enum PatternMatcher {
    Plain(String),
    Regex(Regex),
}

/// Banned patterns compiled once for a whole event list
pub(crate) struct BannedMatcher {
    matchers: Vec<PatternMatcher>,
}

impl BannedMatcher {
    pub(crate) fn new(patterns: &[BannedPattern]) -> Self {
        Self {
            matchers: patterns.iter().filter_map(BannedPattern::compile).collect(),
        }
    }

    pub(crate) fn matches(&self, event: &DomainEvent) -> bool {
        if self.matchers.is_empty() {
            return false;
        }
        let haystack = banned_haystack(event);
        self.matchers.iter().any(|m| match m {
            PatternMatcher::Plain(needle) => haystack.contains(needle.as_str()),
            PatternMatcher::Regex(re) => re.is_match(&haystack),
        })
    }
}

/// User choices about which events to show
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSettings {
    pub banned_patterns: Vec<BannedPattern>,
    pub hidden_subjects: Vec<String>,
    pub hidden_types: Vec<EventType>,
    pub group_number: Option<u32>,
}

/// Result of applying filters, order preserved on both sides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub visible: Vec<DomainEvent>,
    pub hidden: Vec<DomainEvent>,
}

fn banned_haystack(event: &DomainEvent) -> String {
    let mut parts: Vec<&str> = vec![event.title.as_str(), event.subject_name.as_str()];
    parts.extend(event.group.as_deref());
    parts.push(event.module.as_str());
    parts.extend(event.notes.as_deref());
    parts.extend(event.staff.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

/// True if any enabled pattern matches the event's text
pub fn matches_banned_patterns(event: &DomainEvent, patterns: &[BannedPattern]) -> bool {
    BannedMatcher::new(patterns).matches(event)
}

/// Sessions without a group number apply to everyone
pub fn matches_group(event: &DomainEvent, target: Option<u32>) -> bool {
    match (target, event.group_number) {
        (Some(target), Some(group)) => target == group,
        _ => true,
    }
}

/// Split events into what the user sees and what their settings hide
pub fn apply_filters(events: &[DomainEvent], settings: &FilterSettings) -> FilterOutcome {
    let banned = BannedMatcher::new(&settings.banned_patterns);
    let mut outcome = FilterOutcome::default();

    for event in events {
        let hidden = banned.matches(event)
            || settings.hidden_subjects.contains(&event.subject_name)
            || settings.hidden_types.contains(&event.event_type)
            || !matches_group(event, settings.group_number);

        if hidden {
            outcome.hidden.push(event.clone());
        } else {
            outcome.visible.push(event.clone());
        }
    }

    outcome
}

/// Events eligible for the subject and type pickers.
///
/// Banned and other-group sessions are left out; hidden subjects and types
/// stay so they can be re-enabled.
pub fn filter_option_events(events: &[DomainEvent], settings: &FilterSettings) -> Vec<DomainEvent> {
    let banned = BannedMatcher::new(&settings.banned_patterns);
    events
        .iter()
        .filter(|e| !banned.matches(e))
        .filter(|e| matches_group(e, settings.group_number))
        .cloned()
        .collect()
}

/// Case-insensitive substring search across an event's text fields
pub fn search_events<'a>(events: &'a [DomainEvent], query: &str) -> Vec<&'a DomainEvent> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return events.iter().collect();
    }

    events
        .iter()
        .filter(|e| {
            let mut fields: Vec<&str> = vec![e.title.as_str(), e.subject_name.as_str()];
            fields.extend(e.room.as_deref());
            fields.push(e.module.as_str());
            fields.extend(e.notes.as_deref());
            fields.extend(e.staff.iter().map(String::as_str));
            fields.iter().any(|f| f.to_lowercase().contains(&query))
        })
        .collect()
}
