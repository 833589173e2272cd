use crate::description::parse_description;
use crate::event::{DomainEvent, EventType};
use crate::ics::{RawEventRecord, parse_ical};
use crate::rules::RuleSet;
use once_cell::sync::Lazy;
use regex::Regex;

/// Subject shown when a title reduces to nothing
pub const UNTITLED: &str = "Sans titre";

/// Subject colors, indexed by a hash of the subject name
pub const PALETTE: [&str; 12] = [
    "#6366f1", // indigo
    "#ec4899", // pink
    "#10b981", // emerald
    "#f59e0b", // amber
    "#8b5cf6", // violet
    "#06b6d4", // cyan
    "#f43f5e", // rose
    "#84cc16", // lime
    "#0ea5e9", // sky
    "#d946ef", // fuchsia
    "#14b8a6", // teal
    "#fb923c", // orange
];

// e.g. "A311 ", "INF-1203 "
static MODULE_CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,4}-?[0-9]{2,4}\s+").unwrap());

// e.g. "ECO-03 03 "
static SPACED_CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,4}-[0-9]{2}\s[0-9]{2}\s+").unwrap());

static MODULE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z]{1,4}-?[0-9]{2,4}").unwrap());

static JOINED_TYPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i);\s*\b(CM|TD|TP|Examen|DS|Partiel)\b\s*").unwrap());

static TRAILING_TYPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(CM|TD|TP|Examen|DS|Partiel)\s*$").unwrap());

/// Turns raw VEVENT records into [`DomainEvent`]s
#[derive(Debug, Clone, Default)]
pub struct EventNormalizer {
    rules: RuleSet,
}

impl EventNormalizer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Parse iCal text all the way to domain events, sorted by start
    pub fn parse_calendar(&self, ical_data: &str) -> Vec<DomainEvent> {
        self.normalize_all(&parse_ical(ical_data))
    }

    /// Normalize records and sort them by start (stable for equal starts)
    pub fn normalize_all(&self, records: &[RawEventRecord]) -> Vec<DomainEvent> {
        let mut events: Vec<DomainEvent> = records.iter().map(|r| self.normalize(r)).collect();
        events.sort_by_key(|e| e.start);
        events
    }

    pub fn normalize(&self, raw: &RawEventRecord) -> DomainEvent {
        let parsed = raw
            .description
            .as_deref()
            .map(parse_description)
            .unwrap_or_default();
        let title = raw.summary.as_deref().unwrap_or("");

        let classification = self.rules.classify(title, raw.description.as_deref());
        let subject_name = extract_subject_name(title, parsed.module.as_deref());
        let module_code = extract_module_code(title);

        let group_text = [
            parsed.notes.as_deref(),
            parsed.group.as_deref(),
            raw.categories.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
        let group_number = self.rules.group_number(&group_text);

        let start = raw.start;
        let end = raw.end.unwrap_or(start);
        // halves round up, also for negative durations
        let duration = ((end - start).num_milliseconds() as f64 / 60_000.0 + 0.5).floor() as i64;

        let id = raw
            .uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .unwrap_or_else(|| format!("{}-{}", start.timestamp_millis(), subject_name));

        let room = parsed
            .room
            .clone()
            .or_else(|| raw.location.clone().filter(|l| !l.trim().is_empty()));

        DomainEvent {
            id,
            title: subject_name.clone(),
            color: subject_color(&subject_name).to_string(),
            module: parsed.module.clone().unwrap_or_else(|| subject_name.clone()),
            subject_name,
            is_holiday: classification.event_type == EventType::Holiday,
            event_type: classification.event_type,
            type_label: classification.label,
            start,
            end,
            duration,
            room,
            staff: parsed.staff,
            group: parsed.group,
            group_number,
            notes: parsed.notes,
            module_code,
            categories: raw.categories.clone(),
            is_secondary: false,
        }
    }
}

/// Clean course title out of a vendor title such as
/// `A311 Atelier de projet - GIVELET - Gpe 5`.
///
/// A module label from the description takes precedence when it still has
/// text once its code is removed.
pub fn extract_subject_name(title: &str, module: Option<&str>) -> String {
    if let Some(module) = module {
        let stripped = MODULE_CODE_PREFIX.replace(module.trim_start(), "");
        let stripped = stripped.trim();
        if !stripped.is_empty() {
            return stripped.to_string();
        }
    }

    let head = title.split(" - ").next().unwrap_or("").trim();
    let name = SPACED_CODE_PREFIX.replace(head, "");
    let name = MODULE_CODE_PREFIX.replace(&name, "");
    let name = JOINED_TYPE_SUFFIX.replace_all(&name, "");
    let name = TRAILING_TYPE_SUFFIX.replace(&name, "");
    let name = name.trim();

    if name.is_empty() {
        UNTITLED.to_string()
    } else {
        name.to_string()
    }
}

/// Leading module code of a raw title (`A311`, `INF-1203`), if any
pub fn extract_module_code(title: &str) -> Option<String> {
    MODULE_CODE.find(title).map(|m| m.as_str().to_string())
}

/// Stable palette color for a subject.
///
/// Folds UTF-16 code units as `unit + ((hash << 5) - hash)`. Only the shift
/// is truncated to 32 bits; the running hash itself is not.
pub fn subject_color(subject_name: &str) -> &'static str {
    let hash = subject_name.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit).wrapping_add(shifted.wrapping_sub(hash))
    });
    PALETTE[(hash.unsigned_abs() % PALETTE.len() as u64) as usize]
}
