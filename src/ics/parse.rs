use crate::ics::date::parse_ics_date;
use chrono::{DateTime, Utc};

/// One logical (unfolded) content line.
///
/// `name` has its parameters stripped (`DTSTART;TZID=Europe/Paris` becomes
/// `DTSTART`), `value` is still iCal-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldToken {
    pub name: String,
    pub value: String,
}

/// A VEVENT block as found in the feed, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RawEventRecord {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub uid: Option<String>,
    pub categories: Option<String>,
}

/// Parse an iCal VCALENDAR string into raw event records, in feed order
pub fn parse_ical(ical_data: &str) -> Vec<RawEventRecord> {
    reduce(tokenize(ical_data))
}

/// Split iCal text into field tokens. Lines without a colon are skipped.
pub fn tokenize(ical_data: &str) -> impl Iterator<Item = FieldToken> {
    unfold_ical_lines(ical_data)
        .into_iter()
        .filter_map(|line| parse_ical_line(&line))
}

/// Fold the token stream into completed records.
///
/// A record is emitted at `END:VEVENT` only if it has a start; a second
/// `BEGIN:VEVENT` throws away whatever was in progress.
pub fn reduce<I>(tokens: I) -> Vec<RawEventRecord>
where
    I: IntoIterator<Item = FieldToken>,
{
    let (_, events) = tokens.into_iter().fold(
        (ReducerState::Idle, Vec::new()),
        |(state, mut events), token| {
            let next = state.step(&token, &mut events);
            (next, events)
        },
    );
    events
}

enum ReducerState {
    Idle,
    InEvent(RawEventBuilder),
}

impl ReducerState {
    fn step(self, token: &FieldToken, events: &mut Vec<RawEventRecord>) -> Self {
        match (token.name.as_str(), token.value.trim()) {
            ("BEGIN", "VEVENT") => ReducerState::InEvent(RawEventBuilder::default()),
            ("END", "VEVENT") => {
                if let ReducerState::InEvent(builder) = self
                    && let Some(record) = builder.build()
                {
                    events.push(record);
                }
                ReducerState::Idle
            }
            _ => match self {
                ReducerState::InEvent(mut builder) => {
                    builder.apply(token);
                    ReducerState::InEvent(builder)
                }
                ReducerState::Idle => ReducerState::Idle,
            },
        }
    }
}

#[derive(Default)]
struct RawEventBuilder {
    summary: Option<String>,
    description: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    location: Option<String>,
    uid: Option<String>,
    categories: Option<String>,
}

impl RawEventBuilder {
    fn apply(&mut self, token: &FieldToken) {
        let value = token.value.as_str();
        match token.name.as_str() {
            "SUMMARY" => self.summary = Some(unescape_ical(value)),
            "DESCRIPTION" => self.description = Some(unescape_ical(value)),
            "DTSTART" => self.start = parse_ics_date(value),
            "DTEND" => self.end = parse_ics_date(value),
            "LOCATION" => self.location = Some(unescape_ical(value)),
            "UID" => self.uid = Some(value.to_string()),
            "CATEGORIES" => self.categories = Some(value.to_string()),
            _ => {}
        }
    }

    fn build(self) -> Option<RawEventRecord> {
        Some(RawEventRecord {
            summary: self.summary,
            description: self.description,
            start: self.start?,
            end: self.end,
            location: self.location,
            uid: self.uid,
            categories: self.categories,
        })
    }
}

/// Unfold iCal lines. A physical line starting with a space or tab continues
/// the previous one; exactly that first character is dropped.
fn unfold_ical_lines(data: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for line in data.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            current.push_str(&line[1..]);
        } else {
            if !current.is_empty() {
                result.push(current);
            }
            current = line.to_string();
        }
    }
    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Parse a single logical line into a token
fn parse_ical_line(line: &str) -> Option<FieldToken> {
    let colon_pos = line.find(':')?;
    let key = &line[..colon_pos];
    let name = key.split(';').next().unwrap_or(key);
    Some(FieldToken {
        name: name.to_string(),
        value: line[colon_pos + 1..].to_string(),
    })
}

/// Unescape iCal text values (`\n`, `\,`, `\;`, `\\`)
pub fn unescape_ical(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
