//! DESCRIPTION field parsing.
//!
//! CELCAT writes `Key: value` lines with English labels, Hyperplanning and
//! ADE use French ones. Both resolve to the same [`ParsedDescription`].

/// Stands in for escaped commas while a value is being split
const ESCAPED_COMMA_PLACEHOLDER: &str = "\u{E000}";

/// Delimiters tried in order; the first one present in the value wins
const MULTI_VALUE_DELIMITERS: [char; 3] = ['|', ';', ','];

/// Structured view of an event description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDescription {
    pub department: Option<String>,
    pub category: Option<String>,
    pub group: Option<String>,
    pub module: Option<String>,
    pub room: Option<String>,
    pub notes: Option<String>,
    pub staff: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptionField {
    Department,
    Category,
    Group,
    Module,
    Staff,
    Room,
    /// Multi-valued room label, joined back with ", "
    RoomList,
    Notes,
}

/// Lowercased label -> field
const LABELS: &[(&str, DescriptionField)] = &[
    ("department", DescriptionField::Department),
    ("event category", DescriptionField::Category),
    ("group", DescriptionField::Group),
    ("module", DescriptionField::Module),
    ("staff", DescriptionField::Staff),
    ("room", DescriptionField::Room),
    ("notes", DescriptionField::Notes),
    ("matière", DescriptionField::Module),
    ("enseignant", DescriptionField::Staff),
    ("enseignants", DescriptionField::Staff),
    ("groupe", DescriptionField::Group),
    ("groupes", DescriptionField::Group),
    ("promotion", DescriptionField::Group),
    ("promotions", DescriptionField::Group),
    ("td", DescriptionField::Group),
    ("salle", DescriptionField::RoomList),
    ("salles", DescriptionField::RoomList),
];

fn lookup_label(key: &str) -> Option<DescriptionField> {
    LABELS
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, field)| *field)
}

/// Parse an (already unescaped) description into its labelled fields.
///
/// Lines are split on real newlines and on a literal `\n` left behind by
/// double-escaping feeds. Unknown labels are ignored.
pub fn parse_description(raw: &str) -> ParsedDescription {
    let mut result = ParsedDescription::default();

    let lines = raw
        .split("\\n")
        .flat_map(|chunk| chunk.split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty());

    for line in lines {
        let (key, value) = match line.split_once(':') {
            Some((key, value)) => (key, value.trim()),
            None => (line, ""),
        };

        let Some(field) = lookup_label(&key.trim().to_lowercase()) else {
            continue;
        };

        let literal = (!value.is_empty()).then(|| value.to_string());
        match field {
            DescriptionField::Department => result.department = literal,
            DescriptionField::Category => result.category = literal,
            DescriptionField::Group => result.group = literal,
            DescriptionField::Module => result.module = literal,
            DescriptionField::Notes => result.notes = literal,
            DescriptionField::Room => result.room = literal,
            DescriptionField::Staff => result.staff = split_multi_value(value),
            DescriptionField::RoomList => {
                let rooms = split_multi_value(value);
                result.room = (!rooms.is_empty()).then(|| rooms.join(", "));
            }
        }
    }

    result
}

/// Split a field holding several entries (staff, rooms).
///
/// Exactly one delimiter is used, picked by presence in the order `|`, `;`,
/// `,`. Escaped commas (`\,`) never act as delimiters and come back as plain
/// commas. Parts are trimmed and empty ones dropped.
pub fn split_multi_value(value: &str) -> Vec<String> {
    let protected = value.replace("\\,", ESCAPED_COMMA_PLACEHOLDER);

    let parts: Vec<&str> = match MULTI_VALUE_DELIMITERS
        .into_iter()
        .find(|d| protected.contains(*d))
    {
        Some(delimiter) => protected.split(delimiter).collect(),
        None => vec![protected.as_str()],
    };

    parts
        .into_iter()
        .map(|part| part.replace(ESCAPED_COMMA_PLACEHOLDER, ",").trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
