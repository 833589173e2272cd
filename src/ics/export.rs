use crate::event::DomainEvent;
use chrono::{DateTime, Utc};

const PRODID: &str = "-//Campuscal//FR";

/// Render one event as a standalone VCALENDAR, for adding it to another
/// calendar application
pub fn event_to_ics(event: &DomainEvent, now: DateTime<Utc>) -> String {
    let description = [
        (!event.staff.is_empty()).then(|| format!("Enseignant: {}", event.staff.join(", "))),
        event.group.as_ref().map(|g| format!("Groupe: {}", g)),
        event.notes.clone(),
    ]
    .into_iter()
    .flatten()
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join("\n");

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@campuscal", event.id),
        format!("DTSTAMP:{}", format_ics_date(now)),
        format!("DTSTART:{}", format_ics_date(event.start)),
        format!("DTEND:{}", format_ics_date(event.end)),
        format!("SUMMARY:{}", escape_ical(&event.subject_name)),
    ];
    if let Some(room) = &event.room {
        lines.push(format!("LOCATION:{}", escape_ical(room)));
    }
    if !description.is_empty() {
        lines.push(format!("DESCRIPTION:{}", escape_ical(&description)));
    }
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// File name for an exported event, e.g. `Atelier_de_projet.ics`
pub fn export_file_name(event: &DomainEvent) -> String {
    let stem: String = event
        .subject_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "event.ics".to_string()
    } else {
        format!("{}.ics", stem)
    }
}

fn format_ics_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Physical lines are at most 75 octets, continuations start with a space
fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;
    if line.len() <= LIMIT {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / LIMIT * 3);
    let mut width = 0;
    for c in line.chars() {
        if width + c.len_utf8() > LIMIT {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(c);
        width += c.len_utf8();
    }
    folded
}

fn escape_ical(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::EventNormalizer;
    use crate::ics::parse_ical;
    use chrono::TimeZone;

    fn sample() -> DomainEvent {
        let ical = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:celcat-7\r\nSUMMARY:A311 Atelier de projet - GIVELET\r\n\
DESCRIPTION:Staff: GIVELET;MARTIN\\nGroup: Gpe 5\\nNotes: Rendu; version finale\r\n\
LOCATION:B204\\, bât. Sud\r\nDTSTART:20260115T080000Z\r\nDTEND:20260115T100000Z\r\nEND:VEVENT\r\nEND:VCALENDAR";
        EventNormalizer::default().parse_calendar(ical).remove(0)
    }

    #[test]
    fn test_export_layout() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        let text = event_to_ics(&sample(), now).replace("\r\n ", "");

        assert!(text.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(text.contains("\r\nUID:celcat-7@campuscal\r\n"));
        assert!(text.contains("\r\nDTSTAMP:20260110T120000Z\r\n"));
        assert!(text.contains("\r\nDTSTART:20260115T080000Z\r\n"));
        assert!(text.contains("\r\nLOCATION:B204\\, bât. Sud\r\n"));
        assert!(text.contains(
            "\r\nDESCRIPTION:Enseignant: GIVELET\\, MARTIN\\nGroupe: Gpe 5\\nRendu\\; version finale\r\n"
        ));
        assert!(text.ends_with("END:VEVENT\r\nEND:VCALENDAR"));
    }

    #[test]
    fn test_export_parses_back() {
        let event = sample();
        let text = event_to_ics(&event, Utc::now());
        let records = parse_ical(&text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary.as_deref(), Some("Atelier de projet"));
        assert_eq!(records[0].start, event.start);
        assert_eq!(records[0].end, Some(event.end));
        assert_eq!(records[0].location.as_deref(), Some("B204, bât. Sud"));
    }

    #[test]
    fn test_long_lines_are_folded() {
        let mut event = sample();
        event.subject_name = "Introduction à la programmation orientée objet et aux structures de données avancées".to_string();
        let text = event_to_ics(&event, Utc::now());

        for line in text.split("\r\n") {
            assert!(line.len() <= 75, "{:?} is {} octets", line, line.len());
        }
        assert!(text.contains("\r\n "));
        assert_eq!(parse_ical(&text)[0].summary.as_deref(), Some(event.subject_name.as_str()));
    }

    #[test]
    fn test_reimported_event_keeps_group_and_staff() {
        let event = sample();
        let text = event_to_ics(&event, Utc::now());
        let again = EventNormalizer::default().parse_calendar(&text).remove(0);

        assert_eq!(again.group.as_deref(), Some("Gpe 5"));
        assert_eq!(again.group_number, Some(5));
        assert_eq!(again.staff, vec!["GIVELET", "MARTIN"]);
        assert_eq!(again.room, event.room);
    }

    #[test]
    fn test_export_file_name() {
        let mut event = sample();
        assert_eq!(export_file_name(&event), "Atelier_de_projet.ics");
        event.subject_name = "Économie".to_string();
        assert_eq!(export_file_name(&event), "_conomie.ics");
    }
}
