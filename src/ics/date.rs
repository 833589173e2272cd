//! DTSTART/DTEND value parsing.
//!
//! Feeds from CELCAT, ADE and Hyperplanning disagree on separators and on
//! whether times carry a `Z`. Any `TZID` parameter has already been dropped
//! by the tokenizer: floating and zoned times are both read as host-local.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse an iCal date or date-time value.
///
/// `YYYYMMDDTHHMMSS[Z]` (colons and hyphens allowed) is UTC when it ends with
/// `Z`, host-local otherwise. `YYYYMMDD` is local midnight. Anything else goes
/// through a best-effort generic parse.
pub fn parse_ics_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let cleaned: String = value.chars().filter(|c| *c != ':' && *c != '-').collect();

    if cleaned.len() >= 15 {
        let naive = parse_basic_datetime(&cleaned)?;
        if cleaned.ends_with('Z') {
            return Some(Utc.from_utc_datetime(&naive));
        }
        return local_to_utc(naive);
    }

    if cleaned.len() == 8 {
        let date = parse_basic_date(&cleaned)?;
        return local_midnight(date);
    }

    parse_generic(value)
}

/// Local midnight of `date`, as a UTC instant
pub fn local_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    local_to_utc(date.and_hms_opt(0, 0, 0)?)
}

/// Resolve a wall-clock time in the host time zone.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times inside a
/// DST gap are pushed forward by one hour.
pub fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => Local
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// YYYYMMDD
fn parse_basic_date(value: &str) -> Option<NaiveDate> {
    let year = value.get(0..4)?.parse().ok()?;
    let month = value.get(4..6)?.parse().ok()?;
    let day = value.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// YYYYMMDDTHHMMSS, anything after the seconds is ignored
fn parse_basic_datetime(value: &str) -> Option<NaiveDateTime> {
    let date = parse_basic_date(value)?;
    let hour = value.get(9..11)?.parse().ok()?;
    let minute = value.get(11..13)?.parse().ok()?;
    let second = value.get(13..15)?.parse().ok()?;
    date.and_hms_opt(hour, minute, second)
}

fn parse_generic(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return local_to_utc(naive);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(local_midnight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::panic::{self, AssertUnwindSafe};

    /// Central European time with its EU switch dates
    const PARIS_RULES: &str = "CET-1CEST,M3.5.0,M10.5.0/3";

    fn with_host_zone(tz: &str, f: impl FnOnce()) {
        let previous = std::env::var("TZ").ok();
        // SAFETY: every test reading the host zone is #[serial]
        unsafe { std::env::set_var("TZ", tz) };
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        unsafe {
            match previous {
                Some(tz) => std::env::set_var("TZ", tz),
                None => std::env::remove_var("TZ"),
            }
        }
        if let Err(payload) = outcome {
            panic::resume_unwind(payload);
        }
    }

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, s)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_parse_utc_datetime() {
        let dt = parse_ics_date("20260115T143000Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 15, 14, 30, 0).unwrap());
    }

    #[test]
    #[serial]
    fn test_parse_floating_datetime_is_local() {
        let dt = parse_ics_date("20260115T143000").unwrap();
        assert_eq!(dt, local(2026, 1, 15, 14, 30, 0));
    }

    #[test]
    fn test_parse_with_separators() {
        let dt = parse_ics_date("2026-01-15T14:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 1, 15, 14, 30, 0).unwrap());
    }

    #[test]
    #[serial]
    fn test_parse_all_day_is_local_midnight() {
        let dt = parse_ics_date("20260101").unwrap();
        assert_eq!(dt, local(2026, 1, 1, 0, 0, 0));
    }

    #[test]
    #[serial]
    fn test_parse_generic_fallback() {
        // 13 characters once separators are stripped, so neither fixed shape applies
        let dt = parse_ics_date("2026-01-15T14:30").unwrap();
        assert_eq!(dt, local(2026, 1, 15, 14, 30, 0));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_ics_date("not a date"), None);
        assert_eq!(parse_ics_date(""), None);
        assert_eq!(parse_ics_date("2026AB15T143000Z"), None);
        assert_eq!(parse_ics_date("20261345"), None);
    }

    #[test]
    #[serial]
    fn test_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(local_midnight(date), Some(local(2026, 3, 2, 0, 0, 0)));
    }

    #[test]
    #[serial]
    fn test_time_in_spring_gap_moves_forward() {
        with_host_zone(PARIS_RULES, || {
            // 02:00 jumps to 03:00 on 2026-03-29; 03:30 CEST is 01:30 UTC
            assert_eq!(
                local_to_utc(naive("2026-03-29 02:30")),
                Some(Utc.with_ymd_and_hms(2026, 3, 29, 1, 30, 0).unwrap())
            );
            assert_eq!(
                parse_ics_date("20260329T023000"),
                Some(Utc.with_ymd_and_hms(2026, 3, 29, 1, 30, 0).unwrap())
            );
        });
    }

    #[test]
    #[serial]
    fn test_repeated_autumn_time_takes_earlier_instant() {
        with_host_zone(PARIS_RULES, || {
            // 02:30 happens twice on 2026-10-25, first at +02:00
            assert_eq!(
                local_to_utc(naive("2026-10-25 02:30")),
                Some(Utc.with_ymd_and_hms(2026, 10, 25, 0, 30, 0).unwrap())
            );
            assert_eq!(
                local_to_utc(naive("2026-10-25 12:00")),
                Some(Utc.with_ymd_and_hms(2026, 10, 25, 11, 0, 0).unwrap())
            );
        });
    }
}
