use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

const NANOS_PER_MILLI: i128 = 1_000_000;

const CALENDAR_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK_WITH_SECONDS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");
const CLOCK: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");

#[must_use]
pub fn unix_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| {
            u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
        })
}

#[must_use]
pub fn format_unix_ms(timestamp_unix_ms: u64) -> String {
    let nanos = i128::from(timestamp_unix_ms)
        .checked_mul(NANOS_PER_MILLI)
        .unwrap_or(i128::MAX);
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.millisecond()
    )
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_calendar_date(raw: &str) -> Result<Date> {
    let candidate = raw.trim();
    Date::parse(candidate, CALENDAR_DATE).with_context(|| {
        format!("`{candidate}` is not a valid calendar date formatted as YYYY-MM-DD")
    })
}

/// Parses `YYYY-MM-DD` or `YYYY-MM-DD[T ]HH:MM[:SS][Z]`; a bare date means midnight.
pub fn parse_date_time(raw: &str) -> Result<PrimitiveDateTime> {
    let candidate = raw.trim();
    let unzoned = candidate.strip_suffix('Z').unwrap_or(candidate);
    let (date_part, clock_part) = match unzoned.char_indices().nth(10) {
        Some((index, 'T' | ' ')) => (&unzoned[..index], Some(&unzoned[index + 1..])),
        _ => (unzoned, None),
    };

    let date = Date::parse(date_part, CALENDAR_DATE).with_context(|| {
        format!("`{candidate}` is not a date-time formatted as YYYY-MM-DDTHH:MM[:SS]")
    })?;
    let clock = match clock_part {
        Some(clock) => Time::parse(clock, CLOCK_WITH_SECONDS)
            .or_else(|_| Time::parse(clock, CLOCK))
            .with_context(|| format!("`{candidate}` is not a valid time of day"))?,
        None => Time::MIDNIGHT,
    };

    Ok(PrimitiveDateTime::new(date, clock))
}

#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[must_use]
pub fn format_date_time(value: PrimitiveDateTime) -> String {
    format!(
        "{}T{:02}:{:02}:{:02}",
        format_date(value.date()),
        value.hour(),
        value.minute(),
        value.second()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        format_date, format_date_time, format_unix_ms, parse_calendar_date, parse_date_time,
    };

    #[test]
    fn formats_unix_millis_as_utc() {
        assert_eq!(format_unix_ms(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(format_unix_ms(1_770_274_803_042), "2026-02-05T07:00:03.042Z");
    }

    #[test]
    fn parses_calendar_dates() {
        let date = parse_calendar_date("2024-02-29").expect("leap day should parse");
        assert_eq!(format_date(date), "2024-02-29");
    }

    #[test]
    fn rejects_impossible_or_malformed_dates() {
        let err = parse_calendar_date("2023-02-29").expect_err("non-leap day must fail");
        assert!(err.to_string().contains("not a valid calendar date"));

        let err = parse_calendar_date("01.03.2024").expect_err("dotted date must fail");
        assert!(err.to_string().contains("YYYY-MM-DD"));

        assert!(parse_calendar_date("2024-13-01").is_err());
        assert!(parse_calendar_date("2024-1-01").is_err());
        assert!(parse_calendar_date("2024-01-01T10:00").is_err());
    }

    #[test]
    fn parses_date_times_with_optional_parts() {
        let full = parse_date_time("2024-05-01T09:30:15Z").expect("full form should parse");
        assert_eq!(format_date_time(full), "2024-05-01T09:30:15");

        let spaced = parse_date_time("2024-05-01 09:30").expect("spaced form should parse");
        assert_eq!(format_date_time(spaced), "2024-05-01T09:30:00");

        let bare = parse_date_time("2024-05-01").expect("bare date should parse");
        assert_eq!(format_date_time(bare), "2024-05-01T00:00:00");
    }

    #[test]
    fn rejects_invalid_clock_values() {
        let err = parse_date_time("2024-05-01T25:00").expect_err("hour 25 must fail");
        assert!(err.to_string().contains("not a valid time of day"));
        assert!(parse_date_time("yesterday").is_err());
        assert!(parse_date_time("2024-05-01T09").is_err());
        assert!(parse_date_time("2024-05-01T09:30:15:00").is_err());
    }
}
