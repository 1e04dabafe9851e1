//! Conversions between text and the engine's temporal encodings.
//!
//! The engine counts everything from 2000-01-01: dates in days, months in
//! months, timestamps in nanoseconds and datetimes in fractional days. Times of
//! day are counted from midnight.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const NANOS_PER_MILLI: i64 = 1_000_000;
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const MILLIS_PER_DAY: i64 = 86_400_000;
pub const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-.](\d{2})[-.](\d{2})$").expect("date regex"));
static MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-.](\d{2})m?$").expect("month regex"));
static CLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?(\d{2,}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?$").expect("clock regex")
});
static STAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-.](\d{2})[-.](\d{2})[DT ](\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?$")
        .expect("timestamp regex")
});
static SPAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?(?:(\d+)D)?(\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?$").expect("timespan regex")
});

pub fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn epoch() -> NaiveDateTime {
    epoch_date()
        .and_hms_opt(0, 0, 0)
        .unwrap_or(NaiveDateTime::MIN)
}

fn num(caps: &Captures<'_>, i: usize) -> Option<u32> {
    caps.get(i)?.as_str().parse().ok()
}

/// Right-pads a fractional digit run to nanoseconds.
fn fraction_nanos(caps: &Captures<'_>, i: usize) -> i64 {
    caps.get(i).map_or(0, |m| {
        let digits = m.as_str();
        let padded = format!("{digits:0<9}");
        padded.parse().unwrap_or(0)
    })
}

fn date_from_caps(caps: &Captures<'_>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(num(caps, 1)? as i32, num(caps, 2)?, num(caps, 3)?)
}

fn time_of_day(h: u32, m: u32, s: u32) -> Option<i64> {
    (h < 24 && m < 60 && s < 60).then_some(i64::from(h * 3600 + m * 60 + s))
}

// --- Parsing ---

/// `2024-01-15` or `2024.01.15` to days since 2000-01-01.
pub fn parse_date(s: &str) -> Option<i32> {
    let caps = DATE_RE.captures(s.trim())?;
    let date = date_from_caps(&caps)?;
    i32::try_from((date - epoch_date()).num_days()).ok()
}

/// `2024.01m`, `2024.01` or `2024-01` to months since 2000-01.
pub fn parse_month(s: &str) -> Option<i32> {
    let caps = MONTH_RE.captures(s.trim())?;
    let year = num(&caps, 1)? as i32;
    let month = num(&caps, 2)? as i32;
    (1..=12)
        .contains(&month)
        .then_some((year - 2000) * 12 + month - 1)
}

/// A parsed `[-]HH:MM(:SS(.f))`. Hours are not capped: the engine's time
/// types hold signed offsets that may pass a day.
struct ClockParts {
    negative: bool,
    seconds: i64,
    has_seconds: bool,
    nanos: i64,
}

impl ClockParts {
    fn signed(&self, magnitude: i64) -> Option<i32> {
        i32::try_from(if self.negative { -magnitude } else { magnitude }).ok()
    }
}

fn parse_clock(s: &str) -> Option<ClockParts> {
    let caps = CLOCK_RE.captures(s.trim())?;
    let hours: i64 = caps.get(2)?.as_str().parse().ok()?;
    let (m, sec) = (num(&caps, 3)?, num(&caps, 4).unwrap_or(0));
    if m >= 60 || sec >= 60 {
        return None;
    }
    Some(ClockParts {
        negative: caps.get(1).is_some(),
        seconds: hours.checked_mul(3600)? + i64::from(m * 60 + sec),
        has_seconds: caps.get(4).is_some(),
        nanos: fraction_nanos(&caps, 5),
    })
}

/// `[-]HH:MM:SS(.fff)` to milliseconds from midnight.
pub fn parse_time(s: &str) -> Option<i32> {
    let clock = parse_clock(s)?;
    if !clock.has_seconds {
        return None;
    }
    clock.signed(clock.seconds.checked_mul(1000)? + clock.nanos / NANOS_PER_MILLI)
}

/// `[-]HH:MM` to minutes from midnight.
pub fn parse_minute(s: &str) -> Option<i32> {
    let clock = parse_clock(s)?;
    if clock.has_seconds {
        return None;
    }
    clock.signed(clock.seconds / 60)
}

/// `[-]HH:MM:SS` to seconds from midnight.
pub fn parse_second(s: &str) -> Option<i32> {
    let clock = parse_clock(s)?;
    if !clock.has_seconds || clock.nanos != 0 {
        return None;
    }
    clock.signed(clock.seconds)
}

fn parse_stamp(s: &str) -> Option<NaiveDateTime> {
    let caps = STAMP_RE.captures(s.trim())?;
    let date = date_from_caps(&caps)?;
    let nanos = u32::try_from(fraction_nanos(&caps, 7)).ok()?;
    let time = NaiveTime::from_hms_nano_opt(num(&caps, 4)?, num(&caps, 5)?, num(&caps, 6)?, nanos)?;
    Some(NaiveDateTime::new(date, time))
}

/// `2024.01.15D10:30:00.000000000` (or ISO with `T`/space) to nanoseconds
/// since the epoch.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    (parse_stamp(s)? - epoch()).num_nanoseconds()
}

/// `2024-01-15 10:30:00(.fff)` to fractional days since the epoch, kept at
/// millisecond precision.
pub fn parse_datetime(s: &str) -> Option<f64> {
    let millis = (parse_stamp(s)? - epoch()).num_milliseconds();
    Some(millis as f64 / MILLIS_PER_DAY as f64)
}

/// `[-][dD]HH:MM:SS(.nnnnnnnnn)` to nanoseconds.
pub fn parse_timespan(s: &str) -> Option<i64> {
    let caps = SPAN_RE.captures(s.trim())?;
    let negative = caps.get(1).is_some();
    let days = caps.get(2).map_or(Some(0), |m| m.as_str().parse::<i64>().ok())?;
    let seconds = time_of_day(num(&caps, 3)?, num(&caps, 4)?, num(&caps, 5)?)?;
    let total = days
        .checked_mul(NANOS_PER_DAY)?
        .checked_add(seconds * NANOS_PER_SECOND)?
        .checked_add(fraction_nanos(&caps, 6))?;
    Some(if negative { -total } else { total })
}

// --- Engine notation ---

pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    epoch_date().checked_add_signed(Duration::days(i64::from(days)))
}

pub fn datetime_from_nanos(nanos: i64) -> Option<NaiveDateTime> {
    epoch().checked_add_signed(Duration::nanoseconds(nanos))
}

pub fn datetime_from_days(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * MILLIS_PER_DAY as f64).round();
    if millis.abs() > 1e17 {
        return None;
    }
    epoch().checked_add_signed(Duration::milliseconds(millis as i64))
}

pub fn format_date(days: i32) -> Option<String> {
    Some(date_from_days(days)?.format("%Y.%m.%d").to_string())
}

pub fn format_month(months: i32) -> String {
    let year = 2000 + months.div_euclid(12);
    let month = months.rem_euclid(12) + 1;
    format!("{year:04}.{month:02}")
}

fn clock(total_seconds: i64) -> (i64, i64, i64) {
    (total_seconds / 3600, total_seconds % 3600 / 60, total_seconds % 60)
}

pub fn format_time(millis: i32) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let millis = i64::from(millis).abs();
    let (h, m, s) = clock(millis / 1000);
    format!("{sign}{h:02}:{m:02}:{s:02}.{:03}", millis % 1000)
}

pub fn format_minute(minutes: i32) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.unsigned_abs();
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn format_second(seconds: i32) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let (h, m, s) = clock(i64::from(seconds).abs());
    format!("{sign}{h:02}:{m:02}:{s:02}")
}

pub fn format_timestamp(nanos: i64) -> Option<String> {
    Some(datetime_from_nanos(nanos)?.format("%Y.%m.%dD%H:%M:%S%.9f").to_string())
}

pub fn format_datetime(days: f64) -> Option<String> {
    Some(datetime_from_days(days)?.format("%Y.%m.%dT%H:%M:%S%.3f").to_string())
}

pub fn format_timespan(nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let abs = nanos.unsigned_abs();
    let days = abs / NANOS_PER_DAY as u64;
    let rest = abs % NANOS_PER_DAY as u64;
    let (h, m, s) = clock((rest / NANOS_PER_SECOND as u64) as i64);
    format!(
        "{sign}{days}D{h:02}:{m:02}:{s:02}.{:09}",
        rest % NANOS_PER_SECOND as u64
    )
}

// --- Display notation ---

pub fn display_date(days: i32) -> Option<String> {
    Some(date_from_days(days)?.format("%Y-%m-%d").to_string())
}

pub fn display_datetime(days: f64) -> Option<String> {
    Some(datetime_from_days(days)?.format("%Y-%m-%d %H:%M:%S").to_string())
}

pub fn display_time(millis: i32) -> String {
    let (h, m, s) = clock(i64::from(millis).abs() / 1000);
    format!("{h:02}:{m:02}:{s:02}")
}

/// Splits a day count into calendar parts, for callers that want chrono types.
pub fn ymd(days: i32) -> Option<(i32, u32, u32)> {
    let date = date_from_days(days)?;
    Some((date.year(), date.month(), date.day()))
}

/// Nanoseconds within the day of a timestamp.
pub fn nanos_of_day(nanos: i64) -> Option<u64> {
    let dt = datetime_from_nanos(nanos)?;
    let time = dt.time();
    Some(u64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND as u64 + u64::from(time.nanosecond()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_parse_and_format() {
        assert_eq!(parse_date("2000-01-01"), Some(0));
        assert_eq!(parse_date("2000.01.02"), Some(1));
        assert_eq!(parse_date("1999-12-31"), Some(-1));
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("2024/01/01"), None);

        let days = parse_date("2024-01-15").unwrap();
        assert_eq!(format_date(days).unwrap(), "2024.01.15");
        assert_eq!(display_date(days).unwrap(), "2024-01-15");
        assert_eq!(ymd(days), Some((2024, 1, 15)));
    }

    #[test]
    fn test_month() {
        assert_eq!(parse_month("2000.01m"), Some(0));
        assert_eq!(parse_month("2024.03"), Some(24 * 12 + 2));
        assert_eq!(parse_month("1999.12m"), Some(-1));
        assert_eq!(parse_month("2024.13m"), None);
        assert_eq!(format_month(-1), "1999.12");
        assert_eq!(format_month(24 * 12 + 2), "2024.03");
    }

    #[test]
    fn test_clock_types() {
        assert_eq!(parse_time("09:30:00.000"), Some(34_200_000));
        assert_eq!(parse_time("09:30:00"), Some(34_200_000));
        assert_eq!(parse_time("09:30:00.5"), Some(34_200_500));
        assert_eq!(parse_time("25:00:00"), Some(90_000_000));
        assert_eq!(parse_time("-00:00:01.000"), Some(-1000));
        assert_eq!(parse_time("09:60:00"), None);
        assert_eq!(parse_time("9:30:00"), None);
        assert_eq!(format_time(34_200_500), "09:30:00.500");
        assert_eq!(display_time(34_200_500), "09:30:00");

        assert_eq!(parse_minute("10:30"), Some(630));
        assert_eq!(parse_minute("10:30:00"), None);
        assert_eq!(format_minute(630), "10:30");
        assert_eq!(parse_minute("25:00"), Some(1500));
        assert_eq!(parse_minute("-01:30"), Some(-90));

        assert_eq!(parse_second("10:30:15"), Some(37_815));
        assert_eq!(parse_second("10:30"), None);
        assert_eq!(format_second(37_815), "10:30:15");
        assert_eq!(parse_second("-00:00:05"), Some(-5));
        assert_eq!(parse_second("100:00:00"), Some(360_000));
    }

    #[test]
    fn test_timestamp() {
        let ns = parse_timestamp("2000.01.01D00:00:01.000000001").unwrap();
        assert_eq!(ns, NANOS_PER_SECOND + 1);
        assert_eq!(format_timestamp(ns).unwrap(), "2000.01.01D00:00:01.000000001");
        assert_eq!(parse_timestamp("2000-01-02T00:00:00"), Some(NANOS_PER_DAY));
        assert_eq!(nanos_of_day(NANOS_PER_DAY + 5), Some(5));
    }

    #[test]
    fn test_datetime() {
        let days = parse_datetime("2000-01-02 12:00:00").unwrap();
        assert_eq!(days, 1.5);
        assert_eq!(format_datetime(days).unwrap(), "2000.01.02T12:00:00.000");
        assert_eq!(display_datetime(days).unwrap(), "2000-01-02 12:00:00");
        assert_eq!(datetime_from_days(f64::NAN), None);
    }

    #[test]
    fn test_timespan() {
        let ns = parse_timespan("1D02:03:04.000000005").unwrap();
        assert_eq!(
            ns,
            NANOS_PER_DAY + (2 * 3600 + 3 * 60 + 4) * NANOS_PER_SECOND + 5
        );
        assert_eq!(format_timespan(ns), "1D02:03:04.000000005");
        assert_eq!(format_timespan(-NANOS_PER_SECOND), "-0D00:00:01.000000000");
        assert_eq!(parse_timespan("-0D00:00:01.000000000"), Some(-NANOS_PER_SECOND));
        assert_eq!(parse_timespan("00:00:01"), Some(NANOS_PER_SECOND));
        assert_eq!(parse_timespan("0D24:00:00.000000000"), None);
    }
}
