//! Approximate date parsing for free-text listing dates.
//!
//! Listing sites describe start times in wildly different ways: ISO
//! timestamps in JSON payloads, `Tue, Oct 21 · 6:30 PM EDT` in Meetup cards,
//! bare `Oct 21` cells on GarysGuide. [`parse_approximate_date`] is the single
//! entry point; it tries each accepted format in turn and resolves the result
//! against a caller-supplied `now`, so the heuristics can be tested without a
//! clock.
//!
//! # Accepted formats
//!
//! | Format | Example | Result |
//! |--------|---------|--------|
//! | RFC 3339 with offset | `2026-10-21T22:00:00.000Z` | converted into the target zone |
//! | ISO local date-time | `2026-10-21T18:00:00` | taken as local |
//! | ISO date | `2026-10-21` | all day |
//! | Relative word | `tomorrow 7pm`, `tonight` | today / tomorrow |
//! | Month and day | `Oct 21`, `October 21st, 2026 6pm` | next future occurrence when no year |
//! | Day and month | `21 Oct` | as above |
//! | US numeric | `10/21`, `10/21/2026` | as above |
//! | Weekday | `Tuesday 6pm`, `next Tue` | next occurrence on or after today |
//!
//! Zone abbreviations such as `EDT` are ignored: every parsed wall-clock time
//! is interpreted in the configured zone.

use crate::models::StartsAt;
use crate::utils::clean_text;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_12H_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s?m\b\.?").expect("valid 12h time regex")
});

static TIME_24H_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid 24h time regex"));

static NAMED_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(noon|midnight)\b").expect("valid named time regex"));

static ZONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[ECMP][SD]?T|AK[SD]T|HST|UTC|GMT)\b").expect("valid zone regex")
});

static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(today|tonight|tomorrow)\b").expect("valid relative regex"));

/// Accepted month spellings, longest first.
const MONTH_NAMES: &str = "january|february|march|april|may|june|july|august|september|sept\
    |october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";

/// Accepted weekday spellings, longest first.
const WEEKDAY_NAMES: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday\
    |tues|thurs|thur|mon|tue|wed|thu|fri|sat|sun";

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_NAMES})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid month-day regex")
});

static DAY_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTH_NAMES})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid day-month regex")
});

static NUMERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").expect("valid numeric date regex")
});

static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(next\s+|this\s+)?({WEEKDAY_NAMES})\b"))
        .expect("valid weekday regex")
});

/// Parse a free-text listing date relative to `now`.
///
/// Returns `None` when no accepted format matches (e.g. `"TBD"`); the caller
/// skips the record rather than failing the run.
pub fn parse_approximate_date(text: &str, now: &DateTime<Tz>) -> Option<StartsAt> {
    let cleaned = clean_text(&text.replace(['·', '|', '•'], " "));
    if cleaned.is_empty() {
        return None;
    }

    if let Some(starts_at) = parse_iso(&cleaned, &now.timezone()) {
        return Some(starts_at);
    }

    let stripped = ZONE_RE.replace_all(&cleaned, " ");
    let today = now.date_naive();
    let date = parse_relative(&stripped, today)
        .or_else(|| parse_month_day(&stripped, today))
        .or_else(|| parse_day_month(&stripped, today))
        .or_else(|| parse_numeric(&stripped, today))
        .or_else(|| parse_weekday(&stripped, today))?;

    Some(StartsAt {
        date,
        time: parse_time_of_day(&stripped),
    })
}

fn parse_iso(text: &str, tz: &Tz) -> Option<StartsAt> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        let local = dt.with_timezone(tz);
        return Some(StartsAt::at(local.date_naive(), local.time()));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            let local = dt.with_timezone(tz);
            return Some(StartsAt::at(local.date_naive(), local.time()));
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(StartsAt::at(naive.date(), naive.time()));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(StartsAt::all_day)
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = TIME_12H_RE.captures(text) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("p");
        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
        return NaiveTime::from_hms_opt(hour24, minute, 0);
    }
    if let Some(caps) = NAMED_TIME_RE.captures(text) {
        return match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
            "noon" => NaiveTime::from_hms_opt(12, 0, 0),
            _ => NaiveTime::from_hms_opt(0, 0, 0),
        };
    }
    let caps = TIME_24H_RE.captures(text)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = RELATIVE_RE.captures(text)?;
    match caps.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "tomorrow" => today.succ_opt(),
        _ => Some(today),
    }
}

fn parse_month_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = MONTH_DAY_RE.captures(text)?;
    let month = month_number(caps.get(1)?.as_str())?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
    resolve_date(year, month, day, today)
}

fn parse_day_month(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = DAY_MONTH_RE.captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month = month_number(caps.get(2)?.as_str())?;
    let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
    resolve_date(year, month, day, today)
}

fn parse_numeric(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = NUMERIC_DATE_RE.captures(text)?;
    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year = caps.get(3).and_then(|y| {
        let raw = y.as_str();
        let value = raw.parse::<i32>().ok()?;
        Some(if raw.len() == 2 { 2000 + value } else { value })
    });
    resolve_date(year, month, day, today)
}

fn parse_weekday(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = WEEKDAY_RE.captures(text)?;
    let strictly_after = caps
        .get(1)
        .is_some_and(|m| m.as_str().trim().eq_ignore_ascii_case("next"));
    let target = match caps.get(2)?.as_str().get(..3)?.to_ascii_lowercase().as_str() {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        _ => Weekday::Sun,
    };
    let mut offset = (i64::from(target.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday()))
    .rem_euclid(7);
    if offset == 0 && strictly_after {
        offset = 7;
    }
    today.checked_add_signed(Duration::days(offset))
}

/// Build a date, inferring the year when absent.
///
/// Without a year the next occurrence on or after `today` is used, so a
/// December listing read in January lands in the current year and an
/// October 1 listing read on October 2 lands in the next one.
fn resolve_date(year: Option<i32>, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    // Monday, 09:00 local.
    fn now() -> DateTime<Tz> {
        New_York.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_rfc3339_utc_is_converted_to_local() {
        let parsed = parse_approximate_date("2026-10-21T22:00:00.000Z", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 21), hm(18, 0)));
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse_approximate_date("2026-10-21T18:30:00-04:00", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 21), hm(18, 30)));
    }

    #[test]
    fn test_iso_local_datetime() {
        let parsed = parse_approximate_date("2026-10-22T19:00:00", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 22), hm(19, 0)));
        let spaced = parse_approximate_date("2026-10-22 19:00", &now()).unwrap();
        assert_eq!(spaced, parsed);
    }

    #[test]
    fn test_iso_date_is_all_day() {
        let parsed = parse_approximate_date("2026-10-23", &now()).unwrap();
        assert_eq!(parsed, StartsAt::all_day(ymd(2026, 10, 23)));
    }

    #[test]
    fn test_meetup_card_format() {
        let parsed = parse_approximate_date("Tue, Oct 20 · 6:30 PM EDT", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 20), hm(18, 30)));
    }

    #[test]
    fn test_month_day_without_year_rolls_forward() {
        let upcoming = parse_approximate_date("Oct 25", &now()).unwrap();
        assert_eq!(upcoming, StartsAt::all_day(ymd(2026, 10, 25)));

        let past = parse_approximate_date("Oct 18", &now()).unwrap();
        assert_eq!(past, StartsAt::all_day(ymd(2027, 10, 18)));

        let january = parse_approximate_date("January 5", &now()).unwrap();
        assert_eq!(january.date, ymd(2027, 1, 5));
    }

    #[test]
    fn test_month_day_with_year_and_ordinal() {
        let parsed = parse_approximate_date("October 21st, 2026 7pm", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 21), hm(19, 0)));
    }

    #[test]
    fn test_day_month() {
        let parsed = parse_approximate_date("21 Oct 2026, 18:00", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 21), hm(18, 0)));
    }

    #[test]
    fn test_numeric_us_date() {
        let parsed = parse_approximate_date("10/24 10:00 am", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 24), hm(10, 0)));
        let with_year = parse_approximate_date("10/24/26", &now()).unwrap();
        assert_eq!(with_year, StartsAt::all_day(ymd(2026, 10, 24)));
    }

    #[test]
    fn test_weekday_with_time() {
        let parsed = parse_approximate_date("Tuesday 6pm", &now()).unwrap();
        assert_eq!(parsed, StartsAt::at(ymd(2026, 10, 20), hm(18, 0)));

        let next = parse_approximate_date("next Tuesday 6pm", &now()).unwrap();
        assert_eq!(next, parsed);
    }

    #[test]
    fn test_weekday_same_day() {
        let this = parse_approximate_date("Monday 7pm", &now()).unwrap();
        assert_eq!(this.date, ymd(2026, 10, 19));

        let next = parse_approximate_date("next Monday", &now()).unwrap();
        assert_eq!(next.date, ymd(2026, 10, 26));
    }

    #[test]
    fn test_relative_words() {
        assert_eq!(
            parse_approximate_date("Tonight", &now()).unwrap(),
            StartsAt::all_day(ymd(2026, 10, 19))
        );
        assert_eq!(
            parse_approximate_date("tomorrow at noon", &now()).unwrap(),
            StartsAt::at(ymd(2026, 10, 20), hm(12, 0))
        );
    }

    #[test]
    fn test_time_variants() {
        assert_eq!(parse_time_of_day("6pm"), Some(hm(18, 0)));
        assert_eq!(parse_time_of_day("6:30 P.M."), Some(hm(18, 30)));
        assert_eq!(parse_time_of_day("12 am"), Some(hm(0, 0)));
        assert_eq!(parse_time_of_day("12:15pm"), Some(hm(12, 15)));
        assert_eq!(parse_time_of_day("18:45"), Some(hm(18, 45)));
        assert_eq!(parse_time_of_day("midnight"), Some(hm(0, 0)));
        assert_eq!(parse_time_of_day("no time here"), None);
    }

    #[test]
    fn test_full_and_short_name_spellings() {
        let thursday = StartsAt::all_day(ymd(2026, 10, 22));
        assert_eq!(parse_approximate_date("Thursday", &now()), Some(thursday));
        assert_eq!(parse_approximate_date("Thurs.", &now()), Some(thursday));
        assert_eq!(parse_approximate_date("thu", &now()), Some(thursday));
        assert_eq!(
            parse_approximate_date("Sept 5", &now()),
            Some(StartsAt::all_day(ymd(2027, 9, 5)))
        );
        assert_eq!(
            parse_approximate_date("5 September 2027", &now()),
            Some(StartsAt::all_day(ymd(2027, 9, 5)))
        );
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(parse_approximate_date("TBD", &now()), None);
        assert_eq!(parse_approximate_date("", &now()), None);
        assert_eq!(parse_approximate_date("   ", &now()), None);
        assert_eq!(parse_approximate_date("6pm", &now()), None);
        assert_eq!(parse_approximate_date("Feb 30", &now()), None);
        // Words that merely start like a month or weekday.
        assert_eq!(parse_approximate_date("Monthly", &now()), None);
        assert_eq!(parse_approximate_date("Sunset cruise", &now()), None);
        assert_eq!(parse_approximate_date("Thursdays TBD", &now()), None);
        assert_eq!(parse_approximate_date("Marching band 5", &now()), None);
        assert_eq!(parse_approximate_date("12 Octaves", &now()), None);
    }
}
