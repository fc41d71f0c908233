//! Data models for scraped and normalized events.
//!
//! - [`RawEvent`]: fields as a source parser found them, before any cleanup
//! - [`Event`]: a normalized listing with a resolved start, ready for dedup
//! - [`StartsAt`]: a local calendar date with an optional time of day
//! - [`Source`]: which listing site an event came from

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

/// Listing site an event was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Luma,
    Eventbrite,
    Meetup,
    GarysGuide,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Luma,
        Source::Eventbrite,
        Source::Meetup,
        Source::GarysGuide,
    ];

    /// Site root that relative event links resolve against.
    pub const fn homepage(&self) -> &'static str {
        match self {
            Source::Luma => "https://luma.com",
            Source::Eventbrite => "https://www.eventbrite.com",
            Source::Meetup => "https://www.meetup.com",
            Source::GarysGuide => "https://www.garysguide.com",
        }
    }

    /// Lowercase identifier used in config files and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Source::Luma => "luma",
            Source::Eventbrite => "eventbrite",
            Source::Meetup => "meetup",
            Source::GarysGuide => "garysguide",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Luma => write!(f, "Luma"),
            Source::Eventbrite => write!(f, "Eventbrite"),
            Source::Meetup => write!(f, "Meetup"),
            Source::GarysGuide => write!(f, "GarysGuide"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown source '{0}' (expected one of: luma, eventbrite, meetup, garysguide)")]
pub struct SourceParseError(String);

impl FromStr for Source {
    type Err = SourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "luma" | "lu.ma" => Ok(Source::Luma),
            "eventbrite" => Ok(Source::Eventbrite),
            "meetup" => Ok(Source::Meetup),
            "garysguide" | "garys_guide" | "garys-guide" => Ok(Source::GarysGuide),
            _ => Err(SourceParseError(s.to_string())),
        }
    }
}

/// One listing as extracted by a source parser.
///
/// Every field is the text the page carried; nothing has been validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    pub title: String,
    pub url: Option<String>,
    pub date_text: String,
    pub location: Option<String>,
}

/// Start of an event in the target city's local time.
///
/// `time` is `None` for date-only listings, which are treated as all-day.
/// Ordering is by date, then time, with all-day sorting as midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StartsAt {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl StartsAt {
    pub fn all_day(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.time.is_none()
    }

    /// Local date-time, using midnight for all-day events.
    pub fn naive(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }
}

impl fmt::Display for StartsAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(t) => write!(f, "{} {}", self.date.format("%a %b %-d"), t.format("%-I:%M %p")),
            None => write!(f, "{} (all day)", self.date.format("%a %b %-d")),
        }
    }
}

/// A normalized event listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub source: Source,
    /// Absolute link to the event page. `None` when the listing had none.
    pub url: Option<String>,
    pub starts_at: StartsAt,
    pub location: String,
    /// Search keyword whose results contained this event.
    pub keyword_matched: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_str() {
        assert_eq!("luma".parse::<Source>(), Ok(Source::Luma));
        assert_eq!(" Eventbrite ".parse::<Source>(), Ok(Source::Eventbrite));
        assert_eq!("MEETUP".parse::<Source>(), Ok(Source::Meetup));
        assert_eq!("garys-guide".parse::<Source>(), Ok(Source::GarysGuide));
        assert!("facebook".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_slug_round_trips() {
        for source in Source::ALL {
            assert_eq!(source.slug().parse::<Source>(), Ok(source));
        }
    }

    #[test]
    fn test_all_day_sorts_before_timed_same_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let all_day = StartsAt::all_day(date);
        let evening = StartsAt::at(date, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        let next_day = StartsAt::all_day(date.succ_opt().unwrap());
        assert!(all_day < evening);
        assert!(evening < next_day);
    }

    #[test]
    fn test_starts_at_display() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let timed = StartsAt::at(date, NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(timed.to_string(), "Wed Oct 21 6:30 PM");
        assert_eq!(StartsAt::all_day(date).to_string(), "Wed Oct 21 (all day)");
    }
}
