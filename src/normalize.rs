//! Raw listing → [`Event`] normalization.
//!
//! A record is skipped (never an error) when its title is blank, its date
//! cannot be parsed, or the parsed start falls outside the search window.

use crate::dates::parse_approximate_date;
use crate::models::{Event, RawEvent, Source, StartsAt};
use crate::sources::canonical_link;
use crate::utils::clean_text;
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use tracing::debug;

/// The `[now, now + days_ahead]` interval events must start in.
///
/// Timed events are compared on local wall-clock time. All-day events are
/// compared on the calendar day, so today's all-day listing is kept even
/// after midnight has passed.
#[derive(Debug, Clone)]
pub struct SearchWindow {
    now: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl SearchWindow {
    pub fn new(now: DateTime<Tz>, days_ahead: u32) -> Self {
        let end = now + Duration::days(i64::from(days_ahead));
        Self { now, end }
    }

    pub fn now(&self) -> &DateTime<Tz> {
        &self.now
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn contains(&self, starts_at: &StartsAt) -> bool {
        match starts_at.time {
            Some(_) => {
                let start = starts_at.naive();
                start >= self.now.naive_local() && start <= self.end.naive_local()
            }
            None => {
                starts_at.date >= self.now.date_naive() && starts_at.date <= self.end.date_naive()
            }
        }
    }
}

/// Everything normalization depends on, passed in rather than read globally.
#[derive(Debug, Clone)]
pub struct Normalizer {
    window: SearchWindow,
    fallback_location: String,
}

impl Normalizer {
    pub fn new(window: SearchWindow, fallback_location: &str) -> Self {
        Self {
            window,
            fallback_location: fallback_location.to_string(),
        }
    }

    pub fn window(&self) -> &SearchWindow {
        &self.window
    }

    /// Turn one raw listing into an [`Event`], or `None` to skip it.
    pub fn normalize(&self, raw: RawEvent, source: Source, keyword: &str) -> Option<Event> {
        let title = clean_text(&raw.title);
        if title.is_empty() {
            debug!(%source, "Skipping listing without a title");
            return None;
        }

        let Some(starts_at) = parse_approximate_date(&raw.date_text, self.window.now()) else {
            debug!(%source, %title, date_text = %raw.date_text, "Skipping listing with unparseable date");
            return None;
        };

        if !self.window.contains(&starts_at) {
            debug!(%source, %title, %starts_at, "Skipping listing outside the search window");
            return None;
        }

        let url = raw
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .and_then(|u| canonical_link(source.homepage(), u));

        let location = raw
            .location
            .as_deref()
            .map(clean_text)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.fallback_location.clone());

        Some(Event {
            title,
            source,
            url,
            starts_at,
            location,
            keyword_matched: keyword.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::America::New_York;

    // Monday 2026-10-19, 09:00 local; window ends Monday 2026-10-26 09:00.
    fn normalizer() -> Normalizer {
        let now = New_York.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        Normalizer::new(SearchWindow::new(now, 7), "New York")
    }

    fn raw(title: &str, date_text: &str) -> RawEvent {
        RawEvent {
            title: title.to_string(),
            url: Some("https://www.meetup.com/rust-nyc/events/1/".to_string()),
            date_text: date_text.to_string(),
            location: None,
        }
    }

    #[test]
    fn test_normalize_basic() {
        let event = normalizer()
            .normalize(
                RawEvent {
                    location: Some("  85 Broad St,\n New York ".to_string()),
                    ..raw("  Rust   NYC  ", "Tue, Oct 20 · 6:30 PM EDT")
                },
                Source::Meetup,
                "tech",
            )
            .unwrap();

        assert_eq!(event.title, "Rust NYC");
        assert_eq!(event.source, Source::Meetup);
        assert_eq!(event.location, "85 Broad St, New York");
        assert_eq!(event.keyword_matched, "tech");
        assert_eq!(
            event.starts_at,
            StartsAt::at(
                NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                NaiveTime::from_hms_opt(18, 30, 0).unwrap()
            )
        );
    }

    #[test]
    fn test_fallback_location_and_relative_url() {
        let event = normalizer()
            .normalize(
                RawEvent {
                    url: Some("/events/abc/AI-Night".to_string()),
                    location: Some("   ".to_string()),
                    ..raw("AI Night", "Oct 21")
                },
                Source::GarysGuide,
                "ai",
            )
            .unwrap();
        assert_eq!(event.location, "New York");
        assert_eq!(
            event.url.as_deref(),
            Some("https://www.garysguide.com/events/abc/AI-Night")
        );
    }

    #[test]
    fn test_empty_url_becomes_none() {
        let event = normalizer()
            .normalize(
                RawEvent {
                    url: Some("  ".to_string()),
                    ..raw("AI Night", "Oct 21")
                },
                Source::Luma,
                "ai",
            )
            .unwrap();
        assert_eq!(event.url, None);
    }

    #[test]
    fn test_skips_blank_title() {
        assert!(normalizer().normalize(raw("   ", "Oct 21"), Source::Luma, "ai").is_none());
    }

    #[test]
    fn test_skips_unparseable_date() {
        assert!(normalizer().normalize(raw("Hack Night", "TBD"), Source::Luma, "ai").is_none());
        assert!(normalizer().normalize(raw("Hack Night", ""), Source::Luma, "ai").is_none());
    }

    #[test]
    fn test_window_bounds() {
        let n = normalizer();
        // Earlier today: already started.
        assert!(n.normalize(raw("Breakfast", "2026-10-19T08:00:00"), Source::Luma, "ai").is_none());
        // Later today.
        assert!(n.normalize(raw("Lunch", "2026-10-19T12:00:00"), Source::Luma, "ai").is_some());
        // Today all day.
        assert!(n.normalize(raw("Expo", "2026-10-19"), Source::Luma, "ai").is_some());
        // Last day of the window, before and after the cutoff time.
        assert!(n.normalize(raw("Coffee", "2026-10-26T08:00:00"), Source::Luma, "ai").is_some());
        assert!(n.normalize(raw("Dinner", "2026-10-26T19:00:00"), Source::Luma, "ai").is_none());
        assert!(n.normalize(raw("Expo 2", "2026-10-26"), Source::Luma, "ai").is_some());
        // Past the window entirely.
        assert!(n.normalize(raw("Conf", "2026-10-27"), Source::Luma, "ai").is_none());
        // Yesterday.
        assert!(n.normalize(raw("Old", "2026-10-18"), Source::Luma, "ai").is_none());
    }

    #[test]
    fn test_never_emits_outside_window() {
        let n = normalizer();
        let texts = [
            "2026-10-01", "2026-10-19T08:59:00", "2026-10-19T09:00:00", "Oct 18", "Oct 19",
            "Oct 25 11pm", "Oct 26", "Oct 27", "Tuesday", "next Monday 10am", "next Monday 8am",
            "tomorrow", "12/31", "2027-01-01",
        ];
        for text in texts {
            if let Some(event) = n.normalize(raw("Event", text), Source::Eventbrite, "ai") {
                assert!(n.window().contains(&event.starts_at), "{text} escaped the window");
                assert!(event.starts_at.date >= n.window().now().date_naive());
                assert!(event.starts_at.date <= n.window().end().date_naive());
            }
        }
    }
}
