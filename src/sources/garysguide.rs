//! GarysGuide scraper.
//!
//! GarysGuide publishes one listing per region with no search, laid out as a
//! table: the event link sits in a row whose other cells hold `Oct 21` and
//! `6:00pm`. The same page is requested for every keyword (the pipeline's
//! per-run cache makes that a single download) and rows are kept only when
//! their title mentions the keyword.

use super::{EventSource, canonical_link, inner_text};
use crate::models::{RawEvent, Source};
use crate::utils::contains_keyword;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const BASE_URL: &str = Source::GarysGuide.homepage();

static ROW_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}\b")
        .expect("valid row date regex")
});

static ROW_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{1,2}:\d{2}\s*(?:am|pm)\b").expect("valid row time regex"));

#[derive(Debug, Clone)]
pub struct GarysGuide {
    region: String,
}

impl GarysGuide {
    /// `region` is GarysGuide's region code, e.g. `nyc`.
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
        }
    }
}

impl EventSource for GarysGuide {
    fn source(&self) -> Source {
        Source::GarysGuide
    }

    fn search_urls(&self, _keyword: &str) -> Vec<Url> {
        Url::parse_with_params(
            &format!("{BASE_URL}/events"),
            &[("region", self.region.as_str())],
        )
        .into_iter()
        .collect()
    }

    fn parse(&self, payload: &str, keyword: &str) -> Vec<RawEvent> {
        let document = Html::parse_document(payload);
        let selector = Selector::parse("a[href]").expect("valid selector");

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for link in document.select(&selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if !href.contains("/events/") || href.contains("region=") {
                continue;
            }

            let title = inner_text(link);
            if title.chars().count() < 5 || title.contains("Newsletter") {
                continue;
            }
            if !contains_keyword(&title, keyword) {
                continue;
            }
            let Some(url) = canonical_link(BASE_URL, href) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }

            let date_text = enclosing_row(link)
                .map(|row| row_date_text(&inner_text(row)))
                .unwrap_or_default();

            events.push(RawEvent {
                title,
                url: Some(url),
                date_text,
                location: None,
            });
        }
        events
    }
}

fn enclosing_row(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
}

/// `"Oct 21 6:00pm"` from a row's text, or whichever half is present.
fn row_date_text(row: &str) -> String {
    let date = ROW_DATE_RE.find(row).map(|m| m.as_str());
    let time = ROW_TIME_RE.find(row).map(|m| m.as_str());
    match (date, time) {
        (Some(d), Some(t)) => format!("{d} {t}"),
        (Some(d), None) => d.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><table>
        <tr><td><b>Oct 21</b></td><td>6:00pm</td>
            <td><a href="/events/abc123/AI-Product-Night">AI Product Night</a><br>Flatiron</td></tr>
        <tr><td>Oct 22</td><td>
            <a href="/events/def456/Fintech-Founders">Fintech Founders Drinks</a></td></tr>
        <tr><td>TBA</td><td>
            <a href="https://www.garysguide.com/events/ghi789/AI-Hackathon">AI Hackathon</a></td></tr>
        <tr><td><a href="/events?region=sf">SF events</a></td></tr>
        <tr><td><a href="/events/newsletter">GG Newsletter Signup</a></td></tr>
        <tr><td><a href="/events/abc123/AI-Product-Night">AI Product Night</a></td></tr>
        <tr><td>Oct 23</td><td><a href="/events/jkl012/Tech-Job-Fair">Tech Job Fair</a></td></tr>
        <tr><td>Oct 24</td><td><a href="/events/mno345/Email-Growth">Email Growth Clinic</a></td></tr>
    </table></body></html>"#;

    #[test]
    fn test_search_url_ignores_keyword() {
        let source = GarysGuide::new("nyc");
        assert_eq!(source.search_urls("ai"), source.search_urls("startup"));
        assert_eq!(
            source.search_urls("ai")[0].as_str(),
            "https://www.garysguide.com/events?region=nyc"
        );
    }

    #[test]
    fn test_parse_filters_by_keyword() {
        let events = GarysGuide::new("nyc").parse(PAGE, "AI");
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].title, "AI Product Night");
        assert_eq!(
            events[0].url.as_deref(),
            Some("https://www.garysguide.com/events/abc123/AI-Product-Night")
        );
        assert_eq!(events[0].date_text, "Oct 21 6:00pm");

        assert_eq!(events[1].title, "AI Hackathon");
        assert_eq!(events[1].date_text, "");
    }

    #[test]
    fn test_parse_date_only_row() {
        let events = GarysGuide::new("nyc").parse(PAGE, "fintech");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date_text, "Oct 22");
    }

    #[test]
    fn test_row_date_text() {
        assert_eq!(row_date_text("Nov 3 7:30 PM Demo Day"), "Nov 3 7:30 PM");
        assert_eq!(row_date_text("6:00pm only"), "");
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        let titles: Vec<_> = GarysGuide::new("nyc")
            .parse(PAGE, "ai")
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["AI Product Night", "AI Hackathon"]);

        let fair = GarysGuide::new("nyc").parse(PAGE, "job fair");
        assert_eq!(fair.len(), 1);
        assert_eq!(fair[0].date_text, "Oct 23");
    }
}
