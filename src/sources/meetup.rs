//! Meetup search scraper.
//!
//! Meetup's find page renders each result as a card wrapped in an anchor to
//! `meetup.com/<group>/events/<id>/`. The card text runs the date, title and
//! group together (`Tue, Oct 21 · 6:30 PM EDT Rust NYC Monthly Hack Night`),
//! so the date is cut out with a regex and the rest is the title.

use super::{EventSource, canonical_link, inner_text};
use crate::models::{RawEvent, Source};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const BASE_URL: &str = Source::Meetup.homepage();

/// Cards beyond this are usually "similar events" outside the search.
const MAX_LINKS_PER_PAGE: usize = 15;

static EVENT_HREF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://(?:www\.)?meetup\.com)?/[^/?#]+/events/[^/?#]+")
        .expect("valid meetup href regex")
});

static CARD_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b((?:mon|tue|wed|thu|fri|sat|sun)[a-z]*[,\s·]+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{1,2}\s*·?\s*\d{1,2}:\d{2}\s*[ap]m(?:\s+(?-i:[ECMP][SD]?T|UTC|GMT)\b)?)",
    )
    .expect("valid meetup date regex")
});

#[derive(Debug, Clone)]
pub struct Meetup {
    location: String,
}

impl Meetup {
    /// `location` is Meetup's location key, e.g. `us--ny--New York`.
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
        }
    }
}

impl EventSource for Meetup {
    fn source(&self) -> Source {
        Source::Meetup
    }

    fn search_urls(&self, keyword: &str) -> Vec<Url> {
        Url::parse_with_params(
            &format!("{BASE_URL}/find/"),
            &[
                ("location", self.location.as_str()),
                ("source", "EVENTS"),
                ("keywords", keyword),
            ],
        )
        .into_iter()
        .collect()
    }

    fn parse(&self, payload: &str, _keyword: &str) -> Vec<RawEvent> {
        let document = Html::parse_document(payload);
        let selector = Selector::parse("a[href]").expect("valid selector");

        let mut seen = HashSet::new();
        document
            .select(&selector)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                if !EVENT_HREF_RE.is_match(href) {
                    return None;
                }
                let text = inner_text(link);
                if text.is_empty() {
                    return None;
                }
                let url = canonical_link(BASE_URL, href)?;
                seen.insert(url.clone()).then(|| split_card(&text, url))
            })
            .flatten()
            .take(MAX_LINKS_PER_PAGE)
            .collect()
    }
}

/// Split card text into a listing, preferring the text before the date as title.
fn split_card(text: &str, url: String) -> Option<RawEvent> {
    let (title, date_text) = match CARD_DATE_RE.find(text) {
        Some(m) => {
            let before = trim_separators(&text[..m.start()]);
            let after = trim_separators(&text[m.end()..]);
            let title = if before.is_empty() { after } else { before };
            (title.to_string(), m.as_str().to_string())
        }
        None => (text.to_string(), String::new()),
    };
    if title.is_empty() {
        return None;
    }
    Some(RawEvent {
        title,
        url: Some(url),
        date_text,
        location: None,
    })
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '·' || c == ',')
}
