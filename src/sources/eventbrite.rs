//! Eventbrite search scraper.
//!
//! Eventbrite search pages live at `/d/<place>/<keyword>/` and embed their
//! results as schema.org JSON-LD: an `ItemList` whose `itemListElement`
//! entries each carry an `Event` under `item`. Scraping the JSON-LD is far
//! more stable than the React markup around it.
//!
//! # URL Pattern
//!
//! `https://www.eventbrite.com/d/ny--new-york/startup/?page=2`

use super::{EventSource, canonical_link};
use crate::models::{RawEvent, Source};
use crate::utils::slugify;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const BASE_URL: &str = Source::Eventbrite.homepage();

#[derive(Debug, Clone)]
pub struct Eventbrite {
    place: String,
    pages: usize,
}

impl Eventbrite {
    /// `place` is Eventbrite's location slug, e.g. `ny--new-york`.
    pub fn new(place: &str, pages: usize) -> Self {
        Self {
            place: place.to_string(),
            pages: pages.max(1),
        }
    }
}

impl EventSource for Eventbrite {
    fn source(&self) -> Source {
        Source::Eventbrite
    }

    fn search_urls(&self, keyword: &str) -> Vec<Url> {
        let keyword = urlencoding::encode(&slugify(keyword)).into_owned();
        let place = urlencoding::encode(&self.place).into_owned();
        (1..=self.pages)
            .filter_map(|page| {
                let mut url = Url::parse(&format!("{BASE_URL}/d/{place}/{keyword}/")).ok()?;
                if page > 1 {
                    url.query_pairs_mut().append_pair("page", &page.to_string());
                }
                Some(url)
            })
            .collect()
    }

    fn parse(&self, payload: &str, _keyword: &str) -> Vec<RawEvent> {
        let document = Html::parse_document(payload);
        let selector =
            Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector");

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for script in document.select(&selector) {
            let text = script.text().collect::<String>();
            let Ok(data) = serde_json::from_str::<Value>(&text) else {
                debug!("Skipping unparseable JSON-LD block");
                continue;
            };

            // A page may emit one object or an array of them.
            let blocks = match data {
                Value::Array(items) => items,
                other => vec![other],
            };
            for block in blocks.iter().filter(|b| is_item_list(b)) {
                let Some(items) = block.get("itemListElement").and_then(Value::as_array) else {
                    continue;
                };
                for entry in items {
                    if let Some(event) = parse_item(entry.get("item").unwrap_or(entry))
                        && event.url.as_ref().is_some_and(|u| seen.insert(u.clone()))
                    {
                        events.push(event);
                    }
                }
            }
        }
        events
    }
}

fn is_item_list(block: &Value) -> bool {
    block.get("@type").and_then(Value::as_str) == Some("ItemList")
}

fn parse_item(item: &Value) -> Option<RawEvent> {
    let url = item.get("url").and_then(Value::as_str)?;
    let title = item.get("name").and_then(Value::as_str)?;
    if title.trim().is_empty() {
        return None;
    }

    let location = match item.get("location") {
        Some(loc @ Value::Object(_)) => loc
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| loc.pointer("/address/addressLocality").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    };

    Some(RawEvent {
        title: title.to_string(),
        url: canonical_link(BASE_URL, url),
        date_text: item
            .get("startDate")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        location,
    })
}
