//! Luma event discovery scraper.
//!
//! Luma renders its discover page with Next.js, so the listing is available
//! as JSON inside `<script id="__NEXT_DATA__">` and no HTML cards need to be
//! walked. Events live under `props.pageProps.initialData.data`, split into
//! `events` and `featured_events`.

use super::{EventSource, canonical_link};
use crate::models::{RawEvent, Source};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

const BASE_URL: &str = Source::Luma.homepage();

#[derive(Debug, Clone)]
pub struct Luma {
    city: String,
}

impl Luma {
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
        }
    }
}

impl EventSource for Luma {
    fn source(&self) -> Source {
        Source::Luma
    }

    fn search_urls(&self, keyword: &str) -> Vec<Url> {
        Url::parse_with_params(
            &format!("{BASE_URL}/discover"),
            &[("city", self.city.as_str()), ("q", keyword)],
        )
        .into_iter()
        .collect()
    }

    fn parse(&self, payload: &str, _keyword: &str) -> Vec<RawEvent> {
        let document = Html::parse_document(payload);
        let selector = Selector::parse("script#__NEXT_DATA__").expect("valid selector");
        let Some(script) = document.select(&selector).next() else {
            debug!("Luma page has no __NEXT_DATA__ block");
            return Vec::new();
        };

        let json = script.text().collect::<String>();
        let data: Value = match serde_json::from_str(&json) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Luma __NEXT_DATA__ is not valid JSON");
                return Vec::new();
            }
        };

        let Some(listing) = data.pointer("/props/pageProps/initialData/data") else {
            return Vec::new();
        };

        ["events", "featured_events"]
            .iter()
            .filter_map(|key| listing.get(*key).and_then(Value::as_array))
            .flatten()
            .filter_map(parse_entry)
            .collect()
    }
}

fn parse_entry(item: &Value) -> Option<RawEvent> {
    let event = item.get("event")?;
    let title = event.get("name").and_then(Value::as_str)?.to_string();
    let slug = event.get("url").and_then(Value::as_str)?;
    if title.trim().is_empty() || slug.trim().is_empty() {
        return None;
    }

    let date_text = item
        .get("start_at")
        .or_else(|| event.get("start_at"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let geo = event.get("geo_address_info");
    let location = geo
        .and_then(|g| g.get("full_address"))
        .or_else(|| geo.and_then(|g| g.get("city")))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(RawEvent {
        title,
        url: canonical_link(BASE_URL, &format!("/{}", slug.trim_start_matches('/'))),
        date_text,
        location,
    })
}
