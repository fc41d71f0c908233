//! Event listing sources.
//!
//! Each source knows two things: which URLs to request for a keyword, and how
//! to pull [`RawEvent`]s out of the payload that comes back. Fetching itself is
//! shared (see [`crate::fetch`]), so adding a site means adding one
//! [`EventSource`] implementation and one arm in [`build_sources`].
//!
//! # Supported Sources
//!
//! | Source | Module | Payload | Notes |
//! |--------|--------|---------|-------|
//! | Luma | [`luma`] | `__NEXT_DATA__` JSON | Discover page filtered by city and query |
//! | Eventbrite | [`eventbrite`] | JSON-LD `ItemList` | Paginated keyword search |
//! | Meetup | [`meetup`] | HTML event cards | Date text is embedded in the card text |
//! | GarysGuide | [`garysguide`] | HTML table | One listing per region, filtered by keyword locally |

pub mod eventbrite;
pub mod garysguide;
pub mod luma;
pub mod meetup;

use crate::config::Settings;
use crate::models::{RawEvent, Source};
use scraper::ElementRef;
use url::Url;

/// One listing site: where to search and how to read the results.
pub trait EventSource {
    fn source(&self) -> Source;

    /// URLs to request for `keyword`, one per results page.
    fn search_urls(&self, keyword: &str) -> Vec<Url>;

    /// Extract raw listings from a fetched payload.
    ///
    /// Malformed entries are skipped; a page with nothing recognisable yields
    /// an empty list.
    fn parse(&self, payload: &str, keyword: &str) -> Vec<RawEvent>;
}

/// Instantiate the enabled sources in configured order.
pub fn build_sources(settings: &Settings) -> Vec<Box<dyn EventSource>> {
    settings
        .sources
        .iter()
        .map(|source| -> Box<dyn EventSource> {
            match source {
                Source::Luma => Box::new(luma::Luma::new(&settings.places.luma_city)),
                Source::Eventbrite => Box::new(eventbrite::Eventbrite::new(
                    &settings.places.eventbrite_place,
                    settings.pages,
                )),
                Source::Meetup => Box::new(meetup::Meetup::new(&settings.places.meetup_location)),
                Source::GarysGuide => {
                    Box::new(garysguide::GarysGuide::new(&settings.places.garysguide_region))
                }
            }
        })
        .collect()
}

/// Resolve `href` against `base` and drop query string and fragment.
///
/// Listing sites decorate event links with tracking parameters that differ
/// between search pages; the bare path is what identifies the event.
pub(crate) fn canonical_link(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let mut url = base.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Text content of an element with whitespace collapsed.
pub(crate) fn inner_text(element: ElementRef<'_>) -> String {
    crate::utils::clean_text(&element.text().collect::<Vec<_>>().join(" "))
}
