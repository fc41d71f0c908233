//! Scoring and selection of the events that make it into the digest.
//!
//! A digest with sixty entries does not get read, so after dedup the events
//! are scored and only the best `max_events` are kept. Selection order is
//! score descending, then earliest start; the renderer re-sorts the survivors
//! chronologically.

use crate::models::{Event, Source};
use crate::utils::contains_keyword;
use itertools::Itertools;
use tracing::debug;

/// Curated calendars rank above general ticketing sites.
fn source_weight(source: Source) -> i32 {
    match source {
        Source::Luma | Source::GarysGuide => 3,
        Source::Meetup | Source::Eventbrite => 2,
    }
}

/// Relevance score of one event against the configured keywords.
pub fn score_event(event: &Event, keywords: &[String]) -> i32 {
    let keyword_hits = keywords
        .iter()
        .filter(|k| contains_keyword(&event.title, k) || contains_keyword(&event.location, k))
        .count() as i32;

    let mut score = source_weight(event.source) + 2 * keyword_hits;
    if event.title.chars().count() < 10 {
        score -= 1;
    }
    if !event.starts_at.is_all_day() {
        score += 1;
    }
    score
}

/// Keep the `max_events` best-scoring events; `0` keeps everything.
pub fn select_top(events: Vec<Event>, keywords: &[String], max_events: usize) -> Vec<Event> {
    if max_events == 0 || events.len() <= max_events {
        return events;
    }

    let total = events.len();
    let selected: Vec<Event> = events
        .into_iter()
        .map(|e| (score_event(&e, keywords), e))
        .sorted_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.starts_at.cmp(&b.starts_at)))
        .take(max_events)
        .map(|(_, e)| e)
        .collect();

    debug!(total, kept = selected.len(), "Selected top events");
    selected
}
