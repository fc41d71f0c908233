//! Cross-source duplicate removal.
//!
//! Two events are the same listing when they share a non-empty URL, or when
//! their folded titles match and they start on the same calendar day. The
//! second rule catches the same meetup cross-posted to Luma and Meetup under
//! different links. The first occurrence wins; which source's details survive
//! therefore depends on fetch order. Candidates are compared with kept events
//! only, so a listing that resembles a dropped copy but no survivor is kept.

use crate::models::Event;
use crate::utils::fold_title;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

/// Remove duplicates, keeping the first occurrence and the original order.
pub fn dedup_events(events: Vec<Event>) -> Vec<Event> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_title_days: HashSet<(String, NaiveDate)> = HashSet::new();
    let total = events.len();

    let unique: Vec<Event> = events
        .into_iter()
        .filter(|event| {
            let url = event.url.as_deref().filter(|u| !u.is_empty());
            let title_day = (fold_title(&event.title), event.starts_at.date);

            let duplicate = url.is_some_and(|u| seen_urls.contains(u))
                || seen_title_days.contains(&title_day);
            if duplicate {
                debug!(source = %event.source, title = %event.title, "Dropping duplicate event");
                return false;
            }

            if let Some(u) = url {
                seen_urls.insert(u.to_string());
            }
            seen_title_days.insert(title_day);
            true
        })
        .collect();

    debug!(total, unique = unique.len(), "Deduplicated events");
    unique
}
