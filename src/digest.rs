//! Digest rendering: events → email subject, plain text and HTML bodies.
//!
//! Events are listed chronologically under one heading per calendar day:
//!
//! ```text
//! Tech events in New York: next 7 days (2026-10-19)
//! Keywords: ai, startup
//!
//! Tue Oct 20
//!   6:00 PM  AI Meetup
//!            85 Broad St, New York
//!            https://www.meetup.com/ai-nyc/events/1/
//!            via Meetup
//! ```
//!
//! An empty event list still renders a complete digest with a "no events"
//! body, so a quiet week is distinguishable from a run that never happened.

use crate::models::Event;
use crate::utils::escape_html;
use chrono::NaiveDate;
use itertools::Itertools;
use std::fmt;
use tracing::{debug, instrument};

/// Run details shown in the subject and header.
#[derive(Debug, Clone)]
pub struct DigestMeta {
    pub location: String,
    pub days_ahead: u32,
    pub keywords: Vec<String>,
    pub generated_on: NaiveDate,
}

/// A rendered digest, ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub text: String,
    pub html: String,
    pub event_count: usize,
}

/// Render `events` into a [`Digest`], sorted by start then title.
#[instrument(level = "info", skip_all, fields(events = events.len(), location = %meta.location))]
pub fn render_digest(mut events: Vec<Event>, meta: &DigestMeta) -> Digest {
    events.sort_by(|a, b| {
        a.starts_at
            .cmp(&b.starts_at)
            .then_with(|| a.title.cmp(&b.title))
    });

    let days: Vec<(NaiveDate, Vec<&Event>)> = events
        .iter()
        .chunk_by(|e| e.starts_at.date)
        .into_iter()
        .map(|(day, group)| (day, group.collect()))
        .collect();

    let digest = Digest {
        subject: subject(meta),
        text: TextBody { meta, days: &days }.to_string(),
        html: HtmlBody { meta, days: &days }.to_string(),
        event_count: events.len(),
    };
    debug!(days = days.len(), "Rendered digest");
    digest
}

fn subject(meta: &DigestMeta) -> String {
    format!(
        "{} events: {} (next {} days)",
        meta.location, meta.generated_on, meta.days_ahead
    )
}

fn no_events_line(meta: &DigestMeta) -> String {
    format!(
        "No events found in {} for the next {} days.",
        meta.location, meta.days_ahead
    )
}

fn time_label(event: &Event) -> String {
    match event.starts_at.time {
        Some(t) => t.format("%-I:%M %p").to_string(),
        None => "All day".to_string(),
    }
}

struct TextBody<'a> {
    meta: &'a DigestMeta,
    days: &'a [(NaiveDate, Vec<&'a Event>)],
}

impl fmt::Display for TextBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.meta;
        writeln!(
            f,
            "Tech events in {}: next {} days ({})",
            meta.location, meta.days_ahead, meta.generated_on
        )?;
        writeln!(f, "Keywords: {}", meta.keywords.join(", "))?;
        writeln!(f)?;

        if self.days.is_empty() {
            return writeln!(f, "{}", no_events_line(meta));
        }

        for (day, events) in self.days {
            writeln!(f, "{}", day.format("%a %b %-d"))?;
            for event in events {
                writeln!(f, "  {:>8}  {}", time_label(event), event.title)?;
                writeln!(f, "            {}", event.location)?;
                if let Some(url) = &event.url {
                    writeln!(f, "            {url}")?;
                }
                writeln!(f, "            via {}", event.source)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct HtmlBody<'a> {
    meta: &'a DigestMeta,
    days: &'a [(NaiveDate, Vec<&'a Event>)],
}

impl fmt::Display for HtmlBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.meta;
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html><body style=\"font-family: sans-serif\">")?;
        writeln!(
            f,
            "<h1>Tech events in {}</h1>",
            escape_html(&meta.location)
        )?;
        writeln!(
            f,
            "<p>Next {} days from {}. Keywords: {}</p>",
            meta.days_ahead,
            meta.generated_on,
            escape_html(&meta.keywords.join(", "))
        )?;

        if self.days.is_empty() {
            writeln!(f, "<p>{}</p>", escape_html(&no_events_line(meta)))?;
        }

        for (day, events) in self.days {
            writeln!(f, "<h2>{}</h2>", day.format("%A, %B %-d"))?;
            writeln!(f, "<ul>")?;
            for event in events {
                let title = escape_html(&event.title);
                let title = match &event.url {
                    Some(url) => format!("<a href=\"{}\">{title}</a>", escape_html(url)),
                    None => title,
                };
                writeln!(
                    f,
                    "<li><strong>{}</strong> {title}<br><small>{} &middot; via {}</small></li>",
                    escape_html(&time_label(event)),
                    escape_html(&event.location),
                    event.source
                )?;
            }
            writeln!(f, "</ul>")?;
        }
        writeln!(f, "</body></html>")
    }
}
