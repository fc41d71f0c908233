//! The end-to-end run: fetch → parse → normalize → dedup → rank → render → deliver.
//!
//! # Fetch order
//!
//! Search requests are generated keyword by keyword, source by source, page
//! by page. Identical URLs are requested once per run (GarysGuide's listing
//! does not depend on the keyword) and the downloads go through an
//! order-preserving buffered stream, so up to `concurrency` requests are in
//! flight while the merged event list stays in generation order. That order
//! is what "first occurrence wins" in [`dedup_events`] refers to.
//!
//! # Failure handling
//!
//! A failed request is logged and contributes nothing; a record that does not
//! normalize is skipped. Only delivery can fail the run.

use crate::config::Settings;
use crate::dedup::dedup_events;
use crate::digest::{Digest, DigestMeta, render_digest};
use crate::fetch::Fetch;
use crate::models::Event;
use crate::normalize::{Normalizer, SearchWindow};
use crate::notify::{Notify, NotifyError};
use crate::rank::select_top;
use crate::sources::EventSource;
use crate::utils::truncate_for_log;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// One results page to request and the context to parse it in.
struct SearchJob<'a> {
    source: &'a dyn EventSource,
    keyword: &'a str,
    url: Url,
}

pub struct Pipeline<F> {
    settings: Settings,
    sources: Vec<Box<dyn EventSource>>,
    fetcher: F,
}

impl<F> Pipeline<F>
where
    F: Fetch,
{
    pub fn new(settings: Settings, sources: Vec<Box<dyn EventSource>>, fetcher: F) -> Self {
        Self {
            settings,
            sources,
            fetcher,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Collect, render and deliver one digest for the window starting at `now`.
    #[instrument(level = "info", skip_all, fields(location = %self.settings.location, %now))]
    pub async fn run<N: Notify>(&self, now: DateTime<Tz>, notifier: &N) -> Result<Digest, NotifyError> {
        let window = SearchWindow::new(now, self.settings.days_ahead);
        let normalizer = Normalizer::new(window, &self.settings.location);
        debug!(until = %normalizer.window().end(), "Search window");

        let events = self.collect(&normalizer).await;
        let digest = self.digest(events, now.date_naive());
        notifier.deliver(&digest).await?;
        Ok(digest)
    }

    /// Fetch every search page and return normalized events in fetch order.
    #[instrument(level = "info", skip_all, fields(keywords = self.settings.keywords.len(), sources = self.sources.len()))]
    pub async fn collect(&self, normalizer: &Normalizer) -> Vec<Event> {
        let jobs: Vec<SearchJob<'_>> = self
            .settings
            .keywords
            .iter()
            .flat_map(move |keyword| {
                self.sources.iter().flat_map(move |source| {
                    source
                        .search_urls(keyword)
                        .into_iter()
                        .map(move |url| SearchJob {
                            source: source.as_ref(),
                            keyword,
                            url,
                        })
                })
            })
            .collect();

        let urls: Vec<Url> = jobs.iter().map(|job| job.url.clone()).unique().collect();
        info!(
            requests = urls.len(),
            searches = jobs.len(),
            concurrency = self.settings.concurrency,
            "Fetching search pages"
        );

        let pages: HashMap<Url, String> = stream::iter(urls)
            .map(|url| async move {
                let result = self.fetcher.fetch(&url).await;
                (url, result)
            })
            .buffered(self.settings.concurrency.max(1))
            .filter_map(|(url, result)| async move {
                match result {
                    Ok(body) => Some((url, body)),
                    Err(e) => {
                        warn!(%url, error = %e, "Fetch failed; treating as zero results");
                        None
                    }
                }
            })
            .collect()
            .await;

        let mut events = Vec::new();
        for job in &jobs {
            let source = job.source.source();
            let Some(payload) = pages.get(&job.url) else {
                continue;
            };

            let raw = job.source.parse(payload, job.keyword);
            let parsed = raw.len();
            if parsed == 0 {
                debug!(
                    %source,
                    url = %job.url,
                    preview = %truncate_for_log(payload, 200),
                    "No listings recognised on page"
                );
            }

            let before = events.len();
            events.extend(
                raw.into_iter()
                    .filter_map(|r| normalizer.normalize(r, source, job.keyword)),
            );
            info!(
                %source,
                keyword = job.keyword,
                parsed,
                kept = events.len() - before,
                "Processed search page"
            );
        }

        info!(count = events.len(), "Collected events");
        events
    }

    /// Dedup, rank and render collected events.
    pub fn digest(&self, events: Vec<Event>, generated_on: NaiveDate) -> Digest {
        let unique = dedup_events(events);
        let selected = select_top(unique, &self.settings.keywords, self.settings.max_events);
        let meta = DigestMeta {
            location: self.settings.location.clone(),
            days_ahead: self.settings.days_ahead,
            keywords: self.settings.keywords.clone(),
            generated_on,
        };
        render_digest(selected, &meta)
    }
}
