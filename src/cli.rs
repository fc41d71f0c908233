//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable (a `.env` file in
//! the working directory is loaded first) or from the YAML file passed with
//! `--config`. Flags win over the environment, which wins over the file.

use clap::Parser;
use std::path::PathBuf;

/// Scrape event listings for a city and email a digest.
///
/// # Examples
///
/// ```sh
/// # Print the digest instead of sending it
/// city_event_digest --dry-run
///
/// # Another city, two weeks ahead, from a config file
/// city_event_digest --config digest.yaml --days-ahead 14
///
/// # Credentials from the environment
/// SMTP_USER=me@example.com SMTP_PASSWORD=app-password city_event_digest
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the digest to stdout instead of emailing it
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Target city, e.g. "New York"
    #[arg(short, long, env = "LOCATION")]
    pub location: Option<String>,

    /// Comma separated search keywords, in priority order
    #[arg(short, long = "keywords", env = "SEARCH_KEYWORDS", value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// How many days ahead to look for events
    #[arg(short, long, env = "DAYS_AHEAD")]
    pub days_ahead: Option<u32>,

    /// IANA time zone of the target city
    #[arg(long, env = "TIMEZONE")]
    pub timezone: Option<String>,

    /// Maximum events in the digest (0 for no limit)
    #[arg(long, env = "MAX_EVENTS_IN_EMAIL")]
    pub max_events: Option<usize>,

    /// Comma separated sources to query (luma, eventbrite, meetup, garysguide)
    #[arg(long, env = "SOURCES", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Result pages to request per keyword where a source paginates
    #[arg(long, env = "PAGES")]
    pub pages: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Retries for transient fetch failures
    #[arg(long, env = "FETCH_RETRIES")]
    pub retries: Option<usize>,

    /// Requests in flight at once
    #[arg(long, env = "FETCH_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// City name for Luma's discover page
    #[arg(long, env = "LUMA_CITY")]
    pub luma_city: Option<String>,

    /// Eventbrite place slug, e.g. "ny--new-york"
    #[arg(long, env = "EVENTBRITE_PLACE")]
    pub eventbrite_place: Option<String>,

    /// Meetup location key, e.g. "us--ny--New York"
    #[arg(long, env = "MEETUP_LOCATION")]
    pub meetup_location: Option<String>,

    /// GarysGuide region code, e.g. "nyc"
    #[arg(long, env = "GARYSGUIDE_REGION")]
    pub garysguide_region: Option<String>,

    /// SMTP relay host
    #[arg(long, env = "SMTP_SERVER")]
    pub smtp_server: Option<String>,

    /// SMTP submission port (STARTTLS)
    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// SMTP username
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Digest recipient (defaults to the SMTP user)
    #[arg(long, env = "EMAIL_RECIPIENT")]
    pub email_recipient: Option<String>,

    /// Sender address (defaults to the SMTP user)
    #[arg(long, env = "EMAIL_FROM")]
    pub email_from: Option<String>,
}
