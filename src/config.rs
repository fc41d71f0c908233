//! Run settings: YAML file, environment and CLI merged and validated.
//!
//! [`Settings::resolve`] is called before anything touches the network, so a
//! missing credential or a typo in a time zone ends the run immediately with
//! a [`ConfigError`] instead of after a minute of scraping.

use crate::cli::Cli;
use crate::models::Source;
use crate::utils::slugify;
use chrono_tz::Tz;
use itertools::Itertools;
use lettre::message::Mailbox;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_LOCATION: &str = "New York";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "tech",
    "startup",
    "ai",
    "design",
    "networking",
    "product",
    "ux",
    "founder",
];
pub const DEFAULT_DAYS_AHEAD: u32 = 7;
pub const MAX_DAYS_AHEAD: u32 = 366;
pub const DEFAULT_MAX_EVENTS: usize = 12;
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("no search keywords configured (set SEARCH_KEYWORDS or --keywords)")]
    NoKeywords,
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("missing required credential {0} (or pass --dry-run)")]
    MissingCredential(&'static str),
}

/// Shape of the optional YAML config file. Every field may be omitted.
///
/// ```yaml
/// location: New York
/// timezone: America/New_York
/// keywords: [tech, startup, ai]
/// days_ahead: 7
/// sources: [luma, eventbrite, meetup]
/// places:
///   eventbrite_place: ny--new-york
/// smtp:
///   server: smtp.gmail.com
///   recipient: me@example.com
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub days_ahead: Option<u32>,
    pub max_events: Option<usize>,
    pub sources: Option<Vec<String>>,
    pub pages: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<usize>,
    pub concurrency: Option<usize>,
    pub places: PlaceConfig,
    pub smtp: SmtpFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceConfig {
    pub luma_city: Option<String>,
    pub eventbrite_place: Option<String>,
    pub meetup_location: Option<String>,
    pub garysguide_region: Option<String>,
}

/// Non-secret SMTP settings. Username and password only come from the
/// environment or the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmtpFileConfig {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub recipient: Option<String>,
    pub from: Option<String>,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config file");
        Ok(config)
    }
}

/// Per-source location identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Places {
    pub luma_city: String,
    pub eventbrite_place: String,
    pub meetup_location: String,
    pub garysguide_region: String,
}

impl Places {
    /// Best-guess identifiers for a city; New York gets the known-good ones.
    pub fn derive(location: &str) -> Self {
        if location.trim().eq_ignore_ascii_case(DEFAULT_LOCATION) {
            return Self {
                luma_city: DEFAULT_LOCATION.to_string(),
                eventbrite_place: "ny--new-york".to_string(),
                meetup_location: "us--ny--New York".to_string(),
                garysguide_region: "nyc".to_string(),
            };
        }
        Self {
            luma_city: location.to_string(),
            eventbrite_place: slugify(location),
            meetup_location: location.to_string(),
            garysguide_region: slugify(location).replace('-', ""),
        }
    }
}

/// Everything the notifier needs to deliver mail.
#[derive(Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: Mailbox,
    pub recipient: Mailbox,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from.to_string())
            .field("recipient", &self.recipient.to_string())
            .finish()
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub location: String,
    pub timezone: Tz,
    pub keywords: Vec<String>,
    pub days_ahead: u32,
    /// Cap on digest entries; 0 disables it.
    pub max_events: usize,
    pub sources: Vec<Source>,
    pub places: Places,
    pub pages: usize,
    pub request_timeout: Duration,
    pub retries: usize,
    pub concurrency: usize,
    pub dry_run: bool,
    /// Present whenever `dry_run` is false.
    pub smtp: Option<SmtpSettings>,
}

impl Settings {
    /// Merge CLI/env values over the config file (if any) and validate.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let location = non_empty(cli.location)
            .or(non_empty(file.location))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let tz_name = non_empty(cli.timezone)
            .or(non_empty(file.timezone))
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = tz_name.parse::<Tz>().map_err(|e| ConfigError::Invalid {
            name: "TIMEZONE",
            reason: e.to_string(),
        })?;

        let keywords = if !cli.keywords.is_empty() {
            cli.keywords
        } else if let Some(keywords) = file.keywords {
            keywords
        } else {
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
        };
        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Err(ConfigError::NoKeywords);
        }

        let days_ahead = cli
            .days_ahead
            .or(file.days_ahead)
            .unwrap_or(DEFAULT_DAYS_AHEAD);
        if !(1..=MAX_DAYS_AHEAD).contains(&days_ahead) {
            return Err(ConfigError::Invalid {
                name: "DAYS_AHEAD",
                reason: format!("must be between 1 and {MAX_DAYS_AHEAD}, got {days_ahead}"),
            });
        }

        let source_names = if !cli.sources.is_empty() {
            cli.sources
        } else {
            file.sources.unwrap_or_default()
        };
        let sources = parse_sources(&source_names)?;

        let derived = Places::derive(&location);
        let places = Places {
            luma_city: non_empty(cli.luma_city)
                .or(non_empty(file.places.luma_city))
                .unwrap_or(derived.luma_city),
            eventbrite_place: non_empty(cli.eventbrite_place)
                .or(non_empty(file.places.eventbrite_place))
                .unwrap_or(derived.eventbrite_place),
            meetup_location: non_empty(cli.meetup_location)
                .or(non_empty(file.places.meetup_location))
                .unwrap_or(derived.meetup_location),
            garysguide_region: non_empty(cli.garysguide_region)
                .or(non_empty(file.places.garysguide_region))
                .unwrap_or(derived.garysguide_region),
        };

        let timeout_secs = cli.timeout_secs.or(file.timeout_secs).unwrap_or(30);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        let smtp = if cli.dry_run {
            None
        } else {
            Some(resolve_smtp(
                non_empty(cli.smtp_server).or(non_empty(file.smtp.server)),
                cli.smtp_port.or(file.smtp.port),
                non_empty(cli.smtp_user),
                non_empty(cli.smtp_password),
                non_empty(cli.email_recipient).or(non_empty(file.smtp.recipient)),
                non_empty(cli.email_from).or(non_empty(file.smtp.from)),
            )?)
        };

        let settings = Settings {
            location,
            timezone,
            keywords,
            days_ahead,
            max_events: cli
                .max_events
                .or(file.max_events)
                .unwrap_or(DEFAULT_MAX_EVENTS),
            sources,
            places,
            pages: cli.pages.or(file.pages).unwrap_or(1).max(1),
            request_timeout: Duration::from_secs(timeout_secs),
            retries: cli.retries.or(file.retries).unwrap_or(2),
            concurrency: cli.concurrency.or(file.concurrency).unwrap_or(4).max(1),
            dry_run: cli.dry_run,
            smtp,
        };
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }
}

fn resolve_smtp(
    server: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    recipient: Option<String>,
    from: Option<String>,
) -> Result<SmtpSettings, ConfigError> {
    let username = username.ok_or(ConfigError::MissingCredential("SMTP_USER"))?;
    let password = password.ok_or(ConfigError::MissingCredential("SMTP_PASSWORD"))?;
    let recipient = parse_mailbox("EMAIL_RECIPIENT", recipient.as_deref().unwrap_or(&username))?;
    let from = parse_mailbox("EMAIL_FROM", from.as_deref().unwrap_or(&username))?;

    Ok(SmtpSettings {
        server: server.unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
        port: port.unwrap_or(DEFAULT_SMTP_PORT),
        username,
        password,
        from,
        recipient,
    })
}

fn parse_mailbox(name: &'static str, value: &str) -> Result<Mailbox, ConfigError> {
    value.parse::<Mailbox>().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("'{value}' is not an email address ({e})"),
    })
}

/// Trim, drop empties, and drop case-insensitive repeats keeping the first.
fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unique_by(|k| k.to_lowercase())
        .collect()
}

/// Parse source names; an empty list means every source.
fn parse_sources(names: &[String]) -> Result<Vec<Source>, ConfigError> {
    let names: Vec<&str> = names
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(Source::ALL.to_vec());
    }
    let parsed = names
        .into_iter()
        .map(str::parse::<Source>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Invalid {
            name: "SOURCES",
            reason: e.to_string(),
        })?;
    Ok(parsed.into_iter().unique().collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
