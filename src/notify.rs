//! Digest delivery.
//!
//! - [`SmtpNotifier`]: authenticated STARTTLS submission via `lettre`
//! - [`DryRunNotifier`]: writes the digest to stdout instead of sending it
//!
//! Delivery is attempted once. A failure is returned to `main`, which turns
//! it into a non-zero exit so the scheduler notices.

use crate::config::SmtpSettings;
use crate::digest::Digest;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("failed to write digest: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can deliver a rendered digest.
pub trait Notify {
    async fn deliver(&self, digest: &Digest) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipient: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();
        Ok(Self {
            transport,
            from: settings.from.clone(),
            recipient: settings.recipient.clone(),
        })
    }
}

impl Notify for SmtpNotifier {
    #[instrument(level = "info", skip_all, fields(to = %self.recipient, subject = %digest.subject))]
    async fn deliver(&self, digest: &Digest) -> Result<(), NotifyError> {
        let message = build_message(digest, self.from.clone(), self.recipient.clone())?;
        let t0 = Instant::now();
        self.transport.send(message).await?;
        info!(
            events = digest.event_count,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Digest emailed"
        );
        Ok(())
    }
}

/// Prints the digest instead of sending it.
#[derive(Debug, Default)]
pub struct DryRunNotifier;

impl Notify for DryRunNotifier {
    async fn deliver(&self, digest: &Digest) -> Result<(), NotifyError> {
        let mut out = std::io::stdout().lock();
        write_digest(&mut out, digest)?;
        out.flush()?;
        info!(events = digest.event_count, "Dry run: digest printed, not sent");
        Ok(())
    }
}

/// Multipart/alternative message carrying the text and HTML bodies.
pub fn build_message(digest: &Digest, from: Mailbox, to: Mailbox) -> Result<Message, NotifyError> {
    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(digest.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            digest.text.clone(),
            digest.html.clone(),
        ))?;
    Ok(message)
}

fn write_digest(out: &mut impl Write, digest: &Digest) -> std::io::Result<()> {
    writeln!(out, "Subject: {}", digest.subject)?;
    writeln!(out)?;
    write!(out, "{}", digest.text)
}
