use crate::config::EmailConfig;
use crate::error::WatchError;
use crate::models::Listing;
use crate::notify::{Delivery, Notifier, SkipReason, SUBJECT};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

const SMTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Emails new listings over STARTTLS SMTP, optionally with today's CSV attached
pub struct EmailNotifier {
    config: EmailConfig,
    attachment: Option<PathBuf>,
}

impl EmailNotifier {
    /// `attachment` is sent only if `attach_csv` is set and the file exists.
    pub fn new(config: EmailConfig, attachment: Option<PathBuf>) -> Self {
        Self { config, attachment }
    }

    /// Credentials, or the name of the first missing setting.
    fn credentials(&self) -> std::result::Result<(&str, &str), &'static str> {
        let user = self.config.smtp_user.as_deref().ok_or("SMTP_USER")?;
        let pass = self.config.smtp_pass.as_deref().ok_or("SMTP_PASS")?;
        Ok((user, pass))
    }

    async fn load_attachment(&self) -> Result<Option<(String, Vec<u8>)>> {
        if !self.config.attach_csv {
            return Ok(None);
        }
        let Some(path) = &self.attachment else {
            return Ok(None);
        };
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!("Attachment {} not found, sending without it", path.display());
            return Ok(None);
        }

        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "listings.csv".to_string());

        Ok(Some((filename, data)))
    }
}

/// Plain-text body: intro line, blank line, one dash line per listing.
pub fn format_body(new: &[Listing]) -> String {
    let lines: Vec<String> = new
        .iter()
        .map(|l| format!("- {}", l.summary_line()))
        .collect();

    format!("Inmuebles nuevos que cumplen los filtros:\n\n{}", lines.join("\n"))
}

pub fn build_message(
    from: &str,
    recipients: &[String],
    new: &[Listing],
    attachment: Option<(String, Vec<u8>)>,
) -> Result<Message> {
    let parse_mailbox = |addr: &str| -> Result<Mailbox> {
        addr.parse::<Mailbox>()
            .map_err(|e| WatchError::Email(format!("invalid address '{}': {}", addr, e)).into())
    };

    let mut builder = Message::builder().from(parse_mailbox(from)?).subject(SUBJECT);
    for recipient in recipients {
        builder = builder.to(parse_mailbox(recipient)?);
    }

    let text = SinglePart::plain(format_body(new));
    let message = match attachment {
        Some((filename, data)) => {
            let csv_type = ContentType::parse("text/csv")
                .map_err(|e| WatchError::Email(e.to_string()))?;
            builder.multipart(
                MultiPart::mixed()
                    .singlepart(text)
                    .singlepart(Attachment::new(filename).body(data, csv_type)),
            )
        }
        None => builder.singlepart(text),
    };

    message.map_err(|e| WatchError::Email(e.to_string()).into())
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "Email"
    }

    async fn notify(&self, new: &[Listing]) -> Result<Delivery> {
        if !self.config.enabled {
            info!("Email disabled (USE_EMAIL=false)");
            return Ok(Delivery::Skipped(SkipReason::Disabled));
        }
        if new.is_empty() {
            info!("No new listings, not sending email");
            return Ok(Delivery::Skipped(SkipReason::NothingNew));
        }
        let (user, pass) = match self.credentials() {
            Ok(creds) => creds,
            Err(missing) => {
                info!("{} is not set, skipping email", missing);
                return Ok(Delivery::Skipped(SkipReason::Unconfigured(missing)));
            }
        };
        if self.config.recipients.is_empty() {
            info!("EMAIL_TO has no recipients, skipping email");
            return Ok(Delivery::Skipped(SkipReason::NoRecipients));
        }

        let attachment = self.load_attachment().await?;
        let attached = attachment.is_some();
        let message = build_message(user, &self.config.recipients, new, attachment)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)
            .map_err(|e| WatchError::Email(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| WatchError::Email(e.to_string()))?;

        if attached {
            info!("Email sent with {} new listings and CSV attached", new.len());
        } else {
            info!("Email sent with {} new listings", new.len());
        }
        Ok(Delivery::Sent { count: new.len() })
    }
}
