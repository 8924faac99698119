use crate::config::SlackConfig;
use crate::error::WatchError;
use crate::models::Listing;
use crate::notify::{Delivery, Notifier, SkipReason, SUBJECT};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Listings shown in one message; the rest are left out.
pub const MAX_LISTINGS_PER_MESSAGE: usize = 20;

/// Posts new listings to a Slack incoming webhook
pub struct SlackNotifier {
    client: Client,
    config: SlackConfig,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }
}

/// Bold header followed by one bullet per listing, capped at 20.
pub fn format_message(new: &[Listing]) -> String {
    let lines: Vec<String> = new
        .iter()
        .take(MAX_LISTINGS_PER_MESSAGE)
        .map(|l| format!("• {}", l.summary_line()))
        .collect();

    format!("*{}*\n{}", SUBJECT, lines.join("\n"))
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> &'static str {
        "Slack"
    }

    async fn notify(&self, new: &[Listing]) -> Result<Delivery> {
        if !self.config.enabled {
            info!("Slack disabled (USE_SLACK=false)");
            return Ok(Delivery::Skipped(SkipReason::Disabled));
        }
        if new.is_empty() {
            info!("No new listings, not posting to Slack");
            return Ok(Delivery::Skipped(SkipReason::NothingNew));
        }
        let Some(webhook_url) = self.config.webhook_url.as_deref() else {
            info!("SLACK_WEBHOOK_URL is not set, skipping Slack");
            return Ok(Delivery::Skipped(SkipReason::Unconfigured("SLACK_WEBHOOK_URL")));
        };

        let text = format_message(new);
        let response = self
            .client
            .post(webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .context("Failed to reach Slack webhook")?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(WatchError::Delivery {
                channel: self.channel(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let count = new.len().min(MAX_LISTINGS_PER_MESSAGE);
        info!("Posted {} new listings to Slack", count);
        Ok(Delivery::Sent { count })
    }
}
