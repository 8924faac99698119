use crate::config::Config;
use crate::history::detect_changes;
use crate::notify::{Delivery, EmailNotifier, Notifier, SlackNotifier};
use crate::scrapers::{InfocasasScraper, ScraperTrait};
use crate::storage;
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

/// What one run observed and did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages: u32,
    pub scraped: usize,
    pub new: usize,
    pub history: usize,
    pub slack: Delivery,
    pub email: Delivery,
}

/// Scrape, diff against history, persist, and notify.
///
/// Nothing is written unless pagination completes. Notifications go out
/// only after history has been saved.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let started_at = Utc::now();

    let scraper = InfocasasScraper::with_params(config.search.clone())?;
    let snapshot = scraper.scrape().await?;

    storage::write_listings(&config.today_csv, &snapshot.listings).await?;
    info!("Saved today's CSV to {}", config.today_csv.display());

    let previous = storage::read_listings(&config.history_csv).await?;
    if previous.is_none() {
        info!("No history at {}, treating this as the first run", config.history_csv.display());
    }

    let changes = detect_changes(&snapshot.listings, previous);
    info!("{} new listings since the last run", changes.new.len());

    storage::write_listings(&config.history_csv, &changes.history).await?;
    info!(
        "History updated in {} ({} listings)",
        config.history_csv.display(),
        changes.history.len()
    );

    let slack = SlackNotifier::new(config.slack.clone())?;
    let slack = slack.notify(&changes.new).await?;

    let email = EmailNotifier::new(config.email.clone(), Some(config.today_csv.clone()));
    let email = email.notify(&changes.new).await?;

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        pages: snapshot.pages,
        scraped: snapshot.listings.len(),
        new: changes.new.len(),
        history: changes.history.len(),
        slack,
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlackConfig;
    use crate::error::WatchError;
    use crate::notify::{slack::format_message, SkipReason};
    use crate::scrapers::infocasas::tests::{card_html, page_html};
    use crate::scrapers::types::SearchParams;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(server: &MockServer, dir: &Path) -> Config {
        Config {
            search: SearchParams {
                base_url: server.uri(),
                search_url: format!("{}/venta", server.uri()),
                page_delay: Duration::ZERO,
                ..SearchParams::default()
            },
            today_csv: dir.join("hoy.csv"),
            history_csv: dir.join("historico.csv"),
            slack: SlackConfig {
                enabled: true,
                webhook_url: Some(format!("{}/hook", server.uri())),
            },
            ..Config::default()
        }
    }

    async fn serve_listings(server: &MockServer, ids: &[&str]) {
        server.reset().await;
        let cards: Vec<String> = ids.iter().map(|id| card_html(id, &format!("Casa {id}"))).collect();

        Mock::given(method("GET"))
            .and(path("/venta"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_html(&cards)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/venta/pagina2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_html(&[])))
            .mount(server)
            .await;
    }

    fn ids(listings: &[crate::models::Listing]) -> Vec<String> {
        listings.iter().filter_map(|l| l.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_first_and_second_run() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let config = test_config(&server, dir.path());

        // First run: everything is new.
        serve_listings(&server, &["1", "2"]).await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let first = run(&config).await.unwrap();

        assert_eq!(first.pages, 2);
        assert_eq!(first.new, 2);
        assert_eq!(first.history, 2);
        assert_eq!(first.slack, Delivery::Sent { count: 2 });
        assert_eq!(first.email, Delivery::Skipped(SkipReason::Disabled));
        server.verify().await;

        // Second run: only listing 3 is new, and only it is posted.
        serve_listings(&server, &["2", "3"]).await;
        let today = storage::read_listings(&config.today_csv).await.unwrap().unwrap();
        assert_eq!(ids(&today), vec!["1", "2"]);

        let expected_text = {
            let mut listing = crate::models::Listing::new(Some("3".into()), "");
            listing.url = format!("{}/apartamento-en-pocitos/3", server.uri());
            listing.title = Some("Casa 3".into());
            listing.price = Some("U$S 250.000".into());
            listing.location = Some("Pocitos, Montevideo".into());
            format_message(&[listing])
        };
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({ "text": expected_text })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let second = run(&config).await.unwrap();

        assert_eq!(second.new, 1);
        assert_eq!(second.history, 3);
        let history = storage::read_listings(&config.history_csv).await.unwrap().unwrap();
        assert_eq!(ids(&history), vec!["1", "2", "3"]);
        let today = storage::read_listings(&config.today_csv).await.unwrap().unwrap();
        assert_eq!(ids(&today), vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_nothing_new_sends_nothing() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let mut config = test_config(&server, dir.path());
        config.email.enabled = true;
        config.email.smtp_user = Some("bot@example.com".into());
        config.email.smtp_pass = Some("secret".into());
        config.email.recipients = vec!["a@example.com".into()];

        serve_listings(&server, &["1"]).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut seeded = crate::models::Listing::new(Some("1".into()), "https://example.com/1");
        seeded.title = Some("Vista antes".into());
        storage::write_listings(&config.history_csv, &[seeded]).await.unwrap();

        let summary = run(&config).await.unwrap();

        assert_eq!(summary.new, 0);
        assert_eq!(summary.slack, Delivery::Skipped(SkipReason::NothingNew));
        assert_eq!(summary.email, Delivery::Skipped(SkipReason::NothingNew));
        let history = storage::read_listings(&config.history_csv).await.unwrap().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title.as_deref(), Some("Vista antes"));
    }

    #[tokio::test]
    async fn test_failed_scrape_writes_nothing() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let config = test_config(&server, dir.path());

        Mock::given(method("GET"))
            .and(path("/venta"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_html(&[card_html("1", "Uno")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/venta/pagina2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = run(&config).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<WatchError>(),
            Some(WatchError::FetchStatus { status: 500, .. })
        ));
        assert!(!config.today_csv.exists());
        assert!(!config.history_csv.exists());
    }

    #[tokio::test]
    async fn test_webhook_failure_fails_run_after_history_saved() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let config = test_config(&server, dir.path());

        serve_listings(&server, &["1"]).await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = run(&config).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<WatchError>(),
            Some(WatchError::Delivery { status: 500, .. })
        ));
        assert!(config.history_csv.exists());
    }
}
