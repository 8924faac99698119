use crate::error::WatchError;
use crate::models::Listing;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{ParsedPage, SearchParams, Snapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

/// Selectors for the fields of one listing card.
struct CardSelectors {
    card: Selector,
    link: Selector,
    price: Selector,
    common_expenses: Selector,
    location: Selector,
    title: Selector,
    description: Selector,
    agency: Selector,
    typology: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            card: parse_selector("div.listingCard")?,
            link: parse_selector("a.lc-data")?,
            price: parse_selector(".property-price-tag p.main-price")?,
            common_expenses: parse_selector(".property-price-tag span.commonExpenses")?,
            location: parse_selector("strong.lc-location")?,
            title: parse_selector("h2.lc-title")?,
            description: parse_selector("p.lc-description")?,
            agency: parse_selector(".lc-owner-name")?,
            typology: parse_selector(".lc-typologyTag__item")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| WatchError::Selector(css.to_string()).into())
}

/// Scraper for InfoCasas search result pages
pub struct InfocasasScraper {
    client: Client,
    params: SearchParams,
    base_url: Url,
    selectors: CardSelectors,
}

impl InfocasasScraper {
    /// Create a scraper with custom search parameters
    pub fn with_params(params: SearchParams) -> Result<Self> {
        let client = Client::builder()
            .timeout(params.request_timeout)
            .user_agent(params.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(&params.base_url)
            .with_context(|| format!("Invalid base URL: {}", params.base_url))?;

        Ok(Self {
            client,
            params,
            base_url,
            selectors: CardSelectors::new()?,
        })
    }

    /// URL of results page `page` (1-based)
    pub fn page_url(&self, page: u32) -> String {
        let search = self.params.search_url.trim_end_matches('/');
        if page <= 1 {
            search.to_string()
        } else {
            format!("{}/pagina{}", search, page)
        }
    }

    /// Fetch one page. Any non-success status aborts with `FetchStatus`.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status: {}", url, status);
            return Err(WatchError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;
        debug!("Downloaded {} bytes of HTML", html.len());

        Ok(html)
    }

    /// Extract every listing card on a results page.
    pub fn parse_page(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);
        let mut parsed = ParsedPage::default();

        for card in document.select(&self.selectors.card) {
            parsed.cards += 1;
            match self.parse_listing(card) {
                Some(listing) => parsed.listings.push(listing),
                None => debug!("Skipped card {} without a listing URL", parsed.cards),
            }
        }

        parsed
    }

    /// Read the fields of one card. Returns `None` when the card has no link.
    fn parse_listing(&self, card: ElementRef) -> Option<Listing> {
        let sel = &self.selectors;

        let relative_url = card
            .select(&sel.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.is_empty())?;

        let url = match self.base_url.join(relative_url) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!("Unresolvable listing link {:?}: {}", relative_url, e);
                return None;
            }
        };

        let mut listing = Listing::new(listing_id_from_path(relative_url), url);
        listing.price = select_text(card, &sel.price, "");
        listing.common_expenses = select_text(card, &sel.common_expenses, "");
        listing.location = select_text(card, &sel.location, "");
        listing.title = select_text(card, &sel.title, "");
        listing.description = select_text(card, &sel.description, " ");
        listing.agency = select_text(card, &sel.agency, "");

        for item in card.select(&sel.typology) {
            let text = element_text(item, " ").to_lowercase();
            if text.contains("dorm") {
                listing.bedrooms = Some(text);
            } else if text.contains("baño") {
                listing.bathrooms = Some(text);
            } else if text.contains("m²") || text.contains("m2") {
                listing.area = Some(text);
            }
        }

        debug!("Parsed listing {:?} at {}", listing.id, listing.url);
        Some(listing)
    }
}

/// Trimmed text fragments of `element`, joined with `separator`.
fn element_text(element: ElementRef, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn select_text(card: ElementRef, selector: &Selector, separator: &str) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| element_text(el, separator))
}

/// Listing identifier: the last path segment, if it is all digits.
///
/// `/venta/casa/12345` yields `"12345"`; `/venta/casa/lindo` yields `None`.
pub fn listing_id_from_path(path: &str) -> Option<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let last = trimmed.rsplit('/').next()?;
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        Some(last.to_string())
    } else {
        None
    }
}

#[async_trait]
impl ScraperTrait for InfocasasScraper {
    async fn scrape(&self) -> Result<Snapshot> {
        info!(
            "Starting {} scrape (max {} pages)",
            self.source_name(),
            self.params.max_pages
        );

        let mut snapshot = Snapshot::default();

        for page in 1..=self.params.max_pages {
            if page > 1 && !self.params.page_delay.is_zero() {
                tokio::time::sleep(self.params.page_delay).await;
            }

            let url = self.page_url(page);
            info!("Scraping page {}: {}", page, url);

            let html = self.fetch_page(&url).await?;
            snapshot.pages += 1;
            let parsed = self.parse_page(&html);

            if parsed.cards == 0 {
                info!("No listing cards on page {}, assuming end of results", page);
                break;
            }

            info!(
                "Page {}: {} cards, {} listings kept",
                page,
                parsed.cards,
                parsed.listings.len()
            );
            snapshot.listings.extend(parsed.listings);
        }

        info!(
            "Scraped {} listings from {} pages",
            snapshot.listings.len(),
            snapshot.pages
        );
        Ok(snapshot)
    }

    fn source_name(&self) -> &'static str {
        "InfoCasas"
    }
}
