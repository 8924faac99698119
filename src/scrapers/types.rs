use crate::models::Listing;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.infocasas.com.uy";
pub const DEFAULT_SEARCH_URL: &str = "https://www.infocasas.com.uy/venta/casas-y-apartamentos/montevideo/buceo-y-en-puerto-buceo-y-en-pocitos-nuevo-y-en-punta-carretas-y-en-pocitos-y-en-parque-batlle/2-dormitorios/2-o-mas-banos/hasta-260000/dolares";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; RealEstateBot/1.0; +https://tusitio.com)";

/// Search parameters for listing scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Site root that relative listing links resolve against
    pub base_url: String,
    /// First results page; later pages append `/pagina{N}`
    pub search_url: String,
    /// Hard cap on pages fetched per run
    pub max_pages: u32,
    /// Pause between consecutive page fetches
    pub page_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            max_pages: 20,
            page_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(20),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Everything observed in one scrape pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub listings: Vec<Listing>,
    /// Pages fetched, including the empty page that ended pagination
    pub pages: u32,
}

/// Result of parsing a single results page.
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Listing cards found, including those dropped for lacking a URL
    pub cards: usize,
    pub listings: Vec<Listing>,
}
