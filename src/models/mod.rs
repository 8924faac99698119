use serde::{Deserialize, Serialize};

/// One property listing as scraped from a search results card.
///
/// Column names follow the CSV files the tool has always written, so
/// history files from earlier runs remain readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    #[serde(rename = "anuncio_id")]
    pub id: Option<String>,
    pub url: String,
    #[serde(rename = "precio")]
    pub price: Option<String>,
    #[serde(rename = "gastos_comunes")]
    pub common_expenses: Option<String>,
    #[serde(rename = "ubicacion")]
    pub location: Option<String>,
    #[serde(rename = "titulo")]
    pub title: Option<String>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "dormitorios")]
    pub bedrooms: Option<String>,
    #[serde(rename = "banos")]
    pub bathrooms: Option<String>,
    #[serde(rename = "m2")]
    pub area: Option<String>,
    #[serde(rename = "inmobiliaria")]
    pub agency: Option<String>,
}

impl Listing {
    /// Header row, in field order.
    pub const COLUMNS: [&'static str; 11] = [
        "anuncio_id",
        "url",
        "precio",
        "gastos_comunes",
        "ubicacion",
        "titulo",
        "descripcion",
        "dormitorios",
        "banos",
        "m2",
        "inmobiliaria",
    ];

    /// Bare listing with only the URL and identifier set.
    pub fn new(id: Option<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            price: None,
            common_expenses: None,
            location: None,
            title: None,
            description: None,
            bedrooms: None,
            bathrooms: None,
            area: None,
            agency: None,
        }
    }

    /// `title | price | location | url`, with `-` for missing fields.
    pub fn summary_line(&self) -> String {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "{} | {} | {} | {}",
            or_dash(&self.title),
            or_dash(&self.price),
            or_dash(&self.location),
            self.url
        )
    }
}
