pub mod infocasas;
pub mod traits;
pub mod types;

pub use infocasas::InfocasasScraper;
pub use traits::ScraperTrait;
