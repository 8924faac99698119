use thiserror::Error;

/// Failures callers may want to tell apart. Everything else travels as a
/// plain `anyhow::Error` with context attached.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("GET {url} returned status {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("{channel} delivery failed: {status} - {body}")]
    Delivery {
        channel: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("Email error: {0}")]
    Email(String),
}
