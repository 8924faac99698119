pub mod email;
pub mod slack;

use crate::models::Listing;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

pub use email::EmailNotifier;
pub use slack::SlackNotifier;

/// Header line shared by every channel.
pub const SUBJECT: &str = "Nuevos inmuebles InfoCasas (filtros diarios)";

/// Why a channel did not send anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NothingNew,
    Unconfigured(&'static str),
    NoRecipients,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => write!(f, "disabled"),
            SkipReason::NothingNew => write!(f, "no new listings"),
            SkipReason::Unconfigured(what) => write!(f, "{} is not set", what),
            SkipReason::NoRecipients => write!(f, "no recipients"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { count: usize },
    Skipped(SkipReason),
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Sent { count } => write!(f, "sent {} listings", count),
            Delivery::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// A channel that announces newly seen listings
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;

    /// Deliver `new`. Missing configuration is a skip, not an error.
    async fn notify(&self, new: &[Listing]) -> Result<Delivery>;
}
