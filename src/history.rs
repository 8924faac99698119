//! Change detection between today's snapshot and the accumulated history.
//!
//! Listings are keyed by their numeric identifier. A listing without one
//! can never match a history key, so once history exists it is never
//! reported as new and never appended.

use crate::models::Listing;
use std::collections::HashSet;

/// Outcome of comparing a snapshot with history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Listings first observed in this run, in snapshot order
    pub new: Vec<Listing>,
    /// History to persist: prior history followed by `new`, one row per id
    pub history: Vec<Listing>,
}

/// Compare today's snapshot with prior history.
///
/// `None` means no history file exists yet: everything observed today is new.
pub fn detect_changes(today: &[Listing], history: Option<Vec<Listing>>) -> ChangeSet {
    match history {
        Some(history) => {
            let new = new_listings(today, &history);
            let history = merge_history(history, &new);
            ChangeSet { new, history }
        }
        None => ChangeSet {
            new: today.to_vec(),
            history: dedup_by_id(today.to_vec()),
        },
    }
}

/// Listings of `today` whose identifier does not occur in `history`.
pub fn new_listings(today: &[Listing], history: &[Listing]) -> Vec<Listing> {
    let known: HashSet<&str> = history.iter().filter_map(|l| l.id.as_deref()).collect();

    today
        .iter()
        .filter(|l| matches!(l.id.as_deref(), Some(id) if !known.contains(id)))
        .cloned()
        .collect()
}

/// Append `new` to `history` and drop repeated identifiers.
pub fn merge_history(mut history: Vec<Listing>, new: &[Listing]) -> Vec<Listing> {
    history.extend_from_slice(new);
    dedup_by_id(history)
}

/// Keep the first listing seen for each identifier.
///
/// Listings without an identifier are kept as they are.
pub fn dedup_by_id(records: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|l| match &l.id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .collect()
}
