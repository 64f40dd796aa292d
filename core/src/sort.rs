//! Deterministic ordering of listing entries.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entry::Entry;

/// The entry attribute a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    ModifiedTime,
}

/// Direction of the ordering, or a fresh shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Ascending,
    Descending,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::ModifiedTime,
            order: SortOrder::Descending,
        }
    }
}

impl SortSpec {
    /// The field selector is meaningless while shuffling.
    pub fn field_enabled(&self) -> bool {
        self.order != SortOrder::Random
    }
}

/// Compare two names the way a person reads them: case-insensitive first,
/// then by exact code points so distinct names never compare equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Ascending comparator for `field`.
///
/// Ties fall back to the path, which is unique within a listing, so the
/// result is a total order and descending is its exact reverse.
pub fn compare_entries(a: &Entry, b: &Entry, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Name => compare_names(&a.name, &b.name),
        SortField::ModifiedTime => a.modified_at.cmp(&b.modified_at),
    };
    primary.then_with(|| a.path.cmp(&b.path))
}

/// Produce the ordered sequence for `spec`.
///
/// `Random` reshuffles on every call.
pub fn sort_entries<R: Rng + ?Sized>(entries: &[Entry], spec: SortSpec, rng: &mut R) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    match spec.order {
        SortOrder::Random => sorted.shuffle(rng),
        SortOrder::Ascending => sorted.sort_by(|a, b| compare_entries(a, b, spec.field)),
        SortOrder::Descending => sorted.sort_by(|a, b| compare_entries(b, a, spec.field)),
    }
    sorted
}
