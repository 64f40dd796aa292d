//! Sort & reveal controller: the ordered, incrementally revealed view of the
//! current listing.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ExplorerConfig;
use crate::entry::Entry;
use crate::reveal::{RevealWindow, ScrollMetrics};
use crate::sort::{sort_entries, SortField, SortOrder, SortSpec};

/// Owns the sorted sequence derived from a listing.
///
/// The sequence is recomputed when the listing is replaced, the field
/// changes, or the order changes. Random order reshuffles on each of those.
pub struct ListingView {
    spec: SortSpec,
    show_hidden: bool,
    source: Vec<Entry>,
    sorted: Vec<Entry>,
    reveal: RevealWindow,
    rng: StdRng,
}

impl ListingView {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Construct with a caller-supplied generator (deterministic shuffles).
    pub fn with_rng(config: &ExplorerConfig, rng: StdRng) -> Self {
        Self {
            spec: config.default_sort,
            show_hidden: config.show_hidden,
            source: Vec::new(),
            sorted: Vec::new(),
            reveal: RevealWindow::new(config.reveal_page_size, config.reveal_threshold_px),
            rng,
        }
    }

    pub fn spec(&self) -> SortSpec {
        self.spec
    }

    /// Replace the underlying listing. Resets the reveal window.
    pub fn set_listing(&mut self, entries: &[Entry]) {
        let show_hidden = self.show_hidden;
        self.source = entries
            .iter()
            .filter(|e| show_hidden || !e.is_hidden())
            .cloned()
            .collect();
        self.recompute();
        self.reveal.reset(self.sorted.len());
    }

    /// Change the sort field. Ignored while the order is random.
    ///
    /// Returns `true` when the sequence was recomputed.
    pub fn set_field(&mut self, field: SortField) -> bool {
        if !self.spec.field_enabled() || self.spec.field == field {
            return false;
        }
        self.spec.field = field;
        self.recompute();
        true
    }

    /// Change the sort order. Selecting random again reshuffles.
    pub fn set_order(&mut self, order: SortOrder) -> bool {
        if self.spec.order == order && order != SortOrder::Random {
            return false;
        }
        self.spec.order = order;
        self.recompute();
        true
    }

    /// Feed a scroll event; returns `true` when more entries were revealed.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        self.reveal.on_scroll(metrics, self.sorted.len())
    }

    /// The full sorted sequence (navigation operates on this).
    pub fn sorted(&self) -> &[Entry] {
        &self.sorted
    }

    /// The revealed prefix of the sorted sequence.
    pub fn visible(&self) -> &[Entry] {
        &self.sorted[..self.reveal.count().min(self.sorted.len())]
    }

    pub fn revealed(&self) -> usize {
        self.reveal.count()
    }

    pub fn clear(&mut self) {
        self.set_listing(&[]);
    }

    fn recompute(&mut self) {
        self.sorted = sort_entries(&self.source, self.spec, &mut self.rng);
    }
}
