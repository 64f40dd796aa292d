//! Incremental reveal of a sorted listing, driven by scroll position.

use serde::{Deserialize, Serialize};

/// Scroll geometry of the listing container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Whether the viewport bottom is within `threshold` pixels of the end.
    pub fn near_bottom(&self, threshold: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - threshold
    }
}

/// Count of sorted entries currently rendered.
///
/// Grows by one page when the container is scrolled near its bottom and
/// never exceeds the entry count. Only [`reset`](Self::reset) shrinks it.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealWindow {
    count: usize,
    page: usize,
    threshold_px: f64,
}

impl RevealWindow {
    pub fn new(page: usize, threshold_px: f64) -> Self {
        Self {
            count: 0,
            page: page.max(1),
            threshold_px,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Start over for a newly replaced listing of `total` entries.
    pub fn reset(&mut self, total: usize) {
        self.count = self.page.min(total);
    }

    /// Grow by one page if `metrics` is near the bottom. Returns `true` when
    /// the window grew.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, total: usize) -> bool {
        if !metrics.near_bottom(self.threshold_px) {
            return false;
        }
        let grown = (self.count + self.page).min(total).max(self.count);
        let changed = grown != self.count;
        self.count = grown;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_bottom() -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: 950.0,
            scroll_height: 1000.0,
            client_height: 0.0,
        }
    }

    fn far_from_bottom() -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 5000.0,
            client_height: 800.0,
        }
    }

    #[test]
    fn reset_clamps_to_total() {
        let mut window = RevealWindow::new(50, 100.0);
        window.reset(120);
        assert_eq!(window.count(), 50);
        window.reset(7);
        assert_eq!(window.count(), 7);
    }

    #[test]
    fn threshold_is_inclusive_at_one_hundred_pixels() {
        let exactly = ScrollMetrics {
            scroll_top: 100.0,
            scroll_height: 1000.0,
            client_height: 800.0,
        };
        assert!(exactly.near_bottom(100.0));
        let short = ScrollMetrics {
            scroll_top: 99.0,
            ..exactly
        };
        assert!(!short.near_bottom(100.0));
    }

    #[test]
    fn grows_by_page_and_caps_at_total() {
        let mut window = RevealWindow::new(50, 100.0);
        window.reset(120);

        assert!(!window.on_scroll(far_from_bottom(), 120));
        assert_eq!(window.count(), 50);

        assert!(window.on_scroll(at_bottom(), 120));
        assert_eq!(window.count(), 100);
        assert!(window.on_scroll(at_bottom(), 120));
        assert_eq!(window.count(), 120);
        assert!(!window.on_scroll(at_bottom(), 120));
        assert_eq!(window.count(), 120);
    }

    #[test]
    fn never_decreases_on_scroll() {
        let mut window = RevealWindow::new(50, 100.0);
        window.reset(200);
        window.on_scroll(at_bottom(), 200);
        assert_eq!(window.count(), 100);

        // A smaller total without a reset must not shrink the window.
        window.on_scroll(at_bottom(), 30);
        assert_eq!(window.count(), 100);
    }
}
