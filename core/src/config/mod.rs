use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sort::SortSpec;

/// Explorer tuning knobs.
///
/// Every field has a default, so a partial (or empty) JSON object is a valid
/// configuration. Field names are camelCase on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
    /// Reveal floor and step, in entries.
    #[serde(default = "default_reveal_page_size")]
    pub reveal_page_size: usize,
    /// Distance from the container bottom that reveals the next page.
    #[serde(default = "default_reveal_threshold_px")]
    pub reveal_threshold_px: f64,
    /// Inactivity delay before a text edit is committed.
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    /// Neighbors warmed in each direction around the previewed entry.
    #[serde(default = "default_prefetch_radius")]
    pub prefetch_radius: usize,
    #[serde(default)]
    pub default_sort: SortSpec,
    /// Include dot-prefixed entries in the view.
    #[serde(default)]
    pub show_hidden: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            reveal_page_size: default_reveal_page_size(),
            reveal_threshold_px: default_reveal_threshold_px(),
            save_debounce_ms: default_save_debounce_ms(),
            prefetch_radius: default_prefetch_radius(),
            default_sort: SortSpec::default(),
            show_hidden: false,
        }
    }
}

impl ExplorerConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Load from a JSON file.
    ///
    /// Returns the defaults if the file is missing or corrupt.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<ExplorerConfig>(&contents) {
                Ok(config) => {
                    debug!("Loaded explorer config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config from {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

/// Platform config directory for davshelf.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("davshelf");
    }
    if let Ok(home) = std::env::var("HOME") {
        #[cfg(target_os = "macos")]
        return PathBuf::from(&home)
            .join("Library")
            .join("Application Support")
            .join("davshelf");
        #[cfg(not(target_os = "macos"))]
        return PathBuf::from(&home).join(".config").join("davshelf");
    }
    PathBuf::from(".config").join("davshelf")
}

// --- Default value functions ---

fn default_reveal_page_size() -> usize {
    50
}

fn default_reveal_threshold_px() -> f64 {
    100.0
}

fn default_save_debounce_ms() -> u64 {
    500
}

fn default_prefetch_radius() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::{SortField, SortOrder};

    #[test]
    fn defaults() {
        let cfg = ExplorerConfig::default();
        assert_eq!(cfg.reveal_page_size, 50);
        assert_eq!(cfg.reveal_threshold_px, 100.0);
        assert_eq!(cfg.save_debounce(), Duration::from_millis(500));
        assert_eq!(cfg.prefetch_radius, 3);
        assert_eq!(cfg.default_sort.field, SortField::ModifiedTime);
        assert_eq!(cfg.default_sort.order, SortOrder::Descending);
        assert!(!cfg.show_hidden);
    }

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: ExplorerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.reveal_page_size, 50);
        assert_eq!(cfg.save_debounce_ms, 500);
    }

    #[test]
    fn partial_json_overrides_named_fields() {
        let json = r#"{
            "revealPageSize": 20,
            "defaultSort": { "field": "name", "order": "ascending" },
            "showHidden": true
        }"#;
        let cfg: ExplorerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.reveal_page_size, 20);
        assert_eq!(cfg.default_sort.field, SortField::Name);
        assert_eq!(cfg.default_sort.order, SortOrder::Ascending);
        assert!(cfg.show_hidden);
        assert_eq!(cfg.prefetch_radius, 3);
    }

    #[test]
    fn load_from_missing_or_corrupt_file_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.json");
        assert_eq!(ExplorerConfig::load_from(&missing).reveal_page_size, 50);

        let corrupt = tmp.path().join("config.json");
        std::fs::write(&corrupt, "not json").unwrap();
        assert_eq!(ExplorerConfig::load_from(&corrupt).reveal_page_size, 50);

        std::fs::write(&corrupt, r#"{"prefetchRadius": 1}"#).unwrap();
        assert_eq!(ExplorerConfig::load_from(&corrupt).prefetch_radius, 1);
    }
}
