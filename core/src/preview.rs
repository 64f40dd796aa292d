//! Preview navigator.
//!
//! Tracks the previewed entry within the current sorted sequence, moves to
//! neighbors, and decides which neighboring media to warm ahead of time.

use std::collections::HashSet;

use serde::Serialize;

use crate::entry::Entry;

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "wmv", "flv", "mkv"];
const TEXT_EXTENSIONS: &[&str] = &["txt"];

/// Media class of a file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    Video,
    Text,
    Other,
}

impl MediaKind {
    /// Classify `name` by its extension, case-insensitively.
    pub fn classify(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Self::Text
        } else {
            Self::Other
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

/// What the preview surface should show for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewContent {
    Image { url: String },
    /// Played from the server's compressed rendition.
    #[serde(rename_all = "camelCase")]
    Video { url: String, mime_type: String },
    /// Backed by a text edit session.
    Text,
    /// Unknown type: try rendering as an image first.
    #[serde(rename_all = "camelCase")]
    AttemptImage { url: String, external_url: String },
    /// The image attempt failed; offer to open externally.
    #[serde(rename_all = "camelCase")]
    Unsupported { external_url: String },
}

/// A neighbor to fetch speculatively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchRequest {
    pub index: usize,
    pub kind: MediaKind,
    pub url: String,
}

/// The URL a media entry is displayed from.
fn display_url(entry: &Entry, kind: MediaKind) -> String {
    match kind {
        MediaKind::Video => entry.compressed_url.clone(),
        _ => entry.resource_url.clone(),
    }
}

/// Navigation state for one preview surface.
#[derive(Debug, Clone)]
pub struct PreviewNavigator {
    current: Option<Entry>,
    image_failed: bool,
    warmed: HashSet<usize>,
    radius: usize,
}

impl PreviewNavigator {
    pub fn new(radius: usize) -> Self {
        Self {
            current: None,
            image_failed: false,
            warmed: HashSet::new(),
            radius,
        }
    }

    pub fn current(&self) -> Option<&Entry> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn open(&mut self, entry: Entry) {
        self.current = Some(entry);
        self.image_failed = false;
    }

    pub fn close(&mut self) {
        self.current = None;
        self.image_failed = false;
    }

    /// Position of the previewed entry in `sequence`, matched by resource URL.
    ///
    /// `None` when nothing is previewed or the entry is no longer listed.
    pub fn current_index(&self, sequence: &[Entry]) -> Option<usize> {
        let current = self.current.as_ref()?;
        sequence
            .iter()
            .position(|e| e.resource_url == current.resource_url)
    }

    pub fn can_previous(&self, sequence: &[Entry]) -> bool {
        self.current_index(sequence).is_some_and(|i| i > 0)
    }

    pub fn can_next(&self, sequence: &[Entry]) -> bool {
        self.current_index(sequence)
            .is_some_and(|i| i + 1 < sequence.len())
    }

    /// Move to the next entry. Returns `false` (no-op) at the end or when
    /// the current entry is not in `sequence`.
    pub fn next(&mut self, sequence: &[Entry]) -> bool {
        match self.current_index(sequence) {
            Some(i) if i + 1 < sequence.len() => {
                self.open(sequence[i + 1].clone());
                true
            }
            _ => false,
        }
    }

    /// Move to the previous entry. Returns `false` (no-op) at index 0 or
    /// when the current entry is not in `sequence`.
    pub fn previous(&mut self, sequence: &[Entry]) -> bool {
        match self.current_index(sequence) {
            Some(i) if i > 0 => {
                self.open(sequence[i - 1].clone());
                true
            }
            _ => false,
        }
    }

    /// Record that rendering the current entry as an image failed.
    pub fn mark_image_failed(&mut self) {
        self.image_failed = true;
    }

    /// How to render the current entry.
    pub fn content(&self) -> Option<PreviewContent> {
        let entry = self.current.as_ref()?;
        let kind = MediaKind::classify(&entry.name);
        Some(match kind {
            MediaKind::Image => PreviewContent::Image {
                url: display_url(entry, kind),
            },
            MediaKind::Video => PreviewContent::Video {
                url: display_url(entry, kind),
                mime_type: format!(
                    "video/{}",
                    entry.name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase()
                ),
            },
            MediaKind::Text => PreviewContent::Text,
            MediaKind::Other if self.image_failed => PreviewContent::Unsupported {
                external_url: entry.download_url().to_string(),
            },
            MediaKind::Other => PreviewContent::AttemptImage {
                url: entry.resource_url.clone(),
                external_url: entry.download_url().to_string(),
            },
        })
    }

    /// Neighbors of the current entry (up to `radius` each side) that are
    /// image or video and not yet warmed. Returned indices are marked warm.
    pub fn prefetch(&mut self, sequence: &[Entry]) -> Vec<PrefetchRequest> {
        let Some(current) = self.current_index(sequence) else {
            return Vec::new();
        };

        let mut requests = Vec::new();
        for step in 1..=self.radius {
            let candidates = [current.checked_sub(step), Some(current + step)];
            for index in candidates.into_iter().flatten() {
                if index >= sequence.len() || self.warmed.contains(&index) {
                    continue;
                }
                let entry = &sequence[index];
                let kind = MediaKind::classify(&entry.name);
                if !kind.is_media() {
                    continue;
                }
                self.warmed.insert(index);
                requests.push(PrefetchRequest {
                    index,
                    kind,
                    url: display_url(entry, kind),
                });
            }
        }
        requests
    }

    /// Forget warmed indices; call whenever the sorted sequence changes.
    pub fn reset_warmed(&mut self) {
        self.warmed.clear();
    }

    pub fn warmed_count(&self) -> usize {
        self.warmed.len()
    }
}
