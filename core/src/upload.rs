//! Pending upload batch and its progress.

use std::path::PathBuf;

use serde::Serialize;

/// Where an upload's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// A local file read when its turn in the batch comes.
    Path(PathBuf),
    /// Contents already in memory.
    Bytes(Vec<u8>),
}

/// One local file queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub source: UploadSource,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            source: UploadSource::Bytes(data.into()),
        }
    }

    /// Queue a local path; the remote name is the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_string_lossy().to_string();
        Some(Self {
            name,
            source: UploadSource::Path(path),
        })
    }

    /// Read the binary content.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            UploadSource::Path(path) => tokio::fs::read(path).await,
            UploadSource::Bytes(data) => Ok(data.clone()),
        }
    }
}

/// Upload progress after a file settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub completed: usize,
    pub total: usize,
}

impl UploadProgress {
    /// `completed / total * 100`, rounded to the nearest integer.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Files queued for the next upload.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    files: Vec<UploadFile>,
    progress: u8,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append files (file picker or drag-and-drop).
    pub fn add_files(&mut self, files: impl IntoIterator<Item = UploadFile>) {
        self.files.extend(files);
    }

    /// Drop the file at `index`; out-of-range indices are ignored.
    pub fn remove_file(&mut self, index: usize) -> Option<UploadFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Last reported progress, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub(crate) fn set_progress(&mut self, progress: UploadProgress) {
        self.progress = progress.percent();
    }

    /// Empty the batch and reset progress (the upload surface closes).
    pub fn clear(&mut self) {
        self.files.clear();
        self.progress = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_nearest() {
        let p = |completed, total| UploadProgress { completed, total }.percent();
        assert_eq!(p(0, 3), 0);
        assert_eq!(p(1, 3), 33);
        assert_eq!(p(2, 3), 67);
        assert_eq!(p(3, 3), 100);
        assert_eq!(p(0, 0), 0);
    }

    #[test]
    fn batch_add_and_remove() {
        let mut batch = UploadBatch::new();
        batch.add_files([
            UploadFile::from_bytes("a.txt", "a"),
            UploadFile::from_bytes("b.txt", "b"),
            UploadFile::from_bytes("c.txt", "c"),
        ]);
        assert_eq!(batch.len(), 3);

        let removed = batch.remove_file(1).unwrap();
        assert_eq!(removed.name, "b.txt");
        assert!(batch.remove_file(5).is_none());

        let names: Vec<&str> = batch.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.progress(), 0);
    }

    #[test]
    fn from_path_uses_file_name() {
        let file = UploadFile::from_path("/home/me/photos/cat.jpg").unwrap();
        assert_eq!(file.name, "cat.jpg");
        assert!(UploadFile::from_path("/").is_none());
    }

    #[tokio::test]
    async fn read_from_path_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let file = UploadFile::from_path(&path).unwrap();
        assert_eq!(file.read().await.unwrap(), vec![1, 2, 3]);

        let missing = UploadFile::from_path(dir.path().join("nope")).unwrap();
        assert!(missing.read().await.is_err());

        let inline = UploadFile::from_bytes("x", vec![9u8]);
        assert_eq!(inline.read().await.unwrap(), vec![9]);
    }
}
