use crate::error::{CorpusError, Result};
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

/// One file listed in a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Path inside the tree, `/`-separated.
    pub path: String,
    /// Stable identifier for the file's bytes (a git blob id), if the
    /// source has one. Equal ids promise equal content.
    pub content_id: Option<String>,
}

/// A historical state of a file tree.
pub trait Snapshot {
    /// Short human-readable identifier (e.g. an abbreviated commit id).
    fn label(&self) -> String;

    /// When this state was recorded.
    fn timestamp(&self) -> DateTime<FixedOffset>;

    /// Every file in the tree, in the source's listing order.
    fn files(&self) -> Result<Vec<SnapshotFile>>;

    /// Content of one file listed by [`Snapshot::files`].
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// An ordered sequence of snapshots.
///
/// The order is the source's contract; the collector keeps the first N
/// distinct versions it is shown.
pub trait HistorySource {
    /// Call `visit` for each snapshot in order. An error from `visit` stops
    /// the walk and is returned unchanged.
    fn walk(&self, visit: &mut dyn FnMut(&dyn Snapshot) -> Result<()>) -> Result<()>;
}

// ============================================================================
// In-memory source
// ============================================================================

#[derive(Debug, Clone)]
struct MemoryFile {
    path: String,
    content_id: Option<String>,
    content: Vec<u8>,
}

/// A snapshot held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    label: String,
    timestamp: DateTime<FixedOffset>,
    files: Vec<MemoryFile>,
}

impl MemorySnapshot {
    pub fn new(label: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            label: label.into(),
            timestamp,
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.push(MemoryFile {
            path: path.into(),
            content_id: None,
            content: content.into(),
        });
        self
    }

    /// Add a file that carries a content id.
    pub fn with_identified_file(
        mut self,
        path: impl Into<String>,
        content_id: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.files.push(MemoryFile {
            path: path.into(),
            content_id: Some(content_id.into()),
            content: content.into(),
        });
        self
    }
}

impl Snapshot for MemorySnapshot {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    fn files(&self) -> Result<Vec<SnapshotFile>> {
        Ok(self
            .files
            .iter()
            .map(|f| SnapshotFile {
                path: f.path.clone(),
                content_id: f.content_id.clone(),
            })
            .collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.content.clone())
            .ok_or_else(|| CorpusError::Read {
                path: PathBuf::from(path),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no file in snapshot {}", self.label),
                ),
            })
    }
}

/// Snapshots replayed in the order they were pushed.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    snapshots: Vec<MemorySnapshot>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: MemorySnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn with_snapshot(mut self, snapshot: MemorySnapshot) -> Self {
        self.push(snapshot);
        self
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl HistorySource for MemoryHistory {
    fn walk(&self, visit: &mut dyn FnMut(&dyn Snapshot) -> Result<()>) -> Result<()> {
        for snapshot in &self.snapshots {
            visit(snapshot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_memory_snapshot_lists_and_reads() {
        let snap = MemorySnapshot::new("c1", ts("2024-01-01T00:00:00Z"))
            .with_file("a.yaml", "a: 1")
            .with_identified_file("dir/b.json", "blob-b", "{}");

        let files = snap.files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "a.yaml");
        assert!(files[0].content_id.is_none());
        assert_eq!(files[1].content_id.as_deref(), Some("blob-b"));
        assert_eq!(snap.read("dir/b.json").unwrap(), b"{}");
    }

    #[test]
    fn test_memory_snapshot_missing_file_is_read_error() {
        let snap = MemorySnapshot::new("c1", ts("2024-01-01T00:00:00Z"));
        let err = snap.read("nope.yaml").unwrap_err();
        assert!(matches!(err, CorpusError::Read { .. }));
    }

    #[test]
    fn test_memory_history_walks_in_push_order() {
        let history = MemoryHistory::new()
            .with_snapshot(MemorySnapshot::new("new", ts("2024-02-01T00:00:00Z")))
            .with_snapshot(MemorySnapshot::new("old", ts("2024-01-01T00:00:00Z")));

        let mut labels = Vec::new();
        history
            .walk(&mut |s: &dyn Snapshot| {
                labels.push(s.label());
                Ok(())
            })
            .unwrap();
        assert_eq!(labels, vec!["new", "old"]);
    }

    #[test]
    fn test_memory_history_visit_error_stops_walk() {
        let history = MemoryHistory::new()
            .with_snapshot(MemorySnapshot::new("a", ts("2024-02-01T00:00:00Z")))
            .with_snapshot(MemorySnapshot::new("b", ts("2024-01-01T00:00:00Z")));

        let mut visited = 0;
        let result = history.walk(&mut |_s: &dyn Snapshot| {
            visited += 1;
            Err(CorpusError::History(anyhow::anyhow!("stop")))
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }
}
