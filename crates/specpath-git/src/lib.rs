#![doc = include_str!("../README.md")]

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use specpath::v1::{HistorySource, Snapshot, SnapshotFile};
use std::path::Path;

/// Git file mode for symbolic links; their blobs hold a target path, not content.
const SYMLINK_MODE: i32 = 0o120000;

// ============================================================================
// Repository
// ============================================================================

/// A git repository viewed as a sequence of snapshots.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open an existing repository (bare or with a working tree).
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)
            .with_context(|| format!("Failed to open repository at {}", path.display()))?;
        Ok(Self { repo })
    }

    /// Clone `url` into `dir` as a bare repository and open it.
    ///
    /// `dir` must not exist or be empty. The caller owns it; a temporary
    /// directory is the usual choice.
    pub fn clone_into(url: &str, dir: &Path) -> Result<Self> {
        tracing::info!(%url, dir = %dir.display(), "cloning repository");
        let repo = git2::build::RepoBuilder::new()
            .bare(true)
            .clone(url, dir)
            .with_context(|| format!("Failed to clone {}", url))?;
        Ok(Self { repo })
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Every commit reachable from `HEAD` or any reference, newest
    /// committer time first, each exactly once.
    pub fn commit_ids(&self) -> Result<Vec<Oid>> {
        let mut walker = self.repo.revwalk()?;
        // An unborn HEAD (empty repository) has nothing to push
        if self.repo.head().is_ok() {
            walker.push_head()?;
        }
        for reference in self.repo.references()? {
            let reference = reference?;
            // Refs to trees or blobs are not history
            if let Ok(commit) = reference.peel_to_commit() {
                walker.push(commit.id())?;
            }
        }
        walker.set_sorting(git2::Sort::TIME)?;

        let mut ids = Vec::new();
        for oid in walker {
            ids.push(oid?);
        }
        Ok(ids)
    }

    fn snapshot(&self, oid: Oid) -> Result<GitSnapshot<'_>> {
        let commit = self
            .repo
            .find_commit(oid)
            .with_context(|| format!("Failed to load commit {}", oid))?;
        let timestamp = commit_time(&commit)?;
        Ok(GitSnapshot {
            repo: &self.repo,
            commit,
            timestamp,
        })
    }
}

impl HistorySource for GitHistory {
    fn walk(
        &self,
        visit: &mut dyn FnMut(&dyn Snapshot) -> specpath::v1::Result<()>,
    ) -> specpath::v1::Result<()> {
        let ids = self.commit_ids()?;
        tracing::debug!(commits = ids.len(), "walking history");

        for oid in ids {
            let snapshot = self.snapshot(oid)?;
            visit(&snapshot)?;
        }
        Ok(())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// The full tree of one commit.
pub struct GitSnapshot<'r> {
    repo: &'r Repository,
    commit: Commit<'r>,
    timestamp: DateTime<FixedOffset>,
}

impl GitSnapshot<'_> {
    pub fn id(&self) -> Oid {
        self.commit.id()
    }

    fn list_files(&self) -> Result<Vec<SnapshotFile>> {
        let tree = self.commit.tree()?;
        let mut files = Vec::new();

        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() != Some(ObjectType::Blob) || entry.filemode() == SYMLINK_MODE {
                return TreeWalkResult::Ok;
            }
            // Non-UTF-8 names cannot be matched by extension anyway
            if let Some(name) = entry.name() {
                files.push(SnapshotFile {
                    path: format!("{}{}", root, name),
                    content_id: Some(entry.id().to_string()),
                });
            }
            TreeWalkResult::Ok
        })?;

        Ok(files)
    }

    fn read_blob(&self, path: &str) -> Result<Vec<u8>> {
        let tree = self.commit.tree()?;
        let entry = tree
            .get_path(Path::new(path))
            .with_context(|| format!("{} not found in commit {}", path, self.label()))?;
        let blob = self
            .repo
            .find_blob(entry.id())
            .with_context(|| format!("Failed to read {} in commit {}", path, self.label()))?;
        Ok(blob.content().to_vec())
    }
}

impl Snapshot for GitSnapshot<'_> {
    fn label(&self) -> String {
        short_oid(self.commit.id())
    }

    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    fn files(&self) -> specpath::v1::Result<Vec<SnapshotFile>> {
        Ok(self.list_files()?)
    }

    fn read(&self, path: &str) -> specpath::v1::Result<Vec<u8>> {
        Ok(self.read_blob(path)?)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Committer time in the committer's own offset.
fn commit_time(commit: &Commit) -> Result<DateTime<FixedOffset>> {
    let when = commit.committer().when();
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60)
        .with_context(|| format!("Commit {} has an invalid UTC offset", commit.id()))?;
    let utc = DateTime::from_timestamp(when.seconds(), 0)
        .with_context(|| format!("Commit {} has an out-of-range timestamp", commit.id()))?;
    Ok(utc.with_timezone(&offset))
}

fn short_oid(oid: Oid) -> String {
    safe_prefix(&oid.to_string(), 8)
}

/// Return the first `n` characters of a string, safe for any UTF-8 content.
fn safe_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
