use crate::classify::{Classification, SkipReason};
use crate::error::{CorpusError, Result};
use crate::history::{HistorySource, Snapshot, SnapshotFile};
use crate::sniff::{Sniffed, is_candidate, sanitize_path_segment, sniff};
use crate::types::Info;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Name of the metadata sidecar written next to each specification.
pub const INFO_FILE: &str = "info.json";

/// Versions kept per API when nothing else is configured.
pub const DEFAULT_MAX_VERSIONS: usize = 5;

/// Settings for one collection run.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Upper bound on distinct versions accepted per API.
    pub max_versions: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            max_versions: DEFAULT_MAX_VERSIONS,
        }
    }
}

/// Identity used for dedup: sanitized API name plus the raw version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey {
    pub api: String,
    pub version: String,
}

/// What a run has accepted so far.
///
/// Created empty, threaded through [`collect`], handed back in the
/// [`CollectOutcome`]. Nothing outside the run sees it.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    versions: HashMap<String, Vec<String>>,
    seen_content: HashSet<String>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions accepted for `api` (sanitized name), in acceptance order.
    pub fn versions(&self, api: &str) -> &[String] {
        self.versions.get(api).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sanitized names of every API with at least one accepted version.
    pub fn apis(&self) -> Vec<&str> {
        let mut apis: Vec<&str> = self.versions.keys().map(String::as_str).collect();
        apis.sort_unstable();
        apis
    }

    pub fn total_versions(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }

    /// Apply the cap and dedup policy to a declared title/version pair,
    /// recording the version if it is accepted.
    pub fn admit(
        &mut self,
        title: &str,
        version: &str,
        config: &CollectConfig,
    ) -> Classification<VersionKey> {
        let api = sanitize_path_segment(title);
        let accepted = self.versions(&api);

        if accepted.len() >= config.max_versions {
            return Classification::Skipped(SkipReason::CapReached { api });
        }
        if accepted.iter().any(|v| v == version) {
            return Classification::Skipped(SkipReason::DuplicateVersion {
                api,
                version: version.to_string(),
            });
        }

        self.versions
            .entry(api.clone())
            .or_default()
            .push(version.to_string());
        Classification::Accepted(VersionKey {
            api,
            version: version.to_string(),
        })
    }

    /// Another accepted version of `api` whose directory name is the same as
    /// `version`'s once sanitized (`1.0/beta` and `1.0-beta`).
    pub fn directory_owner(&self, api: &str, version: &str) -> Option<&str> {
        let dir = sanitize_path_segment(version);
        self.versions(api)
            .iter()
            .find(|v| *v != version && sanitize_path_segment(v) == dir)
            .map(String::as_str)
    }

    /// Record a content id. Returns `false` if it was already recorded.
    fn mark_seen(&mut self, content_id: &str) -> bool {
        self.seen_content.insert(content_id.to_string())
    }
}

/// A sniffed specification that passed the cap and dedup policy.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub key: VersionKey,
    pub sniffed: Sniffed,
    /// An earlier accepted version that writes to the same directory.
    pub shares_directory_with: Option<String>,
}

/// Sniff `bytes` and run the result through the policy. No I/O.
pub fn classify(
    state: &mut CollectionState,
    config: &CollectConfig,
    bytes: &[u8],
) -> Classification<Admitted> {
    let sniffed = match sniff(bytes) {
        Classification::Accepted(s) => s,
        Classification::Skipped(reason) => return Classification::Skipped(reason),
    };

    match state.admit(&sniffed.title, &sniffed.version, config) {
        Classification::Accepted(key) => {
            let shares_directory_with = state
                .directory_owner(&key.api, &key.version)
                .map(str::to_string);
            Classification::Accepted(Admitted {
                key,
                sniffed,
                shares_directory_with,
            })
        }
        Classification::Skipped(reason) => Classification::Skipped(reason),
    }
}

/// A specification written to the layout directory.
#[derive(Debug, Clone)]
pub struct PersistedVersion {
    /// Sanitized API name (the first directory level).
    pub api: String,
    /// Raw declared version.
    pub version: String,
    /// Declared title, before sanitizing.
    pub title: String,
    /// Label of the snapshot it came from.
    pub snapshot: String,
    /// Path of the file inside the snapshot.
    pub source_path: String,
    /// Written specification file.
    pub file: PathBuf,
    pub info: Info,
    /// Earlier accepted version whose files this one replaced on disk.
    pub shares_directory_with: Option<String>,
}

/// Tally of skip reasons, keyed by [`SkipReason::label`].
#[derive(Debug, Clone, Default)]
pub struct SkipCounts(BTreeMap<&'static str, usize>);

impl SkipCounts {
    pub fn record(&mut self, reason: &SkipReason) {
        *self.0.entry(reason.label()).or_default() += 1;
    }

    pub fn get(&self, label: &str) -> usize {
        self.0.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Result of a complete run.
#[derive(Debug)]
pub struct CollectOutcome {
    pub state: CollectionState,
    pub accepted: Vec<PersistedVersion>,
    pub skipped: SkipCounts,
}

/// Walk `history` and persist the first `config.max_versions` distinct
/// versions of each API under `output/<api>/<version>/`.
///
/// Sniff and policy rejections are silent (logged at debug). Any I/O
/// failure aborts the run; whatever was written before stays on disk.
pub fn collect<H: HistorySource + ?Sized>(
    history: &H,
    output: &Path,
    config: &CollectConfig,
    state: CollectionState,
) -> Result<CollectOutcome> {
    create_dir(output)?;

    let mut state = state;
    let mut accepted = Vec::new();
    let mut skipped = SkipCounts::default();

    history.walk(&mut |snapshot: &dyn Snapshot| {
        for file in snapshot.files()? {
            match collect_file(&mut state, config, output, snapshot, &file)? {
                Classification::Accepted(persisted) => {
                    tracing::info!(
                        api = %persisted.api,
                        version = %persisted.version,
                        snapshot = %persisted.snapshot,
                        path = %persisted.source_path,
                        "collected specification"
                    );
                    accepted.push(persisted);
                }
                Classification::Skipped(reason) => {
                    if reason != SkipReason::NotCandidate {
                        tracing::debug!(path = %file.path, %reason, "skipped");
                    }
                    skipped.record(&reason);
                }
            }
        }
        Ok(())
    })?;

    Ok(CollectOutcome {
        state,
        accepted,
        skipped,
    })
}

fn collect_file(
    state: &mut CollectionState,
    config: &CollectConfig,
    output: &Path,
    snapshot: &dyn Snapshot,
    file: &SnapshotFile,
) -> Result<Classification<PersistedVersion>> {
    if !is_candidate(&file.path) {
        return Ok(Classification::Skipped(SkipReason::NotCandidate));
    }

    // A content id classified earlier in the run gets the same answer
    // again (or a duplicate), so skip reading it.
    if let Some(id) = &file.content_id
        && !state.mark_seen(id)
    {
        return Ok(Classification::Skipped(SkipReason::AlreadySeen));
    }

    let bytes = snapshot.read(&file.path)?;

    if file_name(&file.path) == INFO_FILE {
        if let Classification::Skipped(reason) = sniff(&bytes) {
            return Ok(Classification::Skipped(reason));
        }
        tracing::warn!(
            path = %file.path,
            snapshot = %snapshot.label(),
            "specification named {} would be replaced by its sidecar; skipped",
            INFO_FILE
        );
        return Ok(Classification::Skipped(SkipReason::ReservedName));
    }

    let admitted = match classify(state, config, &bytes) {
        Classification::Accepted(a) => a,
        Classification::Skipped(reason) => return Ok(Classification::Skipped(reason)),
    };

    let persisted = persist(output, &admitted, snapshot, &file.path, &bytes)?;
    Ok(Classification::Accepted(persisted))
}

/// Write the specification bytes and an `info.json` sidecar carrying the
/// snapshot's timestamp.
pub fn persist(
    output: &Path,
    admitted: &Admitted,
    snapshot: &dyn Snapshot,
    source_path: &str,
    bytes: &[u8],
) -> Result<PersistedVersion> {
    let dir = output
        .join(&admitted.key.api)
        .join(sanitize_path_segment(&admitted.key.version));
    create_dir(&dir)?;

    if let Some(earlier) = &admitted.shares_directory_with {
        tracing::warn!(
            api = %admitted.key.api,
            version = %admitted.key.version,
            %earlier,
            dir = %dir.display(),
            "versions share a directory; files are replaced"
        );
    }

    let file = dir.join(file_name(source_path));
    write_file(&file, bytes)?;

    let info = Info::at(snapshot.timestamp());
    write_file(&dir.join(INFO_FILE), &serde_json::to_vec(&info)?)?;

    Ok(PersistedVersion {
        api: admitted.key.api.clone(),
        version: admitted.key.version.clone(),
        title: admitted.sniffed.title.clone(),
        snapshot: snapshot.label(),
        source_path: source_path.to_string(),
        file,
        info,
        shares_directory_with: admitted.shares_directory_with.clone(),
    })
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| CorpusError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|source| CorpusError::Write {
        path: path.to_path_buf(),
        source,
    })
}
