use crate::classify::{Classification, SkipReason};
use crate::collect::INFO_FILE;
use crate::error::{CorpusError, Result};
use crate::sniff::ParsedSpec;
use crate::types::Info;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A specification found in a layout directory.
///
/// `api` and `version` come from the two directories directly above the
/// file, not from the document's own `info` block.
#[derive(Debug, Clone)]
pub struct LayoutDocument {
    pub api: String,
    pub version: String,
    pub path: PathBuf,
    pub info: Info,
    pub spec: ParsedSpec,
}

#[derive(Debug, Default)]
pub struct ReadOutcome {
    /// Documents in walk order (file names sorted at each level).
    pub documents: Vec<LayoutDocument>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

/// `(api, version)` for a file at `root/.../<api>/<version>/<file>`, or
/// `None` if fewer than two directories separate it from `root`.
pub fn layout_position(root: &Path, path: &Path) -> Option<(String, String)> {
    let rel = path.strip_prefix(root).ok()?;
    let dirs: Vec<String> = rel
        .parent()?
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    match dirs.as_slice() {
        [.., api, version] => Some((api.clone(), version.clone())),
        _ => None,
    }
}

/// Read every specification under `root`.
///
/// Files that do not parse, sidecars, and files too shallow to name an
/// API and version are skipped and listed in the outcome. A missing root,
/// an unreadable file or directory is fatal.
pub fn read_layout(root: &Path) -> Result<ReadOutcome> {
    let mut outcome = ReadOutcome::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| CorpusError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        match classify_layout_file(root, path)? {
            Classification::Accepted(doc) => {
                tracing::info!(api = %doc.api, version = %doc.version, path = %path.display(), "read specification");
                outcome.documents.push(doc);
            }
            Classification::Skipped(reason) => {
                if reason != SkipReason::Sidecar {
                    tracing::debug!(path = %path.display(), %reason, "skipped");
                }
                outcome.skipped.push((path.to_path_buf(), reason));
            }
        }
    }

    Ok(outcome)
}

fn classify_layout_file(root: &Path, path: &Path) -> Result<Classification<LayoutDocument>> {
    if path.file_name().is_some_and(|name| name == INFO_FILE) {
        return Ok(Classification::Skipped(SkipReason::Sidecar));
    }

    let Some((api, version)) = layout_position(root, path) else {
        return Ok(Classification::Skipped(SkipReason::NoLayoutPosition));
    };

    let bytes = std::fs::read(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let spec = match ParsedSpec::parse(&bytes) {
        Ok(spec) => spec,
        Err(e) => return Ok(Classification::Skipped(SkipReason::Unparseable(e))),
    };

    let info = match path.parent() {
        Some(dir) => read_info(&dir.join(INFO_FILE))?,
        None => Info::default(),
    };

    Ok(Classification::Accepted(LayoutDocument {
        api,
        version,
        path: path.to_path_buf(),
        info,
        spec,
    }))
}

/// Decode a sidecar. Missing or malformed sidecars give the default record.
pub fn read_info(path: &Path) -> Result<Info> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Info::default()),
        Err(source) => {
            return Err(CorpusError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(info) => Ok(info),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed metadata");
            Ok(Info::default())
        }
    }
}
