use crate::error::{CorpusError, Result};
use crate::examples::extract_examples;
use crate::reader::{LayoutDocument, read_layout};
use crate::sniff::ParsedSpec;
use crate::types::{ApiEntry, Corpus, Info, SchemaExampleIndex, VersionEntry};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory under the output root that holds the corpus artifact.
pub const DATA_DIR: &str = "data";

/// File name of the corpus artifact.
pub const CORPUS_FILE: &str = "api-data.json";

/// One version of one API, ready to aggregate.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    pub api: String,
    pub version: String,
    pub info: Info,
    pub spec: ParsedSpec,
    pub examples: SchemaExampleIndex,
}

impl CorpusDocument {
    /// Attach the example index to a document read from a layout.
    pub fn from_layout(doc: LayoutDocument) -> Self {
        let examples = extract_examples(doc.spec.document());
        Self {
            api: doc.api,
            version: doc.version,
            info: doc.info,
            spec: doc.spec,
            examples,
        }
    }
}

/// Group documents by API name.
///
/// APIs are ordered by name and each API's versions by the raw version
/// string, both by code point. `"10.0"` sorts before `"2.0"`. The result
/// does not depend on input order, except that documents with identical
/// name and version keep their relative order.
pub fn aggregate(documents: Vec<CorpusDocument>) -> Corpus {
    let mut grouped: BTreeMap<String, Vec<VersionEntry>> = BTreeMap::new();

    for doc in documents {
        grouped.entry(doc.api).or_default().push(VersionEntry {
            version: doc.version,
            info: doc.info,
            spec: doc.spec.into_tree(),
            schema_examples: doc.examples,
        });
    }

    let apis = grouped
        .into_iter()
        .map(|(name, mut versions)| {
            versions.sort_by(|a, b| a.version.cmp(&b.version));
            ApiEntry { name, versions }
        })
        .collect();

    Corpus { apis }
}

/// Read a layout directory and aggregate everything in it.
pub fn build_corpus(root: &Path) -> Result<Corpus> {
    let outcome = read_layout(root)?;
    tracing::info!(
        root = %root.display(),
        documents = outcome.documents.len(),
        skipped = outcome.skipped.len(),
        "read layout"
    );
    let documents = outcome
        .documents
        .into_iter()
        .map(CorpusDocument::from_layout)
        .collect();
    Ok(aggregate(documents))
}

/// Where [`write_corpus`] puts the artifact for a given output root.
pub fn corpus_path(output_dir: &Path) -> PathBuf {
    output_dir.join(DATA_DIR).join(CORPUS_FILE)
}

/// Serialize `corpus` to `<output_dir>/data/api-data.json`.
///
/// The bytes go to a temporary file in the same directory, which is then
/// renamed over the target, so a reader sees either the old artifact or
/// the complete new one.
pub fn write_corpus(corpus: &Corpus, output_dir: &Path, pretty: bool) -> Result<PathBuf> {
    let data_dir = output_dir.join(DATA_DIR);
    std::fs::create_dir_all(&data_dir).map_err(|source| CorpusError::CreateDir {
        path: data_dir.clone(),
        source,
    })?;

    let bytes = if pretty {
        serde_json::to_vec_pretty(corpus)?
    } else {
        serde_json::to_vec(corpus)?
    };

    let target = data_dir.join(CORPUS_FILE);
    let write_err = |source| CorpusError::Write {
        path: target.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&data_dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    Ok(target)
}

/// Load a corpus written by [`write_corpus`].
pub fn read_corpus(path: &Path) -> Result<Corpus> {
    let bytes = std::fs::read(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
