use crate::classify::{Classification, SkipReason};
use crate::openapi::{OpenApi, scalar_text};
use crate::value::SpecValue;

/// File name suffixes that may hold a specification document.
pub const CANDIDATE_EXTENSIONS: &[&str] = &[".yaml", ".yml", ".json"];

/// Whether a path's extension suggests a specification document.
pub fn is_candidate(path: &str) -> bool {
    CANDIDATE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Turn a free-text name into a single path segment.
///
/// Spaces become underscores; path separators and the other characters
/// that are unsafe in file names become hyphens. Idempotent.
///
/// # Examples
///
/// ```
/// use specpath::v1::sanitize_path_segment;
///
/// assert_eq!(sanitize_path_segment("Pet Store/v2"), "Pet_Store-v2");
/// assert_eq!(sanitize_path_segment("Pet_Store-v2"), "Pet_Store-v2");
/// ```
pub fn sanitize_path_segment(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            other => other,
        })
        .collect()
}

/// A decoded specification: the raw tree (for output) alongside the typed
/// view (for navigation). Never mutated after parse.
#[derive(Debug, Clone)]
pub struct ParsedSpec {
    tree: SpecValue,
    document: OpenApi,
    title: String,
    version: String,
}

impl ParsedSpec {
    /// Decode JSON or YAML bytes. The error string is only diagnostic.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        // JSON first: it is a YAML subset in theory, but serde_yaml is
        // stricter about some JSON whitespace than serde_json is.
        let raw: serde_yaml::Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(_) => serde_yaml::from_slice(bytes).map_err(|e| e.to_string())?,
        };

        if !raw.is_mapping() {
            return Err("top level is not a mapping".to_string());
        }

        // Identity comes from the raw tree so that nothing the typed view
        // drops can hide a title or version.
        let info = |field: &str| raw.get("info").and_then(|i| i.get(field)).map(scalar_text);
        let title = info("title").unwrap_or_default();
        let version = info("version").unwrap_or_default();

        let document: OpenApi = serde_yaml::from_value(raw.clone()).map_err(|e| e.to_string())?;

        Ok(ParsedSpec {
            tree: SpecValue::from(raw),
            document,
            title,
            version,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tree(&self) -> &SpecValue {
        &self.tree
    }

    pub fn document(&self) -> &OpenApi {
        &self.document
    }

    pub fn into_tree(self) -> SpecValue {
        self.tree
    }
}

/// A specification that passed the sniff, with its declared identity.
#[derive(Debug, Clone)]
pub struct Sniffed {
    pub spec: ParsedSpec,
    pub title: String,
    pub version: String,
}

/// Try to read `bytes` as a specification with a non-empty title and
/// version. Most files in a history are not specifications, so failure is
/// a skip, not an error.
pub fn sniff(bytes: &[u8]) -> Classification<Sniffed> {
    let spec = match ParsedSpec::parse(bytes) {
        Ok(spec) => spec,
        Err(e) => return Classification::Skipped(SkipReason::Unparseable(e)),
    };

    if spec.title().is_empty() {
        return Classification::Skipped(SkipReason::MissingTitle);
    }
    if spec.version().is_empty() {
        return Classification::Skipped(SkipReason::MissingVersion);
    }

    Classification::Accepted(Sniffed {
        title: spec.title().to_string(),
        version: spec.version().to_string(),
        spec,
    })
}
