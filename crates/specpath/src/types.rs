use crate::value::{OrderedMap, SpecValue};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Sidecar metadata stored next to each persisted specification as
/// `info.json`.
///
/// ```json
/// { "date": "2024-05-01T12:30:00+09:00" }
/// ```
///
/// A missing or unreadable sidecar becomes the default record, which
/// serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// Timestamp of the snapshot the file was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<FixedOffset>>,
}

impl Info {
    pub fn at(date: DateTime<FixedOffset>) -> Self {
        Self { date: Some(date) }
    }
}

/// An illustrative value for a schema, tagged with where it was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub description: String,
    /// `null` when the location only contributes a description.
    #[serde(default)]
    pub value: SpecValue,
    /// Provenance key, e.g. `components.schemas.User` or
    /// `components.paths./pets.POST.requestBody.application/json.Pet`.
    pub key: String,
}

/// Schema name → examples, in discovery order.
pub type SchemaExampleIndex = OrderedMap<Vec<Example>>;

// ============================================================================
// Corpus
// ============================================================================

/// The aggregated artifact written to `data/api-data.json`.
///
/// # JSON shape
///
/// ```json
/// {
///   "apis": [
///     {
///       "name": "Pet_Store",
///       "versions": [
///         {
///           "version": "1.0.0",
///           "info": { "date": "2024-01-01T00:00:00+00:00" },
///           "spec": { "openapi": "3.0.0", … },
///           "schemaExamples": {
///             "Pet": [ { "description": "a pet", "value": null, "key": "components.schemas.Pet" } ]
///           }
///         }
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub apis: Vec<ApiEntry>,
}

/// All versions of one API, sorted by version string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEntry {
    pub name: String,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,
    #[serde(default)]
    pub info: Info,
    pub spec: SpecValue,
    #[serde(default, rename = "schemaExamples")]
    pub schema_examples: SchemaExampleIndex,
}

impl Corpus {
    pub fn api(&self, name: &str) -> Option<&ApiEntry> {
        self.apis.iter().find(|a| a.name == name)
    }
}

impl ApiEntry {
    pub fn version(&self, version: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.version == version)
    }

    pub fn version_names(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.version.as_str()).collect()
    }
}
