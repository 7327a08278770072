//! The slice of the OpenAPI document model that the example extractor
//! navigates. Everything else in a document is ignored on decode and kept
//! only in the raw [`SpecValue`] tree.
//!
//! Decoding is lenient below the top level: `x-` extension keys are
//! skipped, an entry that does not fit the model is dropped on its own
//! instead of failing the document, and a boolean schema (3.1) reads as an
//! empty one.

use crate::value::{OrderedMap, SpecValue, yaml_key_to_string};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use tracing::debug;

pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";
const RESPONSE_REF_PREFIX: &str = "#/components/responses/";
const EXAMPLE_REF_PREFIX: &str = "#/components/examples/";
const EXTENSION_PREFIX: &str = "x-";

/// Top-level document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApi {
    #[serde(default, deserialize_with = "lenient_option")]
    pub info: Option<Info>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub paths: OrderedMap<PathItem>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub components: Option<Components>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub title: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default, deserialize_with = "lenient_map")]
    pub schemas: OrderedMap<Schema>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub parameters: OrderedMap<Parameter>,
    #[serde(default, rename = "requestBodies", deserialize_with = "lenient_map")]
    pub request_bodies: OrderedMap<RequestBody>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub responses: OrderedMap<Response>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub examples: OrderedMap<ExampleObject>,
}

/// The operations of one path, in the order they are visited.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    #[serde(default, deserialize_with = "lenient_option")]
    pub get: Option<Operation>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub post: Option<Operation>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub put: Option<Operation>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub delete: Option<Operation>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub patch: Option<Operation>,
}

impl PathItem {
    /// `(METHOD, operation)` pairs for the methods present: GET, POST, PUT,
    /// DELETE, PATCH.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("GET", &self.get),
            ("POST", &self.post),
            ("PUT", &self.put),
            ("DELETE", &self.delete),
            ("PATCH", &self.patch),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub parameters: Vec<RefOr<Parameter>>,
    #[serde(default, rename = "requestBody", deserialize_with = "lenient_option")]
    pub request_body: Option<RefOr<RequestBody>>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub responses: OrderedMap<RefOr<Response>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Parameter {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub name: String,
    #[serde(default, rename = "in", deserialize_with = "scalar_as_string")]
    pub location: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_option")]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub example: Option<SpecValue>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub examples: OrderedMap<RefOr<ExampleObject>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_map")]
    pub content: OrderedMap<MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_map")]
    pub content: OrderedMap<MediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    #[serde(default, deserialize_with = "lenient_option")]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub example: Option<SpecValue>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub examples: OrderedMap<RefOr<ExampleObject>>,
}

/// A schema, reduced to what the index needs: its `$ref` (if it is a
/// pointer) and its own illustrative fields.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub reference: Option<String>,
    pub description: String,
    pub example: Option<SpecValue>,
}

impl Schema {
    /// The component schema this schema points at, if it is a
    /// `#/components/schemas/<Name>` reference.
    pub fn schema_name(&self) -> Option<&str> {
        self.reference.as_deref().and_then(schema_name_from_ref)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct SchemaObject {
            #[serde(default, rename = "$ref", deserialize_with = "lenient_option")]
            reference: Option<String>,
            #[serde(default, deserialize_with = "scalar_as_string")]
            description: String,
            #[serde(default)]
            example: Option<SpecValue>,
        }

        match serde_yaml::Value::deserialize(deserializer)? {
            // `true` accepts anything, `false` nothing; neither carries examples
            serde_yaml::Value::Bool(_) => Ok(Schema::default()),
            value => {
                let object: SchemaObject =
                    serde_yaml::from_value(value).map_err(de::Error::custom)?;
                Ok(Schema {
                    reference: object.reference,
                    description: object.description,
                    example: object.example,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExampleObject {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub description: String,
    #[serde(default)]
    pub value: Option<SpecValue>,
}

// ============================================================================
// Lenient field decoding
// ============================================================================

/// The text of a scalar: strings as-is, numbers and booleans in their YAML
/// spelling (`version: 1.0` reads as `"1.0"`). Null, sequences and
/// mappings have no text and read as empty.
pub(crate) fn scalar_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => String::new(),
    }
}

fn scalar_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text(&serde_yaml::Value::deserialize(deserializer)?))
}

/// A field that does not decode is treated as absent.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_yaml::from_value(value)
        .map_err(|e| debug!(error = %e, "ignoring malformed field"))
        .ok())
}

/// Keeps the mapping entries that decode; skips `x-` extensions and the rest.
/// Anything other than a mapping reads as empty.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<OrderedMap<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_yaml::Value::Mapping(mapping) = serde_yaml::Value::deserialize(deserializer)? else {
        return Ok(OrderedMap::new());
    };

    let mut map = OrderedMap::new();
    for (key, value) in mapping {
        let key = yaml_key_to_string(key);
        if key.starts_with(EXTENSION_PREFIX) {
            continue;
        }
        match serde_yaml::from_value(value) {
            Ok(item) => {
                map.insert(key, item);
            }
            Err(e) => debug!(%key, error = %e, "ignoring malformed entry"),
        }
    }
    Ok(map)
}

/// Keeps the sequence items that decode. Anything other than a sequence
/// reads as empty.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let serde_yaml::Value::Sequence(items) = serde_yaml::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| {
            serde_yaml::from_value(item)
                .map_err(|e| debug!(error = %e, "ignoring malformed item"))
                .ok()
        })
        .collect())
}

/// Pointer to a reusable component.
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// Either a `$ref` or the object inline.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Ref(Reference),
    Item(T),
}

impl<T> RefOr<T> {
    fn resolve_in<'a>(&'a self, section: Option<&'a OrderedMap<T>>, prefix: &str) -> Option<&'a T> {
        match self {
            RefOr::Item(item) => Some(item),
            RefOr::Ref(r) => {
                let name = r.reference.strip_prefix(prefix)?;
                section?.get(name)
            }
        }
    }
}

/// Extract `User` from `#/components/schemas/User`. Any other reference
/// shape has no schema name.
pub fn schema_name_from_ref(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(SCHEMA_REF_PREFIX)
        .filter(|name| !name.is_empty())
}

impl OpenApi {
    pub fn title(&self) -> &str {
        self.info.as_ref().map(|i| i.title.as_str()).unwrap_or("")
    }

    pub fn version(&self) -> &str {
        self.info.as_ref().map(|i| i.version.as_str()).unwrap_or("")
    }

    pub fn resolve_parameter<'a>(&'a self, p: &'a RefOr<Parameter>) -> Option<&'a Parameter> {
        p.resolve_in(
            self.components.as_ref().map(|c| &c.parameters),
            PARAMETER_REF_PREFIX,
        )
    }

    pub fn resolve_request_body<'a>(
        &'a self,
        body: &'a RefOr<RequestBody>,
    ) -> Option<&'a RequestBody> {
        body.resolve_in(
            self.components.as_ref().map(|c| &c.request_bodies),
            REQUEST_BODY_REF_PREFIX,
        )
    }

    pub fn resolve_response<'a>(&'a self, r: &'a RefOr<Response>) -> Option<&'a Response> {
        r.resolve_in(
            self.components.as_ref().map(|c| &c.responses),
            RESPONSE_REF_PREFIX,
        )
    }

    pub fn resolve_example<'a>(
        &'a self,
        e: &'a RefOr<ExampleObject>,
    ) -> Option<&'a ExampleObject> {
        e.resolve_in(
            self.components.as_ref().map(|c| &c.examples),
            EXAMPLE_REF_PREFIX,
        )
    }

    /// Follow `$ref` chains between component schemas to the declaration
    /// that carries content. Gives up on cycles.
    pub fn resolve_schema<'a>(&'a self, schema: &'a Schema) -> Option<&'a Schema> {
        let schemas = self.components.as_ref().map(|c| &c.schemas);
        let mut current = schema;
        for _ in 0..=schemas.map(|s| s.len()).unwrap_or(0) {
            match current.reference.as_deref() {
                None => return Some(current),
                Some(reference) => {
                    let name = schema_name_from_ref(reference)?;
                    current = schemas?.get(name)?;
                }
            }
        }
        None
    }
}
