use crate::openapi::{ExampleObject, MediaType, OpenApi, RefOr, Schema};
use crate::types::{Example, SchemaExampleIndex};
use crate::value::{OrderedMap, SpecValue};

/// Index every illustrative value in `doc` under the component schema it
/// belongs to.
///
/// Sources, in the order they are visited:
///
/// 1. `components.schemas.<Name>`: the declaration itself, recorded when it
///    has a description or an `example` (the value may be `null`).
/// 2. For each path and each of GET, POST, PUT, DELETE, PATCH:
///    - parameters whose schema is `$ref: '#/components/schemas/<Name>'`,
///    - request body media types with such a schema,
///    - response media types with such a schema, per status code.
///
/// Usage sites contribute their inline `example` and every entry of their
/// `examples` map; a bare reference with neither contributes nothing.
/// Entries for a name accumulate in discovery order.
///
/// # Example
///
/// ```
/// use specpath::v1::{ParsedSpec, extract_examples};
///
/// let spec = ParsedSpec::parse(br##"
/// info: { title: Users, version: '1' }
/// components:
///   schemas:
///     User:
///       description: a user
/// "##).unwrap();
///
/// let index = extract_examples(spec.document());
/// let users = index.get("User").unwrap();
/// assert_eq!(users[0].key, "components.schemas.User");
/// assert!(users[0].value.is_null());
/// ```
pub fn extract_examples(doc: &OpenApi) -> SchemaExampleIndex {
    let mut collector = Collector {
        doc,
        index: SchemaExampleIndex::new(),
    };
    collector.component_schemas();
    collector.paths();
    collector.index
}

struct Collector<'a> {
    doc: &'a OpenApi,
    index: SchemaExampleIndex,
}

impl Collector<'_> {
    fn component_schemas(&mut self) {
        let Some(components) = &self.doc.components else {
            return;
        };

        for (name, schema) in components.schemas.iter() {
            let Some(schema) = self.doc.resolve_schema(schema) else {
                continue;
            };
            if schema.description.is_empty() && schema.example.is_none() {
                continue;
            }
            self.index.entry_or_default(name).push(Example {
                description: schema.description.clone(),
                value: schema.example.clone().unwrap_or_default(),
                key: format!("components.schemas.{}", name),
            });
        }
    }

    fn paths(&mut self) {
        let doc = self.doc;

        for (path, item) in doc.paths.iter() {
            for (method, op) in item.operations() {
                let base = format!("components.paths.{}.{}", path, method);

                for (position, param) in op.parameters.iter().enumerate() {
                    let Some(param) = doc.resolve_parameter(param) else {
                        continue;
                    };
                    let Some(schema_name) = param.schema.as_ref().and_then(Schema::schema_name)
                    else {
                        continue;
                    };
                    let key = format!("{}.parameters.{}.{}", base, position, schema_name);
                    self.add(
                        schema_name,
                        &key,
                        &param.description,
                        param.example.as_ref(),
                        &param.examples,
                    );
                }

                if let Some(body) = op
                    .request_body
                    .as_ref()
                    .and_then(|b| doc.resolve_request_body(b))
                {
                    self.content(&format!("{}.requestBody", base), &body.content);
                }

                for (status, response) in op.responses.iter() {
                    if let Some(response) = doc.resolve_response(response) {
                        self.content(&format!("{}.response.{}", base, status), &response.content);
                    }
                }
            }
        }
    }

    fn content(&mut self, prefix: &str, content: &OrderedMap<MediaType>) {
        for (media_type, media) in content.iter() {
            let Some(schema_name) = media.schema.as_ref().and_then(Schema::schema_name) else {
                continue;
            };
            let key = format!("{}.{}.{}", prefix, media_type, schema_name);
            self.add(
                schema_name,
                &key,
                media_type,
                media.example.as_ref(),
                &media.examples,
            );
        }
    }

    fn add(
        &mut self,
        schema_name: &str,
        key: &str,
        description: &str,
        example: Option<&SpecValue>,
        examples: &OrderedMap<RefOr<ExampleObject>>,
    ) {
        let mut found = Vec::new();

        if let Some(value) = example {
            found.push(Example {
                description: description.to_string(),
                value: value.clone(),
                key: key.to_string(),
            });
        }

        for (_, entry) in examples.iter() {
            let Some(entry) = self.doc.resolve_example(entry) else {
                continue;
            };
            let Some(value) = &entry.value else {
                continue;
            };
            let description = if entry.description.is_empty() {
                &entry.summary
            } else {
                &entry.description
            };
            found.push(Example {
                description: description.clone(),
                value: value.clone(),
                key: key.to_string(),
            });
        }

        if !found.is_empty() {
            self.index.entry_or_default(schema_name).extend(found);
        }
    }
}
