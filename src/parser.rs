//! Parser (spec.md §4.1): raw bytes + path → [`Document`].
//!
//! Accepts YAML or JSON (the YAML parser used here, `serde_yaml_ng`,
//! accepts JSON as a subset, so one parse path serves both — see
//! SPEC_FULL.md §4.1). First decodes a thin wrapper that reads only the
//! `openapi` version string and rejects unsupported versions with a
//! located error; then walks the full document into the typed IR.

use std::collections::HashSet;

use serde::Deserialize;
use serde_yaml_ng::Value;

use crate::document::{
    AdditionalProperties, Components, Discriminator, Document, Encoding, Header, HttpMethod,
    Info, MediaType, Operation, OrderedMap, Parameter, ParameterLocation, ParameterStyle,
    PathItem, RequestBody, Response, Schema, Server, SUPPORTED_VERSIONS,
};
use crate::error::{self, Error};

/// Just enough structure to read `openapi` before committing to a full parse.
#[derive(Deserialize)]
struct RawVersion {
    openapi: Option<String>,
}

/// Parse raw document bytes into a [`Document`].
///
/// # Errors
///
/// Returns [`Error::Parse`] if the bytes are not valid YAML/JSON,
/// [`Error::UnsupportedVersion`] if `openapi` is missing or not in
/// [`SUPPORTED_VERSIONS`], and [`Error::UnresolvedReference`] is raised
/// downstream by the translator, not here (the parser does not resolve
/// `$ref`s eagerly).
pub fn parse(bytes: &[u8]) -> error::Result<Document> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::Diagnostic(format!("input is not valid UTF-8: {e}")))?;

    let raw: RawVersion = serde_yaml_ng::from_str(text)?;
    let version = raw.openapi.unwrap_or_default();
    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        return Err(Error::UnsupportedVersion {
            found: version,
            supported: SUPPORTED_VERSIONS,
        });
    }

    let root: Value = serde_yaml_ng::from_str(text)?;
    parse_document(&version, &root)
}

fn parse_document(version: &str, root: &Value) -> error::Result<Document> {
    let info = root.get("info").map_or_else(Info::default, |v| Info {
        title: string_at(v, "title").unwrap_or_default(),
        version: string_at(v, "version").unwrap_or_default(),
    });

    let servers = root
        .get("servers")
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(|s| {
                    string_at(s, "url").map(|url| Server {
                        url,
                        description: string_at(s, "description"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let components = root
        .get("components")
        .map(parse_components)
        .unwrap_or_default();

    let mut paths = OrderedMap::new();
    if let Some(Value::Mapping(map)) = root.get("paths") {
        for (key, value) in map {
            let Some(path) = key.as_str() else { continue };
            paths.insert(path, parse_path_item(value));
        }
    }

    Ok(Document {
        openapi: version.to_string(),
        info,
        paths,
        components,
        servers,
    })
}

fn parse_components(value: &Value) -> Components {
    let mut components = Components::default();

    if let Some(Value::Mapping(map)) = value.get("schemas") {
        for (key, v) in map {
            if let Some(name) = key.as_str() {
                components.schemas.insert(name, parse_schema(v));
            }
        }
    }
    if let Some(Value::Mapping(map)) = value.get("parameters") {
        for (key, v) in map {
            if let (Some(name), Some(param)) = (key.as_str(), parse_parameter(v)) {
                components.parameters.insert(name, param);
            }
        }
    }
    if let Some(Value::Mapping(map)) = value.get("headers") {
        for (key, v) in map {
            if let Some(name) = key.as_str() {
                components.headers.insert(name, parse_header(v));
            }
        }
    }
    if let Some(Value::Mapping(map)) = value.get("requestBodies") {
        for (key, v) in map {
            if let Some(name) = key.as_str() {
                components.request_bodies.insert(name, parse_request_body(v));
            }
        }
    }
    if let Some(Value::Mapping(map)) = value.get("responses") {
        for (key, v) in map {
            if let Some(name) = key.as_str() {
                components.responses.insert(name, parse_response(v));
            }
        }
    }

    components
}

fn parse_path_item(value: &Value) -> PathItem {
    let mut item = PathItem::default();
    for (method_name, method) in [
        ("get", HttpMethod::Get),
        ("put", HttpMethod::Put),
        ("post", HttpMethod::Post),
        ("delete", HttpMethod::Delete),
        ("options", HttpMethod::Options),
        ("head", HttpMethod::Head),
        ("patch", HttpMethod::Patch),
        ("trace", HttpMethod::Trace),
    ] {
        if let Some(op_value) = value.get(method_name) {
            *item.operation_mut(method) = Some(parse_operation(op_value));
        }
    }
    item
}

fn parse_operation(value: &Value) -> Operation {
    let tags = value
        .get("tags")
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let parameters = value
        .get("parameters")
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(parse_parameter).collect())
        .unwrap_or_default();

    let mut responses = OrderedMap::new();
    if let Some(Value::Mapping(map)) = value.get("responses") {
        for (key, v) in map {
            if let Some(status) = key.as_str().map(str::to_string).or_else(|| key.as_i64().map(|n| n.to_string())) {
                responses.insert(status, parse_response(v));
            }
        }
    }

    Operation {
        operation_id: string_at(value, "operationId"),
        tags,
        summary: string_at(value, "summary"),
        description: string_at(value, "description"),
        deprecated: bool_at(value, "deprecated"),
        parameters,
        request_body: value.get("requestBody").map(parse_request_body),
        responses,
    }
}

fn parse_parameter(value: &Value) -> Option<Parameter> {
    let name = string_at(value, "name")?;
    let location = match string_at(value, "in")?.as_str() {
        "path" => ParameterLocation::Path,
        "query" => ParameterLocation::Query,
        "header" => ParameterLocation::Header,
        "cookie" => ParameterLocation::Cookie,
        _ => return None,
    };
    let default_style = match location {
        ParameterLocation::Query | ParameterLocation::Cookie => ParameterStyle::Form,
        ParameterLocation::Path | ParameterLocation::Header => ParameterStyle::Simple,
    };
    let style = string_at(value, "style")
        .and_then(|s| parse_style(&s))
        .unwrap_or(default_style);
    let default_explode = matches!(style, ParameterStyle::Form);
    let explode = value
        .get("explode")
        .and_then(Value::as_bool)
        .unwrap_or(default_explode);
    let required = bool_at(value, "required") || location == ParameterLocation::Path;
    let schema = value.get("schema").map_or(Schema::Fragment, parse_schema);

    Some(Parameter {
        name,
        location,
        style,
        explode,
        required,
        schema,
        description: string_at(value, "description"),
        deprecated: bool_at(value, "deprecated"),
    })
}

fn parse_style(s: &str) -> Option<ParameterStyle> {
    Some(match s {
        "simple" => ParameterStyle::Simple,
        "form" => ParameterStyle::Form,
        "label" => ParameterStyle::Label,
        "matrix" => ParameterStyle::Matrix,
        "spaceDelimited" => ParameterStyle::SpaceDelimited,
        "pipeDelimited" => ParameterStyle::PipeDelimited,
        "deepObject" => ParameterStyle::DeepObject,
        _ => return None,
    })
}

fn parse_header(value: &Value) -> Header {
    Header {
        schema: value.get("schema").map_or(Schema::Fragment, parse_schema),
        required: bool_at(value, "required"),
        description: string_at(value, "description"),
    }
}

fn parse_request_body(value: &Value) -> RequestBody {
    RequestBody {
        description: string_at(value, "description"),
        required: bool_at(value, "required"),
        content: parse_content_map(value),
    }
}

fn parse_content_map(value: &Value) -> OrderedMap<MediaType> {
    let mut content = OrderedMap::new();
    if let Some(Value::Mapping(map)) = value.get("content") {
        for (key, v) in map {
            if let Some(media_type) = key.as_str() {
                let schema = v.get("schema").map_or(Schema::Fragment, parse_schema);
                let mut encoding = OrderedMap::new();
                if let Some(Value::Mapping(enc_map)) = v.get("encoding") {
                    for (ek, ev) in enc_map {
                        if let Some(part_name) = ek.as_str() {
                            let mut headers = OrderedMap::new();
                            if let Some(Value::Mapping(hmap)) = ev.get("headers") {
                                for (hk, hv) in hmap {
                                    if let Some(hname) = hk.as_str() {
                                        headers.insert(hname, parse_header(hv));
                                    }
                                }
                            }
                            encoding.insert(
                                part_name,
                                Encoding {
                                    content_type: string_at(ev, "contentType"),
                                    headers,
                                },
                            );
                        }
                    }
                }
                content.insert(media_type, MediaType { schema, encoding });
            }
        }
    }
    content
}

fn parse_response(value: &Value) -> Response {
    let mut headers = OrderedMap::new();
    if let Some(Value::Mapping(map)) = value.get("headers") {
        for (key, v) in map {
            if let Some(name) = key.as_str() {
                headers.insert(name, parse_header(v));
            }
        }
    }

    Response {
        description: string_at(value, "description").unwrap_or_default(),
        headers,
        content: parse_content_map(value),
    }
}

/// Parse a JSON Schema node, normalizing 3.0 `nullable: true` and 3.1
/// `type: [T, "null"]` into a single "optional in schema" concept at the
/// call site (spec.md §4.5) — here we just record whether `null` was
/// present; the translator decides what "optional" means for the variant.
pub fn parse_schema(value: &Value) -> Schema {
    if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
        return Schema::Reference(reference.to_string());
    }
    if matches!(value, Value::Bool(false)) {
        return Schema::Not(Box::new(Schema::Fragment));
    }

    if let Some(all_of) = value.get("allOf").and_then(Value::as_sequence) {
        return Schema::AllOf(all_of.iter().map(parse_schema).collect());
    }
    if let Some(any_of) = value.get("anyOf").and_then(Value::as_sequence) {
        return Schema::AnyOf(any_of.iter().map(parse_schema).collect());
    }
    if let Some(one_of) = value.get("oneOf").and_then(Value::as_sequence) {
        let discriminator = value.get("discriminator").map(|d| Discriminator {
            property_name: string_at(d, "propertyName").unwrap_or_default(),
            mapping: {
                let mut mapping = OrderedMap::new();
                if let Some(Value::Mapping(map)) = d.get("mapping") {
                    for (k, v) in map {
                        if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                            mapping.insert(k, v.to_string());
                        }
                    }
                }
                mapping
            },
        });
        return Schema::OneOf {
            variants: one_of.iter().map(parse_schema).collect(),
            discriminator,
        };
    }
    if let Some(not) = value.get("not") {
        return Schema::Not(Box::new(parse_schema(not)));
    }

    let type_values = schema_type_tokens(value);
    let nullable_303 = bool_at(value, "nullable");
    let has_null_variant = type_values.iter().any(|t| t == "null") || nullable_303;
    let primary_types: Vec<&str> = type_values.iter().map(String::as_str).filter(|t| *t != "null").collect();

    if primary_types.is_empty() && has_null_variant && !type_values.is_empty() {
        return Schema::Null;
    }

    let base = match primary_types.first().copied() {
        Some("boolean") => Schema::Boolean,
        Some("integer") => Schema::Integer {
            format: string_at(value, "format"),
            r#enum: value
                .get("enum")
                .and_then(Value::as_sequence)
                .map(|seq| seq.iter().filter_map(Value::as_i64).collect()),
        },
        Some("number") => Schema::Number {
            format: string_at(value, "format"),
        },
        Some("string") => Schema::String {
            format: string_at(value, "format"),
            content_encoding: string_at(value, "contentEncoding"),
            content_media_type: string_at(value, "contentMediaType"),
            r#enum: value.get("enum").and_then(Value::as_sequence).map(|seq| {
                seq.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            }),
        },
        Some("array") => Schema::Array {
            items: value.get("items").map(|i| Box::new(parse_schema(i))),
        },
        Some("object") => parse_object_schema(value),
        Some(_) | None => {
            if value.get("properties").is_some() || value.get("additionalProperties").is_some() {
                parse_object_schema(value)
            } else if primary_types.is_empty() && !has_null_variant {
                Schema::Fragment
            } else {
                Schema::Fragment
            }
        }
    };

    // A schema that allows null alongside a real type (3.0 `nullable: true`
    // or a 3.1 `[T, null]` array) keeps its primary variant here; nullable
    // *properties* are recorded in `parse_object_schema` instead, since
    // "optional" is a per-property concept, not a per-node one.

    base
}

/// Whether `value` is nullable per spec.md §4.5: 3.0's `nullable: true`, or
/// 3.1's `type` array containing `"null"` alongside another type.
fn schema_is_nullable(value: &Value) -> bool {
    bool_at(value, "nullable") || schema_type_tokens(value).iter().any(|t| t == "null")
}

fn parse_object_schema(value: &Value) -> Schema {
    let mut properties = OrderedMap::new();
    let mut nullable_properties = HashSet::new();
    if let Some(Value::Mapping(map)) = value.get("properties") {
        for (key, v) in map {
            if let Some(name) = key.as_str() {
                if schema_is_nullable(v) {
                    nullable_properties.insert(name.to_string());
                }
                properties.insert(name, parse_schema(v));
            }
        }
    }

    let required = value
        .get("required")
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let additional_properties = match value.get("additionalProperties") {
        Some(Value::Bool(true)) => AdditionalProperties::True,
        Some(Value::Bool(false)) => AdditionalProperties::False,
        Some(schema_value) => AdditionalProperties::Schema(Box::new(parse_schema(schema_value))),
        None => AdditionalProperties::False,
    };

    Schema::Object {
        properties,
        required,
        additional_properties,
        nullable_properties,
    }
}

/// Returns the `type` keyword's values as strings, handling both the 3.0
/// single-string form and the 3.1 array form.
fn schema_type_tokens(value: &Value) -> Vec<String> {
    match value.get("type") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Sequence(seq)) => seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_at(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn rejects_missing_version() {
        let result = parse(b"paths: {}\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion { .. })));
    }

    #[test]
    fn rejects_unknown_version() {
        let result = parse(b"openapi: 2.0\npaths: {}\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion { found, .. }) if found == "2.0"));
    }

    #[test]
    fn accepts_every_supported_version() {
        for version in SUPPORTED_VERSIONS {
            let input = format!("openapi: {version}\ninfo:\n  title: T\n  version: '1'\npaths: {{}}\n");
            let doc = parse(input.as_bytes()).unwrap();
            assert_eq!(doc.openapi, *version);
        }
    }

    #[test]
    fn rejects_malformed_yaml() {
        let result = parse(b"openapi: 3.1.0\n  bad indentation: [");
        assert!(result.is_err());
    }

    #[test]
    fn parses_minimal_operation() {
        let input = indoc! {r#"
            openapi: 3.1.0
            info:
              title: Greeting API
              version: "1.0"
            paths:
              /greeting:
                get:
                  operationId: getGreeting
                  responses:
                    "200":
                      description: OK
                      content:
                        application/json:
                          schema:
                            type: object
                            properties:
                              message:
                                type: string
                            required: [message]
        "#};
        let doc = parse(input.as_bytes()).unwrap();
        assert_eq!(doc.paths.len(), 1);
        let path_item = doc.paths.get("/greeting").unwrap();
        let get = path_item.get.as_ref().unwrap();
        assert_eq!(get.operation_id.as_deref(), Some("getGreeting"));
        assert!(get.responses.get("200").is_some());
    }

    #[test]
    fn parses_ref_schema() {
        let schema = parse_schema(&serde_yaml_ng::from_str("$ref: '#/components/schemas/Pet'").unwrap());
        assert!(matches!(schema, Schema::Reference(r) if r == "#/components/schemas/Pet"));
    }

    #[test]
    fn parses_discriminated_one_of() {
        let input = indoc! {r#"
            oneOf:
              - $ref: '#/components/schemas/Dog'
              - $ref: '#/components/schemas/Cat'
            discriminator:
              propertyName: kind
              mapping:
                dog: '#/components/schemas/Dog'
                cat: '#/components/schemas/Cat'
        "#};
        let schema = parse_schema(&serde_yaml_ng::from_str(input).unwrap());
        match schema {
            Schema::OneOf {
                variants,
                discriminator,
            } => {
                assert_eq!(variants.len(), 2);
                let disc = discriminator.unwrap();
                assert_eq!(disc.property_name, "kind");
                assert_eq!(disc.mapping.get("dog").unwrap(), "#/components/schemas/Dog");
            }
            other => panic!("expected OneOf, got {other:?}"),
        }
    }

    #[test]
    fn parses_nullable_3_0_style() {
        let input = "type: string\nnullable: true\n";
        let schema = parse_schema(&serde_yaml_ng::from_str(input).unwrap());
        assert!(matches!(schema, Schema::String { .. }));
    }

    #[test]
    fn parses_null_union_3_1_style() {
        let input = "type: [string, 'null']\n";
        let schema = parse_schema(&serde_yaml_ng::from_str(input).unwrap());
        assert!(matches!(schema, Schema::String { .. }));
    }

    #[test]
    fn parses_pure_null_schema() {
        let input = "type: 'null'\n";
        let schema = parse_schema(&serde_yaml_ng::from_str(input).unwrap());
        assert!(matches!(schema, Schema::Null));
    }

    #[test]
    fn parses_empty_schema_as_fragment() {
        let schema = parse_schema(&serde_yaml_ng::from_str("{}").unwrap());
        assert!(matches!(schema, Schema::Fragment));
    }

    #[test]
    fn parses_all_of_with_no_subschemas() {
        let schema = parse_schema(&serde_yaml_ng::from_str("allOf: []").unwrap());
        assert!(matches!(schema, Schema::AllOf(v) if v.is_empty()));
    }

    #[test]
    fn path_parameter_defaults_to_simple_style_and_required() {
        let input = indoc! {r#"
            name: petId
            in: path
            schema:
              type: string
        "#};
        let param = parse_parameter(&serde_yaml_ng::from_str(input).unwrap()).unwrap();
        assert_eq!(param.style, ParameterStyle::Simple);
        assert!(!param.explode);
        assert!(param.required, "path parameters are always required");
    }

    #[test]
    fn query_parameter_defaults_to_form_explode_true() {
        let input = indoc! {r#"
            name: tags
            in: query
            schema:
              type: array
              items:
                type: string
        "#};
        let param = parse_parameter(&serde_yaml_ng::from_str(input).unwrap()).unwrap();
        assert_eq!(param.style, ParameterStyle::Form);
        assert!(param.explode);
    }
}
