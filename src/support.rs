//! Support Prober (spec.md §4.4): walks every schema reachable from a
//! [`Document`] and flags nodes that use a feature this generator cannot
//! represent in the target type system.
//!
//! Unsupported nodes are not fatal. The prober emits a `warning`
//! diagnostic for each and records it in the returned map so the Schema
//! Translator can substitute the opaque value container (`Schema::Fragment`'s
//! translation) instead of failing the whole document.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{AdditionalProperties, Document, Schema};
use crate::error;

/// Whether a schema node, at a given JSON-pointer path, can be translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Support {
    Supported,
    /// The feature name and why it can't be represented.
    Unsupported(String),
}

impl Support {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

/// Probe every schema in `document` (components and inline operation
/// schemas), emitting a warning for each unsupported node through `sink`.
///
/// Returns a map from JSON-pointer path to [`Support::Unsupported`] for
/// every flagged node; paths not present in the map are supported.
pub fn probe(
    document: &Document,
    sink: &mut dyn DiagnosticSink,
) -> error::Result<HashMap<String, Support>> {
    let mut out = HashMap::new();

    for (name, schema) in document.components.schemas.iter() {
        walk(schema, &format!("#/components/schemas/{name}"), &mut out, sink, document)?;
    }

    for (path, item) in document.paths.iter() {
        for (method, operation) in item.operations() {
            let base = format!("#/paths/{}/{}", escape_pointer(path), method.as_str().to_lowercase());

            for parameter in &operation.parameters {
                walk(
                    &parameter.schema,
                    &format!("{base}/parameters/{}", parameter.name),
                    &mut out,
                    sink,
                    document,
                )?;
            }
            if let Some(body) = &operation.request_body {
                for (content_type, media) in body.content.iter() {
                    walk(
                        &media.schema,
                        &format!("{base}/requestBody/content/{content_type}"),
                        &mut out,
                        sink,
                        document,
                    )?;
                }
            }
            for (status, response) in operation.responses.iter() {
                for (content_type, media) in response.content.iter() {
                    walk(
                        &media.schema,
                        &format!("{base}/responses/{status}/content/{content_type}"),
                        &mut out,
                        sink,
                        document,
                    )?;
                }
                for (header_name, header) in response.headers.iter() {
                    walk(
                        &header.schema,
                        &format!("{base}/responses/{status}/headers/{header_name}"),
                        &mut out,
                        sink,
                        document,
                    )?;
                }
            }
        }
    }

    Ok(out)
}

fn walk(
    schema: &Schema,
    path: &str,
    out: &mut HashMap<String, Support>,
    sink: &mut dyn DiagnosticSink,
    document: &Document,
) -> error::Result<()> {
    match schema {
        Schema::Not(inner) => {
            flag(out, sink, path, "schema type 'not'")?;
            walk(inner, &format!("{path}/not"), out, sink, document)?;
        }
        Schema::Array { items: Some(items) } => {
            walk(items, &format!("{path}/items"), out, sink, document)?;
        }
        Schema::Object {
            properties,
            additional_properties,
            ..
        } => {
            for (name, prop) in properties.iter() {
                walk(prop, &format!("{path}/properties/{name}"), out, sink, document)?;
            }
            if let AdditionalProperties::Schema(inner) = additional_properties {
                walk(inner, &format!("{path}/additionalProperties"), out, sink, document)?;
            }
        }
        Schema::AllOf(members) => {
            if members.is_empty() {
                flag(out, sink, path, "allOf with no subschemas")?;
            }
            for (i, member) in members.iter().enumerate() {
                walk(member, &format!("{path}/allOf/{i}"), out, sink, document)?;
            }
        }
        Schema::AnyOf(members) => {
            for (i, member) in members.iter().enumerate() {
                walk(member, &format!("{path}/anyOf/{i}"), out, sink, document)?;
            }
        }
        Schema::OneOf { variants, discriminator } => {
            for (i, variant) in variants.iter().enumerate() {
                let variant_path = format!("{path}/oneOf/{i}");
                if discriminator.is_some() {
                    let mut stack = Vec::new();
                    match object_ish(variant, document, &mut stack) {
                        ObjectIsh::Yes => {}
                        ObjectIsh::No => {
                            flag(out, sink, &variant_path, "discriminated oneOf variant is not object-ish")?;
                        }
                        ObjectIsh::Cycle => {
                            flag(out, sink, &variant_path, "schema reference cycle")?;
                        }
                    }
                }
                walk(variant, &variant_path, out, sink, document)?;
            }
        }
        Schema::Array { items: None }
        | Schema::Fragment
        | Schema::Null
        | Schema::Boolean
        | Schema::Integer { .. }
        | Schema::Number { .. }
        | Schema::String { .. }
        | Schema::Reference(_) => {}
    }
    Ok(())
}

enum ObjectIsh {
    Yes,
    No,
    Cycle,
}

/// Whether `schema` is an object, or a composition that reduces to one
/// (spec.md §4.4 "notObjectish"). `stack` holds the component schema
/// names already being resolved on this path, so a reference cycle is
/// reported instead of recursing forever — the Reference/Cycle Analyzer
/// hasn't run yet at this point in the pipeline (spec.md §2).
fn object_ish(schema: &Schema, document: &Document, stack: &mut Vec<String>) -> ObjectIsh {
    match schema {
        Schema::Object { .. } => ObjectIsh::Yes,
        Schema::Reference(reference) => {
            let Some(name) = reference.strip_prefix("#/components/schemas/") else {
                return ObjectIsh::No;
            };
            if stack.iter().any(|visited| visited == name) {
                return ObjectIsh::Cycle;
            }
            let Some(target) = document.components.schemas.get(name) else {
                return ObjectIsh::No;
            };
            stack.push(name.to_string());
            let result = object_ish(target, document, stack);
            stack.pop();
            result
        }
        Schema::AllOf(members) | Schema::AnyOf(members) => all_object_ish(members, document, stack),
        Schema::OneOf { variants, .. } => all_object_ish(variants, document, stack),
        _ => ObjectIsh::No,
    }
}

fn all_object_ish(members: &[Schema], document: &Document, stack: &mut Vec<String>) -> ObjectIsh {
    for member in members {
        match object_ish(member, document, stack) {
            ObjectIsh::Yes => {}
            other => return other,
        }
    }
    ObjectIsh::Yes
}

fn flag(
    out: &mut HashMap<String, Support>,
    sink: &mut dyn DiagnosticSink,
    path: &str,
    feature: &str,
) -> error::Result<()> {
    out.insert(path.to_string(), Support::Unsupported(feature.to_string()));
    sink.emit(
        Diagnostic::warning(format!("feature \"{feature}\" is not supported, skipping"))
            .with_context("foundIn", path),
    )
}

/// `/`-escape a path template for embedding in a diagnostic pointer
/// (mirrors RFC 6901's `~1` for `/`; path templates never contain `~`).
fn escape_pointer(path: &str) -> String {
    path.replace('/', "~1")
}
