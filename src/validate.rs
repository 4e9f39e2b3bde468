//! Validator (spec.md §4.1 "Validator", §2 table): structural checks run
//! on a filtered [`Document`] before translation begins.
//!
//! Two kinds of problems surface here:
//! - Every `$ref` must resolve within `#/components/schemas` (spec.md §3
//!   invariant "Every `$ref` in the input resolves within Components or
//!   the parser rejects"). A dangling reference is an
//!   [`Error::UnresolvedReference`] (spec.md §7 "Surfaced to caller"),
//!   raised immediately rather than collected, since every later stage
//!   assumes references already resolve.
//! - A path template parameter (`{id}` in `/pets/{id}`) with no matching
//!   `path`-located [`Parameter`] is a structural mismatch the document
//!   author almost certainly didn't intend; this is recoverable (a
//!   `warning`), since the operation can still generate — the path
//!   segment just never gets substituted.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{AdditionalProperties, Document, ParameterLocation, Schema};
use crate::error::{Error, Result};

/// Run every structural check against `document`, emitting diagnostics
/// through `sink`. Returns [`Error::UnresolvedReference`] on the first
/// dangling `$ref` found; all other issues are recoverable and reported
/// as warnings without aborting the scan.
pub fn validate(document: &Document, sink: &mut dyn DiagnosticSink) -> Result<()> {
    check_references(document)?;
    check_path_parameters(document, sink)?;
    Ok(())
}

fn check_references(document: &Document) -> Result<()> {
    for (name, schema) in document.components.schemas.iter() {
        walk_refs(schema, &format!("#/components/schemas/{name}"), document)?;
    }
    for (path, item) in document.paths.iter() {
        for (method, operation) in item.operations() {
            let base = format!("#/paths/{}/{}", escape_pointer(path), method.as_str().to_lowercase());
            for parameter in &operation.parameters {
                walk_refs(&parameter.schema, &format!("{base}/parameters/{}", parameter.name), document)?;
            }
            if let Some(body) = &operation.request_body {
                for (content_type, media) in body.content.iter() {
                    walk_refs(&media.schema, &format!("{base}/requestBody/content/{content_type}"), document)?;
                }
            }
            for (status, response) in operation.responses.iter() {
                for (content_type, media) in response.content.iter() {
                    walk_refs(&media.schema, &format!("{base}/responses/{status}/content/{content_type}"), document)?;
                }
                for (header_name, header) in response.headers.iter() {
                    walk_refs(&header.schema, &format!("{base}/responses/{status}/headers/{header_name}"), document)?;
                }
            }
        }
    }
    Ok(())
}

fn walk_refs(schema: &Schema, location: &str, document: &Document) -> Result<()> {
    match schema {
        Schema::Reference(reference) => {
            let name = reference
                .strip_prefix("#/components/schemas/")
                .ok_or_else(|| Error::UnresolvedReference {
                    reference: reference.clone(),
                    location: Some(location.to_string()),
                })?;
            if !document.components.schemas.contains_key(name) {
                return Err(Error::UnresolvedReference {
                    reference: reference.clone(),
                    location: Some(location.to_string()),
                });
            }
            Ok(())
        }
        Schema::Array { items: Some(items) } => walk_refs(items, &format!("{location}/items"), document),
        Schema::Object {
            properties,
            additional_properties,
            ..
        } => {
            for (name, prop) in properties.iter() {
                walk_refs(prop, &format!("{location}/properties/{name}"), document)?;
            }
            if let AdditionalProperties::Schema(inner) = additional_properties {
                walk_refs(inner, &format!("{location}/additionalProperties"), document)?;
            }
            Ok(())
        }
        Schema::AllOf(members) | Schema::AnyOf(members) => {
            for (i, member) in members.iter().enumerate() {
                walk_refs(member, &format!("{location}/{i}"), document)?;
            }
            Ok(())
        }
        Schema::OneOf { variants, .. } => {
            for (i, variant) in variants.iter().enumerate() {
                walk_refs(variant, &format!("{location}/oneOf/{i}"), document)?;
            }
            Ok(())
        }
        Schema::Not(inner) => walk_refs(inner, &format!("{location}/not"), document),
        Schema::Array { items: None }
        | Schema::Fragment
        | Schema::Null
        | Schema::Boolean
        | Schema::Integer { .. }
        | Schema::Number { .. }
        | Schema::String { .. } => Ok(()),
    }
}

/// Every `{param}` segment of a path template should have a matching
/// `path`-located parameter declared on the operation (or inherited from
/// the `PathItem`, which this parser folds into each operation at parse
/// time — see `SPEC_FULL.md` §4.1). A mismatch is a `warning`, not fatal:
/// the generator still produces an `Input.Path` struct, it just never
/// substitutes that segment of the template.
fn check_path_parameters(document: &Document, sink: &mut dyn DiagnosticSink) -> Result<()> {
    for (path, item) in document.paths.iter() {
        let template_params = path_template_parameters(path);
        if template_params.is_empty() {
            continue;
        }
        for (method, operation) in item.operations() {
            let declared: std::collections::HashSet<&str> = operation
                .parameters
                .iter()
                .filter(|p| p.location == ParameterLocation::Path)
                .map(|p| p.name.as_str())
                .collect();
            for missing in template_params.iter().filter(|p| !declared.contains(p.as_str())) {
                sink.emit(
                    Diagnostic::warning(format!(
                        "path template parameter '{{{missing}}}' has no matching path parameter declaration"
                    ))
                    .with_context(
                        "foundIn",
                        format!("#/paths/{}/{}", escape_pointer(path), method.as_str().to_lowercase()),
                    ),
                )?;
            }
        }
    }
    Ok(())
}

fn path_template_parameters(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        if let Some(end) = after.find('}') {
            out.push(after[..end].to_string());
            rest = &after[end + 1..];
        } else {
            break;
        }
    }
    out
}

fn escape_pointer(path: &str) -> String {
    path.replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::StreamSink;
    use crate::parser;

    #[test]
    fn unresolved_reference_is_rejected() {
        let input = indoc::indoc! {r#"
            openapi: 3.1.0
            info: {title: T, version: "1"}
            paths:
              /pets:
                get:
                  operationId: listPets
                  responses:
                    "200":
                      description: ok
                      content:
                        application/json:
                          schema:
                            $ref: "#/components/schemas/Missing"
            components:
              schemas: {}
        "#};
        let doc = parser::parse(input.as_bytes()).unwrap();
        let mut sink = StreamSink::silent();
        let result = validate(&doc, &mut sink);
        assert!(matches!(result, Err(Error::UnresolvedReference { .. })));
    }

    #[test]
    fn resolved_reference_passes() {
        let input = indoc::indoc! {r#"
            openapi: 3.1.0
            info: {title: T, version: "1"}
            paths: {}
            components:
              schemas:
                Pet:
                  type: object
                Wrapper:
                  type: object
                  properties:
                    pet:
                      $ref: "#/components/schemas/Pet"
        "#};
        let doc = parser::parse(input.as_bytes()).unwrap();
        let mut sink = StreamSink::silent();
        assert!(validate(&doc, &mut sink).is_ok());
    }

    #[test]
    fn missing_path_parameter_declaration_warns() {
        let input = indoc::indoc! {r#"
            openapi: 3.1.0
            info: {title: T, version: "1"}
            paths:
              /pets/{id}:
                get:
                  operationId: getPet
                  responses:
                    "200":
                      description: ok
            components:
              schemas: {}
        "#};
        let doc = parser::parse(input.as_bytes()).unwrap();
        let mut sink = StreamSink::silent();
        validate(&doc, &mut sink).unwrap();
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.lines()[0].contains("{id}"));
    }

    #[test]
    fn path_template_parameters_extracts_all_segments() {
        assert_eq!(
            path_template_parameters("/orgs/{orgId}/repos/{repoId}"),
            vec!["orgId".to_string(), "repoId".to_string()]
        );
        assert!(path_template_parameters("/health").is_empty());
    }
}
