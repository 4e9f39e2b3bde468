//! Document filter (spec.md §4.2): reduce a [`Document`] to a selected
//! subset of operations/paths/tags, plus the transitive closure of
//! `components.schemas` reachable from what remains (and from any
//! explicitly requested schema names).
//!
//! This runs before translation so every later stage only ever sees the
//! reduced document — there is no "filtered out but still visible"
//! leakage.

use std::collections::HashSet;

use crate::document::{Components, Document, OrderedMap, PathItem, Schema};

/// What to keep. Every `Some` field narrows the selection; fields left
/// `None` simply don't contribute a reason to keep an operation.
///
/// If every field is `None`, [`filter`] returns `document` unchanged
/// (cloned).
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub operation_ids: Option<HashSet<String>>,
    pub tags: Option<HashSet<String>>,
    pub paths: Option<HashSet<String>>,
    /// Schema names to keep even if no surviving operation references them
    /// (e.g. `mode: types` generation targeting a specific model).
    pub schema_names: Option<HashSet<String>>,
}

impl FilterCriteria {
    pub fn is_unrestricted(&self) -> bool {
        self.operation_ids.is_none()
            && self.tags.is_none()
            && self.paths.is_none()
            && self.schema_names.is_none()
    }

    fn selects_operations(&self) -> bool {
        self.operation_ids.is_some() || self.tags.is_some() || self.paths.is_some()
    }
}

/// Reduce `document` per `criteria`.
///
/// Only `paths`/`components.schemas` are reduced. Parameters, headers,
/// request bodies, and responses under `components` are never
/// dereferenced by this crate's parser (spec.md's IR inlines them
/// directly into operations at parse time), so there is no usage graph
/// to close over for them — they pass through unchanged.
#[must_use]
pub fn filter(document: &Document, criteria: &FilterCriteria) -> Document {
    if criteria.is_unrestricted() {
        return document.clone();
    }

    let mut paths = OrderedMap::new();
    for (path, item) in document.paths.iter() {
        let kept = keep_path_item(path, item, criteria);
        if let Some(kept) = kept {
            paths.insert(path, kept);
        }
    }

    let mut roots: HashSet<String> = HashSet::new();
    if let Some(names) = &criteria.schema_names {
        roots.extend(names.iter().cloned());
    }
    for (_, item) in paths.iter() {
        for (_, operation) in item.operations() {
            for parameter in &operation.parameters {
                collect_refs(&parameter.schema, &mut roots);
            }
            if let Some(body) = &operation.request_body {
                for (_, media) in body.content.iter() {
                    collect_refs(&media.schema, &mut roots);
                }
            }
            for (_, response) in operation.responses.iter() {
                for (_, media) in response.content.iter() {
                    collect_refs(&media.schema, &mut roots);
                }
                for (_, header) in response.headers.iter() {
                    collect_refs(&header.schema, &mut roots);
                }
            }
        }
    }

    let closure = close_over_schemas(&document.components.schemas, roots);

    let mut schemas = document.components.schemas.clone();
    schemas.retain_keys(|name| closure.contains(name));

    let components = Components {
        schemas,
        ..document.components.clone()
    };

    Document {
        openapi: document.openapi.clone(),
        info: document.info.clone(),
        paths,
        components,
        servers: document.servers.clone(),
    }
}

fn keep_path_item(path: &str, item: &PathItem, criteria: &FilterCriteria) -> Option<PathItem> {
    if !criteria.selects_operations() {
        return Some(item.clone());
    }

    let path_selected = criteria.paths.as_ref().is_some_and(|p| p.contains(path));

    let mut kept = PathItem::default();
    let mut any = false;
    for (method, operation) in item.operations() {
        let id_selected = operation
            .operation_id
            .as_ref()
            .is_some_and(|id| criteria.operation_ids.as_ref().is_some_and(|set| set.contains(id)));
        let tag_selected = criteria
            .tags
            .as_ref()
            .is_some_and(|set| operation.tags.iter().any(|t| set.contains(t)));

        if path_selected || id_selected || tag_selected {
            *kept.operation_mut(method) = Some(operation.clone());
            any = true;
        }
    }

    any.then_some(kept)
}

/// Walk a schema tree, recording every `#/components/schemas/<Name>` it
/// references directly (not recursively — recursion happens in
/// [`close_over_schemas`] once we can look names up in `components`).
fn collect_refs(schema: &Schema, out: &mut HashSet<String>) {
    match schema {
        Schema::Reference(reference) => {
            if let Some(name) = schema_name(reference) {
                out.insert(name.to_string());
            }
        }
        Schema::Array { items: Some(items) } => collect_refs(items, out),
        Schema::Array { items: None } => {}
        Schema::Object {
            properties,
            additional_properties,
            ..
        } => {
            for (_, prop) in properties.iter() {
                collect_refs(prop, out);
            }
            if let crate::document::AdditionalProperties::Schema(inner) = additional_properties {
                collect_refs(inner, out);
            }
        }
        Schema::AllOf(members) | Schema::AnyOf(members) => {
            for member in members {
                collect_refs(member, out);
            }
        }
        Schema::OneOf { variants, .. } => {
            for variant in variants {
                collect_refs(variant, out);
            }
        }
        Schema::Not(inner) => collect_refs(inner, out),
        Schema::Fragment
        | Schema::Null
        | Schema::Boolean
        | Schema::Integer { .. }
        | Schema::Number { .. }
        | Schema::String { .. } => {}
    }
}

fn schema_name(reference: &str) -> Option<&str> {
    reference.strip_prefix("#/components/schemas/")
}

fn close_over_schemas(schemas: &OrderedMap<Schema>, roots: HashSet<String>) -> HashSet<String> {
    let mut closure = HashSet::new();
    let mut frontier: Vec<String> = roots.into_iter().collect();

    while let Some(name) = frontier.pop() {
        if !closure.insert(name.clone()) {
            continue;
        }
        if let Some(schema) = schemas.get(&name) {
            let mut discovered = HashSet::new();
            collect_refs(schema, &mut discovered);
            for next in discovered {
                if !closure.contains(&next) {
                    frontier.push(next);
                }
            }
        }
    }

    closure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn sample() -> Document {
        let input = indoc::indoc! {r#"
            openapi: 3.1.0
            info:
              title: T
              version: "1"
            paths:
              /pets:
                get:
                  operationId: listPets
                  tags: [pets]
                  responses:
                    "200":
                      description: OK
                      content:
                        application/json:
                          schema:
                            type: array
                            items:
                              $ref: '#/components/schemas/Pet'
              /owners:
                get:
                  operationId: listOwners
                  tags: [owners]
                  responses:
                    "200":
                      description: OK
                      content:
                        application/json:
                          schema:
                            $ref: '#/components/schemas/Owner'
            components:
              schemas:
                Pet:
                  type: object
                  properties:
                    owner:
                      $ref: '#/components/schemas/Owner'
                Owner:
                  type: object
                  properties:
                    name:
                      type: string
                Unrelated:
                  type: string
        "#};
        parser::parse(input.as_bytes()).unwrap()
    }

    #[test]
    fn unrestricted_criteria_returns_full_document() {
        let doc = sample();
        let filtered = filter(&doc, &FilterCriteria::default());
        assert_eq!(filtered.paths.len(), 2);
        assert_eq!(filtered.components.schemas.len(), 3);
    }

    #[test]
    fn filtering_by_tag_closes_over_referenced_schemas() {
        let doc = sample();
        let mut tags = HashSet::new();
        tags.insert("pets".to_string());
        let criteria = FilterCriteria {
            tags: Some(tags),
            ..Default::default()
        };
        let filtered = filter(&doc, &criteria);

        assert_eq!(filtered.paths.len(), 1);
        assert!(filtered.paths.get("/pets").is_some());
        assert!(filtered.paths.get("/owners").is_none());

        // Pet references Owner transitively; Unrelated is dropped.
        assert!(filtered.components.schemas.get("Pet").is_some());
        assert!(filtered.components.schemas.get("Owner").is_some());
        assert!(filtered.components.schemas.get("Unrelated").is_none());
    }

    #[test]
    fn filtering_by_operation_id() {
        let doc = sample();
        let mut ids = HashSet::new();
        ids.insert("listOwners".to_string());
        let criteria = FilterCriteria {
            operation_ids: Some(ids),
            ..Default::default()
        };
        let filtered = filter(&doc, &criteria);
        assert_eq!(filtered.paths.len(), 1);
        assert!(filtered.paths.get("/owners").is_some());
        assert!(filtered.components.schemas.get("Pet").is_none());
    }

    #[test]
    fn explicit_schema_names_survive_without_any_operation() {
        let doc = sample();
        let mut names = HashSet::new();
        names.insert("Unrelated".to_string());
        let criteria = FilterCriteria {
            schema_names: Some(names),
            paths: Some(HashSet::new()),
            ..Default::default()
        };
        let filtered = filter(&doc, &criteria);
        assert!(filtered.paths.is_empty());
        assert!(filtered.components.schemas.get("Unrelated").is_some());
        assert!(filtered.components.schemas.get("Pet").is_none());
    }
}
