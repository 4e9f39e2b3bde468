//! Multipart Translator (spec.md §4 table, §8 scenario 4): classifies
//! each part of a `multipart/form-data` request/response body by its
//! repetition requirement, so the Operation Translator can emit the
//! right Swift collection shape (single value, optional, or array) for
//! each part name.

use crate::document::{Encoding, MediaType, OrderedMap, Schema};

/// How many times a named part is allowed/required to appear in a
/// multipart body, derived from whether the part's schema is itself an
/// array and whether the part name is in the body schema's `required`
/// list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRequirement {
    /// Exactly one occurrence; required.
    RequiredExactlyOnce,
    /// Zero or one occurrence.
    AtMostOnce,
    /// One or more occurrences (the part's schema is an array and the
    /// part is required).
    RequiredAtLeastOnce,
    /// Zero or more occurrences (the part's schema is an array, not
    /// required).
    ZeroOrMore,
}

impl PartRequirement {
    pub fn classify(is_array: bool, required: bool) -> Self {
        match (is_array, required) {
            (true, true) => Self::RequiredAtLeastOnce,
            (true, false) => Self::ZeroOrMore,
            (false, true) => Self::RequiredExactlyOnce,
            (false, false) => Self::AtMostOnce,
        }
    }
}

/// One classified part of a multipart body.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    pub schema: Schema,
    pub content_type: Option<String>,
    pub requirement: PartRequirement,
}

/// A fully classified multipart body: its named parts plus whether
/// parts outside the declared set are tolerated.
#[derive(Debug, Clone)]
pub struct MultipartPlan {
    pub parts: Vec<MultipartPart>,
    /// `additionalProperties` on the body schema: an unnamed/unknown
    /// part is accepted and passed through as raw bytes.
    pub allows_unknown_parts: bool,
}

/// Build a [`MultipartPlan`] from a `multipart/form-data` media type
/// entry. `media.schema` must be a (possibly referenced-and-resolved)
/// [`Schema::Object`] — callers resolve `$ref` before calling this, since
/// the translator doesn't carry a schema-name index here.
pub fn plan(schema: &Schema, encoding: &OrderedMap<Encoding>) -> Option<MultipartPlan> {
    let Schema::Object {
        properties,
        required,
        additional_properties,
        ..
    } = schema
    else {
        return None;
    };

    let allows_unknown_parts = !matches!(additional_properties, crate::document::AdditionalProperties::False);

    let parts = properties
        .iter()
        .map(|(name, prop_schema)| {
            let is_array = matches!(prop_schema, Schema::Array { .. });
            let is_required = required.contains(&name.to_string());
            let content_type = encoding.get(name).and_then(|e| e.content_type.clone());
            MultipartPart {
                name: name.to_string(),
                schema: prop_schema.clone(),
                content_type,
                requirement: PartRequirement::classify(is_array, is_required),
            }
        })
        .collect();

    Some(MultipartPlan {
        parts,
        allows_unknown_parts,
    })
}

/// True when `media_type` names a multipart body this translator
/// understands (`multipart/form-data`, optionally with a boundary
/// parameter suffix).
pub fn is_multipart(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .is_some_and(|base| base.trim() == "multipart/form-data")
}

pub fn find_multipart<'a>(content: &'a OrderedMap<MediaType>) -> Option<(&'a str, &'a MediaType)> {
    content.iter().find(|(ct, _)| is_multipart(ct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AdditionalProperties;

    fn object_schema(props: Vec<(&str, Schema)>, required: Vec<&str>, additional: AdditionalProperties) -> Schema {
        let mut properties = OrderedMap::new();
        for (name, schema) in props {
            properties.insert(name, schema);
        }
        Schema::Object {
            properties,
            required: required.into_iter().map(str::to_string).collect(),
            additional_properties: additional,
            nullable_properties: std::collections::HashSet::new(),
        }
    }

    #[test]
    fn classifies_all_four_requirement_combinations() {
        assert_eq!(
            PartRequirement::classify(false, true),
            PartRequirement::RequiredExactlyOnce
        );
        assert_eq!(PartRequirement::classify(false, false), PartRequirement::AtMostOnce);
        assert_eq!(
            PartRequirement::classify(true, true),
            PartRequirement::RequiredAtLeastOnce
        );
        assert_eq!(PartRequirement::classify(true, false), PartRequirement::ZeroOrMore);
    }

    #[test]
    fn plan_classifies_each_declared_part() {
        let schema = object_schema(
            vec![
                ("name", Schema::String { format: None, content_encoding: None, content_media_type: None, r#enum: None }),
                ("tags", Schema::Array { items: None }),
            ],
            vec!["name"],
            AdditionalProperties::False,
        );
        let encoding = OrderedMap::new();
        let plan = plan(&schema, &encoding).unwrap();
        assert_eq!(plan.parts.len(), 2);
        assert!(!plan.allows_unknown_parts);
        let name_part = plan.parts.iter().find(|p| p.name == "name").unwrap();
        assert_eq!(name_part.requirement, PartRequirement::RequiredExactlyOnce);
        let tags_part = plan.parts.iter().find(|p| p.name == "tags").unwrap();
        assert_eq!(tags_part.requirement, PartRequirement::ZeroOrMore);
    }

    #[test]
    fn additional_properties_schema_allows_unknown_parts() {
        let schema = object_schema(
            vec![],
            vec![],
            AdditionalProperties::Schema(Box::new(Schema::String {
                format: None,
                content_encoding: None,
                content_media_type: None,
                r#enum: None,
            })),
        );
        let encoding = OrderedMap::new();
        let plan = plan(&schema, &encoding).unwrap();
        assert!(plan.allows_unknown_parts);
    }

    #[test]
    fn non_object_schema_has_no_plan() {
        assert!(plan(&Schema::Boolean, &OrderedMap::new()).is_none());
    }

    #[test]
    fn is_multipart_ignores_boundary_parameter() {
        assert!(is_multipart("multipart/form-data; boundary=abc"));
        assert!(!is_multipart("application/json"));
    }
}
