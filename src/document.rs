//! The parsed OpenAPI document: paths, components, servers, and the
//! `Schema` algebraic data type.
//!
//! Populated by [`crate::parser::parse`] and consumed read-only by every
//! downstream stage. Nothing here mutates after parsing except
//! [`crate::filter::filter`], which produces a new, reduced `Document`.

use std::collections::HashSet;

/// OpenAPI versions this parser accepts, in the order checked.
pub const SUPPORTED_VERSIONS: &[&str] = &["3.0.0", "3.0.1", "3.0.2", "3.0.3", "3.1.0"];

/// The parsed OpenAPI document.
///
/// Path and component maps use `BTreeMap` rather than `HashMap` so
/// iteration order matches insertion... actually OpenAPI documents are
/// maps with no prescribed ordering in the wire format, but this pipeline
/// must be deterministic (spec invariant: "same input + config →
/// byte-identical output"), so parsing preserves **document order** by
/// pairing the map with an explicit `order: Vec<String>` rather than
/// relying on map iteration order. See [`OrderedMap`].
#[derive(Debug, Clone)]
pub struct Document {
    /// The `openapi` version string, already normalized/validated.
    pub openapi: String,
    /// `info.title` / `info.version`, kept for completeness; unused by
    /// the core pipeline beyond pass-through into rendered doc comments.
    pub info: Info,
    /// Path templates in document order, each with its operations.
    pub paths: OrderedMap<PathItem>,
    /// Reusable components.
    pub components: Components,
    /// Declared servers (host templates only; variable substitution is
    /// out of scope).
    pub servers: Vec<Server>,
}

/// `info` object fields the core cares about.
#[derive(Debug, Clone, Default)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// A declared server entry.
#[derive(Debug, Clone)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

/// An order-preserving string-keyed map.
///
/// OpenAPI documents are JSON/YAML objects; in both formats key order is
/// observable and, per the determinism invariant in spec.md §3, must
/// survive into emitted output. A `Vec<(String, T)>` with a small lookup
/// helper gives both.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only entries whose key satisfies `predicate`, preserving order.
    pub fn retain_keys(&mut self, mut predicate: impl FnMut(&str) -> bool) {
        self.entries.retain(|(k, _)| predicate(k));
    }
}

impl<T> FromIterator<(String, T)> for OrderedMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Reusable components: schemas, parameters, headers, request bodies,
/// responses — the five maps named in spec.md §3.
#[derive(Debug, Clone, Default)]
pub struct Components {
    pub schemas: OrderedMap<Schema>,
    pub parameters: OrderedMap<Parameter>,
    pub headers: OrderedMap<Header>,
    pub request_bodies: OrderedMap<RequestBody>,
    pub responses: OrderedMap<Response>,
}

/// One path template's per-method operations.
#[derive(Debug, Clone, Default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Iterate over `(method, operation)` pairs in a fixed, deterministic
    /// order (the order HTTP methods are conventionally listed).
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Options, &self.options),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Trace, &self.trace),
        ]
        .into_iter()
        .filter_map(|(m, op)| op.as_ref().map(|o| (m, o)))
    }

    pub fn operation_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }
}

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }
}

/// Method + path template + parameters + optional request body + responses.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Status code (or `"default"`) → response, in document order.
    pub responses: OrderedMap<Response>,
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Serialization style for a parameter (OpenAPI `style` keyword).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Simple,
    Form,
    Label,
    Matrix,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

/// A single operation parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub style: ParameterStyle,
    pub explode: bool,
    pub required: bool,
    pub schema: Schema,
    pub description: Option<String>,
    pub deprecated: bool,
}

/// A response header (shares shape with a parameter, minus location/style).
#[derive(Debug, Clone)]
pub struct Header {
    pub schema: Schema,
    pub required: bool,
    pub description: Option<String>,
}

/// A request body: content-type → media-type schema/encoding, plus whether
/// the body itself is required.
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
    /// Media type (e.g. `application/json`) → content, in document order.
    pub content: OrderedMap<MediaType>,
}

/// One entry in a content map.
#[derive(Debug, Clone)]
pub struct MediaType {
    pub schema: Schema,
    pub encoding: OrderedMap<Encoding>,
}

/// Per-property encoding info for `multipart/form-data` and
/// `application/x-www-form-urlencoded` bodies.
#[derive(Debug, Clone, Default)]
pub struct Encoding {
    pub content_type: Option<String>,
    pub headers: OrderedMap<Header>,
}

/// A response: headers + content map, keyed by status code or `"default"`.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub description: String,
    pub headers: OrderedMap<Header>,
    pub content: OrderedMap<MediaType>,
}

/// A discriminator on a `oneOf`/`anyOf` schema.
#[derive(Debug, Clone, Default)]
pub struct Discriminator {
    pub property_name: String,
    /// Explicit mapping entries, in document order; schemas not listed
    /// here fall back to using their own component name.
    pub mapping: OrderedMap<String>,
}

/// The OpenAPI JSON Schema algebraic data type, per spec.md §3.
///
/// 3.0's `nullable: true` and 3.1's `[T, null]` are both normalized at parse
/// time (spec.md §4.5 "Nullability"): a schema that is *only* null becomes
/// [`Schema::Null`]; a schema that allows null alongside a real type keeps
/// its primary variant, and the containing [`Schema::Object`] records the
/// property name in `nullable_properties` so the translator can still fold
/// it into "optional field" even when the property is also `required`.
#[derive(Debug, Clone)]
pub enum Schema {
    /// The empty schema `{}` — matches anything (spec.md §8 "An empty
    /// schema (`{}`) translates to the opaque value container type").
    Fragment,
    Null,
    Boolean,
    Integer {
        format: Option<String>,
        r#enum: Option<Vec<i64>>,
    },
    Number {
        format: Option<String>,
    },
    String {
        format: Option<String>,
        content_encoding: Option<String>,
        content_media_type: Option<String>,
        r#enum: Option<Vec<String>>,
    },
    Array {
        items: Option<Box<Schema>>,
    },
    Object {
        properties: OrderedMap<Schema>,
        required: Vec<String>,
        additional_properties: AdditionalProperties,
        /// Property names that carried 3.0 `nullable: true` or a 3.1
        /// `[T, null]` type array (spec.md §4.5 "Nullability"). A required
        /// property in this set is still emitted as an optional Swift
        /// field, since a legal payload may decode it to `null`.
        nullable_properties: HashSet<String>,
    },
    AllOf(Vec<Schema>),
    OneOf {
        variants: Vec<Schema>,
        discriminator: Option<Discriminator>,
    },
    AnyOf(Vec<Schema>),
    Not(Box<Schema>),
    /// `#/components/schemas/Name`.
    Reference(String),
}

/// `additionalProperties` tri-state.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    #[default]
    False,
    True,
    Schema(Box<Schema>),
}

/// A fully-qualified type name: the JSON-pointer-shaped path the name was
/// assigned from, and the target-language path it renders to.
///
/// Both halves are produced together by the Type Assigner (spec.md §4.3)
/// so a `TypeName` is always traceable back to its OpenAPI origin for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName {
    /// e.g. `#/components/schemas/Pet`.
    pub json_path: String,
    /// e.g. `Components.Schemas.Pet`, dot-separated nesting.
    pub swift_path: Vec<String>,
}

impl TypeName {
    pub fn new(json_path: impl Into<String>, swift_path: Vec<String>) -> Self {
        Self {
            json_path: json_path.into(),
            swift_path,
        }
    }

    /// Render the Swift path as `A.B.C`.
    pub fn swift_name(&self) -> String {
        self.swift_path.join(".")
    }

    /// The last path component — the bare type identifier.
    pub fn short_name(&self) -> &str {
        self.swift_path.last().map_or("", String::as_str)
    }

    /// Build a nested name: `self.foo` → `Components.Schemas.Bar.foo`.
    pub fn nested(&self, child: impl Into<String>) -> Self {
        let mut swift_path = self.swift_path.clone();
        swift_path.push(child.into());
        Self {
            json_path: format!("{}/{}", self.json_path, swift_path.last().unwrap()),
            swift_path,
        }
    }
}

/// A [`TypeName`] plus usage-site modifiers (spec.md §3 "TypeUsage").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeUsage {
    pub name: TypeName,
    pub optional: bool,
    pub array: bool,
    /// A wrapper such as the multipart part wrapper (spec.md §3).
    pub wrapper: Option<String>,
    /// True if this usage must go through `Boxed<T>` indirection
    /// (spec.md §4.5 "Recursion", §4.7).
    pub boxed: bool,
}

impl TypeUsage {
    pub fn required(name: TypeName) -> Self {
        Self {
            name,
            optional: false,
            array: false,
            wrapper: None,
            boxed: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn boxed(mut self) -> Self {
        self.boxed = true;
        self
    }

    /// Render this usage as a Swift type expression, e.g. `[String]?`,
    /// `Boxed<Components.Schemas.Pet>`.
    pub fn swift_type(&self) -> String {
        let mut base = self.name.swift_name();
        if self.boxed {
            base = format!("Boxed<{base}>");
        }
        if self.array {
            base = format!("[{base}]");
        }
        if let Some(wrapper) = &self.wrapper {
            base = format!("{wrapper}<{base}>");
        }
        if self.optional {
            base = format!("{base}?");
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_map_preserves_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        map.insert("mid", 3);
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn ordered_map_insert_overwrites_in_place() {
        let mut map = OrderedMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("a", 99);
        assert_eq!(map.get("a"), Some(&99));
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["a", "b"], "overwrite must not move the key");
    }

    #[test]
    fn type_usage_swift_type_rendering() {
        let name = TypeName::new("#/components/schemas/Pet", vec!["Components".into(), "Schemas".into(), "Pet".into()]);
        let usage = TypeUsage::required(name.clone()).array().optional();
        assert_eq!(usage.swift_type(), "[Components.Schemas.Pet]?");

        let boxed = TypeUsage::required(name).boxed();
        assert_eq!(boxed.swift_type(), "Boxed<Components.Schemas.Pet>");
    }

    #[test]
    fn type_name_nested_builds_child_path() {
        let bar = TypeName::new(
            "#/components/schemas/Bar",
            vec!["Components".into(), "Schemas".into(), "Bar".into()],
        );
        let nested = bar.nested("fooPayload");
        assert_eq!(nested.swift_name(), "Components.Schemas.Bar.fooPayload");
    }
}
