//! Type Assigner (spec.md §4.3): assigns stable, collision-free
//! target-language names to every Document element that becomes a type.

use std::collections::{HashMap, HashSet};

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use crate::document::TypeName;

/// Which naming strategy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingStrategy {
    /// Character-by-character token substitution; collision-free by
    /// construction.
    Defensive,
    /// camelCase/`UpperCamelCase` normalization with conventional mapping;
    /// conflicts are diagnosed.
    Idiomatic,
}

/// Swift reserved words. The defensive strategy suffixes an identifier
/// with `_` when it collides with one of these.
const RESERVED_WORDS: &[&str] = &[
    "associatedtype",
    "class",
    "deinit",
    "enum",
    "extension",
    "fileprivate",
    "func",
    "import",
    "init",
    "inout",
    "internal",
    "let",
    "open",
    "operator",
    "private",
    "protocol",
    "public",
    "rethrows",
    "static",
    "struct",
    "subscript",
    "typealias",
    "var",
    "break",
    "case",
    "continue",
    "default",
    "defer",
    "do",
    "else",
    "fallthrough",
    "for",
    "guard",
    "if",
    "in",
    "repeat",
    "return",
    "switch",
    "where",
    "while",
    "Any",
    "as",
    "catch",
    "false",
    "is",
    "nil",
    "rethrows",
    "self",
    "Self",
    "super",
    "throw",
    "throws",
    "true",
    "try",
    "Type",
];

fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

/// A caller-supplied OpenAPI name → target name override map
/// (spec.md §4.3 "An overrides map ... takes precedence over both
/// strategies").
#[derive(Debug, Clone, Default)]
pub struct NameOverrides(HashMap<String, String>);

impl NameOverrides {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, openapi_name: &str) -> Option<&str> {
        self.0.get(openapi_name).map(String::as_str)
    }
}

/// Diagnosed naming conflicts under the idiomatic strategy, keyed by the
/// colliding Swift identifier.
#[derive(Debug, Default)]
pub struct NameConflicts {
    collisions: Vec<(String, Vec<String>)>,
}

impl NameConflicts {
    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    pub fn collisions(&self) -> &[(String, Vec<String>)] {
        &self.collisions
    }
}

/// Assigns names within one scope (e.g. `Components.Schemas`), tracking
/// everything already handed out so collisions are caught as they occur.
#[derive(Debug, Default)]
pub struct TypeAssigner {
    strategy_overrides: HashMap<String, NamingStrategy>,
    overrides: NameOverrides,
    /// Scope path → set of identifiers already used in that scope.
    used: HashMap<Vec<String>, HashSet<String>>,
    conflicts: NameConflicts,
}

impl TypeAssigner {
    pub fn new(overrides: NameOverrides) -> Self {
        Self {
            strategy_overrides: HashMap::new(),
            overrides,
            used: HashMap::new(),
            conflicts: NameConflicts::default(),
        }
    }

    pub fn conflicts(&self) -> &NameConflicts {
        &self.conflicts
    }

    /// Assign a type name for `openapi_name` (e.g. `"Pet.kind"`) nested
    /// under `parent`, using `strategy`. `json_path` is the JSON-pointer
    /// path this name was assigned from.
    pub fn assign(
        &mut self,
        strategy: NamingStrategy,
        json_path: impl Into<String>,
        parent: &[String],
        openapi_name: &str,
    ) -> TypeName {
        let json_path = json_path.into();

        if let Some(overridden) = self.overrides.get(openapi_name) {
            let mut swift_path = parent.to_vec();
            swift_path.push(overridden.to_string());
            return TypeName::new(json_path, swift_path);
        }

        let candidate = match strategy {
            NamingStrategy::Defensive => defensive_name(openapi_name),
            NamingStrategy::Idiomatic => idiomatic_type_name(openapi_name),
        };

        let resolved = self.reserve(parent, candidate, strategy);
        let mut swift_path = parent.to_vec();
        swift_path.push(resolved);
        TypeName::new(json_path, swift_path)
    }

    /// Assign a name that is already in its final casing (an operation's
    /// `enum <operationId>` namespace keeps the document's own
    /// `operationId` spelling rather than going through
    /// [`idiomatic_type_name`]/[`defensive_name`]'s type-casing rules —
    /// spec.md §4.6's `Operations.getGreeting.Input` keeps `getGreeting`
    /// verbatim). Still goes through the overrides map and collision
    /// resolution like any other assignment.
    pub fn assign_verbatim(&mut self, json_path: impl Into<String>, parent: &[String], cased_name: &str) -> TypeName {
        let json_path = json_path.into();
        if let Some(overridden) = self.overrides.get(cased_name) {
            let mut swift_path = parent.to_vec();
            swift_path.push(overridden.to_string());
            return TypeName::new(json_path, swift_path);
        }
        let resolved = self.reserve(parent, cased_name.to_string(), NamingStrategy::Defensive);
        let mut swift_path = parent.to_vec();
        swift_path.push(resolved);
        TypeName::new(json_path, swift_path)
    }

    /// Assign a nested type name, e.g. a property's inline object schema:
    /// `Components.Schemas.Bar.fooPayload` (spec.md §4.3).
    pub fn assign_nested(
        &mut self,
        strategy: NamingStrategy,
        container: &TypeName,
        property_name: &str,
        suffix: &str,
    ) -> TypeName {
        let base = match strategy {
            NamingStrategy::Defensive => defensive_name(property_name),
            NamingStrategy::Idiomatic => property_name.to_lower_camel_case(),
        };
        let child = format!("{base}{suffix}");
        let json_path = format!("{}/{child}", container.json_path);
        self.assign(strategy, json_path, &container.swift_path, &child)
    }

    fn reserve(
        &mut self,
        parent: &[String],
        mut candidate: String,
        strategy: NamingStrategy,
    ) -> String {
        let scope = self.used.entry(parent.to_vec()).or_default();
        if !scope.contains(&candidate) {
            scope.insert(candidate.clone());
            return candidate;
        }

        // Collision. Defensive names are unique by construction unless the
        // raw OpenAPI identifiers themselves collided post-mapping — still
        // resolve deterministically by suffixing a counter, and diagnose
        // under the idiomatic strategy as spec.md requires.
        if strategy == NamingStrategy::Idiomatic {
            self.conflicts
                .collisions
                .push((candidate.clone(), parent.to_vec()));
        }

        let mut n = 2u32;
        loop {
            let attempt = format!("{candidate}{n}");
            if !scope.contains(&attempt) {
                scope.insert(attempt.clone());
                candidate = attempt;
                break;
            }
            n += 1;
        }
        candidate
    }
}

/// Defensive strategy: replace every non-identifier character with a
/// deterministic token, prefix `_` if the result starts with a digit, and
/// suffix `_` if the result is a reserved word.
pub fn defensive_name(raw: &str) -> String {
    if raw.is_empty() {
        return "_empty".to_string();
    }

    let mut out = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push_str(defensive_token(ch));
        }
    }

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    if is_reserved(&out) {
        out.push('_');
    }

    out
}

fn defensive_token(ch: char) -> &'static str {
    match ch {
        '.' => "_period_",
        '$' => "_dollar_",
        '-' => "_hyphen_",
        '/' => "_slash_",
        ' ' => "_space_",
        '@' => "_at_",
        '+' => "_plus_",
        '%' => "_percent_",
        ':' => "_colon_",
        _ => "_char_",
    }
}

/// Idiomatic strategy for type names: `UpperCamelCase`.
pub fn idiomatic_type_name(raw: &str) -> String {
    let camel = raw.to_upper_camel_case();
    if camel.is_empty() {
        return defensive_name(raw);
    }
    let camel = if camel.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{camel}")
    } else {
        camel
    };
    if is_reserved(&camel) {
        format!("{camel}_")
    } else {
        camel
    }
}

/// Idiomatic strategy for member/method names: `lowerCamelCase`.
pub fn idiomatic_member_name(raw: &str) -> String {
    let camel = raw.to_lower_camel_case();
    if camel.is_empty() {
        return defensive_name(raw);
    }
    let camel = if camel.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{camel}")
    } else {
        camel
    };
    if is_reserved(&camel) {
        format!("{camel}_")
    } else {
        camel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defensive_name_maps_punctuation_to_tokens() {
        assert_eq!(defensive_name("foo.bar"), "foo_period_bar");
        assert_eq!(defensive_name("$ref"), "_dollar_ref");
        assert_eq!(defensive_name("x-api-key"), "x_hyphen_api_hyphen_key");
    }

    #[test]
    fn defensive_name_prefixes_leading_digit() {
        assert_eq!(defensive_name("200"), "_200");
    }

    #[test]
    fn defensive_name_suffixes_reserved_words() {
        assert_eq!(defensive_name("class"), "class_");
        assert_eq!(defensive_name("Type"), "Type_");
    }

    /// spec.md §8: "for every input identifier s, the emitted name
    /// contains only `[A-Za-z_][A-Za-z0-9_]*` and is not a reserved word."
    #[test]
    fn defensive_name_is_always_a_valid_safe_identifier() {
        let inputs = [
            "Pet", "pet-store", "foo.bar$baz", "200", "", "-", "class", "a b c", "100%",
        ];
        for input in inputs {
            let name = defensive_name(input);
            assert!(
                name.chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_'),
                "name {name:?} from {input:?} must start with a letter or underscore"
            );
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_'),
                "name {name:?} from {input:?} must be alnum/underscore only"
            );
            assert!(!is_reserved(&name), "name {name:?} must not be reserved");
        }
    }

    #[test]
    fn idiomatic_type_name_upper_camels() {
        assert_eq!(idiomatic_type_name("pet_store"), "PetStore");
        assert_eq!(idiomatic_type_name("pet-store"), "PetStore");
    }

    #[test]
    fn idiomatic_member_name_lower_camels() {
        assert_eq!(idiomatic_member_name("PetStore"), "petStore");
        assert_eq!(idiomatic_member_name("pet_store"), "petStore");
    }

    #[test]
    fn assigner_overrides_take_precedence() {
        let mut overrides = HashMap::new();
        overrides.insert("Pet".to_string(), "Animal".to_string());
        let mut assigner = TypeAssigner::new(NameOverrides::new(overrides));
        let name = assigner.assign(
            NamingStrategy::Idiomatic,
            "#/components/schemas/Pet",
            &["Components".into(), "Schemas".into()],
            "Pet",
        );
        assert_eq!(name.short_name(), "Animal");
    }

    #[test]
    fn assigner_resolves_collisions_deterministically() {
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let scope = vec!["Components".to_string(), "Schemas".to_string()];
        let first = assigner.assign(NamingStrategy::Defensive, "#/a", &scope, "Item");
        let second = assigner.assign(NamingStrategy::Defensive, "#/b", &scope, "Item");
        assert_eq!(first.short_name(), "Item");
        assert_eq!(second.short_name(), "Item2");
    }

    #[test]
    fn assigner_diagnoses_idiomatic_collisions() {
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let scope = vec!["Components".to_string(), "Schemas".to_string()];
        assigner.assign(NamingStrategy::Idiomatic, "#/a", &scope, "pet_store");
        assigner.assign(NamingStrategy::Idiomatic, "#/b", &scope, "PetStore");
        assert!(!assigner.conflicts().is_empty());
    }

    #[test]
    fn assign_nested_follows_container_path() {
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let bar = TypeName::new(
            "#/components/schemas/Bar",
            vec!["Components".into(), "Schemas".into(), "Bar".into()],
        );
        let nested = assigner.assign_nested(NamingStrategy::Idiomatic, &bar, "foo", "Payload");
        assert_eq!(nested.swift_name(), "Components.Schemas.Bar.fooPayload");
    }
}
