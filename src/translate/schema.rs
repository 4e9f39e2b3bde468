//! Schema Translator (spec.md §4.5): turns `components.schemas` (and any
//! inline schema reachable from an operation) into IR declarations.
//!
//! Every OpenAPI schema node becomes either a type alias to a Swift
//! builtin/opaque container, or a nominal declaration (struct/enum) with
//! a name from the [`TypeAssigner`]. Nominal declarations synthesized for
//! inline (non-`$ref`) nested schemas are nested *inside* their
//! container's `members`, matching the `Bar.fooPayload` convention
//! (spec.md §4.3).

use std::collections::{HashMap, HashSet};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{AdditionalProperties, Document, Schema, TypeName, TypeUsage};
use crate::error::{Error, Result};
use crate::graph::CycleAnalysis;
use crate::ir::{
    Access, AssociatedValue, Declaration, DeclarationKind, EnumCase, EnumCaseKind, EnumDecl,
    Expression, FunctionDecl, FunctionParameter, StructDecl, TypeAliasDecl, VariableDecl,
    VariableKind,
};
use crate::naming::{self, NamingStrategy, TypeAssigner};
use crate::support::Support;

const OPAQUE_CONTAINER: &str = "OpenAPIRuntime.OpenAPIValueContainer";
const STANDARD_CONFORMANCES: &[&str] = &["Codable", "Hashable", "Sendable"];

pub struct SchemaTranslator<'a> {
    assigner: &'a mut TypeAssigner,
    strategy: NamingStrategy,
    cycles: &'a CycleAnalysis,
    support: &'a HashMap<String, Support>,
    component_names: HashMap<String, TypeName>,
}

impl<'a> SchemaTranslator<'a> {
    pub fn new(
        document: &Document,
        assigner: &'a mut TypeAssigner,
        strategy: NamingStrategy,
        cycles: &'a CycleAnalysis,
        support: &'a HashMap<String, Support>,
    ) -> Self {
        let mut component_names = HashMap::new();
        let scope = vec!["Components".to_string(), "Schemas".to_string()];
        for name in document.components.schemas.keys() {
            let json_path = format!("#/components/schemas/{name}");
            let assigned = assigner.assign(strategy, json_path, &scope, name);
            component_names.insert(name.to_string(), assigned);
        }

        Self {
            assigner,
            strategy,
            cycles,
            support,
            component_names,
        }
    }

    /// Translate every `components.schemas` entry, in document order.
    pub fn translate_components(
        &mut self,
        document: &Document,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::with_capacity(document.components.schemas.len());
        for (name, schema) in document.components.schemas.iter() {
            let type_name = self.component_names[name].clone();
            let json_path = format!("#/components/schemas/{name}");
            let boxed = self.cycles.is_boxed(name);
            let decl = self.translate_named(&type_name, &json_path, schema, boxed, sink)?;
            declarations.push(decl);
        }
        Ok(declarations)
    }

    /// Resolve a referenced component name to its already-assigned
    /// [`TypeUsage`], applying the cycle analyzer's boxing decision.
    pub fn resolve_reference(&self, reference: &str, location: Option<String>) -> Result<TypeUsage> {
        let name = reference
            .strip_prefix("#/components/schemas/")
            .ok_or_else(|| Error::UnresolvedReference {
                reference: reference.to_string(),
                location: location.clone(),
            })?;
        let type_name = self
            .component_names
            .get(name)
            .ok_or_else(|| Error::UnresolvedReference {
                reference: reference.to_string(),
                location,
            })?;
        let mut usage = TypeUsage::required(type_name.clone());
        if self.cycles.is_boxed(name) {
            usage = usage.boxed();
        }
        Ok(usage)
    }

    /// Translate a top-level (already-named) schema into its declaration.
    fn translate_named(
        &mut self,
        name: &TypeName,
        json_path: &str,
        schema: &Schema,
        boxed_self: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        if matches!(self.support.get(json_path), Some(Support::Unsupported(_))) {
            return Ok(opaque_alias(name));
        }

        match schema {
            Schema::Object {
                properties,
                required,
                additional_properties,
                nullable_properties,
            } => self.build_struct(
                name,
                json_path,
                properties,
                required,
                additional_properties,
                nullable_properties,
                sink,
            ),
            Schema::OneOf {
                variants,
                discriminator,
            } => self.build_one_of(name, json_path, variants, discriminator.as_ref(), boxed_self, sink),
            Schema::AnyOf(members) => self.build_any_of(name, json_path, members, sink),
            Schema::AllOf(members) => self.build_all_of(name, json_path, members, sink),
            Schema::String {
                r#enum: Some(values),
                ..
            } => Ok(self.build_string_enum(name, values)),
            Schema::Integer {
                r#enum: Some(values),
                ..
            } => Ok(self.build_int_enum(name, values)),
            Schema::Reference(reference) => Ok(Declaration::new(DeclarationKind::TypeAlias(TypeAliasDecl {
                access: Access::Public,
                name: name.short_name().to_string(),
                target: self.resolve_reference(reference, Some(json_path.to_string()))?,
            }))),
            Schema::Array { items } => {
                let usage = self.simple_item_usage(items.as_deref(), json_path, sink)?.array();
                Ok(Declaration::new(DeclarationKind::TypeAlias(TypeAliasDecl {
                    access: Access::Public,
                    name: name.short_name().to_string(),
                    target: usage,
                })))
            }
            _ => Ok(Declaration::new(DeclarationKind::TypeAlias(TypeAliasDecl {
                access: Access::Public,
                name: name.short_name().to_string(),
                target: self.builtin_usage(schema, json_path)?,
            }))),
        }
    }

    /// Resolve an array's item type for a *top-level* array alias, where
    /// there is no struct body to nest an anonymous item type inside.
    /// Inline object/enum items fall back to the opaque container with a
    /// warning rather than synthesizing an orphaned sibling declaration.
    fn simple_item_usage(
        &mut self,
        items: Option<&Schema>,
        json_path: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<TypeUsage> {
        let Some(items) = items else {
            return Ok(TypeUsage::required(TypeName::new(
                json_path,
                vec![OPAQUE_CONTAINER.to_string()],
            )));
        };
        match items {
            Schema::Reference(reference) => self.resolve_reference(reference, Some(format!("{json_path}/items"))),
            Schema::Object { .. } | Schema::OneOf { .. } | Schema::AnyOf(_) | Schema::AllOf(_) => {
                sink.emit(
                    Diagnostic::warning(
                        "anonymous nested schema as a top-level array's item type is not supported; \
                         using the opaque value container",
                    )
                    .with_context("foundIn", json_path),
                )?;
                Ok(TypeUsage::required(TypeName::new(
                    json_path,
                    vec![OPAQUE_CONTAINER.to_string()],
                )))
            }
            scalar => self.builtin_usage(scalar, &format!("{json_path}/items")),
        }
    }

    /// The naming strategy this translator was constructed with, so
    /// sibling translators (operation, multipart) can assign names in
    /// the same style.
    pub fn strategy(&self) -> NamingStrategy {
        self.strategy
    }

    /// Assign a name directly under `scope` (used by the Operation
    /// Translator for `Operations.<id>.Input`/`Output` and their nested
    /// parameter-location groups, which aren't schema-derived).
    pub fn assign_in(&mut self, json_path: impl Into<String>, scope: &[String], raw_name: &str) -> TypeName {
        self.assigner.assign(self.strategy, json_path, scope, raw_name)
    }

    /// Assign the `Operations.<operationId>` namespace name: unlike a
    /// schema's type name, this keeps the document's own `operationId`
    /// casing (spec.md §4.6's `Operations.getGreeting`, not
    /// `Operations.GetGreeting`) — member-style casing, not type-style.
    pub fn assign_operation_namespace(&mut self, json_path: impl Into<String>, operation_id: &str) -> TypeName {
        let candidate = match self.strategy {
            NamingStrategy::Defensive => naming::defensive_name(operation_id),
            NamingStrategy::Idiomatic => naming::idiomatic_member_name(operation_id),
        };
        self.assigner
            .assign_verbatim(json_path, &["Operations".to_string()], &candidate)
    }

    /// Resolve the usage for a schema found at a use-site (property type,
    /// array item, variant member): either a reference/builtin with no
    /// extra declaration, or a freshly named nested declaration.
    pub(crate) fn resolve_usage(
        &mut self,
        schema: &Schema,
        container: &TypeName,
        field_name: &str,
        json_path: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(TypeUsage, Option<Declaration>)> {
        if matches!(self.support.get(json_path), Some(Support::Unsupported(_))) {
            return Ok((
                TypeUsage::required(TypeName::new(json_path, vec![OPAQUE_CONTAINER.to_string()])),
                None,
            ));
        }

        match schema {
            Schema::Reference(reference) => {
                Ok((self.resolve_reference(reference, Some(json_path.to_string()))?, None))
            }
            Schema::Array { items } => {
                let (item_usage, nested) = match items {
                    Some(item_schema) => {
                        self.resolve_usage(item_schema, container, field_name, &format!("{json_path}/items"), sink)?
                    }
                    None => (
                        TypeUsage::required(TypeName::new(json_path, vec![OPAQUE_CONTAINER.to_string()])),
                        None,
                    ),
                };
                Ok((item_usage.array(), nested))
            }
            Schema::Object { .. } | Schema::OneOf { .. } | Schema::AnyOf(_) | Schema::AllOf(_) => {
                let nested_name = self.assigner.assign_nested(self.strategy, container, field_name, "Payload");
                let decl = self.translate_named(&nested_name, json_path, schema, false, sink)?;
                Ok((TypeUsage::required(nested_name), Some(decl)))
            }
            Schema::String {
                r#enum: Some(values),
                ..
            } => {
                let nested_name = self.assigner.assign_nested(self.strategy, container, field_name, "Payload");
                let decl = self.build_string_enum(&nested_name, values);
                Ok((TypeUsage::required(nested_name), Some(decl)))
            }
            Schema::Integer {
                r#enum: Some(values),
                ..
            } => {
                let nested_name = self.assigner.assign_nested(self.strategy, container, field_name, "Payload");
                let decl = self.build_int_enum(&nested_name, values);
                Ok((TypeUsage::required(nested_name), Some(decl)))
            }
            _ => Ok((self.builtin_usage(schema, json_path)?, None)),
        }
    }

    fn builtin_usage(&self, schema: &Schema, json_path: &str) -> Result<TypeUsage> {
        let swift_type = match schema {
            Schema::Fragment | Schema::Null => OPAQUE_CONTAINER.to_string(),
            Schema::Boolean => "Swift.Bool".to_string(),
            Schema::Integer { format, .. } => integer_swift_type(format.as_deref()).to_string(),
            Schema::Number { format } => number_swift_type(format.as_deref()).to_string(),
            Schema::String {
                format,
                content_media_type,
                ..
            } => string_swift_type(format.as_deref(), content_media_type.as_deref()).to_string(),
            Schema::Not(_) => OPAQUE_CONTAINER.to_string(),
            other => {
                return Err(Error::Diagnostic(format!(
                    "internal: builtin_usage called on non-scalar schema {other:?} at {json_path}"
                )))
            }
        };
        Ok(TypeUsage::required(TypeName::new(json_path, vec![swift_type])))
    }

    fn build_struct(
        &mut self,
        name: &TypeName,
        json_path: &str,
        properties: &crate::document::OrderedMap<Schema>,
        required: &[String],
        additional_properties: &AdditionalProperties,
        nullable_properties: &HashSet<String>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let mut nested_decls = Vec::new();
        let mut property_decls = Vec::new();
        // (member name, original JSON key, usage) — drives both the
        // CodingKeys enum and the explicit memberwise init below. Structs
        // are always `public` (spec.md §4.5), and Swift never synthesizes
        // a *public* memberwise initializer, only an internal one.
        let mut fields: Vec<(String, String, TypeUsage)> = Vec::new();

        for (prop_name, prop_schema) in properties.iter() {
            let prop_json_path = format!("{json_path}/properties/{prop_name}");
            let (mut usage, nested) =
                self.resolve_usage(prop_schema, name, prop_name, &prop_json_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            // `nullable` collapses into "optional field" per spec.md §4.5
            // regardless of `required`: a legal payload may still decode
            // this property to `null`.
            if !required.contains(&prop_name.to_string()) || nullable_properties.contains(prop_name) {
                usage = usage.optional();
            }

            let member_name = match self.strategy {
                NamingStrategy::Defensive => naming::defensive_name(prop_name),
                NamingStrategy::Idiomatic => naming::idiomatic_member_name(prop_name),
            };
            property_decls.push(Declaration::new(DeclarationKind::Variable(VariableDecl {
                access: Access::Public,
                kind: VariableKind::Var,
                is_static: false,
                name: member_name.clone(),
                usage: Some(usage.clone()),
                initializer: None,
            })));
            fields.push((member_name, prop_name.to_string(), usage));
        }

        let mut has_extras = false;
        if let AdditionalProperties::Schema(inner) = additional_properties {
            let (usage, nested) = self.resolve_usage(
                inner,
                name,
                "additionalProperties",
                &format!("{json_path}/additionalProperties"),
                sink,
            )?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            property_decls.push(Declaration::new(DeclarationKind::Variable(VariableDecl {
                access: Access::Public,
                kind: VariableKind::Var,
                is_static: false,
                name: "additionalProperties".to_string(),
                usage: Some(usage.clone().array()),
                initializer: None,
            })));
            has_extras = true;
        } else if matches!(additional_properties, AdditionalProperties::True) {
            sink.emit(
                Diagnostic::note("additionalProperties: true has no static type; extra keys are dropped")
                    .with_context("foundIn", json_path),
            )?;
        }

        let extras = has_extras.then(|| {
            let usage = property_decls
                .last()
                .and_then(|d| match &d.kind {
                    DeclarationKind::Variable(v) => v.usage.clone(),
                    _ => None,
                })
                .expect("additionalProperties variable was just pushed");
            ("additionalProperties".to_string(), usage)
        });
        let coding_keys = build_coding_keys(&fields);
        let init = build_memberwise_init(&fields, extras);

        let mut members = nested_decls;
        members.push(coding_keys);
        members.extend(property_decls);
        members.push(init);

        Ok(Declaration::new(DeclarationKind::Struct(StructDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            conformances: STANDARD_CONFORMANCES.iter().map(|s| (*s).to_string()).collect(),
            members,
        })))
    }

    fn build_one_of(
        &mut self,
        name: &TypeName,
        json_path: &str,
        variants: &[Schema],
        discriminator: Option<&crate::document::Discriminator>,
        boxed_self: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let mut nested_decls = Vec::new();
        let mut cases = Vec::new();
        // (case name, its rendered Swift type, the key used to look it up
        // in the discriminator mapping) — feeds the custom Codable
        // methods below. Swift doesn't auto-synthesize `Codable` for an
        // enum with associated values, so one oneOf always needs either
        // discriminator-driven or try-each-variant decode/encode logic.
        let mut case_info: Vec<(String, String, String)> = Vec::new();

        for (i, variant) in variants.iter().enumerate() {
            let field_name = format!("case{i}");
            let variant_path = format!("{json_path}/oneOf/{i}");
            let (usage, nested) = self.resolve_usage(variant, name, &field_name, &variant_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            let case_name = naming::idiomatic_member_name(usage.name.short_name());
            let swift_type = usage.swift_type();
            let mapping_key = match variant {
                Schema::Reference(reference) => reference
                    .strip_prefix("#/components/schemas/")
                    .map_or_else(|| case_name.clone(), str::to_string),
                _ => case_name.clone(),
            };
            case_info.push((case_name.clone(), swift_type, mapping_key));
            cases.push(EnumCase {
                name: case_name,
                kind: EnumCaseKind::AssociatedValue(vec![AssociatedValue {
                    label: None,
                    usage,
                }]),
            });
        }

        let codable_members = match discriminator {
            Some(disc) => build_discriminated_codable(disc, &case_info),
            None => build_undiscriminated_codable(&case_info),
        };

        let mut members = nested_decls;
        members.extend(codable_members);

        Ok(Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            indirect: boxed_self,
            conformances: STANDARD_CONFORMANCES.iter().map(|s| (*s).to_string()).collect(),
            cases,
            members,
        })))
    }

    fn build_any_of(
        &mut self,
        name: &TypeName,
        json_path: &str,
        members: &[Schema],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let mut nested_decls = Vec::new();
        let mut property_decls = Vec::new();
        let mut field_types: Vec<(String, String)> = Vec::new();

        for (i, member) in members.iter().enumerate() {
            let field_name = format!("value{}", i + 1);
            let member_path = format!("{json_path}/anyOf/{i}");
            let (usage, nested) = self.resolve_usage(member, name, &field_name, &member_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            let usage = usage.optional();
            field_types.push((field_name.clone(), usage.swift_type().trim_end_matches('?').to_string()));
            property_decls.push(Declaration::new(DeclarationKind::Variable(VariableDecl {
                access: Access::Public,
                kind: VariableKind::Var,
                is_static: false,
                name: field_name,
                usage: Some(usage),
                initializer: None,
            })));
        }

        sink.emit(
            Diagnostic::note(
                "anyOf is translated as a struct with one optional property per variant; \
                 at least one must be set at decode time",
            )
            .with_context("foundIn", json_path),
        )?;

        let mut decl_members = nested_decls;
        decl_members.extend(property_decls);
        decl_members.extend(build_any_of_codable(&field_types));

        Ok(Declaration::new(DeclarationKind::Struct(StructDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            conformances: STANDARD_CONFORMANCES.iter().map(|s| (*s).to_string()).collect(),
            members: decl_members,
        })))
    }

    fn build_all_of(
        &mut self,
        name: &TypeName,
        json_path: &str,
        members: &[Schema],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        // Each allOf branch becomes its own stored property rather than a
        // merged flat struct: merging foreign (`$ref`) members' properties
        // would require re-reading their declarations, which the
        // translator doesn't keep indexed by structure. Noted as a
        // documented simplification (see DESIGN.md).
        let mut nested_decls = Vec::new();
        let mut property_decls = Vec::new();
        let mut field_types: Vec<(String, String)> = Vec::new();

        for (i, member) in members.iter().enumerate() {
            let field_name = format!("value{}", i + 1);
            let member_path = format!("{json_path}/allOf/{i}");
            let (usage, nested) = self.resolve_usage(member, name, &field_name, &member_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            field_types.push((field_name.clone(), usage.swift_type()));
            property_decls.push(Declaration::new(DeclarationKind::Variable(VariableDecl {
                access: Access::Public,
                kind: VariableKind::Var,
                is_static: false,
                name: field_name,
                usage: Some(usage),
                initializer: None,
            })));
        }

        let mut decl_members = nested_decls;
        decl_members.extend(property_decls);
        decl_members.extend(build_all_of_codable(&field_types));

        Ok(Declaration::new(DeclarationKind::Struct(StructDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            conformances: STANDARD_CONFORMANCES.iter().map(|s| (*s).to_string()).collect(),
            members: decl_members,
        })))
    }

    fn build_string_enum(&mut self, name: &TypeName, values: &[String]) -> Declaration {
        let mut seen = std::collections::HashSet::new();
        let mut cases = Vec::with_capacity(values.len());
        for value in values {
            let mut case_name = match self.strategy {
                NamingStrategy::Defensive => naming::defensive_name(value),
                NamingStrategy::Idiomatic => naming::idiomatic_member_name(value),
            };
            while !seen.insert(case_name.clone()) {
                case_name.push('_');
            }
            cases.push(EnumCase {
                name: case_name,
                kind: EnumCaseKind::RawValue(value.clone()),
            });
        }

        Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            indirect: false,
            conformances: {
                let mut c: Vec<String> = STANDARD_CONFORMANCES.iter().map(|s| (*s).to_string()).collect();
                c.push("Swift.String".to_string());
                c.push("CaseIterable".to_string());
                c
            },
            cases,
            members: Vec::new(),
        }))
    }

    /// `integer` + `enum` (spec.md §4.5): an `Int`-backed enum, one case
    /// per value. Mirrors [`Self::build_string_enum`]; the renderer tells
    /// the two apart by checking whether `Swift.Int` or `Swift.String`
    /// is in `conformances` when it decides whether to quote a raw value.
    fn build_int_enum(&mut self, name: &TypeName, values: &[i64]) -> Declaration {
        let mut seen = std::collections::HashSet::new();
        let mut cases = Vec::with_capacity(values.len());
        for value in values {
            let mut case_name = naming::defensive_name(&value.to_string());
            while !seen.insert(case_name.clone()) {
                case_name.push('_');
            }
            cases.push(EnumCase {
                name: case_name,
                kind: EnumCaseKind::RawValue(value.to_string()),
            });
        }

        Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            indirect: false,
            conformances: {
                let mut c: Vec<String> = STANDARD_CONFORMANCES.iter().map(|s| (*s).to_string()).collect();
                c.push("Swift.Int".to_string());
                c.push("CaseIterable".to_string());
                c
            },
            cases,
            members: Vec::new(),
        }))
    }
}

/// `enum CodingKeys: String, CodingKey { case ... = "..." }` mapping each
/// stored property to its original JSON key (spec.md §4.5). Synthetic
/// fields (the `additionalProperties` extras array, allOf/anyOf's
/// `valueN` members) have no JSON key of their own and are never passed
/// in here.
fn build_coding_keys(fields: &[(String, String, TypeUsage)]) -> Declaration {
    let cases = fields
        .iter()
        .map(|(member, json_key, _)| EnumCase {
            name: member.clone(),
            kind: EnumCaseKind::RawValue(json_key.clone()),
        })
        .collect();

    Declaration::new(DeclarationKind::Enum(EnumDecl {
        access: Access::Internal,
        name: "CodingKeys".to_string(),
        indirect: false,
        conformances: vec!["Swift.String".to_string(), "Swift.CodingKey".to_string()],
        cases,
        members: Vec::new(),
    }))
}

/// An explicit `public init(...)` in property-declaration order. Swift
/// only synthesizes a memberwise initializer at `internal` access, so a
/// `public struct` needs this to be constructible from outside its module.
fn build_memberwise_init(fields: &[(String, String, TypeUsage)], extras: Option<(String, TypeUsage)>) -> Declaration {
    let mut parameters: Vec<FunctionParameter> = fields
        .iter()
        .map(|(member, _, usage)| FunctionParameter {
            label: None,
            name: member.clone(),
            usage: usage.clone(),
            default: usage.optional.then(|| Expression::Raw("nil".to_string())),
        })
        .collect();
    let mut body: Vec<Expression> = fields
        .iter()
        .map(|(member, _, _)| Expression::Raw(format!("self.{member} = {member}")))
        .collect();

    if let Some((name, usage)) = extras {
        parameters.push(FunctionParameter {
            label: None,
            name: name.clone(),
            usage,
            default: Some(Expression::Raw("[]".to_string())),
        });
        body.push(Expression::Raw(format!("self.{name} = {name}")));
    }

    Declaration::new(DeclarationKind::Function(FunctionDecl {
        access: Access::Public,
        name: "init".to_string(),
        is_static: false,
        is_async: false,
        is_throwing: false,
        parameters,
        return_type: None,
        body,
    }))
}

fn decoder_parameter() -> FunctionParameter {
    FunctionParameter {
        label: Some("from".to_string()),
        name: "decoder".to_string(),
        usage: TypeUsage::required(TypeName::new(String::new(), vec!["Swift.Decoder".to_string()])),
        default: None,
    }
}

fn encoder_parameter() -> FunctionParameter {
    FunctionParameter {
        label: Some("to".to_string()),
        name: "encoder".to_string(),
        usage: TypeUsage::required(TypeName::new(String::new(), vec!["Swift.Encoder".to_string()])),
        default: None,
    }
}

fn codable_init(body: String) -> Declaration {
    Declaration::new(DeclarationKind::Function(FunctionDecl {
        access: Access::Public,
        name: "init".to_string(),
        is_static: false,
        is_async: false,
        is_throwing: true,
        parameters: vec![decoder_parameter()],
        return_type: None,
        body: vec![Expression::Raw(body)],
    }))
}

fn codable_encode(body: String) -> Declaration {
    Declaration::new(DeclarationKind::Function(FunctionDecl {
        access: Access::Public,
        name: "encode".to_string(),
        is_static: false,
        is_async: false,
        is_throwing: true,
        parameters: vec![encoder_parameter()],
        return_type: None,
        body: vec![Expression::Raw(body)],
    }))
}

/// Discriminator-driven `Codable` for a oneOf: peek the discriminator
/// property, map its value to a case via the explicit mapping (falling
/// back to the referenced component's own name per spec.md §4.5), decode
/// that one case, and fail on anything else.
fn build_discriminated_codable(
    discriminator: &crate::document::Discriminator,
    case_info: &[(String, String, String)],
) -> Vec<Declaration> {
    let mut value_by_ref: HashMap<&str, &str> = HashMap::new();
    for (value, reference) in discriminator.mapping.iter() {
        if let Some(short) = reference.strip_prefix("#/components/schemas/") {
            value_by_ref.insert(short, value);
        }
    }

    let mut decode_arms = String::new();
    let mut encode_arms = String::new();
    for (case_name, swift_type, mapping_key) in case_info {
        let discriminator_value = value_by_ref.get(mapping_key.as_str()).copied().unwrap_or(mapping_key.as_str());
        decode_arms.push_str(&format!(
            "        case \"{discriminator_value}\": self = .{case_name}(try {swift_type}(from: decoder))\n"
        ));
        encode_arms.push_str(&format!("        case let .{case_name}(value): try value.encode(to: encoder)\n"));
    }

    let discriminator_key_enum = Declaration::new(DeclarationKind::Enum(EnumDecl {
        access: Access::Private,
        name: "DiscriminatorKey".to_string(),
        indirect: false,
        conformances: vec!["Swift.String".to_string(), "Swift.CodingKey".to_string()],
        cases: vec![EnumCase {
            name: "discriminator".to_string(),
            kind: EnumCaseKind::RawValue(discriminator.property_name.clone()),
        }],
        members: Vec::new(),
    }));

    let init = codable_init(format!(
        "let container = try decoder.container(keyedBy: DiscriminatorKey.self)\n\
         let discriminatorValue = try container.decode(Swift.String.self, forKey: .discriminator)\n\
         switch discriminatorValue {{\n\
         {decode_arms}\
         default:\n\
             throw Swift.DecodingError.dataCorruptedError(\n\
                 forKey: .discriminator,\n\
                 in: container,\n\
                 debugDescription: \"unknown discriminator value '\\(discriminatorValue)'\"\n\
             )\n\
         }}"
    ));
    let encode = codable_encode(format!("switch self {{\n{encode_arms}}}"));

    vec![discriminator_key_enum, init, encode]
}

/// Try-each-variant `Codable` for an undiscriminated oneOf (spec.md §4.5,
/// §9 open question): attempt each case's own `Decodable` conformance in
/// declaration order, keeping the first one that succeeds.
fn build_undiscriminated_codable(case_info: &[(String, String, String)]) -> Vec<Declaration> {
    let mut decode_body = String::new();
    let mut encode_arms = String::new();
    for (case_name, swift_type, _) in case_info {
        decode_body.push_str(&format!(
            "if let value = try? {swift_type}(from: decoder) {{\n    self = .{case_name}(value)\n    return\n}}\n"
        ));
        encode_arms.push_str(&format!("        case let .{case_name}(value): try value.encode(to: encoder)\n"));
    }
    decode_body.push_str(
        "let context = Swift.DecodingError.Context(\n\
             codingPath: decoder.codingPath,\n\
             debugDescription: \"no case of this oneOf matched the input\"\n\
         )\n\
         throw Swift.DecodingError.typeMismatch(Self.self, context)",
    );

    vec![
        codable_init(decode_body),
        codable_encode(format!("switch self {{\n{encode_arms}}}")),
    ]
}

/// allOf's `Codable`: every branch is decoded from (and encoded to) the
/// *same* container, since an allOf composes sibling properties of one
/// JSON object rather than nesting them under per-branch keys.
fn build_all_of_codable(case_names: &[(String, String)]) -> Vec<Declaration> {
    let mut decode_body = String::new();
    let mut encode_body = String::new();
    for (field_name, swift_type) in case_names {
        decode_body.push_str(&format!("self.{field_name} = try {swift_type}(from: decoder)\n"));
        encode_body.push_str(&format!("try {field_name}.encode(to: encoder)\n"));
    }
    vec![codable_init(decode_body), codable_encode(encode_body)]
}

/// anyOf's `Codable`: decode each branch optimistically, then require at
/// least one to have succeeded (spec.md §4.5's "at least one must be set"
/// note). Encode whichever branches are present.
fn build_any_of_codable(case_names: &[(String, String)]) -> Vec<Declaration> {
    let mut decode_body = String::new();
    for (field_name, swift_type) in case_names {
        decode_body.push_str(&format!("self.{field_name} = try? {swift_type}(from: decoder)\n"));
    }
    let all_nil_check = case_names
        .iter()
        .map(|(field_name, _)| format!("self.{field_name} == nil"))
        .collect::<Vec<_>>()
        .join(" && ");
    decode_body.push_str(&format!(
        "if {all_nil_check} {{\n\
             let context = Swift.DecodingError.Context(\n\
                 codingPath: decoder.codingPath,\n\
                 debugDescription: \"no branch of this anyOf matched the input\"\n\
             )\n\
             throw Swift.DecodingError.valueNotFound(Self.self, context)\n\
         }}"
    ));

    let mut encode_body = String::new();
    for (field_name, _) in case_names {
        encode_body.push_str(&format!("try {field_name}?.encode(to: encoder)\n"));
    }

    vec![codable_init(decode_body), codable_encode(encode_body)]
}

fn opaque_alias(name: &TypeName) -> Declaration {
    Declaration::new(DeclarationKind::TypeAlias(TypeAliasDecl {
        access: Access::Public,
        name: name.short_name().to_string(),
        target: TypeUsage::required(TypeName::new(
            name.json_path.clone(),
            vec![OPAQUE_CONTAINER.to_string()],
        )),
    }))
}

fn integer_swift_type(format: Option<&str>) -> &'static str {
    match format {
        Some("int32") => "Swift.Int32",
        Some("int64") => "Swift.Int64",
        _ => "Swift.Int",
    }
}

fn number_swift_type(format: Option<&str>) -> &'static str {
    match format {
        Some("float") => "Swift.Float",
        _ => "Swift.Double",
    }
}

fn string_swift_type(format: Option<&str>, content_media_type: Option<&str>) -> &'static str {
    match format {
        Some("date-time") => "Foundation.Date",
        Some("byte" | "binary") => "Foundation.Data",
        Some("uuid") => "Foundation.UUID",
        _ if content_media_type.is_some() => "Foundation.Data",
        _ => "Swift.String",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OrderedMap;
    use crate::diagnostics::StreamSink;
    use crate::naming::NameOverrides;

    fn doc_with_schemas(schemas: Vec<(&str, Schema)>) -> Document {
        let mut components = crate::document::Components::default();
        for (name, schema) in schemas {
            components.schemas.insert(name, schema);
        }
        Document {
            openapi: "3.1.0".to_string(),
            info: crate::document::Info::default(),
            paths: OrderedMap::new(),
            components,
            servers: Vec::new(),
        }
    }

    fn scalar_string() -> Schema {
        Schema::String {
            format: None,
            content_encoding: None,
            content_media_type: None,
            r#enum: None,
        }
    }

    #[test]
    fn scalar_schema_becomes_type_alias() {
        let document = doc_with_schemas(vec![("PetId", scalar_string())]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let mut translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let mut sink = StreamSink::silent();
        let decls = translator.translate_components(&document, &mut sink).unwrap();
        assert_eq!(decls.len(), 1);
        assert!(matches!(decls[0].kind, DeclarationKind::TypeAlias(_)));
    }

    #[test]
    fn object_schema_becomes_struct_with_optional_for_non_required() {
        let mut properties = OrderedMap::new();
        properties.insert("name", scalar_string());
        properties.insert("age", Schema::Integer { format: None, r#enum: None });
        let schema = Schema::Object {
            properties,
            required: vec!["name".to_string()],
            additional_properties: AdditionalProperties::False,
            nullable_properties: HashSet::new(),
        };
        let document = doc_with_schemas(vec![("Pet", schema)]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let mut translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let mut sink = StreamSink::silent();
        let decls = translator.translate_components(&document, &mut sink).unwrap();
        match &decls[0].kind {
            DeclarationKind::Struct(s) => {
                // CodingKeys enum + 2 stored properties + explicit init.
                assert_eq!(s.members.len(), 4);
                assert!(s.members.iter().any(|m| matches!(&m.kind, DeclarationKind::Enum(e) if e.name == "CodingKeys")));
                assert!(s.members.iter().any(|m| matches!(&m.kind, DeclarationKind::Function(f) if f.name == "init")));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn string_enum_becomes_enum_declaration() {
        let schema = Schema::String {
            format: None,
            content_encoding: None,
            content_media_type: None,
            r#enum: Some(vec!["available".to_string(), "sold".to_string()]),
        };
        let document = doc_with_schemas(vec![("Status", schema)]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let mut translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let mut sink = StreamSink::silent();
        let decls = translator.translate_components(&document, &mut sink).unwrap();
        match &decls[0].kind {
            DeclarationKind::Enum(e) => assert_eq!(e.cases.len(), 2),
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn undiscriminated_one_of_gets_try_each_codable() {
        let schema = Schema::OneOf {
            variants: vec![
                Schema::Reference("#/components/schemas/Cat".to_string()),
                Schema::Reference("#/components/schemas/Dog".to_string()),
            ],
            discriminator: None,
        };
        let document = doc_with_schemas(vec![
            ("Cat", Schema::Object {
                properties: OrderedMap::new(),
                required: Vec::new(),
                additional_properties: AdditionalProperties::False,
                nullable_properties: HashSet::new(),
            }),
            ("Dog", Schema::Object {
                properties: OrderedMap::new(),
                required: Vec::new(),
                additional_properties: AdditionalProperties::False,
                nullable_properties: HashSet::new(),
            }),
            ("Pet", schema),
        ]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let mut translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let mut sink = StreamSink::silent();
        let decls = translator.translate_components(&document, &mut sink).unwrap();
        let pet = &decls[2];
        match &pet.kind {
            DeclarationKind::Enum(e) => {
                assert_eq!(e.cases.len(), 2);
                let has_init = e
                    .members
                    .iter()
                    .any(|m| matches!(&m.kind, DeclarationKind::Function(f) if f.name == "init"));
                let has_encode = e
                    .members
                    .iter()
                    .any(|m| matches!(&m.kind, DeclarationKind::Function(f) if f.name == "encode"));
                assert!(has_init && has_encode);
                assert!(!e.members.iter().any(|m| matches!(&m.kind, DeclarationKind::Enum(inner) if inner.name == "DiscriminatorKey")));
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn discriminated_one_of_emits_discriminator_key_enum() {
        let mut mapping = OrderedMap::new();
        mapping.insert("cat", "#/components/schemas/Cat");
        let schema = Schema::OneOf {
            variants: vec![Schema::Reference("#/components/schemas/Cat".to_string())],
            discriminator: Some(crate::document::Discriminator {
                property_name: "petType".to_string(),
                mapping,
            }),
        };
        let document = doc_with_schemas(vec![
            ("Cat", Schema::Object {
                properties: OrderedMap::new(),
                required: Vec::new(),
                additional_properties: AdditionalProperties::False,
                nullable_properties: HashSet::new(),
            }),
            ("Pet", schema),
        ]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let mut translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let mut sink = StreamSink::silent();
        let decls = translator.translate_components(&document, &mut sink).unwrap();
        let pet = &decls[1];
        match &pet.kind {
            DeclarationKind::Enum(e) => {
                let discriminator_key = e
                    .members
                    .iter()
                    .find(|m| matches!(&m.kind, DeclarationKind::Enum(inner) if inner.name == "DiscriminatorKey"));
                assert!(discriminator_key.is_some());
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn all_of_struct_gets_delegating_codable() {
        let schema = Schema::AllOf(vec![
            Schema::Reference("#/components/schemas/Named".to_string()),
            Schema::Object {
                properties: OrderedMap::new(),
                required: Vec::new(),
                additional_properties: AdditionalProperties::False,
                nullable_properties: HashSet::new(),
            },
        ]);
        let document = doc_with_schemas(vec![
            ("Named", Schema::Object {
                properties: OrderedMap::new(),
                required: Vec::new(),
                additional_properties: AdditionalProperties::False,
                nullable_properties: HashSet::new(),
            }),
            ("Combined", schema),
        ]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let mut translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let mut sink = StreamSink::silent();
        let decls = translator.translate_components(&document, &mut sink).unwrap();
        match &decls[1].kind {
            DeclarationKind::Struct(s) => {
                assert!(s.members.iter().any(|m| matches!(&m.kind, DeclarationKind::Function(f) if f.name == "init")));
                assert!(s.members.iter().any(|m| matches!(&m.kind, DeclarationKind::Function(f) if f.name == "encode")));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_reference_raises_error() {
        let document = doc_with_schemas(vec![]);
        let mut assigner = TypeAssigner::new(NameOverrides::default());
        let cycles = CycleAnalysis::default();
        let support = HashMap::new();
        let translator =
            SchemaTranslator::new(&document, &mut assigner, NamingStrategy::Idiomatic, &cycles, &support);
        let result = translator.resolve_reference("#/components/schemas/Missing", None);
        assert!(matches!(result, Err(Error::UnresolvedReference { .. })));
    }
}
