//! Pipeline driver (spec.md §2): wires every stage — Filter, Validator,
//! Support Prober, Reference/Cycle Analyzer, Type Assigner, Schema
//! Translator, Operation Translator, Sharding Planner, Renderer — into the
//! single `parse → filter → validate → translate → render` transformation
//! the rest of this crate exists to support.
//!
//! Modeled on a patch pipeline that threads a document through a fixed,
//! numbered sequence of phases, each one a thin call into another module
//! and a comment explaining why it has to run where it does.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::DiagnosticSink;
use crate::document::Document;
use crate::error::Result;
use crate::filter::{self, FilterCriteria};
use crate::graph::{self, CycleAnalysis};
use crate::ir::{
    Access as IrAccess, Declaration, DeclarationKind, EnumDecl, Expression, FunctionDecl,
    FunctionParameter, StructDecl, TypeAliasDecl, VariableDecl, VariableKind,
};
use crate::naming::{NameOverrides, NamingStrategy, TypeAssigner};
use crate::render;
use crate::shard::{self, BaseFileKind, ShardingConfig};
use crate::support;
use crate::translate::operation::{self, OperationTranslator};
use crate::translate::schema::SchemaTranslator;
use crate::validate;

/// What kind of Swift surface to emit (spec.md §6 `mode`). Exactly one of
/// these is produced per [`run`] call — never all three at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Types,
    Client,
    Server,
}

/// Access level for every pipeline-assembled wrapper declaration (the
/// `Components`/`Operations` namespaces, the `APIProtocol`, `Client`,
/// and the server registration function). Declarations synthesized
/// further down by the Schema/Operation Translators keep whatever access
/// they were already built with (spec.md §6 "access" applies at the
/// surface a consumer imports, not to every nested member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessLevel {
    Public,
    Package,
    #[default]
    Internal,
    FilePrivate,
    Private,
}

impl AccessLevel {
    fn to_ir(self) -> IrAccess {
        match self {
            Self::Public => IrAccess::Public,
            Self::Package => IrAccess::Package,
            Self::Internal => IrAccess::Internal,
            Self::FilePrivate => IrAccess::FilePrivate,
            Self::Private => IrAccess::Private,
        }
    }
}

/// One rendered Swift source file.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub contents: String,
}

/// Everything [`run`] needs beyond the parsed [`Document`] (spec.md §6).
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub access: AccessLevel,
    pub additional_imports: Vec<String>,
    pub filter: FilterCriteria,
    pub naming_strategy: NamingStrategy,
    pub name_overrides: HashMap<String, String>,
    pub feature_flags: HashSet<String>,
    /// `schemas`: component name -> fully-qualified Swift type the
    /// generated alias should point to, bypassing the synthesized
    /// declaration for that name entirely (spec.md §6 `typeOverrides`).
    pub type_overrides: HashMap<String, String>,
    pub sharding: Option<ShardingConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Types,
            access: AccessLevel::Public,
            additional_imports: Vec::new(),
            filter: FilterCriteria::default(),
            naming_strategy: NamingStrategy::Idiomatic,
            name_overrides: HashMap::new(),
            feature_flags: HashSet::new(),
            type_overrides: HashMap::new(),
            sharding: None,
        }
    }
}

/// Run the full pipeline against an already-parsed document, returning
/// the output files for `config.mode`.
pub fn run(document: &Document, config: &Config, sink: &mut dyn DiagnosticSink) -> Result<Vec<OutputFile>> {
    // Phase 1: Filter — every later stage only ever sees the operations
    // and schemas the caller actually asked for (spec.md §4.2).
    let filtered = filter::filter(document, &config.filter);

    // Phase 2: Validate — fatal reference errors surface here, before any
    // translation work is wasted on a broken document (spec.md §4.1).
    validate::validate(&filtered, sink)?;

    // Phase 3: Support probe — runs before translation so the Schema
    // Translator can consult it when it reaches an unsupported node,
    // rather than translating first and failing after the fact.
    let support_map = support::probe(&filtered, sink)?;

    // Phase 4: Reference/Cycle Analyzer — the Schema Translator's
    // constructor takes the resulting `&CycleAnalysis` by reference, so
    // this has to exist before step 5 (spec.md §2 dependency order).
    let cycles: CycleAnalysis = graph::analyze(&filtered.components.schemas)?;

    // Phase 5: Type assignment + schema translation.
    let overrides = NameOverrides::new(config.name_overrides.clone());
    let mut assigner = TypeAssigner::new(overrides);
    let mut schema_translator =
        SchemaTranslator::new(&filtered, &mut assigner, config.naming_strategy, &cycles, &support_map);
    let schema_decls = schema_translator.translate_components(&filtered, sink)?;

    // Pair each declaration back up with its component name: both
    // `document.components.schemas.keys()` and `translate_components`
    // iterate the same `OrderedMap` in the same order, so zipping is
    // exact (see `crate::document::OrderedMap`'s ordering guarantee).
    let named_schemas: Vec<(String, Declaration)> = filtered
        .components
        .schemas
        .keys()
        .map(str::to_string)
        .zip(schema_decls)
        .collect();

    // Phase 6: type overrides — replace the synthesized declaration for
    // any overridden schema with a typealias to the caller-supplied
    // target type, keeping the original assigned name so every other
    // declaration's `Components.Schemas.<Name>` reference still resolves
    // (spec.md §6 `typeOverrides`).
    let access = config.access.to_ir();
    let named_schemas: Vec<(String, Declaration)> = named_schemas
        .into_iter()
        .map(|(name, decl)| match config.type_overrides.get(&name) {
            Some(target) => (name, type_override_declaration(&decl, target)),
            None => (name, decl),
        })
        .collect();

    // Phase 7: operation translation, reusing the same schema translator
    // so operation input/output bodies resolve references through the
    // same `component_names` table (spec.md §4.6).
    let mut operation_translator = OperationTranslator::new(&mut schema_translator);
    let gen = operation_translator.translate_operations(&filtered, sink)?;
    let protocol_decl = operation::build_protocol_declaration(gen.protocol_requirements);

    let operation_members = match gen.operations_namespace.kind {
        DeclarationKind::Enum(EnumDecl { members, .. }) => members,
        _ => unreachable!("translate_operations always wraps operations in an Enum"),
    };

    // Phase 8: assemble and render the output set for `config.mode`.
    match config.mode {
        Mode::Types => render_types(named_schemas, operation_members, protocol_decl, access, config, &cycles),
        Mode::Client => Ok(vec![render_client(gen.client_methods, protocol_decl, access, config)]),
        Mode::Server => Ok(vec![render_server(gen.server_registrations, access, config)]),
    }
}

/// Replace a schema's synthesized declaration with a typealias pointing
/// at `target`, keeping the name the Type Assigner already handed out.
fn type_override_declaration(original: &Declaration, target: &str) -> Declaration {
    let name = declaration_name(original).to_string();
    Declaration::new(DeclarationKind::TypeAlias(TypeAliasDecl {
        access: IrAccess::Public,
        name,
        target: crate::document::TypeUsage::required(crate::document::TypeName::new(
            String::new(),
            vec![target.to_string()],
        )),
    }))
}

fn declaration_name(decl: &Declaration) -> &str {
    match &decl.kind {
        DeclarationKind::Struct(s) => &s.name,
        DeclarationKind::Enum(e) => &e.name,
        DeclarationKind::TypeAlias(t) => &t.name,
        DeclarationKind::Protocol(p) => &p.name,
        DeclarationKind::Function(f) => &f.name,
        DeclarationKind::Variable(v) => &v.name,
        DeclarationKind::Extension(_) => "",
    }
}

fn imports_for(config: &Config, runtime: bool) -> Vec<String> {
    let mut imports = Vec::new();
    if runtime {
        imports.push("Foundation".to_string());
        imports.push("OpenAPIRuntime".to_string());
    }
    imports.extend(config.additional_imports.iter().cloned());
    imports
}

fn components_declaration(schema_decls: Vec<Declaration>, access: IrAccess) -> Declaration {
    let schemas = Declaration::new(DeclarationKind::Enum(EnumDecl {
        access,
        name: "Schemas".to_string(),
        indirect: false,
        conformances: Vec::new(),
        cases: Vec::new(),
        members: schema_decls,
    }));
    Declaration::new(DeclarationKind::Enum(EnumDecl {
        access,
        name: "Components".to_string(),
        indirect: false,
        conformances: Vec::new(),
        cases: Vec::new(),
        members: vec![schemas],
    }))
}

fn operations_declaration(members: Vec<Declaration>, access: IrAccess) -> Declaration {
    Declaration::new(DeclarationKind::Enum(EnumDecl {
        access,
        name: "Operations".to_string(),
        indirect: false,
        conformances: Vec::new(),
        cases: Vec::new(),
        members,
    }))
}

fn render_types(
    named_schemas: Vec<(String, Declaration)>,
    operation_members: Vec<Declaration>,
    protocol_decl: Declaration,
    access: IrAccess,
    config: &Config,
    cycles: &CycleAnalysis,
) -> Result<Vec<OutputFile>> {
    let imports = imports_for(config, true);

    let Some(sharding) = &config.sharding else {
        let components = components_declaration(named_schemas.into_iter().map(|(_, decl)| decl).collect(), access);
        let operations = operations_declaration(operation_members, access);
        let contents = render::render_file(&imports, &[protocol_decl, components, operations]);
        return Ok(vec![OutputFile {
            name: "Types.swift".to_string(),
            contents,
        }]);
    };

    // Sharded output: the root file carries only the protocol, so every
    // layer/operation file can import it without depending on a specific
    // layer (spec.md §6).
    let known_schemas: HashSet<String> = named_schemas.iter().map(|(name, _)| name.clone()).collect();
    let schema_files = shard::plan_schemas(named_schemas, |name| cycles.layer_of(name), sharding);

    let named_operations: Vec<(String, Declaration, u32)> = operation_members
        .into_iter()
        .map(|decl| {
            let name = declaration_name(&decl).to_string();
            let mut refs = HashSet::new();
            shard::collect_known_references(&decl, &known_schemas, &mut refs);
            let layer = refs.iter().map(|r| cycles.layer_of(r)).max().unwrap_or(0);
            (name, decl, layer)
        })
        .collect();
    let operation_files = shard::plan_operations(named_operations, sharding);

    let prefix = sharding.module_prefix.as_deref();
    let mut outputs = Vec::with_capacity(schema_files.len() + operation_files.len() + 3);

    outputs.push(OutputFile {
        name: shard::base_file_name(BaseFileKind::Root, prefix),
        contents: render::render_file(&imports, std::slice::from_ref(&protocol_decl)),
    });

    outputs.push(OutputFile {
        name: shard::base_file_name(BaseFileKind::Components, prefix),
        contents: render::render_file(&imports, &[]),
    });
    for file in schema_files {
        outputs.push(OutputFile {
            name: file.name,
            contents: render::render_file(&imports, &file.declarations),
        });
    }

    outputs.push(OutputFile {
        name: shard::base_file_name(BaseFileKind::Operations, prefix),
        contents: render::render_file(&imports, &[]),
    });
    for file in operation_files {
        outputs.push(OutputFile {
            name: file.name,
            contents: render::render_file(&imports, &file.declarations),
        });
    }

    Ok(outputs)
}

fn render_client(
    client_methods: Vec<Declaration>,
    protocol_decl: Declaration,
    access: IrAccess,
    config: &Config,
) -> OutputFile {
    let transport_usage = crate::document::TypeUsage::required(crate::document::TypeName::new(
        String::new(),
        vec!["any OpenAPIRuntime.ClientTransport".to_string()],
    ));
    let url_usage = crate::document::TypeUsage::required(crate::document::TypeName::new(
        String::new(),
        vec!["Foundation.URL".to_string()],
    ));

    let server_url_field = Declaration::new(DeclarationKind::Variable(VariableDecl {
        access,
        kind: VariableKind::Let,
        is_static: false,
        name: "serverURL".to_string(),
        usage: Some(url_usage.clone()),
        initializer: None,
    }));
    let transport_field = Declaration::new(DeclarationKind::Variable(VariableDecl {
        access,
        kind: VariableKind::Let,
        is_static: false,
        name: "transport".to_string(),
        usage: Some(transport_usage.clone()),
        initializer: None,
    }));

    let init = Declaration::new(DeclarationKind::Function(FunctionDecl {
        access,
        name: "init".to_string(),
        is_static: false,
        is_async: false,
        is_throwing: false,
        parameters: vec![
            FunctionParameter {
                label: None,
                name: "serverURL".to_string(),
                usage: url_usage,
                default: None,
            },
            FunctionParameter {
                label: None,
                name: "transport".to_string(),
                usage: transport_usage,
                default: None,
            },
        ],
        return_type: None,
        body: vec![Expression::Raw(
            "self.serverURL = serverURL\nself.transport = transport".to_string(),
        )],
    }));

    let mut members = vec![server_url_field, transport_field, init];
    members.extend(client_methods);

    let client_struct = Declaration::new(DeclarationKind::Struct(StructDecl {
        access,
        name: "Client".to_string(),
        conformances: vec![protocol_name(&protocol_decl)],
        members,
    }));

    let imports = imports_for(config, true);
    let contents = render::render_file(&imports, &[client_struct]);
    OutputFile {
        name: "Client.swift".to_string(),
        contents,
    }
}

fn protocol_name(decl: &Declaration) -> String {
    match &decl.kind {
        DeclarationKind::Protocol(p) => p.name.clone(),
        _ => unreachable!("build_protocol_declaration always returns a Protocol"),
    }
}

fn render_server(server_registrations: Vec<Expression>, access: IrAccess, config: &Config) -> OutputFile {
    let transport_usage = crate::document::TypeUsage::required(crate::document::TypeName::new(
        String::new(),
        vec!["any OpenAPIRuntime.ServerTransport".to_string()],
    ));
    let implementation_usage = crate::document::TypeUsage::required(crate::document::TypeName::new(
        String::new(),
        vec!["any APIProtocol".to_string()],
    ));

    let register = Declaration::new(DeclarationKind::Function(FunctionDecl {
        access,
        name: "registerHandlers".to_string(),
        is_static: false,
        is_async: false,
        is_throwing: true,
        parameters: vec![
            FunctionParameter {
                label: Some("on".to_string()),
                name: "transport".to_string(),
                usage: transport_usage,
                default: None,
            },
            FunctionParameter {
                label: Some("using".to_string()),
                name: "implementation".to_string(),
                usage: implementation_usage,
                default: None,
            },
        ],
        return_type: None,
        body: server_registrations,
    }));

    let imports = imports_for(config, true);
    let contents = render::render_file(&imports, &[register]);
    OutputFile {
        name: "Server.swift".to_string(),
        contents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::StreamSink;
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
                  responses:
                    "200":
                      description: OK
                      content:
                        application/json:
                          schema:
                            $ref: '#/components/schemas/Pet'
            components:
              schemas:
                Pet:
                  type: object
                  properties:
                    name:
                      type: string
        "#};
        parser::parse(input.as_bytes()).unwrap()
    }

    #[test]
    fn types_mode_emits_a_single_file_with_components_and_operations() {
        let doc = sample();
        let config = Config::default();
        let mut sink = StreamSink::silent();
        let outputs = run(&doc, &config, &mut sink).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "Types.swift");
        assert!(outputs[0].contents.contains("enum Components"));
        assert!(outputs[0].contents.contains("enum Schemas"));
        assert!(outputs[0].contents.contains("struct Pet"));
        assert!(outputs[0].contents.contains("enum Operations"));
        assert!(outputs[0].contents.contains("protocol APIProtocol"));
    }

    #[test]
    fn client_mode_emits_struct_conforming_to_api_protocol() {
        let doc = sample();
        let config = Config {
            mode: Mode::Client,
            ..Config::default()
        };
        let mut sink = StreamSink::silent();
        let outputs = run(&doc, &config, &mut sink).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "Client.swift");
        assert!(outputs[0].contents.contains("struct Client: APIProtocol"));
        assert!(outputs[0].contents.contains("self.serverURL = serverURL"));
    }

    #[test]
    fn server_mode_emits_registration_function() {
        let doc = sample();
        let config = Config {
            mode: Mode::Server,
            ..Config::default()
        };
        let mut sink = StreamSink::silent();
        let outputs = run(&doc, &config, &mut sink).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "Server.swift");
        assert!(outputs[0]
            .contents
            .contains("func registerHandlers(on transport: any OpenAPIRuntime.ServerTransport, using implementation: any APIProtocol) throws"));
        assert!(outputs[0].contents.contains("transport.register("));
    }

    #[test]
    fn type_overrides_replace_schema_with_typealias_keeping_the_name() {
        let doc = sample();
        let mut type_overrides = HashMap::new();
        type_overrides.insert("Pet".to_string(), "MyModule.Pet".to_string());
        let config = Config {
            type_overrides,
            ..Config::default()
        };
        let mut sink = StreamSink::silent();
        let outputs = run(&doc, &config, &mut sink).unwrap();
        assert!(outputs[0].contents.contains("typealias Pet = MyModule.Pet"));
        assert!(!outputs[0].contents.contains("struct Pet"));
    }

    #[test]
    fn sharded_types_mode_emits_root_and_layered_files() {
        let doc = sample();
        let config = Config {
            sharding: Some(ShardingConfig {
                max_files_per_shard: 10,
                max_files_per_shard_ops: 10,
                ..ShardingConfig::default()
            }),
            ..Config::default()
        };
        let mut sink = StreamSink::silent();
        let outputs = run(&doc, &config, &mut sink).unwrap();
        let names: Vec<&str> = outputs.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"Types_root.swift"));
        assert!(names.contains(&"Components_base.swift"));
        assert!(names.contains(&"Operations_base.swift"));
        assert!(names.iter().any(|n| n.starts_with("Components_")));
        assert!(names.iter().any(|n| n.starts_with("Operations_L")));
    }
}
