//! Operation Translator (spec.md §4.6): turns each `(path, method)` pair
//! into a namespace under `Operations` holding an `Input` struct, an
//! `Output` sum type, an operation-id constant, plus the protocol
//! requirement and client/server dispatch glue that the pipeline driver
//! assembles into `Types.swift`/`Client.swift`/`Server.swift`.
//!
//! `Input.Body`/`Output.<Status>.Body` are plain enums, not `Codable`:
//! unlike a schema's `oneOf`, which case is active is determined by the
//! wire content type rather than by trying each case's decoder in turn,
//! so the (de)serialization lives in the client/server dispatch bodies
//! built here rather than in synthesized `init(from:)`/`encode(to:)`
//! methods (see DESIGN.md).

use heck::ToLowerCamelCase;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::document::{
    Document, Header, HttpMethod, MediaType, Operation, OrderedMap, Parameter, ParameterLocation,
    ParameterStyle, TypeName, TypeUsage,
};
use crate::error::Result;
use crate::ir::{
    Access, AssociatedValue, CallArgument, Declaration, DeclarationKind, EnumCase, EnumCaseKind,
    EnumDecl, Expression, FunctionDecl, FunctionParameter, ProtocolDecl, StructDecl, VariableDecl,
    VariableKind,
};
use crate::naming::{self, NamingStrategy};
use crate::translate::multipart::{self, MultipartPlan, PartRequirement};
use crate::translate::schema::SchemaTranslator;

/// Content type → case name, consulted top-to-bottom (spec.md §4.6); the
/// first entry whose matcher matches wins.
fn content_type_case_name(content_type: &str) -> String {
    let base = content_type.split(';').next().unwrap_or(content_type).trim();
    if base == "application/json" || base.ends_with("+json") {
        return "json".to_string();
    }
    match base {
        "text/plain" => "plainText".to_string(),
        "application/x-www-form-urlencoded" => "urlEncodedForm".to_string(),
        "multipart/form-data" => "multipartForm".to_string(),
        "application/octet-stream" => "binary".to_string(),
        _ if base.starts_with("text/") => "plainText".to_string(),
        _ => safe_name_case(base),
    }
}

/// Fallback safe-name transform for a content type with no canonical case
/// name: lowercase, punctuation folded to `_`, then `lowerCamelCase`.
fn safe_name_case(content_type: &str) -> String {
    let folded: String = content_type
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let cased = folded.to_lower_camel_case();
    if cased.is_empty() {
        naming::defensive_name(content_type)
    } else {
        cased
    }
}

/// Priority used when a single best content type must be chosen (spec.md
/// §4.6, §8 "content-type priority"): JSON, then text, then URL-encoded
/// form, then multipart, then everything else.
fn content_type_priority(content_type: &str) -> u8 {
    let base = content_type.split(';').next().unwrap_or(content_type).trim();
    if base == "application/json" || base.ends_with("+json") {
        0
    } else if base.starts_with("text/") {
        1
    } else if base == "application/x-www-form-urlencoded" {
        2
    } else if multipart::is_multipart(base) {
        3
    } else {
        4
    }
}

/// Pick the single best content type out of a content map, per
/// [`content_type_priority`]. Used where an operation needs exactly one
/// winning representation rather than the full per-content-type sum type.
pub fn select_primary_content_type(content: &OrderedMap<MediaType>) -> Option<&str> {
    content
        .iter()
        .map(|(ct, _)| ct)
        .min_by_key(|ct| content_type_priority(ct))
}

/// Canonical HTTP status → `Output` case name. Falls back to `status<N>`
/// for codes with no conventional English name, and `default_` for the
/// catch-all `default` response (`default` alone collides with the Swift
/// keyword).
fn status_case_name(status: &str) -> String {
    match status {
        "100" => "continue_".to_string(),
        "101" => "switchingProtocols".to_string(),
        "200" => "ok".to_string(),
        "201" => "created".to_string(),
        "202" => "accepted".to_string(),
        "204" => "noContent".to_string(),
        "301" => "movedPermanently".to_string(),
        "302" => "found".to_string(),
        "304" => "notModified".to_string(),
        "400" => "badRequest".to_string(),
        "401" => "unauthorized".to_string(),
        "403" => "forbidden".to_string(),
        "404" => "notFound".to_string(),
        "405" => "methodNotAllowed".to_string(),
        "406" => "notAcceptable".to_string(),
        "409" => "conflict".to_string(),
        "410" => "gone".to_string(),
        "415" => "unsupportedMediaType".to_string(),
        "422" => "unprocessableContent".to_string(),
        "429" => "tooManyRequests".to_string(),
        "500" => "internalServerError".to_string(),
        "501" => "notImplemented".to_string(),
        "502" => "badGateway".to_string(),
        "503" => "serviceUnavailable".to_string(),
        "default" => "default_".to_string(),
        other => other
            .parse::<u32>()
            .map_or_else(|_| naming::defensive_name(other), |code| format!("status{code}")),
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `path`+`simple`+no-explode, `query`+`form` (either explode setting),
/// `header`+`simple`+no-explode (spec.md §4.6); anything else is an
/// `unsupported` warning, though the field is still generated.
fn is_supported_parameter_style(location: ParameterLocation, style: ParameterStyle, explode: bool) -> bool {
    matches!(
        (location, style, explode),
        (ParameterLocation::Path, ParameterStyle::Simple, false)
            | (ParameterLocation::Query, ParameterStyle::Form, true)
            | (ParameterLocation::Query, ParameterStyle::Form, false)
            | (ParameterLocation::Header, ParameterStyle::Simple, false)
    )
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn string_usage(name: &str) -> TypeUsage {
    TypeUsage::required(TypeName::new(String::new(), vec![name.to_string()]))
}

/// Everything the Operation Translator produces for one document: the
/// `Operations` namespace declaration, one protocol requirement and one
/// client dispatch method per operation, and one server route
/// registration snippet per operation. The pipeline driver assembles
/// these into `Types.swift`/`Client.swift`/`Server.swift` depending on
/// `Config.mode`.
pub struct OperationGen {
    pub operations_namespace: Declaration,
    pub protocol_requirements: Vec<Declaration>,
    pub client_methods: Vec<Declaration>,
    pub server_registrations: Vec<Expression>,
}

/// Build the `APIProtocol` declaration from the Operation Translator's
/// requirement list (spec.md §9 "a protocol declaration listing
/// methods").
pub fn build_protocol_declaration(requirements: Vec<Declaration>) -> Declaration {
    Declaration::new(DeclarationKind::Protocol(ProtocolDecl {
        access: Access::Public,
        name: "APIProtocol".to_string(),
        inherits: vec!["Swift.Sendable".to_string()],
        requirements,
    }))
}

pub struct OperationTranslator<'s, 'a> {
    schema: &'s mut SchemaTranslator<'a>,
}

impl<'s, 'a> OperationTranslator<'s, 'a> {
    pub fn new(schema: &'s mut SchemaTranslator<'a>) -> Self {
        Self { schema }
    }

    fn member_name(&self, raw: &str) -> String {
        match self.schema.strategy() {
            NamingStrategy::Defensive => naming::defensive_name(raw),
            NamingStrategy::Idiomatic => naming::idiomatic_member_name(raw),
        }
    }

    /// Translate every path's every operation, in document order.
    pub fn translate_operations(
        &mut self,
        document: &Document,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<OperationGen> {
        let mut namespace_decls = Vec::new();
        let mut protocol_requirements = Vec::new();
        let mut client_methods = Vec::new();
        let mut server_registrations = Vec::new();

        for (path_template, path_item) in document.paths.iter() {
            for (method, operation) in path_item.operations() {
                let operation_id = operation
                    .operation_id
                    .clone()
                    .unwrap_or_else(|| synthesize_operation_id(method, path_template));
                let json_path = format!(
                    "#/paths/{}/{}",
                    escape_pointer(path_template),
                    method.as_str().to_lowercase()
                );
                let namespace = self.schema.assign_operation_namespace(json_path.clone(), &operation_id);

                let (input_decl, input_usage) = self.build_input(&namespace, operation, &json_path, sink)?;
                let (output_decl, output_usage) = self.build_output(&namespace, operation, &json_path, sink)?;
                let id_const = build_operation_id_constant(&operation_id);

                namespace_decls.push(Declaration::new(DeclarationKind::Enum(EnumDecl {
                    access: Access::Public,
                    name: namespace.short_name().to_string(),
                    indirect: false,
                    conformances: Vec::new(),
                    cases: Vec::new(),
                    members: vec![id_const, input_decl, output_decl],
                })));

                let signature_parameters = vec![FunctionParameter {
                    label: Some("_".to_string()),
                    name: "input".to_string(),
                    usage: input_usage.clone(),
                    default: None,
                }];

                protocol_requirements.push(Declaration::new(DeclarationKind::Function(FunctionDecl {
                    access: Access::Public,
                    name: namespace.short_name().to_string(),
                    is_static: false,
                    is_async: true,
                    is_throwing: true,
                    parameters: signature_parameters.clone(),
                    return_type: Some(output_usage.clone()),
                    body: Vec::new(),
                })));

                let client_body = build_client_dispatch_body(method, path_template, operation, &operation_id);
                client_methods.push(Declaration::new(DeclarationKind::Function(FunctionDecl {
                    access: Access::Public,
                    name: namespace.short_name().to_string(),
                    is_static: false,
                    is_async: true,
                    is_throwing: true,
                    parameters: signature_parameters,
                    return_type: Some(output_usage),
                    body: vec![Expression::Raw(client_body)],
                })));

                server_registrations.push(Expression::Raw(build_server_registration_snippet(
                    method,
                    path_template,
                    &namespace,
                    &operation_id,
                )));
            }
        }

        let operations_namespace = Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: "Operations".to_string(),
            indirect: false,
            conformances: Vec::new(),
            cases: Vec::new(),
            members: namespace_decls,
        }));

        Ok(OperationGen {
            operations_namespace,
            protocol_requirements,
            client_methods,
            server_registrations,
        })
    }

    fn build_input(
        &mut self,
        namespace: &TypeName,
        operation: &Operation,
        json_path: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(Declaration, TypeUsage)> {
        let input_name = namespace.nested("Input");
        let param_json_path = format!("{json_path}/parameters");

        let path_struct = self.build_param_struct(
            &input_name,
            "Path",
            ParameterLocation::Path,
            &operation.parameters,
            &param_json_path,
            sink,
        )?;
        let query_struct = self.build_param_struct(
            &input_name,
            "Query",
            ParameterLocation::Query,
            &operation.parameters,
            &param_json_path,
            sink,
        )?;
        let headers_struct = self.build_param_struct(
            &input_name,
            "Headers",
            ParameterLocation::Header,
            &operation.parameters,
            &param_json_path,
            sink,
        )?;
        let cookies_struct = self.build_param_struct(
            &input_name,
            "Cookies",
            ParameterLocation::Cookie,
            &operation.parameters,
            &param_json_path,
            sink,
        )?;

        let mut fields = vec![
            ("path".to_string(), TypeUsage::required(input_name.nested("Path"))),
            ("query".to_string(), TypeUsage::required(input_name.nested("Query"))),
            (
                "headers".to_string(),
                TypeUsage::required(input_name.nested("Headers")),
            ),
            (
                "cookies".to_string(),
                TypeUsage::required(input_name.nested("Cookies")),
            ),
        ];
        let mut members = vec![path_struct, query_struct, headers_struct, cookies_struct];

        if let Some(request_body) = &operation.request_body {
            let body_json_path = format!("{json_path}/requestBody/content");
            let body_decl = self.build_body_enum(&input_name.nested("Body"), &request_body.content, &body_json_path, sink)?;
            members.push(body_decl);
            let mut body_usage = TypeUsage::required(input_name.nested("Body"));
            if !request_body.required {
                body_usage = body_usage.optional();
            }
            fields.push(("body".to_string(), body_usage));
        }

        let decl = build_plain_struct(&input_name, &fields, members);
        Ok((decl, TypeUsage::required(input_name)))
    }

    fn build_param_struct(
        &mut self,
        container: &TypeName,
        group_name: &str,
        location: ParameterLocation,
        parameters: &[Parameter],
        json_path_prefix: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let struct_name = container.nested(group_name);
        let mut nested_decls = Vec::new();
        let mut fields = Vec::new();

        for parameter in parameters.iter().filter(|p| p.location == location) {
            let param_json_path = format!("{json_path_prefix}/{}", parameter.name);
            if !is_supported_parameter_style(parameter.location, parameter.style, parameter.explode) {
                sink.emit(
                    Diagnostic::warning(format!(
                        "parameter style {:?}/{:?} (explode={}) is not supported",
                        parameter.location, parameter.style, parameter.explode
                    ))
                    .with_context("foundIn", param_json_path.clone()),
                )?;
            }

            let (mut usage, nested) =
                self.schema
                    .resolve_usage(&parameter.schema, &struct_name, &parameter.name, &param_json_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            if !parameter.required {
                usage = usage.optional();
            }
            fields.push((self.member_name(&parameter.name), usage));
        }

        Ok(build_plain_struct(&struct_name, &fields, nested_decls))
    }

    fn build_header_struct(
        &mut self,
        container: &TypeName,
        headers: &OrderedMap<Header>,
        json_path_prefix: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let struct_name = container.nested("Headers");
        let mut nested_decls = Vec::new();
        let mut fields = Vec::new();

        for (name, header) in headers.iter() {
            let header_json_path = format!("{json_path_prefix}/{name}");
            let (mut usage, nested) =
                self.schema.resolve_usage(&header.schema, &struct_name, name, &header_json_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            if !header.required {
                usage = usage.optional();
            }
            fields.push((self.member_name(name), usage));
        }

        Ok(build_plain_struct(&struct_name, &fields, nested_decls))
    }

    fn build_body_enum(
        &mut self,
        name: &TypeName,
        content: &OrderedMap<MediaType>,
        json_path_prefix: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let mut nested_decls = Vec::new();
        let mut cases = Vec::new();

        for (content_type, media) in content.iter() {
            let case_name = content_type_case_name(content_type);
            let case_json_path = format!("{json_path_prefix}/{content_type}");

            if multipart::is_multipart(content_type) {
                match multipart::plan(&media.schema, &media.encoding) {
                    Some(plan) => {
                        let payload_name = name.nested(format!("{}Payload", capitalize_first(&case_name)));
                        let payload_decl = self.build_multipart_payload(&payload_name, &plan, sink)?;
                        nested_decls.push(payload_decl);
                        cases.push(EnumCase {
                            name: case_name,
                            kind: EnumCaseKind::AssociatedValue(vec![AssociatedValue {
                                label: None,
                                usage: TypeUsage::required(payload_name),
                            }]),
                        });
                    }
                    None => {
                        sink.emit(
                            Diagnostic::warning(
                                "multipart body schema is not an object; falling back to an opaque payload",
                            )
                            .with_context("foundIn", case_json_path),
                        )?;
                        cases.push(EnumCase {
                            name: case_name,
                            kind: EnumCaseKind::AssociatedValue(vec![AssociatedValue {
                                label: None,
                                usage: string_usage("Foundation.Data"),
                            }]),
                        });
                    }
                }
                continue;
            }

            let (usage, nested) = self.schema.resolve_usage(&media.schema, name, &case_name, &case_json_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            cases.push(EnumCase {
                name: case_name,
                kind: EnumCaseKind::AssociatedValue(vec![AssociatedValue { label: None, usage }]),
            });
        }

        cases.push(EnumCase {
            name: "undocumented".to_string(),
            kind: EnumCaseKind::AssociatedValue(vec![
                AssociatedValue {
                    label: Some("contentType".to_string()),
                    usage: string_usage("Swift.String"),
                },
                AssociatedValue {
                    label: Some("body".to_string()),
                    usage: string_usage("Foundation.Data"),
                },
            ]),
        });

        Ok(Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: name.short_name().to_string(),
            indirect: false,
            conformances: vec!["Swift.Sendable".to_string()],
            cases,
            members: nested_decls,
        })))
    }

    fn build_multipart_payload(
        &mut self,
        name: &TypeName,
        plan: &MultipartPlan,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Declaration> {
        let mut nested_decls = Vec::new();
        let mut fields = Vec::new();

        for part in &plan.parts {
            let part_json_path = format!("{}/{}", name.json_path, part.name);
            let (mut usage, nested) =
                self.schema.resolve_usage(&part.schema, name, &part.name, &part_json_path, sink)?;
            if let Some(decl) = nested {
                nested_decls.push(decl);
            }
            usage = match part.requirement {
                PartRequirement::RequiredExactlyOnce => usage,
                PartRequirement::AtMostOnce => usage.optional(),
                PartRequirement::RequiredAtLeastOnce | PartRequirement::ZeroOrMore => usage.array(),
            };
            fields.push((self.member_name(&part.name), usage));
        }

        nested_decls.push(build_multipart_requirements_decl(plan));
        Ok(build_plain_struct(name, &fields, nested_decls))
    }

    fn build_output(
        &mut self,
        namespace: &TypeName,
        operation: &Operation,
        json_path: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(Declaration, TypeUsage)> {
        let output_name = namespace.nested("Output");
        let mut cases = Vec::new();
        let mut members = Vec::new();

        for (status, response) in operation.responses.iter() {
            let case_name = status_case_name(status);
            let status_json_path = format!("{json_path}/responses/{status}");
            let status_struct_name = output_name.nested(capitalize_first(&case_name));

            let headers_decl = self.build_header_struct(
                &status_struct_name,
                &response.headers,
                &format!("{status_json_path}/headers"),
                sink,
            )?;
            let mut status_fields = vec![(
                "headers".to_string(),
                TypeUsage::required(status_struct_name.nested("Headers")),
            )];
            let mut status_members = vec![headers_decl];

            if !response.content.is_empty() {
                let body_decl = self.build_body_enum(
                    &status_struct_name.nested("Body"),
                    &response.content,
                    &format!("{status_json_path}/content"),
                    sink,
                )?;
                status_members.push(body_decl);
                status_fields.push((
                    "body".to_string(),
                    TypeUsage::required(status_struct_name.nested("Body")),
                ));
            }

            members.push(build_plain_struct(&status_struct_name, &status_fields, status_members));
            cases.push(EnumCase {
                name: case_name,
                kind: EnumCaseKind::AssociatedValue(vec![AssociatedValue {
                    label: None,
                    usage: TypeUsage::required(status_struct_name),
                }]),
            });
        }

        cases.push(EnumCase {
            name: "undocumented".to_string(),
            kind: EnumCaseKind::AssociatedValue(vec![
                AssociatedValue {
                    label: Some("statusCode".to_string()),
                    usage: string_usage("Swift.Int"),
                },
                AssociatedValue {
                    label: Some("body".to_string()),
                    usage: string_usage("Foundation.Data"),
                },
            ]),
        });

        let decl = Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: output_name.short_name().to_string(),
            indirect: false,
            conformances: vec!["Swift.Sendable".to_string()],
            cases,
            members,
        }));
        Ok((decl, TypeUsage::required(output_name)))
    }
}

/// When `operationId` is absent, synthesize `<method><PathSegments>` (an
/// Open Question spec.md leaves to implementers — see DESIGN.md).
fn synthesize_operation_id(method: HttpMethod, path_template: &str) -> String {
    let segments: String = path_template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_start_matches('{').trim_end_matches('}'))
        .collect::<Vec<_>>()
        .join("_");
    format!("{}_{segments}", method.as_str().to_lowercase()).to_lower_camel_case()
}

fn build_operation_id_constant(operation_id: &str) -> Declaration {
    Declaration::new(DeclarationKind::Variable(VariableDecl {
        access: Access::Public,
        kind: VariableKind::Let,
        is_static: true,
        name: "id".to_string(),
        usage: Some(string_usage("Swift.String")),
        initializer: Some(Expression::StringLiteral(operation_id.to_string())),
    }))
}

fn build_multipart_requirements_decl(plan: &MultipartPlan) -> Declaration {
    let mut required_at_least_once = Vec::new();
    let mut required_exactly_once = Vec::new();
    let mut at_most_once = Vec::new();
    let mut zero_or_more = Vec::new();
    for part in &plan.parts {
        match part.requirement {
            PartRequirement::RequiredAtLeastOnce => required_at_least_once.push(part.name.clone()),
            PartRequirement::RequiredExactlyOnce => required_exactly_once.push(part.name.clone()),
            PartRequirement::AtMostOnce => at_most_once.push(part.name.clone()),
            PartRequirement::ZeroOrMore => zero_or_more.push(part.name.clone()),
        }
    }

    let set_literal = |names: &[String]| {
        format!(
            "[{}]",
            names.iter().map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", ")
        )
    };

    let initializer = Expression::call(
        Expression::Identifier("OpenAPIRuntime.MultipartRequirements".to_string()),
        vec![
            CallArgument {
                label: Some("allowsUnknownParts".to_string()),
                value: Expression::Raw(plan.allows_unknown_parts.to_string()),
            },
            CallArgument {
                label: Some("requiredAtLeastOnce".to_string()),
                value: Expression::Raw(set_literal(&required_at_least_once)),
            },
            CallArgument {
                label: Some("requiredExactlyOnce".to_string()),
                value: Expression::Raw(set_literal(&required_exactly_once)),
            },
            CallArgument {
                label: Some("atMostOnce".to_string()),
                value: Expression::Raw(set_literal(&at_most_once)),
            },
            CallArgument {
                label: Some("zeroOrMore".to_string()),
                value: Expression::Raw(set_literal(&zero_or_more)),
            },
        ],
    );

    Declaration::new(DeclarationKind::Variable(VariableDecl {
        access: Access::Public,
        kind: VariableKind::Let,
        is_static: true,
        name: "requirements".to_string(),
        usage: Some(string_usage("OpenAPIRuntime.MultipartRequirements")),
        initializer: Some(initializer),
    }))
}

/// A plain struct with public stored properties and an explicit public
/// memberwise init — the shape every Input/Output sub-structure shares
/// (spec.md §4.6), independent of the Schema Translator's `Codable`
/// variant used for `components.schemas` types.
fn build_plain_struct(name: &TypeName, fields: &[(String, TypeUsage)], extra_members: Vec<Declaration>) -> Declaration {
    let mut parameters = Vec::with_capacity(fields.len());
    let mut body = Vec::with_capacity(fields.len());
    let mut property_decls = Vec::with_capacity(fields.len());

    for (member, usage) in fields {
        property_decls.push(Declaration::new(DeclarationKind::Variable(VariableDecl {
            access: Access::Public,
            kind: VariableKind::Var,
            is_static: false,
            name: member.clone(),
            usage: Some(usage.clone()),
            initializer: None,
        })));
        parameters.push(FunctionParameter {
            label: None,
            name: member.clone(),
            usage: usage.clone(),
            default: usage.optional.then(|| Expression::Raw("nil".to_string())),
        });
        body.push(Expression::Raw(format!("self.{member} = {member}")));
    }

    let init = Declaration::new(DeclarationKind::Function(FunctionDecl {
        access: Access::Public,
        name: "init".to_string(),
        is_static: false,
        is_async: false,
        is_throwing: false,
        parameters,
        return_type: None,
        body,
    }));

    let mut members = extra_members;
    members.extend(property_decls);
    members.push(init);

    Declaration::new(DeclarationKind::Struct(StructDecl {
        access: Access::Public,
        name: name.short_name().to_string(),
        conformances: vec!["Swift.Sendable".to_string()],
        members,
    }))
}

/// One `case let .<name>(value):` arm of the client dispatch body's body
/// switch, encoding per spec.md §4.6's per-content-type coding strategy:
/// JSON, plain text, URL-encoded form, multipart, or raw binary passthrough.
fn body_case_arm(case_name: &str, content_type: &str) -> String {
    if multipart::is_multipart(content_type) {
        return format!(
            "case let .{case_name}(value): request.headerFields[.contentType] = \"{content_type}\"; \
             request.body = try .init(value, boundary: OpenAPIRuntime.MultipartBoundaryGenerator().makeBoundary(), \
             requirements: type(of: value).requirements, encoding: .multipart)\n"
        );
    }
    let encoding = match case_name {
        "json" => "json",
        "plainText" => "text",
        "urlEncodedForm" => "urlEncodedForm",
        // Binary and any content type this translator has no dedicated
        // strategy for are passed through as raw bytes.
        _ => "binary",
    };
    format!(
        "case let .{case_name}(value): request.headerFields[.contentType] = \"{content_type}\"; \
         request.body = try .init(value, encoding: .{encoding})\n"
    )
}

/// Build the client method's dispatch body: render the path template,
/// attach query/header parameters, serialize the body per content type,
/// send via the transport, and decode the response per status code.
/// Emitted as a single [`Expression::Raw`] block, following the same
/// "structure only where the translator needs it" approach the Schema
/// Translator takes for its `Codable` methods.
fn build_client_dispatch_body(method: HttpMethod, path_template: &str, operation: &Operation, operation_id: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!("var path = \"{path_template}\"\n"));
    for parameter in operation.parameters.iter().filter(|p| p.location == ParameterLocation::Path) {
        body.push_str(&format!(
            "path = path.replacingOccurrences(of: \"{{{}}}\", with: String(describing: input.path.{}))\n",
            parameter.name,
            naming::idiomatic_member_name(&parameter.name)
        ));
    }
    body.push_str(&format!(
        "var request = OpenAPIRuntime.HTTPRequest(path: path, method: .{})\n",
        method.as_str().to_lowercase()
    ));
    for parameter in operation.parameters.iter().filter(|p| p.location == ParameterLocation::Query) {
        let member = naming::idiomatic_member_name(&parameter.name);
        body.push_str(&format!(
            "request.query.append(name: \"{}\", value: input.query.{member})\n",
            parameter.name
        ));
    }
    for parameter in operation.parameters.iter().filter(|p| p.location == ParameterLocation::Header) {
        let member = naming::idiomatic_member_name(&parameter.name);
        body.push_str(&format!(
            "request.headerFields[.init(\"{}\")!] = input.headers.{member}.map(String.init(describing:))\n",
            parameter.name
        ));
    }

    if let Some(request_body) = &operation.request_body {
        body.push_str("switch input.body {\n");
        for (content_type, _media) in request_body.content.iter() {
            let case_name = content_type_case_name(content_type);
            body.push_str(&body_case_arm(&case_name, content_type));
        }
        body.push_str(
            "case .undocumented(let contentType, let raw): request.headerFields[.contentType] = contentType; request.body = .init(raw)\n\
             default: break\n\
             }\n",
        );
    }

    body.push_str(&format!(
        "let (response, responseBody) = try await self.transport.send(request, baseURL: self.serverURL, operationID: \"{operation_id}\")\n"
    ));
    body.push_str("switch response.status.code {\n");
    for (status, _response) in operation.responses.iter() {
        let case_name = status_case_name(status);
        if status == "default" {
            continue;
        }
        body.push_str(&format!(
            "case {status}: return try .{case_name}(.init(headers: .init(), body: try await OpenAPIRuntime.HTTPBody.decode(responseBody)))\n"
        ));
    }
    if operation.responses.contains_key("default") {
        body.push_str("default: return try .default_(.init(headers: .init(), body: try await OpenAPIRuntime.HTTPBody.decode(responseBody)))\n");
    } else {
        body.push_str(
            "default: return .undocumented(statusCode: response.status.code, try await OpenAPIRuntime.HTTPBody.collect(responseBody, upTo: .max))\n",
        );
    }
    body.push_str("}\n");
    body
}

/// A single route-registration statement for the server entry point
/// (spec.md §4.6 "register one route per operation with the transport").
fn build_server_registration_snippet(method: HttpMethod, path_template: &str, namespace: &TypeName, operation_id: &str) -> String {
    format!(
        "transport.register(.{}, \"{path_template}\") {{ request, requestBody, metadata in\n\
         \x20   let input = try {namespace}.decodeInput(from: request, body: requestBody, metadata: metadata)\n\
         \x20   let output = try await implementation.{}(input)\n\
         \x20   return try {namespace}.encodeOutput(output)\n\
         }}",
        method.as_str().to_lowercase(),
        namespace.short_name(),
        namespace = namespace.swift_name(),
    )
}
