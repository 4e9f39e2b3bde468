//! Swift pretty-printer (spec.md §4.9): a thin, mostly mechanical walk
//! over [`Declaration`]/[`Expression`] that owns indentation, trailing
//! commas and doc-comment folding. It does not attempt to be a second
//! code generator — anything the translators didn't bother modeling
//! structurally arrives pre-rendered as [`Expression::Raw`] and is
//! emitted verbatim at the writer's current indent.

use crate::ir::{
    Access, CallArgument, Declaration, DeclarationKind, EnumCaseKind, Expression, FunctionDecl, FunctionParameter,
    StructDecl, VariableKind,
};

const INDENT_UNIT: &str = "    ";

struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.out.push_str(INDENT_UNIT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emit `block`, a possibly multi-line string, at the current depth.
    /// Internal relative indentation already baked into `block` (e.g. the
    /// body of a `switch` inside a function body) is preserved as-is.
    fn raw(&mut self, block: &str) {
        for line in block.split('\n') {
            self.line(line);
        }
    }
}

/// Render a complete output file: an optional import block followed by
/// the given top-level declarations, separated by a single blank line.
pub fn render_file(imports: &[String], declarations: &[Declaration]) -> String {
    let mut writer = Writer::new();
    for module in imports {
        writer.line(format!("import {module}"));
    }
    if !imports.is_empty() {
        writer.line("");
    }
    for (i, decl) in declarations.iter().enumerate() {
        if i > 0 {
            writer.line("");
        }
        render_declaration(&mut writer, decl);
    }
    writer.out
}

fn render_declaration(writer: &mut Writer, decl: &Declaration) {
    for doc_line in &decl.doc.lines {
        writer.line(format!("/// {doc_line}"));
    }
    if decl.deprecated {
        writer.line("@available(*, deprecated)");
    }
    match &decl.kind {
        DeclarationKind::Struct(s) => render_struct(writer, s),
        DeclarationKind::Enum(e) => render_enum(writer, e),
        DeclarationKind::TypeAlias(t) => {
            writer.line(format!("{}typealias {} = {}", t.access.keyword(), t.name, t.target.swift_type()));
        }
        DeclarationKind::Protocol(p) => render_protocol(writer, p),
        DeclarationKind::Extension(ext) => render_extension(writer, ext),
        DeclarationKind::Function(f) => render_function(writer, f),
        DeclarationKind::Variable(v) => {
            let keyword = match v.kind {
                VariableKind::Let => "let",
                VariableKind::Var => "var",
            };
            let prefix = if v.is_static { "static " } else { "" };
            let type_annotation = v.usage.as_ref().map(|u| format!(": {}", u.swift_type())).unwrap_or_default();
            let initializer = v
                .initializer
                .as_ref()
                .map(|expr| format!(" = {}", render_expression(expr)))
                .unwrap_or_default();
            writer.line(format!(
                "{}{}{} {}{}{}",
                v.access.keyword(),
                prefix,
                keyword,
                v.name,
                type_annotation,
                initializer
            ));
        }
    }
}

fn render_struct(writer: &mut Writer, s: &StructDecl) {
    let header = conformance_header(format!("{}struct {}", s.access.keyword(), s.name), &s.conformances);
    writer.line(format!("{header} {{"));
    writer.depth += 1;
    render_members(writer, &s.members);
    writer.depth -= 1;
    writer.line("}");
}

fn render_enum(writer: &mut Writer, e: &crate::ir::EnumDecl) {
    let keyword = if e.indirect { "indirect enum" } else { "enum" };
    let header = conformance_header(format!("{}{} {}", e.access.keyword(), keyword, e.name), &e.conformances);
    writer.line(format!("{header} {{"));
    writer.depth += 1;
    let raw_value_is_int = e.conformances.iter().any(|c| c == "Swift.Int");
    for case in &e.cases {
        match &case.kind {
            EnumCaseKind::Empty => writer.line(format!("case {}", case.name)),
            EnumCaseKind::RawValue(value) => {
                if raw_value_is_int {
                    writer.line(format!("case {} = {}", case.name, value));
                } else {
                    writer.line(format!("case {} = \"{}\"", case.name, value));
                }
            }
            EnumCaseKind::AssociatedValue(values) => {
                let payload = values
                    .iter()
                    .map(|v| match &v.label {
                        Some(label) => format!("{label}: {}", v.usage.swift_type()),
                        None => v.usage.swift_type(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                writer.line(format!("case {}({payload})", case.name));
            }
        }
    }
    if !e.cases.is_empty() && !e.members.is_empty() {
        writer.line("");
    }
    render_members(writer, &e.members);
    writer.depth -= 1;
    writer.line("}");
}

fn render_protocol(writer: &mut Writer, p: &crate::ir::ProtocolDecl) {
    let header = conformance_header(format!("{}protocol {}", p.access.keyword(), p.name), &p.inherits);
    writer.line(format!("{header} {{"));
    writer.depth += 1;
    for (i, requirement) in p.requirements.iter().enumerate() {
        if i > 0 {
            writer.line("");
        }
        render_requirement(writer, requirement);
    }
    writer.depth -= 1;
    writer.line("}");
}

/// A protocol requirement has no body — just the signature, unlike a
/// concrete declaration of the same [`DeclarationKind::Function`] shape.
fn render_requirement(writer: &mut Writer, decl: &Declaration) {
    for doc_line in &decl.doc.lines {
        writer.line(format!("/// {doc_line}"));
    }
    match &decl.kind {
        DeclarationKind::Function(f) => writer.line(function_signature(f)),
        _ => render_declaration(writer, decl),
    }
}

fn function_signature(f: &FunctionDecl) -> String {
    let params = f.parameters.iter().map(render_parameter).collect::<Vec<_>>().join(", ");
    let mut signature = format!("{}{}func {}({params})", f.access.keyword(), static_prefix(f.is_static), f.name);
    if f.is_async {
        signature.push_str(" async");
    }
    if f.is_throwing {
        signature.push_str(" throws");
    }
    if let Some(return_type) = &f.return_type {
        signature.push_str(" -> ");
        signature.push_str(&return_type.swift_type());
    }
    signature
}

fn render_extension(writer: &mut Writer, ext: &crate::ir::ExtensionDecl) {
    let header = conformance_header(format!("extension {}", ext.extended_type), &ext.conformances);
    writer.line(format!("{header} {{"));
    writer.depth += 1;
    render_members(writer, &ext.members);
    writer.depth -= 1;
    writer.line("}");
}

fn render_function(writer: &mut Writer, f: &FunctionDecl) {
    let signature = function_signature(f);
    writer.line(format!("{signature} {{"));
    writer.depth += 1;
    for statement in &f.body {
        match statement {
            Expression::Raw(text) => writer.raw(text),
            other => writer.line(render_expression(other)),
        }
    }
    writer.depth -= 1;
    writer.line("}");
}

fn static_prefix(is_static: bool) -> &'static str {
    if is_static {
        "static "
    } else {
        ""
    }
}

fn render_parameter(param: &FunctionParameter) -> String {
    let head = match &param.label {
        Some(label) if label != &param.name => format!("{label} {}", param.name),
        _ => param.name.clone(),
    };
    let mut rendered = format!("{head}: {}", param.usage.swift_type());
    if let Some(default) = &param.default {
        rendered.push_str(" = ");
        rendered.push_str(&render_expression(default));
    }
    rendered
}

fn render_members(writer: &mut Writer, members: &[Declaration]) {
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            writer.line("");
        }
        render_declaration(writer, member);
    }
}

fn render_expression(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.clone(),
        Expression::StringLiteral(value) => format!("\"{}\"", escape_string_literal(value)),
        Expression::MemberAccess { base, member } => format!("{}.{member}", render_expression(base)),
        Expression::FunctionCall { callee, arguments } => {
            let args = arguments
                .iter()
                .map(render_call_argument)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({args})", render_expression(callee))
        }
        Expression::Raw(text) => text.clone(),
    }
}

fn render_call_argument(arg: &CallArgument) -> String {
    match &arg.label {
        Some(label) => format!("{label}: {}", render_expression(&arg.value)),
        None => render_expression(&arg.value),
    }
}

fn escape_string_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `header: Conformance, Conformance { ... }`, omitting the colon entirely
/// when there's nothing to conform to / inherit from.
fn conformance_header(header: String, conformances: &[String]) -> String {
    if conformances.is_empty() {
        header
    } else {
        format!("{header}: {}", conformances.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{TypeName, TypeUsage};
    use crate::ir::{Access, DeclarationKind, EnumCase, EnumDecl, StructDecl, VariableDecl};

    fn usage(name: &str) -> TypeUsage {
        TypeUsage::required(TypeName::new(format!("#/{name}"), vec![name.to_string()]))
    }

    #[test]
    fn renders_struct_with_conformances_and_fields() {
        let decl = Declaration::new(DeclarationKind::Struct(StructDecl {
            access: Access::Public,
            name: "Pet".to_string(),
            conformances: vec!["Swift.Codable".to_string()],
            members: vec![Declaration::new(DeclarationKind::Variable(VariableDecl {
                access: Access::Public,
                kind: VariableKind::Let,
                is_static: false,
                name: "name".to_string(),
                usage: Some(usage("Swift.String")),
                initializer: None,
            }))],
        }));
        let rendered = render_file(&[], &[decl]);
        assert_eq!(rendered, "public struct Pet: Swift.Codable {\n    public let name: Swift.String\n}\n");
    }

    #[test]
    fn renders_string_raw_value_enum_case_quoted() {
        let decl = Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: "Status".to_string(),
            indirect: false,
            conformances: vec!["Swift.String".to_string()],
            cases: vec![EnumCase {
                name: "active".to_string(),
                kind: EnumCaseKind::RawValue("active".to_string()),
            }],
            members: Vec::new(),
        }));
        let rendered = render_file(&[], &[decl]);
        assert!(rendered.contains("case active = \"active\""));
    }

    #[test]
    fn renders_int_raw_value_enum_case_unquoted() {
        let decl = Declaration::new(DeclarationKind::Enum(EnumDecl {
            access: Access::Public,
            name: "Code".to_string(),
            indirect: false,
            conformances: vec!["Swift.Int".to_string()],
            cases: vec![EnumCase {
                name: "_404".to_string(),
                kind: EnumCaseKind::RawValue("404".to_string()),
            }],
            members: Vec::new(),
        }));
        let rendered = render_file(&[], &[decl]);
        assert!(rendered.contains("case _404 = 404"));
        assert!(!rendered.contains("\"404\""));
    }

    #[test]
    fn renders_imports_before_declarations_with_blank_line() {
        let decl = Declaration::new(DeclarationKind::TypeAlias(crate::ir::TypeAliasDecl {
            access: Access::Public,
            name: "ID".to_string(),
            target: usage("Swift.String"),
        }));
        let rendered = render_file(&["Foundation".to_string()], &[decl]);
        assert_eq!(rendered, "import Foundation\n\npublic typealias ID = Swift.String\n");
    }

    #[test]
    fn raw_expression_body_preserves_embedded_newlines_and_indent() {
        let decl = Declaration::new(DeclarationKind::Function(FunctionDecl {
            access: Access::Public,
            name: "encode".to_string(),
            is_static: false,
            is_async: false,
            is_throwing: true,
            parameters: Vec::new(),
            return_type: None,
            body: vec![Expression::Raw("let x = 1\nlet y = 2".to_string())],
        }));
        let rendered = render_file(&[], &[decl]);
        assert_eq!(rendered, "public func encode() throws {\n    let x = 1\n    let y = 2\n}\n");
    }

    #[test]
    fn renders_labeled_function_parameter() {
        let param = FunctionParameter {
            label: Some("from".to_string()),
            name: "decoder".to_string(),
            usage: usage("Swift.Decoder"),
            default: None,
        };
        assert_eq!(render_parameter(&param), "from decoder: Swift.Decoder");
    }

    #[test]
    fn protocol_requirement_renders_signature_without_braces() {
        let decl = Declaration::new(DeclarationKind::Protocol(crate::ir::ProtocolDecl {
            access: Access::Public,
            name: "APIProtocol".to_string(),
            inherits: vec!["Swift.Sendable".to_string()],
            requirements: vec![Declaration::new(DeclarationKind::Function(FunctionDecl {
                access: Access::Public,
                name: "getGreeting".to_string(),
                is_static: false,
                is_async: true,
                is_throwing: true,
                parameters: Vec::new(),
                return_type: Some(usage("Output")),
                body: Vec::new(),
            }))],
        }));
        let rendered = render_file(&[], &[decl]);
        assert!(rendered.contains("public func getGreeting() async throws -> Output\n"));
        assert!(!rendered.contains("getGreeting() async throws -> Output {"));
    }

    #[test]
    fn escapes_quotes_and_backslashes_in_string_literals() {
        let escaped = escape_string_literal(r#"say "hi" \ ok"#);
        assert_eq!(escaped, r#"say \"hi\" \\ ok"#);
    }
}
