//! Intermediate representation (spec.md §3): the target-language-shaped
//! tree that the Schema/Operation Translators build and the Renderer
//! turns into Swift source text.
//!
//! The IR deliberately stays close to Swift's own declaration grammar
//! (struct/enum/typealias/protocol/extension/function/variable) rather
//! than being a generic AST — the Renderer's job stays a thin
//! pretty-printer instead of a second code generator.

use crate::document::TypeUsage;

/// Doc-comment lines, rendered as `/// line` above a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub lines: Vec<String>,
}

impl DocComment {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

/// Access level, rendered as a leading keyword (`public `, `internal `
/// (omitted), `private `, `fileprivate `).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    Public,
    /// Swift's `package` access level (visible within the same package,
    /// not just the same module) — spec.md §6's `access` config includes
    /// it alongside `public`/`internal`/`fileprivate`/`private`.
    Package,
    #[default]
    Internal,
    Private,
    FilePrivate,
}

impl Access {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public ",
            Self::Package => "package ",
            Self::Internal => "",
            Self::Private => "private ",
            Self::FilePrivate => "fileprivate ",
        }
    }
}

/// Any top-level or nested declaration, with its doc comment and
/// deprecation flag carried alongside the kind-specific payload
/// (spec.md §3 "Commentable, Deprecable wrappers").
#[derive(Debug, Clone)]
pub struct Declaration {
    pub doc: DocComment,
    pub deprecated: bool,
    pub kind: DeclarationKind,
}

impl Declaration {
    pub fn new(kind: DeclarationKind) -> Self {
        Self {
            doc: DocComment::default(),
            deprecated: false,
            kind,
        }
    }

    #[must_use]
    pub fn with_doc(mut self, doc: DocComment) -> Self {
        self.doc = doc;
        self
    }

    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

#[derive(Debug, Clone)]
pub enum DeclarationKind {
    Struct(StructDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
    Protocol(ProtocolDecl),
    Extension(ExtensionDecl),
    Function(FunctionDecl),
    Variable(VariableDecl),
}

/// `struct Name: Conformance, ... { members }`.
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub access: Access,
    pub name: String,
    pub conformances: Vec<String>,
    pub members: Vec<Declaration>,
}

/// `enum Name: Conformance, ... { cases + members }`.
///
/// `indirect` marks a recursive enum whose cases need boxing-by-language
/// feature rather than an explicit `Boxed<T>` wrapper type — the Schema
/// Translator picks one or the other per the Reference/Cycle Analyzer's
/// decision (spec.md §4.7), never both.
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub access: Access,
    pub name: String,
    pub indirect: bool,
    pub conformances: Vec<String>,
    pub cases: Vec<EnumCase>,
    pub members: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct EnumCase {
    pub name: String,
    pub kind: EnumCaseKind,
}

#[derive(Debug, Clone)]
pub enum EnumCaseKind {
    /// A plain case with no payload: `case foo`.
    Empty,
    /// A `String`/`Int`-backed raw value: `case foo = "bar"`.
    RawValue(String),
    /// One or more associated values: `case foo(Components.Schemas.Bar)`.
    AssociatedValue(Vec<AssociatedValue>),
}

#[derive(Debug, Clone)]
pub struct AssociatedValue {
    pub label: Option<String>,
    pub usage: TypeUsage,
}

/// `typealias Name = Target`.
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub access: Access,
    pub name: String,
    pub target: TypeUsage,
}

/// `protocol Name { requirements }`.
#[derive(Debug, Clone)]
pub struct ProtocolDecl {
    pub access: Access,
    pub name: String,
    pub inherits: Vec<String>,
    pub requirements: Vec<Declaration>,
}

/// `extension ExtendedType: Conformance, ... { members }`.
#[derive(Debug, Clone)]
pub struct ExtensionDecl {
    pub extended_type: String,
    pub conformances: Vec<String>,
    pub members: Vec<Declaration>,
}

#[derive(Debug, Clone)]
pub struct FunctionParameter {
    pub label: Option<String>,
    pub name: String,
    pub usage: TypeUsage,
    pub default: Option<Expression>,
}

/// `func name(params) -> ReturnType { body }`.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub access: Access,
    pub name: String,
    pub is_static: bool,
    /// `async` — operation protocol requirements and their client/server
    /// implementations are asynchronous (spec.md §9 "the generated code
    /// may exercise suspension"); `Codable` init/encode methods never are.
    pub is_async: bool,
    pub is_throwing: bool,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: Option<TypeUsage>,
    pub body: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Let,
    Var,
}

/// `let`/`var name: Type = initializer`.
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub access: Access,
    pub kind: VariableKind,
    pub is_static: bool,
    pub name: String,
    pub usage: Option<TypeUsage>,
    pub initializer: Option<Expression>,
}

/// A minimal expression tree — only as much structure as the translators
/// need to build `Codable` bodies, rendered by `render::swift` into
/// actual Swift text. Anything the translators don't need structure for
/// goes through [`Expression::Raw`].
#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(String),
    StringLiteral(String),
    MemberAccess {
        base: Box<Expression>,
        member: String,
    },
    FunctionCall {
        callee: Box<Expression>,
        arguments: Vec<CallArgument>,
    },
    /// A pre-rendered snippet of Swift, emitted verbatim. Used for
    /// constructs (e.g. `try container.decode(...)`) the IR doesn't
    /// bother modeling structurally.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct CallArgument {
    pub label: Option<String>,
    pub value: Expression,
}

impl Expression {
    pub fn member(base: Expression, member: impl Into<String>) -> Self {
        Self::MemberAccess {
            base: Box::new(base),
            member: member.into(),
        }
    }

    pub fn call(callee: Expression, arguments: Vec<CallArgument>) -> Self {
        Self::FunctionCall {
            callee: Box::new(callee),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TypeName;

    #[test]
    fn doc_comment_splits_on_lines() {
        let doc = DocComment::from_text("first\nsecond");
        assert_eq!(doc.lines, vec!["first", "second"]);
    }

    #[test]
    fn declaration_builder_sets_doc_and_deprecated() {
        let decl = Declaration::new(DeclarationKind::TypeAlias(TypeAliasDecl {
            access: Access::Public,
            name: "ID".to_string(),
            target: TypeUsage::required(TypeName::new("#/x", vec!["String".into()])),
        }))
        .with_doc(DocComment::from_text("An opaque identifier."))
        .deprecated();

        assert!(decl.deprecated);
        assert_eq!(decl.doc.lines, vec!["An opaque identifier."]);
    }

    #[test]
    fn access_keyword_omits_internal() {
        assert_eq!(Access::Internal.keyword(), "");
        assert_eq!(Access::Public.keyword(), "public ");
    }

    #[test]
    fn expression_call_builds_nested_tree() {
        let expr = Expression::call(
            Expression::member(Expression::Identifier("container".to_string()), "decode"),
            vec![CallArgument {
                label: Some("forKey".to_string()),
                value: Expression::Raw(".name".to_string()),
            }],
        );
        match expr {
            Expression::FunctionCall { callee, arguments } => {
                assert!(matches!(*callee, Expression::MemberAccess { member, .. } if member == "decode"));
                assert_eq!(arguments.len(), 1);
            }
            _ => panic!("expected call"),
        }
    }
}
