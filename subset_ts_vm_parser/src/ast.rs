//! Syntax tree produced by the parser.
//!
//! Node variants correspond one-to-one with the surface-language constructs
//! that matter for typing (declarations, type expressions, assignments,
//! calls). Every node carries a [`Span`] of byte offsets into the original
//! source, which is the entire contract the VM's compiler needs from a
//! parser (see the crate's parser-contract docs).

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    TypeAlias(TypeAliasDecl),
    FunctionDecl(FunctionDecl),
    ConstDecl(ConstDecl),
    ExprStmt(ValueExpr),
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub value: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<TypeExpr>,
    pub default: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_ann: Option<TypeExpr>,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: String,
    pub declared_type: Option<TypeExpr>,
    pub value: ValueExpr,
    pub span: Span,
}

/// A value-level expression. The checker only needs enough of this to
/// materialize an operand type for `Assign`/`CallExpression` — it never
/// evaluates the expression at runtime.
#[derive(Debug, Clone)]
pub enum ValueExpr {
    StringLit(String, Span),
    NumberLit(String, Span),
    BigIntLit(String, Span),
    BoolLit(bool, Span),
    ObjectLit(Vec<(String, ValueExpr)>, Span),
    Identifier(String, Span),
    Call(CallExpr),
}

impl ValueExpr {
    pub fn span(&self) -> Span {
        match self {
            ValueExpr::StringLit(_, s)
            | ValueExpr::NumberLit(_, s)
            | ValueExpr::BigIntLit(_, s)
            | ValueExpr::BoolLit(_, s)
            | ValueExpr::ObjectLit(_, s)
            | ValueExpr::Identifier(_, s) => *s,
            ValueExpr::Call(c) => c.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: String,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<ValueExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TupleElement {
    pub type_expr: TypeExpr,
    pub optional: bool,
    pub rest: bool,
    pub name: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ObjectMember {
    Property {
        name: String,
        optional: bool,
        readonly: bool,
        type_expr: TypeExpr,
        span: Span,
    },
    Method {
        name: String,
        optional: bool,
        params: Vec<Param>,
        return_type: Box<TypeExpr>,
        span: Span,
    },
    IndexSignature {
        key_name: String,
        key_type: Box<TypeExpr>,
        value_type: Box<TypeExpr>,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub enum TemplateLiteralPart {
    Literal(String),
    Placeholder(TypeExpr),
}

/// A type-level expression. One subroutine is compiled per node reachable
/// from a type-alias's `value` or a const's `declared_type`.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Never(Span),
    Any(Span),
    Unknown(Span),
    Void(Span),
    Object(Span),
    StringKw(Span),
    NumberKw(Span),
    BooleanKw(Span),
    BigIntKw(Span),
    SymbolKw(Span),
    Null(Span),
    Undefined(Span),
    True(Span),
    False(Span),

    StringLiteral(String, Span),
    NumberLiteral(String, Span),
    BigIntLiteral(String, Span),

    /// Reference to a declared type alias or to a type parameter in scope.
    /// `args` holds explicit type arguments, e.g. `Array<string>`.
    TypeRef {
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },

    Union(Vec<TypeExpr>, Span),
    Intersection(Vec<TypeExpr>, Span),
    Tuple(Vec<TupleElement>, Span),
    Array(Box<TypeExpr>, Span),
    ObjectLiteral(Vec<ObjectMember>, Span),
    FunctionType {
        params: Vec<Param>,
        return_type: Box<TypeExpr>,
        span: Span,
    },
    Conditional {
        check: Box<TypeExpr>,
        extends: Box<TypeExpr>,
        then_branch: Box<TypeExpr>,
        else_branch: Box<TypeExpr>,
        span: Span,
    },
    Infer {
        name: String,
        span: Span,
    },
    IndexAccess {
        object: Box<TypeExpr>,
        index: Box<TypeExpr>,
        span: Span,
    },
    Keyof {
        operand: Box<TypeExpr>,
        span: Span,
    },
    TemplateLiteral(Vec<TemplateLiteralPart>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Never(s)
            | TypeExpr::Any(s)
            | TypeExpr::Unknown(s)
            | TypeExpr::Void(s)
            | TypeExpr::Object(s)
            | TypeExpr::StringKw(s)
            | TypeExpr::NumberKw(s)
            | TypeExpr::BooleanKw(s)
            | TypeExpr::BigIntKw(s)
            | TypeExpr::SymbolKw(s)
            | TypeExpr::Null(s)
            | TypeExpr::Undefined(s)
            | TypeExpr::True(s)
            | TypeExpr::False(s) => *s,
            TypeExpr::StringLiteral(_, s)
            | TypeExpr::NumberLiteral(_, s)
            | TypeExpr::BigIntLiteral(_, s) => *s,
            TypeExpr::TypeRef { span, .. } => *span,
            TypeExpr::Union(_, s) | TypeExpr::Intersection(_, s) => *s,
            TypeExpr::Tuple(_, s) => *s,
            TypeExpr::Array(_, s) => *s,
            TypeExpr::ObjectLiteral(_, s) => *s,
            TypeExpr::FunctionType { span, .. } => *span,
            TypeExpr::Conditional { span, .. } => *span,
            TypeExpr::Infer { span, .. } => *span,
            TypeExpr::IndexAccess { span, .. } => *span,
            TypeExpr::Keyof { span, .. } => *span,
            TypeExpr::TemplateLiteral(_, s) => *s,
        }
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Hand-building helpers for tests that want an AST without going
    //! through the text parser (the parser is a contract surface, not the
    //! thing under test in `subset_ts_vm`'s own suite).
    use super::*;

    pub fn span(start: usize, end: usize) -> Span {
        Span::new(start, end)
    }
}
