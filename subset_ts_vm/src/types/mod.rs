//! Type object model: a tagged sum over the kinds the checker needs,
//! stored in a [`TypeArena`] (a [`Pool`] of [`Type`]) and referenced by
//! [`TypeId`] everywhere else in the crate.
//!
//! Types are immutable after construction (§9 design notes): the only
//! run-time mutation in the whole crate is on [`crate::bytecode::SubroutineEntry`]'s
//! `narrowed`/`result` fields, never here.

mod stringify;

pub use stringify::stringify;

use crate::pool::Pool;

pub type TypeId = crate::pool::PoolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Number,
    BigInt,
    Boolean,
}

#[derive(Debug, Clone)]
pub struct TupleMember {
    pub ty: TypeId,
    pub optional: bool,
    pub rest: bool,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TemplateSegment {
    Literal(String),
    Placeholder(TypeId),
}

/// Kind-specific payload. Every [`Type`] also carries `ip` (see [`Type`]).
#[derive(Debug, Clone)]
pub enum TypeKind {
    Never,
    Any,
    Unknown,
    Void,
    Object,
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    Null,
    Undefined,
    Literal {
        kind: LiteralKind,
        text: String,
    },
    Union(Vec<TypeId>),
    Intersection(Vec<TypeId>),
    Array(TypeId),
    Tuple(Vec<TupleMember>),
    /// Intermediate marker pushed by the `TupleMember` opcode while a
    /// `Tuple`'s frame is being collected; unwrapped (and never seen
    /// again) by the `Tuple` opcode itself.
    TupleElementMarker(TupleMember),
    /// Members are `Property`/`Method`/`IndexSignature` type ids.
    ObjectLiteral(Vec<TypeId>),
    Property {
        name: String,
        optional: bool,
        readonly: bool,
        ty: TypeId,
    },
    PropertySignature {
        name: String,
        optional: bool,
        readonly: bool,
        ty: TypeId,
    },
    Method {
        name: String,
        optional: bool,
        params: Vec<TypeId>,
        ret: TypeId,
    },
    MethodSignature {
        name: String,
        optional: bool,
        params: Vec<TypeId>,
        ret: TypeId,
    },
    Parameter {
        name: String,
        optional: bool,
        ty: TypeId,
    },
    IndexSignature {
        key_name: String,
        key_ty: TypeId,
        value_ty: TypeId,
    },
    Function {
        params: Vec<TypeId>,
        ret: TypeId,
    },
    FunctionRef {
        addr: u32,
    },
    Class {
        name: String,
    },
    TemplateLiteral(Vec<TemplateSegment>),
    /// Produced by the `Infer` opcode inside a conditional type's extends
    /// clause. Always satisfies `extends` (it captures whatever it meets);
    /// the VM separately walks the structural match to bind `name` to the
    /// corresponding left-hand type for the taken branch (§9 `infer`).
    InferPlaceholder(String),
}

/// A type object: its kind plus the instruction pointer that produced it
/// (used only for diagnostics, per §3.3).
#[derive(Debug, Clone)]
pub struct Type {
    pub kind: TypeKind,
    pub ip: u32,
}

pub type TypeArena = Pool<Type>;

impl TypeKind {
    /// True for the wrapper kinds that carry their own optional flag
    /// (`Parameter`, `Property[Signature]`, `Method[Signature]`). Anything
    /// else is never "optional" on its own terms.
    pub fn is_optional(&self) -> bool {
        match self {
            TypeKind::Parameter { optional, .. }
            | TypeKind::Property { optional, .. }
            | TypeKind::PropertySignature { optional, .. }
            | TypeKind::Method { optional, .. }
            | TypeKind::MethodSignature { optional, .. } => *optional,
            _ => false,
        }
    }

    pub fn member_name(&self) -> Option<&str> {
        match self {
            TypeKind::Property { name, .. }
            | TypeKind::PropertySignature { name, .. }
            | TypeKind::Method { name, .. }
            | TypeKind::MethodSignature { name, .. }
            | TypeKind::Parameter { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Construction + widening helpers shared by the compiler and VM.
pub fn alloc(arena: &mut TypeArena, ip: u32, kind: TypeKind) -> TypeId {
    arena.alloc(Type { kind, ip })
}

/// Widen a literal type to its base kind (`"a"` -> `string`, `42` ->
/// `number`, ...). Non-literal kinds widen to themselves.
pub fn widen(arena: &mut TypeArena, ip: u32, id: TypeId) -> TypeId {
    let widened_kind = match &arena.get(id).kind {
        TypeKind::Literal { kind, .. } => match kind {
            LiteralKind::String => Some(TypeKind::String),
            LiteralKind::Number => Some(TypeKind::Number),
            LiteralKind::BigInt => Some(TypeKind::BigInt),
            LiteralKind::Boolean => Some(TypeKind::Boolean),
        },
        _ => None,
    };
    match widened_kind {
        Some(kind) => alloc(arena, ip, kind),
        None => id,
    }
}

/// Flatten a (possibly non-union) type into its member list: a union's
/// alternatives, or a single-element slice for anything else.
pub fn union_members(arena: &TypeArena, id: TypeId) -> Vec<TypeId> {
    match &arena.get(id).kind {
        TypeKind::Union(members) => members.clone(),
        _ => vec![id],
    }
}

/// Build a `Union` type from already-evaluated alternatives, applying the
/// `Never`-dropping / singleton-collapse / true+false-widening rules from
/// §4.2's `Union` opcode semantics.
pub fn make_union(arena: &mut TypeArena, ip: u32, alternatives: Vec<TypeId>) -> TypeId {
    let is_bool_literal = |id: TypeId, want: &str| {
        matches!(&arena.get(id).kind, TypeKind::Literal { kind: LiteralKind::Boolean, text } if text == want)
    };
    let is_true = |id: TypeId| is_bool_literal(id, "true");
    let is_false = |id: TypeId| is_bool_literal(id, "false");
    if alternatives.len() == 2 && alternatives.iter().any(|&a| is_true(a)) && alternatives.iter().any(|&a| is_false(a)) {
        return alloc(arena, ip, TypeKind::Boolean);
    }
    let non_never: Vec<TypeId> = alternatives
        .into_iter()
        .filter(|&id| !matches!(arena.get(id).kind, TypeKind::Never))
        .collect();
    match non_never.len() {
        0 => alloc(arena, ip, TypeKind::Never),
        1 => non_never[0],
        _ => alloc(arena, ip, TypeKind::Union(non_never)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_literal_to_base_kind() {
        let mut arena = TypeArena::new();
        let lit = alloc(
            &mut arena,
            0,
            TypeKind::Literal {
                kind: LiteralKind::String,
                text: "\"a\"".into(),
            },
        );
        let widened = widen(&mut arena, 0, lit);
        assert!(matches!(arena.get(widened).kind, TypeKind::String));
    }

    #[test]
    fn make_union_drops_never_and_collapses_singleton() {
        let mut arena = TypeArena::new();
        let never = alloc(&mut arena, 0, TypeKind::Never);
        let string = alloc(&mut arena, 0, TypeKind::String);
        let result = make_union(&mut arena, 0, vec![never, string]);
        assert!(matches!(arena.get(result).kind, TypeKind::String));
    }

    #[test]
    fn make_union_widens_true_false_to_boolean() {
        let mut arena = TypeArena::new();
        let t = alloc(
            &mut arena,
            0,
            TypeKind::Literal {
                kind: LiteralKind::Boolean,
                text: "true".into(),
            },
        );
        let f = alloc(
            &mut arena,
            0,
            TypeKind::Literal {
                kind: LiteralKind::Boolean,
                text: "false".into(),
            },
        );
        let result = make_union(&mut arena, 0, vec![t, f]);
        assert!(matches!(arena.get(result).kind, TypeKind::Boolean));
    }
}
