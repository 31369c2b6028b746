//! Assignability engine: `extends(left, right) -> bool`, with a cycle
//! stack so recursive type references terminate (§4.4).
//!
//! Dispatch is on `right`'s kind. Every branch here has a one-line home in
//! spec.md §4.4's table; branches not named there (Array, Tuple,
//! Intersection, TemplateLiteral) are straightforward generalizations in
//! the same spirit, called out in DESIGN.md.

use crate::types::{LiteralKind, TypeArena, TypeId, TypeKind};

/// LIFO of `(left, right)` pairs under evaluation. A pair already on the
/// stack when re-encountered is assumed extendable (coinductive fixpoint
/// for recursive types) rather than re-entering and diverging.
#[derive(Debug, Default)]
struct ExtendableStack {
    stack: Vec<(TypeId, TypeId)>,
}

impl ExtendableStack {
    fn contains(&self, pair: (TypeId, TypeId)) -> bool {
        self.stack.contains(&pair)
    }

    fn push(&mut self, pair: (TypeId, TypeId)) {
        self.stack.push(pair);
    }

    fn pop(&mut self) {
        self.stack.pop();
    }

    /// Property path rendered for a failed assignability diagnostic, most
    /// specific member first.
    fn property_path(&self, arena: &TypeArena) -> Vec<String> {
        self.stack
            .iter()
            .rev()
            .filter_map(|&(_, right)| arena.get(right).kind.member_name().map(str::to_string))
            .collect()
    }
}

/// Top-level entry point. Never panics; always returns a bool even for
/// malformed or deeply recursive inputs (bounded by the cycle stack).
pub fn extends(arena: &TypeArena, left: TypeId, right: TypeId) -> bool {
    let mut stack = ExtendableStack::default();
    extends_inner(arena, left, right, &mut stack)
}

/// Like [`extends`] but also returns the property path through nested
/// object members at the point of failure, for diagnostic rendering.
pub fn extends_with_path(arena: &TypeArena, left: TypeId, right: TypeId) -> (bool, Vec<String>) {
    let mut stack = ExtendableStack::default();
    let ok = extends_inner(arena, left, right, &mut stack);
    (ok, stack.property_path(arena))
}

fn extends_inner(arena: &TypeArena, left: TypeId, right: TypeId, stack: &mut ExtendableStack) -> bool {
    let pair = (left, right);
    if stack.contains(pair) {
        return true;
    }
    if matches!(arena.get(left).kind, TypeKind::Never) {
        return true;
    }
    if matches!(arena.get(left).kind, TypeKind::Any) || matches!(arena.get(right).kind, TypeKind::Any) {
        return true;
    }
    if matches!(arena.get(right).kind, TypeKind::Unknown) {
        return true;
    }

    stack.push(pair);
    let result = dispatch(arena, left, right, stack);
    stack.pop();
    result
}

fn is_string_like(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::String)
        || matches!(kind, TypeKind::Literal { kind: LiteralKind::String, .. })
}

fn is_number_like(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Number)
        || matches!(kind, TypeKind::Literal { kind: LiteralKind::Number, .. })
}

fn is_bigint_like(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::BigInt)
        || matches!(kind, TypeKind::Literal { kind: LiteralKind::BigInt, .. })
}

fn is_boolean_like(kind: &TypeKind) -> bool {
    matches!(kind, TypeKind::Boolean) || matches!(kind, TypeKind::Literal { kind: LiteralKind::Boolean, .. })
}

fn is_object_like(kind: &TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::ObjectLiteral(_)
            | TypeKind::Object
            | TypeKind::Array(_)
            | TypeKind::Tuple(_)
            | TypeKind::Function { .. }
            | TypeKind::FunctionRef { .. }
            | TypeKind::Class { .. }
    )
}

fn dispatch(arena: &TypeArena, left: TypeId, right: TypeId, stack: &mut ExtendableStack) -> bool {
    let right_kind = &arena.get(right).kind;
    let left_kind = &arena.get(left).kind;

    match right_kind {
        TypeKind::Never => false,

        // An `infer` slot always matches; the binding itself is collected
        // separately by the VM's conditional-type machinery, not here.
        TypeKind::InferPlaceholder(_) => true,

        TypeKind::Parameter { optional, ty, .. } => {
            if matches!(left_kind, TypeKind::Undefined) && *optional {
                true
            } else {
                extends_inner(arena, left, *ty, stack)
            }
        }

        TypeKind::ObjectLiteral(right_members) => match left_kind {
            TypeKind::ObjectLiteral(left_members) => right_members
                .iter()
                .all(|&rm| object_member_satisfied(arena, left_members, rm, stack)),
            _ => false,
        },

        TypeKind::Property {
            name: rname,
            optional: r_opt,
            ty: r_ty,
            ..
        }
        | TypeKind::PropertySignature {
            name: rname,
            optional: r_opt,
            ty: r_ty,
            ..
        } => match left_kind {
            TypeKind::Property {
                name: lname,
                optional: l_opt,
                ty: l_ty,
                ..
            }
            | TypeKind::PropertySignature {
                name: lname,
                optional: l_opt,
                ty: l_ty,
                ..
            } => {
                if lname != rname {
                    return false;
                }
                if !*r_opt && *l_opt {
                    return false;
                }
                extends_inner(arena, *l_ty, *r_ty, stack)
            }
            _ => false,
        },

        TypeKind::String => is_string_like(left_kind),
        TypeKind::Number => is_number_like(left_kind),
        TypeKind::BigInt => is_bigint_like(left_kind),
        TypeKind::Boolean => is_boolean_like(left_kind),
        TypeKind::Symbol => matches!(left_kind, TypeKind::Symbol),
        TypeKind::Null => matches!(left_kind, TypeKind::Null),
        TypeKind::Undefined => matches!(left_kind, TypeKind::Undefined),
        TypeKind::Void => matches!(left_kind, TypeKind::Void | TypeKind::Undefined),

        TypeKind::Literal {
            kind: rkind,
            text: rtext,
        } => match left_kind {
            TypeKind::Literal {
                kind: lkind,
                text: ltext,
            } => lkind == rkind && ltext == rtext,
            _ => false,
        },

        TypeKind::Union(right_members) => {
            let right_members = right_members.clone();
            match left_kind {
                TypeKind::Union(left_members) => left_members
                    .clone()
                    .iter()
                    .all(|&lm| right_members.iter().any(|&rm| extends_inner(arena, lm, rm, stack))),
                _ => right_members.iter().any(|&rm| extends_inner(arena, left, rm, stack)),
            }
        }

        TypeKind::Intersection(right_members) => right_members
            .clone()
            .iter()
            .all(|&rm| extends_inner(arena, left, rm, stack)),

        TypeKind::Array(relem) => match left_kind {
            TypeKind::Array(lelem) => extends_inner(arena, *lelem, *relem, stack),
            _ => false,
        },

        TypeKind::Tuple(right_members) => match left_kind {
            TypeKind::Tuple(left_members) => {
                if left_members.len() < right_members.len() {
                    return false;
                }
                right_members
                    .clone()
                    .iter()
                    .zip(left_members.clone().iter())
                    .all(|(rm, lm)| extends_inner(arena, lm.ty, rm.ty, stack))
            }
            _ => false,
        },

        TypeKind::Object => is_object_like(left_kind),

        TypeKind::TemplateLiteral(_) => {
            matches!(left_kind, TypeKind::Literal { kind: LiteralKind::String, .. })
        }

        // Variance over declared class heritage and mapped-type modifier
        // propagation are explicitly out of scope (§4.4 non-goals);
        // conservative false.
        TypeKind::Class { .. }
        | TypeKind::Function { .. }
        | TypeKind::FunctionRef { .. }
        | TypeKind::Method { .. }
        | TypeKind::MethodSignature { .. }
        | TypeKind::IndexSignature { .. }
        | TypeKind::TupleElementMarker(_)
        | TypeKind::Any
        | TypeKind::Unknown => false,
    }
}

fn object_member_satisfied(
    arena: &TypeArena,
    left_members: &[TypeId],
    right_member: TypeId,
    stack: &mut ExtendableStack,
) -> bool {
    let right_kind = &arena.get(right_member).kind;
    let (rname, r_optional) = match right_kind {
        TypeKind::Property { name, optional, .. }
        | TypeKind::PropertySignature { name, optional, .. }
        | TypeKind::Method { name, optional, .. }
        | TypeKind::MethodSignature { name, optional, .. } => (name.as_str(), *optional),
        TypeKind::IndexSignature { .. } => return true, // index signatures impose no required member
        _ => return false,
    };
    let found = left_members
        .iter()
        .find(|&&lm| arena.get(lm).kind.member_name() == Some(rname));
    match found {
        Some(&lm) => {
            let l_optional = arena.get(lm).kind.is_optional();
            if !r_optional && l_optional {
                return false;
            }
            extends_inner(arena, lm, right_member, stack)
        }
        None => r_optional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{alloc, LiteralKind, TypeArena, TypeKind};

    #[test]
    fn reflexivity_for_primitive() {
        let mut arena = TypeArena::new();
        let s = alloc(&mut arena, 0, TypeKind::String);
        assert!(extends(&arena, s, s));
    }

    #[test]
    fn never_extends_everything() {
        let mut arena = TypeArena::new();
        let never = alloc(&mut arena, 0, TypeKind::Never);
        let s = alloc(&mut arena, 0, TypeKind::String);
        assert!(extends(&arena, never, s));
    }

    #[test]
    fn everything_extends_unknown() {
        let mut arena = TypeArena::new();
        let s = alloc(&mut arena, 0, TypeKind::String);
        let unknown = alloc(&mut arena, 0, TypeKind::Unknown);
        assert!(extends(&arena, s, unknown));
    }

    #[test]
    fn any_is_bidirectionally_assignable() {
        let mut arena = TypeArena::new();
        let s = alloc(&mut arena, 0, TypeKind::String);
        let any = alloc(&mut arena, 0, TypeKind::Any);
        assert!(extends(&arena, s, any));
        assert!(extends(&arena, any, s));
    }

    #[test]
    fn union_left_absorption() {
        let mut arena = TypeArena::new();
        let a = alloc(&mut arena, 0, TypeKind::String);
        let b = alloc(&mut arena, 0, TypeKind::Number);
        let union = alloc(&mut arena, 0, TypeKind::Union(vec![a, b]));
        assert!(extends(&arena, a, union));
        assert!(!extends(&arena, union, a));
    }

    #[test]
    fn literal_widening_is_one_directional() {
        let mut arena = TypeArena::new();
        let lit = alloc(
            &mut arena,
            0,
            TypeKind::Literal {
                kind: LiteralKind::String,
                text: "a".into(),
            },
        );
        let string = alloc(&mut arena, 0, TypeKind::String);
        assert!(extends(&arena, lit, string));
        assert!(!extends(&arena, string, lit));
    }

    #[test]
    fn intersection_requires_every_member() {
        let mut arena = TypeArena::new();
        let a_prop = alloc(
            &mut arena,
            0,
            TypeKind::Property {
                name: "a".into(),
                optional: false,
                readonly: false,
                ty: alloc(&mut arena, 0, TypeKind::Number),
            },
        );
        let b_sig = alloc(
            &mut arena,
            0,
            TypeKind::PropertySignature {
                name: "b".into(),
                optional: false,
                readonly: false,
                ty: alloc(&mut arena, 0, TypeKind::Number),
            },
        );
        let left = alloc(&mut arena, 0, TypeKind::ObjectLiteral(vec![a_prop]));
        let right_a = alloc(
            &mut arena,
            0,
            TypeKind::ObjectLiteral(vec![alloc(
                &mut arena,
                0,
                TypeKind::PropertySignature {
                    name: "a".into(),
                    optional: false,
                    readonly: false,
                    ty: alloc(&mut arena, 0, TypeKind::Number),
                },
            )]),
        );
        let right_b = alloc(&mut arena, 0, TypeKind::ObjectLiteral(vec![b_sig]));
        let intersection = alloc(&mut arena, 0, TypeKind::Intersection(vec![right_a, right_b]));
        assert!(!extends(&arena, left, intersection));
    }
}
