//! `stringify(type)`: renders a type per the surface language's own
//! conventions (unions with `|`, tuples with `[ ... ]`, literals quoted per
//! kind). Used by diagnostics (§4.6) and by `insta` snapshot tests.

use super::{LiteralKind, TypeArena, TypeId, TypeKind};

pub fn stringify(arena: &TypeArena, id: TypeId) -> String {
    let mut out = String::new();
    write_type(arena, id, &mut out);
    out
}

fn write_type(arena: &TypeArena, id: TypeId, out: &mut String) {
    match &arena.get(id).kind {
        TypeKind::Never => out.push_str("never"),
        TypeKind::Any => out.push_str("any"),
        TypeKind::Unknown => out.push_str("unknown"),
        TypeKind::Void => out.push_str("void"),
        TypeKind::Object => out.push_str("object"),
        TypeKind::String => out.push_str("string"),
        TypeKind::Number => out.push_str("number"),
        TypeKind::Boolean => out.push_str("boolean"),
        TypeKind::BigInt => out.push_str("bigint"),
        TypeKind::Symbol => out.push_str("symbol"),
        TypeKind::Null => out.push_str("null"),
        TypeKind::Undefined => out.push_str("undefined"),
        TypeKind::Literal { kind, text } => write_literal(*kind, text, out),
        TypeKind::Union(members) => {
            for (i, &m) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                write_type(arena, m, out);
            }
        }
        TypeKind::Intersection(members) => {
            for (i, &m) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str(" & ");
                }
                write_type(arena, m, out);
            }
        }
        TypeKind::Array(elem) => {
            write_type(arena, *elem, out);
            out.push_str("[]");
        }
        TypeKind::Tuple(members) => {
            out.push('[');
            for (i, m) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(name) = &m.name {
                    out.push_str(name);
                    if m.optional {
                        out.push('?');
                    }
                    out.push_str(": ");
                }
                if m.rest {
                    out.push_str("...");
                }
                write_type(arena, m.ty, out);
            }
            out.push(']');
        }
        TypeKind::TupleElementMarker(m) => {
            if m.rest {
                out.push_str("...");
            }
            write_type(arena, m.ty, out);
        }
        TypeKind::ObjectLiteral(members) => {
            out.push_str("{ ");
            for (i, &m) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                write_type(arena, m, out);
            }
            out.push_str(" }");
        }
        TypeKind::Property {
            name, optional, ty, ..
        }
        | TypeKind::PropertySignature {
            name, optional, ty, ..
        } => {
            out.push_str(name);
            if *optional {
                out.push('?');
            }
            out.push_str(": ");
            write_type(arena, *ty, out);
        }
        TypeKind::Method {
            name,
            optional,
            params,
            ret,
        }
        | TypeKind::MethodSignature {
            name,
            optional,
            params,
            ret,
        } => {
            out.push_str(name);
            if *optional {
                out.push('?');
            }
            out.push('(');
            for (i, &p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(arena, p, out);
            }
            out.push_str("): ");
            write_type(arena, *ret, out);
        }
        TypeKind::Parameter { name, optional, ty } => {
            out.push_str(name);
            if *optional {
                out.push('?');
            }
            out.push_str(": ");
            write_type(arena, *ty, out);
        }
        TypeKind::IndexSignature {
            key_name,
            key_ty,
            value_ty,
        } => {
            out.push('[');
            out.push_str(key_name);
            out.push_str(": ");
            write_type(arena, *key_ty, out);
            out.push_str("]: ");
            write_type(arena, *value_ty, out);
        }
        TypeKind::Function { params, ret } => {
            out.push('(');
            for (i, &p) in params.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(arena, p, out);
            }
            out.push_str(") => ");
            write_type(arena, *ret, out);
        }
        TypeKind::FunctionRef { .. } => out.push_str("function"),
        TypeKind::InferPlaceholder(name) => {
            out.push_str("infer ");
            out.push_str(name);
        }
        TypeKind::Class { name } => out.push_str(name),
        TypeKind::TemplateLiteral(segments) => {
            out.push('`');
            for seg in segments {
                match seg {
                    super::TemplateSegment::Literal(text) => out.push_str(text),
                    super::TemplateSegment::Placeholder(ty) => {
                        out.push_str("${");
                        write_type(arena, *ty, out);
                        out.push('}');
                    }
                }
            }
            out.push('`');
        }
    }
}

fn write_literal(kind: LiteralKind, text: &str, out: &mut String) {
    match kind {
        LiteralKind::String => {
            out.push('"');
            out.push_str(text);
            out.push('"');
        }
        LiteralKind::Number | LiteralKind::BigInt | LiteralKind::Boolean => out.push_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{alloc, LiteralKind, TypeKind};

    #[test]
    fn stringify_union_of_literals() {
        let mut arena = TypeArena::new();
        let a = alloc(
            &mut arena,
            0,
            TypeKind::Literal {
                kind: LiteralKind::String,
                text: "a".into(),
            },
        );
        let b = alloc(&mut arena, 0, TypeKind::Number);
        let u = alloc(&mut arena, 0, TypeKind::Union(vec![a, b]));
        assert_eq!(stringify(&arena, u), "\"a\" | number");
    }

    #[test]
    fn stringify_tuple_with_rest() {
        let mut arena = TypeArena::new();
        let s = alloc(&mut arena, 0, TypeKind::String);
        let tuple = alloc(
            &mut arena,
            0,
            TypeKind::Tuple(vec![crate::types::TupleMember {
                ty: s,
                optional: false,
                rest: true,
                name: None,
            }]),
        );
        assert_eq!(stringify(&arena, tuple), "[...string]");
    }
}
