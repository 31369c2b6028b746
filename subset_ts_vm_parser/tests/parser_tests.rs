//! Parser tests covering the surface-language constructs the checker needs
//! to see exercised from real source text.

use subset_ts_vm_parser::ast::{Stmt, TypeExpr};
use subset_ts_vm_parser::parse_with_errors;

fn parse_ok(source: &str) -> subset_ts_vm_parser::SourceFile {
    let (file, errors) = parse_with_errors(source);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    file
}

#[test]
fn union_and_intersection_alias() {
    let file = parse_ok("type T = string | number;\ntype U = { a: string } & { b: number };");
    assert_eq!(file.statements.len(), 2);
    match &file.statements[0] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::Union(_, _))),
        _ => panic!("expected type alias"),
    }
    match &file.statements[1] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::Intersection(_, _))),
        _ => panic!("expected type alias"),
    }
}

#[test]
fn tuple_with_rest_and_optional() {
    let file = parse_ok("type Args = [first: string, second?: number, ...rest: boolean[]];");
    match &file.statements[0] {
        Stmt::TypeAlias(decl) => match &decl.value {
            TypeExpr::Tuple(elements, _) => {
                assert_eq!(elements.len(), 3);
                assert!(!elements[0].optional && !elements[0].rest);
                assert!(elements[1].optional && !elements[1].rest);
                assert!(elements[2].rest);
            }
            other => panic!("expected tuple type, got {:?}", other),
        },
        _ => panic!("expected type alias"),
    }
}

#[test]
fn conditional_type_with_infer() {
    let file = parse_ok("type Elem<T> = T extends (infer U)[] ? U : never;");
    match &file.statements[0] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::Conditional { .. })),
        _ => panic!("expected type alias"),
    }
}

#[test]
fn template_literal_type_with_placeholder() {
    let file = parse_ok("type Greeting = `hello ${string}`;");
    match &file.statements[0] {
        Stmt::TypeAlias(decl) => match &decl.value {
            TypeExpr::TemplateLiteral(parts, _) => assert_eq!(parts.len(), 2),
            other => panic!("expected template literal type, got {:?}", other),
        },
        _ => panic!("expected type alias"),
    }
}

#[test]
fn function_type_vs_parenthesized_type_disambiguation() {
    let file = parse_ok("type F = (x: string) => number;\ntype P = (string | number);");
    match &file.statements[0] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::FunctionType { .. })),
        _ => panic!("expected type alias"),
    }
    match &file.statements[1] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::Union(_, _))),
        _ => panic!("expected type alias"),
    }
}

#[test]
fn generic_function_call_with_explicit_type_args() {
    let file = parse_ok(
        "function identity<T>(x: T): T { return x; }\nconst y = identity<string>(\"hi\");",
    );
    assert_eq!(file.statements.len(), 2);
    match &file.statements[1] {
        Stmt::ConstDecl(decl) => match &decl.value {
            subset_ts_vm_parser::ast::ValueExpr::Call(call) => {
                assert_eq!(call.callee, "identity");
                assert_eq!(call.type_args.len(), 1);
            }
            other => panic!("expected call expression, got {:?}", other),
        },
        _ => panic!("expected const decl"),
    }
}

#[test]
fn keyof_and_index_access() {
    let file = parse_ok("type Obj = { a: string; b: number };\ntype Keys = keyof Obj;\ntype A = Obj[\"a\"];");
    assert_eq!(file.statements.len(), 3);
    match &file.statements[1] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::Keyof { .. })),
        _ => panic!("expected type alias"),
    }
    match &file.statements[2] {
        Stmt::TypeAlias(decl) => assert!(matches!(decl.value, TypeExpr::IndexAccess { .. })),
        _ => panic!("expected type alias"),
    }
}

#[test]
fn object_type_with_method_and_index_signature() {
    let file = parse_ok(
        "type Registry = { get(key: string): number; [index: string]: number };",
    );
    match &file.statements[0] {
        Stmt::TypeAlias(decl) => match &decl.value {
            TypeExpr::ObjectLiteral(members, _) => assert_eq!(members.len(), 2),
            other => panic!("expected object literal type, got {:?}", other),
        },
        _ => panic!("expected type alias"),
    }
}
