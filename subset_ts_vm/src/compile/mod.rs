//! Lowers a parsed source file into a [`BytecodeImage`] (§4.1).
//!
//! Two passes: [`register_declarations`](Compiler::register_declarations)
//! reserves a subroutine-table slot and a name for every top-level
//! `TypeAlias`/`FunctionDecl` up front, so forward and self-references
//! resolve by name before any body is compiled. Bodies are then compiled
//! from a work queue rather than recursively inline: a conditional type's
//! branches and a type parameter's default are each a fresh subroutine that
//! must live at its own contiguous address, so each is queued and appended
//! to the image only once the subroutine that references it has finished
//! emitting its own straight-line body — never interleaved with it.
//! Addresses that can't be known until a queued body is actually emitted
//! (`Call`, `FunctionRef`, a branch target) are left as placeholders and
//! patched from `call_patches`/the queue once the referenced body exists.

mod context;

use std::collections::{HashMap, VecDeque};

use subset_ts_vm_parser::ast::{
    CallExpr, FunctionDecl, ObjectMember, Param, SourceFile, Stmt, TemplateLiteralPart,
    TupleElement, TypeAliasDecl, TypeExpr, TypeParam, ValueExpr,
};
use subset_ts_vm_parser::Span;

use crate::bytecode::{BytecodeImage, Instr, SubroutineEntry, TUPLE_OPTIONAL, TUPLE_REST};
use crate::error::{CompileError, ErrorCode};
use context::{ScopeSnapshot, ScopeStack};

/// Lower `source` into bytecode. Structural problems (an unresolved name, a
/// duplicate declaration) are collected rather than aborting compilation —
/// every other well-formed form still gets bytecode.
pub fn compile(source: &SourceFile) -> (BytecodeImage, Vec<CompileError>) {
    let mut c = Compiler::new();
    c.register_declarations(&source.statements);
    c.drain_queue();
    c.compile_main(&source.statements);
    c.drain_queue();
    c.resolve_call_patches();
    (c.image, c.errors)
}

struct DeclInfo {
    subroutine_idx: usize,
    type_params: Vec<TypeParam>,
}

/// A subroutine body not yet appended to the image.
enum Job {
    Alias {
        idx: usize,
        type_params: Vec<TypeParam>,
        value: TypeExpr,
    },
    Function {
        idx: usize,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
    },
    /// A conditional branch or type-parameter default: a zero-argument
    /// subroutine invoked directly (not through `Call`), so it carries no
    /// `TypeArgument` preamble of its own.
    Nested {
        patch: NestedPatch,
        scope: ScopeSnapshot,
        expr: TypeExpr,
    },
    /// A naked-type-parameter conditional's distribute loop body: one
    /// subroutine taking a single argument (the current union member),
    /// re-evaluating the whole `check extends extends ? then : else` with
    /// that member bound locally instead of the parameter's own slot.
    Distribute {
        patch_at: u32,
        scope: ScopeSnapshot,
        check: TypeExpr,
        extends: TypeExpr,
        then_branch: TypeExpr,
        else_branch: TypeExpr,
    },
}

enum NestedPatch {
    /// A `u32` address operand (`TypeArgumentDefault`, `Distribute`).
    Addr(u32),
    /// The `then`/`else` half of a `JumpCondition` at `instr_at`.
    JumpThen(u32),
    JumpElse(u32),
}

struct Compiler {
    image: BytecodeImage,
    errors: Vec<CompileError>,
    declared: HashMap<String, DeclInfo>,
    consts: HashMap<String, ValueExpr>,
    queue: VecDeque<Job>,
    /// `(operand offset, target subroutine index)`, patched once every
    /// declaration has a real `body_addr`.
    call_patches: Vec<(u32, usize)>,
}

impl Compiler {
    fn new() -> Self {
        Self {
            image: BytecodeImage::new(),
            errors: Vec::new(),
            declared: HashMap::new(),
            consts: HashMap::new(),
            queue: VecDeque::new(),
            call_patches: Vec::new(),
        }
    }

    fn register_declarations(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            match stmt {
                Stmt::TypeAlias(decl) => self.register_alias(decl),
                Stmt::FunctionDecl(decl) => self.register_function(decl),
                Stmt::ConstDecl(_) | Stmt::ExprStmt(_) => {}
            }
        }
    }

    fn register_alias(&mut self, decl: &TypeAliasDecl) {
        if self.declared.contains_key(&decl.name) {
            self.errors.push(CompileError::DuplicateDeclaration {
                name: decl.name.clone(),
                span: decl.span,
            });
            return;
        }
        let name_addr = self.image.intern(&decl.name);
        let idx = self.image.subroutines.len();
        self.image.subroutines.push(SubroutineEntry {
            name_addr: Some(name_addr),
            body_addr: 0,
            result: None,
            narrowed: None,
            exported: false,
        });
        self.declared.insert(
            decl.name.clone(),
            DeclInfo {
                subroutine_idx: idx,
                type_params: decl.type_params.clone(),
            },
        );
        self.queue.push_back(Job::Alias {
            idx,
            type_params: decl.type_params.clone(),
            value: decl.value.clone(),
        });
    }

    fn register_function(&mut self, decl: &FunctionDecl) {
        if self.declared.contains_key(&decl.name) {
            self.errors.push(CompileError::DuplicateDeclaration {
                name: decl.name.clone(),
                span: decl.span,
            });
            return;
        }
        let name_addr = self.image.intern(&decl.name);
        let idx = self.image.subroutines.len();
        self.image.subroutines.push(SubroutineEntry {
            name_addr: Some(name_addr),
            body_addr: 0,
            result: None,
            narrowed: None,
            exported: false,
        });
        self.declared.insert(
            decl.name.clone(),
            DeclInfo {
                subroutine_idx: idx,
                type_params: decl.type_params.clone(),
            },
        );
        self.queue.push_back(Job::Function {
            idx,
            type_params: decl.type_params.clone(),
            params: decl.params.clone(),
            return_type: decl.return_type.clone(),
        });
    }

    fn drain_queue(&mut self) {
        while let Some(job) = self.queue.pop_front() {
            match job {
                Job::Alias {
                    idx,
                    type_params,
                    value,
                } => {
                    let body_addr = self.image.current_addr();
                    self.image.subroutines[idx].body_addr = body_addr;
                    let mut scope = ScopeStack::default();
                    self.emit_type_params_preamble(&mut scope, &type_params);
                    let mut unused = Vec::new();
                    self.compile_type_expr(&mut scope, &value, &mut unused);
                    self.image.emit(Instr::Return);
                }
                Job::Function {
                    idx,
                    type_params,
                    params,
                    return_type,
                } => {
                    let body_addr = self.image.current_addr();
                    self.image.subroutines[idx].body_addr = body_addr;
                    let mut scope = ScopeStack::default();
                    self.emit_type_params_preamble(&mut scope, &type_params);
                    for p in &params {
                        self.compile_param(&mut scope, p);
                    }
                    let mut unused = Vec::new();
                    match &return_type {
                        Some(t) => self.compile_type_expr(&mut scope, t, &mut unused),
                        None => {
                            self.image.emit(Instr::Void);
                        }
                    }
                    self.image.emit(Instr::Function(params.len() as u16));
                    self.image.emit(Instr::Return);
                }
                Job::Nested { patch, scope, expr } => {
                    let body_addr = self.image.current_addr();
                    match patch {
                        NestedPatch::Addr(at) => self.image.patch_u32(at, body_addr),
                        NestedPatch::JumpThen(instr_at) => {
                            self.image.patch_u16(instr_at + 1, body_addr as u16)
                        }
                        NestedPatch::JumpElse(instr_at) => {
                            self.image.patch_u16(instr_at + 3, body_addr as u16)
                        }
                    }
                    let mut stack = ScopeStack::from_snapshot(scope);
                    let mut unused = Vec::new();
                    self.compile_type_expr(&mut stack, &expr, &mut unused);
                    self.image.emit(Instr::Return);
                }
                Job::Distribute {
                    patch_at,
                    scope,
                    check,
                    extends,
                    then_branch,
                    else_branch,
                } => {
                    let body_addr = self.image.current_addr();
                    self.image.patch_u32(patch_at, body_addr);
                    let mut stack = ScopeStack::from_snapshot(scope);
                    self.compile_conditional_direct(&mut stack, &check, &extends, &then_branch, &else_branch);
                    self.image.emit(Instr::Return);
                }
            }
        }
    }

    fn resolve_call_patches(&mut self) {
        for (at, idx) in std::mem::take(&mut self.call_patches) {
            let addr = self.image.subroutines[idx].body_addr;
            self.image.patch_u32(at, addr);
        }
    }

    /// Pushes this declaration's type-parameter names as `scope`'s own
    /// frame, then emits one `TypeArgument`[+`TypeArgumentDefault`] pair per
    /// parameter. A default's subroutine runs one call frame deeper than
    /// the declaration it belongs to (it's invoked directly, not through
    /// `Call`), so its captured scope gets an extra empty frame pushed on
    /// top — that's what makes `Loads(1, _)` inside the default reach back
    /// to a sibling type parameter.
    fn emit_type_params_preamble(&mut self, scope: &mut ScopeStack, type_params: &[TypeParam]) {
        let names: Vec<String> = type_params.iter().map(|tp| tp.name.clone()).collect();
        scope.push_type_params(names);
        for tp in type_params {
            self.image.emit(Instr::TypeArgument);
            if let Some(default) = &tp.default {
                let at = self.image.emit(Instr::TypeArgumentDefault(0));
                let mut nested_scope = scope.snapshot();
                nested_scope.push((Vec::new(), false));
                self.queue.push_back(Job::Nested {
                    patch: NestedPatch::Addr(at + 1),
                    scope: nested_scope,
                    expr: default.clone(),
                });
            }
        }
    }

    fn compile_main(&mut self, statements: &[Stmt]) {
        let main_addr = self.image.current_addr();
        for stmt in statements {
            match stmt {
                Stmt::ConstDecl(decl) => {
                    self.compile_value_expr(&decl.value);
                    if let Some(declared_ty) = &decl.declared_type {
                        let mut scope = ScopeStack::default();
                        let mut unused = Vec::new();
                        self.compile_type_expr(&mut scope, declared_ty, &mut unused);
                        self.image.emit(Instr::Assign);
                    }
                    self.consts.insert(decl.name.clone(), decl.value.clone());
                }
                Stmt::ExprStmt(expr) => {
                    self.compile_value_expr(expr);
                }
                Stmt::TypeAlias(_) | Stmt::FunctionDecl(_) => {}
            }
        }
        self.image.emit(Instr::Return);
        self.image.main_addr = main_addr;
    }

    fn unresolved(&mut self, name: &str, span: Span) {
        self.errors.push(CompileError::UnresolvedReference {
            name: name.to_string(),
            span,
        });
        self.image.emit(Instr::Error(ErrorCode::CannotFind.code()));
    }

    fn compile_value_expr(&mut self, expr: &ValueExpr) {
        let span = expr.span();
        let addr = self.image.current_addr();
        self.image
            .source_map
            .push(addr, span.start as u32, span.end as u32);
        match expr {
            ValueExpr::StringLit(text, _) => {
                let addr = self.image.intern(text);
                self.image.emit(Instr::StringLiteral(addr));
            }
            ValueExpr::NumberLit(text, _) => {
                let addr = self.image.intern(text);
                self.image.emit(Instr::NumberLiteral(addr));
            }
            ValueExpr::BigIntLit(text, _) => {
                let addr = self.image.intern(text);
                self.image.emit(Instr::BigIntLiteral(addr));
            }
            ValueExpr::BoolLit(b, _) => {
                self.image.emit(if *b { Instr::True } else { Instr::False });
            }
            ValueExpr::ObjectLit(fields, _) => {
                self.image.emit(Instr::Frame);
                for (name, value) in fields {
                    self.compile_value_expr(value);
                    let addr = self.image.intern(name);
                    self.image.emit(Instr::Property(addr));
                }
                self.image.emit(Instr::ObjectLiteral);
            }
            ValueExpr::Identifier(name, span) => {
                if let Some(value) = self.consts.get(name).cloned() {
                    self.compile_value_expr(&value);
                } else {
                    self.unresolved(name, *span);
                }
            }
            ValueExpr::Call(call) => self.compile_call_expr(call),
        }
    }

    fn compile_call_expr(&mut self, call: &CallExpr) {
        let Some(info_idx) = self.declared.get(&call.callee).map(|i| i.subroutine_idx) else {
            self.unresolved(&call.callee, call.span);
            return;
        };
        let type_param_count = self.declared[&call.callee].type_params.len();
        if call.type_args.len() > type_param_count {
            self.errors.push(CompileError::TypeArgumentCountMismatch {
                name: call.callee.clone(),
                expected: type_param_count,
                found: call.type_args.len(),
                span: call.span,
            });
        }
        let ref_at = self.image.emit(Instr::FunctionRef(0));
        self.call_patches.push((ref_at + 1, info_idx));

        if !call.type_args.is_empty() {
            let mut scope = ScopeStack::default();
            for arg in &call.type_args {
                let mut unused = Vec::new();
                self.compile_type_expr(&mut scope, arg, &mut unused);
            }
            self.image.emit(Instr::Instantiate(call.type_args.len() as u16));
        }
        for arg in &call.args {
            self.compile_value_expr(arg);
        }
        self.image.emit(Instr::CallExpression(call.args.len() as u16));
    }

    fn compile_type_expr(
        &mut self,
        scope: &mut ScopeStack,
        expr: &TypeExpr,
        infer_out: &mut Vec<String>,
    ) {
        let span = expr.span();
        let addr = self.image.current_addr();
        self.image
            .source_map
            .push(addr, span.start as u32, span.end as u32);
        match expr {
            TypeExpr::Never(_) => {
                self.image.emit(Instr::Never);
            }
            TypeExpr::Any(_) => {
                self.image.emit(Instr::Any);
            }
            TypeExpr::Unknown(_) => {
                self.image.emit(Instr::Unknown);
            }
            TypeExpr::Void(_) => {
                self.image.emit(Instr::Void);
            }
            TypeExpr::Object(_) => {
                self.image.emit(Instr::Object);
            }
            TypeExpr::StringKw(_) => {
                self.image.emit(Instr::StringKw);
            }
            TypeExpr::NumberKw(_) => {
                self.image.emit(Instr::NumberKw);
            }
            TypeExpr::BooleanKw(_) => {
                self.image.emit(Instr::BooleanKw);
            }
            TypeExpr::BigIntKw(_) => {
                self.image.emit(Instr::BigIntKw);
            }
            TypeExpr::SymbolKw(_) => {
                self.image.emit(Instr::SymbolKw);
            }
            TypeExpr::Null(_) => {
                self.image.emit(Instr::Null);
            }
            TypeExpr::Undefined(_) => {
                self.image.emit(Instr::Undefined);
            }
            TypeExpr::True(_) => {
                self.image.emit(Instr::True);
            }
            TypeExpr::False(_) => {
                self.image.emit(Instr::False);
            }
            TypeExpr::StringLiteral(text, _) => {
                let addr = self.image.intern(text);
                self.image.emit(Instr::StringLiteral(addr));
            }
            TypeExpr::NumberLiteral(text, _) => {
                let addr = self.image.intern(text);
                self.image.emit(Instr::NumberLiteral(addr));
            }
            TypeExpr::BigIntLiteral(text, _) => {
                let addr = self.image.intern(text);
                self.image.emit(Instr::BigIntLiteral(addr));
            }
            TypeExpr::TypeRef { name, args, span } => {
                self.compile_type_ref(scope, name, args, *span)
            }
            TypeExpr::Union(members, _) => {
                self.image.emit(Instr::Frame);
                for m in members {
                    self.compile_type_expr(scope, m, infer_out);
                }
                self.image.emit(Instr::Union);
            }
            TypeExpr::Intersection(members, _) => {
                self.image.emit(Instr::Frame);
                for m in members {
                    self.compile_type_expr(scope, m, infer_out);
                }
                self.image.emit(Instr::Intersection);
            }
            TypeExpr::Tuple(elements, _) => self.compile_tuple(scope, elements, infer_out),
            TypeExpr::Array(elem, _) => {
                self.compile_type_expr(scope, elem, infer_out);
                self.image.emit(Instr::Array);
            }
            TypeExpr::ObjectLiteral(members, _) => {
                self.compile_object_literal(scope, members, infer_out)
            }
            TypeExpr::FunctionType {
                params,
                return_type,
                span: _,
            } => self.compile_function_type(scope, params, return_type),
            TypeExpr::Conditional {
                check,
                extends,
                then_branch,
                else_branch,
                span: _,
            } => self.compile_conditional(scope, check, extends, then_branch, else_branch),
            TypeExpr::Infer { name, span: _ } => {
                infer_out.push(name.clone());
                let addr = self.image.intern(name);
                self.image.emit(Instr::Infer(addr));
            }
            TypeExpr::IndexAccess {
                object,
                index,
                span: _,
            } => {
                self.compile_type_expr(scope, object, infer_out);
                self.compile_type_expr(scope, index, infer_out);
                self.image.emit(Instr::IndexAccess);
            }
            TypeExpr::Keyof { operand, span: _ } => {
                self.compile_type_expr(scope, operand, infer_out);
                self.image.emit(Instr::Keyof);
            }
            TypeExpr::TemplateLiteral(parts, _) => self.compile_template_literal(scope, parts, infer_out),
        }
    }

    fn compile_type_ref(&mut self, scope: &ScopeStack, name: &str, args: &[TypeExpr], span: Span) {
        if let Some((frame_off, index)) = scope.resolve(name) {
            self.image.emit(Instr::Loads(frame_off, index));
            return;
        }
        let Some(info_idx) = self.declared.get(name).map(|i| i.subroutine_idx) else {
            self.unresolved(name, span);
            return;
        };
        let type_param_count = self.declared[name].type_params.len();
        if args.len() > type_param_count {
            self.errors.push(CompileError::TypeArgumentCountMismatch {
                name: name.to_string(),
                expected: type_param_count,
                found: args.len(),
                span,
            });
        }
        let mut inner_scope = ScopeStack::default();
        for arg in args {
            let mut unused = Vec::new();
            self.compile_type_expr(&mut inner_scope, arg, &mut unused);
        }
        let at = self.image.emit(Instr::Call(0, args.len() as u16));
        self.call_patches.push((at + 1, info_idx));
    }

    fn compile_tuple(&mut self, scope: &mut ScopeStack, elements: &[TupleElement], infer_out: &mut Vec<String>) {
        self.image.emit(Instr::Frame);
        for el in elements {
            self.compile_type_expr(scope, &el.type_expr, infer_out);
            let mut flags = 0u16;
            if el.optional {
                flags |= TUPLE_OPTIONAL;
            }
            if el.rest {
                flags |= TUPLE_REST;
            }
            let name_addr = match &el.name {
                Some(n) => self.image.intern(n),
                None => u32::MAX,
            };
            self.image.emit(Instr::TupleMember(flags, name_addr));
        }
        self.image.emit(Instr::Tuple);
    }

    fn compile_object_literal(&mut self, scope: &mut ScopeStack, members: &[ObjectMember], infer_out: &mut Vec<String>) {
        self.image.emit(Instr::Frame);
        for member in members {
            match member {
                ObjectMember::Property {
                    name,
                    optional,
                    readonly,
                    type_expr,
                    span: _,
                } => {
                    self.compile_type_expr(scope, type_expr, infer_out);
                    let addr = self.image.intern(name);
                    self.image.emit(Instr::PropertySignature(addr));
                    if *optional {
                        self.image.emit(Instr::Optional);
                    }
                    if *readonly {
                        self.image.emit(Instr::Readonly);
                    }
                }
                ObjectMember::Method {
                    name,
                    optional,
                    params,
                    return_type,
                    span: _,
                } => {
                    self.image.emit(Instr::Frame);
                    for p in params {
                        self.compile_param(scope, p);
                    }
                    self.compile_type_expr(scope, return_type, infer_out);
                    let addr = self.image.intern(name);
                    self.image.emit(Instr::MethodSignature(addr));
                    if *optional {
                        self.image.emit(Instr::Optional);
                    }
                }
                ObjectMember::IndexSignature {
                    key_name,
                    key_type,
                    value_type,
                    span: _,
                } => {
                    self.compile_type_expr(scope, key_type, infer_out);
                    self.compile_type_expr(scope, value_type, infer_out);
                    let addr = self.image.intern(key_name);
                    self.image.emit(Instr::IndexSignature(addr));
                }
            }
        }
        self.image.emit(Instr::ObjectLiteral);
    }

    fn compile_param(&mut self, scope: &mut ScopeStack, param: &Param) {
        let mut unused = Vec::new();
        match &param.type_ann {
            Some(t) => self.compile_type_expr(scope, t, &mut unused),
            None => {
                self.image.emit(Instr::Any);
            }
        }
        let name_addr = self.image.intern(&param.name);
        self.image.emit(Instr::Parameter(name_addr));
        if param.optional {
            self.image.emit(Instr::Optional);
        }
    }

    fn compile_function_type(&mut self, scope: &mut ScopeStack, params: &[Param], return_type: &TypeExpr) {
        for p in params {
            self.compile_param(scope, p);
        }
        let mut unused = Vec::new();
        self.compile_type_expr(scope, return_type, &mut unused);
        self.image.emit(Instr::Function(params.len() as u16));
    }

    /// A conditional whose `check` is a bare, unwrapped reference to an
    /// in-scope type parameter (`T extends U ? ... : ...`, not `[T]` or
    /// `T[]` or anything else wrapping it) distributes over a union bound
    /// to that parameter instead of checking the union as a whole — this is
    /// TypeScript's actual distributive-conditional-type rule, and the only
    /// case `Distribute` is ever emitted for.
    fn naked_type_param<'a>(&self, scope: &ScopeStack, check: &'a TypeExpr) -> Option<(&'a str, u16, u16)> {
        if let TypeExpr::TypeRef { name, args, .. } = check {
            if args.is_empty() && scope.is_naked_type_param(name) {
                if let Some((frame_off, idx)) = scope.resolve(name) {
                    return Some((name.as_str(), frame_off, idx));
                }
            }
        }
        None
    }

    fn compile_conditional(
        &mut self,
        scope: &mut ScopeStack,
        check: &TypeExpr,
        extends: &TypeExpr,
        then_branch: &TypeExpr,
        else_branch: &TypeExpr,
    ) {
        if let Some((name, frame_off, idx)) = self.naked_type_param(scope, check) {
            let name = name.to_string();
            self.image.emit(Instr::Loads(frame_off, idx));
            let at = self.image.emit(Instr::Distribute(0));
            let mut loop_scope = scope.snapshot();
            loop_scope.push((vec![name], false));
            self.queue.push_back(Job::Distribute {
                patch_at: at + 1,
                scope: loop_scope,
                check: check.clone(),
                extends: extends.clone(),
                then_branch: then_branch.clone(),
                else_branch: else_branch.clone(),
            });
            return;
        }
        self.compile_conditional_direct(scope, check, extends, then_branch, else_branch);
    }

    /// The non-distributive conditional: compiles `check`, compiles
    /// `extends` (collecting any `infer` names it introduces), and emits
    /// `Extends` + `JumpCondition` with the branches queued as their own
    /// subroutines. Also what a distribute loop body re-runs per union
    /// member, with `check` now resolving to that member's local slot
    /// instead of re-triggering distribution.
    fn compile_conditional_direct(
        &mut self,
        scope: &mut ScopeStack,
        check: &TypeExpr,
        extends: &TypeExpr,
        then_branch: &TypeExpr,
        else_branch: &TypeExpr,
    ) {
        let mut unused = Vec::new();
        self.compile_type_expr(scope, check, &mut unused);
        let mut infer_names = Vec::new();
        self.compile_type_expr(scope, extends, &mut infer_names);
        self.image.emit(Instr::Extends);
        let instr_at = self.image.emit(Instr::JumpCondition(0, 0));

        let mut branch_scope = scope.snapshot();
        branch_scope.push((infer_names, false));

        self.queue.push_back(Job::Nested {
            patch: NestedPatch::JumpThen(instr_at),
            scope: branch_scope.clone(),
            expr: then_branch.clone(),
        });
        self.queue.push_back(Job::Nested {
            patch: NestedPatch::JumpElse(instr_at),
            scope: branch_scope,
            expr: else_branch.clone(),
        });
    }

    fn compile_template_literal(&mut self, scope: &mut ScopeStack, parts: &[TemplateLiteralPart], infer_out: &mut Vec<String>) {
        self.image.emit(Instr::Frame);
        for part in parts {
            match part {
                TemplateLiteralPart::Literal(text) => {
                    let addr = self.image.intern(text);
                    self.image.emit(Instr::StringLiteral(addr));
                }
                TemplateLiteralPart::Placeholder(ty) => {
                    self.compile_type_expr(scope, ty, infer_out);
                }
            }
        }
        self.image.emit(Instr::TemplateLiteral);
    }
}
