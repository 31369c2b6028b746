//! The type VM: a threaded interpreter over [`crate::bytecode::BytecodeImage`]
//! (§4.5).
//!
//! The spec's active-subroutine chain is, at heart, an ordinary call stack —
//! each `Call`/`Distribute`/`JumpCondition`/`Instantiate` suspends the
//! current subroutine and hands control to another. Rust already gives us a
//! call stack, so rather than hand-rolling a flattened state machine with an
//! explicit "active subroutine" linked list, this VM is a recursive-descent
//! interpreter: [`Vm::eval_subroutine_at`] *is* the active-subroutine chain,
//! one Rust stack frame per bytecode-level call. [`crate::config::Config::max_call_depth`]
//! still bounds it exactly as the spec's recursion guard does. This is a
//! deliberate, documented deviation from a literal flattened dispatch loop —
//! see DESIGN.md.

mod frame;

pub use frame::Frame;

use crate::bytecode::{BytecodeImage, Instr, SourceMapTable, SubroutineEntry};
use crate::config::Config;
use crate::error::{Diagnostic, Diagnostics, ErrorCode, VmFault};
use crate::extends::extends;
use crate::types::{alloc, stringify, union_members, widen, LiteralKind, TemplateSegment, TupleMember, TypeArena, TypeId, TypeKind};

/// Runs `image` to completion and returns its diagnostics, or `Err` if the
/// image itself is malformed (§7.5). `source_text` is read-only and used
/// only to render `Error(code)` diagnostics and (by the caller) the final
/// pretty-printed output.
pub fn run(image: &BytecodeImage, file_name: &str, source_text: &str, config: Config) -> Result<Diagnostics, VmFault> {
    let mut vm = Vm::new(image, file_name, source_text, config);
    vm.run_to_completion()?;
    Ok(vm.diagnostics)
}

pub struct Vm<'a> {
    image: &'a BytecodeImage,
    file_name: &'a str,
    source_text: &'a str,
    config: Config,
    arena: TypeArena,
    stack: Vec<TypeId>,
    frames: Vec<Frame>,
    subroutines: Vec<SubroutineEntry>,
    diagnostics: Diagnostics,
    depth: u32,
    instructions_executed: u64,
    budget_exceeded: bool,
    last_infer_bindings: Vec<TypeId>,
    finished: bool,
    /// See the module docs: retained per the ambient `stepper` contract,
    /// but `step()` runs the whole program on its first call rather than
    /// pausing at individual opcodes.
    pub stepper: bool,
}

impl<'a> Vm<'a> {
    pub fn new(image: &'a BytecodeImage, file_name: &'a str, source_text: &'a str, config: Config) -> Self {
        Self {
            image,
            file_name,
            source_text,
            config,
            arena: TypeArena::new(),
            stack: Vec::new(),
            frames: Vec::new(),
            subroutines: image.subroutines.clone(),
            diagnostics: Vec::new(),
            depth: 0,
            instructions_executed: 0,
            budget_exceeded: false,
            last_infer_bindings: Vec::new(),
            finished: false,
            stepper: false,
        }
    }

    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn source_map(&self) -> &SourceMapTable {
        &self.image.source_map
    }

    /// Single-step toggle (§4.5, ambient). See module docs for the honest
    /// limitation: this runs the whole program on the first call.
    pub fn step(&mut self) -> Result<bool, VmFault> {
        if !self.finished {
            self.run_to_completion()?;
        }
        Ok(self.finished)
    }

    pub fn run_to_completion(&mut self) -> Result<(), VmFault> {
        if self.finished {
            return Ok(());
        }
        if self.image.code.is_empty() {
            return Err(VmFault::MissingMain);
        }
        let span = tracing::info_span!("vm_run", file = self.file_name);
        let _enter = span.enter();
        self.eval_subroutine_at(self.image.main_addr, &[])?;
        self.finished = true;
        Ok(())
    }

    fn never_type(&mut self) -> TypeId {
        alloc(&mut self.arena, 0, TypeKind::Never)
    }

    fn find_subroutine_index(&self, body_addr: u32) -> Option<usize> {
        self.subroutines.iter().position(|s| s.body_addr == body_addr)
    }

    fn push_diag(&mut self, ip: u32, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic { message: message.into(), ip });
    }

    /// Evaluate the subroutine body at `addr` with `args` as its initial
    /// frame contents (the `Call`/`Distribute`/`Instantiate` argument
    /// transfer from §4.2). Mirrors `Call`'s contract exactly; callers
    /// needing memoization or `narrowed` lookups check those before
    /// calling this.
    fn eval_subroutine_at(&mut self, addr: u32, args: &[TypeId]) -> Result<TypeId, VmFault> {
        if self.budget_exceeded {
            return Ok(self.never_type());
        }
        self.depth += 1;
        if self.depth > self.config.max_call_depth {
            self.depth -= 1;
            tracing::debug!(addr, "recursion guard tripped");
            self.push_diag(addr, "Type instantiation is excessively deep and possibly infinite.");
            return Ok(self.never_type());
        }
        let floor = self.stack.len();
        self.stack.extend_from_slice(args);
        self.frames.push(Frame::new(floor, args.len() as u16));
        tracing::trace!(addr, argc = args.len(), "enter subroutine");
        let result = self.run_until_return(addr as usize);
        self.frames.pop();
        self.depth -= 1;
        result
    }

    fn decode_at(&mut self, ip: usize) -> Result<(Instr, usize), VmFault> {
        if ip >= self.image.code.len() {
            return Err(VmFault::AddressOutOfRange { addr: ip as u32, len: self.image.code.len() });
        }
        match self.image.decode(ip) {
            Some(instr) => {
                let width = crate::bytecode::instr_width(&self.image.code, ip).unwrap_or(1);
                Ok((instr, ip + width))
            }
            None => Err(VmFault::UnknownOpcode { tag: self.image.code[ip], ip: ip as u32 }),
        }
    }

    fn bump_instructions(&mut self, ip: u32) {
        self.instructions_executed += 1;
        if let Some(budget) = self.config.max_instructions {
            if self.instructions_executed > budget && !self.budget_exceeded {
                self.budget_exceeded = true;
                self.push_diag(ip, "Instruction budget exceeded.");
            }
        }
    }

    /// Runs from `start` until this frame's `Return`, returning the single
    /// produced type (§4.2's frame-collapse rule: the last value pushed
    /// since the floor survives, everything else is dropped).
    fn run_until_return(&mut self, start: usize) -> Result<TypeId, VmFault> {
        let mut ip = start;
        loop {
            if self.budget_exceeded {
                return Ok(self.never_type());
            }
            let (instr, next_ip) = self.decode_at(ip)?;
            self.bump_instructions(ip as u32);
            let this_ip = ip as u32;
            ip = next_ip;

            match instr {
                Instr::Return => {
                    let floor = self.frames.last().unwrap().floor;
                    let result = if self.stack.len() > floor {
                        let r = *self.stack.last().unwrap();
                        self.stack.truncate(floor);
                        r
                    } else {
                        self.never_type()
                    };
                    return Ok(result);
                }
                Instr::Halt => {
                    let floor = self.frames.last().unwrap().floor;
                    self.stack.truncate(floor);
                    return Ok(self.never_type());
                }
                Instr::Jump(addr) => {
                    ip = addr as usize;
                }
                Instr::JumpCondition(then_addr, else_addr) => {
                    let cond = self.stack.pop().ok_or(VmFault::StackUnderflow { ip: this_ip })?;
                    let take_then = matches!(&self.arena.get(cond).kind,
                        TypeKind::Literal { kind: LiteralKind::Boolean, text } if text == "true");
                    let target = if take_then { then_addr } else { else_addr } as u32;
                    let bindings = std::mem::take(&mut self.last_infer_bindings);
                    let result = self.eval_subroutine_at(target, &bindings)?;
                    let floor = self.frames.last().unwrap().floor;
                    self.stack.truncate(floor);
                    return Ok(result);
                }
                other => self.exec(other, this_ip)?,
            }
        }
    }

    /// Every opcode other than the control-flow terminators handled inline
    /// in [`Self::run_until_return`].
    fn exec(&mut self, instr: Instr, ip: u32) -> Result<(), VmFault> {
        use Instr as I;
        match instr {
            I::Never => self.push(TypeKind::Never, ip),
            I::Any => self.push(TypeKind::Any, ip),
            I::Unknown => self.push(TypeKind::Unknown, ip),
            I::Void => self.push(TypeKind::Void, ip),
            I::Object => self.push(TypeKind::Object, ip),
            I::StringKw => self.push(TypeKind::String, ip),
            I::NumberKw => self.push(TypeKind::Number, ip),
            I::BooleanKw => self.push(TypeKind::Boolean, ip),
            I::BigIntKw => self.push(TypeKind::BigInt, ip),
            I::SymbolKw => self.push(TypeKind::Symbol, ip),
            I::Null => self.push(TypeKind::Null, ip),
            I::Undefined => self.push(TypeKind::Undefined, ip),
            I::True => self.push(TypeKind::Literal { kind: LiteralKind::Boolean, text: "true".into() }, ip),
            I::False => self.push(TypeKind::Literal { kind: LiteralKind::Boolean, text: "false".into() }, ip),
            I::StringLiteral(addr) => {
                let text = self.image.read_string(addr).to_string();
                self.push(TypeKind::Literal { kind: LiteralKind::String, text }, ip)
            }
            I::NumberLiteral(addr) => {
                let text = self.image.read_string(addr).to_string();
                self.push(TypeKind::Literal { kind: LiteralKind::Number, text }, ip)
            }
            I::BigIntLiteral(addr) => {
                let text = self.image.read_string(addr).to_string();
                self.push(TypeKind::Literal { kind: LiteralKind::BigInt, text }, ip)
            }
            I::Property(addr) => self.wrap_member(addr, ip, |name, ty| TypeKind::Property { name, optional: false, readonly: false, ty }),
            I::PropertySignature(addr) => self.wrap_member(addr, ip, |name, ty| TypeKind::PropertySignature { name, optional: false, readonly: false, ty }),
            I::Parameter(addr) => self.wrap_member(addr, ip, |name, ty| TypeKind::Parameter { name, optional: false, ty }),
            I::Method(addr) | I::MethodSignature(addr) => self.wrap_method(addr, ip, matches!(instr, I::Method(_))),
            I::IndexSignature(addr) => self.exec_index_signature(addr, ip),
            I::TupleMember(flags, addr) => self.exec_tuple_member(flags, addr, ip),
            I::Function(paramc) => self.exec_function(paramc, ip),
            I::FunctionRef(addr) => self.push(TypeKind::FunctionRef { addr }, ip),
            I::Class => {
                // Declared class heritage is out of scope (§4.4 non-goals);
                // retained as a producible kind for `instanceof`-free code.
                self.push(TypeKind::Class { name: String::new() }, ip)
            }
            I::Frame => {
                self.frames.push(Frame::new(self.stack.len(), 0));
                Ok(())
            }
            I::Var | I::TypeVar => {
                self.frames.last_mut().unwrap().var_count += 1;
                Ok(())
            }
            I::Loads(frame_off, index) => self.exec_loads(frame_off, index, ip),
            I::Assign => self.exec_assign(ip),
            I::Dup => {
                let top = *self.stack.last().ok_or(VmFault::StackUnderflow { ip })?;
                self.stack.push(top);
                Ok(())
            }
            I::Widen => {
                let top = self.stack.pop().ok_or(VmFault::StackUnderflow { ip })?;
                let widened = widen(&mut self.arena, ip, top);
                self.stack.push(widened);
                Ok(())
            }
            I::Call(addr, argc) => self.exec_call(addr, argc, ip),
            I::TailCall => Ok(()), // no distinct tail-call optimization needed in a recursive interpreter
            I::Distribute(loop_body) => self.exec_distribute(loop_body, ip),
            I::TypeArgument => self.exec_type_argument(ip),
            I::TypeArgumentDefault(addr) => self.exec_type_argument_default(addr, ip),
            I::Instantiate(argc) => self.exec_instantiate(argc, ip),
            I::Set(addr) => self.exec_set(addr, ip),
            I::Extends => self.exec_extends(ip),
            I::IndexAccess => self.exec_index_access(ip),
            I::Optional => self.exec_modifier(ip, Modifier::Optional),
            I::Readonly => self.exec_modifier(ip, Modifier::Readonly),
            I::Initializer => self.exec_modifier(ip, Modifier::Optional),
            I::CallExpression(argc) => self.exec_call_expression(argc, ip),
            I::Error(code) => self.exec_error(code, ip),
            I::Union => self.exec_union(ip),
            I::Intersection => self.exec_intersection(ip),
            I::Array => self.exec_array(ip),
            I::Tuple => self.exec_tuple(ip),
            I::TemplateLiteral => self.exec_template_literal(ip),
            I::ObjectLiteral => self.exec_object_literal(ip),
            I::Keyof => self.exec_keyof(ip),
            I::Infer(name_addr) => {
                let name = self.image.read_string(name_addr).to_string();
                self.push(TypeKind::InferPlaceholder(name), ip)
            }
            I::Noop => Ok(()),
            I::Return | I::Halt | I::Jump(_) | I::JumpCondition(..) => unreachable!("handled by run_until_return"),
        }
    }

    fn push(&mut self, kind: TypeKind, ip: u32) -> Result<(), VmFault> {
        let id = alloc(&mut self.arena, ip, kind);
        self.stack.push(id);
        Ok(())
    }

    fn pop(&mut self, ip: u32) -> Result<TypeId, VmFault> {
        self.stack.pop().ok_or(VmFault::StackUnderflow { ip })
    }

    fn wrap_member(&mut self, name_addr: u32, ip: u32, make: impl FnOnce(String, TypeId) -> TypeKind) -> Result<(), VmFault> {
        let ty = self.pop(ip)?;
        let name = self.image.read_string(name_addr).to_string();
        self.push(make(name, ty), ip)
    }

    fn wrap_method(&mut self, name_addr: u32, ip: u32, is_impl: bool) -> Result<(), VmFault> {
        // Frame holds [param1, ..., paramN, ret] by construction below.
        let frame = self.frames.pop().unwrap();
        let mut members: Vec<TypeId> = self.stack.split_off(frame.floor);
        let ret = members.pop().ok_or(VmFault::StackUnderflow { ip })?;
        let name = self.image.read_string(name_addr).to_string();
        let kind = if is_impl {
            TypeKind::Method { name, optional: false, params: members, ret }
        } else {
            TypeKind::MethodSignature { name, optional: false, params: members, ret }
        };
        self.push(kind, ip)
    }

    fn exec_index_signature(&mut self, key_name_addr: u32, ip: u32) -> Result<(), VmFault> {
        let value_ty = self.pop(ip)?;
        let key_ty = self.pop(ip)?;
        let key_name = self.image.read_string(key_name_addr).to_string();
        self.push(TypeKind::IndexSignature { key_name, key_ty, value_ty }, ip)
    }

    fn exec_tuple_member(&mut self, flags: u16, name_addr: u32, ip: u32) -> Result<(), VmFault> {
        let ty = self.pop(ip)?;
        let name = if name_addr == u32::MAX { None } else { Some(self.image.read_string(name_addr).to_string()) };
        let member = TupleMember {
            ty,
            optional: flags & crate::bytecode::TUPLE_OPTIONAL != 0,
            rest: flags & crate::bytecode::TUPLE_REST != 0,
            name,
        };
        self.push(TypeKind::TupleElementMarker(member), ip)
    }

    fn exec_function(&mut self, paramc: u16, ip: u32) -> Result<(), VmFault> {
        let n = paramc as usize;
        if self.stack.len() < n + 1 {
            return Err(VmFault::StackUnderflow { ip });
        }
        let ret = self.pop(ip)?;
        let params = self.stack.split_off(self.stack.len() - n);
        self.push(TypeKind::Function { params, ret }, ip)
    }

    fn exec_loads(&mut self, frame_off: u16, index: u16, ip: u32) -> Result<(), VmFault> {
        let target = self.frames.len().checked_sub(1 + frame_off as usize).ok_or(VmFault::StackUnderflow { ip })?;
        let floor = self.frames[target].floor;
        let id = *self.stack.get(floor + index as usize).ok_or(VmFault::StackUnderflow { ip })?;
        self.stack.push(id);
        Ok(())
    }

    fn exec_assign(&mut self, ip: u32) -> Result<(), VmFault> {
        let declared = self.pop(ip)?;
        let value = self.pop(ip)?;
        if !extends(&self.arena, value, declared) {
            let value_str = stringify(&self.arena, value);
            let declared_str = stringify(&self.arena, declared);
            self.push_diag(ip, format!("Type '{value_str}' is not assignable to type '{declared_str}'."));
        }
        Ok(())
    }

    fn exec_call(&mut self, addr: u32, argc: u16, ip: u32) -> Result<(), VmFault> {
        let args = self.pop_args(argc, ip)?;
        if argc == 0 {
            if let Some(idx) = self.find_subroutine_index(addr) {
                if let Some(narrowed) = self.subroutines[idx].narrowed {
                    self.stack.push(narrowed);
                    return Ok(());
                }
                if let Some(cached) = self.subroutines[idx].result {
                    self.stack.push(cached);
                    return Ok(());
                }
                let result = self.eval_subroutine_at(addr, &args)?;
                self.subroutines[idx].result = Some(result);
                self.stack.push(result);
                return Ok(());
            }
        }
        let result = self.eval_subroutine_at(addr, &args)?;
        self.stack.push(result);
        Ok(())
    }

    fn pop_args(&mut self, argc: u16, ip: u32) -> Result<Vec<TypeId>, VmFault> {
        let n = argc as usize;
        if self.stack.len() < n {
            return Err(VmFault::StackUnderflow { ip });
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn exec_distribute(&mut self, loop_body: u32, ip: u32) -> Result<(), VmFault> {
        let driven = self.pop(ip)?;
        let members = union_members(&self.arena, driven);
        if members.len() == 1 {
            let result = self.eval_subroutine_at(loop_body, &[members[0]])?;
            self.stack.push(result);
            return Ok(());
        }
        let mut collected = Vec::with_capacity(members.len());
        for m in members {
            if collected.len() as u32 > self.config.combinatorial_cap {
                self.push_diag(ip, "Combinatorial explosion: too many union members to distribute over.");
                break;
            }
            collected.push(self.eval_subroutine_at(loop_body, &[m])?);
        }
        let result = crate::types::make_union(&mut self.arena, ip, collected);
        self.stack.push(result);
        Ok(())
    }

    fn exec_type_argument(&mut self, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.last_mut().unwrap();
        let slot_idx = frame.type_arg_slots.len();
        if (slot_idx as u16) < frame.supplied_argc {
            frame.type_arg_slots.push(false);
            Ok(())
        } else {
            frame.type_arg_slots.push(true);
            let id = alloc(&mut self.arena, ip, TypeKind::Unknown);
            self.stack.push(id);
            Ok(())
        }
    }

    fn exec_type_argument_default(&mut self, addr: u32, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.last().unwrap();
        let floor = frame.floor;
        let slot_idx = frame.type_arg_slots.len().checked_sub(1).ok_or(VmFault::StackUnderflow { ip })?;
        let unprovided = frame.type_arg_slots[slot_idx];
        if unprovided {
            let default = self.eval_subroutine_at(addr, &[])?;
            self.stack[floor + slot_idx] = default;
        }
        Ok(())
    }

    fn exec_instantiate(&mut self, argc: u16, ip: u32) -> Result<(), VmFault> {
        let type_args = self.pop_args(argc, ip)?;
        let callee = self.pop(ip)?;
        match self.arena.get(callee).kind.clone() {
            TypeKind::FunctionRef { addr } => {
                let result = self.eval_subroutine_at(addr, &type_args)?;
                self.stack.push(result);
            }
            _ => {
                self.push_diag(ip, "This expression is not generic and cannot be instantiated.");
                let never = self.never_type();
                self.stack.push(never);
            }
        }
        Ok(())
    }

    fn exec_set(&mut self, addr: u32, ip: u32) -> Result<(), VmFault> {
        let value = self.pop(ip)?;
        if let Some(idx) = self.find_subroutine_index(addr) {
            self.subroutines[idx].narrowed = Some(value);
        }
        Ok(())
    }

    fn exec_extends(&mut self, ip: u32) -> Result<(), VmFault> {
        let right = self.pop(ip)?;
        let left = self.pop(ip)?;
        self.last_infer_bindings.clear();
        collect_infer_bindings(&self.arena, left, right, &mut self.last_infer_bindings);
        let ok = extends(&self.arena, left, right);
        let text = if ok { "true" } else { "false" };
        self.push(TypeKind::Literal { kind: LiteralKind::Boolean, text: text.into() }, ip)
    }

    fn exec_index_access(&mut self, ip: u32) -> Result<(), VmFault> {
        let index = self.pop(ip)?;
        let object = self.pop(ip)?;
        let result = self.index_access(object, index, ip);
        self.stack.push(result);
        Ok(())
    }

    fn index_access(&mut self, object: TypeId, index: TypeId, ip: u32) -> TypeId {
        let object_kind = self.arena.get(object).kind.clone();
        let index_kind = self.arena.get(index).kind.clone();
        match &object_kind {
            TypeKind::Tuple(members) => {
                if let TypeKind::Literal { kind: LiteralKind::String, text } = &index_kind {
                    if text == "length" {
                        return alloc(&mut self.arena, ip, TypeKind::Literal { kind: LiteralKind::Number, text: members.len().to_string() });
                    }
                }
                if let TypeKind::Literal { kind: LiteralKind::Number, text } = &index_kind {
                    if let Ok(i) = text.parse::<usize>() {
                        let rest_pos = members.iter().position(|m| m.rest);
                        let past_rest = rest_pos.map(|r| i >= r).unwrap_or(false);
                        if past_rest || i >= members.len() {
                            // rest-bearing union-of-remaining-members rule (§9 open question)
                            let rest_onward: Vec<TypeId> = members[rest_pos.unwrap_or(members.len())..]
                                .iter()
                                .map(|m| m.ty)
                                .collect();
                            return crate::types::make_union(&mut self.arena, ip, rest_onward);
                        }
                        let member = &members[i];
                        if member.optional {
                            let undef = alloc(&mut self.arena, ip, TypeKind::Undefined);
                            return crate::types::make_union(&mut self.arena, ip, vec![member.ty, undef]);
                        }
                        return member.ty;
                    }
                }
                self.never_type()
            }
            TypeKind::Array(elem) => *elem,
            TypeKind::ObjectLiteral(members) => {
                if let TypeKind::Literal { kind: LiteralKind::String, text } = &index_kind {
                    for &m in members {
                        if self.arena.get(m).kind.member_name() == Some(text.as_str()) {
                            return match &self.arena.get(m).kind {
                                TypeKind::Property { ty, .. } | TypeKind::PropertySignature { ty, .. } => *ty,
                                _ => m,
                            };
                        }
                    }
                }
                self.push_diag(ip, format!("Property '{}' does not exist on type '{}'.", stringify(&self.arena, index), stringify(&self.arena, object)));
                self.never_type()
            }
            _ => self.never_type(),
        }
    }

    fn exec_modifier(&mut self, ip: u32, modifier: Modifier) -> Result<(), VmFault> {
        let top = self.pop(ip)?;
        let kind = self.arena.get(top).kind.clone();
        let new_kind = match (modifier, kind) {
            (Modifier::Optional, TypeKind::Property { name, readonly, ty, .. }) => TypeKind::Property { name, optional: true, readonly, ty },
            (Modifier::Optional, TypeKind::PropertySignature { name, readonly, ty, .. }) => TypeKind::PropertySignature { name, optional: true, readonly, ty },
            (Modifier::Optional, TypeKind::Method { name, params, ret, .. }) => TypeKind::Method { name, optional: true, params, ret },
            (Modifier::Optional, TypeKind::MethodSignature { name, params, ret, .. }) => TypeKind::MethodSignature { name, optional: true, params, ret },
            (Modifier::Optional, TypeKind::Parameter { name, ty, .. }) => TypeKind::Parameter { name, optional: true, ty },
            (Modifier::Optional, TypeKind::TupleElementMarker(mut m)) => {
                m.optional = true;
                TypeKind::TupleElementMarker(m)
            }
            (Modifier::Readonly, TypeKind::Property { name, optional, ty, .. }) => TypeKind::Property { name, optional, readonly: true, ty },
            (Modifier::Readonly, TypeKind::PropertySignature { name, optional, ty, .. }) => TypeKind::PropertySignature { name, optional, readonly: true, ty },
            (_, other) => other,
        };
        self.push(new_kind, ip)
    }

    fn exec_call_expression(&mut self, argc: u16, ip: u32) -> Result<(), VmFault> {
        let args = self.pop_args(argc, ip)?;
        let callee = self.pop(ip)?;
        let func_kind = self.arena.get(callee).kind.clone();
        let (params, ret) = match func_kind {
            TypeKind::Function { params, ret } => (params, ret),
            TypeKind::FunctionRef { addr } => {
                let materialized = self.eval_subroutine_at(addr, &[])?;
                match self.arena.get(materialized).kind.clone() {
                    TypeKind::Function { params, ret } => (params, ret),
                    _ => {
                        self.push_diag(ip, "This expression is not callable.");
                        let never = self.never_type();
                        self.stack.push(never);
                        return Ok(());
                    }
                }
            }
            _ => {
                self.push_diag(ip, "This expression is not callable.");
                let never = self.never_type();
                self.stack.push(never);
                return Ok(());
            }
        };
        for (i, &param) in params.iter().enumerate() {
            let (param_ty, optional) = match &self.arena.get(param).kind {
                TypeKind::Parameter { ty, optional, .. } => (*ty, *optional),
                _ => (param, false),
            };
            match args.get(i) {
                Some(&arg) => {
                    if !extends(&self.arena, arg, param_ty) {
                        let arg_str = stringify(&self.arena, arg);
                        let param_str = stringify(&self.arena, param_ty);
                        self.push_diag(ip, format!("Argument of type '{arg_str}' is not assignable to parameter of type '{param_str}'."));
                    }
                }
                None if !optional => {
                    self.push_diag(ip, format!("An argument for the parameter at position {i} was not provided."));
                }
                None => {}
            }
        }
        self.stack.push(ret);
        Ok(())
    }

    fn exec_error(&mut self, code: u16, ip: u32) -> Result<(), VmFault> {
        let message = self.render_error_code(code, ip);
        self.push_diag(ip, message);
        self.push(TypeKind::Never, ip)
    }

    fn render_error_code(&self, code: u16, ip: u32) -> String {
        if code == ErrorCode::CannotFind.code() {
            let name = self
                .image
                .source_map
                .lookup(ip)
                .map(|e| &self.source_text[e.src_start as usize..e.src_end as usize])
                .unwrap_or("?");
            format!("Cannot find name '{name}'.")
        } else if code == ErrorCode::ArgumentMissing.code() {
            "An argument was not provided.".to_string()
        } else if code == ErrorCode::ExcessivelyDeep.code() {
            "Type instantiation is excessively deep and possibly infinite.".to_string()
        } else {
            format!("Error TS{code}.")
        }
    }

    fn exec_union(&mut self, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.pop().unwrap();
        let members = self.stack.split_off(frame.floor);
        let result = crate::types::make_union(&mut self.arena, ip, members);
        self.stack.push(result);
        Ok(())
    }

    fn exec_intersection(&mut self, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.pop().unwrap();
        let members = self.stack.split_off(frame.floor);
        self.push(TypeKind::Intersection(members), ip)
    }

    fn exec_array(&mut self, ip: u32) -> Result<(), VmFault> {
        let elem = self.pop(ip)?;
        self.push(TypeKind::Array(elem), ip)
    }

    fn exec_tuple(&mut self, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.pop().unwrap();
        let raw = self.stack.split_off(frame.floor);
        let mut members = Vec::with_capacity(raw.len());
        for id in raw {
            match self.arena.get(id).kind.clone() {
                TypeKind::TupleElementMarker(m) if m.rest => {
                    // `...A` where `A` itself resolved to a tuple splices its
                    // members in place rather than nesting a single opaque
                    // element, so an accumulator pattern actually grows.
                    if let TypeKind::Tuple(inner) = self.arena.get(m.ty).kind.clone() {
                        members.extend(inner);
                    } else {
                        members.push(m);
                    }
                }
                TypeKind::TupleElementMarker(m) => members.push(m),
                _ => members.push(TupleMember { ty: id, optional: false, rest: false, name: None }),
            }
        }
        self.push(TypeKind::Tuple(members), ip)
    }

    fn exec_template_literal(&mut self, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.pop().unwrap();
        let parts = self.stack.split_off(frame.floor);
        // Cartesian product of each part's union expansion (§4.2).
        let mut combinations: Vec<Vec<TypeId>> = vec![Vec::new()];
        for &part in &parts {
            let expansion = union_members(&self.arena, part);
            let mut next = Vec::with_capacity(combinations.len() * expansion.len());
            'outer: for combo in &combinations {
                for &alt in &expansion {
                    if next.len() as u32 > self.config.combinatorial_cap {
                        self.push_diag(ip, "Combinatorial explosion: too many template literal combinations.");
                        break 'outer;
                    }
                    let mut extended = combo.clone();
                    extended.push(alt);
                    next.push(extended);
                }
            }
            combinations = next;
        }

        let mut results = Vec::with_capacity(combinations.len());
        'combos: for combo in combinations {
            let mut segments = Vec::new();
            let mut literal_run = String::new();
            let mut all_string_placeholder = combo.len() == 1;
            for id in combo {
                let kind = self.arena.get(id).kind.clone();
                match kind {
                    TypeKind::Never => continue 'combos,
                    TypeKind::Literal { text, .. } => literal_run.push_str(&text),
                    TypeKind::String if all_string_placeholder => {
                        if !literal_run.is_empty() {
                            segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_run)));
                        }
                        segments.push(TemplateSegment::Placeholder(id));
                    }
                    _ => {
                        all_string_placeholder = false;
                        if !literal_run.is_empty() {
                            segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_run)));
                        }
                        segments.push(TemplateSegment::Placeholder(id));
                    }
                }
            }
            if !literal_run.is_empty() {
                segments.push(TemplateSegment::Literal(literal_run));
            }
            if segments.is_empty() {
                results.push(alloc(&mut self.arena, ip, TypeKind::Literal { kind: LiteralKind::String, text: String::new() }));
            } else if segments.len() == 1 {
                if let TemplateSegment::Placeholder(id) = &segments[0] {
                    if matches!(self.arena.get(*id).kind, TypeKind::String) {
                        results.push(alloc(&mut self.arena, ip, TypeKind::String));
                        continue;
                    }
                }
                results.push(alloc(&mut self.arena, ip, TypeKind::TemplateLiteral(segments)));
            } else if segments.iter().all(|s| matches!(s, TemplateSegment::Literal(_))) {
                let text: String = segments
                    .into_iter()
                    .map(|s| match s {
                        TemplateSegment::Literal(t) => t,
                        _ => unreachable!(),
                    })
                    .collect();
                results.push(alloc(&mut self.arena, ip, TypeKind::Literal { kind: LiteralKind::String, text }));
            } else {
                results.push(alloc(&mut self.arena, ip, TypeKind::TemplateLiteral(segments)));
            }
        }
        let result = crate::types::make_union(&mut self.arena, ip, results);
        self.stack.push(result);
        Ok(())
    }

    fn exec_object_literal(&mut self, ip: u32) -> Result<(), VmFault> {
        let frame = self.frames.pop().unwrap();
        let members = self.stack.split_off(frame.floor);
        self.push(TypeKind::ObjectLiteral(members), ip)
    }

    fn exec_keyof(&mut self, ip: u32) -> Result<(), VmFault> {
        let operand = self.pop(ip)?;
        let result = match &self.arena.get(operand).kind {
            TypeKind::ObjectLiteral(members) => {
                let names: Vec<TypeId> = members
                    .iter()
                    .filter_map(|&m| {
                        self.arena.get(m).kind.member_name().map(|n| n.to_string())
                    })
                    .map(|n| alloc(&mut self.arena, ip, TypeKind::Literal { kind: LiteralKind::String, text: n }))
                    .collect();
                crate::types::make_union(&mut self.arena, ip, names)
            }
            _ => self.never_type(),
        };
        self.stack.push(result);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Modifier {
    Optional,
    Readonly,
}

/// Walks `right` looking for `InferPlaceholder` leaves and records the
/// structurally-corresponding subtree of `left` for each. Deliberately
/// modest (direct match, plus one level of `Array`/`Tuple` recursion) —
/// full unification over arbitrary nesting is the kind of "partial
/// machinery" the spec explicitly accepts leaving as a documented gap
/// (§9, mirroring the mapped-types decision).
fn collect_infer_bindings(arena: &TypeArena, left: TypeId, right: TypeId, out: &mut Vec<TypeId>) {
    match &arena.get(right).kind {
        TypeKind::InferPlaceholder(_) => out.push(left),
        TypeKind::Array(relem) => {
            if let TypeKind::Array(lelem) = &arena.get(left).kind {
                collect_infer_bindings(arena, *lelem, *relem, out);
            }
        }
        TypeKind::Tuple(rmembers) => {
            if let TypeKind::Tuple(lmembers) = &arena.get(left).kind {
                for (rm, lm) in rmembers.iter().zip(lmembers.iter()) {
                    collect_infer_bindings(arena, lm.ty, rm.ty, out);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{BytecodeImage, Instr};
    use crate::config::Config;

    fn const_string_check(expected_ok: bool, build_value: impl FnOnce(&mut BytecodeImage) -> Instr) -> Diagnostics {
        let mut img = BytecodeImage::new();
        let value = build_value(&mut img);
        let main_addr = img.current_addr();
        img.emit(value);
        img.emit(Instr::StringKw);
        img.emit(Instr::Assign);
        img.emit(Instr::Halt);
        img.main_addr = main_addr;
        let vm_result = run(&img, "t.ts", "\"abc\"", Config::default());
        let diags = vm_result.expect("well-formed image runs");
        assert_eq!(diags.is_empty(), expected_ok);
        diags
    }

    #[test]
    fn string_literal_assignable_to_string() {
        const_string_check(true, |img| Instr::StringLiteral(img.intern("abc")));
    }

    #[test]
    fn number_not_assignable_to_string() {
        let diags = const_string_check(false, |img| Instr::NumberLiteral(img.intern("42")));
        assert!(diags[0].message.contains("is not assignable to type 'string'"));
    }

    #[test]
    fn stack_empty_after_halt() {
        let mut img = BytecodeImage::new();
        let main_addr = img.current_addr();
        img.emit(Instr::StringKw);
        img.emit(Instr::NumberKw);
        img.emit(Instr::Halt);
        img.main_addr = main_addr;
        let mut vm = Vm::new(&img, "t.ts", "", Config::default());
        vm.run_to_completion().unwrap();
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn union_drops_never_members() {
        let mut img = BytecodeImage::new();
        let main_addr = img.current_addr();
        img.emit(Instr::Frame);
        img.emit(Instr::Never);
        img.emit(Instr::StringKw);
        img.emit(Instr::Union);
        img.emit(Instr::Return);
        img.main_addr = main_addr;
        let mut vm = Vm::new(&img, "t.ts", "", Config::default());
        let result = vm.eval_subroutine_at(main_addr, &[]).unwrap();
        assert!(matches!(vm.arena.get(result).kind, TypeKind::String));
    }

    #[test]
    fn unknown_opcode_is_host_fault() {
        let mut img = BytecodeImage::new();
        img.code.push(0xFF);
        img.main_addr = 0;
        let err = run(&img, "t.ts", "", Config::default()).unwrap_err();
        assert!(matches!(err, VmFault::UnknownOpcode { .. }));
    }
}
