//! Per-call stack frame (§3.5). A frame is a window onto the VM's shared
//! operand stack: a floor (the frame's own stack pointer), the number of
//! type arguments the caller actually supplied, and the per-slot
//! "unprovided" bookkeeping `TypeArgument`/`TypeArgumentDefault` need.
//!
//! §3.5 also names an "optional loop helper" field used while `Distribute`
//! iterates a union. This VM evaluates each iteration as a direct recursive
//! call (see `vm/mod.rs`'s module docs) and keeps that state in a plain
//! local `Vec` rather than threading it through the frame, so no loop-helper
//! field is carried here — there is nothing for it to hold.

#[derive(Debug, Clone)]
pub struct Frame {
    /// Stack index this frame's contents begin at; `Return` never lets the
    /// stack shrink below this (invariant 1).
    pub floor: usize,
    /// Number of type-argument values the caller actually pushed before
    /// entering this frame (the `argc` of the `Call`/`Distribute` that
    /// created it).
    pub supplied_argc: u16,
    /// Count of named variables pinned in this frame by `Var`/`TypeVar`
    /// (§3.5); distinct from `supplied_argc`, which is fixed at call time.
    pub var_count: u16,
    /// `type_arg_slots[i]` is `true` if the i-th `TypeArgument` opcode
    /// found no caller-supplied value and synthesized an `Unknown`
    /// sentinel (§4.2).
    pub type_arg_slots: Vec<bool>,
}

impl Frame {
    pub fn new(floor: usize, supplied_argc: u16) -> Self {
        Self {
            floor,
            supplied_argc,
            var_count: 0,
            type_arg_slots: Vec::new(),
        }
    }
}
