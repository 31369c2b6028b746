//! Bytecode image format.
//!
//! A module compiles to a single contiguous byte buffer:
//!
//! ```text
//! [ Jump &storage_end ]
//! [ SourceMap <u32 size> <(u32 ip, u32 src_pos, u32 src_end)>* ]
//! [ Subroutine entries*: (u32 name_addr|0, u32 body_addr) ]
//! [ Main <u32 main_addr> ]
//! [ subroutine bodies, each terminated by Return ]
//! [ storage region: (u16 len, bytes)* up to storage_end ]
//! ```
//!
//! Every opcode has a fixed operand width so advancing the instruction
//! pointer by that width always lands on another valid opcode
//! (self-synchronization, see the `bytecode_self_sync` test).

use std::collections::HashMap;

/// One-byte opcode tag. Values are stable; do not renumber once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // type producers, zero operands
    Never = 0,
    Any = 1,
    Unknown = 2,
    Void = 3,
    Object = 4,
    StringKw = 5,
    NumberKw = 6,
    BooleanKw = 7,
    BigIntKw = 8,
    SymbolKw = 9,
    Null = 10,
    Undefined = 11,
    True = 12,
    False = 13,

    // type producers, one storage address operand
    StringLiteral = 14,
    NumberLiteral = 15,
    BigIntLiteral = 16,

    // object/tuple/function member wrappers
    Property = 17,       // name_addr: u32
    PropertySignature = 18, // name_addr: u32
    Method = 19,          // name_addr: u32
    MethodSignature = 20, // name_addr: u32
    Parameter = 21,       // name_addr: u32
    TupleMember = 22,     // flags: u16, name_addr: u32
    IndexSignature = 23,  // key_name_addr: u32
    Function = 24,        // paramc: u16
    FunctionRef = 25,     // addr: u32
    Class = 26,

    // stack/frame control, zero operands unless noted
    Frame = 27,
    Return = 28,
    Var = 29,
    TypeVar = 30,
    Loads = 31, // frame_off: u16, index: u16
    Assign = 32,
    Dup = 33,
    Widen = 34,

    // control flow
    Jump = 35,          // addr: u32
    JumpCondition = 36, // then_addr: u16, else_addr: u16
    Call = 37,          // addr: u32, argc: u16
    TailCall = 38,
    Distribute = 39, // loop_body: u32

    // generics/instantiation
    TypeArgument = 40,
    TypeArgumentDefault = 41, // addr: u32
    Instantiate = 42,         // argc: u16
    Set = 43,                 // addr: u32

    // operators/checks
    Extends = 44,
    IndexAccess = 45,
    Optional = 46,
    Readonly = 47,
    Initializer = 48,
    CallExpression = 49, // argc: u16
    Error = 50,          // code: u16

    // type constructors consuming the current frame
    Union = 51,
    Intersection = 52,
    Array = 53,
    Tuple = 54,
    TemplateLiteral = 55,
    ObjectLiteral = 56,
    Keyof = 57,
    Infer = 58, // slot_name_addr: u32

    // meta
    Noop = 59,
    Halt = 60,
}

impl OpCode {
    pub fn from_u8(b: u8) -> Option<OpCode> {
        use OpCode::*;
        const TABLE: &[OpCode] = &[
            Never, Any, Unknown, Void, Object, StringKw, NumberKw, BooleanKw, BigIntKw, SymbolKw,
            Null, Undefined, True, False, StringLiteral, NumberLiteral, BigIntLiteral, Property,
            PropertySignature, Method, MethodSignature, Parameter, TupleMember, IndexSignature,
            Function, FunctionRef, Class, Frame, Return, Var, TypeVar, Loads, Assign, Dup, Widen,
            Jump, JumpCondition, Call, TailCall, Distribute, TypeArgument, TypeArgumentDefault,
            Instantiate, Set, Extends, IndexAccess, Optional, Readonly, Initializer,
            CallExpression, Error, Union, Intersection, Array, Tuple, TemplateLiteral,
            ObjectLiteral, Keyof, Infer, Noop, Halt,
        ];
        TABLE.get(b as usize).copied()
    }

    /// Number of operand bytes following the tag byte. Load-bearing for
    /// self-synchronization: `width() + 1` always lands on the next tag.
    pub fn operand_width(self) -> usize {
        use OpCode::*;
        match self {
            StringLiteral | NumberLiteral | BigIntLiteral | Property | PropertySignature
            | Method | MethodSignature | Parameter | IndexSignature | FunctionRef | Jump
            | Distribute | TypeArgumentDefault | Set | Infer => 4,
            TupleMember => 6,    // u16 + u32
            Loads => 4,          // u16 + u16
            JumpCondition => 4,  // u16 + u16
            Call => 6,           // u32 + u16
            Function | Instantiate | CallExpression | Error => 2,
            _ => 0,
        }
    }

    pub fn total_width(self) -> usize {
        1 + self.operand_width()
    }
}

/// A decoded instruction with its operands resolved to native integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Never,
    Any,
    Unknown,
    Void,
    Object,
    StringKw,
    NumberKw,
    BooleanKw,
    BigIntKw,
    SymbolKw,
    Null,
    Undefined,
    True,
    False,
    StringLiteral(u32),
    NumberLiteral(u32),
    BigIntLiteral(u32),
    Property(u32),
    PropertySignature(u32),
    Method(u32),
    MethodSignature(u32),
    Parameter(u32),
    TupleMember(u16, u32),
    IndexSignature(u32),
    Function(u16),
    FunctionRef(u32),
    Class,
    Frame,
    Return,
    Var,
    TypeVar,
    Loads(u16, u16),
    Assign,
    Dup,
    Widen,
    Jump(u32),
    JumpCondition(u16, u16),
    Call(u32, u16),
    TailCall,
    Distribute(u32),
    TypeArgument,
    TypeArgumentDefault(u32),
    Instantiate(u16),
    Set(u32),
    Extends,
    IndexAccess,
    Optional,
    Readonly,
    Initializer,
    CallExpression(u16),
    Error(u16),
    Union,
    Intersection,
    Array,
    Tuple,
    TemplateLiteral,
    ObjectLiteral,
    Keyof,
    Infer(u32),
    Noop,
    Halt,
}

/// Bit flags packed into `TupleMember`'s u16 operand.
pub const TUPLE_OPTIONAL: u16 = 1 << 0;
pub const TUPLE_REST: u16 = 1 << 1;

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Decode the instruction at `ip`. Returns `None` (a host fault) if `ip`
/// holds an unrecognized tag byte.
pub fn decode(bytes: &[u8], ip: usize) -> Option<Instr> {
    let tag = OpCode::from_u8(*bytes.get(ip)?)?;
    let body = ip + 1;
    use OpCode as O;
    Some(match tag {
        O::Never => Instr::Never,
        O::Any => Instr::Any,
        O::Unknown => Instr::Unknown,
        O::Void => Instr::Void,
        O::Object => Instr::Object,
        O::StringKw => Instr::StringKw,
        O::NumberKw => Instr::NumberKw,
        O::BooleanKw => Instr::BooleanKw,
        O::BigIntKw => Instr::BigIntKw,
        O::SymbolKw => Instr::SymbolKw,
        O::Null => Instr::Null,
        O::Undefined => Instr::Undefined,
        O::True => Instr::True,
        O::False => Instr::False,
        O::StringLiteral => Instr::StringLiteral(read_u32(bytes, body)),
        O::NumberLiteral => Instr::NumberLiteral(read_u32(bytes, body)),
        O::BigIntLiteral => Instr::BigIntLiteral(read_u32(bytes, body)),
        O::Property => Instr::Property(read_u32(bytes, body)),
        O::PropertySignature => Instr::PropertySignature(read_u32(bytes, body)),
        O::Method => Instr::Method(read_u32(bytes, body)),
        O::MethodSignature => Instr::MethodSignature(read_u32(bytes, body)),
        O::Parameter => Instr::Parameter(read_u32(bytes, body)),
        O::TupleMember => Instr::TupleMember(read_u16(bytes, body), read_u32(bytes, body + 2)),
        O::IndexSignature => Instr::IndexSignature(read_u32(bytes, body)),
        O::Function => Instr::Function(read_u16(bytes, body)),
        O::FunctionRef => Instr::FunctionRef(read_u32(bytes, body)),
        O::Class => Instr::Class,
        O::Frame => Instr::Frame,
        O::Return => Instr::Return,
        O::Var => Instr::Var,
        O::TypeVar => Instr::TypeVar,
        O::Loads => Instr::Loads(read_u16(bytes, body), read_u16(bytes, body + 2)),
        O::Assign => Instr::Assign,
        O::Dup => Instr::Dup,
        O::Widen => Instr::Widen,
        O::Jump => Instr::Jump(read_u32(bytes, body)),
        O::JumpCondition => {
            Instr::JumpCondition(read_u16(bytes, body), read_u16(bytes, body + 2))
        }
        O::Call => Instr::Call(read_u32(bytes, body), read_u16(bytes, body + 4)),
        O::TailCall => Instr::TailCall,
        O::Distribute => Instr::Distribute(read_u32(bytes, body)),
        O::TypeArgument => Instr::TypeArgument,
        O::TypeArgumentDefault => Instr::TypeArgumentDefault(read_u32(bytes, body)),
        O::Instantiate => Instr::Instantiate(read_u16(bytes, body)),
        O::Set => Instr::Set(read_u32(bytes, body)),
        O::Extends => Instr::Extends,
        O::IndexAccess => Instr::IndexAccess,
        O::Optional => Instr::Optional,
        O::Readonly => Instr::Readonly,
        O::Initializer => Instr::Initializer,
        O::CallExpression => Instr::CallExpression(read_u16(bytes, body)),
        O::Error => Instr::Error(read_u16(bytes, body)),
        O::Union => Instr::Union,
        O::Intersection => Instr::Intersection,
        O::Array => Instr::Array,
        O::Tuple => Instr::Tuple,
        O::TemplateLiteral => Instr::TemplateLiteral,
        O::ObjectLiteral => Instr::ObjectLiteral,
        O::Keyof => Instr::Keyof,
        O::Infer => Instr::Infer(read_u32(bytes, body)),
        O::Noop => Instr::Noop,
        O::Halt => Instr::Halt,
    })
}

/// Byte offset one past the tag+operands at `ip`, i.e. where the next
/// instruction must begin.
pub fn instr_width(bytes: &[u8], ip: usize) -> Option<usize> {
    OpCode::from_u8(*bytes.get(ip)?).map(OpCode::total_width)
}

/// One entry in the source-map table: `(ip, src_start, src_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMapEntry {
    pub ip: u32,
    pub src_start: u32,
    pub src_end: u32,
}

/// Maps bytecode instruction pointers back to source ranges for
/// diagnostics. Lookup is first-match in table order, per invariant 4.
#[derive(Debug, Clone, Default)]
pub struct SourceMapTable {
    entries: Vec<SourceMapEntry>,
}

impl SourceMapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ip: u32, src_start: u32, src_end: u32) {
        self.entries.push(SourceMapEntry {
            ip,
            src_start,
            src_end,
        });
    }

    /// First entry whose `ip` matches, in insertion order.
    pub fn lookup(&self, ip: u32) -> Option<SourceMapEntry> {
        self.entries.iter().find(|e| e.ip == ip).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-subroutine table entry (§3.4). `result`/`narrowed` are the only
/// fields mutated after compilation, and only by the owning `Vm`.
#[derive(Debug, Clone)]
pub struct SubroutineEntry {
    pub name_addr: Option<u32>,
    pub body_addr: u32,
    pub result: Option<crate::types::TypeId>,
    pub narrowed: Option<crate::types::TypeId>,
    pub exported: bool,
}

/// A compiled module: bytecode bytes, the subroutine table, the
/// string-storage region, and the source map. This is the in-memory
/// counterpart of the on-disk byte layout documented at the top of this
/// module; nothing in this crate currently serializes one to the other,
/// so `code`/`storage` are built and read directly by the compiler and VM.
#[derive(Debug, Clone)]
pub struct BytecodeImage {
    pub code: Vec<u8>,
    pub storage: Vec<u8>,
    pub subroutines: Vec<SubroutineEntry>,
    pub main_addr: u32,
    pub source_map: SourceMapTable,
    name_index: HashMap<String, u32>,
}

impl BytecodeImage {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            storage: Vec::new(),
            subroutines: Vec::new(),
            main_addr: 0,
            source_map: SourceMapTable::new(),
            name_index: HashMap::new(),
        }
    }

    /// Intern `s`, returning its byte offset into the storage region.
    /// Deduplicates by exact text match (the format does not require this,
    /// but it keeps images compact).
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&addr) = self.name_index.get(s) {
            return addr;
        }
        let addr = self.storage.len() as u32;
        let bytes = s.as_bytes();
        self.storage
            .extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        self.storage.extend_from_slice(bytes);
        self.name_index.insert(s.to_string(), addr);
        addr
    }

    /// Read back an interned string given its storage address.
    pub fn read_string(&self, addr: u32) -> &str {
        let at = addr as usize;
        let len = u16::from_le_bytes([self.storage[at], self.storage[at + 1]]) as usize;
        std::str::from_utf8(&self.storage[at + 2..at + 2 + len]).unwrap_or("")
    }

    pub fn current_addr(&self) -> u32 {
        self.code.len() as u32
    }

    fn push_u16(&mut self, v: u16) {
        self.code.extend_from_slice(&v.to_le_bytes());
    }

    fn push_u32(&mut self, v: u32) {
        self.code.extend_from_slice(&v.to_le_bytes());
    }

    pub fn emit(&mut self, instr: Instr) -> u32 {
        let addr = self.current_addr();
        use Instr::*;
        macro_rules! tag {
            ($op:expr) => {
                self.code.push($op as u8)
            };
        }
        match instr {
            Never => tag!(OpCode::Never),
            Any => tag!(OpCode::Any),
            Unknown => tag!(OpCode::Unknown),
            Void => tag!(OpCode::Void),
            Object => tag!(OpCode::Object),
            StringKw => tag!(OpCode::StringKw),
            NumberKw => tag!(OpCode::NumberKw),
            BooleanKw => tag!(OpCode::BooleanKw),
            BigIntKw => tag!(OpCode::BigIntKw),
            SymbolKw => tag!(OpCode::SymbolKw),
            Null => tag!(OpCode::Null),
            Undefined => tag!(OpCode::Undefined),
            True => tag!(OpCode::True),
            False => tag!(OpCode::False),
            StringLiteral(a) => {
                tag!(OpCode::StringLiteral);
                self.push_u32(a);
            }
            NumberLiteral(a) => {
                tag!(OpCode::NumberLiteral);
                self.push_u32(a);
            }
            BigIntLiteral(a) => {
                tag!(OpCode::BigIntLiteral);
                self.push_u32(a);
            }
            Property(a) => {
                tag!(OpCode::Property);
                self.push_u32(a);
            }
            PropertySignature(a) => {
                tag!(OpCode::PropertySignature);
                self.push_u32(a);
            }
            Method(a) => {
                tag!(OpCode::Method);
                self.push_u32(a);
            }
            MethodSignature(a) => {
                tag!(OpCode::MethodSignature);
                self.push_u32(a);
            }
            Parameter(a) => {
                tag!(OpCode::Parameter);
                self.push_u32(a);
            }
            TupleMember(flags, a) => {
                tag!(OpCode::TupleMember);
                self.push_u16(flags);
                self.push_u32(a);
            }
            IndexSignature(a) => {
                tag!(OpCode::IndexSignature);
                self.push_u32(a);
            }
            Function(argc) => {
                tag!(OpCode::Function);
                self.push_u16(argc);
            }
            FunctionRef(a) => {
                tag!(OpCode::FunctionRef);
                self.push_u32(a);
            }
            Class => tag!(OpCode::Class),
            Frame => tag!(OpCode::Frame),
            Return => tag!(OpCode::Return),
            Var => tag!(OpCode::Var),
            TypeVar => tag!(OpCode::TypeVar),
            Loads(off, idx) => {
                tag!(OpCode::Loads);
                self.push_u16(off);
                self.push_u16(idx);
            }
            Assign => tag!(OpCode::Assign),
            Dup => tag!(OpCode::Dup),
            Widen => tag!(OpCode::Widen),
            Jump(a) => {
                tag!(OpCode::Jump);
                self.push_u32(a);
            }
            JumpCondition(t, e) => {
                tag!(OpCode::JumpCondition);
                self.push_u16(t);
                self.push_u16(e);
            }
            Call(a, argc) => {
                tag!(OpCode::Call);
                self.push_u32(a);
                self.push_u16(argc);
            }
            TailCall => tag!(OpCode::TailCall),
            Distribute(a) => {
                tag!(OpCode::Distribute);
                self.push_u32(a);
            }
            TypeArgument => tag!(OpCode::TypeArgument),
            TypeArgumentDefault(a) => {
                tag!(OpCode::TypeArgumentDefault);
                self.push_u32(a);
            }
            Instantiate(argc) => {
                tag!(OpCode::Instantiate);
                self.push_u16(argc);
            }
            Set(a) => {
                tag!(OpCode::Set);
                self.push_u32(a);
            }
            Extends => tag!(OpCode::Extends),
            IndexAccess => tag!(OpCode::IndexAccess),
            Optional => tag!(OpCode::Optional),
            Readonly => tag!(OpCode::Readonly),
            Initializer => tag!(OpCode::Initializer),
            CallExpression(argc) => {
                tag!(OpCode::CallExpression);
                self.push_u16(argc);
            }
            Error(code) => {
                tag!(OpCode::Error);
                self.push_u16(code);
            }
            Union => tag!(OpCode::Union),
            Intersection => tag!(OpCode::Intersection),
            Array => tag!(OpCode::Array),
            Tuple => tag!(OpCode::Tuple),
            TemplateLiteral => tag!(OpCode::TemplateLiteral),
            ObjectLiteral => tag!(OpCode::ObjectLiteral),
            Keyof => tag!(OpCode::Keyof),
            Infer(a) => {
                tag!(OpCode::Infer);
                self.push_u32(a);
            }
            Noop => tag!(OpCode::Noop),
            Halt => tag!(OpCode::Halt),
        }
        addr
    }

    /// Patch a previously emitted fixed-width address operand (used for
    /// forward references: `Jump`/`Call`/`Distribute`/branch targets).
    pub fn patch_u32(&mut self, at: u32, value: u32) {
        let at = at as usize;
        self.code[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_u16(&mut self, at: u32, value: u16) {
        let at = at as usize;
        self.code[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn decode(&self, ip: usize) -> Option<Instr> {
        decode(&self.code, ip)
    }
}

impl Default for BytecodeImage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytecode_self_sync() {
        let mut img = BytecodeImage::new();
        let a = img.intern("Foo");
        img.emit(Instr::Frame);
        img.emit(Instr::StringKw);
        img.emit(Instr::Property(a));
        img.emit(Instr::Loads(1, 2));
        img.emit(Instr::Call(0, 3));
        img.emit(Instr::Return);

        let mut ip = 0usize;
        let mut seen = Vec::new();
        while ip < img.code.len() {
            let instr = decode(&img.code, ip).expect("valid opcode at every landing point");
            seen.push(instr);
            ip += instr_width(&img.code, ip).unwrap();
        }
        assert_eq!(ip, img.code.len());
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn intern_deduplicates() {
        let mut img = BytecodeImage::new();
        let a = img.intern("same");
        let b = img.intern("same");
        assert_eq!(a, b);
        assert_eq!(img.read_string(a), "same");
    }

    #[test]
    fn patch_rewrites_forward_reference() {
        let mut img = BytecodeImage::new();
        let jump_at = img.emit(Instr::Jump(0));
        let target = img.emit(Instr::Halt);
        img.patch_u32(jump_at + 1, target);
        match img.decode(jump_at as usize) {
            Some(Instr::Jump(addr)) => assert_eq!(addr, target),
            other => panic!("expected patched Jump, got {:?}", other),
        }
    }
}
