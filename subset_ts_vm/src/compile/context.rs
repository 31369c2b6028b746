//! Positional frame-offset scoping (§9): the compiler's only notion of
//! "scope" is a stack of named-slot lists, resolved to `(frame_offset,
//! slot_index)` pairs at compile time. The VM never sees a name again.

#[derive(Debug, Clone, Default)]
struct Scope {
    names: Vec<String>,
    /// Whether a bare reference to one of `names` is a "naked type
    /// parameter" for distributive-conditional purposes. True only for a
    /// declaration's own type-parameter frame; `infer` bindings, conditional
    /// branch frames, and a distribute loop body's own rebinding are all
    /// false, so a name already distributed once doesn't redistribute every
    /// time the same conditional recurses over it.
    distributable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

/// A captured scope chain, reusable across [`ScopeStack::from_snapshot`]
/// calls for a subroutine body queued for later compilation.
pub type ScopeSnapshot = Vec<(Vec<String>, bool)>;

impl ScopeStack {
    pub fn push(&mut self, names: Vec<String>) {
        self.scopes.push(Scope { names, distributable: false });
    }

    pub fn push_type_params(&mut self, names: Vec<String>) {
        self.scopes.push(Scope { names, distributable: true });
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// `(frame_offset, slot_index)` for `name`, searching from the
    /// innermost scope outward. `frame_offset` 0 is the current subroutine,
    /// 1 its caller, matching `Loads`'s own convention (§4.2).
    pub fn resolve(&self, name: &str) -> Option<(u16, u16)> {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if let Some(idx) = scope.names.iter().position(|n| n == name) {
                return Some((depth as u16, idx as u16));
            }
        }
        None
    }

    /// True when `name` resolves to a declaration's own type parameter —
    /// the one case TypeScript's conditional types distribute over.
    pub fn is_naked_type_param(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.names.iter().any(|n| n == name) {
                return scope.distributable;
            }
        }
        false
    }

    /// Captures the current scope chain so a subroutine body queued for
    /// later compilation (a conditional branch, a type-parameter default)
    /// can rebuild the exact lexical view it was written in, one level
    /// deeper than whatever it closes over.
    pub fn snapshot(&self) -> ScopeSnapshot {
        self.scopes.iter().map(|s| (s.names.clone(), s.distributable)).collect()
    }

    pub fn from_snapshot(snapshot: ScopeSnapshot) -> Self {
        Self {
            scopes: snapshot
                .into_iter()
                .map(|(names, distributable)| Scope { names, distributable })
                .collect(),
        }
    }
}
