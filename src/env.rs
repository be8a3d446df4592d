use crate::error::{CelError, CelResult};
use crate::forms::Form;
use crate::primitives::Primitive;
use crate::value::{SymbolId, Value};

/// What a name is bound to, which also decides how a call through it
/// treats its arguments.
#[derive(Clone, Copy)]
pub enum BindingKind {
    /// An evaluated value: a number, symbol, vector, or a lambda literal.
    Expression(Value),
    /// A `bind` name whose expression is still being evaluated.
    SelfReference,
    /// A name shadowed while computing captures. Bound only at call time.
    Parameter,
    /// A primitive receiving evaluated arguments.
    Native(&'static Primitive),
    /// A special form receiving its raw argument expressions.
    Transform(&'static Form),
}

#[derive(Clone, Copy)]
pub struct Binding {
    pub symbol: SymbolId,
    pub kind: BindingKind,
}

/// Saved `(begin, size)` of the stack, restored on scope exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    begin: usize,
    size: usize,
}

/// One flat stack of bindings shared by every call.
///
/// `frames[..globals]` is the global prefix, always in scope.
/// `frames[begin..]` holds the locals of the active call. Everything in
/// between belongs to callers and is invisible, which is what makes lookup
/// lexical rather than dynamic.
pub struct BindingStack {
    frames: Vec<Binding>,
    globals: usize,
    begin: usize,
    capacity: usize,
}

impl BindingStack {
    pub fn new(capacity: usize) -> Self {
        BindingStack {
            frames: Vec::with_capacity(capacity.min(4096)),
            globals: 0,
            begin: 0,
            capacity,
        }
    }

    /// Push a global binding. Only valid before any local is pushed.
    pub fn push_global(&mut self, binding: Binding) -> CelResult<()> {
        debug_assert_eq!(self.frames.len(), self.globals);
        self.push_local(binding)?;
        self.globals = self.frames.len();
        self.begin = self.globals;
        Ok(())
    }

    /// Push a local onto the active range. Returns its frame index.
    /// Returns Err(StackOverflow) if capacity is exceeded.
    pub fn push_local(&mut self, binding: Binding) -> CelResult<usize> {
        if self.frames.len() >= self.capacity {
            return Err(CelError::StackOverflow(self.capacity));
        }
        self.frames.push(binding);
        Ok(self.frames.len() - 1)
    }

    /// Replace the payload of a local pushed in the active range.
    pub fn rebind(&mut self, index: usize, kind: BindingKind) {
        debug_assert!(index >= self.begin);
        self.frames[index].kind = kind;
    }

    /// Most recent local first, then the globals.
    pub fn lookup(&self, symbol: SymbolId) -> Option<Binding> {
        self.frames[self.begin..]
            .iter()
            .rev()
            .chain(self.frames[..self.globals].iter().rev())
            .find(|b| b.symbol == symbol)
            .copied()
    }

    pub fn mark(&self) -> Mark {
        Mark {
            begin: self.begin,
            size: self.frames.len(),
        }
    }

    /// Start a new call: hide every current local.
    pub fn enter(&mut self) {
        self.begin = self.frames.len();
    }

    /// Drop everything pushed since `mark` and restore its active range.
    pub fn reset(&mut self, mark: Mark) {
        self.frames.truncate(mark.size);
        self.begin = mark.begin;
    }

    pub fn size(&self) -> usize {
        self.frames.len()
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn global_count(&self) -> usize {
        self.globals
    }
}
