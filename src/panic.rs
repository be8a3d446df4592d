//! Panics: structured error values that collect a call trace.
//!
//! A panic is an arena sequence `[reason]` or `[reason detail]`. Every
//! failing Native or closure call it passes through appends one frame
//! `(callee args...)`, so the outermost call ends up last.

use crate::error::{CelResult, Eval, Signal};
use crate::eval::Machine;
use crate::symbol::sym;
use crate::value::{SymbolId, Value, VectorId};

/// Reasons raised with a detail value right after the reason.
pub fn has_detail(reason: SymbolId) -> bool {
    reason == sym::UNBOUND
        || reason == sym::SELF_REC_BINDING
        || reason == sym::ADD_NO_NUMBER
        || reason == sym::LAMBDA_LIST_ILL_FORMED
        || reason == sym::FAILED_OPEN
}

/// A decoded panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicView {
    pub reason: SymbolId,
    pub detail: Option<Value>,
    /// Trace frames, innermost first.
    pub frames: Vec<VectorId>,
}

impl PanicView {
    /// Callee symbols of the trace, innermost first.
    pub fn callees(&self, machine: &Machine) -> Vec<SymbolId> {
        self.frames
            .iter()
            .filter_map(|&f| machine.heap.get(f).first().and_then(|v| v.as_symbol()))
            .collect()
    }
}

impl Machine {
    /// Raise a panic `[reason]`.
    pub(crate) fn raise(&mut self, reason: SymbolId) -> Signal {
        self.new_panic(reason, &[Value::Symbol(reason)])
    }

    /// Raise a panic `[reason detail]`.
    pub(crate) fn raise_with(&mut self, reason: SymbolId, detail: Value) -> Signal {
        self.new_panic(reason, &[Value::Symbol(reason), detail])
    }

    fn new_panic(&mut self, reason: SymbolId, items: &[Value]) -> Signal {
        tracing::debug!(reason = self.symbols.name(reason), "panic raised");
        match self.heap.alloc_from(items) {
            Ok(id) => Signal::Panic(id),
            Err(e) => Signal::Fatal(e),
        }
    }

    /// Append the frame `(callee args...)` to a propagating panic.
    pub(crate) fn push_frame(
        &mut self,
        panic: VectorId,
        callee: SymbolId,
        args: &[Value],
    ) -> CelResult<()> {
        tracing::debug!(callee = self.symbols.name(callee), "trace frame");
        let frame = self.heap.alloc_from(&[Value::Symbol(callee)])?;
        for &arg in args {
            self.heap.push(frame, arg);
        }
        self.heap.push(panic, Value::Vector(frame));
        Ok(())
    }

    /// Pass `result` through, adding a trace frame if it is a panic.
    pub(crate) fn traced(
        &mut self,
        result: Eval<Value>,
        callee: SymbolId,
        args: &[Value],
    ) -> Eval<Value> {
        match result {
            Err(Signal::Panic(id)) => {
                self.push_frame(id, callee, args)?;
                Err(Signal::Panic(id))
            }
            other => other,
        }
    }

    /// Decode a panic value. None for any other value.
    pub fn panic_view(&self, value: Value) -> Option<PanicView> {
        let Value::Panic(id) = value else {
            return None;
        };
        let items = self.heap.get(id);
        let reason = items.first()?.as_symbol()?;
        let detail_len = usize::from(has_detail(reason) && items.len() > 1);
        let detail = if detail_len == 1 { Some(items[1]) } else { None };
        let frames = items[1 + detail_len..]
            .iter()
            .filter_map(|v| v.as_vector())
            .collect();
        Some(PanicView {
            reason,
            detail,
            frames,
        })
    }
}
