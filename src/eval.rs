use crate::capture::Capture;
use crate::config::Limits;
use crate::env::{Binding, BindingKind, BindingStack};
use crate::error::{CelResult, Eval, Signal};
use crate::globals;
use crate::heap::Heap;
use crate::printer;
use crate::reader::Reader;
use crate::symbol::{sym, SymbolTable};
use crate::value::{SymbolId, Value, VectorId};

/// Keep at least this much host stack free before recursing.
const RED_ZONE: usize = 100 * 1024;
/// Host stack segment allocated when the red zone is reached.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the host stack first if it is nearly exhausted.
/// Language recursion is bounded by the binding stack, not by the host.
#[inline]
pub(crate) fn ensure_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// The cel evaluation machine.
/// Owns the three process-lifetime stores: symbols, values and bindings.
pub struct Machine {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub stack: BindingStack,
}

/// A lambda literal `(lambda-list body)` taken apart for application.
struct Closure {
    params: Vec<SymbolId>,
    captures: Vec<Capture>,
    body: Value,
}

impl Machine {
    pub fn new(limits: Limits) -> CelResult<Self> {
        let mut m = Machine {
            heap: Heap::new(limits.vectors),
            symbols: SymbolTable::new(limits.symbols),
            stack: BindingStack::new(limits.frames),
        };
        globals::install(&mut m)?;
        Ok(m)
    }

    /// Parse every top-level expression of `input`.
    pub fn read_all(&mut self, input: &str) -> CelResult<Vec<Value>> {
        Reader::new(input, &mut self.heap, &mut self.symbols).read_all()
    }

    /// Print a value to a string.
    pub fn print(&self, value: Value) -> String {
        printer::print_val(value, &self.heap, &self.symbols)
    }

    // ========================================================================
    // Core evaluation entry point
    // ========================================================================

    /// Evaluate an expression in the global environment.
    /// A panic comes back as `Ok(Value::Panic(_))`; only fatal conditions
    /// are errors.
    pub fn eval(&mut self, expr: Value) -> CelResult<Value> {
        let mark = self.stack.mark();
        let result = self.eval_value(expr);
        self.stack.reset(mark);
        match result {
            Ok(value) => Ok(value),
            Err(Signal::Panic(id)) => Ok(Value::Panic(id)),
            Err(Signal::Fatal(e)) => Err(e),
        }
    }

    /// Read and evaluate every top-level expression of `input`, in order.
    pub fn eval_str(&mut self, input: &str) -> CelResult<Vec<Value>> {
        let exprs = self.read_all(input)?;
        exprs.into_iter().map(|expr| self.eval(expr)).collect()
    }

    pub(crate) fn eval_value(&mut self, expr: Value) -> Eval<Value> {
        ensure_stack(|| match expr {
            Value::Number(_) => Ok(expr),
            Value::Symbol(symbol) => self.eval_symbol(symbol),
            Value::Vector(id) => self.eval_call(id),
            Value::Panic(id) => Err(Signal::Panic(id)),
        })
    }

    fn eval_symbol(&mut self, symbol: SymbolId) -> Eval<Value> {
        let Some(binding) = self.stack.lookup(symbol) else {
            return Err(self.raise_with(sym::UNBOUND, Value::Symbol(symbol)));
        };
        match binding.kind {
            BindingKind::Expression(value) => Ok(value),
            BindingKind::SelfReference => {
                Err(self.raise_with(sym::SELF_REC_BINDING, Value::Symbol(symbol)))
            }
            BindingKind::Parameter => Err(self.raise_with(sym::UNBOUND, Value::Symbol(symbol))),
            BindingKind::Native(prim) => self.display_symbol('@', prim.name),
            BindingKind::Transform(form) => self.display_symbol('#', form.name),
        }
    }

    /// Opaque name standing in for a primitive or special form used as a value.
    fn display_symbol(&mut self, sigil: char, name: &str) -> Eval<Value> {
        let id = self.symbols.intern(&format!("{}{}", sigil, name))?;
        Ok(Value::Symbol(id))
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn eval_call(&mut self, id: VectorId) -> Eval<Value> {
        let Some(head) = self.heap.get(id).first().copied() else {
            return Err(self.raise(sym::EMPTY_VEC));
        };
        let Value::Symbol(name) = head else {
            return Err(self.raise(sym::NOT_SYMBOL));
        };
        let Some(binding) = self.stack.lookup(name) else {
            return Err(self.raise_with(sym::UNBOUND, head));
        };

        match binding.kind {
            BindingKind::Transform(form) => {
                let raw = self.heap.get(id)[1..].to_vec();
                (form.apply)(self, &raw)
            }
            BindingKind::Native(prim) => {
                let args = self.eval_args(id)?;
                let result = (prim.apply)(self, &args);
                self.traced(result, name, &args)
            }
            BindingKind::Expression(lambda) => {
                let args = self.eval_args(id)?;
                let result = self.apply(lambda, &args);
                self.traced(result, name, &args)
            }
            BindingKind::SelfReference => Err(self.raise_with(sym::SELF_REC_BINDING, head)),
            BindingKind::Parameter => Err(self.raise_with(sym::UNBOUND, head)),
        }
    }

    /// Evaluate the arguments of a call left to right.
    /// The first panic stops evaluation of the rest.
    fn eval_args(&mut self, call: VectorId) -> Eval<Vec<Value>> {
        let exprs = self.heap.get(call)[1..].to_vec();
        exprs.into_iter().map(|e| self.eval_value(e)).collect()
    }

    /// Apply a lambda literal `(lambda-list body)` to evaluated arguments.
    ///
    /// The body runs in a fresh scope holding only the positional
    /// parameters and the captures carried in the lambda-list, so it cannot
    /// observe the caller's locals.
    pub fn apply(&mut self, lambda: Value, args: &[Value]) -> Eval<Value> {
        let Some(closure) = self.closure_parts(lambda) else {
            return Err(self.raise(sym::ILL_FORMED));
        };
        if closure.params.len() != args.len() {
            return Err(self.raise(sym::NUMBER_PARAMS));
        }

        if tracing::enabled!(tracing::Level::TRACE) {
            let shown: Vec<String> = args.iter().map(|&a| self.print(a)).collect();
            tracing::trace!(
                lambda = %self.print(lambda),
                args = %shown.join(" "),
                "apply"
            );
        }

        self.scoped(|m| {
            for (&symbol, &arg) in closure.params.iter().zip(args) {
                m.push(symbol, BindingKind::Expression(arg))?;
            }
            for capture in &closure.captures {
                let kind = match *capture {
                    Capture::Value(_, value) => BindingKind::Expression(value),
                    Capture::SelfRef(_) => BindingKind::Expression(lambda),
                };
                m.push(capture.symbol(), kind)?;
            }
            m.eval_value(closure.body)
        })
    }

    /// Take a lambda literal apart. None if it is not one.
    fn closure_parts(&self, lambda: Value) -> Option<Closure> {
        let (list, body) = match self.heap.get(lambda.as_vector()?) {
            [Value::Vector(list), body] => (*list, *body),
            _ => return None,
        };

        let entries = self.heap.get(list);
        let positional = entries.iter().take_while(|v| v.as_symbol().is_some()).count();
        let params = entries[..positional]
            .iter()
            .filter_map(|v| v.as_symbol())
            .collect();
        let captures = entries[positional..]
            .iter()
            .map(|&entry| Capture::from_entry(entry, &self.heap))
            .collect::<Option<Vec<_>>>()?;

        Some(Closure {
            params,
            captures,
            body,
        })
    }

    // ========================================================================
    // Scope discipline
    // ========================================================================

    pub(crate) fn push(&mut self, symbol: SymbolId, kind: BindingKind) -> CelResult<usize> {
        self.stack.push_local(Binding { symbol, kind })
    }

    /// Run `body` as a new call: only globals and what `body` pushes are
    /// visible. The caller's range is restored on every exit path.
    pub(crate) fn scoped<T>(&mut self, body: impl FnOnce(&mut Self) -> Eval<T>) -> Eval<T> {
        let mark = self.stack.mark();
        self.stack.enter();
        let result = body(self);
        self.stack.reset(mark);
        result
    }

    /// Run `body` in the current scope; whatever it pushes is dropped after.
    pub(crate) fn extended<T>(&mut self, body: impl FnOnce(&mut Self) -> Eval<T>) -> Eval<T> {
        let mark = self.stack.mark();
        let result = body(self);
        self.stack.reset(mark);
        result
    }
}
