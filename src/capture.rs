//! Lexical capture: computing, when a closure is built, the outer bindings
//! its body depends on.
//!
//! Locals live in a single reused stack that later calls overwrite, so a
//! closure cannot keep a pointer to its defining scope. Instead the
//! `lambda` form copies every free variable's current value into the
//! closure's lambda-list.

use crate::env::BindingKind;
use crate::error::{CelResult, Eval, Signal};
use crate::eval::{ensure_stack, Machine};
use crate::heap::Heap;
use crate::symbol::sym;
use crate::value::{SymbolId, Value};

/// One entry of a closure's captured environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// `(name value)`: the value `name` had when the closure was built.
    Value(SymbolId, Value),
    /// `(name)`: `name` is the closure's own, still-unfinished definition.
    /// Bound to the closure itself when it is applied.
    SelfRef(SymbolId),
}

impl Capture {
    pub fn symbol(self) -> SymbolId {
        match self {
            Capture::Value(symbol, _) | Capture::SelfRef(symbol) => symbol,
        }
    }

    /// Allocate the lambda-list entry for this capture.
    pub fn to_entry(self, heap: &mut Heap) -> CelResult<Value> {
        let id = match self {
            Capture::Value(symbol, value) => heap.alloc_from(&[Value::Symbol(symbol), value])?,
            Capture::SelfRef(symbol) => heap.alloc_from(&[Value::Symbol(symbol)])?,
        };
        Ok(Value::Vector(id))
    }

    /// Decode a lambda-list entry. None if malformed.
    pub fn from_entry(entry: Value, heap: &Heap) -> Option<Capture> {
        match heap.get(entry.as_vector()?) {
            [Value::Symbol(symbol), value] => Some(Capture::Value(*symbol, *value)),
            [Value::Symbol(symbol)] => Some(Capture::SelfRef(*symbol)),
            _ => None,
        }
    }
}

/// Add `more` to `into`, skipping symbols already captured.
pub fn union(into: &mut Vec<Capture>, more: Vec<Capture>) {
    for capture in more {
        if !into.iter().any(|c| c.symbol() == capture.symbol()) {
            into.push(capture);
        }
    }
}

impl Machine {
    /// The bindings `expr` depends on in the current environment, in order
    /// of first use.
    pub fn capture_lexical_bindings(&mut self, expr: Value) -> Eval<Vec<Capture>> {
        ensure_stack(|| match expr {
            Value::Number(_) => Ok(Vec::new()),
            Value::Symbol(symbol) => self.capture_symbol(symbol),
            Value::Vector(id) => {
                let items = self.heap.get(id).to_vec();
                self.capture_call(&items)
            }
            Value::Panic(id) => Err(Signal::Panic(id)),
        })
    }

    fn capture_symbol(&mut self, symbol: SymbolId) -> Eval<Vec<Capture>> {
        let Some(binding) = self.stack.lookup(symbol) else {
            return Err(self.raise_with(sym::UNBOUND, Value::Symbol(symbol)));
        };
        Ok(match binding.kind {
            BindingKind::Expression(value) => vec![Capture::Value(symbol, value)],
            BindingKind::SelfReference => vec![Capture::SelfRef(symbol)],
            // Globally reachable, or bound when the closure runs.
            BindingKind::Parameter | BindingKind::Native(_) | BindingKind::Transform(_) => {
                Vec::new()
            }
        })
    }

    fn capture_call(&mut self, items: &[Value]) -> Eval<Vec<Capture>> {
        let Some(&head) = items.first() else {
            return Err(self.raise(sym::EMPTY_VEC));
        };
        let Value::Symbol(name) = head else {
            return Err(self.raise(sym::NOT_SYMBOL));
        };
        let Some(binding) = self.stack.lookup(name) else {
            return Err(self.raise_with(sym::UNBOUND, head));
        };
        if let BindingKind::Transform(form) = binding.kind {
            return (form.capture)(self, &items[1..]);
        }

        let mut result = Vec::new();
        for &item in items {
            let captured = self.capture_lexical_bindings(item)?;
            union(&mut result, captured);
        }
        Ok(result)
    }

    /// Capture `expr` with `names` shadowed, so they are not captured.
    pub(crate) fn capture_shadowed(
        &mut self,
        names: &[SymbolId],
        expr: Value,
    ) -> Eval<Vec<Capture>> {
        self.extended(|m| {
            for &name in names {
                m.push(name, BindingKind::Parameter)?;
            }
            m.capture_lexical_bindings(expr)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use pretty_assertions::assert_eq;

    fn machine() -> Machine {
        Machine::new(Limits::default()).unwrap()
    }

    fn read(m: &mut Machine, src: &str) -> Value {
        m.read_all(src).unwrap()[0]
    }

    fn bind_local(m: &mut Machine, name: &str, value: Value) -> SymbolId {
        let symbol = m.symbols.intern(name).unwrap();
        m.push(symbol, BindingKind::Expression(value)).unwrap();
        symbol
    }

    #[test]
    fn numbers_and_primitives_need_nothing() {
        let mut m = machine();
        let expr = read(&mut m, "(add 1 (mul 2 3))");
        assert_eq!(m.capture_lexical_bindings(expr).unwrap(), vec![]);
    }

    #[test]
    fn free_variables_are_captured_once_in_order() {
        let mut m = machine();
        let y = bind_local(&mut m, "y", Value::Number(2));
        let x = bind_local(&mut m, "x", Value::Number(1));
        let expr = read(&mut m, "(add x y x)");
        assert_eq!(
            m.capture_lexical_bindings(expr).unwrap(),
            vec![
                Capture::Value(x, Value::Number(1)),
                Capture::Value(y, Value::Number(2)),
            ]
        );
    }

    #[test]
    fn unbound_symbol_panics() {
        let mut m = machine();
        let expr = read(&mut m, "(add nope 1)");
        let Err(Signal::Panic(id)) = m.capture_lexical_bindings(expr) else {
            panic!("expected a panic");
        };
        assert_eq!(m.print(Value::Panic(id)), "<unbound nope>");
    }

    #[test]
    fn quote_captures_nothing() {
        let mut m = machine();
        bind_local(&mut m, "x", Value::Number(1));
        let expr = read(&mut m, "(quote (x y z))");
        assert_eq!(m.capture_lexical_bindings(expr).unwrap(), vec![]);
    }

    #[test]
    fn lambda_parameters_shadow_outer_names() {
        let mut m = machine();
        bind_local(&mut m, "x", Value::Number(1));
        let y = bind_local(&mut m, "y", Value::Number(2));
        let expr = read(&mut m, "(lambda (x) (add x y))");
        assert_eq!(
            m.capture_lexical_bindings(expr).unwrap(),
            vec![Capture::Value(y, Value::Number(2))]
        );
    }

    #[test]
    fn bind_names_are_not_captured() {
        let mut m = machine();
        let z = bind_local(&mut m, "z", Value::Number(3));
        let expr = read(&mut m, "(bind (a z) (b (add a 1)) (mul a b))");
        assert_eq!(
            m.capture_lexical_bindings(expr).unwrap(),
            vec![Capture::Value(z, Value::Number(3))]
        );
    }

    #[test]
    fn self_reference_becomes_a_self_entry() {
        let mut m = machine();
        let f = m.symbols.intern("f").unwrap();
        m.push(f, BindingKind::SelfReference).unwrap();
        let expr = read(&mut m, "(f 1)");
        assert_eq!(
            m.capture_lexical_bindings(expr).unwrap(),
            vec![Capture::SelfRef(f)]
        );
    }

    #[test]
    fn capture_temporaries_are_popped() {
        let mut m = machine();
        let before = m.stack.size();
        let expr = read(&mut m, "(lambda (a b) (bind (c a) (add c b)))");
        m.capture_lexical_bindings(expr).unwrap();
        assert_eq!(m.stack.size(), before);
    }

    #[test]
    fn entries_round_trip_through_the_heap() {
        let mut heap = Heap::new(8);
        let pair = Capture::Value(SymbolId(40), Value::Number(9));
        let own = Capture::SelfRef(SymbolId(41));
        let a = pair.to_entry(&mut heap).unwrap();
        let b = own.to_entry(&mut heap).unwrap();
        assert_eq!(Capture::from_entry(a, &heap), Some(pair));
        assert_eq!(Capture::from_entry(b, &heap), Some(own));
        assert_eq!(Capture::from_entry(Value::Number(1), &heap), None);
    }
}
