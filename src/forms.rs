//! The special forms. Each receives its argument expressions unevaluated
//! and has a matching capture rule used when it appears inside a closure
//! body.

use crate::capture::{union, Capture};
use crate::env::BindingKind;
use crate::error::Eval;
use crate::eval::Machine;
use crate::symbol::sym;
use crate::value::{SymbolId, Value};

/// Evaluate a special form over its raw arguments.
pub type FormFn = fn(&mut Machine, &[Value]) -> Eval<Value>;
/// Captures of a special form over its raw arguments.
pub type CaptureFn = fn(&mut Machine, &[Value]) -> Eval<Vec<Capture>>;

pub struct Form {
    pub name: &'static str,
    pub symbol: SymbolId,
    pub apply: FormFn,
    pub capture: CaptureFn,
}

pub static FORMS: [Form; 4] = [
    Form { name: "bind", symbol: sym::BIND, apply: form_bind, capture: capture_bind },
    Form { name: "lambda", symbol: sym::LAMBDA, apply: form_lambda, capture: capture_lambda },
    Form { name: "if", symbol: sym::IF, apply: form_if, capture: capture_if },
    Form { name: "quote", symbol: sym::QUOTE, apply: form_quote, capture: capture_quote },
];

// ============================================================================
// quote
// ============================================================================

/// (quote x): x, unevaluated.
fn form_quote(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    match args {
        [x] => Ok(*x),
        _ => Err(m.raise(sym::QUOTE_ILL_FORMED)),
    }
}

fn capture_quote(_m: &mut Machine, _args: &[Value]) -> Eval<Vec<Capture>> {
    Ok(Vec::new())
}

// ============================================================================
// if
// ============================================================================

/// (if cond then else): the condition must be `true` or `false`; only the
/// selected branch is evaluated.
fn form_if(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [cond, then, otherwise] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    match m.eval_value(cond)? {
        Value::Symbol(s) if s == sym::TRUE => m.eval_value(then),
        Value::Symbol(s) if s == sym::FALSE => m.eval_value(otherwise),
        _ => Err(m.raise(sym::CONDITION_NON_SYMBOL)),
    }
}

fn capture_if(m: &mut Machine, args: &[Value]) -> Eval<Vec<Capture>> {
    if args.len() != 3 {
        return Err(m.raise(sym::ILL_FORMED));
    }
    let mut result = Vec::new();
    for &expr in args {
        let captured = m.capture_lexical_bindings(expr)?;
        union(&mut result, captured);
    }
    Ok(result)
}

// ============================================================================
// lambda
// ============================================================================

/// Check `((params...) body)` and return the parameter names and the body.
fn lambda_parts(m: &mut Machine, args: &[Value]) -> Eval<(Vec<SymbolId>, Value)> {
    let [Value::Vector(list), body] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    let entries = m.heap.get(list).to_vec();
    let mut params = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::Symbol(s) => params.push(s),
            other => return Err(m.raise_with(sym::LAMBDA_LIST_ILL_FORMED, other)),
        }
    }
    Ok((params, body))
}

/// (lambda (params...) body): a lambda literal
/// `((params... captures...) body)` carrying the current values of the
/// body's free variables.
fn form_lambda(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let (params, body) = lambda_parts(m, args)?;
    let captures = m.capture_shadowed(&params, body)?;

    let list = m.heap.alloc()?;
    for &param in &params {
        m.heap.push(list, Value::Symbol(param));
    }
    for capture in captures {
        let entry = capture.to_entry(&mut m.heap)?;
        m.heap.push(list, entry);
    }
    let lambda = m.heap.alloc_from(&[Value::Vector(list), body])?;
    Ok(Value::Vector(lambda))
}

fn capture_lambda(m: &mut Machine, args: &[Value]) -> Eval<Vec<Capture>> {
    let (params, body) = lambda_parts(m, args)?;
    m.capture_shadowed(&params, body)
}

// ============================================================================
// bind
// ============================================================================

/// Check `((name expr)... body)` and return the pairs and the body.
fn bind_parts(m: &mut Machine, args: &[Value]) -> Eval<(Vec<(SymbolId, Value)>, Value)> {
    let Some((&body, pairs)) = args.split_last() else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    if pairs.is_empty() {
        return Err(m.raise(sym::ILL_FORMED));
    }
    let mut bindings = Vec::with_capacity(pairs.len());
    for &pair in pairs {
        let parsed = match pair {
            Value::Vector(id) => match m.heap.get(id) {
                [Value::Symbol(name), expr] => Some((*name, *expr)),
                _ => None,
            },
            _ => None,
        };
        match parsed {
            Some(binding) => bindings.push(binding),
            None => return Err(m.raise(sym::ILL_FORMED)),
        }
    }
    Ok((bindings, body))
}

/// (bind (n1 e1) (n2 e2)... body): sequential bindings. Each name is in
/// scope for the following pairs and the body; while its own expression is
/// evaluated it is a self reference, so a lambda can call itself.
fn form_bind(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let (bindings, body) = bind_parts(m, args)?;
    m.extended(|m| {
        for (name, expr) in bindings {
            let at = m.push(name, BindingKind::SelfReference)?;
            let value = m.eval_value(expr)?;
            m.stack.rebind(at, BindingKind::Expression(value));
        }
        m.eval_value(body)
    })
}

fn capture_bind(m: &mut Machine, args: &[Value]) -> Eval<Vec<Capture>> {
    let (bindings, body) = bind_parts(m, args)?;
    m.extended(|m| {
        let mut result = Vec::new();
        for (name, expr) in bindings {
            m.push(name, BindingKind::Parameter)?;
            let captured = m.capture_lexical_bindings(expr)?;
            union(&mut result, captured);
        }
        let captured = m.capture_lexical_bindings(body)?;
        union(&mut result, captured);
        Ok(result)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::symbol::SymbolTable;
    use pretty_assertions::assert_eq;

    fn run(src: &str) -> String {
        let mut m = Machine::new(Limits::default()).unwrap();
        let results = m.eval_str(src).unwrap();
        m.print(results[0])
    }

    #[test]
    fn form_symbols_match_names() {
        let table = SymbolTable::new(64);
        for form in &FORMS {
            assert_eq!(table.name(form.symbol), form.name);
        }
    }

    #[test]
    fn quote_returns_its_argument() {
        assert_eq!(run("(quote (a (b 1)))"), "(a (b 1))");
        assert_eq!(run("(quote)"), "<quote-ill-formed>");
        assert_eq!(run("(quote 1 2)"), "<quote-ill-formed>");
    }

    #[test]
    fn if_selects_a_branch() {
        assert_eq!(run("(if (eq 1 1) 10 20)"), "10");
        assert_eq!(run("(if (eq 1 2) 10 20)"), "20");
        assert_eq!(run("(if 1 2 3)"), "<condition-non-symbol>");
        assert_eq!(run("(if (quote yes) 2 3)"), "<condition-non-symbol>");
        assert_eq!(run("(if (eq 1 1) 2)"), "<ill-formed>");
    }

    #[test]
    fn if_propagates_condition_panics() {
        assert_eq!(run("(if (nth 3 (quote ())) 1 2)"), "<out-of-bounds (nth 3 ())>");
    }

    #[test]
    fn lambda_literal_carries_captures() {
        assert_eq!(run("(lambda (x) x)"), "((x) x)");
        assert_eq!(
            run("(bind (y 7) (lambda (x) (add x y)))"),
            "((x (y 7)) (add x y))"
        );
    }

    #[test]
    fn lambda_rejects_bad_lists() {
        assert_eq!(run("(lambda (x 1) x)"), "<lambda-list-ill-formed 1>");
        assert_eq!(run("(lambda x x)"), "<ill-formed>");
        assert_eq!(run("(lambda (x))"), "<ill-formed>");
    }

    #[test]
    fn lambda_with_unbound_free_variable_panics() {
        assert_eq!(run("(lambda (x) (add x z))"), "<unbound z>");
    }

    #[test]
    fn recursive_lambda_carries_a_self_entry() {
        assert_eq!(
            run("(bind (f (lambda (n) (f n))) f)"),
            "((n (f)) (f n))"
        );
    }

    #[test]
    fn bind_is_sequential() {
        assert_eq!(run("(bind (x 5) (y (add x 1)) (mul x y))"), "30");
        assert_eq!(run("(bind (x 1) (x (add x 1)) x)"), "<self-rec-binding x>");
    }

    #[test]
    fn bind_rejects_bad_shapes() {
        assert_eq!(run("(bind 1)"), "<ill-formed>");
        assert_eq!(run("(bind (x) 1)"), "<ill-formed>");
        assert_eq!(run("(bind (1 2) 1)"), "<ill-formed>");
        assert_eq!(run("(bind 5 1)"), "<ill-formed>");
    }
}
