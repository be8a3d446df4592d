use crate::error::Eval;
use crate::eval::Machine;
use crate::symbol::sym;
use crate::value::{SymbolId, Value};

/// A primitive over evaluated arguments.
pub type NativeFn = fn(&mut Machine, &[Value]) -> Eval<Value>;

pub struct Primitive {
    pub name: &'static str,
    pub symbol: SymbolId,
    pub apply: NativeFn,
}

pub static PRIMITIVES: [Primitive; 9] = [
    Primitive { name: "add", symbol: sym::ADD, apply: prim_add },
    Primitive { name: "mul", symbol: sym::MUL, apply: prim_mul },
    Primitive { name: "eq", symbol: sym::EQ, apply: prim_eq },
    Primitive { name: "length", symbol: sym::LENGTH, apply: prim_length },
    Primitive { name: "append", symbol: sym::APPEND, apply: prim_append },
    Primitive { name: "nth", symbol: sym::NTH, apply: prim_nth },
    Primitive { name: "open-file!", symbol: sym::OPEN_FILE, apply: prim_open_file },
    Primitive { name: "dp!", symbol: sym::DEBUG_PRINT, apply: prim_debug_print },
    Primitive { name: "vec", symbol: sym::VEC, apply: prim_vec },
];

fn boolean(b: bool) -> Value {
    Value::Symbol(if b { sym::TRUE } else { sym::FALSE })
}

/// (add n...): sum; 0 with no arguments.
fn prim_add(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let mut sum: i64 = 0;
    for &arg in args {
        match arg {
            Value::Number(n) => sum = sum.wrapping_add(n),
            other => return Err(m.raise_with(sym::ADD_NO_NUMBER, other)),
        }
    }
    Ok(Value::Number(sum))
}

/// (mul n...): product; 1 with no arguments.
fn prim_mul(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let mut product: i64 = 1;
    for &arg in args {
        match arg {
            Value::Number(n) => product = product.wrapping_mul(n),
            _ => return Err(m.raise(sym::PARAM_TYPE)),
        }
    }
    Ok(Value::Number(product))
}

/// (eq a b): numbers by value, symbols by id, vectors by identity.
/// Two structurally equal but separately built vectors are not eq.
fn prim_eq(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [a, b] = *args else {
        return Err(m.raise(sym::EQ_ILL_FORMED));
    };
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(boolean(x == y)),
        (Value::Symbol(x), Value::Symbol(y)) => Ok(boolean(x == y)),
        (Value::Vector(x), Value::Vector(y)) => Ok(boolean(x == y)),
        _ => Err(m.raise(sym::EQ_TYPES)),
    }
}

/// (length v): element count.
fn prim_length(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [v] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    let Value::Vector(id) = v else {
        return Err(m.raise(sym::PARAM_TYPE_1));
    };
    Ok(Value::Number(m.heap.len(id) as i64))
}

/// (append v x): a new vector: v's elements followed by x. v is unchanged.
fn prim_append(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [v, x] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    let Value::Vector(id) = v else {
        return Err(m.raise(sym::PARAM_TYPE_1));
    };
    let result = m.heap.alloc()?;
    m.heap.concat(result, id);
    m.heap.push(result, x);
    Ok(Value::Vector(result))
}

/// (nth i v): element i of v, zero based.
fn prim_nth(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [index, v] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    let Value::Number(index) = index else {
        return Err(m.raise(sym::PARAM_TYPE_1));
    };
    let Value::Vector(id) = v else {
        return Err(m.raise(sym::PARAM_TYPE_2));
    };
    let element = usize::try_from(index)
        .ok()
        .and_then(|i| m.heap.nth(id, i));
    match element {
        Some(value) => Ok(value),
        None => Err(m.raise(sym::OUT_OF_BOUNDS)),
    }
}

/// (vec x...): the arguments as a vector.
fn prim_vec(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    Ok(Value::Vector(m.heap.alloc_from(args)?))
}

/// (open-file! path): the file's bytes as a vector of numbers.
fn prim_open_file(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [path] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    let Value::Symbol(name) = path else {
        return Err(m.raise(sym::PARAM_TYPE_1));
    };
    let bytes = match std::fs::read(m.symbols.name(name)) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = m.symbols.name(name), error = %e, "open-file! failed");
            return Err(m.raise_with(sym::FAILED_OPEN, path));
        }
    };
    Ok(m.heap.vector_from_iter(bytes.into_iter().map(|b| Value::Number(i64::from(b))))?)
}

/// (dp! x): print x on stdout and return it.
fn prim_debug_print(m: &mut Machine, args: &[Value]) -> Eval<Value> {
    let [x] = *args else {
        return Err(m.raise(sym::ILL_FORMED));
    };
    println!("{}", m.print(x));
    Ok(x)
}
