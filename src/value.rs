use std::fmt;

/// Unique identifier for an interned symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// Index of a slot in the value arena. Vectors and panics share this id space.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorId(pub u32);

/// The fundamental cel value: discriminant + a 64-bit payload.
/// Copy semantics; vector contents live in the heap and are shared by id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Number(i64),
    Symbol(SymbolId),
    Vector(VectorId),
    Panic(VectorId),
}

impl Value {
    pub fn is_panic(self) -> bool {
        matches!(self, Value::Panic(_))
    }

    pub fn as_symbol(self) -> Option<SymbolId> {
        match self {
            Value::Symbol(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_vector(self) -> Option<VectorId> {
        match self {
            Value::Vector(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Num({})", n),
            Value::Symbol(id) => write!(f, "Sym({})", id.0),
            Value::Vector(id) => write!(f, "Vec({})", id.0),
            Value::Panic(id) => write!(f, "Panic({})", id.0),
        }
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

impl fmt::Debug for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VectorId({})", self.0)
    }
}
