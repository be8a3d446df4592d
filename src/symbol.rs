use rustc_hash::FxHashMap;

use crate::error::{CelError, CelResult};
use crate::value::SymbolId;

/// Longest symbol name the table accepts, in bytes.
pub const MAX_SYMBOL_LEN: usize = 31;

/// Interned symbol table. Each unique symbol name maps to a unique SymbolId.
/// Append-only: ids stay valid for the lifetime of the table.
pub struct SymbolTable {
    name_to_id: FxHashMap<String, SymbolId>,
    id_to_name: Vec<String>,
    capacity: usize,
}

/// Well-known symbol IDs, pre-interned at startup.
/// These must match the order of interning in SymbolTable::new().
pub mod sym {
    use crate::value::SymbolId;

    // Special forms
    pub const BIND: SymbolId = SymbolId(0);
    pub const LAMBDA: SymbolId = SymbolId(1);
    pub const IF: SymbolId = SymbolId(2);
    pub const QUOTE: SymbolId = SymbolId(3);
    // Booleans
    pub const TRUE: SymbolId = SymbolId(4);
    pub const FALSE: SymbolId = SymbolId(5);
    // Panic reasons
    pub const ILL_FORMED: SymbolId = SymbolId(6);
    pub const EMPTY_VEC: SymbolId = SymbolId(7);
    pub const NOT_SYMBOL: SymbolId = SymbolId(8);
    pub const LAMBDA_LIST_ILL_FORMED: SymbolId = SymbolId(9);
    pub const QUOTE_ILL_FORMED: SymbolId = SymbolId(10);
    pub const CONDITION_NON_SYMBOL: SymbolId = SymbolId(11);
    pub const NUMBER_PARAMS: SymbolId = SymbolId(12);
    pub const UNBOUND: SymbolId = SymbolId(13);
    pub const SELF_REC_BINDING: SymbolId = SymbolId(14);
    pub const ADD_NO_NUMBER: SymbolId = SymbolId(15);
    pub const PARAM_TYPE: SymbolId = SymbolId(16);
    pub const PARAM_TYPE_1: SymbolId = SymbolId(17);
    pub const PARAM_TYPE_2: SymbolId = SymbolId(18);
    pub const EQ_ILL_FORMED: SymbolId = SymbolId(19);
    pub const EQ_TYPES: SymbolId = SymbolId(20);
    pub const OUT_OF_BOUNDS: SymbolId = SymbolId(21);
    pub const FAILED_OPEN: SymbolId = SymbolId(22);
    // Primitive names
    pub const ADD: SymbolId = SymbolId(23);
    pub const MUL: SymbolId = SymbolId(24);
    pub const EQ: SymbolId = SymbolId(25);
    pub const LENGTH: SymbolId = SymbolId(26);
    pub const APPEND: SymbolId = SymbolId(27);
    pub const NTH: SymbolId = SymbolId(28);
    pub const VEC: SymbolId = SymbolId(29);
    pub const OPEN_FILE: SymbolId = SymbolId(30);
    pub const DEBUG_PRINT: SymbolId = SymbolId(31);
}

const WELL_KNOWN: [&str; 32] = [
    "bind", "lambda", "if", "quote",
    "true", "false",
    "ill-formed", "empty-vec", "not-symbol", "lambda-list-ill-formed",
    "quote-ill-formed", "condition-non-symbol", "number-params", "unbound",
    "self-rec-binding", "add-no-number", "param-type", "param-type-1",
    "param-type-2", "eq-ill-formed", "eq-!=-types", "out-of-bounds",
    "failed-open",
    "add", "mul", "eq", "length", "append", "nth", "vec", "open-file!", "dp!",
];

impl SymbolTable {
    /// Create a new symbol table with all well-known symbols pre-interned.
    /// The well-known names always fit, even when `capacity` is smaller.
    pub fn new(capacity: usize) -> Self {
        let mut name_to_id = FxHashMap::default();
        let mut id_to_name = Vec::with_capacity(capacity.min(4096));

        for (i, name) in WELL_KNOWN.iter().enumerate() {
            let id = SymbolId(i as u32);
            name_to_id.insert(name.to_string(), id);
            id_to_name.push(name.to_string());
        }

        SymbolTable {
            name_to_id,
            id_to_name,
            capacity,
        }
    }

    /// Intern a symbol name. Returns the existing ID if already interned,
    /// or creates a new one.
    pub fn intern(&mut self, name: &str) -> CelResult<SymbolId> {
        if name.len() > MAX_SYMBOL_LEN {
            return Err(CelError::SymbolTooLong(name.to_string()));
        }
        if let Some(&id) = self.name_to_id.get(name) {
            return Ok(id);
        }
        if self.id_to_name.len() >= self.capacity {
            return Err(CelError::SymbolTableFull(self.capacity));
        }
        let id = SymbolId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        Ok(id)
    }

    /// Look up a symbol name by its ID.
    pub fn name(&self, id: SymbolId) -> &str {
        &self.id_to_name[id.0 as usize]
    }

    /// Look up a symbol ID by name, without interning.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of interned symbols.
    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_ids_match_names() {
        let table = SymbolTable::new(1024);
        assert_eq!(table.name(sym::BIND), "bind");
        assert_eq!(table.name(sym::TRUE), "true");
        assert_eq!(table.name(sym::EQ_TYPES), "eq-!=-types");
        assert_eq!(table.name(sym::DEBUG_PRINT), "dp!");
        assert_eq!(table.lookup("out-of-bounds"), Some(sym::OUT_OF_BOUNDS));
    }

    #[test]
    fn interning_twice_returns_same_id() {
        let mut table = SymbolTable::new(1024);
        let a = table.intern("foo").unwrap();
        let b = table.intern("foo").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.intern("lambda").unwrap(), sym::LAMBDA);
        assert_eq!(table.count(), WELL_KNOWN.len() + 1);
    }

    #[test]
    fn rejects_long_names() {
        let mut table = SymbolTable::new(1024);
        let ok = "a".repeat(MAX_SYMBOL_LEN);
        assert!(table.intern(&ok).is_ok());
        let too_long = "a".repeat(MAX_SYMBOL_LEN + 1);
        assert!(matches!(
            table.intern(&too_long),
            Err(CelError::SymbolTooLong(_))
        ));
    }

    #[test]
    fn full_table_is_fatal() {
        let mut table = SymbolTable::new(WELL_KNOWN.len() + 1);
        table.intern("one").unwrap();
        assert!(table.intern("one").is_ok());
        assert!(matches!(
            table.intern("two"),
            Err(CelError::SymbolTableFull(_))
        ));
    }
}
