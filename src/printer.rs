use crate::heap::Heap;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Print a cel value to a string.
/// Vectors print as `(a b)`, panics as `<a b>`.
pub fn print_val(val: Value, heap: &Heap, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    print_inner(val, heap, symbols, &mut out);
    out
}

fn print_inner(val: Value, heap: &Heap, symbols: &SymbolTable, out: &mut String) {
    match val {
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Symbol(id) => out.push_str(symbols.name(id)),
        Value::Vector(id) => print_seq(heap.get(id), ('(', ')'), heap, symbols, out),
        Value::Panic(id) => print_seq(heap.get(id), ('<', '>'), heap, symbols, out),
    }
}

fn print_seq(
    items: &[Value],
    (open, close): (char, char),
    heap: &Heap,
    symbols: &SymbolTable,
    out: &mut String,
) {
    out.push(open);
    for (i, &item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        print_inner(item, heap, symbols, out);
    }
    out.push(close);
}
