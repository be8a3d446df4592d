use crate::error::{CelError, CelResult};
use crate::eval::ensure_stack;
use crate::heap::Heap;
use crate::symbol::{SymbolTable, MAX_SYMBOL_LEN};
use crate::value::Value;

/// Reader: parses cel source text into Value trees.
///
/// Grammar: whitespace-separated tokens; `(` `)` delimit a vector; a token
/// matching `-?[0-9]+` is a number; any other token is a symbol.
pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    heap: &'a mut Heap,
    symbols: &'a mut SymbolTable,
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_delimiter(ch: u8) -> bool {
    is_whitespace(ch) || ch == b'(' || ch == b')'
}

fn is_number(word: &str) -> bool {
    let digits = word.strip_prefix('-').unwrap_or(word);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str, heap: &'a mut Heap, symbols: &'a mut SymbolTable) -> Self {
        Reader {
            input: input.as_bytes(),
            pos: 0,
            heap,
            symbols,
        }
    }

    /// Read one expression. Returns None at EOF.
    pub fn read(&mut self) -> CelResult<Option<Value>> {
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return Ok(None);
        }
        let val = self.read_expr()?;
        Ok(Some(val))
    }

    /// Return current position in input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read all expressions from input.
    pub fn read_all(&mut self) -> CelResult<Vec<Value>> {
        let mut results = Vec::new();
        while let Some(val) = self.read()? {
            results.push(val);
        }
        Ok(results)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    fn read_expr(&mut self) -> CelResult<Value> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(CelError::Read("unexpected end of input".into())),
            Some(b'(') => ensure_stack(|| self.read_vector()),
            Some(b')') => Err(CelError::Read(format!("unexpected ')' at {}", self.pos))),
            Some(_) => self.read_word(),
        }
    }

    /// Read a vector: (a b c)
    fn read_vector(&mut self) -> CelResult<Value> {
        let open = self.pos;
        self.pos += 1; // consume '('
        let mut elements = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(CelError::Read(format!(
                        "unterminated vector opened at {}",
                        open
                    )))
                }
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => elements.push(self.read_expr()?),
            }
        }
        Ok(Value::Vector(self.heap.alloc_from(&elements)?))
    }

    fn read_word(&mut self) -> CelResult<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|ch| !is_delimiter(ch)) {
            self.pos += 1;
        }

        let word = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| CelError::Read("invalid UTF-8".into()))?;

        if is_number(word) {
            return word
                .parse::<i64>()
                .map(Value::Number)
                .map_err(|_| CelError::Read(format!("number out of range: {}", word)));
        }

        if word.len() > MAX_SYMBOL_LEN {
            return Err(CelError::SymbolTooLong(word.to_string()));
        }
        let id = self.symbols.intern(word)?;
        Ok(Value::Symbol(id))
    }
}

/// Read one expression starting at byte `pos`. Returns the expression and
/// the position just after it, or None at EOF.
pub fn read_one_at(
    input: &str,
    pos: usize,
    heap: &mut Heap,
    symbols: &mut SymbolTable,
) -> CelResult<Option<(Value, usize)>> {
    let mut reader = Reader::new(&input[pos..], heap, symbols);
    match reader.read()? {
        Some(val) => Ok(Some((val, pos + reader.position()))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print_val;
    use pretty_assertions::assert_eq;

    fn read_print(src: &str) -> CelResult<Vec<String>> {
        let mut heap = Heap::new(1024);
        let mut symbols = SymbolTable::new(1024);
        let values = Reader::new(src, &mut heap, &mut symbols).read_all()?;
        Ok(values
            .into_iter()
            .map(|v| print_val(v, &heap, &symbols))
            .collect())
    }

    #[test]
    fn reads_atoms_and_vectors() {
        assert_eq!(
            read_print("  (add 1 -2 (x))\n\t()  ").unwrap(),
            vec!["(add 1 -2 (x))", "()"]
        );
    }

    #[test]
    fn number_tokens_must_be_all_digits() {
        let mut heap = Heap::new(16);
        let mut symbols = SymbolTable::new(64);
        let values = Reader::new("12 -3 - 12ab -x", &mut heap, &mut symbols)
            .read_all()
            .unwrap();
        assert_eq!(values[0], Value::Number(12));
        assert_eq!(values[1], Value::Number(-3));
        assert!(values[2..].iter().all(|v| v.as_symbol().is_some()));
    }

    #[test]
    fn adjacent_parens_split_tokens() {
        assert_eq!(read_print("(a(b)c)").unwrap(), vec!["(a (b) c)"]);
    }

    #[test]
    fn read_errors() {
        assert!(matches!(read_print("(a b"), Err(CelError::Read(_))));
        assert!(matches!(read_print(")"), Err(CelError::Read(_))));
        assert!(matches!(
            read_print("99999999999999999999"),
            Err(CelError::Read(_))
        ));
        let long = "s".repeat(MAX_SYMBOL_LEN + 1);
        assert!(matches!(read_print(&long), Err(CelError::SymbolTooLong(_))));
    }

    #[test]
    fn read_one_at_walks_the_input() {
        let mut heap = Heap::new(16);
        let mut symbols = SymbolTable::new(64);
        let input = "1 (a) ";
        let (first, pos) = read_one_at(input, 0, &mut heap, &mut symbols).unwrap().unwrap();
        assert_eq!(first, Value::Number(1));
        let (second, pos) = read_one_at(input, pos, &mut heap, &mut symbols).unwrap().unwrap();
        assert_eq!(print_val(second, &heap, &symbols), "(a)");
        assert!(read_one_at(input, pos, &mut heap, &mut symbols).unwrap().is_none());
    }
}
