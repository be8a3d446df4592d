//! cel: a small S-expression interpreter.
//!
//! A reader builds a tree of numbers, symbols and vectors in an arena; the
//! evaluator runs it against one flat binding stack. Closures copy out the
//! bindings they need when built (lexical capture), and errors are panic
//! values that gather a call trace on their way out.
//!
//! ```
//! use cel::{Limits, Machine};
//!
//! let mut m = Machine::new(Limits::default()).unwrap();
//! let out = m.eval_str("(bind (x 5) (y (add x 1)) (mul x y))").unwrap();
//! assert_eq!(m.print(out[0]), "30");
//! ```

pub mod capture;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod forms;
pub mod globals;
pub mod heap;
pub mod panic;
pub mod primitives;
pub mod printer;
pub mod reader;
pub mod symbol;
pub mod value;

pub use config::Limits;
pub use error::{CelError, CelResult};
pub use eval::Machine;
pub use panic::PanicView;
pub use value::{SymbolId, Value, VectorId};
