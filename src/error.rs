use thiserror::Error;

use crate::value::VectorId;

/// Fatal conditions at the Rust level. These are never language values:
/// capacity exhaustion, unreadable input and host setup failures.
#[derive(Debug, Clone, Error)]
pub enum CelError {
    /// A symbol name exceeded the maximum length.
    #[error("symbol name too long: '{0}'")]
    SymbolTooLong(String),

    /// The symbol table reached its capacity.
    #[error("symbol table full ({0} symbols)")]
    SymbolTableFull(usize),

    /// The value arena reached its capacity.
    #[error("value arena full ({0} vectors)")]
    ArenaOverflow(usize),

    /// The binding stack reached its capacity (recursion too deep).
    #[error("binding stack overflow ({0} frames)")]
    StackOverflow(usize),

    /// Reader error.
    #[error("read error: {0}")]
    Read(String),

    /// Bad limit or command-line setting.
    #[error("configuration error: {0}")]
    Config(String),

    /// Host I/O failure outside the language (loading source files).
    #[error("I/O error: {0}")]
    Io(String),
}

pub type CelResult<T> = Result<T, CelError>;

/// Why an evaluation step did not produce a value.
#[derive(Debug, Clone)]
pub enum Signal {
    /// A language-level panic, accumulating trace frames as it propagates.
    Panic(VectorId),
    /// A fatal condition; unwinds the whole evaluation.
    Fatal(CelError),
}

impl From<CelError> for Signal {
    fn from(e: CelError) -> Self {
        Signal::Fatal(e)
    }
}

/// Result of an evaluation step.
pub type Eval<T> = Result<T, Signal>;
