use crate::error::{CelError, CelResult};

/// Default symbol table capacity.
pub const DEFAULT_MAX_SYMBOLS: usize = 1 << 10;
/// Default value arena capacity.
pub const DEFAULT_MAX_VECTORS: usize = 1 << 20;
/// Default binding stack capacity. Bounds recursion depth.
pub const DEFAULT_MAX_FRAMES: usize = 1 << 20;

/// Capacities of the three process-lifetime stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub symbols: usize,
    pub vectors: usize,
    pub frames: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            symbols: DEFAULT_MAX_SYMBOLS,
            vectors: DEFAULT_MAX_VECTORS,
            frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl Limits {
    /// Defaults, overridden by `CEL_MAX_SYMBOLS`, `CEL_MAX_VECTORS` and
    /// `CEL_MAX_FRAMES` when set.
    pub fn from_env() -> CelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> CelResult<Self> {
        let mut limits = Limits::default();
        if let Some(v) = get("CEL_MAX_SYMBOLS") {
            limits.symbols = parse_limit("CEL_MAX_SYMBOLS", &v)?;
        }
        if let Some(v) = get("CEL_MAX_VECTORS") {
            limits.vectors = parse_limit("CEL_MAX_VECTORS", &v)?;
        }
        if let Some(v) = get("CEL_MAX_FRAMES") {
            limits.frames = parse_limit("CEL_MAX_FRAMES", &v)?;
        }
        Ok(limits)
    }
}

/// Parse a positive capacity.
pub fn parse_limit(name: &str, text: &str) -> CelResult<usize> {
    match text.trim().parse::<usize>() {
        Ok(0) => Err(CelError::Config(format!("{} must be positive", name))),
        Ok(n) => Ok(n),
        Err(_) => Err(CelError::Config(format!(
            "{} expects a number, got '{}'",
            name, text
        ))),
    }
}
