use std::sync::atomic::{AtomicU32, Ordering};

use ecow::EcoString;

use super::{LzErr, LzResult, Value};

/// first id handed out by `Symbol::unique`, everything below is well-known
const FIRST_UNIQUE: u32 = 16;

static NEXT_SYMBOL: AtomicU32 = AtomicU32::new(FIRST_UNIQUE);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub const ITERATOR: Self = Self(1);

    /// a fresh symbol, distinct from every other
    pub fn unique() -> Self {
        Self(NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn well_known_name(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("Symbol.iterator"),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.well_known_name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "Symbol({})", self.0),
        }
    }
}

/// A property key: either a string or a symbol.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(EcoString),
    Symbol(Symbol),
}

impl Key {
    /// array-index-like keys (`"0"`, `"17"`) enumerate first, in ascending order
    #[must_use]
    pub fn as_index(&self) -> Option<u32> {
        let Self::Str(s) = self else {
            return None;
        };
        // digits only, no sign and no leading zero
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || (s.starts_with('0') && s != "0") {
            return None;
        }

        s.parse().ok().filter(|it| *it != u32::MAX)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<EcoString> for Key {
    fn from(s: EcoString) -> Self {
        Self::Str(s)
    }
}

impl From<Symbol> for Key {
    fn from(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }
}

impl TryFrom<&Value> for Key {
    type Error = LzErr;

    fn try_from(value: &Value) -> LzResult<Self> {
        match value {
            Value::Str(s) => Ok(Self::Str(s.clone())),
            Value::Int(i) => Ok(Self::Str(EcoString::from(i.to_string()))),
            Value::Bool(b) => Ok(Self::Str(if *b { "true" } else { "false" }.into())),
            Value::Undefined => Ok(Self::from("undefined")),
            Value::Null => Ok(Self::from("null")),
            Value::Object(_) => Err(LzErr::invalid("objects cannot be used as property keys")),
        }
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Symbol(sym) => write!(f, "[{sym:?}]"),
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Symbol(sym) => write!(f, "[{sym:?}]"),
        }
    }
}
