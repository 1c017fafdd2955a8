use std::fmt;
use std::rc::Rc;

use ecow::EcoString;

/// What the reader produces. Evaluation turns forms into values.
#[derive(Clone, PartialEq, Eq)]
pub enum Form {
    Undefined,
    Nil,
    Bool(bool),
    Int(i64),
    Str(EcoString),
    Sym(EcoString),
    /// `:name`, stored without the colon
    Keyword(EcoString),
    List(Rc<[Form]>),
    /// `{k v ...}`
    Map(Rc<[(Form, Form)]>),
}

impl Form {
    #[must_use]
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Self::Sym(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(int) => write!(f, "{int}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Sym(s) => write!(f, "{s}"),
            Self::Keyword(kw) => write!(f, ":{kw}"),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, it) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{it}")?;
                }
                write!(f, ")")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
