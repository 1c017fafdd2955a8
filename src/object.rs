use std::rc::Rc;

use ecow::EcoString;
use thiserror::Error;

use crate::lazy::LazyObject;

pub mod descriptor;
pub mod key;
pub mod ordinary;

pub use descriptor::PropertyDescriptor;
pub use key::{Key, Symbol};
pub use ordinary::{NativeFn, Ordinary};

pub type LzResult<T> = Result<T, LzErr>;

/// cheap to clone, only contains small values (with copy)
/// or `Rc`s
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Str(EcoString),
    Object(Obj),
}

/// Reference to a heap object. Equality is identity.
#[derive(Clone)]
pub struct Obj(Rc<dyn Protocol>);

/// What an object is, as far as rendering and introspection care.
/// Never forces a lazy handle.
pub enum Kind {
    Object,
    Function,
    /// a lazy handle, with its cached value if it was resolved already
    Lazy(Option<Value>),
    Destructurer,
}

/// The reflective object protocol. One method per operation, every proxy in
/// this crate is an implementation that forwards somewhere else.
///
/// `receiver` is the object the operation was originally performed on; it
/// differs from `self` when the lookup walked the prototype chain or went
/// through a proxy.
pub trait Protocol {
    fn get_prototype_of(&self) -> LzResult<Option<Obj>>;
    fn set_prototype_of(&self, proto: Option<Obj>) -> LzResult<bool>;
    fn is_extensible(&self) -> LzResult<bool>;
    fn prevent_extensions(&self) -> LzResult<bool>;

    fn get_own_property(&self, key: &Key) -> LzResult<Option<PropertyDescriptor>>;
    fn define_own_property(&self, key: &Key, desc: PropertyDescriptor) -> LzResult<bool>;

    fn has(&self, key: &Key) -> LzResult<bool>;
    fn get(&self, key: &Key, receiver: &Value) -> LzResult<Value>;
    fn set(&self, key: &Key, value: Value, receiver: &Value) -> LzResult<bool>;
    fn delete(&self, key: &Key) -> LzResult<bool>;
    fn own_keys(&self) -> LzResult<Vec<Key>>;

    fn call(&self, _this: &Value, _args: &[Value]) -> LzResult<Value> {
        Err(LzErr::invalid("object is not a function"))
    }

    fn construct(&self, _args: &[Value], _new_target: &Obj) -> LzResult<Value> {
        Err(LzErr::invalid("object is not a constructor"))
    }

    fn is_callable(&self) -> bool {
        false
    }

    fn is_constructor(&self) -> bool {
        false
    }

    fn kind(&self) -> Kind {
        if self.is_callable() {
            Kind::Function
        } else {
            Kind::Object
        }
    }

    fn as_lazy(&self) -> Option<&LazyObject> {
        None
    }
}

#[derive(Error, Debug)]
pub enum LzErr {
    #[error("Interrupted, Stop")]
    Stop,
    #[error("Fatal Error: {0}")]
    Fatal(Box<LzErr>),

    #[error(transparent)]
    Any(#[from] anyhow::Error),

    #[error("lazy factory produced no value and no fallback was given")]
    UnresolvedTarget,

    #[error("Invalid operation: {0}")]
    InvalidOperation(EcoString),

    #[error("This is not a real iterator, this is likely used incorrectly")]
    Misuse,

    #[error("Uncaught {0:#}")]
    Thrown(Value),
}

impl LzErr {
    pub fn invalid(msg: impl Into<EcoString>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}

impl Obj {
    pub fn new(obj: impl Protocol + 'static) -> Self {
        Self(Rc::new(obj))
    }

    pub fn from_rc(rc: Rc<dyn Protocol>) -> Self {
        Self(rc)
    }

    /// address of the allocation, stable for the object's lifetime
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl std::ops::Deref for Obj {
    type Target = dyn Protocol;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for Obj {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Obj {}

impl std::fmt::Debug for Obj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Obj({:#x})", self.addr())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(l), Self::Bool(r)) => l == r,
            (Self::Int(l), Self::Int(r)) => l == r,
            (Self::Str(l), Self::Str(r)) => l == r,
            (Self::Object(l), Self::Object(r)) => l == r,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    pub fn str(s: impl Into<EcoString>) -> Self {
        Self::Str(s.into())
    }

    /// `undefined` and `null`
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&Obj> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn to_object(&self) -> LzResult<&Obj> {
        self.as_object()
            .ok_or_else(|| LzErr::invalid(format!("{} is not an object", self.type_name())))
    }

    #[must_use]
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(|it| it.is_callable())
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "number",
            Self::Str(_) => "string",
            Self::Object(obj) if obj.is_callable() => "function",
            Self::Object(_) => "object",
        }
    }

    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Str(s) => !s.is_empty(),
            Self::Object(_) => true,
        }
    }
}

impl From<Obj> for Value {
    fn from(obj: Obj) -> Self {
        Self::Object(obj)
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Self::Int(int)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:#}")
    }
}
