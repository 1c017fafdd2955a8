use std::cell::RefCell;
use std::rc::Rc;

use ecow::EcoString;
use fxhash::FxHashMap;

use crate::object::Value;

pub use self::core::builtin_names;

mod core;

#[derive(Default)]
pub struct Inner {
    pub(crate) outer: Option<Env>,
    pub(crate) data: RefCell<FxHashMap<EcoString, Value>>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env::Inner")
            .field("outer", &self.outer)
            .field("data", &self.data)
            .finish()
    }
}

/// Bindings of the inspector. Cheap to clone, clones share the bindings.
///
/// Lazy factories created by `lazy` capture the env they were written in,
/// so a handle bound in that same env forms an `Rc` cycle and lives until
/// the end of the session.
#[derive(Clone, Default, Debug)]
pub struct Env(Rc<Inner>);

impl Env {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_outer(outer: Self) -> Self {
        Self(Rc::new(Inner {
            outer: Some(outer),
            data: RefCell::default(),
        }))
    }

    /// Look `ident` up here, then in the outer envs, then among the builtins.
    #[must_use]
    pub fn get(&self, ident: &str) -> Option<Value> {
        self.find(ident).map_or_else(
            || self::core::builtin(ident),
            |env| env.0.data.borrow().get(ident).cloned(),
        )
    }

    pub fn set(&self, ident: &str, val: Value) {
        self.0.data.borrow_mut().insert(ident.into(), val);
    }

    #[must_use]
    pub fn find(&self, ident: &str) -> Option<Self> {
        // check if self contains the key,
        self.0
            .data
            .borrow()
            .contains_key(ident)
            // then return self
            .then(|| self.clone())
            // or delegate to the outer env
            .or_else(|| self.0.outer.as_ref().and_then(|it| it.find(ident)))
    }
}
