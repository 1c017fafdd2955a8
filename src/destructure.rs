//! Destructuring over a lazy mapping.
//!
//! `lazy_destructure(factory)` hands out a lazy projection for every member
//! that is asked for, and supports exactly one iteration pattern: pulling the
//! resolved mapping and a projector as a pair.

use std::cell::Cell;
use std::rc::Rc;

use crate::lazy::{proxy_lazy, proxy_lazy_with, LazyOptions};
use crate::object::{
    Key, Kind, LzErr, LzResult, Obj, Ordinary, PropertyDescriptor, Protocol, Symbol, Value,
};
use crate::reflect;

pub struct Destructurer {
    root: Value,
    // empty plain object, everything except `get` lands here
    shape: Ordinary,
    iterable: bool,
}

/// Destructure a lazily produced mapping. The mapping itself is plain-shaped.
pub fn lazy_destructure(factory: impl Fn() -> LzResult<Value> + 'static) -> Value {
    lazy_destructure_with(factory, false)
}

pub fn lazy_destructure_with(
    factory: impl Fn() -> LzResult<Value> + 'static,
    callable: bool,
) -> Value {
    let root = proxy_lazy_with(
        factory,
        LazyOptions {
            callable,
            fallback: None,
        },
    );

    Destructurer::wrap(root, true)
}

/// Pull `(mapping, projector)` out of a destructurer through its iteration
/// protocol.
pub fn pair(value: &Value) -> LzResult<(Value, Value)> {
    let mut iter = reflect::iterate(value)?;
    let mut pull = || {
        iter.next()
            .unwrap_or_else(|| Err(LzErr::invalid("iterator ended before two elements")))
    };

    Ok((pull()?, pull()?))
}

impl Destructurer {
    fn wrap(root: Value, iterable: bool) -> Value {
        Value::Object(Obj::new(Self {
            root,
            shape: Ordinary::new(),
            iterable,
        }))
    }

    /// A new lazy handle reading `key` from the root, every time.
    fn project(&self, key: &Key) -> Value {
        let root = self.root.clone();
        let key = key.clone();

        proxy_lazy(move || reflect::get(&root, &key))
    }

    /// `[Symbol.iterator]`: every call starts a fresh two-element iterator.
    fn iterator_method(&self) -> Value {
        let root = self.root.clone();

        Ordinary::native_value("[Symbol.iterator]", 0, move |_, _| {
            Ok(pair_iterator(root.clone()))
        })
    }
}

fn iter_result(value: Value, done: bool) -> Value {
    Ordinary::from_entries([("value", value), ("done", Value::Bool(done))]).into_value()
}

fn pair_iterator(root: Value) -> Value {
    let pulled = Rc::new(Cell::new(0_u8));

    let next = Ordinary::native_value("next", 0, move |_, _| {
        let n = pulled.get();
        pulled.set(n.saturating_add(1));

        match n {
            0 => Ok(iter_result(root.clone(), false)),
            1 => Ok(iter_result(Destructurer::wrap(root.clone(), false), false)),
            2 => Err(LzErr::Misuse),
            _ => Ok(iter_result(Value::Undefined, true)),
        }
    });

    let iterator = Ordinary::new();
    iterator.insert("next".into(), PropertyDescriptor::hidden(next));
    iterator.into_value()
}

impl Protocol for Destructurer {
    fn get_prototype_of(&self) -> LzResult<Option<Obj>> {
        self.shape.get_prototype_of()
    }

    fn set_prototype_of(&self, proto: Option<Obj>) -> LzResult<bool> {
        self.shape.set_prototype_of(proto)
    }

    fn is_extensible(&self) -> LzResult<bool> {
        self.shape.is_extensible()
    }

    fn prevent_extensions(&self) -> LzResult<bool> {
        self.shape.prevent_extensions()
    }

    fn get_own_property(&self, key: &Key) -> LzResult<Option<PropertyDescriptor>> {
        self.shape.get_own_property(key)
    }

    fn define_own_property(&self, key: &Key, desc: PropertyDescriptor) -> LzResult<bool> {
        self.shape.define_own_property(key, desc)
    }

    fn has(&self, key: &Key) -> LzResult<bool> {
        self.shape.has(key)
    }

    fn get(&self, key: &Key, _receiver: &Value) -> LzResult<Value> {
        if self.iterable && *key == Key::Symbol(Symbol::ITERATOR) {
            return Ok(self.iterator_method());
        }

        Ok(self.project(key))
    }

    fn set(&self, key: &Key, value: Value, receiver: &Value) -> LzResult<bool> {
        self.shape.set(key, value, receiver)
    }

    fn delete(&self, key: &Key) -> LzResult<bool> {
        self.shape.delete(key)
    }

    fn own_keys(&self) -> LzResult<Vec<Key>> {
        self.shape.own_keys()
    }

    fn kind(&self) -> Kind {
        Kind::Destructurer
    }
}
