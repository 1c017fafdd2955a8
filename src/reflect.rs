//! Entry points for the object protocol on arbitrary values.
//!
//! Every function takes the target as a `&Value` and fails with
//! [`LzErr::InvalidOperation`] when it isn't an object, the way reflective
//! calls on primitives fail. The receiver of `get`/`set` is the target itself.

use fxhash::FxHashSet;
use tap::Pipe;

use crate::object::{Key, Kind, LzErr, LzResult, Obj, PropertyDescriptor, Symbol, Value};

pub fn get_prototype_of(target: &Value) -> LzResult<Option<Obj>> {
    target.to_object()?.get_prototype_of()
}

pub fn set_prototype_of(target: &Value, proto: Option<Obj>) -> LzResult<bool> {
    target.to_object()?.set_prototype_of(proto)
}

pub fn is_extensible(target: &Value) -> LzResult<bool> {
    target.to_object()?.is_extensible()
}

pub fn prevent_extensions(target: &Value) -> LzResult<bool> {
    target.to_object()?.prevent_extensions()
}

pub fn get_own_property(target: &Value, key: &Key) -> LzResult<Option<PropertyDescriptor>> {
    target.to_object()?.get_own_property(key)
}

pub fn define_property(target: &Value, key: &Key, desc: PropertyDescriptor) -> LzResult<bool> {
    target.to_object()?.define_own_property(key, desc)
}

pub fn has(target: &Value, key: &Key) -> LzResult<bool> {
    target.to_object()?.has(key)
}

pub fn get(target: &Value, key: &Key) -> LzResult<Value> {
    target.to_object()?.get(key, target)
}

pub fn set(target: &Value, key: &Key, value: Value) -> LzResult<bool> {
    target.to_object()?.set(key, value, target)
}

pub fn delete(target: &Value, key: &Key) -> LzResult<bool> {
    target.to_object()?.delete(key)
}

pub fn own_keys(target: &Value) -> LzResult<Vec<Key>> {
    target.to_object()?.own_keys()
}

pub fn call(target: &Value, this: &Value, args: &[Value]) -> LzResult<Value> {
    let func = target.to_object()?;
    if !func.is_callable() {
        return Err(LzErr::invalid(format!("{} is not a function", target.type_name())));
    }
    func.call(this, args)
}

/// `new target(...args)`
pub fn construct(target: &Value, args: &[Value]) -> LzResult<Value> {
    let ctor = target.to_object()?;
    if !ctor.is_constructor() {
        return Err(LzErr::invalid(format!("{} is not a constructor", target.type_name())));
    }
    ctor.construct(args, ctor)
}

/// Introspection that never resolves anything. Primitives have no kind.
#[must_use]
pub fn kind(target: &Value) -> Option<Kind> {
    target.as_object().map(|it| it.kind())
}

/// Resolve `value` if it is a lazy handle, repeatedly, so a handle whose
/// factory returned another handle yields the innermost value. Anything else
/// is returned as-is.
pub fn force(value: &Value) -> LzResult<Value> {
    follow(value.clone(), &mut FxHashSet::default())
}

/// Walk a chain of handles down to the first value that isn't one. `seen`
/// holds the addresses of handles already on the chain; meeting one again is
/// an error rather than a loop.
pub(crate) fn follow(value: Value, seen: &mut FxHashSet<usize>) -> LzResult<Value> {
    let mut current = value;

    loop {
        let Some(obj) = current.as_object().cloned() else {
            return Ok(current);
        };
        let Some(handle) = obj.as_lazy() else {
            return Ok(current);
        };

        if !seen.insert(obj.addr()) {
            return Err(LzErr::invalid("lazy value resolves to itself"));
        }
        current = handle.force()?;
    }
}

/// Drive the iteration protocol of `target`: call its `Symbol.iterator`
/// method, then pull from the returned iterator's `next`.
pub fn iterate(target: &Value) -> LzResult<ProtocolIter> {
    let method = get(target, &Symbol::ITERATOR.into())?;
    if !method.is_callable() {
        return Err(LzErr::invalid("object is not iterable"));
    }

    let iterator = call(&method, target, &[])?;
    let next = get(&iterator, &"next".into())?;

    ProtocolIter {
        iterator,
        next,
        done: false,
    }
    .pipe(Ok)
}

/// A Rust iterator over the iteration protocol. Errors thrown by `next` are
/// yielded once, after which the iterator is exhausted.
pub struct ProtocolIter {
    iterator: Value,
    next: Value,
    done: bool,
}

impl ProtocolIter {
    fn step(&mut self) -> LzResult<Option<Value>> {
        let result = call(&self.next, &self.iterator, &[])?;
        if result.as_object().is_none() {
            return Err(LzErr::invalid("iterator result is not an object"));
        }

        if get(&result, &"done".into())?.truthy() {
            return Ok(None);
        }

        get(&result, &"value".into()).map(Some)
    }
}

impl Iterator for ProtocolIter {
    type Item = LzResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.step() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
