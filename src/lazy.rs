//! Lazy proxies: objects that stand in for a value that is only produced
//! the first time somebody looks at it.

use std::cell::{Cell, OnceCell};
use std::rc::Rc;

use fxhash::FxHashSet;

use crate::object::{
    Key, Kind, LzErr, LzResult, Obj, Ordinary, PropertyDescriptor, Protocol, Value,
};
use crate::{reflect, registry};

/// Function objects carry these as non-configurable own properties, so a
/// callable-shaped handle has to keep answering for them itself.
pub const UNCONFIGURABLE: [&str; 3] = ["arguments", "caller", "prototype"];

fn is_unconfigurable(key: &Key) -> bool {
    key.as_str().is_some_and(|it| UNCONFIGURABLE.contains(&it))
}

pub type Factory = Box<dyn Fn() -> LzResult<Value>>;

pub struct LazyOptions {
    /// shape the handle like a function, so it can be called and constructed
    pub callable: bool,
    /// cached instead when the factory produces `undefined` or `null`
    pub fallback: Option<Value>,
}

impl Default for LazyOptions {
    fn default() -> Self {
        Self {
            callable: true,
            fallback: None,
        }
    }
}

impl LazyOptions {
    #[must_use]
    pub fn plain() -> Self {
        Self {
            callable: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fallback(self, fallback: Value) -> Self {
        Self {
            fallback: Some(fallback),
            ..self
        }
    }
}

pub(crate) struct LazyCell {
    cache: OnceCell<Value>,
    init: Factory,
    fallback: Option<Value>,
    // set while the factory runs
    resolving: Cell<bool>,
}

impl LazyCell {
    fn resolve(&self) -> LzResult<Value> {
        if let Some(value) = self.cache.get() {
            return Ok(value.clone());
        }

        if self.resolving.replace(true) {
            return Err(LzErr::invalid("lazy value is needed by its own factory"));
        }
        tracing::trace!("running lazy factory");
        let produced = (self.init)();
        self.resolving.set(false);

        let value = match produced? {
            empty if empty.is_nullish() => {
                let fallback = self.fallback.clone().ok_or(LzErr::UnresolvedTarget)?;
                tracing::debug!("lazy factory produced {}, using fallback", empty.type_name());
                fallback
            }
            value => value,
        };

        // the factory may have resolved this very cell on its own, first one wins
        Ok(self.cache.get_or_init(|| value).clone())
    }
}

/// A handle onto a lazy value's memoizing resolution, obtained through
/// [`registry::recall`] without resolving anything.
#[derive(Clone)]
pub struct Resolver(Rc<LazyCell>);

impl Resolver {
    /// Produce the value, running the factory only if the handle hasn't
    /// been resolved yet. Shares the cache with the handle.
    pub fn resolve(&self) -> LzResult<Value> {
        self.0.resolve()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.0.cache.get().is_some()
    }

    /// The resolver as a zero-argument native function.
    #[must_use]
    pub fn into_value(self) -> Value {
        Ordinary::native_value("resolve", 0, move |_, _| self.resolve())
    }
}

pub struct LazyObject {
    // what the handle looks like before resolution: a plain object or a function
    shape: Ordinary,
    cell: Rc<LazyCell>,
}

/// Create a callable-shaped lazy handle over `factory`.
///
/// Nothing runs until the first protocol operation on the returned value.
pub fn proxy_lazy(factory: impl Fn() -> LzResult<Value> + 'static) -> Value {
    proxy_lazy_with(factory, LazyOptions::default())
}

pub fn proxy_lazy_with(
    factory: impl Fn() -> LzResult<Value> + 'static,
    options: LazyOptions,
) -> Value {
    let shape = if options.callable {
        Ordinary::function("", 0, Rc::new(|_, _| Ok(Value::Undefined)))
    } else {
        Ordinary::new()
    };

    let handle = Rc::new(LazyObject {
        shape,
        cell: Rc::new(LazyCell {
            cache: OnceCell::new(),
            init: Box::new(factory),
            fallback: options.fallback,
            resolving: Cell::new(false),
        }),
    });
    registry::track(&handle);

    Value::Object(Obj::from_rc(handle))
}

impl LazyObject {
    /// The produced value, resolving if needed. Unlike the protocol
    /// operations this accepts primitives.
    pub fn force(&self) -> LzResult<Value> {
        self.cell.resolve()
    }

    /// The cached value, if resolved. Never resolves.
    #[must_use]
    pub fn peek(&self) -> Option<Value> {
        self.cell.cache.get().cloned()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.cache.get().is_some()
    }

    #[must_use]
    pub fn resolver(&self) -> Resolver {
        Resolver(Rc::clone(&self.cell))
    }

    fn target(&self) -> LzResult<Obj> {
        let obj = match self.force()? {
            Value::Object(obj) => obj,
            primitive => {
                return Err(LzErr::invalid(format!(
                    "lazy value is a {}, not an object",
                    primitive.type_name()
                )))
            }
        };

        // forwarding into a chain that leads back here would never end
        if obj.as_lazy().is_some() {
            let mut seen = FxHashSet::default();
            seen.insert(std::ptr::from_ref(self).cast::<()>() as usize);
            reflect::follow(Value::Object(obj.clone()), &mut seen)?;
        }

        Ok(obj)
    }
}

impl Protocol for LazyObject {
    fn get_prototype_of(&self) -> LzResult<Option<Obj>> {
        self.target()?.get_prototype_of()
    }

    fn set_prototype_of(&self, proto: Option<Obj>) -> LzResult<bool> {
        self.target()?.set_prototype_of(proto)
    }

    fn is_extensible(&self) -> LzResult<bool> {
        self.target()?.is_extensible()
    }

    fn prevent_extensions(&self) -> LzResult<bool> {
        self.target()?.prevent_extensions()
    }

    fn get_own_property(&self, key: &Key) -> LzResult<Option<PropertyDescriptor>> {
        if is_unconfigurable(key) {
            return self.shape.get_own_property(key);
        }

        let desc = self.target()?.get_own_property(key)?;

        // keep the shape in step with what we report, so a non-configurable
        // property reads the same on every query
        if let Some(desc) = &desc {
            tracing::trace!(%key, "mirroring descriptor onto lazy handle");
            if !self.shape.define_own_property(key, desc.clone())? {
                return Err(LzErr::invalid(format!(
                    "descriptor of {key} changed incompatibly since it was last reported"
                )));
            }
        }

        Ok(desc)
    }

    fn define_own_property(&self, key: &Key, desc: PropertyDescriptor) -> LzResult<bool> {
        self.target()?.define_own_property(key, desc)
    }

    fn has(&self, key: &Key) -> LzResult<bool> {
        self.target()?.has(key)
    }

    fn get(&self, key: &Key, receiver: &Value) -> LzResult<Value> {
        self.target()?.get(key, receiver)
    }

    fn set(&self, key: &Key, value: Value, receiver: &Value) -> LzResult<bool> {
        self.target()?.set(key, value, receiver)
    }

    fn delete(&self, key: &Key) -> LzResult<bool> {
        self.target()?.delete(key)
    }

    fn own_keys(&self) -> LzResult<Vec<Key>> {
        let mut keys = self.target()?.own_keys()?;

        for name in UNCONFIGURABLE {
            let key = Key::from(name);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        Ok(keys)
    }

    fn call(&self, this: &Value, args: &[Value]) -> LzResult<Value> {
        if !self.shape.is_callable() {
            return Err(LzErr::invalid("lazy handle is not callable"));
        }

        let target = self.target()?;
        if !target.is_callable() {
            return Err(LzErr::invalid("lazy value is not a function"));
        }
        target.call(this, args)
    }

    fn construct(&self, args: &[Value], new_target: &Obj) -> LzResult<Value> {
        if !self.shape.is_constructor() {
            return Err(LzErr::invalid("lazy handle is not a constructor"));
        }

        let target = self.target()?;
        if !target.is_constructor() {
            return Err(LzErr::invalid("lazy value is not a constructor"));
        }
        target.construct(args, new_target)
    }

    fn is_callable(&self) -> bool {
        self.shape.is_callable()
    }

    fn is_constructor(&self) -> bool {
        self.shape.is_constructor()
    }

    fn kind(&self) -> Kind {
        Kind::Lazy(self.peek())
    }

    fn as_lazy(&self) -> Option<&LazyObject> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::reflect;

    fn counted(value: impl Fn() -> Value + 'static) -> (Rc<Cell<usize>>, Value) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = proxy_lazy(move || {
            counter.set(counter.get() + 1);
            Ok(value())
        });
        (calls, handle)
    }

    fn point() -> Value {
        Ordinary::from_entries([("a", Value::Int(1)), ("b", Value::Int(2))]).into_value()
    }

    #[test]
    fn test_nothing_runs_before_observation() {
        let (calls, handle) = counted(point);

        assert_eq!(calls.get(), 0);
        assert!(handle.is_callable());
        assert!(matches!(reflect::kind(&handle), Some(Kind::Lazy(None))));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_resolves_once() {
        let (calls, handle) = counted(point);

        assert_eq!(reflect::get(&handle, &"a".into()).unwrap(), Value::Int(1));
        assert!(reflect::has(&handle, &"b".into()).unwrap());
        reflect::own_keys(&handle).unwrap();
        reflect::get_own_property(&handle, &"a".into()).unwrap();
        reflect::set(&handle, &"c".into(), Value::Int(3)).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(matches!(reflect::kind(&handle), Some(Kind::Lazy(Some(_)))));
    }

    #[test]
    fn test_writes_reach_the_value() {
        let target = point();
        let inner = target.clone();
        let handle = proxy_lazy(move || Ok(inner.clone()));

        assert!(reflect::set(&handle, &"a".into(), Value::Int(10)).unwrap());
        assert!(reflect::delete(&handle, &"b".into()).unwrap());

        assert_eq!(reflect::get(&target, &"a".into()).unwrap(), Value::Int(10));
        assert!(!reflect::has(&target, &"b".into()).unwrap());
    }

    #[test]
    fn test_unconfigurable_keys_do_not_resolve() {
        let (calls, handle) = counted(point);

        let desc = reflect::get_own_property(&handle, &"prototype".into())
            .unwrap()
            .unwrap();
        assert!(!desc.is_configurable());
        assert!(reflect::get_own_property(&handle, &"caller".into())
            .unwrap()
            .is_some());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_plain_shape_has_no_unconfigurable_descriptors() {
        let handle = proxy_lazy_with(|| Ok(point()), LazyOptions::plain());

        assert!(!handle.is_callable());
        assert!(reflect::get_own_property(&handle, &"prototype".into())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_mirrors_descriptors() {
        let frozen = Ordinary::new();
        frozen.insert("k".into(), PropertyDescriptor::frozen(Value::Int(1)));
        let frozen = frozen.into_value();
        let inner = frozen.clone();
        let handle = proxy_lazy(move || Ok(inner.clone()));

        let first = reflect::get_own_property(&handle, &"k".into()).unwrap();
        let second = reflect::get_own_property(&handle, &"k".into()).unwrap();
        assert_eq!(first, second);

        let lazy = handle.as_object().unwrap().as_lazy().unwrap();
        assert_eq!(lazy.shape.get_own_property(&"k".into()).unwrap(), first);
    }

    #[test]
    fn test_factory_errors_are_not_swallowed() {
        let handle = proxy_lazy(|| Err(anyhow::anyhow!("store not loaded").into()));

        let err = reflect::get(&handle, &"a".into()).unwrap_err();
        assert_eq!(err.to_string(), "store not loaded");
    }

    #[test]
    fn test_nullish_without_fallback_retries() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = proxy_lazy(move || {
            counter.set(counter.get() + 1);
            Ok(if counter.get() == 1 { Value::Null } else { point() })
        });

        assert!(matches!(
            reflect::get(&handle, &"a".into()),
            Err(LzErr::UnresolvedTarget)
        ));
        assert_eq!(reflect::get(&handle, &"a".into()).unwrap(), Value::Int(1));
        assert_eq!(reflect::get(&handle, &"a".into()).unwrap(), Value::Int(1));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_falsy_values_are_cached() {
        let (calls, handle) = counted(|| Value::Bool(false));

        assert_eq!(reflect::force(&handle).unwrap(), Value::Bool(false));
        assert_eq!(reflect::force(&handle).unwrap(), Value::Bool(false));
        assert_eq!(calls.get(), 1);
        // still not an object though
        assert!(matches!(
            reflect::get(&handle, &"a".into()),
            Err(LzErr::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_call_forwards_this_and_args() {
        let handle = proxy_lazy(|| {
            Ok(Ordinary::native_value("first", 1, |this, args| {
                Ok(args.first().cloned().unwrap_or_else(|| this.clone()))
            }))
        });

        let result = reflect::call(&handle, &Value::Int(5), &[Value::Int(8)]).unwrap();
        assert_eq!(result, Value::Int(8));
        let result = reflect::call(&handle, &Value::Int(5), &[]).unwrap();
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn test_plain_shape_refuses_calls_without_resolving() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = proxy_lazy_with(
            move || {
                counter.set(counter.get() + 1);
                Ok(Ordinary::native_value("f", 0, |_, _| Ok(Value::Null)))
            },
            LazyOptions::plain(),
        );

        let Value::Object(obj) = &handle else {
            unreachable!()
        };
        assert!(matches!(
            obj.call(&Value::Undefined, &[]),
            Err(LzErr::InvalidOperation(_))
        ));
        assert!(matches!(
            obj.construct(&[], obj),
            Err(LzErr::InvalidOperation(_))
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_construct_through_handle() {
        let handle = proxy_lazy(|| {
            Ok(Ordinary::function(
                "Box",
                1,
                Rc::new(|this, args| {
                    reflect::set(this, &"inner".into(), args[0].clone())?;
                    Ok(Value::Undefined)
                }),
            )
            .into_value())
        });

        let made = reflect::construct(&handle, &[Value::Int(2)]).unwrap();
        assert_eq!(reflect::get(&made, &"inner".into()).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_nested_handles_force_through() {
        let handle = proxy_lazy(|| Ok(proxy_lazy(|| Ok(Value::Int(3)))));
        assert_eq!(reflect::force(&handle).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_handle_resolving_to_itself_fails() {
        let slot = Rc::new(std::cell::RefCell::new(Value::Undefined));
        let inner = Rc::clone(&slot);
        let handle = proxy_lazy(move || Ok(inner.borrow().clone()));
        *slot.borrow_mut() = handle.clone();

        assert!(matches!(
            reflect::get(&handle, &"a".into()),
            Err(LzErr::InvalidOperation(_))
        ));
        assert!(matches!(
            reflect::own_keys(&handle),
            Err(LzErr::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_factory_reading_its_own_handle_fails() {
        let slot = Rc::new(std::cell::RefCell::new(Value::Undefined));
        let inner = Rc::clone(&slot);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let handle = proxy_lazy(move || {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                let me = inner.borrow().clone();
                reflect::get(&me, &"a".into())?;
            }
            Ok(point())
        });
        *slot.borrow_mut() = handle.clone();

        assert!(matches!(
            reflect::get(&handle, &"a".into()),
            Err(LzErr::InvalidOperation(_))
        ));
        // the guard is released once the factory returns
        assert_eq!(reflect::get(&handle, &"a".into()).unwrap(), Value::Int(1));
        assert_eq!(calls.get(), 2);
    }
}
