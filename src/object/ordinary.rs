use std::cell::RefCell;
use std::rc::Rc;

use ecow::EcoString;
use fxhash::FxHashMap;
use tap::Pipe;

use super::{Key, Kind, LzErr, LzResult, Obj, PropertyDescriptor, Protocol, Value};

/// Native call behaviour: `(this, args) -> result`.
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> LzResult<Value>>;

/// An ordinary object: a property table, a prototype and an extensible flag,
/// optionally with call behaviour (a function object).
pub struct Ordinary {
    shape: RefCell<Shape>,
    behaviour: Option<Behaviour>,
}

struct Behaviour {
    func: NativeFn,
    constructor: bool,
}

#[derive(Default)]
struct Shape {
    proto: Option<Obj>,
    extensible: bool,
    props: FxHashMap<Key, PropertyDescriptor>,
    // insertion order, `props` has no order of its own
    order: im::Vector<Key>,
}

impl Default for Ordinary {
    fn default() -> Self {
        Self::new()
    }
}

impl Ordinary {
    #[must_use]
    pub fn new() -> Self {
        Self::with_proto(None)
    }

    #[must_use]
    pub fn with_proto(proto: Option<Obj>) -> Self {
        Self {
            shape: RefCell::new(Shape {
                proto,
                extensible: true,
                ..Shape::default()
            }),
            behaviour: None,
        }
    }

    pub fn from_entries<K: Into<Key>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let obj = Self::new();
        for (key, value) in entries {
            obj.insert(key.into(), PropertyDescriptor::data(value));
        }
        obj
    }

    /// A script-like function: a constructor with `prototype`, `arguments`
    /// and `caller` own properties, all three non-configurable.
    pub fn function(name: &str, length: i64, func: NativeFn) -> Self {
        let mut obj = Self::native(name, length, func);
        if let Some(behaviour) = &mut obj.behaviour {
            behaviour.constructor = true;
        }

        obj.insert(
            "prototype".into(),
            PropertyDescriptor::Data {
                value: Self::new().into_value(),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        obj.insert("arguments".into(), PropertyDescriptor::frozen(Value::Null));
        obj.insert("caller".into(), PropertyDescriptor::frozen(Value::Null));

        obj
    }

    /// A builtin function: only `length` and `name`, not a constructor.
    pub fn native(name: &str, length: i64, func: NativeFn) -> Self {
        let obj = Self {
            behaviour: Some(Behaviour {
                func,
                constructor: false,
            }),
            ..Self::new()
        };

        let attr = |value| PropertyDescriptor::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: true,
        };
        obj.insert("length".into(), attr(Value::Int(length)));
        obj.insert("name".into(), attr(Value::Str(EcoString::from(name))));

        obj
    }

    /// Shorthand for a native function value
    pub fn native_value(
        name: &str,
        length: i64,
        func: impl Fn(&Value, &[Value]) -> LzResult<Value> + 'static,
    ) -> Value {
        Self::native(name, length, Rc::new(func)).into_value()
    }

    /// Set a property without validation. Only for building fresh objects.
    pub fn insert(&self, key: Key, desc: PropertyDescriptor) {
        let mut shape = self.shape.borrow_mut();
        if shape.props.insert(key.clone(), desc).is_none() {
            shape.order.push_back(key);
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(Obj::new(self))
    }

    fn own(&self, key: &Key) -> Option<PropertyDescriptor> {
        self.shape.borrow().props.get(key).cloned()
    }

    fn proto(&self) -> Option<Obj> {
        self.shape.borrow().proto.clone()
    }

    fn addr(&self) -> usize {
        std::ptr::from_ref(self).cast::<()>() as usize
    }
}

impl Protocol for Ordinary {
    fn get_prototype_of(&self) -> LzResult<Option<Obj>> {
        Ok(self.proto())
    }

    fn set_prototype_of(&self, proto: Option<Obj>) -> LzResult<bool> {
        if self.proto() == proto {
            return Ok(true);
        }

        if !self.shape.borrow().extensible {
            return Ok(false);
        }

        // refuse to close a cycle; exotic objects end the walk since asking
        // them for their prototype may have side effects
        let mut cursor = proto.clone();
        while let Some(obj) = cursor {
            if obj.addr() == self.addr() {
                return Ok(false);
            }
            if !matches!(obj.kind(), Kind::Object | Kind::Function) {
                break;
            }
            cursor = obj.get_prototype_of()?;
        }

        self.shape.borrow_mut().proto = proto;
        Ok(true)
    }

    fn is_extensible(&self) -> LzResult<bool> {
        Ok(self.shape.borrow().extensible)
    }

    fn prevent_extensions(&self) -> LzResult<bool> {
        self.shape.borrow_mut().extensible = false;
        Ok(true)
    }

    fn get_own_property(&self, key: &Key) -> LzResult<Option<PropertyDescriptor>> {
        Ok(self.own(key))
    }

    fn define_own_property(&self, key: &Key, desc: PropertyDescriptor) -> LzResult<bool> {
        let mut shape = self.shape.borrow_mut();
        let current = shape.props.get(key).cloned();

        match current {
            None if !shape.extensible => Ok(false),
            None => {
                shape.props.insert(key.clone(), desc);
                shape.order.push_back(key.clone());
                Ok(true)
            }
            Some(current) if !current.admits(&desc) => Ok(false),
            Some(_) => {
                shape.props.insert(key.clone(), desc);
                Ok(true)
            }
        }
    }

    fn has(&self, key: &Key) -> LzResult<bool> {
        if self.shape.borrow().props.contains_key(key) {
            return Ok(true);
        }

        self.proto().map_or(Ok(false), |proto| proto.has(key))
    }

    fn get(&self, key: &Key, receiver: &Value) -> LzResult<Value> {
        match self.own(key) {
            Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
            Some(PropertyDescriptor::Accessor { get: Some(getter), .. }) => {
                getter.call(receiver, &[])
            }
            Some(PropertyDescriptor::Accessor { get: None, .. }) => Ok(Value::Undefined),
            None => self
                .proto()
                .map_or(Ok(Value::Undefined), |proto| proto.get(key, receiver)),
        }
    }

    fn set(&self, key: &Key, value: Value, receiver: &Value) -> LzResult<bool> {
        let own = match self.own(key) {
            Some(desc) => desc,
            None => match self.proto() {
                Some(proto) => return proto.set(key, value, receiver),
                None => PropertyDescriptor::data(Value::Undefined),
            },
        };

        match own {
            PropertyDescriptor::Data { writable: false, .. } => Ok(false),
            PropertyDescriptor::Data { .. } => {
                let Value::Object(target) = receiver else {
                    return Ok(false);
                };

                match target.get_own_property(key)? {
                    Some(PropertyDescriptor::Accessor { .. }) => Ok(false),
                    Some(existing) if !existing.is_writable() => Ok(false),
                    Some(existing) => target.define_own_property(key, existing.with_value(value)),
                    None => target.define_own_property(key, PropertyDescriptor::data(value)),
                }
            }
            PropertyDescriptor::Accessor { set: Some(setter), .. } => {
                setter.call(receiver, &[value])?;
                Ok(true)
            }
            PropertyDescriptor::Accessor { set: None, .. } => Ok(false),
        }
    }

    fn delete(&self, key: &Key) -> LzResult<bool> {
        let mut shape = self.shape.borrow_mut();
        let current = shape.props.get(key).map(PropertyDescriptor::is_configurable);

        match current {
            None => Ok(true),
            Some(false) => Ok(false),
            Some(true) => {
                shape.props.remove(key);
                if let Some(idx) = shape.order.index_of(key) {
                    shape.order.remove(idx);
                }
                Ok(true)
            }
        }
    }

    fn own_keys(&self) -> LzResult<Vec<Key>> {
        let shape = self.shape.borrow();

        let mut indices = shape
            .order
            .iter()
            .filter_map(|it| it.as_index().map(|idx| (idx, it.clone())))
            .collect::<Vec<_>>();
        indices.sort_by_key(|(idx, _)| *idx);

        let strings = shape
            .order
            .iter()
            .filter(|it| matches!(it, Key::Str(_)) && it.as_index().is_none());
        let symbols = shape.order.iter().filter(|it| matches!(it, Key::Symbol(_)));

        indices
            .into_iter()
            .map(|(_, key)| key)
            .chain(strings.cloned())
            .chain(symbols.cloned())
            .collect::<Vec<_>>()
            .pipe(Ok)
    }

    fn call(&self, this: &Value, args: &[Value]) -> LzResult<Value> {
        match &self.behaviour {
            Some(Behaviour { func, .. }) => func(this, args),
            None => Err(LzErr::invalid("object is not a function")),
        }
    }

    fn construct(&self, args: &[Value], new_target: &Obj) -> LzResult<Value> {
        let Some(Behaviour {
            func,
            constructor: true,
        }) = &self.behaviour
        else {
            return Err(LzErr::invalid("object is not a constructor"));
        };

        let proto = new_target
            .get(&"prototype".into(), &Value::Object(new_target.clone()))?
            .as_object()
            .cloned();
        let this = Self::with_proto(proto).into_value();

        match func(&this, args)? {
            result @ Value::Object(_) => Ok(result),
            _ => Ok(this),
        }
    }

    fn is_callable(&self) -> bool {
        self.behaviour.is_some()
    }

    fn is_constructor(&self) -> bool {
        self.behaviour.as_ref().is_some_and(|it| it.constructor)
    }
}
