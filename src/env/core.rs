use std::fmt::Write;
use std::rc::Rc;

use anyhow::anyhow;
use ecow::EcoString;

use crate::lazy::Resolver;
use crate::object::{Key, Kind, LzErr, LzResult, Obj, Ordinary, PropertyDescriptor, Value};
use crate::{reflect, registry};

macro_rules! func_value {
    // handles argument matching and returning
    ($name:literal; $args_pat:pat => $exp:expr) => {
        Ordinary::native_value($name, 0, |_, args: &[Value]| {
            #[allow(irrefutable_let_patterns)]
            let result = if let $args_pat = args {
                Ok(Value::from($exp))
            } else {
                Err(LzErr::Any(anyhow!(
                    "{}: expected arguments {}, got {} of them",
                    $name,
                    stringify!($args_pat),
                    args.len()
                )))
            };
            result
        })
    };
}

/// Every builtin, for the highlighter
const NAMES: &[&str] = &[
    "get",
    "set!",
    "has?",
    "del!",
    "keys",
    "desc",
    "define!",
    "proto",
    "set-proto!",
    "extensible?",
    "prevent-ext!",
    "call",
    "new",
    "ctor",
    "force",
    "recall",
    "resolved?",
    "kind",
    "list",
    "+",
    "=",
    "str",
    "throw",
    "bye",
];

#[must_use]
pub fn builtin_names() -> Vec<&'static str> {
    NAMES.to_vec()
}

fn key(value: &Value) -> LzResult<Key> {
    Key::try_from(value)
}

fn key_value(key: &Key) -> Value {
    match key {
        Key::Str(s) => Value::Str(s.clone()),
        Key::Symbol(_) => Value::Str(key.to_string().into()),
    }
}

/// array-like object: index keys and a non-enumerable `length`
fn array(items: impl IntoIterator<Item = Value>) -> Value {
    let obj = Ordinary::new();
    let mut len: i64 = 0;

    for (idx, item) in items.into_iter().enumerate() {
        obj.insert(Key::Str(idx.to_string().into()), PropertyDescriptor::data(item));
        len += 1;
    }
    obj.insert(
        "length".into(),
        PropertyDescriptor::Data {
            value: Value::Int(len),
            writable: true,
            enumerable: false,
            configurable: false,
        },
    );

    obj.into_value()
}

fn descriptor_value(desc: Option<PropertyDescriptor>) -> Value {
    let Some(desc) = desc else {
        return Value::Undefined;
    };

    let accessor = |it: Option<Obj>| it.map_or(Value::Undefined, Value::Object);
    let entries = match desc {
        PropertyDescriptor::Data {
            value,
            writable,
            enumerable,
            configurable,
        } => vec![
            ("value", value),
            ("writable", Value::Bool(writable)),
            ("enumerable", Value::Bool(enumerable)),
            ("configurable", Value::Bool(configurable)),
        ],
        PropertyDescriptor::Accessor {
            get,
            set,
            enumerable,
            configurable,
        } => vec![
            ("get", accessor(get)),
            ("set", accessor(set)),
            ("enumerable", Value::Bool(enumerable)),
            ("configurable", Value::Bool(configurable)),
        ],
    };

    Ordinary::from_entries(entries).into_value()
}

/// `{:value v :writable true ...}` or `{:get f :set g ...}`, absent flags are false
fn to_descriptor(value: &Value) -> LzResult<PropertyDescriptor> {
    let field = |name: &str| reflect::get(value, &name.into());
    let flag = |name: &str| field(name).map(|it| it.truthy());
    let func = |name: &str| -> LzResult<Option<Obj>> {
        match field(name)? {
            Value::Undefined => Ok(None),
            Value::Object(obj) if obj.is_callable() => Ok(Some(obj)),
            other => Err(LzErr::invalid(format!(
                "{name} must be a function, not {}",
                other.type_name()
            ))),
        }
    };

    let is_accessor = reflect::has(value, &"get".into())? || reflect::has(value, &"set".into())?;

    Ok(if is_accessor {
        PropertyDescriptor::Accessor {
            get: func("get")?,
            set: func("set")?,
            enumerable: flag("enumerable")?,
            configurable: flag("configurable")?,
        }
    } else {
        PropertyDescriptor::Data {
            value: field("value")?,
            writable: flag("writable")?,
            enumerable: flag("enumerable")?,
            configurable: flag("configurable")?,
        }
    })
}

/// A constructor whose instances start as copies of `template`'s own
/// enumerable properties.
fn ctor(template: &Value) -> LzResult<Value> {
    let template = template.clone();
    template.to_object()?;

    let func = Ordinary::function(
        "ctor",
        0,
        Rc::new(move |this: &Value, _: &[Value]| {
            for key in reflect::own_keys(&template)? {
                let Some(desc) = reflect::get_own_property(&template, &key)? else {
                    continue;
                };
                if desc.is_enumerable() {
                    reflect::set(this, &key, reflect::get(&template, &key)?)?;
                }
            }
            Ok(Value::Undefined)
        }),
    );

    Ok(func.into_value())
}

fn kind_name(value: &Value) -> &'static str {
    match reflect::kind(value) {
        Some(Kind::Lazy(_)) => "lazy",
        Some(Kind::Destructurer) => "destructurer",
        Some(Kind::Function) => "function",
        Some(Kind::Object) => "object",
        None => value.type_name(),
    }
}

pub fn builtin(ident: &str) -> Option<Value> {
    Some(match ident {
        "get" => func_value!("get"; [target, k] => reflect::get(target, &key(k)?)?),
        "set!" => func_value!("set!"; [target, k, v] => reflect::set(target, &key(k)?, v.clone())?),
        "has?" => func_value!("has?"; [target, k] => reflect::has(target, &key(k)?)?),
        "del!" => func_value!("del!"; [target, k] => reflect::delete(target, &key(k)?)?),
        "keys" => func_value!("keys"; [target] => {
            array(reflect::own_keys(target)?.iter().map(key_value))
        }),
        "desc" => func_value!("desc"; [target, k] => {
            descriptor_value(reflect::get_own_property(target, &key(k)?)?)
        }),
        "define!" => func_value!("define!"; [target, k, desc] => {
            reflect::define_property(target, &key(k)?, to_descriptor(desc)?)?
        }),
        "proto" => func_value!("proto"; [target] => {
            reflect::get_prototype_of(target)?.map_or(Value::Null, Value::Object)
        }),
        "set-proto!" => func_value!("set-proto!"; [target, proto] => {
            let proto = match proto {
                Value::Null => None,
                Value::Object(obj) => Some(obj.clone()),
                other => Err(LzErr::invalid(format!("prototype cannot be a {}", other.type_name())))?,
            };
            reflect::set_prototype_of(target, proto)?
        }),
        "extensible?" => func_value!("extensible?"; [target] => reflect::is_extensible(target)?),
        "prevent-ext!" => func_value!("prevent-ext!"; [target] => reflect::prevent_extensions(target)?),
        "call" => func_value!("call"; [func, args @ ..] => reflect::call(func, &Value::Undefined, args)?),
        "new" => func_value!("new"; [func, args @ ..] => reflect::construct(func, args)?),
        "ctor" => func_value!("ctor"; [template] => ctor(template)?),
        "force" => func_value!("force"; [value] => reflect::force(value)?),
        "recall" => func_value!("recall"; [value] => {
            registry::recall(value).map_or(Value::Undefined, Resolver::into_value)
        }),
        "resolved?" => func_value!("resolved?"; [value] => {
            matches!(reflect::kind(value), Some(Kind::Lazy(Some(_))))
        }),
        "kind" => func_value!("kind"; [value] => Value::str(kind_name(value))),
        "list" => func_value!("list"; items => array(items.iter().cloned())),
        "+" => func_value!("+"; ints => {
            ints.iter().try_fold(0_i64, |acc, it| match reflect::force(it)? {
                Value::Int(int) => acc
                    .checked_add(int)
                    .ok_or_else(|| LzErr::Any(anyhow!("Integer Overflow"))),
                other => Err(LzErr::invalid(format!("cannot add a {}", other.type_name()))),
            })?
        }),
        "=" => func_value!("="; [lhs, rhs] => reflect::force(lhs)? == reflect::force(rhs)?),
        "str" => func_value!("str"; any => {
            let mut out = String::new();
            for it in any {
                match it {
                    Value::Str(s) => out.push_str(s),
                    other => write!(out, "{other:#}").map_err(anyhow::Error::from)?,
                }
            }
            Value::Str(EcoString::from(out))
        }),
        "throw" => func_value!("throw"; [value] => Err::<Value, _>(LzErr::Thrown(value.clone()))?),
        "bye" => Ordinary::native_value("bye", 0, |_, _| Err(LzErr::Stop)),
        _ => None?,
    })
}
