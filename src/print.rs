use core::fmt::{self, Display};

use colored::Colorize;

use crate::object::{Kind, Obj, PropertyDescriptor, Value};

/// objects nested deeper than this print as `{...}`
const MAX_DEPTH: usize = 3;

pub fn pp_value(value: &Value) {
    println!(";; => {value}");
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = f.alternate();
        write_value(f, self, 0, plain)
    }
}

fn write_value(f: &mut fmt::Formatter, value: &Value, depth: usize, plain: bool) -> fmt::Result {
    if plain {
        match value {
            Value::Undefined => "undefined".fmt(f),
            Value::Null => "null".fmt(f),
            Value::Bool(b) => b.fmt(f),
            Value::Int(int) => int.fmt(f),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(obj) => write_object(f, obj, depth, plain),
        }
    } else {
        match value {
            Value::Undefined => "undefined".bold().blue().fmt(f),
            Value::Null => "null".bold().blue().fmt(f),
            Value::Bool(b) => b.to_string().bright_blue().fmt(f),
            Value::Int(int) => int.to_string().cyan().fmt(f),
            Value::Str(s) => format!("{s:?}").bright_green().fmt(f),
            Value::Object(obj) => write_object(f, obj, depth, plain),
        }
    }
}

fn write_object(f: &mut fmt::Formatter, obj: &Obj, depth: usize, plain: bool) -> fmt::Result {
    match obj.kind() {
        Kind::Lazy(None) => paint(f, "<lazy>", plain),
        Kind::Lazy(Some(_)) if depth >= MAX_DEPTH => paint(f, "<lazy => ...>", plain),
        Kind::Lazy(Some(value)) => {
            paint(f, "<lazy => ", plain)?;
            write_value(f, &value, depth + 1, plain)?;
            paint(f, ">", plain)
        }
        Kind::Destructurer => paint(f, "<destructurer>", plain),
        Kind::Function => {
            let name = obj
                .get_own_property(&"name".into())
                .ok()
                .flatten()
                .and_then(|it| it.value().cloned());

            match name {
                Some(Value::Str(name)) if !name.is_empty() => {
                    paint(f, &format!("<fn {name}>"), plain)
                }
                _ => paint(f, "<fn>", plain),
            }
        }
        Kind::Object if depth >= MAX_DEPTH => paint(f, "{...}", plain),
        Kind::Object => write_props(f, obj, depth, plain),
    }
}

fn write_props(f: &mut fmt::Formatter, obj: &Obj, depth: usize, plain: bool) -> fmt::Result {
    let Ok(keys) = obj.own_keys() else {
        return paint(f, "{?}", plain);
    };

    let entries = keys
        .into_iter()
        .filter_map(|key| Some((obj.get_own_property(&key).ok()??, key)))
        .filter(|(desc, _)| desc.is_enumerable())
        .collect::<Vec<_>>();

    if entries.is_empty() {
        return paint(f, "{}", plain);
    }

    paint(f, "{", plain)?;
    for (i, (desc, key)) in entries.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, " {key}: ")?;

        match desc {
            PropertyDescriptor::Data { value, .. } => write_value(f, value, depth + 1, plain)?,
            PropertyDescriptor::Accessor { .. } => paint(f, "[Getter/Setter]", plain)?,
        }
    }
    write!(f, " ")?;
    paint(f, "}", plain)
}

fn paint(f: &mut fmt::Formatter, text: &str, plain: bool) -> fmt::Result {
    if plain {
        text.fmt(f)
    } else {
        text.purple().fmt(f)
    }
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = f.alternate();
        let flag = |f: &mut fmt::Formatter, name: &str, on: bool| write!(f, ", {name}: {on}");

        match self {
            Self::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => {
                write!(f, "{{ value: ")?;
                write_value(f, value, 1, plain)?;
                flag(f, "writable", *writable)?;
                flag(f, "enumerable", *enumerable)?;
                flag(f, "configurable", *configurable)?;
            }
            Self::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => {
                write!(f, "{{ get: ")?;
                write_accessor(f, get.as_ref(), plain)?;
                write!(f, ", set: ")?;
                write_accessor(f, set.as_ref(), plain)?;
                flag(f, "enumerable", *enumerable)?;
                flag(f, "configurable", *configurable)?;
            }
        }

        write!(f, " }}")
    }
}

fn write_accessor(f: &mut fmt::Formatter, func: Option<&Obj>, plain: bool) -> fmt::Result {
    match func {
        Some(func) => write_object(f, func, 1, plain),
        None => write_value(f, &Value::Undefined, 1, plain),
    }
}
