use super::{Obj, Value};

/// Property descriptor, either a data or an accessor property.
#[derive(Clone, PartialEq, Eq)]
pub enum PropertyDescriptor {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<Obj>,
        set: Option<Obj>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// writable, enumerable, configurable
    #[must_use]
    pub const fn data(value: Value) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// non-writable, non-enumerable, non-configurable
    #[must_use]
    pub const fn frozen(value: Value) -> Self {
        Self::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// writable, non-enumerable, configurable. Used for methods.
    #[must_use]
    pub const fn hidden(value: Value) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    #[must_use]
    pub const fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    #[must_use]
    pub const fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// same attributes, new value. Accessors are returned unchanged.
    #[must_use]
    pub fn with_value(&self, new: Value) -> Self {
        match self {
            Self::Data {
                writable,
                enumerable,
                configurable,
                ..
            } => Self::Data {
                value: new,
                writable: *writable,
                enumerable: *enumerable,
                configurable: *configurable,
            },
            accessor @ Self::Accessor { .. } => accessor.clone(),
        }
    }

    /// Whether `self`, the current descriptor of a property, may be replaced
    /// by `next`. A configurable property accepts anything; a non-configurable
    /// one only accepts a descriptor that changes nothing but the value of a
    /// writable data property (or turns it read-only).
    #[must_use]
    pub fn admits(&self, next: &Self) -> bool {
        if self.is_configurable() {
            return true;
        }

        if next.is_configurable() || next.is_enumerable() != self.is_enumerable() {
            return false;
        }

        match (self, next) {
            (
                Self::Data {
                    value, writable, ..
                },
                Self::Data {
                    value: next_value,
                    writable: next_writable,
                    ..
                },
            ) => *writable || (!next_writable && value == next_value),

            (
                Self::Accessor { get, set, .. },
                Self::Accessor {
                    get: next_get,
                    set: next_set,
                    ..
                },
            ) => get == next_get && set == next_set,

            _ => false,
        }
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:#}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configurable_admits_anything() {
        let cur = PropertyDescriptor::data(Value::Int(1));
        assert!(cur.admits(&PropertyDescriptor::frozen(Value::Null)));
    }

    #[test]
    fn test_frozen_admits_only_itself() {
        let cur = PropertyDescriptor::frozen(Value::Int(1));

        assert!(cur.admits(&cur.clone()));
        assert!(!cur.admits(&cur.with_value(Value::Int(2))));
        assert!(!cur.admits(&PropertyDescriptor::data(Value::Int(1))));
    }

    #[test]
    fn test_writable_non_configurable() {
        let cur = PropertyDescriptor::Data {
            value: Value::Int(1),
            writable: true,
            enumerable: false,
            configurable: false,
        };

        assert!(cur.admits(&cur.with_value(Value::Int(7))));
        // read-only is a one-way door
        assert!(cur.admits(&PropertyDescriptor::frozen(Value::Int(3))));
        assert!(!cur.admits(&PropertyDescriptor::hidden(Value::Int(1))));
    }
}
