use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{Reflect, ValueRef};

/// Owned copy of a value.
///
/// Stored in every failure as the offending value, and produced by custom
/// type coercions. `Display` renders collections the way log output usually
/// shows them: `[a b]`, `map[k:v]`, `{field field}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Time(DateTime<Utc>),
    Seq(Vec<Value>),
    Map(Vec<(Value, Value)>),
    /// Snapshot of a struct. Reflects as [`ValueRef::Invalid`]: its field table
    /// is not static.
    Record {
        name: &'static str,
        fields: Vec<(&'static str, Value)>,
    },
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl Reflect for Value {
    fn reflect(&self) -> ValueRef<'_> {
        match self {
            Value::Nil | Value::Record { .. } => ValueRef::Invalid,
            Value::Bool(b) => ValueRef::Bool(*b),
            Value::Int(n) => ValueRef::Int(*n),
            Value::Uint(n) => ValueRef::Uint(*n),
            Value::Float(n) => ValueRef::Float(*n),
            Value::String(s) => ValueRef::Str(s),
            Value::Time(t) => ValueRef::Time(*t),
            Value::Seq(items) => ValueRef::Seq(items),
            Value::Map(entries) => ValueRef::Map(entries),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Uint(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("map[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
            Value::Record { fields, .. } => {
                f.write_str("{")?;
                for (i, (_, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! value_from {
    ($variant:ident as $cast:ty => $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$cast>::from(v))
                }
            }
        )+
    };
}

value_from!(Int as i64 => i8, i16, i32, i64);
value_from!(Uint as u64 => u8, u16, u32, u64);
value_from!(Float as f64 => f32, f64);
value_from!(Bool as bool => bool);

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}
