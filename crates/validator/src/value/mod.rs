//! Shape view over validated values
//!
//! The engine never sees concrete types. Everything it walks is exposed through
//! [`Reflect`], which yields a [`ValueRef`]: a small closed enum over the shapes
//! the traversal understands (scalars, sequences, maps, records and the single
//! nullable shape produced by `Option`).
//!
//! Records are produced by `#[derive(Validate)]`, which emits the [`Record`]
//! field table at compile time.

mod impls;
mod snapshot;

pub use impls::MapKey;
pub use snapshot::Value;

use std::any::Any;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// KIND
// ============================================================================

/// The fieldless mirror of [`ValueRef`], reported on every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// No value at all (a missing map entry, a `null` with no container).
    Invalid,
    /// A nullable wrapper (`Option`).
    Pointer,
    Bool,
    Int,
    Uint,
    Float,
    String,
    /// Instant in time; record-shaped but validated as a scalar.
    Time,
    Seq,
    Map,
    Record,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Invalid => "invalid",
            Kind::Pointer => "pointer",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Time => "time",
            Kind::Seq => "seq",
            Kind::Map => "map",
            Kind::Record => "record",
        };
        f.write_str(name)
    }
}

// ============================================================================
// REFLECT
// ============================================================================

/// A value the engine can walk.
///
/// Implemented for the standard scalar, collection and smart-pointer types, for
/// `chrono::DateTime<Utc>`, `serde_json::Value` and [`Value`]. Structs get it
/// from `#[derive(Validate)]`.
///
/// # Examples
///
/// ```rust,ignore
/// use nebula_structval::{Reflect, ValueRef};
///
/// struct Celsius(f64);
///
/// impl Reflect for Celsius {
///     fn reflect(&self) -> ValueRef<'_> {
///         ValueRef::Float(self.0)
///     }
/// }
/// ```
pub trait Reflect: Any {
    /// Returns the shape of this value.
    fn reflect(&self) -> ValueRef<'_>;

    /// Name of the concrete type, used in failures and fatal errors.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The value a transparent wrapper (`Box`, `Rc`, `Arc`, `&'static`)
    /// stands for. Custom coercions and downcasts apply to that value.
    fn as_inner(&self) -> Option<&dyn Reflect> {
        None
    }
}

impl dyn Reflect {
    /// Downcasts to a concrete type.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

// ============================================================================
// VALUE REF
// ============================================================================

/// Borrowed shape of a value.
#[derive(Clone, Copy)]
pub enum ValueRef<'a> {
    Invalid,
    /// `None` is the nil pointer; `Some` must be dereferenced before use.
    Pointer(Option<&'a dyn Reflect>),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'a str),
    Time(DateTime<Utc>),
    Seq(&'a dyn Sequence),
    Map(&'a dyn Mapping),
    Record(&'a dyn Record),
}

impl<'a> ValueRef<'a> {
    /// Returns the kind of this shape.
    pub fn kind(&self) -> Kind {
        match self {
            ValueRef::Invalid => Kind::Invalid,
            ValueRef::Pointer(_) => Kind::Pointer,
            ValueRef::Bool(_) => Kind::Bool,
            ValueRef::Int(_) => Kind::Int,
            ValueRef::Uint(_) => Kind::Uint,
            ValueRef::Float(_) => Kind::Float,
            ValueRef::Str(_) => Kind::String,
            ValueRef::Time(_) => Kind::Time,
            ValueRef::Seq(_) => Kind::Seq,
            ValueRef::Map(_) => Kind::Map,
            ValueRef::Record(_) => Kind::Record,
        }
    }

    /// Follows `Some` pointers and transparent wrappers until a non-pointer
    /// shape is reached.
    ///
    /// Returns the final shape, the concrete value that produced it and
    /// whether any `Option` was crossed on the way.
    pub fn resolve_pointers(self, origin: &'a dyn Reflect) -> (ValueRef<'a>, &'a dyn Reflect, bool) {
        let mut current = self;
        let mut raw = origin;
        let mut nullable = false;
        loop {
            if let Some(inner) = raw.as_inner() {
                raw = inner;
                current = inner.reflect();
                continue;
            }
            match current {
                ValueRef::Pointer(Some(inner)) => {
                    nullable = true;
                    raw = inner;
                    current = inner.reflect();
                }
                _ => break,
            }
        }
        if matches!(current, ValueRef::Pointer(None)) {
            nullable = true;
        }
        (current, raw, nullable)
    }

    /// Whether this is the zero value of its type.
    ///
    /// Empty sequences and maps count as zero, as does a record whose fields
    /// are all zero.
    pub fn is_zero(&self) -> bool {
        match *self {
            ValueRef::Invalid | ValueRef::Pointer(None) => true,
            ValueRef::Pointer(Some(_)) => false,
            ValueRef::Bool(b) => !b,
            ValueRef::Int(n) => n == 0,
            ValueRef::Uint(n) => n == 0,
            ValueRef::Float(n) => n == 0.0,
            ValueRef::Str(s) => s.is_empty(),
            ValueRef::Time(t) => t == DateTime::<Utc>::UNIX_EPOCH,
            ValueRef::Seq(seq) => seq.is_empty(),
            ValueRef::Map(map) => map.is_empty(),
            ValueRef::Record(rec) => {
                (0..rec.fields().len()).all(|i| rec.field(i).is_none_or(|f| f.reflect().is_zero()))
            }
        }
    }

    /// Length in chars for strings, element count for collections.
    pub fn len(&self) -> Option<usize> {
        match self {
            ValueRef::Str(s) => Some(s.chars().count()),
            ValueRef::Seq(seq) => Some(seq.len()),
            ValueRef::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            ValueRef::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Takes an owned snapshot, dereferencing pointers.
    pub fn to_value(&self) -> Value {
        match *self {
            ValueRef::Invalid | ValueRef::Pointer(None) => Value::Nil,
            ValueRef::Pointer(Some(inner)) => inner.reflect().to_value(),
            ValueRef::Bool(b) => Value::Bool(b),
            ValueRef::Int(n) => Value::Int(n),
            ValueRef::Uint(n) => Value::Uint(n),
            ValueRef::Float(n) => Value::Float(n),
            ValueRef::Str(s) => Value::String(s.to_owned()),
            ValueRef::Time(t) => Value::Time(t),
            ValueRef::Seq(seq) => Value::Seq(
                (0..seq.len())
                    .filter_map(|i| seq.get(i))
                    .map(|v| v.reflect().to_value())
                    .collect(),
            ),
            ValueRef::Map(map) => Value::Map(
                map.entries()
                    .into_iter()
                    .map(|(k, v)| (k.reflect().to_value(), v.reflect().to_value()))
                    .collect(),
            ),
            ValueRef::Record(rec) => Value::Record {
                name: rec.record_name(),
                fields: rec
                    .fields()
                    .iter()
                    .enumerate()
                    .filter_map(|(i, info)| Some((info.name(), rec.field(i)?.reflect().to_value())))
                    .collect(),
            },
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueRef")
            .field(&self.kind())
            .field(&self.to_value())
            .finish()
    }
}

// ============================================================================
// COLLECTIONS
// ============================================================================

/// Indexed collection of reflectable elements.
pub trait Sequence {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyed collection of reflectable entries.
pub trait Mapping {
    fn len(&self) -> usize;

    /// Entries in the map's own iteration order.
    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)>;

    /// Looks up an entry from the textual form of its key, as written between
    /// brackets in a namespace. The text is parsed according to the key type.
    fn lookup(&self, key: &str) -> Option<&dyn Reflect>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Static metadata for one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    name: &'static str,
    tags: &'static [(&'static str, &'static str)],
}

impl FieldInfo {
    pub const fn new(name: &'static str, tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, tags }
    }

    /// Canonical (declared) field name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the metadata stored under `key`, e.g. the rule string under `validate`.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub const fn tags(&self) -> &'static [(&'static str, &'static str)] {
        self.tags
    }
}

/// A struct-like value with named fields.
///
/// Usually derived; see `#[derive(Validate)]`.
pub trait Record: Reflect {
    /// Display name of the type, used as the root namespace segment.
    fn record_name(&self) -> &'static str;

    /// Fields in declaration order.
    fn fields(&self) -> &'static [FieldInfo];

    /// Value of the field at `index` in [`fields`](Record::fields).
    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    fn field_by_name(&self, name: &str) -> Option<&dyn Reflect> {
        let index = self.fields().iter().position(|f| f.name() == name)?;
        self.field(index)
    }
}
