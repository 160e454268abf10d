//! Namespace lookup for cross-field rules
//!
//! Walks a path such as `Inner.Items[2].Name` or `Labels[env]` from a base
//! value. Records are entered by field name, sequences by index and maps by
//! key, the key text being parsed according to the map's key type.

use crate::engine::Validator;
use crate::error::Error;
use crate::value::{Kind, Reflect, Value, ValueRef};

/// A value found by [`resolve`].
pub struct Resolved<'a> {
    inner: Inner<'a>,
    nullable: bool,
}

enum Inner<'a> {
    Borrowed {
        value: ValueRef<'a>,
        raw: &'a dyn Reflect,
    },
    /// Output of a custom type coercion.
    Owned(Value),
}

impl<'a> Resolved<'a> {
    fn borrowed(value: ValueRef<'a>, raw: &'a dyn Reflect, nullable: bool) -> Self {
        Self {
            inner: Inner::Borrowed { value, raw },
            nullable,
        }
    }

    fn owned(value: Value, nullable: bool) -> Self {
        Self {
            inner: Inner::Owned(value),
            nullable,
        }
    }

    fn into_owned<'b>(self) -> Resolved<'b> {
        let value = match self.inner {
            Inner::Borrowed { value, .. } => value.to_value(),
            Inner::Owned(value) => value,
        };
        Resolved::owned(value, self.nullable)
    }

    /// Shape of the resolved value; pointers are already followed.
    pub fn value(&self) -> ValueRef<'_> {
        match &self.inner {
            Inner::Borrowed { value, .. } => *value,
            Inner::Owned(value) => value.reflect(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.value().kind()
    }

    /// Whether an `Option` was crossed to reach the value.
    pub fn is_pointer(&self) -> bool {
        self.nullable
    }

    /// The concrete value, or the coercion output.
    pub fn raw(&self) -> &dyn Reflect {
        match &self.inner {
            Inner::Borrowed { raw, .. } => *raw,
            Inner::Owned(value) => value,
        }
    }
}

/// Resolves `namespace` starting at `base`.
///
/// `Ok(None)` when the walk hits a nil pointer, a missing field or entry, or an
/// out-of-range index. A path that does not fit the shape it walks is a fatal
/// [`Error::InvalidNamespace`].
pub(crate) fn resolve<'a>(
    validator: &Validator,
    base: &'a dyn Reflect,
    namespace: &str,
) -> Result<Option<Resolved<'a>>, Error> {
    let mut current = base;
    let mut namespace = namespace;

    loop {
        let (shape, raw, nullable) = current.reflect().resolve_pointers(current);

        if !matches!(shape, ValueRef::Pointer(None)) {
            if let Some(coerced) = validator.coerce(raw) {
                if namespace.is_empty() {
                    return Ok(Some(Resolved::owned(coerced, nullable)));
                }
                return Ok(resolve(validator, &coerced, namespace)?.map(Resolved::into_owned));
            }
        }

        match shape {
            ValueRef::Invalid => return Ok(None),
            _ if namespace.is_empty() => return Ok(Some(Resolved::borrowed(shape, raw, nullable))),
            ValueRef::Pointer(_) => return Ok(None),
            ValueRef::Record(record) => {
                let (field, rest) = match namespace.find(['.', '[']) {
                    Some(at) if namespace.as_bytes()[at] == b'.' => {
                        (&namespace[..at], &namespace[at + 1..])
                    }
                    Some(at) => (&namespace[..at], &namespace[at..]),
                    None => (namespace, ""),
                };
                let Some(next) = record.field_by_name(field) else {
                    return Ok(None);
                };
                current = next;
                namespace = rest;
            }
            ValueRef::Seq(seq) => {
                let (text, rest) = bracketed(namespace)?;
                let index: usize = text.parse().map_err(|_| invalid(namespace))?;
                let Some(next) = seq.get(index) else {
                    return Ok(None);
                };
                current = next;
                namespace = rest;
            }
            ValueRef::Map(map) => {
                let (key, rest) = bracketed(namespace)?;
                let Some(next) = map.lookup(key) else {
                    return Ok(None);
                };
                current = next;
                namespace = rest;
            }
            _ => return Err(invalid(namespace)),
        }
    }
}

/// Splits `[key]rest` into `key` and `rest`, dropping a `.` after the bracket.
fn bracketed(namespace: &str) -> Result<(&str, &str), Error> {
    let body = namespace
        .strip_prefix('[')
        .ok_or_else(|| invalid(namespace))?;
    let close = body.find(']').ok_or_else(|| invalid(namespace))?;
    let rest = &body[close + 1..];
    Ok((&body[..close], rest.strip_prefix('.').unwrap_or(rest)))
}

fn invalid(namespace: &str) -> Error {
    Error::InvalidNamespace {
        namespace: namespace.to_owned(),
    }
}
