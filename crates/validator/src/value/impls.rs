use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Mapping, Reflect, Sequence, Value, ValueRef};

// ============================================================================
// SCALARS
// ============================================================================

macro_rules! reflect_scalar {
    ($variant:ident as $cast:ty => $($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                #[inline]
                fn reflect(&self) -> ValueRef<'_> {
                    ValueRef::$variant(<$cast>::from(*self))
                }
            }
        )+
    };
}

reflect_scalar!(Int as i64 => i8, i16, i32, i64);
reflect_scalar!(Uint as u64 => u8, u16, u32, u64);
reflect_scalar!(Float as f64 => f32, f64);

// usize and isize have no lossless `From` into the 64-bit shapes.
impl Reflect for isize {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Int(*self as i64)
    }
}

impl Reflect for usize {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Uint(*self as u64)
    }
}

impl Reflect for bool {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Bool(*self)
    }
}

impl Reflect for char {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Int(i64::from(u32::from(*self)))
    }
}

impl Reflect for str {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Str(self)
    }
}

impl Reflect for String {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Str(self)
    }
}

impl Reflect for DateTime<Utc> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Time(*self)
    }
}

// ============================================================================
// POINTERS
// ============================================================================

impl<T: Reflect> Reflect for Option<T> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Pointer(self.as_ref().map(|v| v as &dyn Reflect))
    }
}

// Owning and static references are transparent: they can never be nil, and
// the traversal sees the value they point at.
macro_rules! reflect_transparent {
    ($($wrapper:ty),+) => {
        $(
            impl<T: Reflect> Reflect for $wrapper {
                fn reflect(&self) -> ValueRef<'_> {
                    (**self).reflect()
                }

                fn type_name(&self) -> &'static str {
                    (**self).type_name()
                }

                fn as_inner(&self) -> Option<&dyn Reflect> {
                    Some(&**self as &dyn Reflect)
                }
            }
        )+
    };
}

reflect_transparent!(Box<T>, Rc<T>, Arc<T>, &'static T);

macro_rules! reflect_shared_str {
    ($($wrapper:ty),+) => {
        $(
            impl Reflect for $wrapper {
                fn reflect(&self) -> ValueRef<'_> {
                    ValueRef::Str(self)
                }
            }
        )+
    };
}

reflect_shared_str!(Box<str>, Rc<str>, Arc<str>, &'static str);

// ============================================================================
// SEQUENCES
// ============================================================================

impl<T: Reflect> Sequence for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Seq(self)
    }
}

impl<T: Reflect> Sequence for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        VecDeque::get(self, index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Seq(self)
    }
}

impl<T: Reflect, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Seq(self)
    }
}

// ============================================================================
// MAPS
// ============================================================================

/// A map key that can be recovered from its bracketed namespace text.
pub trait MapKey: Reflect + Sized {
    fn parse_key(text: &str) -> Option<Self>;
}

macro_rules! map_key_from_str {
    ($($ty:ty),+) => {
        $(
            impl MapKey for $ty {
                fn parse_key(text: &str) -> Option<Self> {
                    text.parse().ok()
                }
            }
        )+
    };
}

map_key_from_str!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, bool, char, String);

impl<K, V, S> Mapping for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Reflect,
    S: BuildHasher + 'static,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn lookup(&self, key: &str) -> Option<&dyn Reflect> {
        let key = K::parse_key(key)?;
        self.get(&key).map(|v| v as &dyn Reflect)
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: MapKey + Eq + Hash,
    V: Reflect,
    S: BuildHasher + 'static,
{
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Map(self)
    }
}

impl<K: MapKey + Ord, V: Reflect> Mapping for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn lookup(&self, key: &str) -> Option<&dyn Reflect> {
        let key = K::parse_key(key)?;
        self.get(&key).map(|v| v as &dyn Reflect)
    }
}

impl<K: MapKey + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Map(self)
    }
}

// ============================================================================
// JSON
// ============================================================================

impl Reflect for serde_json::Value {
    fn reflect(&self) -> ValueRef<'_> {
        use serde_json::Value as Json;
        match self {
            Json::Null => ValueRef::Pointer(None),
            Json::Bool(b) => ValueRef::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ValueRef::Int(i)
                } else if let Some(u) = n.as_u64() {
                    ValueRef::Uint(u)
                } else {
                    ValueRef::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => ValueRef::Str(s),
            Json::Array(items) => ValueRef::Seq(items),
            Json::Object(map) => ValueRef::Map(map),
        }
    }
}

impl Mapping for serde_json::Map<String, serde_json::Value> {
    fn len(&self) -> usize {
        serde_json::Map::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn lookup(&self, key: &str) -> Option<&dyn Reflect> {
        self.get(key).map(|v| v as &dyn Reflect)
    }
}

impl Mapping for Vec<(Value, Value)> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn entries(&self) -> Vec<(&dyn Reflect, &dyn Reflect)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect))
            .collect()
    }

    fn lookup(&self, key: &str) -> Option<&dyn Reflect> {
        self.iter()
            .find(|(k, _)| k.to_string() == key)
            .map(|(_, v)| v as &dyn Reflect)
    }
}
