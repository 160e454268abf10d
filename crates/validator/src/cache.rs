//! Descriptor caches
//!
//! Two read-mostly maps: record type to [`StructDescriptor`] and tag string to
//! compiled [`Chain`]. Readers load the current snapshot without locking.
//! Writers serialize on a mutex, re-check, build, then publish a new map that
//! holds every old entry plus the new one. A published entry is never edited,
//! so a reader holding an old snapshot never sees a partial build.

use std::any::{Any, TypeId};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::debug;

use crate::engine::{StructCallback, Validator};
use crate::error::Error;
use crate::tag::{self, Chain};
use crate::value::Record;

// ============================================================================
// COPY-ON-WRITE MAP
// ============================================================================

pub(crate) struct CowCache<K, V> {
    map: ArcSwap<HashMap<K, Arc<V>>>,
    write: Mutex<()>,
}

impl<K: Eq + Hash + Clone, V> CowCache<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            map: ArcSwap::from_pointee(HashMap::new()),
            write: Mutex::new(()),
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.load().get(key).cloned()
    }

    /// Returns the cached entry, building and publishing it on a miss.
    ///
    /// Concurrent callers racing on the same key all observe the entry of the
    /// first publisher.
    pub(crate) fn get_or_try_insert<Q, E>(
        &self,
        key: &Q,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let _guard = self.write.lock();
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let entry = Arc::new(build()?);
        let mut next = HashMap::clone(&self.map.load());
        next.insert(key.to_owned(), Arc::clone(&entry));
        self.map.store(Arc::new(next));
        Ok(entry)
    }

    pub(crate) fn clear(&self) {
        let _guard = self.write.lock();
        self.map.store(Arc::new(HashMap::new()));
    }

    pub(crate) fn len(&self) -> usize {
        self.map.load().len()
    }
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

/// One field of a record type, resolved against the engine's configuration.
#[derive(Debug)]
pub(crate) struct FieldDescriptor {
    pub(crate) index: usize,
    pub(crate) name: &'static str,
    pub(crate) alt_name: String,
    pub(crate) names_equal: bool,
    pub(crate) chain: Arc<Chain>,
}

pub(crate) struct StructDescriptor {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) callback: Option<StructCallback>,
}

// ============================================================================
// BUILDING
// ============================================================================

impl Validator {
    pub(crate) fn struct_descriptor(&self, record: &dyn Record) -> Result<Arc<StructDescriptor>, Error> {
        let any: &dyn Any = record;
        let type_id = any.type_id();
        self.structs
            .get_or_try_insert(&type_id, || self.build_descriptor(record, type_id))
    }

    /// Compiles `tag` once and shares the chain between all callers.
    pub(crate) fn tag_chain(&self, tag: &str) -> Result<Arc<Chain>, Error> {
        self.tags
            .get_or_try_insert(tag, || tag::compile(&self.registry, tag, "").map_err(Error::from))
    }

    fn build_descriptor(&self, record: &dyn Record, type_id: TypeId) -> Result<StructDescriptor, Error> {
        let tag_name = self.config.tag_name.as_str();
        let mut fields = Vec::with_capacity(record.fields().len());

        for (index, info) in record.fields().iter().enumerate() {
            let rules = info.tag(tag_name).unwrap_or_default();
            if rules == tag::SKIP_FIELD {
                continue;
            }

            let alt_name = self
                .naming
                .as_ref()
                .and_then(|naming| naming(info))
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| info.name().to_owned());

            let chain = if rules.is_empty() {
                Chain::default()
            } else {
                tag::compile(&self.registry, rules, info.name())?
            };

            fields.push(FieldDescriptor {
                index,
                name: info.name(),
                names_equal: alt_name == info.name(),
                alt_name,
                chain: Arc::new(chain),
            });
        }

        debug!(
            record = record.record_name(),
            fields = fields.len(),
            "built struct descriptor"
        );

        Ok(StructDescriptor {
            name: record.record_name(),
            fields,
            callback: self.struct_callbacks.get(&type_id).cloned(),
        })
    }
}
