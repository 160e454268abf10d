//! The engine instance and its validation entry points
//!
//! A [`Validator`] is meant to be built once at startup, configured through
//! its `register_*` methods, and then shared (e.g. behind an `Arc` or in a
//! `static`) by every thread that validates. Registration takes `&mut self`,
//! so it cannot race with validation traffic.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::{CowCache, StructDescriptor};
use crate::config::{ValidatorBuilder, ValidatorConfig};
use crate::error::Error;
use crate::level::{FieldLevel, StructLevel};
use crate::pool::{Scratch, ScratchPool};
use crate::registry::{Registry, RuleError, RuleResult};
use crate::rules;
use crate::tag::{self, Chain};
use crate::traverse::{Filter, Walker};
use crate::value::{FieldInfo, Record, Reflect, Value, ValueRef};

pub(crate) type StructCallback = Arc<dyn Fn(&mut StructLevel<'_>) + Send + Sync>;

type CustomTypeFn = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;

/// Maps a field to its display name. `None` or an empty name keeps the
/// canonical one.
pub type NamingFn = Arc<dyn Fn(&FieldInfo) -> Option<String> + Send + Sync>;

/// Tag-driven validation engine.
///
/// # Examples
///
/// ```
/// use nebula_structval::{Validate, Validator};
///
/// #[derive(Validate)]
/// struct Signup {
///     #[validate("required,email")]
///     email: String,
///     #[validate("gte=18")]
///     age: u8,
/// }
///
/// let validator = Validator::new();
/// let err = validator
///     .validate_struct(&Signup { email: "nope".into(), age: 16 })
///     .unwrap_err();
/// let failures = err.validation_errors().unwrap();
/// assert_eq!(failures.len(), 2);
/// assert_eq!(failures.as_slice()[0].namespace(), "Signup.email");
/// ```
pub struct Validator {
    pub(crate) config: ValidatorConfig,
    pub(crate) registry: Registry,
    pub(crate) struct_callbacks: HashMap<TypeId, StructCallback>,
    custom_types: HashMap<TypeId, CustomTypeFn>,
    pub(crate) naming: Option<NamingFn>,
    pub(crate) structs: CowCache<TypeId, StructDescriptor>,
    pub(crate) tags: CowCache<String, Chain>,
    pool: ScratchPool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("rules", &self.registry.rule_count())
            .field("cached_structs", &self.structs.len())
            .field("cached_tags", &self.tags.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CONSTRUCTION & REGISTRATION
// ============================================================================

impl Validator {
    /// Engine with the default configuration and the built-in rule catalog.
    pub fn new() -> Self {
        Self::assemble(ValidatorConfig::default(), true)
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self::assemble(config, true)
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub(crate) fn assemble(config: ValidatorConfig, baked_in: bool) -> Self {
        let mut registry = Registry::default();
        if baked_in {
            rules::install(&mut registry);
        }

        let naming = config.display_tag.clone().map(|key| {
            let naming: NamingFn = Arc::new(move |info: &FieldInfo| {
                info.tag(&key)
                    .and_then(|tag| tag.split(tag::TAG_SEPARATOR).next())
                    .filter(|name| *name != tag::SKIP_FIELD)
                    .map(str::to_owned)
            });
            naming
        });

        debug!(
            tag_name = %config.tag_name,
            rules = registry.rule_count(),
            "validator created"
        );

        Self {
            pool: ScratchPool::new(config.pool_capacity),
            config,
            registry,
            struct_callbacks: HashMap::new(),
            custom_types: HashMap::new(),
            naming,
            structs: CowCache::new(),
            tags: CowCache::new(),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Field attribute key the rules are read from.
    pub fn tag_name(&self) -> &str {
        &self.config.tag_name
    }

    pub fn set_tag_name(&mut self, tag_name: impl Into<String>) {
        self.config.tag_name = tag_name.into();
        self.invalidate();
    }

    /// Registers a boolean rule under `name`, replacing any previous one.
    ///
    /// The rule does not run on absent values; those fail on their own.
    pub fn register_rule<F>(&mut self, name: &str, rule: F) -> Result<(), Error>
    where
        F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
    {
        self.register_rule_with(
            name,
            move |fl| {
                if rule(fl) {
                    Ok(())
                } else {
                    Err(RuleError::failed())
                }
            },
            false,
        )
    }

    /// Registers a rule that can attach a cause or abort the call.
    ///
    /// With `call_when_absent` the rule also runs on nil values instead of
    /// failing them outright.
    pub fn register_rule_with<F>(&mut self, name: &str, rule: F, call_when_absent: bool) -> Result<(), Error>
    where
        F: Fn(&FieldLevel<'_>) -> RuleResult + Send + Sync + 'static,
    {
        self.registry.insert_rule(name, Arc::new(rule), call_when_absent)?;
        debug!(rule = name, call_when_absent, "rule registered");
        self.invalidate();
        Ok(())
    }

    /// Registers `name` as shorthand for `expansion`, a tag string.
    pub fn register_alias(&mut self, name: &str, expansion: &str) -> Result<(), Error> {
        self.registry.insert_alias(name, expansion)?;
        debug!(alias = name, expansion, "alias registered");
        self.invalidate();
        Ok(())
    }

    /// Registers a whole-record check for `T`, run after its fields.
    pub fn register_struct_validation<T, F>(&mut self, callback: F)
    where
        T: Record,
        F: Fn(&mut StructLevel<'_>, &T) + Send + Sync + 'static,
    {
        let callback: StructCallback = Arc::new(move |level: &mut StructLevel<'_>| {
            if let Some(current) = level.current().downcast_ref::<T>() {
                callback(level, current);
            }
        });
        self.struct_callbacks.insert(TypeId::of::<T>(), callback);
        debug!(record = std::any::type_name::<T>(), "struct validation registered");
        self.invalidate();
    }

    /// Validates values of `T` as the value `coerce` returns for them.
    pub fn register_custom_type<T, F>(&mut self, coerce: F)
    where
        T: Reflect,
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let coerce: CustomTypeFn =
            Arc::new(move |any: &dyn Any| any.downcast_ref::<T>().map_or(Value::Nil, &coerce));
        self.custom_types.insert(TypeId::of::<T>(), coerce);
        debug!(custom_type = std::any::type_name::<T>(), "custom type registered");
        self.invalidate();
    }

    /// Installs the function deciding display names for record fields.
    pub fn set_naming_function<F>(&mut self, naming: F)
    where
        F: Fn(&FieldInfo) -> Option<String> + Send + Sync + 'static,
    {
        self.naming = Some(Arc::new(naming));
        self.invalidate();
    }

    /// Compiles `tag` (or fetches it from the cache).
    pub fn compile_tag(&self, tag: &str) -> Result<Arc<Chain>, Error> {
        self.tag_chain(tag)
    }

    fn invalidate(&self) {
        self.structs.clear();
        self.tags.clear();
        debug!("validator caches cleared");
    }

    pub(crate) fn coerce(&self, raw: &dyn Reflect) -> Option<Value> {
        if self.custom_types.is_empty() {
            return None;
        }
        let any: &dyn Any = raw;
        self.custom_types.get(&any.type_id()).map(|coerce| coerce(any))
    }

    pub(crate) fn release(&self, scratch: Scratch) {
        self.pool.give(scratch);
    }
}

// ============================================================================
// FACADE
// ============================================================================

impl Validator {
    /// Validates every field of a record, recursing into nested records.
    ///
    /// A value that is not a record (after following `Option`s) is an
    /// [`Error::InvalidArgument`].
    pub fn validate_struct(&self, value: &dyn Reflect) -> Result<(), Error> {
        self.trace_call("validate_struct", value);
        let record = root_record(value)?;
        self.run(value, Filter::All, self.pool.take(), |walker| {
            walker.validate_struct(value, record, "", "", false)
        })
    }

    /// Validates only the listed fields, given relative to the record
    /// (`Name`, `Inner.Field`, `Items[0].Field`).
    pub fn validate_struct_partial<I, S>(&self, value: &dyn Reflect, fields: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.trace_call("validate_struct_partial", value);
        let record = root_record(value)?;
        let mut scratch = self.pool.take();
        for field in fields {
            select_with_ancestors(&mut scratch.selection, record.record_name(), field.as_ref());
        }
        self.run(value, Filter::Include, scratch, |walker| {
            walker.validate_struct(value, record, "", "", false)
        })
    }

    /// Validates everything except the listed fields.
    pub fn validate_struct_except<I, S>(&self, value: &dyn Reflect, fields: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.trace_call("validate_struct_except", value);
        let record = root_record(value)?;
        let mut scratch = self.pool.take();
        for field in fields {
            scratch
                .selection
                .insert(format!("{}.{}", record.record_name(), field.as_ref()));
        }
        self.run(value, Filter::Exclude, scratch, |walker| {
            walker.validate_struct(value, record, "", "", false)
        })
    }

    /// Validates the fields for which `skip` returns false. `skip` receives
    /// the structural path, e.g. `User.Address.City`.
    pub fn validate_struct_filtered<F>(&self, value: &dyn Reflect, skip: F) -> Result<(), Error>
    where
        F: Fn(&str) -> bool,
    {
        self.trace_call("validate_struct_filtered", value);
        let record = root_record(value)?;
        self.run(value, Filter::Skip(&skip), self.pool.take(), |walker| {
            walker.validate_struct(value, record, "", "", false)
        })
    }

    /// Validates a bare value against a tag string.
    ///
    /// ```
    /// use nebula_structval::Validator;
    ///
    /// let validator = Validator::new();
    /// assert!(validator.validate_var(&7, "gt=1,lt=10").is_ok());
    /// assert!(validator.validate_var(&"", "required").is_err());
    /// ```
    pub fn validate_var(&self, value: &dyn Reflect, tag: &str) -> Result<(), Error> {
        self.validate_field("", value, tag)
    }

    /// Like [`validate_var`](Self::validate_var), reporting failures under
    /// `name`.
    pub fn validate_field(&self, name: &str, value: &dyn Reflect, tag: &str) -> Result<(), Error> {
        if tag.is_empty() || tag == tag::SKIP_FIELD {
            return Ok(());
        }
        self.trace_call("validate_var", value);
        let chain = self.tag_chain(tag)?;
        self.run(value, Filter::All, self.pool.take(), |walker| {
            walker.validate_value(value, value, name, &chain)
        })
    }

    /// Validates `field` with cross-field rules resolved against `other`,
    /// e.g. `eqfield` with an empty path compares the two values.
    ///
    /// Passing a record as `other` with rules meant for record fields gives
    /// results that are well defined but rarely useful.
    pub fn validate_var_with_value(&self, field: &dyn Reflect, other: &dyn Reflect, tag: &str) -> Result<(), Error> {
        if tag.is_empty() || tag == tag::SKIP_FIELD {
            return Ok(());
        }
        self.trace_call("validate_var_with_value", field);
        let chain = self.tag_chain(tag)?;
        self.run(other, Filter::All, self.pool.take(), |walker| {
            walker.validate_value(other, field, "", &chain)
        })
    }

    fn run<'a>(
        &'a self,
        top: &'a dyn Reflect,
        filter: Filter<'a>,
        scratch: Scratch,
        visit: impl FnOnce(&mut Walker<'a>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut walker = Walker::new(self, top, filter, scratch);
        let outcome = visit(&mut walker);
        walker.finish(outcome)
    }

    fn trace_call(&self, operation: &'static str, value: &dyn Reflect) {
        if self.config.trace_calls {
            trace!(operation, type_name = value.type_name(), "validation call");
        }
    }
}

fn root_record(value: &dyn Reflect) -> Result<&dyn Record, Error> {
    match value.reflect().resolve_pointers(value).0 {
        ValueRef::Record(record) => Ok(record),
        ValueRef::Pointer(None) => Err(Error::InvalidArgument {
            type_name: value.type_name(),
            reason: "nil",
        }),
        _ => Err(Error::InvalidArgument {
            type_name: value.type_name(),
            reason: "non-record",
        }),
    }
}

/// Adds `path` and every prefix the walk passes through to reach it, so
/// `Items[0].Name` under `Order` selects `Order.Items`, `Order.Items[0]` and
/// `Order.Items[0].Name`.
fn select_with_ancestors(selection: &mut HashSet<String>, root: &str, path: &str) {
    let mut prefix = String::with_capacity(root.len() + path.len() + 1);
    if !root.is_empty() {
        prefix.push_str(root);
        prefix.push('.');
    }

    for segment in path.split('.') {
        if segment.contains('[') {
            let mut rest = segment;
            while let Some(open) = rest.find('[') {
                prefix.push_str(&rest[..open]);
                selection.insert(prefix.clone());

                let close = rest[open..].find(']').map_or(rest.len(), |at| open + at + 1);
                prefix.push_str(&rest[open..close]);
                selection.insert(prefix.clone());
                rest = &rest[close..];
            }
        } else {
            prefix.push_str(segment);
            selection.insert(prefix.clone());
        }
        prefix.push('.');
    }
}
