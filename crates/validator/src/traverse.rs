//! Traversal engine
//!
//! A [`Walker`] lives for one facade call. It visits fields in declaration
//! order, follows pointers, recurses into nested records and dives into
//! collections, running each field's compiled chain and collecting failures
//! with both a display and a structural namespace.

use std::fmt::Display;
use std::sync::Arc;

use crate::engine::Validator;
use crate::error::{AbsentValue, Cause, Error, FieldError, ValidationErrors};
use crate::level::{FieldLevel, StructLevel};
use crate::pool::Scratch;
use crate::registry::{RuleError, RuleResult};
use crate::tag::{Chain, Control, RuleNode};
use crate::value::{Kind, Record, Reflect, ValueRef};

/// Which fields of a record a call looks at.
#[derive(Clone, Copy)]
pub(crate) enum Filter<'a> {
    All,
    /// Only structural paths in the scratch selection.
    Include,
    /// Everything except structural paths in the scratch selection.
    Exclude,
    /// Skip a field when the predicate returns true for its structural path.
    Skip(&'a dyn Fn(&str) -> bool),
}

// ============================================================================
// POSITION
// ============================================================================

#[derive(Clone, Copy)]
pub(crate) struct FieldName<'n> {
    pub(crate) name: &'n str,
    pub(crate) alt: &'n str,
    pub(crate) names_equal: bool,
}

impl<'n> FieldName<'n> {
    pub(crate) fn same(name: &'n str) -> Self {
        Self {
            name,
            alt: name,
            names_equal: true,
        }
    }
}

/// Namespaces of the enclosing record plus the field being visited.
#[derive(Clone, Copy)]
struct Site<'s> {
    ns: &'s str,
    struct_ns: &'s str,
    field: FieldName<'s>,
}

impl<'s> Site<'s> {
    fn with_field<'t>(self, field: FieldName<'t>) -> Site<'t>
    where
        's: 't,
    {
        Site {
            ns: self.ns,
            struct_ns: self.struct_ns,
            field,
        }
    }
}

/// `name[key]` segments for one collection element.
struct ElementNames {
    name: String,
    alt: Option<String>,
}

impl ElementNames {
    fn new(field: FieldName<'_>, key: &dyn Display) -> Self {
        Self {
            name: format!("{}[{key}]", field.name),
            alt: (!field.names_equal).then(|| format!("{}[{key}]", field.alt)),
        }
    }

    fn field(&self) -> FieldName<'_> {
        FieldName {
            name: &self.name,
            alt: self.alt.as_deref().unwrap_or(&self.name),
            names_equal: self.alt.is_none(),
        }
    }
}

/// Position inside a compiled chain; always points at an existing node.
#[derive(Clone, Copy)]
struct Cursor<'c> {
    chain: &'c Chain,
    index: usize,
}

impl<'c> Cursor<'c> {
    fn start(chain: &'c Chain) -> Option<Self> {
        (!chain.is_empty()).then_some(Self { chain, index: 0 })
    }

    fn node(&self) -> &'c RuleNode {
        &self.chain.nodes[self.index]
    }

    fn next(&self) -> Option<Self> {
        let index = self.index + 1;
        (index < self.chain.nodes.len()).then_some(Self {
            chain: self.chain,
            index,
        })
    }
}

/// The value under judgement and where it came from.
#[derive(Clone, Copy)]
struct Subject<'v> {
    parent: &'v dyn Reflect,
    shape: ValueRef<'v>,
    raw: &'v dyn Reflect,
    nullable: bool,
}

// ============================================================================
// WALKER
// ============================================================================

pub(crate) struct Walker<'a> {
    validator: &'a Validator,
    top: &'a dyn Reflect,
    filter: Filter<'a>,
    pub(crate) scratch: Scratch,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        validator: &'a Validator,
        top: &'a dyn Reflect,
        filter: Filter<'a>,
        scratch: Scratch,
    ) -> Self {
        Self {
            validator,
            top,
            filter,
            scratch,
        }
    }

    /// Returns the scratch to the pool and turns collected failures into the
    /// call's result. A fatal error wins over any failures found before it.
    pub(crate) fn finish(mut self, outcome: Result<(), Error>) -> Result<(), Error> {
        let errors = std::mem::take(&mut self.scratch.errors);
        self.validator.release(self.scratch);
        outcome?;
        ValidationErrors::new(errors).into_result()
    }

    /// Validates a record's fields and then its whole-record callback.
    pub(crate) fn validate_struct(
        &mut self,
        parent: &dyn Reflect,
        current: &dyn Record,
        ns: &str,
        struct_ns: &str,
        skip_fields: bool,
    ) -> Result<(), Error> {
        let descriptor = self.validator.struct_descriptor(current)?;
        let (ns, struct_ns) = if ns.is_empty() && !descriptor.name.is_empty() {
            let root = format!("{}.", descriptor.name);
            (root.clone(), root)
        } else {
            (ns.to_owned(), struct_ns.to_owned())
        };
        let record: &dyn Reflect = current;

        if !skip_fields {
            for field in &descriptor.fields {
                if self.is_filtered_out(&struct_ns, field.name) {
                    continue;
                }
                let Some(value) = current.field(field.index) else {
                    continue;
                };
                let site = Site {
                    ns: &ns,
                    struct_ns: &struct_ns,
                    field: FieldName {
                        name: field.name,
                        alt: &field.alt_name,
                        names_equal: field.names_equal,
                    },
                };
                self.traverse_field(record, value, site, Cursor::start(&field.chain), false)?;
            }
        }

        if let Some(callback) = &descriptor.callback {
            let mut level = StructLevel {
                validator: self.validator,
                top: self.top,
                parent,
                current: record,
                ns: &ns,
                struct_ns: &struct_ns,
                errors: &mut self.scratch.errors,
            };
            callback(&mut level);
        }
        Ok(())
    }

    /// Validates a bare value against `chain`, as a field called `name`.
    pub(crate) fn validate_value(
        &mut self,
        parent: &dyn Reflect,
        value: &dyn Reflect,
        name: &str,
        chain: &Chain,
    ) -> Result<(), Error> {
        let site = Site {
            ns: "",
            struct_ns: "",
            field: FieldName::same(name),
        };
        self.traverse_field(parent, value, site, Cursor::start(chain), false)
    }

    fn is_filtered_out(&mut self, struct_ns: &str, name: &str) -> bool {
        if matches!(self.filter, Filter::All) {
            return false;
        }
        let path = &mut self.scratch.path;
        path.clear();
        path.push_str(struct_ns);
        path.push_str(name);

        match self.filter {
            Filter::All => false,
            Filter::Include => !self.scratch.selection.contains(path.as_str()),
            Filter::Exclude => self.scratch.selection.contains(path.as_str()),
            Filter::Skip(skip) => skip(path.as_str()),
        }
    }

    fn traverse_field(
        &mut self,
        parent: &dyn Reflect,
        current: &dyn Reflect,
        site: Site<'_>,
        cursor: Option<Cursor<'_>>,
        was_pointer: bool,
    ) -> Result<(), Error> {
        let (shape, raw, crossed) = current.reflect().resolve_pointers(current);
        let subject = Subject {
            parent,
            shape,
            raw,
            nullable: was_pointer || crossed,
        };
        if !matches!(shape, ValueRef::Pointer(None))
            && let Some(coerced) = self.validator.coerce(raw)
        {
            return self.traverse_field(parent, &coerced, site, cursor, subject.nullable);
        }

        match shape {
            ValueRef::Pointer(None) | ValueRef::Invalid => {
                let Some(cursor) = cursor else {
                    return Ok(());
                };
                let node = cursor.node();
                if matches!(node.control, Control::OmitEmpty | Control::IsEmpty) {
                    return Ok(());
                }
                if shape.kind() == Kind::Invalid {
                    let cause: Cause = Arc::new(AbsentValue::Invalid);
                    self.fail(&site, (&node.alias, &node.tag), &node.param, &subject, Some(cause));
                    return Ok(());
                }
                if node.control != Control::Or && !node.call_when_absent() {
                    let cause: Cause = Arc::new(AbsentValue::Nil);
                    self.fail(&site, (&node.alias, &node.tag), &node.param, &subject, Some(cause));
                    return Ok(());
                }
                self.walk_chain(subject, site, cursor)
            }
            ValueRef::Record(record) => self.enter_record(subject, record, site, cursor),
            _ => match cursor {
                Some(cursor) => self.walk_chain(subject, site, cursor),
                None => Ok(()),
            },
        }
    }

    fn enter_record(
        &mut self,
        subject: Subject<'_>,
        record: &dyn Record,
        site: Site<'_>,
        cursor: Option<Cursor<'_>>,
    ) -> Result<(), Error> {
        let mut rest = cursor;

        if let Some(cursor) = cursor {
            let node = cursor.node();
            if node.control != Control::StructOnly {
                if node.control == Control::IsEmpty {
                    if let Some(rule) = &node.rule {
                        let outcome = rule.run(&self.field_level(&subject, &site, node));
                        match outcome {
                            Ok(()) => {}
                            Err(RuleError::Failed(cause)) => {
                                self.fail(&site, (&node.alias, &node.tag), &node.param, &subject, cause);
                                return Ok(());
                            }
                            Err(RuleError::Fatal(err)) => return Err(err),
                        }
                    }
                }
                rest = cursor.next();
                if rest.is_some_and(|next| next.node().control == Control::NoStructLevel) {
                    return Ok(());
                }
            }
        }

        let skip_fields = rest.is_some_and(|next| next.node().control == Control::StructOnly);
        if site.field.name.is_empty() {
            return self.validate_struct(subject.parent, record, site.ns, site.struct_ns, skip_fields);
        }
        let ns = format!("{}{}.", site.ns, site.field.alt);
        let struct_ns = format!("{}{}.", site.struct_ns, site.field.name);
        self.validate_struct(subject.parent, record, &ns, &struct_ns, skip_fields)
    }

    fn walk_chain(&mut self, subject: Subject<'_>, site: Site<'_>, start: Cursor<'_>) -> Result<(), Error> {
        let mut cursor = start;
        loop {
            let node = cursor.node();
            let mut next = cursor.next();

            match node.control {
                Control::OmitEmpty => {
                    if subject.shape.is_zero() {
                        return Ok(());
                    }
                }
                Control::EndKeys => return Ok(()),
                Control::Dive => return self.dive(subject, site, next),
                Control::Or => next = self.run_or_group(subject, &site, cursor)?,
                _ => match self.run_rule(&subject, &site, node) {
                    Ok(()) => {}
                    Err(RuleError::Failed(cause)) => {
                        self.fail(&site, (&node.alias, &node.tag), &node.param, &subject, cause);
                    }
                    Err(RuleError::Fatal(err)) => return Err(err),
                },
            }

            match next {
                Some(following) => cursor = following,
                None => return Ok(()),
            }
        }
    }

    /// Runs an or-group starting at `start` and returns the node after it.
    fn run_or_group<'c>(
        &mut self,
        subject: Subject<'_>,
        site: &Site<'_>,
        start: Cursor<'c>,
    ) -> Result<Option<Cursor<'c>>, Error> {
        let mut cursor = start;
        let mut attempted = String::new();

        loop {
            let node = cursor.node();
            let cause = match self.run_rule(&subject, site, node) {
                Ok(()) => {
                    let mut end = cursor;
                    while !end.node().block_end {
                        match end.next() {
                            Some(following) => end = following,
                            None => return Ok(None),
                        }
                    }
                    return Ok(end.next());
                }
                Err(RuleError::Fatal(err)) => return Err(err),
                Err(RuleError::Failed(cause)) => cause,
            };

            attempted.push('|');
            attempted.push_str(&node.tag);
            if node.has_param {
                attempted.push('=');
                attempted.push_str(&node.param);
            }

            match cursor.next() {
                Some(following) if !node.block_end => cursor = following,
                next => {
                    if node.has_alias {
                        self.fail(site, (&node.alias, &node.actual_alias), &node.param, &subject, cause);
                    } else {
                        let tags = &attempted[1..];
                        self.fail(site, (tags, tags), &node.param, &subject, cause);
                    }
                    return Ok(next);
                }
            }
        }
    }

    fn dive(&mut self, subject: Subject<'_>, site: Site<'_>, next: Option<Cursor<'_>>) -> Result<(), Error> {
        match subject.shape {
            ValueRef::Seq(seq) => {
                if next.is_some_and(|keys| keys.node().control == Control::Keys) {
                    return Err(Error::KeysOnNonMap {
                        field: format!("{}{}", site.struct_ns, site.field.name),
                        kind: Kind::Seq,
                    });
                }
                for index in 0..seq.len() {
                    let Some(element) = seq.get(index) else {
                        continue;
                    };
                    let names = ElementNames::new(site.field, &index);
                    self.traverse_field(subject.parent, element, site.with_field(names.field()), next, false)?;
                }
                Ok(())
            }
            ValueRef::Map(map) => {
                for (key, value) in map.entries() {
                    let names = ElementNames::new(site.field, &key.reflect().to_value());
                    let element = site.with_field(names.field());
                    match next {
                        Some(keys) if keys.node().control == Control::Keys => {
                            if let Some(chain) = &keys.node().keys {
                                self.traverse_field(subject.parent, key, element, Cursor::start(chain), false)?;
                            }
                            if let Some(after) = keys.next() {
                                self.traverse_field(subject.parent, value, element, Some(after), false)?;
                            }
                        }
                        _ => self.traverse_field(subject.parent, value, element, next, false)?,
                    }
                }
                Ok(())
            }
            shape => Err(Error::BadDive {
                field: format!("{}{}", site.struct_ns, site.field.name),
                kind: shape.kind(),
            }),
        }
    }

    /// Runs the node's rule. Rules that do not opt in to absent values fail
    /// on them without being called.
    fn run_rule(&self, subject: &Subject<'_>, site: &Site<'_>, node: &RuleNode) -> RuleResult {
        let Some(rule) = &node.rule else {
            return Ok(());
        };
        if !rule.call_when_absent {
            let absent = match subject.shape {
                ValueRef::Pointer(None) => Some(AbsentValue::Nil),
                ValueRef::Invalid => Some(AbsentValue::Invalid),
                _ => None,
            };
            if let Some(absent) = absent {
                return Err(RuleError::Failed(Some(Arc::new(absent))));
            }
        }
        rule.run(&self.field_level(subject, site, node))
    }

    fn field_level<'x>(&'x self, subject: &Subject<'x>, site: &'x Site<'_>, node: &'x RuleNode) -> FieldLevel<'x> {
        FieldLevel {
            validator: self.validator,
            top: self.top,
            parent: subject.parent,
            field: subject.shape,
            raw: subject.raw,
            is_pointer: subject.nullable,
            field_name: site.field.alt,
            struct_field_name: site.field.name,
            tag: &node.tag,
            param: &node.param,
        }
    }

    fn fail(
        &mut self,
        site: &Site<'_>,
        (tag, actual_tag): (&str, &str),
        param: &str,
        subject: &Subject<'_>,
        cause: Option<Cause>,
    ) {
        let kind = subject.shape.kind();
        self.scratch.errors.push(FieldError {
            tag: tag.to_owned(),
            actual_tag: actual_tag.to_owned(),
            ns: format!("{}{}", site.ns, site.field.alt),
            struct_ns: format!("{}{}", site.struct_ns, site.field.name),
            field_len: site.field.alt.len(),
            struct_field_len: site.field.name.len(),
            value: subject.shape.to_value(),
            param: param.to_owned(),
            kind,
            type_name: if kind == Kind::Invalid {
                ""
            } else {
                subject.raw.type_name()
            },
            cause,
        });
    }
}
