//! Comparisons against another field named by the parameter
//!
//! The parameter is a path resolved from the field's parent. A path that does
//! not resolve, or that lands on a value of a different kind, only satisfies
//! the "not equal" relations.

use std::cmp::Ordering;

use crate::error::Error;
use crate::level::FieldLevel;
use crate::value::ValueRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Relation {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Relation::Eq => ordering.is_eq(),
            Relation::Ne => ordering.is_ne(),
            Relation::Gt => ordering.is_gt(),
            Relation::Gte => ordering.is_ge(),
            Relation::Lt => ordering.is_lt(),
            Relation::Lte => ordering.is_le(),
        }
    }
}

/// Strings order by char count unless `lexical`; equality is always by
/// content. Collections compare by length, times by instant.
fn compare_field(fl: &FieldLevel<'_>, relation: Relation, lexical: bool) -> Result<bool, Error> {
    let Some(other) = fl.resolve_param()? else {
        return Ok(relation == Relation::Ne);
    };
    let field = fl.field();
    let other = other.value();
    if field.kind() != other.kind() {
        return Ok(relation == Relation::Ne);
    }

    let ordering = match (field, other) {
        (ValueRef::Str(a), ValueRef::Str(b)) => {
            if lexical || matches!(relation, Relation::Eq | Relation::Ne) {
                Some(a.cmp(b))
            } else {
                Some(a.chars().count().cmp(&b.chars().count()))
            }
        }
        (ValueRef::Int(a), ValueRef::Int(b)) => Some(a.cmp(&b)),
        (ValueRef::Uint(a), ValueRef::Uint(b)) => Some(a.cmp(&b)),
        (ValueRef::Float(a), ValueRef::Float(b)) => a.partial_cmp(&b),
        (ValueRef::Bool(a), ValueRef::Bool(b)) => Some(a.cmp(&b)),
        (ValueRef::Time(a), ValueRef::Time(b)) => Some(a.cmp(&b)),
        (a @ (ValueRef::Seq(_) | ValueRef::Map(_)), b) => a.len().partial_cmp(&b.len()),
        (a, b) => match relation {
            Relation::Eq | Relation::Ne => Some(a.to_value().to_string().cmp(&b.to_value().to_string())),
            _ => return Err(fl.type_error()),
        },
    };

    Ok(ordering.map_or(relation == Relation::Ne, |ordering| relation.holds(ordering)))
}

pub(super) fn eq_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Eq, false)
}

pub(super) fn ne_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Ne, false)
}

pub(super) fn gt_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Gt, false)
}

pub(super) fn gte_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Gte, false)
}

pub(super) fn lt_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Lt, false)
}

pub(super) fn lte_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Lte, false)
}

pub(super) fn eq_cs_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Eq, true)
}

pub(super) fn ne_cs_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Ne, true)
}

pub(super) fn gt_cs_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Gt, true)
}

pub(super) fn gte_cs_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Gte, true)
}

pub(super) fn lt_cs_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Lt, true)
}

pub(super) fn lte_cs_field(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    compare_field(fl, Relation::Lte, true)
}

// ============================================================================
// CONTAINMENT
// ============================================================================

/// `Some(contains)` or `None` when the other field does not resolve.
fn contains_field(fl: &FieldLevel<'_>) -> Result<Option<bool>, Error> {
    let ValueRef::Str(text) = fl.field() else {
        return Err(fl.type_error());
    };
    let Some(other) = fl.resolve_param()? else {
        return Ok(None);
    };
    let needle = match other.value() {
        ValueRef::Str(s) => s.to_owned(),
        shape => shape.to_value().to_string(),
    };
    Ok(Some(text.contains(needle.as_str())))
}

pub(super) fn field_contains(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(contains_field(fl)?.unwrap_or(false))
}

pub(super) fn field_excludes(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(contains_field(fl)?.is_none_or(|contains| !contains))
}
