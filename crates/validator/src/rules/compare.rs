//! Size and value comparisons against the rule parameter

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::Error;
use crate::level::FieldLevel;
use crate::value::{Reflect, ValueRef};

use super::{parse, parse_bool, parse_time, split_params, split_range};

// ============================================================================
// LENGTH
// ============================================================================

/// Chars for strings, elements for collections.
fn length(fl: &FieldLevel<'_>) -> Result<usize, Error> {
    match fl.field() {
        shape @ (ValueRef::Str(_) | ValueRef::Seq(_) | ValueRef::Map(_)) => Ok(shape.len().unwrap_or_default()),
        _ => Err(fl.type_error()),
    }
}

pub(super) fn len(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(length(fl)? == fl.param_as::<usize>()?)
}

pub(super) fn min_len(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(length(fl)? >= fl.param_as::<usize>()?)
}

pub(super) fn max_len(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(length(fl)? <= fl.param_as::<usize>()?)
}

pub(super) fn btw_len(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let length = length(fl)?;
    let (low, high) = split_range(fl, fl.param())?;
    Ok(parse::<usize>(fl, low)? <= length && length <= parse::<usize>(fl, high)?)
}

// ============================================================================
// ORDERING
// ============================================================================

/// Orders the field against the parameter. Strings and collections compare
/// by length, times against an RFC 3339 instant (or now).
fn against_param(fl: &FieldLevel<'_>) -> Result<Option<Ordering>, Error> {
    Ok(match fl.field() {
        shape @ (ValueRef::Str(_) | ValueRef::Seq(_) | ValueRef::Map(_)) => {
            shape.len().partial_cmp(&Some(fl.param_as::<usize>()?))
        }
        ValueRef::Int(n) => Some(n.cmp(&fl.param_as::<i64>()?)),
        ValueRef::Uint(n) => Some(n.cmp(&fl.param_as::<u64>()?)),
        ValueRef::Float(n) => n.partial_cmp(&fl.param_as::<f64>()?),
        ValueRef::Time(t) => Some(t.cmp(&parse_time(fl, fl.param())?)),
        _ => return Err(fl.type_error()),
    })
}

pub(super) fn gt(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(against_param(fl)? == Some(Ordering::Greater))
}

pub(super) fn gte(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(matches!(against_param(fl)?, Some(Ordering::Greater | Ordering::Equal)))
}

pub(super) fn lt(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(against_param(fl)? == Some(Ordering::Less))
}

pub(super) fn lte(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(matches!(against_param(fl)?, Some(Ordering::Less | Ordering::Equal)))
}

/// Inclusive `low~high` range over numbers and times.
pub(super) fn btw(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let (low, high) = split_range(fl, fl.param())?;
    Ok(match fl.field() {
        ValueRef::Int(n) => (parse::<i64>(fl, low)?..=parse(fl, high)?).contains(&n),
        ValueRef::Uint(n) => (parse::<u64>(fl, low)?..=parse(fl, high)?).contains(&n),
        ValueRef::Float(n) => (parse::<f64>(fl, low)?..=parse(fl, high)?).contains(&n),
        ValueRef::Time(t) => (parse_time(fl, low)?..=parse_time(fl, high)?).contains(&t),
        _ => return Err(fl.type_error()),
    })
}

// ============================================================================
// EQUALITY
// ============================================================================

/// Strings compare by content, collections by length.
pub(super) fn eq(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(match fl.field() {
        ValueRef::Str(s) => s == fl.param(),
        shape @ (ValueRef::Seq(_) | ValueRef::Map(_)) => shape.len() == Some(fl.param_as::<usize>()?),
        ValueRef::Int(n) => n == fl.param_as::<i64>()?,
        ValueRef::Uint(n) => n == fl.param_as::<u64>()?,
        ValueRef::Float(n) => n == fl.param_as::<f64>()?,
        ValueRef::Bool(b) => b == parse_bool(fl.param().trim()).ok_or_else(|| fl.param_error())?,
        _ => return Err(fl.type_error()),
    })
}

pub(super) fn ne(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    eq(fl).map(|equal| !equal)
}

/// One of the space-separated parameter words (quotes group words).
pub(super) fn one_of(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = match fl.field() {
        ValueRef::Str(s) => s.to_owned(),
        ValueRef::Int(n) => n.to_string(),
        ValueRef::Uint(n) => n.to_string(),
        _ => return Err(fl.type_error()),
    };
    Ok(split_params(fl.param()).contains(&text))
}

/// No two elements (or map values) are equal. With a parameter, elements are
/// records compared on the named field.
pub(super) fn unique(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let member = fl.param().trim();
    let mut seen = HashSet::new();

    match fl.field() {
        ValueRef::Seq(seq) => {
            for index in 0..seq.len() {
                let Some(element) = seq.get(index) else {
                    continue;
                };
                let element = if member.is_empty() {
                    element
                } else {
                    record_member(fl, element, member)?
                };
                if !seen.insert(fingerprint(element)) {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ValueRef::Map(map) => Ok(map
            .entries()
            .into_iter()
            .all(|(_, value)| seen.insert(fingerprint(value)))),
        _ => Err(fl.type_error()),
    }
}

fn record_member<'v>(fl: &FieldLevel<'_>, element: &'v dyn Reflect, name: &str) -> Result<&'v dyn Reflect, Error> {
    match element.reflect().resolve_pointers(element).0 {
        ValueRef::Record(record) => record.field_by_name(name).ok_or_else(|| fl.param_error()),
        _ => Err(fl.type_error()),
    }
}

fn fingerprint(value: &dyn Reflect) -> String {
    let shape = value.reflect().resolve_pointers(value).0;
    format!("{}:{}", shape.kind(), shape.to_value())
}
