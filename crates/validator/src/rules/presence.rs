//! Presence and conditional presence

use crate::error::Error;
use crate::level::FieldLevel;
use crate::value::ValueRef;

use super::{parse, parse_bool, split_params};

/// Whether the field holds something other than its zero value.
///
/// Collections count when non-empty; anything reached through a `Some` counts
/// even when the pointee is zero.
fn has_value(fl: &FieldLevel<'_>) -> bool {
    match fl.field() {
        ValueRef::Invalid | ValueRef::Pointer(None) => false,
        ValueRef::Seq(seq) => !seq.is_empty(),
        ValueRef::Map(map) => !map.is_empty(),
        shape => fl.is_pointer() || !shape.is_zero(),
    }
}

pub(super) fn required(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(has_value(fl))
}

pub(super) fn is_default(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(!has_value(fl))
}

// ============================================================================
// CONDITIONAL
// ============================================================================

/// Whether the value at `path` (relative to the parent) is absent or zero.
/// An unresolvable path answers `not_found`.
fn is_missing(fl: &FieldLevel<'_>, path: &str, not_found: bool) -> Result<bool, Error> {
    if path.is_empty() {
        return Ok(!has_value(fl));
    }
    let Some(resolved) = fl.resolve_from(fl.parent(), path)? else {
        return Ok(not_found);
    };
    Ok(match resolved.value() {
        ValueRef::Invalid => not_found,
        ValueRef::Pointer(None) => true,
        ValueRef::Seq(seq) => seq.is_empty(),
        ValueRef::Map(map) => map.is_empty(),
        shape => !resolved.is_pointer() && shape.is_zero(),
    })
}

/// Whether the value at `path` equals `expected`, read in the value's type.
fn has_expected(fl: &FieldLevel<'_>, path: &str, expected: &str) -> Result<bool, Error> {
    let Some(resolved) = fl.resolve_from(fl.parent(), path)? else {
        return Ok(false);
    };
    Ok(match resolved.value() {
        ValueRef::Int(n) => n == parse::<i64>(fl, expected)?,
        ValueRef::Uint(n) => n == parse::<u64>(fl, expected)?,
        ValueRef::Float(n) => n == parse::<f64>(fl, expected)?,
        ValueRef::Bool(b) => Some(b) == parse_bool(expected),
        shape @ (ValueRef::Seq(_) | ValueRef::Map(_)) => shape.len() == Some(parse::<usize>(fl, expected)?),
        ValueRef::Str(s) => s == expected,
        shape => shape.to_value().to_string() == expected,
    })
}

/// Required when every `Field value` pair in the parameter matches.
pub(super) fn required_if(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let params = split_params(fl.param());
    if params.len() % 2 != 0 {
        return Err(fl.param_error());
    }
    for pair in params.chunks_exact(2) {
        if !has_expected(fl, &pair[0], &pair[1])? {
            return Ok(true);
        }
    }
    Ok(has_value(fl))
}

/// Required unless some `Field value` pair in the parameter matches.
pub(super) fn required_unless(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let params = split_params(fl.param());
    if params.len() % 2 != 0 {
        return Err(fl.param_error());
    }
    for pair in params.chunks_exact(2) {
        if has_expected(fl, &pair[0], &pair[1])? {
            return Ok(true);
        }
    }
    Ok(has_value(fl))
}

/// Required when any of the named fields is present.
pub(super) fn required_with(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    for path in split_params(fl.param()) {
        if !is_missing(fl, &path, true)? {
            return Ok(has_value(fl));
        }
    }
    Ok(true)
}

/// Required when all of the named fields are present.
pub(super) fn required_with_all(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    for path in split_params(fl.param()) {
        if is_missing(fl, &path, true)? {
            return Ok(true);
        }
    }
    Ok(has_value(fl))
}

/// Required when the named field is missing.
pub(super) fn required_without(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    if is_missing(fl, fl.param().trim(), true)? {
        return Ok(has_value(fl));
    }
    Ok(true)
}

/// Required when all of the named fields are missing.
pub(super) fn required_without_all(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    for path in split_params(fl.param()) {
        if !is_missing(fl, &path, true)? {
            return Ok(true);
        }
    }
    Ok(has_value(fl))
}

/// Must be empty when any of the named fields is present.
pub(super) fn excluded_with(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    for path in split_params(fl.param()) {
        if !is_missing(fl, &path, true)? {
            return Ok(!has_value(fl));
        }
    }
    Ok(true)
}

/// Must be empty when all of the named fields are present.
pub(super) fn excluded_with_all(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    for path in split_params(fl.param()) {
        if is_missing(fl, &path, true)? {
            return Ok(true);
        }
    }
    Ok(!has_value(fl))
}

/// Must be empty when the named field is missing.
pub(super) fn excluded_without(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    if is_missing(fl, fl.param().trim(), true)? {
        return Ok(!has_value(fl));
    }
    Ok(true)
}

/// Must be empty when all of the named fields are missing.
pub(super) fn excluded_without_all(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    for path in split_params(fl.param()) {
        if !is_missing(fl, &path, true)? {
            return Ok(true);
        }
    }
    Ok(!has_value(fl))
}
