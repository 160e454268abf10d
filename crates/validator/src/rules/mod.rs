//! Built-in rule catalog
//!
//! Every built-in is a plain predicate over a [`FieldLevel`]: `Ok(false)`
//! fails the field, `Err` aborts the call because the rule was put on a value
//! shape it cannot judge or was given a malformed parameter.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::Error;
use crate::level::FieldLevel;
use crate::registry::{Predicate, Registry};

mod compare;
mod cross;
mod format;
mod presence;

/// Rules that are skipped (failed outright) on absent values.
const CATALOG: &[(&str, Predicate)] = &[
    // presence
    ("required", presence::required),
    ("isdefault", presence::is_default),
    ("isempty", presence::is_default),
    // size and comparison
    ("len", compare::len),
    ("minlen", compare::min_len),
    ("maxlen", compare::max_len),
    ("btwlen", compare::btw_len),
    ("min", compare::gte),
    ("max", compare::lte),
    ("eq", compare::eq),
    ("ne", compare::ne),
    ("gt", compare::gt),
    ("gte", compare::gte),
    ("lt", compare::lt),
    ("lte", compare::lte),
    ("btw", compare::btw),
    ("oneof", compare::one_of),
    ("unique", compare::unique),
    // cross-field
    ("eqfield", cross::eq_field),
    ("nefield", cross::ne_field),
    ("gtfield", cross::gt_field),
    ("gtefield", cross::gte_field),
    ("ltfield", cross::lt_field),
    ("ltefield", cross::lte_field),
    ("eqcsfield", cross::eq_cs_field),
    ("necsfield", cross::ne_cs_field),
    ("gtcsfield", cross::gt_cs_field),
    ("gtecsfield", cross::gte_cs_field),
    ("ltcsfield", cross::lt_cs_field),
    ("ltecsfield", cross::lte_cs_field),
    ("fieldcontains", cross::field_contains),
    ("fieldexcludes", cross::field_excludes),
    // strings and formats
    ("alpha", format::alpha),
    ("alphanum", format::alphanum),
    ("numeric", format::numeric),
    ("number", format::number),
    ("hexadecimal", format::hexadecimal),
    ("hexcolor", format::hexcolor),
    ("rgb", format::rgb),
    ("rgba", format::rgba),
    ("hsl", format::hsl),
    ("hsla", format::hsla),
    ("email", format::email),
    ("url", format::url),
    ("uri", format::uri),
    ("uuid", format::uuid),
    ("ascii", format::ascii),
    ("lowercase", format::lowercase),
    ("uppercase", format::uppercase),
    ("contains", format::contains),
    ("containsany", format::contains_any),
    ("excludes", format::excludes),
    ("excludesall", format::excludes_all),
    ("startswith", format::starts_with),
    ("endswith", format::ends_with),
    ("boolean", format::boolean),
    ("json", format::json),
    ("ip", format::ip),
    ("ipv4", format::ipv4),
    ("ipv6", format::ipv6),
    ("cidr", format::cidr),
    ("semver", format::semver),
    ("base64", format::base64),
    ("datetime", format::datetime),
    ("regexp", format::regexp),
];

/// Rules that also run on absent values.
const CONDITIONAL: &[(&str, Predicate)] = &[
    ("required_if", presence::required_if),
    ("required_unless", presence::required_unless),
    ("required_with", presence::required_with),
    ("required_with_all", presence::required_with_all),
    ("required_without", presence::required_without),
    ("required_without_all", presence::required_without_all),
    ("excluded_with", presence::excluded_with),
    ("excluded_with_all", presence::excluded_with_all),
    ("excluded_without", presence::excluded_without),
    ("excluded_without_all", presence::excluded_without_all),
];

pub(crate) fn install(registry: &mut Registry) {
    for &(name, predicate) in CATALOG {
        registry.insert_predicate(name, predicate, false);
    }
    for &(name, predicate) in CONDITIONAL {
        registry.insert_predicate(name, predicate, true);
    }
    registry.insert_builtin_alias("iscolor", "hexcolor|rgb|rgba|hsl|hsla");
}

// ============================================================================
// PARAMETERS
// ============================================================================

static SPLIT_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'[^']*'|\S+").expect("param split regex is valid"));

/// Splits a parameter on whitespace; single quotes group words.
///
/// `Name 'Ada Lovelace' Age 36` yields `Name`, `Ada Lovelace`, `Age`, `36`.
fn split_params(param: &str) -> Vec<String> {
    SPLIT_PARAMS
        .find_iter(param)
        .map(|found| found.as_str().replace('\'', ""))
        .collect()
}

/// Splits a `low~high` range.
fn split_range<'p>(fl: &FieldLevel<'_>, param: &'p str) -> Result<(&'p str, &'p str), Error> {
    let bounds: Vec<&str> = param
        .split(['~', '～'])
        .map(str::trim)
        .filter(|bound| !bound.is_empty())
        .collect();
    match bounds[..] {
        [low, high] => Ok((low, high)),
        _ => Err(fl.param_error()),
    }
}

fn parse<T: FromStr>(fl: &FieldLevel<'_>, text: &str) -> Result<T, Error> {
    text.trim().parse().map_err(|_| fl.param_error())
}

/// Boolean spellings accepted in parameters and by the `boolean` rule.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// An RFC 3339 instant; empty or `now` is the current time.
fn parse_time(fl: &FieldLevel<'_>, text: &str) -> Result<DateTime<Utc>, Error> {
    let text = text.trim();
    if text.is_empty() || text == "now" {
        return Ok(Utc::now());
    }
    DateTime::parse_from_rfc3339(text)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| fl.param_error())
}
