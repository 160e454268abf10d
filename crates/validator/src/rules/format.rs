//! String content and well-known formats

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use ::base64::Engine as _;
use ::base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::RwLock;
use regex::Regex;

use crate::error::Error;
use crate::level::FieldLevel;
use crate::value::ValueRef;

use super::parse_bool;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " regex is valid")));
    };
}

pattern!(ALPHA, r"^[a-zA-Z]+$");
pattern!(ALPHANUM, r"^[a-zA-Z0-9]+$");
pattern!(NUMERIC, r"^[-+]?[0-9]+(?:\.[0-9]+)?$");
pattern!(NUMBER, r"^[0-9]+$");
pattern!(HEXADECIMAL, r"^(0[xX])?[0-9a-fA-F]+$");
pattern!(HEXCOLOR, r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$");
pattern!(
    RGB,
    r"^rgb\(\s*(0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])\s*,\s*(0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])\s*,\s*(0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])\s*\)$"
);
pattern!(
    RGBA,
    r"^rgba\(\s*(?:(?:0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])\s*,\s*(?:0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])\s*,\s*(?:0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])|(?:0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])%\s*,\s*(?:0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])%\s*,\s*(?:0|[1-9]\d?|1\d\d?|2[0-4]\d|25[0-5])%)\s*,\s*(?:(?:0\.[0-9]*)|[01])\s*\)$"
);
pattern!(
    HSL,
    r"^hsl\(\s*(?:0|[1-9]\d?|[12]\d\d|3[0-5]\d|360)\s*,\s*(?:(?:0|[1-9]\d?|100)%)\s*,\s*(?:(?:0|[1-9]\d?|100)%)\s*\)$"
);
pattern!(
    HSLA,
    r"^hsla\(\s*(?:0|[1-9]\d?|[12]\d\d|3[0-5]\d|360)\s*,\s*(?:(?:0|[1-9]\d?|100)%)\s*,\s*(?:(?:0|[1-9]\d?|100)%)\s*,\s*(?:(?:0\.[0-9]*)|[01])\s*\)$"
);
pattern!(EMAIL, r"^([\w\.\+\-]+)@([\w\-]+\.)+([a-zA-Z]{2,})$");
pattern!(
    UUID,
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
);

/// Patterns compiled for `regexp=...` parameters, keyed by source.
static COMPILED: LazyLock<RwLock<HashMap<String, Regex>>> = LazyLock::new(Default::default);

fn text<'a>(fl: &FieldLevel<'a>) -> Result<&'a str, Error> {
    fl.field().as_str().ok_or_else(|| fl.type_error())
}

fn matches(fl: &FieldLevel<'_>, pattern: &Regex) -> Result<bool, Error> {
    Ok(pattern.is_match(text(fl)?))
}

// ============================================================================
// CHARACTER CLASSES
// ============================================================================

pub(super) fn alpha(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &ALPHA)
}

pub(super) fn alphanum(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &ALPHANUM)
}

/// Numbers always pass; strings must be a signed decimal.
pub(super) fn numeric(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    match fl.field() {
        ValueRef::Int(_) | ValueRef::Uint(_) | ValueRef::Float(_) => Ok(true),
        _ => matches(fl, &NUMERIC),
    }
}

/// Numbers always pass; strings must be plain digits.
pub(super) fn number(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    match fl.field() {
        ValueRef::Int(_) | ValueRef::Uint(_) | ValueRef::Float(_) => Ok(true),
        _ => matches(fl, &NUMBER),
    }
}

pub(super) fn hexadecimal(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &HEXADECIMAL)
}

pub(super) fn ascii(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.is_ascii())
}

pub(super) fn lowercase(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    Ok(!text.is_empty() && text == text.to_lowercase())
}

pub(super) fn uppercase(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    Ok(!text.is_empty() && text == text.to_uppercase())
}

// ============================================================================
// COLORS
// ============================================================================

pub(super) fn hexcolor(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &HEXCOLOR)
}

pub(super) fn rgb(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &RGB)
}

pub(super) fn rgba(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &RGBA)
}

pub(super) fn hsl(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &HSL)
}

pub(super) fn hsla(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &HSLA)
}

// ============================================================================
// SUBSTRINGS
// ============================================================================

pub(super) fn contains(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.contains(fl.param()))
}

/// Contains at least one char of the parameter.
pub(super) fn contains_any(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    Ok(fl.param().chars().any(|c| text.contains(c)))
}

pub(super) fn excludes(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(!text(fl)?.contains(fl.param()))
}

/// Contains none of the chars of the parameter.
pub(super) fn excludes_all(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    Ok(!fl.param().chars().any(|c| text.contains(c)))
}

pub(super) fn starts_with(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.starts_with(fl.param()))
}

pub(super) fn ends_with(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.ends_with(fl.param()))
}

// ============================================================================
// FORMATS
// ============================================================================

pub(super) fn email(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &EMAIL)
}

/// Absolute URL with a scheme. The fragment is ignored.
pub(super) fn url(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    let without_fragment = text.split('#').next().unwrap_or_default();
    if without_fragment.is_empty() {
        return Ok(false);
    }
    Ok(::url::Url::parse(without_fragment).is_ok())
}

/// Absolute URL or an absolute path.
pub(super) fn uri(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    Ok(text.starts_with('/') || ::url::Url::parse(text).is_ok())
}

pub(super) fn uuid(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    matches(fl, &UUID)
}

/// A Go-style boolean spelling. Bool values always pass.
pub(super) fn boolean(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    match fl.field() {
        ValueRef::Bool(_) => Ok(true),
        _ => Ok(parse_bool(text(fl)?).is_some()),
    }
}

pub(super) fn json(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(serde_json::from_str::<serde::de::IgnoredAny>(text(fl)?).is_ok())
}

pub(super) fn ip(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.parse::<IpAddr>().is_ok())
}

pub(super) fn ipv4(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.parse::<Ipv4Addr>().is_ok())
}

pub(super) fn ipv6(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(text(fl)?.parse::<Ipv6Addr>().is_ok())
}

/// `address/prefix` with the prefix in range for the address family.
pub(super) fn cidr(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let Some((address, prefix)) = text(fl)?.split_once('/') else {
        return Ok(false);
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return Ok(false);
    };
    Ok(match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    })
}

pub(super) fn semver(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    Ok(::semver::Version::parse(text(fl)?).is_ok())
}

/// Standard padded base64; the empty string does not count.
pub(super) fn base64(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    Ok(!text.is_empty() && STANDARD.decode(text).is_ok())
}

/// Parses with the `strftime`-style format in the parameter, accepting a full
/// timestamp, a date or a time of day.
pub(super) fn datetime(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    let format = fl.param();
    if format.is_empty() {
        return Err(fl.param_error());
    }
    Ok(DateTime::parse_from_str(text, format).is_ok()
        || NaiveDateTime::parse_from_str(text, format).is_ok()
        || NaiveDate::parse_from_str(text, format).is_ok()
        || NaiveTime::parse_from_str(text, format).is_ok())
}

/// Matches the pattern in the parameter. Patterns are compiled once per
/// process.
pub(super) fn regexp(fl: &FieldLevel<'_>) -> Result<bool, Error> {
    let text = text(fl)?;
    let source = fl.param();

    if let Some(pattern) = COMPILED.read().get(source) {
        return Ok(pattern.is_match(text));
    }
    let pattern = Regex::new(source).map_err(|_| fl.param_error())?;
    let matched = pattern.is_match(text);
    COMPILED.write().insert(source.to_owned(), pattern);
    Ok(matched)
}
