//! Error types
//!
//! Two disjoint classes live here:
//!
//! - **Usage errors** ([`Error`] variants other than `Validation`): a malformed tag,
//!   an unknown rule, a rule applied to a shape it cannot handle. These abort the
//!   call immediately.
//! - **Data failures** ([`FieldError`], batched in [`ValidationErrors`]): everything
//!   the traversal found wrong with the input, in discovery order.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::value::{Kind, Value};

/// Underlying error attached to a failure.
pub type Cause = Arc<dyn std::error::Error + Send + Sync>;

// ============================================================================
// USAGE ERRORS
// ============================================================================

/// Fatal errors. Anything except [`Error::Validation`] is a programming mistake.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input data failed one or more rules.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The facade was handed something it cannot validate.
    #[error("validator: ({reason} {type_name})")]
    InvalidArgument {
        type_name: &'static str,
        reason: &'static str,
    },

    /// A tag string failed to compile.
    #[error(transparent)]
    Tag(#[from] TagError),

    /// A rule was applied to a value shape it does not support.
    #[error("bad field type {type_name} for rule '{tag}'")]
    BadFieldType { tag: String, type_name: &'static str },

    /// A rule parameter could not be parsed.
    #[error("invalid parameter {param:?} for rule '{tag}'")]
    BadParam { tag: String, param: String },

    #[error("dive error! can't dive on a non slice or map: field '{field}' is {kind}")]
    BadDive { field: String, kind: Kind },

    /// A `keys` block followed a dive into something other than a map.
    #[error("'keys' applies only to map entries: field '{field}' is {kind}")]
    KeysOnNonMap { field: String, kind: Kind },

    /// A cross-field path does not match the shape of the value it walks.
    #[error("invalid field namespace {namespace:?}")]
    InvalidNamespace { namespace: String },

    /// A rule, alias or callback registration was rejected.
    #[error("cannot register '{name}': {reason}")]
    Registration { name: String, reason: &'static str },
}

impl Error {
    /// Returns true for data failures, false for usage errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errs) => Some(errs),
            _ => None,
        }
    }

    pub fn into_validation_errors(self) -> Option<ValidationErrors> {
        match self {
            Error::Validation(errs) => Some(errs),
            _ => None,
        }
    }

    pub(crate) fn bad_field_type(tag: &str, type_name: &'static str) -> Self {
        Error::BadFieldType {
            tag: tag.to_owned(),
            type_name,
        }
    }

    pub(crate) fn bad_param(tag: &str, param: &str) -> Self {
        Error::BadParam {
            tag: tag.to_owned(),
            param: param.to_owned(),
        }
    }
}

/// Compile errors raised while parsing a tag string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("'keys' tag must be immediately preceded by the 'dive' tag")]
    KeysWithoutDive,

    #[error("'endkeys' tag encountered without a corresponding 'keys' tag")]
    EndKeysWithoutKeys,

    #[error("'keys' tag on field '{field}' is missing its 'endkeys' tag")]
    UnterminatedKeys { field: String },

    #[error("invalid validation tag on field '{field}'")]
    InvalidTag { field: String },

    #[error("undefined validation function '{rule}' on field '{field}'")]
    UndefinedRule { rule: String, field: String },
}

/// Cause attached to failures on nil or missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AbsentValue {
    #[error("field is nil")]
    Nil,
    #[error("field is invalid")]
    Invalid,
}

// ============================================================================
// FIELD ERROR
// ============================================================================

/// One failed rule on one field.
///
/// `tag` is the name as written on the field (an alias stays an alias);
/// `actual_tag` is the rule that actually ran, or the whole alternative list
/// for a failed or-group.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub(crate) tag: String,
    pub(crate) actual_tag: String,
    #[serde(rename = "namespace")]
    pub(crate) ns: String,
    #[serde(rename = "struct_namespace")]
    pub(crate) struct_ns: String,
    #[serde(skip)]
    pub(crate) field_len: usize,
    #[serde(skip)]
    pub(crate) struct_field_len: usize,
    pub(crate) value: Value,
    pub(crate) param: String,
    pub(crate) kind: Kind,
    #[serde(rename = "type")]
    pub(crate) type_name: &'static str,
    #[serde(skip)]
    pub(crate) cause: Option<Cause>,
}

impl FieldError {
    /// Rule name as written on the field.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Rule name after alias expansion.
    pub fn actual_tag(&self) -> &str {
        &self.actual_tag
    }

    /// Display path, e.g. `User.emails[1]` or `User.e_mails[1]` with a naming function.
    pub fn namespace(&self) -> &str {
        &self.ns
    }

    /// Structural path built from canonical field names.
    pub fn struct_namespace(&self) -> &str {
        &self.struct_ns
    }

    /// Last segment of [`namespace`](Self::namespace).
    pub fn field(&self) -> &str {
        &self.ns[self.ns.len() - self.field_len..]
    }

    /// Last segment of [`struct_namespace`](Self::struct_namespace).
    pub fn struct_field(&self) -> &str {
        &self.struct_ns[self.struct_ns.len() - self.struct_field_len..]
    }

    /// Snapshot of the offending value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation for '{}' failed on the '{}' tag",
            self.ns, self.tag
        )
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Every failure from one call, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Wraps a non-empty batch into `Err`.
    pub fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}
