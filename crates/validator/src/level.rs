//! Views handed to rules and struct-level callbacks

use std::str::FromStr;
use std::sync::Arc;

use crate::engine::Validator;
use crate::error::{Error, FieldError, ValidationErrors};
use crate::resolve::{self, Resolved};
use crate::value::{Kind, Reflect, ValueRef};

// ============================================================================
// FIELD LEVEL
// ============================================================================

/// Everything a rule can see while judging one value.
pub struct FieldLevel<'a> {
    pub(crate) validator: &'a Validator,
    pub(crate) top: &'a dyn Reflect,
    pub(crate) parent: &'a dyn Reflect,
    pub(crate) field: ValueRef<'a>,
    pub(crate) raw: &'a dyn Reflect,
    pub(crate) is_pointer: bool,
    pub(crate) field_name: &'a str,
    pub(crate) struct_field_name: &'a str,
    pub(crate) tag: &'a str,
    pub(crate) param: &'a str,
}

impl<'a> FieldLevel<'a> {
    pub fn validator(&self) -> &'a Validator {
        self.validator
    }

    /// The value the whole call started from.
    pub fn top(&self) -> &'a dyn Reflect {
        self.top
    }

    /// The record holding the field (or the comparison value for
    /// [`Validator::validate_var_with_value`]).
    pub fn parent(&self) -> &'a dyn Reflect {
        self.parent
    }

    /// Shape of the field, with pointers already followed.
    pub fn field(&self) -> ValueRef<'a> {
        self.field
    }

    /// The concrete value behind [`field`](Self::field).
    pub fn value(&self) -> &'a dyn Reflect {
        self.raw
    }

    pub fn downcast<T: Reflect>(&self) -> Option<&'a T> {
        self.raw.downcast_ref::<T>()
    }

    /// Whether the field was reached through an `Option`.
    pub fn is_pointer(&self) -> bool {
        self.is_pointer
    }

    /// Display name of the field.
    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    /// Canonical name of the field.
    pub fn struct_field_name(&self) -> &'a str {
        self.struct_field_name
    }

    /// Name of the rule being run.
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn param(&self) -> &'a str {
        self.param
    }

    /// Parses the parameter, failing the whole call on malformed input.
    pub fn param_as<T: FromStr>(&self) -> Result<T, Error> {
        self.param.trim().parse().map_err(|_| self.param_error())
    }

    /// Resolves the parameter as a path relative to [`parent`](Self::parent),
    /// e.g. `Start` or `Inner.Items[2]`.
    pub fn resolve_param(&self) -> Result<Option<Resolved<'a>>, Error> {
        self.resolve_from(self.parent, self.param)
    }

    /// Resolves `namespace` relative to `base`. `Ok(None)` means the path led
    /// to a nil pointer, a missing entry or an out-of-range index.
    pub fn resolve_from(
        &self,
        base: &'a dyn Reflect,
        namespace: &str,
    ) -> Result<Option<Resolved<'a>>, Error> {
        resolve::resolve(self.validator, base, namespace)
    }

    /// Fatal error for a field shape this rule cannot judge.
    pub fn type_error(&self) -> Error {
        Error::bad_field_type(self.tag, self.raw.type_name())
    }

    pub fn param_error(&self) -> Error {
        Error::bad_param(self.tag, self.param)
    }
}

// ============================================================================
// STRUCT LEVEL
// ============================================================================

/// View handed to whole-record callbacks, run after the record's fields.
///
/// Reported failures are prefixed with the record's current namespaces.
pub struct StructLevel<'a> {
    pub(crate) validator: &'a Validator,
    pub(crate) top: &'a dyn Reflect,
    pub(crate) parent: &'a dyn Reflect,
    pub(crate) current: &'a dyn Reflect,
    pub(crate) ns: &'a str,
    pub(crate) struct_ns: &'a str,
    pub(crate) errors: &'a mut Vec<FieldError>,
}

impl<'a> StructLevel<'a> {
    pub fn validator(&self) -> &'a Validator {
        self.validator
    }

    pub fn top(&self) -> &'a dyn Reflect {
        self.top
    }

    pub fn parent(&self) -> &'a dyn Reflect {
        self.parent
    }

    /// The record being validated.
    pub fn current(&self) -> &'a dyn Reflect {
        self.current
    }

    /// Adds a failure for `value`.
    ///
    /// An empty `struct_field_name` defaults to `field_name`.
    pub fn report_error(
        &mut self,
        value: &dyn Reflect,
        field_name: &str,
        struct_field_name: &str,
        tag: &str,
        param: &str,
    ) {
        self.push(value, [field_name, struct_field_name], tag, param, None);
    }

    /// Like [`report_error`](Self::report_error), attaching an underlying cause.
    pub fn report_error_with_cause(
        &mut self,
        value: &dyn Reflect,
        field_name: &str,
        struct_field_name: &str,
        tag: &str,
        param: &str,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) {
        self.push(
            value,
            [field_name, struct_field_name],
            tag,
            param,
            Some(Arc::new(cause)),
        );
    }

    /// Merges failures from a nested validation, prefixing their namespaces
    /// with the current ones plus the given relative parts.
    pub fn report_validation_errors(
        &mut self,
        relative_ns: &str,
        relative_struct_ns: &str,
        errors: ValidationErrors,
    ) {
        for mut err in errors {
            err.ns = format!("{}{relative_ns}{}", self.ns, err.ns);
            err.struct_ns = format!("{}{relative_struct_ns}{}", self.struct_ns, err.struct_ns);
            self.errors.push(err);
        }
    }

    fn push(
        &mut self,
        value: &dyn Reflect,
        [field_name, struct_field_name]: [&str; 2],
        tag: &str,
        param: &str,
        cause: Option<crate::error::Cause>,
    ) {
        let struct_field_name = if struct_field_name.is_empty() {
            field_name
        } else {
            struct_field_name
        };
        let (shape, raw, _) = value.reflect().resolve_pointers(value);
        let type_name = if shape.kind() == Kind::Invalid {
            ""
        } else {
            raw.type_name()
        };

        self.errors.push(FieldError {
            tag: tag.to_owned(),
            actual_tag: tag.to_owned(),
            ns: format!("{}{field_name}", self.ns),
            struct_ns: format!("{}{struct_field_name}", self.struct_ns),
            field_len: field_name.len(),
            struct_field_len: struct_field_name.len(),
            value: shape.to_value(),
            param: param.to_owned(),
            kind: shape.kind(),
            type_name,
            cause,
        });
    }
}
