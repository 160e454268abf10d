use std::sync::LazyLock;

use nebula_structval::{Error, FieldError, Validator};

/// Engine with the default configuration, shared by tests that register nothing.
pub static VALIDATOR: LazyLock<Validator> = LazyLock::new(Validator::new);

/// Unwraps the failure batch of a call that must fail on data.
#[track_caller]
pub fn failures(result: Result<(), Error>) -> Vec<FieldError> {
    match result {
        Err(Error::Validation(errors)) => errors.into_iter().collect(),
        Err(other) => panic!("expected validation failures, got usage error: {other}"),
        Ok(()) => panic!("expected validation failures, got success"),
    }
}

/// `(struct namespace, tag)` pairs, in discovery order.
pub fn summary(errors: &[FieldError]) -> Vec<(&str, &str)> {
    errors
        .iter()
        .map(|err| (err.struct_namespace(), err.tag()))
        .collect()
}
