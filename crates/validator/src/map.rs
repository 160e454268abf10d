//! Rule maps over JSON objects
//!
//! Validates untyped data without a record type: the rules are a JSON object
//! mirroring the data, with tag strings at the leaves.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::engine::Validator;
use crate::error::{Error, ValidationErrors};

static MISSING: JsonValue = JsonValue::Null;

/// Failures for one key of a validated object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapFailure {
    /// The value at this key failed its tag.
    Field(ValidationErrors),
    /// Failures inside a nested object, keyed the same way.
    Nested(BTreeMap<String, MapFailure>),
    /// The rules expect a nested object but the data has something else.
    NotAnObject,
}

impl Validator {
    /// Validates `data` against `rules`, a JSON object whose values are tag
    /// strings or nested rule objects. Keys missing from `data` are validated
    /// as null. Returns the failures by key; an empty map means valid.
    ///
    /// ```
    /// use nebula_structval::Validator;
    /// use serde_json::json;
    ///
    /// let rules = json!({ "name": "required", "address": { "zip": "numeric,len=5" } });
    /// let data = json!({ "name": "Ada", "address": { "zip": "12ab" } });
    ///
    /// let failures = Validator::new()
    ///     .validate_map(data.as_object().unwrap(), rules.as_object().unwrap())
    ///     .unwrap();
    /// assert!(failures.contains_key("address"));
    /// assert!(!failures.contains_key("name"));
    /// ```
    pub fn validate_map(
        &self,
        data: &Map<String, JsonValue>,
        rules: &Map<String, JsonValue>,
    ) -> Result<BTreeMap<String, MapFailure>, Error> {
        let mut failures = BTreeMap::new();

        for (key, rule) in rules {
            match rule {
                JsonValue::String(tag) => {
                    let value = data.get(key).unwrap_or(&MISSING);
                    match self.validate_field(key, value, tag) {
                        Ok(()) => {}
                        Err(Error::Validation(errors)) => {
                            failures.insert(key.clone(), MapFailure::Field(errors));
                        }
                        Err(err) => return Err(err),
                    }
                }
                JsonValue::Object(nested_rules) => match data.get(key) {
                    Some(JsonValue::Object(nested)) => {
                        let nested = self.validate_map(nested, nested_rules)?;
                        if !nested.is_empty() {
                            failures.insert(key.clone(), MapFailure::Nested(nested));
                        }
                    }
                    _ => {
                        failures.insert(key.clone(), MapFailure::NotAnObject);
                    }
                },
                _ => {
                    return Err(Error::InvalidArgument {
                        type_name: "serde_json::Value",
                        reason: "rule entries must be tag strings or objects, got",
                    });
                }
            }
        }

        Ok(failures)
    }
}
