//! Rules that compare a field with another one

use nebula_structval::{Error, Validate, Value};
use pretty_assertions::assert_eq;

use crate::common::{VALIDATOR, failures, summary};

#[derive(Validate)]
struct Window {
    start: i32,
    #[validate("gtfield=start")]
    end: i32,
}

#[test]
fn numeric_ordering_against_sibling() {
    assert!(VALIDATOR.validate_struct(&Window { start: 3, end: 5 }).is_ok());

    let errors = failures(VALIDATOR.validate_struct(&Window { start: 5, end: 3 }));
    assert_eq!(summary(&errors), vec![("Window.end", "gtfield")]);
    assert_eq!(errors[0].param(), "start");
    assert_eq!(errors[0].value(), &Value::Int(3));
}

#[derive(Validate)]
struct Names {
    short: String,
    #[validate("gtfield=short")]
    by_length: String,
    #[validate("gtcsfield=short")]
    by_content: String,
}

#[test]
fn strings_order_by_length_unless_case_sensitive() {
    let names = Names {
        short: "ab".into(),
        by_length: "z".into(),
        by_content: "z".into(),
    };
    let errors = failures(VALIDATOR.validate_struct(&names));
    assert_eq!(summary(&errors), vec![("Names.by_length", "gtfield")]);
}

#[derive(Validate)]
struct Credentials {
    #[validate("required")]
    password: String,
    #[validate("eqfield=password")]
    confirm: String,
    #[validate("nefield=password")]
    previous: String,
}

#[test]
fn equality_compares_content() {
    let ok = Credentials {
        password: "hunter2".into(),
        confirm: "hunter2".into(),
        previous: "hunter1".into(),
    };
    assert!(VALIDATOR.validate_struct(&ok).is_ok());

    let reused = Credentials {
        password: "hunter2".into(),
        confirm: "hunter3".into(),
        previous: "hunter2".into(),
    };
    let errors = failures(VALIDATOR.validate_struct(&reused));
    assert_eq!(
        summary(&errors),
        vec![("Credentials.confirm", "eqfield"), ("Credentials.previous", "nefield")]
    );
}

#[derive(Validate)]
struct Mismatched {
    count: u32,
    #[validate("eqfield=count")]
    label: String,
    #[validate("nefield=missing")]
    other: String,
}

#[test]
fn kind_mismatch_and_missing_target_only_satisfy_ne() {
    let value = Mismatched {
        count: 1,
        label: "1".into(),
        other: "x".into(),
    };
    let errors = failures(VALIDATOR.validate_struct(&value));
    assert_eq!(summary(&errors), vec![("Mismatched.label", "eqfield")]);
}

#[derive(Validate)]
struct Limits {
    inner: Bounds,
    #[validate("ltefield=inner.max")]
    requested: u64,
}

#[derive(Validate)]
struct Bounds {
    max: u64,
}

#[test]
fn param_path_reaches_into_nested_records() {
    let within = Limits {
        inner: Bounds { max: 10 },
        requested: 10,
    };
    assert!(VALIDATOR.validate_struct(&within).is_ok());

    let over = Limits {
        inner: Bounds { max: 10 },
        requested: 11,
    };
    let errors = failures(VALIDATOR.validate_struct(&over));
    assert_eq!(summary(&errors), vec![("Limits.requested", "ltefield")]);
}

#[derive(Validate)]
struct Slug {
    prefix: String,
    #[validate("fieldcontains=prefix,fieldexcludes=banned")]
    value: String,
    banned: String,
}

#[test]
fn containment_of_sibling_text() {
    let slug = Slug {
        prefix: "acme".into(),
        value: "acme-widgets".into(),
        banned: "x".into(),
    };
    assert!(VALIDATOR.validate_struct(&slug).is_ok());

    let slug = Slug {
        prefix: "acme".into(),
        value: "other-x".into(),
        banned: "x".into(),
    };
    let errors = failures(VALIDATOR.validate_struct(&slug));
    assert_eq!(
        summary(&errors),
        vec![("Slug.value", "fieldcontains"), ("Slug.value", "fieldexcludes")]
    );
}

// ============================================================================
// CONDITIONAL PRESENCE
// ============================================================================

#[derive(Validate)]
struct Shipping {
    method: String,
    #[validate("required_if=method courier")]
    address: Option<String>,
    #[validate("required_with=address")]
    phone: Option<String>,
    #[validate("excluded_with=address")]
    pickup_code: Option<String>,
}

#[test]
fn required_if_runs_on_absent_values() {
    let shipping = Shipping {
        method: "courier".into(),
        address: None,
        phone: None,
        pickup_code: None,
    };
    let errors = failures(VALIDATOR.validate_struct(&shipping));
    assert_eq!(summary(&errors), vec![("Shipping.address", "required_if")]);
    assert_eq!(errors[0].value(), &Value::Nil);
    assert!(errors[0].cause().is_none());
}

#[test]
fn present_address_requires_phone_and_excludes_pickup() {
    let shipping = Shipping {
        method: "courier".into(),
        address: Some("1 Main St".into()),
        phone: None,
        pickup_code: Some("X1".into()),
    };
    let errors = failures(VALIDATOR.validate_struct(&shipping));
    assert_eq!(
        summary(&errors),
        vec![("Shipping.phone", "required_with"), ("Shipping.pickup_code", "excluded_with")]
    );
}

#[test]
fn conditions_not_met_pass() {
    let shipping = Shipping {
        method: "pickup".into(),
        address: None,
        phone: None,
        pickup_code: Some("X1".into()),
    };
    assert!(VALIDATOR.validate_struct(&shipping).is_ok());
}

#[derive(Validate)]
struct OddPairs {
    #[validate("required_if=method")]
    address: String,
}

#[test]
fn unpaired_condition_is_bad_param() {
    let err = VALIDATOR
        .validate_struct(&OddPairs { address: String::new() })
        .unwrap_err();
    assert!(matches!(err, Error::BadParam { ref tag, .. } if tag == "required_if"));
}

// ============================================================================
// BARE VALUES
// ============================================================================

#[test]
fn var_with_value_compares_against_other() {
    assert!(VALIDATOR.validate_var_with_value(&"secret", &"secret", "eqfield").is_ok());
    assert!(VALIDATOR.validate_var_with_value(&"secret", &"secret", "nefield").is_err());
    assert!(VALIDATOR.validate_var_with_value(&7, &3, "gtfield").is_ok());

    let errors = failures(VALIDATOR.validate_var_with_value(&2, &3, "gtfield"));
    assert_eq!(errors[0].tag(), "gtfield");
    assert_eq!(errors[0].namespace(), "");
}
