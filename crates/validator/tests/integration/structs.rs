//! Whole-record validation: nesting, pointers, controls and failure details

use chrono::{DateTime, Utc};
use nebula_structval::{AbsentValue, Error, Kind, Validate, Validator, Value};
use pretty_assertions::assert_eq;

use crate::common::{VALIDATOR, failures, summary};

#[derive(Validate)]
struct Address {
    #[validate("required")]
    city: String,
    #[validate("numeric,len=5")]
    zip: String,
}

#[derive(Validate)]
struct User {
    #[validate("required")]
    name: String,
    #[validate("gte=18")]
    age: u32,
    address: Address,
    #[validate("omitempty,email")]
    email: Option<String>,
    #[validate("required")]
    nickname: Option<String>,
}

fn valid_user() -> User {
    User {
        name: "Ada".into(),
        age: 36,
        address: Address {
            city: "London".into(),
            zip: "10115".into(),
        },
        email: None,
        nickname: Some("countess".into()),
    }
}

fn invalid_user() -> User {
    User {
        name: String::new(),
        age: 10,
        address: Address {
            city: String::new(),
            zip: "12abc".into(),
        },
        email: Some("bad".into()),
        nickname: None,
    }
}

#[test]
fn valid_record_passes() {
    assert!(VALIDATOR.validate_struct(&valid_user()).is_ok());
}

#[test]
fn failures_are_collected_in_field_order() {
    let errors = failures(VALIDATOR.validate_struct(&invalid_user()));
    assert_eq!(
        summary(&errors),
        vec![
            ("User.name", "required"),
            ("User.age", "gte"),
            ("User.address.city", "required"),
            ("User.address.zip", "numeric"),
            ("User.email", "email"),
            ("User.nickname", "required"),
        ]
    );
}

#[test]
fn failure_carries_value_param_and_kind() {
    let errors = failures(VALIDATOR.validate_struct(&invalid_user()));
    let age = &errors[1];

    assert_eq!(age.namespace(), "User.age");
    assert_eq!(age.field(), "age");
    assert_eq!(age.struct_field(), "age");
    assert_eq!(age.actual_tag(), "gte");
    assert_eq!(age.param(), "18");
    assert_eq!(age.value(), &Value::Uint(10));
    assert_eq!(age.kind(), Kind::Uint);
    assert_eq!(age.type_name(), "u32");
    assert!(age.cause().is_none());
}

#[test]
fn nil_pointer_fails_with_absent_cause() {
    let errors = failures(VALIDATOR.validate_struct(&invalid_user()));
    let nickname = errors.last().unwrap();

    assert_eq!(nickname.value(), &Value::Nil);
    assert_eq!(nickname.kind(), Kind::Pointer);
    let cause = nickname.cause().unwrap();
    assert_eq!(cause.downcast_ref::<AbsentValue>(), Some(&AbsentValue::Nil));
}

#[test]
fn rendered_failures() {
    let err = VALIDATOR.validate_struct(&invalid_user()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r"
    validation for 'User.name' failed on the 'required' tag
    validation for 'User.age' failed on the 'gte' tag
    validation for 'User.address.city' failed on the 'required' tag
    validation for 'User.address.zip' failed on the 'numeric' tag
    validation for 'User.email' failed on the 'email' tag
    validation for 'User.nickname' failed on the 'required' tag
    ");
}

#[test]
fn validating_twice_gives_identical_batches() {
    let user = invalid_user();
    let first = serde_json::to_value(VALIDATOR.validate_struct(&user).unwrap_err().validation_errors()).unwrap();
    let second = serde_json::to_value(VALIDATOR.validate_struct(&user).unwrap_err().validation_errors()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn root_behind_option_is_followed() {
    let user = Some(invalid_user());
    let errors = failures(VALIDATOR.validate_struct(&user));
    assert_eq!(errors[0].namespace(), "User.name");
}

#[test]
fn non_record_root_is_usage_error() {
    let err = VALIDATOR.validate_struct(&vec![1, 2, 3]).unwrap_err();
    assert!(!err.is_validation());
    assert!(matches!(err, Error::InvalidArgument { reason: "non-record", .. }));
}

// ============================================================================
// OMITEMPTY ON POINTERS
// ============================================================================

#[derive(Validate)]
struct Counter {
    #[validate("omitempty,gte=2")]
    count: Option<i32>,
}

#[test]
fn omitempty_skips_nil_pointer() {
    assert!(VALIDATOR.validate_struct(&Counter { count: None }).is_ok());
}

#[test]
fn omitempty_checks_present_pointer() {
    let errors = failures(VALIDATOR.validate_struct(&Counter { count: Some(1) }));
    assert_eq!(summary(&errors), vec![("Counter.count", "gte")]);
    assert_eq!(errors[0].value(), &Value::Int(1));
}

// ============================================================================
// NESTED RECORD CONTROLS
// ============================================================================

#[derive(Validate)]
struct Inner {
    #[validate("required")]
    code: String,
}

#[derive(Validate)]
struct Outer {
    #[validate("required,structonly")]
    inner: Inner,
    #[validate("required")]
    label: String,
}

#[test]
fn structonly_skips_nested_fields() {
    let outer = Outer {
        inner: Inner { code: String::new() },
        label: String::new(),
    };
    let errors = failures(VALIDATOR.validate_struct(&outer));
    assert_eq!(summary(&errors), vec![("Outer.label", "required")]);
}

#[derive(Validate)]
struct Boxed {
    inner: Box<Inner>,
}

#[test]
fn box_is_transparent() {
    let errors = failures(VALIDATOR.validate_struct(&Boxed {
        inner: Box::new(Inner { code: String::new() }),
    }));
    assert_eq!(summary(&errors), vec![("Boxed.inner.code", "required")]);
}

#[derive(Validate)]
struct Wrapper<T> {
    #[validate("required")]
    value: T,
}

#[test]
fn generic_records_validate_their_parameter() {
    let errors = failures(VALIDATOR.validate_struct(&Wrapper { value: String::new() }));
    assert_eq!(summary(&errors), vec![("Wrapper.value", "required")]);
    assert!(VALIDATOR.validate_struct(&Wrapper { value: 3_u8 }).is_ok());
}

#[derive(Validate)]
struct Hidden {
    #[validate("-")]
    secret: String,
    #[validate("required")]
    shown: String,
}

#[test]
fn skip_tag_hides_field() {
    let errors = failures(VALIDATOR.validate_struct(&Hidden {
        secret: String::new(),
        shown: String::new(),
    }));
    assert_eq!(summary(&errors), vec![("Hidden.shown", "required")]);
}

// ============================================================================
// TIME
// ============================================================================

#[derive(Validate)]
struct Booking {
    #[validate("gt")]
    starts_at: DateTime<Utc>,
    #[validate("lt=2030-01-01T00:00:00Z")]
    ends_at: DateTime<Utc>,
}

#[test]
fn times_compare_against_now_or_param() {
    let booking = Booking {
        starts_at: "2000-01-01T00:00:00Z".parse().unwrap(),
        ends_at: "2031-06-01T12:00:00Z".parse().unwrap(),
    };
    let errors = failures(VALIDATOR.validate_struct(&booking));
    assert_eq!(
        summary(&errors),
        vec![("Booking.starts_at", "gt"), ("Booking.ends_at", "lt")]
    );
    assert_eq!(errors[0].kind(), Kind::Time);
}

// ============================================================================
// USAGE ERRORS
// ============================================================================

#[derive(Validate)]
struct Misconfigured {
    #[validate("dive,required")]
    count: i32,
}

#[test]
fn dive_on_scalar_aborts() {
    let err = Validator::new().validate_struct(&Misconfigured { count: 1 }).unwrap_err();
    assert!(matches!(err, Error::BadDive { ref field, kind: Kind::Int } if field == "Misconfigured.count"));
}

#[derive(Validate)]
struct KeyedList {
    #[validate("dive,keys,alpha,endkeys,required")]
    items: Vec<String>,
}

#[test]
fn keys_on_sequence_aborts() {
    let list = KeyedList {
        items: vec!["123".into(), String::new()],
    };
    let err = Validator::new().validate_struct(&list).unwrap_err();
    assert!(matches!(err, Error::KeysOnNonMap { ref field, kind: Kind::Seq } if field == "KeyedList.items"));

    let empty = KeyedList { items: Vec::new() };
    assert!(matches!(
        Validator::new().validate_struct(&empty),
        Err(Error::KeysOnNonMap { .. })
    ));
}

#[derive(Validate)]
struct UnknownRule {
    #[validate("required,shiny")]
    name: String,
}

#[test]
fn unknown_rule_aborts_before_data_is_checked() {
    let err = Validator::new()
        .validate_struct(&UnknownRule { name: String::new() })
        .unwrap_err();
    let Error::Tag(tag_err) = err else {
        panic!("expected a tag error, got {err:?}");
    };
    assert_eq!(
        tag_err,
        nebula_structval::TagError::UndefinedRule {
            rule: "shiny".into(),
            field: "name".into(),
        }
    );
}
