//! Validating a subset of a record's fields

use nebula_structval::Validate;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{VALIDATOR, failures, summary};

#[derive(Validate)]
struct Pair {
    #[validate("required")]
    a: String,
    #[validate("required")]
    b: String,
}

fn empty_pair() -> Pair {
    Pair {
        a: String::new(),
        b: String::new(),
    }
}

#[test]
fn partial_checks_only_listed_fields() {
    let errors = failures(VALIDATOR.validate_struct_partial(&empty_pair(), ["a"]));
    assert_eq!(summary(&errors), vec![("Pair.a", "required")]);
}

#[test]
fn except_skips_listed_fields() {
    let errors = failures(VALIDATOR.validate_struct_except(&empty_pair(), ["a"]));
    assert_eq!(summary(&errors), vec![("Pair.b", "required")]);
}

#[test]
fn partial_with_nothing_listed_checks_nothing() {
    let none: [&str; 0] = [];
    assert!(VALIDATOR.validate_struct_partial(&empty_pair(), none).is_ok());
}

#[derive(Validate)]
struct Location {
    #[validate("required")]
    city: String,
    #[validate("numeric,len=5")]
    zip: String,
}

#[derive(Validate)]
struct Person {
    #[validate("required")]
    name: String,
    location: Location,
    #[validate("dive")]
    previous: Vec<Location>,
}

fn invalid_person() -> Person {
    Person {
        name: String::new(),
        location: Location {
            city: String::new(),
            zip: "x".into(),
        },
        previous: vec![
            Location {
                city: "Paris".into(),
                zip: "75001".into(),
            },
            Location {
                city: String::new(),
                zip: "y".into(),
            },
        ],
    }
}

#[rstest]
#[case::nested_field(&["location.city"], &[("Person.location.city", "required")])]
#[case::whole_nested_record(
    &["location"],
    &[]
)]
#[case::indexed_element(
    &["previous[1].zip"],
    &[("Person.previous[1].zip", "numeric"), ("Person.previous[1].zip", "len")]
)]
#[case::several(
    &["name", "location.zip"],
    &[("Person.name", "required"), ("Person.location.zip", "numeric"), ("Person.location.zip", "len")]
)]
fn partial_paths(#[case] fields: &[&str], #[case] expected: &[(&str, &str)]) {
    let outcome = VALIDATOR.validate_struct_partial(&invalid_person(), fields.iter().copied());
    if expected.is_empty() {
        assert!(outcome.is_ok());
    } else {
        let errors = failures(outcome);
        assert_eq!(summary(&errors), expected.to_vec());
    }
}

#[test]
fn except_nested_field() {
    let errors = failures(VALIDATOR.validate_struct_except(&invalid_person(), ["location.zip", "previous"]));
    assert_eq!(
        summary(&errors),
        vec![("Person.name", "required"), ("Person.location.city", "required")]
    );
}

#[test]
fn except_everything_passes() {
    let outcome = VALIDATOR.validate_struct_except(&invalid_person(), ["name", "location", "previous"]);
    assert!(outcome.is_ok());
}

#[test]
fn filtered_skips_by_structural_path() {
    let errors = failures(
        VALIDATOR.validate_struct_filtered(&invalid_person(), |path| path.starts_with("Person.location")),
    );
    assert_eq!(
        summary(&errors),
        vec![
            ("Person.name", "required"),
            ("Person.previous[1].city", "required"),
            ("Person.previous[1].zip", "numeric"),
            ("Person.previous[1].zip", "len"),
        ]
    );
}
