//! Custom rules, aliases, record callbacks, custom types and naming

use std::io;
use std::rc::Rc;
use std::sync::Arc;

use nebula_structval::{
    AbsentValue, Error, FieldInfo, Kind, Reflect, RuleError, Validate, Validator, Value, ValueRef,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{failures, summary};

// ============================================================================
// RULES
// ============================================================================

#[derive(Validate)]
struct Ticket {
    #[validate("even")]
    seat: i64,
    #[validate("divisible=5")]
    price: i64,
}

fn ticket_validator() -> Validator {
    let mut validator = Validator::new();
    validator
        .register_rule("even", |fl| matches!(fl.field(), ValueRef::Int(n) if n % 2 == 0))
        .unwrap();
    validator
        .register_rule_with(
            "divisible",
            |fl| {
                let by: i64 = fl.param_as()?;
                match fl.field() {
                    ValueRef::Int(n) if n % by == 0 => Ok(()),
                    ValueRef::Int(_) => Err(RuleError::failed()),
                    _ => Err(fl.type_error().into()),
                }
            },
            false,
        )
        .unwrap();
    validator
}

#[test]
fn custom_rules_run_like_builtins() {
    let validator = ticket_validator();
    assert!(validator.validate_struct(&Ticket { seat: 4, price: 25 }).is_ok());

    let errors = failures(validator.validate_struct(&Ticket { seat: 3, price: 12 }));
    assert_eq!(
        summary(&errors),
        vec![("Ticket.seat", "even"), ("Ticket.price", "divisible")]
    );
    assert_eq!(errors[1].param(), "5");
}

#[test]
fn custom_rule_errors_abort() {
    let validator = ticket_validator();
    let err = validator.validate_var(&10_i64, "divisible=zero").unwrap_err();
    assert!(matches!(err, Error::BadParam { ref tag, ref param } if tag == "divisible" && param == "zero"));

    let err = validator.validate_var(&"ten", "divisible=2").unwrap_err();
    assert!(matches!(err, Error::BadFieldType { ref tag, .. } if tag == "divisible"));
}

#[test]
fn failure_cause_is_exposed() {
    let mut validator = Validator::new();
    validator
        .register_rule_with(
            "not_blocked",
            |fl| match fl.field() {
                ValueRef::Str("root") => Err(RuleError::caused_by(io::Error::other("user is blocked"))),
                _ => Ok(()),
            },
            false,
        )
        .unwrap();

    let errors = failures(validator.validate_field("user", &"root", "not_blocked"));
    assert_eq!(errors[0].namespace(), "user");
    let cause = errors[0].cause().unwrap();
    assert_eq!(cause.to_string(), "user is blocked");
    assert!(cause.downcast_ref::<io::Error>().is_some());
}

#[derive(Validate)]
struct Preferences {
    #[validate("known_locale")]
    locale: Option<String>,
}

#[test]
fn absent_values_reach_only_opted_in_rules() {
    let known_locale = |fl: &nebula_structval::FieldLevel<'_>| match fl.field() {
        ValueRef::Pointer(None) => true,
        ValueRef::Str(locale) => ["en", "fr"].contains(&locale),
        _ => false,
    };

    let mut skipping = Validator::new();
    skipping.register_rule("known_locale", known_locale).unwrap();
    let errors = failures(skipping.validate_struct(&Preferences { locale: None }));
    let cause = errors[0].cause().unwrap();
    assert_eq!(cause.downcast_ref::<AbsentValue>(), Some(&AbsentValue::Nil));

    let mut calling = Validator::new();
    calling
        .register_rule_with(
            "known_locale",
            move |fl| {
                if known_locale(fl) {
                    Ok(())
                } else {
                    Err(RuleError::failed())
                }
            },
            true,
        )
        .unwrap();
    assert!(calling.validate_struct(&Preferences { locale: None }).is_ok());
    assert!(calling.validate_struct(&Preferences { locale: Some("de".into()) }).is_err());
}

#[rstest]
#[case::empty("")]
#[case::control_keyword("dive")]
#[case::omitempty("omitempty")]
#[case::restricted_dot("a.b")]
#[case::restricted_pipe("a|b")]
fn invalid_rule_names_are_rejected(#[case] name: &str) {
    let mut validator = Validator::new();
    let err = validator.register_rule(name, |_| true).unwrap_err();
    assert!(matches!(err, Error::Registration { .. }), "{name:?} gave {err:?}");
}

// ============================================================================
// ALIASES
// ============================================================================

#[derive(Validate)]
struct Voter {
    #[validate("adult")]
    age: u8,
}

#[test]
fn alias_failures_name_the_alias_and_the_rule() {
    let mut validator = Validator::new();
    validator.register_alias("adult", "required,gte=18").unwrap();

    assert!(validator.validate_struct(&Voter { age: 30 }).is_ok());

    let errors = failures(validator.validate_struct(&Voter { age: 10 }));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].tag(), "adult");
    assert_eq!(errors[0].actual_tag(), "gte");
    assert_eq!(errors[0].param(), "18");
}

#[test]
fn alias_cannot_shadow_a_rule() {
    let mut validator = Validator::new();
    let err = validator.register_alias("required", "gte=1").unwrap_err();
    assert!(matches!(err, Error::Registration { ref name, .. } if name == "required"));
}

#[test]
fn builtin_color_alias() {
    let validator = Validator::new();
    assert!(validator.validate_var(&"#fff", "iscolor").is_ok());
    assert!(validator.validate_var(&"hsl(120,50%,50%)", "iscolor").is_ok());

    let errors = failures(validator.validate_var(&"blue", "iscolor"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].tag(), "iscolor");
    assert_eq!(errors[0].actual_tag(), "hexcolor|rgb|rgba|hsl|hsla");
}

#[test]
fn or_group_reports_every_alternative() {
    let validator = Validator::new();
    assert!(validator.validate_var(&"rgb(0,0,0)", "rgb|rgba").is_ok());

    let errors = failures(validator.validate_var(&"not a color", "rgb|rgba"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].tag(), "rgb|rgba");

    let errors = failures(validator.validate_var(&"abc", "startswith=x|len=2"));
    assert_eq!(errors[0].tag(), "startswith=x|len=2");
}

fn nil_tolerant_validator() -> Validator {
    let mut validator = Validator::new();
    validator
        .register_rule_with(
            "nil_or_short",
            |fl| match fl.field() {
                ValueRef::Pointer(None) => Ok(()),
                ValueRef::Str(s) if s.len() < 3 => Ok(()),
                _ => Err(RuleError::failed()),
            },
            true,
        )
        .unwrap();
    validator
}

#[test]
fn absent_value_in_or_group_without_nil_aware_member() {
    let errors = failures(Validator::new().validate_var(&None::<String>, "hexcolor|rgb"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].tag(), "hexcolor|rgb");
    let cause = errors[0].cause().unwrap();
    assert_eq!(cause.downcast_ref::<AbsentValue>(), Some(&AbsentValue::Nil));
}

#[test]
fn absent_value_in_or_group_passes_through_nil_aware_member() {
    let validator = nil_tolerant_validator();
    assert!(validator.validate_var(&None::<String>, "hexcolor|nil_or_short").is_ok());
    assert!(validator.validate_var(&None::<String>, "nil_or_short|hexcolor").is_ok());
    assert!(validator.validate_var(&Some("#fff".to_owned()), "nil_or_short|hexcolor").is_ok());
}

#[test]
fn absent_value_fails_later_rules_without_aborting() {
    let validator = nil_tolerant_validator();
    let errors = failures(validator.validate_var(&None::<String>, "nil_or_short,email"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].tag(), "email");
    let cause = errors[0].cause().unwrap();
    assert_eq!(cause.downcast_ref::<AbsentValue>(), Some(&AbsentValue::Nil));
}

// ============================================================================
// RECORD CALLBACKS
// ============================================================================

#[derive(Validate)]
struct Range {
    low: u32,
    #[validate("gt=0")]
    high: u32,
}

#[derive(Validate)]
struct Container {
    range: Range,
}

#[derive(Validate)]
struct Holder {
    #[validate("required,nostructlevel")]
    range: Range,
}

fn range_validator() -> Validator {
    let mut validator = Validator::new();
    validator.register_struct_validation(|level, range: &Range| {
        if range.low > range.high {
            level.report_error(&range.low, "low", "", "ltefield", "high");
        }
    });
    validator
}

#[test]
fn record_callback_runs_after_fields() {
    let validator = range_validator();
    let errors = failures(validator.validate_struct(&Range { low: 5, high: 0 }));
    assert_eq!(summary(&errors), vec![("Range.high", "gt"), ("Range.low", "ltefield")]);
    assert_eq!(errors[1].value(), &Value::Uint(5));
    assert_eq!(errors[1].param(), "high");
}

#[test]
fn record_callback_failures_carry_nested_prefix() {
    let validator = range_validator();
    let errors = failures(validator.validate_struct(&Container {
        range: Range { low: 5, high: 0 },
    }));
    assert_eq!(
        summary(&errors),
        vec![("Container.range.high", "gt"), ("Container.range.low", "ltefield")]
    );
}

#[test]
fn nostructlevel_skips_nested_record_entirely() {
    let validator = range_validator();
    let holder = Holder {
        range: Range { low: 5, high: 0 },
    };
    assert!(validator.validate_struct(&holder).is_ok());
}

// ============================================================================
// CUSTOM TYPES
// ============================================================================

struct Cents(i64);

impl Reflect for Cents {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Invalid
    }
}

#[derive(Validate)]
struct Invoice {
    #[validate("gte=100")]
    total: Cents,
    #[validate("omitempty,lte=50")]
    discount: Option<Cents>,
}

#[test]
fn custom_types_validate_as_their_coerced_value() {
    let mut validator = Validator::new();
    validator.register_custom_type(|cents: &Cents| Value::Int(cents.0));

    let invoice = Invoice {
        total: Cents(250),
        discount: None,
    };
    assert!(validator.validate_struct(&invoice).is_ok());

    let invoice = Invoice {
        total: Cents(50),
        discount: Some(Cents(75)),
    };
    let errors = failures(validator.validate_struct(&invoice));
    assert_eq!(
        summary(&errors),
        vec![("Invoice.total", "gte"), ("Invoice.discount", "lte")]
    );
    assert_eq!(errors[0].value(), &Value::Int(50));
}

#[derive(Validate)]
struct Ledger {
    #[validate("gte=100")]
    boxed: Box<Cents>,
    #[validate("gte=100")]
    shared: Arc<Cents>,
    #[validate("omitempty,gte=100")]
    pending: Option<Rc<Cents>>,
}

#[test]
fn custom_types_behind_smart_pointers_are_coerced() {
    let mut validator = Validator::new();
    validator.register_custom_type(|cents: &Cents| Value::Int(cents.0));

    assert!(validator.validate_var(&Box::new(Cents(150)), "gte=100").is_ok());
    assert!(validator.validate_var(&Arc::new(Cents(150)), "gte=100").is_ok());
    assert!(validator.validate_var(&Some(Box::new(Cents(150))), "gte=100").is_ok());

    let ledger = Ledger {
        boxed: Box::new(Cents(20)),
        shared: Arc::new(Cents(300)),
        pending: Some(Rc::new(Cents(40))),
    };
    let errors = failures(validator.validate_struct(&ledger));
    assert_eq!(
        summary(&errors),
        vec![("Ledger.boxed", "gte"), ("Ledger.pending", "gte")]
    );
    assert_eq!(errors[0].value(), &Value::Int(20));
    assert_eq!(errors[0].kind(), Kind::Int);
}

struct Meters(u32);

impl Reflect for Meters {
    fn reflect(&self) -> ValueRef<'_> {
        ValueRef::Uint(u64::from(self.0))
    }
}

#[test]
fn rules_downcast_through_smart_pointers() {
    let mut validator = Validator::new();
    validator
        .register_rule("walkable", |fl| fl.downcast::<Meters>().is_some_and(|m| m.0 <= 5_000))
        .unwrap();

    assert!(validator.validate_var(&Meters(800), "walkable").is_ok());
    assert!(validator.validate_var(&Box::new(Meters(800)), "walkable").is_ok());
    assert!(validator.validate_var(&Some(Arc::new(Meters(800))), "walkable").is_ok());
    assert!(validator.validate_var(&Arc::new(Meters(9_000)), "walkable").is_err());
}

// ============================================================================
// NAMING AND TAG KEYS
// ============================================================================

#[derive(Validate)]
struct Profile {
    #[validate("required")]
    #[tag(json = "display_name,omitempty")]
    display: String,
    #[validate("required")]
    #[tag(json = "-")]
    bio: String,
}

#[test]
fn display_tag_names_the_display_namespace() {
    let validator = Validator::builder().display_tag("json").build();
    let errors = failures(validator.validate_struct(&Profile {
        display: String::new(),
        bio: String::new(),
    }));

    assert_eq!(errors[0].namespace(), "Profile.display_name");
    assert_eq!(errors[0].struct_namespace(), "Profile.display");
    assert_eq!(errors[0].field(), "display_name");
    assert_eq!(errors[0].struct_field(), "display");
    assert_eq!(errors[1].namespace(), "Profile.bio");
}

#[derive(Validate)]
struct Renamed {
    #[validate("required")]
    #[serde(rename = "userName")]
    user_name: String,
}

#[test]
fn naming_function_reads_any_tag() {
    let mut validator = Validator::new();
    validator.set_naming_function(|info: &FieldInfo| info.tag("serde").map(str::to_owned));

    let errors = failures(validator.validate_struct(&Renamed { user_name: String::new() }));
    assert_eq!(errors[0].namespace(), "Renamed.userName");
    assert_eq!(errors[0].struct_namespace(), "Renamed.user_name");
}

#[derive(Validate)]
struct Article {
    #[tag(rules = "required")]
    title: String,
    #[validate("required")]
    body: String,
}

#[test]
fn custom_tag_name_selects_rule_key() {
    let article = Article {
        title: String::new(),
        body: String::new(),
    };

    let errors = failures(Validator::builder().tag_name("rules").build().validate_struct(&article));
    assert_eq!(summary(&errors), vec![("Article.title", "required")]);

    let mut validator = Validator::new();
    let errors = failures(validator.validate_struct(&article));
    assert_eq!(summary(&errors), vec![("Article.body", "required")]);

    validator.set_tag_name("rules");
    let errors = failures(validator.validate_struct(&article));
    assert_eq!(summary(&errors), vec![("Article.title", "required")]);
}

#[test]
fn traced_calls_still_validate() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let validator = Validator::builder().trace_calls(true).build();
        assert!(validator.validate_var(&5, "gt=1").is_ok());
        assert!(validator.validate_var(&0, "gt=1").is_err());
    });
}
