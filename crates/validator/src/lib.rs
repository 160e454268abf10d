//! # nebula-structval
//!
//! Declarative, tag-driven validation of structured values.
//!
//! Rules are written as compact tag strings (`"required,gte=18"`,
//! `"omitempty,dive,email"`, `"rgb|rgba|hexcolor"`) attached to record fields
//! or passed alongside a single value. Tags are compiled once per distinct
//! string and record layouts once per type; both caches are shared lock-free
//! by every thread validating through the same [`Validator`].
//!
//! ## Quick Start
//!
//! ```
//! use nebula_structval::{Validate, Validator};
//!
//! #[derive(Validate)]
//! struct Account {
//!     #[validate("required,alphanum,btwlen=3~20")]
//!     handle: String,
//!     #[validate("omitempty,dive,email")]
//!     contacts: Vec<String>,
//!     #[validate("eqfield=password")]
//!     confirm: String,
//!     #[validate("required")]
//!     password: String,
//! }
//!
//! let validator = Validator::new();
//! let account = Account {
//!     handle: "ada".into(),
//!     contacts: vec!["ada@example.com".into()],
//!     confirm: "hunter2".into(),
//!     password: "hunter2".into(),
//! };
//! validator.validate_struct(&account).unwrap();
//! ```
//!
//! Records that derive [`Validate`] carry their own field table; anything else
//! participates through [`Reflect`](value::Reflect), which the crate
//! implements for the standard scalars, strings, `Option`, `Box`, `Vec`,
//! slices, arrays, maps and `chrono::DateTime<Utc>`.
//!
//! ## Errors
//!
//! Validation returns `Err(Error::Validation(..))` holding one
//! [`FieldError`] per failing rule, in discovery order. Every other
//! [`Error`] variant is a usage mistake (unknown rule, malformed tag, rule
//! applied to a shape it cannot judge) and aborts the call.

// Re-exported so derive output can name `::nebula_structval` from inside this
// crate's own tests and doctests.
extern crate self as nebula_structval;

mod cache;
mod config;
mod engine;
mod error;
mod level;
mod map;
mod pool;
pub mod prelude;
mod registry;
mod resolve;
mod rules;
mod tag;
mod traverse;
pub mod value;

pub use config::{DEFAULT_POOL_CAPACITY, DEFAULT_TAG_NAME, ValidatorBuilder, ValidatorConfig};
pub use engine::{NamingFn, Validator};
pub use error::{AbsentValue, Cause, Error, FieldError, TagError, ValidationErrors};
pub use level::{FieldLevel, StructLevel};
pub use map::MapFailure;
pub use registry::{RuleError, RuleResult};
pub use resolve::Resolved;
pub use tag::Chain;
pub use value::{FieldInfo, Kind, MapKey, Mapping, Record, Reflect, Sequence, Value, ValueRef};

/// Derives [`Reflect`] and [`Record`] for a struct with named fields.
///
/// Field attributes:
///
/// - `#[validate("...")]` sets the rule tag under the default `validate` key
/// - `#[tag(key = "...")]` sets a tag under any other key (for a custom
///   [`ValidatorConfig::tag_name`] or a display tag)
/// - `#[serde(rename = "...")]` is recorded under the `serde` key
#[cfg(feature = "derive")]
pub use nebula_structval_macros::Validate;
