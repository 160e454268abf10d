//! # Nebula Structval Macros
//!
//! Derive support for `nebula-structval`.
//!
//! | Macro | Description |
//! |-------|-------------|
//! | [`Validate`](derive@Validate) | Implements `Reflect` and `Record` with a static field table |
//!
//! ## Examples
//!
//! ```ignore
//! use nebula_structval::Validate;
//!
//! #[derive(Validate)]
//! pub struct Signup {
//!     #[validate("required,email")]
//!     email: String,
//!
//!     #[tag(label = "Age in years")]
//!     #[validate("gte=18")]
//!     age: u8,
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

extern crate proc_macro;

use proc_macro::TokenStream;

mod support;
mod validate;

/// Derive macro for the `Record` trait.
///
/// # Field attributes
///
/// - `#[validate("...")]` - Rule tag stored under the `validate` key
/// - `#[tag(key = "...", ...)]` - Arbitrary tags, e.g. a custom rule key or a
///   display-name key
/// - `#[serde(rename = "...")]` - Recorded under the `serde` key; every other
///   serde option is ignored
///
/// Generic type parameters are bounded by `Reflect`.
///
/// # Example
///
/// ```ignore
/// #[derive(Validate)]
/// struct Range {
///     #[validate("ltfield=high")]
///     low: i64,
///     high: i64,
/// }
/// ```
#[proc_macro_derive(Validate, attributes(validate, tag, serde))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    validate::derive(input)
}
