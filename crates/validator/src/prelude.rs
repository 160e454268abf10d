//! Prelude module for convenient imports.
//!
//! `use nebula_structval::prelude::*;` brings in the engine, its error types
//! and the reflection traits needed to hand-implement [`Record`].

// ============================================================================
// ENGINE
// ============================================================================

pub use crate::{Validator, ValidatorBuilder, ValidatorConfig};

// ============================================================================
// ERRORS
// ============================================================================

pub use crate::{AbsentValue, Error, FieldError, MapFailure, RuleError, RuleResult, ValidationErrors};

// ============================================================================
// RULE CONTEXT
// ============================================================================

pub use crate::{FieldLevel, StructLevel};

// ============================================================================
// REFLECTION
// ============================================================================

pub use crate::value::{FieldInfo, Kind, Record, Reflect, Value, ValueRef};

#[cfg(feature = "derive")]
pub use crate::Validate;
