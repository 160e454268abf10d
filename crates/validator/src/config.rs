//! Engine configuration and builder

use serde::{Deserialize, Serialize};

use crate::engine::Validator;

/// Default field attribute key holding rule tags.
pub const DEFAULT_TAG_NAME: &str = "validate";

/// Default number of idle per-call scratch buffers kept for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 32;

/// Settings fixed when a [`Validator`] is built.
///
/// Can be loaded from any serde source; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Field attribute key the rules are read from.
    pub tag_name: String,

    /// Field attribute key used for display names (e.g. `"json"`). The first
    /// comma-separated segment is used; `-` keeps the canonical name.
    pub display_tag: Option<String>,

    /// Maximum idle scratch buffers kept between calls.
    pub pool_capacity: usize,

    /// Emit a `trace` event for every validation call.
    pub trace_calls: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG_NAME.to_owned(),
            display_tag: None,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            trace_calls: false,
        }
    }
}

/// Builder for a [`Validator`].
///
/// ```
/// use nebula_structval::Validator;
///
/// let validator = Validator::builder()
///     .tag_name("check")
///     .display_tag("json")
///     .build();
/// assert_eq!(validator.tag_name(), "check");
/// ```
#[derive(Debug, Clone)]
#[must_use = "builder does nothing until .build() is called"]
pub struct ValidatorBuilder {
    config: ValidatorConfig,
    baked_in: bool,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self {
            config: ValidatorConfig::default(),
            baked_in: true,
        }
    }
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.config.tag_name = tag_name.into();
        self
    }

    pub fn display_tag(mut self, display_tag: impl Into<String>) -> Self {
        self.config.display_tag = Some(display_tag.into());
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    pub fn trace_calls(mut self, enabled: bool) -> Self {
        self.config.trace_calls = enabled;
        self
    }

    /// Starts from an empty rule table instead of the built-in catalog.
    pub fn without_baked_in(mut self) -> Self {
        self.baked_in = false;
        self
    }

    pub fn build(self) -> Validator {
        Validator::assemble(self.config, self.baked_in)
    }
}
