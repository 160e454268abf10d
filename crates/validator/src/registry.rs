//! Rule and alias tables
//!
//! The registry is filled before the engine serves traffic and is read-only
//! afterwards; the tag compiler only borrows it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Cause, Error};
use crate::level::FieldLevel;
use crate::tag;

/// Characters that can never appear in a rule or alias name.
pub(crate) const RESTRICTED_CHARS: &str = ".[],|=+()`~!@#$%^&*\\\"/?<>{}";

/// Outcome of a single rule invocation.
pub type RuleResult = Result<(), RuleError>;

/// Why a rule did not pass.
#[derive(Debug)]
pub enum RuleError {
    /// The value does not satisfy the rule. The cause, if any, is exposed on
    /// the resulting [`FieldError`](crate::FieldError).
    Failed(Option<Cause>),
    /// The rule cannot be evaluated at all; aborts the whole call.
    Fatal(Error),
}

impl RuleError {
    pub fn failed() -> Self {
        RuleError::Failed(None)
    }

    pub fn caused_by(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        RuleError::Failed(Some(Arc::new(cause)))
    }
}

impl From<Error> for RuleError {
    fn from(err: Error) -> Self {
        RuleError::Fatal(err)
    }
}

pub(crate) type RuleFn = Arc<dyn Fn(&FieldLevel<'_>) -> RuleResult + Send + Sync>;

/// Built-in predicates: `Ok(false)` is a failure, `Err` is fatal.
pub(crate) type Predicate = fn(&FieldLevel<'_>) -> Result<bool, Error>;

#[derive(Clone)]
pub(crate) struct RuleEntry {
    pub(crate) func: RuleFn,
    pub(crate) call_when_absent: bool,
}

impl RuleEntry {
    pub(crate) fn run(&self, fl: &FieldLevel<'_>) -> RuleResult {
        (self.func)(fl)
    }
}

impl fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEntry")
            .field("call_when_absent", &self.call_when_absent)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    rules: HashMap<String, RuleEntry>,
    aliases: HashMap<String, String>,
}

impl Registry {
    pub(crate) fn rule(&self, name: &str) -> Option<&RuleEntry> {
        self.rules.get(name)
    }

    pub(crate) fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub(crate) fn insert_rule(
        &mut self,
        name: &str,
        func: RuleFn,
        call_when_absent: bool,
    ) -> Result<(), Error> {
        check_name(name)?;
        self.rules.insert(
            name.to_owned(),
            RuleEntry {
                func,
                call_when_absent,
            },
        );
        Ok(())
    }

    pub(crate) fn insert_predicate(&mut self, name: &'static str, predicate: Predicate, call_when_absent: bool) {
        let func: RuleFn = Arc::new(move |fl: &FieldLevel<'_>| match predicate(fl) {
            Ok(true) => Ok(()),
            Ok(false) => Err(RuleError::failed()),
            Err(err) => Err(RuleError::Fatal(err)),
        });
        self.rules.insert(
            name.to_owned(),
            RuleEntry {
                func,
                call_when_absent,
            },
        );
    }

    pub(crate) fn insert_alias(&mut self, name: &str, expansion: &str) -> Result<(), Error> {
        check_name(name)?;
        if self.rules.contains_key(name) {
            return Err(Error::Registration {
                name: name.to_owned(),
                reason: "alias shadows a registered rule",
            });
        }
        self.aliases.insert(name.to_owned(), expansion.to_owned());
        Ok(())
    }

    /// Built-in aliases are known to be well formed.
    pub(crate) fn insert_builtin_alias(&mut self, name: &'static str, expansion: &'static str) {
        self.aliases.insert(name.to_owned(), expansion.to_owned());
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

fn check_name(name: &str) -> Result<(), Error> {
    let reason = if name.is_empty() {
        Some("name must not be empty")
    } else if tag::is_control_keyword(name) {
        Some("name is a reserved control keyword")
    } else if name.chars().any(|c| RESTRICTED_CHARS.contains(c)) {
        Some("name contains a restricted character")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::Registration {
            name: name.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}
