//! Tag compiler
//!
//! Turns a rule string such as `omitempty,dive,keys,min=1,endkeys,required`
//! into an immutable [`Chain`] of [`RuleNode`]s.
//!
//! Grammar, per field:
//!
//! ```text
//! tag     := token (',' token)*
//! token   := control | orGroup
//! control := 'dive' | 'keys' | 'endkeys' | 'omitempty' | 'structonly'
//!          | 'nostructlevel' | 'isempty' | '-'
//! orGroup := rule ('|' rule)*
//! rule    := name ['=' param]
//! ```
//!
//! Inside a parameter, `0x2C` stands for `,` and `0x7C` for `|`.

use std::sync::Arc;

use tracing::debug;

use crate::error::TagError;
use crate::registry::{Registry, RuleEntry};

pub(crate) const TAG_SEPARATOR: char = ',';
pub(crate) const OR_SEPARATOR: char = '|';
pub(crate) const PARAM_SEPARATOR: char = '=';
pub(crate) const SKIP_FIELD: &str = "-";

const DIVE: &str = "dive";
const KEYS: &str = "keys";
const END_KEYS: &str = "endkeys";
const OMIT_EMPTY: &str = "omitempty";
const STRUCT_ONLY: &str = "structonly";
const NO_STRUCT_LEVEL: &str = "nostructlevel";
const IS_EMPTY: &str = "isempty";

const ESCAPED_COMMA: &str = "0x2C";
const ESCAPED_PIPE: &str = "0x7C";

pub(crate) fn is_control_keyword(name: &str) -> bool {
    matches!(
        name,
        DIVE | KEYS | END_KEYS | OMIT_EMPTY | STRUCT_ONLY | NO_STRUCT_LEVEL | SKIP_FIELD
    )
}

/// What a node does when the traversal reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Control {
    #[default]
    Rule,
    /// Member of an or-group; the last member has `block_end` set.
    Or,
    Dive,
    Keys,
    EndKeys,
    OmitEmpty,
    StructOnly,
    NoStructLevel,
    /// `isempty`: a plain rule that can also judge a whole nested record.
    IsEmpty,
}

#[derive(Debug, Clone)]
pub(crate) struct RuleNode {
    /// Rule name; empty for pure control nodes.
    pub(crate) tag: String,
    /// Name reported on failure: the alias used on the field, or the rule itself.
    pub(crate) alias: String,
    /// The full token an alias expanded to, reported for failed aliased or-groups.
    pub(crate) actual_alias: String,
    pub(crate) param: String,
    pub(crate) has_param: bool,
    pub(crate) has_alias: bool,
    pub(crate) control: Control,
    pub(crate) block_end: bool,
    pub(crate) keys: Option<Arc<Chain>>,
    pub(crate) rule: Option<RuleEntry>,
}

impl RuleNode {
    fn control(control: Control, alias: &str) -> Self {
        Self {
            tag: String::new(),
            alias: alias.to_owned(),
            actual_alias: String::new(),
            param: String::new(),
            has_param: false,
            has_alias: false,
            control,
            block_end: false,
            keys: None,
            rule: None,
        }
    }

    /// Whether the node's rule runs against nil and missing values.
    pub(crate) fn call_when_absent(&self) -> bool {
        self.rule.as_ref().is_some_and(|r| r.call_when_absent)
    }
}

/// A compiled tag string.
///
/// Chains are immutable and shared through `Arc` by every validation that
/// uses the same tag.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    pub(crate) nodes: Vec<RuleNode>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rule names in order, with control nodes shown by keyword.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| match node.control {
            Control::Dive => DIVE,
            Control::Keys => KEYS,
            Control::EndKeys => END_KEYS,
            Control::OmitEmpty => OMIT_EMPTY,
            Control::StructOnly => STRUCT_ONLY,
            Control::NoStructLevel => NO_STRUCT_LEVEL,
            Control::Rule | Control::Or | Control::IsEmpty => node.tag.as_str(),
        })
    }
}

/// Compiles `tag`; `field` only labels compile errors.
pub(crate) fn compile(registry: &Registry, tag: &str, field: &str) -> Result<Chain, TagError> {
    let mut nodes = Vec::new();
    parse_into(registry, tag, field, "", false, &mut nodes)?;
    debug!(tag, field, nodes = nodes.len(), "compiled tag");
    Ok(Chain { nodes })
}

fn parse_into(
    registry: &Registry,
    tag: &str,
    field: &str,
    alias: &str,
    has_alias: bool,
    out: &mut Vec<RuleNode>,
) -> Result<(), TagError> {
    let tokens: Vec<&str> = tag.split(TAG_SEPARATOR).collect();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        let display = if has_alias { alias } else { token };

        if let Some(expansion) = registry.alias(token) {
            parse_into(registry, expansion, field, token, true, out)?;
            i += 1;
            continue;
        }

        let previous = if i == 0 {
            None
        } else {
            out.last().map(|node| node.control)
        };

        match token {
            DIVE => out.push(RuleNode::control(Control::Dive, display)),
            KEYS => {
                if previous != Some(Control::Dive) {
                    return Err(TagError::KeysWithoutDive);
                }
                let start = i + 1;
                let end = tokens[start..]
                    .iter()
                    .position(|t| *t == END_KEYS)
                    .map(|offset| start + offset)
                    .ok_or_else(|| TagError::UnterminatedKeys {
                        field: field.to_owned(),
                    })?;

                let mut keys = Vec::new();
                parse_into(registry, &tokens[start..=end].join(","), field, "", false, &mut keys)?;

                let mut node = RuleNode::control(Control::Keys, display);
                node.keys = Some(Arc::new(Chain { nodes: keys }));
                out.push(node);
                i = end + 1;
                continue;
            }
            END_KEYS => {
                if i != tokens.len() - 1 {
                    return Err(TagError::EndKeysWithoutKeys);
                }
                out.push(RuleNode::control(Control::EndKeys, display));
                return Ok(());
            }
            OMIT_EMPTY => out.push(RuleNode::control(Control::OmitEmpty, display)),
            STRUCT_ONLY => out.push(RuleNode::control(Control::StructOnly, display)),
            NO_STRUCT_LEVEL => out.push(RuleNode::control(Control::NoStructLevel, display)),
            _ => parse_group(registry, token, field, alias, has_alias, out)?,
        }
        i += 1;
    }
    Ok(())
}

fn parse_group(
    registry: &Registry,
    token: &str,
    field: &str,
    alias: &str,
    has_alias: bool,
    out: &mut Vec<RuleNode>,
) -> Result<(), TagError> {
    let alternatives: Vec<&str> = token.split(OR_SEPARATOR).collect();
    let grouped = alternatives.len() > 1;

    for alternative in alternatives {
        let (name, param) = match alternative.split_once(PARAM_SEPARATOR) {
            Some((name, param)) => (name, Some(param)),
            None => (alternative, None),
        };
        if name.is_empty() {
            return Err(TagError::InvalidTag {
                field: field.to_owned(),
            });
        }
        let rule = registry
            .rule(name)
            .ok_or_else(|| TagError::UndefinedRule {
                rule: name.to_owned(),
                field: field.to_owned(),
            })?
            .clone();

        let control = if grouped {
            Control::Or
        } else if name == IS_EMPTY {
            Control::IsEmpty
        } else {
            Control::Rule
        };
        let (display, actual_alias) = if has_alias {
            (alias.to_owned(), token.to_owned())
        } else {
            (name.to_owned(), String::new())
        };

        out.push(RuleNode {
            tag: name.to_owned(),
            alias: display,
            actual_alias,
            param: param.map(unescape).unwrap_or_default(),
            has_param: param.is_some(),
            has_alias,
            control,
            block_end: false,
            keys: None,
            rule: Some(rule),
        });
    }

    if let Some(last) = out.last_mut() {
        last.block_end = true;
    }
    Ok(())
}

fn unescape(param: &str) -> String {
    param
        .replace(ESCAPED_COMMA, ",")
        .replace(ESCAPED_PIPE, "|")
}
