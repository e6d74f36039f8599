//! The checker registry: type name to checker dispatch, plus default
//! coercions per type.

use crate::checkers::{composite, leaf};
use crate::convert::ConvertSpec;
use crate::error::{ConfigError, FieldError};
use crate::rule::Rule;
use crate::validator::Context;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of one checker invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    Valid,
    /// A single violation on the current field; the message is final (custom
    /// overrides already resolved).
    Invalid(String),
    /// Violations from a nested pass; the caller prefixes field paths.
    Nested(Vec<FieldError>),
}

/// A registered checker function.
///
/// Arguments: the validation context, the resolved rule, the field value
/// (mutable, after coercion), and the parent subject (for cross-field checks
/// like `compare`; `Value::Null` for array elements).
pub type Checker = Arc<
    dyn Fn(&Context<'_>, &Rule, &mut Value, &Value) -> Result<CheckResult, ConfigError>
        + Send
        + Sync,
>;

/// What `add_rule` accepts: a checker function, or a bare pattern that is
/// wrapped into a string-format check bound to it.
#[derive(Clone)]
pub enum RuleCheck {
    Func(Checker),
    Pattern(Regex),
}

impl RuleCheck {
    /// Wrap a closure as a checker.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Context<'_>, &Rule, &mut Value, &Value) -> Result<CheckResult, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        RuleCheck::Func(Arc::new(f))
    }

    pub(crate) fn run(
        &self,
        ctx: &Context<'_>,
        rule: &Rule,
        value: &mut Value,
        subject: &Value,
    ) -> Result<CheckResult, ConfigError> {
        match self {
            RuleCheck::Func(f) => f(ctx, rule, value, subject),
            RuleCheck::Pattern(pattern) => {
                // pattern rules check as a string constrained by the
                // registered pattern; the rule's own format is ignored
                let derived = Rule {
                    kind: rule.kind.clone(),
                    format: Some(pattern.clone()),
                    allow_empty: Some(rule.allows_empty()),
                    message: rule.message.clone(),
                    ..Default::default()
                };
                leaf::check_string(ctx, &derived, value, subject)
            }
        }
    }
}

impl fmt::Debug for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCheck::Func(_) => f.write_str("Func(..)"),
            RuleCheck::Pattern(p) => f.debug_tuple("Pattern").field(&p.as_str()).finish(),
        }
    }
}

impl From<Regex> for RuleCheck {
    fn from(pattern: Regex) -> Self {
        RuleCheck::Pattern(pattern)
    }
}

impl From<Checker> for RuleCheck {
    fn from(checker: Checker) -> Self {
        RuleCheck::Func(checker)
    }
}

/// Name → checker map with per-type default coercions.
///
/// `names` preserves registration order so the unknown-type error lists
/// types deterministically.
pub struct Registry {
    checkers: HashMap<String, RuleCheck>,
    converters: HashMap<String, ConvertSpec>,
    names: Vec<String>,
}

impl Registry {
    /// An empty registry with no checkers at all.
    pub fn empty() -> Self {
        Registry {
            checkers: HashMap::new(),
            converters: HashMap::new(),
            names: Vec::new(),
        }
    }

    /// The built-in type set.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::empty();
        let builtins: &[(&str, RuleCheck, Option<ConvertSpec>)] = &[
            ("number", RuleCheck::func(leaf::check_number), Some(ConvertSpec::Number)),
            ("int", RuleCheck::func(leaf::check_int), Some(ConvertSpec::Int)),
            ("integer", RuleCheck::func(leaf::check_int), Some(ConvertSpec::Int)),
            ("string", RuleCheck::func(leaf::check_string), Some(ConvertSpec::String)),
            ("id", RuleCheck::func(leaf::check_id), Some(ConvertSpec::String)),
            ("date", RuleCheck::func(leaf::check_date), Some(ConvertSpec::String)),
            ("dateTime", RuleCheck::func(leaf::check_date_time), Some(ConvertSpec::String)),
            ("datetime", RuleCheck::func(leaf::check_date_time), Some(ConvertSpec::String)),
            ("boolean", RuleCheck::func(leaf::check_boolean), Some(ConvertSpec::Boolean)),
            ("bool", RuleCheck::func(leaf::check_boolean), Some(ConvertSpec::Boolean)),
            ("array", RuleCheck::func(composite::check_array), None),
            ("object", RuleCheck::func(composite::check_object), None),
            ("enum", RuleCheck::func(leaf::check_enum), None),
            ("email", RuleCheck::func(leaf::check_email), None),
            ("password", RuleCheck::func(leaf::check_password), None),
            ("url", RuleCheck::func(leaf::check_url), None),
        ];
        for (name, check, convert) in builtins {
            registry
                .register(name, check.clone(), true, convert.clone())
                .unwrap();
        }
        registry
    }

    /// Register a checker under `name`.
    ///
    /// With `allow_override` off, a name collision is a [`ConfigError`].
    /// `convert` installs the type's default coercion, applied when the
    /// global convert option is on and the rule has no `convert_type`.
    pub fn register(
        &mut self,
        name: &str,
        check: RuleCheck,
        allow_override: bool,
        convert: Option<ConvertSpec>,
    ) -> Result<(), ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::TypeNameRequired);
        }
        if self.checkers.contains_key(name) {
            if !allow_override {
                return Err(ConfigError::RuleExists(name.to_string()));
            }
        } else {
            self.names.push(name.to_string());
        }
        tracing::debug!(rule = name, "registered checker");
        self.checkers.insert(name.to_string(), check);
        match convert {
            Some(spec) => {
                self.converters.insert(name.to_string(), spec);
            }
            None => {
                self.converters.remove(name);
            }
        }
        Ok(())
    }

    /// Look up the checker for a type name.
    pub(crate) fn checker(&self, name: &str) -> Result<&RuleCheck, ConfigError> {
        self.checkers.get(name).ok_or_else(|| ConfigError::UnknownType {
            known: self.names.join(", "),
            passed: name.to_string(),
        })
    }

    /// The default coercion registered for a type name, if any.
    pub(crate) fn default_convert(&self, name: &str) -> Option<&ConvertSpec> {
        self.converters.get(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::with_builtins()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("names", &self.names).finish()
    }
}
