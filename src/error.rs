//! Violation records and configuration errors.
//!
//! The two error classes are deliberately disjoint: [`FieldError`] values are
//! the expected, routine outcome of checking untrusted input and are always
//! collected, never thrown. [`ConfigError`] indicates a broken schema or
//! registry setup and aborts the whole `validate` call.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single field validation error.
///
/// Serializes to the wire shape `{ "code": ..., "field": ..., "message": ... }`.
/// `field` is a dotted/bracketed path locating the failure within nested
/// structures (e.g. `children[0].name`); it is absent only on the root-level
/// rejection produced by the `validate_root` option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    /// The failure class: `missing_field` or `invalid` (after translation).
    pub code: String,
    /// Path of the offending field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Human-readable error message.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {}: {}", self.code, field, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// A programming mistake in the schema or registry setup.
///
/// Never included in the returned error list; `validate` halts with it
/// instead, so a broken schema cannot silently let untrusted input through.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A rule (or `item_type`) names a type with no registered checker.
    #[error("rule type must be one of {known}, but the following type was passed: {passed}")]
    UnknownType {
        /// Registered type names, in registration order.
        known: String,
        /// The unresolvable name.
        passed: String,
    },

    /// A rule was dispatched without a resolved type.
    #[error("rule type required")]
    TypeMissing,

    /// An enum rule with no (or empty) `values`.
    #[error("check enum need array type values")]
    EnumValues,

    /// `add_rule` called with an empty type name.
    #[error("`type` required")]
    TypeNameRequired,

    /// `add_rule` collision with overriding disallowed.
    #[error("rule `{0}` exists")]
    RuleExists(String),

    /// An object rule whose nested `rule` is not a field schema.
    #[error("object rule requires a nested field schema")]
    ObjectRuleShape,

    /// An array rule with a non-`object` item type whose nested `rule` is a
    /// field schema instead of an item rule.
    #[error("array rule requires an item rule, not a field schema")]
    ArrayRuleShape,

    /// Schema/data nesting deeper than `Options::max_depth`.
    #[error("schema nesting exceeds the depth limit of {limit}")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_serialization() {
        let error = FieldError::new("invalid", "name", "should be a string");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "invalid");
        assert_eq!(json["field"], "name");
        assert_eq!(json["message"], "should be a string");
    }

    #[test]
    fn root_error_omits_field() {
        let error = FieldError {
            code: "invalid".into(),
            field: None,
            message: "the validated value should be a object".into(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(!json.contains("field"));
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::UnknownType {
            known: "number, int".into(),
            passed: "int1".into(),
        };
        assert_eq!(
            err.to_string(),
            "rule type must be one of number, int, but the following type was passed: int1"
        );
        assert_eq!(
            ConfigError::RuleExists("string".into()).to_string(),
            "rule `string` exists"
        );
    }
}
