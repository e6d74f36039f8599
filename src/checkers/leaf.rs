//! Scalar checkers: numbers, strings, enums, and the pattern-backed formats.
//!
//! Every checker returns `Ok(CheckResult)` for routine outcomes; `Err` is
//! reserved for schema mistakes (e.g. an enum rule without values). Custom
//! message overrides resolve here, so `CheckResult::Invalid` always carries
//! the final message.

use super::patterns;
use crate::error::ConfigError;
use crate::registry::CheckResult;
use crate::rule::Rule;
use crate::validator::Context;
use serde_json::Value;

/// Build the failure for one sub-kind, honoring per-rule message overrides.
fn fail(ctx: &Context<'_>, rule: &Rule, kind: &str, template: &str, args: &[String]) -> CheckResult {
    match rule.message_for(kind) {
        Some(message) => CheckResult::Invalid(message.to_string()),
        None => CheckResult::Invalid(ctx.t(template, args)),
    }
}

/// Render a numeric bound the way it was written: integral bounds print
/// without a decimal point.
fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Render a value for message interpolation: strings unquoted, everything
/// else in JSON form.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn check_number(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let Some(n) = value.as_f64() else {
        return Ok(fail(ctx, rule, "type", "should be a number", &[]));
    };
    Ok(check_bounds(ctx, rule, n))
}

pub(crate) fn check_int(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let n = match value.as_f64() {
        Some(n) if n.fract() == 0.0 => n,
        _ => return Ok(fail(ctx, rule, "type", "should be an integer", &[])),
    };
    Ok(check_bounds(ctx, rule, n))
}

fn check_bounds(ctx: &Context<'_>, rule: &Rule, n: f64) -> CheckResult {
    if let Some(max) = rule.max {
        if n > max {
            return fail(ctx, rule, "max", "should smaller than %s", &[fmt_num(max)]);
        }
    }
    if let Some(min) = rule.min {
        if n < min {
            return fail(ctx, rule, "min", "should bigger than %s", &[fmt_num(min)]);
        }
    }
    CheckResult::Valid
}

pub(crate) fn check_boolean(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
) -> Result<CheckResult, ConfigError> {
    if value.is_boolean() {
        Ok(CheckResult::Valid)
    } else {
        Ok(fail(ctx, rule, "type", "should be a boolean", &[]))
    }
}

pub(crate) fn check_string(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    check_string_opts(ctx, rule, value, subject, None)
}

/// Shared body of the string checker. `format_default` replaces the generic
/// `should match %s` message for named formats like email.
fn check_string_opts(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
    format_default: Option<&str>,
) -> Result<CheckResult, ConfigError> {
    let Some(s) = value.as_str() else {
        return Ok(fail(ctx, rule, "type", "should be a string", &[]));
    };
    if s.is_empty() {
        if rule.allows_empty() {
            return Ok(CheckResult::Valid);
        }
        return Ok(fail(ctx, rule, "empty", "should not be empty", &[]));
    }
    let len = s.chars().count() as f64;
    if let Some(max) = rule.max {
        if len > max {
            return Ok(fail(
                ctx,
                rule,
                "max",
                "length should smaller than %s",
                &[fmt_num(max)],
            ));
        }
    }
    if let Some(min) = rule.min {
        if len < min {
            return Ok(fail(
                ctx,
                rule,
                "min",
                "length should bigger than %s",
                &[fmt_num(min)],
            ));
        }
    }
    if let Some(format) = &rule.format {
        if !format.is_match(s) {
            return Ok(match format_default {
                Some(template) => fail(ctx, rule, "format", template, &[]),
                None => fail(
                    ctx,
                    rule,
                    "format",
                    "should match %s",
                    &[format!("/{}/", format.as_str())],
                ),
            });
        }
    }
    Ok(CheckResult::Valid)
}

pub(crate) fn check_enum(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let values = match &rule.values {
        Some(values) if !values.is_empty() => values,
        _ => return Err(ConfigError::EnumValues),
    };
    if values.contains(value) {
        return Ok(CheckResult::Valid);
    }
    let joined = values
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(", ");
    Ok(fail(ctx, rule, "enum", "should be one of %s", &[joined]))
}

/// Derive the pattern-bound string rule shared by the named formats.
fn pattern_rule(rule: &Rule, pattern: &regex::Regex) -> Rule {
    Rule {
        kind: rule.kind.clone(),
        format: Some(pattern.clone()),
        allow_empty: Some(rule.allows_empty()),
        message: rule.message.clone(),
        ..Default::default()
    }
}

pub(crate) fn check_id(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let derived = pattern_rule(rule, patterns::id());
    check_string_opts(ctx, &derived, value, subject, None)
}

pub(crate) fn check_date(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let derived = pattern_rule(rule, patterns::date());
    check_string_opts(ctx, &derived, value, subject, None)
}

pub(crate) fn check_date_time(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let derived = pattern_rule(rule, patterns::date_time());
    check_string_opts(ctx, &derived, value, subject, None)
}

pub(crate) fn check_email(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let derived = pattern_rule(rule, patterns::email());
    check_string_opts(ctx, &derived, value, subject, Some("should be an email"))
}

pub(crate) fn check_url(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let derived = pattern_rule(rule, patterns::url());
    check_string_opts(ctx, &derived, value, subject, Some("should be a url"))
}

pub(crate) fn check_password(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let mut derived = pattern_rule(rule, patterns::password());
    derived.min = Some(rule.min.unwrap_or(6.0));
    derived.max = rule.max;
    let result = check_string_opts(ctx, &derived, value, subject, None)?;
    if !matches!(result, CheckResult::Valid) {
        return Ok(result);
    }
    if let Some(compare) = &rule.compare {
        if subject.get(compare) != Some(&*value) {
            return Ok(fail(
                ctx,
                rule,
                "compare",
                "should equal to %s",
                &[compare.clone()],
            ));
        }
    }
    Ok(CheckResult::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Schema;
    use crate::validator::Validator;
    use serde_json::json;

    fn first_message(validator: &Validator, schema: &Schema, data: &mut Value) -> String {
        validator
            .validate(schema, data)
            .unwrap()
            .expect("expected a violation")
            .remove(0)
            .message
    }

    #[test]
    fn number_bounds() {
        let validator = Validator::new();
        let schema = Schema::new().field("n", Rule::new("number").min(1.0).max(100.0));
        assert_eq!(validator.validate(&schema, &mut json!({"n": 50})).unwrap(), None);
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"n": 101})),
            "should smaller than 100"
        );
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"n": 0.5})),
            "should bigger than 1"
        );
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"n": "x"})),
            "should be a number"
        );
    }

    #[test]
    fn int_rejects_fractions() {
        let validator = Validator::new();
        let schema = Schema::new().field("n", "int");
        assert_eq!(validator.validate(&schema, &mut json!({"n": 7})).unwrap(), None);
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"n": 1.5})),
            "should be an integer"
        );
    }

    #[test]
    fn string_length_and_format() {
        let validator = Validator::new();
        let schema = Schema::new().field(
            "s",
            Rule::new("string")
                .min(2.0)
                .max(4.0)
                .format(regex::Regex::new(r"^\d+$").unwrap()),
        );
        assert_eq!(validator.validate(&schema, &mut json!({"s": "123"})).unwrap(), None);
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"s": "1"})),
            "length should bigger than 2"
        );
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"s": "12345"})),
            "length should smaller than 4"
        );
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"s": "abc"})),
            r"should match /^\d+$/"
        );
    }

    #[test]
    fn string_length_counts_chars_not_bytes() {
        let validator = Validator::new();
        let schema = Schema::new().field("s", Rule::new("string").max(3.0));
        assert_eq!(
            validator.validate(&schema, &mut json!({"s": "日本語"})).unwrap(),
            None
        );
    }

    #[test]
    fn enum_needs_values() {
        let validator = Validator::new();
        let schema = Schema::new().field("e", Rule::new("enum"));
        let err = validator.validate(&schema, &mut json!({"e": 1})).unwrap_err();
        assert_eq!(err.to_string(), "check enum need array type values");
    }

    #[test]
    fn enum_message_joins_values() {
        let validator = Validator::new();
        let schema = Schema::new().field("e", vec![json!(1), json!(2), json!("x")]);
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"e": 3})),
            "should be one of 1, 2, x"
        );
    }

    #[test]
    fn password_defaults_min_and_compares() {
        let validator = Validator::new();
        let schema = Schema::new().field(
            "re_password",
            Rule::new("password").compare("password"),
        );
        assert_eq!(
            first_message(
                &validator,
                &schema,
                &mut json!({"password": "123456", "re_password": "12345"})
            ),
            "length should bigger than 6"
        );
        assert_eq!(
            first_message(
                &validator,
                &schema,
                &mut json!({"password": "123456", "re_password": "123457"})
            ),
            "should equal to password"
        );
        assert_eq!(
            validator
                .validate(
                    &schema,
                    &mut json!({"password": "123456", "re_password": "123456"})
                )
                .unwrap(),
            None
        );
    }

    #[test]
    fn custom_message_overrides() {
        let validator = Validator::new();
        let schema = Schema::new().field("mail", Rule::new("email").with_message("bad email"));
        assert_eq!(
            first_message(&validator, &schema, &mut json!({"mail": "nope"})),
            "bad email"
        );
    }
}
