//! Composite checkers: object recursion and per-index array checking.

use crate::error::{ConfigError, FieldError};
use crate::registry::CheckResult;
use crate::rule::{Rule, SubRule};
use crate::validator::Context;
use serde_json::Value;

pub(crate) fn check_object(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
) -> Result<CheckResult, ConfigError> {
    if !value.is_object() {
        return Ok(invalid(ctx, rule, "type", "should be an object"));
    }
    match &rule.rule {
        None => Ok(CheckResult::Valid),
        Some(SubRule::Fields(schema)) => {
            let nested = ctx.nested()?;
            match nested.validate(schema, value)? {
                Some(errors) => Ok(CheckResult::Nested(errors)),
                None => Ok(CheckResult::Valid),
            }
        }
        Some(SubRule::Item(_)) => Err(ConfigError::ObjectRuleShape),
    }
}

pub(crate) fn check_array(
    ctx: &Context<'_>,
    rule: &Rule,
    value: &mut Value,
    _subject: &Value,
) -> Result<CheckResult, ConfigError> {
    let Some(items) = value.as_array_mut() else {
        return Ok(invalid(ctx, rule, "type", "should be an array"));
    };
    if let Some(max) = rule.max {
        if items.len() as f64 > max {
            return Ok(invalid_args(
                ctx,
                rule,
                "max",
                "length should smaller than %s",
                &[bound(max)],
            ));
        }
    }
    if let Some(min) = rule.min {
        if (items.len() as f64) < min {
            return Ok(invalid_args(
                ctx,
                rule,
                "min",
                "length should bigger than %s",
                &[bound(min)],
            ));
        }
    }
    let Some(item_type) = rule.item_type.as_deref() else {
        return Ok(CheckResult::Valid);
    };
    let checker = ctx.registry().checker(item_type)?;
    // object items reuse this whole rule so its nested field schema applies;
    // otherwise an explicit item rule wins over the bare item type
    let sub_rule = if item_type == "object" {
        rule.clone()
    } else {
        match &rule.rule {
            Some(SubRule::Item(input)) => input.normalize(),
            Some(SubRule::Fields(_)) => return Err(ConfigError::ArrayRuleShape),
            None => Rule {
                kind: Some(item_type.to_string()),
                allow_empty: rule.allow_empty,
                ..Default::default()
            },
        }
    };
    let nested = ctx.nested()?;
    let mut errors = Vec::new();
    for (i, item) in items.iter_mut().enumerate() {
        match checker.run(&nested, &sub_rule, item, &Value::Null)? {
            CheckResult::Valid => {}
            CheckResult::Invalid(message) => {
                errors.push(FieldError::new(ctx.t("invalid", &[]), format!("[{i}]"), message));
            }
            CheckResult::Nested(nested_errors) => {
                for mut error in nested_errors {
                    error.field = Some(match error.field.take() {
                        Some(sub) => format!("[{i}].{sub}"),
                        None => format!("[{i}]"),
                    });
                    errors.push(error);
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(CheckResult::Valid)
    } else {
        Ok(CheckResult::Nested(errors))
    }
}

fn bound(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn invalid(ctx: &Context<'_>, rule: &Rule, kind: &str, template: &str) -> CheckResult {
    invalid_args(ctx, rule, kind, template, &[])
}

fn invalid_args(
    ctx: &Context<'_>,
    rule: &Rule,
    kind: &str,
    template: &str,
    args: &[String],
) -> CheckResult {
    match rule.message_for(kind) {
        Some(message) => CheckResult::Invalid(message.to_string()),
        None => CheckResult::Invalid(ctx.t(template, args)),
    }
}

#[cfg(test)]
mod tests {
    use crate::rule::{Rule, Schema};
    use crate::validator::Validator;
    use serde_json::json;

    #[test]
    fn object_recursion_prefixes_fields() {
        let validator = Validator::new();
        let schema = Schema::new().field(
            "object",
            Rule::new("object").fields(
                Schema::new()
                    .field("name", "string")
                    .field("age", Rule::new("int").min(18.0)),
            ),
        );
        let mut data = json!({"object": {"name": "lucy", "age": 17}});
        let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("object.age"));
        assert_eq!(errors[0].message, "should bigger than 18");
    }

    #[test]
    fn array_of_objects_uses_bracket_paths() {
        let validator = Validator::new();
        let schema = Schema::new().field(
            "ids",
            Rule::new("array")
                .item_type("object")
                .fields(Schema::new().field("name", "string")),
        );
        let mut data = json!({"ids": [{"name": "a"}, {}]});
        let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("ids[1].name"));
        assert_eq!(errors[0].code, "missing_field");
    }

    #[test]
    fn array_length_bounds() {
        let validator = Validator::new();
        let schema = Schema::new().field("ids", Rule::new("array").min(1.0).max(2.0));
        let mut data = json!({"ids": []});
        let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
        assert_eq!(errors[0].message, "length should bigger than 1");
        let mut data = json!({"ids": [1, 2, 3]});
        let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
        assert_eq!(errors[0].message, "length should smaller than 2");
    }

    #[test]
    fn item_type_scalar() {
        let validator = Validator::new();
        let schema = Schema::new().field("ids", Rule::new("array").item_type("int"));
        let mut data = json!({"ids": [1, "x", 3]});
        let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("ids[1]"));
        assert_eq!(errors[0].message, "should be an integer");
        assert_eq!(errors[0].code, "invalid");
    }

    #[test]
    fn unknown_item_type_is_config_error() {
        let validator = Validator::new();
        let schema = Schema::new().field("ids", Rule::new("array").item_type("int1"));
        let err = validator.validate(&schema, &mut json!({"ids": [1]})).unwrap_err();
        assert!(err.to_string().contains("the following type was passed: int1"));
    }
}
