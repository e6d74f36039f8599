//! The validator: options, translation, and the per-key engine loop.

use crate::convert::{self, ConvertSpec};
use crate::error::{ConfigError, FieldError};
use crate::registry::{Registry, RuleCheck};
use crate::rule::{Rule, Schema};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Message translation hook: receives the raw template (e.g.
/// `"should smaller than %s"`) and its arguments. Codes (`missing_field`,
/// `invalid`) pass through as zero-argument templates.
pub type TranslateFn = dyn Fn(&str, &[String]) -> String + Send + Sync;

/// Construction-time configuration for a [`Validator`].
#[derive(Clone)]
pub struct Options {
    /// Message translation hook; the default substitutes each `%s` in order.
    pub translate: Option<Arc<TranslateFn>>,
    /// Reject non-object top-level data with a single root record instead of
    /// reporting every schema key missing.
    pub validate_root: bool,
    /// Apply each type's default coercion to present primitive values.
    pub convert: bool,
    /// Treat `""` as absent (rewritten to `null` in the subject).
    pub widely_undefined: bool,
    /// Recursion guard for nested schemas and array items.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            translate: None,
            validate_root: false,
            convert: false,
            widely_undefined: false,
            max_depth: 64,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("translate", &self.translate.as_ref().map(|_| ".."))
            .field("validate_root", &self.validate_root)
            .field("convert", &self.convert)
            .field("widely_undefined", &self.widely_undefined)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// A schema interpreter over `serde_json::Value` subjects.
///
/// Holds the options and the checker registry; `validate` itself is a pure
/// tree walk, safe to call concurrently from multiple threads.
#[derive(Debug)]
pub struct Validator {
    options: Options,
    registry: Registry,
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new()
    }
}

impl Validator {
    /// A validator with default options and the built-in type set.
    pub fn new() -> Self {
        Validator::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Validator {
            options,
            registry: Registry::with_builtins(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a custom type. Accepts a checker function or a bare `Regex`
    /// (wrapped into a string-format check). Overrides built-ins silently;
    /// use [`Validator::add_rule_with`] to forbid that or to attach a
    /// default coercion.
    pub fn add_rule(&mut self, name: &str, check: impl Into<RuleCheck>) -> Result<(), ConfigError> {
        self.registry.register(name, check.into(), true, None)
    }

    pub fn add_rule_with(
        &mut self,
        name: &str,
        check: RuleCheck,
        allow_override: bool,
        convert: Option<ConvertSpec>,
    ) -> Result<(), ConfigError> {
        self.registry.register(name, check, allow_override, convert)
    }

    /// Check `data` against `schema`, mutating `data` in place (trim,
    /// widely-undefined rewrites, defaults, coercion).
    ///
    /// `Ok(None)` means valid; `Ok(Some(errors))` carries a non-empty
    /// violation list; `Err` means the schema or registry itself is broken
    /// and nothing can be said about the data.
    pub fn validate(
        &self,
        schema: &Schema,
        data: &mut Value,
    ) -> Result<Option<Vec<FieldError>>, ConfigError> {
        tracing::trace!(fields = schema.len(), "validate");
        if self.options.validate_root && !data.is_object() {
            return Ok(Some(vec![FieldError {
                code: self.t("invalid", &[]),
                field: None,
                message: self.t("the validated value should be a object", &[]),
            }]));
        }
        Context::root(self).validate(schema, data)
    }

    pub(crate) fn t(&self, template: &str, args: &[String]) -> String {
        match &self.options.translate {
            Some(translate) => translate(template, args),
            None => interpolate(template, args),
        }
    }
}

/// Substitute each `%s` in order; surplus placeholders stay verbatim.
fn interpolate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut args = args.iter();
    while let Some(pos) = rest.find("%s") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("%s"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// State threaded through one `validate` call: the owning validator plus the
/// current recursion depth. Composite and custom checkers recurse through
/// [`Context::validate`] so the depth guard sees every level.
pub struct Context<'a> {
    validator: &'a Validator,
    depth: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn root(validator: &'a Validator) -> Self {
        Context {
            validator,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.validator.registry
    }

    pub fn options(&self) -> &Options {
        &self.validator.options
    }

    /// Translate a message template through the configured hook.
    pub fn t(&self, template: &str, args: &[String]) -> String {
        self.validator.t(template, args)
    }

    /// One level deeper; fails once `max_depth` is exceeded.
    pub fn nested(&self) -> Result<Context<'a>, ConfigError> {
        let depth = self.depth + 1;
        let limit = self.validator.options.max_depth;
        if depth > limit {
            return Err(ConfigError::DepthExceeded { limit });
        }
        Ok(Context {
            validator: self.validator,
            depth,
        })
    }

    /// The engine loop: walk the schema in insertion order, one field at a
    /// time.
    pub fn validate(
        &self,
        schema: &Schema,
        data: &mut Value,
    ) -> Result<Option<Vec<FieldError>>, ConfigError> {
        let mut errors = Vec::new();
        for (key, input) in schema.iter() {
            let rule = input.normalize();
            self.check_field(key, &rule, data, &mut errors)?;
        }
        Ok(if errors.is_empty() {
            None
        } else {
            Some(errors)
        })
    }

    fn check_field(
        &self,
        key: &str,
        rule: &Rule,
        data: &mut Value,
        errors: &mut Vec<FieldError>,
    ) -> Result<(), ConfigError> {
        // trim first so the widely-undefined rewrite sees the trimmed value
        if rule.trim == Some(true) {
            if let Some(Value::String(s)) = data.get_mut(key) {
                let trimmed = s.trim().to_string();
                *s = trimmed;
            }
        }
        let widely = rule
            .widely_undefined
            .unwrap_or(self.validator.options.widely_undefined);
        if widely {
            if let Some(slot) = data.get_mut(key) {
                if slot.as_str() == Some("") {
                    *slot = Value::Null;
                }
            }
        }
        let missing = matches!(data.get(key), None | Some(Value::Null));
        if missing {
            if rule.required != Some(false) {
                errors.push(FieldError {
                    code: self.t("missing_field", &[]),
                    field: Some(key.to_string()),
                    message: self.t("required", &[]),
                });
            } else if let Some(default) = &rule.default {
                if let Some(map) = data.as_object_mut() {
                    map.insert(key.to_string(), default.clone());
                }
            }
            return Ok(());
        }
        // dispatch is resolved only for present fields; an unknown type on an
        // absent optional field never surfaces
        let kind = rule.kind.as_deref().ok_or(ConfigError::TypeMissing)?;
        let checker = self.validator.registry.checker(kind)?;
        // take the value out so the checker can mutate it while reading the
        // rest of the subject (compare rules); the slot holds null meanwhile
        let Some(mut value) = data.get_mut(key).map(Value::take) else {
            return Ok(());
        };
        let convert_spec = rule.convert_type.clone().or_else(|| {
            if self.validator.options.convert {
                self.validator.registry.default_convert(kind).cloned()
            } else {
                None
            }
        });
        if let Some(spec) = &convert_spec {
            convert::apply(&self.validator.registry, spec, &mut value, &*data);
        }
        let outcome = checker.run(self, rule, &mut value, &*data);
        // reinsert before inspecting the outcome so coercions survive even
        // when the check failed
        if let Some(slot) = data.get_mut(key) {
            *slot = value;
        }
        match outcome? {
            crate::registry::CheckResult::Valid => {}
            crate::registry::CheckResult::Invalid(message) => {
                errors.push(FieldError {
                    code: self.t("invalid", &[]),
                    field: Some(key.to_string()),
                    message,
                });
            }
            crate::registry::CheckResult::Nested(nested) => {
                for mut error in nested {
                    error.field = Some(match error.field.take() {
                        Some(sub) if sub.starts_with('[') => format!("{key}{sub}"),
                        Some(sub) => format!("{key}.{sub}"),
                        None => key.to_string(),
                    });
                    errors.push(error);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use serde_json::json;

    #[test]
    fn interpolate_substitutes_in_order() {
        assert_eq!(interpolate("should be one of %s", &["1, 2".into()]), "should be one of 1, 2");
        assert_eq!(interpolate("no placeholders", &[]), "no placeholders");
        assert_eq!(interpolate("a %s b %s", &["x".into()]), "a x b %s");
    }

    #[test]
    fn missing_required_field() {
        let validator = Validator::new();
        let schema = Schema::new().field("id", "id");
        let errors = validator.validate(&schema, &mut json!({})).unwrap().unwrap();
        assert_eq!(errors[0].code, "missing_field");
        assert_eq!(errors[0].field.as_deref(), Some("id"));
        assert_eq!(errors[0].message, "required");
    }

    #[test]
    fn null_counts_as_missing() {
        let validator = Validator::new();
        let schema = Schema::new().field("id", "id");
        let errors = validator.validate(&schema, &mut json!({"id": null})).unwrap().unwrap();
        assert_eq!(errors[0].code, "missing_field");
    }

    #[test]
    fn optional_absence_is_fine() {
        let validator = Validator::new();
        let schema = Schema::new().field("id", "id?");
        assert_eq!(validator.validate(&schema, &mut json!({})).unwrap(), None);
    }

    #[test]
    fn default_written_when_absent() {
        let validator = Validator::new();
        let schema = Schema::new().field(
            "page",
            Rule::new("int").required(false).default_value(json!(1)),
        );
        let mut data = json!({});
        assert_eq!(validator.validate(&schema, &mut data).unwrap(), None);
        assert_eq!(data["page"], json!(1));
    }

    #[test]
    fn trim_rewrites_subject() {
        let validator = Validator::new();
        let schema = Schema::new().field("name", Rule::new("string").trim(true));
        let mut data = json!({"name": "  hi  "});
        assert_eq!(validator.validate(&schema, &mut data).unwrap(), None);
        assert_eq!(data["name"], json!("hi"));
    }

    #[test]
    fn widely_undefined_treats_empty_string_as_absent() {
        let validator = Validator::with_options(Options {
            widely_undefined: true,
            ..Default::default()
        });
        let schema = Schema::new().field("name", "string");
        let mut data = json!({"name": ""});
        let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
        assert_eq!(errors[0].code, "missing_field");
        assert_eq!(data["name"], json!(null));
    }

    #[test]
    fn validate_root_rejects_non_objects() {
        let validator = Validator::with_options(Options {
            validate_root: true,
            ..Default::default()
        });
        let schema = Schema::new().field("id", "id");
        let errors = validator.validate(&schema, &mut json!(null)).unwrap().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, None);
        assert_eq!(errors[0].message, "the validated value should be a object");
    }

    #[test]
    fn translate_hook_sees_codes_and_templates() {
        let validator = Validator::with_options(Options {
            translate: Some(Arc::new(|template: &str, args: &[String]| {
                let mut out = template.to_string();
                for arg in args {
                    out = out.replacen("%s", arg, 1);
                }
                out + "-add."
            })),
            ..Default::default()
        });
        let schema = Schema::new().field("name", "string");
        let errors = validator.validate(&schema, &mut json!({})).unwrap().unwrap();
        assert_eq!(errors[0].code, "missing_field-add.");
        assert_eq!(errors[0].message, "required-add.");
    }

    #[test]
    fn depth_guard_trips_on_adversarial_nesting() {
        let validator = Validator::with_options(Options {
            max_depth: 2,
            ..Default::default()
        });
        let schema = Schema::new().field(
            "a",
            Rule::new("object").fields(Schema::new().field(
                "b",
                Rule::new("object").fields(Schema::new().field("c", "object")),
            )),
        );
        let mut data = json!({"a": {"b": {"c": {}}}});
        let err = validator.validate(&schema, &mut data).unwrap_err();
        assert!(matches!(err, ConfigError::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn empty_rule_on_present_field_is_config_error() {
        let validator = Validator::new();
        let schema = Schema::new().field("x", crate::rule::RuleInput::Empty);
        let err = validator.validate(&schema, &mut json!({"x": 1})).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMissing));
    }
}
