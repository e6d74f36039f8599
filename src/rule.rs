//! Rule descriptors, shorthand resolution, and schemas.
//!
//! Callers may write a field's constraint in any accepted shorthand
//! ([`RuleInput`]); normalization reduces every shape to one canonical
//! [`Rule`] descriptor before dispatch, so checkers never sniff shapes
//! themselves. Normalization is idempotent: re-normalizing a normalized
//! descriptor yields an identical result, which makes pre-resolved rules safe
//! to reuse across calls.

use crate::convert::ConvertSpec;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Per-rule override of failure messages.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageSpec {
    /// One message covering every failure on the field. Normalization rewrites
    /// this into a [`MessageSpec::PerKind`] map keyed by the resolved type
    /// name.
    Single(String),
    /// Messages keyed by failure sub-kind (`required`, `empty`, `min`, `max`,
    /// `format`, `compare`, `type`) or by the rule's type name as a
    /// catch-all.
    PerKind(HashMap<String, String>),
}

/// Nested shape carried by composite rules: a field schema for `object`
/// recursion, or a single item rule for typed arrays.
#[derive(Clone, Debug, PartialEq)]
pub enum SubRule {
    Fields(Schema),
    Item(Box<RuleInput>),
}

/// The canonical, resolved form of one field's constraint.
///
/// Built either directly through the builder methods or by normalizing a
/// [`RuleInput`] shorthand. `min`/`max` bound the value magnitude for numeric
/// types and the length for string/array types.
#[derive(Clone, Debug, Default)]
pub struct Rule {
    /// Type name, the key into the checker registry.
    pub kind: Option<String>,
    /// Absence is fatal unless this is `Some(false)`. Defaults to required.
    pub required: Option<bool>,
    /// Permit an empty string to bypass format/length checks.
    pub allow_empty: Option<bool>,
    /// Alias of `allow_empty`, consulted only when `allow_empty` is unset.
    pub empty: Option<bool>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Pattern for the string checker and pattern-backed formats.
    pub format: Option<Regex>,
    /// Allowed literals, used only by the enum checker.
    pub values: Option<Vec<Value>>,
    /// Element type name, used only by the array checker.
    pub item_type: Option<String>,
    /// Nested schema (object) or item rule (array).
    pub rule: Option<SubRule>,
    /// Failure-message override(s).
    pub message: Option<MessageSpec>,
    /// Sibling field whose value must equal this field's value.
    pub compare: Option<String>,
    /// Value assigned into the subject when the field is absent and not
    /// required.
    pub default: Option<Value>,
    /// Explicit coercion target, overriding the type's default coercion.
    pub convert_type: Option<ConvertSpec>,
    /// Per-rule override of the global `widely_undefined` option.
    pub widely_undefined: Option<bool>,
    /// Trim string values in place before any other check.
    pub trim: Option<bool>,
    /// Extra parameters for registered custom checkers.
    pub extras: HashMap<String, Value>,
}

impl Rule {
    /// Create a rule of the given type. A trailing `?` marks it not required.
    pub fn new(kind: impl Into<String>) -> Self {
        Rule {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = Some(allow);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn format(mut self, format: Regex) -> Self {
        self.format = Some(format);
        self
    }

    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Attach a nested field schema (object recursion, or `item_type:
    /// "object"` arrays).
    pub fn fields(mut self, schema: Schema) -> Self {
        self.rule = Some(SubRule::Fields(schema));
        self
    }

    /// Attach the rule applied to every array element.
    pub fn item_rule(mut self, rule: impl Into<RuleInput>) -> Self {
        self.rule = Some(SubRule::Item(Box::new(rule.into())));
        self
    }

    /// Set one message covering every failure on this field.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(MessageSpec::Single(message.into()));
        self
    }

    /// Set the message for one failure sub-kind (`max`, `format`, ...).
    pub fn with_message_for(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        let mut map = match self.message.take() {
            Some(MessageSpec::PerKind(map)) => map,
            Some(MessageSpec::Single(single)) => {
                // keep the old single message reachable as the catch-all
                let mut map = HashMap::new();
                if let Some(kind) = &self.kind {
                    map.insert(kind.trim_end_matches('?').to_string(), single);
                }
                map
            }
            None => HashMap::new(),
        };
        map.insert(kind.into(), message.into());
        self.message = Some(MessageSpec::PerKind(map));
        self
    }

    pub fn compare(mut self, field: impl Into<String>) -> Self {
        self.compare = Some(field.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn convert(mut self, spec: impl Into<ConvertSpec>) -> Self {
        self.convert_type = Some(spec.into());
        self
    }

    pub fn widely_undefined(mut self, widely: bool) -> Self {
        self.widely_undefined = Some(widely);
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = Some(trim);
        self
    }

    /// Attach an extra parameter readable by custom checkers.
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Normalize this descriptor (strip `?`, key single messages by type).
    pub fn normalized(&self) -> Rule {
        RuleInput::Rule(self.clone()).normalize()
    }

    /// Look up the message override for a failure sub-kind, falling back to
    /// the override keyed by this rule's type name.
    pub fn message_for(&self, kind: &str) -> Option<&str> {
        match &self.message {
            Some(MessageSpec::PerKind(map)) => map
                .get(kind)
                .or_else(|| self.kind.as_deref().and_then(|t| map.get(t)))
                .map(String::as_str),
            Some(MessageSpec::Single(message)) => Some(message.as_str()),
            None => None,
        }
    }

    /// `allow_empty` precedence: explicit `allow_empty`, else explicit
    /// `empty`, else inferred from `required: false`.
    pub(crate) fn allows_empty(&self) -> bool {
        self.allow_empty
            .or(self.empty)
            .unwrap_or(self.required == Some(false))
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        fn format_eq(a: &Option<Regex>, b: &Option<Regex>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a.as_str() == b.as_str(),
                (None, None) => true,
                _ => false,
            }
        }
        self.kind == other.kind
            && self.required == other.required
            && self.allow_empty == other.allow_empty
            && self.empty == other.empty
            && self.min == other.min
            && self.max == other.max
            && format_eq(&self.format, &other.format)
            && self.values == other.values
            && self.item_type == other.item_type
            && self.rule == other.rule
            && self.message == other.message
            && self.compare == other.compare
            && self.default == other.default
            && self.convert_type == other.convert_type
            && self.widely_undefined == other.widely_undefined
            && self.trim == other.trim
            && self.extras == other.extras
    }
}

/// Any accepted rule shorthand, resolved once by [`RuleInput::normalize`].
#[derive(Clone, Debug)]
pub enum RuleInput {
    /// Bare type name; a trailing `?` means not required.
    Type(String),
    /// Ordered literals: shorthand for an enum rule.
    Values(Vec<Value>),
    /// Pattern: shorthand for a string rule constrained by it.
    Pattern(Regex),
    /// Full descriptor.
    Rule(Rule),
    /// No constraint; fails at dispatch if the field is actually present.
    Empty,
}

impl RuleInput {
    /// Reduce this shorthand to the canonical descriptor.
    pub fn normalize(&self) -> Rule {
        let mut rule = match self {
            RuleInput::Type(name) => Rule {
                kind: Some(name.clone()),
                ..Default::default()
            },
            RuleInput::Values(values) => Rule {
                kind: Some("enum".to_string()),
                values: Some(values.clone()),
                ..Default::default()
            },
            RuleInput::Pattern(format) => Rule {
                kind: Some("string".to_string()),
                format: Some(format.clone()),
                ..Default::default()
            },
            RuleInput::Rule(rule) => rule.clone(),
            RuleInput::Empty => Rule::default(),
        };
        if let Some(kind) = rule.kind.take() {
            match kind.strip_suffix('?') {
                Some(stripped) => {
                    rule.kind = Some(stripped.to_string());
                    rule.required = Some(false);
                }
                None => rule.kind = Some(kind),
            }
        }
        if matches!(rule.message, Some(MessageSpec::Single(_))) {
            if let Some(kind) = rule.kind.clone() {
                if let Some(MessageSpec::Single(message)) = rule.message.take() {
                    let mut map = HashMap::new();
                    map.insert(kind, message);
                    rule.message = Some(MessageSpec::PerKind(map));
                }
            }
        }
        rule
    }
}

impl PartialEq for RuleInput {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuleInput::Type(a), RuleInput::Type(b)) => a == b,
            (RuleInput::Values(a), RuleInput::Values(b)) => a == b,
            (RuleInput::Pattern(a), RuleInput::Pattern(b)) => a.as_str() == b.as_str(),
            (RuleInput::Rule(a), RuleInput::Rule(b)) => a == b,
            (RuleInput::Empty, RuleInput::Empty) => true,
            _ => false,
        }
    }
}

impl From<&str> for RuleInput {
    fn from(name: &str) -> Self {
        RuleInput::Type(name.to_string())
    }
}

impl From<String> for RuleInput {
    fn from(name: String) -> Self {
        RuleInput::Type(name)
    }
}

impl From<Vec<Value>> for RuleInput {
    fn from(values: Vec<Value>) -> Self {
        RuleInput::Values(values)
    }
}

impl From<Regex> for RuleInput {
    fn from(format: Regex) -> Self {
        RuleInput::Pattern(format)
    }
}

impl From<Rule> for RuleInput {
    fn from(rule: Rule) -> Self {
        RuleInput::Rule(rule)
    }
}

/// An ordered mapping from field name to rule shorthand.
///
/// Insertion order determines error-reporting order; keys are logically
/// independent except for `compare` cross-references, which resolve against
/// the same subject.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, RuleInput)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; any `impl Into<RuleInput>` shorthand is accepted.
    pub fn field(mut self, name: impl Into<String>, rule: impl Into<RuleInput>) -> Self {
        self.fields.push((name.into(), rule.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleInput)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
