//! Declarative schema validation for untrusted input.
//!
//! A [`Schema`] maps field names to rules, written either as a full
//! [`Rule`] descriptor or as shorthand (a type name like `"int?"`, a list of
//! allowed values, or a `Regex`). [`Validator::validate`] walks a
//! `serde_json::Value` subject against the schema in one pass and returns
//! every violation as a [`FieldError`], with dotted/bracketed paths into
//! nested objects and arrays. Trim, defaults, and opt-in type coercion
//! mutate the subject in place.
//!
//! ```
//! use fieldcheck::{Rule, Schema, Validator};
//! use serde_json::json;
//!
//! let validator = Validator::new();
//! let schema = Schema::new()
//!     .field("name", "string")
//!     .field("age", Rule::new("int").min(18.0))
//!     .field("gender", vec![json!("male"), json!("female"), json!("unknown")]);
//!
//! let mut data = json!({ "name": "foo", "age": 24, "gender": "male" });
//! assert_eq!(validator.validate(&schema, &mut data).unwrap(), None);
//!
//! let mut data = json!({ "name": "foo", "age": 17, "gender": "male" });
//! let errors = validator.validate(&schema, &mut data).unwrap().unwrap();
//! assert_eq!(errors[0].field.as_deref(), Some("age"));
//! assert_eq!(errors[0].message, "should bigger than 18");
//! ```
//!
//! Validation failures are data, never `Err`: the `Err` arm of `validate` is
//! reserved for configuration mistakes (unknown type names, malformed nested
//! rules), so a broken schema cannot silently admit bad input.

mod checkers;
mod convert;
mod error;
mod registry;
mod rule;
mod validator;

pub use convert::{ConvertFn, ConvertSpec};
pub use error::{ConfigError, FieldError};
pub use registry::{CheckResult, Checker, Registry, RuleCheck};
pub use rule::{MessageSpec, Rule, RuleInput, Schema, SubRule};
pub use validator::{Context, Options, TranslateFn, Validator};

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{
        CheckResult, ConfigError, ConvertSpec, FieldError, Options, Rule, RuleCheck, RuleInput,
        Schema, Validator,
    };
}
