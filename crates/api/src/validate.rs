//! Field validation for decoded inputs and handler outputs
//!
//! Records describe their own rules by implementing [`Validate`], usually with the [`Rules`]
//! builder:
//!
//! ```
//! use micro_api::validate::{Rule, Rules, Validate, ValidationError};
//!
//! struct Request {
//!     message: String,
//!     option: String,
//! }
//!
//! impl Validate for Request {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         Rules::new()
//!             .field("message", &self.message, &[Rule::Required, Rule::Ascii])
//!             .field("option", &self.option, &[Rule::Ascii])
//!             .finish()
//!     }
//! }
//!
//! let request = Request { message: String::new(), option: "ok".into() };
//! assert!(request.validate().is_err());
//! ```
//!
//! Every rule except [`Rule::Required`] accepts an empty value, so a field without `Required`
//! is optional. The endpoint runs validation through a [`FieldValidator`], which can be
//! replaced per endpoint.

use std::fmt::{Display, Formatter};
use thiserror::Error;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for () {}

impl Validate for String {}

impl Validate for serde_json::Value {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Ascii,
    Alphanumeric,
    Numeric,
    MinLength(usize),
    MaxLength(usize),
}

impl Rule {
    fn check(self, value: &str) -> bool {
        if value.is_empty() {
            return self != Rule::Required;
        }

        match self {
            Rule::Required => true,
            Rule::Ascii => value.is_ascii(),
            Rule::Alphanumeric => value.bytes().all(|b| b.is_ascii_alphanumeric()),
            Rule::Numeric => value.bytes().all(|b| b.is_ascii_digit()),
            Rule::MinLength(min) => value.chars().count() >= min,
            Rule::MaxLength(max) => value.chars().count() <= max,
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Required => f.write_str("required"),
            Rule::Ascii => f.write_str("ascii"),
            Rule::Alphanumeric => f.write_str("alphanumeric"),
            Rule::Numeric => f.write_str("numeric"),
            Rule::MinLength(min) => write!(f, "min length {min}"),
            Rule::MaxLength(max) => write!(f, "max length {max}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    field: String,
    rule: Option<Rule>,
    message: String,
}

impl FieldError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self { field: field.into(), rule: None, message: message.into() }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The violated rule, `None` for custom checks.
    pub fn rule(&self) -> Option<Rule> {
        self.rule
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if `field` failed at least one rule.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    /// The value broke one or more rules.
    #[error("{0}")]
    Rejected(ValidationErrors),

    /// The validator could not run.
    #[error("validator error: {0}")]
    Failed(String),
}

impl ValidationError {
    pub fn failed<S: ToString>(reason: S) -> Self {
        Self::Failed(reason.to_string())
    }

    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ValidationError::Rejected(errors) => Some(errors),
            ValidationError::Failed(_) => None,
        }
    }
}

/// Collects field errors, see the [module docs](self).
#[derive(Debug, Default)]
#[must_use]
pub struct Rules {
    errors: Vec<FieldError>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: &str, rules: &[Rule]) -> Self {
        for rule in rules.iter().copied().filter(|rule| !rule.check(value)) {
            let message = match rule {
                Rule::Required => "is required".to_owned(),
                rule => format!("must be {rule}"),
            };
            self.errors.push(FieldError { field: name.to_owned(), rule: Some(rule), message });
        }
        self
    }

    /// Adds a custom check, `message` is recorded when `ok` is false.
    pub fn check(mut self, name: &str, ok: bool, message: &str) -> Self {
        if !ok {
            self.errors.push(FieldError::new(name, message));
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() { Ok(()) } else { Err(ValidationError::Rejected(ValidationErrors { errors: self.errors })) }
    }
}

/// Runs validation on a decoded input or a handler output.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &dyn Validate) -> Result<(), ValidationError>;
}

/// Applies the value's own [`Validate`] rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleValidator;

impl FieldValidator for RuleValidator {
    fn validate(&self, value: &dyn Validate) -> Result<(), ValidationError> {
        value.validate()
    }
}

/// Accepts every value.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipValidation;

impl FieldValidator for SkipValidation {
    fn validate(&self, _value: &dyn Validate) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Request {
        message: String,
        option: String,
        page: String,
    }

    impl Validate for Request {
        fn validate(&self) -> Result<(), ValidationError> {
            Rules::new()
                .field("message", &self.message, &[Rule::Required, Rule::Ascii, Rule::MaxLength(8)])
                .field("option", &self.option, &[Rule::Ascii])
                .field("page", &self.page, &[Rule::Numeric])
                .finish()
        }
    }

    fn request(message: &str, option: &str, page: &str) -> Request {
        Request { message: message.into(), option: option.into(), page: page.into() }
    }

    #[test]
    fn test_valid() {
        assert!(request("test", "", "").validate().is_ok());
        assert!(request("test", "opt", "12").validate().is_ok());
    }

    #[test]
    fn test_required() {
        let error = request("", "", "").validate().unwrap_err();
        let errors = error.field_errors().unwrap();

        assert_eq!(errors.len(), 1);
        assert!(errors.has("message"));
        assert_eq!(errors.iter().next().unwrap().rule(), Some(Rule::Required));
        assert_eq!(error.to_string(), "message: is required");
    }

    #[test]
    fn test_optional_rules_check_non_empty_values() {
        let error = request("tést-message", "ünïcode", "1a").validate().unwrap_err();
        let errors = error.field_errors().unwrap();

        let failed: Vec<(&str, Option<Rule>)> = errors.iter().map(|e| (e.field(), e.rule())).collect();
        assert_eq!(
            failed,
            vec![
                ("message", Some(Rule::Ascii)),
                ("message", Some(Rule::MaxLength(8))),
                ("option", Some(Rule::Ascii)),
                ("page", Some(Rule::Numeric)),
            ]
        );
    }

    #[test]
    fn test_rules() {
        assert!(Rule::Alphanumeric.check("abc123"));
        assert!(!Rule::Alphanumeric.check("abc-123"));
        assert!(Rule::MinLength(2).check("ab"));
        assert!(!Rule::MinLength(3).check("ab"));
        assert!(Rule::MinLength(3).check(""));
        assert!(!Rule::Required.check(""));
    }

    #[test]
    fn test_custom_check() {
        let error = Rules::new().check("range", false, "start must precede end").finish().unwrap_err();
        let errors = error.field_errors().unwrap();

        let field_error = errors.iter().next().unwrap();
        assert_eq!(field_error.rule(), None);
        assert_eq!(field_error.message(), "start must precede end");
    }

    #[test]
    fn test_field_validators() {
        let invalid = request("", "", "");

        assert!(RuleValidator.validate(&invalid).is_err());
        assert!(SkipValidation.validate(&invalid).is_ok());
        assert!(RuleValidator.validate(&()).is_ok());
    }

    #[test]
    fn test_failed() {
        let error = ValidationError::failed("rules unavailable");
        assert!(error.field_errors().is_none());
        assert_eq!(error.to_string(), "validator error: rules unavailable");
    }
}
