//! Field constraints with accumulated violations.
//!
//! A destination struct declares its constraints with `validator`'s derive:
//!
//! ```ignore
//! #[derive(Config, Validate)]
//! struct HttpConfig {
//!     #[config(env = "HTTP_URL")]
//!     #[validate(required, url)]
//!     url: Option<String>,
//!
//!     #[config(env = "HTTP_PORT", default = 8080)]
//!     #[validate(range(min = 1, max = 65535))]
//!     port: u16,
//! }
//! ```
//!
//! Every constraint runs; the failures are flattened into [`Violation`]s keyed
//! by dotted field path, in field declaration order, and returned together as
//! one [`ValidationErrors`]. A field reports only its first failed constraint.
//!
//! A custom check that cannot be evaluated at all returns [`fault`] instead of
//! a constraint error. That fails the whole pass with
//! [`DeployfigError::ValidatorFailed`].

use std::fmt;

use confique::Config;
use confique::meta::{FieldKind, Meta};
use validator::{Validate, ValidationError, ValidationErrorsKind};

use crate::error::DeployfigError;

/// Constraint name for a field with no value at all.
pub const REQUIRED: &str = "required";

/// Error code marking a check that could not be evaluated.
pub const FAULT: &str = "validator_failed";

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the field, e.g. `http.url`.
    pub field: String,
    /// Constraint name, e.g. `required`.
    pub constraint: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Field validation for '{}' failed on the '{}' constraint",
            self.field, self.constraint
        )
    }
}

/// Every violation found in one validation pass. Never empty when returned
/// as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.violations.iter().map(Violation::to_string).collect();
        f.write_str(rendered.join("\n").trim())
    }
}

impl std::error::Error for ValidationErrors {}

/// Run the derived constraints of `config` and collect every violation.
pub fn validate<C: Config + Validate>(config: &C) -> Result<(), DeployfigError> {
    check(config, &[])
}

/// Like [`validate`], with `missing` (dotted paths of fields no source gave a
/// value) reported as `required` ahead of any other constraint on them.
pub(crate) fn check<C: Config + Validate>(
    config: &C,
    missing: &[String],
) -> Result<(), DeployfigError> {
    let errors = config.validate().err();
    if errors.is_none() && missing.is_empty() {
        return Ok(());
    }

    let mut collector = Collector {
        missing,
        violations: Vec::new(),
    };
    collector.walk(Some(&C::META), errors.as_ref(), "")?;

    if collector.violations.is_empty() {
        return Ok(());
    }
    Err(ValidationErrors {
        violations: collector.violations,
    }
    .into())
}

/// A check that could not run, e.g. a lookup it depends on failed.
///
/// Return this from a `#[validate(custom(function = ...))]` function.
pub fn fault(reason: impl Into<String>) -> ValidationError {
    let reason: String = reason.into();
    ValidationError::new(FAULT).with_message(reason.into())
}

/// Fails with `required` on an empty string.
///
/// For plain `String` fields, where `#[validate(required)]` (which checks
/// `Option`s) does not apply.
pub fn non_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(REQUIRED));
    }
    Ok(())
}

struct Collector<'a> {
    missing: &'a [String],
    violations: Vec<Violation>,
}

impl Collector<'_> {
    /// Visit the fields of `meta` in declaration order, then any error keys
    /// the struct's fields don't account for (struct-level checks), sorted.
    fn walk(
        &mut self,
        meta: Option<&Meta>,
        errors: Option<&validator::ValidationErrors>,
        prefix: &str,
    ) -> Result<(), DeployfigError> {
        let mut visited: Vec<&str> = Vec::new();

        for field in meta.map(|m| m.fields).unwrap_or_default() {
            let dotted = join(prefix, field.name);
            let kind = errors.and_then(|e| e.errors().get(field.name));
            visited.push(field.name);

            match &field.kind {
                FieldKind::Nested { meta, .. } => match kind {
                    Some(ValidationErrorsKind::Struct(inner)) => {
                        self.walk(Some(*meta), Some(&**inner), &dotted)?
                    }
                    Some(other) => {
                        self.walk(Some(*meta), None, &dotted)?;
                        self.kind(&dotted, other)?;
                    }
                    None => self.walk(Some(*meta), None, &dotted)?,
                },
                FieldKind::Leaf { .. } => {
                    if self.missing.contains(&dotted) {
                        self.push(dotted, REQUIRED);
                    } else if let Some(kind) = kind {
                        self.kind(&dotted, kind)?;
                    }
                }
            }
        }

        let Some(errors) = errors else {
            return Ok(());
        };
        let mut rest: Vec<_> = errors
            .errors()
            .iter()
            .filter(|(name, _)| !visited.contains(&&***name))
            .collect();
        rest.sort_by(|a, b| (**a.0).cmp(&**b.0));
        for (name, kind) in rest {
            self.kind(&join(prefix, name), kind)?;
        }
        Ok(())
    }

    fn kind(&mut self, dotted: &str, kind: &ValidationErrorsKind) -> Result<(), DeployfigError> {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.iter().find(|e| e.code == FAULT) {
                    return Err(DeployfigError::ValidatorFailed {
                        field: dotted.to_string(),
                        reason: err
                            .message
                            .as_deref()
                            .unwrap_or("check could not be evaluated")
                            .to_string(),
                    });
                }
                if let Some(first) = errs.first() {
                    self.push(dotted.to_string(), &first.code);
                }
                Ok(())
            }
            ValidationErrorsKind::Struct(inner) => self.walk(None, Some(&**inner), dotted),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    self.walk(None, Some(&**inner), &format!("{dotted}[{index}]"))?;
                }
                Ok(())
            }
        }
    }

    fn push(&mut self, field: String, constraint: &str) {
        self.violations.push(Violation {
            field,
            constraint: constraint.to_string(),
        });
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationErrors as FieldErrors;

    #[derive(Config, Validate)]
    struct Service {
        #[validate(length(min = 3))]
        name: String,

        #[validate(custom(function = "non_empty"))]
        mode: String,

        #[config(nested)]
        #[validate(nested)]
        http: Http,
    }

    #[derive(Config, Validate)]
    struct Http {
        #[validate(required, url)]
        url: Option<String>,

        #[validate(range(min = 1, max = 65535))]
        port: u16,
    }

    fn service(name: &str, mode: &str, url: Option<&str>, port: u16) -> Service {
        Service {
            name: name.into(),
            mode: mode.into(),
            http: Http {
                url: url.map(String::from),
                port,
            },
        }
    }

    fn violations(err: DeployfigError) -> Vec<(String, String)> {
        match err {
            DeployfigError::ValidationFailed(errs) => errs
                .violations()
                .iter()
                .map(|v| (v.field.clone(), v.constraint.clone()))
                .collect(),
            other => panic!("Expected ValidationFailed, got: {other:?}"),
        }
    }

    fn pair(field: &str, constraint: &str) -> (String, String) {
        (field.to_string(), constraint.to_string())
    }

    #[test]
    fn valid_struct_passes() {
        let ok = service("billing", "fast", Some("https://example.com"), 8080);
        assert!(validate(&ok).is_ok());
    }

    #[test]
    fn all_violations_are_collected_in_declaration_order() {
        let bad = service("ab", "", Some("not a url"), 0);
        let found = violations(validate(&bad).unwrap_err());
        assert_eq!(
            found,
            vec![
                pair("name", "length"),
                pair("mode", "required"),
                pair("http.url", "url"),
                pair("http.port", "range"),
            ]
        );
    }

    #[test]
    fn absent_option_is_required() {
        let bad = service("billing", "fast", None, 8080);
        let found = violations(validate(&bad).unwrap_err());
        assert_eq!(found, vec![pair("http.url", "required")]);
    }

    #[test]
    fn missing_fields_are_required_and_shadow_other_constraints() {
        let bad = service("", "", None, 0);
        let missing = vec!["name".to_string(), "http.port".to_string()];
        let found = violations(check(&bad, &missing).unwrap_err());
        assert_eq!(
            found,
            vec![
                pair("name", "required"),
                pair("mode", "required"),
                pair("http.url", "required"),
                pair("http.port", "required"),
            ]
        );
    }

    #[test]
    fn missing_alone_fails_an_otherwise_valid_struct() {
        let ok = service("billing", "fast", Some("https://example.com"), 8080);
        let found = violations(check(&ok, &["mode".to_string()]).unwrap_err());
        assert_eq!(found, vec![pair("mode", "required")]);
    }

    #[test]
    fn rendered_one_line_per_violation() {
        let bad = service("billing", "fast", None, 0);
        let msg = validate(&bad).unwrap_err().to_string();
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Field validation for 'http.url' failed on the 'required' constraint",
                "Field validation for 'http.port' failed on the 'range' constraint",
            ]
        );
        assert!(!msg.ends_with('\n'));
    }

    #[test]
    fn fault_is_not_a_violation() {
        let mut errors = FieldErrors::new();
        errors.add("name", ValidationError::new("length"));
        errors.add("mode", fault("lookup table unavailable"));

        let mut collector = Collector {
            missing: &[],
            violations: Vec::new(),
        };
        let err = collector
            .walk(Some(&Service::META), Some(&errors), "")
            .unwrap_err();
        match err {
            DeployfigError::ValidatorFailed { field, reason } => {
                assert_eq!(field, "mode");
                assert_eq!(reason, "lookup table unavailable");
            }
            other => panic!("Expected ValidatorFailed, got: {other:?}"),
        }
    }

    #[test]
    fn struct_level_errors_follow_fields() {
        let mut errors = FieldErrors::new();
        errors.add("__all__", ValidationError::new("ports_overlap"));
        errors.add("name", ValidationError::new("length"));

        let mut collector = Collector {
            missing: &[],
            violations: Vec::new(),
        };
        collector.walk(Some(&Service::META), Some(&errors), "").unwrap();
        let found: Vec<_> = collector
            .violations
            .iter()
            .map(|v| (v.field.clone(), v.constraint.clone()))
            .collect();
        assert_eq!(found, vec![pair("name", "length"), pair("__all__", "ports_overlap")]);
    }

    #[test]
    fn non_empty_semantics() {
        assert!(non_empty("x").is_ok());
        assert_eq!(non_empty("").unwrap_err().code, REQUIRED);
    }
}
