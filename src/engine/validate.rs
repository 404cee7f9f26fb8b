//! Field validation: coercion plus validator predicates
//!
//! One field at a time: decide presence, coerce the raw value to the
//! declared output type, then run the field's validator specs in order.
//! The first failing rule wins; later rules never run.

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::submission::RawValue;
use crate::schema::model::{FieldDefinition, InputKind, OutputType};
use crate::schema::validators::ValidatorSpec;

/// A raw value after coercion to its field's output type
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    /// Optional field with nothing submitted
    Absent,
    Text(String),
    Integer(i64),
    Float(f64),
    List(Vec<String>),
}

impl CoercedValue {
    /// The string form, for length/pattern rules
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CoercedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric form, for range rules
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CoercedValue::Integer(i) => Some(*i as f64),
            CoercedValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl std::fmt::Display for CoercedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoercedValue::Absent => write!(f, "-"),
            CoercedValue::Text(s) => write!(f, "{}", s),
            CoercedValue::Integer(i) => write!(f, "{}", i),
            CoercedValue::Float(x) => write!(f, "{}", x),
            CoercedValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Why a field was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("a value is required")]
    MissingRequiredValue,

    #[error("cannot coerce '{value}' to {expected}")]
    TypeCoercionError { value: String, expected: String },

    #[error("'{value}' is not one of the declared choices")]
    InvalidChoice { value: String },

    #[error("failed validator {rule}")]
    CustomValidatorFailure { rule: String },
}

/// Outcome of validating one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    Accepted(CoercedValue),
    Rejected(Vec<FieldError>),
}

impl FieldOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FieldOutcome::Accepted(_))
    }

    fn reject(error: FieldError) -> Self {
        FieldOutcome::Rejected(vec![error])
    }
}

/// Process-local registry of named custom predicates
///
/// Keeps schemas pure data: a schema names a predicate by id, the
/// embedding process registers the closure.
#[derive(Default, Clone)]
pub struct ValidatorRegistry {
    custom: HashMap<String, Arc<dyn Fn(&CoercedValue) -> bool + Send + Sync>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under an id, replacing any previous one
    pub fn register<F>(&mut self, id: &str, predicate: F)
    where
        F: Fn(&CoercedValue) -> bool + Send + Sync + 'static,
    {
        self.custom.insert(id.to_string(), Arc::new(predicate));
    }

    fn get(&self, id: &str) -> Option<&Arc<dyn Fn(&CoercedValue) -> bool + Send + Sync>> {
        self.custom.get(id)
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Validate one field's raw value
///
/// Steps, in order: presence, coercion, validator chain (fail-fast).
pub fn validate_field(
    field: &FieldDefinition,
    raw: Option<&RawValue>,
    registry: &ValidatorRegistry,
) -> FieldOutcome {
    // (a) presence
    let raw = match raw {
        Some(v) if !v.is_empty() => v,
        _ => {
            return if field.required {
                FieldOutcome::reject(FieldError::MissingRequiredValue)
            } else {
                FieldOutcome::Accepted(CoercedValue::Absent)
            };
        }
    };

    // (b) coercion
    let coerced = match coerce(field, raw) {
        Ok(v) => v,
        Err(e) => return FieldOutcome::reject(e),
    };

    // (c) validator chain, first failure wins
    for spec in &field.validators {
        if let Err(e) = run_validator(spec, &coerced, registry) {
            return FieldOutcome::reject(e);
        }
    }

    // (d)
    FieldOutcome::Accepted(coerced)
}

fn coerce(field: &FieldDefinition, raw: &RawValue) -> Result<CoercedValue, FieldError> {
    // Enumerated widgets only accept their declared choices
    if field.input_kind.is_enumerated() {
        for selection in raw.selections() {
            if !field.content.iter().any(|c| c == selection) {
                return Err(FieldError::InvalidChoice {
                    value: selection.to_string(),
                });
            }
        }
    }

    match field.output_type {
        OutputType::List => Ok(CoercedValue::List(
            raw.selections().iter().map(|s| s.to_string()).collect(),
        )),
        OutputType::Integer => {
            let s = single(field, raw)?;
            s.trim()
                .parse::<i64>()
                .map(CoercedValue::Integer)
                .map_err(|_| FieldError::TypeCoercionError {
                    value: s.to_string(),
                    expected: "integer".to_string(),
                })
        }
        OutputType::Float => {
            let s = single(field, raw)?;
            s.trim()
                .parse::<f64>()
                .map(CoercedValue::Float)
                .map_err(|_| FieldError::TypeCoercionError {
                    value: s.to_string(),
                    expected: "float".to_string(),
                })
        }
        OutputType::String => {
            let s = single(field, raw)?;
            // Date widgets must still carry a real date, even though the
            // coerced value stays a string for the storage layer
            if field.input_kind == InputKind::Date
                && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err()
            {
                return Err(FieldError::TypeCoercionError {
                    value: s.to_string(),
                    expected: "date (YYYY-MM-DD)".to_string(),
                });
            }
            Ok(CoercedValue::Text(s.to_string()))
        }
    }
}

/// A non-list output type needs a single raw value
fn single<'a>(field: &FieldDefinition, raw: &'a RawValue) -> Result<&'a str, FieldError> {
    raw.as_single().ok_or_else(|| FieldError::TypeCoercionError {
        value: raw.selections().join(", "),
        expected: field.output_type.to_string(),
    })
}

fn run_validator(
    spec: &ValidatorSpec,
    value: &CoercedValue,
    registry: &ValidatorRegistry,
) -> Result<(), FieldError> {
    let failed = || FieldError::CustomValidatorFailure {
        rule: spec.rule_name(),
    };

    let pass = match spec {
        ValidatorSpec::MinLength { min } => value.as_text().map(|s| s.len() >= *min),
        ValidatorSpec::MaxLength { max } => value.as_text().map(|s| s.len() <= *max),
        ValidatorSpec::Pattern { regex } => {
            // Compilability was checked at load time
            let re = Regex::new(regex).map_err(|_| failed())?;
            value.as_text().map(|s| re.is_match(s))
        }
        ValidatorSpec::Range { min, max } => value.as_number().map(|n| {
            min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
        }),
        ValidatorSpec::OneOf { choices } => match value {
            CoercedValue::Text(s) => Some(choices.contains(s)),
            CoercedValue::List(items) => Some(items.iter().all(|i| choices.contains(i))),
            _ => None,
        },
        ValidatorSpec::Custom { id } => registry.get(id).map(|p| p(value)),
    };

    // A rule that does not apply to the coerced shape counts as a failure:
    // the schema promised something the value cannot satisfy
    match pass {
        Some(true) => Ok(()),
        _ => Err(failed()),
    }
}
