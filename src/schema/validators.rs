//! Data-described validator specs
//!
//! Validators are declared as data in the schema source rather than as
//! embedded code, so form definitions stay serializable and portable. The
//! engine resolves `custom` specs through a process-local registry of
//! named predicates (see `engine::validate::ValidatorRegistry`).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One validator rule, run over a field's coerced value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidatorSpec {
    /// String length must be at least `min`
    MinLength { min: usize },

    /// String length must be at most `max`
    MaxLength { max: usize },

    /// String must match the regular expression
    Pattern { regex: String },

    /// Numeric value must fall within the closed range
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },

    /// Value (or every selection, for lists) must be one of the choices
    OneOf { choices: Vec<String> },

    /// A named predicate registered by the embedding process
    Custom { id: String },
}

impl ValidatorSpec {
    /// A short identity string used in rejection reasons
    pub fn rule_name(&self) -> String {
        match self {
            ValidatorSpec::MinLength { min } => format!("min_length({})", min),
            ValidatorSpec::MaxLength { max } => format!("max_length({})", max),
            ValidatorSpec::Pattern { regex } => format!("pattern({})", regex),
            ValidatorSpec::Range { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => format!("range({}..={})", lo, hi),
                (Some(lo), None) => format!("range({}..)", lo),
                (None, Some(hi)) => format!("range(..={})", hi),
                (None, None) => "range".to_string(),
            },
            ValidatorSpec::OneOf { choices } => format!("one_of({})", choices.join(", ")),
            ValidatorSpec::Custom { id } => format!("custom({})", id),
        }
    }

    /// Check that the spec itself is well-formed
    ///
    /// Returns a message describing the problem, or None if the spec is
    /// usable. A `pattern` whose regex does not compile is a schema error
    /// at load time, not a runtime surprise.
    pub fn well_formedness_error(&self) -> Option<String> {
        match self {
            ValidatorSpec::Pattern { regex } => Regex::new(regex)
                .err()
                .map(|e| format!("invalid regex '{}': {}", regex, e)),
            ValidatorSpec::Range { min: None, max: None } => {
                Some("range validator needs at least one of min/max".to_string())
            }
            ValidatorSpec::Range {
                min: Some(lo),
                max: Some(hi),
            } if lo > hi => Some(format!("empty range: min {} > max {}", lo, hi)),
            ValidatorSpec::OneOf { choices } if choices.is_empty() => {
                Some("one_of validator needs at least one choice".to_string())
            }
            ValidatorSpec::Custom { id } if id.is_empty() => {
                Some("custom validator needs a non-empty id".to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ValidatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_yaml_roundtrip() {
        let specs = vec![
            ValidatorSpec::MinLength { min: 6 },
            ValidatorSpec::Pattern {
                regex: "^[a-z]+$".to_string(),
            },
            ValidatorSpec::Range {
                min: Some(0.0),
                max: Some(10.0),
            },
            ValidatorSpec::Custom {
                id: "no-profanity".to_string(),
            },
        ];
        let yaml = serde_yml::to_string(&specs).unwrap();
        let parsed: Vec<ValidatorSpec> = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(specs, parsed);
    }

    #[test]
    fn test_spec_deserializes_from_tagged_form() {
        let yaml = "rule: min_length\nmin: 6\n";
        let spec: ValidatorSpec = serde_yml::from_str(yaml).unwrap();
        assert_eq!(spec, ValidatorSpec::MinLength { min: 6 });
    }

    #[test]
    fn test_bad_regex_is_malformed() {
        let spec = ValidatorSpec::Pattern {
            regex: "([unclosed".to_string(),
        };
        assert!(spec.well_formedness_error().is_some());

        let ok = ValidatorSpec::Pattern {
            regex: "^ok$".to_string(),
        };
        assert!(ok.well_formedness_error().is_none());
    }

    #[test]
    fn test_empty_range_is_malformed() {
        let spec = ValidatorSpec::Range {
            min: Some(5.0),
            max: Some(1.0),
        };
        assert!(spec.well_formedness_error().is_some());

        let open = ValidatorSpec::Range {
            min: None,
            max: None,
        };
        assert!(open.well_formedness_error().is_some());
    }

    #[test]
    fn test_rule_names() {
        assert_eq!(ValidatorSpec::MinLength { min: 6 }.rule_name(), "min_length(6)");
        assert_eq!(
            ValidatorSpec::Custom {
                id: "x".to_string()
            }
            .rule_name(),
            "custom(x)"
        );
    }
}
