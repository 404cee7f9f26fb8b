//! Submission values and submission identity
//!
//! A submission is what an external caller hands the engine: a mapping from
//! field name to the raw value(s) the user entered. Raw values are kept as
//! strings until the validator engine coerces them to a field's declared
//! output type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// A raw submitted value for one field, before coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A single value (text inputs, radio, select, date, number, file)
    Single(String),
    /// Multiple selections (checkbox groups)
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for RawValue {
    /// Scalar numbers and bools are accepted and stringified, matching how
    /// the schema loader treats numeric `content` entries
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Bool(bool),
            Int(i64),
            Float(f64),
            Text(String),
        }

        impl From<Scalar> for String {
            fn from(s: Scalar) -> String {
                match s {
                    Scalar::Bool(b) => b.to_string(),
                    Scalar::Int(i) => i.to_string(),
                    Scalar::Float(f) => f.to_string(),
                    Scalar::Text(t) => t,
                }
            }
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(Scalar),
            Several(Vec<Scalar>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::One(s) => RawValue::Single(s.into()),
            Raw::Several(v) => RawValue::Many(v.into_iter().map(String::from).collect()),
        })
    }
}

impl RawValue {
    /// Whether this value counts as absent for required-field purposes
    pub fn is_empty(&self) -> bool {
        match self {
            RawValue::Single(s) => s.is_empty(),
            RawValue::Many(v) => v.is_empty(),
        }
    }

    /// The single string form, if this is not a multi-value
    pub fn as_single(&self) -> Option<&str> {
        match self {
            RawValue::Single(s) => Some(s),
            RawValue::Many(_) => None,
        }
    }

    /// All selections, treating a single value as a one-element list
    pub fn selections(&self) -> Vec<&str> {
        match self {
            RawValue::Single(s) => vec![s.as_str()],
            RawValue::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Single(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Single(s)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(v: Vec<String>) -> Self {
        RawValue::Many(v)
    }
}

/// A full submission: field name to raw value
///
/// Backed by a BTreeMap so iteration order is deterministic; evaluation
/// order always follows the form's field declaration order, not this map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission(pub BTreeMap<String, RawValue>);

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw value submitted for a field, if any
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.0.get(field)
    }

    /// Insert a value, builder-style
    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<RawValue>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Capability flags passed by the caller into evaluation
///
/// Authentication itself is out of scope; the caller tells the engine
/// whether this submission carries an authenticated identity and whether
/// the repeat-submission policy is overridden for this attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityFlags {
    /// The submission is tagged with an authenticated identity
    pub is_authenticated: bool,
    /// Skip the repeat-submission check for this attempt
    pub is_repeat_attempt_allowed_override: bool,
}

impl CapabilityFlags {
    pub fn authenticated() -> Self {
        Self {
            is_authenticated: true,
            is_repeat_attempt_allowed_override: false,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// A unique identifier for an accepted submission record
///
/// Prefixed ULID, e.g. `SUB-01HC2JB7SMQX7RS1Y0GFKBHPTD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionId(Ulid);

const SUBMISSION_PREFIX: &str = "SUB";

impl SubmissionId {
    /// Create a new random SubmissionId
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Get the ULID component
    pub fn ulid(&self) -> Ulid {
        self.0
    }

    /// Parse a SubmissionId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", SUBMISSION_PREFIX, self.0)
    }
}

impl FromStr for SubmissionId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        if prefix != SUBMISSION_PREFIX {
            return Err(IdParseError::InvalidPrefix(prefix.to_string()));
        }

        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self(ulid))
    }
}

impl Serialize for SubmissionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SubmissionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing submission IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid submission ID prefix: '{0}' (expected SUB)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in submission ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_id_generation() {
        let id = SubmissionId::new();
        assert!(id.to_string().starts_with("SUB-"));
        assert_eq!(id.to_string().len(), 30); // SUB- (4) + ULID (26) = 30
    }

    #[test]
    fn test_submission_id_roundtrip() {
        let original = SubmissionId::new();
        let parsed = SubmissionId::parse(&original.to_string()).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_submission_id_invalid_prefix() {
        let err = SubmissionId::parse("XXX-01HQ3K4N5M6P7R8S9T0UVWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidPrefix(_)));
    }

    #[test]
    fn test_submission_id_missing_delimiter() {
        let err = SubmissionId::parse("SUB01HQ3K4N5M6P7R8S9T0UVWXYZ").unwrap_err();
        assert!(matches!(err, IdParseError::MissingDelimiter(_)));
    }

    #[test]
    fn test_submission_id_invalid_ulid() {
        let err = SubmissionId::parse("SUB-notaulid").unwrap_err();
        assert!(matches!(err, IdParseError::InvalidUlid(_, _)));
    }

    #[test]
    fn test_raw_value_empty() {
        assert!(RawValue::Single(String::new()).is_empty());
        assert!(RawValue::Many(vec![]).is_empty());
        assert!(!RawValue::Single("x".to_string()).is_empty());
    }

    #[test]
    fn test_raw_value_selections() {
        let single = RawValue::from("a");
        assert_eq!(single.selections(), vec!["a"]);

        let many = RawValue::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(many.selections(), vec!["a", "b"]);
        assert!(many.as_single().is_none());
    }

    #[test]
    fn test_raw_value_accepts_unquoted_scalars() {
        // An unquoted number or bool in a submission file is stringified,
        // the same way the loader stringifies numeric content entries
        let sub: Submission = serde_yml::from_str("Int_Field: 42\n").unwrap();
        assert_eq!(sub.get("Int_Field"), Some(&RawValue::Single("42".to_string())));

        let sub: Submission = serde_yml::from_str("Float_Field: 3.25\n").unwrap();
        assert_eq!(
            sub.get("Float_Field"),
            Some(&RawValue::Single("3.25".to_string()))
        );

        let sub: Submission = serde_yml::from_str("Flag_Field: true\n").unwrap();
        assert_eq!(
            sub.get("Flag_Field"),
            Some(&RawValue::Single("true".to_string()))
        );

        let sub: Submission = serde_yml::from_str("Check_Field: [1, two]\n").unwrap();
        assert_eq!(
            sub.get("Check_Field"),
            Some(&RawValue::Many(vec!["1".to_string(), "two".to_string()]))
        );
    }

    #[test]
    fn test_submission_yaml_roundtrip() {
        let sub = Submission::new()
            .with("Text_Field", "hello")
            .with("Check_Field", vec!["Pick".to_string(), "An".to_string()]);

        let yaml = serde_yml::to_string(&sub).unwrap();
        let parsed: Submission = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(sub, parsed);
    }
}
