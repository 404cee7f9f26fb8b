//! Whole-submission evaluation
//!
//! Orchestrates policy checks, dependency resolution, and per-field
//! validation over a full submission. Policy violations fail fast;
//! field failures fail slow, so a caller can render every inline error
//! at once.

use thiserror::Error;

use crate::core::ledger::{SubmissionLedger, SubmissionRecord};
use crate::core::submission::{CapabilityFlags, Submission, SubmissionId};
use crate::engine::depends::active_fields;
use crate::engine::validate::{validate_field, CoercedValue, FieldError, FieldOutcome, ValidatorRegistry};
use crate::schema::model::FormDefinition;

/// Evaluation-level errors: the submission was never field-validated
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("form '{form}' does not allow anonymous access")]
    AccessDenied { form: String },

    #[error("'{identity}' has already submitted form '{form}'")]
    DuplicateSubmission { form: String, identity: String },
}

/// Overall status of an evaluated submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStatus {
    Accepted,
    Rejected,
}

/// The structured result of evaluating one submission
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Form name
    pub form: String,

    /// Record id assigned when the submission was accepted and recorded
    pub submission_id: Option<SubmissionId>,

    /// Overall status
    pub status: EvaluationStatus,

    /// Per-field outcomes for every active field, in declaration order
    pub fields: Vec<(String, FieldOutcome)>,
}

impl EvaluationReport {
    pub fn is_accepted(&self) -> bool {
        self.status == EvaluationStatus::Accepted
    }

    /// The outcome for one field, if it was active
    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, outcome)| outcome)
    }

    /// Coerced values of all accepted fields, in declaration order
    pub fn accepted_values(&self) -> Vec<(&str, &CoercedValue)> {
        self.fields
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                FieldOutcome::Accepted(v) => Some((name.as_str(), v)),
                FieldOutcome::Rejected(_) => None,
            })
            .collect()
    }

    /// One (field, reason) pair per failed field
    pub fn rejections(&self) -> Vec<(&str, &FieldError)> {
        self.fields
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                FieldOutcome::Rejected(reasons) => {
                    reasons.first().map(|r| (name.as_str(), r))
                }
                FieldOutcome::Accepted(_) => None,
            })
            .collect()
    }
}

/// Evaluate a submission against a form
///
/// Order of operations: access policy, repeat policy, dependency
/// resolution, then per-field validation of every active field. On an
/// overall accept of a no-repeat form, the submission is recorded in the
/// ledger under the caller's identity.
pub fn evaluate(
    form: &FormDefinition,
    submission: &Submission,
    caps: &CapabilityFlags,
    identity: Option<&str>,
    ledger: &dyn SubmissionLedger,
    registry: &ValidatorRegistry,
) -> Result<EvaluationReport, EvalError> {
    // (1) access policy, before any field is touched
    if !form.flags.allow_anonymous_access && !caps.is_authenticated {
        return Err(EvalError::AccessDenied {
            form: form.name.clone(),
        });
    }

    // (2) repeat policy; only trackable when the caller supplies an identity
    if !form.flags.allow_repeat && !caps.is_repeat_attempt_allowed_override {
        if let Some(who) = identity {
            if ledger.has_submitted(&form.name, who) {
                return Err(EvalError::DuplicateSubmission {
                    form: form.name.clone(),
                    identity: who.to_string(),
                });
            }
        }
    }

    // (3) activity from raw values
    let active = active_fields(form, submission);

    // (4) validate every active field; never stop at the first failure
    let mut fields = Vec::new();
    for field in &form.fields {
        if !active.contains(field.name.as_str()) {
            continue;
        }
        let outcome = validate_field(field, submission.get(&field.name), registry);
        fields.push((field.name.clone(), outcome));
    }

    let accepted = fields.iter().all(|(_, o)| o.is_accepted());

    // (5) record accepted submissions of no-repeat forms
    let submission_id = if accepted && !form.flags.allow_repeat {
        identity.map(|who| {
            let record = SubmissionRecord::new(&form.name, who);
            let id = record.id.clone();
            ledger.record(record);
            id
        })
    } else {
        None
    };

    Ok(EvaluationReport {
        form: form.name.clone(),
        submission_id,
        status: if accepted {
            EvaluationStatus::Accepted
        } else {
            EvaluationStatus::Rejected
        },
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::MemoryLedger;
    use crate::schema::load::load_str;

    const SAMPLE: &str = r#"
sample-form:
  Text_Field:
    input_field: {type: text, content: [NA], required: false}
    output_data:
      type: string
      validators:
        - {rule: min_length, min: 6}
  Pass_Field:
    input_field: {type: password, content: [""], required: false}
    output_data: {type: string, validators: []}
    _depends_on: [Radio_Field, Option]
  Radio_Field:
    input_field: {type: radio, content: [Pick, An, Option], required: false}
    output_data: {type: string, validators: []}
  Int_Field:
    input_field: {type: number, content: [0], required: false}
    output_data: {type: int, validators: []}
  _allow_repeat: false
  _allow_anonymous_access: false
"#;

    fn sample_form() -> FormDefinition {
        load_str(SAMPLE, "t.yaml").unwrap().remove(0)
    }

    fn auth() -> CapabilityFlags {
        CapabilityFlags::authenticated()
    }

    #[test]
    fn test_access_denied_before_fields() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        // Submission full of invalid values: none of them may be reported
        let sub = Submission::new().with("Int_Field", "not a number");

        let err = evaluate(
            &form,
            &sub,
            &CapabilityFlags::anonymous(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::AccessDenied { .. }));
    }

    #[test]
    fn test_short_text_rejected_with_one_reason() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        let sub = Submission::new().with("Text_Field", "hello");

        let report = evaluate(
            &form,
            &sub,
            &auth(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();

        assert!(!report.is_accepted());
        let rejections = report.rejections();
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].0, "Text_Field");
        assert!(matches!(
            rejections[0].1,
            FieldError::CustomValidatorFailure { .. }
        ));

        // Pass_Field is inactive: no outcome at all
        assert!(report.outcome("Pass_Field").is_none());
        // Nothing recorded for a rejected submission
        assert!(ledger.is_empty());
        assert!(report.submission_id.is_none());
    }

    #[test]
    fn test_dependent_field_becomes_active_and_accepted() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        let sub = Submission::new()
            .with("Text_Field", "longenough")
            .with("Radio_Field", "Option")
            .with("Pass_Field", "secret");

        let report = evaluate(
            &form,
            &sub,
            &auth(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();

        assert!(report.is_accepted());
        assert!(report.outcome("Pass_Field").unwrap().is_accepted());
        assert_eq!(
            report.outcome("Pass_Field"),
            Some(&FieldOutcome::Accepted(CoercedValue::Text(
                "secret".to_string()
            )))
        );
        assert!(report.submission_id.is_some());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_all_failing_fields_reported_at_once() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        let sub = Submission::new()
            .with("Text_Field", "short")
            .with("Int_Field", "NaN");

        let report = evaluate(
            &form,
            &sub,
            &auth(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();

        assert!(!report.is_accepted());
        let fields: Vec<&str> = report.rejections().iter().map(|(f, _)| *f).collect();
        assert_eq!(fields, vec!["Text_Field", "Int_Field"]);
    }

    #[test]
    fn test_repeat_submission_rejected() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        let sub = Submission::new().with("Text_Field", "longenough");

        let first = evaluate(
            &form,
            &sub,
            &auth(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();
        assert!(first.is_accepted());

        let err = evaluate(
            &form,
            &sub,
            &auth(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::DuplicateSubmission { .. }));

        // A different identity is unaffected
        assert!(evaluate(
            &form,
            &sub,
            &auth(),
            Some("bob"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .is_ok());
    }

    #[test]
    fn test_repeat_override_flag() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        let sub = Submission::new().with("Text_Field", "longenough");

        evaluate(
            &form,
            &sub,
            &auth(),
            Some("alice"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();

        let caps = CapabilityFlags {
            is_authenticated: true,
            is_repeat_attempt_allowed_override: true,
        };
        let again = evaluate(&form, &sub, &caps, Some("alice"), &ledger, &ValidatorRegistry::new());
        assert!(again.is_ok());
    }

    #[test]
    fn test_empty_submission_accepted_when_nothing_required() {
        let form = sample_form();
        let ledger = MemoryLedger::new();

        let report = evaluate(
            &form,
            &Submission::new(),
            &auth(),
            Some("carol"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();

        // All optional, all absent: accepted with absent values
        assert!(report.is_accepted());
        assert_eq!(
            report.outcome("Text_Field"),
            Some(&FieldOutcome::Accepted(CoercedValue::Absent))
        );
    }

    #[test]
    fn test_outcomes_follow_declaration_order() {
        let form = sample_form();
        let ledger = MemoryLedger::new();
        // BTreeMap order of the submission differs from declaration order
        let sub = Submission::new()
            .with("Int_Field", "1")
            .with("Text_Field", "longenough")
            .with("Radio_Field", "Pick");

        let report = evaluate(
            &form,
            &sub,
            &auth(),
            Some("dave"),
            &ledger,
            &ValidatorRegistry::new(),
        )
        .unwrap();

        let names: Vec<&str> = report.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Text_Field", "Radio_Field", "Int_Field"]);
    }
}
