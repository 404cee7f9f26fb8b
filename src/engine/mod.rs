//! Engine module - dependency resolution, field validation, and
//! whole-submission evaluation

pub mod depends;
pub mod evaluate;
pub mod validate;

pub use depends::active_fields;
pub use evaluate::{evaluate, EvalError, EvaluationReport, EvaluationStatus};
pub use validate::{
    validate_field, CoercedValue, FieldError, FieldOutcome, ValidatorRegistry,
};
