//! Core module - configuration, submissions, and the form registry

pub mod config;
pub mod ledger;
pub mod registry;
pub mod submission;

pub use config::Config;
pub use ledger::{MemoryLedger, SubmissionLedger, SubmissionRecord};
pub use registry::{FormRegistry, RegistryError};
pub use submission::{CapabilityFlags, IdParseError, RawValue, Submission, SubmissionId};
