//! Intake: a schema-driven form engine
//!
//! Form definitions live as plain text YAML documents. The engine loads
//! them into a typed model, resolves inter-field dependencies, coerces and
//! validates submitted values, and produces structured per-field outcomes
//! for a rendering or storage layer to consume.

pub mod cli;
pub mod core;
pub mod engine;
pub mod schema;
