//! Schema system - the typed form model and its YAML loader

pub mod load;
pub mod model;
pub mod validators;

pub use load::{load_file, load_str, SchemaError, SchemaViolation};
pub use model::{
    ChartKind, DashboardSpec, DependsOn, FieldDefinition, FormDefinition, FormFlags, InputKind,
    OutputType,
};
pub use validators::ValidatorSpec;
