//! Typed form model
//!
//! The model is built once by the loader and never mutated afterwards; a
//! `FormDefinition` lives behind an `Arc` in the registry and may be read
//! from many threads at once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::schema::validators::ValidatorSpec;

/// Input widget kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Password,
    Radio,
    Select,
    Checkbox,
    Date,
    Hidden,
    Number,
    File,
}

impl InputKind {
    /// Whether submitted values must come from the declared content choices
    pub fn is_enumerated(&self) -> bool {
        matches!(self, InputKind::Radio | InputKind::Select | InputKind::Checkbox)
    }

    /// Whether this widget can produce more than one selection
    pub fn is_multi_select(&self) -> bool {
        matches!(self, InputKind::Checkbox)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Password => "password",
            InputKind::Radio => "radio",
            InputKind::Select => "select",
            InputKind::Checkbox => "checkbox",
            InputKind::Date => "date",
            InputKind::Hidden => "hidden",
            InputKind::Number => "number",
            InputKind::File => "file",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(InputKind::Text),
            "password" => Ok(InputKind::Password),
            "radio" => Ok(InputKind::Radio),
            "select" => Ok(InputKind::Select),
            "checkbox" => Ok(InputKind::Checkbox),
            "date" => Ok(InputKind::Date),
            "hidden" => Ok(InputKind::Hidden),
            "number" => Ok(InputKind::Number),
            "file" => Ok(InputKind::File),
            _ => Err(format!("unknown input kind: {}", s)),
        }
    }
}

/// Expected output type after coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum OutputType {
    #[default]
    String,
    Integer,
    Float,
    List,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::String => "string",
            OutputType::Integer => "integer",
            OutputType::Float => "float",
            OutputType::List => "list",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the aliases the declaration format has historically used
        match s.to_lowercase().as_str() {
            "str" | "string" => Ok(OutputType::String),
            "int" | "integer" => Ok(OutputType::Integer),
            "float" => Ok(OutputType::Float),
            "list" => Ok(OutputType::List),
            _ => Err(format!("unknown output type: {}", s)),
        }
    }
}

/// A one-hop dependency on another field's submitted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsOn {
    /// The field this one depends on (the dependency target)
    pub field: String,
    /// The target's value that activates this field
    pub value: String,
}

/// One input unit of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name, unique within its form
    pub name: String,

    /// Input widget kind
    pub input_kind: InputKind,

    /// Candidate/default values; semantics depend on the input kind:
    /// initial text, enumerated choices, numeric default, or placeholder
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<String>,

    /// Whether a value must be submitted when the field is active
    #[serde(default)]
    pub required: bool,

    /// Expected output type after coercion
    #[serde(default)]
    pub output_type: OutputType,

    /// Validator specs run, in order, over the coerced value
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorSpec>,

    /// Activation condition, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,

    /// Human description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FieldDefinition {
    /// The default value rendered into templates, if the field has one
    pub fn default_value(&self) -> Option<&str> {
        match self.input_kind {
            // Choice widgets have no single default; their content is choices
            InputKind::Radio | InputKind::Select | InputKind::Checkbox => None,
            _ => self.content.first().map(String::as_str),
        }
    }
}

/// Form-level policy flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormFlags {
    /// Allow the same identity to submit more than once
    pub allow_repeat: bool,
    /// Allow evaluation of submissions without an authenticated identity
    pub allow_anonymous_access: bool,
    /// Allow file-kind fields to be honored
    pub allow_uploads: bool,
    /// Allow CSV entry template generation
    pub allow_csv_templates: bool,
    /// Leave default values out of generated templates
    pub suppress_default_values: bool,
}

impl Default for FormFlags {
    fn default() -> Self {
        Self {
            allow_repeat: true,
            allow_anonymous_access: true,
            allow_uploads: false,
            allow_csv_templates: false,
            suppress_default_values: false,
        }
    }
}

/// Dashboard chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Scatter,
    Line,
    Bar,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Scatter => write!(f, "scatter"),
            ChartKind::Line => write!(f, "line"),
            ChartKind::Bar => write!(f, "bar"),
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scatter" => Ok(ChartKind::Scatter),
            "line" => Ok(ChartKind::Line),
            "bar" => Ok(ChartKind::Bar),
            _ => Err(format!("unknown chart kind: {}", s)),
        }
    }
}

/// Binding between a dashboard chart and form fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSpec {
    /// Chart kind
    pub chart: ChartKind,

    /// Axis/role name ("x", "y", "color", ...) to field name
    pub roles: BTreeMap<String, String>,
}

/// Columns the engine attaches to every accepted submission; dashboard
/// roles may bind to these in addition to declared fields
pub const RESERVED_COLUMNS: &[&str] = &["Timestamp"];

/// A complete form definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Unique form name (registry key)
    pub name: String,

    /// Human description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Fields in declaration order
    pub fields: Vec<FieldDefinition>,

    /// Form-level policy flags
    #[serde(default)]
    pub flags: FormFlags,

    /// Dashboard binding, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardSpec>,
}

impl FormDefinition {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Whether `name` is a declared field or a reserved submission column
    pub fn resolves_column(&self, name: &str) -> bool {
        self.field(name).is_some() || RESERVED_COLUMNS.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_parse() {
        assert_eq!("radio".parse::<InputKind>().unwrap(), InputKind::Radio);
        assert_eq!("CHECKBOX".parse::<InputKind>().unwrap(), InputKind::Checkbox);
        assert!("dropdown".parse::<InputKind>().is_err());
    }

    #[test]
    fn test_output_type_aliases() {
        assert_eq!("str".parse::<OutputType>().unwrap(), OutputType::String);
        assert_eq!("string".parse::<OutputType>().unwrap(), OutputType::String);
        assert_eq!("int".parse::<OutputType>().unwrap(), OutputType::Integer);
        assert!("decimal".parse::<OutputType>().is_err());
    }

    #[test]
    fn test_enumerated_kinds() {
        assert!(InputKind::Radio.is_enumerated());
        assert!(InputKind::Select.is_enumerated());
        assert!(InputKind::Checkbox.is_enumerated());
        assert!(!InputKind::Text.is_enumerated());
        assert!(InputKind::Checkbox.is_multi_select());
        assert!(!InputKind::Radio.is_multi_select());
    }

    #[test]
    fn test_default_value_skips_choice_widgets() {
        let field = FieldDefinition {
            name: "Radio_Field".to_string(),
            input_kind: InputKind::Radio,
            content: vec!["Pick".to_string(), "An".to_string(), "Option".to_string()],
            required: false,
            output_type: OutputType::String,
            validators: Vec::new(),
            depends_on: None,
            description: String::new(),
        };
        assert_eq!(field.default_value(), None);

        let text = FieldDefinition {
            name: "Text_Field".to_string(),
            input_kind: InputKind::Text,
            content: vec!["NA".to_string()],
            ..field
        };
        assert_eq!(text.default_value(), Some("NA"));
    }

    #[test]
    fn test_reserved_columns_resolve() {
        let form = FormDefinition {
            name: "f".to_string(),
            description: String::new(),
            fields: Vec::new(),
            flags: FormFlags::default(),
            dashboard: None,
        };
        assert!(form.resolves_column("Timestamp"));
        assert!(!form.resolves_column("Nope"));
    }
}
