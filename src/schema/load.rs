//! Schema loading with detailed error reporting
//!
//! Parses the declarative YAML source into typed `FormDefinition`s. The
//! declaration format is a nested mapping keyed by form name, then field
//! name; form-level keys are prefixed with `_`. All violations in a
//! document are collected and reported together with source spans.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_yml::Value as YamlValue;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::schema::model::{
    ChartKind, DashboardSpec, DependsOn, FieldDefinition, FormDefinition, FormFlags, InputKind,
    OutputType,
};
use crate::schema::validators::ValidatorSpec;

/// Load-time schema error
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    /// The declaration violates the schema contract
    #[error("schema validation failed: {summary}")]
    #[diagnostic(code(intake::schema::invalid))]
    Invalid {
        summary: String,

        #[source_code]
        src: NamedSource<String>,

        #[related]
        violations: Vec<SchemaViolation>,
    },

    #[error("IO error: {0}")]
    #[diagnostic(code(intake::schema::io))]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    fn invalid(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self::Invalid {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    /// Number of violations carried by this error
    pub fn violation_count(&self) -> usize {
        match self {
            SchemaError::Invalid { violations, .. } => violations.len(),
            SchemaError::Io(_) => 1,
        }
    }

    /// Violation messages, for assertions and plain-text reporting
    pub fn messages(&self) -> Vec<String> {
        match self {
            SchemaError::Invalid { violations, .. } => {
                violations.iter().map(|v| v.message.clone()).collect()
            }
            SchemaError::Io(e) => vec![e.to_string()],
        }
    }
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Load form definitions from a YAML string
///
/// Pure function of its input: the same source always yields structurally
/// equal models or the same set of violations.
pub fn load_str(source: &str, filename: &str) -> Result<Vec<FormDefinition>, SchemaError> {
    let root: YamlValue = match serde_yml::from_str(source) {
        Ok(v) => v,
        Err(e) => {
            let span = find_error_span(source, e.location());
            let violation = SchemaViolation::new(
                format!("YAML parse error: {}", e),
                "invalid YAML".to_string(),
                span,
                Some("Check YAML syntax - proper indentation, colons, quotes".to_string()),
            );
            return Err(SchemaError::invalid(filename, source, vec![violation]));
        }
    };

    let mut ctx = LoadContext {
        source,
        violations: Vec::new(),
    };

    let forms = ctx.load_root(&root);

    if ctx.violations.is_empty() {
        Ok(forms)
    } else {
        Err(SchemaError::invalid(filename, source, ctx.violations))
    }
}

/// Load form definitions from a file
pub fn load_file(path: &Path) -> Result<Vec<FormDefinition>, SchemaError> {
    let source = std::fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    load_str(&source, &filename)
}

/// Accumulates violations while walking one document
struct LoadContext<'a> {
    source: &'a str,
    violations: Vec<SchemaViolation>,
}

const FORM_LEVEL_KEYS: &[&str] = &[
    "_dashboard",
    "_allow_repeat",
    "_description",
    "_allow_anonymous_access",
    "_allow_uploads",
    "_allow_csv_templates",
    "_suppress_default_values",
];

const FIELD_LEVEL_KEYS: &[&str] = &["input_field", "output_data", "_depends_on", "_description"];

impl<'a> LoadContext<'a> {
    fn violation(&mut self, message: String, hint: &str, key: &str, help: Option<String>) {
        let span = find_key_span(self.source, key)
            .unwrap_or_else(|| first_line_span(self.source));
        self.violations
            .push(SchemaViolation::new(message, hint.to_string(), span, help));
    }

    fn load_root(&mut self, root: &YamlValue) -> Vec<FormDefinition> {
        let mapping = match root.as_mapping() {
            Some(m) => m,
            None => {
                let span = first_line_span(self.source);
                self.violations.push(SchemaViolation::new(
                    "document root must be a mapping of form name to form body".to_string(),
                    "not a mapping".to_string(),
                    span,
                    None,
                ));
                return Vec::new();
            }
        };

        let mut forms = Vec::new();
        let mut seen = HashSet::new();

        for (key, body) in mapping {
            let name = match Some(key.as_str()) {
                Some(s) => s.to_string(),
                None => {
                    let span = first_line_span(self.source);
                    self.violations.push(SchemaViolation::new(
                        "form names must be strings".to_string(),
                        "non-string key".to_string(),
                        span,
                        None,
                    ));
                    continue;
                }
            };

            if !seen.insert(name.clone()) {
                self.violation(
                    format!("duplicate form name: '{}'", name),
                    "duplicate form",
                    &name,
                    Some("Each form name can only appear once in a document".to_string()),
                );
                continue;
            }

            if let Some(form) = self.load_form(&name, body) {
                forms.push(form);
            }
        }

        forms
    }

    fn load_form(&mut self, name: &str, body: &YamlValue) -> Option<FormDefinition> {
        let mapping = match body.as_mapping() {
            Some(m) => m,
            None => {
                self.violation(
                    format!("form '{}' body must be a mapping", name),
                    "not a mapping",
                    name,
                    None,
                );
                return None;
            }
        };

        let mut flags = FormFlags::default();
        let mut description = String::new();
        let mut dashboard_raw: Option<&YamlValue> = None;
        let mut fields = Vec::new();
        let mut seen_fields = HashSet::new();

        for (key, value) in mapping {
            let key = match Some(key.as_str()) {
                Some(s) => s,
                None => {
                    self.violation(
                        format!("keys in form '{}' must be strings", name),
                        "non-string key",
                        name,
                        None,
                    );
                    continue;
                }
            };

            if key.starts_with('_') {
                match key {
                    "_description" => {
                        description = self.expect_string(key, value).unwrap_or_default();
                    }
                    "_allow_repeat" => {
                        if let Some(b) = self.expect_bool(key, value) {
                            flags.allow_repeat = b;
                        }
                    }
                    "_allow_anonymous_access" => {
                        if let Some(b) = self.expect_bool(key, value) {
                            flags.allow_anonymous_access = b;
                        }
                    }
                    "_allow_uploads" => {
                        if let Some(b) = self.expect_bool(key, value) {
                            flags.allow_uploads = b;
                        }
                    }
                    "_allow_csv_templates" => {
                        if let Some(b) = self.expect_bool(key, value) {
                            flags.allow_csv_templates = b;
                        }
                    }
                    "_suppress_default_values" => {
                        if let Some(b) = self.expect_bool(key, value) {
                            flags.suppress_default_values = b;
                        }
                    }
                    "_dashboard" => {
                        dashboard_raw = Some(value);
                    }
                    _ => {
                        self.violation(
                            format!("unknown form-level key '{}' in form '{}'", key, name),
                            "unknown key",
                            key,
                            Some(format!("Recognized keys: {}", FORM_LEVEL_KEYS.join(", "))),
                        );
                    }
                }
            } else {
                if !seen_fields.insert(key.to_string()) {
                    self.violation(
                        format!("duplicate field name '{}' in form '{}'", key, name),
                        "duplicate field",
                        key,
                        None,
                    );
                    continue;
                }
                if let Some(field) = self.load_field(name, key, value) {
                    fields.push(field);
                }
            }
        }

        // Cross-field invariants
        self.check_dependencies(name, &fields);

        let dashboard = dashboard_raw.and_then(|raw| self.load_dashboard(name, raw, &fields));

        Some(FormDefinition {
            name: name.to_string(),
            description,
            fields,
            flags,
            dashboard,
        })
    }

    fn load_field(
        &mut self,
        form: &str,
        field_name: &str,
        body: &YamlValue,
    ) -> Option<FieldDefinition> {
        let mapping = match body.as_mapping() {
            Some(m) => m,
            None => {
                self.violation(
                    format!("field '{}.{}' must be a mapping", form, field_name),
                    "not a mapping",
                    field_name,
                    None,
                );
                return None;
            }
        };

        let mut input_kind = None;
        let mut saw_input_field = false;
        let mut content = Vec::new();
        let mut required = false;
        let mut output_type = None;
        let mut validators = Vec::new();
        let mut depends_on = None;
        let mut description = String::new();

        for (key, value) in mapping {
            let key = match Some(key.as_str()) {
                Some(s) => s,
                None => continue,
            };

            match key {
                "input_field" => {
                    saw_input_field = true;
                    if let Some((kind, c, r)) = self.load_input_field(field_name, value) {
                        input_kind = Some(kind);
                        content = c;
                        required = r;
                    }
                }
                "output_data" => {
                    if let Some((ty, v)) = self.load_output_data(field_name, value) {
                        output_type = Some(ty);
                        validators = v;
                    }
                }
                "_depends_on" => {
                    depends_on = self.load_depends_on(field_name, value);
                }
                "_description" => {
                    description = self.expect_string(key, value).unwrap_or_default();
                }
                _ => {
                    self.violation(
                        format!("unknown key '{}' in field '{}.{}'", key, form, field_name),
                        "unknown key",
                        key,
                        Some(format!("Recognized keys: {}", FIELD_LEVEL_KEYS.join(", "))),
                    );
                }
            }
        }

        let input_kind = match input_kind {
            Some(k) => k,
            None => {
                // A present-but-invalid input_field already produced a violation
                if !saw_input_field {
                    self.violation(
                        format!("field '{}.{}' is missing 'input_field'", form, field_name),
                        "missing input_field",
                        field_name,
                        Some("Every field needs an input_field block with a type".to_string()),
                    );
                }
                return None;
            }
        };

        // output_data is optional in the declaration; string out by default
        let output_type = output_type.unwrap_or_default();

        if output_type == OutputType::List && !input_kind.is_multi_select() {
            self.violation(
                format!(
                    "field '{}.{}': output type 'list' requires a checkbox input (got '{}')",
                    form, field_name, input_kind
                ),
                "list needs multi-select",
                field_name,
                Some("Only checkbox inputs can produce more than one value".to_string()),
            );
        }

        for spec in &validators {
            if let Some(problem) = spec.well_formedness_error() {
                self.violation(
                    format!(
                        "field '{}.{}': malformed validator {}: {}",
                        form,
                        field_name,
                        spec.rule_name(),
                        problem
                    ),
                    "malformed validator",
                    field_name,
                    None,
                );
            }
        }

        Some(FieldDefinition {
            name: field_name.to_string(),
            input_kind,
            content,
            required,
            output_type,
            validators,
            depends_on,
            description,
        })
    }

    fn load_input_field(
        &mut self,
        field_name: &str,
        value: &YamlValue,
    ) -> Option<(InputKind, Vec<String>, bool)> {
        let mapping = match value.as_mapping() {
            Some(m) => m,
            None => {
                self.violation(
                    format!("'input_field' of '{}' must be a mapping", field_name),
                    "not a mapping",
                    field_name,
                    None,
                );
                return None;
            }
        };

        let mut kind = None;
        let mut content = Vec::new();
        let mut required = false;

        for (key, v) in mapping {
            match Some(key.as_str()) {
                Some("type") => {
                    let raw = self.expect_string("type", v)?;
                    match raw.parse::<InputKind>() {
                        Ok(k) => kind = Some(k),
                        Err(e) => {
                            self.violation(
                                format!("field '{}': {}", field_name, e),
                                "unknown input kind",
                                field_name,
                                Some(
                                    "Valid kinds: text, password, radio, select, checkbox, \
                                     date, hidden, number, file"
                                        .to_string(),
                                ),
                            );
                            return None;
                        }
                    }
                }
                Some("content") => {
                    content = self.load_content(field_name, v);
                }
                Some("required") => {
                    required = self.expect_bool("required", v).unwrap_or(false);
                }
                Some(other) => {
                    self.violation(
                        format!("unknown key '{}' in input_field of '{}'", other, field_name),
                        "unknown key",
                        other,
                        Some("Recognized keys: type, content, required".to_string()),
                    );
                }
                None => {}
            }
        }

        match kind {
            Some(k) => Some((k, content, required)),
            None => {
                self.violation(
                    format!("input_field of '{}' is missing 'type'", field_name),
                    "missing type",
                    field_name,
                    None,
                );
                None
            }
        }
    }

    fn load_output_data(
        &mut self,
        field_name: &str,
        value: &YamlValue,
    ) -> Option<(OutputType, Vec<ValidatorSpec>)> {
        let mapping = match value.as_mapping() {
            Some(m) => m,
            None => {
                self.violation(
                    format!("'output_data' of '{}' must be a mapping", field_name),
                    "not a mapping",
                    field_name,
                    None,
                );
                return None;
            }
        };

        let mut ty = OutputType::default();
        let mut validators = Vec::new();

        for (key, v) in mapping {
            match Some(key.as_str()) {
                Some("type") => {
                    let raw = self.expect_string("type", v)?;
                    match raw.parse::<OutputType>() {
                        Ok(t) => ty = t,
                        Err(e) => {
                            self.violation(
                                format!("field '{}': {}", field_name, e),
                                "unknown output type",
                                field_name,
                                Some("Valid types: string, integer, float, list".to_string()),
                            );
                        }
                    }
                }
                Some("validators") => {
                    match serde_yml::from_value::<Vec<ValidatorSpec>>(v.clone()) {
                        Ok(specs) => validators = specs,
                        Err(e) => {
                            self.violation(
                                format!("field '{}': invalid validators: {}", field_name, e),
                                "invalid validators",
                                field_name,
                                Some(
                                    "Validators are a list of {rule: ..., ...} mappings, \
                                     e.g. {rule: min_length, min: 6}"
                                        .to_string(),
                                ),
                            );
                        }
                    }
                }
                Some(other) => {
                    self.violation(
                        format!("unknown key '{}' in output_data of '{}'", other, field_name),
                        "unknown key",
                        other,
                        Some("Recognized keys: type, validators".to_string()),
                    );
                }
                None => {}
            }
        }

        Some((ty, validators))
    }

    fn load_depends_on(&mut self, field_name: &str, value: &YamlValue) -> Option<DependsOn> {
        let seq = match value.as_sequence() {
            Some(s) if s.len() == 2 => s,
            _ => {
                self.violation(
                    format!(
                        "'_depends_on' of '{}' must be a two-element sequence [field, value]",
                        field_name
                    ),
                    "bad _depends_on",
                    field_name,
                    Some("Example: _depends_on: [Radio_Field, Option]".to_string()),
                );
                return None;
            }
        };

        let target = scalar_to_string(&seq[0]);
        let expected = scalar_to_string(&seq[1]);
        match (target, expected) {
            (Some(field), Some(value)) => Some(DependsOn { field, value }),
            _ => {
                self.violation(
                    format!("'_depends_on' of '{}' must contain scalar values", field_name),
                    "bad _depends_on",
                    field_name,
                    None,
                );
                None
            }
        }
    }

    fn load_content(&mut self, field_name: &str, value: &YamlValue) -> Vec<String> {
        let seq = match value.as_sequence() {
            Some(s) => s,
            None => {
                self.violation(
                    format!("'content' of '{}' must be a sequence", field_name),
                    "not a sequence",
                    field_name,
                    None,
                );
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for item in seq {
            match item {
                // Null placeholders (e.g. a file field with no default) are dropped
                YamlValue::Null => {}
                other => match scalar_to_string(other) {
                    Some(s) => out.push(s),
                    None => {
                        self.violation(
                            format!("'content' of '{}' must contain scalars", field_name),
                            "non-scalar content",
                            field_name,
                            None,
                        );
                    }
                },
            }
        }
        out
    }

    fn load_dashboard(
        &mut self,
        form: &str,
        value: &YamlValue,
        fields: &[FieldDefinition],
    ) -> Option<DashboardSpec> {
        let mapping = match value.as_mapping() {
            Some(m) => m,
            None => {
                self.violation(
                    format!("'_dashboard' of form '{}' must be a mapping", form),
                    "not a mapping",
                    "_dashboard",
                    None,
                );
                return None;
            }
        };

        let mut chart = None;
        let mut roles = std::collections::BTreeMap::new();

        for (key, v) in mapping {
            match Some(key.as_str()) {
                Some("type") => {
                    let raw = self.expect_string("type", v)?;
                    match raw.parse::<ChartKind>() {
                        Ok(c) => chart = Some(c),
                        Err(e) => {
                            self.violation(
                                format!("dashboard of form '{}': {}", form, e),
                                "unknown chart kind",
                                "_dashboard",
                                Some("Valid kinds: scatter, line, bar".to_string()),
                            );
                            return None;
                        }
                    }
                }
                Some("fields") => {
                    let role_map = match v.as_mapping() {
                        Some(m) => m,
                        None => {
                            self.violation(
                                format!("dashboard 'fields' of form '{}' must be a mapping", form),
                                "not a mapping",
                                "fields",
                                None,
                            );
                            continue;
                        }
                    };
                    for (role, target) in role_map {
                        let (role, target) = match (Some(role.as_str()), target.as_str()) {
                            (Some(r), Some(t)) => (r.to_string(), t.to_string()),
                            _ => {
                                self.violation(
                                    format!(
                                        "dashboard roles of form '{}' must map strings to \
                                         field names",
                                        form
                                    ),
                                    "bad role binding",
                                    "fields",
                                    None,
                                );
                                continue;
                            }
                        };
                        roles.insert(role, target);
                    }
                }
                Some(other) => {
                    self.violation(
                        format!("unknown key '{}' in dashboard of form '{}'", other, form),
                        "unknown key",
                        other,
                        Some("Recognized keys: type, fields".to_string()),
                    );
                }
                None => {}
            }
        }

        let chart = match chart {
            Some(c) => c,
            None => {
                self.violation(
                    format!("dashboard of form '{}' is missing 'type'", form),
                    "missing type",
                    "_dashboard",
                    None,
                );
                return None;
            }
        };

        // Every role must bind to a declared field or a reserved column
        let form_def = FormDefinition {
            name: form.to_string(),
            description: String::new(),
            fields: fields.to_vec(),
            flags: FormFlags::default(),
            dashboard: None,
        };
        for (role, target) in &roles {
            if !form_def.resolves_column(target) {
                self.violation(
                    format!(
                        "dashboard role '{}' of form '{}' references unknown field '{}'",
                        role, form, target
                    ),
                    "unknown field",
                    target,
                    Some("Roles may bind to declared fields or the Timestamp column".to_string()),
                );
            }
        }

        Some(DashboardSpec { chart, roles })
    }

    /// Dependency invariants: targets exist, the expected value is among the
    /// target's content, and the graph is flat (a target never declares its
    /// own dependency, which rules out chains and cycles in one check)
    fn check_dependencies(&mut self, form: &str, fields: &[FieldDefinition]) {
        for field in fields {
            let dep = match &field.depends_on {
                Some(d) => d,
                None => continue,
            };

            let target = match fields.iter().find(|f| f.name == dep.field) {
                Some(t) => t,
                None => {
                    self.violation(
                        format!(
                            "field '{}.{}' depends on unknown field '{}'",
                            form, field.name, dep.field
                        ),
                        "unknown dependency target",
                        &field.name,
                        None,
                    );
                    continue;
                }
            };

            if !target.content.iter().any(|c| c == &dep.value) {
                self.violation(
                    format!(
                        "field '{}.{}' depends on value '{}' which is not among the \
                         content of '{}'",
                        form, field.name, dep.value, dep.field
                    ),
                    "value not in target content",
                    &field.name,
                    Some(format!("Declared content of '{}': {}", dep.field, target.content.join(", "))),
                );
            }

            if target.depends_on.is_some() {
                self.violation(
                    format!(
                        "field '{}.{}' depends on '{}', which itself declares a dependency; \
                         dependency chains are not allowed",
                        form, field.name, dep.field
                    ),
                    "dependency chain",
                    &field.name,
                    Some("Dependencies are one hop only: a target field must be unconditional".to_string()),
                );
            }
        }
    }

    fn expect_string(&mut self, key: &str, value: &YamlValue) -> Option<String> {
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.violation(
                    format!("'{}' must be a string", key),
                    "wrong type",
                    key,
                    None,
                );
                None
            }
        }
    }

    fn expect_bool(&mut self, key: &str, value: &YamlValue) -> Option<bool> {
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.violation(
                    format!("'{}' must be a boolean", key),
                    "wrong type",
                    key,
                    Some("Use true or false".to_string()),
                );
                None
            }
        }
    }
}

/// Render a YAML scalar as its string form
fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Find the span (byte offset, length) for a YAML parse error location
fn find_error_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    if let Some(loc) = location {
        let line = loc.line().saturating_sub(1);
        let column = loc.column().saturating_sub(1);

        let mut offset = 0;
        for (i, line_content) in content.lines().enumerate() {
            if i == line {
                offset += column;
                break;
            }
            offset += line_content.len() + 1; // +1 for newline
        }

        // The reported column is character-based; the computed offset can
        // land inside a multibyte character, so slice fallibly
        match content.get(offset.min(content.len())..) {
            Some(rest) => {
                let len = rest.find('\n').unwrap_or(rest.len()).max(1);
                (offset, len).into()
            }
            None => first_line_span(content),
        }
    } else {
        first_line_span(content)
    }
}

fn first_line_span(content: &str) -> SourceSpan {
    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Find the span of a key in YAML content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let search_pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&search_pattern) {
            let key_start = offset + (line.len() - trimmed.len());
            return Some((key_start, key.len().max(1)).into());
        }
        offset += line.len() + 1; // +1 for newline
    }
    None
}
