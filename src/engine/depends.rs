//! Dependency resolution
//!
//! Decides which fields of a form are active for a given (possibly
//! partial) submission. Dependencies are matched against raw, uncoerced
//! values: a dependency target's coercion might itself fail, and activity
//! must still be decidable.

use std::collections::HashSet;

use crate::core::submission::Submission;
use crate::schema::model::FormDefinition;

/// Compute the set of active field names
///
/// A field with no dependency is always active. A field depending on
/// `(X, v)` is active iff the submission holds a single value for `X`
/// that equals `v` exactly. One pass in declaration order suffices: the
/// loader guarantees the dependency graph is flat (targets are never
/// themselves dependent).
pub fn active_fields<'a>(form: &'a FormDefinition, submission: &Submission) -> HashSet<&'a str> {
    let mut active = HashSet::new();

    for field in &form.fields {
        match &field.depends_on {
            None => {
                active.insert(field.name.as_str());
            }
            Some(dep) => {
                let satisfied = submission
                    .get(&dep.field)
                    .and_then(|raw| raw.as_single())
                    .map(|v| v == dep.value)
                    .unwrap_or(false);
                if satisfied {
                    active.insert(field.name.as_str());
                }
            }
        }
    }

    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load::load_str;

    const FORM: &str = r#"
f:
  Text_Field:
    input_field: {type: text, content: [NA]}
    output_data: {type: string, validators: []}
  Radio_Field:
    input_field: {type: radio, content: [Pick, An, Option]}
    output_data: {type: string, validators: []}
  Pass_Field:
    input_field: {type: password, content: [""]}
    output_data: {type: string, validators: []}
    _depends_on: [Radio_Field, Option]
"#;

    fn form() -> FormDefinition {
        load_str(FORM, "t.yaml").unwrap().remove(0)
    }

    #[test]
    fn test_independent_fields_always_active() {
        let form = form();

        let empty = Submission::new();
        let active = active_fields(&form, &empty);
        assert!(active.contains("Text_Field"));
        assert!(active.contains("Radio_Field"));

        let unrelated = Submission::new().with("Text_Field", "whatever");
        let active = active_fields(&form, &unrelated);
        assert!(active.contains("Text_Field"));
        assert!(active.contains("Radio_Field"));
    }

    #[test]
    fn test_dependent_field_inactive_by_default() {
        let form = form();
        let active = active_fields(&form, &Submission::new());
        assert!(!active.contains("Pass_Field"));
    }

    #[test]
    fn test_dependent_field_active_on_exact_match() {
        let form = form();
        let sub = Submission::new().with("Radio_Field", "Option");
        assert!(active_fields(&form, &sub).contains("Pass_Field"));
    }

    #[test]
    fn test_dependent_field_requires_exact_equality() {
        let form = form();
        for near_miss in ["option", "Option ", "Opt", ""] {
            let sub = Submission::new().with("Radio_Field", near_miss);
            assert!(
                !active_fields(&form, &sub).contains("Pass_Field"),
                "'{}' must not activate Pass_Field",
                near_miss
            );
        }
    }

    #[test]
    fn test_other_fields_never_change_activity() {
        let form = form();
        let with_match = Submission::new()
            .with("Radio_Field", "Option")
            .with("Text_Field", "anything at all");
        assert!(active_fields(&form, &with_match).contains("Pass_Field"));

        let without_match = Submission::new().with("Text_Field", "anything at all");
        assert!(!active_fields(&form, &without_match).contains("Pass_Field"));
    }

    #[test]
    fn test_multi_value_never_satisfies_dependency() {
        let form = form();
        let sub = Submission::new().with(
            "Radio_Field",
            vec!["Option".to_string(), "Pick".to_string()],
        );
        assert!(!active_fields(&form, &sub).contains("Pass_Field"));
    }
}
