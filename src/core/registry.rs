//! Form registry
//!
//! Process-wide mapping from form name to definition. Registration takes
//! the write lock and publishes the definition behind an `Arc` in one
//! swap; readers clone the `Arc` and never observe a partially built
//! form. Definitions are immutable once published.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use walkdir::WalkDir;

use crate::schema::load::{load_file, SchemaError};
use crate::schema::model::{FormDefinition, FormFlags};

/// Errors from registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a form named '{name}' is already registered (use replace to overwrite)")]
    DuplicateName { name: String },

    #[error("no form named '{name}' is registered")]
    NotFound { name: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Holds named form definitions
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: RwLock<HashMap<String, Arc<FormDefinition>>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new form; duplicate names are an error
    pub fn register(&self, form: FormDefinition) -> Result<(), RegistryError> {
        let mut forms = self.forms.write().expect("registry lock poisoned");
        if forms.contains_key(&form.name) {
            return Err(RegistryError::DuplicateName {
                name: form.name.clone(),
            });
        }
        forms.insert(form.name.clone(), Arc::new(form));
        Ok(())
    }

    /// Replace a form, or register it if absent
    pub fn replace(&self, form: FormDefinition) {
        let mut forms = self.forms.write().expect("registry lock poisoned");
        forms.insert(form.name.clone(), Arc::new(form));
    }

    /// Remove a form
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        let mut forms = self.forms.write().expect("registry lock poisoned");
        forms
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Look up a form by name
    pub fn get(&self, name: &str) -> Result<Arc<FormDefinition>, RegistryError> {
        self.forms
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// A form's policy flags
    pub fn flags(&self, name: &str) -> Result<FormFlags, RegistryError> {
        self.get(name).map(|form| form.flags)
    }

    /// Registered form names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .forms
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.forms.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load and register every `*.form.yaml` document under a directory
    ///
    /// Returns the number of forms registered. The first schema or
    /// duplicate-name error aborts the load.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, RegistryError> {
        let mut count = 0;

        if !dir.exists() {
            return Ok(0);
        }

        let mut paths: Vec<_> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.to_string_lossy().ends_with(".form.yaml"))
            .collect();
        paths.sort();

        for path in paths {
            for form in load_file(&path)? {
                self.register(form)?;
                count += 1;
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load::load_str;
    use std::fs;
    use tempfile::tempdir;

    fn minimal_form(name: &str) -> FormDefinition {
        let yaml = format!(
            "{}:\n  A:\n    input_field: {{type: text, content: []}}\n    output_data: {{type: string, validators: []}}\n",
            name
        );
        load_str(&yaml, "t.yaml").unwrap().remove(0)
    }

    #[test]
    fn test_register_and_get() {
        let registry = FormRegistry::new();
        registry.register(minimal_form("contact")).unwrap();

        let form = registry.get("contact").unwrap();
        assert_eq!(form.name, "contact");
        assert_eq!(registry.names(), vec!["contact"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = FormRegistry::new();
        registry.register(minimal_form("contact")).unwrap();

        let err = registry.register(minimal_form("contact")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
    }

    #[test]
    fn test_replace_overwrites() {
        let registry = FormRegistry::new();
        registry.register(minimal_form("contact")).unwrap();
        registry.replace(minimal_form("contact"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_flags_lookup() {
        let registry = FormRegistry::new();
        registry.register(minimal_form("contact")).unwrap();
        let flags = registry.flags("contact").unwrap();
        assert!(flags.allow_repeat);
        assert!(flags.allow_anonymous_access);
    }

    #[test]
    fn test_get_unknown_form() {
        let registry = FormRegistry::new();
        let err = registry.get("ghost").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn test_unregister() {
        let registry = FormRegistry::new();
        registry.register(minimal_form("contact")).unwrap();
        registry.unregister("contact").unwrap();
        assert!(registry.is_empty());
        assert!(registry.unregister("contact").is_err());
    }

    #[test]
    fn test_readers_share_one_definition() {
        let registry = FormRegistry::new();
        registry.register(minimal_form("contact")).unwrap();

        let a = registry.get("contact").unwrap();
        let b = registry.get("contact").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("contact.form.yaml"),
            "contact:\n  A:\n    input_field: {type: text, content: []}\n    output_data: {type: string, validators: []}\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a form").unwrap();

        let registry = FormRegistry::new();
        let count = registry.load_dir(dir.path()).unwrap();
        assert_eq!(count, 1);
        assert!(registry.get("contact").is_ok());
    }

    #[test]
    fn test_load_dir_missing_is_empty() {
        let registry = FormRegistry::new();
        let count = registry.load_dir(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_load_dir_propagates_schema_errors() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("bad.form.yaml"),
            "f:\n  A:\n    input_field: {type: dropdown, content: []}\n    output_data: {type: string, validators: []}\n",
        )
        .unwrap();

        let registry = FormRegistry::new();
        let err = registry.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Schema(_)));
    }
}
