//! Shared helper functions for CLI commands

use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::registry::{FormRegistry, RegistryError};

/// Resolve the forms directory: flag/env, then config file, then ./forms
pub fn forms_dir(global: &GlobalOpts) -> PathBuf {
    match &global.forms_dir {
        Some(dir) => dir.clone(),
        None => Config::load().forms_dir(),
    }
}

/// Load every form definition under the resolved forms directory
pub fn load_registry(global: &GlobalOpts) -> Result<FormRegistry, RegistryError> {
    let registry = FormRegistry::new();
    registry.load_dir(&forms_dir(global))?;
    Ok(registry)
}

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Counts characters, not bytes: descriptions are free text and a cut at
/// a byte index could land inside a multibyte character.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a longer string", 10), "a longe...");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        // Must cut at character boundaries, never mid-codepoint
        let s = "é".repeat(24);
        assert_eq!(truncate_str(&s, 24), s);
        assert_eq!(truncate_str(&s, 10), format!("{}...", "é".repeat(7)));
        assert_eq!(truncate_str("日本語のフォーム説明", 8), "日本語のフ...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
