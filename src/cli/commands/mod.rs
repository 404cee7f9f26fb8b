//! Command implementations

pub mod check;
pub mod completions;
pub mod lint;
pub mod list;
pub mod show;
pub mod template;
