//! Protected paths — parts of the vault the tools must never touch.
//!
//! A single-segment pattern (e.g. `.obsidian`) protects any path containing
//! that segment. A multi-segment pattern protects that folder and everything
//! under it. Matching is case-insensitive.

use notewright_core::error::ToolError;
use notewright_core::store::normalize_path;

#[derive(Debug, Clone, Default)]
pub struct ProtectedPaths {
    patterns: Vec<String>,
}

impl ProtectedPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| normalize_path(p.as_ref()).ok())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_lowercase())
            .collect();
        Self { patterns }
    }

    /// The pattern that protects `path`, if any.
    pub fn matching(&self, path: &str) -> Option<&str> {
        let path = path.to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| {
                if pattern.contains('/') {
                    path == **pattern || path.starts_with(&format!("{pattern}/"))
                } else {
                    path.split('/').any(|segment| segment == pattern.as_str())
                }
            })
            .map(String::as_str)
    }

    /// Reject `path` on behalf of `tool_name` if it is protected.
    pub fn check(&self, tool_name: &str, path: &str) -> Result<(), ToolError> {
        match self.matching(path) {
            Some(pattern) => Err(ToolError::PermissionDenied {
                tool_name: tool_name.to_string(),
                reason: format!("'{path}' is protected by pattern '{pattern}'"),
            }),
            None => Ok(()),
        }
    }
}
