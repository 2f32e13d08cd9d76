//! Read tool — fetch the content of one or more notes, with `*` globbing.

use async_trait::async_trait;
use notewright_core::context::RunContext;
use notewright_core::error::ToolError;
use notewright_core::store::{normalize_path, DocumentStore};
use notewright_core::tool::{parse_arguments, Tool, ToolResult};
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use crate::store_failure;

pub struct ReadTool {
    store: Arc<dyn DocumentStore>,
}

impl ReadTool {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    paths: Vec<String>,
}

enum Pattern {
    Exact(String),
    Glob(Regex),
}

impl Pattern {
    fn parse(raw: &str) -> Result<Self, ToolError> {
        let normalized = normalize_path(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if !normalized.contains('*') {
            return Ok(Pattern::Exact(normalized));
        }
        let body = normalized
            .split('*')
            .map(regex_lite::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^{body}$"))
            .map(Pattern::Glob)
            .map_err(|e| ToolError::InvalidArguments(format!("read: bad pattern '{raw}': {e}")))
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => p == path,
            Pattern::Glob(re) => re.is_match(path),
        }
    }
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read notes from the vault. Each entry is a vault path; `*` matches any run of characters."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "paths": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Paths or glob patterns, e.g. [\"Projects/*.md\"]"
                }
            },
            "required": ["paths"]
        })
    }

    fn step_label(&self, arguments: &serde_json::Value) -> String {
        let count = arguments["paths"].as_array().map_or(0, Vec::len);
        format!("Reading {count} path(s)")
    }

    fn icon(&self) -> &str {
        "book-open"
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _ctx: &RunContext,
    ) -> Result<ToolResult, ToolError> {
        let args: ReadArgs = parse_arguments(self.name(), arguments)?;
        let patterns = args
            .paths
            .iter()
            .map(|p| Pattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        let documents = self
            .store
            .all_document_paths()
            .await
            .map_err(|e| store_failure(self.name(), "/", e))?;

        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for pattern in &patterns {
            for doc in documents.iter().filter(|d| pattern.matches(d)) {
                if seen.insert(doc.as_str()) {
                    matched.push(doc.as_str());
                }
            }
        }

        if matched.is_empty() {
            return Ok(ToolResult::text("No files matched the given paths."));
        }

        let mut blocks = Vec::with_capacity(matched.len());
        for path in &matched {
            let block = match (self.store.read(path).await, self.store.metadata(path).await) {
                (Ok(content), Ok(meta)) => format!(
                    "=== {path} ===\nSize: {} bytes\nModified: {}\n\n{content}\n",
                    meta.size,
                    meta.modified.to_rfc3339()
                ),
                (Err(e), _) | (_, Err(e)) => format!("=== {path} ===\nError: {e}\n"),
            };
            blocks.push(block);
        }

        Ok(ToolResult::text(blocks.join("\n")).with_data(serde_json::json!({ "paths": matched })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InstrumentedStore;
    use notewright_store::InMemoryStore;

    fn tool() -> ReadTool {
        ReadTool::new(Arc::new(InMemoryStore::with_documents([
            ("Projects/Alpha.md", "alpha body"),
            ("Projects/Beta.md", "beta body"),
            ("Journal/2024-01-01.md", "entry"),
        ])))
    }

    async fn run(tool: &ReadTool, paths: serde_json::Value) -> ToolResult {
        tool.execute(serde_json::json!({ "paths": paths }), &RunContext::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn exact_path() {
        let result = run(&tool(), serde_json::json!(["/Projects/Alpha.md"])).await;
        assert!(result.output.starts_with("=== Projects/Alpha.md ===\nSize: 10 bytes"));
        assert!(result.output.contains("alpha body"));
        assert!(!result.output.contains("beta"));
    }

    #[tokio::test]
    async fn glob_matches_and_dedupes_in_order() {
        let result = run(&tool(), serde_json::json!(["Projects/B*", "Projects/*.md"])).await;
        let data = result.data.unwrap();
        assert_eq!(
            data["paths"],
            serde_json::json!(["Projects/Beta.md", "Projects/Alpha.md"])
        );
    }

    #[tokio::test]
    async fn star_spans_folders() {
        let result = run(&tool(), serde_json::json!(["*01-01*"])).await;
        assert!(result.output.contains("=== Journal/2024-01-01.md ==="));
    }

    #[tokio::test]
    async fn nothing_matched() {
        let result = run(&tool(), serde_json::json!(["Nope/*.md"])).await;
        assert_eq!(result.output, "No files matched the given paths.");
    }

    #[tokio::test]
    async fn dots_in_patterns_are_literal() {
        let result = run(&tool(), serde_json::json!(["Projects/Alpha.m*", "Projects/AlphaXmd"])).await;
        assert_eq!(result.data.unwrap()["paths"], serde_json::json!(["Projects/Alpha.md"]));
    }

    #[tokio::test]
    async fn failed_read_is_embedded_in_its_block() {
        let store = InstrumentedStore::new(InMemoryStore::with_documents([
            ("Projects/Alpha.md", "alpha body"),
            ("Projects/Beta.md", "beta body"),
        ]))
        .failing_read("Projects/Alpha.md");
        let tool = ReadTool::new(Arc::new(store));

        let result = run(&tool, serde_json::json!(["Projects/*"])).await;
        assert!(result
            .output
            .contains("=== Projects/Alpha.md ===\nError: I/O failure on Projects/Alpha.md: device not ready"));
        assert!(result.output.contains("=== Projects/Beta.md ===\nSize: 9 bytes"));
        assert!(result.output.contains("beta body"));
        assert_eq!(
            result.data.unwrap()["paths"],
            serde_json::json!(["Projects/Alpha.md", "Projects/Beta.md"])
        );
    }
}
