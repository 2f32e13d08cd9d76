//! # Notewright Core
//!
//! Domain types, traits, and error definitions for the Notewright note-building
//! agent. This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (model provider, document store, tool) is defined as a
//! trait here. Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod attachment;
pub mod context;
pub mod error;
pub mod message;
pub mod progress;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use attachment::{Attachment, ProviderRef};
pub use context::RunContext;
pub use error::{Error, ProviderError, Result, StoreError, ToolError};
pub use message::{Conversation, Message, Part, Role};
pub use progress::{ProgressEvent, ProgressLog, StepEntry, StepHandle, StepStatus};
pub use provider::{Provider, StreamChunk, ToolCallRequest, ToolDefinition, TurnRequest, TurnResponse};
pub use store::{DocumentMeta, DocumentStore, LinkRef, Node, NodeKind};
pub use tool::{Tool, ToolRegistry, ToolResult};
