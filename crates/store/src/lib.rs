//! Document store implementations for Notewright.

pub mod fs_backend;
pub mod in_memory;
pub mod links;
pub mod tree;

pub use fs_backend::FsDocumentStore;
pub use in_memory::InMemoryStore;
pub use links::{parse_links, resolve_link};
pub use tree::{render_tree, sort_nodes};
