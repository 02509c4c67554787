//! doctree-core - rich-text document tree model
//!
//! This crate provides the document tree used to persist rich-text bodies:
//! a closed set of node variants, the nesting rules between them, and the
//! `{"type", "attributes", "children"}` serialized form. It is used by the
//! `doctree` crate, which converts trees to and from HTML and Markdown.
//!
//! # Example
//!
//! ```rust
//! use doctree_core::{Node, NodeKind, TextFormat, Tree};
//!
//! let heading = Node::build(NodeKind::heading(1), vec![Node::text("Title")]).unwrap();
//! let paragraph = Node::build(
//!     NodeKind::Paragraph,
//!     vec![Node::formatted_text("Hello", TextFormat::BOLD)],
//! )
//! .unwrap();
//! let root = Node::build(NodeKind::Root, vec![heading, paragraph]).unwrap();
//!
//! let tree = Tree::new(root).unwrap();
//! assert_eq!(tree.text_content(), "Title\n\nHello");
//! ```

mod format;
mod node;
mod tree;

pub use format::TextFormat;
pub use node::{
    tags, HeadingAttrs, ListAttrs, Node, NodeId, NodeKind, NodeRef, TableCellAttrs, TextAttrs,
};
pub use tree::{validate, Descendants, SerializedNode, SerializedTree, Tree};

/// A tree that violates the nesting or attribute rules of its variants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("`{child}` is not allowed inside `{parent}`")]
    DisallowedChild {
        parent: &'static str,
        child: &'static str,
    },

    #[error("`{tag}` cannot have children")]
    LeafWithChildren { tag: &'static str },

    #[error("tree has no root node (found `{found}` at the top)")]
    MissingRoot { found: &'static str },

    #[error("invalid `{tag}` attribute: {reason}")]
    InvalidAttribute { tag: &'static str, reason: String },
}

/// Error type for document tree operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Unknown node type: `{0}`")]
    UnknownType(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid format: `{0}`")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
