//! # doctree
//!
//! Convert rich-text document trees to HTML and Markdown, and HTML or
//! Markdown text back into trees.
//!
//! ## Design
//!
//! Every node type is described by a [`NodeEntry`] in a [`Registry`]: how it
//! is written as HTML, how it is read back from HTML elements, and how its
//! attributes travel through the stored JSON form. Entries can be replaced
//! per converter, so a host can change the markup of one node type (for
//! example wrapping tables in a scrollable container) without touching the
//! others.
//!
//! - **HTML output** goes through [`HtmlWriter`] with class names from a [`Theme`]
//! - **Markdown output** goes through a [`Rules`] set, custom rules first
//! - **Ingestion** parses HTML with `tl`; Markdown is rendered to HTML first
//!
//! Each conversion runs in a [`HeadlessRuntime`] session on its own tree, so a
//! [`DocumentConverter`] can be shared between threads.
//!
//! ## Example
//!
//! ```rust
//! use doctree::{ingest, render_html, render_markdown, SourceFormat};
//!
//! let json = ingest("<h1>Title</h1><p><b>Hello</b></p>", SourceFormat::Html).unwrap();
//!
//! assert_eq!(render_markdown(&json).unwrap(), "# Title\n\n**Hello**");
//! assert_eq!(
//!     render_html(&json).unwrap(),
//!     r#"<h1 class="glyf-editor-h1"><span>Title</span></h1><p><strong class="glyf-editor-bold">Hello</strong></p>"#
//! );
//! ```

pub mod builtin;
pub mod document;
pub mod html;
pub mod markdown;
pub mod registry;
pub mod render;
mod rules;
pub mod runtime;
mod service;
pub mod theme;
mod utilities;

pub use doctree_core::{
    tags, Error, HeadingAttrs, ListAttrs, Node, NodeId, NodeKind, NodeRef, Result,
    SerializedNode, SerializedTree, StructuralError, TableCellAttrs, TextAttrs, TextFormat, Tree,
};
pub use document::{
    export_document, Document, DocumentDraft, DocumentPatch, DocumentStore, ExportedDocument,
    IdentityError, IdentityResolver, ListRequest, ListResponse, OrderBy, SortOrder,
};
pub use html::HtmlParser;
pub use markdown::{MarkdownOptions, MarkdownSerializer};
pub use registry::{Element, ElementFilter, HtmlImport, NodeEntry, Registry};
pub use render::HtmlWriter;
pub use rules::{gfm_table_rule, Delimiter, Filter, MarkRule, Rule, Rules};
pub use runtime::{HeadlessRuntime, Session, Source};
pub use service::{
    ingest, markdown_to_html, render_html, render_markdown, ConvertOptions, DocumentConverter,
    ExportFormat, SourceFormat,
};
pub use theme::{Theme, ThemeClass};
pub use utilities::escape_markdown;
