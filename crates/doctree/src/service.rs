//! DocumentConverter - the main entry point for document conversion.

use std::fmt;
use std::str::FromStr;

use doctree_core::{tags, Tree};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builtin;
use crate::markdown::MarkdownOptions;
use crate::registry::{NodeEntry, Registry};
use crate::rules::{Rule, Rules};
use crate::runtime::{HeadlessRuntime, Source};
use crate::theme::Theme;
use crate::{Error, Result};

/// Converter used by the free functions
static DEFAULT_CONVERTER: Lazy<DocumentConverter> = Lazy::new(DocumentConverter::new);

/// Text formats that can be ingested into a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Html,
    Markdown,
}

/// Text formats a tree can be exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Markdown,
}

impl FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(SourceFormat::Html),
            "markdown" => Ok(SourceFormat::Markdown),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(ExportFormat::Html),
            "markdown" => Ok(ExportFormat::Markdown),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Html => f.write_str("html"),
            SourceFormat::Markdown => f.write_str("markdown"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Html => f.write_str("html"),
            ExportFormat::Markdown => f.write_str("markdown"),
        }
    }
}

/// Options for DocumentConverter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Class names for HTML output
    pub theme: Theme,

    /// Markdown output options
    pub markdown: MarkdownOptions,
}

/// The main service for converting document trees
pub struct DocumentConverter {
    options: ConvertOptions,
    registry: Registry,
    rules: Rules,
}

impl DocumentConverter {
    /// Create a converter with the built-in node types, the scrollable table
    /// override and default options
    pub fn new() -> Self {
        Self::with_options(ConvertOptions::default())
    }

    /// Create a DocumentConverter with custom options
    pub fn with_options(options: ConvertOptions) -> Self {
        let mut registry = Registry::new();
        if let Err(err) = registry.override_entry(tags::TABLE, builtin::scrollable_table()) {
            warn!(%err, "table entry missing, keeping the plain registry");
        }
        Self::with_registry(registry, options)
    }

    /// Create a DocumentConverter around an existing registry
    pub fn with_registry(registry: Registry, options: ConvertOptions) -> Self {
        Self {
            options,
            registry,
            rules: Rules::new(),
        }
    }

    /// Runtime over this converter's components
    pub fn runtime(&self) -> HeadlessRuntime<'_> {
        HeadlessRuntime::new(
            &self.registry,
            &self.options.theme,
            &self.rules,
            &self.options.markdown,
        )
    }

    /// Render a stored tree as HTML
    pub fn render_html(&self, tree_json: &str) -> Result<String> {
        let html = self
            .runtime()
            .with_tree(Source::Json(tree_json), |session| session.to_html())?;
        debug!(bytes = html.len(), "rendered html");
        Ok(html)
    }

    /// Render a stored tree as Markdown
    pub fn render_markdown(&self, tree_json: &str) -> Result<String> {
        let markdown = self
            .runtime()
            .with_tree(Source::Json(tree_json), |session| session.to_markdown())?;
        debug!(bytes = markdown.len(), "rendered markdown");
        Ok(markdown)
    }

    /// Render a tree in the requested format
    pub fn export(&self, tree: Tree, format: ExportFormat) -> Result<String> {
        self.runtime().with_tree(Source::Tree(tree), |session| match format {
            ExportFormat::Html => session.to_html(),
            ExportFormat::Markdown => session.to_markdown(),
        })
    }

    /// Convert HTML or Markdown text to a stored tree
    pub fn ingest(&self, text: &str, format: SourceFormat) -> Result<String> {
        let markup = match format {
            SourceFormat::Html => text.to_string(),
            SourceFormat::Markdown => markdown_to_html(text),
        };
        let json = self
            .runtime()
            .with_tree(Source::Html(&markup), |session| session.to_json())?;
        debug!(%format, bytes = json.len(), "ingested text");
        Ok(json)
    }

    /// Convert HTML or Markdown text to a tree
    pub fn ingest_tree(&self, text: &str, format: SourceFormat) -> Result<Tree> {
        let markup = match format {
            SourceFormat::Html => text.to_string(),
            SourceFormat::Markdown => markdown_to_html(text),
        };
        self.runtime()
            .with_tree(Source::Html(&markup), |session| Ok(session.tree()?.clone()))
    }

    /// Add a custom Markdown rule
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Register a node type, replacing any existing entry for the tag
    pub fn register(&mut self, tag: &str, entry: NodeEntry) -> &mut Self {
        self.registry.register(tag, entry);
        self
    }

    /// Replace the entry of a registered node type
    pub fn override_node(&mut self, tag: &str, entry: NodeEntry) -> Result<&mut Self> {
        self.registry.override_entry(tag, entry)?;
        Ok(self)
    }

    /// Apply a plugin
    pub fn use_plugin<F>(&mut self, plugin: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        plugin(self);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn rules_mut(&mut self) -> &mut Rules {
        &mut self.rules
    }

    /// Get the current options
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ConvertOptions {
        &mut self.options
    }
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render Markdown to HTML with tables and strikethrough enabled
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render a stored tree as HTML with the default converter
pub fn render_html(tree_json: &str) -> Result<String> {
    DEFAULT_CONVERTER.render_html(tree_json)
}

/// Render a stored tree as Markdown with the default converter
pub fn render_markdown(tree_json: &str) -> Result<String> {
    DEFAULT_CONVERTER.render_markdown(tree_json)
}

/// Convert HTML or Markdown text to a stored tree with the default converter
pub fn ingest(text: &str, format: SourceFormat) -> Result<String> {
    DEFAULT_CONVERTER.ingest(text, format)
}
