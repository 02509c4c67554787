//! Node type registry.
//!
//! Each type tag maps to a [`NodeEntry`] describing how nodes of that type are
//! created, loaded from and saved to JSON, rendered as HTML, and recognized in
//! incoming markup. Overriding an entry swaps all of that for one tag without
//! touching the others.

use std::fmt;

use doctree_core::{Node, NodeKind, SerializedNode, SerializedTree, TextFormat, Tree};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::render::HtmlWriter;
use crate::{builtin, Error, Result};

/// Type alias for HTML export functions
pub type ExportHtmlFn = Box<dyn Fn(&Node, &mut HtmlWriter<'_>) -> Result<()> + Send + Sync>;

/// Type alias for attribute import functions
pub type ImportJsonFn = Box<dyn Fn(&Map<String, Value>) -> Result<NodeKind> + Send + Sync>;

/// Type alias for attribute export functions
pub type ExportJsonFn = Box<dyn Fn(&NodeKind) -> Map<String, Value> + Send + Sync>;

/// Type alias for HTML import constructors
pub type ImportHtmlFn = Box<dyn Fn(&Element) -> Option<HtmlImport> + Send + Sync>;

static STYLE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([a-z-]+)\s*:\s*([^;]+)").expect("style declaration pattern is valid")
});

/// An element of incoming markup, detached from the parser's DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag_name: String,
    attributes: IndexMap<String, String>,
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_lowercase(),
            attributes: IndexMap::new(),
        }
    }

    /// Add an attribute
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(name.to_lowercase(), value.to_string());
        self
    }

    /// Lowercase tag name
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Value of one declaration of the inline `style` attribute
    pub fn style(&self, property: &str) -> Option<String> {
        let style = self.attr("style")?;
        STYLE_DECLARATION
            .captures_iter(style)
            .filter(|caps| caps[1].eq_ignore_ascii_case(property))
            .last()
            .map(|caps| caps[2].trim().to_lowercase())
    }

    /// Parse a numeric attribute
    pub fn attr_u32(&self, name: &str) -> Option<u32> {
        self.attr(name)?.trim().parse().ok()
    }
}

/// What a matched element turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlImport {
    /// A node of this kind, built from the element's parsed children
    Node(NodeKind),
    /// Format marks OR-ed into every text run below the element
    Format(TextFormat),
}

/// A filter determines which elements an importer applies to
pub enum ElementFilter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&Element) -> bool + Send + Sync>),
}

impl ElementFilter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        ElementFilter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        ElementFilter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        ElementFilter::Predicate(Box::new(f))
    }

    /// Check if this filter matches an element
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            ElementFilter::TagName(t) => element.tag_name() == t,
            ElementFilter::TagNames(tags) => tags.iter().any(|t| t == element.tag_name()),
            ElementFilter::Predicate(f) => f(element),
        }
    }
}

/// HTML import half of an entry: which elements, and what they become
pub struct HtmlImporter {
    pub filter: ElementFilter,
    pub convert: ImportHtmlFn,
}

/// Everything the conversion paths need to know about one node type.
pub struct NodeEntry {
    prototype: NodeKind,
    import_json: ImportJsonFn,
    export_json: ExportJsonFn,
    export_html: ExportHtmlFn,
    import_html: Option<HtmlImporter>,
}

impl NodeEntry {
    /// Create an entry whose factory yields `prototype`.
    ///
    /// JSON attributes use the built-in codec of the prototype's variant, so
    /// an entry registered under an alias tag loads into the same variant.
    ///
    /// Rendering and saving look entries up by the node variant's own tag.
    /// An entry under an alias tag therefore only contributes its HTML import
    /// and its JSON codec; its `export_html` is never called, and saved trees
    /// carry the variant's tag instead of the alias.
    pub fn new<F>(prototype: NodeKind, export_html: F) -> Self
    where
        F: Fn(&Node, &mut HtmlWriter<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let codec_tag = prototype.type_tag();
        Self {
            prototype,
            import_json: Box::new(move |attrs: &Map<String, Value>| {
                NodeKind::from_json(codec_tag, attrs)
            }),
            export_json: Box::new(|kind: &NodeKind| kind.attributes_json()),
            export_html: Box::new(export_html),
            import_html: None,
        }
    }

    /// Replace the JSON attribute codec
    pub fn with_json<I, E>(mut self, import: I, export: E) -> Self
    where
        I: Fn(&Map<String, Value>) -> Result<NodeKind> + Send + Sync + 'static,
        E: Fn(&NodeKind) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.import_json = Box::new(import);
        self.export_json = Box::new(export);
        self
    }

    /// Recognize elements of incoming markup
    pub fn with_html_import<F>(mut self, filter: ElementFilter, convert: F) -> Self
    where
        F: Fn(&Element) -> Option<HtmlImport> + Send + Sync + 'static,
    {
        self.import_html = Some(HtmlImporter {
            filter,
            convert: Box::new(convert),
        });
        self
    }

    /// Default-attributed kind of this entry
    pub fn create(&self) -> NodeKind {
        self.prototype.clone()
    }

    pub fn import_json(&self, attributes: &Map<String, Value>) -> Result<NodeKind> {
        (self.import_json)(attributes)
    }

    pub fn export_json(&self, kind: &NodeKind) -> Map<String, Value> {
        (self.export_json)(kind)
    }

    /// Render a node through this entry
    pub fn export_html(&self, node: &Node, writer: &mut HtmlWriter<'_>) -> Result<()> {
        (self.export_html)(node, writer)
    }

    /// Try to import an element through this entry
    pub fn import_html(&self, element: &Element) -> Option<HtmlImport> {
        let importer = self.import_html.as_ref()?;
        if !importer.filter.matches(element) {
            return None;
        }
        (importer.convert)(element)
    }
}

impl fmt::Debug for NodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeEntry")
            .field("prototype", &self.prototype)
            .field("imports_html", &self.import_html.is_some())
            .finish_non_exhaustive()
    }
}

/// Registry of node types, keyed by type tag in registration order.
pub struct Registry {
    entries: IndexMap<String, NodeEntry>,
}

impl Registry {
    /// Registry with every built-in node type
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtin::register_all(&mut registry);
        registry
    }

    /// Registry with no entries
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert or replace the entry for a tag
    pub fn register(&mut self, tag: &str, entry: NodeEntry) -> &mut Self {
        self.entries.insert(tag.to_string(), entry);
        self
    }

    /// Replace the entry for a tag that is already registered.
    ///
    /// The tag keeps its position, so HTML import precedence is unchanged.
    pub fn override_entry(&mut self, tag: &str, entry: NodeEntry) -> Result<&mut Self> {
        let slot = self
            .entries
            .get_mut(tag)
            .ok_or_else(|| Error::UnknownType(tag.to_string()))?;
        *slot = entry;
        Ok(self)
    }

    pub fn resolve(&self, tag: &str) -> Result<&NodeEntry> {
        self.entries
            .get(tag)
            .ok_or_else(|| Error::UnknownType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags in registration order
    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Factory node for a tag
    pub fn create(&self, tag: &str) -> Result<Node> {
        let kind = self.resolve(tag)?.create();
        Ok(Node::build(kind, Vec::new())?)
    }

    /// Load a serialized subtree, resolving every node through its entry
    pub fn import_json(&self, serialized: &SerializedNode) -> Result<Node> {
        let kind = self
            .resolve(&serialized.type_tag)?
            .import_json(&serialized.attributes)?;
        let children = serialized
            .children
            .iter()
            .map(|child| self.import_json(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Node::build(kind, children)?)
    }

    /// Save a subtree, resolving every node through its entry
    pub fn export_json(&self, node: &Node) -> Result<SerializedNode> {
        let attributes = self.resolve(node.type_tag())?.export_json(node.kind());
        let children = node
            .children()
            .iter()
            .map(|child| self.export_json(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(SerializedNode {
            type_tag: node.type_tag().to_string(),
            attributes,
            children,
        })
    }

    /// Load a whole stored document
    pub fn load(&self, serialized: &SerializedTree) -> Result<Tree> {
        let root = self.import_json(&serialized.root)?;
        Ok(Tree::new(root)?)
    }

    pub fn save(&self, tree: &Tree) -> Result<SerializedTree> {
        Ok(SerializedTree {
            root: self.export_json(tree.root())?,
        })
    }

    /// First import (in registration order) that accepts the element
    pub fn match_element(&self, element: &Element) -> Option<HtmlImport> {
        self.entries
            .values()
            .find_map(|entry| entry.import_html(element))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
