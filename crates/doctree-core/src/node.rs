//! Document tree nodes.
//!
//! A [`Node`] is a closed, tagged variant ([`NodeKind`]) plus an ordered list of
//! owned children. Every node belongs to exactly one tree; there is no sharing
//! between subtrees, so cloning a node always produces an independent copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::format::TextFormat;
use crate::{Error, Result, StructuralError};

/// Type tags of the built-in node variants.
pub mod tags {
    pub const ROOT: &str = "root";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const QUOTE: &str = "quote";
    pub const LIST: &str = "list";
    pub const LIST_ITEM: &str = "list-item";
    pub const TABLE: &str = "table";
    pub const TABLE_ROW: &str = "table-row";
    pub const TABLE_CELL: &str = "table-cell";
    pub const TEXT: &str = "text";
    pub const LINE_BREAK: &str = "line-break";

    /// All built-in tags, in registration order.
    pub const ALL: &[&str] = &[
        ROOT, PARAGRAPH, HEADING, QUOTE, LIST, LIST_ITEM, TABLE, TABLE_ROW, TABLE_CELL, TEXT,
        LINE_BREAK,
    ];
}

/// Identity of a node, unique within one tree.
///
/// Ids are assigned in pre-order when a tree is constructed or flushed and are
/// never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    #[serde(default = "first_level")]
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAttrs {
    #[serde(default)]
    pub ordered: bool,
    #[serde(default = "one")]
    pub start: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCellAttrs {
    #[serde(default)]
    pub header: bool,
    #[serde(default = "one")]
    pub col_span: u32,
    #[serde(default = "one")]
    pub row_span: u32,
}

impl Default for TableCellAttrs {
    fn default() -> Self {
        Self {
            header: false,
            col_span: 1,
            row_span: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextAttrs {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
}

fn one() -> u32 {
    1
}

fn first_level() -> u8 {
    1
}

/// The variant of a node together with its attribute payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The single top-level container of a tree
    Root,
    Paragraph,
    Heading(HeadingAttrs),
    Quote,
    List(ListAttrs),
    ListItem,
    Table,
    TableRow,
    TableCell(TableCellAttrs),
    /// A run of text sharing one set of format marks
    Text(TextAttrs),
    LineBreak,
}

impl NodeKind {
    pub fn heading(level: u8) -> Self {
        NodeKind::Heading(HeadingAttrs { level })
    }

    pub fn list(ordered: bool) -> Self {
        NodeKind::List(ListAttrs { ordered, start: 1 })
    }

    pub fn cell() -> Self {
        NodeKind::TableCell(TableCellAttrs::default())
    }

    pub fn header_cell() -> Self {
        NodeKind::TableCell(TableCellAttrs {
            header: true,
            ..TableCellAttrs::default()
        })
    }

    pub fn text(text: &str, format: TextFormat) -> Self {
        NodeKind::Text(TextAttrs {
            text: text.to_string(),
            format,
        })
    }

    /// Get the type tag of this variant
    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeKind::Root => tags::ROOT,
            NodeKind::Paragraph => tags::PARAGRAPH,
            NodeKind::Heading(_) => tags::HEADING,
            NodeKind::Quote => tags::QUOTE,
            NodeKind::List(_) => tags::LIST,
            NodeKind::ListItem => tags::LIST_ITEM,
            NodeKind::Table => tags::TABLE,
            NodeKind::TableRow => tags::TABLE_ROW,
            NodeKind::TableCell(_) => tags::TABLE_CELL,
            NodeKind::Text(_) => tags::TEXT,
            NodeKind::LineBreak => tags::LINE_BREAK,
        }
    }

    /// Default-attributed kind for a built-in tag.
    pub fn default_for(tag: &str) -> Option<Self> {
        let kind = match tag {
            tags::ROOT => NodeKind::Root,
            tags::PARAGRAPH => NodeKind::Paragraph,
            tags::HEADING => NodeKind::heading(1),
            tags::QUOTE => NodeKind::Quote,
            tags::LIST => NodeKind::list(false),
            tags::LIST_ITEM => NodeKind::ListItem,
            tags::TABLE => NodeKind::Table,
            tags::TABLE_ROW => NodeKind::TableRow,
            tags::TABLE_CELL => NodeKind::cell(),
            tags::TEXT => NodeKind::Text(TextAttrs::default()),
            tags::LINE_BREAK => NodeKind::LineBreak,
            _ => return None,
        };
        Some(kind)
    }

    /// Block-level variants may appear directly under the root.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading(_)
                | NodeKind::Quote
                | NodeKind::List(_)
                | NodeKind::Table
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, NodeKind::Text(_) | NodeKind::LineBreak)
    }

    pub fn is_leaf(&self) -> bool {
        self.is_inline()
    }

    /// Check whether `child` may be a direct child of a node of this kind
    pub fn allows_child(&self, child: &NodeKind) -> bool {
        match self {
            NodeKind::Root => child.is_block(),
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::Quote => child.is_inline(),
            NodeKind::List(_) => matches!(child, NodeKind::ListItem),
            NodeKind::ListItem => child.is_inline() || matches!(child, NodeKind::List(_)),
            NodeKind::Table => matches!(child, NodeKind::TableRow),
            NodeKind::TableRow => matches!(child, NodeKind::TableCell(_)),
            NodeKind::TableCell(_) => child.is_block(),
            NodeKind::Text(_) | NodeKind::LineBreak => false,
        }
    }

    /// Validate the attribute payload.
    pub fn check_attributes(&self) -> std::result::Result<(), StructuralError> {
        match self {
            NodeKind::Heading(attrs) if !(1..=6).contains(&attrs.level) => {
                Err(StructuralError::InvalidAttribute {
                    tag: tags::HEADING,
                    reason: format!("level must be between 1 and 6, got {}", attrs.level),
                })
            }
            NodeKind::TableCell(attrs) if attrs.col_span == 0 || attrs.row_span == 0 => {
                Err(StructuralError::InvalidAttribute {
                    tag: tags::TABLE_CELL,
                    reason: "spans must be at least 1".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Serialize the attribute payload of a built-in variant.
    pub fn attributes_json(&self) -> Map<String, Value> {
        let value = match self {
            NodeKind::Heading(attrs) => serde_json::to_value(attrs),
            NodeKind::List(attrs) => serde_json::to_value(attrs),
            NodeKind::TableCell(attrs) => serde_json::to_value(attrs),
            NodeKind::Text(attrs) => serde_json::to_value(attrs),
            _ => return Map::new(),
        };

        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Build a built-in variant from its tag and serialized attributes.
    pub fn from_json(tag: &str, attributes: &Map<String, Value>) -> Result<Self> {
        fn attrs<T: serde::de::DeserializeOwned>(
            tag: &str,
            attributes: &Map<String, Value>,
        ) -> Result<T> {
            serde_json::from_value(Value::Object(attributes.clone())).map_err(|e| {
                Error::MalformedInput(format!("invalid attributes for `{tag}`: {e}"))
            })
        }

        let kind = match tag {
            tags::HEADING => NodeKind::Heading(attrs(tag, attributes)?),
            tags::LIST => NodeKind::List(attrs(tag, attributes)?),
            tags::TABLE_CELL => NodeKind::TableCell(attrs(tag, attributes)?),
            tags::TEXT => NodeKind::Text(attrs(tag, attributes)?),
            other => {
                NodeKind::default_for(other).ok_or_else(|| Error::UnknownType(other.to_string()))?
            }
        };
        Ok(kind)
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    kind: NodeKind,
    children: Vec<Node>,
}

impl Node {
    /// Build a node, checking its attributes and direct children.
    pub fn build(kind: NodeKind, children: Vec<Node>) -> std::result::Result<Self, StructuralError> {
        kind.check_attributes()?;

        if kind.is_leaf() && !children.is_empty() {
            return Err(StructuralError::LeafWithChildren {
                tag: kind.type_tag(),
            });
        }

        if let Some(child) = children.iter().find(|c| !kind.allows_child(&c.kind)) {
            return Err(StructuralError::DisallowedChild {
                parent: kind.type_tag(),
                child: child.kind.type_tag(),
            });
        }

        Ok(Self {
            id: NodeId::default(),
            kind,
            children,
        })
    }

    /// Create a plain text run
    pub fn text(content: &str) -> Self {
        Self::formatted_text(content, TextFormat::empty())
    }

    /// Create a text run with format marks
    pub fn formatted_text(content: &str, format: TextFormat) -> Self {
        Self::bare(NodeKind::text(content, format))
    }

    pub fn line_break() -> Self {
        Self::bare(NodeKind::LineBreak)
    }

    /// A node with no children; always valid for leaves and containers.
    pub(crate) fn bare(kind: NodeKind) -> Self {
        Self {
            id: NodeId::default(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable access to the attribute payload.
    ///
    /// Changes are checked the next time the owning tree is validated.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable access to the child list.
    ///
    /// Changes are checked the next time the owning tree is validated.
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Append a child, rejecting variants this node does not allow
    pub fn append(&mut self, child: Node) -> std::result::Result<(), StructuralError> {
        if self.kind.is_leaf() {
            return Err(StructuralError::LeafWithChildren {
                tag: self.kind.type_tag(),
            });
        }
        if !self.kind.allows_child(&child.kind) {
            return Err(StructuralError::DisallowedChild {
                parent: self.kind.type_tag(),
                child: child.kind.type_tag(),
            });
        }
        self.children.push(child);
        Ok(())
    }

    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    pub fn is_block(&self) -> bool {
        self.kind.is_block()
    }

    pub fn is_inline(&self) -> bool {
        self.kind.is_inline()
    }

    /// Text attributes if this is a text run
    pub fn as_text(&self) -> Option<&TextAttrs> {
        match &self.kind {
            NodeKind::Text(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Compare two subtrees ignoring node identity.
    pub fn same_structure(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_structure(b))
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        match &self.kind {
            NodeKind::Text(attrs) => attrs.text.clone(),
            NodeKind::LineBreak => "\n".to_string(),
            NodeKind::Table => self.join_children("\n"),
            NodeKind::TableRow => self.join_children("\t"),
            NodeKind::List(_) => self.join_children("\n"),
            _ => {
                let mut out = String::new();
                for (i, child) in self.children.iter().enumerate() {
                    if i > 0 && (child.is_block() || self.children[i - 1].is_block()) {
                        out.push_str("\n\n");
                    }
                    out.push_str(&child.text_content());
                }
                out
            }
        }
    }

    fn join_children(&self, separator: &str) -> String {
        self.children
            .iter()
            .map(|child| child.text_content())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// A reference to a node with parent context.
/// This allows navigation up one level without storing parent pointers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'a Node>,
    index: usize,
    list_depth: usize,
}

impl<'a> NodeRef<'a> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
            list_depth: 0,
        }
    }

    /// Create a NodeRef for the `index`-th child of this node
    pub fn child(&self, index: usize) -> Option<NodeRef<'a>> {
        let node = self.node.children.get(index)?;
        let list_depth = match (self.node.kind(), node.kind()) {
            (NodeKind::ListItem, NodeKind::List(_)) => self.list_depth + 1,
            _ => self.list_depth,
        };
        Some(NodeRef {
            node,
            parent: Some(self.node),
            index,
            list_depth,
        })
    }

    /// Iterate over children with their context
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let this = *self;
        (0..self.node.children.len()).filter_map(move |i| this.child(i))
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    /// Position among the parent's children
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of `list` ancestors that are themselves nested in a list item.
    ///
    /// Items of a top-level list have depth 0.
    pub fn list_depth(&self) -> usize {
        self.list_depth
    }

    pub fn kind(&self) -> &'a NodeKind {
        self.node.kind()
    }

    pub fn type_tag(&self) -> &'static str {
        self.node.type_tag()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }
}
