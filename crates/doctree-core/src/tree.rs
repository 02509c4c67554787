//! The rooted document tree and its serialized form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node::{Node, NodeId, NodeKind};
use crate::{Error, Result, StructuralError};

/// Serialized node: `{"type", "attributes", "children"}`, order-preserving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializedNode>,
}

/// Envelope of a stored document body: `{"root": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedTree {
    pub root: SerializedNode,
}

impl SerializedTree {
    /// Parse the JSON envelope without interpreting node types.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedInput(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::MalformedInput(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        // serializing string-keyed maps and plain structs cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A single rooted document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Create a tree from a root node, validating the whole structure
    pub fn new(root: Node) -> std::result::Result<Self, StructuralError> {
        validate(&root)?;
        let mut tree = Self { root };
        tree.renumber();
        Ok(tree)
    }

    /// A tree holding only an empty root
    pub fn empty() -> Self {
        Self {
            root: Node::bare(NodeKind::Root),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Mutable access to the root; callers re-validate afterwards.
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Check every node against its variant's child and attribute constraints
    pub fn validate(&self) -> std::result::Result<(), StructuralError> {
        validate(&self.root)
    }

    /// Reassign node ids in pre-order, starting at 0 for the root.
    pub fn renumber(&mut self) {
        fn assign(node: &mut Node, next: &mut u32) {
            node.id = NodeId(*next);
            *next += 1;
            for child in node.children_mut() {
                assign(child, next);
            }
        }

        let mut next = 0;
        assign(&mut self.root, &mut next);
    }

    /// Independent copy of the whole tree.
    pub fn deep_clone(&self) -> Tree {
        self.clone()
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.descendants().count()
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }

    /// Pre-order iterator over all nodes
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![&self.root],
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.descendants().find(|node| node.id() == id)
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    /// Compare with another tree ignoring node identity
    pub fn same_structure(&self, other: &Tree) -> bool {
        self.root.same_structure(&other.root)
    }

    /// Serialize using the built-in attribute codec.
    pub fn to_serialized(&self) -> SerializedTree {
        fn convert(node: &Node) -> SerializedNode {
            SerializedNode {
                type_tag: node.type_tag().to_string(),
                attributes: node.kind().attributes_json(),
                children: node.children().iter().map(convert).collect(),
            }
        }

        SerializedTree {
            root: convert(&self.root),
        }
    }

    /// Deserialize using the built-in attribute codec.
    pub fn from_serialized(serialized: &SerializedTree) -> Result<Self> {
        fn convert(node: &SerializedNode) -> Result<Node> {
            let kind = NodeKind::from_json(&node.type_tag, &node.attributes)?;
            let children = node
                .children
                .iter()
                .map(convert)
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::build(kind, children)?)
        }

        Ok(Tree::new(convert(&serialized.root)?)?)
    }

    pub fn to_json(&self) -> String {
        self.to_serialized().to_json()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_serialized(&SerializedTree::from_json(json)?)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::empty()
    }
}

/// Validate a tree rooted at `root`.
///
/// Fails when the top node is not a root, when a child variant is not allowed
/// under its parent, or when an attribute payload is out of range.
pub fn validate(root: &Node) -> std::result::Result<(), StructuralError> {
    if !matches!(root.kind(), NodeKind::Root) {
        return Err(StructuralError::MissingRoot {
            found: root.type_tag(),
        });
    }
    validate_subtree(root)
}

fn validate_subtree(node: &Node) -> std::result::Result<(), StructuralError> {
    node.kind().check_attributes()?;

    if node.kind().is_leaf() && !node.children().is_empty() {
        return Err(StructuralError::LeafWithChildren {
            tag: node.type_tag(),
        });
    }

    for child in node.children() {
        if !node.kind().allows_child(child.kind()) {
            return Err(StructuralError::DisallowedChild {
                parent: node.type_tag(),
                child: child.type_tag(),
            });
        }
        validate_subtree(child)?;
    }

    Ok(())
}

/// Pre-order traversal over a tree.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
