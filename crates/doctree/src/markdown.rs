//! Tree to Markdown serialization.

use doctree_core::{NodeKind, NodeRef, Tree};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::Rules;
use crate::utilities::collapse_newlines;

/// Options for Markdown output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Strong delimiter
    pub strong_delimiter: String,

    /// Emphasis delimiter
    pub em_delimiter: char,

    /// Spaces of indentation per level of list nesting
    pub list_indent: usize,

    /// Escape Markdown syntax characters in text runs
    pub escape_text: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            bullet_list_marker: '-',
            strong_delimiter: "**".to_string(),
            em_delimiter: '*',
            list_indent: 4,
            escape_text: false,
        }
    }
}

/// Walks a tree bottom-up through a rule set
pub struct MarkdownSerializer<'a> {
    rules: &'a Rules,
    options: &'a MarkdownOptions,
}

impl<'a> MarkdownSerializer<'a> {
    pub fn new(rules: &'a Rules, options: &'a MarkdownOptions) -> Self {
        Self { rules, options }
    }

    /// Convert a tree to Markdown
    pub fn serialize(&self, tree: &Tree) -> String {
        let output = self.process(&NodeRef::new(tree.root()));
        let markdown = collapse_newlines(&output);
        debug!(nodes = tree.len(), bytes = markdown.len(), "serialized tree to markdown");
        markdown
    }

    fn process(&self, node: &NodeRef<'_>) -> String {
        let content = match node.kind() {
            NodeKind::Text(attrs) => self.rules.render_text(attrs, self.options),
            _ => self.process_children(node),
        };

        if let Some(rule) = self.rules.for_node(node, self.options) {
            return rule.replace(node, &content, self.options);
        }

        // No rule: fall back to the flattened text
        let text = node.text_content();
        if node.node.is_block() {
            format!("\n\n{text}\n\n")
        } else {
            text
        }
    }

    /// Neighbouring runs with the same marks are rendered as one run, so two
    /// bold runs give `**ab**` rather than `**a****b**`.
    fn process_children(&self, node: &NodeRef<'_>) -> String {
        let children: Vec<NodeRef<'_>> = node.children().collect();
        let mut output = String::new();
        let mut index = 0;

        while index < children.len() {
            let first = &children[index];
            let marked = first.node.as_text().filter(|attrs| !attrs.format.is_empty());
            let Some(attrs) = marked else {
                output.push_str(&self.process(first));
                index += 1;
                continue;
            };

            let mut end = index + 1;
            let mut run = attrs.clone();
            while let Some(next) = children
                .get(end)
                .and_then(|child| child.node.as_text())
                .filter(|next| next.format == attrs.format)
            {
                run.text.push_str(&next.text);
                end += 1;
            }

            if end == index + 1 {
                output.push_str(&self.process(first));
            } else {
                let content = self.rules.render_text(&run, self.options);
                match self.rules.for_node(first, self.options) {
                    Some(rule) => output.push_str(&rule.replace(first, &content, self.options)),
                    None => output.push_str(&run.text),
                }
            }
            index = end;
        }

        output
    }
}

/// Convert a tree with the default rules and options
pub fn serialize(tree: &Tree) -> String {
    let rules = Rules::new();
    let options = MarkdownOptions::default();
    MarkdownSerializer::new(&rules, &options).serialize(tree)
}
