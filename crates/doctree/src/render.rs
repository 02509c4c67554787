//! Tree to HTML serialization.

use doctree_core::{Node, Tree};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::debug;

use crate::registry::Registry;
use crate::theme::Theme;
use crate::Result;

/// Output buffer handed to HTML export functions.
///
/// Export functions emit their own element and call [`HtmlWriter::children`]
/// to recurse, which dispatches every child through the registry again, so an
/// override for one tag composes with the entries for all others.
pub struct HtmlWriter<'a> {
    registry: &'a Registry,
    theme: &'a Theme,
    out: String,
}

impl<'a> HtmlWriter<'a> {
    pub fn new(registry: &'a Registry, theme: &'a Theme) -> Self {
        Self {
            registry,
            theme,
            out: String::new(),
        }
    }

    pub fn theme(&self) -> &'a Theme {
        self.theme
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Write an opening tag. Attributes with an empty value are skipped.
    pub fn open_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attrs {
            if value.is_empty() {
                continue;
            }
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&encode_double_quoted_attribute(value));
            self.out.push('"');
        }
        self.out.push('>');
    }

    pub fn close_tag(&mut self, tag: &str) {
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }

    /// Write an element with no content, like `<br>`
    pub fn void_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.open_tag(tag, attrs);
    }

    /// Write escaped text
    pub fn text(&mut self, text: &str) {
        self.out.push_str(&encode_text(text));
    }

    /// Write markup verbatim
    pub fn raw(&mut self, markup: &str) {
        self.out.push_str(markup);
    }

    /// Render one node through its registry entry
    pub fn node(&mut self, node: &Node) -> Result<()> {
        let registry = self.registry;
        registry.resolve(node.type_tag())?.export_html(node, self)
    }

    /// Render all children of a node in order
    pub fn children(&mut self, node: &Node) -> Result<()> {
        for child in node.children() {
            self.node(child)?;
        }
        Ok(())
    }

    /// Wrap the children of `node` in one element
    pub fn element(&mut self, tag: &str, attrs: &[(&str, &str)], node: &Node) -> Result<()> {
        self.open_tag(tag, attrs);
        self.children(node)?;
        self.close_tag(tag);
        Ok(())
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Serialize a tree to HTML using the given registry and theme
pub fn serialize(tree: &Tree, registry: &Registry, theme: &Theme) -> Result<String> {
    let mut writer = HtmlWriter::new(registry, theme);
    writer.node(tree.root())?;
    let html = writer.finish();
    debug!(nodes = tree.len(), bytes = html.len(), "serialized tree to html");
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::registry::NodeEntry;
    use doctree_core::{tags, NodeKind, TextFormat};

    fn tree(children: Vec<Node>) -> Tree {
        Tree::new(Node::build(NodeKind::Root, children).unwrap()).unwrap()
    }

    fn paragraph(children: Vec<Node>) -> Node {
        Node::build(NodeKind::Paragraph, children).unwrap()
    }

    fn render(tree: &Tree) -> String {
        serialize(tree, &Registry::new(), &Theme::default()).unwrap()
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(render(&Tree::empty()), "");
    }

    #[test]
    fn test_heading_and_bold() {
        let heading = Node::build(NodeKind::heading(1), vec![Node::text("Title")]).unwrap();
        let body = paragraph(vec![Node::formatted_text("Hello", TextFormat::BOLD)]);
        assert_eq!(
            render(&tree(vec![heading, body])),
            r#"<h1 class="glyf-editor-h1"><span>Title</span></h1><p><strong class="glyf-editor-bold">Hello</strong></p>"#
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let t = tree(vec![paragraph(vec![Node::text("a < b & c")])]);
        assert_eq!(render(&t), "<p><span>a &lt; b &amp; c</span></p>");
    }

    #[test]
    fn test_format_nesting_order() {
        let format = TextFormat::CODE | TextFormat::BOLD | TextFormat::ITALIC;
        let t = tree(vec![paragraph(vec![Node::formatted_text("x", format)])]);
        let html = serialize(&t, &Registry::new(), &Theme::empty()).unwrap();
        assert_eq!(html, "<p><strong><em><code>x</code></em></strong></p>");
    }

    #[test]
    fn test_ordered_list_start_and_nested_item() {
        let item = |children| Node::build(NodeKind::ListItem, children).unwrap();
        let inner = Node::build(NodeKind::list(false), vec![item(vec![Node::text("b")])]).unwrap();
        let list = Node::build(
            NodeKind::List(doctree_core::ListAttrs {
                ordered: true,
                start: 3,
            }),
            vec![item(vec![Node::text("a")]), item(vec![inner])],
        )
        .unwrap();
        let html = serialize(&tree(vec![list]), &Registry::new(), &Theme::empty()).unwrap();
        assert_eq!(
            html,
            r#"<ol start="3"><li><span>a</span></li><li><ul><li><span>b</span></li></ul></li></ol>"#
        );

        let themed = render(&Tree::from_json(&tree_json_nested()).unwrap());
        assert!(themed.contains(r#"<li class="editor-nested-listitem">"#));
    }

    fn tree_json_nested() -> String {
        r#"{"root":{"type":"root","children":[{"type":"list","children":[
            {"type":"list-item","children":[{"type":"list","children":[
                {"type":"list-item","children":[{"type":"text","attributes":{"text":"b"}}]}
            ]}]}
        ]}]}}"#
            .to_string()
    }

    #[test]
    fn test_table_markup() {
        let cell = Node::build(
            NodeKind::TableCell(doctree_core::TableCellAttrs {
                header: true,
                col_span: 2,
                row_span: 1,
            }),
            vec![paragraph(vec![Node::text("h")])],
        )
        .unwrap();
        let row = Node::build(NodeKind::TableRow, vec![cell]).unwrap();
        let table = Node::build(NodeKind::Table, vec![row]).unwrap();
        assert_eq!(
            render(&tree(vec![table])),
            r#"<table class="ExampleEditorTheme__table"><tr><th class="ExampleEditorTheme__tableCell ExampleEditorTheme__tableCellHeader" colspan="2"><p><span>h</span></p></th></tr></table>"#
        );
    }

    #[test]
    fn test_override_recurses_through_registry() {
        let mut registry = Registry::new();
        registry
            .override_entry(
                tags::PARAGRAPH,
                NodeEntry::new(NodeKind::Paragraph, |node, writer| {
                    writer.element("section", &[], node)
                }),
            )
            .unwrap();
        registry
            .override_entry(
                tags::TEXT,
                NodeEntry::new(NodeKind::text("", TextFormat::empty()), |node, writer| {
                    let text = node.as_text().map(|t| t.text.to_uppercase()).unwrap_or_default();
                    writer.text(&text);
                    Ok(())
                }),
            )
            .unwrap();
        let t = tree(vec![paragraph(vec![Node::text("hi"), Node::line_break()])]);
        let html = serialize(&t, &registry, &Theme::default()).unwrap();
        assert_eq!(html, "<section>HI<br></section>");
    }

    #[test]
    fn test_raw_markup_is_not_escaped() {
        let mut registry = Registry::new();
        registry
            .override_entry(
                tags::LINE_BREAK,
                NodeEntry::new(NodeKind::LineBreak, |_, writer| {
                    writer.raw("<br />&nbsp;");
                    Ok(())
                }),
            )
            .unwrap();
        let t = tree(vec![paragraph(vec![Node::text("a"), Node::line_break(), Node::text("b")])]);
        assert_eq!(
            serialize(&t, &registry, &Theme::default()).unwrap(),
            "<p><span>a</span><br />&nbsp;<span>b</span></p>"
        );
    }

    #[test]
    fn test_scrollable_table_wraps_default_markup() {
        let mut registry = Registry::new();
        registry
            .override_entry(tags::TABLE, builtin::scrollable_table())
            .unwrap();
        let table = Node::build(NodeKind::Table, vec![]).unwrap();
        let html = serialize(&tree(vec![table]), &registry, &Theme::default()).unwrap();
        assert_eq!(
            html,
            r#"<div class="ExampleEditorTheme__tableScrollableWrapper"><table class="ExampleEditorTheme__table"></table></div>"#
        );
    }

    #[test]
    fn test_unregistered_tag_fails() {
        let t = tree(vec![paragraph(vec![Node::text("x")])]);
        let mut registry = Registry::empty();
        registry.register(
            tags::ROOT,
            NodeEntry::new(NodeKind::Root, |node, writer| writer.children(node)),
        );
        assert!(matches!(
            serialize(&t, &registry, &Theme::default()),
            Err(crate::Error::UnknownType(tag)) if tag == "paragraph"
        ));
    }
}
