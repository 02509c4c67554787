//! HTML to tree parsing using the tl parser.
//!
//! The DOM is built per call and walked depth-first. Each element is offered
//! to the registry; elements nobody claims become plain text, unless their
//! content contains blocks, in which case the element is transparent.
//!
//! Normalization only covers what valid trees cannot express directly (loose
//! inline content at block level, paragraphs inside inline containers). Table
//! nesting is never repaired.

use doctree_core::{tags, Node, NodeKind, StructuralError, TextFormat, Tree};
use html_escape::decode_html_entities;
use tl::{HTMLTag, NodeHandle, Parser, ParserOptions};
use tracing::{debug, trace};

use crate::registry::{Element, HtmlImport, Registry};
use crate::utilities::{is_dropped, is_table_section};
use crate::{Error, Result};

/// Where the walker currently is
#[derive(Debug, Clone, Copy)]
struct Context {
    /// Type tag of the nearest enclosing node under construction
    parent: &'static str,
    /// Format marks inherited from enclosing inline elements
    format: TextFormat,
    /// Inside an inline formatting element
    inline: bool,
}

impl Context {
    fn root() -> Self {
        Self {
            parent: tags::ROOT,
            format: TextFormat::empty(),
            inline: false,
        }
    }
}

/// Parser that builds trees through a registry
pub struct HtmlParser<'r> {
    registry: &'r Registry,
}

impl<'r> HtmlParser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Parse markup into a validated tree
    pub fn parse(&self, markup: &str) -> Result<Tree> {
        let dom = tl::parse(markup, ParserOptions::default())
            .map_err(|e| Error::MalformedInput(format!("{e:?}")))?;
        let parser = dom.parser();

        let nodes = self.process_nodes(parser, dom.children(), Context::root())?;
        let children = normalize(&NodeKind::Root, nodes)?;
        let tree = Tree::new(Node::build(NodeKind::Root, children)?)?;

        debug!(bytes = markup.len(), nodes = tree.len(), "parsed html");
        Ok(tree)
    }

    fn process_nodes(
        &self,
        parser: &Parser<'_>,
        handles: &[NodeHandle],
        ctx: Context,
    ) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        for handle in handles {
            let Some(node) = handle.get(parser) else {
                continue;
            };
            match node {
                tl::Node::Tag(tag) => nodes.extend(self.process_element(parser, tag, ctx)?),
                tl::Node::Raw(raw) => {
                    let text = decode_html_entities(&raw.as_utf8_str()).into_owned();
                    if let Some(text) = raw_text(&text, ctx) {
                        nodes.push(Node::formatted_text(text, ctx.format));
                    }
                }
                tl::Node::Comment(_) => {}
            }
        }

        Ok(nodes)
    }

    fn process_children(
        &self,
        parser: &Parser<'_>,
        tag: &HTMLTag<'_>,
        ctx: Context,
    ) -> Result<Vec<Node>> {
        let children = tag.children();
        self.process_nodes(parser, children.top().as_slice(), ctx)
    }

    fn process_element(
        &self,
        parser: &Parser<'_>,
        tag: &HTMLTag<'_>,
        ctx: Context,
    ) -> Result<Vec<Node>> {
        let element = to_element(tag);
        let name = element.tag_name();

        if is_dropped(name) {
            trace!(element = name, "dropping element");
            return Ok(Vec::new());
        }

        if ctx.parent == tags::TABLE && is_table_section(name) {
            return self.process_children(parser, tag, ctx);
        }

        match self.registry.match_element(&element) {
            Some(HtmlImport::Node(kind)) => {
                trace!(element = name, node = kind.type_tag(), "importing element");
                let child_ctx = Context {
                    parent: kind.type_tag(),
                    format: ctx.format,
                    inline: false,
                };
                let children = self.process_children(parser, tag, child_ctx)?;
                let children = normalize(&kind, children)?;
                Ok(vec![Node::build(kind, children)?])
            }
            Some(HtmlImport::Format(format)) => {
                let child_ctx = Context {
                    format: ctx.format | format,
                    inline: true,
                    ..ctx
                };
                let children = self.process_children(parser, tag, child_ctx)?;
                if children.is_empty() {
                    return Ok(vec![Node::formatted_text("", child_ctx.format)]);
                }
                Ok(children)
            }
            None => {
                let children = self.process_children(parser, tag, ctx)?;
                if children.iter().any(|child| !child.is_inline()) {
                    trace!(element = name, "lifting blocks out of unknown element");
                    return Ok(children);
                }

                let mut text = String::new();
                collect_text(parser, tag, &mut text);
                if text.is_empty() {
                    return Ok(Vec::new());
                }
                trace!(element = name, "flattening unknown element to text");
                Ok(vec![Node::formatted_text(&text, ctx.format)])
            }
        }
    }
}

/// Parse markup with the built-in registry
pub fn parse(markup: &str) -> Result<Tree> {
    HtmlParser::new(&Registry::new()).parse(markup)
}

fn to_element(tag: &HTMLTag<'_>) -> Element {
    let name = tag.name().as_utf8_str();
    tag.attributes()
        .iter()
        .fold(Element::new(&name), |element, (key, value)| {
            let value = value.map(|v| decode_html_entities(&v).into_owned());
            element.with_attr(&key, value.as_deref().unwrap_or(""))
        })
}

/// Text of a raw node as it should enter the tree, if at all
fn raw_text(text: &str, ctx: Context) -> Option<&str> {
    if ctx.inline {
        return Some(text);
    }

    match ctx.parent {
        tags::ROOT | tags::LIST | tags::TABLE | tags::TABLE_ROW | tags::TABLE_CELL => {
            if text.trim().is_empty() {
                None
            } else {
                Some(text)
            }
        }
        // source formatting around nested blocks
        tags::LIST_ITEM | tags::QUOTE => {
            let trimmed = text.trim_matches(|c| c == '\n' || c == '\r');
            if trimmed.trim().is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        _ => Some(text),
    }
}

fn collect_text(parser: &Parser<'_>, tag: &HTMLTag<'_>, out: &mut String) {
    let children = tag.children();
    for handle in children.top().iter() {
        match handle.get(parser) {
            Some(tl::Node::Tag(child)) => {
                if !is_dropped(&child.name().as_utf8_str()) {
                    collect_text(parser, child, out);
                }
            }
            Some(tl::Node::Raw(raw)) => out.push_str(&decode_html_entities(&raw.as_utf8_str())),
            _ => {}
        }
    }
}

/// Reshape parsed children so they fit under a node of `kind`.
///
/// Anything that still does not fit is left in place for [`Node::build`] to
/// reject.
fn normalize(kind: &NodeKind, children: Vec<Node>) -> std::result::Result<Vec<Node>, StructuralError> {
    match kind {
        NodeKind::Root | NodeKind::TableCell(_) => wrap_inline_runs(children),
        NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::Quote => {
            Ok(unwrap_blocks(children, false))
        }
        NodeKind::ListItem => Ok(unwrap_blocks(children, true)),
        NodeKind::List(_) => wrap_list_items(children),
        _ => Ok(children),
    }
}

fn is_blank(node: &Node) -> bool {
    node.as_text().is_some_and(|t| t.text.trim().is_empty())
}

/// Group consecutive inline nodes into paragraphs
fn wrap_inline_runs(children: Vec<Node>) -> std::result::Result<Vec<Node>, StructuralError> {
    fn flush(run: &mut Vec<Node>, out: &mut Vec<Node>) -> std::result::Result<(), StructuralError> {
        if run.iter().all(is_blank) {
            run.clear();
            return Ok(());
        }
        out.push(Node::build(NodeKind::Paragraph, std::mem::take(run))?);
        Ok(())
    }

    let mut out = Vec::new();
    let mut run = Vec::new();

    for child in children {
        if child.is_inline() {
            run.push(child);
        } else {
            flush(&mut run, &mut out)?;
            out.push(child);
        }
    }
    flush(&mut run, &mut out)?;

    Ok(out)
}

/// Flatten block children into inline content separated by line breaks
fn unwrap_blocks(children: Vec<Node>, keep_lists: bool) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();

    for child in children {
        let separate = |out: &mut Vec<Node>| {
            if out
                .last()
                .is_some_and(|last| !matches!(last.kind(), NodeKind::List(_)))
            {
                out.push(Node::line_break());
            }
        };

        match child.kind() {
            NodeKind::List(_) if keep_lists => out.push(child),
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::Quote => {
                separate(&mut out);
                out.extend(child.into_children());
            }
            NodeKind::List(_) | NodeKind::Table => {
                separate(&mut out);
                out.push(Node::text(&child.text_content()));
            }
            _ => out.push(child),
        }
    }

    out
}

/// Put everything that is not already a list item into one
fn wrap_list_items(children: Vec<Node>) -> std::result::Result<Vec<Node>, StructuralError> {
    fn flush(run: &mut Vec<Node>, out: &mut Vec<Node>) -> std::result::Result<(), StructuralError> {
        if run.iter().all(is_blank) {
            run.clear();
            return Ok(());
        }
        out.push(Node::build(NodeKind::ListItem, std::mem::take(run))?);
        Ok(())
    }

    let mut out = Vec::new();
    let mut run = Vec::new();

    for child in children {
        if child.is_inline() {
            run.push(child);
            continue;
        }
        match child.kind() {
            NodeKind::ListItem => {
                flush(&mut run, &mut out)?;
                out.push(child);
            }
            NodeKind::List(_) => {
                flush(&mut run, &mut out)?;
                out.push(Node::build(NodeKind::ListItem, vec![child])?);
            }
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::Quote => {
                flush(&mut run, &mut out)?;
                out.push(Node::build(NodeKind::ListItem, child.into_children())?);
            }
            _ => {
                flush(&mut run, &mut out)?;
                out.push(child);
            }
        }
    }
    flush(&mut run, &mut out)?;

    Ok(out)
}
