//! Registry entries for the built-in node types.

use doctree_core::{tags, Node, NodeKind, TextAttrs, TextFormat};

use crate::registry::{Element, ElementFilter, HtmlImport, NodeEntry, Registry};
use crate::render::HtmlWriter;
use crate::theme::ThemeClass;
use crate::Result;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

const FORMAT_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "strike", "del", "code", "sub", "sup", "mark", "span",
];

/// Element and theme slot for each format mark, outermost first
const FORMAT_ELEMENTS: [(TextFormat, &str, Option<ThemeClass>); 8] = [
    (TextFormat::BOLD, "strong", Some(ThemeClass::Bold)),
    (TextFormat::ITALIC, "em", Some(ThemeClass::Italic)),
    (TextFormat::UNDERLINE, "u", Some(ThemeClass::Underline)),
    (TextFormat::STRIKETHROUGH, "s", Some(ThemeClass::Strikethrough)),
    (TextFormat::CODE, "code", Some(ThemeClass::Code)),
    (TextFormat::SUBSCRIPT, "sub", None),
    (TextFormat::SUPERSCRIPT, "sup", None),
    (TextFormat::HIGHLIGHT, "mark", None),
];

/// Register every built-in node type
pub fn register_all(registry: &mut Registry) {
    registry
        .register(tags::ROOT, root())
        .register(tags::PARAGRAPH, paragraph())
        .register(tags::HEADING, heading())
        .register(tags::QUOTE, quote())
        .register(tags::LIST, list())
        .register(tags::LIST_ITEM, list_item())
        .register(tags::TABLE, table())
        .register(tags::TABLE_ROW, table_row())
        .register(tags::TABLE_CELL, table_cell())
        .register(tags::TEXT, text())
        .register(tags::LINE_BREAK, line_break());
}

pub fn root() -> NodeEntry {
    NodeEntry::new(NodeKind::Root, |node, writer| writer.children(node))
}

pub fn paragraph() -> NodeEntry {
    NodeEntry::new(NodeKind::Paragraph, |node, writer| {
        let class = writer.theme().class(ThemeClass::Paragraph).unwrap_or("");
        writer.element("p", &[("class", class)], node)
    })
    .with_html_import(ElementFilter::tag("p"), |_| {
        Some(HtmlImport::Node(NodeKind::Paragraph))
    })
}

pub fn heading() -> NodeEntry {
    NodeEntry::new(NodeKind::heading(1), |node, writer| {
        let level = match node.kind() {
            NodeKind::Heading(attrs) => attrs.level,
            _ => 1,
        };
        let tag = format!("h{level}");
        let class = writer.theme().heading_class(level).unwrap_or("");
        writer.element(&tag, &[("class", class)], node)
    })
    .with_html_import(ElementFilter::tags(HEADING_TAGS), |element| {
        let level = element.tag_name().get(1..)?.parse().ok()?;
        Some(HtmlImport::Node(NodeKind::heading(level)))
    })
}

pub fn quote() -> NodeEntry {
    NodeEntry::new(NodeKind::Quote, |node, writer| {
        let class = writer.theme().class(ThemeClass::Quote).unwrap_or("");
        writer.element("blockquote", &[("class", class)], node)
    })
    .with_html_import(ElementFilter::tag("blockquote"), |_| {
        Some(HtmlImport::Node(NodeKind::Quote))
    })
}

pub fn list() -> NodeEntry {
    NodeEntry::new(NodeKind::list(false), |node, writer| {
        let (ordered, start) = match node.kind() {
            NodeKind::List(attrs) => (attrs.ordered, attrs.start),
            _ => (false, 1),
        };
        let (tag, slot) = if ordered {
            ("ol", ThemeClass::OrderedList)
        } else {
            ("ul", ThemeClass::UnorderedList)
        };
        let class = writer.theme().class(slot).unwrap_or("");
        let start = if ordered && start != 1 {
            start.to_string()
        } else {
            String::new()
        };
        writer.element(tag, &[("class", class), ("start", start.as_str())], node)
    })
    .with_html_import(ElementFilter::tags(&["ul", "ol"]), |element| {
        let ordered = element.tag_name() == "ol";
        let start = element.attr_u32("start").unwrap_or(1);
        Some(HtmlImport::Node(NodeKind::List(doctree_core::ListAttrs {
            ordered,
            start,
        })))
    })
}

pub fn list_item() -> NodeEntry {
    NodeEntry::new(NodeKind::ListItem, |node, writer| {
        let nested = node
            .children()
            .iter()
            .any(|child| matches!(child.kind(), NodeKind::List(_)));
        let slot = if nested {
            ThemeClass::NestedListItem
        } else {
            ThemeClass::ListItem
        };
        let class = writer.theme().class(slot).unwrap_or("");
        writer.element("li", &[("class", class)], node)
    })
    .with_html_import(ElementFilter::tag("li"), |_| {
        Some(HtmlImport::Node(NodeKind::ListItem))
    })
}

pub fn table() -> NodeEntry {
    NodeEntry::new(NodeKind::Table, export_table).with_html_import(
        ElementFilter::tag("table"),
        |_| Some(HtmlImport::Node(NodeKind::Table)),
    )
}

/// Default table markup, shared with overrides that decorate it
pub fn export_table(node: &Node, writer: &mut HtmlWriter<'_>) -> Result<()> {
    let class = writer.theme().class(ThemeClass::Table).unwrap_or("");
    writer.element("table", &[("class", class)], node)
}

/// Table entry that wraps the default markup in a scroll container
pub fn scrollable_table() -> NodeEntry {
    NodeEntry::new(NodeKind::Table, |node, writer| {
        let wrapper = writer
            .theme()
            .class(ThemeClass::TableScrollableWrapper)
            .unwrap_or("");
        writer.open_tag("div", &[("class", wrapper)]);
        export_table(node, writer)?;
        writer.close_tag("div");
        Ok(())
    })
    .with_html_import(ElementFilter::tag("table"), |_| {
        Some(HtmlImport::Node(NodeKind::Table))
    })
}

pub fn table_row() -> NodeEntry {
    NodeEntry::new(NodeKind::TableRow, |node, writer| {
        writer.element("tr", &[], node)
    })
    .with_html_import(ElementFilter::tag("tr"), |_| {
        Some(HtmlImport::Node(NodeKind::TableRow))
    })
}

pub fn table_cell() -> NodeEntry {
    NodeEntry::new(NodeKind::cell(), |node, writer| {
        let attrs = match node.kind() {
            NodeKind::TableCell(attrs) => attrs.clone(),
            _ => Default::default(),
        };
        let theme = writer.theme();
        let mut classes: Vec<&str> = theme.class(ThemeClass::TableCell).into_iter().collect();
        if attrs.header {
            classes.extend(theme.class(ThemeClass::TableCellHeader));
        }
        let class = classes.join(" ");
        let span = |n: u32| if n == 1 { String::new() } else { n.to_string() };
        let (col_span, row_span) = (span(attrs.col_span), span(attrs.row_span));
        let tag = if attrs.header { "th" } else { "td" };
        writer.element(
            tag,
            &[
                ("class", class.as_str()),
                ("colspan", col_span.as_str()),
                ("rowspan", row_span.as_str()),
            ],
            node,
        )
    })
    .with_html_import(ElementFilter::tags(&["td", "th"]), |element| {
        let span = |name: &str| element.attr_u32(name).filter(|n| *n >= 1).unwrap_or(1);
        Some(HtmlImport::Node(NodeKind::TableCell(
            doctree_core::TableCellAttrs {
                header: element.tag_name() == "th",
                col_span: span("colspan"),
                row_span: span("rowspan"),
            },
        )))
    })
}

pub fn text() -> NodeEntry {
    NodeEntry::new(NodeKind::Text(TextAttrs::default()), export_text)
        .with_html_import(ElementFilter::tags(FORMAT_TAGS), inline_format)
}

fn export_text(node: &Node, writer: &mut HtmlWriter<'_>) -> Result<()> {
    let Some(attrs) = node.as_text() else {
        return Ok(());
    };
    let theme = writer.theme();

    let wrappers: Vec<(&str, &str)> = FORMAT_ELEMENTS
        .iter()
        .filter(|(flag, _, _)| attrs.format.contains(*flag))
        .map(|(_, tag, slot)| {
            let slot = match slot {
                Some(ThemeClass::Strikethrough) if attrs.format.contains(TextFormat::UNDERLINE) => {
                    Some(ThemeClass::UnderlineStrikethrough)
                }
                _ => *slot,
            };
            (*tag, slot.and_then(|s| theme.class(s)).unwrap_or(""))
        })
        .collect();

    if wrappers.is_empty() {
        writer.open_tag("span", &[]);
        writer.text(&attrs.text);
        writer.close_tag("span");
        return Ok(());
    }

    for (tag, class) in &wrappers {
        writer.open_tag(tag, &[("class", *class)]);
    }
    writer.text(&attrs.text);
    for (tag, _) in wrappers.iter().rev() {
        writer.close_tag(tag);
    }
    Ok(())
}

/// Format marks carried by an inline element and its inline styles
fn inline_format(element: &Element) -> Option<HtmlImport> {
    let mut format = match element.tag_name() {
        "b" | "strong" => TextFormat::BOLD,
        "i" | "em" => TextFormat::ITALIC,
        "u" => TextFormat::UNDERLINE,
        "s" | "strike" | "del" => TextFormat::STRIKETHROUGH,
        "code" => TextFormat::CODE,
        "sub" => TextFormat::SUBSCRIPT,
        "sup" => TextFormat::SUPERSCRIPT,
        "mark" => TextFormat::HIGHLIGHT,
        "span" => TextFormat::empty(),
        _ => return None,
    };

    if let Some(weight) = element.style("font-weight") {
        let bold = matches!(weight.as_str(), "bold" | "bolder")
            || weight.parse::<u32>().is_ok_and(|w| w >= 600);
        // pasted documents wrap whole bodies in <b style="font-weight:normal">
        format.set(TextFormat::BOLD, bold);
    }
    if element.style("font-style").as_deref() == Some("italic") {
        format.insert(TextFormat::ITALIC);
    }
    if let Some(decoration) = element.style("text-decoration") {
        if decoration.contains("underline") {
            format.insert(TextFormat::UNDERLINE);
        }
        if decoration.contains("line-through") {
            format.insert(TextFormat::STRIKETHROUGH);
        }
    }
    match element.style("vertical-align").as_deref() {
        Some("sub") => format.insert(TextFormat::SUBSCRIPT),
        Some("super") => format.insert(TextFormat::SUPERSCRIPT),
        _ => {}
    }

    Some(HtmlImport::Format(format))
}

pub fn line_break() -> NodeEntry {
    NodeEntry::new(NodeKind::LineBreak, |_, writer| {
        writer.void_tag("br", &[]);
        Ok(())
    })
    .with_html_import(ElementFilter::tag("br"), |_| {
        Some(HtmlImport::Node(NodeKind::LineBreak))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_of(element: &Element) -> Option<TextFormat> {
        match inline_format(element)? {
            HtmlImport::Format(format) => Some(format),
            HtmlImport::Node(_) => None,
        }
    }

    #[test]
    fn test_inline_format_tags() {
        assert_eq!(format_of(&Element::new("strong")), Some(TextFormat::BOLD));
        assert_eq!(format_of(&Element::new("del")), Some(TextFormat::STRIKETHROUGH));
        assert_eq!(format_of(&Element::new("span")), Some(TextFormat::empty()));
        assert_eq!(format_of(&Element::new("div")), None);
    }

    #[test]
    fn test_inline_format_styles() {
        let span = Element::new("span")
            .with_attr("style", "font-weight: 700; font-style: italic; text-decoration: underline line-through");
        assert_eq!(
            format_of(&span),
            Some(
                TextFormat::BOLD
                    | TextFormat::ITALIC
                    | TextFormat::UNDERLINE
                    | TextFormat::STRIKETHROUGH
            )
        );
    }

    #[test]
    fn test_normal_weight_cancels_bold() {
        let b = Element::new("b").with_attr("style", "font-weight:normal");
        assert_eq!(format_of(&b), Some(TextFormat::empty()));
    }

    #[test]
    fn test_heading_import_level() {
        let entry = heading();
        assert_eq!(
            entry.import_html(&Element::new("h3")),
            Some(HtmlImport::Node(NodeKind::heading(3)))
        );
        assert_eq!(entry.import_html(&Element::new("header")), None);
    }

    #[test]
    fn test_cell_import_spans() {
        let th = Element::new("th")
            .with_attr("colspan", "2")
            .with_attr("rowspan", "0");
        let Some(HtmlImport::Node(NodeKind::TableCell(attrs))) = table_cell().import_html(&th)
        else {
            panic!("expected a table cell");
        };
        assert!(attrs.header);
        assert_eq!(attrs.col_span, 2);
        assert_eq!(attrs.row_span, 1);
    }

    #[test]
    fn test_list_import_start() {
        let ol = Element::new("ol").with_attr("start", "4");
        assert_eq!(
            list().import_html(&ol),
            Some(HtmlImport::Node(NodeKind::List(doctree_core::ListAttrs {
                ordered: true,
                start: 4
            })))
        );
    }
}
