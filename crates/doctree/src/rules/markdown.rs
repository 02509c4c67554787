//! Default rules for tree to Markdown conversion.

use doctree_core::{tags, Node, NodeKind};

use super::{Filter, Rule};

/// Create all default rules
pub fn default_rules() -> Vec<Rule> {
    vec![
        root_rule(),
        paragraph_rule(),
        heading_rule(),
        quote_rule(),
        list_rule(),
        list_item_rule(),
        line_break_rule(),
        text_rule(),
    ]
}

fn root_rule() -> Rule {
    Rule::for_tag(tags::ROOT, |_, content, _| content.to_string())
}

fn paragraph_rule() -> Rule {
    Rule::for_tag(tags::PARAGRAPH, |_, content, _| {
        format!("\n\n{}\n\n", content.trim())
    })
}

fn heading_rule() -> Rule {
    Rule::for_tag(tags::HEADING, |node, content, _| {
        let level = match node.kind() {
            NodeKind::Heading(attrs) => attrs.level as usize,
            _ => 1,
        };
        let hashes = "#".repeat(level);

        let content = content.trim();
        if content.is_empty() {
            return format!("\n\n{hashes}\n\n");
        }
        format!("\n\n{hashes} {content}\n\n")
    })
}

fn quote_rule() -> Rule {
    Rule::for_tag(tags::QUOTE, |_, content, _| {
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = content
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    })
}

fn list_rule() -> Rule {
    Rule::for_tag(tags::LIST, |node, content, _| {
        // Check if this list is nested inside a list item
        let is_nested = node
            .parent()
            .is_some_and(|parent| matches!(parent.kind(), NodeKind::ListItem));

        if is_nested {
            // Nested lists follow their parent item directly
            format!("\n{}", content.trim_end_matches('\n'))
        } else {
            format!("\n\n{content}\n\n")
        }
    })
}

/// An item whose only child is a list exists just to hold the nested list
fn is_list_wrapper(item: &Node) -> bool {
    matches!(item.children(), [child] if matches!(child.kind(), NodeKind::List(_)))
}

fn list_item_rule() -> Rule {
    Rule::for_tag(tags::LIST_ITEM, |node, content, options| {
        if is_list_wrapper(node.node) {
            return format!("{}\n", content.trim_start_matches('\n'));
        }

        let indent = " ".repeat(options.list_indent * node.list_depth());
        let prefix = match node.parent().map(|parent| (parent, parent.kind())) {
            Some((parent, NodeKind::List(attrs))) if attrs.ordered => {
                let position = parent.children()[..node.index()]
                    .iter()
                    .filter(|sibling| !is_list_wrapper(sibling))
                    .count() as u64;
                format!("{}. ", u64::from(attrs.start) + position)
            }
            _ => format!("{} ", options.bullet_list_marker),
        };

        format!("{indent}{prefix}{content}\n")
    })
}

fn line_break_rule() -> Rule {
    Rule::for_tag(tags::LINE_BREAK, |node, _, options| {
        let in_item = node
            .parent()
            .is_some_and(|parent| matches!(parent.kind(), NodeKind::ListItem));

        if in_item {
            // Continuation lines line up with the item's content
            let indent = " ".repeat(options.list_indent * (node.list_depth() + 1));
            format!("\n{indent}")
        } else {
            "\n".to_string()
        }
    })
}

fn text_rule() -> Rule {
    Rule::for_tag(tags::TEXT, |_, content, _| content.to_string())
}

/// GitHub-flavored pipe table for `table` nodes.
///
/// Not part of the defaults; cells are written as their flattened text, so
/// marks inside cells are lost. The first row becomes the header row.
pub fn gfm_table_rule() -> Rule {
    Rule::new(Filter::tag(tags::TABLE), |node, _, _| {
        let rows: Vec<Vec<String>> = node
            .node
            .children()
            .iter()
            .map(|row| row.children().iter().map(cell_text).collect())
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return String::new();
        }

        let line = |cells: &[String]| {
            let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
            padded.resize(width, "");
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = vec![line(rows[0].as_slice()), format!("|{}", " --- |".repeat(width))];
        lines.extend(rows[1..].iter().map(|row| line(row.as_slice())));
        format!("\n\n{}\n\n", lines.join("\n"))
    })
}

fn cell_text(cell: &Node) -> String {
    cell.text_content()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
