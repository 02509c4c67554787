//! Rule system for tree to Markdown conversion.

mod markdown;
mod rule;

pub use markdown::{default_rules, gfm_table_rule};
pub use rule::{Filter, ReplacementFn, Rule};

use doctree_core::{NodeRef, TextAttrs, TextFormat};
use indexmap::IndexMap;

use crate::markdown::MarkdownOptions;
use crate::utilities::escape_markdown;

/// Delimiter written around a marked text run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
    /// The configured strong delimiter
    Strong,
    /// The configured emphasis delimiter
    Emphasis,
    /// Backticks, lengthened when the content contains a backtick
    Code,
    Literal(String),
}

/// Markdown syntax for one format mark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRule {
    pub format: TextFormat,
    pub delimiter: Delimiter,
}

impl MarkRule {
    pub fn new(format: TextFormat, delimiter: Delimiter) -> Self {
        Self { format, delimiter }
    }

    /// Wrap content in this mark's delimiters.
    ///
    /// Leading and trailing whitespace stays outside the delimiters, and
    /// whitespace-only content is returned unchanged.
    pub fn apply(&self, content: &str, options: &MarkdownOptions) -> String {
        let inner = content.trim();
        if inner.is_empty() {
            return content.to_string();
        }
        let start = content.len() - content.trim_start().len();
        let end = start + inner.len();

        let (delimiter, pad) = match &self.delimiter {
            Delimiter::Strong => (options.strong_delimiter.clone(), ""),
            Delimiter::Emphasis => (options.em_delimiter.to_string(), ""),
            Delimiter::Code if inner.contains('`') => ("``".to_string(), " "),
            Delimiter::Code => ("`".to_string(), ""),
            Delimiter::Literal(d) => (d.clone(), ""),
        };

        format!(
            "{}{delimiter}{pad}{inner}{pad}{delimiter}{}",
            &content[..start],
            &content[end..]
        )
    }
}

/// Mark rules applied innermost first
pub fn default_marks() -> Vec<MarkRule> {
    vec![
        MarkRule::new(TextFormat::CODE, Delimiter::Code),
        MarkRule::new(TextFormat::STRIKETHROUGH, Delimiter::Literal("~~".to_string())),
        MarkRule::new(TextFormat::ITALIC, Delimiter::Emphasis),
        MarkRule::new(TextFormat::BOLD, Delimiter::Strong),
    ]
}

/// Collection of rules for conversion
pub struct Rules {
    /// Custom rules added by the user (checked first)
    custom_rules: IndexMap<String, Rule>,
    /// Built-in rules
    default_rules: Vec<Rule>,
    /// Syntax for format marks on text runs
    marks: Vec<MarkRule>,
}

impl Rules {
    /// Create a new Rules instance with the default rules
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            default_rules: default_rules(),
            marks: default_marks(),
        }
    }

    /// Add a custom rule; a rule with the same key is replaced in place
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Add syntax for a format mark, applied outside the existing marks
    pub fn add_mark(&mut self, mark: MarkRule) {
        self.marks.retain(|m| m.format != mark.format);
        self.marks.push(mark);
    }

    /// Find the appropriate rule for a node
    pub fn for_node<'a>(&'a self, node: &NodeRef<'_>, options: &MarkdownOptions) -> Option<&'a Rule> {
        self.custom_rules
            .values()
            .chain(&self.default_rules)
            .find(|rule| rule.filter.matches(node, options))
    }

    /// Markdown for the text of a run, with its marks applied
    pub fn render_text(&self, attrs: &TextAttrs, options: &MarkdownOptions) -> String {
        let mut content = if options.escape_text && !attrs.format.contains(TextFormat::CODE) {
            escape_markdown(&attrs.text)
        } else {
            attrs.text.clone()
        };

        for mark in &self.marks {
            if attrs.format.contains(mark.format) {
                content = mark.apply(&content, options);
            }
        }

        content
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str, format: TextFormat) -> String {
        let attrs = TextAttrs {
            text: text.to_string(),
            format,
        };
        Rules::new().render_text(&attrs, &MarkdownOptions::default())
    }

    #[test]
    fn test_marks_innermost_first() {
        assert_eq!(render("x", TextFormat::BOLD), "**x**");
        assert_eq!(render("x", TextFormat::BOLD | TextFormat::ITALIC), "***x***");
        assert_eq!(
            render("x", TextFormat::STRIKETHROUGH | TextFormat::CODE),
            "~~`x`~~"
        );
    }

    #[test]
    fn test_unsupported_marks_dropped() {
        assert_eq!(render("x", TextFormat::UNDERLINE | TextFormat::HIGHLIGHT), "x");
    }

    #[test]
    fn test_whitespace_moves_outside() {
        assert_eq!(render(" bold ", TextFormat::BOLD), " **bold** ");
        assert_eq!(render("   ", TextFormat::BOLD), "   ");
    }

    #[test]
    fn test_code_with_backtick() {
        assert_eq!(render("a`b", TextFormat::CODE), "`` a`b ``");
    }

    #[test]
    fn test_escape_skips_code() {
        let options = MarkdownOptions {
            escape_text: true,
            ..MarkdownOptions::default()
        };
        let rules = Rules::new();
        let plain = TextAttrs {
            text: "1. *".to_string(),
            format: TextFormat::empty(),
        };
        let code = TextAttrs {
            text: "a*b".to_string(),
            format: TextFormat::CODE,
        };
        assert_eq!(rules.render_text(&plain, &options), "1\\. \\*");
        assert_eq!(rules.render_text(&code, &options), "`a*b`");
    }

    #[test]
    fn test_add_mark() {
        let mut rules = Rules::new();
        rules.add_mark(MarkRule::new(
            TextFormat::HIGHLIGHT,
            Delimiter::Literal("==".to_string()),
        ));
        let attrs = TextAttrs {
            text: "hi".to_string(),
            format: TextFormat::HIGHLIGHT | TextFormat::BOLD,
        };
        assert_eq!(rules.render_text(&attrs, &MarkdownOptions::default()), "==**hi**==");
    }
}
