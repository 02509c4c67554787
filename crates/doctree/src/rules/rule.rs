//! Rule and Filter types for Markdown conversion.

use doctree_core::NodeRef;

use crate::markdown::MarkdownOptions;

/// Type alias for replacement functions
pub type ReplacementFn = Box<dyn Fn(&NodeRef<'_>, &str, &MarkdownOptions) -> String + Send + Sync>;

/// A filter determines which nodes a rule applies to
pub enum Filter {
    /// Match a single type tag
    TypeTag(String),
    /// Match any of multiple type tags
    TypeTags(Vec<String>),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&NodeRef<'_>, &MarkdownOptions) -> bool + Send + Sync>),
}

impl Filter {
    /// Create a filter for a single type tag
    pub fn tag(name: &str) -> Self {
        Filter::TypeTag(name.to_string())
    }

    /// Create a filter for multiple type tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TypeTags(names.iter().map(|s| s.to_string()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &MarkdownOptions) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches a node
    pub fn matches(&self, node: &NodeRef<'_>, options: &MarkdownOptions) -> bool {
        let tag = node.type_tag();
        match self {
            Filter::TypeTag(t) => tag == t,
            Filter::TypeTags(tags) => tags.iter().any(|t| t == tag),
            Filter::Predicate(f) => f(node, options),
        }
    }
}

/// A rule defines how to convert a matched node to Markdown
pub struct Rule {
    /// Filter to determine which nodes this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Markdown
    pub replacement: ReplacementFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &MarkdownOptions) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Box::new(replacement),
        }
    }

    /// Create a rule that matches a single type tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &MarkdownOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), replacement)
    }

    /// Create a rule that matches multiple type tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&NodeRef<'_>, &str, &MarkdownOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(&self, node: &NodeRef<'_>, content: &str, options: &MarkdownOptions) -> String {
        (self.replacement)(node, content, options)
    }
}
