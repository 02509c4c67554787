//! Headless runtime: load a tree, run an operation against it, settle.
//!
//! Every conversion works on a fresh tree owned by a [`Session`]. Mutations
//! are queued with [`Session::update`] and applied on the next flush; reads
//! always flush first, and [`HeadlessRuntime::with_tree`] flushes once more
//! after the operation returns, so no queued work outlives the call.

use doctree_core::{SerializedTree, Tree};
use tracing::{debug, debug_span};

use crate::html::HtmlParser;
use crate::markdown::{MarkdownOptions, MarkdownSerializer};
use crate::registry::Registry;
use crate::render;
use crate::rules::Rules;
use crate::theme::Theme;
use crate::Result;

/// Initial content of a session
#[derive(Debug, Clone)]
pub enum Source<'s> {
    Empty,
    Tree(Tree),
    Json(&'s str),
    Serialized(SerializedTree),
    Html(&'s str),
}

impl Source<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Source::Empty => "empty",
            Source::Tree(_) => "tree",
            Source::Json(_) => "json",
            Source::Serialized(_) => "serialized",
            Source::Html(_) => "html",
        }
    }
}

/// A queued tree mutation
pub type Update = Box<dyn FnOnce(&mut Tree) -> Result<()>>;

/// The conversion components a session works with
#[derive(Clone, Copy)]
pub struct HeadlessRuntime<'c> {
    registry: &'c Registry,
    theme: &'c Theme,
    rules: &'c Rules,
    markdown: &'c MarkdownOptions,
}

impl<'c> HeadlessRuntime<'c> {
    pub fn new(
        registry: &'c Registry,
        theme: &'c Theme,
        rules: &'c Rules,
        markdown: &'c MarkdownOptions,
    ) -> Self {
        Self {
            registry,
            theme,
            rules,
            markdown,
        }
    }

    /// Load `initial`, run `operation`, and settle all queued updates.
    pub fn with_tree<T, F>(&self, initial: Source<'_>, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Session<'c>) -> Result<T>,
    {
        let span = debug_span!("with_tree", source = initial.kind());
        let _enter = span.enter();

        let tree = self.load(initial)?;
        let mut session = Session {
            runtime: *self,
            tree,
            pending: Vec::new(),
        };

        let output = operation(&mut session)?;
        session.flush()?;

        debug!(nodes = session.tree.len(), "session settled");
        Ok(output)
    }

    fn load(&self, initial: Source<'_>) -> Result<Tree> {
        match initial {
            Source::Empty => Ok(Tree::empty()),
            Source::Tree(mut tree) => {
                tree.validate()?;
                tree.renumber();
                Ok(tree)
            }
            Source::Json(json) => self.registry.load(&SerializedTree::from_json(json)?),
            Source::Serialized(serialized) => self.registry.load(&serialized),
            Source::Html(markup) => HtmlParser::new(self.registry).parse(markup),
        }
    }
}

/// A tree under conversion plus its queued updates
pub struct Session<'c> {
    runtime: HeadlessRuntime<'c>,
    tree: Tree,
    pending: Vec<Update>,
}

impl Session<'_> {
    /// Queue a mutation; it runs on the next flush
    pub fn update<F>(&mut self, update: F)
    where
        F: FnOnce(&mut Tree) -> Result<()> + 'static,
    {
        self.pending.push(Box::new(update));
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply queued updates in order, then re-validate and renumber
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        debug!(updates = pending.len(), "flushing updates");
        for update in pending {
            update(&mut self.tree)?;
        }

        self.tree.validate()?;
        self.tree.renumber();
        Ok(())
    }

    /// The settled tree
    pub fn tree(&mut self) -> Result<&Tree> {
        self.flush()?;
        Ok(&self.tree)
    }

    pub fn to_html(&mut self) -> Result<String> {
        self.flush()?;
        render::serialize(&self.tree, self.runtime.registry, self.runtime.theme)
    }

    pub fn to_markdown(&mut self) -> Result<String> {
        self.flush()?;
        Ok(MarkdownSerializer::new(self.runtime.rules, self.runtime.markdown).serialize(&self.tree))
    }

    pub fn to_serialized(&mut self) -> Result<SerializedTree> {
        self.flush()?;
        self.runtime.registry.save(&self.tree)
    }

    pub fn to_json(&mut self) -> Result<String> {
        Ok(self.to_serialized()?.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use doctree_core::{Node, NodeKind, StructuralError};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixture {
        registry: Registry,
        theme: Theme,
        rules: Rules,
        markdown: MarkdownOptions,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: Registry::new(),
                theme: Theme::empty(),
                rules: Rules::new(),
                markdown: MarkdownOptions::default(),
            }
        }

        fn runtime(&self) -> HeadlessRuntime<'_> {
            HeadlessRuntime::new(&self.registry, &self.theme, &self.rules, &self.markdown)
        }
    }

    fn add_paragraph(text: &'static str) -> impl FnOnce(&mut Tree) -> Result<()> {
        move |tree| {
            let p = Node::build(NodeKind::Paragraph, vec![Node::text(text)])?;
            tree.root_mut().append(p)?;
            Ok(())
        }
    }

    #[test]
    fn test_reads_see_queued_updates() {
        let fixture = Fixture::new();
        let html = fixture
            .runtime()
            .with_tree(Source::Empty, |session| {
                session.update(add_paragraph("one"));
                assert!(session.has_pending());
                session.to_html()
            })
            .unwrap();
        assert_eq!(html, "<p><span>one</span></p>");
    }

    #[test]
    fn test_pending_work_settles_before_return() {
        let fixture = Fixture::new();
        let applied = Rc::new(Cell::new(false));
        let flag = Rc::clone(&applied);
        fixture
            .runtime()
            .with_tree(Source::Empty, move |session| {
                session.update(move |_| {
                    flag.set(true);
                    Ok(())
                });
                Ok(())
            })
            .unwrap();
        assert!(applied.get());
    }

    #[test]
    fn test_flush_renumbers() {
        let fixture = Fixture::new();
        let ids = fixture
            .runtime()
            .with_tree(Source::Html("<p>a</p>"), |session| {
                session.update(add_paragraph("b"));
                let tree = session.tree()?;
                Ok(tree.descendants().map(|n| n.id().index()).collect::<Vec<_>>())
            })
            .unwrap();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_invalid_update_fails_flush() {
        let fixture = Fixture::new();
        let result = fixture.runtime().with_tree(Source::Empty, |session| {
            session.update(|tree| {
                tree.root_mut().children_mut().push(Node::text("stray"));
                Ok(())
            });
            Ok(())
        });
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::DisallowedChild { .. }))
        ));
    }

    #[test]
    fn test_json_source_round_trip() {
        let fixture = Fixture::new();
        let json = r#"{"root":{"type":"root","children":[{"type":"paragraph","children":[{"type":"text","attributes":{"format":1,"text":"Hi"}}]}]}}"#;
        let (markdown, out) = fixture
            .runtime()
            .with_tree(Source::Json(json), |session| {
                Ok((session.to_markdown()?, session.to_json()?))
            })
            .unwrap();
        assert_eq!(markdown, "**Hi**");
        assert_eq!(out, json);
    }

    #[test]
    fn test_malformed_json_source() {
        let fixture = Fixture::new();
        let result = fixture
            .runtime()
            .with_tree(Source::Json("{\"root\":"), |session| session.to_html());
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }
}
