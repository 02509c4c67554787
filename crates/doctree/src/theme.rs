//! Class names attached to rendered markup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A styling slot the HTML serializer can attach a class to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThemeClass {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Quote,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    UnderlineStrikethrough,
    Code,
    OrderedList,
    UnorderedList,
    ListItem,
    NestedListItem,
    Table,
    TableCell,
    TableCellHeader,
    TableScrollableWrapper,
}

impl ThemeClass {
    /// Slot for a heading level, if the level is in range
    pub fn heading(level: u8) -> Option<Self> {
        let class = match level {
            1 => ThemeClass::Heading1,
            2 => ThemeClass::Heading2,
            3 => ThemeClass::Heading3,
            4 => ThemeClass::Heading4,
            5 => ThemeClass::Heading5,
            6 => ThemeClass::Heading6,
            _ => return None,
        };
        Some(class)
    }
}

/// Mapping from styling slots to class names.
///
/// Slots without an entry render without a `class` attribute. The theme is
/// passed into serialization explicitly; there is no process-wide default
/// that conversions read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme {
    classes: IndexMap<ThemeClass, String>,
}

impl Theme {
    /// A theme that emits no classes
    pub fn empty() -> Self {
        Self {
            classes: IndexMap::new(),
        }
    }

    /// Set the class name for a slot
    pub fn with(mut self, slot: ThemeClass, class: &str) -> Self {
        self.set(slot, class);
        self
    }

    pub fn set(&mut self, slot: ThemeClass, class: &str) {
        self.classes.insert(slot, class.to_string());
    }

    pub fn remove(&mut self, slot: ThemeClass) {
        self.classes.shift_remove(&slot);
    }

    /// Class name for a slot
    pub fn class(&self, slot: ThemeClass) -> Option<&str> {
        self.classes.get(&slot).map(String::as_str)
    }

    pub fn heading_class(&self, level: u8) -> Option<&str> {
        ThemeClass::heading(level).and_then(|slot| self.class(slot))
    }
}

impl Default for Theme {
    /// Class names used by the document editor's stylesheet
    fn default() -> Self {
        Theme::empty()
            .with(ThemeClass::Heading1, "glyf-editor-h1")
            .with(ThemeClass::Heading2, "glyf-editor-h2")
            .with(ThemeClass::Heading3, "glyf-editor-h3")
            .with(ThemeClass::Bold, "glyf-editor-bold")
            .with(ThemeClass::Italic, "glyf-editor-italic")
            .with(ThemeClass::Underline, "glyf-editor-underline")
            .with(ThemeClass::Strikethrough, "glyf-editor-strikethrough")
            .with(
                ThemeClass::UnderlineStrikethrough,
                "glyf-editor-underlineStrikethrough",
            )
            .with(ThemeClass::OrderedList, "editor-list-ol")
            .with(ThemeClass::UnorderedList, "editor-list-ul")
            .with(ThemeClass::ListItem, "editor-listitem")
            .with(ThemeClass::NestedListItem, "editor-nested-listitem")
            .with(ThemeClass::Table, "ExampleEditorTheme__table")
            .with(ThemeClass::TableCell, "ExampleEditorTheme__tableCell")
            .with(
                ThemeClass::TableCellHeader,
                "ExampleEditorTheme__tableCellHeader",
            )
            .with(
                ThemeClass::TableScrollableWrapper,
                "ExampleEditorTheme__tableScrollableWrapper",
            )
    }
}
