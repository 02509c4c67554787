//! Utility functions and constants for markup processing.

/// Elements whose content never contributes to the document
pub const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "head", "title", "meta", "link", "template", "noscript", "colgroup", "col",
];

/// Row groups that are transparent directly inside a table
pub const TABLE_SECTIONS: &[&str] = &["thead", "tbody", "tfoot"];

/// Check if an element is dropped during ingestion
pub fn is_dropped(tag: &str) -> bool {
    DROPPED_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Check if a tag is a table row group
pub fn is_table_section(tag: &str) -> bool {
    TABLE_SECTIONS.contains(&tag.to_lowercase().as_str())
}

/// Escape markdown special characters
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '{' | '}' | '[' | ']' | '(' | ')' | '#' | '+' | '-' | '.'
            | '!' | '|' | '~' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Collapse runs of more than two newlines and trim surrounding newlines
pub fn collapse_newlines(output: &str) -> String {
    let trimmed = output.trim_matches('\n');

    let mut newline_count = 0;
    let mut processed = String::with_capacity(trimmed.len());

    for c in trimmed.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                processed.push(c);
            }
        } else {
            newline_count = 0;
            processed.push(c);
        }
    }

    processed
}
