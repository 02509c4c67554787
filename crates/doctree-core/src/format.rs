//! Inline text formatting flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Format marks carried by a text run.
    ///
    /// Bit values match the integer `format` field of stored documents, so a
    /// run that is bold and italic serializes as `3`. Any combination is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(from = "u32", into = "u32")]
    pub struct TextFormat: u32 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
        const HIGHLIGHT = 1 << 7;
    }
}

impl TextFormat {
    /// Wrapping order used when formats are rendered as nested elements,
    /// outermost first.
    pub const NESTING_ORDER: [TextFormat; 8] = [
        TextFormat::BOLD,
        TextFormat::ITALIC,
        TextFormat::UNDERLINE,
        TextFormat::STRIKETHROUGH,
        TextFormat::CODE,
        TextFormat::SUBSCRIPT,
        TextFormat::SUPERSCRIPT,
        TextFormat::HIGHLIGHT,
    ];
}

impl Default for TextFormat {
    fn default() -> Self {
        TextFormat::empty()
    }
}

impl From<u32> for TextFormat {
    fn from(bits: u32) -> Self {
        TextFormat::from_bits_truncate(bits)
    }
}

impl From<TextFormat> for u32 {
    fn from(format: TextFormat) -> Self {
        format.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_bits() {
        let format = TextFormat::BOLD | TextFormat::ITALIC | TextFormat::UNDERLINE;
        assert_eq!(format.bits(), 11);
        assert!(format.contains(TextFormat::ITALIC));
        assert!(!format.contains(TextFormat::STRIKETHROUGH));
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&(TextFormat::BOLD | TextFormat::STRIKETHROUGH)).unwrap();
        assert_eq!(json, "5");

        let parsed: TextFormat = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, TextFormat::BOLD | TextFormat::ITALIC);
    }

    #[test]
    fn test_unknown_bits_are_dropped() {
        let parsed: TextFormat = serde_json::from_str("257").unwrap();
        assert_eq!(parsed, TextFormat::BOLD);
    }

    #[test]
    fn test_nesting_order_covers_every_flag() {
        let all = TextFormat::NESTING_ORDER
            .iter()
            .fold(TextFormat::empty(), |acc, f| acc | *f);
        assert_eq!(all, TextFormat::all());
    }
}
