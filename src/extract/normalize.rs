use unicode_normalization::UnicodeNormalization;

use crate::core::model::Fragment;

/// Separator inserted between fragment texts when flattening OCR output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSeparator {
    Space,
    Newline,
}

impl JoinSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinSeparator::Space => " ",
            JoinSeparator::Newline => "\n",
        }
    }
}

impl Default for JoinSeparator {
    fn default() -> Self {
        JoinSeparator::Newline
    }
}

/// Flatten a fragment sequence into one text stream.
///
/// Fragments are kept in engine order, none are dropped, and casing and
/// interior whitespace are untouched. Each fragment is NFKC-folded so
/// full-width digits and punctuation from Japanese screenshots (１，２３４,
/// ＃, ＠) compare equal to their ASCII forms, then edge whitespace is
/// collapsed into the single join separator.
pub fn normalize_fragments(fragments: &[Fragment], separator: JoinSeparator) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.text.nfkc().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join(separator.as_str())
}
