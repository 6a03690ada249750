//! Comment stripping applied before every structural pattern test

use regex::Regex;

/// Removes block and line comments from source text.
///
/// A `//` preceded by `:` or `\` is not treated as a line comment, so URL
/// literals such as `http://...` survive stripping. Block comments are
/// matched non-greedily.
pub struct CommentStripper {
    pattern: Regex,
}

impl Default for CommentStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentStripper {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"(?m)/\*(?s:.)*?\*/|([^\\:]|^)//.*$").unwrap(),
        }
    }

    /// Pure text transform; the original text is left untouched
    pub fn strip(&self, text: &str) -> String {
        self.pattern.replace_all(text, "${1}").into_owned()
    }
}
