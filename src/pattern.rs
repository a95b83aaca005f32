//! Search patterns for spreadsheet references.

use crate::escape::escape_identifier;
use std::fmt;

/// A qualified reference `document#spreadsheet.suffix` in its on-disk form.
///
/// The pattern text is built once and never changes afterwards. Matching is
/// a plain substring test against a line of archive text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchPattern {
    text: String,
}

impl SearchPattern {
    /// Build a pattern from raw identifiers, escaping document and
    /// spreadsheet for XML.
    ///
    /// Without an alias the pattern ends in `.`, so it matches any alias of
    /// the spreadsheet.
    ///
    /// # Example
    ///
    /// ```
    /// use fcref::SearchPattern;
    ///
    /// let pattern = SearchPattern::new("<Doc>", "Sheet", Some("Width"));
    /// assert_eq!(pattern.as_str(), "&lt;Doc&gt;#Sheet.Width");
    /// ```
    pub fn new(document: &str, spreadsheet: &str, alias: Option<&str>) -> Self {
        Self::from_prepared(
            &escape_identifier(document),
            &escape_identifier(spreadsheet),
            alias,
        )
    }

    /// Build a pattern from identifiers that are already in their final
    /// form (plain or pre-escaped). Nothing is escaped.
    pub fn from_prepared(document: &str, spreadsheet: &str, suffix: Option<&str>) -> Self {
        let suffix = suffix.unwrap_or_default();
        let mut text =
            String::with_capacity(document.len() + spreadsheet.len() + suffix.len() + 2);
        text.push_str(document);
        text.push('#');
        text.push_str(spreadsheet);
        text.push('.');
        text.push_str(suffix);
        Self { text }
    }

    /// Wrap finished pattern text.
    pub(crate) fn from_text(text: String) -> Self {
        Self { text }
    }

    /// The pattern text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `line` contains this pattern.
    pub fn is_match(&self, line: &str) -> bool {
        line.contains(&self.text)
    }
}

impl fmt::Display for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for SearchPattern {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
