//! XML escaping of document and spreadsheet identifiers.
//!
//! FreeCAD stores expressions inside `Document.xml` attributes, so a label
//! reference such as `<<Main>>#Sheet.Width` is written to disk as
//! `&lt;&lt;Main&gt;&gt;#Sheet.Width`. Identifiers must be escaped the same
//! way before they can be found by a plain substring search.

/// Escape `<` and `>` in an identifier.
///
/// Both characters are replaced in a single pass, so the `&` introduced by
/// one replacement is never escaped again. Every other character is kept.
///
/// # Example
///
/// ```
/// use fcref::escape_identifier;
///
/// assert_eq!(escape_identifier("<<Main>>"), "&lt;&lt;Main&gt;&gt;");
/// ```
pub fn escape_identifier(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
