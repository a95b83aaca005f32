//! Grep-style text renderer.

use crate::finder::MatchReport;
use crate::structured::StructuredMatch;
use colored::Colorize;

use super::options::{Highlight, RenderOptions};

/// Mark every occurrence of `term` in `line`.
pub fn highlight_term(line: &str, term: &str, highlight: Highlight) -> String {
    highlight_terms(line, &[term], highlight)
}

/// Mark every occurrence of any of `terms` in `line`.
///
/// Occurrences never overlap: scanning left to right, the longest term
/// starting at a position wins and the scan resumes after it.
pub fn highlight_terms<S: AsRef<str>>(line: &str, terms: &[S], highlight: Highlight) -> String {
    if matches!(highlight, Highlight::Plain) {
        return line.to_string();
    }

    let mut output = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(c) = rest.chars().next() {
        let longest = terms
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| !t.is_empty() && rest.starts_with(*t))
            .max_by_key(|t| t.len());

        match longest {
            Some(term) => {
                match highlight {
                    Highlight::Color => output.push_str(&term.red().bold().to_string()),
                    _ => {
                        output.push_str("[[");
                        output.push_str(term);
                        output.push_str("]]");
                    }
                }
                rest = &rest[term.len()..];
            }
            None => {
                output.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    output
}

/// Render reports as: archive path, one line per match, blank line.
///
/// An empty slice renders as an empty string.
pub fn to_text(reports: &[MatchReport], options: &RenderOptions) -> String {
    let mut output = String::new();

    for report in reports {
        let path = report.path.display().to_string();
        match options.highlight {
            Highlight::Color => output.push_str(&path.magenta().to_string()),
            _ => output.push_str(&path),
        }
        output.push('\n');

        for line in &report.lines {
            if options.show_member {
                output.push_str(&line.member);
                output.push_str(": ");
            }
            output.push_str(&highlight_terms(&line.text, &line.terms, options.highlight));
            output.push('\n');
        }

        output.push('\n');
    }

    output
}

/// Render structured matches one per line.
pub fn structured_to_text(matches: &[StructuredMatch]) -> String {
    let mut output = String::new();
    for m in matches {
        output.push_str(&m.to_string());
        output.push('\n');
    }
    output
}
