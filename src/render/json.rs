//! JSON renderer implementation.

use crate::error::{Error, Result};
use serde::Serialize;

/// JSON output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    /// Compact single-line JSON
    Compact,
    /// Pretty-printed with 2-space indentation
    #[default]
    Pretty,
}

/// Serialize scan results (match reports or structured matches) to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let rendered = match format {
        JsonFormat::Compact => serde_json::to_string(value),
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
    };
    rendered.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::{MatchReport, MatchedLine};
    use std::path::PathBuf;

    fn report() -> MatchReport {
        MatchReport {
            path: PathBuf::from("parts/Bracket.FCStd"),
            lines: vec![MatchedLine {
                member: "Document.xml".to_string(),
                text: "<Expression path=\"Length\" expression=\"Main#Sheet.Width\"/>".to_string(),
                terms: vec!["Main#Sheet.Width".to_string()],
            }],
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&[report()], JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"path\": \"parts/Bracket.FCStd\""));
        assert!(json.contains("\"member\": \"Document.xml\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&[report()], JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"terms\":[\"Main#Sheet.Width\"]"));
    }

    #[test]
    fn test_reports_roundtrip() {
        let json = to_json(&vec![report()], JsonFormat::Pretty).unwrap();
        let parsed: Vec<MatchReport> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![report()]);
    }

    #[test]
    fn test_empty_results() {
        let reports: Vec<MatchReport> = Vec::new();
        assert_eq!(to_json(&reports, JsonFormat::Compact).unwrap(), "[]");
    }
}
