//! # fcref
//!
//! Find spreadsheet alias references inside FreeCAD `.FCStd` archives.
//!
//! FreeCAD documents refer to cells of other documents' spreadsheets with
//! qualified names such as `Main#Spreadsheet.Width` or, by label,
//! `<<Main>>#Spreadsheet.Width`. This library walks a directory tree,
//! searches every text member of every `.FCStd` zip archive for such a
//! reference without extracting anything, and reports the matching lines.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fcref::{find_references, SearchRequest};
//!
//! let request = SearchRequest::alias("<<Main>>", "Spreadsheet", Some("Width"));
//! for report in find_references(".", &request)? {
//!     println!("{}", report.path.display());
//!     for line in &report.lines {
//!         println!("{}", line.text);
//!     }
//! }
//! # Ok::<(), fcref::Error>(())
//! ```
//!
//! ## Features
//!
//! - `parallel`: search archives concurrently with Rayon

pub mod container;
pub mod discover;
pub mod error;
pub mod escape;
pub mod finder;
pub mod maintenance;
pub mod pattern;
pub mod render;
pub mod structured;

// Re-exports
pub use container::FcstdContainer;
pub use discover::{find_archives, FCSTD_EXTENSION};
pub use error::{Error, Result};
pub use escape::escape_identifier;
pub use finder::{
    normalize_whitespace, ArchiveProvider, FinderOptions, FsProvider, MatchReport, MatchedLine,
    ReferenceFinder, SearchRequest,
};
pub use maintenance::{remove_backups, unzip_all};
pub use pattern::SearchPattern;
pub use structured::StructuredMatch;

use std::path::Path;

/// Scan `root` for archives referring to the requested alias or variable,
/// using default options.
///
/// # Example
///
/// ```no_run
/// use fcref::{find_references, SearchRequest};
///
/// let reports = find_references("models", &SearchRequest::variable("Thickness"))?;
/// println!("{} documents use Thickness", reports.len());
/// # Ok::<(), fcref::Error>(())
/// ```
pub fn find_references(root: impl AsRef<Path>, request: &SearchRequest) -> Result<Vec<MatchReport>> {
    ReferenceFinder::new(FinderOptions::default()).find(root, request)
}

/// Scan `root` and render the result as grep-style text.
///
/// # Example
///
/// ```no_run
/// use fcref::{find_references_text, render::RenderOptions, SearchRequest};
///
/// let request = SearchRequest::alias("Main", "Spreadsheet", None::<String>);
/// print!("{}", find_references_text(".", &request, &RenderOptions::default())?);
/// # Ok::<(), fcref::Error>(())
/// ```
pub fn find_references_text(
    root: impl AsRef<Path>,
    request: &SearchRequest,
    options: &render::RenderOptions,
) -> Result<String> {
    let reports = find_references(root, request)?;
    Ok(render::to_text(&reports, options))
}
