//! Output rendering for scan results.
//!
//! # Example
//!
//! ```no_run
//! use fcref::{render::*, FinderOptions, ReferenceFinder, SearchRequest};
//!
//! let finder = ReferenceFinder::new(FinderOptions::default());
//! let reports = finder.find(".", &SearchRequest::variable("Thickness"))?;
//!
//! // Grep-style text
//! print!("{}", to_text(&reports, &RenderOptions::default()));
//!
//! // JSON
//! println!("{}", to_json(&reports, JsonFormat::Pretty)?);
//! # Ok::<(), fcref::Error>(())
//! ```

mod json;
mod options;
mod text;

pub use json::{to_json, JsonFormat};
pub use options::{Highlight, RenderOptions};
pub use text::{highlight_term, highlight_terms, structured_to_text, to_text};
