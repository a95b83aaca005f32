//! Reference finder: scans a directory tree of `.FCStd` archives for
//! textual references to a spreadsheet alias or variable.

use crate::container::FcstdContainer;
use crate::discover::{find_files_with_suffix, FCSTD_EXTENSION};
use crate::error::{Error, Result};
use crate::pattern::SearchPattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Document identifiers tried by a variable search.
///
/// The same master document has been referenced by name and by label
/// (`<<Master>>`) over time. Inside `Document.xml` the label form is stored
/// escaped, so it is listed here already in its on-disk form.
pub const DEFAULT_VARIABLE_DOCUMENTS: [&str; 2] = ["Master", "&lt;&lt;Master&gt;&gt;"];

/// Spreadsheet holding the variables searched by a variable search.
pub const DEFAULT_VARIABLE_SPREADSHEET: &str = "Spreadsheet";

/// Members larger than this are not searched.
pub const DEFAULT_MAX_MEMBER_SIZE: u64 = 256 * 1024 * 1024;

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRequest {
    /// References to `document#spreadsheet.alias`. Without an alias every
    /// reference into the spreadsheet matches.
    Alias {
        /// Raw document identifier (name or label)
        document: String,
        /// Raw spreadsheet identifier
        spreadsheet: String,
        /// Optional cell alias
        alias: Option<String>,
    },
    /// References to a variable of the configured variable spreadsheet,
    /// under every configured document identifier form.
    Variable {
        /// Variable (alias) name
        name: String,
    },
}

impl SearchRequest {
    /// Create an alias search.
    pub fn alias(
        document: impl Into<String>,
        spreadsheet: impl Into<String>,
        alias: Option<impl Into<String>>,
    ) -> Self {
        Self::Alias {
            document: document.into(),
            spreadsheet: spreadsheet.into(),
            alias: alias.map(Into::into),
        }
    }

    /// Create a variable search.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable { name: name.into() }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Alias {
                document,
                spreadsheet,
                ..
            } => {
                if document.is_empty() || spreadsheet.is_empty() {
                    return Err(Error::Usage(
                        "find-refs <document> <spreadsheet> [alias]".to_string(),
                    ));
                }
            }
            Self::Variable { name } => {
                if name.is_empty() {
                    return Err(Error::Usage("find-variable-refs <variable>".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Options controlling a scan.
#[derive(Debug, Clone)]
pub struct FinderOptions {
    /// File name suffix of the archives to scan
    pub extension: String,

    /// Document identifiers used by variable searches, in on-disk form
    pub variable_documents: Vec<String>,

    /// Spreadsheet identifier used by variable searches, in on-disk form
    pub variable_spreadsheet: String,

    /// Skip members whose uncompressed size exceeds this
    pub max_member_size: Option<u64>,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            extension: FCSTD_EXTENSION.to_string(),
            variable_documents: DEFAULT_VARIABLE_DOCUMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            variable_spreadsheet: DEFAULT_VARIABLE_SPREADSHEET.to_string(),
            max_member_size: Some(DEFAULT_MAX_MEMBER_SIZE),
        }
    }
}

impl FinderOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the archive file name suffix.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Replace the document identifiers used by variable searches.
    pub fn with_variable_documents<I, S>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variable_documents = documents.into_iter().map(Into::into).collect();
        self
    }

    /// Set the spreadsheet identifier used by variable searches.
    pub fn with_variable_spreadsheet(mut self, spreadsheet: impl Into<String>) -> Self {
        self.variable_spreadsheet = spreadsheet.into();
        self
    }

    /// Set the member size limit (`None` for unlimited).
    pub fn with_max_member_size(mut self, max: Option<u64>) -> Self {
        self.max_member_size = max;
        self
    }
}

/// Source of archives for a scan.
///
/// The file system implementation is [`FsProvider`]; tests plug in
/// in-memory fixtures.
pub trait ArchiveProvider: Send + Sync {
    /// List the archive paths under `root` whose names end in `extension`.
    fn discover(&self, root: &Path, extension: &str) -> Vec<PathBuf>;

    /// Open one archive.
    fn open(&self, path: &Path) -> Result<FcstdContainer>;
}

/// Archives on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProvider;

impl ArchiveProvider for FsProvider {
    fn discover(&self, root: &Path, extension: &str) -> Vec<PathBuf> {
        find_files_with_suffix(root, extension)
    }

    fn open(&self, path: &Path) -> Result<FcstdContainer> {
        FcstdContainer::open(path)
    }
}

/// A matched line, whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedLine {
    /// Archive member the line was found in
    pub member: String,
    /// Line text with surrounding whitespace trimmed and inner runs collapsed
    pub text: String,
    /// Every pattern found in the line, as it appears in `text`
    pub terms: Vec<String>,
}

/// All matches within one archive. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Archive path
    pub path: PathBuf,
    /// Matched lines in member order
    pub lines: Vec<MatchedLine>,
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn normalize_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scans archives for spreadsheet references.
///
/// # Example
///
/// ```no_run
/// use fcref::{FinderOptions, ReferenceFinder, SearchRequest};
///
/// let finder = ReferenceFinder::new(FinderOptions::default());
/// let request = SearchRequest::alias("Main", "Spreadsheet", Some("Width"));
/// for report in finder.find(".", &request)? {
///     println!("{}: {} lines", report.path.display(), report.lines.len());
/// }
/// # Ok::<(), fcref::Error>(())
/// ```
#[derive(Debug)]
pub struct ReferenceFinder<P = FsProvider> {
    pub(crate) provider: P,
    pub(crate) options: FinderOptions,
}

impl ReferenceFinder<FsProvider> {
    /// Create a finder over the local file system.
    pub fn new(options: FinderOptions) -> Self {
        Self {
            provider: FsProvider,
            options,
        }
    }
}

impl<P: ArchiveProvider> ReferenceFinder<P> {
    /// Create a finder over a custom archive provider.
    pub fn with_provider(provider: P, options: FinderOptions) -> Self {
        Self { provider, options }
    }

    /// The options in effect.
    pub fn options(&self) -> &FinderOptions {
        &self.options
    }

    /// Build the patterns for a request.
    pub fn patterns(&self, request: &SearchRequest) -> Result<Vec<SearchPattern>> {
        request.validate()?;
        match request {
            SearchRequest::Alias {
                document,
                spreadsheet,
                alias,
            } => Ok(vec![SearchPattern::new(
                document,
                spreadsheet,
                alias.as_deref(),
            )]),
            SearchRequest::Variable { name } => {
                if self.options.variable_documents.is_empty() {
                    return Err(Error::Usage(
                        "at least one variable document identifier is required".to_string(),
                    ));
                }
                let mut patterns: Vec<SearchPattern> = Vec::new();
                for document in &self.options.variable_documents {
                    let pattern = SearchPattern::from_prepared(
                        document,
                        &self.options.variable_spreadsheet,
                        Some(name.as_str()),
                    );
                    if !patterns.contains(&pattern) {
                        patterns.push(pattern);
                    }
                }
                Ok(patterns)
            }
        }
    }

    /// Scan every archive under `root` and return one report per archive
    /// with at least one match, in discovery order.
    ///
    /// Fails only with [`Error::Usage`], before anything is discovered.
    /// Archives that cannot be read count as having no matches.
    pub fn find(&self, root: impl AsRef<Path>, request: &SearchRequest) -> Result<Vec<MatchReport>> {
        let patterns = self.patterns(request)?;
        let archives = self.provider.discover(root.as_ref(), &self.options.extension);
        tracing::debug!(
            archives = archives.len(),
            patterns = patterns.len(),
            "scanning archives"
        );

        #[cfg(feature = "parallel")]
        let reports = {
            use rayon::prelude::*;
            archives
                .par_iter()
                .filter_map(|path| self.search_archive(path, &patterns))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let reports = archives
            .iter()
            .filter_map(|path| self.search_archive(path, &patterns))
            .collect();

        Ok(reports)
    }

    /// Search a single archive. The container is dropped before returning.
    fn search_archive(&self, path: &Path, patterns: &[SearchPattern]) -> Option<MatchReport> {
        let container = match self.provider.open(path) {
            Ok(container) => container,
            Err(e) => {
                let err = Error::ArchiveRead {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", err);
                return None;
            }
        };

        tracing::debug!(path = %path.display(), "searching archive");
        let lines: Vec<MatchedLine> = container
            .search_lines(patterns, self.options.max_member_size)
            .into_iter()
            .map(|hit| MatchedLine {
                member: hit.member,
                text: normalize_whitespace(&hit.line),
                terms: hit
                    .patterns
                    .iter()
                    .map(|p| normalize_whitespace(p.as_str()))
                    .collect(),
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(MatchReport {
                path: path.to_path_buf(),
                lines,
            })
        }
    }
}
