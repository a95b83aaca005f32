//! Structured reference search over `Document.xml`.
//!
//! Instead of grepping raw lines, this walks the object data of each
//! document and looks at the two places FreeCAD stores expressions:
//!
//! ```xml
//! <Property name="cells" type="Spreadsheet::PropertySheet">
//!     <Cells Count="1">
//!         <Cell address="B1" content="=Main#Spreadsheet.Value" alias="Value1"/>
//!     </Cells>
//! </Property>
//! <Property name="ExpressionEngine" type="App::PropertyExpressionEngine">
//!     <ExpressionEngine count="1">
//!         <Expression path="Radius" expression="Main#Spreadsheet.Value"/>
//!     </ExpressionEngine>
//! </Property>
//! ```
//!
//! Attribute values are unescaped by the XML reader, so references are
//! matched in their plain form (`<<Main>>#Spreadsheet.Value`).

use crate::error::{Error, Result};
use crate::finder::{ArchiveProvider, ReferenceFinder, SearchRequest};
use crate::pattern::SearchPattern;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Archive member holding the document model.
pub const DOCUMENT_XML: &str = "Document.xml";

/// A reference found in a spreadsheet cell or an expression binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredMatch {
    /// Archive the reference was found in
    pub archive: PathBuf,
    /// Name of the object owning the property
    pub object: String,
    /// Property name (`cells` or `ExpressionEngine`)
    pub property: String,
    /// Cell address or bound property path
    pub location: String,
}

impl fmt::Display for StructuredMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}.{} {}",
            self.archive.display(),
            self.object,
            self.property,
            self.location
        )
    }
}

/// Where a property keeps its expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpressionHolder {
    /// `Cell` elements: expression in `content`, location in `address`
    Cells,
    /// `Expression` elements: expression in `expression`, location in `path`
    ExpressionEngine,
}

impl ExpressionHolder {
    fn for_property(name: &str) -> Option<Self> {
        match name {
            "cells" => Some(Self::Cells),
            "ExpressionEngine" => Some(Self::ExpressionEngine),
            _ => None,
        }
    }

    fn element(self) -> &'static [u8] {
        match self {
            Self::Cells => b"Cell",
            Self::ExpressionEngine => b"Expression",
        }
    }

    fn reference_attribute(self) -> &'static [u8] {
        match self {
            Self::Cells => b"content",
            Self::ExpressionEngine => b"expression",
        }
    }

    fn location_attribute(self) -> &'static [u8] {
        match self {
            Self::Cells => b"address",
            Self::ExpressionEngine => b"path",
        }
    }
}

/// A hit inside one `Document.xml`: (object, property, location).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHit {
    /// Object name
    pub object: String,
    /// Property name
    pub property: String,
    /// Cell address or property path
    pub location: String,
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
        })
}

/// Tracks where the reader is inside `ObjectData`.
#[derive(Default)]
struct ObjectDataWalker {
    in_object_data: bool,
    object: Option<String>,
    property: Option<(String, Option<ExpressionHolder>)>,
    hits: Vec<DocumentHit>,
}

impl ObjectDataWalker {
    fn open(&mut self, e: &BytesStart<'_>, is_start: bool, patterns: &[SearchPattern]) {
        match e.name().as_ref() {
            b"ObjectData" if is_start => self.in_object_data = true,
            b"Object" if self.in_object_data && is_start => {
                self.object = attribute(e, b"name");
            }
            b"Property" if self.object.is_some() && is_start => {
                self.property = attribute(e, b"name").map(|name| {
                    let holder = ExpressionHolder::for_property(&name);
                    (name, holder)
                });
            }
            name => self.inspect(name, e, patterns),
        }
    }

    fn inspect(&mut self, name: &[u8], e: &BytesStart<'_>, patterns: &[SearchPattern]) {
        let (Some(object), Some((property, Some(holder)))) = (&self.object, &self.property) else {
            return;
        };
        if name != holder.element() {
            return;
        }

        let content = attribute(e, holder.reference_attribute()).unwrap_or_default();
        if patterns.iter().any(|p| p.is_match(&content)) {
            self.hits.push(DocumentHit {
                object: object.clone(),
                property: property.clone(),
                location: attribute(e, holder.location_attribute()).unwrap_or_default(),
            });
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"ObjectData" => {
                self.in_object_data = false;
                self.object = None;
                self.property = None;
            }
            b"Object" => {
                self.object = None;
                self.property = None;
            }
            b"Property" => self.property = None,
            _ => {}
        }
    }
}

/// Find references in the text of a `Document.xml`.
///
/// Only objects under `ObjectData` are inspected; the `Objects` index that
/// precedes it carries no properties.
pub fn find_in_document_xml(xml: &str, patterns: &[SearchPattern]) -> Result<Vec<DocumentHit>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut walker = ObjectDataWalker::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.open(&e, true, patterns),
            Ok(Event::Empty(e)) => walker.open(&e, false, patterns),
            Ok(Event::End(e)) => walker.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.hits)
}

/// Turn on-disk patterns back into the plain form seen in attribute values.
fn plain_patterns(patterns: Vec<SearchPattern>) -> Vec<SearchPattern> {
    let mut plain: Vec<SearchPattern> = Vec::new();
    for pattern in patterns {
        let unescaped = quick_xml::escape::unescape(pattern.as_str()).map(|t| t.into_owned());
        let candidate = match unescaped {
            Ok(text) => SearchPattern::from_text(text),
            Err(_) => pattern,
        };
        if !plain.contains(&candidate) {
            plain.push(candidate);
        }
    }
    plain
}

impl<P: ArchiveProvider> ReferenceFinder<P> {
    /// Scan every archive under `root` and report references found in
    /// spreadsheet cells and expression bindings of `Document.xml`.
    ///
    /// Archives that cannot be opened, lack `Document.xml` or hold malformed
    /// XML are skipped with a warning.
    pub fn find_structured(
        &self,
        root: impl AsRef<Path>,
        request: &SearchRequest,
    ) -> Result<Vec<StructuredMatch>> {
        let patterns = plain_patterns(self.patterns(request)?);
        let archives = self
            .provider
            .discover(root.as_ref(), &self.options.extension);

        let mut matches = Vec::new();
        for path in archives {
            let hits = match self.document_hits(&path, &patterns) {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping archive");
                    continue;
                }
            };
            matches.extend(hits.into_iter().map(|hit| StructuredMatch {
                archive: path.clone(),
                object: hit.object,
                property: hit.property,
                location: hit.location,
            }));
        }

        Ok(matches)
    }

    fn document_hits(&self, path: &Path, patterns: &[SearchPattern]) -> Result<Vec<DocumentHit>> {
        let container = self.provider.open(path)?;
        let xml = container.read_text(DOCUMENT_XML)?;
        find_in_document_xml(&xml, patterns)
    }
}
