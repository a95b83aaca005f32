//! ZIP container abstraction for FreeCAD `.FCStd` archives.
//!
//! An `.FCStd` file is a plain zip archive holding `Document.xml`,
//! `GuiDocument.xml`, shape files (`*.brp`) and thumbnails. The container
//! lets callers list members, read them as decoded text and search every
//! textual member line by line without extracting anything to disk.

use crate::error::{Error, Result};
use crate::pattern::SearchPattern;
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// Number of leading bytes inspected when deciding whether a member is binary.
const BINARY_SNIFF_LEN: usize = 8000;

/// Upper bound on the buffer reserved up front for a member. The declared
/// size comes from the archive header and is not trusted beyond this.
const MAX_PREALLOCATION: u64 = 1024 * 1024;

/// A line of member text that contains one of the searched patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHit<'p> {
    /// Name of the archive member the line was read from
    pub member: String,
    /// The line as stored, without its terminator
    pub line: String,
    /// Every pattern found in the line, in pattern order
    pub patterns: Vec<&'p SearchPattern>,
}

/// Zip container over an `.FCStd` document.
pub struct FcstdContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

/// Decode member bytes to text, handling UTF-8 (with or without BOM) and
/// UTF-16 with a byte order mark. Anything else falls back to lossy UTF-8.
pub fn decode_text_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }

    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Whether member bytes look binary: a NUL byte near the start, unless the
/// data opens with a UTF-16 byte order mark.
pub fn is_binary(bytes: &[u8]) -> bool {
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return false;
    }
    let head = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    head.contains(&0)
}

impl FcstdContainer {
    /// Open a container from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fcref::container::FcstdContainer;
    ///
    /// let container = FcstdContainer::open("Bracket.FCStd")?;
    /// assert!(container.exists("Document.xml"));
    /// # Ok::<(), fcref::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create a container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Create a container from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Read a member as raw bytes.
    pub fn read_binary(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(name)
            .map_err(|_| Error::MissingComponent(name.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a member as decoded text.
    pub fn read_text(&self, name: &str) -> Result<String> {
        let bytes = self.read_binary(name)?;
        Ok(decode_text_bytes(&bytes))
    }

    /// Check if a member exists in the archive.
    pub fn exists(&self, name: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == name);
        found
    }

    /// List all members in the archive, in central directory order.
    pub fn list_files(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        (0..archive.len())
            .filter_map(|i| archive.name_for_index(i).map(String::from))
            .collect()
    }

    /// Extract every member below `dir`, creating it if needed.
    ///
    /// Member paths that would escape `dir` are rejected by the zip reader.
    pub fn extract_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let mut archive = self.archive.borrow_mut();
        archive.extract(dir.as_ref())?;
        Ok(())
    }

    /// Search every textual member for lines containing any of `patterns`.
    ///
    /// Directories, binary members and members larger than `max_member_size`
    /// (when set) are skipped. A member that fails to decompress is skipped
    /// with a warning; the remaining members are still searched.
    pub fn search_lines<'p>(
        &self,
        patterns: &'p [SearchPattern],
        max_member_size: Option<u64>,
    ) -> Vec<LineHit<'p>> {
        let mut hits = Vec::new();
        if patterns.is_empty() {
            return hits;
        }

        let mut archive = self.archive.borrow_mut();
        for index in 0..archive.len() {
            let (member, bytes) = match read_member(&mut archive, index, max_member_size) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unreadable archive member");
                    continue;
                }
            };

            if is_binary(&bytes) {
                tracing::trace!(member = %member, "skipping binary member");
                continue;
            }

            let text = decode_text_bytes(&bytes);
            for line in text.lines() {
                let found: Vec<&SearchPattern> =
                    patterns.iter().filter(|p| p.is_match(line)).collect();
                if !found.is_empty() {
                    hits.push(LineHit {
                        member: member.clone(),
                        line: line.to_string(),
                        patterns: found,
                    });
                }
            }
        }

        hits
    }
}

/// Read one member by index. Returns `None` for entries that are not searched.
///
/// The size limit applies both to the size declared in the archive and to
/// the bytes actually produced by decompression.
fn read_member(
    archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>,
    index: usize,
    max_member_size: Option<u64>,
) -> Result<Option<(String, Vec<u8>)>> {
    let mut file = archive.by_index(index)?;
    if file.is_dir() {
        return Ok(None);
    }
    if max_member_size.is_some_and(|max| file.size() > max) {
        tracing::debug!(member = file.name(), size = file.size(), "skipping oversized member");
        return Ok(None);
    }

    let name = file.name().to_string();
    let mut data = Vec::with_capacity(file.size().min(MAX_PREALLOCATION) as usize);
    match max_member_size {
        Some(max) => {
            (&mut file).take(max.saturating_add(1)).read_to_end(&mut data)?;
            if data.len() as u64 > max {
                tracing::debug!(member = %name, "skipping member that inflates past the size limit");
                return Ok(None);
            }
        }
        None => {
            file.read_to_end(&mut data)?;
        }
    }
    Ok(Some((name, data)))
}

impl std::fmt::Debug for FcstdContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcstdContainer")
            .field("files", &self.list_files().len())
            .finish()
    }
}

/// Hand-patched archives for exercising damaged input.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const CENTRAL_HEADER: &[u8] = b"PK\x01\x02";
    const END_OF_CENTRAL_DIRECTORY: &[u8] = b"PK\x05\x06";

    /// Build an archive whose members are stored uncompressed, so member
    /// bytes appear verbatim in the output.
    pub(crate) fn stored_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in members {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        buffer
    }

    fn find(data: &[u8], needle: &[u8]) -> Option<usize> {
        data.windows(needle.len()).position(|w| w == needle)
    }

    fn read_u16(data: &[u8], at: usize) -> usize {
        u16::from_le_bytes([data[at], data[at + 1]]) as usize
    }

    fn central_header(data: &[u8], name: &str) -> usize {
        let mut start = 0;
        while let Some(pos) = find(&data[start..], CENTRAL_HEADER) {
            let header = start + pos;
            let name_len = read_u16(data, header + 28);
            if &data[header + 46..header + 46 + name_len] == name.as_bytes() {
                return header;
            }
            start = header + CENTRAL_HEADER.len();
        }
        panic!("no central directory entry for {name}");
    }

    /// Flip a byte of stored member data so its checksum no longer matches.
    pub(crate) fn corrupt_payload(data: &mut [u8], needle: &[u8]) {
        let at = find(data, needle).expect("payload present");
        data[at] ^= 0x20;
    }

    /// Overwrite the uncompressed size recorded in the central directory.
    pub(crate) fn declare_uncompressed_size(data: &mut [u8], name: &str, size: u32) {
        let header = central_header(data, name);
        data[header + 24..header + 28].copy_from_slice(&size.to_le_bytes());
    }

    /// Record `size` as the member's uncompressed size through a zip64
    /// extra field in the central directory.
    pub(crate) fn declare_zip64_size(data: &mut Vec<u8>, name: &str, size: u64) {
        let header = central_header(data, name);
        data[header + 24..header + 28].copy_from_slice(&u32::MAX.to_le_bytes());

        let name_len = read_u16(data, header + 28);
        let extra_len = read_u16(data, header + 30);
        let mut field = vec![0x01, 0x00, 0x08, 0x00];
        field.extend_from_slice(&size.to_le_bytes());
        let insert_at = header + 46 + name_len + extra_len;
        let tail = data.split_off(insert_at);
        data.extend_from_slice(&field);
        data.extend_from_slice(&tail);
        let new_extra_len = (extra_len + field.len()) as u16;
        data[header + 30..header + 32].copy_from_slice(&new_extra_len.to_le_bytes());

        let eocd = data
            .windows(END_OF_CENTRAL_DIRECTORY.len())
            .rposition(|w| w == END_OF_CENTRAL_DIRECTORY)
            .expect("end of central directory");
        let cd_size = u32::from_le_bytes(data[eocd + 12..eocd + 16].try_into().unwrap());
        let cd_size = cd_size + field.len() as u32;
        data[eocd + 12..eocd + 16].copy_from_slice(&cd_size.to_le_bytes());
    }
}
