//! ZIP container reader for OOXML packages.
//!
//! The central directory is located through the end-of-central-directory
//! (EOCD) record, which is found by scanning backwards from the end of the
//! buffer. Its position is not fixed because the archive may carry a comment
//! of up to 64 KiB after it.
//!
//! Entries are indexed by case-folded name and decompressed lazily, on
//! [`Package::read`]. Only "stored" and "deflate" are supported, which covers
//! every Office producer we know of.
//!
//! ```text
//! [local header 1][data 1] ... [central directory] [zip64 eocd?] [eocd][comment]
//!                              ^-- cd_offset                     ^-- scanned for
//! ```

use flate2::read::DeflateDecoder;
use std::collections::HashMap;
use std::io::{Cursor, Read};

use crate::error::{Result, XlchartError};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const EOCD_LEN: usize = 22;
const MAX_COMMENT_LEN: usize = 0xFFFF;
const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;
const ZIP64_LOCATOR_LEN: usize = 20;
const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const CENTRAL_HEADER_LEN: usize = 46;
const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const LOCAL_HEADER_LEN: usize = 30;
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Upper bound on the buffer we pre-allocate for one inflated entry. The
/// declared size is untrusted input.
const MAX_PREALLOC: usize = 64 * 1024 * 1024;

/// Compression method of a package entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Other(u16),
}

impl CompressionMethod {
    fn from_id(id: u16) -> Self {
        match id {
            0 => Self::Stored,
            8 => Self::Deflate,
            other => Self::Other(other),
        }
    }

    /// The raw method id as stored in the archive.
    pub fn id(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflate => 8,
            Self::Other(id) => id,
        }
    }
}

/// Directory information about one entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Name exactly as written by the producer.
    pub name: String,
    pub method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    local_header_offset: u64,
}

/// Decompression strategies, tried in order until one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateStrategy {
    /// Raw deflate over the entry's data region.
    RawDeflate,
    /// Re-open the archive with the `zip` crate and read the entry by name.
    ZipLibrary,
}

/// Capability probe for deflate decoding.
///
/// The native decoder handles well-formed entries directly from the slice;
/// the library reader copes with producers whose local headers disagree with
/// the central directory.
pub fn inflate_strategies() -> &'static [InflateStrategy] {
    &[InflateStrategy::RawDeflate, InflateStrategy::ZipLibrary]
}

/// An opened, immutable spreadsheet package.
#[derive(Debug)]
pub struct Package {
    data: Vec<u8>,
    /// Case-folded name -> entry.
    entries: HashMap<String, EntryInfo>,
    /// Case-folded names in central-directory order.
    order: Vec<String>,
}

impl Package {
    /// Open a package from its raw bytes.
    ///
    /// Reads the central directory only; entry data is not touched until it
    /// is requested.
    ///
    /// # Errors
    /// Returns [`XlchartError::CorruptContainer`] when the EOCD record or the
    /// central directory cannot be read.
    pub fn open(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let eocd_pos = find_eocd(&data)
            .ok_or_else(|| corrupt("end of central directory record not found"))?;
        let directory = read_directory_location(&data, eocd_pos)?;

        let mut entries = HashMap::with_capacity(directory.entry_count);
        let mut order = Vec::with_capacity(directory.entry_count);
        let mut pos = usize::try_from(directory.offset)
            .map_err(|_| corrupt("central directory offset out of range"))?;

        for _ in 0..directory.entry_count {
            let (entry, next) = read_central_header(&data, pos)?;
            pos = next;
            if entry.name.ends_with('/') {
                continue;
            }
            let key = normalize_entry_name(&entry.name);
            if entries.contains_key(&key) {
                tracing::debug!("duplicate entry {} ignored", entry.name);
                continue;
            }
            order.push(key.clone());
            entries.insert(key, entry);
        }

        Ok(Self {
            data,
            entries,
            order,
        })
    }

    /// Number of file entries (directories excluded).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the package has no file entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive existence check.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize_entry_name(path))
    }

    /// Case-folded entry names in central-directory order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Directory information for an entry.
    pub fn entry_info(&self, path: &str) -> Option<&EntryInfo> {
        self.entries.get(&normalize_entry_name(path))
    }

    /// Read and decompress an entry.
    ///
    /// # Errors
    /// - [`XlchartError::MissingEntry`] if no entry matches `path`
    /// - [`XlchartError::UnsupportedEntryEncoding`] for methods other than
    ///   stored/deflate
    /// - [`XlchartError::CorruptContainer`] if the entry's data is unreadable
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let key = normalize_entry_name(path);
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| XlchartError::MissingEntry(key.clone()))?;

        match entry.method {
            CompressionMethod::Stored => Ok(self.data_region(entry)?.to_vec()),
            CompressionMethod::Deflate => self.inflate(entry),
            CompressionMethod::Other(method) => Err(XlchartError::UnsupportedEntryEncoding {
                path: entry.name.clone(),
                method,
            }),
        }
    }

    /// Read an entry as UTF-8 text, dropping a leading byte-order mark.
    pub fn read_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| XlchartError::Parse(format!("{path} is not UTF-8: {e}")))?;
        Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }

    /// Read an entry, treating absence and decoding failures as "not there".
    ///
    /// Used by the topology walker where every missing link is skippable.
    pub fn read_optional(&self, path: &str) -> Option<Vec<u8>> {
        match self.read(path) {
            Ok(bytes) => Some(bytes),
            Err(XlchartError::MissingEntry(_)) => {
                tracing::debug!("optional part {path} not present");
                None
            }
            Err(e) => {
                tracing::warn!("skipping unreadable part {path}: {e}");
                None
            }
        }
    }

    fn inflate(&self, entry: &EntryInfo) -> Result<Vec<u8>> {
        let mut last_error = None;
        for strategy in inflate_strategies() {
            let attempt = match strategy {
                InflateStrategy::RawDeflate => self.inflate_raw(entry),
                InflateStrategy::ZipLibrary => self.inflate_with_library(entry),
            };
            match attempt {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::debug!("{strategy:?} failed for {}: {e}", entry.name);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| corrupt("no inflate strategy available")))
    }

    fn inflate_raw(&self, entry: &EntryInfo) -> Result<Vec<u8>> {
        let raw = self.data_region(entry)?;
        let expected = usize::try_from(entry.uncompressed_size).unwrap_or(MAX_PREALLOC);
        let mut out = Vec::with_capacity(expected.min(MAX_PREALLOC));
        DeflateDecoder::new(raw).read_to_end(&mut out)?;
        if out.len() as u64 != entry.uncompressed_size {
            return Err(corrupt(&format!(
                "{}: inflated {} bytes, directory says {}",
                entry.name,
                out.len(),
                entry.uncompressed_size
            )));
        }
        Ok(out)
    }

    fn inflate_with_library(&self, entry: &EntryInfo) -> Result<Vec<u8>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        let mut file = archive.by_name(&entry.name)?;
        let mut out = Vec::new();
        file.read_to_end(&mut out)?;
        Ok(out)
    }

    /// The compressed bytes of an entry, located through its local header.
    fn data_region(&self, entry: &EntryInfo) -> Result<&[u8]> {
        let header = usize::try_from(entry.local_header_offset)
            .map_err(|_| corrupt("local header offset out of range"))?;
        if read_u32(&self.data, header) != Some(LOCAL_HEADER_SIGNATURE) {
            return Err(corrupt(&format!("{}: bad local header", entry.name)));
        }
        let name_len = read_u16(&self.data, header + 26).ok_or_else(|| corrupt("truncated"))?;
        let extra_len = read_u16(&self.data, header + 28).ok_or_else(|| corrupt("truncated"))?;
        let start = header + LOCAL_HEADER_LEN + usize::from(name_len) + usize::from(extra_len);
        let len = usize::try_from(entry.compressed_size)
            .map_err(|_| corrupt("entry size out of range"))?;
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| corrupt(&format!("{}: data outside the container", entry.name)))
    }
}

/// Case-fold a part name and drop a leading slash.
pub fn normalize_entry_name(path: &str) -> String {
    path.trim_start_matches('/').replace('\\', "/").to_lowercase()
}

fn corrupt(msg: &str) -> XlchartError {
    XlchartError::CorruptContainer(msg.to_string())
}

struct DirectoryLocation {
    entry_count: usize,
    offset: u64,
}

/// Scan backwards for the EOCD signature.
///
/// The candidate must also account for the rest of the buffer through its
/// comment length, which rules out signature bytes inside the comment.
fn find_eocd(data: &[u8]) -> Option<usize> {
    let last = data.len().checked_sub(EOCD_LEN)?;
    let floor = last.saturating_sub(MAX_COMMENT_LEN);
    (floor..=last).rev().find(|&pos| {
        read_u32(data, pos) == Some(EOCD_SIGNATURE)
            && read_u16(data, pos + 20)
                .is_some_and(|comment| pos + EOCD_LEN + usize::from(comment) <= data.len())
    })
}

fn read_directory_location(data: &[u8], eocd_pos: usize) -> Result<DirectoryLocation> {
    let truncated = || corrupt("truncated end of central directory record");
    let count = read_u16(data, eocd_pos + 10).ok_or_else(truncated)?;
    let offset = read_u32(data, eocd_pos + 16).ok_or_else(truncated)?;

    if count == u16::MAX || offset == u32::MAX {
        if let Some(location) = read_zip64_location(data, eocd_pos) {
            return Ok(location);
        }
    }

    Ok(DirectoryLocation {
        entry_count: usize::from(count),
        offset: u64::from(offset),
    })
}

fn read_zip64_location(data: &[u8], eocd_pos: usize) -> Option<DirectoryLocation> {
    let locator = eocd_pos.checked_sub(ZIP64_LOCATOR_LEN)?;
    if read_u32(data, locator)? != ZIP64_LOCATOR_SIGNATURE {
        return None;
    }
    let record = usize::try_from(read_u64(data, locator + 8)?).ok()?;
    if read_u32(data, record)? != ZIP64_EOCD_SIGNATURE {
        return None;
    }
    Some(DirectoryLocation {
        entry_count: usize::try_from(read_u64(data, record + 32)?).ok()?,
        offset: read_u64(data, record + 48)?,
    })
}

/// Parse one central-directory file header, returning the entry and the
/// position of the next header.
fn read_central_header(data: &[u8], pos: usize) -> Result<(EntryInfo, usize)> {
    if read_u32(data, pos) != Some(CENTRAL_HEADER_SIGNATURE) {
        return Err(corrupt("bad central directory header"));
    }
    let truncated = || corrupt("truncated central directory header");
    let method = read_u16(data, pos + 10).ok_or_else(truncated)?;
    let mut compressed_size = u64::from(read_u32(data, pos + 20).ok_or_else(truncated)?);
    let mut uncompressed_size = u64::from(read_u32(data, pos + 24).ok_or_else(truncated)?);
    let name_len = usize::from(read_u16(data, pos + 28).ok_or_else(truncated)?);
    let extra_len = usize::from(read_u16(data, pos + 30).ok_or_else(truncated)?);
    let comment_len = usize::from(read_u16(data, pos + 32).ok_or_else(truncated)?);
    let mut local_header_offset = u64::from(read_u32(data, pos + 42).ok_or_else(truncated)?);

    let name_start = pos + CENTRAL_HEADER_LEN;
    let name_bytes = data
        .get(name_start..name_start + name_len)
        .ok_or_else(truncated)?;
    let name = String::from_utf8_lossy(name_bytes).into_owned();

    let extra_start = name_start + name_len;
    let extra = data
        .get(extra_start..extra_start + extra_len)
        .ok_or_else(truncated)?;
    apply_zip64_extra(
        extra,
        &mut uncompressed_size,
        &mut compressed_size,
        &mut local_header_offset,
    );

    let entry = EntryInfo {
        name,
        method: CompressionMethod::from_id(method),
        compressed_size,
        uncompressed_size,
        local_header_offset,
    };
    Ok((entry, extra_start + extra_len + comment_len))
}

/// Replace saturated 32-bit fields with their ZIP64 extra-field values.
///
/// The extra field only carries the fields that overflowed, in the fixed
/// order uncompressed size, compressed size, local header offset.
fn apply_zip64_extra(
    extra: &[u8],
    uncompressed_size: &mut u64,
    compressed_size: &mut u64,
    local_header_offset: &mut u64,
) {
    let mut pos = 0;
    while let (Some(id), Some(size)) = (read_u16(extra, pos), read_u16(extra, pos + 2)) {
        let body = pos + 4;
        if id == ZIP64_EXTRA_ID {
            let mut cursor = body;
            for field in [
                &mut *uncompressed_size,
                &mut *compressed_size,
                &mut *local_header_offset,
            ] {
                if *field == u64::from(u32::MAX) {
                    if let Some(value) = read_u64(extra, cursor) {
                        *field = value;
                        cursor += 8;
                    }
                }
            }
            return;
        }
        pos = body + usize::from(size);
    }
}

fn read_u16(data: &[u8], pos: usize) -> Option<u16> {
    let bytes = data.get(pos..pos.checked_add(2)?)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u64(data: &[u8], pos: usize) -> Option<u64> {
    let bytes = data.get(pos..pos.checked_add(8)?)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(files: &[(&str, &[u8], zip::CompressionMethod)], comment: Option<&str>) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body, method) in files {
            let options = FileOptions::default().compression_method(*method);
            zip.start_file(*name, options).unwrap();
            zip.write_all(body).unwrap();
        }
        if let Some(comment) = comment {
            zip.set_comment(comment);
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_reads_stored_and_deflated_entries() {
        let data = build_zip(
            &[
                ("xl/workbook.xml", b"<workbook/>", zip::CompressionMethod::Stored),
                (
                    "xl/charts/chart1.xml",
                    b"<chartSpace><chart/></chartSpace>",
                    zip::CompressionMethod::Deflated,
                ),
            ],
            None,
        );
        let package = Package::open(data).unwrap();
        assert_eq!(package.len(), 2);
        assert_eq!(package.read("xl/workbook.xml").unwrap(), b"<workbook/>");
        assert_eq!(
            package.read_string("xl/charts/chart1.xml").unwrap(),
            "<chartSpace><chart/></chartSpace>"
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let data = build_zip(
            &[("XL/Charts/Chart1.XML", b"<c/>", zip::CompressionMethod::Deflated)],
            None,
        );
        let package = Package::open(data).unwrap();
        assert!(package.contains("xl/charts/chart1.xml"));
        assert!(package.contains("/XL/CHARTS/chart1.xml"));
        assert_eq!(package.read("xl/charts/chart1.xml").unwrap(), b"<c/>");
        assert_eq!(
            package.entry_info("xl/charts/chart1.xml").unwrap().name,
            "XL/Charts/Chart1.XML"
        );
    }

    #[test]
    fn test_eocd_found_behind_comment() {
        let comment = "x".repeat(4000);
        let data = build_zip(
            &[("a.xml", b"<a/>", zip::CompressionMethod::Stored)],
            Some(&comment),
        );
        let package = Package::open(data).unwrap();
        assert_eq!(package.read("a.xml").unwrap(), b"<a/>");
    }

    #[test]
    fn test_signature_bytes_inside_comment_are_skipped() {
        // The comment starts with a fake EOCD whose comment length ("xx")
        // runs past the end of the buffer.
        let comment = format!("PK\u{5}\u{6}{}", "x".repeat(100));
        let data = build_zip(
            &[("a.xml", b"<a/>", zip::CompressionMethod::Deflated)],
            Some(&comment),
        );
        let eocd = find_eocd(&data).unwrap();
        assert_eq!(eocd + EOCD_LEN + comment.len(), data.len());
        let package = Package::open(data).unwrap();
        assert_eq!(package.read("a.xml").unwrap(), b"<a/>");
    }

    /// Where the ZIP64 markers go in a hand-built archive.
    #[derive(Clone, Copy)]
    struct Zip64 {
        /// Saturate the EOCD count/offset and add a ZIP64 record + locator.
        eocd: bool,
        /// Saturate each entry's sizes and offset and carry them in a
        /// 0x0001 extra field.
        extra: bool,
    }

    /// Stored-only archive written byte by byte, since `ZipWriter` only
    /// emits ZIP64 structures for entries above 4 GiB.
    fn build_zip64(files: &[(&str, &[u8])], layout: Zip64) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();
        for (name, body) in files {
            offsets.push(out.len() as u64);
            out.extend_from_slice(&LOCAL_HEADER_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
            out.extend_from_slice(&0u32.to_le_bytes()); // crc
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(body);
        }

        let cd_offset = out.len() as u64;
        for ((name, body), offset) in files.iter().zip(&offsets) {
            let size = body.len() as u64;
            let (size32, offset32, extra) = if layout.extra {
                let mut extra = Vec::new();
                extra.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
                extra.extend_from_slice(&24u16.to_le_bytes());
                extra.extend_from_slice(&size.to_le_bytes());
                extra.extend_from_slice(&size.to_le_bytes());
                extra.extend_from_slice(&offset.to_le_bytes());
                (u32::MAX, u32::MAX, extra)
            } else {
                (size as u32, *offset as u32, Vec::new())
            };
            out.extend_from_slice(&CENTRAL_HEADER_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&[45, 0, 45, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
            out.extend_from_slice(&0u32.to_le_bytes()); // crc
            out.extend_from_slice(&size32.to_le_bytes());
            out.extend_from_slice(&size32.to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            out.extend_from_slice(&[0; 6]); // comment len, disk, internal attributes
            out.extend_from_slice(&0u32.to_le_bytes()); // external attributes
            out.extend_from_slice(&offset32.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&extra);
        }
        let cd_size = out.len() as u64 - cd_offset;
        let count = files.len() as u64;

        if layout.eocd {
            let record = out.len() as u64;
            out.extend_from_slice(&ZIP64_EOCD_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&44u64.to_le_bytes());
            out.extend_from_slice(&[45, 0, 45, 0]);
            out.extend_from_slice(&[0; 8]); // disk numbers
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&cd_size.to_le_bytes());
            out.extend_from_slice(&cd_offset.to_le_bytes());

            out.extend_from_slice(&ZIP64_LOCATOR_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&record.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());
        }

        let (count16, offset32) = if layout.eocd {
            (u16::MAX, u32::MAX)
        } else {
            (count as u16, cd_offset as u32)
        };
        out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&[0; 4]); // disk numbers
        out.extend_from_slice(&count16.to_le_bytes());
        out.extend_from_slice(&count16.to_le_bytes());
        out.extend_from_slice(&(cd_size as u32).to_le_bytes());
        out.extend_from_slice(&offset32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    const ZIP64_FILES: &[(&str, &[u8])] = &[
        ("xl/workbook.xml", b"<workbook/>"),
        ("xl/charts/chart1.xml", b"<chartSpace/>"),
    ];

    #[test_case(Zip64 { eocd: false, extra: false }; "plain")]
    #[test_case(Zip64 { eocd: true, extra: false }; "zip64 end record")]
    #[test_case(Zip64 { eocd: false, extra: true }; "zip64 extra field")]
    #[test_case(Zip64 { eocd: true, extra: true }; "both")]
    fn test_zip64_structures(layout: Zip64) {
        let package = Package::open(build_zip64(ZIP64_FILES, layout)).unwrap();
        assert_eq!(package.len(), 2);
        assert_eq!(package.read("xl/workbook.xml").unwrap(), b"<workbook/>");
        assert_eq!(package.read("xl/charts/chart1.xml").unwrap(), b"<chartSpace/>");

        let info = package.entry_info("xl/charts/chart1.xml").unwrap();
        assert_eq!(info.compressed_size, 13);
        assert_eq!(info.uncompressed_size, 13);
        assert_eq!(info.local_header_offset, 30 + 15 + 11);
    }

    #[test]
    fn test_zip64_extra_only_replaces_saturated_fields() {
        // Only the offset overflowed, so the extra field holds one value.
        let mut extra = Vec::new();
        extra.extend_from_slice(&0x5455u16.to_le_bytes()); // unrelated timestamp field
        extra.extend_from_slice(&1u16.to_le_bytes());
        extra.push(0);
        extra.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
        extra.extend_from_slice(&8u16.to_le_bytes());
        extra.extend_from_slice(&0x1_0000_0000u64.to_le_bytes());

        let (mut uncompressed, mut compressed, mut offset) = (10, 7, u64::from(u32::MAX));
        apply_zip64_extra(&extra, &mut uncompressed, &mut compressed, &mut offset);
        assert_eq!((uncompressed, compressed, offset), (10, 7, 0x1_0000_0000));
    }

    #[test]
    fn test_missing_zip64_locator_keeps_eocd_values() {
        let mut data = build_zip64(ZIP64_FILES, Zip64 { eocd: true, extra: false });
        // Break the locator signature: the saturated EOCD values are all
        // that is left, and they point nowhere.
        let eocd = find_eocd(&data).unwrap();
        data[eocd - ZIP64_LOCATOR_LEN] = 0;
        assert!(matches!(
            Package::open(data).unwrap_err(),
            XlchartError::CorruptContainer(_)
        ));
    }

    #[test]
    fn test_garbage_is_corrupt_container() {
        let err = Package::open(vec![0u8; 100]).unwrap_err();
        assert!(matches!(err, XlchartError::CorruptContainer(_)));

        let err = Package::open(Vec::new()).unwrap_err();
        assert!(matches!(err, XlchartError::CorruptContainer(_)));
    }

    #[test]
    fn test_truncated_directory_is_corrupt() {
        let data = build_zip(&[("a.xml", b"<a/>", zip::CompressionMethod::Stored)], None);
        // Keep the EOCD but drop everything before it.
        let eocd = find_eocd(&data).unwrap();
        let tail = data[eocd..].to_vec();
        assert!(matches!(
            Package::open(tail).unwrap_err(),
            XlchartError::CorruptContainer(_)
        ));
    }

    #[test]
    fn test_unsupported_method_fails_only_that_entry() {
        let mut data = build_zip(
            &[
                ("a.xml", b"<a/>", zip::CompressionMethod::Stored),
                ("b.xml", b"<b/>", zip::CompressionMethod::Stored),
            ],
            None,
        );
        // Rewrite the method of the first central-directory entry to bzip2 (12).
        let eocd = find_eocd(&data).unwrap();
        let cd_offset = read_u32(&data, eocd + 16).unwrap() as usize;
        data[cd_offset + 10..cd_offset + 12].copy_from_slice(&12u16.to_le_bytes());

        let package = Package::open(data).unwrap();
        match package.read("a.xml") {
            Err(XlchartError::UnsupportedEntryEncoding { method, .. }) => assert_eq!(method, 12),
            other => panic!("expected unsupported encoding, got {other:?}"),
        }
        assert_eq!(package.read("b.xml").unwrap(), b"<b/>");
    }

    #[test]
    fn test_missing_entry() {
        let data = build_zip(&[("a.xml", b"<a/>", zip::CompressionMethod::Stored)], None);
        let package = Package::open(data).unwrap();
        assert!(matches!(
            package.read("nope.xml"),
            Err(XlchartError::MissingEntry(_))
        ));
        assert!(package.read_optional("nope.xml").is_none());
    }

    #[test]
    fn test_entry_names_keep_directory_order() {
        let data = build_zip(
            &[
                ("b.xml", b"", zip::CompressionMethod::Stored),
                ("a.xml", b"", zip::CompressionMethod::Stored),
            ],
            None,
        );
        let package = Package::open(data).unwrap();
        let names: Vec<&str> = package.entry_names().collect();
        assert_eq!(names, vec!["b.xml", "a.xml"]);
    }

    #[test]
    fn test_strategies_are_ordered() {
        assert_eq!(
            inflate_strategies(),
            &[InflateStrategy::RawDeflate, InflateStrategy::ZipLibrary]
        );
    }

    #[test]
    fn test_read_string_strips_bom() {
        let data = build_zip(
            &[("a.xml", "\u{feff}<a/>".as_bytes(), zip::CompressionMethod::Deflated)],
            None,
        );
        let package = Package::open(data).unwrap();
        assert_eq!(package.read_string("a.xml").unwrap(), "<a/>");
    }
}
