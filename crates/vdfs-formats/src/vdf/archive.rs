//! VDF package parsing and catalog traversal

use crate::vdf::entry::CatalogEntry;
use crate::vdf::error::{VdfError, VdfResult};
use crate::vdf::header::{HEADER_SIZE, VdfHeader, VdfVariant};
use crate::vdf::timestamp::DosDateTime;
use binrw::BinRead;
use std::collections::VecDeque;
use std::io::{Cursor, Seek, SeekFrom};

/// A file reachable from the catalog root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdfFile {
    /// Entry name as stored (upper case, no directory)
    pub name: String,
    /// Slash-joined path from the catalog root, including `name`
    pub path: String,
    /// Absolute offset of the body within the package
    pub offset: u32,
    /// Body size in bytes
    pub size: u32,
    /// Windows file attributes
    pub attributes: u32,
}

impl VdfFile {
    /// Byte range of the body within the package
    pub const fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.size as usize
    }
}

/// Parsed VDF package catalog.
///
/// Holds only metadata; file bodies are sliced out of the package bytes on
/// demand with [`file_data`](Self::file_data).
#[derive(Debug, Clone)]
pub struct VdfArchive {
    /// Package header
    pub header: VdfHeader,
    /// Raw catalog in on-disk order
    pub entries: Vec<CatalogEntry>,
    files: Vec<VdfFile>,
}

impl VdfArchive {
    /// Parse the header and catalog of a complete package.
    ///
    /// Every file's body range is checked against `data.len()`, so later
    /// calls to [`file_data`](Self::file_data) with the same bytes cannot fail.
    pub fn parse(data: &[u8]) -> VdfResult<Self> {
        let actual = data.len() as u64;
        if data.len() < HEADER_SIZE {
            return Err(VdfError::Truncated {
                expected: HEADER_SIZE as u64,
                actual,
            });
        }

        let mut cursor = Cursor::new(data);
        let header = VdfHeader::read_le(&mut cursor)?;
        header.validate()?;

        let catalog_end = header.catalog_end();
        if catalog_end > actual {
            return Err(VdfError::Truncated {
                expected: catalog_end,
                actual,
            });
        }

        cursor.seek(SeekFrom::Start(u64::from(header.catalog_offset)))?;
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            entries.push(CatalogEntry::read_le(&mut cursor)?);
        }

        let files = walk_catalog(&entries, actual)?;

        Ok(Self {
            header,
            entries,
            files,
        })
    }

    /// Package variant
    pub fn variant(&self) -> VdfVariant {
        // validated in parse()
        VdfVariant::from_signature(&self.header.signature).unwrap_or(VdfVariant::Gothic2)
    }

    /// Creation timestamp from the header
    pub const fn timestamp(&self) -> DosDateTime {
        self.header.datetime()
    }

    /// All files in catalog traversal order
    pub fn files(&self) -> &[VdfFile] {
        &self.files
    }

    /// Number of directory entries in the catalog
    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory()).count()
    }

    /// Find a file by name or full path, ignoring ASCII case.
    ///
    /// Bare names match the first file with that name in traversal order.
    pub fn find(&self, name: &str) -> Option<&VdfFile> {
        let wanted = name.replace('\\', "/");
        let wanted = wanted.trim_matches('/');
        if wanted.contains('/') {
            self.files
                .iter()
                .find(|f| f.path.eq_ignore_ascii_case(wanted))
        } else {
            self.files
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(wanted))
        }
    }

    /// Slice a file's body out of the package bytes
    pub fn file_data<'a>(&self, data: &'a [u8], file: &VdfFile) -> VdfResult<&'a [u8]> {
        data.get(file.range())
            .ok_or_else(|| VdfError::DataOutOfBounds {
                name: file.path.clone(),
                offset: file.offset,
                size: file.size,
                len: data.len() as u64,
            })
    }
}

/// Walk the directory tree from the root and collect every file.
///
/// Children of a directory always follow the directory entry itself, which
/// rules out cycles; the visit counter additionally rejects trees that share
/// child ranges.
fn walk_catalog(entries: &[CatalogEntry], data_len: u64) -> VdfResult<Vec<VdfFile>> {
    let mut files = Vec::new();
    if entries.is_empty() {
        return Ok(files);
    }

    let mut visited = 0usize;
    let mut pending = VecDeque::from([(0usize, String::new())]);

    // Breadth-first, so files come out in catalog order
    while let Some((first, prefix)) = pending.pop_front() {
        let mut index = first;
        loop {
            let Some(entry) = entries.get(index) else {
                return Err(VdfError::InvalidCatalog(format!(
                    "entry index {index} out of range ({} entries)",
                    entries.len()
                )));
            };

            visited += 1;
            if visited > entries.len() {
                return Err(VdfError::InvalidCatalog(
                    "directory tree references entries more than once".to_string(),
                ));
            }

            let name = entry.name();
            if entry.is_directory() {
                let child = entry.offset as usize;
                if child <= index {
                    return Err(VdfError::InvalidCatalog(format!(
                        "directory {name} points backwards to entry {child}"
                    )));
                }
                pending.push_back((child, format!("{prefix}{name}/")));
            } else {
                let end = u64::from(entry.offset) + u64::from(entry.size);
                if end > data_len {
                    return Err(VdfError::DataOutOfBounds {
                        name,
                        offset: entry.offset,
                        size: entry.size,
                        len: data_len,
                    });
                }
                files.push(VdfFile {
                    path: format!("{prefix}{name}"),
                    name,
                    offset: entry.offset,
                    size: entry.size,
                    attributes: entry.attributes,
                });
            }

            // Some packers omit the last flag on the final entry
            if entry.is_last() || index + 1 >= entries.len() {
                break;
            }
            index += 1;
        }
    }

    Ok(files)
}
