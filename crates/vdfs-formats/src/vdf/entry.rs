//! VDF catalog entries

use crate::vdf::error::{VdfError, VdfResult};
use binrw::{BinRead, BinWrite};

/// Entry is a directory; `offset` holds the index of its first child
pub const ENTRY_FLAG_DIRECTORY: u32 = 0x8000_0000;

/// Entry is the last one of its directory
pub const ENTRY_FLAG_LAST: u32 = 0x4000_0000;

/// Size of the name field
pub const NAME_SIZE: usize = 64;

/// Windows "archive" attribute set on file entries by the packers
pub const ATTRIBUTE_ARCHIVE: u32 = 0x20;

/// One 80-byte catalog entry
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct CatalogEntry {
    /// Upper-case name, padded with spaces
    pub name: [u8; NAME_SIZE],

    /// File: absolute data offset. Directory: index of the first child.
    pub offset: u32,

    /// File size in bytes (zero for directories)
    pub size: u32,

    /// `ENTRY_FLAG_*` bits
    pub flags: u32,

    /// Windows file attributes
    pub attributes: u32,
}

impl CatalogEntry {
    /// Create a file entry
    pub fn file(name: &str, offset: u32, size: u32) -> VdfResult<Self> {
        Ok(Self {
            name: encode_name(name)?,
            offset,
            size,
            flags: 0,
            attributes: ATTRIBUTE_ARCHIVE,
        })
    }

    /// Create a directory entry whose children start at `first_child`
    pub fn directory(name: &str, first_child: u32) -> VdfResult<Self> {
        Ok(Self {
            name: encode_name(name)?,
            offset: first_child,
            size: 0,
            flags: ENTRY_FLAG_DIRECTORY,
            attributes: 0,
        })
    }

    /// Decoded name without padding
    pub fn name(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_SIZE);
        let trimmed = self.name[..end]
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |last| last + 1);
        // Names are Latin-1, so every byte maps to the code point of equal value
        self.name[..trimmed].iter().map(|&b| char::from(b)).collect()
    }

    /// Whether this entry is a directory
    pub const fn is_directory(&self) -> bool {
        self.flags & ENTRY_FLAG_DIRECTORY != 0
    }

    /// Whether this entry terminates its directory
    pub const fn is_last(&self) -> bool {
        self.flags & ENTRY_FLAG_LAST != 0
    }

    /// Mark this entry as the last of its directory
    pub const fn mark_last(&mut self) {
        self.flags |= ENTRY_FLAG_LAST;
    }
}

/// Encode a name into the space-padded, upper-case name field.
fn encode_name(name: &str) -> VdfResult<[u8; NAME_SIZE]> {
    if name.is_empty() {
        return Err(VdfError::InvalidName(name.to_string()));
    }

    let mut encoded = Vec::with_capacity(name.len());
    for c in name.chars() {
        let code = u32::from(c);
        if code > 0xFF || c.is_control() || c == '/' || c == '\\' {
            return Err(VdfError::InvalidName(name.to_string()));
        }
        encoded.push((code as u8).to_ascii_uppercase());
    }

    if encoded.len() > NAME_SIZE {
        return Err(VdfError::NameTooLong {
            name: name.to_string(),
            len: encoded.len(),
        });
    }

    let mut field = [b' '; NAME_SIZE];
    field[..encoded.len()].copy_from_slice(&encoded);
    Ok(field)
}
