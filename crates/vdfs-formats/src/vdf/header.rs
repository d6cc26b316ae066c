//! VDF header structures and parsing

use crate::vdf::error::{VdfError, VdfResult};
use crate::vdf::timestamp::DosDateTime;
use binrw::{BinRead, BinWrite};

/// Size of the free-form comment field
pub const COMMENT_SIZE: usize = 256;

/// Size of the signature field
pub const SIGNATURE_SIZE: usize = 16;

/// Total header size; the catalog of well-formed packages starts here
pub const HEADER_SIZE: usize = 296;

/// Catalog entry size stored in every header
pub const ENTRY_SIZE: u32 = 80;

/// Signature written by the Gothic 1 tools
pub const SIGNATURE_GOTHIC1: [u8; SIGNATURE_SIZE] = *b"PSVDSC_V2.00\r\n\r\n";

/// Signature written by the Gothic 2 tools
pub const SIGNATURE_GOTHIC2: [u8; SIGNATURE_SIZE] = *b"PSVDSC_V2.00\n\r\n\r";

/// Comment terminator and padding byte
const COMMENT_PAD: u8 = 0x1A;

/// Package flavour, identified by the line endings in the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VdfVariant {
    /// Gothic 1 packages
    Gothic1,
    /// Gothic 2 and Night of the Raven packages
    Gothic2,
}

impl VdfVariant {
    /// Signature bytes for this variant
    pub const fn signature(self) -> [u8; SIGNATURE_SIZE] {
        match self {
            Self::Gothic1 => SIGNATURE_GOTHIC1,
            Self::Gothic2 => SIGNATURE_GOTHIC2,
        }
    }

    /// Identify the variant from raw signature bytes
    pub fn from_signature(signature: &[u8; SIGNATURE_SIZE]) -> Option<Self> {
        if *signature == SIGNATURE_GOTHIC1 {
            Some(Self::Gothic1)
        } else if *signature == SIGNATURE_GOTHIC2 {
            Some(Self::Gothic2)
        } else {
            None
        }
    }
}

/// VDF file header (296 bytes, little-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct VdfHeader {
    /// Free-form comment, terminated and padded with 0x1A
    pub comment: [u8; COMMENT_SIZE],

    /// "PSVDSC_V2.00" followed by variant-specific line endings
    pub signature: [u8; SIGNATURE_SIZE],

    /// Number of catalog entries (files and directories)
    pub entry_count: u32,

    /// Number of file entries
    pub file_count: u32,

    /// Packed DOS creation timestamp
    pub timestamp: u32,

    /// Total size of all file bodies
    pub data_size: u32,

    /// Absolute offset of the catalog
    pub catalog_offset: u32,

    /// Catalog entry size (always 80)
    pub entry_size: u32,
}

impl VdfHeader {
    /// Create an empty header for the given variant
    pub fn new(variant: VdfVariant) -> Self {
        Self {
            comment: [COMMENT_PAD; COMMENT_SIZE],
            signature: variant.signature(),
            entry_count: 0,
            file_count: 0,
            timestamp: DosDateTime::EPOCH.to_packed(),
            data_size: 0,
            catalog_offset: HEADER_SIZE as u32,
            entry_size: ENTRY_SIZE,
        }
    }

    /// Validate header values
    pub fn validate(&self) -> VdfResult<()> {
        self.variant()?;

        if self.entry_size != ENTRY_SIZE {
            return Err(VdfError::InvalidEntrySize(self.entry_size));
        }

        if self.file_count > self.entry_count {
            return Err(VdfError::InconsistentCounts {
                entry_count: self.entry_count,
                file_count: self.file_count,
            });
        }

        if (self.catalog_offset as usize) < HEADER_SIZE {
            return Err(VdfError::InvalidCatalogOffset(self.catalog_offset));
        }

        Ok(())
    }

    /// Package variant encoded in the signature
    pub fn variant(&self) -> VdfResult<VdfVariant> {
        VdfVariant::from_signature(&self.signature)
            .ok_or(VdfError::InvalidSignature(self.signature))
    }

    /// Comment text up to the first terminator
    pub fn comment_text(&self) -> String {
        let end = self
            .comment
            .iter()
            .position(|&b| b == COMMENT_PAD || b == 0)
            .unwrap_or(COMMENT_SIZE);
        self.comment[..end].iter().map(|&b| char::from(b)).collect()
    }

    /// Replace the comment, truncating to the field size
    pub fn set_comment(&mut self, text: &str) {
        self.comment = [COMMENT_PAD; COMMENT_SIZE];
        for (slot, byte) in self.comment.iter_mut().zip(text.bytes()) {
            *slot = byte;
        }
    }

    /// Decoded creation timestamp
    pub const fn datetime(&self) -> DosDateTime {
        DosDateTime::from_packed(self.timestamp)
    }

    /// Byte offset just past the catalog
    pub fn catalog_end(&self) -> u64 {
        u64::from(self.catalog_offset) + u64::from(self.entry_count) * u64::from(ENTRY_SIZE)
    }
}
