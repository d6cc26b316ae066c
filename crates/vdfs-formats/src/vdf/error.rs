//! VDF error types

use thiserror::Error;

/// VDF-specific error type
#[derive(Debug, Error)]
pub enum VdfError {
    /// Signature is neither the Gothic 1 nor the Gothic 2 variant
    #[error("invalid VDF signature: {0:02x?}")]
    InvalidSignature([u8; 16]),

    /// Catalog entry size other than 80 bytes
    #[error("unsupported catalog entry size: {0}, expected 80")]
    InvalidEntrySize(u32),

    /// Header claims more files than catalog entries
    #[error("file count {file_count} exceeds entry count {entry_count}")]
    InconsistentCounts {
        /// Number of catalog entries
        entry_count: u32,
        /// Number of file entries
        file_count: u32,
    },

    /// Catalog starts inside the header
    #[error("invalid catalog offset: {0}")]
    InvalidCatalogOffset(u32),

    /// Package is shorter than its header or catalog requires
    #[error("truncated package: need {expected} bytes, have {actual}")]
    Truncated {
        /// Bytes required
        expected: u64,
        /// Bytes available
        actual: u64,
    },

    /// Directory tree in the catalog is malformed
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// File body lies outside the package
    #[error("data for {name} out of bounds: {offset} + {size} > {len}")]
    DataOutOfBounds {
        /// Entry name
        name: String,
        /// Data offset
        offset: u32,
        /// Data size
        size: u32,
        /// Package length
        len: u64,
    },

    /// Entry name does not fit the 64-byte name field
    #[error("entry name too long ({len} bytes, max 64): {name}")]
    NameTooLong {
        /// Offending name
        name: String,
        /// Encoded length
        len: usize,
    },

    /// Entry name is empty or not representable in the catalog encoding
    #[error("invalid entry name: {0:?}")]
    InvalidName(String),

    /// Same path added twice, or a path used both as file and directory
    #[error("duplicate path in package: {0}")]
    DuplicatePath(String),

    /// Offsets no longer fit the 32-bit catalog fields
    #[error("package exceeds the 4 GiB format limit")]
    PackageTooLarge,

    /// Binary parsing error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for VDF operations
pub type VdfResult<T> = Result<T, VdfError>;
