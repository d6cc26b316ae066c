//! VDF package format implementation
//!
//! # Layout
//!
//! ```text
//! +----------------------+ 0
//! | header (296 bytes)   |  comment, signature, counts, timestamp
//! +----------------------+ catalog_offset (296)
//! | catalog entries      |  entry_count x 80 bytes, breadth-first tree
//! +----------------------+
//! | file bodies          |  uncompressed, addressed by absolute offset
//! +----------------------+
//! ```
//!
//! A directory entry stores the index of its first child in `offset`; a run
//! of siblings ends with the entry carrying [`ENTRY_FLAG_LAST`]. The root
//! directory's children start at index 0.

mod archive;
mod builder;
mod entry;
mod error;
mod header;
mod timestamp;

pub use archive::{VdfArchive, VdfFile};
pub use builder::VdfBuilder;
pub use entry::{ATTRIBUTE_ARCHIVE, CatalogEntry, ENTRY_FLAG_DIRECTORY, ENTRY_FLAG_LAST, NAME_SIZE};
pub use error::{VdfError, VdfResult};
pub use header::{
    COMMENT_SIZE, ENTRY_SIZE, HEADER_SIZE, SIGNATURE_GOTHIC1, SIGNATURE_GOTHIC2, SIGNATURE_SIZE,
    VdfHeader, VdfVariant,
};
pub use timestamp::DosDateTime;
