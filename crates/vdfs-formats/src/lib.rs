//! Parser and builder for VDF package archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! VDF ("PSVDSC_V2.00") is the package container shipped with the Gothic
//! games. A package is a 296-byte header, a catalog of fixed 80-byte entries
//! describing a directory tree, and the raw file bodies. Bodies are stored
//! uncompressed, so extracting a file is a bounded slice of the package.
//!
//! # Supported Operations
//!
//! - **Parsing**: header validation, catalog walk, flat file listing
//! - **Building**: breadth-first catalog layout from `(path, bytes)` pairs
//! - **Timestamps**: packed DOS date/time decoding and encoding
//!
//! # Example
//!
//! ```rust
//! use vdfs_formats::vdf::{VdfArchive, VdfBuilder, VdfVariant};
//!
//! let mut builder = VdfBuilder::new(VdfVariant::Gothic2);
//! builder.add_file("_WORK/DATA/MESHES/STONE.3DS", b"mesh".to_vec())?;
//! let package = builder.build()?;
//!
//! let archive = VdfArchive::parse(&package)?;
//! let stone = archive.find("stone.3ds").expect("file is cataloged");
//! assert_eq!(archive.file_data(&package, stone)?, b"mesh");
//! # Ok::<(), vdfs_formats::vdf::VdfError>(())
//! ```

#![warn(missing_docs)]

/// VDF package format: header, catalog, timestamps, parser and builder
pub mod vdf;
