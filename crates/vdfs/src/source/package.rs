//! VDF package backend

use super::{ArchiveSource, Locator, SourceFile, SourceKind};
use crate::error::SourceError;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use vdfs_formats::vdf::{DosDateTime, HEADER_SIZE, VdfArchive, VdfError, VdfHeader, VdfVariant};

/// A VDF package opened through a read-only memory map.
///
/// The catalog is parsed once at open time; afterwards the package only
/// keeps the header and the map, and extraction is a bounds-checked copy.
#[derive(Debug)]
pub struct VdfPackage {
    name: String,
    path: PathBuf,
    header: VdfHeader,
    mmap: Mmap,
}

impl VdfPackage {
    /// Open and parse the package at `path`, returning it with its files.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or mapped, or if it is not
    /// a well-formed VDF package
    pub fn open(path: &Path, name: impl Into<String>) -> Result<(Self, Vec<SourceFile>), SourceError> {
        let file = File::open(path).map_err(|e| SourceError::io(path, e))?;
        let len = file.metadata().map_err(|e| SourceError::io(path, e))?.len();

        // Zero-length maps fail on some platforms; report a short file as such
        if len < HEADER_SIZE as u64 {
            return Err(SourceError::Format {
                path: path.to_path_buf(),
                source: VdfError::Truncated {
                    expected: HEADER_SIZE as u64,
                    actual: len,
                },
            });
        }

        #[allow(unsafe_code)]
        let mmap = unsafe { MmapOptions::new().map(&file).map_err(|e| SourceError::io(path, e))? };

        let archive = VdfArchive::parse(&mmap).map_err(|source| SourceError::Format {
            path: path.to_path_buf(),
            source,
        })?;

        let timestamp = archive.timestamp().to_unix_seconds();
        let files = archive
            .files()
            .iter()
            .map(|file| SourceFile {
                name: file.path.clone(),
                locator: Locator::Packed {
                    offset: u64::from(file.offset),
                    size: u64::from(file.size),
                },
                size: u64::from(file.size),
                timestamp,
            })
            .collect::<Vec<_>>();

        let package = Self {
            name: name.into(),
            path: path.to_path_buf(),
            header: archive.header,
            mmap,
        };
        debug!(
            "Opened package {} ({} files, {} bytes)",
            package.name,
            files.len(),
            package.mmap.len()
        );
        Ok((package, files))
    }

    /// Parsed package header
    pub const fn header(&self) -> &VdfHeader {
        &self.header
    }

    /// Game generation the package was written for
    pub fn variant(&self) -> Option<VdfVariant> {
        self.header.variant().ok()
    }

    /// Package creation time
    pub const fn timestamp(&self) -> DosDateTime {
        self.header.datetime()
    }

    /// Size of the package file in bytes
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Whether the mapped file is empty (never true for a parsed package)
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}

impl ArchiveSource for VdfPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Package
    }

    fn extract(&self, locator: &Locator) -> Result<Vec<u8>, SourceError> {
        let Locator::Packed { offset, size } = locator else {
            return Err(SourceError::LocatorMismatch {
                source_name: self.name.clone(),
                locator: locator.to_string(),
            });
        };

        let out_of_bounds = || SourceError::OutOfBounds {
            source_name: self.name.clone(),
            offset: *offset,
            size: *size,
            len: self.len(),
        };
        let start = usize::try_from(*offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(*size).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;

        self.mmap
            .get(start..end)
            .map(<[u8]>::to_vec)
            .ok_or_else(out_of_bounds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vdfs_formats::vdf::VdfBuilder;

    fn write_package(dir: &Path) -> PathBuf {
        let mut builder = VdfBuilder::new(VdfVariant::Gothic1)
            .with_comment("Sounds")
            .with_timestamp(DosDateTime::new(2001, 3, 15, 8, 30, 0).unwrap());
        builder
            .add_file("_WORK/DATA/SOUND/SFX/DOOR_OPEN.WAV", b"RIFF-door".to_vec())
            .unwrap();
        builder
            .add_file("_WORK/DATA/SOUND/SFX/EMPTY.WAV", Vec::new())
            .unwrap();
        let path = dir.join("Sounds.vdf");
        std::fs::write(&path, builder.build().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_open_and_extract() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(dir.path());

        let (package, files) = VdfPackage::open(&path, "Sounds.vdf").unwrap();
        assert_eq!(package.variant(), Some(VdfVariant::Gothic1));
        assert_eq!(package.header().comment_text(), "Sounds");
        assert_eq!(files.len(), 2);

        let door = files
            .iter()
            .find(|f| f.name.ends_with("DOOR_OPEN.WAV"))
            .unwrap();
        assert_eq!(door.size, 9);
        assert_eq!(door.timestamp, package.timestamp().to_unix_seconds());
        assert_eq!(package.extract(&door.locator).unwrap(), b"RIFF-door");

        let empty = files.iter().find(|f| f.name.ends_with("EMPTY.WAV")).unwrap();
        assert!(package.extract(&empty.locator).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rejects_foreign_locators() {
        let dir = tempfile::tempdir().unwrap();
        let (package, _) = VdfPackage::open(&write_package(dir.path()), "Sounds.vdf").unwrap();

        assert!(matches!(
            package.extract(&Locator::Path(PathBuf::from("DOOR_OPEN.WAV"))),
            Err(SourceError::LocatorMismatch { .. })
        ));
        assert!(matches!(
            package.extract(&Locator::Packed {
                offset: package.len() - 4,
                size: 8,
            }),
            Err(SourceError::OutOfBounds { .. })
        ));
        assert!(matches!(
            package.extract(&Locator::Packed {
                offset: u64::MAX,
                size: 1,
            }),
            Err(SourceError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_open_short_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("Empty.vdf");
        std::fs::write(&empty, b"").unwrap();

        assert!(matches!(
            VdfPackage::open(&empty, "Empty.vdf"),
            Err(SourceError::Format {
                source: VdfError::Truncated { actual: 0, .. },
                ..
            })
        ));
        assert!(matches!(
            VdfPackage::open(&dir.path().join("Missing.vdf"), "Missing.vdf"),
            Err(SourceError::Io { .. })
        ));
    }
}
