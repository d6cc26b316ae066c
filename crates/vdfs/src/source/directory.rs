//! Host directory backend

use super::{ArchiveSource, Locator, SourceFile, SourceKind};
use crate::error::SourceError;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A host directory mounted as a source.
///
/// Every regular file below the root becomes one source file named by its
/// path relative to the root. Files are read with a fresh handle on every
/// extraction, so the mount holds no open descriptors.
#[derive(Debug)]
pub struct DirectoryMount {
    name: String,
    root: PathBuf,
    recursive: bool,
}

impl DirectoryMount {
    /// Enumerate `root` and return the mount with its files.
    ///
    /// Unreadable entries below the root are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns error if the root itself cannot be read
    pub fn open(
        root: &Path,
        name: impl Into<String>,
        recursive: bool,
    ) -> Result<(Self, Vec<SourceFile>), SourceError> {
        std::fs::read_dir(root).map_err(|e| SourceError::io(root, e))?;

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry below {}: {e}", root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let Some(name) = relative_name(relative) else {
                warn!("Skipping non UTF-8 file name {}", entry.path().display());
                continue;
            };
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {}: {e}", entry.path().display());
                    continue;
                }
            };
            let timestamp = metadata
                .modified()
                .ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|elapsed| elapsed.as_secs());

            files.push(SourceFile {
                name,
                locator: Locator::Path(entry.path().to_path_buf()),
                size: metadata.len(),
                timestamp,
            });
        }

        let mount = Self {
            name: name.into(),
            root: root.to_path_buf(),
            recursive,
        };
        debug!(
            "Mounted directory {} ({} files, recursive: {recursive})",
            root.display(),
            files.len()
        );
        Ok((mount, files))
    }

    /// Whether subdirectories were included
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }
}

fn relative_name(relative: &Path) -> Option<String> {
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

impl ArchiveSource for DirectoryMount {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.root
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn extract(&self, locator: &Locator) -> Result<Vec<u8>, SourceError> {
        match locator {
            Locator::Path(path) => std::fs::read(path).map_err(|e| SourceError::io(path, e)),
            Locator::Packed { .. } => Err(SourceError::LocatorMismatch {
                source_name: self.name.clone(),
                locator: locator.to_string(),
            }),
        }
    }
}
