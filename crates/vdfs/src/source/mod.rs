//! Archive sources backing the file index
//!
//! A source is one loaded VDF package or one mounted host directory. Sources
//! own only what they need to extract bytes later (a read-only memory map,
//! or a directory root); the index stores a [`Locator`] per file and hands
//! it back to the owning source on read.
//!
//! Package names are resolved case-insensitively inside the search
//! directory, so `"meshes.vdf"` finds `Meshes.VDF` on case-sensitive hosts.

mod directory;
mod package;
mod resolve;

pub use directory::DirectoryMount;
pub use package::VdfPackage;

use crate::error::{LoadError, SourceError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub(crate) use resolve::{list_files, resolve_ignore_case};

/// Kind of data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A VDF package file
    Package,
    /// A mounted host directory
    Directory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => f.write_str("package"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// Where a source finds the bytes of one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Byte range inside a package
    Packed {
        /// Absolute offset within the package
        offset: u64,
        /// Size in bytes
        size: u64,
    },
    /// File on the host file system
    Path(PathBuf),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packed { offset, size } => write!(f, "@{offset}+{size}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A file enumerated from a source, before insertion into the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Name as enumerated, possibly with directory components
    pub name: String,
    /// Locator for extraction
    pub locator: Locator,
    /// Size in bytes
    pub size: u64,
    /// Modification time in Unix seconds, when known
    pub timestamp: Option<u64>,
}

/// A data provider backing zero or more index entries.
///
/// Implementations must be usable from many threads at once once the index
/// is finalized; extraction takes `&self` and must not rely on shared
/// cursors or a working directory.
pub trait ArchiveSource: Send + Sync + fmt::Debug {
    /// Display name (package file name or mounted directory name)
    fn name(&self) -> &str;

    /// Location on the host file system
    fn path(&self) -> &Path;

    /// Kind of provider
    fn kind(&self) -> SourceKind;

    /// Extract the bytes addressed by `locator`
    fn extract(&self, locator: &Locator) -> Result<Vec<u8>, SourceError>;
}

/// Result of opening a source: the handle plus its enumerated files
#[derive(Debug)]
pub struct LoadedSource {
    /// Shared handle kept by the index
    pub handle: Arc<dyn ArchiveSource>,
    /// Every file the source provides
    pub files: Vec<SourceFile>,
}

/// Host path of `package_name` inside `search_dir`, matched ignoring ASCII
/// case
pub fn locate(search_dir: &Path, package_name: &str) -> Option<PathBuf> {
    resolve_ignore_case(search_dir, Path::new(package_name))
}

/// Check whether `package_name` exists in `search_dir`, ignoring ASCII case.
///
/// Returns `false` when no search directory is configured. Never opens the
/// package.
pub fn probe_availability(search_dir: Option<&Path>, package_name: &str) -> bool {
    search_dir.is_some_and(|dir| locate(dir, package_name).is_some())
}

/// Open `package_name` from `search_dir`.
///
/// Regular files are opened as VDF packages. Directories are mounted,
/// recursively unless `recursive_mounts` is false.
pub fn load(
    search_dir: Option<&Path>,
    package_name: &str,
    recursive_mounts: bool,
) -> Result<LoadedSource, LoadError> {
    let dir = search_dir.ok_or(LoadError::GameDirectoryNotSet)?;
    let path = locate(dir, package_name).ok_or_else(|| LoadError::NotFound {
        package: package_name.to_string(),
        directory: dir.to_path_buf(),
    })?;

    let name = path
        .file_name()
        .map_or_else(|| package_name.to_string(), |n| n.to_string_lossy().into_owned());
    let open_failed = |source| LoadError::OpenFailed {
        package: package_name.to_string(),
        source,
    };

    debug!("Opening {} as source {name}", path.display());
    if path.is_dir() {
        let (mount, files) =
            DirectoryMount::open(&path, name, recursive_mounts).map_err(open_failed)?;
        Ok(LoadedSource {
            handle: Arc::new(mount),
            files,
        })
    } else {
        let (package, files) = VdfPackage::open(&path, name).map_err(open_failed)?;
        Ok(LoadedSource {
            handle: Arc::new(package),
            files,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vdfs_formats::vdf::{VdfBuilder, VdfVariant};

    fn package_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = VdfBuilder::new(VdfVariant::Gothic2);
        for (path, data) in files {
            builder.add_file(path, data.to_vec()).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_probe_without_directory() {
        assert!(!probe_availability(None, "Meshes.vdf"));
    }

    #[test]
    fn test_probe_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Meshes.VDF"), b"").unwrap();

        assert!(probe_availability(Some(dir.path()), "meshes.vdf"));
        assert!(probe_availability(Some(dir.path()), "MESHES.VDF"));
        assert!(!probe_availability(Some(dir.path()), "Textures.vdf"));
    }

    #[test]
    fn test_load_package() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Worlds.vdf"),
            package_bytes(&[("_WORK/DATA/WORLDS/WORLD.ZEN", b"zen")]),
        )
        .unwrap();

        let loaded = load(Some(dir.path()), "worlds.VDF", true).unwrap();
        assert_eq!(loaded.handle.name(), "Worlds.vdf");
        assert_eq!(loaded.handle.kind(), SourceKind::Package);
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.files[0].name, "_WORK/DATA/WORLDS/WORLD.ZEN");
        assert_eq!(
            loaded.handle.extract(&loaded.files[0].locator).unwrap(),
            b"zen"
        );
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.vdf"), b"not a package").unwrap();

        assert!(matches!(
            load(None, "Broken.vdf", true),
            Err(LoadError::GameDirectoryNotSet)
        ));
        assert!(matches!(
            load(Some(dir.path()), "Missing.vdf", true),
            Err(LoadError::NotFound { .. })
        ));
        assert!(matches!(
            load(Some(dir.path()), "broken.vdf", true),
            Err(LoadError::OpenFailed { .. })
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("_work").join("Data");
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(work.join("Readme.txt"), b"hello").unwrap();

        let loaded = load(Some(dir.path()), "_WORK", true).unwrap();
        assert_eq!(loaded.handle.kind(), SourceKind::Directory);
        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.files[0].name, "Data/Readme.txt");
    }

    #[test]
    fn test_locator_display() {
        let locator = Locator::Packed {
            offset: 376,
            size: 12,
        };
        assert_eq!(locator.to_string(), "@376+12");
    }
}
