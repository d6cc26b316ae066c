//! Flat, case-insensitive, read-only virtual file system over VDF packages
//! and host directories.
//!
//! Game assets are addressed by bare file name: `"stone.3ds"` finds
//! `_WORK/DATA/MESHES/LEVEL/STONE.3DS` in whichever loaded package provides
//! it. Packages are loaded one by one during startup; when two define the
//! same name, the configured [`CollisionPolicy`] decides which one wins
//! (by default the later load, so patch packages override base content).
//!
//! # Lifecycle
//!
//! 1. [`VirtualFileSystem::set_path_to_engine_executable`]
//! 2. [`VirtualFileSystem::set_game_directory`]
//! 3. [`VirtualFileSystem::load_package`] for each package
//! 4. [`VirtualFileSystem::get_file_index`] finalizes and shares the
//!    [`FileIndex`]; no more packages can be loaded afterwards
//!
//! # Example
//!
//! ```rust,no_run
//! use vdfs::{VfsConfig, VirtualFileSystem};
//!
//! # fn example() -> Result<(), vdfs::UsageError> {
//! let mut vfs = VirtualFileSystem::new(VfsConfig::default().with_package_subdirectory("Data"));
//! vfs.set_path_to_engine_executable(std::env::args().next().unwrap_or_default());
//! vfs.set_game_directory("/games/Gothic II")?;
//!
//! for package in ["Meshes.vdf", "Textures.vdf", "Patch.vdf"] {
//!     if !vfs.load_package(package)? {
//!         eprintln!("{package} is missing");
//!     }
//! }
//!
//! let index = vfs.get_file_index();
//! let zen = index.read_bytes("addonworld.zen").unwrap_or_default();
//! println!("world: {} bytes", zen.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod global;
pub mod index;
pub mod name;
pub mod source;
pub mod vfs;

pub use config::{CollisionPolicy, VfsConfig};
pub use error::{ConfigError, LoadError, SourceError, UsageError};
pub use index::{FileEntry, FileIndex, FileRef, InsertOutcome, SourceId, SourceSummary};
pub use source::{
    ArchiveSource, DirectoryMount, LoadedSource, Locator, SourceFile, SourceKind, VdfPackage,
};
pub use vfs::VirtualFileSystem;
