//! The virtual file system facade
//!
//! Owns the configuration, the game directory and the file index while
//! packages are loaded. The index is handed out through
//! [`VirtualFileSystem::get_file_index`], which finalizes it; from then on no
//! further packages can be loaded and readers share the index lock-free.

use crate::config::VfsConfig;
use crate::error::UsageError;
use crate::index::FileIndex;
use crate::source::{self, list_files, resolve_ignore_case};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Read-only, flat, case-insensitive view over VDF packages and directories
#[derive(Debug)]
pub struct VirtualFileSystem {
    config: VfsConfig,
    executable_path: Option<PathBuf>,
    base_directory: Option<PathBuf>,
    game_directory: Option<PathBuf>,
    index: Arc<FileIndex>,
    loaded_packages: Vec<String>,
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::new(VfsConfig::default())
    }
}

impl VirtualFileSystem {
    /// Create an unconfigured file system
    pub fn new(config: VfsConfig) -> Self {
        let index = Arc::new(FileIndex::new(config.collision_policy));
        Self {
            config,
            executable_path: None,
            base_directory: None,
            game_directory: None,
            index,
            loaded_packages: Vec::new(),
        }
    }

    /// Configuration in effect
    pub const fn config(&self) -> &VfsConfig {
        &self.config
    }

    /// Record the path of the running executable (usually `argv[0]`).
    ///
    /// Its directory is the fallback base for relative game directories.
    pub fn set_path_to_engine_executable(&mut self, argv0: impl AsRef<Path>) {
        let argv0 = argv0.as_ref();
        let cwd = std::env::current_dir().ok();

        let executable = if argv0.is_absolute() {
            argv0.to_path_buf()
        } else if argv0.components().count() > 1 {
            cwd.as_deref()
                .map_or_else(|| argv0.to_path_buf(), |cwd| cwd.join(argv0))
        } else {
            // Bare program name: found through PATH, not relative to cwd
            std::env::current_exe().unwrap_or_else(|_| argv0.to_path_buf())
        };

        self.base_directory = executable
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or(cwd);
        debug!(
            "Executable {}, base directory {:?}",
            executable.display(),
            self.base_directory
        );
        self.executable_path = Some(executable);
    }

    /// Set the directory packages are loaded from.
    ///
    /// Relative paths resolve against the working directory, or against the
    /// executable's directory when they do not exist there.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the executable path is unknown, a package was
    /// already loaded, or the index was finalized
    pub fn set_game_directory(&mut self, path: impl AsRef<Path>) -> Result<(), UsageError> {
        self.require_executable_path()?;
        if self.index.is_finalized() {
            return Err(UsageError::IndexFinalized);
        }
        if !self.loaded_packages.is_empty() {
            return Err(UsageError::GameDirectoryLocked {
                loaded: self.loaded_packages.len(),
            });
        }

        let path = path.as_ref();
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let from_cwd = std::env::current_dir().ok().map(|cwd| cwd.join(path));
            match (from_cwd, &self.base_directory) {
                (Some(candidate), _) if candidate.exists() => candidate,
                (_, Some(base)) => base.join(path),
                (Some(candidate), None) => candidate,
                (None, None) => path.to_path_buf(),
            }
        };

        info!("Game directory set to {}", resolved.display());
        self.game_directory = Some(resolved);
        Ok(())
    }

    /// Whether `package_name` exists in the package directory
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::ExecutablePathNotSet`] before
    /// [`set_path_to_engine_executable`](Self::set_path_to_engine_executable)
    pub fn is_package_available(&self, package_name: &str) -> Result<bool, UsageError> {
        self.require_executable_path()?;
        Ok(source::probe_availability(
            self.package_directory().as_deref(),
            package_name,
        ))
    }

    /// Load a package and insert all of its files.
    ///
    /// Returns `Ok(false)` when the package is missing or unreadable; the
    /// reason is logged and the index is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the executable path is unknown or the index
    /// was finalized
    pub fn load_package(&mut self, package_name: &str) -> Result<bool, UsageError> {
        self.require_executable_path()?;
        if self.index.is_finalized() {
            return Err(UsageError::IndexFinalized);
        }

        let loaded = match source::load(
            self.package_directory().as_deref(),
            package_name,
            self.config.recursive_mounts,
        ) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Could not load {package_name}: {e}");
                return Ok(false);
            }
        };

        let index = Arc::get_mut(&mut self.index).ok_or(UsageError::IndexFinalized)?;
        let summary = index.add_source(loaded)?;
        info!(
            "Loaded {} ({} files, {} new, {} overridden, {} kept)",
            summary.name, summary.files, summary.inserted, summary.replaced, summary.kept
        );
        self.loaded_packages.push(summary.name);
        Ok(true)
    }

    /// Packages found in the package directory, sorted case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::ExecutablePathNotSet`] before
    /// [`set_path_to_engine_executable`](Self::set_path_to_engine_executable)
    pub fn available_packages(&self) -> Result<Vec<String>, UsageError> {
        self.require_executable_path()?;
        let Some(dir) = self.package_directory() else {
            return Ok(Vec::new());
        };
        match list_files(&dir) {
            Ok(names) => Ok(names
                .into_iter()
                .filter(|name| self.config.is_package_name(name))
                .collect()),
            Err(e) => {
                warn!("Could not list packages in {}: {e}", dir.display());
                Ok(Vec::new())
            }
        }
    }

    /// Load every available package in discovery order.
    ///
    /// Returns the number of packages loaded.
    ///
    /// # Errors
    ///
    /// Same as [`load_package`](Self::load_package)
    pub fn load_all_packages(&mut self) -> Result<usize, UsageError> {
        let mut loaded = 0;
        for name in self.available_packages()? {
            if self.load_package(&name)? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Bytes of `name`, or an empty buffer when it is not in the index
    pub fn read_file(&self, name: &str) -> Vec<u8> {
        self.index.read_bytes(name).unwrap_or_default()
    }

    /// Whether `name` is in the index
    pub fn has_file(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Whether at least one package was loaded
    pub fn has_found_game_files(&self) -> bool {
        !self.loaded_packages.is_empty()
    }

    /// Finalize the index and return a shared handle to it. Idempotent.
    pub fn get_file_index(&mut self) -> Arc<FileIndex> {
        if let Some(index) = Arc::get_mut(&mut self.index) {
            index.finalize();
        }
        Arc::clone(&self.index)
    }

    /// Whether [`get_file_index`](Self::get_file_index) has been called
    pub fn is_finalized(&self) -> bool {
        self.index.is_finalized()
    }

    /// Names of the packages loaded so far, in load order
    pub fn loaded_packages(&self) -> &[String] {
        &self.loaded_packages
    }

    /// Resolved game directory
    pub fn game_directory(&self) -> Option<&Path> {
        self.game_directory.as_deref()
    }

    /// Executable path recorded by
    /// [`set_path_to_engine_executable`](Self::set_path_to_engine_executable)
    pub fn executable_path(&self) -> Option<&Path> {
        self.executable_path.as_deref()
    }

    /// Directory packages are looked up in: the game directory, plus the
    /// configured package subdirectory matched case-insensitively.
    pub fn package_directory(&self) -> Option<PathBuf> {
        let game_dir = self.game_directory.as_deref()?;
        match &self.config.package_subdirectory {
            None => Some(game_dir.to_path_buf()),
            Some(subdir) => Some(
                resolve_ignore_case(game_dir, subdir).unwrap_or_else(|| game_dir.join(subdir)),
            ),
        }
    }

    const fn require_executable_path(&self) -> Result<(), UsageError> {
        if self.executable_path.is_some() {
            Ok(())
        } else {
            Err(UsageError::ExecutablePathNotSet)
        }
    }
}
