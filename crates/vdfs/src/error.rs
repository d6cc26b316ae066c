//! Error types for the virtual file system.
//!
//! Expected outcomes (missing package, missing file, no game directory) are
//! reported through `bool`/`Option` results by the public API. The types here
//! cover the two remaining classes: backend failures, which callers may want
//! to inspect, and usage errors, which indicate a bug in the caller.

use std::path::PathBuf;
use thiserror::Error;
use vdfs_formats::vdf::VdfError;

/// Precondition violations.
///
/// These are programming errors: the namespace would be corrupted or
/// incomplete if the operation went ahead. They are returned instead of
/// panicking so hosts can decide how loudly to fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A directory or package operation ran before
    /// `set_path_to_engine_executable`
    #[error("executable path not set: call set_path_to_engine_executable() first")]
    ExecutablePathNotSet,

    /// The index was already handed out through `get_file_index`
    #[error("file index is finalized: no further packages can be loaded")]
    IndexFinalized,

    /// The game directory changed after packages were loaded from it
    #[error("game directory cannot change after {loaded} package(s) were loaded")]
    GameDirectoryLocked {
        /// Number of packages already loaded
        loaded: usize,
    },

    /// A file was inserted under a source id the index never issued
    #[error("unknown source id {0}")]
    UnknownSource(usize),

    /// The global instance was used before `init`
    #[error("virtual file system is not initialized")]
    NotInitialized,

    /// `init` was called twice without `shutdown`
    #[error("virtual file system is already initialized")]
    AlreadyInitialized,
}

/// Errors raised by archive backends while opening or extracting.
#[derive(Debug, Error)]
pub enum SourceError {
    /// I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Package format error
    #[error("invalid package {path}: {source}")]
    Format {
        /// Package path
        path: PathBuf,
        /// Underlying format error
        #[source]
        source: VdfError,
    },

    /// Locator does not belong to this kind of source
    #[error("locator {locator} is not valid for source {source_name}")]
    LocatorMismatch {
        /// Source name
        source_name: String,
        /// Locator description
        locator: String,
    },

    /// Requested range lies outside the package
    #[error("range {offset}+{size} outside {source_name} ({len} bytes)")]
    OutOfBounds {
        /// Source name
        source_name: String,
        /// Data offset
        offset: u64,
        /// Data size
        size: u64,
        /// Package length
        len: u64,
    },
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a package could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No game directory has been configured
    #[error("no game directory configured")]
    GameDirectoryNotSet,

    /// Nothing with this name exists in the package directory
    #[error("package {package} not found in {directory}")]
    NotFound {
        /// Requested package name
        package: String,
        /// Directory that was searched
        directory: PathBuf,
    },

    /// The package exists but is malformed or unreadable
    #[error("failed to open package {package}: {source}")]
    OpenFailed {
        /// Requested package name
        package: String,
        /// Backend error
        #[source]
        source: SourceError,
    },
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Configuration path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`VfsConfig`](crate::VfsConfig)
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// Configuration path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}
