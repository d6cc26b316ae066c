//! Configuration for the virtual file system

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which definition wins when two sources register the same file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// A later load replaces the earlier mapping (patch-style override)
    #[default]
    LastLoadedWins,
    /// The first mapping is kept; later duplicates are ignored
    FirstLoadedWins,
    /// The entry with the newer timestamp wins; ties and entries without a
    /// timestamp fall back to last-loaded-wins
    NewestWins,
}

/// Configuration for the virtual file system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Collision policy for duplicate file names
    pub collision_policy: CollisionPolicy,

    /// Directory below the game directory that holds packages, matched
    /// case-insensitively per component (e.g. `Data`). `None` searches the
    /// game directory itself.
    pub package_subdirectory: Option<PathBuf>,

    /// Extensions considered packages during discovery, without the dot
    pub package_extensions: Vec<String>,

    /// Whether mounted directories are walked recursively
    pub recursive_mounts: bool,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            collision_policy: CollisionPolicy::LastLoadedWins,
            package_subdirectory: None,
            package_extensions: vec!["vdf".to_string(), "mod".to_string()],
            recursive_mounts: true,
        }
    }
}

impl VfsConfig {
    /// Load a configuration from a JSON file. Missing fields use defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(subdir) = &self.package_subdirectory
            && subdir.is_absolute()
        {
            return Err(ConfigError::Invalid(format!(
                "package_subdirectory must be relative: {}",
                subdir.display()
            )));
        }
        if let Some(ext) = self
            .package_extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.contains(['.', '/', '\\']))
        {
            return Err(ConfigError::Invalid(format!(
                "package extension must be a bare extension: {ext:?}"
            )));
        }
        Ok(())
    }

    /// Set the collision policy
    #[must_use]
    pub const fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the package subdirectory
    #[must_use]
    pub fn with_package_subdirectory<P: AsRef<Path>>(mut self, subdir: P) -> Self {
        self.package_subdirectory = Some(subdir.as_ref().to_path_buf());
        self
    }

    /// Set the package extensions used by discovery
    #[must_use]
    pub fn with_package_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.package_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable recursive directory mounts
    #[must_use]
    pub const fn with_recursive_mounts(mut self, recursive: bool) -> Self {
        self.recursive_mounts = recursive;
        self
    }

    /// Whether `file_name` has one of the configured package extensions
    pub fn is_package_name(&self, file_name: &str) -> bool {
        crate::name::extension(file_name).is_some_and(|ext| {
            self.package_extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
        })
    }
}
