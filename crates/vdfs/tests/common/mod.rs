//! Shared fixtures: game directories populated with generated packages

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vdfs::{VfsConfig, VirtualFileSystem};
use vdfs_formats::vdf::{DosDateTime, VdfBuilder, VdfVariant};

/// A temporary game installation with a `Data` directory
pub struct GameDir {
    pub root: TempDir,
}

impl GameDir {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create game directory");
        std::fs::create_dir(root.path().join("Data")).expect("create Data");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn data(&self) -> PathBuf {
        self.root.path().join("Data")
    }

    /// Write a Gothic 2 package into `Data`
    pub fn package(&self, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        self.package_at(name, DosDateTime::EPOCH, files)
    }

    /// Write a package stamped with `timestamp`
    pub fn package_at(&self, name: &str, timestamp: DosDateTime, files: &[(&str, &[u8])]) -> PathBuf {
        let mut builder = VdfBuilder::new(VdfVariant::Gothic2)
            .with_comment(name)
            .with_timestamp(timestamp);
        for (path, data) in files {
            builder.add_file(path, data.to_vec()).expect("add file");
        }
        let path = self.data().join(name);
        std::fs::write(&path, builder.build().expect("build package")).expect("write package");
        path
    }

    /// A file system configured for this directory, nothing loaded
    pub fn vfs(&self, config: VfsConfig) -> VirtualFileSystem {
        let mut vfs = VirtualFileSystem::new(config.with_package_subdirectory("Data"));
        vfs.set_path_to_engine_executable(self.path().join("System").join("Gothic2.exe"));
        vfs.set_game_directory(self.path())
            .expect("set game directory");
        vfs
    }
}
