//! Process-wide instance
//!
//! Hosts that want one shared file system call [`init`] once at startup,
//! configure and load through [`write`], and hand the result of
//! [`file_index`] to the rest of the program. Nothing is constructed before
//! the first call.
//!
//! Guards returned by [`read`] and [`write`] hold the global lock; do not
//! call back into this module while holding one.

use crate::config::VfsConfig;
use crate::error::UsageError;
use crate::index::FileIndex;
use crate::vfs::VirtualFileSystem;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
    const_rwlock,
};
use std::sync::Arc;
use tracing::info;

static INSTANCE: RwLock<Option<VirtualFileSystem>> = const_rwlock(None);

/// Create the global instance.
///
/// # Errors
///
/// Returns [`UsageError::AlreadyInitialized`] if an instance exists
pub fn init(config: VfsConfig) -> Result<(), UsageError> {
    let mut slot = INSTANCE.write();
    if slot.is_some() {
        return Err(UsageError::AlreadyInitialized);
    }
    *slot = Some(VirtualFileSystem::new(config));
    info!("Virtual file system initialized");
    Ok(())
}

/// Drop the global instance. Returns whether one existed.
///
/// Handles previously returned by [`file_index`] stay valid.
pub fn shutdown() -> bool {
    let existed = INSTANCE.write().take().is_some();
    if existed {
        info!("Virtual file system shut down");
    }
    existed
}

/// Whether [`init`] has run without a matching [`shutdown`]
pub fn is_initialized() -> bool {
    INSTANCE.read().is_some()
}

/// Write access, creating a default instance on first use
pub fn get_or_init() -> MappedRwLockWriteGuard<'static, VirtualFileSystem> {
    RwLockWriteGuard::map(INSTANCE.write(), |slot| {
        slot.get_or_insert_with(VirtualFileSystem::default)
    })
}

/// Shared access to the global instance
///
/// # Errors
///
/// Returns [`UsageError::NotInitialized`] before [`init`]
pub fn read() -> Result<MappedRwLockReadGuard<'static, VirtualFileSystem>, UsageError> {
    RwLockReadGuard::try_map(INSTANCE.read(), |slot| slot.as_ref())
        .map_err(|_| UsageError::NotInitialized)
}

/// Exclusive access to the global instance
///
/// # Errors
///
/// Returns [`UsageError::NotInitialized`] before [`init`]
pub fn write() -> Result<MappedRwLockWriteGuard<'static, VirtualFileSystem>, UsageError> {
    RwLockWriteGuard::try_map(INSTANCE.write(), |slot| slot.as_mut())
        .map_err(|_| UsageError::NotInitialized)
}

/// Finalize the global instance and return its shared index
///
/// # Errors
///
/// Returns [`UsageError::NotInitialized`] before [`init`]
pub fn file_index() -> Result<Arc<FileIndex>, UsageError> {
    Ok(write()?.get_file_index())
}

/// Calls [`shutdown`] when dropped, tying the global instance to a scope
/// such as `main`.
#[derive(Debug)]
#[must_use = "the global instance is shut down when the guard is dropped"]
pub struct ShutdownGuard(());

impl ShutdownGuard {
    /// [`init`] the global instance and return a guard for it
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::AlreadyInitialized`] if an instance exists
    pub fn init(config: VfsConfig) -> Result<Self, UsageError> {
        init(config)?;
        Ok(Self(()))
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        shutdown();
    }
}
