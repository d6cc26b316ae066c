//! The flat file index
//!
//! Maps normalized file names to the source that provides them. The index
//! is built single-threaded while packages load, then finalized and shared
//! behind an `Arc`; after finalization it is immutable and every query takes
//! `&self`.

use crate::config::CollisionPolicy;
use crate::error::{SourceError, UsageError};
use crate::name;
use crate::source::{ArchiveSource, LoadedSource, Locator};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle to a source registered with an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(usize);

impl SourceId {
    /// Registration order, starting at zero
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One mapping in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Normalized key (upper-cased base name)
    pub name: String,
    /// Name as enumerated by the source, including directories
    pub path: String,
    /// Source providing the bytes
    pub source: SourceId,
    /// Where the source finds the bytes
    pub locator: Locator,
    /// Size in bytes
    pub size: u64,
    /// Modification time in Unix seconds, when known
    pub timestamp: Option<u64>,
}

/// Result of a successful lookup: the entry plus its source handle
#[derive(Debug, Clone, Copy)]
pub struct FileRef<'a> {
    /// Matched entry
    pub entry: &'a FileEntry,
    /// Source owning the bytes
    pub source: &'a Arc<dyn ArchiveSource>,
}

impl FileRef<'_> {
    /// Extract the file's bytes from its source
    ///
    /// # Errors
    ///
    /// Returns error if the source cannot produce the bytes
    pub fn read(&self) -> Result<Vec<u8>, SourceError> {
        self.source.extract(&self.entry.locator)
    }
}

/// What an insertion did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New name
    Inserted,
    /// Existing mapping was replaced
    Replaced,
    /// Existing mapping was kept; the new definition is shadowed
    Kept,
    /// Name normalized to nothing and was ignored
    Skipped,
}

/// Per-source statistics returned by [`FileIndex::add_source`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    /// Id assigned to the source
    pub id: SourceId,
    /// Source display name
    pub name: String,
    /// Files enumerated by the source
    pub files: usize,
    /// Names that were new to the index
    pub inserted: usize,
    /// Names whose existing mapping was replaced
    pub replaced: usize,
    /// Names whose existing mapping was kept
    pub kept: usize,
}

/// Flat, case-insensitive file name index
pub struct FileIndex {
    policy: CollisionPolicy,
    entries: HashMap<String, FileEntry>,
    sources: Vec<Arc<dyn ArchiveSource>>,
    overridden: usize,
    finalized: bool,
}

impl fmt::Debug for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileIndex")
            .field("policy", &self.policy)
            .field("entries", &self.entries.len())
            .field("sources", &self.sources.len())
            .field("overridden", &self.overridden)
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl Default for FileIndex {
    fn default() -> Self {
        Self::new(CollisionPolicy::default())
    }
}

impl FileIndex {
    /// Create an empty, open index
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
            sources: Vec::new(),
            overridden: 0,
            finalized: false,
        }
    }

    /// Collision policy in effect
    pub const fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Whether [`finalize`](Self::finalize) has run
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Mark the index complete. Idempotent.
    pub fn finalize(&mut self) {
        if !self.finalized {
            self.finalized = true;
            info!(
                "File index finalized: {} files from {} sources ({} overridden)",
                self.entries.len(),
                self.sources.len(),
                self.overridden
            );
        }
    }

    /// Register a source and get the id its files are inserted under
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::IndexFinalized`] once the index is finalized
    pub fn register_source(
        &mut self,
        source: Arc<dyn ArchiveSource>,
    ) -> Result<SourceId, UsageError> {
        self.ensure_open()?;
        let id = SourceId(self.sources.len());
        debug!("Registered source {id}: {}", source.name());
        self.sources.push(source);
        Ok(id)
    }

    /// Insert or override one mapping.
    ///
    /// `name` may contain directories; only its normalized base name is used
    /// as the key. Names that normalize to nothing are skipped.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the index is finalized or `source` was not
    /// registered with this index
    pub fn insert(
        &mut self,
        name: &str,
        source: SourceId,
        locator: Locator,
        size: u64,
        timestamp: Option<u64>,
    ) -> Result<InsertOutcome, UsageError> {
        self.ensure_open()?;
        if source.0 >= self.sources.len() {
            return Err(UsageError::UnknownSource(source.0));
        }
        let Some(key) = name::normalize(name) else {
            debug!("Skipping entry with empty name {name:?}");
            return Ok(InsertOutcome::Skipped);
        };

        let entry = FileEntry {
            name: key.clone(),
            path: name.to_string(),
            source,
            locator,
            size,
            timestamp,
        };

        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(InsertOutcome::Inserted)
            }
            Entry::Occupied(mut slot) => {
                self.overridden += 1;
                if Self::replaces(self.policy, slot.get(), &entry) {
                    debug!(
                        "{} from source {} overrides source {}",
                        slot.key(),
                        entry.source,
                        slot.get().source
                    );
                    slot.insert(entry);
                    Ok(InsertOutcome::Replaced)
                } else {
                    Ok(InsertOutcome::Kept)
                }
            }
        }
    }

    fn replaces(policy: CollisionPolicy, existing: &FileEntry, incoming: &FileEntry) -> bool {
        match policy {
            CollisionPolicy::LastLoadedWins => true,
            CollisionPolicy::FirstLoadedWins => false,
            CollisionPolicy::NewestWins => match (existing.timestamp, incoming.timestamp) {
                (Some(existing), Some(incoming)) => incoming >= existing,
                _ => true,
            },
        }
    }

    /// Register a loaded source and insert all of its files
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::IndexFinalized`] once the index is finalized
    pub fn add_source(&mut self, loaded: LoadedSource) -> Result<SourceSummary, UsageError> {
        let LoadedSource { handle, files } = loaded;
        let name = handle.name().to_string();
        let id = self.register_source(handle)?;

        let mut summary = SourceSummary {
            id,
            name,
            files: files.len(),
            inserted: 0,
            replaced: 0,
            kept: 0,
        };
        for file in files {
            match self.insert(&file.name, id, file.locator, file.size, file.timestamp)? {
                InsertOutcome::Inserted => summary.inserted += 1,
                InsertOutcome::Replaced => summary.replaced += 1,
                InsertOutcome::Kept => summary.kept += 1,
                InsertOutcome::Skipped => {}
            }
        }
        Ok(summary)
    }

    /// Resolve a name to its entry and source
    pub fn lookup(&self, name: &str) -> Option<FileRef<'_>> {
        let key = name::normalize(name)?;
        let entry = self.entries.get(&key)?;
        let source = self.sources.get(entry.source.0)?;
        Some(FileRef { entry, source })
    }

    /// Whether a mapping exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        name::normalize(name).is_some_and(|key| self.entries.contains_key(&key))
    }

    /// Entry for `name`, if any
    pub fn entry(&self, name: &str) -> Option<&FileEntry> {
        self.entries.get(&name::normalize(name)?)
    }

    /// Read a file, logging and swallowing extraction failures
    pub fn read_bytes(&self, name: &str) -> Option<Vec<u8>> {
        match self.try_read_bytes(name) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {name}: {e}");
                None
            }
        }
    }

    /// Read a file. `Ok(None)` means the name is not in the index.
    ///
    /// # Errors
    ///
    /// Returns error if the owning source fails to extract the bytes
    pub fn try_read_bytes(&self, name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        self.lookup(name).map(|file| file.read()).transpose()
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no names
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All normalized names, sorted
    pub fn file_names(&self) -> Vec<&str> {
        let mut names = self.entries.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Normalized names with the given extension (case-insensitive, with or
    /// without the leading dot), sorted
    pub fn files_with_extension(&self, extension: &str) -> Vec<&str> {
        let wanted = extension.trim_start_matches('.');
        let mut names = self
            .entries
            .keys()
            .filter(|key| name::extension(key).is_some_and(|ext| ext.eq_ignore_ascii_case(wanted)))
            .map(String::as_str)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Iterate over all entries in unspecified order
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    /// Registered sources in registration order
    pub fn sources(&self) -> &[Arc<dyn ArchiveSource>] {
        &self.sources
    }

    /// Source registered under `id`
    pub fn source(&self, id: SourceId) -> Option<&Arc<dyn ArchiveSource>> {
        self.sources.get(id.0)
    }

    /// Number of insertions that collided with an existing name, whichever
    /// definition won
    pub const fn overridden_count(&self) -> usize {
        self.overridden
    }

    fn ensure_open(&self) -> Result<(), UsageError> {
        if self.finalized {
            Err(UsageError::IndexFinalized)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::{SourceFile, SourceKind};
    use std::path::{Path, PathBuf};

    /// In-memory source serving fixed bodies by offset
    #[derive(Debug)]
    struct MemorySource {
        name: String,
        bodies: Vec<Vec<u8>>,
    }

    impl ArchiveSource for MemorySource {
        fn name(&self) -> &str {
            &self.name
        }

        fn path(&self) -> &Path {
            Path::new("memory")
        }

        fn kind(&self) -> SourceKind {
            SourceKind::Package
        }

        fn extract(&self, locator: &Locator) -> Result<Vec<u8>, SourceError> {
            match locator {
                Locator::Packed { offset, .. } => self
                    .bodies
                    .get(*offset as usize)
                    .cloned()
                    .ok_or_else(|| SourceError::OutOfBounds {
                        source_name: self.name.clone(),
                        offset: *offset,
                        size: 0,
                        len: self.bodies.len() as u64,
                    }),
                Locator::Path(_) => Err(SourceError::LocatorMismatch {
                    source_name: self.name.clone(),
                    locator: locator.to_string(),
                }),
            }
        }
    }

    fn memory_source(name: &str, files: &[(&str, &[u8], Option<u64>)]) -> LoadedSource {
        LoadedSource {
            handle: Arc::new(MemorySource {
                name: name.to_string(),
                bodies: files.iter().map(|(_, body, _)| body.to_vec()).collect(),
            }),
            files: files
                .iter()
                .enumerate()
                .map(|(i, (path, body, timestamp))| SourceFile {
                    name: (*path).to_string(),
                    locator: Locator::Packed {
                        offset: i as u64,
                        size: body.len() as u64,
                    },
                    size: body.len() as u64,
                    timestamp: *timestamp,
                })
                .collect(),
        }
    }

    #[test]
    fn test_lookup_ignores_case_and_directories() {
        let mut index = FileIndex::default();
        index
            .add_source(memory_source(
                "Meshes.vdf",
                &[("_WORK/DATA/MESHES/LEVEL/STONE.3DS", b"stone", None)],
            ))
            .unwrap();

        for query in ["STONE.3DS", "stone.3ds", "Stone.3ds", "level/stone.3DS"] {
            assert_eq!(index.read_bytes(query).unwrap(), b"stone", "{query}");
        }
        let entry = index.entry("stone.3ds").unwrap();
        assert_eq!(entry.path, "_WORK/DATA/MESHES/LEVEL/STONE.3DS");
        assert_eq!(entry.size, 5);
        assert!(index.read_bytes("WALL.3DS").is_none());
    }

    #[test]
    fn test_last_loaded_wins() {
        let mut index = FileIndex::default();
        index
            .add_source(memory_source("Meshes.vdf", &[("A/STONE.3DS", b"old", None)]))
            .unwrap();
        let summary = index
            .add_source(memory_source("Patch.vdf", &[("B/stone.3ds", b"new", None)]))
            .unwrap();

        assert_eq!(summary.replaced, 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.overridden_count(), 1);
        assert_eq!(index.read_bytes("STONE.3DS").unwrap(), b"new");
        let file = index.lookup("stone.3ds").unwrap();
        assert_eq!(file.source.name(), "Patch.vdf");
    }

    #[test]
    fn test_first_loaded_wins() {
        let mut index = FileIndex::new(CollisionPolicy::FirstLoadedWins);
        index
            .add_source(memory_source("Meshes.vdf", &[("STONE.3DS", b"old", None)]))
            .unwrap();
        let summary = index
            .add_source(memory_source("Patch.vdf", &[("STONE.3DS", b"new", None)]))
            .unwrap();

        assert_eq!(summary.kept, 1);
        assert_eq!(index.read_bytes("STONE.3DS").unwrap(), b"old");
    }

    #[test]
    fn test_newest_wins() {
        let mut index = FileIndex::new(CollisionPolicy::NewestWins);
        index
            .add_source(memory_source(
                "Meshes.vdf",
                &[
                    ("STONE.3DS", b"newer", Some(200)),
                    ("WALL.3DS", b"wall-a", Some(100)),
                    ("DOOR.3DS", b"door-a", None),
                ],
            ))
            .unwrap();
        index
            .add_source(memory_source(
                "Patch.vdf",
                &[
                    ("STONE.3DS", b"older", Some(100)),
                    ("WALL.3DS", b"wall-b", Some(100)),
                    ("DOOR.3DS", b"door-b", Some(50)),
                ],
            ))
            .unwrap();

        assert_eq!(index.read_bytes("STONE.3DS").unwrap(), b"newer");
        // Ties and unknown timestamps fall back to the later load
        assert_eq!(index.read_bytes("WALL.3DS").unwrap(), b"wall-b");
        assert_eq!(index.read_bytes("DOOR.3DS").unwrap(), b"door-b");
    }

    #[test]
    fn test_duplicates_within_one_source() {
        let mut index = FileIndex::default();
        let summary = index
            .add_source(memory_source(
                "Textures.vdf",
                &[
                    ("_WORK/DATA/TEXTURES/A/SKY.TGA", b"first", None),
                    ("_WORK/DATA/TEXTURES/B/SKY.TGA", b"second", None),
                ],
            ))
            .unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.replaced, 1);
        assert_eq!(index.read_bytes("sky.tga").unwrap(), b"second");
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let mut index = FileIndex::default();
        let id = index
            .register_source(memory_source("Empty.vdf", &[]).handle)
            .unwrap();
        let outcome = index
            .insert("MESHES/", id, Locator::Packed { offset: 0, size: 0 }, 0, None)
            .unwrap();

        assert_eq!(outcome, InsertOutcome::Skipped);
        assert!(index.is_empty());
        assert!(!index.contains(""));
    }

    #[test]
    fn test_finalized_index_rejects_mutation() {
        let mut index = FileIndex::default();
        let id = index
            .register_source(memory_source("Meshes.vdf", &[]).handle)
            .unwrap();
        index.finalize();
        index.finalize();
        assert!(index.is_finalized());

        assert_eq!(
            index.insert("STONE.3DS", id, Locator::Path(PathBuf::from("x")), 0, None),
            Err(UsageError::IndexFinalized)
        );
        assert_eq!(
            index.add_source(memory_source("Patch.vdf", &[])).map(|s| s.files),
            Err(UsageError::IndexFinalized)
        );
        assert_eq!(index.sources().len(), 1);
    }

    #[test]
    fn test_unknown_source() {
        let mut index = FileIndex::default();
        assert_eq!(
            index.insert("STONE.3DS", SourceId(3), Locator::Path(PathBuf::new()), 0, None),
            Err(UsageError::UnknownSource(3))
        );
    }

    #[test]
    fn test_extraction_failure() {
        let mut index = FileIndex::default();
        let id = index
            .register_source(memory_source("Broken.vdf", &[]).handle)
            .unwrap();
        index
            .insert("GHOST.TGA", id, Locator::Packed { offset: 9, size: 4 }, 4, None)
            .unwrap();

        assert!(index.contains("ghost.tga"));
        assert!(index.try_read_bytes("ghost.tga").is_err());
        assert!(index.read_bytes("ghost.tga").is_none());
        assert!(matches!(index.try_read_bytes("other.tga"), Ok(None)));
    }

    #[test]
    fn test_listing() {
        let mut index = FileIndex::default();
        index
            .add_source(memory_source(
                "Worlds.vdf",
                &[
                    ("WORLDS/NEWWORLD.ZEN", b"", None),
                    ("WORLDS/ADDONWORLD.zen", b"", None),
                    ("WORLDS/README.TXT", b"", None),
                ],
            ))
            .unwrap();

        assert_eq!(
            index.file_names(),
            vec!["ADDONWORLD.ZEN", "NEWWORLD.ZEN", "README.TXT"]
        );
        assert_eq!(
            index.files_with_extension(".zen"),
            vec!["ADDONWORLD.ZEN", "NEWWORLD.ZEN"]
        );
        assert_eq!(index.entries().count(), 3);
    }
}
