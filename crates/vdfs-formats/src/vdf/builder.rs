//! VDF package builder

use crate::vdf::entry::{CatalogEntry, NAME_SIZE};
use crate::vdf::error::{VdfError, VdfResult};
use crate::vdf::header::{ENTRY_SIZE, HEADER_SIZE, VdfHeader, VdfVariant};
use crate::vdf::timestamp::DosDateTime;
use binrw::BinWrite;
use std::collections::{BTreeMap, VecDeque};
use std::io::Cursor;

/// Directory node used while laying out the catalog
#[derive(Debug, Default)]
struct DirNode {
    dirs: BTreeMap<String, DirNode>,
    files: BTreeMap<String, usize>,
}

/// Builder for VDF packages.
///
/// Paths are split on `/` or `\`, upper-cased and stored as a directory
/// tree. The catalog is laid out breadth-first: each directory's children
/// occupy a contiguous run of entries (subdirectories first, then files, both
/// sorted by name), and file bodies follow the catalog in catalog order.
#[derive(Debug)]
pub struct VdfBuilder {
    variant: VdfVariant,
    comment: String,
    timestamp: DosDateTime,
    root: DirNode,
    bodies: Vec<Vec<u8>>,
}

impl VdfBuilder {
    /// Create an empty builder
    pub fn new(variant: VdfVariant) -> Self {
        Self {
            variant,
            comment: String::new(),
            timestamp: DosDateTime::EPOCH,
            root: DirNode::default(),
            bodies: Vec::new(),
        }
    }

    /// Set the header comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the header timestamp
    pub const fn with_timestamp(mut self, timestamp: DosDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Number of files added so far
    pub fn file_count(&self) -> usize {
        self.bodies.len()
    }

    /// Add a file at `path` (e.g. `"_WORK/DATA/MESHES/STONE.3DS"`).
    pub fn add_file(&mut self, path: &str, data: impl Into<Vec<u8>>) -> VdfResult<()> {
        let components: Vec<String> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();

        let Some((file_name, dirs)) = components.split_last() else {
            return Err(VdfError::InvalidName(path.to_string()));
        };

        for component in &components {
            if component.chars().count() > NAME_SIZE {
                return Err(VdfError::NameTooLong {
                    name: component.clone(),
                    len: component.chars().count(),
                });
            }
        }

        let mut node = &mut self.root;
        for dir in dirs {
            if node.files.contains_key(dir) {
                return Err(VdfError::DuplicatePath(path.to_string()));
            }
            node = node.dirs.entry(dir.clone()).or_default();
        }

        if node.files.contains_key(file_name) || node.dirs.contains_key(file_name) {
            return Err(VdfError::DuplicatePath(path.to_string()));
        }

        node.files.insert(file_name.clone(), self.bodies.len());
        self.bodies.push(data.into());
        Ok(())
    }

    /// Lay out the catalog and produce the package bytes
    pub fn build(&self) -> VdfResult<Vec<u8>> {
        let mut entries: Vec<CatalogEntry> = Vec::new();
        // (catalog slot, body index) for every file, in catalog order
        let mut file_slots: Vec<(usize, usize)> = Vec::new();
        let mut queue: VecDeque<(&DirNode, Option<usize>)> = VecDeque::new();
        queue.push_back((&self.root, None));

        while let Some((dir, parent_slot)) = queue.pop_front() {
            let first_child = entries.len();
            if let Some(slot) = parent_slot {
                entries[slot].offset = to_u32(first_child)?;
            }

            for (name, sub) in &dir.dirs {
                entries.push(CatalogEntry::directory(name, 0)?);
                queue.push_back((sub, Some(entries.len() - 1)));
            }
            for (name, &body) in &dir.files {
                entries.push(CatalogEntry::file(name, 0, to_u32(self.bodies[body].len())?)?);
                file_slots.push((entries.len() - 1, body));
            }

            if entries.len() > first_child
                && let Some(last) = entries.last_mut()
            {
                last.mark_last();
            }
        }

        let data_start = HEADER_SIZE as u64 + entries.len() as u64 * u64::from(ENTRY_SIZE);
        let mut cursor_offset = data_start;
        for &(slot, body) in &file_slots {
            entries[slot].offset = to_u32(cursor_offset)?;
            cursor_offset += self.bodies[body].len() as u64;
        }
        // The end offset must also be addressable
        to_u32(cursor_offset)?;

        let mut header = VdfHeader::new(self.variant);
        header.set_comment(&self.comment);
        header.entry_count = to_u32(entries.len())?;
        header.file_count = to_u32(file_slots.len())?;
        header.timestamp = self.timestamp.to_packed();
        header.data_size = to_u32(cursor_offset - data_start)?;

        let mut cursor = Cursor::new(Vec::with_capacity(cursor_offset as usize));
        header.write_le(&mut cursor)?;
        for entry in &entries {
            entry.write_le(&mut cursor)?;
        }

        let mut package = cursor.into_inner();
        for &(_, body) in &file_slots {
            package.extend_from_slice(&self.bodies[body]);
        }
        Ok(package)
    }
}

fn to_u32(value: impl TryInto<u32>) -> VdfResult<u32> {
    value.try_into().map_err(|_| VdfError::PackageTooLarge)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::vdf::archive::VdfArchive;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_breadth_first_layout() {
        let mut builder = VdfBuilder::new(VdfVariant::Gothic2);
        builder.add_file("ROOT.TXT", b"r".to_vec()).unwrap();
        builder.add_file("MESHES/STONE.3DS", b"stone".to_vec()).unwrap();
        builder.add_file("MESHES/LEVEL/WALL.3DS", b"wall".to_vec()).unwrap();
        let package = builder.build().unwrap();

        let archive = VdfArchive::parse(&package).unwrap();
        let names: Vec<String> = archive.entries.iter().map(CatalogEntry::name).collect();
        assert_eq!(
            names,
            vec!["MESHES", "ROOT.TXT", "LEVEL", "STONE.3DS", "WALL.3DS"]
        );

        // MESHES -> children at 2, LEVEL -> children at 4
        assert_eq!(archive.entries[0].offset, 2);
        assert_eq!(archive.entries[2].offset, 4);
        assert!(archive.entries[1].is_last());
        assert!(archive.entries[3].is_last());
        assert!(archive.entries[4].is_last());

        assert_eq!(archive.header.entry_count, 5);
        assert_eq!(archive.header.file_count, 3);
        assert_eq!(archive.header.data_size, 10);
    }

    #[test]
    fn test_paths_and_data() {
        let mut builder = VdfBuilder::new(VdfVariant::Gothic1);
        builder.add_file("textures\\_compiled\\grass-C.tex", vec![7u8; 32]).unwrap();
        let package = builder.build().unwrap();

        let archive = VdfArchive::parse(&package).unwrap();
        let file = &archive.files()[0];
        assert_eq!(file.path, "TEXTURES/_COMPILED/GRASS-C.TEX");
        assert_eq!(file.name, "GRASS-C.TEX");
        assert_eq!(archive.file_data(&package, file).unwrap(), &[7u8; 32][..]);
    }

    #[test]
    fn test_header_metadata() {
        let timestamp = DosDateTime::new(2003, 6, 1, 18, 30, 10).unwrap();
        let package = VdfBuilder::new(VdfVariant::Gothic2)
            .with_comment("Patch 2.6")
            .with_timestamp(timestamp)
            .build()
            .unwrap();

        let archive = VdfArchive::parse(&package).unwrap();
        assert_eq!(archive.header.comment_text(), "Patch 2.6");
        assert_eq!(archive.timestamp(), timestamp);
        assert_eq!(archive.variant(), VdfVariant::Gothic2);
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let mut builder = VdfBuilder::new(VdfVariant::Gothic2);
        builder.add_file("A/B.TXT", Vec::new()).unwrap();
        assert!(matches!(
            builder.add_file("a/b.txt", Vec::new()),
            Err(VdfError::DuplicatePath(_))
        ));
        assert!(matches!(
            builder.add_file("A/B.TXT/C", Vec::new()),
            Err(VdfError::DuplicatePath(_))
        ));
        assert!(matches!(
            builder.add_file("A", Vec::new()),
            Err(VdfError::DuplicatePath(_))
        ));
        assert!(matches!(
            builder.add_file("//", Vec::new()),
            Err(VdfError::InvalidName(_))
        ));
        assert_eq!(builder.file_count(), 1);
    }
}
