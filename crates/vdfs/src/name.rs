//! File name normalization for the flat namespace.
//!
//! Every name entering or querying the index goes through [`normalize`]:
//! directory components are dropped and ASCII letters are upper-cased, so
//! `"_work/data/Meshes/Stone.3ds"`, `"STONE.3DS"` and `"stone.3ds"` all map
//! to the key `"STONE.3DS"`. Non-ASCII characters are kept as-is, matching
//! the ASCII-only case folding used when probing the host file system.

/// Normalize a file name to its index key.
///
/// Returns `None` when nothing is left after stripping directories and
/// surrounding whitespace (e.g. `"meshes/"`).
pub fn normalize(name: &str) -> Option<String> {
    let base = base_name(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_ascii_uppercase())
}

/// Last path component, accepting both `/` and `\` separators.
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Upper-cased extension without the dot, if any.
pub fn extension(name: &str) -> Option<String> {
    let base = base_name(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_uppercase())
}
