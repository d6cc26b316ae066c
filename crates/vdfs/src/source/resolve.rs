//! Case-insensitive path resolution on the host file system

use std::path::{Component, Path, PathBuf};

/// Resolve `relative` below `base`, matching each component ignoring ASCII
/// case.
///
/// An exact match wins; otherwise the lexicographically smallest
/// case-insensitive match is used so resolution is deterministic when a
/// case-sensitive host holds several spellings. `..` and absolute
/// components never resolve.
pub(crate) fn resolve_ignore_case(base: &Path, relative: &Path) -> Option<PathBuf> {
    let mut current = base.to_path_buf();
    let mut matched_any = false;

    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                let part = part.to_str()?;
                current = resolve_component(&current, part)?;
                matched_any = true;
            }
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    matched_any.then_some(current)
}

fn resolve_component(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.exists() {
        return Some(exact);
    }

    let mut candidates = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let file_name = entry.file_name().into_string().ok()?;
            file_name.eq_ignore_ascii_case(name).then_some(file_name)
        })
        .collect::<Vec<_>>();
    candidates.sort();
    candidates.into_iter().next().map(|found| dir.join(found))
}

/// Names of the regular files directly inside `dir`, sorted.
pub(crate) fn list_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort_by_key(|name| name.to_ascii_uppercase());
    Ok(names)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_resolution() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Data").join("modvdf")).unwrap();
        std::fs::write(dir.path().join("Data").join("Anims.VDF"), b"").unwrap();

        assert_eq!(
            resolve_ignore_case(dir.path(), Path::new("DATA/anims.vdf")),
            Some(dir.path().join("Data").join("Anims.VDF"))
        );
        assert_eq!(
            resolve_ignore_case(dir.path(), Path::new("./data/MODVDF")),
            Some(dir.path().join("Data").join("modvdf"))
        );
        assert_eq!(
            resolve_ignore_case(dir.path(), Path::new("data/missing.vdf")),
            None
        );
    }

    #[test]
    fn test_rejects_escapes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Data")).unwrap();

        assert_eq!(resolve_ignore_case(dir.path(), Path::new("..")), None);
        assert_eq!(resolve_ignore_case(dir.path(), Path::new("Data/..")), None);
        assert_eq!(resolve_ignore_case(dir.path(), Path::new("")), None);
        assert_eq!(resolve_ignore_case(dir.path(), Path::new(".")), None);
    }

    #[test]
    fn test_prefers_exact_spelling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("textures.vdf"), b"a").unwrap();
        std::fs::write(dir.path().join("Textures.vdf"), b"b").unwrap();

        let resolved = resolve_ignore_case(dir.path(), Path::new("Textures.vdf")).unwrap();
        assert_eq!(resolved.file_name().unwrap(), "Textures.vdf");
    }

    #[test]
    fn test_list_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.vdf"), b"").unwrap();
        std::fs::write(dir.path().join("A.vdf"), b"").unwrap();
        std::fs::create_dir(dir.path().join("c.vdf")).unwrap();

        assert_eq!(list_files(dir.path()).unwrap(), vec!["A.vdf", "b.vdf"]);
    }
}
