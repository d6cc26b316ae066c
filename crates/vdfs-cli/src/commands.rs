//! Subcommand handlers operating on the global file system

use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use vdfs::{FileIndex, VdfPackage, global, source};
use vdfs_formats::vdf::VdfVariant;

/// Load the named packages, or every discovered one, and finalize
fn load(packages: &[String]) -> Result<Arc<FileIndex>> {
    {
        let mut vfs = global::write()?;
        if packages.is_empty() {
            let loaded = vfs.load_all_packages()?;
            info!("Loaded {loaded} package(s)");
        } else {
            for name in packages {
                if !vfs.load_package(name)? {
                    warn!("Skipping {name}");
                }
            }
        }

        if !vfs.has_found_game_files() {
            let dir = vfs.package_directory().unwrap_or_default();
            bail!("no packages could be loaded from {}", dir.display());
        }
    }
    Ok(global::file_index()?)
}

pub fn packages(requested: &[String]) -> Result<()> {
    let vfs = global::read()?;
    let names = if requested.is_empty() {
        vfs.available_packages()?
    } else {
        requested.to_vec()
    };

    let mut out = std::io::stdout().lock();
    for name in names {
        let status = if vfs.is_package_available(&name)? {
            "available"
        } else {
            "missing"
        };
        writeln!(out, "{name}\t{status}")?;
    }
    Ok(())
}

pub fn ls(packages: &[String], extension: Option<&str>) -> Result<()> {
    let index = load(packages)?;
    let names = match extension {
        Some(ext) => index.files_with_extension(ext),
        None => index.file_names(),
    };

    let mut out = std::io::stdout().lock();
    for name in names {
        let Some(file) = index.lookup(name) else {
            continue;
        };
        writeln!(
            out,
            "{:>10}  {}  ({})",
            file.entry.size,
            name,
            file.source.name()
        )?;
    }
    Ok(())
}

pub fn cat(packages: &[String], file: &str, output: Option<&Path>) -> Result<()> {
    let index = load(packages)?;
    let Some(bytes) = index
        .try_read_bytes(file)
        .with_context(|| format!("failed to read {file}"))?
    else {
        bail!("{file} not found");
    };

    match output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}

pub fn info(package: &str) -> Result<()> {
    let dir = global::read()?
        .package_directory()
        .context("no game directory configured")?;
    let Some(path) = source::locate(&dir, package) else {
        bail!("package {package} not found in {}", dir.display());
    };
    if path.is_dir() {
        bail!("{} is a directory, not a package", path.display());
    }

    let (vdf, files) = VdfPackage::open(&path, package)?;
    let header = vdf.header();
    let variant = match vdf.variant() {
        Some(VdfVariant::Gothic1) => "Gothic 1",
        Some(VdfVariant::Gothic2) => "Gothic 2",
        None => "unknown",
    };
    let total: u64 = files.iter().map(|f| f.size).sum();

    let mut out = std::io::stdout().lock();
    writeln!(out, "Package:     {}", path.display())?;
    writeln!(out, "Format:      {variant}")?;
    writeln!(out, "Comment:     {}", header.comment_text())?;
    writeln!(out, "Timestamp:   {}", vdf.timestamp())?;
    writeln!(out, "Entries:     {}", header.entry_count)?;
    writeln!(out, "Files:       {}", header.file_count)?;
    writeln!(
        out,
        "Directories: {}",
        header.entry_count.saturating_sub(header.file_count)
    )?;
    writeln!(out, "Data size:   {total} bytes")?;
    writeln!(out, "Package size: {} bytes", vdf.len())?;
    Ok(())
}
