//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Unpack mode implementation - materialize archive entries on disk

use crate::archive::{ByteSource, TarReader};
use crate::error::{PackError, PackResult};
use crate::file_handle::{OpenMode, ScopedFile, DEFAULT_PERMISSIONS};
use crate::header::{EntryType, TarHeader};
use std::fs;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Extract every entry of the archive at `source` below `destination`
///
/// Returns the created paths in archive order; directories carry a
/// trailing separator.  Records that fail their checksum are skipped,
/// so entries of a damaged archive may be silently missing.
pub fn unpack(source: &Path, destination: &Path) -> PackResult<Vec<PathBuf>> {
    let input = ScopedFile::open_path(source, OpenMode::Read, DEFAULT_PERMISSIONS)?;
    let mut reader = TarReader::new(input);
    let mut created = Vec::new();

    while !reader.is_eof()? {
        let Some(header) = next_header(&mut reader, source)? else {
            continue;
        };

        let relative = sanitize_path(&header.name);
        if relative.as_os_str().is_empty() {
            reader.skip_data(header.size)?;
            continue;
        }

        if let Some(link) = symlinked_parent(destination, &relative) {
            log::warn!(
                "{}: parent {} is a symlink, skipping",
                header.name,
                link.display()
            );
            reader.skip_data(header.size)?;
            continue;
        }

        let target = destination.join(&relative);
        if let Some(path) = materialize(&mut reader, &header, &target)? {
            created.push(path);
        }
    }

    reader.into_inner().close()?;
    Ok(created)
}

/// Extract the single entry named `entry_name` into `destination`
///
/// The entry is written as `destination/<basename>`.  Returns `None`
/// when the archive holds no such entry.
pub fn extract_one(
    entry_name: &str,
    source: &Path,
    destination: &Path,
) -> PackResult<Option<PathBuf>> {
    let input = ScopedFile::open_path(source, OpenMode::Read, DEFAULT_PERMISSIONS)?;
    let mut reader = TarReader::new(input);
    let wanted = entry_name.trim_end_matches('/');
    let mut extracted = None;

    while !reader.is_eof()? {
        let Some(header) = next_header(&mut reader, source)? else {
            continue;
        };

        if header.name.trim_end_matches('/') == wanted {
            if let Some(file_name) = Path::new(wanted).file_name() {
                let target = destination.join(file_name);
                extracted = materialize(&mut reader, &header, &target)?;
                break;
            }
        }

        if !header.is_dir() {
            reader.skip_data(header.size)?;
        }
    }

    reader.into_inner().close()?;
    Ok(extracted)
}

/// Next header, with corrupt records logged and dropped
fn next_header<S: ByteSource>(
    reader: &mut TarReader<S>,
    source: &Path,
) -> PackResult<Option<TarHeader>> {
    match reader.read_header() {
        Ok(header) => Ok(header),
        Err(e) if e.is_corrupt_record() => {
            log::warn!("{}: skipping record: {}", source.display(), e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Create the filesystem object described by `header` at `target`
///
/// Consumes the entry's data from `reader`.  Returns the path to report,
/// or `None` for entry types that are skipped.
fn materialize<S: ByteSource>(
    reader: &mut TarReader<S>,
    header: &TarHeader,
    target: &Path,
) -> PackResult<Option<PathBuf>> {
    log::debug!("extract {} -> {}", header.name, target.display());

    match header.entry_type {
        EntryType::Regular => {
            create_parent_dirs(target)?;
            remove_existing(target)?;
            let mut out = ScopedFile::open_path(target, OpenMode::Write, header.mode)?;
            reader.copy_data(header.size, &mut out)?;
            out.close()?;
            Ok(Some(target.to_path_buf()))
        }
        EntryType::Directory => {
            extract_directory(target, header.mode)?;
            Ok(Some(with_trailing_separator(target)))
        }
        EntryType::Symlink => {
            create_parent_dirs(target)?;
            extract_symlink(target, &header.linkname)?;
            reader.skip_data(header.size)?;
            Ok(Some(target.to_path_buf()))
        }
        EntryType::LongName | EntryType::LongLink | EntryType::Other(_) => {
            log::warn!(
                "{}: unsupported entry type {:?}, skipping",
                header.name,
                header.entry_type
            );
            reader.skip_data(header.size)?;
            Ok(None)
        }
    }
}

/// Drop `..`, `.` and root components so entries stay below the destination
fn sanitize_path(name: &str) -> PathBuf {
    let mut result = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(c) => result.push(c),
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    result
}

/// First parent of `relative` below `destination` that is a symlink
///
/// Writing through such a parent could land outside the destination.
fn symlinked_parent(destination: &Path, relative: &Path) -> Option<PathBuf> {
    let mut current = destination.to_path_buf();
    for component in relative.parent()?.components() {
        current.push(component);
        match current.symlink_metadata() {
            Ok(meta) if meta.file_type().is_symlink() => return Some(current),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    None
}

fn with_trailing_separator(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(MAIN_SEPARATOR_STR);
    PathBuf::from(s)
}

/// Create parent directories for a path
fn create_parent_dirs(path: &Path) -> PackResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| PackError::io_at("Failed to create directory", parent, e))?;
        }
    }
    Ok(())
}

/// Remove a file or symlink that would otherwise be written through
fn remove_existing(path: &Path) -> PackResult<()> {
    match path.symlink_metadata() {
        Ok(meta) if !meta.is_dir() => {
            fs::remove_file(path).map_err(|e| PackError::io_at("Failed to replace", path, e))
        }
        _ => Ok(()),
    }
}

/// Create a directory with the archived mode if it does not exist yet
fn extract_directory(path: &Path, mode: u32) -> PackResult<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder
        .create(path)
        .map_err(|e| PackError::io_at("Failed to create directory", path, e))
}

/// Extract a symlink
fn extract_symlink(path: &Path, target: &str) -> PackResult<()> {
    remove_existing(path)?;

    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, path);

    #[cfg(windows)]
    let result = std::os::windows::fs::symlink_file(target, path)
        .or_else(|_| std::os::windows::fs::symlink_dir(target, path));

    result.map_err(|e| {
        PackError::io(
            format!(
                "Failed to create symlink {} to {}",
                path.display(),
                target
            ),
            e,
        )
    })
}
