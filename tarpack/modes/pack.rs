//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Pack mode implementation - serialize a directory tree into an archive

use crate::archive::TarWriter;
use crate::error::{PackError, PackResult};
use crate::file_handle::{OpenMode, ScopedFile, DEFAULT_PERMISSIONS, DEFAULT_READ_LEN};
use crate::header::{EntryType, TarHeader, BLOCK_SIZE};
use crate::owner::{OwnerLookup, SystemOwners};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Options for pack mode
pub struct PackOptions<'a> {
    /// Write the children of a source directory as top-level entries
    pub skip_root: bool,
    /// Print each entry name to stderr
    pub verbose: bool,
    /// Source of uname/gname header fields
    pub owners: &'a dyn OwnerLookup,
}

impl Default for PackOptions<'_> {
    fn default() -> Self {
        PackOptions {
            skip_root: false,
            verbose: false,
            owners: &SystemOwners,
        }
    }
}

/// Pack `source` into a new archive at `destination`
pub fn pack(source: &Path, destination: &Path, skip_root: bool) -> PackResult<PathBuf> {
    let options = PackOptions {
        skip_root,
        ..Default::default()
    };
    pack_with_options(source, destination, &options)
}

/// Pack `source` into a new archive at `destination`
///
/// Entries are written depth-first, each directory's children in name
/// order.  Any I/O error aborts the operation and may leave a truncated
/// archive behind.
pub fn pack_with_options(
    source: &Path,
    destination: &Path,
    options: &PackOptions,
) -> PackResult<PathBuf> {
    let source = fs::canonicalize(source).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            PackError::NotFound(source.to_path_buf())
        } else {
            PackError::io_at("Failed to resolve", source, e)
        }
    })?;

    let skip_root = options.skip_root && source.is_dir();
    let base = if skip_root {
        source.clone()
    } else {
        source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| source.clone())
    };

    let out = ScopedFile::open_path(destination, OpenMode::Write, DEFAULT_PERMISSIONS)?;
    let archive_path = fs::canonicalize(destination).ok();
    let mut writer = TarWriter::new(out);

    log::debug!(
        "packing {} into {} (base {})",
        source.display(),
        destination.display(),
        base.display()
    );

    let mut pending: Vec<(PathBuf, bool)> = vec![(source, skip_root)];
    while let Some((path, skip)) = pending.pop() {
        if archive_path.as_deref() == Some(path.as_path()) {
            log::debug!("{}: not packing the archive into itself", path.display());
            continue;
        }

        let header = TarHeader::for_path(&path, &base, options.owners)?;
        if !skip {
            write_entry(&mut writer, &path, &header, options)?;
        }

        if header.is_dir() {
            let children = list_dir(&path)?;
            pending.extend(children.into_iter().rev().map(|child| (child, false)));
        }
    }

    writer.finish()?;
    writer.into_inner().close()?;

    Ok(destination.to_path_buf())
}

/// Write one entry: header blocks, then data for non-empty regular files
fn write_entry(
    writer: &mut TarWriter<ScopedFile>,
    path: &Path,
    header: &TarHeader,
    options: &PackOptions,
) -> PackResult<()> {
    if options.verbose {
        eprintln!("{}", header.name);
    }
    log::debug!("pack {} ({} bytes)", header.name, header.size);

    writer.write_header(&header.encode())?;
    if header.entry_type == EntryType::Regular && header.size > 0 {
        copy_file_data(writer, path, header.size)?;
    }
    writer.finish_entry()
}

/// Stream exactly `size` bytes of `path` into the archive
fn copy_file_data(writer: &mut TarWriter<ScopedFile>, path: &Path, size: u64) -> PackResult<()> {
    let mut input = ScopedFile::open_path(path, OpenMode::Read, DEFAULT_PERMISSIONS)?;
    let mut remaining = size;

    while remaining > 0 && !input.eof()? {
        let want = std::cmp::min(remaining, DEFAULT_READ_LEN as u64) as usize;
        let chunk = input.read(want)?;
        writer.write_data(&chunk)?;
        remaining -= chunk.len() as u64;
    }

    if remaining > 0 {
        log::warn!(
            "{}: file shrank while packing, zero-filling {} bytes",
            path.display(),
            remaining
        );
        let zeros = [0u8; BLOCK_SIZE];
        while remaining > 0 {
            let n = std::cmp::min(remaining, BLOCK_SIZE as u64) as usize;
            writer.write_data(&zeros[..n])?;
            remaining -= n as u64;
        }
    }

    input.close()
}

/// Immediate children of `dir`, sorted by name
fn list_dir(dir: &Path) -> PackResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| PackError::io_at("Can't scan dir", dir, e))?;

    let mut children = entries
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|e| PackError::io_at("Can't scan dir", dir, e))
        })
        .collect::<PackResult<Vec<_>>>()?;
    children.sort();

    Ok(children)
}
