//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! List mode implementation - list archive contents

use crate::archive::TarReader;
use crate::error::PackResult;
use crate::file_handle::{OpenMode, ScopedFile, DEFAULT_PERMISSIONS};
use crate::header::{EntryType, TarHeader};
use chrono::{DateTime, Local};
use std::path::Path;

/// Read every intact header of the archive at `source`, in archive order
pub fn list_archive(source: &Path) -> PackResult<Vec<TarHeader>> {
    let input = ScopedFile::open_path(source, OpenMode::Read, DEFAULT_PERMISSIONS)?;
    let mut reader = TarReader::new(input);
    let mut entries = Vec::new();

    while !reader.is_eof()? {
        match reader.read_header() {
            Ok(Some(header)) => {
                reader.skip_data(header.size)?;
                entries.push(header);
            }
            Ok(None) => {}
            Err(e) if e.is_corrupt_record() => {
                log::warn!("{}: skipping record: {}", source.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    reader.into_inner().close()?;
    Ok(entries)
}

/// One listing line: the name, or an `ls -l` style line when `verbose`
pub fn format_entry(header: &TarHeader, verbose: bool) -> String {
    if !verbose {
        return header.name.clone();
    }

    let mut line = format!(
        "{} {:>8} {:>8} {:>8} {} {}",
        format_mode(header),
        format_owner(&header.uname, header.uid),
        format_owner(&header.gname, header.gid),
        header.size,
        format_mtime(header.mtime),
        header.name
    );
    if header.entry_type == EntryType::Symlink {
        line.push_str(" -> ");
        line.push_str(&header.linkname);
    }
    line
}

/// Format mode string like "drwxr-xr-x"
fn format_mode(header: &TarHeader) -> String {
    let mode = header.mode;
    let mut s = String::with_capacity(10);

    s.push(match header.entry_type {
        EntryType::Directory => 'd',
        EntryType::Symlink => 'l',
        EntryType::Regular => '-',
        EntryType::LongName | EntryType::LongLink | EntryType::Other(_) => '?',
    });

    s.push(if mode & 0o400 != 0 { 'r' } else { '-' });
    s.push(if mode & 0o200 != 0 { 'w' } else { '-' });
    s.push(format_execute_bit(mode, 0o100, 0o4000));

    s.push(if mode & 0o040 != 0 { 'r' } else { '-' });
    s.push(if mode & 0o020 != 0 { 'w' } else { '-' });
    s.push(format_execute_bit(mode, 0o010, 0o2000));

    s.push(if mode & 0o004 != 0 { 'r' } else { '-' });
    s.push(if mode & 0o002 != 0 { 'w' } else { '-' });
    s.push(format_execute_bit(mode, 0o001, 0o1000));

    s
}

/// Execute bit with setuid/setgid/sticky handling
fn format_execute_bit(mode: u32, exec_bit: u32, special_bit: u32) -> char {
    let sticky = special_bit == 0o1000;
    match (mode & exec_bit != 0, mode & special_bit != 0) {
        (true, true) if sticky => 't',
        (true, true) => 's',
        (false, true) if sticky => 'T',
        (false, true) => 'S',
        (true, false) => 'x',
        (false, false) => '-',
    }
}

/// Name if recorded, else the numeric id
fn format_owner(name: &str, id: u32) -> String {
    if name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

fn format_mtime(mtime: u64) -> String {
    match DateTime::from_timestamp(mtime as i64, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => mtime.to_string(),
    }
}
