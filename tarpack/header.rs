//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! ustar header codec with the GNU long-name extension
//!
//! Header format (512 bytes):
//! - name:     100 bytes (offset 0)
//! - mode:       8 bytes (offset 100)
//! - uid:        8 bytes (offset 108)
//! - gid:        8 bytes (offset 116)
//! - size:      12 bytes (offset 124)
//! - mtime:     12 bytes (offset 136)
//! - chksum:     8 bytes (offset 148)
//! - typeflag:   1 byte  (offset 156)
//! - linkname: 100 bytes (offset 157)
//! - magic:      6 bytes (offset 257) "ustar "
//! - version:    2 bytes (offset 263) " \0"
//! - uname:     32 bytes (offset 265)
//! - gname:     32 bytes (offset 297)
//! - devmajor:   8 bytes (offset 329)
//! - devminor:   8 bytes (offset 337)
//! - prefix:   155 bytes (offset 345)
//! - padding:   12 bytes (offset 500)
//!
//! devmajor, devminor and prefix are always written empty.  Names longer
//! than 100 bytes are carried by a preceding `L` record named
//! `././@LongLink` whose data block holds the full name; symlink targets
//! longer than 100 bytes likewise by a `K` record.

use crate::error::{PackError, PackResult};
use crate::owner::OwnerLookup;
use std::fs::{self, Metadata};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;
use std::path::Path;

pub const BLOCK_SIZE: usize = 512;
pub const NAME_LEN: usize = 100;
const LINKNAME_LEN: usize = 100;
const UNAME_LEN: usize = 32;
const GNAME_LEN: usize = 32;

/// Name of the synthetic record announcing a long name
pub const LONG_LINK_NAME: &str = "././@LongLink";

/// GNU-style magic; the version field that follows is `" \0"`
pub const MAGIC: &str = "ustar ";
const VERSION: &[u8; 2] = b" \0";

// Header field offsets
const NAME_OFF: usize = 0;
const MODE_OFF: usize = 100;
const UID_OFF: usize = 108;
const GID_OFF: usize = 116;
const SIZE_OFF: usize = 124;
const MTIME_OFF: usize = 136;
const CHKSUM_OFF: usize = 148;
const TYPEFLAG_OFF: usize = 156;
const LINKNAME_OFF: usize = 157;
const MAGIC_OFF: usize = 257;
const VERSION_OFF: usize = 263;
const UNAME_OFF: usize = 265;
const GNAME_OFF: usize = 297;

// Type flags
const REGTYPE: u8 = b'0';
const AREGTYPE: u8 = b'\0';
const SYMTYPE: u8 = b'2';
const DIRTYPE: u8 = b'5';
const LONGNAMETYPE: u8 = b'L';
const LONGLINKTYPE: u8 = b'K';

/// Largest value representable by the 11 octal digits of size/mtime
const MAX_OCTAL_11: u64 = 0o77777777777;

/// Largest value representable by the 7 octal digits of uid/gid
const MAX_OCTAL_7: u64 = 0o7777777;

/// Type of archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryType {
    #[default]
    Regular,
    Symlink,
    Directory,
    /// GNU long-name continuation
    LongName,
    /// GNU long-linkname continuation
    LongLink,
    /// Any other typeflag (hard links, devices, ...), skipped on extraction
    Other(u8),
}

impl EntryType {
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            REGTYPE | AREGTYPE => EntryType::Regular,
            SYMTYPE => EntryType::Symlink,
            DIRTYPE => EntryType::Directory,
            LONGNAMETYPE => EntryType::LongName,
            LONGLINKTYPE => EntryType::LongLink,
            other => EntryType::Other(other),
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            EntryType::Regular => REGTYPE,
            EntryType::Symlink => SYMTYPE,
            EntryType::Directory => DIRTYPE,
            EntryType::LongName => LONGNAMETYPE,
            EntryType::LongLink => LONGLINKTYPE,
            EntryType::Other(flag) => flag,
        }
    }
}

/// One decoded or to-be-encoded header record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    pub name: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// Length of the data that follows; always 0 for directories
    pub size: u64,
    pub mtime: u64,
    /// Checksum read from the record, or computed by the last `to_block`
    pub checksum: u32,
    pub entry_type: EntryType,
    pub linkname: String,
    pub magic: String,
    pub uname: String,
    pub gname: String,
}

impl Default for TarHeader {
    fn default() -> Self {
        TarHeader {
            name: String::new(),
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            checksum: 0,
            entry_type: EntryType::Regular,
            linkname: String::new(),
            magic: MAGIC.to_string(),
            uname: String::new(),
            gname: String::new(),
        }
    }
}

impl TarHeader {
    pub fn new(name: impl Into<String>, entry_type: EntryType) -> Self {
        TarHeader {
            name: name.into(),
            entry_type,
            ..Default::default()
        }
    }

    /// Synthetic record announcing a `name_len`-byte name in its data block
    pub fn long_name(name_len: u64) -> Self {
        TarHeader {
            size: name_len,
            ..TarHeader::new(LONG_LINK_NAME, EntryType::LongName)
        }
    }

    /// Synthetic record announcing a `target_len`-byte symlink target
    pub fn long_link(target_len: u64) -> Self {
        TarHeader {
            size: target_len,
            ..TarHeader::new(LONG_LINK_NAME, EntryType::LongLink)
        }
    }

    /// True for the record that carries the next entry's real name
    pub fn is_long_name(&self) -> bool {
        self.entry_type == EntryType::LongName && self.name == LONG_LINK_NAME
    }

    /// True for the record that carries the next entry's link target
    pub fn is_long_link(&self) -> bool {
        self.entry_type == EntryType::LongLink && self.name == LONG_LINK_NAME
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Build a header for `path` from its (unfollowed) metadata
    ///
    /// Symlinks take precedence over directories, which take precedence
    /// over everything else.  Only regular files carry a data size.
    pub fn from_metadata(
        name: String,
        path: &Path,
        metadata: &Metadata,
        owners: &dyn OwnerLookup,
    ) -> PackResult<Self> {
        let entry_type = if metadata.file_type().is_symlink() {
            EntryType::Symlink
        } else if metadata.is_dir() {
            EntryType::Directory
        } else {
            EntryType::Regular
        };

        let mut header = TarHeader::new(name, entry_type);

        #[cfg(unix)]
        {
            header.mode = metadata.mode() & 0o7777;
            header.uid = metadata.uid();
            header.gid = metadata.gid();
            header.mtime = metadata.mtime().max(0) as u64;
        }

        #[cfg(not(unix))]
        {
            header.mode = if metadata.permissions().readonly() {
                0o444
            } else {
                0o644
            };
            header.mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
        }

        for (id, field) in [(header.uid, "uid"), (header.gid, "gid")] {
            if id as u64 > MAX_OCTAL_7 {
                return Err(PackError::io_at(
                    "Owner id too large for ustar header:",
                    path,
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{} {} exceeds {:o}", field, id, MAX_OCTAL_7),
                    ),
                ));
            }
        }

        if metadata.is_file() {
            header.size = metadata.len();
            if header.size > MAX_OCTAL_11 {
                return Err(PackError::io_at(
                    "File too large for ustar header:",
                    path,
                    io::Error::new(io::ErrorKind::InvalidInput, "size exceeds 8 GiB"),
                ));
            }
        }

        if entry_type == EntryType::Symlink {
            let target =
                fs::read_link(path).map_err(|e| PackError::io_at("Failed to read link", path, e))?;
            header.linkname = target.to_string_lossy().into_owned();
        }

        header.uname = owners.user_name(header.uid).unwrap_or_default();
        header.gname = owners.group_name(header.gid).unwrap_or_default();

        Ok(header)
    }

    /// Header for the filesystem entry at `path`, named relative to `base`
    pub fn for_path(path: &Path, base: &Path, owners: &dyn OwnerLookup) -> PackResult<Self> {
        let metadata =
            fs::symlink_metadata(path).map_err(|e| PackError::io_at("Failed to stat", path, e))?;
        let name = entry_name(path, base, metadata.is_dir());
        TarHeader::from_metadata(name, path, &metadata, owners)
    }

    /// Encode `path` as archive bytes: a long-name record plus payload
    /// when the relative name exceeds 100 bytes, then the entry's own header
    pub fn encode_entry(path: &Path, base: &Path, owners: &dyn OwnerLookup) -> PackResult<Vec<u8>> {
        Ok(TarHeader::for_path(path, base, owners)?.encode())
    }

    /// Encode this header, prefixed by long-linkname and long-name
    /// records when the target or the name overflow their fields
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BLOCK_SIZE * 3);
        let synthetic = self.is_long_name() || self.is_long_link();
        if self.linkname.len() > LINKNAME_LEN && !synthetic {
            let target = self.linkname.as_bytes();
            push_long_record(&mut out, TarHeader::long_link(target.len() as u64), target);
        }
        if self.name.len() > NAME_LEN && !synthetic {
            let name = self.name.as_bytes();
            push_long_record(&mut out, TarHeader::long_name(name.len() as u64), name);
        }
        out.extend_from_slice(&self.to_block());
        out
    }

    /// Serialize into a single 512-byte record, checksum last
    ///
    /// A name longer than the field is truncated; callers that need the
    /// full name use [`encode`](Self::encode).
    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];

        write_string(&mut block[NAME_OFF..], &self.name, NAME_LEN);
        write_octal(&mut block[MODE_OFF..], (self.mode & 0o7777) as u64, 6);
        write_octal(&mut block[UID_OFF..], self.uid as u64, 7);
        write_octal(&mut block[GID_OFF..], self.gid as u64, 7);
        write_octal(&mut block[SIZE_OFF..], self.size, 11);
        write_octal(&mut block[MTIME_OFF..], self.mtime, 11);
        block[TYPEFLAG_OFF] = self.entry_type.flag();
        write_string(&mut block[LINKNAME_OFF..], &self.linkname, LINKNAME_LEN);
        block[MAGIC_OFF..MAGIC_OFF + 6].copy_from_slice(MAGIC.as_bytes());
        block[VERSION_OFF..VERSION_OFF + 2].copy_from_slice(VERSION);
        write_string(&mut block[UNAME_OFF..], &self.uname, UNAME_LEN);
        write_string(&mut block[GNAME_OFF..], &self.gname, GNAME_LEN);

        // six digits, NUL, space
        let sum = checksum(&block);
        write_octal(&mut block[CHKSUM_OFF..], sum as u64, 6);
        block[CHKSUM_OFF + 7] = b' ';

        block
    }

    /// Parse one record
    ///
    /// Short input, a checksum mismatch, or an unparsable numeric field
    /// yields [`PackError::CorruptRecord`].
    pub fn decode(block: &[u8]) -> PackResult<Self> {
        if block.len() < BLOCK_SIZE {
            return Err(PackError::CorruptRecord(format!(
                "short header record ({} bytes)",
                block.len()
            )));
        }
        let block = &block[..BLOCK_SIZE];

        let stored = parse_octal(&block[CHKSUM_OFF..CHKSUM_OFF + 8])? as u32;
        let computed = checksum(block);
        if stored != computed {
            return Err(PackError::CorruptRecord(format!(
                "checksum mismatch (stored {:o}, computed {:o})",
                stored, computed
            )));
        }

        let entry_type = EntryType::from_flag(block[TYPEFLAG_OFF]);
        let size = match entry_type {
            EntryType::Directory => 0,
            _ => parse_octal(&block[SIZE_OFF..SIZE_OFF + 12])?,
        };

        Ok(TarHeader {
            name: parse_string(&block[NAME_OFF..NAME_OFF + NAME_LEN]),
            mode: parse_octal(&block[MODE_OFF..MODE_OFF + 8])? as u32,
            uid: parse_octal(&block[UID_OFF..UID_OFF + 8])? as u32,
            gid: parse_octal(&block[GID_OFF..GID_OFF + 8])? as u32,
            size,
            mtime: parse_octal(&block[MTIME_OFF..MTIME_OFF + 12])?,
            checksum: stored,
            entry_type,
            linkname: parse_string(&block[LINKNAME_OFF..LINKNAME_OFF + LINKNAME_LEN]),
            magic: String::from_utf8_lossy(&block[MAGIC_OFF..MAGIC_OFF + 6]).into_owned(),
            uname: parse_string(&block[UNAME_OFF..UNAME_OFF + UNAME_LEN]),
            gname: parse_string(&block[GNAME_OFF..GNAME_OFF + GNAME_LEN]),
        })
    }
}

/// Append a synthetic record followed by its block-padded payload
fn push_long_record(out: &mut Vec<u8>, record: TarHeader, payload: &[u8]) {
    out.extend_from_slice(&record.to_block());
    out.extend_from_slice(payload);
    out.resize(out.len() + padding_needed(payload.len() as u64), 0);
}

/// Archive name of `path` relative to `base`, `/`-separated, with a
/// trailing `/` for directories
pub fn entry_name(path: &Path, base: &Path, is_dir: bool) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    let mut name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if is_dir && !name.ends_with('/') {
        name.push('/');
    }
    name
}

/// Sum of all header bytes with the checksum field read as spaces
pub fn checksum(block: &[u8]) -> u32 {
    block
        .iter()
        .take(BLOCK_SIZE)
        .enumerate()
        .map(|(i, &byte)| {
            if (CHKSUM_OFF..CHKSUM_OFF + 8).contains(&i) {
                b' ' as u32
            } else {
                byte as u32
            }
        })
        .sum()
}

/// Check if a block is all zeros
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Parse a NUL-terminated or space-padded string
pub(crate) fn parse_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end])
        .trim_end()
        .to_string()
}

/// Parse an octal number, tolerating NUL/space padding on either side
fn parse_octal(bytes: &[u8]) -> PackResult<u64> {
    let s = String::from_utf8_lossy(bytes);
    let s = s.trim_matches(|c: char| c == '\0' || c == ' ');
    let s = s.split('\0').next().unwrap_or("");
    if s.is_empty() {
        return Ok(0);
    }
    if s.starts_with('+') || s.starts_with('-') {
        return Err(PackError::CorruptRecord(format!("invalid octal: {}", s)));
    }
    u64::from_str_radix(s, 8).map_err(|_| PackError::CorruptRecord(format!("invalid octal: {}", s)))
}

/// Copy a string into a field, truncating to `max_len`
fn write_string(buf: &mut [u8], s: &str, max_len: usize) {
    let bytes = s.as_bytes();
    let len = std::cmp::min(bytes.len(), max_len);
    buf[..len].copy_from_slice(&bytes[..len]);
}

/// Write `digits` zero-padded octal digits followed by a NUL
///
/// Values too wide for the field saturate to all sevens.
fn write_octal(buf: &mut [u8], val: u64, digits: usize) {
    let max = 8u64.checked_pow(digits as u32).map_or(u64::MAX, |m| m - 1);
    let s = format!("{:0width$o}", val.min(max), width = digits);
    buf[..digits].copy_from_slice(s.as_bytes());
    buf[digits] = 0;
}

/// Round up to next block boundary
pub fn round_up_block(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64
}

/// Calculate padding needed to reach block boundary
pub fn padding_needed(bytes_written: u64) -> usize {
    let remainder = (bytes_written % BLOCK_SIZE as u64) as usize;
    if remainder == 0 {
        0
    } else {
        BLOCK_SIZE - remainder
    }
}
