//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Mode-checked file handle that always releases its descriptor
//!
//! A `ScopedFile` is created unopened, validated and opened with
//! [`ScopedFile::open`], and closed either explicitly or when it goes
//! out of scope.  Permission bits passed to `open` are applied to the
//! path when a writable handle is closed.

use crate::error::{PackError, PackResult};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default length of a single `read` call
pub const DEFAULT_READ_LEN: usize = 4096;

/// Default permission bits applied when a written file is closed
pub const DEFAULT_PERMISSIONS: u32 = 0o666;

/// fopen-style access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `r`: read an existing file
    Read,
    /// `r+`: read and write an existing file
    ReadUpdate,
    /// `w`: truncate or create, write only
    Write,
    /// `w+`: truncate or create, read and write
    WriteUpdate,
    /// `a`: append, creating if missing
    Append,
    /// `a+`: append and read
    AppendUpdate,
    /// `x`: create a new file, failing if it exists
    CreateNew,
    /// `c`: create if missing, never truncate
    Create,
}

impl OpenMode {
    /// Every mode except plain `r` may modify the file
    pub fn is_writable(self) -> bool {
        self != OpenMode::Read
    }

    /// Only plain `r` is validated as a read: the file must already exist
    pub fn is_readable(self) -> bool {
        !self.is_writable()
    }

    fn options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self {
            OpenMode::Read => opts.read(true),
            OpenMode::ReadUpdate => opts.read(true).write(true),
            OpenMode::Write => opts.write(true).create(true).truncate(true),
            OpenMode::WriteUpdate => opts.read(true).write(true).create(true).truncate(true),
            OpenMode::Append => opts.append(true).create(true),
            OpenMode::AppendUpdate => opts.read(true).append(true).create(true),
            OpenMode::CreateNew => opts.write(true).create_new(true),
            OpenMode::Create => opts.write(true).create(true),
        };
        opts
    }
}

impl FromStr for OpenMode {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // binary/text flags carry no meaning on POSIX systems
        let base: String = s.chars().filter(|c| *c != 'b' && *c != 't').collect();
        match base.as_str() {
            "r" => Ok(OpenMode::Read),
            "r+" => Ok(OpenMode::ReadUpdate),
            "w" => Ok(OpenMode::Write),
            "w+" => Ok(OpenMode::WriteUpdate),
            "a" => Ok(OpenMode::Append),
            "a+" => Ok(OpenMode::AppendUpdate),
            "x" | "x+" => Ok(OpenMode::CreateNew),
            "c" | "c+" => Ok(OpenMode::Create),
            _ => Err(PackError::InvalidMode(s.to_string())),
        }
    }
}

/// File handle with open-mode validation and guaranteed release
#[derive(Debug)]
pub struct ScopedFile {
    path: PathBuf,
    file: Option<File>,
    writable: bool,
    permissions: u32,
    at_eof: bool,
}

impl ScopedFile {
    /// Create an unopened handle for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ScopedFile {
            path: path.into(),
            file: None,
            writable: false,
            permissions: DEFAULT_PERMISSIONS,
            at_eof: false,
        }
    }

    /// Create and open a handle in one step
    pub fn open_path(
        path: impl Into<PathBuf>,
        mode: OpenMode,
        permissions: u32,
    ) -> PackResult<Self> {
        let mut handle = ScopedFile::new(path);
        handle.open(mode, permissions)?;
        Ok(handle)
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Validate access for `mode` and acquire the descriptor
    pub fn open(&mut self, mode: OpenMode, permissions: u32) -> PackResult<()> {
        if mode.is_writable() {
            let location = match self.path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            if !is_writable(location) {
                return Err(PackError::Permission(format!(
                    "Permission denied to write to {}",
                    location.display()
                )));
            }
            if self.path.is_file() && !is_writable(&self.path) {
                return Err(PackError::Permission(format!(
                    "Can't open file {} for writing",
                    self.path.display()
                )));
            }
        } else {
            if !self.path.is_file() {
                return Err(PackError::NotFound(self.path.clone()));
            }
            if !is_readable(&self.path) {
                return Err(PackError::Permission(format!(
                    "Permission denied to read file {}",
                    self.path.display()
                )));
            }
        }

        let file = mode.options().open(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PackError::NotFound(self.path.clone())
            } else {
                PackError::io_at("Failed to open file", &self.path, e)
            }
        })?;

        self.file = Some(file);
        self.writable = mode.is_writable();
        self.permissions = permissions;
        self.at_eof = false;
        Ok(())
    }

    /// Write all of `data`; a short or rejected write is an error
    pub fn write(&mut self, data: &[u8]) -> PackResult<()> {
        let ScopedFile { path, file, .. } = self;
        let file = file
            .as_mut()
            .ok_or_else(|| PackError::NotOpened(path.clone()))?;
        file.write_all(data)
            .map_err(|e| PackError::io_at("Failed to write data to", path, e))
    }

    /// Read up to `max_len` bytes
    ///
    /// Fewer bytes are returned only at end of stream, which also sets
    /// the [`eof`](Self::eof) indicator.  A zero `max_len` performs no I/O.
    pub fn read(&mut self, max_len: usize) -> PackResult<Vec<u8>> {
        let ScopedFile {
            path, file, at_eof, ..
        } = self;
        let file = file
            .as_mut()
            .ok_or_else(|| PackError::NotOpened(path.clone()))?;

        let mut buf = vec![0u8; max_len];
        let mut filled = 0;
        while filled < max_len {
            match file.read(&mut buf[filled..]) {
                Ok(0) => {
                    *at_eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PackError::io_at("Failed to read data from", path, e)),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// True once a read has hit the end of the stream
    pub fn eof(&self) -> PackResult<bool> {
        if self.file.is_none() {
            return Err(PackError::NotOpened(self.path.clone()));
        }
        Ok(self.at_eof)
    }

    /// Release the descriptor and apply the retained permission bits
    ///
    /// Closing a handle that holds no descriptor is a no-op.
    pub fn close(&mut self) -> PackResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };
        drop(file);

        if self.writable {
            if let Err(e) = apply_permissions(&self.path, self.permissions) {
                log::debug!("chmod {:o} {}: {}", self.permissions, self.path.display(), e);
            }
        }
        Ok(())
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            log::trace!("released unclosed handle for {}", self.path.display());
        }
    }
}

#[cfg(unix)]
fn access_ok(path: &Path, mode: libc::c_int) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let path_cstr = match CString::new(path.as_os_str().as_bytes()) {
        Ok(s) => s,
        Err(_) => return false,
    };
    unsafe { libc::access(path_cstr.as_ptr(), mode) == 0 }
}

#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
    access_ok(path, libc::W_OK)
}

#[cfg(unix)]
fn is_readable(path: &Path) -> bool {
    access_ok(path, libc::R_OK)
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_readable(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}

#[cfg(unix)]
fn apply_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    std::fs::set_permissions(path, perms)
}
