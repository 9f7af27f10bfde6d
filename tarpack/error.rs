//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io;
use std::path::{Path, PathBuf};

/// Error type for archive operations
#[derive(thiserror::Error, Debug)]
pub enum PackError {
    /// Path exists but may not be read or written
    #[error("Permission denied: {0}")]
    Permission(String),
    /// Source file or archive is missing
    #[error("File {} does not exist", .0.display())]
    NotFound(PathBuf),
    /// Handle used before `open` or after `close`
    #[error("File {} not opened", .0.display())]
    NotOpened(PathBuf),
    /// Unrecognized fopen-style mode string
    #[error("Invalid open mode: {0:?}")]
    InvalidMode(String),
    /// Short write, failed read, failed mkdir/symlink
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    /// Header block that failed checksum or field validation
    #[error("Corrupt header record: {0}")]
    CorruptRecord(String),
}

impl PackError {
    /// Wrap an I/O error with a message naming the failed action
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        PackError::Io {
            context: context.into(),
            source,
        }
    }

    /// Attach the path that an I/O error refers to
    pub fn io_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("{} {}", action, path.display()), source)
    }

    /// Corrupt records are skipped by the unpacker instead of aborting it
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, PackError::CorruptRecord(_))
    }
}

impl From<io::Error> for PackError {
    fn from(err: io::Error) -> Self {
        PackError::io("I/O error", err)
    }
}

/// Result type for archive operations
pub type PackResult<T> = Result<T, PackError>;
