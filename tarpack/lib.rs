//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! tarpack - pack directory trees into ustar archives and unpack them
//!
//! Archives use 512-byte ustar headers with GNU `././@LongLink` records
//! for names longer than 100 bytes, and end with twelve zero blocks.

pub mod archive;
pub mod error;
pub mod file_handle;
pub mod header;
pub mod modes;
pub mod owner;

pub use error::{PackError, PackResult};
pub use file_handle::{OpenMode, ScopedFile};
pub use header::{checksum, EntryType, TarHeader};
pub use modes::{
    extract_one, format_entry, list_archive, pack, pack_with_options, unpack, PackOptions,
};
pub use owner::{NoOwners, OwnerLookup, SystemOwners};

/// Text domain used for message translation
pub const PROJECT_NAME: &str = "posixutils-rs";
