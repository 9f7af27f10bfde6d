//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! tarpack operation implementations

pub mod list;
pub mod pack;
pub mod unpack;

pub use list::{format_entry, list_archive};
pub use pack::{pack, pack_with_options, PackOptions};
pub use unpack::{extract_one, unpack};
