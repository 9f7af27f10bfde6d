//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Best-effort user/group name lookup for archive headers

/// Resolves numeric owner ids to names
///
/// A lookup that cannot resolve an id returns `None`; the header then
/// carries an empty `uname`/`gname`.
pub trait OwnerLookup {
    fn user_name(&self, uid: u32) -> Option<String>;
    fn group_name(&self, gid: u32) -> Option<String>;
}

/// Lookup through the system password and group databases
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOwners;

/// Lookup that never resolves anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOwners;

impl OwnerLookup for NoOwners {
    fn user_name(&self, _uid: u32) -> Option<String> {
        None
    }

    fn group_name(&self, _gid: u32) -> Option<String> {
        None
    }
}

#[cfg(unix)]
impl OwnerLookup for SystemOwners {
    fn user_name(&self, uid: u32) -> Option<String> {
        unsafe {
            let pw = libc::getpwuid(uid);
            if pw.is_null() {
                return None;
            }
            let name = std::ffi::CStr::from_ptr((*pw).pw_name);
            name.to_str().ok().map(|s| s.to_string())
        }
    }

    fn group_name(&self, gid: u32) -> Option<String> {
        unsafe {
            let gr = libc::getgrgid(gid);
            if gr.is_null() {
                return None;
            }
            let name = std::ffi::CStr::from_ptr((*gr).gr_name);
            name.to_str().ok().map(|s| s.to_string())
        }
    }
}

#[cfg(not(unix))]
impl OwnerLookup for SystemOwners {
    fn user_name(&self, _uid: u32) -> Option<String> {
        None
    }

    fn group_name(&self, _gid: u32) -> Option<String> {
        None
    }
}
