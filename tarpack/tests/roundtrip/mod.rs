//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Pack then unpack through the library API

use crate::common::*;
use std::fs;
use std::path::PathBuf;
use tarpack::header::BLOCK_SIZE;
use tarpack::{list_archive, pack, pack_with_options, unpack, EntryType, NoOwners, PackOptions};
use tempfile::TempDir;

#[test]
fn test_roundtrip_skip_root() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");
    let out = temp.path().join("out");

    pack(&src, &archive, true).unwrap();
    let created = unpack(&archive, &out).unwrap();

    verify_files_match(&src, &out);
    assert!(created.contains(&out.join("file.txt")));
    assert!(created.contains(&PathBuf::from(format!("{}/", out.join("subdir").display()))));
    assert!(!out.join("source").exists());
}

#[test]
fn test_roundtrip_keeps_root() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");
    let out = temp.path().join("out");

    pack(&src, &archive, false).unwrap();
    let created = unpack(&archive, &out).unwrap();

    verify_files_match(&src, &out.join("source"));
    assert_eq!(
        created.first(),
        Some(&PathBuf::from(format!("{}/", out.join("source").display())))
    );
}

#[test]
fn test_long_names_survive() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    let deep = src.join("a".repeat(60)).join("b".repeat(60));
    fs::create_dir_all(&deep).unwrap();
    let file_name = format!("{}.txt", "c".repeat(40));
    fs::write(deep.join(&file_name), b"long").unwrap();

    let archive = temp.path().join("long.tar");
    pack(&src, &archive, true).unwrap();

    let long = format!("{}/{}/{}", "a".repeat(60), "b".repeat(60), file_name);
    let names: Vec<String> = list_archive(&archive)
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert!(names.contains(&long));
    assert!(!names.iter().any(|n| n == "././@LongLink"));

    let out = temp.path().join("out");
    unpack(&archive, &out).unwrap();
    assert_eq!(fs::read(out.join(&long)).unwrap(), b"long");
}

#[test]
fn test_archive_is_block_aligned() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");

    let options = PackOptions {
        skip_root: true,
        owners: &NoOwners,
        ..Default::default()
    };
    pack_with_options(&src, &archive, &options).unwrap();

    let bytes = fs::read(&archive).unwrap();
    assert_eq!(bytes.len() % BLOCK_SIZE, 0);
    assert!(bytes[bytes.len() - 12 * BLOCK_SIZE..].iter().all(|&b| b == 0));

    for header in list_archive(&archive).unwrap() {
        assert!(header.uname.is_empty());
        if header.entry_type == EntryType::Directory || header.entry_type == EntryType::Symlink {
            assert_eq!(header.size, 0, "{}", header.name);
        }
    }
}

#[cfg(unix)]
#[test]
fn test_modes_preserved() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    fs::create_dir_all(&src).unwrap();
    let script = src.join("run.sh");
    fs::write(&script, b"#!/bin/sh\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();

    let archive = temp.path().join("modes.tar");
    pack(&src, &archive, true).unwrap();
    let out = temp.path().join("out");
    unpack(&archive, &out).unwrap();

    let mode = fs::metadata(out.join("run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[cfg(unix)]
#[test]
fn test_long_symlink_target_survives() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    fs::create_dir_all(&src).unwrap();
    let target = format!("/nonexistent/{}/{}", "t".repeat(70), "u".repeat(57));
    assert!(target.len() > 100);
    std::os::unix::fs::symlink(&target, src.join("far")).unwrap();

    let archive = temp.path().join("links.tar");
    pack(&src, &archive, true).unwrap();

    let headers = list_archive(&archive).unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].linkname, target);

    let out = temp.path().join("out");
    unpack(&archive, &out).unwrap();
    assert_eq!(fs::read_link(out.join("far")).unwrap(), PathBuf::from(&target));
}
