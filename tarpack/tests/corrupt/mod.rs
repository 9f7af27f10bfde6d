//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Damaged archives: corrupt records are skipped, the rest is extracted

use crate::common::*;
use std::fs;
use tarpack::header::{checksum, BLOCK_SIZE};
use tarpack::{pack, unpack, TarHeader};
use tempfile::TempDir;

/// Byte offset of the header whose name is `name`
fn header_offset(bytes: &[u8], name: &str) -> usize {
    bytes
        .chunks(BLOCK_SIZE)
        .position(|block| {
            TarHeader::decode(block)
                .map(|h| h.name == name)
                .unwrap_or(false)
        })
        .map(|i| i * BLOCK_SIZE)
        .expect("header not found")
}

#[test]
fn test_bad_checksum_entry_is_skipped() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");
    pack(&src, &archive, true).unwrap();

    let mut bytes = fs::read(&archive).unwrap();
    let off = header_offset(&bytes, "empty.txt");
    assert_eq!(
        checksum(&bytes[off..off + BLOCK_SIZE]),
        TarHeader::decode(&bytes[off..off + BLOCK_SIZE])
            .unwrap()
            .checksum
    );
    // a name byte changes, the stored checksum does not
    bytes[off] = b'E';
    fs::write(&archive, &bytes).unwrap();

    let out = temp.path().join("out");
    let created = unpack(&archive, &out).unwrap();

    assert!(!out.join("empty.txt").exists());
    assert!(!out.join("Empty.txt").exists());
    assert!(created.contains(&out.join("file.txt")));
    assert_eq!(
        fs::read_to_string(out.join("subdir/nested.txt")).unwrap(),
        "Nested file content\n"
    );
}

#[test]
fn test_trailing_garbage_is_ignored() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");
    pack(&src, &archive, true).unwrap();

    let mut bytes = fs::read(&archive).unwrap();
    bytes.extend_from_slice(b"not a header");
    fs::write(&archive, &bytes).unwrap();

    let out = temp.path().join("out");
    unpack(&archive, &out).unwrap();
    verify_files_match(&src, &out);
}

#[test]
fn test_cli_unpack_damaged_archive_succeeds() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("junk.tar");
    fs::write(&archive, vec![0x55u8; BLOCK_SIZE * 3]).unwrap();
    let out = temp.path().join("out");

    let output = run_tarpack(&[
        "unpack",
        "-v",
        archive.to_str().unwrap(),
        out.to_str().unwrap(),
    ]);
    assert_success(&output, "tarpack unpack");
    assert!(stdout_str(&output).is_empty());
}
