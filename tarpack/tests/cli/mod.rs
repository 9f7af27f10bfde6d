//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Command line front-end tests

use crate::common::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_cli_pack_and_unpack() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");
    let out = temp.path().join("out");

    let output = run_tarpack(&[
        "pack",
        "--skip-root",
        "-v",
        src.to_str().unwrap(),
        archive.to_str().unwrap(),
    ]);
    assert_success(&output, "tarpack pack");
    assert!(stderr_str(&output).contains("subdir/nested.txt"));

    let output = run_tarpack(&[
        "unpack",
        "-v",
        archive.to_str().unwrap(),
        out.to_str().unwrap(),
    ]);
    assert_success(&output, "tarpack unpack");
    assert!(stdout_str(&output).contains("nested.txt"));
    verify_files_match(&src, &out);
}

#[test]
fn test_cli_list() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");

    assert_success(
        &run_tarpack(&["pack", "-s", src.to_str().unwrap(), archive.to_str().unwrap()]),
        "tarpack pack",
    );

    let output = run_tarpack(&["list", archive.to_str().unwrap()]);
    assert_success(&output, "tarpack list");
    let listing: Vec<String> = stdout_str(&output).lines().map(String::from).collect();
    assert!(listing.contains(&"file.txt".to_string()));
    assert!(listing.contains(&"subdir/".to_string()));
    assert!(listing.contains(&"subdir/nested.txt".to_string()));

    let output = run_tarpack(&["list", "-v", archive.to_str().unwrap()]);
    assert_success(&output, "tarpack list -v");
    let verbose = stdout_str(&output);
    assert!(verbose.lines().any(|l| l.starts_with('d') && l.ends_with("subdir/")));
    #[cfg(unix)]
    assert!(verbose.contains("link.txt -> file.txt"));
}

#[test]
fn test_cli_extract_single_entry() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let archive = temp.path().join("test.tar");
    let out = temp.path().join("picked");

    assert_success(
        &run_tarpack(&["pack", "-s", src.to_str().unwrap(), archive.to_str().unwrap()]),
        "tarpack pack",
    );

    let output = run_tarpack(&[
        "extract",
        "subdir/nested.txt",
        archive.to_str().unwrap(),
        out.to_str().unwrap(),
    ]);
    assert_success(&output, "tarpack extract");
    assert!(stdout_str(&output).trim_end().ends_with("nested.txt"));
    assert_eq!(
        fs::read_to_string(out.join("nested.txt")).unwrap(),
        "Nested file content\n"
    );
    assert!(!out.join("file.txt").exists());
}

#[test]
fn test_cli_missing_source_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    let archive = temp.path().join("test.tar");

    let output = run_tarpack(&["pack", missing.to_str().unwrap(), archive.to_str().unwrap()]);
    assert_failure(&output, "tarpack pack missing");
    assert!(stderr_str(&output).starts_with("tarpack: "));
    assert!(stderr_str(&output).contains("does not exist"));
}

#[test]
fn test_cli_missing_archive_fails() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("absent.tar");

    let output = run_tarpack(&["list", archive.to_str().unwrap()]);
    assert_failure(&output, "tarpack list missing");
}

#[cfg(unix)]
#[test]
fn test_system_tar_reads_archive() {
    if Command::new("tar").arg("--version").output().is_err() {
        return;
    }

    let temp = TempDir::new().unwrap();
    let src = temp.path().join("source");
    create_test_files(&src);
    let long_name = format!("{}.txt", "x".repeat(146));
    fs::write(src.join(&long_name), b"long").unwrap();
    let archive = temp.path().join("test.tar");

    assert_success(
        &run_tarpack(&["pack", "-s", src.to_str().unwrap(), archive.to_str().unwrap()]),
        "tarpack pack",
    );

    let output = Command::new("tar")
        .args(["-tf", archive.to_str().unwrap()])
        .output()
        .unwrap();
    assert_success(&output, "tar -tf");
    let listing = stdout_str(&output);
    assert!(listing.lines().any(|l| l == long_name));
    assert!(listing.lines().any(|l| l == "subdir/nested.txt"));
}
