//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Common test helpers for tarpack integration tests

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

/// Run tarpack with given arguments and return output
pub fn run_tarpack(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tarpack"))
        .args(args)
        .output()
        .expect("Failed to run tarpack")
}

/// Create a test directory with standard test files
pub fn create_test_files(dir: &Path) {
    fs::create_dir_all(dir).unwrap();

    let mut f = File::create(dir.join("file.txt")).unwrap();
    writeln!(f, "Hello, world!").unwrap();

    let subdir = dir.join("subdir");
    fs::create_dir(&subdir).unwrap();

    let mut f = File::create(subdir.join("nested.txt")).unwrap();
    writeln!(f, "Nested file content").unwrap();

    File::create(dir.join("empty.txt")).unwrap();

    #[cfg(unix)]
    std::os::unix::fs::symlink("file.txt", dir.join("link.txt")).unwrap();
}

/// Verify extracted files match original test files
pub fn verify_files_match(original: &Path, extracted: &Path) {
    for name in ["file.txt", "subdir/nested.txt", "empty.txt"] {
        let orig = fs::read(original.join(name)).unwrap();
        let extr = fs::read(extracted.join(name)).unwrap();
        assert_eq!(orig, extr, "{} content mismatch", name);
    }

    #[cfg(unix)]
    {
        let orig_link = fs::read_link(original.join("link.txt")).unwrap();
        let extr_link = fs::read_link(extracted.join("link.txt")).unwrap();
        assert_eq!(orig_link, extr_link, "symlink target mismatch");
    }
}

/// Assert command succeeded
pub fn assert_success(output: &Output, context: &str) {
    assert!(
        output.status.success(),
        "{} failed with status {:?}\nstderr: {}",
        context,
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Assert command failed
pub fn assert_failure(output: &Output, context: &str) {
    assert!(
        !output.status.success(),
        "{} should have failed but succeeded\nstdout: {}",
        context,
        String::from_utf8_lossy(&output.stdout)
    );
}

/// Get stdout as string
pub fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get stderr as string
pub fn stderr_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
