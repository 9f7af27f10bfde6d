//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use clap::{Args as ClapArgs, Parser, Subcommand};
use gettextrs::{bind_textdomain_codeset, gettext, setlocale, textdomain, LocaleCategory};
use std::path::PathBuf;
use std::process::ExitCode;
use tarpack::{
    extract_one, format_entry, list_archive, pack_with_options, unpack, PackOptions, PackResult,
    PROJECT_NAME,
};

#[derive(ClapArgs, Debug)]
struct PackArgs {
    #[arg(short, long, help = gettext("Store the contents of SOURCE without SOURCE itself"))]
    skip_root: bool,

    #[arg(short, long, help = gettext("Print each entry name as it is added"))]
    verbose: bool,

    #[arg(help = gettext("File or directory to pack"))]
    source: PathBuf,

    #[arg(help = gettext("Archive to create"))]
    archive: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct UnpackArgs {
    #[arg(short, long, help = gettext("Print each created path"))]
    verbose: bool,

    #[arg(help = gettext("Archive to read"))]
    archive: PathBuf,

    #[arg(help = gettext("Directory to extract into"))]
    destination: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ExtractArgs {
    #[arg(help = gettext("Archive member name"))]
    entry: String,

    #[arg(help = gettext("Archive to read"))]
    archive: PathBuf,

    #[arg(help = gettext("Directory to extract into"))]
    destination: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    #[arg(short, long, help = gettext("Produce a verbose table of contents"))]
    verbose: bool,

    #[arg(help = gettext("Archive to read"))]
    archive: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a file or directory tree into an archive
    Pack(PackArgs),
    /// Extract every member of an archive
    Unpack(UnpackArgs),
    /// Extract a single member of an archive
    Extract(ExtractArgs),
    /// List the members of an archive
    List(ListArgs),
}

/// tarpack - pack and unpack ustar archives
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

fn run(args: Args) -> PackResult<()> {
    match args.command {
        Commands::Pack(args) => {
            let options = PackOptions {
                skip_root: args.skip_root,
                verbose: args.verbose,
                ..Default::default()
            };
            pack_with_options(&args.source, &args.archive, &options)?;
        }
        Commands::Unpack(args) => {
            let created = unpack(&args.archive, &args.destination)?;
            if args.verbose {
                for path in created {
                    println!("{}", path.display());
                }
            }
        }
        Commands::Extract(args) => {
            match extract_one(&args.entry, &args.archive, &args.destination)? {
                Some(path) => println!("{}", path.display()),
                None => log::info!("{}: not found in archive", args.entry),
            }
        }
        Commands::List(args) => {
            for header in list_archive(&args.archive)? {
                println!("{}", format_entry(&header, args.verbose));
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    setlocale(LocaleCategory::LcAll, "");
    if let Err(e) = textdomain(PROJECT_NAME) {
        log::debug!("textdomain: {}", e);
    }
    if let Err(e) = bind_textdomain_codeset(PROJECT_NAME, "UTF-8") {
        log::debug!("bind_textdomain_codeset: {}", e);
    }

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tarpack: {}", e);
            ExitCode::FAILURE
        }
    }
}
