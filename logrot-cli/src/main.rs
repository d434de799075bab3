//! logrot CLI binary.
//!
//! Entry point for the `logrot` command-line tool.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use logrot_cli::exit::{codes, exit_code};
use logrot_cli::{execute_delete, execute_rotate, Cli, Command, CommandError, StderrLogger};
use logrot_clock::SystemClock;
use logrot_fs::RealFilesystem;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Rotate(args) => {
            let logger = StderrLogger::from_count(args.verbose);
            execute_rotate(&args, RealFilesystem, &logger).map(|r| r.paths)
        }
        Command::Delete(args) => {
            let logger = StderrLogger::from_count(args.verbose);
            execute_delete(&args, RealFilesystem, SystemClock, &logger).map(|r| r.paths)
        }
    };

    match result {
        Ok(paths) => {
            print_paths(&paths);
            ExitCode::from(codes::SUCCESS as u8)
        }
        Err(e) => report(&e),
    }
}

/// Print affected paths, one per line.
fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

fn report(error: &CommandError) -> ExitCode {
    eprintln!("error: {}", error);
    ExitCode::from(exit_code(error) as u8)
}
