//! CLI entry point: `gguf-dump <path>` writes the tensor-metadata CSV to
//! stdout and diagnostics to stderr, matching
//! `tools/gguf-dump/gguf-dump.cpp`'s split. Exit code 0 on success, 1 on a
//! missing argument, open failure, malformed header/value, or dimensional
//! sanity failure (spec.md §6).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Parses a GGUF file and emits its tensor metadata as CSV.
#[derive(Parser)]
#[command(name = "gguf-dump", about = "Dump GGUF tensor metadata as CSV")]
struct Cli {
    /// Path to the GGUF model file.
    path: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{e}");
            return ExitCode::from(1);
        }
    };

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    match gguf_dump::run(&cli.path, &mut lock) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
