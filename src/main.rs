//! Main entry point for the zipcrack CLI.
//!
//! Maps the archive (and, in dictionary mode, the word list) into memory,
//! builds the candidate source, and runs the parallel search. Prints the
//! recovered passphrase on stdout; diagnostics go to stderr.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use memmap2::Mmap;
use tracing::debug;

use zipcrack::{is_zip, search, Alphabet, BruteSource, Cli, DictionarySource};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_max_level(cli.log_level)
        .init();

    debug!("arguments: {cli:?}");

    match run(&cli) {
        Ok(Some(password)) => {
            println!("found password [{}]", String::from_utf8_lossy(&password));
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("no password found");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Option<Vec<u8>>> {
    let archive = map_file(&cli.archive)?;

    if !is_zip(&archive) {
        bail!(
            "{} does not start with a local file record",
            cli.archive.display()
        );
    }

    if let Some(dict_path) = &cli.dictionary {
        let dictionary = map_file(dict_path)?;
        let source = DictionarySource::new(&dictionary);
        search(&archive, &source).map_err(Into::into)
    } else if let Some(brute) = &cli.brute {
        let alphabet =
            Alphabet::from_regex(&brute.pattern).context("invalid -b character regex")?;
        if alphabet.is_empty() {
            bail!("-b regex matches no ASCII characters");
        }
        debug!(
            alphabet = alphabet.len(),
            max_len = brute.max_len,
            "brute-force configuration"
        );
        let source = BruteSource::new(Arc::new(alphabet), brute.max_len);
        search(&archive, &source).map_err(Into::into)
    } else {
        // clap enforces one of -d/-b; reached only if that wiring breaks.
        bail!("either -d or -b is required");
    }
}

/// Open and memory map a file read-only. The map lives until the returned
/// value drops, which happens on every exit path out of `run`.
fn map_file(path: &std::path::Path) -> Result<Mmap> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    // SAFETY: the map is read-only; concurrent truncation of the underlying
    // file by another process is outside this tool's failure model.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("failed to map {}", path.display()))?;
    Ok(map)
}
