use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::Level;

/// Brute-force configuration: maximum passphrase length and the regex that
/// selects the alphabet, written `LEN:REGEX`.
#[derive(Clone, Debug)]
pub struct BruteConfig {
    pub max_len: u8,
    pub pattern: String,
}

impl FromStr for BruteConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((len, pattern)) = s.split_once(':') else {
            bail!("expected LEN:REGEX");
        };
        let max_len = len
            .parse()
            .context("maximum length must be a number up to 255")?;
        Ok(Self {
            max_len,
            pattern: pattern.to_owned(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(name = "zipcrack")]
#[command(version)]
#[command(about = "Recover the passphrase of a ZipCrypto-protected ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipcrack -z secret.zip -d wordlist.txt   try every line of wordlist.txt\n  \
  zipcrack -z secret.zip -b '4:[a-z]'      try all lowercase passphrases up to 4 chars")]
pub struct Cli {
    /// ZIP archive to attack
    #[arg(short = 'z', value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Newline-delimited dictionary of candidate passphrases
    #[arg(
        short = 'd',
        value_name = "DICT",
        conflicts_with = "brute",
        required_unless_present = "brute"
    )]
    pub dictionary: Option<PathBuf>,

    /// Brute-force configuration: maximum length, a colon, and a
    /// single-character regex selecting the ASCII alphabet
    #[arg(short = 'b', value_name = "LEN:REGEX")]
    pub brute: Option<BruteConfig>,

    /// Lowest log message severity to output
    #[arg(long, value_name = "LEVEL", default_value_t = Level::WARN)]
    pub log_level: Level,
}
