//! # zipcrack
//!
//! Recovery of the passphrase protecting entries in a ZIP archive that uses
//! the legacy PKWARE (ZipCrypto) stream cipher.
//!
//! The archive is memory mapped and its local file records are decoded in
//! place, without copying payload. Candidate passphrases come from either a
//! newline-delimited dictionary or a brute-force generator over a regex
//! selected alphabet, and are swept in parallel across all encrypted
//! entries until one decrypts and checks out against the stored CRC-32.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zipcrack::{search, Alphabet, BruteSource};
//!
//! fn main() -> anyhow::Result<()> {
//!     let archive = std::fs::read("secret.zip")?;
//!
//!     let alphabet = Arc::new(Alphabet::from_regex("[a-z]")?);
//!     let source = BruteSource::new(alphabet, 4);
//!
//!     match search(&archive, &source)? {
//!         Some(password) => println!("{}", String::from_utf8_lossy(&password)),
//!         None => println!("exhausted the candidate space"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Not supported: AES-encrypted entries (WinZip AE-1/AE-2), split or
//! spanned archives, and archives whose entries are only reachable through
//! the central directory. Parsing proceeds strictly via local file headers.

pub mod brute;
pub mod bytes;
pub mod cli;
pub mod crypto;
pub mod dictionary;
pub mod error;
pub mod inflate;
pub mod search;
pub mod verify;
pub mod zip;

pub use brute::{Alphabet, BruteIter};
pub use cli::{BruteConfig, Cli};
pub use crypto::Decrypter;
pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use inflate::Inflater;
pub use search::{search, BruteSource, CandidateSource, DictionarySource};
pub use verify::Verifier;
pub use zip::{is_zip, walk, CompressionMethod, LocalFile};
