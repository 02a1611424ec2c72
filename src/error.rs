//! Library error kinds.
//!
//! Only failures that should abort a search are represented here. A
//! candidate passphrase that fails verification is data, not an error, and
//! never surfaces as one of these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The archive violates the subset of the ZIP format we parse: a
    /// truncated record, a ZIP64 size sentinel without the matching extra
    /// sub-record, or a corrupt extra-field chain.
    #[error("malformed archive: {0}")]
    MalformedArchive(&'static str),

    /// The inflater hit a hard bitstream error. Inside the validator this is
    /// recovered as "not a match"; it only propagates when inflating data
    /// that is supposed to be well-formed.
    #[error("corrupt deflate stream: {0}")]
    CorruptDeflate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
