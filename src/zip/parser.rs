//! Forward walk over the local file records of a mapped archive.
//!
//! ## Parsing strategy
//!
//! The archive is consumed strictly front to back: decode the local file
//! header at the current offset, derive the variable section sizes, yield a
//! view, and advance to the byte after the compressed payload (plus the data
//! descriptor when general-purpose flag bit 3 is set). The central directory
//! is never consulted.
//!
//! Iteration terminates at the end of the archive or at the first offset
//! whose signature is not a local file header. In a well-formed archive that
//! first non-matching record is the central directory; an archive whose
//! local-file chain is interrupted by other record types simply ends early.

use crate::bytes;
use crate::error::Result;

use super::structures::{LocalFile, LFH_SIGNATURE, LFH_SIZE};

/// Basic check that the input looks like a ZIP archive: the fixed header
/// must be in bounds and carry the local file signature.
pub fn is_zip(archive: &[u8]) -> bool {
    archive.len() >= LFH_SIZE && bytes::read_u32(archive, 0) == Some(LFH_SIGNATURE)
}

/// Iterate over the local file records of `archive`.
///
/// Each item is a decoded [`LocalFile`] view, or [`MalformedArchive`] for a
/// record that starts with the right signature but cannot be decoded
/// (truncated sections, ZIP64 sentinels without the matching extra field).
/// After an error the iterator is fused.
///
/// [`MalformedArchive`]: crate::Error::MalformedArchive
pub fn walk(archive: &[u8]) -> LocalFileIter<'_> {
    LocalFileIter {
        archive,
        offset: 0,
        done: false,
    }
}

pub struct LocalFileIter<'a> {
    archive: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Iterator for LocalFileIter<'a> {
    type Item = Result<LocalFile<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if bytes::read_u32(self.archive, self.offset) != Some(LFH_SIGNATURE) {
            self.done = true;
            return None;
        }

        match LocalFile::parse(self.archive, self.offset) {
            Ok(record) => {
                self.offset += record.record_len();
                if self.offset >= self.archive.len() {
                    self.done = true;
                }
                Some(Ok(record))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
