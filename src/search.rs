//! Parallel any-match search across entries and candidates.
//!
//! The driver sweeps the Cartesian product of encrypted entries and
//! candidate passphrases and stops at the first passphrase that verifies
//! against any entry. Workers are plain OS threads sized to the hardware;
//! the search is CPU bound and touches no I/O once the archive is mapped.
//!
//! Candidates flow through a lock-guarded cursor in fixed-size batches, so
//! workers own disjoint subranges of the candidate space and share no
//! mutable state while verifying. Termination is polled through an atomic
//! flag once per batch; the result slot is written once, under its mutex.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::debug;

use crate::brute::{Alphabet, BruteIter};
use crate::dictionary::{Dictionary, Lines};
use crate::error::Result;
use crate::verify::Verifier;
use crate::zip;

/// Candidates handed to a worker per cursor acquisition. Cancellation
/// latency is bounded by this many attempts per worker.
pub const CANDIDATE_BATCH: usize = 1024;

/// A source of candidate passphrases that can be drained concurrently.
pub trait CandidateSource: Sync {
    /// Replace the contents of `out` with the next batch of at most
    /// [`CANDIDATE_BATCH`] candidates. An empty `out` means the source is
    /// exhausted.
    fn fill_batch(&self, out: &mut Vec<Vec<u8>>);
}

/// Forward-only candidates pulled from a dictionary span.
pub struct DictionarySource<'a> {
    cursor: Mutex<Lines<'a>>,
}

impl<'a> DictionarySource<'a> {
    pub fn new(span: &'a [u8]) -> Self {
        Self {
            cursor: Mutex::new(Dictionary::new(span).iter()),
        }
    }
}

impl CandidateSource for DictionarySource<'_> {
    fn fill_batch(&self, out: &mut Vec<Vec<u8>>) {
        out.clear();
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        for line in cursor.by_ref().take(CANDIDATE_BATCH) {
            out.push(line.to_vec());
        }
    }
}

struct BruteCursor {
    iter: BruteIter,
    remaining: u128,
}

/// Random-access candidates over an alphabet and a maximum length.
///
/// The cursor only hands out index subranges; each worker materializes its
/// batch from a private clone of the iterator, outside the lock.
pub struct BruteSource {
    cursor: Mutex<BruteCursor>,
}

impl BruteSource {
    pub fn new(alphabet: Arc<Alphabet>, max_len: u8) -> Self {
        let remaining = alphabet.index_space(max_len);
        Self {
            cursor: Mutex::new(BruteCursor {
                iter: BruteIter::new(alphabet, 0),
                remaining,
            }),
        }
    }
}

impl CandidateSource for BruteSource {
    fn fill_batch(&self, out: &mut Vec<Vec<u8>>) {
        out.clear();

        let (mut iter, count) = {
            let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let count = cursor.remaining.min(CANDIDATE_BATCH as u128) as usize;
            if count == 0 {
                return;
            }
            cursor.remaining -= count as u128;
            let start = cursor.iter.clone();
            // The shared iterator must never sit one past the last index:
            // that position is unrepresentable for a one-character alphabet
            // (index decomposition in base 1 does not terminate). Once the
            // space is exhausted no further batch is handed out, so the
            // stale position is never read.
            if cursor.remaining > 0 {
                cursor.iter.advance_by(count as u128);
            }
            (start, count)
        };

        for _ in 0..count {
            out.push(iter.password());
            iter.advance();
        }
    }
}

/// Search `archive` for a passphrase that decrypts any encrypted entry.
///
/// Returns the first passphrase found, or `None` when the source is
/// exhausted or the archive has no encrypted entries. If several
/// passphrases would verify, any one of them may be returned.
///
/// # Errors
///
/// Fails with [`MalformedArchive`](crate::Error::MalformedArchive) when the
/// local-file chain cannot be decoded.
pub fn search<S: CandidateSource>(archive: &[u8], source: &S) -> Result<Option<Vec<u8>>> {
    let mut entries = Vec::new();
    for record in zip::walk(archive) {
        let record = record?;
        if record.is_encrypted() {
            entries.push(record);
        }
    }

    if entries.is_empty() {
        debug!("archive has no encrypted entries");
        return Ok(None);
    }

    let workers = thread::available_parallelism().map_or(1, |n| n.get());
    debug!(entries = entries.len(), workers, "starting search");

    let stop = AtomicBool::new(false);
    let result: Mutex<Option<Vec<u8>>> = Mutex::new(None);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                let mut verifier = Verifier::new();
                let mut batch: Vec<Vec<u8>> = Vec::with_capacity(CANDIDATE_BATCH);

                while !stop.load(Ordering::Relaxed) {
                    source.fill_batch(&mut batch);
                    if batch.is_empty() {
                        break;
                    }

                    for password in &batch {
                        for entry in &entries {
                            if verifier.verify(entry, password) {
                                let mut slot =
                                    result.lock().unwrap_or_else(PoisonError::into_inner);
                                if slot.is_none() {
                                    *slot = Some(password.clone());
                                }
                                // Result visibility for the caller comes from
                                // joining the scope; the flag is only a hint
                                // to the other workers.
                                stop.store(true, Ordering::Relaxed);
                                return;
                            }
                        }
                    }
                }
            });
        }
    });

    Ok(result
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner))
}
