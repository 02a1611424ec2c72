//! End-to-end passphrase check for a single archive entry.

use tracing::debug;

use crate::crypto::{Decrypter, ENCRYPTION_HEADER_LEN};
use crate::inflate::Inflater;
use crate::zip::{CompressionMethod, LocalFile};

/// A reusable verifier owning one cipher engine and one inflater.
///
/// Workers keep one `Verifier` each and call [`verify`] for every attempt,
/// avoiding per-attempt allocation. Every call fully restores both engines,
/// so calls are independent of each other.
///
/// [`verify`]: Verifier::verify
pub struct Verifier {
    decrypter: Decrypter,
    inflater: Inflater,
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            decrypter: Decrypter::new(),
            inflater: Inflater::new(),
        }
    }

    /// Try `password` against `entry`.
    ///
    /// Returns `true` only when the decrypted check bits match and the CRC-32
    /// of the recovered plaintext equals the entry's effective CRC. Anything
    /// that goes wrong mid-attempt, including a corrupt deflate stream on a
    /// candidate that slipped past the check bits, counts as "not a match".
    pub fn verify(&mut self, entry: &LocalFile<'_>, password: &[u8]) -> bool {
        if !entry.is_encrypted() {
            return false;
        }

        let buf = entry.compressed_payload_bytes();
        if buf.len() < ENCRYPTION_HEADER_LEN {
            return false;
        }
        let (header, ciphertext) = buf.split_at(ENCRYPTION_HEADER_LEN);
        let Ok(header) = <&[u8; ENCRYPTION_HEADER_LEN]>::try_from(header) else {
            return false;
        };

        if !self.decrypter.reset(password, header, entry.last_mod_time()) {
            return false;
        }
        self.inflater.reset();

        let Self {
            decrypter,
            inflater,
        } = self;
        let mut hasher = crc32fast::Hasher::new();

        let outcome = match entry.compression_method() {
            CompressionMethod::Stored => decrypter.transform(ciphertext, |chunk| {
                hasher.update(chunk);
                Ok(())
            }),
            CompressionMethod::Deflate => decrypter.transform(ciphertext, |chunk| {
                inflater.transform(chunk, &mut |inflated| hasher.update(inflated), false)
            }),
            CompressionMethod::Unknown(_) => return false,
        };

        if let Err(err) = outcome {
            debug!(error = %err, "discarding candidate that cleared the check bits");
            return false;
        }

        hasher.finalize() == entry.effective_crc32()
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
