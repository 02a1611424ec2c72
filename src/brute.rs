//! Brute-force candidate source.
//!
//! Candidates over an alphabet of `A` bytes with maximum length `L` are
//! indexed by the half-open range `[0, A^L)` in 128-bit arithmetic. Index
//! `i` decomposes in base `A` least-significant-digit first into digits
//! `d0 .. d{m-1}`; the candidate is `alphabet[d0] .. alphabet[d{m-1}]`.
//! The most significant digit is nonzero whenever `m > 1`, so every index
//! maps to a distinct string. Index 0 is the one-character string
//! `alphabet[0]` by this convention; the empty passphrase is never
//! produced by brute iteration.
//!
//! Random access over the index space is what lets the search driver hand
//! disjoint subranges to workers. Stepping by one is the hot operation and
//! increments the cached digit array with carry instead of re-dividing the
//! index.

use std::cmp::Ordering;
use std::sync::Arc;

use regex::Regex;

// Enough digits for any u128 index over the smallest useful alphabet.
const MAX_DIGITS: usize = 128;

/// The candidate alphabet: ASCII bytes in sorted order.
#[derive(Debug)]
pub struct Alphabet(Vec<u8>);

impl Alphabet {
    /// Build the alphabet by filtering the 7-bit ASCII range `[0, 128)`
    /// with a single-character regex.
    ///
    /// The pattern is anchored as `^(?:pat)$` so it must match the whole
    /// one-character string, the behavior of whole-string regex matching.
    pub fn from_regex(pattern: &str) -> Result<Self, regex::Error> {
        let re = Regex::new(&format!("^(?:{pattern})$"))?;
        let mut buf = [0u8; 4];
        let mut bytes = Vec::new();
        for b in 0u8..128 {
            if re.is_match((b as char).encode_utf8(&mut buf)) {
                bytes.push(b);
            }
        }
        Ok(Self(bytes))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of candidate indices for passphrases up to `max_len` bytes:
    /// `A^L`, wrapping in 128-bit arithmetic like the index itself.
    pub fn index_space(&self, max_len: u8) -> u128 {
        (self.0.len() as u128).wrapping_pow(u32::from(max_len))
    }
}

#[cfg(test)]
impl Alphabet {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// A position in the brute-force candidate sequence.
///
/// Equality and ordering are defined on the index; comparing positions over
/// different alphabets is a caller bug, as with iterators over different
/// containers. Positions are meaningful only inside `[0, A^L)`: jumping to
/// an index at or past the end of the space is not supported (for a
/// one-character alphabet the index decomposition of any nonzero value
/// does not even terminate), while [`advance`](BruteIter::advance) may
/// harmlessly step one past the last candidate of a subrange.
#[derive(Clone, Debug)]
pub struct BruteIter {
    alphabet: Arc<Alphabet>,
    index: u128,
    digits: [u8; MAX_DIGITS],
    len: u8,
}

impl BruteIter {
    /// Position the sequence at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the alphabet is empty; there is no candidate sequence over
    /// zero characters.
    pub fn new(alphabet: Arc<Alphabet>, index: u128) -> Self {
        assert!(!alphabet.is_empty(), "empty alphabet");
        let mut iter = Self {
            alphabet,
            index: 0,
            digits: [0; MAX_DIGITS],
            len: 0,
        };
        iter.set_index(index);
        iter
    }

    pub fn index(&self) -> u128 {
        self.index
    }

    /// The candidate at the current position.
    pub fn password(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len as usize);
        self.write_password(&mut out);
        out
    }

    /// Write the current candidate into `out`, reusing its allocation.
    pub fn write_password(&self, out: &mut Vec<u8>) {
        out.clear();
        let alphabet = self.alphabet.as_bytes();
        out.extend(
            self.digits[..self.len as usize]
                .iter()
                .map(|&d| alphabet[d as usize]),
        );
    }

    /// Step to the next index. Amortized O(1): the digit array is
    /// incremented with carry, never re-derived by division.
    pub fn advance(&mut self) {
        let top = (self.alphabet.len() - 1) as u8;
        let len = self.len as usize;

        let mut pos = 0;
        while pos < len && self.digits[pos] == top {
            self.digits[pos] = 0;
            pos += 1;
        }
        if pos == len {
            // All digits carried over; the candidate grows by one place.
            self.digits[pos] = 1;
            self.len += 1;
        } else {
            self.digits[pos] += 1;
        }

        self.index = self.index.wrapping_add(1);
    }

    pub fn advance_by(&mut self, offset: u128) {
        self.set_index(self.index.wrapping_add(offset));
    }

    pub fn retreat_by(&mut self, offset: u128) {
        self.set_index(self.index.wrapping_sub(offset));
    }

    /// Index distance `self - earlier`.
    pub fn distance_from(&self, earlier: &Self) -> u128 {
        self.index.wrapping_sub(earlier.index)
    }

    fn set_index(&mut self, index: u128) {
        self.index = index;
        self.len = 0;
        let base = self.alphabet.len() as u128;
        let mut rest = index;
        loop {
            self.digits[self.len as usize] = (rest % base) as u8;
            self.len += 1;
            rest /= base;
            if rest == 0 {
                break;
            }
        }
    }
}

impl PartialEq for BruteIter {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for BruteIter {}

impl PartialOrd for BruteIter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BruteIter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}
