//! PKWARE ZipCrypto stream cipher (decryption side).
//!
//! The cipher keeps three 32-bit key words that are tumbled by every
//! plaintext byte. Decrypting the 12-byte encryption header yields two
//! check bytes at positions 10 and 11 which must equal the entry's DOS
//! modification time split into (lo, hi). That comparison rejects roughly
//! 65535 of 65536 wrong passphrases before any bulk work happens.
//!
//! c.f. <https://support.pkware.com/pkzip/application-note-archives>

use crate::error::Result;

/// Length of the encryption header preceding the ciphertext proper.
pub const ENCRYPTION_HEADER_LEN: usize = 12;

const INITIAL_KEYS: [u32; 3] = [0x12345678, 0x23456789, 0x34567890];
const PLAINTEXT_CHUNK: usize = 1 << 12;

/// Standard IEEE CRC-32 lookup table (polynomial 0xEDB88320), used for the
/// single-byte residual step of the key tumbler.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

fn crc32_step(residual: u32, byte: u8) -> u32 {
    CRC32_TABLE[((residual ^ byte as u32) & 0xFF) as usize] ^ (residual >> 8)
}

/// A reusable ZipCrypto decryption engine.
///
/// The engine is stateful across calls and deliberately neither `Clone` nor
/// `Copy`: each worker owns exactly one and restores it with [`reset`]
/// before every attempt, so the reuse is explicit in the code that does it.
///
/// [`reset`]: Decrypter::reset
pub struct Decrypter {
    keys: [u32; 3],
}

impl Decrypter {
    pub fn new() -> Self {
        Self { keys: INITIAL_KEYS }
    }

    fn update_keys(&mut self, plain: u8) {
        self.keys[0] = crc32_step(self.keys[0], plain);
        self.keys[1] = self.keys[1]
            .wrapping_add(self.keys[0] & 0xFF)
            .wrapping_mul(134775813)
            .wrapping_add(1);
        self.keys[2] = crc32_step(self.keys[2], (self.keys[1] >> 24) as u8);
    }

    fn keystream_byte(&self) -> u8 {
        let i = (self.keys[2] | 2) as u16;
        (i.wrapping_mul(i ^ 1) >> 8) as u8
    }

    /// Re-key from `password` and decrypt the 12-byte encryption header.
    ///
    /// Returns `true` when the last two decrypted header bytes equal
    /// `check_bits` split into (lo, hi). A wrong passphrase slips through
    /// with probability about 2^-16 and is then caught by the CRC check.
    /// On `false` the engine must be reset again before use.
    pub fn reset(&mut self, password: &[u8], header: &[u8; ENCRYPTION_HEADER_LEN], check_bits: u16) -> bool {
        self.keys = INITIAL_KEYS;

        for &b in password {
            self.update_keys(b);
        }

        for &c in &header[..10] {
            let plain = c ^ self.keystream_byte();
            self.update_keys(plain);
        }

        let p10 = header[10] ^ self.keystream_byte();
        if p10 != check_bits as u8 {
            return false;
        }
        self.update_keys(p10);

        let p11 = header[11] ^ self.keystream_byte();
        if p11 != (check_bits >> 8) as u8 {
            return false;
        }
        self.update_keys(p11);

        true
    }

    /// Decrypt `ciphertext`, handing plaintext to `receiver` in chunks of at
    /// most 4 KiB so the working set stays cache resident.
    pub fn transform(
        &mut self,
        ciphertext: &[u8],
        mut receiver: impl FnMut(&[u8]) -> Result<()>,
    ) -> Result<()> {
        let mut plaintext = [0u8; PLAINTEXT_CHUNK];
        for block in ciphertext.chunks(PLAINTEXT_CHUNK) {
            for (out, &c) in plaintext.iter_mut().zip(block) {
                let plain = c ^ self.keystream_byte();
                self.update_keys(plain);
                *out = plain;
            }
            receiver(&plaintext[..block.len()])?;
        }
        Ok(())
    }
}

impl Default for Decrypter {
    fn default() -> Self {
        Self::new()
    }
}
