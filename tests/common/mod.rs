//! In-memory ZIP fixtures for the integration tests.
//!
//! The builder implements the *encryption* direction of the PKWARE cipher
//! independently of the library, so the round trips below check the
//! decrypter against a second implementation rather than against itself.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

pub const PASSWORD: &[u8] = b"test";
pub const LAST_MOD_TIME: u16 = 0x6AC3;
const LAST_MOD_DATE: u16 = 0x5A31;

const LFH_SIGNATURE: u32 = 0x0403_4B50;
const CDFH_SIGNATURE: u32 = 0x0201_4B50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4B50;

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

/// PKWARE cipher, encryption direction only.
pub struct Encrypter {
    keys: [u32; 3],
}

impl Encrypter {
    pub fn new(password: &[u8]) -> Self {
        let mut cipher = Self {
            keys: [0x12345678, 0x23456789, 0x34567890],
        };
        for &b in password {
            cipher.update_keys(b);
        }
        cipher
    }

    fn crc32_step(residual: u32, byte: u8) -> u32 {
        CRC32_TABLE[((residual ^ byte as u32) & 0xFF) as usize] ^ (residual >> 8)
    }

    fn update_keys(&mut self, plain: u8) {
        self.keys[0] = Self::crc32_step(self.keys[0], plain);
        self.keys[1] = self.keys[1]
            .wrapping_add(self.keys[0] & 0xFF)
            .wrapping_mul(134775813)
            .wrapping_add(1);
        self.keys[2] = Self::crc32_step(self.keys[2], (self.keys[1] >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let i = (self.keys[2] | 2) as u16;
        (i.wrapping_mul(i ^ 1) >> 8) as u8
    }

    pub fn encrypt(&mut self, plaintext: &[u8]) -> Vec<u8> {
        plaintext
            .iter()
            .map(|&p| {
                let c = p ^ self.stream_byte();
                self.update_keys(p);
                c
            })
            .collect()
    }
}

#[derive(Clone, Copy)]
pub enum Method {
    Stored,
    Deflated,
}

pub struct EntrySpec<'a> {
    pub name: &'a str,
    pub plaintext: &'a [u8],
    pub method: Method,
    /// Streaming writer: size sentinels, ZIP64 extra field and a trailing
    /// data descriptor instead of sizes in the header.
    pub piped: bool,
}

impl<'a> EntrySpec<'a> {
    pub fn stored(name: &'a str, plaintext: &'a [u8]) -> Self {
        Self {
            name,
            plaintext,
            method: Method::Stored,
            piped: false,
        }
    }

    pub fn deflated(name: &'a str, plaintext: &'a [u8]) -> Self {
        Self {
            name,
            plaintext,
            method: Method::Deflated,
            piped: false,
        }
    }

    pub fn piped_deflated(name: &'a str, plaintext: &'a [u8]) -> Self {
        Self {
            name,
            plaintext,
            method: Method::Deflated,
            piped: true,
        }
    }
}

/// Assemble an archive of encrypted entries, ending with a
/// central-directory-looking record like any real archive.
pub fn build_archive(entries: &[EntrySpec<'_>], password: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        write_entry(&mut out, entry, password);
    }
    out.write_u32::<LittleEndian>(CDFH_SIGNATURE).unwrap();
    out.extend_from_slice(&[0u8; 42]);
    out
}

/// The four-entry stored archive most tests run against.
pub fn stored_multi_entry_archive() -> Vec<u8> {
    build_archive(
        &[
            EntrySpec::stored("test_file.txt", b"this is a test file\n"),
            EntrySpec::stored("empty_file.txt", b""),
            EntrySpec::stored("subdir/other_file.txt", b"another file, in a subdir\n"),
            EntrySpec::stored("and_another.txt", b"the last one\n"),
        ],
        PASSWORD,
    )
}

/// A single unencrypted stored entry, for negative tests.
pub fn build_unencrypted_stored(name: &str, plaintext: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(LFH_SIGNATURE).unwrap();
    out.write_u16::<LittleEndian>(20).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(LAST_MOD_TIME).unwrap();
    out.write_u16::<LittleEndian>(LAST_MOD_DATE).unwrap();
    out.write_u32::<LittleEndian>(crc32fast::hash(plaintext)).unwrap();
    out.write_u32::<LittleEndian>(plaintext.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(plaintext.len() as u32).unwrap();
    out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(plaintext);
    out
}

fn write_entry(out: &mut Vec<u8>, entry: &EntrySpec<'_>, password: &[u8]) {
    let crc = crc32fast::hash(entry.plaintext);
    let compressed = match entry.method {
        Method::Stored => entry.plaintext.to_vec(),
        Method::Deflated => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(entry.plaintext).unwrap();
            encoder.finish().unwrap()
        }
    };

    // 12-byte encryption header; the last two plaintext bytes carry the
    // check bits taken from the mod-time field.
    let mut header = [0u8; 12];
    for (i, b) in header.iter_mut().enumerate().take(10) {
        *b = 0x51u8.wrapping_add((i as u8).wrapping_mul(37));
    }
    header[10] = LAST_MOD_TIME as u8;
    header[11] = (LAST_MOD_TIME >> 8) as u8;

    let mut cipher = Encrypter::new(password);
    let mut payload = cipher.encrypt(&header);
    payload.extend(cipher.encrypt(&compressed));

    let gp_flags: u16 = 0x0001 | if entry.piped { 0x0008 } else { 0 };
    let method: u16 = match entry.method {
        Method::Stored => 0,
        Method::Deflated => 8,
    };
    let compressed_size = payload.len() as u64;
    let uncompressed_size = entry.plaintext.len() as u64;

    out.write_u32::<LittleEndian>(LFH_SIGNATURE).unwrap();
    out.write_u16::<LittleEndian>(20).unwrap();
    out.write_u16::<LittleEndian>(gp_flags).unwrap();
    out.write_u16::<LittleEndian>(method).unwrap();
    out.write_u16::<LittleEndian>(LAST_MOD_TIME).unwrap();
    out.write_u16::<LittleEndian>(LAST_MOD_DATE).unwrap();
    if entry.piped {
        // CRC and sizes arrive in the data descriptor.
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
        out.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
    } else {
        out.write_u32::<LittleEndian>(crc).unwrap();
        out.write_u32::<LittleEndian>(compressed_size as u32).unwrap();
        out.write_u32::<LittleEndian>(uncompressed_size as u32).unwrap();
    }
    out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(if entry.piped { 20 } else { 0 }).unwrap();
    out.extend_from_slice(entry.name.as_bytes());
    if entry.piped {
        // ZIP64 extra sub-record: uncompressed then compressed size.
        out.write_u16::<LittleEndian>(0x0001).unwrap();
        out.write_u16::<LittleEndian>(16).unwrap();
        out.write_u64::<LittleEndian>(uncompressed_size).unwrap();
        out.write_u64::<LittleEndian>(compressed_size).unwrap();
    }
    out.extend_from_slice(&payload);
    if entry.piped {
        out.write_u32::<LittleEndian>(DATA_DESCRIPTOR_SIGNATURE).unwrap();
        out.write_u32::<LittleEndian>(crc).unwrap();
        out.write_u64::<LittleEndian>(compressed_size).unwrap();
        out.write_u64::<LittleEndian>(uncompressed_size).unwrap();
    }
}
