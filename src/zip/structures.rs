use crate::bytes;
use crate::error::{Error, Result};

/// Local file header signature (`PK\x03\x04`).
pub const LFH_SIGNATURE: u32 = 0x04034B50;
/// Optional signature preceding a data descriptor (`PK\x07\x08`).
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074B50;
/// Fixed portion of a local file header.
pub const LFH_SIZE: usize = 30;

const FLAG_ENCRYPTED: u16 = 1 << 0;
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
const ZIP64_SIZE_SENTINEL: u32 = 0xFFFF_FFFF;
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// Sizes carried by a ZIP64 extra sub-record (header id 0x0001).
#[derive(Debug, Clone, Copy)]
struct Zip64Sizes {
    uncompressed_size: u64,
    compressed_size: u64,
}

/// Values from a trailing data descriptor.
///
/// The CRC stays 32-bit in both forms; the sizes widen to 64 bits when the
/// entry carries ZIP64 sentinels.
#[derive(Debug, Clone, Copy)]
struct DataDescriptor {
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
}

/// A decoded view of one local file record.
///
/// All byte accessors return slices of the archive; no payload is copied.
/// "Raw" accessors return the header fields as written; "effective"
/// accessors apply the ZIP64 extra field and data descriptor overrides in
/// that order.
#[derive(Debug, Clone)]
pub struct LocalFile<'a> {
    gp_flags: u16,
    compression_method: u16,
    last_mod_time: u16,
    raw_crc32: u32,
    raw_compressed_size: u32,
    raw_uncompressed_size: u32,
    file_name: &'a [u8],
    extra_field: &'a [u8],
    payload: &'a [u8],
    zip64: Option<Zip64Sizes>,
    descriptor: Option<DataDescriptor>,
    record_len: usize,
}

impl<'a> LocalFile<'a> {
    /// Decode the record starting at `offset`.
    ///
    /// The walk checks the signature before calling this; a mismatch is
    /// still reported as [`Error::MalformedArchive`] rather than trusted.
    pub(super) fn parse(archive: &'a [u8], offset: usize) -> Result<Self> {
        let trunc = || Error::MalformedArchive("truncated local file header");

        if bytes::read_u32(archive, offset).ok_or_else(trunc)? != LFH_SIGNATURE {
            return Err(Error::MalformedArchive("missing local file signature"));
        }

        let gp_flags = bytes::read_u16(archive, offset + 6).ok_or_else(trunc)?;
        let compression_method = bytes::read_u16(archive, offset + 8).ok_or_else(trunc)?;
        let last_mod_time = bytes::read_u16(archive, offset + 10).ok_or_else(trunc)?;
        let raw_crc32 = bytes::read_u32(archive, offset + 14).ok_or_else(trunc)?;
        let raw_compressed_size = bytes::read_u32(archive, offset + 18).ok_or_else(trunc)?;
        let raw_uncompressed_size = bytes::read_u32(archive, offset + 22).ok_or_else(trunc)?;
        let file_name_length = bytes::read_u16(archive, offset + 26).ok_or_else(trunc)?;
        let extra_field_length = bytes::read_u16(archive, offset + 28).ok_or_else(trunc)?;

        let name_start = offset + LFH_SIZE;
        let extra_start = name_start + file_name_length as usize;
        let payload_start = extra_start + extra_field_length as usize;

        let file_name = archive
            .get(name_start..extra_start)
            .ok_or(Error::MalformedArchive("truncated file name"))?;
        let extra_field = archive
            .get(extra_start..payload_start)
            .ok_or(Error::MalformedArchive("truncated extra field"))?;

        // Both sentinels must be present for the ZIP64 extra field to apply.
        let is_zip64 = raw_compressed_size == ZIP64_SIZE_SENTINEL
            && raw_uncompressed_size == ZIP64_SIZE_SENTINEL;
        let zip64 = if is_zip64 {
            Some(find_zip64_sizes(extra_field)?)
        } else {
            None
        };

        // The payload is delimited by the ZIP64 (or raw) size; the data
        // descriptor sits after it and cannot influence its own position.
        let payload_len = usize::try_from(match zip64 {
            Some(sizes) => sizes.compressed_size,
            None => u64::from(raw_compressed_size),
        })
        .map_err(|_| Error::MalformedArchive("compressed size exceeds address space"))?;
        let payload_end = payload_start
            .checked_add(payload_len)
            .ok_or(Error::MalformedArchive("compressed size exceeds address space"))?;
        let payload = archive
            .get(payload_start..payload_end)
            .ok_or(Error::MalformedArchive("truncated compressed payload"))?;

        let mut record_end = payload_end;
        let descriptor = if gp_flags & FLAG_DATA_DESCRIPTOR != 0 {
            let (descriptor, end) = parse_data_descriptor(archive, payload_end, is_zip64)?;
            record_end = end;
            Some(descriptor)
        } else {
            None
        };

        Ok(Self {
            gp_flags,
            compression_method,
            last_mod_time,
            raw_crc32,
            raw_compressed_size,
            raw_uncompressed_size,
            file_name,
            extra_field,
            payload,
            zip64,
            descriptor,
            record_len: record_end - offset,
        })
    }

    pub fn gp_flags(&self) -> u16 {
        self.gp_flags
    }

    pub fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.compression_method)
    }

    /// The DOS modification time field, which doubles as the ZipCrypto
    /// check bits for the 12-byte encryption header.
    pub fn last_mod_time(&self) -> u16 {
        self.last_mod_time
    }

    pub fn raw_crc32(&self) -> u32 {
        self.raw_crc32
    }

    pub fn raw_compressed_size(&self) -> u32 {
        self.raw_compressed_size
    }

    pub fn raw_uncompressed_size(&self) -> u32 {
        self.raw_uncompressed_size
    }

    /// Plaintext CRC-32, taking a data descriptor override into account.
    pub fn effective_crc32(&self) -> u32 {
        match self.descriptor {
            Some(d) => d.crc32,
            None => self.raw_crc32,
        }
    }

    pub fn effective_compressed_size(&self) -> u64 {
        if let Some(d) = self.descriptor {
            return d.compressed_size;
        }
        match self.zip64 {
            Some(sizes) => sizes.compressed_size,
            None => u64::from(self.raw_compressed_size),
        }
    }

    pub fn effective_uncompressed_size(&self) -> u64 {
        if let Some(d) = self.descriptor {
            return d.uncompressed_size;
        }
        match self.zip64 {
            Some(sizes) => sizes.uncompressed_size,
            None => u64::from(self.raw_uncompressed_size),
        }
    }

    pub fn file_name_bytes(&self) -> &'a [u8] {
        self.file_name
    }

    pub fn extra_field_bytes(&self) -> &'a [u8] {
        self.extra_field
    }

    /// The compressed payload, including the 12-byte encryption header when
    /// the entry is encrypted.
    pub fn compressed_payload_bytes(&self) -> &'a [u8] {
        self.payload
    }

    pub fn is_encrypted(&self) -> bool {
        self.gp_flags & FLAG_ENCRYPTED != 0
    }

    pub fn has_data_descriptor(&self) -> bool {
        self.gp_flags & FLAG_DATA_DESCRIPTOR != 0
    }

    pub fn is_zip64(&self) -> bool {
        self.zip64.is_some()
    }

    /// Total record length: header, name, extra field, payload and data
    /// descriptor. The walk advances by this amount.
    pub(super) fn record_len(&self) -> usize {
        self.record_len
    }
}

/// Scan the extra-field chain for the ZIP64 sub-record.
///
/// Sub-records are `(header_id: u16, size: u16, data[size])`; unknown ids
/// are skipped. The entry promised ZIP64 sizes, so a chain without the
/// sub-record is malformed.
fn find_zip64_sizes(extra_field: &[u8]) -> Result<Zip64Sizes> {
    let mut pos = 0;
    while pos + 4 <= extra_field.len() {
        let header_id = bytes::read_u16(extra_field, pos)
            .ok_or(Error::MalformedArchive("corrupt extra-field chain"))?;
        let size = bytes::read_u16(extra_field, pos + 2)
            .ok_or(Error::MalformedArchive("corrupt extra-field chain"))? as usize;
        let data = extra_field
            .get(pos + 4..pos + 4 + size)
            .ok_or(Error::MalformedArchive("corrupt extra-field chain"))?;

        if header_id == ZIP64_EXTRA_ID {
            let uncompressed_size = bytes::read_u64(data, 0)
                .ok_or(Error::MalformedArchive("short zip64 extra field"))?;
            let compressed_size = bytes::read_u64(data, 8)
                .ok_or(Error::MalformedArchive("short zip64 extra field"))?;
            return Ok(Zip64Sizes {
                uncompressed_size,
                compressed_size,
            });
        }

        pos += 4 + size;
    }

    Err(Error::MalformedArchive(
        "size sentinels present but no zip64 extra field",
    ))
}

/// Decode the data descriptor that follows the payload at `pos`.
///
/// The optional signature is skipped whenever the next four bytes equal the
/// magic. A plaintext CRC-32 that happens to equal the magic would be
/// mis-skipped here; no known archive producer emits that collision.
fn parse_data_descriptor(
    archive: &[u8],
    mut pos: usize,
    is_zip64: bool,
) -> Result<(DataDescriptor, usize)> {
    let trunc = || Error::MalformedArchive("truncated data descriptor");

    if bytes::read_u32(archive, pos) == Some(DATA_DESCRIPTOR_SIGNATURE) {
        pos += 4;
    }

    let crc32 = bytes::read_u32(archive, pos).ok_or_else(trunc)?;
    let descriptor = if is_zip64 {
        DataDescriptor {
            crc32,
            compressed_size: bytes::read_u64(archive, pos + 4).ok_or_else(trunc)?,
            uncompressed_size: bytes::read_u64(archive, pos + 12).ok_or_else(trunc)?,
        }
    } else {
        DataDescriptor {
            crc32,
            compressed_size: u64::from(bytes::read_u32(archive, pos + 4).ok_or_else(trunc)?),
            uncompressed_size: u64::from(bytes::read_u32(archive, pos + 8).ok_or_else(trunc)?),
        }
    };

    let end = pos + if is_zip64 { 20 } else { 12 };
    Ok((descriptor, end))
}
