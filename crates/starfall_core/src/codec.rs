//! On-disk save format.
//!
//! Layout (28-byte fixed header, little-endian, then JSON payload):
//!   [0..4]   Magic bytes: "SFSV"
//!   [4..8]   Header format version (u32)
//!   [8..12]  Flags (u32, reserved)
//!   [12..20] Write timestamp (Unix epoch seconds, u64)
//!   [20..24] Payload length (u32)
//!   [24..28] CRC-32 of the payload
//!
//! The payload is the uncompressed JSON rendering of a `SaveRecord`.
//! Keeping it uncompressed is deliberate: the recovery engine scans the
//! raw bytes for literal field markers and chapter names, and chapter
//! literals only survive in an uncompressed stream.
//!
//! Files whose first four bytes are not the magic are treated as legacy
//! headerless payloads and parsed as bare JSON; saves from builds
//! before the header was introduced load this way.

use std::time::{SystemTime, UNIX_EPOCH};

use crc::{Crc, CRC_32_ISO_HDLC};
use log::warn;
use serde_json::Value;

use crate::error::SaveError;
use crate::record::SaveRecord;

pub const MAGIC: [u8; 4] = *b"SFSV";
pub const HEADER_SIZE: usize = 28;

/// Tracks changes to the header layout itself, not the record schema
/// (that is `version::SAVE_FORMAT_VERSION`).
pub const HEADER_FORMAT_VERSION: u32 = 1;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub payload_len: u32,
    pub checksum: u32,
}

/// A decoded save file before any structural verification.
#[derive(Debug, Clone)]
pub struct RawSave {
    /// `None` for legacy headerless files.
    pub header: Option<FileHeader>,
    /// The raw JSON document; the verifier decides whether it is a
    /// usable `SaveRecord`.
    pub document: Value,
}

/// Serialize a record into header-wrapped bytes.
///
/// Fails loudly on unserializable content; nothing is silently dropped.
pub fn encode(record: &SaveRecord) -> Result<Vec<u8>, SaveError> {
    let payload = serde_json::to_vec(record).map_err(|e| SaveError::Encode(e.to_string()))?;
    Ok(wrap_with_header(&payload))
}

/// Parse header-wrapped (or legacy headerless) bytes into a raw JSON
/// document. Any header or JSON failure is `SaveError::Corrupt`.
pub fn decode(bytes: &[u8]) -> Result<RawSave, SaveError> {
    let (header, payload) = split_header(bytes)?;
    let document: Value = serde_json::from_slice(payload)
        .map_err(|e| SaveError::Corrupt(format!("payload is not valid save data: {e}")))?;
    Ok(RawSave { header, document })
}

fn wrap_with_header(payload: &[u8]) -> Vec<u8> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // flags
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&CRC32.checksum(payload).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn split_header(bytes: &[u8]) -> Result<(Option<FileHeader>, &[u8]), SaveError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        // Legacy headerless save: the whole buffer is the payload.
        return Ok((None, bytes));
    }

    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::Corrupt(format!(
            "file has the save magic but only {} bytes, need {} for the header",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let format_version = read_u32(bytes, 4);
    let flags = read_u32(bytes, 8);
    let timestamp = u64::from_le_bytes(
        bytes[12..20]
            .try_into()
            .map_err(|_| SaveError::Corrupt("short header timestamp".to_string()))?,
    );
    let payload_len = read_u32(bytes, 20);
    let checksum = read_u32(bytes, 24);

    if format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::Corrupt(format!(
            "save uses header format {format_version}, this build supports up to \
             {HEADER_FORMAT_VERSION}"
        )));
    }

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len as usize {
        return Err(SaveError::Corrupt(format!(
            "payload length mismatch: header says {payload_len}, file has {}",
            payload.len()
        )));
    }

    // The checksum is informational only. A mismatch is logged and the
    // decode proceeds; if the payload is genuinely broken the JSON parse
    // fails on its own.
    let computed = CRC32.checksum(payload);
    if computed != checksum {
        warn!(
            "save payload checksum mismatch (header {:#010x}, computed {:#010x}); \
             loading anyway",
            checksum, computed
        );
    }

    Ok((
        Some(FileHeader {
            format_version,
            flags,
            timestamp,
            payload_len,
            checksum,
        }),
        payload,
    ))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
