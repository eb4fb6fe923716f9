//! Versioned snapshot encoding with an optional LZ4 pass.
//!
//! Layout of an uncompressed payload:
//!
//! ```text
//! [0]   : SNAPSHOT_VERSION
//! [1..] : bincode(Vec<(name, EntityState)>) in name order
//! ```
//!
//! With compression on, that whole buffer is LZ4 block-compressed and
//! prefixed with its uncompressed length as a little-endian `u32`.

use crate::snapshot::{EntityState, Snapshot};
use crate::{MAX_DATAGRAM, USE_COMPRESSION};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const SNAPSHOT_VERSION: u8 = 1;

/// Upper bound on a decompressed snapshot. Anything larger is rejected
/// before allocation.
pub const MAX_SNAPSHOT_BYTES: usize = 4 * MAX_DATAGRAM;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    #[error("unknown snapshot version {0}")]
    UnknownVersion(u8),
    #[error("declared size {0} exceeds limit")]
    Oversized(usize),
    #[error("decompression failed: {0}")]
    Decompress(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("winner descriptor is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] bincode::Error),
    #[error("encoded frame is {len} bytes, larger than one datagram")]
    Oversized { len: usize },
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_SNAPSHOT_BYTES as u64)
        .reject_trailing_bytes()
}

pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodeError> {
    Ok(options().serialize(value)?)
}

pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    options()
        .deserialize(bytes)
        .map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Snapshot encoder/decoder. Both ends must be built with the same
/// `compress` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotCodec {
    pub compress: bool,
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self {
            compress: USE_COMPRESSION,
        }
    }
}

impl SnapshotCodec {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    pub fn encode(&self, snapshot: &Snapshot) -> Result<Vec<u8>, EncodeError> {
        let entries: Vec<(&String, &EntityState)> = snapshot.iter().collect();

        let mut body = Vec::with_capacity(1 + entries.len() * 32);
        body.push(SNAPSHOT_VERSION);
        body.extend(serialize(&entries)?);

        if self.compress {
            Ok(lz4_flex::block::compress_prepend_size(&body))
        } else {
            Ok(body)
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Snapshot, DecodeError> {
        if self.compress {
            let body = decompress(bytes)?;
            decode_body(&body)
        } else {
            decode_body(bytes)
        }
    }
}

fn decompress(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::Truncated {
            needed: 4,
            got: bytes.len(),
        });
    }

    let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if declared > MAX_SNAPSHOT_BYTES {
        return Err(DecodeError::Oversized(declared));
    }

    lz4_flex::block::decompress_size_prepended(bytes)
        .map_err(|e| DecodeError::Decompress(e.to_string()))
}

fn decode_body(body: &[u8]) -> Result<Snapshot, DecodeError> {
    let (&version, rest) = body.split_first().ok_or(DecodeError::Truncated {
        needed: 1,
        got: 0,
    })?;

    if version != SNAPSHOT_VERSION {
        return Err(DecodeError::UnknownVersion(version));
    }

    let entries: Vec<(String, EntityState)> = deserialize(rest)?;
    Ok(entries.into_iter().collect())
}
