//! Segment file and record frame format.
//!
//! Segments are named `log-NNNNNN.seg` where `NNNNNN` is a zero-padded
//! segment number.
//!
//! # Segment Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Segment Header (32 bytes)          │
//! ├────────────────────────────────────┤
//! │ Frame 1                            │
//! ├────────────────────────────────────┤
//! │ Frame 2                            │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! # Header Layout
//!
//! ```text
//! ┌──────────────┬──────────────────┬──────────────────┬───────────────────┐
//! │ Magic "LGBK" │ Format Ver (u32) │ Segment No (u64) │ Store UUID (16)   │
//! └──────────────┴──────────────────┴──────────────────┴───────────────────┘
//! ```
//!
//! # Frame Layout
//!
//! ```text
//! ┌─────────────────┬──────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Format Ver (1)   │ Payload (variable)      │ CRC32 (4)│
//! └─────────────────┴──────────────────┴─────────────────────────┴──────────┘
//! ```
//!
//! Length counts everything after itself. The CRC covers the format byte
//! and the payload. The payload is the MessagePack encoding of a
//! [`LogRecord`] with named fields. All integers are little-endian.

use crc32fast::Hasher;

use logbook_core::LogRecord;

/// Magic bytes identifying a segment file: "LGBK"
pub const SEGMENT_MAGIC: [u8; 4] = *b"LGBK";

/// Current segment format version
pub const SEGMENT_FORMAT_VERSION: u32 = 1;

/// Size of segment header in bytes
pub const SEGMENT_HEADER_SIZE: usize = 32;

/// Current frame format version
pub const FRAME_FORMAT_VERSION: u8 = 1;

/// Upper bound on a single frame, used to tell garbage lengths from real ones
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Segment header (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Magic bytes: "LGBK"
    pub magic: [u8; 4],
    /// Format version for forward compatibility
    pub format_version: u32,
    /// Segment number (monotonically increasing)
    pub segment_number: u64,
    /// Store UUID, identical across all segments of one store
    pub store_id: [u8; 16],
}

impl SegmentHeader {
    /// Create a new segment header.
    pub fn new(segment_number: u64, store_id: [u8; 16]) -> Self {
        SegmentHeader {
            magic: SEGMENT_MAGIC,
            format_version: SEGMENT_FORMAT_VERSION,
            segment_number,
            store_id,
        }
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; SEGMENT_HEADER_SIZE] {
        let mut bytes = [0u8; SEGMENT_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.segment_number.to_le_bytes());
        bytes[16..32].copy_from_slice(&self.store_id);
        bytes
    }

    /// Deserialize header from bytes.
    pub fn from_bytes(bytes: &[u8; SEGMENT_HEADER_SIZE]) -> Option<Self> {
        Some(SegmentHeader {
            magic: bytes[0..4].try_into().ok()?,
            format_version: u32::from_le_bytes(bytes[4..8].try_into().ok()?),
            segment_number: u64::from_le_bytes(bytes[8..16].try_into().ok()?),
            store_id: bytes[16..32].try_into().ok()?,
        })
    }

    /// Magic and version are ones this build understands.
    pub fn is_valid(&self) -> bool {
        self.magic == SEGMENT_MAGIC && self.format_version == SEGMENT_FORMAT_VERSION
    }
}

/// Frame decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Not enough bytes for a full frame (torn write at the tail)
    #[error("Insufficient data for frame")]
    InsufficientData,

    /// Length field is impossible
    #[error("Invalid frame length {0}")]
    InvalidLength(usize),

    /// CRC did not match
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// CRC stored in the frame
        expected: u32,
        /// CRC computed over the frame
        actual: u32,
    },

    /// Frame written by a newer format
    #[error("Unsupported frame version {0}")]
    UnsupportedVersion(u8),

    /// CRC was fine but the payload did not decode
    #[error("Payload decode failed: {0}")]
    Decode(String),
}

/// Encode a record as one frame.
pub fn encode_frame(record: &LogRecord) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    let payload = rmp_serde::to_vec_named(record)?;

    // format byte + payload + crc
    let length = 1 + payload.len() + 4;
    let mut frame = Vec::with_capacity(4 + length);
    frame.extend_from_slice(&(length as u32).to_le_bytes());
    frame.push(FRAME_FORMAT_VERSION);
    frame.extend_from_slice(&payload);

    let crc = checksum(&frame[4..]);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// Decode the frame at the start of `bytes`.
///
/// Returns the record and the number of bytes consumed.
pub fn decode_frame(bytes: &[u8]) -> Result<(LogRecord, usize), FrameError> {
    let length = frame_length(bytes)?;
    if length < 5 || length > MAX_FRAME_SIZE {
        // Minimum: 1 byte format version + 4 bytes CRC
        return Err(FrameError::InvalidLength(length));
    }
    if bytes.len() < 4 + length {
        return Err(FrameError::InsufficientData);
    }

    let body = &bytes[4..4 + length - 4];
    let stored_crc = u32::from_le_bytes(read4(&bytes[4 + length - 4..]));
    let computed_crc = checksum(body);
    if stored_crc != computed_crc {
        return Err(FrameError::ChecksumMismatch {
            expected: stored_crc,
            actual: computed_crc,
        });
    }

    let version = body[0];
    if version != FRAME_FORMAT_VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }

    let record: LogRecord =
        rmp_serde::from_slice(&body[1..]).map_err(|e| FrameError::Decode(e.to_string()))?;
    Ok((record, 4 + length))
}

/// Length field of the frame at the start of `bytes`
pub fn frame_length(bytes: &[u8]) -> Result<usize, FrameError> {
    if bytes.len() < 4 {
        return Err(FrameError::InsufficientData);
    }
    Ok(u32::from_le_bytes(read4(bytes)) as usize)
}

fn read4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
