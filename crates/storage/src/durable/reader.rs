//! Segment replay on open.
//!
//! Reads every segment in order and rebuilds the record list:
//! - a torn frame at the end of the newest segment is truncated away
//! - a newest segment too short to hold its header (crash during rotation)
//!   is removed
//! - a frame with a bad checksum but a plausible length is skipped
//! - anything else that cannot be read is reported as corruption

use std::fs;
use std::path::Path;

use tracing::warn;

use logbook_core::{Error, LogRecord, Result};

use super::format::{decode_frame, frame_length, FrameError, MAX_FRAME_SIZE, SEGMENT_HEADER_SIZE};
use super::segment::Segment;

/// State rebuilt from disk
#[derive(Debug, Default)]
pub struct Recovered {
    /// Records in write order
    pub records: Vec<LogRecord>,
    /// Store UUID from the segment headers; `None` for an empty directory
    pub store_id: Option<[u8; 16]>,
    /// Highest segment number found
    pub last_segment: Option<u64>,
    /// Bytes dropped from a torn tail
    pub truncated_bytes: u64,
    /// Frames skipped for checksum mismatches
    pub skipped_frames: usize,
}

/// Why a segment scan stopped
#[derive(Debug, Clone, PartialEq, Eq)]
enum StopReason {
    EndOfData,
    PartialFrame,
}

/// Replay every segment in `dir`.
pub fn recover(dir: &Path) -> Result<Recovered> {
    let mut segments = Segment::list(dir)?;
    drop_torn_header(dir, &mut segments)?;
    let mut recovered = Recovered::default();

    for (idx, &number) in segments.iter().enumerate() {
        let is_last = idx + 1 == segments.len();
        let mut segment = Segment::open_read(dir, number).map_err(|e| {
            Error::Corruption(format!("segment {}: {}", number, e))
        })?;

        let store_id = segment.header().store_id;
        match recovered.store_id {
            None => recovered.store_id = Some(store_id),
            Some(expected) if expected != store_id => {
                return Err(Error::Corruption(format!(
                    "segment {} belongs to a different store",
                    number
                )));
            }
            Some(_) => {}
        }

        let body = segment.read_body()?;
        let (valid_end, stop) = scan_body(&body, number, &mut recovered)?;

        if stop == StopReason::PartialFrame {
            if !is_last {
                return Err(Error::Corruption(format!(
                    "segment {} ends in a partial frame but is not the newest segment",
                    number
                )));
            }
            let dropped = body.len() - valid_end;
            warn!(
                segment = number,
                bytes = dropped,
                "Truncating partial frame at segment tail"
            );
            drop(segment);
            let mut segment = Segment::open_append(dir, number)?;
            segment.truncate((SEGMENT_HEADER_SIZE + valid_end) as u64)?;
            segment.sync()?;
            recovered.truncated_bytes += dropped as u64;
        }

        recovered.last_segment = Some(number);
    }

    Ok(recovered)
}

/// Remove the newest segment if its header was never fully written.
///
/// Rotation creates the file before writing the header, so a crash in
/// between leaves a short file holding no frames.
fn drop_torn_header(dir: &Path, segments: &mut Vec<u64>) -> Result<()> {
    let Some(&number) = segments.last() else {
        return Ok(());
    };
    let path = Segment::segment_path(dir, number);
    let len = fs::metadata(&path)?.len();
    if len >= SEGMENT_HEADER_SIZE as u64 {
        return Ok(());
    }

    warn!(
        segment = number,
        bytes = len,
        "Removing segment with a torn header"
    );
    fs::remove_file(&path)?;
    segments.pop();
    Ok(())
}

/// Decode frames from one segment body.
///
/// Returns the offset where valid data ends and why the scan stopped.
fn scan_body(
    body: &[u8],
    segment_number: u64,
    recovered: &mut Recovered,
) -> Result<(usize, StopReason)> {
    let mut offset = 0;

    while offset < body.len() {
        let remaining = &body[offset..];
        match decode_frame(remaining) {
            Ok((record, consumed)) => {
                recovered.records.push(record);
                offset += consumed;
            }
            Err(FrameError::InsufficientData) => {
                return Ok((offset, StopReason::PartialFrame));
            }
            Err(FrameError::ChecksumMismatch { .. }) => {
                let length = frame_length(remaining).unwrap_or(0);
                if length == 0 || length > MAX_FRAME_SIZE || remaining.len() < 4 + length {
                    return Err(Error::Corruption(format!(
                        "segment {}: unrecoverable checksum mismatch at offset {}",
                        segment_number, offset
                    )));
                }
                warn!(
                    segment = segment_number,
                    offset = offset,
                    "Skipping corrupted frame (checksum mismatch)"
                );
                recovered.skipped_frames += 1;
                offset += 4 + length;
            }
            Err(e) => {
                return Err(Error::Corruption(format!(
                    "segment {} at offset {}: {}",
                    segment_number, offset, e
                )));
            }
        }
    }

    Ok((offset, StopReason::EndOfData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::format::encode_frame;
    use chrono::{TimeZone, Utc};

    fn record(i: u32) -> LogRecord {
        LogRecord::new(
            "info",
            format!("message {}", i),
            Utc.with_ymd_and_hms(2023, 9, 15, 8, i, 0).unwrap(),
        )
    }

    fn write_segment(dir: &Path, number: u64, store_id: [u8; 16], frames: &[Vec<u8>]) {
        let mut segment = Segment::create(dir, number, store_id).unwrap();
        for frame in frames {
            segment.write(frame).unwrap();
        }
        segment.sync().unwrap();
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let recovered = recover(dir.path()).unwrap();
        assert!(recovered.records.is_empty());
        assert!(recovered.store_id.is_none());
        assert!(recovered.last_segment.is_none());
    }

    #[test]
    fn test_reads_segments_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<Vec<u8>> = (0..3).map(|i| encode_frame(&record(i)).unwrap()).collect();
        write_segment(dir.path(), 2, [1u8; 16], &frames[2..]);
        write_segment(dir.path(), 1, [1u8; 16], &frames[..2]);

        let recovered = recover(dir.path()).unwrap();
        let messages: Vec<&str> = recovered.records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["message 0", "message 1", "message 2"]);
        assert_eq!(recovered.last_segment, Some(2));
        assert_eq!(recovered.store_id, Some([1u8; 16]));
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let good = encode_frame(&record(0)).unwrap();
        let torn = encode_frame(&record(1)).unwrap();
        write_segment(dir.path(), 1, [1u8; 16], &[good.clone(), torn[..7].to_vec()]);

        let recovered = recover(dir.path()).unwrap();
        assert_eq!(recovered.records.len(), 1);
        assert_eq!(recovered.truncated_bytes, 7);

        let len = std::fs::metadata(Segment::segment_path(dir.path(), 1))
            .unwrap()
            .len();
        assert_eq!(len, (SEGMENT_HEADER_SIZE + good.len()) as u64);
    }

    #[test]
    fn test_corrupted_frame_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = encode_frame(&record(0)).unwrap();
        let mid = bad.len() / 2;
        bad[mid] ^= 0xFF;
        let good = encode_frame(&record(1)).unwrap();
        write_segment(dir.path(), 1, [1u8; 16], &[bad, good]);

        let recovered = recover(dir.path()).unwrap();
        assert_eq!(recovered.skipped_frames, 1);
        assert_eq!(recovered.records.len(), 1);
        assert_eq!(recovered.records[0].message, "message 1");
    }

    #[test]
    fn test_mixed_store_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_segment(dir.path(), 1, [1u8; 16], &[]);
        write_segment(dir.path(), 2, [2u8; 16], &[]);

        let err = recover(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Corruption(_)));
    }

    #[test]
    fn test_partial_frame_in_old_segment_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let torn = encode_frame(&record(0)).unwrap();
        write_segment(dir.path(), 1, [1u8; 16], &[torn[..5].to_vec()]);
        write_segment(dir.path(), 2, [1u8; 16], &[]);

        assert!(matches!(recover(dir.path()), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_torn_header_in_newest_segment_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let frame = encode_frame(&record(0)).unwrap();
        write_segment(dir.path(), 1, [1u8; 16], &[frame]);
        let torn = Segment::segment_path(dir.path(), 2);
        std::fs::write(&torn, b"LGBK\x01\x00").unwrap();

        let recovered = recover(dir.path()).unwrap();
        assert_eq!(recovered.records.len(), 1);
        assert_eq!(recovered.last_segment, Some(1));
        assert!(!torn.exists());
    }

    #[test]
    fn test_torn_header_only_segment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Segment::segment_path(dir.path(), 1), b"LG").unwrap();

        let recovered = recover(dir.path()).unwrap();
        assert!(recovered.records.is_empty());
        assert!(recovered.last_segment.is_none());
        assert!(Segment::list(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_short_older_segment_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Segment::segment_path(dir.path(), 1), b"LGBK").unwrap();
        write_segment(dir.path(), 2, [1u8; 16], &[]);

        assert!(matches!(recover(dir.path()), Err(Error::Corruption(_))));
    }
}
