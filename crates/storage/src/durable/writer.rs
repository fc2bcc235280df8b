//! Segment writer with durability mode support.
//!
//! Appends frames to the newest segment and rotates to a fresh segment
//! once the configured size would be exceeded. Closed segments are never
//! written again.

use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::config::{DurabilityMode, DurableConfig};
use super::format::SEGMENT_HEADER_SIZE;
use super::segment::Segment;

/// Cumulative writer counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterCounters {
    /// Frames appended
    pub appends: u64,
    /// fsync calls
    pub sync_calls: u64,
    /// Bytes written to segments
    pub bytes_written: u64,
    /// Segment rotations
    pub rotations: u64,
}

/// Appends frames to segment files.
#[derive(Debug)]
pub struct SegmentWriter {
    segment: Segment,
    dir: PathBuf,
    store_id: [u8; 16],
    segment_size: u64,
    sync_bytes: u64,
    durability: DurabilityMode,
    /// Bytes written since last fsync (Standard mode)
    bytes_since_sync: u64,
    counters: WriterCounters,
}

impl SegmentWriter {
    /// Open a writer.
    ///
    /// Appends to `last_segment` when given, otherwise creates segment 1.
    pub fn open(
        config: &DurableConfig,
        store_id: [u8; 16],
        last_segment: Option<u64>,
    ) -> io::Result<Self> {
        let dir = config.data_dir.clone();
        let segment = match last_segment {
            Some(number) => Segment::open_append(&dir, number)?,
            None => Segment::create(&dir, 1, store_id)?,
        };
        debug!(
            segment = segment.number(),
            size = segment.size(),
            "Segment writer opened"
        );

        Ok(SegmentWriter {
            segment,
            dir,
            store_id,
            segment_size: config.segment_size,
            sync_bytes: config.sync_bytes,
            durability: config.durability,
            bytes_since_sync: 0,
            counters: WriterCounters::default(),
        })
    }

    /// Append one encoded frame.
    ///
    /// Respects the durability mode:
    /// - `Always`: writes and fsyncs before returning
    /// - `Standard`: writes, fsyncs once `sync_bytes` have accumulated
    ///
    /// A failed append leaves none of the frame behind, so the record is
    /// neither acknowledged nor replayed on reopen.
    pub fn append(&mut self, frame: &[u8]) -> io::Result<()> {
        let has_frames = self.segment.size() > SEGMENT_HEADER_SIZE as u64;
        if has_frames && self.segment.size() + frame.len() as u64 > self.segment_size {
            self.rotate()?;
        }

        let frame_len = frame.len() as u64;
        let needs_sync = match self.durability {
            DurabilityMode::Always => true,
            DurabilityMode::Standard => self.bytes_since_sync + frame_len >= self.sync_bytes,
        };

        let start = self.segment.size();
        self.segment.write(frame)?;
        if needs_sync {
            if let Err(e) = self.flush() {
                self.segment.discard_from(start);
                return Err(e);
            }
        } else {
            self.bytes_since_sync += frame_len;
        }

        self.counters.appends += 1;
        self.counters.bytes_written += frame_len;
        Ok(())
    }

    /// Seal the current segment and start the next one.
    fn rotate(&mut self) -> io::Result<()> {
        self.flush()?;
        let next = self.segment.number() + 1;
        self.segment = Segment::create(&self.dir, next, self.store_id)?;
        self.counters.rotations += 1;
        debug!(segment = next, "Rotated to new segment");
        Ok(())
    }

    /// Force written frames to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        self.segment.sync()?;
        self.counters.sync_calls += 1;
        self.bytes_since_sync = 0;
        Ok(())
    }

    /// Current segment number
    pub fn current_segment(&self) -> u64 {
        self.segment.number()
    }

    /// Counter snapshot
    pub fn counters(&self) -> WriterCounters {
        self.counters.clone()
    }

    #[cfg(test)]
    pub(crate) fn segment_mut(&mut self) -> &mut Segment {
        &mut self.segment
    }

    /// Flush and close.
    pub fn close(mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Drop for SegmentWriter {
    fn drop(&mut self) {
        if self.bytes_since_sync > 0 {
            if let Err(e) = self.segment.sync() {
                warn!(error = %e, path = %self.segment.path().display(), "Final segment sync failed");
            }
        }
    }
}
