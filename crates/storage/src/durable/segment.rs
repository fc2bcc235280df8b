//! Segment file handle.
//!
//! A segment is one file of frames behind a [`SegmentHeader`]. Only the
//! newest segment is ever appended to.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::format::{SegmentHeader, SEGMENT_HEADER_SIZE};

/// Segment file handle.
#[derive(Debug)]
pub struct Segment {
    file: File,
    header: SegmentHeader,
    /// Current write position (bytes from start)
    write_position: u64,
    path: PathBuf,
    /// Set when bytes from a failed write could not be cut off again
    poisoned: bool,
    #[cfg(test)]
    faults: Faults,
}

/// I/O failures injected by tests
#[cfg(test)]
#[derive(Debug, Default)]
struct Faults {
    /// Write only this many bytes of the next write, then fail
    short_write: Option<usize>,
    /// Fail the next sync
    fail_sync: bool,
}

impl Segment {
    /// Create a new segment and write its header.
    pub fn create(dir: &Path, segment_number: u64, store_id: [u8; 16]) -> io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .read(true)
            .open(&path)?;

        let header = SegmentHeader::new(segment_number, store_id);
        file.write_all(&header.to_bytes())?;

        Ok(Segment {
            file,
            header,
            write_position: SEGMENT_HEADER_SIZE as u64,
            path,
            poisoned: false,
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Open an existing segment, positioned at its end for appending.
    pub fn open_append(dir: &Path, segment_number: u64) -> io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let header = read_header(&mut file)?;
        let write_position = file.seek(SeekFrom::End(0))?;

        Ok(Segment {
            file,
            header,
            write_position,
            path,
            poisoned: false,
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Open an existing segment for reading.
    pub fn open_read(dir: &Path, segment_number: u64) -> io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);
        let mut file = File::open(&path)?;
        let header = read_header(&mut file)?;
        let write_position = file.metadata()?.len();

        Ok(Segment {
            file,
            header,
            write_position,
            path,
            poisoned: false,
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Segment file path: `log-NNNNNN.seg`
    pub fn segment_path(dir: &Path, segment_number: u64) -> PathBuf {
        dir.join(format!("log-{:06}.seg", segment_number))
    }

    /// Segment numbers present in `dir`, ascending
    pub fn list(dir: &Path) -> io::Result<Vec<u64>> {
        let mut numbers = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(number) = name
                .strip_prefix("log-")
                .and_then(|rest| rest.strip_suffix(".seg"))
                .and_then(|n| n.parse::<u64>().ok())
            {
                numbers.push(number);
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Header read or written for this segment
    pub fn header(&self) -> &SegmentHeader {
        &self.header
    }

    /// Segment number
    pub fn number(&self) -> u64 {
        self.header.segment_number
    }

    /// Current segment size in bytes
    pub fn size(&self) -> u64 {
        self.write_position
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append bytes at the end of the segment.
    ///
    /// On failure nothing of `data` is left in the file.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if self.poisoned {
            return Err(io::Error::other(format!(
                "segment {} has unremovable bytes from a failed write",
                self.number()
            )));
        }
        if let Err(e) = self.write_through(data) {
            self.discard_from(self.write_position);
            return Err(e);
        }
        self.write_position += data.len() as u64;
        Ok(())
    }

    /// Drop everything from `position` on after a failed append.
    ///
    /// If the cut itself fails the segment refuses further writes.
    pub fn discard_from(&mut self, position: u64) {
        if let Err(e) = self.truncate(position) {
            warn!(
                error = %e,
                path = %self.path.display(),
                "Failed to discard bytes of a failed write"
            );
            self.poisoned = true;
        }
    }

    /// Sync segment data to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        self.sync_through()
    }

    #[cfg(not(test))]
    fn write_through(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)
    }

    #[cfg(not(test))]
    fn sync_through(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }

    #[cfg(test)]
    fn write_through(&mut self, data: &[u8]) -> io::Result<()> {
        if let Some(written) = self.faults.short_write.take() {
            self.file.write_all(&data[..written.min(data.len())])?;
            return Err(io::Error::new(io::ErrorKind::WriteZero, "injected short write"));
        }
        self.file.write_all(data)
    }

    #[cfg(test)]
    fn sync_through(&mut self) -> io::Result<()> {
        if std::mem::take(&mut self.faults.fail_sync) {
            return Err(io::Error::other("injected sync failure"));
        }
        self.file.sync_all()
    }

    /// Make the next write stop after `written` bytes and fail
    #[cfg(test)]
    pub(crate) fn fail_next_write_after(&mut self, written: usize) {
        self.faults.short_write = Some(written);
    }

    /// Make the next sync fail
    #[cfg(test)]
    pub(crate) fn fail_next_sync(&mut self) {
        self.faults.fail_sync = true;
    }

    /// Everything after the header.
    pub fn read_body(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.file.seek(SeekFrom::Start(SEGMENT_HEADER_SIZE as u64))?;
        self.file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Cut the segment at `position`, dropping a torn tail.
    pub fn truncate(&mut self, position: u64) -> io::Result<()> {
        self.file.set_len(position)?;
        self.write_position = position;
        self.file.seek(SeekFrom::Start(position))?;
        Ok(())
    }
}

fn read_header(file: &mut File) -> io::Result<SegmentHeader> {
    let mut header_bytes = [0u8; SEGMENT_HEADER_SIZE];
    file.read_exact(&mut header_bytes)?;

    let header = SegmentHeader::from_bytes(&header_bytes)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Invalid segment header"))?;
    if !header.is_valid() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Invalid segment magic or version",
        ));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut segment = Segment::create(dir.path(), 1, [3u8; 16]).unwrap();
        segment.write(b"hello").unwrap();
        assert_eq!(segment.size(), SEGMENT_HEADER_SIZE as u64 + 5);
        drop(segment);

        let mut segment = Segment::open_append(dir.path(), 1).unwrap();
        assert_eq!(segment.number(), 1);
        assert_eq!(segment.header().store_id, [3u8; 16]);
        assert_eq!(segment.size(), SEGMENT_HEADER_SIZE as u64 + 5);
        assert_eq!(segment.read_body().unwrap(), b"hello");
    }

    #[test]
    fn test_create_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        Segment::create(dir.path(), 1, [0u8; 16]).unwrap();
        assert!(Segment::create(dir.path(), 1, [0u8; 16]).is_err());
    }

    #[test]
    fn test_list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        Segment::create(dir.path(), 2, [0u8; 16]).unwrap();
        Segment::create(dir.path(), 10, [0u8; 16]).unwrap();
        std::fs::write(dir.path().join("logbook.toml"), "").unwrap();
        std::fs::write(dir.path().join("log-abc.seg"), "").unwrap();

        assert_eq!(Segment::list(dir.path()).unwrap(), vec![2, 10]);
    }

    #[test]
    fn test_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let mut segment = Segment::create(dir.path(), 1, [0u8; 16]).unwrap();
        segment.write(b"0123456789").unwrap();
        segment.truncate(SEGMENT_HEADER_SIZE as u64 + 4).unwrap();
        assert_eq!(segment.read_body().unwrap(), b"0123");
    }

    #[test]
    fn test_short_write_is_cut_off() {
        let dir = tempfile::tempdir().unwrap();
        let mut segment = Segment::create(dir.path(), 1, [0u8; 16]).unwrap();
        segment.write(b"first").unwrap();

        segment.fail_next_write_after(3);
        assert!(segment.write(b"second").is_err());
        assert_eq!(segment.size(), SEGMENT_HEADER_SIZE as u64 + 5);

        segment.write(b"third").unwrap();
        assert_eq!(segment.read_body().unwrap(), b"firstthird");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Segment::segment_path(dir.path(), 1), [0u8; 40]).unwrap();
        let err = Segment::open_read(dir.path(), 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
