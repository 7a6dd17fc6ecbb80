//! Bounded, absolutely positioned reads over one open source.

use std::io::{Read, Seek, SeekFrom};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mb_core::ReadChunk;

use crate::resolver::MediaSource;

/// Raw result of one bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRead {
    pub offset: u64,
    pub bytes: Vec<u8>,
    pub eof: bool,
}

impl RangeRead {
    /// No bytes at `offset`, end of file.
    pub fn empty_eof(offset: u64) -> Self {
        Self {
            offset,
            bytes: Vec::new(),
            eof: true,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Encode into the bridge wire shape (standard, padded base64).
    pub fn into_chunk(self) -> ReadChunk {
        ReadChunk {
            offset: self.offset,
            bytes_read: self.bytes_read(),
            eof: self.eof,
            base64: STANDARD.encode(&self.bytes),
        }
    }
}

/// Wraps one open source and services seek-then-read requests against it.
///
/// No cursor is carried between calls: every read seeks to its own absolute
/// offset first. `size` is the length captured at open time and is never
/// re-validated.
pub struct ByteRangeReader {
    source: Box<dyn MediaSource>,
    size: u64,
    max_read: u64,
    released: bool,
}

impl ByteRangeReader {
    pub fn new(source: Box<dyn MediaSource>, size: u64, max_read: u64) -> Self {
        Self {
            source,
            size,
            max_read,
            released: false,
        }
    }

    /// Whether [`release`](Self::release) has run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Requested length after applying the per-call cap.
    pub fn clamp(&self, length: u64) -> u64 {
        length.min(self.max_read)
    }

    /// Read up to `length` bytes (clamped) starting at `offset`.
    ///
    /// A read that yields zero bytes is reported as end-of-file. Otherwise
    /// `eof` is `offset + bytes_read >= size`. A zero-length request does no
    /// I/O and reports `eof` purely from `size`. Offsets at or past `size`
    /// never touch the source.
    pub fn read_at(&mut self, offset: u64, length: u64) -> std::io::Result<RangeRead> {
        if offset >= self.size {
            return Ok(RangeRead::empty_eof(offset));
        }
        let length = self.clamp(length);
        if length == 0 {
            return Ok(RangeRead {
                offset,
                bytes: Vec::new(),
                eof: false,
            });
        }

        self.source.seek(SeekFrom::Start(offset))?;

        let expected = self.size.saturating_sub(offset).min(length);
        let mut bytes = Vec::with_capacity(expected as usize);
        (&mut self.source).take(length).read_to_end(&mut bytes)?;

        if bytes.is_empty() {
            return Ok(RangeRead::empty_eof(offset));
        }

        let eof = offset.saturating_add(bytes.len() as u64) >= self.size;
        Ok(RangeRead { offset, bytes, eof })
    }

    /// Release the underlying resource. Only the first call reaches the
    /// source.
    pub fn release(&mut self) -> std::io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.source.release()
    }
}

impl std::fmt::Debug for ByteRangeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteRangeReader")
            .field("size", &self.size)
            .field("max_read", &self.max_read)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
