//! # In-Memory Media Source
//!
//! Exposes an owned part blob as a pull-based, seekable byte source for the
//! container demuxer.

use bytes::Bytes;
use std::io::{self, Read, Seek, SeekFrom};
use symphonia::core::io::MediaSource;

/// Default per-call transfer size handed to the demuxer (4 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Outcome of a single pull from a [`ByteBufferSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRead {
    /// This many bytes were copied into the caller's buffer.
    Data(usize),
    /// The cursor is at or past the end; nothing was copied.
    EndOfStream,
}

/// Seek requests understood by [`ByteBufferSource::seek_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekRequest {
    /// Report the total buffer length without moving the cursor.
    ReportSize,
    /// Move the cursor to an absolute position, clamped to `[0, len]`.
    Absolute(i64),
}

/// Owned byte buffer with a read cursor.
///
/// Out-of-range seeks clamp instead of failing, since demuxers probe past the
/// end while sniffing formats.
#[derive(Debug, Clone)]
pub struct ByteBufferSource {
    data: Bytes,
    position: usize,
    chunk_size: usize,
}

impl ByteBufferSource {
    /// Create a source over `data` with the default 4 KiB transfer chunk.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_chunk_size(data, DEFAULT_CHUNK_SIZE)
    }

    /// Create a source with a custom per-call transfer chunk.
    ///
    /// A zero chunk size falls back to [`DEFAULT_CHUNK_SIZE`].
    pub fn with_chunk_size(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            position: 0,
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size
            },
        }
    }

    /// Total buffer length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Per-call transfer chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Copy `min(out.len(), remaining)` bytes and advance the cursor.
    pub fn read_into(&mut self, out: &mut [u8]) -> SourceRead {
        let remaining = self.data.len().saturating_sub(self.position);
        let count = out.len().min(remaining);
        if count == 0 {
            return SourceRead::EndOfStream;
        }

        out[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        SourceRead::Data(count)
    }

    /// Apply a seek request and return the resulting value.
    ///
    /// [`SeekRequest::ReportSize`] returns the buffer length; an absolute
    /// seek returns the clamped position now in effect.
    pub fn seek_to(&mut self, request: SeekRequest) -> u64 {
        match request {
            SeekRequest::ReportSize => self.data.len() as u64,
            SeekRequest::Absolute(offset) => {
                let clamped = offset.clamp(0, self.data.len() as i64);
                self.position = clamped as usize;
                clamped as u64
            }
        }
    }
}

impl Read for ByteBufferSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = buf.len().min(self.chunk_size);
        match self.read_into(&mut buf[..limit]) {
            SourceRead::Data(count) => Ok(count),
            // std readers signal end of stream with a zero-length read
            SourceRead::EndOfStream => Ok(0),
        }
    }
}

impl Seek for ByteBufferSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            SeekFrom::Current(delta) => (self.position as i64).saturating_add(delta),
            SeekFrom::End(delta) => (self.data.len() as i64).saturating_add(delta),
        };
        Ok(self.seek_to(SeekRequest::Absolute(target)))
    }
}

impl MediaSource for ByteBufferSource {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_advances_cursor() {
        let mut source = ByteBufferSource::new(vec![1u8, 2, 3, 4, 5]);
        let mut out = [0u8; 3];

        assert_eq!(source.read_into(&mut out), SourceRead::Data(3));
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(source.position(), 3);

        assert_eq!(source.read_into(&mut out), SourceRead::Data(2));
        assert_eq!(&out[..2], &[4, 5]);
        assert_eq!(source.read_into(&mut out), SourceRead::EndOfStream);
    }

    #[test]
    fn test_empty_buffer_is_end_of_stream() {
        let mut source = ByteBufferSource::new(Vec::new());
        let mut out = [0u8; 8];
        assert!(source.is_empty());
        assert_eq!(source.read_into(&mut out), SourceRead::EndOfStream);
    }

    #[test]
    fn test_seek_clamps_to_bounds() {
        let mut source = ByteBufferSource::new(vec![0u8; 10]);

        assert_eq!(source.seek_to(SeekRequest::Absolute(25)), 10);
        assert_eq!(source.position(), 10);

        assert_eq!(source.seek_to(SeekRequest::Absolute(-4)), 0);
        assert_eq!(source.position(), 0);

        assert_eq!(source.seek_to(SeekRequest::Absolute(6)), 6);
        assert_eq!(source.position(), 6);
    }

    #[test]
    fn test_report_size_keeps_cursor() {
        let mut source = ByteBufferSource::new(vec![0u8; 10]);
        source.seek_to(SeekRequest::Absolute(4));
        assert_eq!(source.seek_to(SeekRequest::ReportSize), 10);
        assert_eq!(source.position(), 4);
    }

    #[test]
    fn test_std_read_is_chunked() {
        let mut source = ByteBufferSource::with_chunk_size(vec![7u8; 10_000], 4096);
        let mut out = vec![0u8; 10_000];

        assert_eq!(source.read(&mut out).unwrap(), 4096);
        assert_eq!(source.read(&mut out).unwrap(), 4096);
        assert_eq!(source.read(&mut out).unwrap(), 1808);
        assert_eq!(source.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_std_seek_variants() {
        let mut source = ByteBufferSource::new(vec![0u8; 100]);
        assert_eq!(source.seek(SeekFrom::End(-10)).unwrap(), 90);
        assert_eq!(source.seek(SeekFrom::Current(-200)).unwrap(), 0);
        assert_eq!(source.seek(SeekFrom::Start(u64::MAX)).unwrap(), 100);
        assert_eq!(source.byte_len(), Some(100));
        assert!(source.is_seekable());
    }
}
