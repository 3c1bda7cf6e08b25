//! Stream bridge between byte-stream sources/sinks and the codec
//! layer.
//!
//! The codec adapters operate on one `Read + Seek` (input) or
//! `Write + Seek` (output) shape regardless of whether the bytes live
//! in a disk file or an in-memory buffer. Random access is required by
//! some container formats, so sequential streams are rejected at the
//! engine boundary; the backends provided here are all seekable.

use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

/// Default scratch-buffer size, in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 10 * 1024;

/// Fixed-size scratch buffer reused for every block transfer of a
/// session.
///
/// Allocated once when a session starts, never per call; the engine
/// guarantees at most one scratch-buffer's worth of entry data is in
/// memory at a time.
#[derive(Debug)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
}

impl ScratchBuffer {
    /// Allocates a scratch buffer of `block_size` bytes.
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        Self {
            buf: vec![0u8; block_size.max(1)],
        }
    }

    /// The buffer as a mutable slice for block reads.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Configured block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.buf.len()
    }
}

/// Readable, seekable archive input backed by a disk file or a shared
/// in-memory buffer.
#[derive(Debug)]
pub enum SourceStream {
    /// A file opened by the bridge; closed when the stream drops.
    Disk {
        /// Open file handle.
        file: File,
        /// Path the file was opened from, kept for re-opening.
        path: PathBuf,
    },
    /// A caller-supplied buffer; ownership stays shared with the
    /// caller.
    Memory(Cursor<Arc<[u8]>>),
}

impl SourceStream {
    /// Opens a disk-backed source.
    pub fn open_path(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::Disk {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Wraps a shared in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: Arc<[u8]>) -> Self {
        Self::Memory(Cursor::new(bytes))
    }

    /// Opens an independent second stream over the same bytes,
    /// positioned at the start. Used by the totals pre-pass and the
    /// metadata pass so the main pass keeps its own cursor.
    pub fn reopen(&self) -> std::io::Result<Self> {
        match self {
            Self::Disk { path, .. } => Self::open_path(path),
            Self::Memory(cursor) => Ok(Self::Memory(Cursor::new(Arc::clone(cursor.get_ref())))),
        }
    }

    /// Always `true` for the provided backends; part of the bridge
    /// contract.
    #[must_use]
    pub fn is_open(&self) -> bool {
        true
    }

    /// Always `true`; sources are read-only streams.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        true
    }

    /// Whether the stream only supports forward reads. Sequential
    /// streams cannot back an archive session and are rejected before
    /// a session starts; both provided backends are random access.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        false
    }
}

impl Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Disk { file, .. } => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for SourceStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Self::Disk { file, .. } => file.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

/// Writable, seekable archive output backed by a disk file or a
/// growable in-memory buffer.
#[derive(Debug)]
pub enum SinkStream {
    /// A file created by the bridge.
    Disk {
        /// Open file handle.
        file: File,
        /// Path the file was created at.
        path: PathBuf,
    },
    /// An in-memory buffer handed back to the caller on finish.
    Memory(Cursor<Vec<u8>>),
}

impl SinkStream {
    /// Creates a disk-backed sink, failing if the file cannot be
    /// created.
    pub fn create_path(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::Disk {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Cursor::new(Vec::new()))
    }

    /// Consumes the sink and returns the accumulated bytes for memory
    /// targets, or `None` for disk targets (whose bytes are already on
    /// disk).
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Disk { .. } => None,
            Self::Memory(cursor) => Some(cursor.into_inner()),
        }
    }

    /// Always `false`; sinks are random access.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        false
    }
}

impl Write for SinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Disk { file, .. } => file.write(buf),
            Self::Memory(cursor) => cursor.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Disk { file, .. } => file.flush(),
            Self::Memory(cursor) => cursor.flush(),
        }
    }
}

impl Seek for SinkStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            Self::Disk { file, .. } => file.seek(pos),
            Self::Memory(cursor) => cursor.seek(pos),
        }
    }
}

impl Read for SinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Disk { file, .. } => file.read(buf),
            Self::Memory(cursor) => cursor.read(buf),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_buffer_size() {
        let mut scratch = ScratchBuffer::new(4096);
        assert_eq!(scratch.block_size(), 4096);
        assert_eq!(scratch.as_mut_slice().len(), 4096);
    }

    #[test]
    fn test_scratch_buffer_never_empty() {
        let scratch = ScratchBuffer::new(0);
        assert_eq!(scratch.block_size(), 1);
    }

    #[test]
    fn test_memory_source_roundtrip() {
        let bytes: Arc<[u8]> = Arc::from(b"hello world".as_slice());
        let mut source = SourceStream::from_bytes(bytes);

        assert!(source.is_open());
        assert!(source.is_readable());
        assert!(!source.is_sequential());

        let mut out = String::new();
        source.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_memory_source_reopen_is_independent() {
        let bytes: Arc<[u8]> = Arc::from(b"abcdef".as_slice());
        let mut source = SourceStream::from_bytes(bytes);

        let mut buf = [0u8; 3];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");

        // Reopened stream starts at position zero.
        let mut second = source.reopen().unwrap();
        let mut all = Vec::new();
        second.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"abcdef");

        // Original cursor kept its position.
        source.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"def");
    }

    #[test]
    fn test_memory_sink_collects_bytes() {
        let mut sink = SinkStream::memory();
        sink.write_all(b"payload").unwrap();
        sink.seek(SeekFrom::Start(0)).unwrap();
        sink.write_all(b"P").unwrap();
        assert_eq!(sink.into_bytes().unwrap(), b"Payload");
    }

    #[test]
    fn test_disk_source_open_missing() {
        let result = SourceStream::open_path(Path::new("/nonexistent/archive.tar"));
        assert!(result.is_err());
    }
}
