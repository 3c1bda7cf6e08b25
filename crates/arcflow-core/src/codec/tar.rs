//! Tar codec adapters.
//!
//! The read side wraps the `tar` crate's entry iterator; the write
//! side wraps `tar::Builder` over an optionally compressed sink.
//! Long names, PAX extensions and GNU sparse entries are the library's
//! concern; the adapters only translate entries and errors.

use std::io::Read;

use crate::codec::ArchiveSink;
use crate::codec::EntrySource;
use crate::codec::compression::CompressedWriter;
use crate::codec::compression::CompressionCodec;
use crate::entry::Entry;
use crate::entry::EntryKind;
use crate::error::ArchiveError;
use crate::error::Result;
use crate::stream::SinkStream;

/// Read adapter over a tar entry stream.
///
/// Holds the iterator and the current entry, so a suspended session
/// keeps the codec cursor (including a partially-read entry) alive
/// until it is resumed or dropped.
pub struct TarSource<'a> {
    entries: tar::Entries<'a, Box<dyn Read>>,
    current: Option<tar::Entry<'a, Box<dyn Read>>>,
    context: String,
}

impl<'a> TarSource<'a> {
    /// Creates a source over an entry iterator. `context` names the
    /// archive in error messages.
    pub fn new(entries: tar::Entries<'a, Box<dyn Read>>, context: String) -> Self {
        Self {
            entries,
            current: None,
            context,
        }
    }

    fn corrupt(&self, e: &std::io::Error) -> ArchiveError {
        ArchiveError::ArchiveCorrupted {
            context: format!("{}: {e}", self.context),
        }
    }
}

impl EntrySource for TarSource<'_> {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        // Dropping the previous entry lets the iterator skip any
        // unread data before the next header.
        self.current = None;

        let Some(next) = self.entries.next() else {
            return Ok(None);
        };
        let raw = next.map_err(|e| self.corrupt(&e))?;

        let path = raw
            .path()
            .map(|p| p.into_owned())
            .map_err(|e| self.corrupt(&e))?;
        let header = raw.header();
        let kind = entry_kind(header.entry_type());
        let link_target = raw
            .link_name()
            .ok()
            .flatten()
            .map(std::borrow::Cow::into_owned);
        let (atime, ctime) = header
            .as_gnu()
            .map_or((0, 0), |gnu| (gnu.atime().unwrap_or(0), gnu.ctime().unwrap_or(0)));

        let entry = Entry {
            path,
            kind,
            size: raw.size(),
            atime,
            mtime: header.mtime().unwrap_or(0),
            ctime,
            link_target,
        };
        self.current = Some(raw);
        Ok(Some(entry))
    }

    fn open_data(&mut self) -> Result<Box<dyn Read + '_>> {
        let entry = self
            .current
            .as_mut()
            .ok_or_else(|| ArchiveError::UnknownError {
                context: "no entry is open for reading".into(),
            })?;
        Ok(Box::new(entry))
    }
}

fn entry_kind(kind: tar::EntryType) -> EntryKind {
    use tar::EntryType;
    match kind {
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
            EntryKind::RegularFile
        }
        EntryType::Directory => EntryKind::Directory,
        EntryType::Symlink => EntryKind::SymbolicLink,
        EntryType::Char => EntryKind::CharacterDevice,
        EntryType::Block => EntryKind::BlockDevice,
        EntryType::Fifo => EntryKind::NamedPipe,
        _ => EntryKind::Unknown,
    }
}

/// Write adapter producing a tar archive, optionally wrapped in an
/// outer compression codec.
pub struct TarSink {
    builder: Option<tar::Builder<CompressedWriter>>,
}

impl TarSink {
    /// Creates a sink writing tar data through `codec` into `sink`.
    pub fn new(
        codec: Option<CompressionCodec>,
        sink: SinkStream,
        level: Option<u8>,
    ) -> std::io::Result<Self> {
        let writer = CompressedWriter::new(codec, sink, level)?;
        Ok(Self {
            builder: Some(tar::Builder::new(writer)),
        })
    }

    fn builder(&mut self) -> Result<&mut tar::Builder<CompressedWriter>> {
        self.builder
            .as_mut()
            .ok_or_else(|| ArchiveError::UnknownError {
                context: "archive already finalized".into(),
            })
    }
}

impl ArchiveSink for TarSink {
    fn add_entry(&mut self, entry: &Entry, data: &mut dyn Read) -> Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_mtime(entry.mtime);

        let path = entry.path.clone();
        let context = entry.path_string();
        let builder = self.builder()?;

        let result = match entry.kind {
            EntryKind::Directory => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder.append_data(&mut header, &path, std::io::empty())
            }
            EntryKind::SymbolicLink => {
                let target = entry.link_target.clone().unwrap_or_default();
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                header.set_mode(0o777);
                header.set_cksum();
                builder.append_link(&mut header, &path, &target)
            }
            _ => {
                header.set_size(entry.size);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append_data(&mut header, &path, data)
            }
        };

        result.map_err(|e| ArchiveError::ArchiveHeaderWriteError { context, source: e })
    }

    fn finish(&mut self) -> Result<Option<Vec<u8>>> {
        let builder = self
            .builder
            .take()
            .ok_or_else(|| ArchiveError::UnknownError {
                context: "archive already finalized".into(),
            })?;
        let writer = builder
            .into_inner()
            .and_then(CompressedWriter::finish)
            .map_err(|e| ArchiveError::ArchiveHeaderWriteError {
                context: "archive trailer".into(),
                source: e,
            })?;
        Ok(writer.into_bytes())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::compression::decompress;
    use crate::stream::SourceStream;
    use std::sync::Arc;

    fn read_all(source: &mut TarSource<'_>) -> Vec<(Entry, Vec<u8>)> {
        let mut out = Vec::new();
        while let Some(entry) = source.next_entry().unwrap() {
            let mut data = Vec::new();
            if entry.kind.is_file() {
                source.open_data().unwrap().read_to_end(&mut data).unwrap();
            }
            out.push((entry, data));
        }
        out
    }

    fn memory_source(bytes: Vec<u8>) -> SourceStream {
        SourceStream::from_bytes(Arc::from(bytes.into_boxed_slice()))
    }

    #[test]
    fn test_sink_source_roundtrip() {
        let mut sink = TarSink::new(None, SinkStream::memory(), None).unwrap();
        sink.add_entry(
            &Entry::file("a.txt", 5),
            &mut std::io::Cursor::new(b"hello"),
        )
        .unwrap();
        sink.add_entry(&Entry::directory("sub"), &mut std::io::empty())
            .unwrap();
        sink.add_entry(
            &Entry::file("sub/b.txt", 2),
            &mut std::io::Cursor::new(b"hi"),
        )
        .unwrap();
        let bytes = sink.finish().unwrap().unwrap();

        let reader = decompress(None, memory_source(bytes)).unwrap();
        let mut archive = tar::Archive::new(reader);
        let mut source = TarSource::new(archive.entries().unwrap(), "test.tar".into());
        let entries = read_all(&mut source);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].0.path_string(), "a.txt");
        assert_eq!(entries[0].1, b"hello");
        assert_eq!(entries[1].0.kind, EntryKind::Directory);
        assert_eq!(entries[2].1, b"hi");
    }

    #[test]
    fn test_compressed_roundtrip() {
        let codec = Some(CompressionCodec::Gzip);
        let mut sink = TarSink::new(codec, SinkStream::memory(), None).unwrap();
        sink.add_entry(
            &Entry::file("data.bin", 4),
            &mut std::io::Cursor::new(b"\x00\x01\x02\x03"),
        )
        .unwrap();
        let bytes = sink.finish().unwrap().unwrap();

        let reader = decompress(codec, memory_source(bytes)).unwrap();
        let mut archive = tar::Archive::new(reader);
        let mut source = TarSource::new(archive.entries().unwrap(), "test.tar.gz".into());
        let entries = read_all(&mut source);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, b"\x00\x01\x02\x03");
    }

    #[test]
    fn test_symlink_roundtrip() {
        let mut link = Entry::file("link", 0);
        link.kind = EntryKind::SymbolicLink;
        link.link_target = Some("a.txt".into());

        let mut sink = TarSink::new(None, SinkStream::memory(), None).unwrap();
        sink.add_entry(&link, &mut std::io::empty()).unwrap();
        let bytes = sink.finish().unwrap().unwrap();

        let reader = decompress(None, memory_source(bytes)).unwrap();
        let mut archive = tar::Archive::new(reader);
        let mut source = TarSource::new(archive.entries().unwrap(), "t".into());
        let entries = read_all(&mut source);
        assert_eq!(entries[0].0.kind, EntryKind::SymbolicLink);
        assert_eq!(entries[0].0.link_target, Some("a.txt".into()));
    }

    #[test]
    fn test_skipping_entry_data() {
        let mut sink = TarSink::new(None, SinkStream::memory(), None).unwrap();
        sink.add_entry(
            &Entry::file("skipped.bin", 1000),
            &mut std::io::Cursor::new(vec![7u8; 1000]),
        )
        .unwrap();
        sink.add_entry(
            &Entry::file("kept.txt", 4),
            &mut std::io::Cursor::new(b"data"),
        )
        .unwrap();
        let bytes = sink.finish().unwrap().unwrap();

        let reader = decompress(None, memory_source(bytes)).unwrap();
        let mut archive = tar::Archive::new(reader);
        let mut source = TarSource::new(archive.entries().unwrap(), "t".into());

        // Never open the first entry's data; the iterator must still
        // land on the second entry.
        let first = source.next_entry().unwrap().unwrap();
        assert_eq!(first.path_string(), "skipped.bin");
        let second = source.next_entry().unwrap().unwrap();
        assert_eq!(second.path_string(), "kept.txt");
        let mut data = Vec::new();
        source.open_data().unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, b"data");
    }

    #[test]
    fn test_corrupt_stream_classified() {
        let garbage = vec![0xffu8; 1024];
        let reader = decompress(None, memory_source(garbage)).unwrap();
        let mut archive = tar::Archive::new(reader);
        let mut source = TarSource::new(archive.entries().unwrap(), "bad.tar".into());

        let err = source.next_entry().unwrap_err();
        assert!(matches!(err, ArchiveError::ArchiveCorrupted { .. }));
        assert!(err.context().unwrap().contains("bad.tar"));
    }

    #[test]
    fn test_open_data_without_entry() {
        let reader = decompress(None, memory_source(Vec::new())).unwrap();
        let mut archive = tar::Archive::new(reader);
        let mut source = TarSource::new(archive.entries().unwrap(), "t".into());
        assert!(source.open_data().is_err());
    }

    #[test]
    fn test_finish_twice_rejected() {
        let mut sink = TarSink::new(None, SinkStream::memory(), None).unwrap();
        sink.finish().unwrap();
        assert!(sink.finish().is_err());
    }
}
