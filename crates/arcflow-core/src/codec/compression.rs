//! Outer compression codecs for tar archives.
//!
//! Tar containers are optionally wrapped in a stream compressor. The
//! same codec set is used for reading (decompression) and writing
//! (compression); zip archives compress per entry and never pass
//! through this module.

use std::io::Read;
use std::io::Write;

use crate::stream::SinkStream;
use crate::stream::SourceStream;

/// Compression codec wrapped around a tar stream.
///
/// # Examples
///
/// ```
/// use arcflow_core::codec::compression::CompressionCodec;
///
/// assert_eq!(CompressionCodec::Gzip.name(), "gzip");
/// assert_eq!(CompressionCodec::Zstd.extension(), "tar.zst");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    /// Gzip compression (deflate algorithm).
    Gzip,
    /// Bzip2 compression (Burrows-Wheeler algorithm).
    Bzip2,
    /// Xz compression (LZMA2 algorithm).
    Xz,
    /// Zstd compression (Zstandard algorithm).
    Zstd,
}

impl CompressionCodec {
    /// Returns the typical file extension for this codec on a tar
    /// archive.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "tar.gz",
            Self::Bzip2 => "tar.bz2",
            Self::Xz => "tar.xz",
            Self::Zstd => "tar.zst",
        }
    }

    /// Returns a human-readable codec name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

/// Wraps an archive source in the decompressor for `codec`, or passes
/// it through unchanged.
pub fn decompress(
    codec: Option<CompressionCodec>,
    source: SourceStream,
) -> std::io::Result<Box<dyn Read>> {
    Ok(match codec {
        None => Box::new(source),
        Some(CompressionCodec::Gzip) => Box::new(flate2::read::GzDecoder::new(source)),
        Some(CompressionCodec::Bzip2) => Box::new(bzip2::read::BzDecoder::new(source)),
        Some(CompressionCodec::Xz) => Box::new(xz2::read::XzDecoder::new(source)),
        Some(CompressionCodec::Zstd) => Box::new(zstd::stream::read::Decoder::new(source)?),
    })
}

/// Writer that optionally compresses everything written through it.
///
/// Unlike a plain `Box<dyn Write>`, this keeps the concrete encoder so
/// [`CompressedWriter::finish`] can flush trailing codec state and hand
/// the underlying sink back.
pub enum CompressedWriter {
    /// No outer compression.
    Plain(SinkStream),
    /// Gzip encoder.
    Gzip(flate2::write::GzEncoder<SinkStream>),
    /// Bzip2 encoder.
    Bzip2(bzip2::write::BzEncoder<SinkStream>),
    /// Xz encoder.
    Xz(xz2::write::XzEncoder<SinkStream>),
    /// Zstd encoder.
    Zstd(zstd::stream::write::Encoder<'static, SinkStream>),
}

impl CompressedWriter {
    /// Wraps `sink` in the encoder for `codec` at the given level
    /// (1-9; each codec's default when `None`).
    pub fn new(
        codec: Option<CompressionCodec>,
        sink: SinkStream,
        level: Option<u8>,
    ) -> std::io::Result<Self> {
        Ok(match codec {
            None => Self::Plain(sink),
            Some(CompressionCodec::Gzip) => {
                let level =
                    level.map_or_else(flate2::Compression::default, |l| {
                        flate2::Compression::new(u32::from(l))
                    });
                Self::Gzip(flate2::write::GzEncoder::new(sink, level))
            }
            Some(CompressionCodec::Bzip2) => {
                let level = level.map_or_else(bzip2::Compression::default, |l| {
                    bzip2::Compression::new(u32::from(l))
                });
                Self::Bzip2(bzip2::write::BzEncoder::new(sink, level))
            }
            Some(CompressionCodec::Xz) => Self::Xz(xz2::write::XzEncoder::new(
                sink,
                u32::from(level.unwrap_or(6)),
            )),
            Some(CompressionCodec::Zstd) => Self::Zstd(zstd::stream::write::Encoder::new(
                sink,
                i32::from(level.unwrap_or(3)),
            )?),
        })
    }

    /// Flushes trailing codec state and returns the underlying sink.
    pub fn finish(self) -> std::io::Result<SinkStream> {
        match self {
            Self::Plain(mut sink) => {
                sink.flush()?;
                Ok(sink)
            }
            Self::Gzip(enc) => enc.finish(),
            Self::Bzip2(enc) => enc.finish(),
            Self::Xz(enc) => enc.finish(),
            Self::Zstd(enc) => enc.finish(),
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
            Self::Bzip2(w) => w.write(buf),
            Self::Xz(w) => w.write(buf),
            Self::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
            Self::Bzip2(w) => w.flush(),
            Self::Xz(w) => w.flush(),
            Self::Zstd(w) => w.flush(),
        }
    }
}
