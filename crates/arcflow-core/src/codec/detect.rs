//! Archive format detection from file extensions and magic bytes.

use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

use crate::codec::compression::CompressionCodec;
use crate::error::ArchiveError;
use crate::error::Result;

/// Gzip stream magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Bzip2 stream magic bytes.
const BZIP2_MAGIC: [u8; 3] = *b"BZh";
/// Xz stream magic bytes.
const XZ_MAGIC: [u8; 6] = [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00];
/// Zstd frame magic bytes.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];
/// Zip local-file-header magic bytes (also covers empty archives via
/// the end-of-central-directory record, which starts with the same two
/// bytes).
const ZIP_MAGIC: [u8; 2] = *b"PK";
/// Offset of the `ustar` marker inside a tar header block.
const TAR_MAGIC_OFFSET: usize = 257;
/// The `ustar` marker itself.
const TAR_MAGIC: [u8; 5] = *b"ustar";

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Tar archive (uncompressed).
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
    /// Bzip2-compressed tar archive.
    TarBz2,
    /// XZ-compressed tar archive.
    TarXz,
    /// Zstd-compressed tar archive.
    TarZst,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// Returns the outer compression codec for tar variants, `None`
    /// for plain tar and zip (which compresses per entry).
    #[must_use]
    pub const fn compression(self) -> Option<CompressionCodec> {
        match self {
            Self::Tar | Self::Zip => None,
            Self::TarGz => Some(CompressionCodec::Gzip),
            Self::TarBz2 => Some(CompressionCodec::Bzip2),
            Self::TarXz => Some(CompressionCodec::Xz),
            Self::TarZst => Some(CompressionCodec::Zstd),
        }
    }

    /// Returns a human-readable format name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        }
    }
}

/// Detects the archive format from a file path.
///
/// # Errors
///
/// Returns [`ArchiveError::UnsupportedFormat`] if the extension is
/// missing or unrecognized.
pub fn detect_format(path: &Path) -> Result<ArchiveFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or(ArchiveError::UnsupportedFormat)?;

    let ext_lower = extension.to_ascii_lowercase();
    match ext_lower.as_str() {
        "tar" => Ok(ArchiveFormat::Tar),
        "gz" | "tgz" => Ok(ArchiveFormat::TarGz),
        "bz" | "bz2" | "tbz" | "tbz2" => Ok(ArchiveFormat::TarBz2),
        "xz" | "txz" => Ok(ArchiveFormat::TarXz),
        "zst" | "zstd" | "tzst" => Ok(ArchiveFormat::TarZst),
        "zip" => Ok(ArchiveFormat::Zip),
        _ => Err(ArchiveError::UnsupportedFormat),
    }
}

/// Sniffs the archive format from a seekable stream's leading bytes.
///
/// Used for in-memory archives, which have no file name to go by. The
/// stream position is restored to the start before returning.
///
/// # Errors
///
/// Returns [`ArchiveError::UnsupportedFormat`] when no known signature
/// matches, or [`ArchiveError::ArchiveCorrupted`] when the stream
/// cannot be read.
pub fn sniff_format<R: Read + Seek>(reader: &mut R) -> Result<ArchiveFormat> {
    let mut head = [0u8; 512];
    reader.seek(SeekFrom::Start(0)).map_err(sniff_err)?;
    let mut filled = 0;
    while filled < head.len() {
        let n = reader.read(&mut head[filled..]).map_err(sniff_err)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    reader.seek(SeekFrom::Start(0)).map_err(sniff_err)?;

    let head = &head[..filled];
    if head.starts_with(&GZIP_MAGIC) {
        return Ok(ArchiveFormat::TarGz);
    }
    if head.starts_with(&BZIP2_MAGIC) {
        return Ok(ArchiveFormat::TarBz2);
    }
    if head.starts_with(&XZ_MAGIC) {
        return Ok(ArchiveFormat::TarXz);
    }
    if head.starts_with(&ZSTD_MAGIC) {
        return Ok(ArchiveFormat::TarZst);
    }
    if head.starts_with(&ZIP_MAGIC) {
        return Ok(ArchiveFormat::Zip);
    }
    if head.len() > TAR_MAGIC_OFFSET + TAR_MAGIC.len()
        && head[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
    {
        return Ok(ArchiveFormat::Tar);
    }
    Err(ArchiveError::UnsupportedFormat)
}

fn sniff_err(e: std::io::Error) -> ArchiveError {
    ArchiveError::ArchiveCorrupted {
        context: format!("cannot sniff archive header: {e}"),
    }
}
