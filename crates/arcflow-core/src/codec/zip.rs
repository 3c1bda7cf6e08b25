//! Zip codec adapters.
//!
//! Zip is the one supported container with per-entry encryption
//! (ZipCrypto). The read side wraps `zip::ZipArchive`, the write side
//! `zip::ZipWriter`; password failures are classified here, using the
//! structured error where the library provides one and the isolated
//! diagnostic-string matcher where it does not.

use std::io::Read;

use zip::result::ZipError;
use zip::unstable::write::FileOptionsExt;

use crate::codec::ArchiveSink;
use crate::codec::EntrySource;
use crate::codec::PasswordFailure;
use crate::codec::classify_password_message;
use crate::entry::Entry;
use crate::entry::EntryKind;
use crate::error::ArchiveError;
use crate::error::Result;
use crate::stream::SinkStream;
use crate::stream::SourceStream;

/// Unix mode bits marking a symlink in a zip entry's external
/// attributes.
const UNIX_SYMLINK_MODE: u32 = 0o120_000;
/// Mask for the file-type bits of a unix mode.
const UNIX_TYPE_MASK: u32 = 0o170_000;

/// Read adapter over a zip archive.
pub struct ZipSource<'a> {
    archive: &'a mut zip::ZipArchive<SourceStream>,
    password: Option<String>,
    next_index: usize,
    current: Option<usize>,
    context: String,
}

impl<'a> ZipSource<'a> {
    /// Creates a source over an open zip archive. `context` names the
    /// archive in error messages.
    pub fn new(
        archive: &'a mut zip::ZipArchive<SourceStream>,
        password: Option<String>,
        context: String,
    ) -> Self {
        Self {
            archive,
            password,
            next_index: 0,
            current: None,
            context,
        }
    }
}

impl EntrySource for ZipSource<'_> {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        self.current = None;
        if self.next_index >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next_index;

        let mut file = match &self.password {
            Some(pw) => self.archive.by_index_decrypt(index, pw.as_bytes()),
            None => self.archive.by_index(index),
        }
        .map_err(|e| classify_read_error(&e, &self.context))?;

        let path = file.name().to_string();
        let kind = if file.is_dir() {
            EntryKind::Directory
        } else if file
            .unix_mode()
            .is_some_and(|m| m & UNIX_TYPE_MASK == UNIX_SYMLINK_MODE)
        {
            EntryKind::SymbolicLink
        } else {
            EntryKind::RegularFile
        };
        let size = file.size();
        let mtime = file.last_modified().map_or(0, |dt| datetime_to_unix(&dt));

        // Zip stores a symlink's target as the entry data; surface it
        // as metadata so targets never have to read link bodies.
        let link_target = if kind == EntryKind::SymbolicLink {
            let mut target = String::new();
            file.read_to_string(&mut target)
                .map_err(|e| ArchiveError::ArchiveCorrupted {
                    context: format!("{path}: {e}"),
                })?;
            Some(target.into())
        } else {
            None
        };

        drop(file);
        self.current = Some(index);
        self.next_index += 1;

        Ok(Some(Entry {
            path: path.into(),
            kind,
            size,
            atime: 0,
            mtime,
            ctime: 0,
            link_target,
        }))
    }

    fn open_data(&mut self) -> Result<Box<dyn Read + '_>> {
        let index = self.current.ok_or_else(|| ArchiveError::UnknownError {
            context: "no entry is open for reading".into(),
        })?;
        let file = match &self.password {
            Some(pw) => self.archive.by_index_decrypt(index, pw.as_bytes()),
            None => self.archive.by_index(index),
        }
        .map_err(|e| classify_read_error(&e, &self.context))?;
        Ok(Box::new(file))
    }
}

/// Classifies a zip read error into the engine taxonomy.
pub fn classify_read_error(error: &ZipError, context: &str) -> ArchiveError {
    match error {
        ZipError::InvalidPassword => ArchiveError::PasswordIncorrect {
            context: context.to_string(),
        },
        ZipError::UnsupportedArchive(message) => match classify_password_message(message) {
            Some(PasswordFailure::Needed) => ArchiveError::PasswordNeeded {
                context: context.to_string(),
            },
            Some(PasswordFailure::Incorrect) => ArchiveError::PasswordIncorrect {
                context: context.to_string(),
            },
            None => ArchiveError::UnknownError {
                context: format!("{context}: {message}"),
            },
        },
        ZipError::InvalidArchive(message) => ArchiveError::ArchiveCorrupted {
            context: format!("{context}: {message}"),
        },
        ZipError::FileNotFound => ArchiveError::ArchiveCorrupted {
            context: format!("{context}: entry missing from central directory"),
        },
        ZipError::Io(e) => ArchiveError::ArchiveCorrupted {
            context: format!("{context}: {e}"),
        },
        other => ArchiveError::UnknownError {
            context: format!("{context}: {other}"),
        },
    }
}

fn datetime_to_unix(dt: &zip::DateTime) -> u64 {
    chrono::NaiveDate::from_ymd_opt(
        i32::from(dt.year()),
        u32::from(dt.month()),
        u32::from(dt.day()),
    )
    .and_then(|date| {
        date.and_hms_opt(
            u32::from(dt.hour()),
            u32::from(dt.minute()),
            u32::from(dt.second()),
        )
    })
    .map_or(0, |naive| naive.and_utc().timestamp().max(0) as u64)
}

fn unix_to_datetime(mtime: u64) -> Option<zip::DateTime> {
    let naive = chrono::DateTime::from_timestamp(i64::try_from(mtime).ok()?, 0)?.naive_utc();
    use chrono::Datelike;
    use chrono::Timelike;
    zip::DateTime::from_date_and_time(
        u16::try_from(naive.year()).ok()?,
        u8::try_from(naive.month()).ok()?,
        u8::try_from(naive.day()).ok()?,
        u8::try_from(naive.hour()).ok()?,
        u8::try_from(naive.minute()).ok()?,
        u8::try_from(naive.second()).ok()?,
    )
    .ok()
}

/// Write adapter producing a zip archive.
pub struct ZipSink {
    writer: Option<zip::ZipWriter<SinkStream>>,
    password: Option<String>,
    level: Option<u8>,
}

impl ZipSink {
    /// Creates a sink writing a zip archive into `sink`. A password
    /// enables ZipCrypto encryption for every entry.
    #[must_use]
    pub fn new(sink: SinkStream, password: Option<String>, level: Option<u8>) -> Self {
        Self {
            writer: Some(zip::ZipWriter::new(sink)),
            password,
            level,
        }
    }

    fn options(&self, mode: u32, mtime: u64) -> zip::write::SimpleFileOptions {
        let mut options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(mode);
        if let Some(level) = self.level {
            options = options.compression_level(Some(i64::from(level)));
        }
        if mtime > 0
            && let Some(dt) = unix_to_datetime(mtime)
        {
            options = options.last_modified_time(dt);
        }
        if let Some(pw) = &self.password {
            options = options.with_deprecated_encryption(pw.as_bytes());
        }
        options
    }

    fn writer(&mut self) -> Result<&mut zip::ZipWriter<SinkStream>> {
        self.writer
            .as_mut()
            .ok_or_else(|| ArchiveError::UnknownError {
                context: "archive already finalized".into(),
            })
    }
}

fn sink_err(error: ZipError, context: String) -> ArchiveError {
    match error {
        ZipError::Io(e) => ArchiveError::ArchiveHeaderWriteError { context, source: e },
        other => ArchiveError::ArchiveHeaderWriteError {
            context,
            source: std::io::Error::other(other.to_string()),
        },
    }
}

impl ArchiveSink for ZipSink {
    fn add_entry(&mut self, entry: &Entry, data: &mut dyn Read) -> Result<()> {
        let name = entry.path.to_string_lossy().into_owned();
        let context = name.clone();

        match entry.kind {
            EntryKind::Directory => {
                let options = self.options(0o755, entry.mtime);
                self.writer()?
                    .add_directory(name, options)
                    .map_err(|e| sink_err(e, context))?;
            }
            EntryKind::SymbolicLink => {
                let target = entry
                    .link_target
                    .clone()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned();
                let options = self.options(0o777, entry.mtime);
                self.writer()?
                    .add_symlink(name, target, options)
                    .map_err(|e| sink_err(e, context))?;
            }
            _ => {
                let options = self.options(0o644, entry.mtime);
                let writer = self.writer()?;
                writer
                    .start_file(name, options)
                    .map_err(|e| sink_err(e, context.clone()))?;
                std::io::copy(data, writer)
                    .map_err(|e| ArchiveError::ArchiveHeaderWriteError { context, source: e })?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Option<Vec<u8>>> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ArchiveError::UnknownError {
                context: "archive already finalized".into(),
            })?;
        let sink = writer
            .finish()
            .map_err(|e| sink_err(e, "central directory".into()))?;
        Ok(sink.into_bytes())
    }
}
