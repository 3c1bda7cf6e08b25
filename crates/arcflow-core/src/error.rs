//! Error types for archive transcoding operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while extracting or compressing an archive.
///
/// Cancellation and pause are *not* errors — they are alternate
/// terminations of a session and are reported through
/// [`Event::Canceled`](crate::Event::Canceled) and
/// [`Event::Paused`](crate::Event::Paused) instead.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No archive path or buffer was supplied before `start`.
    #[error("no archive given")]
    ArchiveNotGiven,

    /// The archive path does not exist on disk.
    #[error("archive does not exist: {path}")]
    ArchiveDoesNotExist {
        /// The missing archive path.
        path: PathBuf,
    },

    /// The archive path exists but is not a regular file.
    #[error("not a valid archive file: {path}")]
    InvalidArchiveFile {
        /// The offending path.
        path: PathBuf,
    },

    /// The archive exists but cannot be read.
    #[error("no permission to read: {path}")]
    NoPermissionToRead {
        /// The unreadable path.
        path: PathBuf,
    },

    /// The archive could not be opened.
    #[error("cannot open archive: {path}")]
    CannotOpen {
        /// The archive path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The archive is corrupted or truncated.
    #[error("archive corrupted: {context}")]
    ArchiveCorrupted {
        /// Entry path or archive path where corruption was detected.
        context: String,
    },

    /// The archive (or an entry) is encrypted and no password was set.
    #[error("password needed: {context}")]
    PasswordNeeded {
        /// Entry path or archive path.
        context: String,
    },

    /// The supplied password does not decrypt the archive.
    #[error("password incorrect: {context}")]
    PasswordIncorrect {
        /// Entry path or archive path.
        context: String,
    },

    /// The extraction output directory is missing or not a directory.
    #[error("invalid output directory: {path}")]
    InvalidOutputDirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The output location cannot be written.
    #[error("no permission to write: {path}")]
    NoPermissionToWrite {
        /// The unwritable path.
        path: PathBuf,
    },

    /// The codec library failed to allocate.
    #[error("not enough memory")]
    NotEnoughMemory,

    /// A compression source file does not exist.
    #[error("file does not exist: {path}")]
    FileDoesNotExist {
        /// The missing source path.
        path: PathBuf,
    },

    /// A compression source could not be opened.
    #[error("cannot open source: {path}")]
    DiskOpenError {
        /// The source path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Reading a compression source failed mid-stream.
    #[error("cannot read source: {path}")]
    DiskReadError {
        /// The source path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The output archive could not be opened for writing.
    #[error("cannot open archive for writing: {path}")]
    ArchiveWriteOpenError {
        /// The target archive path (empty for memory targets).
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Writing an entry header (or entry data) into the archive failed.
    #[error("cannot write archive entry: {context}")]
    ArchiveHeaderWriteError {
        /// Entry path that failed to write.
        context: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Unrecoverable codec failure; the session handle is unusable
    /// until `clear`.
    #[error("fatal archive error: {context}")]
    ArchiveFatalError {
        /// Entry path or archive path.
        context: String,
    },

    /// The target archive already exists and would be overwritten.
    #[error("archive file already exists: {path}")]
    ArchiveFileAlreadyExists {
        /// The existing path.
        path: PathBuf,
    },

    /// `start` was called on a compressor with no staged files.
    #[error("no files to compress")]
    NoFilesToCompress,

    /// The archive format could not be determined or is not supported.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// A codec error that matched none of the known classifications.
    #[error("unknown archive error: {context}")]
    UnknownError {
        /// The codec library's diagnostic text.
        context: String,
    },
}

impl ArchiveError {
    /// Returns `true` for password-related failures, which enter the
    /// caller-driven retry protocol instead of terminating the session
    /// outright.
    #[must_use]
    pub const fn is_password_error(&self) -> bool {
        matches!(
            self,
            Self::PasswordNeeded { .. } | Self::PasswordIncorrect { .. }
        )
    }

    /// Returns `true` if this error poisons the engine instance until
    /// an explicit `clear`.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ArchiveFatalError { .. })
    }

    /// Returns `true` for errors detected before any session state was
    /// mutated (bad paths, permissions, missing inputs).
    #[must_use]
    pub const fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::ArchiveNotGiven
                | Self::ArchiveDoesNotExist { .. }
                | Self::InvalidArchiveFile { .. }
                | Self::NoPermissionToRead { .. }
                | Self::InvalidOutputDirectory { .. }
                | Self::NoPermissionToWrite { .. }
                | Self::ArchiveFileAlreadyExists { .. }
                | Self::NoFilesToCompress
        )
    }

    /// Returns the entry or archive path context carried by this
    /// error, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::ArchiveCorrupted { context }
            | Self::PasswordNeeded { context }
            | Self::PasswordIncorrect { context }
            | Self::ArchiveHeaderWriteError { context, .. }
            | Self::ArchiveFatalError { context }
            | Self::UnknownError { context } => Some(context),
            _ => None,
        }
    }
}
