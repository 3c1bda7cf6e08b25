//! Archive entry model.

use std::path::PathBuf;

/// Kind of entry inside an archive.
///
/// # Examples
///
/// ```
/// use arcflow_core::entry::EntryKind;
///
/// assert!(EntryKind::RegularFile.is_file());
/// assert!(EntryKind::Directory.is_directory());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file entry.
    RegularFile,
    /// Directory entry.
    Directory,
    /// Symbolic link entry.
    SymbolicLink,
    /// Character device node.
    CharacterDevice,
    /// Block device node.
    BlockDevice,
    /// Named pipe (fifo).
    NamedPipe,
    /// Unix domain socket.
    Socket,
    /// Anything the container format stores that none of the above
    /// describe.
    Unknown,
}

impl EntryKind {
    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::RegularFile)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` if this is a symbolic link.
    #[must_use]
    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::SymbolicLink)
    }

    /// Returns the metadata type name for this kind.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::RegularFile => "RegularFile",
            Self::Directory => "Directory",
            Self::SymbolicLink => "SymbolicLink",
            Self::CharacterDevice => "CharacterDevice",
            Self::BlockDevice => "BlockDevice",
            Self::NamedPipe => "NamedPipe",
            Self::Socket => "Socket",
            Self::Unknown => "UnknownFile",
        }
    }
}

/// One logical item inside an archive.
///
/// Produced one at a time by an
/// [`EntrySource`](crate::codec::EntrySource) in archive order. An
/// entry lives for exactly one iteration of the outer transcoding loop
/// unless a pause occurs while its data is partially drained, in which
/// case it is retained as the session's current entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path of the entry as stored in the archive.
    pub path: PathBuf,

    /// Entry kind.
    pub kind: EntryKind,

    /// Uncompressed size in bytes (0 for directories and links).
    pub size: u64,

    /// Last access time, unix seconds; 0 when the format does not
    /// record it.
    pub atime: u64,

    /// Last modification time, unix seconds; 0 when unknown.
    pub mtime: u64,

    /// Last status change time, unix seconds; 0 when unknown.
    pub ctime: u64,

    /// Link target for symbolic and hard links.
    pub link_target: Option<PathBuf>,
}

impl Entry {
    /// Creates a regular-file entry with the given path and size.
    ///
    /// Timestamps default to unknown; use the struct fields to fill
    /// them in.
    #[must_use]
    pub fn file<P: Into<PathBuf>>(path: P, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::RegularFile,
            size,
            atime: 0,
            mtime: 0,
            ctime: 0,
            link_target: None,
        }
    }

    /// Creates a directory entry with the given path.
    #[must_use]
    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            link_target: None,
        }
    }

    /// Path as a lossy UTF-8 string, for diagnostics and progress
    /// reporting.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(EntryKind::RegularFile.is_file());
        assert!(!EntryKind::RegularFile.is_directory());
        assert!(EntryKind::Directory.is_directory());
        assert!(EntryKind::SymbolicLink.is_symlink());
        assert!(!EntryKind::Socket.is_file());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(EntryKind::RegularFile.type_name(), "RegularFile");
        assert_eq!(EntryKind::Directory.type_name(), "Directory");
        assert_eq!(EntryKind::SymbolicLink.type_name(), "SymbolicLink");
        assert_eq!(EntryKind::NamedPipe.type_name(), "NamedPipe");
        assert_eq!(EntryKind::Unknown.type_name(), "UnknownFile");
    }

    #[test]
    fn test_file_constructor() {
        let entry = Entry::file("docs/readme.md", 42);
        assert_eq!(entry.path, PathBuf::from("docs/readme.md"));
        assert_eq!(entry.size, 42);
        assert_eq!(entry.kind, EntryKind::RegularFile);
        assert_eq!(entry.mtime, 0);
        assert!(entry.link_target.is_none());
    }

    #[test]
    fn test_directory_constructor() {
        let entry = Entry::directory("docs/");
        assert_eq!(entry.kind, EntryKind::Directory);
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_path_string() {
        let entry = Entry::file("a/b.txt", 1);
        assert_eq!(entry.path_string(), "a/b.txt");
    }
}
