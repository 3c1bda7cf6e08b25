//! Extraction output targets: disk directory or in-memory buffers.
//!
//! One engine drives either target through the same trait; the
//! disk/memory front-end constructors only select which implementation
//! gets wired in.

use std::fs::File;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::entry::Entry;
use crate::entry::EntryKind;
use crate::error::ArchiveError;
use crate::error::Result;
use crate::event::MemoryFile;
use crate::event::Output;
use crate::metadata::entry_info;

/// Destination of decoded entry bytes.
pub(crate) trait EntryTarget {
    /// Prepares the sink for one entry. Returns `true` when the entry
    /// has a byte stream to transfer; directory and link entries are
    /// materialized here and transfer nothing.
    fn begin_entry(&mut self, entry: &Entry) -> Result<bool>;

    /// Writes one block at the given byte offset of the current entry.
    fn write_block(&mut self, offset: u64, data: &[u8]) -> Result<()>;

    /// Completes the current entry.
    fn finish_entry(&mut self, entry: &Entry) -> Result<()>;

    /// Consumes the target into the session output.
    fn into_output(self: Box<Self>) -> Output;
}

/// Drops root and parent-dir components so entries cannot escape the
/// output directory.
fn sanitize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

fn write_err(path: &Path, source: std::io::Error) -> ArchiveError {
    ArchiveError::ArchiveHeaderWriteError {
        context: path.to_string_lossy().into_owned(),
        source,
    }
}

/// Disk-directory target: entries become files, directories and
/// symlinks under the output root.
pub(crate) struct DiskTarget {
    root: PathBuf,
    current: Option<File>,
}

impl DiskTarget {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            current: None,
        }
    }
}

impl EntryTarget for DiskTarget {
    fn begin_entry(&mut self, entry: &Entry) -> Result<bool> {
        self.current = None;
        let dest = self.root.join(sanitize(&entry.path));
        if dest == self.root {
            return Ok(false);
        }

        match entry.kind {
            EntryKind::Directory => {
                std::fs::create_dir_all(&dest).map_err(|e| write_err(&dest, e))?;
                Ok(false)
            }
            EntryKind::SymbolicLink => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| write_err(&dest, e))?;
                }
                #[cfg(unix)]
                if let Some(target) = &entry.link_target {
                    if dest.symlink_metadata().is_ok() {
                        std::fs::remove_file(&dest).map_err(|e| write_err(&dest, e))?;
                    }
                    std::os::unix::fs::symlink(target, &dest).map_err(|e| write_err(&dest, e))?;
                }
                Ok(false)
            }
            EntryKind::RegularFile => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| write_err(&dest, e))?;
                }
                let file = File::create(&dest).map_err(|e| write_err(&dest, e))?;
                self.current = Some(file);
                Ok(true)
            }
            // Device nodes, pipes and sockets carry no byte stream and
            // cannot be recreated portably.
            _ => Ok(false),
        }
    }

    fn write_block(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let file = self.current.as_mut().ok_or(ArchiveError::UnknownError {
            context: "no entry is open for writing".into(),
        })?;
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(data))
            .map_err(|e| write_err(&self.root, e))
    }

    fn finish_entry(&mut self, _entry: &Entry) -> Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush().map_err(|e| write_err(&self.root, e))?;
        }
        Ok(())
    }

    fn into_output(self: Box<Self>) -> Output {
        Output::Disk
    }
}

/// Memory target: every included entry becomes a metadata/buffer pair.
/// Directories produce no byte stream and are skipped entirely.
pub(crate) struct MemoryTarget {
    files: Vec<MemoryFile>,
    current: Option<(Entry, Vec<u8>)>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            current: None,
        }
    }
}

impl EntryTarget for MemoryTarget {
    fn begin_entry(&mut self, entry: &Entry) -> Result<bool> {
        self.current = None;
        if entry.kind.is_directory() {
            return Ok(false);
        }
        self.current = Some((entry.clone(), Vec::new()));
        Ok(entry.kind.is_file())
    }

    fn write_block(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let (_, buf) = self.current.as_mut().ok_or(ArchiveError::UnknownError {
            context: "no entry is open for writing".into(),
        })?;
        let offset = usize::try_from(offset).map_err(|_| ArchiveError::NotEnoughMemory)?;
        let end = offset + data.len();
        if buf.len() < end {
            buf.resize(end, 0);
        }
        buf[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn finish_entry(&mut self, _entry: &Entry) -> Result<()> {
        if let Some((entry, data)) = self.current.take() {
            self.files.push(MemoryFile {
                info: entry_info(&entry, false),
                data,
            });
        }
        Ok(())
    }

    fn into_output(self: Box<Self>) -> Output {
        Output::Memory(self.files)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(
            sanitize(Path::new("../../etc/passwd")),
            PathBuf::from("etc/passwd")
        );
        assert_eq!(sanitize(Path::new("/abs/file")), PathBuf::from("abs/file"));
        assert_eq!(sanitize(Path::new("a/./b")), PathBuf::from("a/b"));
        assert_eq!(sanitize(Path::new("plain.txt")), PathBuf::from("plain.txt"));
    }

    #[test]
    fn test_memory_target_collects_files() {
        let mut target = MemoryTarget::new();

        assert!(target.begin_entry(&Entry::file("a.txt", 5)).unwrap());
        target.write_block(0, b"hel").unwrap();
        target.write_block(3, b"lo").unwrap();
        target.finish_entry(&Entry::file("a.txt", 5)).unwrap();

        // Directories are skipped outright.
        assert!(!target.begin_entry(&Entry::directory("d/")).unwrap());
        target.finish_entry(&Entry::directory("d/")).unwrap();

        let output = Box::new(target).into_output();
        match output {
            Output::Memory(files) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].data, b"hello");
                assert_eq!(files[0].info.file_name, "a.txt");
            }
            other => panic!("expected memory output, got {other:?}"),
        }
    }

    #[test]
    fn test_memory_target_sparse_write() {
        let mut target = MemoryTarget::new();
        target.begin_entry(&Entry::file("sparse", 8)).unwrap();
        target.write_block(4, b"data").unwrap();
        target.finish_entry(&Entry::file("sparse", 8)).unwrap();

        match Box::new(target).into_output() {
            Output::Memory(files) => {
                assert_eq!(files[0].data, b"\0\0\0\0data");
            }
            other => panic!("expected memory output, got {other:?}"),
        }
    }

    #[test]
    fn test_disk_target_writes_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut target = DiskTarget::new(temp.path().to_path_buf());

        assert!(!target.begin_entry(&Entry::directory("sub")).unwrap());
        assert!(temp.path().join("sub").is_dir());

        assert!(target.begin_entry(&Entry::file("sub/x.txt", 4)).unwrap());
        target.write_block(0, b"data").unwrap();
        target.finish_entry(&Entry::file("sub/x.txt", 4)).unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("sub/x.txt")).unwrap(),
            "data"
        );
        assert!(matches!(Box::new(target).into_output(), Output::Disk));
    }

    #[test]
    fn test_disk_target_creates_missing_parents() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut target = DiskTarget::new(temp.path().to_path_buf());

        assert!(target.begin_entry(&Entry::file("a/b/c.txt", 1)).unwrap());
        target.write_block(0, b"x").unwrap();
        target.finish_entry(&Entry::file("a/b/c.txt", 1)).unwrap();
        assert!(temp.path().join("a/b/c.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_disk_target_symlink() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut target = DiskTarget::new(temp.path().to_path_buf());

        target.begin_entry(&Entry::file("real.txt", 1)).unwrap();
        target.write_block(0, b"x").unwrap();
        target.finish_entry(&Entry::file("real.txt", 1)).unwrap();

        let mut link = Entry::file("link.txt", 0);
        link.kind = EntryKind::SymbolicLink;
        link.link_target = Some("real.txt".into());
        assert!(!target.begin_entry(&link).unwrap());
        target.finish_entry(&link).unwrap();

        let made = temp.path().join("link.txt");
        assert!(made.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(made).unwrap(), "x");
    }
}
