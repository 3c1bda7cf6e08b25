//! Compression work staging: transfer nodes and their confirmation.
//!
//! Callers stage (entry name, data source) pairs; `start` confirms
//! them — validating existence and readability, expanding directories
//! recursively, and summing total bytes — into the queue the
//! compression pass consumes destructively.

use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::error::ArchiveError;
use crate::error::Result;

/// Origin of one staged unit of compression work.
#[derive(Debug, Clone)]
pub enum NodeSource {
    /// A file or directory on disk; directories are expanded
    /// recursively at confirmation time (hidden entries included).
    Disk(PathBuf),
    /// An in-memory buffer streamed directly.
    Memory(Arc<[u8]>),
}

/// One staged unit of compression work: the archive entry name and
/// where its bytes come from.
#[derive(Debug, Clone)]
pub struct TransferNode {
    /// Entry name to use inside the archive.
    pub entry_name: String,
    /// Where the entry's bytes come from.
    pub source: NodeSource,
}

/// A validated node ready for the compression pass. Directory sources
/// have been expanded into one node per file.
#[derive(Debug)]
pub(crate) struct ConfirmedNode {
    pub entry_name: String,
    pub source: NodeSource,
    pub size: u64,
}

/// Validates and expands staged nodes. Returns the confirmed queue and
/// the total byte count for progress reporting.
pub(crate) fn confirm_nodes(staged: &[TransferNode]) -> Result<(VecDeque<ConfirmedNode>, u64)> {
    let mut confirmed = VecDeque::new();
    let mut total_bytes = 0u64;

    for node in staged {
        match &node.source {
            NodeSource::Memory(data) => {
                total_bytes += data.len() as u64;
                confirmed.push_back(ConfirmedNode {
                    entry_name: node.entry_name.clone(),
                    source: NodeSource::Memory(Arc::clone(data)),
                    size: data.len() as u64,
                });
            }
            NodeSource::Disk(path) => {
                let meta = std::fs::metadata(path).map_err(|e| stat_error(path, &e))?;
                if meta.is_dir() {
                    expand_directory(path, &node.entry_name, &mut confirmed, &mut total_bytes)?;
                } else {
                    total_bytes += meta.len();
                    confirmed.push_back(ConfirmedNode {
                        entry_name: node.entry_name.clone(),
                        source: NodeSource::Disk(path.clone()),
                        size: meta.len(),
                    });
                }
            }
        }
    }

    Ok((confirmed, total_bytes))
}

/// Expands a directory source into one confirmed node per descendant
/// file, rewriting each file's path so the directory root maps onto
/// the staged entry name. Hidden files are included; `.`/`..` never
/// appear in the walk.
fn expand_directory(
    root: &Path,
    entry_name: &str,
    confirmed: &mut VecDeque<ConfirmedNode>,
    total_bytes: &mut u64,
) -> Result<()> {
    for item in WalkDir::new(root) {
        let item = item.map_err(|e| ArchiveError::DiskOpenError {
            path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            source: std::io::Error::other(e.to_string()),
        })?;
        if !item.file_type().is_file() {
            continue;
        }

        let meta = item
            .metadata()
            .map_err(|e| ArchiveError::DiskOpenError {
                path: item.path().to_path_buf(),
                source: std::io::Error::other(e.to_string()),
            })?;

        let relative = item
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| item.path());
        let name = join_entry_name(entry_name, relative);

        *total_bytes += meta.len();
        confirmed.push_back(ConfirmedNode {
            entry_name: name,
            source: NodeSource::Disk(item.path().to_path_buf()),
            size: meta.len(),
        });
    }
    Ok(())
}

fn join_entry_name(prefix: &str, relative: &Path) -> String {
    let rel = relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        rel
    } else {
        format!("{prefix}/{rel}")
    }
}

fn stat_error(path: &Path, e: &std::io::Error) -> ArchiveError {
    match e.kind() {
        std::io::ErrorKind::NotFound => ArchiveError::FileDoesNotExist {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ArchiveError::NoPermissionToRead {
            path: path.to_path_buf(),
        },
        _ => ArchiveError::DiskOpenError {
            path: path.to_path_buf(),
            source: std::io::Error::new(e.kind(), e.to_string()),
        },
    }
}
