//! Streaming archive transcoding engine.
//!
//! `arcflow-core` extracts archive entries into files or memory
//! buffers and compresses files or memory buffers into archives (tar,
//! tar.gz, tar.bz2, tar.xz, tar.zst, zip), with mid-operation pause,
//! resume and cancellation, password-protected zip entries, entry
//! filtering and progress reporting.
//!
//! Each engine instance runs its session on its own worker thread;
//! public methods post commands, and results arrive on an event
//! channel.
//!
//! # Examples
//!
//! ```no_run
//! use arcflow_core::Event;
//! use arcflow_core::Extractor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::to_disk("/tmp/out");
//! extractor.set_archive("backup.tar.gz");
//! extractor.start();
//!
//! for event in extractor.events().iter() {
//!     match event {
//!         Event::Progress { entry, .. } => println!("extracting {entry}"),
//!         Event::Finished(_) => break,
//!         Event::Error(e) => return Err(e.into()),
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod engine;
pub mod entry;
pub mod error;
pub mod event;
pub mod filter;
pub mod metadata;
pub mod stream;
pub mod test_utils;

// Re-export main API types
pub use codec::compression::CompressionCodec;
pub use codec::detect::ArchiveFormat;
pub use engine::NodeSource;
pub use engine::SessionState;
pub use engine::TransferNode;
pub use engine::compressor::Compressor;
pub use engine::extractor::Extractor;
pub use entry::Entry;
pub use entry::EntryKind;
pub use error::ArchiveError;
pub use error::Result;
pub use event::Event;
pub use event::MemoryFile;
pub use event::Output;
pub use filter::EntryFilter;
pub use metadata::ArchiveInfo;
pub use metadata::EntryInfo;
