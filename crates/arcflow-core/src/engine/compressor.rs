//! Compression engine: worker thread, state machine and the public
//! [`Compressor`] handle.
//!
//! Staged transfer nodes are confirmed (validated and
//! directory-expanded) when a session starts, then drained
//! destructively one node at a time. Pause and cancel are observed at
//! block boundaries through the controlled reader feeding the codec;
//! pause/resume is supported only within one live engine instance —
//! the write-side archive handle keeps no durable cursor.

use std::collections::VecDeque;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;

use crate::codec::ArchiveSink;
use crate::codec::detect::ArchiveFormat;
use crate::codec::detect::detect_format;
use crate::codec::tar::TarSink;
use crate::codec::zip::ZipSink;
use crate::engine::CommandClass;
use crate::engine::ControlCommand;
use crate::engine::PassError;
use crate::engine::SessionState;
use crate::engine::control;
use crate::engine::control::Control;
use crate::engine::control::ControlledReader;
use crate::engine::control::Directive;
use crate::engine::progress::ProgressCounters;
use crate::engine::staging::ConfirmedNode;
use crate::engine::staging::NodeSource;
use crate::engine::staging::TransferNode;
use crate::engine::staging::confirm_nodes;
use crate::entry::Entry;
use crate::error::ArchiveError;
use crate::event::Event;
use crate::event::Output;
use crate::stream::DEFAULT_BLOCK_SIZE;
use crate::stream::SinkStream;

/// Commands posted to the compression worker.
enum CompressCommand {
    SetArchivePath(PathBuf),
    SetFormat(ArchiveFormat),
    SetPassword(String),
    SetBlockSize(usize),
    SetCompressionLevel(u8),
    AddFile {
        entry_name: String,
        path: PathBuf,
    },
    AddBytes {
        entry_name: String,
        bytes: Arc<[u8]>,
    },
    RemoveFile(String),
    Start,
    Pause,
    Resume,
    Cancel,
    Clear,
    Shutdown,
}

impl ControlCommand for CompressCommand {
    fn classify(self) -> CommandClass {
        match self {
            Self::Pause => CommandClass::Pause,
            Self::Resume => CommandClass::Resume,
            Self::Cancel => CommandClass::Cancel,
            Self::Shutdown => CommandClass::Shutdown,
            Self::SetPassword(pw) => CommandClass::Password(pw),
            _ => CommandClass::Other,
        }
    }
}

/// Where the produced archive goes.
enum CompressTarget {
    Disk { path: Option<PathBuf> },
    Memory,
}

/// Archive compression engine.
///
/// One instance owns one worker thread and runs at most one session at
/// a time. Mutators are silently ignored while a session is started or
/// paused (passwords excepted); dropping the handle cancels any
/// running session and joins the worker.
///
/// # Examples
///
/// ```no_run
/// use arcflow_core::Compressor;
/// use arcflow_core::Event;
///
/// let compressor = Compressor::to_disk("backup.tar.gz");
/// compressor.add_file("Cargo.toml");
/// compressor.add_file("src");
/// compressor.start();
///
/// for event in compressor.events().iter() {
///     match event {
///         Event::Finished(_) => break,
///         Event::Error(e) => panic!("compression failed: {e}"),
///         _ => {}
///     }
/// }
/// ```
pub struct Compressor {
    commands: Sender<CompressCommand>,
    events: Receiver<Event>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl Compressor {
    /// Creates a compressor writing the archive to `path`. The format
    /// is guessed from the extension unless set explicitly; partial
    /// output is written to a `.part` file renamed into place on
    /// success.
    #[must_use]
    pub fn to_disk<P: Into<PathBuf>>(path: P) -> Self {
        Self::spawn(CompressTarget::Disk {
            path: Some(path.into()),
        })
    }

    /// Creates a compressor producing the archive as one in-memory
    /// buffer, delivered in [`Output::Buffer`].
    #[must_use]
    pub fn to_memory() -> Self {
        Self::spawn(CompressTarget::Memory)
    }

    fn spawn(target: CompressTarget) -> Self {
        let (commands, command_rx) = unbounded();
        let (event_tx, events) = unbounded();
        let worker = std::thread::spawn(move || {
            run_worker(CompressorState::new(target), &command_rx, &event_tx);
        });
        Self {
            commands,
            events,
            worker: Some(worker),
        }
    }

    /// The engine's event channel.
    #[must_use]
    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Sets the output archive path of a disk-target compressor.
    pub fn set_archive<P: Into<PathBuf>>(&self, path: P) {
        self.send(CompressCommand::SetArchivePath(path.into()));
    }

    /// Sets the archive format explicitly, overriding extension
    /// guessing. Memory targets default to zip when unset.
    pub fn set_format(&self, format: ArchiveFormat) {
        self.send(CompressCommand::SetFormat(format));
    }

    /// Sets the archive password. Only the zip format supports
    /// encryption; other formats ignore the password.
    pub fn set_password<S: Into<String>>(&self, password: S) {
        self.send(CompressCommand::SetPassword(password.into()));
    }

    /// Sets the per-block transfer size (default 10 KiB).
    pub fn set_block_size(&self, bytes: usize) {
        self.send(CompressCommand::SetBlockSize(bytes));
    }

    /// Sets the compression level (1-9).
    pub fn set_compression_level(&self, level: u8) {
        self.send(CompressCommand::SetCompressionLevel(level));
    }

    /// Stages a file or directory; the entry name is the final path
    /// component, and directories expand recursively at start.
    pub fn add_file<P: Into<PathBuf>>(&self, path: P) {
        let path = path.into();
        let entry_name = path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        self.send(CompressCommand::AddFile { entry_name, path });
    }

    /// Stages a file or directory under a custom entry name.
    pub fn add_file_as<S: Into<String>, P: Into<PathBuf>>(&self, entry_name: S, path: P) {
        self.send(CompressCommand::AddFile {
            entry_name: entry_name.into(),
            path: path.into(),
        });
    }

    /// Stages several files or directories.
    pub fn add_files<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.add_file(path);
        }
    }

    /// Stages an in-memory buffer under the given entry name.
    pub fn add_bytes<S: Into<String>, B: Into<Arc<[u8]>>>(&self, entry_name: S, bytes: B) {
        self.send(CompressCommand::AddBytes {
            entry_name: entry_name.into(),
            bytes: bytes.into(),
        });
    }

    /// Removes a staged entry by name.
    pub fn remove_file<S: Into<String>>(&self, entry_name: S) {
        self.send(CompressCommand::RemoveFile(entry_name.into()));
    }

    /// Starts compression.
    pub fn start(&self) {
        self.send(CompressCommand::Start);
    }

    /// Requests suspension at the next block boundary.
    pub fn pause(&self) {
        self.send(CompressCommand::Pause);
    }

    /// Continues a paused session.
    pub fn resume(&self) {
        self.send(CompressCommand::Resume);
    }

    /// Requests cancellation at the next block boundary.
    pub fn cancel(&self) {
        self.send(CompressCommand::Cancel);
    }

    /// Resets all configuration and staged entries. Rejected while a
    /// session is active.
    pub fn clear(&self) {
        self.send(CompressCommand::Clear);
    }

    fn send(&self, cmd: CompressCommand) {
        let _ = self.commands.send(cmd);
    }
}

impl Drop for Compressor {
    fn drop(&mut self) {
        let _ = self.commands.send(CompressCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(
    mut state: CompressorState,
    commands: &Receiver<CompressCommand>,
    events: &Sender<Event>,
) {
    while let Ok(cmd) = commands.recv() {
        match cmd {
            CompressCommand::Shutdown => break,
            CompressCommand::Start => {
                if state.handle_start(commands, events) {
                    break;
                }
            }
            CompressCommand::Pause | CompressCommand::Resume | CompressCommand::Cancel => {}
            other => state.apply(other),
        }
    }
}

struct CompressorState {
    target: CompressTarget,
    format: Option<ArchiveFormat>,
    password: Option<String>,
    block_size: usize,
    level: Option<u8>,
    staged: Vec<TransferNode>,
    counters: ProgressCounters,
    session: SessionState,
    fatal: bool,
}

impl CompressorState {
    fn new(target: CompressTarget) -> Self {
        Self {
            target,
            format: None,
            password: None,
            block_size: DEFAULT_BLOCK_SIZE,
            level: None,
            staged: Vec::new(),
            counters: ProgressCounters::new(),
            session: SessionState::Idle,
            fatal: false,
        }
    }

    fn apply(&mut self, cmd: CompressCommand) {
        match cmd {
            CompressCommand::SetArchivePath(path) => {
                if let CompressTarget::Disk { path: target } = &mut self.target
                    && !path.as_os_str().is_empty()
                {
                    *target = Some(path);
                }
            }
            CompressCommand::SetFormat(format) => self.format = Some(format),
            CompressCommand::SetPassword(pw) => {
                if !pw.is_empty() {
                    self.password = Some(pw);
                }
            }
            CompressCommand::SetBlockSize(bytes) => self.block_size = bytes.max(1),
            CompressCommand::SetCompressionLevel(level) => {
                self.level = Some(level.clamp(1, 9));
            }
            CompressCommand::AddFile { entry_name, path } => {
                self.stage(TransferNode {
                    entry_name,
                    source: NodeSource::Disk(path),
                });
            }
            CompressCommand::AddBytes { entry_name, bytes } => {
                self.stage(TransferNode {
                    entry_name,
                    source: NodeSource::Memory(bytes),
                });
            }
            CompressCommand::RemoveFile(entry_name) => {
                self.staged.retain(|n| n.entry_name != entry_name);
            }
            CompressCommand::Clear => self.clear(),
            _ => {}
        }
    }

    /// Stages a node unless an entry with the same name already is.
    fn stage(&mut self, node: TransferNode) {
        if node.entry_name.is_empty() {
            return;
        }
        if self.staged.iter().any(|n| n.entry_name == node.entry_name) {
            return;
        }
        self.staged.push(node);
    }

    fn clear(&mut self) {
        if self.session.is_active() {
            return;
        }
        if let CompressTarget::Disk { path } = &mut self.target {
            *path = None;
        }
        self.format = None;
        self.password = None;
        self.block_size = DEFAULT_BLOCK_SIZE;
        self.level = None;
        self.staged.clear();
        self.counters.clear();
        self.session = SessionState::Idle;
        self.fatal = false;
    }

    /// Runs one `start`. Returns `true` when the worker should shut
    /// down.
    fn handle_start(
        &mut self,
        commands: &Receiver<CompressCommand>,
        events: &Sender<Event>,
    ) -> bool {
        let mut ctl = Control::new(commands, events);

        if self.session.is_active() {
            return false;
        }
        if self.fatal {
            ctl.emit(Event::Error(ArchiveError::ArchiveFatalError {
                context: "previous fatal error; clear the instance first".into(),
            }));
            return false;
        }

        if let Err(e) = self.validate_setup() {
            ctl.emit(Event::Error(e));
            return false;
        }

        let format = self.resolve_format();
        let (mut confirmed, total_bytes) = match confirm_nodes(&self.staged) {
            Ok(confirmed) => confirmed,
            Err(e) => {
                ctl.emit(Event::Error(e));
                return false;
            }
        };

        self.counters.set_totals(confirmed.len() as u64, total_bytes);
        self.counters.reset_processed();
        self.session = SessionState::Started;
        ctl.emit(Event::Started);

        match self.compress_pass(&mut ctl, &mut confirmed, format) {
            Ok(output) => {
                self.session = SessionState::Finished;
                ctl.emit(Event::Finished(output));
            }
            Err(PassError::Canceled) => {
                self.session = SessionState::Canceled;
                ctl.emit(Event::Canceled);
            }
            Err(PassError::Failed(e)) => {
                if e.is_fatal() {
                    self.fatal = true;
                }
                self.session = SessionState::Idle;
                ctl.emit(Event::Error(e));
            }
        }

        if let Some(pw) = ctl.take_password_update()
            && !pw.is_empty()
        {
            self.password = Some(pw);
        }
        ctl.shutdown_requested()
    }

    fn validate_setup(&self) -> Result<(), ArchiveError> {
        if let CompressTarget::Disk { path } = &self.target {
            let Some(path) = path else {
                return Err(ArchiveError::ArchiveNotGiven);
            };
            if path.exists() {
                return Err(ArchiveError::ArchiveFileAlreadyExists { path: path.clone() });
            }
        }
        if self.staged.is_empty() {
            return Err(ArchiveError::NoFilesToCompress);
        }
        Ok(())
    }

    fn resolve_format(&self) -> ArchiveFormat {
        if let Some(format) = self.format {
            return format;
        }
        if let CompressTarget::Disk { path: Some(path) } = &self.target
            && let Ok(format) = detect_format(path)
        {
            return format;
        }
        ArchiveFormat::Zip
    }

    fn compress_pass(
        &mut self,
        ctl: &mut Control<'_, CompressCommand>,
        confirmed: &mut VecDeque<ConfirmedNode>,
        format: ArchiveFormat,
    ) -> Result<Output, PassError> {
        let (stream, paths) = match &self.target {
            CompressTarget::Disk { path } => {
                let final_path = path.clone().ok_or(ArchiveError::ArchiveNotGiven)?;
                let part_path = part_path_for(&final_path);
                let stream = SinkStream::create_path(&part_path).map_err(|e| {
                    ArchiveError::ArchiveWriteOpenError {
                        path: final_path.clone(),
                        source: e,
                    }
                })?;
                (stream, Some((part_path, final_path)))
            }
            CompressTarget::Memory => (SinkStream::memory(), None),
        };

        let mut sink: Box<dyn ArchiveSink> = match format {
            ArchiveFormat::Zip => {
                Box::new(ZipSink::new(stream, self.password.clone(), self.level))
            }
            other => Box::new(
                TarSink::new(other.compression(), stream, self.level).map_err(|e| {
                    ArchiveError::ArchiveWriteOpenError {
                        path: paths
                            .as_ref()
                            .map_or_else(PathBuf::new, |(_, f)| f.clone()),
                        source: e,
                    }
                })?,
            ),
        };

        let drained = self.drain_nodes(ctl, confirmed, sink.as_mut());
        match drained {
            Ok(()) => {
                let bytes = sink.finish().map_err(|e| {
                    PassError::Failed(ArchiveError::ArchiveFatalError {
                        context: e.to_string(),
                    })
                })?;
                if let Some((part_path, final_path)) = paths {
                    std::fs::rename(&part_path, &final_path).map_err(|e| {
                        PassError::Failed(ArchiveError::ArchiveWriteOpenError {
                            path: final_path.clone(),
                            source: e,
                        })
                    })?;
                    Ok(Output::Disk)
                } else {
                    Ok(Output::Buffer(bytes.unwrap_or_default()))
                }
            }
            Err(e) => {
                // Abandon the partial archive; the .part file never
                // reaches the final path.
                drop(sink);
                if let Some((part_path, _)) = paths {
                    let _ = std::fs::remove_file(&part_path);
                }
                Err(e)
            }
        }
    }

    fn drain_nodes(
        &mut self,
        ctl: &mut Control<'_, CompressCommand>,
        confirmed: &mut VecDeque<ConfirmedNode>,
        sink: &mut dyn ArchiveSink,
    ) -> Result<(), PassError> {
        while let Some(node) = confirmed.pop_front() {
            let name = node.entry_name.clone();

            let result = match &node.source {
                NodeSource::Disk(path) => {
                    let mut file =
                        File::open(path).map_err(|e| ArchiveError::DiskOpenError {
                            path: path.clone(),
                            source: e,
                        })?;
                    let mtime = file
                        .metadata()
                        .ok()
                        .and_then(|m| m.modified().ok())
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map_or(0, |d| d.as_secs());

                    let mut entry = Entry::file(name.clone(), node.size);
                    entry.mtime = mtime;

                    let mut reader = ControlledReader::new(
                        &mut file,
                        ctl,
                        &mut self.counters,
                        &name,
                        self.block_size,
                    );
                    sink.add_entry(&entry, &mut reader)
                }
                NodeSource::Memory(data) => {
                    let mut cursor = std::io::Cursor::new(data.as_ref());
                    let mtime = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_or(0, |d| d.as_secs());

                    let mut entry = Entry::file(name.clone(), node.size);
                    entry.mtime = mtime;

                    let mut reader = ControlledReader::new(
                        &mut cursor,
                        ctl,
                        &mut self.counters,
                        &name,
                        self.block_size,
                    );
                    sink.add_entry(&entry, &mut reader)
                }
            };

            if let Err(e) = result {
                return Err(map_sink_error(e, &node));
            }

            self.counters.entry_done();
            ctl.emit(self.counters.event(&name));
            if ctl.poll() == Directive::Cancel {
                return Err(PassError::Canceled);
            }
        }
        Ok(())
    }
}

/// Distinguishes cancellation markers and source-read failures from
/// genuine archive write errors after a codec copy loop fails.
fn map_sink_error(e: ArchiveError, node: &ConfirmedNode) -> PassError {
    if let ArchiveError::ArchiveHeaderWriteError { source, .. } = &e {
        if control::is_cancel(source) {
            return PassError::Canceled;
        }
        if let Some(inner) = control::source_read_failure(source) {
            let path = match &node.source {
                NodeSource::Disk(path) => path.clone(),
                NodeSource::Memory(_) => PathBuf::new(),
            };
            return PassError::Failed(ArchiveError::DiskReadError {
                path,
                source: std::io::Error::new(inner.kind(), inner.to_string()),
            });
        }
    }
    PassError::Failed(e)
}

fn part_path_for(path: &std::path::Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
