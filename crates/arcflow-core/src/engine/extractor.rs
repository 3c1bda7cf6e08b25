//! Extraction engine: worker thread, state machine and the public
//! [`Extractor`] handle.
//!
//! The handle posts commands over a channel; the worker processes them
//! strictly in order and emits [`Event`]s. While a pass runs, the
//! command queue is drained at every block boundary, so pause and
//! cancel take effect at most one block transfer after they are
//! posted. A paused pass keeps its codec cursor alive in place until
//! resumed, canceled or shut down.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;

use crate::codec::EntrySource;
use crate::codec::classify_data_error;
use crate::codec::compression::decompress;
use crate::codec::detect::ArchiveFormat;
use crate::codec::detect::detect_format;
use crate::codec::detect::sniff_format;
use crate::codec::tar::TarSource;
use crate::codec::zip::ZipSource;
use crate::codec::zip::classify_read_error;
use crate::engine::CommandClass;
use crate::engine::ControlCommand;
use crate::engine::PassError;
use crate::engine::SessionState;
use crate::engine::control::Control;
use crate::engine::control::Directive;
use crate::engine::progress::ProgressCounters;
use crate::engine::target::DiskTarget;
use crate::engine::target::EntryTarget;
use crate::engine::target::MemoryTarget;
use crate::entry::Entry;
use crate::error::ArchiveError;
use crate::error::Result;
use crate::event::Event;
use crate::event::Output;
use crate::filter::EntryFilter;
use crate::filter::FilterDecision;
use crate::metadata::ArchiveInfo;
use crate::metadata::entry_info;
use crate::stream::DEFAULT_BLOCK_SIZE;
use crate::stream::ScratchBuffer;
use crate::stream::SourceStream;

/// Commands posted to the extraction worker.
enum ExtractCommand {
    SetArchivePath(PathBuf),
    SetArchiveBytes(Arc<[u8]>),
    SetOutputDir(PathBuf),
    SetPassword(String),
    SetBlockSize(usize),
    SetCalculateProgress(bool),
    AddFilter(String),
    AddIncludePattern(String),
    AddExcludePattern(String),
    SetBasePath(PathBuf),
    GetInfo,
    Start,
    Pause,
    Resume,
    Cancel,
    Clear,
    Shutdown,
}

impl ControlCommand for ExtractCommand {
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

/// Where extracted entries go.
enum ExtractTarget {
    Disk { output_dir: PathBuf },
    Memory,
}

/// Archive extraction engine.
///
/// One instance owns one worker thread and runs at most one session at
/// a time. Mutators are silently ignored while a session is started or
/// paused (passwords excepted); dropping the handle cancels any
/// running session and joins the worker.
///
/// # Examples
///
/// ```no_run
/// use arcflow_core::Event;
/// use arcflow_core::Extractor;
///
/// let extractor = Extractor::to_disk("/tmp/out");
/// extractor.set_archive("backup.tar.gz");
/// extractor.start();
///
/// for event in extractor.events().iter() {
///     match event {
///         Event::Finished(_) => break,
///         Event::Error(e) => panic!("extraction failed: {e}"),
///         _ => {}
///     }
/// }
/// ```
pub struct Extractor {
    commands: Sender<ExtractCommand>,
    events: Receiver<Event>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl Extractor {
    /// Creates an extractor writing entries under `output_dir`.
    #[must_use]
    pub fn to_disk<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self::spawn(ExtractTarget::Disk {
            output_dir: output_dir.into(),
        })
    }

    /// Creates an extractor collecting entries into memory buffers.
    #[must_use]
    pub fn to_memory() -> Self {
        Self::spawn(ExtractTarget::Memory)
    }

    fn spawn(target: ExtractTarget) -> Self {
        let (commands, command_rx) = unbounded();
        let (event_tx, events) = unbounded();
        let worker = std::thread::spawn(move || {
            run_worker(ExtractorState::new(target), &command_rx, &event_tx);
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

    /// Sets the archive to extract from a path. Implicitly clears any
    /// previous configuration; ignored while a session is active.
    pub fn set_archive<P: Into<PathBuf>>(&self, path: P) {
        self.send(ExtractCommand::SetArchivePath(path.into()));
    }

    /// Sets the archive to extract from an in-memory buffer.
    pub fn set_archive_bytes<B: Into<Arc<[u8]>>>(&self, bytes: B) {
        self.send(ExtractCommand::SetArchiveBytes(bytes.into()));
    }

    /// Changes the output directory of a disk-target extractor.
    /// Ignored for memory targets and while a session is active.
    pub fn set_output_dir<P: Into<PathBuf>>(&self, dir: P) {
        self.send(ExtractCommand::SetOutputDir(dir.into()));
    }

    /// Sets the archive password. Accepted at any time, including
    /// mid-session; an empty password is ignored.
    pub fn set_password<S: Into<String>>(&self, password: S) {
        self.send(ExtractCommand::SetPassword(password.into()));
    }

    /// Sets the per-block transfer size (default 10 KiB).
    pub fn set_block_size(&self, bytes: usize) {
        self.send(ExtractCommand::SetBlockSize(bytes));
    }

    /// Enables or disables the totals pre-pass. When disabled,
    /// progress events are indeterminate (1-of-1 per entry).
    pub fn set_calculate_progress(&self, enabled: bool) {
        self.send(ExtractCommand::SetCalculateProgress(enabled));
    }

    /// Adds an explicit path filter; see
    /// [`EntryFilter`](crate::filter::EntryFilter).
    pub fn add_filter<S: Into<String>>(&self, path: S) {
        self.send(ExtractCommand::AddFilter(path.into()));
    }

    /// Adds several explicit path filters.
    pub fn add_filters<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.add_filter(path);
        }
    }

    /// Adds an include glob pattern.
    pub fn add_include_pattern<S: Into<String>>(&self, pattern: S) {
        self.send(ExtractCommand::AddIncludePattern(pattern.into()));
    }

    /// Adds an exclude glob pattern.
    pub fn add_exclude_pattern<S: Into<String>>(&self, pattern: S) {
        self.send(ExtractCommand::AddExcludePattern(pattern.into()));
    }

    /// Sets the base path entries are rewritten against.
    pub fn set_base_path<P: Into<PathBuf>>(&self, base: P) {
        self.send(ExtractCommand::SetBasePath(base.into()));
    }

    /// Requests the archive's metadata listing; answered with
    /// [`Event::Info`] (or a password retry signal).
    pub fn get_info(&self) {
        self.send(ExtractCommand::GetInfo);
    }

    /// Starts (or retries) extraction.
    pub fn start(&self) {
        self.send(ExtractCommand::Start);
    }

    /// Requests suspension at the next block boundary.
    pub fn pause(&self) {
        self.send(ExtractCommand::Pause);
    }

    /// Continues a paused session.
    pub fn resume(&self) {
        self.send(ExtractCommand::Resume);
    }

    /// Requests cancellation at the next block boundary. Partial
    /// output is left as-is.
    pub fn cancel(&self) {
        self.send(ExtractCommand::Cancel);
    }

    /// Resets all configuration and cached state. Rejected while a
    /// session is active.
    pub fn clear(&self) {
        self.send(ExtractCommand::Clear);
    }

    fn send(&self, cmd: ExtractCommand) {
        let _ = self.commands.send(cmd);
    }
}

impl Drop for Extractor {
    fn drop(&mut self) {
        let _ = self.commands.send(ExtractCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(
    mut state: ExtractorState,
    commands: &Receiver<ExtractCommand>,
    events: &Sender<Event>,
) {
    while let Ok(cmd) = commands.recv() {
        match cmd {
            ExtractCommand::Shutdown => break,
            ExtractCommand::Start => {
                if state.handle_start(commands, events) {
                    break;
                }
            }
            ExtractCommand::GetInfo => state.handle_get_info(events),
            // Without an active session there is nothing to pause,
            // resume or cancel.
            ExtractCommand::Pause | ExtractCommand::Resume | ExtractCommand::Cancel => {}
            other => state.apply(other, events),
        }
    }
}

struct ExtractorState {
    target: ExtractTarget,
    archive_path: Option<PathBuf>,
    archive_bytes: Option<Arc<[u8]>>,
    password: Option<String>,
    block_size: usize,
    calculate_progress: bool,
    filter: EntryFilter,
    counters: ProgressCounters,
    info: Option<ArchiveInfo>,
    tries_info: u64,
    tries_start: u64,
    session: SessionState,
}

impl ExtractorState {
    fn new(target: ExtractTarget) -> Self {
        Self {
            target,
            archive_path: None,
            archive_bytes: None,
            password: None,
            block_size: DEFAULT_BLOCK_SIZE,
            calculate_progress: true,
            filter: EntryFilter::new(),
            counters: ProgressCounters::new(),
            info: None,
            tries_info: 0,
            tries_start: 0,
            session: SessionState::Idle,
        }
    }

    fn apply(&mut self, cmd: ExtractCommand, events: &Sender<Event>) {
        match cmd {
            ExtractCommand::SetArchivePath(path) => {
                if !path.as_os_str().is_empty() {
                    self.clear();
                    self.archive_path = Some(path);
                }
            }
            ExtractCommand::SetArchiveBytes(bytes) => {
                self.clear();
                self.archive_bytes = Some(bytes);
            }
            ExtractCommand::SetOutputDir(dir) => {
                if let ExtractTarget::Disk { output_dir } = &mut self.target
                    && !dir.as_os_str().is_empty()
                {
                    *output_dir = dir;
                }
            }
            ExtractCommand::SetPassword(pw) => self.apply_password(pw),
            ExtractCommand::SetBlockSize(bytes) => self.block_size = bytes.max(1),
            ExtractCommand::SetCalculateProgress(enabled) => self.calculate_progress = enabled,
            ExtractCommand::AddFilter(path) => self.filter.add_filter(path),
            ExtractCommand::AddIncludePattern(pattern) => {
                if let Err(e) = self.filter.add_include_pattern(&pattern) {
                    let _ = events.send(Event::Error(e));
                }
            }
            ExtractCommand::AddExcludePattern(pattern) => {
                if let Err(e) = self.filter.add_exclude_pattern(&pattern) {
                    let _ = events.send(Event::Error(e));
                }
            }
            ExtractCommand::SetBasePath(base) => self.filter.set_base_path(base),
            ExtractCommand::Clear => self.clear(),
            _ => {}
        }
    }

    fn apply_password(&mut self, password: String) {
        if !password.is_empty() {
            self.password = Some(password);
        }
    }

    fn clear(&mut self) {
        if self.session.is_active() {
            return;
        }
        self.archive_path = None;
        self.archive_bytes = None;
        self.password = None;
        self.block_size = DEFAULT_BLOCK_SIZE;
        self.calculate_progress = true;
        self.filter = EntryFilter::new();
        self.counters.clear();
        self.info = None;
        self.tries_info = 0;
        self.tries_start = 0;
        self.session = SessionState::Idle;
    }

    /// Runs one `start` (or retry). Returns `true` when the worker
    /// should shut down.
    fn handle_start(
        &mut self,
        commands: &Receiver<ExtractCommand>,
        events: &Sender<Event>,
    ) -> bool {
        let mut ctl = Control::new(commands, events);

        if self.session.is_active() {
            return false;
        }

        if let Err(e) = self.validate_setup() {
            ctl.emit(Event::Error(e));
            return false;
        }

        self.session = SessionState::Started;
        ctl.emit(Event::Started);

        if self.calculate_progress && self.counters.total_entries.is_none() {
            match self.totals_pass() {
                Ok((entries, bytes)) => self.counters.set_totals(entries, bytes),
                Err(e) => {
                    self.session = SessionState::Idle;
                    self.report_start_failure(&ctl, e);
                    return ctl.shutdown_requested();
                }
            }
        }

        self.counters.reset_processed();
        match self.extract_pass(&mut ctl) {
            Ok(output) => {
                self.session = SessionState::Finished;
                ctl.emit(Event::Finished(output));
            }
            Err(PassError::Canceled) => {
                self.session = SessionState::Canceled;
                ctl.emit(Event::Canceled);
            }
            Err(PassError::Failed(e)) => {
                self.session = SessionState::Idle;
                self.report_start_failure(&ctl, e);
            }
        }

        if let Some(pw) = ctl.take_password_update() {
            self.apply_password(pw);
        }
        ctl.shutdown_requested()
    }

    fn report_start_failure(&mut self, ctl: &Control<'_, ExtractCommand>, e: ArchiveError) {
        if e.is_password_error() && self.retry_allowed(self.tries_start) {
            ctl.emit(Event::PasswordRequired {
                tries: self.tries_start,
            });
            self.tries_start += 1;
        }
        ctl.emit(Event::Error(e));
    }

    /// A password failure enters the retry protocol on the first
    /// attempt, and stays in it only while a non-empty password is
    /// set: an unset password on a retry means the caller gave up, and
    /// the failure becomes terminal.
    fn retry_allowed(&self, tries: u64) -> bool {
        tries == 0 || self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    fn handle_get_info(&mut self, events: &Sender<Event>) {
        if let Some(info) = &self.info {
            let _ = events.send(Event::Info(info.clone()));
            return;
        }

        match self.info_pass() {
            Ok((info, entries, bytes)) => {
                self.counters.set_totals(entries, bytes);
                self.info = Some(info.clone());
                let _ = events.send(Event::Info(info));
            }
            Err(e) if e.is_password_error() && self.retry_allowed(self.tries_info) => {
                let _ = events.send(Event::PasswordRequired {
                    tries: self.tries_info,
                });
                self.tries_info += 1;
            }
            Err(e) => {
                let _ = events.send(Event::Error(e));
            }
        }
    }

    /// Setup checks, performed before any session state changes.
    fn validate_setup(&self) -> Result<()> {
        if self.archive_path.is_none() && self.archive_bytes.is_none() {
            return Err(ArchiveError::ArchiveNotGiven);
        }
        if let Some(path) = &self.archive_path {
            let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ArchiveError::ArchiveDoesNotExist {
                    path: path.clone(),
                },
                std::io::ErrorKind::PermissionDenied => ArchiveError::NoPermissionToRead {
                    path: path.clone(),
                },
                _ => ArchiveError::CannotOpen {
                    path: path.clone(),
                    source: e,
                },
            })?;
            if !meta.is_file() {
                return Err(ArchiveError::InvalidArchiveFile { path: path.clone() });
            }
        }

        if let ExtractTarget::Disk { output_dir } = &self.target {
            let meta =
                std::fs::metadata(output_dir).map_err(|_| ArchiveError::InvalidOutputDirectory {
                    path: output_dir.clone(),
                })?;
            if !meta.is_dir() {
                return Err(ArchiveError::InvalidOutputDirectory {
                    path: output_dir.clone(),
                });
            }
            if meta.permissions().readonly() {
                return Err(ArchiveError::NoPermissionToWrite {
                    path: output_dir.clone(),
                });
            }
        }
        Ok(())
    }

    fn open_source(&self) -> Result<SourceStream> {
        if let Some(path) = &self.archive_path {
            SourceStream::open_path(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ArchiveError::ArchiveDoesNotExist {
                    path: path.clone(),
                },
                std::io::ErrorKind::PermissionDenied => ArchiveError::NoPermissionToRead {
                    path: path.clone(),
                },
                _ => ArchiveError::CannotOpen {
                    path: path.clone(),
                    source: e,
                },
            })
        } else if let Some(bytes) = &self.archive_bytes {
            Ok(SourceStream::from_bytes(Arc::clone(bytes)))
        } else {
            Err(ArchiveError::ArchiveNotGiven)
        }
    }

    fn resolve_format(&self, stream: &mut SourceStream) -> Result<ArchiveFormat> {
        match &self.archive_path {
            Some(path) => detect_format(path).or_else(|_| sniff_format(stream)),
            None => sniff_format(stream),
        }
    }

    fn context_name(&self) -> String {
        self.archive_path.as_ref().map_or_else(
            || "<memory archive>".to_string(),
            |p| p.to_string_lossy().into_owned(),
        )
    }

    /// Read-only scan over all entries; shared by the totals pre-pass
    /// and the metadata pass. Opens an independent stream so the main
    /// pass is unaffected.
    fn scan_archive<F: FnMut(&Entry)>(&self, mut on_entry: F) -> Result<()> {
        let mut stream = self.open_source()?;
        let format = self.resolve_format(&mut stream)?;
        let context = self.context_name();

        match format {
            ArchiveFormat::Zip => {
                let mut archive = zip::ZipArchive::new(stream)
                    .map_err(|e| classify_read_error(&e, &context))?;
                let mut source = ZipSource::new(&mut archive, self.password.clone(), context);
                while let Some(entry) = source.next_entry()? {
                    on_entry(&entry);
                }
            }
            _ => {
                let reader = decompress(format.compression(), stream).map_err(|e| {
                    ArchiveError::ArchiveCorrupted {
                        context: format!("{context}: {e}"),
                    }
                })?;
                let mut archive = tar::Archive::new(reader);
                let entries =
                    archive
                        .entries()
                        .map_err(|e| ArchiveError::ArchiveCorrupted {
                            context: format!("{context}: {e}"),
                        })?;
                let mut source = TarSource::new(entries, context);
                while let Some(entry) = source.next_entry()? {
                    on_entry(&entry);
                }
            }
        }
        Ok(())
    }

    fn totals_pass(&self) -> Result<(u64, u64)> {
        let mut entries = 0u64;
        let mut bytes = 0u64;
        self.scan_archive(|entry| {
            entries += 1;
            bytes += entry.size;
        })?;
        Ok((entries, bytes))
    }

    fn info_pass(&self) -> Result<(ArchiveInfo, u64, u64)> {
        let mut info = ArchiveInfo::new();
        let mut entries = 0u64;
        let mut bytes = 0u64;
        let filter = &self.filter;
        self.scan_archive(|entry| {
            let excluded = filter.evaluate(&entry.path).is_excluded();
            info.insert(entry.path_string(), entry_info(entry, excluded));
            entries += 1;
            bytes += entry.size;
        })?;
        Ok((info, entries, bytes))
    }

    fn extract_pass(
        &mut self,
        ctl: &mut Control<'_, ExtractCommand>,
    ) -> std::result::Result<Output, PassError> {
        let mut stream = self.open_source()?;
        let format = self.resolve_format(&mut stream)?;
        let context = self.context_name();

        let target: Box<dyn EntryTarget> = match &self.target {
            ExtractTarget::Disk { output_dir } => Box::new(DiskTarget::new(output_dir.clone())),
            ExtractTarget::Memory => Box::new(MemoryTarget::new()),
        };
        let scratch = ScratchBuffer::new(self.block_size);

        match format {
            ArchiveFormat::Zip => {
                let mut archive = zip::ZipArchive::new(stream)
                    .map_err(|e| PassError::Failed(classify_read_error(&e, &context)))?;
                let mut source = ZipSource::new(&mut archive, self.password.clone(), context);
                self.drive(&mut source, target, scratch, ctl)
            }
            _ => {
                let reader = decompress(format.compression(), stream).map_err(|e| {
                    PassError::Failed(ArchiveError::ArchiveCorrupted {
                        context: format!("{context}: {e}"),
                    })
                })?;
                let mut archive = tar::Archive::new(reader);
                let entries = archive.entries().map_err(|e| {
                    PassError::Failed(ArchiveError::ArchiveCorrupted {
                        context: format!("{context}: {e}"),
                    })
                })?;
                let mut source = TarSource::new(entries, context);
                self.drive(&mut source, target, scratch, ctl)
            }
        }
    }

    /// The per-entry/per-block transcoding loop.
    fn drive<S: EntrySource>(
        &mut self,
        source: &mut S,
        mut target: Box<dyn EntryTarget>,
        mut scratch: ScratchBuffer,
        ctl: &mut Control<'_, ExtractCommand>,
    ) -> std::result::Result<Output, PassError> {
        loop {
            if ctl.poll() == Directive::Cancel {
                return Err(PassError::Canceled);
            }

            let Some(entry) = source.next_entry()? else {
                break;
            };
            let name = entry.path_string();

            let routed_path = match self.filter.evaluate(&entry.path) {
                FilterDecision::Excluded => {
                    // Skipped entries still account their size so
                    // aggregate byte totals stay consistent.
                    self.counters.add_bytes(entry.size);
                    self.counters.entry_done();
                    ctl.emit(self.counters.event(&name));
                    continue;
                }
                FilterDecision::Included(path) => path,
            };

            let mut routed = entry.clone();
            routed.path = routed_path;

            if target.begin_entry(&routed)? {
                let mut offset = 0u64;
                let mut data = source.open_data()?;
                loop {
                    let n = data
                        .read(scratch.as_mut_slice())
                        .map_err(|e| PassError::Failed(classify_data_error(&e, &name)))?;
                    if n == 0 {
                        break;
                    }
                    target.write_block(offset, &scratch.as_mut_slice()[..n])?;
                    offset += n as u64;
                    self.counters.add_bytes(n as u64);
                    if self.counters.totals_known() {
                        ctl.emit(self.counters.event(&name));
                    }
                    if ctl.poll() == Directive::Cancel {
                        return Err(PassError::Canceled);
                    }
                }
            }
            target.finish_entry(&routed)?;
            self.counters.entry_done();
            ctl.emit(self.counters.event(&name));
        }

        Ok(target.into_output())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_setup_requires_archive() {
        let state = ExtractorState::new(ExtractTarget::Memory);
        assert!(matches!(
            state.validate_setup(),
            Err(ArchiveError::ArchiveNotGiven)
        ));
    }

    #[test]
    fn test_validate_setup_missing_archive_file() {
        let mut state = ExtractorState::new(ExtractTarget::Memory);
        state.archive_path = Some(PathBuf::from("/no/such/archive.tar"));
        assert!(matches!(
            state.validate_setup(),
            Err(ArchiveError::ArchiveDoesNotExist { .. })
        ));
    }

    #[test]
    fn test_validate_setup_rejects_directory_archive() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut state = ExtractorState::new(ExtractTarget::Memory);
        state.archive_path = Some(temp.path().to_path_buf());
        assert!(matches!(
            state.validate_setup(),
            Err(ArchiveError::InvalidArchiveFile { .. })
        ));
    }

    #[test]
    fn test_validate_setup_bad_output_dir() {
        let mut state = ExtractorState::new(ExtractTarget::Disk {
            output_dir: PathBuf::from("/no/such/output/dir"),
        });
        state.archive_bytes = Some(Arc::from(b"x".as_slice()));
        assert!(matches!(
            state.validate_setup(),
            Err(ArchiveError::InvalidOutputDirectory { .. })
        ));
    }

    #[test]
    fn test_retry_allowed_rules() {
        let mut state = ExtractorState::new(ExtractTarget::Memory);
        // First failure always signals a retry.
        assert!(state.retry_allowed(0));
        // Later failures only while a password is set.
        assert!(!state.retry_allowed(1));
        state.apply_password("pw".into());
        assert!(state.retry_allowed(1));
    }

    #[test]
    fn test_empty_password_ignored() {
        let mut state = ExtractorState::new(ExtractTarget::Memory);
        state.apply_password(String::new());
        assert!(state.password.is_none());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut state = ExtractorState::new(ExtractTarget::Memory);
        state.archive_bytes = Some(Arc::from(b"x".as_slice()));
        state.apply_password("pw".into());
        state.block_size = 64;
        state.tries_start = 3;
        state.counters.set_totals(5, 100);

        state.clear();
        assert!(state.archive_bytes.is_none());
        assert!(state.password.is_none());
        assert_eq!(state.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(state.tries_start, 0);
        assert!(state.counters.total_entries.is_none());
        assert_eq!(state.session, SessionState::Idle);
    }

    #[test]
    fn test_clear_rejected_while_active() {
        let mut state = ExtractorState::new(ExtractTarget::Memory);
        state.archive_bytes = Some(Arc::from(b"x".as_slice()));
        state.session = SessionState::Started;
        state.clear();
        assert!(state.archive_bytes.is_some());
    }
}
