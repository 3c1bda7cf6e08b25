//! Block-boundary command observation for running passes.
//!
//! Cancellation and pause are polled flags, not preemptive
//! interrupts: a running pass drains its command queue after every
//! block transfer and after every entry. A pause suspends the worker
//! in place — the pass's local state (codec cursor, current entry,
//! partially-consumed block) stays alive on the worker's stack until a
//! resume, cancel or shutdown arrives.

use std::io::Read;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::TryRecvError;

use crate::engine::CommandClass;
use crate::engine::ControlCommand;
use crate::engine::progress::ProgressCounters;
use crate::event::Event;

/// What a suspension-point check decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Directive {
    /// Keep transferring.
    Continue,
    /// Abandon the pass; partial output is left as-is.
    Cancel,
}

/// Command/event plumbing handed to a running pass.
pub(crate) struct Control<'a, C: ControlCommand> {
    commands: &'a Receiver<C>,
    events: &'a Sender<Event>,
    shutdown: bool,
    password_update: Option<String>,
}

impl<'a, C: ControlCommand> Control<'a, C> {
    pub fn new(commands: &'a Receiver<C>, events: &'a Sender<Event>) -> Self {
        Self {
            commands,
            events,
            shutdown: false,
            password_update: None,
        }
    }

    /// Sends an event; a dropped receiver is not an error.
    pub fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }

    /// `true` once the engine handle was dropped or asked to shut
    /// down; the worker loop exits after the current pass unwinds.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// Takes a password set while the pass was running, if any.
    pub fn take_password_update(&mut self) -> Option<String> {
        self.password_update.take()
    }

    /// Drains queued commands. Called after every block and after
    /// every entry, which bounds cancellation latency to one block
    /// transfer.
    pub fn poll(&mut self) -> Directive {
        loop {
            match self.commands.try_recv() {
                Ok(cmd) => match cmd.classify() {
                    CommandClass::Pause => {
                        if self.wait_resume() == Directive::Cancel {
                            return Directive::Cancel;
                        }
                    }
                    CommandClass::Cancel => return Directive::Cancel,
                    CommandClass::Shutdown => {
                        self.shutdown = true;
                        return Directive::Cancel;
                    }
                    CommandClass::Password(pw) => self.password_update = Some(pw),
                    CommandClass::Resume | CommandClass::Other => {}
                },
                Err(TryRecvError::Empty) => return Directive::Continue,
                Err(TryRecvError::Disconnected) => {
                    self.shutdown = true;
                    return Directive::Cancel;
                }
            }
        }
    }

    /// Suspends until resume, cancel or shutdown. Emits `Paused` on
    /// entry and `Resumed` when continuing. Mutators arriving while
    /// paused are dropped, matching the running-session rule.
    fn wait_resume(&mut self) -> Directive {
        self.emit(Event::Paused);
        loop {
            match self.commands.recv() {
                Ok(cmd) => match cmd.classify() {
                    CommandClass::Resume => {
                        self.emit(Event::Resumed);
                        return Directive::Continue;
                    }
                    CommandClass::Cancel => return Directive::Cancel,
                    CommandClass::Shutdown => {
                        self.shutdown = true;
                        return Directive::Cancel;
                    }
                    CommandClass::Password(pw) => self.password_update = Some(pw),
                    CommandClass::Pause | CommandClass::Other => {}
                },
                Err(_) => {
                    self.shutdown = true;
                    return Directive::Cancel;
                }
            }
        }
    }
}

/// Marker wrapped in an `io::Error` when a pass is canceled from
/// inside a codec-driven copy loop.
#[derive(Debug)]
pub(crate) struct CancelSignal;

impl std::fmt::Display for CancelSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation canceled")
    }
}

impl std::error::Error for CancelSignal {}

/// Marker distinguishing a source-read failure from an archive-write
/// failure when both surface as one `io::Error` out of the codec.
#[derive(Debug)]
pub(crate) struct SourceReadFailure(pub std::io::Error);

impl std::fmt::Display for SourceReadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source read failed: {}", self.0)
    }
}

impl std::error::Error for SourceReadFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Returns `true` if `err` carries a [`CancelSignal`].
pub(crate) fn is_cancel(err: &std::io::Error) -> bool {
    err.get_ref().is_some_and(|e| e.is::<CancelSignal>())
}

/// Extracts the original source-read failure from `err`, if present.
pub(crate) fn source_read_failure(err: &std::io::Error) -> Option<&std::io::Error> {
    err.get_ref()
        .and_then(|e| e.downcast_ref::<SourceReadFailure>())
        .map(|f| &f.0)
}

/// Reader wrapper used on the compression path: clamps reads to the
/// session block size, accounts progress, and observes queued
/// commands after every block while the codec runs its own copy loop.
pub(crate) struct ControlledReader<'a, 'b, C: ControlCommand> {
    inner: &'a mut dyn Read,
    ctl: &'a mut Control<'b, C>,
    counters: &'a mut ProgressCounters,
    entry: &'a str,
    block_size: usize,
}

impl<'a, 'b, C: ControlCommand> ControlledReader<'a, 'b, C> {
    pub fn new(
        inner: &'a mut dyn Read,
        ctl: &'a mut Control<'b, C>,
        counters: &'a mut ProgressCounters,
        entry: &'a str,
        block_size: usize,
    ) -> Self {
        Self {
            inner,
            ctl,
            counters,
            entry,
            block_size,
        }
    }
}

impl<C: ControlCommand> Read for ControlledReader<'_, '_, C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let limit = buf.len().min(self.block_size.max(1));
        let n = self
            .inner
            .read(&mut buf[..limit])
            .map_err(|e| std::io::Error::other(SourceReadFailure(e)))?;

        if n > 0 {
            self.counters.add_bytes(n as u64);
            if self.counters.totals_known() {
                self.ctl.emit(self.counters.event(self.entry));
            }
        }

        match self.ctl.poll() {
            Directive::Continue => Ok(n),
            Directive::Cancel => Err(std::io::Error::other(CancelSignal)),
        }
    }
}
