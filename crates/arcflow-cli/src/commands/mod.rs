//! Subcommand implementations.

pub mod create;
pub mod extract;
pub mod list;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use arcflow_core::Event;
use arcflow_core::Output;
use crossbeam_channel::Receiver;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;

/// Totals observed from the last progress event of a session.
#[derive(Default, Clone, Copy)]
pub struct SessionTotals {
    pub entries: u64,
    pub bytes: u64,
}

/// Drives an engine's event channel to completion, updating the
/// progress bar along the way.
pub fn run_to_completion(
    events: &Receiver<Event>,
    bar: &ProgressBar,
) -> Result<(Output, SessionTotals)> {
    let mut totals = SessionTotals::default();
    loop {
        let event = events.recv().context("engine stopped unexpectedly")?;
        match event {
            Event::Finished(output) => return Ok((output, totals)),
            Event::Error(e) => bail!(e),
            Event::Canceled => bail!("operation canceled"),
            Event::PasswordRequired { .. } => {
                bail!("archive requires a password (pass one with --password)")
            }
            Event::Progress {
                entry,
                processed_entries,
                processed_bytes,
                total_bytes,
                ..
            } => {
                totals.entries = processed_entries;
                totals.bytes = processed_bytes;
                if total_bytes > 1 {
                    bar.set_length(total_bytes);
                    bar.set_position(processed_bytes);
                }
                bar.set_message(entry);
            }
            _ => {}
        }
    }
}

/// A byte-granular progress bar, hidden when quiet or not a terminal.
pub fn progress_bar(quiet: bool, json: bool) -> ProgressBar {
    if quiet || json || !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {bytes}/{total_bytes} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
