//! Progress counters shared by both transcoding directions.

use crate::event::Event;

/// Processed/total entry and byte counters for one session.
///
/// Counters are monotonically non-decreasing within a run and reset
/// only on an explicit clear or at the start of a fresh pass. The
/// total entry count stays unknown until a pre-pass (or metadata pass)
/// fills it in.
#[derive(Debug, Default, Clone)]
pub(crate) struct ProgressCounters {
    pub processed_entries: u64,
    pub total_entries: Option<u64>,
    pub processed_bytes: u64,
    pub total_bytes: u64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets totals and processed counts.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Resets the processed side for a fresh pass, keeping totals.
    pub fn reset_processed(&mut self) {
        self.processed_entries = 0;
        self.processed_bytes = 0;
    }

    /// Records totals from a pre-pass or metadata pass.
    pub fn set_totals(&mut self, entries: u64, bytes: u64) {
        self.total_entries = Some(entries);
        self.total_bytes = bytes;
    }

    /// Accounts `n` transferred (or skipped) bytes.
    pub fn add_bytes(&mut self, n: u64) {
        self.processed_bytes += n;
    }

    /// Accounts one fully processed entry.
    pub fn entry_done(&mut self) {
        self.processed_entries += 1;
    }

    /// Whether aggregate fractions can be reported. Without a
    /// pre-pass, progress is indeterminate and reported 1-of-1 per
    /// entry instead.
    pub fn totals_known(&self) -> bool {
        self.total_bytes > 0 && self.total_entries.is_some_and(|t| t > 0)
    }

    /// Builds the progress event for the current counter state.
    pub fn event(&self, entry: &str) -> Event {
        if self.totals_known() {
            Event::Progress {
                entry: entry.to_string(),
                processed_entries: self.processed_entries,
                total_entries: self.total_entries.unwrap_or(0),
                processed_bytes: self.processed_bytes,
                total_bytes: self.total_bytes,
            }
        } else {
            Event::Progress {
                entry: entry.to_string(),
                processed_entries: 1,
                total_entries: 1,
                processed_bytes: 1,
                total_bytes: 1,
            }
        }
    }
}
