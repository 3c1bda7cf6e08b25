//! The transcoding engine: session state machine, worker-thread
//! command processing, and the extraction/compression front-ends.

pub mod compressor;
pub mod extractor;

mod control;
mod progress;
mod staging;
mod target;

pub use staging::NodeSource;
pub use staging::TransferNode;

use crate::error::ArchiveError;

/// Lifecycle state of an engine instance's session.
///
/// Exactly one session is active per instance at a time. `start` while
/// `Started` or `Paused` is a no-op; `clear` while `Started` is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has run, or `clear` reset the instance.
    Idle,
    /// A session is running.
    Started,
    /// A session is suspended at a block boundary.
    Paused,
    /// The last session ended on a cancel request.
    Canceled,
    /// The last session completed successfully.
    Finished,
}

impl SessionState {
    /// Returns `true` while a session holds the archive handle.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Started | Self::Paused)
    }
}

/// How a transcoding pass ended early.
pub(crate) enum PassError {
    /// A cancel request was observed at a suspension point.
    Canceled,
    /// The pass failed with a real error.
    Failed(ArchiveError),
}

impl From<ArchiveError> for PassError {
    fn from(e: ArchiveError) -> Self {
        Self::Failed(e)
    }
}

/// Classification of a queued command, as seen from inside a running
/// pass. Mutators map to [`CommandClass::Other`] and are silently
/// dropped, honoring the rule that staged state is immutable while a
/// session is Started or Paused. Passwords are the exception: they may
/// change at any time.
pub(crate) enum CommandClass {
    /// Suspend at the next block boundary.
    Pause,
    /// Continue a suspended session.
    Resume,
    /// Terminate at the next block boundary.
    Cancel,
    /// The engine handle is being dropped; cancel and drain.
    Shutdown,
    /// A password update, applied immediately.
    Password(String),
    /// Anything else; ignored while a session is active.
    Other,
}

/// Implemented by each engine's command enum so the shared control
/// loop can classify queued commands mid-pass.
pub(crate) trait ControlCommand {
    fn classify(self) -> CommandClass;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_activity() {
        assert!(SessionState::Started.is_active());
        assert!(SessionState::Paused.is_active());
        assert!(!SessionState::Idle.is_active());
        assert!(!SessionState::Finished.is_active());
        assert!(!SessionState::Canceled.is_active());
    }
}
