//! Handler interface for progress reporting and aborting extraction.

/// What the caller wants to happen after a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Continue,
    Abort,
}

/// Progress information for extraction operations
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Decompressed bytes written so far, across all entries
    pub processed_bytes: u64,
    /// Decompressed bytes to write in total, if known
    pub total_bytes: Option<u64>,
    /// 1-based number of the entry being processed
    pub processed_files: usize,
    pub total_files: Option<usize>,
    /// Path of the entry being processed
    pub current_file: String,
}

impl ProgressInfo {
    /// Gets the overall progress as a percentage (0.0 to 100.0)
    pub fn overall_progress(&self) -> f64 {
        match self.total_bytes {
            Some(total) if total > 0 => (self.processed_bytes as f64 / total as f64) * 100.0,
            _ => 0.0,
        }
    }
}

/// Receives notifications while entries are extracted.
///
/// Every method defaults to continuing, so implementors override only what
/// they need. Returning `ControlAction::Abort` stops the operation with
/// `Error::Cancelled`.
pub trait ArchiveHandler {
    fn on_started(&mut self) -> ControlAction {
        ControlAction::Continue
    }

    fn on_entry_started(&mut self, name: &str) -> ControlAction {
        let _ = name;
        ControlAction::Continue
    }

    fn on_progress(&mut self, progress: &ProgressInfo) -> ControlAction {
        let _ = progress;
        ControlAction::Continue
    }

    fn on_entry_finished(&mut self, name: &str) -> ControlAction {
        let _ = name;
        ControlAction::Continue
    }

    fn on_finished(&mut self) {}
}

/// A handler that does nothing
pub struct NoOpHandler;

impl ArchiveHandler for NoOpHandler {}
