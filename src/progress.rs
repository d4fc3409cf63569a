use crate::error::Error;
use crate::model::RenamePlanEntry;
use crate::orchestrator::BatchReport;
use crate::resolver::Resolution;
use crate::scanner::ScanReport;

/// Trait for reporting scan and batch progress.
///
/// The CLI implements it with indicatif; tests and library callers can use
/// [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _roots: usize) {}
    fn on_scan_progress(&self, _media_found: usize, _current_path: &str, _depth: usize) {}
    fn on_scan_complete(&self, _report: &ScanReport) {}
    fn on_rename_start(&self, _total: usize) {}
    fn on_rename_result(
        &self,
        _ordinal: usize,
        _total: usize,
        _entry: &RenamePlanEntry,
        _outcome: Result<(), &Error>,
    ) {
    }
    fn on_destination_attempt(&self, _attempt: u32, _found: Option<&Resolution>) {}
    fn on_move_start(&self, _count: usize, _destination: &str) {}
    fn on_move_result(&self, _count: usize, _outcome: Result<(), &Error>) {}
    fn on_batch_complete(&self, _report: &BatchReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
