use colored::*;
use indicatif::{HumanBytes, HumanCount, HumanDuration, ProgressBar, ProgressStyle};

use pan_renumber::error::Error;
use pan_renumber::model::RenamePlanEntry;
use pan_renumber::orchestrator::BatchReport;
use pan_renumber::progress::ProgressReporter;
use pan_renumber::resolver::Resolution;
use pan_renumber::scanner::ScanReport;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner} {prefix:.bold.dim} {wide_msg}";
const BAR_TEMPLATE: &str = "[{elapsed_precise}] {prefix:.bold}▕{bar:.blue}▏{pos}/{len} {wide_msg}";
const FINISH_TEMPLATE: &str = "[{elapsed_precise}] {msg}";

/// Terminal progress: a spinner while scanning, a bar while renaming.
pub struct CliReporter {
    scan: ProgressBar,
    rename: ProgressBar,
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            scan: new_spinner(),
            rename: new_progress_bar(),
        }
    }
}

fn new_spinner() -> ProgressBar {
    let pb = ProgressBar::hidden();
    if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
        pb.set_style(style.tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]));
    }
    pb
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::hidden();
    if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
        pb.set_style(style.progress_chars("█▓▒░  "));
    }
    pb
}

fn finish_with_finish_style(pb: &ProgressBar, message: String) {
    if let Ok(style) = ProgressStyle::with_template(FINISH_TEMPLATE) {
        pb.set_style(style);
    }
    pb.finish_with_message(message);
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, roots: usize) {
        self.scan.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.scan.set_prefix("Scan");
        self.scan.set_message(format!("{} roots", roots));
    }

    fn on_scan_progress(&self, media_found: usize, current_path: &str, depth: usize) {
        self.scan.set_message(format!(
            "{} media | depth {} | {}",
            HumanCount(media_found as u64),
            depth,
            current_path
        ));
        self.scan.tick();
    }

    fn on_scan_complete(&self, report: &ScanReport) {
        finish_with_finish_style(
            &self.scan,
            format!(
                "Scan: {} media files ({}) in {}",
                report.files.len().to_string().green(),
                HumanBytes(report.total_size()),
                HumanDuration(report.duration),
            ),
        );
    }

    fn on_rename_start(&self, total: usize) {
        self.rename.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.rename.set_length(total as u64);
        self.rename.set_prefix("Rename");
    }

    fn on_rename_result(
        &self,
        _ordinal: usize,
        _total: usize,
        entry: &RenamePlanEntry,
        outcome: Result<(), &Error>,
    ) {
        match outcome {
            Ok(()) => self.rename.set_message(entry.new_name.clone()),
            Err(err) => self.rename.println(format!(
                "{} {} -> {}: {}",
                "✗".red(),
                entry.original_name,
                entry.new_name,
                err
            )),
        }
        self.rename.inc(1);
    }

    fn on_destination_attempt(&self, attempt: u32, found: Option<&Resolution>) {
        match found {
            Some(resolution) => self.rename.println(format!(
                "Destination {} (via {})",
                resolution.id.green(),
                resolution.source
            )),
            None => self
                .rename
                .println(format!("Destination attempt {} found nothing", attempt)),
        }
    }

    fn on_move_start(&self, count: usize, destination: &str) {
        self.rename
            .set_message(format!("moving {} files to {}", count, destination));
    }

    fn on_move_result(&self, count: usize, outcome: Result<(), &Error>) {
        if let Err(err) = outcome {
            self.rename
                .println(format!("{} moving {} files: {}", "✗".red(), count, err));
        }
    }

    fn on_batch_complete(&self, report: &BatchReport) {
        let stats = report.stats;
        finish_with_finish_style(
            &self.rename,
            format!(
                "Renamed {}/{} ({} failed), moved {} ({} failed) in {}",
                stats.rename_success.to_string().green(),
                report.total,
                stats.rename_fail.to_string().red(),
                stats.move_success.to_string().green(),
                stats.move_fail.to_string().red(),
                HumanDuration(report.duration),
            ),
        );
    }
}
