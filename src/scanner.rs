use indicatif::HumanBytes;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::RemoteStore;
use crate::config::ScanConfig;
use crate::error::Error;
use crate::media::MediaFilter;
use crate::model::{MediaFile, RemoteNode};
use crate::progress::ProgressReporter;
use crate::stats::StatsTimer;

/// What to do after a directory listing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Leave the subtree out and carry on with the rest of the walk.
    Skip,
    /// Stop the whole scan.
    Abort,
}

/// Asked once per failed listing. The CLI puts the question to the operator.
pub trait FailurePolicy {
    fn on_list_failure(&self, directory: &RemoteNode, error: &Error) -> FailureDecision;
}

pub struct SkipFailures;

impl FailurePolicy for SkipFailures {
    fn on_list_failure(&self, _directory: &RemoteNode, _error: &Error) -> FailureDecision {
        FailureDecision::Skip
    }
}

pub struct AbortOnFailure;

impl FailurePolicy for AbortOnFailure {
    fn on_list_failure(&self, _directory: &RemoteNode, _error: &Error) -> FailureDecision {
        FailureDecision::Abort
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub sibling_delay: Duration,
    pub root_delay: Duration,
    pub filter: MediaFilter,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            sibling_delay: Duration::from_millis(config.sibling_delay_ms),
            root_delay: Duration::from_millis(config.root_delay_ms),
            filter: MediaFilter::new(&config.media_extensions),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDirectory {
    pub id: String,
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Media files in traversal order.
    pub files: Vec<MediaFile>,
    pub directories_listed: usize,
    pub files_seen: usize,
    pub skipped: Vec<SkippedDirectory>,
    /// Nodes left unvisited because they sat below the depth limit.
    pub depth_truncated: usize,
    pub duration: Duration,
}

impl ScanReport {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} media files ({}) from {} files in {} directories; {} skipped, {} truncated",
            self.files.len(),
            HumanBytes(self.total_size()),
            self.files_seen,
            self.directories_listed,
            self.skipped.len(),
            self.depth_truncated,
        )
    }
}

/// Depth-first, pre-order walk of the remote tree below a set of roots.
///
/// One listing is in flight at a time, children are visited in listing
/// order, and a fixed delay separates sibling visits. Every call is a fresh
/// walk.
pub struct TreeScanner<'a> {
    store: &'a dyn RemoteStore,
    options: ScanOptions,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> TreeScanner<'a> {
    pub fn new(
        store: &'a dyn RemoteStore,
        options: ScanOptions,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            store,
            options,
            reporter,
        }
    }

    /// List `directory_id` and use its entries as roots.
    pub async fn roots_from_directory(&self, directory_id: &str) -> Result<Vec<RemoteNode>, Error> {
        let listing = self.store.list_children(directory_id).await?;
        Ok(listing.entries)
    }

    pub async fn scan(
        &self,
        roots: &[RemoteNode],
        policy: &dyn FailurePolicy,
    ) -> Result<ScanReport, Error> {
        let mut timer = StatsTimer::new();
        let mut report = ScanReport::default();
        info!("Scanning {} root entries (max depth {})", roots.len(), self.options.max_depth);
        self.reporter.on_scan_start(roots.len());

        for (index, root) in roots.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.options.root_delay).await;
            }
            self.walk(root.clone(), &mut report, policy).await?;
        }

        report.duration = timer.finish();
        info!("Scan finished in {}: {}", timer.get_duration_human(), report.summary());
        self.reporter.on_scan_complete(&report);
        Ok(report)
    }

    async fn walk(
        &self,
        root: RemoteNode,
        report: &mut ScanReport,
        policy: &dyn FailurePolicy,
    ) -> Result<(), Error> {
        let mut stack: Vec<(RemoteNode, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = stack.pop() {
            if depth > 0 {
                tokio::time::sleep(self.options.sibling_delay).await;
            }
            if depth > self.options.max_depth {
                debug!("Depth limit {} reached at {}", self.options.max_depth, node.path);
                report.depth_truncated += 1;
                continue;
            }

            if !node.is_directory {
                report.files_seen += 1;
                if self.options.filter.is_media(&node.name) {
                    debug!("{:indent$}Found media file {}", "", node.path, indent = depth * 2);
                    report.files.push(MediaFile::from(&node));
                } else {
                    debug!("{:indent$}Skipping {}", "", node.path, indent = depth * 2);
                }
                continue;
            }

            self.reporter
                .on_scan_progress(report.files.len(), &node.path, depth + 1);

            let listing = match self.store.list_children(&node.id).await {
                Ok(listing) => listing,
                Err(Error::MissingCredential) => return Err(Error::MissingCredential),
                Err(err) => {
                    warn!("Listing {} ({}) failed: {}", node.path, node.id, err);
                    match policy.on_list_failure(&node, &err) {
                        FailureDecision::Skip => {
                            report.skipped.push(SkippedDirectory {
                                id: node.id.clone(),
                                path: node.path.clone(),
                                error: err.to_string(),
                            });
                            continue;
                        }
                        FailureDecision::Abort => return Err(Error::ScanAborted(node.path)),
                    }
                }
            };

            report.directories_listed += 1;
            debug!(
                "{:indent$}{} holds {} entries",
                "",
                node.path,
                listing.entries.len(),
                indent = depth * 2
            );

            // Reversed so the stack pops children in listing order.
            for mut child in listing.entries.into_iter().rev() {
                child.path = node.child_path(&child.name);
                if child.parent_id.is_empty() {
                    child.parent_id = node.id.clone();
                }
                stack.push((child, depth + 1));
            }
        }

        Ok(())
    }
}
