//! Two-phase batch: rename every plan entry, then move the renamed files in
//! one call.
//!
//! The phases never overlap. A failed rename drops the entry from the move.
//! A failed move leaves the renamed files where they are, under their new
//! names; nothing from phase one is undone.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::RemoteStore;
use crate::config::BatchConfig;
use crate::error::Error;
use crate::host::HostPage;
use crate::model::{OperationStats, RenamePlanEntry, RenamedItem};
use crate::progress::ProgressReporter;
use crate::resolver::{is_well_formed_id, DirectoryResolver, Resolution};
use crate::stats::StatsTimer;

/// Manual ids this short are treated as no answer.
const MIN_MANUAL_ID_LEN: usize = 6;

/// Answer to "the destination could not be resolved, what now?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationDecision {
    RenameOnly,
    Manual(String),
}

pub trait DestinationPolicy {
    fn on_unresolved(&self, renamed: &[RenamedItem]) -> DestinationDecision;
}

/// Always settles for rename-only.
pub struct RenameOnlyFallback;

impl DestinationPolicy for RenameOnlyFallback {
    fn on_unresolved(&self, _renamed: &[RenamedItem]) -> DestinationDecision {
        DestinationDecision::RenameOnly
    }
}

/// Where phase two sends the renamed files.
pub enum DestinationSource<'a> {
    /// Rename only.
    None,
    /// A directory id known up front.
    Fixed(String),
    /// Resolve from the host page once renames are done.
    Resolve {
        resolver: &'a mut DirectoryResolver,
        host: &'a dyn HostPage,
        policy: &'a dyn DestinationPolicy,
    },
}

impl DestinationSource<'_> {
    /// An id typed by the operator. Ids shorter than six characters mean
    /// rename only; odd-looking ids are used with a warning.
    pub fn manual(raw: &str) -> Self {
        match accept_manual_id(raw) {
            Some(id) => DestinationSource::Fixed(id),
            None => DestinationSource::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub rename_delay: Duration,
    pub move_delay: Duration,
    pub resolve_attempts: u32,
    pub resolve_retry_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&BatchConfig::default())
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            rename_delay: Duration::from_millis(config.rename_delay_ms),
            move_delay: Duration::from_millis(config.move_delay_ms),
            resolve_attempts: config.resolve_attempts.max(1),
            resolve_retry_delay: Duration::from_millis(config.resolve_retry_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: String,
    pub original_name: String,
    pub new_name: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub total: usize,
    pub stats: OperationStats,
    /// Successful renames, in plan order.
    pub renamed: Vec<RenamedItem>,
    pub rename_failures: Vec<ItemFailure>,
    /// Destination used for the move, if any.
    pub destination: Option<String>,
    pub move_attempted: bool,
    pub move_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl BatchReport {
    fn new(total: usize) -> Self {
        Self {
            total,
            stats: OperationStats::default(),
            renamed: Vec::new(),
            rename_failures: Vec::new(),
            destination: None,
            move_attempted: false,
            move_error: None,
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn renames_complete(&self) -> bool {
        self.stats.rename_success == self.total
    }

    /// Every rename succeeded and, when there was somewhere to move them,
    /// every renamed file was moved.
    pub fn is_complete_success(&self) -> bool {
        self.renames_complete()
            && (self.destination.is_none() || self.stats.move_success == self.stats.rename_success)
    }
}

pub struct RenameMoveOrchestrator<'a> {
    store: &'a dyn RemoteStore,
    options: BatchOptions,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> RenameMoveOrchestrator<'a> {
    pub fn new(
        store: &'a dyn RemoteStore,
        options: BatchOptions,
        reporter: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            store,
            options,
            reporter,
        }
    }

    pub async fn run(
        &self,
        plan: &[RenamePlanEntry],
        destination: DestinationSource<'_>,
    ) -> Result<BatchReport, Error> {
        let mut timer = StatsTimer::new();
        let mut report = BatchReport::new(plan.len());
        info!("Starting batch of {} renames", plan.len());

        self.rename_phase(plan, &mut report).await?;

        if report.renamed.is_empty() {
            info!("No file was renamed; skipping the move");
        } else {
            report.destination = self.destination(destination, &report.renamed).await;
            match report.destination.clone() {
                Some(dest) => self.move_phase(&dest, &mut report).await?,
                None => info!("No destination; renamed files stay in place"),
            }
        }

        report.duration = timer.finish();
        info!(
            "Batch finished in {}: renamed {}/{} (failed {}), moved {} (failed {})",
            timer.get_duration_string(),
            report.stats.rename_success,
            report.total,
            report.stats.rename_fail,
            report.stats.move_success,
            report.stats.move_fail,
        );
        self.reporter.on_batch_complete(&report);
        Ok(report)
    }

    async fn rename_phase(
        &self,
        plan: &[RenamePlanEntry],
        report: &mut BatchReport,
    ) -> Result<(), Error> {
        self.reporter.on_rename_start(plan.len());

        for (index, entry) in plan.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.options.rename_delay).await;
            }
            let outcome = self.store.rename(&entry.id, &entry.new_name).await;
            self.reporter
                .on_rename_result(index + 1, plan.len(), entry, outcome.as_ref().map(|_| ()));

            match outcome {
                Ok(()) => {
                    debug!("Renamed {} -> {}", entry.original_name, entry.new_name);
                    report.stats.rename_success += 1;
                    report.renamed.push(RenamedItem {
                        id: entry.id.clone(),
                        new_name: entry.new_name.clone(),
                    });
                }
                Err(Error::MissingCredential) => return Err(Error::MissingCredential),
                Err(err) => {
                    warn!("Rename {} -> {} failed: {}", entry.original_name, entry.new_name, err);
                    report.stats.rename_fail += 1;
                    report.rename_failures.push(ItemFailure {
                        id: entry.id.clone(),
                        original_name: entry.original_name.clone(),
                        new_name: entry.new_name.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn destination(
        &self,
        source: DestinationSource<'_>,
        renamed: &[RenamedItem],
    ) -> Option<String> {
        match source {
            DestinationSource::None => None,
            DestinationSource::Fixed(id) => Some(id),
            DestinationSource::Resolve {
                resolver,
                host,
                policy,
            } => {
                if let Some(resolution) = self.resolve_fresh(resolver, host).await {
                    info!("Destination {} (via {})", resolution.id, resolution.source);
                    return Some(resolution.id);
                }
                warn!("Could not resolve the destination directory");
                match policy.on_unresolved(renamed) {
                    DestinationDecision::RenameOnly => None,
                    DestinationDecision::Manual(id) => accept_manual_id(&id),
                }
            }
        }
    }

    async fn resolve_fresh(
        &self,
        resolver: &mut DirectoryResolver,
        host: &dyn HostPage,
    ) -> Option<Resolution> {
        resolver.invalidate();
        for attempt in 1..=self.options.resolve_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.options.resolve_retry_delay).await;
            }
            let found = resolver.resolve_on(host);
            self.reporter.on_destination_attempt(attempt, found.as_ref());
            if found.is_some() {
                return found;
            }
            debug!("Destination attempt {} found nothing", attempt);
        }
        None
    }

    async fn move_phase(&self, destination: &str, report: &mut BatchReport) -> Result<(), Error> {
        let ids: Vec<String> = report.renamed.iter().map(|item| item.id.clone()).collect();
        tokio::time::sleep(self.options.move_delay).await;

        self.reporter.on_move_start(ids.len(), destination);
        report.move_attempted = true;
        let outcome = self.store.move_files(&ids, destination).await;
        self.reporter
            .on_move_result(ids.len(), outcome.as_ref().map(|_| ()));

        match outcome {
            Ok(()) => {
                info!("Moved {} files to {}", ids.len(), destination);
                report.stats.move_success += ids.len();
                Ok(())
            }
            Err(Error::MissingCredential) => Err(Error::MissingCredential),
            Err(err) => {
                error!("Moving {} files to {} failed: {}", ids.len(), destination, err);
                report.stats.move_fail += ids.len();
                report.move_error = Some(err.to_string());
                Ok(())
            }
        }
    }
}

fn accept_manual_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    if id.chars().count() < MIN_MANUAL_ID_LEN {
        warn!("Ignoring manual destination {:?}; falling back to rename only", id);
        return None;
    }
    if !is_well_formed_id(id) {
        warn!("Manual destination {} does not look like a directory id; trying it anyway", id);
    }
    Some(id.to_string())
}
