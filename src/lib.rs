//! Renumber media files in a Quark pan folder tree and gather them into one
//! directory.
//!
//! The flow is: seed roots from the host page ([`host`]), walk the remote
//! tree ([`scanner`]), build the numbered plan ([`naming`]), then rename and
//! move ([`orchestrator`]) against a [`client::RemoteStore`].

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod media;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod stats;

pub use client::{Credential, Listing, PanClient, RemoteStore};
pub use config::AppConfig;
pub use error::Error;
pub use model::{MediaFile, OperationStats, RemoteNode, RenamePlanEntry, RenamedItem};
pub use orchestrator::{BatchReport, DestinationSource, RenameMoveOrchestrator};
pub use progress::{ProgressReporter, SilentReporter};
pub use resolver::{DirectoryResolver, Resolution};
pub use scanner::{ScanReport, TreeScanner};
