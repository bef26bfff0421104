//! # levelbar-engine
//!
//! Polling and reconciliation engine for the levelbar status widget.
//!
//! The engine periodically pulls a [`Snapshot`](levelbar_types::Snapshot) from
//! a [`SnapshotSource`], and reconciles the menu it previously rendered
//! against it through a [`PresentationShell`]. Fetch failures never reach the
//! menu: they are logged and replaced by the zero snapshot.
//!
//! - [`Engine`] wires everything together and owns the lifecycle
//! - [`Fetcher`] turns one source call into a snapshot
//! - [`Reconciler`] diffs rendered nodes against a snapshot
//! - [`scheduler`] runs the fixed-period timer
//! - [`Config`] is the RON configuration file

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod link;
pub mod memory;
pub mod reconciler;
pub mod scheduler;
pub mod shell;
pub mod source;

pub use config::{Config, SourceConfig};
pub use engine::{Engine, EngineSettings};
pub use error::{ConfigError, FetchError};
pub use fetcher::{Fetcher, SourceFormat};
pub use format::{count_label, truncate};
pub use link::{CommandOpener, RecordingOpener, ResourceLink, ResourceOpener};
pub use memory::{CategoryEntry, CategoryId, MemoryShell, MenuState, ShellOp};
pub use reconciler::{Correlation, ReconcileReport, Reconciler, RenderSettings};
pub use scheduler::SchedulerHandle;
pub use shell::{DetailRow, PresentationShell};
pub use source::{CommandSource, FileSource, SnapshotSource};
