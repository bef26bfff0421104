//! Snapshot fetcher: one source call, parsed, failures normalized.

use std::sync::Arc;

use levelbar_types::{Snapshot, Ticket};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::source::SnapshotSource;

/// Shape of the source's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// `{ total, levels: [{ level, value, details }] }`
    #[default]
    Snapshot,
    /// Flat ticket array, grouped by department.
    Tickets,
}

/// Fetches and parses snapshots from a [`SnapshotSource`].
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn SnapshotSource>,
    format: SourceFormat,
}

impl Fetcher {
    pub fn new(source: Arc<dyn SnapshotSource>, format: SourceFormat) -> Self {
        Self { source, format }
    }

    /// Fetch a snapshot, substituting [`Snapshot::empty`] on any failure.
    ///
    /// Failures are logged, never returned.
    pub async fn fetch(&self) -> Snapshot {
        match self.try_fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "snapshot fetch failed, showing empty snapshot"
                );
                Snapshot::empty()
            }
        }
    }

    /// Fetch a snapshot, returning the failure instead of substituting.
    pub async fn try_fetch(&self) -> Result<Snapshot, FetchError> {
        let raw = self.source.produce().await?;
        let snapshot = match self.format {
            SourceFormat::Snapshot => Snapshot::from_json(&raw)?,
            SourceFormat::Tickets => Ticket::snapshot_from_json(&raw)?,
        };
        tracing::debug!(
            total = snapshot.total,
            levels = snapshot.levels.len(),
            details = snapshot.detail_count(),
            "fetched snapshot"
        );
        Ok(snapshot)
    }
}
