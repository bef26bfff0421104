//! The polling engine: fetcher, reconciler and scheduler wired together.
//!
//! ```text
//! Engine::start ──▶ cycle (populate) ──▶ scheduler ──tick──▶ cycle ──tick──▶ cycle ...
//!                                                       │
//! Engine::refresh ─────────▶ cycle                      └─ busy? skip this firing
//!
//! cycle = cycle lock ─▶ Fetcher::fetch ─▶ Reconciler::reconcile ─▶ shell.present()
//!
//! Engine::stop ──▶ scheduler stopped (task awaited) ──▶ reconciler teardown
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::ConfigError;
use crate::fetcher::{Fetcher, SourceFormat};
use crate::link::ResourceOpener;
use crate::reconciler::{ReconcileReport, Reconciler, RenderSettings};
use crate::scheduler::{self, SchedulerHandle};
use crate::shell::PresentationShell;
use crate::source::SnapshotSource;

/// Everything the engine needs besides its capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub format: SourceFormat,
    pub render: RenderSettings,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            format: config.format,
            render: config.render_settings(),
        }
    }
}

/// State shared between the engine and its timer task.
struct Cycle<S: PresentationShell> {
    fetcher: Fetcher,
    /// Never held across an await.
    reconciler: parking_lot::Mutex<Reconciler<S>>,
    /// Held for the whole fetch + reconcile.
    running: tokio::sync::Mutex<()>,
}

impl<S: PresentationShell> Cycle<S> {
    async fn run(&self) -> ReconcileReport {
        let _guard = self.running.lock().await;
        self.run_locked().await
    }

    /// Timer entry point: skips the firing if a cycle is already running.
    async fn tick(&self) {
        match self.running.try_lock() {
            Ok(_guard) => {
                self.run_locked().await;
            }
            Err(_) => tracing::debug!("cycle already in progress, skipping tick"),
        }
    }

    async fn run_locked(&self) -> ReconcileReport {
        let snapshot = self.fetcher.fetch().await;
        self.reconciler.lock().reconcile(&snapshot)
    }
}

/// A running (or stopped) polling engine bound to one presentation shell.
pub struct Engine<S: PresentationShell> {
    cycle: Arc<Cycle<S>>,
    poll_interval: Duration,
    scheduler: Option<SchedulerHandle>,
}

impl<S: PresentationShell> Engine<S> {
    /// Fails when the poll interval is zero.
    pub fn new(
        settings: EngineSettings,
        source: Arc<dyn SnapshotSource>,
        shell: S,
        opener: Arc<dyn ResourceOpener>,
    ) -> Result<Self, ConfigError> {
        if settings.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll interval must be greater than 0".into()));
        }

        let cycle = Cycle {
            fetcher: Fetcher::new(source, settings.format),
            reconciler: parking_lot::Mutex::new(Reconciler::new(shell, settings.render, opener)),
            running: tokio::sync::Mutex::new(()),
        };
        Ok(Self {
            cycle: Arc::new(cycle),
            poll_interval: settings.poll_interval,
            scheduler: None,
        })
    }

    /// Build an engine from a validated config, using its snapshot source.
    pub fn from_config(
        config: &Config,
        shell: S,
        opener: Arc<dyn ResourceOpener>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(
            EngineSettings::from(config),
            config.source.build(),
            shell,
            opener,
        )
    }

    /// Populate the menu once, then refresh it every poll interval.
    ///
    /// Does nothing if the engine is already running.
    pub async fn start(&mut self) -> ReconcileReport {
        if self.is_running() {
            tracing::debug!("engine already running");
            return ReconcileReport::default();
        }

        let report = self.cycle.run().await;

        let cycle = Arc::clone(&self.cycle);
        self.scheduler = Some(scheduler::start(self.poll_interval, move || {
            let cycle = Arc::clone(&cycle);
            async move { cycle.tick().await }
        }));
        tracing::info!(interval = ?self.poll_interval, "engine started");
        report
    }

    /// Run one fetch + reconcile cycle now, waiting for any cycle in progress.
    pub async fn refresh(&self) -> ReconcileReport {
        self.cycle.run().await
    }

    /// Stop the timer, then destroy every rendered node.
    ///
    /// Calling it again, or on an engine that never started, is harmless.
    pub async fn stop(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }

        let _guard = self.cycle.running.lock().await;
        let destroyed = self.cycle.reconciler.lock().teardown();
        if destroyed > 0 {
            tracing::info!(destroyed, "engine stopped, menu torn down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.as_ref().is_some_and(SchedulerHandle::is_running)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// `(name, value)` of each displayed level.
    pub fn rendered(&self) -> Vec<(String, i64)> {
        self.cycle.reconciler.lock().rendered()
    }

    /// Run `f` with read access to the shell.
    ///
    /// `f` must not call back into the engine.
    pub fn with_shell<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(self.cycle.reconciler.lock().shell())
    }
}
