//! Resource links and the action that opens them.
//!
//! Every detail row is bound to a [`ResourceLink`] built from the configured
//! base URL and the detail id. Activating the row hands the URL to a
//! [`ResourceOpener`]; the engine never waits for or inspects the outcome.

use std::process::Stdio;
use std::sync::Arc;

use levelbar_types::DetailId;
use parking_lot::Mutex;

use crate::constants::{DEFAULT_OPENER, DETAIL_VIEW_PATH};
use crate::error::ConfigError;

/// URL of the external resource behind one detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLink {
    url: String,
}

impl ResourceLink {
    /// Build `<base>/Tickets/Ticket/View/<id>`.
    ///
    /// The id is embedded verbatim.
    pub fn new(base_url: &str, id: &DetailId) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            url: format!("{base}/{DETAIL_VIEW_PATH}/{id}"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Opens a URL in whatever viewer the host provides.
pub trait ResourceOpener: Send + Sync {
    /// Request that `url` be opened. Must not block.
    fn open(&self, url: &str);
}

// ============================================================================
// CommandOpener
// ============================================================================

/// Opens URLs by spawning a command (`xdg-open <url>` by default).
///
/// The child is reaped on the runtime captured at construction, so `open` can
/// be called from host callbacks that run outside of tokio.
pub struct CommandOpener {
    program: String,
    args: Vec<String>,
    runtime: tokio::runtime::Handle,
}

impl CommandOpener {
    /// Build an opener from `[program, args...]`; the URL is appended last.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(command: &[String]) -> Result<Self, ConfigError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| ConfigError::Invalid("opener command is empty".into()))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConfigError::Invalid(format!("opener needs a tokio runtime: {e}")))?;
        Ok(Self {
            program: shellexpand::tilde(program).into_owned(),
            args: args.to_vec(),
            runtime,
        })
    }

    /// `xdg-open` with no extra arguments.
    pub fn xdg_open() -> Result<Self, ConfigError> {
        Self::new(&[DEFAULT_OPENER.to_string()])
    }
}

impl ResourceOpener for CommandOpener {
    fn open(&self, url: &str) {
        let _enter = self.runtime.enter();

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(program = %self.program, url, error = %e, "failed to spawn opener");
                return;
            }
        };

        let program = self.program.clone();
        let url = url.to_string();
        self.runtime.spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::debug!(%program, %url, "opened resource");
                }
                Ok(status) => {
                    tracing::warn!(%program, %url, %status, "opener exited with failure");
                }
                Err(e) => {
                    tracing::warn!(%program, %url, error = %e, "failed to wait for opener");
                }
            }
        });
    }
}

// ============================================================================
// RecordingOpener
// ============================================================================

/// Opener that only remembers what it was asked to open.
///
/// Clones share the same record.
#[derive(Clone, Default)]
pub struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs requested so far, oldest first.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl ResourceOpener for RecordingOpener {
    fn open(&self, url: &str) {
        tracing::debug!(url, "recorded open request");
        self.opened.lock().push(url.to_string());
    }
}
