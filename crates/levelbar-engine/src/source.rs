//! Snapshot sources.
//!
//! A [`SnapshotSource`] produces the raw bytes of one snapshot on demand. The
//! engine only ever holds it as `Arc<dyn SnapshotSource>`, so tests and hosts
//! can inject their own without spawning anything.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;

use crate::error::FetchError;

/// Produces raw snapshot output.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Produce one snapshot's raw output. Called once per fetch.
    async fn produce(&self) -> Result<Vec<u8>, FetchError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

// ============================================================================
// CommandSource
// ============================================================================

/// Runs a command and reads the snapshot from its stdout.
#[derive(Debug, Clone)]
pub struct CommandSource {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSource {
    /// `~` and `$VAR` in `program` are expanded.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: expand(program.as_ref()),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl AsRef<str>) -> Self {
        self.cwd = Some(PathBuf::from(expand(cwd.as_ref())));
        self
    }
}

#[async_trait]
impl SnapshotSource for CommandSource {
    async fn produce(&self) -> Result<Vec<u8>, FetchError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Teardown may drop a fetch mid-flight.
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().await.map_err(|source| FetchError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(FetchError::Exit {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::debug!(program = %self.program, %stderr, "source wrote to stderr");
        }

        Ok(output.stdout)
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

// ============================================================================
// FileSource
// ============================================================================

/// Reads the snapshot from a file some other process keeps up to date.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    /// `~` and `$VAR` in `path` are expanded.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: PathBuf::from(expand(path.as_ref())),
        }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn produce(&self) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| FetchError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Expand `~` and environment variables, leaving the text alone on failure.
fn expand(text: &str) -> String {
    match shellexpand::full(text) {
        Ok(expanded) => expanded.into_owned(),
        Err(e) => {
            tracing::warn!(text, error = %e, "could not expand path, using it verbatim");
            text.to_string()
        }
    }
}
