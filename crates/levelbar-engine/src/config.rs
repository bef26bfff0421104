//! Engine configuration, loaded from a RON file.
//!
//! Lives at `~/.config/levelbar/config.ron`. Every field is optional:
//!
//! ```ron
//! (
//!     poll_interval_ms: 180000,
//!     max_subject_length: 45,
//!     source: Command(
//!         program: "~/.local/share/levelbar/.venv/bin/python",
//!         args: ["~/.local/share/levelbar/request.py"],
//!     ),
//!     format: Snapshot,          // or Tickets
//!     resource_base_url: "https://my.activecloud.com/ru/staff/index.php?",
//!     opener: ["xdg-open"],
//!     correlation: Positional,   // or ByName
//! )
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MAX_SUBJECT_LENGTH, DEFAULT_OPENER,
    DEFAULT_POLL_INTERVAL, DEFAULT_RESOURCE_BASE_URL, DEFAULT_SOURCE_PROGRAM,
};
use crate::error::ConfigError;
use crate::fetcher::SourceFormat;
use crate::reconciler::{Correlation, RenderSettings};
use crate::source::{CommandSource, FileSource, SnapshotSource};

/// Where snapshots come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceConfig {
    /// Run a command and read its stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        env: HashMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
    /// Read a JSON file written by another process.
    File { path: String },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Command {
            program: DEFAULT_SOURCE_PROGRAM.to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }
}

impl SourceConfig {
    /// Build the configured source.
    pub fn build(&self) -> Arc<dyn SnapshotSource> {
        match self {
            SourceConfig::Command { program, args, env, cwd } => {
                let mut source = CommandSource::new(program).with_args(args.iter().cloned());
                for (key, value) in env {
                    source = source.with_env(key.clone(), value.clone());
                }
                if let Some(cwd) = cwd {
                    source = source.with_cwd(cwd);
                }
                Arc::new(source)
            }
            SourceConfig::File { path } => Arc::new(FileSource::new(path)),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Time between refreshes, in milliseconds.
    pub poll_interval_ms: u64,

    /// Detail labels longer than this many characters are truncated.
    pub max_subject_length: usize,

    pub source: SourceConfig,

    pub format: SourceFormat,

    /// Base URL that detail links are built from.
    pub resource_base_url: String,

    /// Opener command; the URL is appended as the last argument.
    pub opener: Vec<String>,

    pub correlation: Correlation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_subject_length: DEFAULT_MAX_SUBJECT_LENGTH,
            source: SourceConfig::default(),
            format: SourceFormat::default(),
            resource_base_url: DEFAULT_RESOURCE_BASE_URL.to_string(),
            opener: vec![DEFAULT_OPENER.to_string()],
            correlation: Correlation::default(),
        }
    }
}

impl Config {
    /// `~/.config/levelbar/config.ron`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse and validate RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Config = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load the default config file, or the defaults when it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                tracing::debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Render as pretty RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be greater than 0".into()));
        }
        if self.opener.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(ConfigError::Invalid("opener command is empty".into()));
        }
        if self.resource_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("resource_base_url is empty".into()));
        }
        match &self.source {
            SourceConfig::Command { program, .. } if program.trim().is_empty() => {
                Err(ConfigError::Invalid("source command program is empty".into()))
            }
            SourceConfig::File { path } if path.trim().is_empty() => {
                Err(ConfigError::Invalid("source file path is empty".into()))
            }
            _ => Ok(()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            max_subject_length: self.max_subject_length,
            resource_base_url: self.resource_base_url.clone(),
            correlation: self.correlation,
        }
    }
}
