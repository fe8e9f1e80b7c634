//! Application settings and paths.
//!
//! Settings are read once at startup into an [`AppSettings`] value that is
//! passed by reference to everything that needs it.

use crate::error::{ConfigError, ConfigResult};
use crate::partition::{PartitionConfig, DEFAULT_MAX_PORT, DEFAULT_PORT_STEPS};
use crate::resolver::DEFAULT_MAX_HOSTS_PER_TARGET;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/scatterscan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("org", "scatterscan", "scatterscan")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Directory reports are written to.
    pub output_directory: PathBuf,
    /// Path of the nmap executable.
    pub nmap_binary_path: PathBuf,
    /// Run nmap through sudo.
    pub use_sudo: bool,
    /// Optional file receiving a copy of the log output.
    pub log_file: Option<PathBuf>,
    /// Width of a port segment in full mode.
    pub port_steps: u16,
    /// Highest port scanned in full mode.
    pub max_port: u16,
    /// Seconds between progress snapshots.
    pub progress_interval_secs: u64,
    /// Concurrent scans; unset means available parallelism.
    pub workers: Option<usize>,
    /// Per-task deadline in seconds; unset means none.
    pub task_timeout_secs: Option<u64>,
    /// Largest network a single target may expand to.
    pub max_hosts_per_target: u128,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("reports"),
            nmap_binary_path: PathBuf::from("/usr/bin/nmap"),
            use_sudo: true,
            log_file: None,
            port_steps: DEFAULT_PORT_STEPS,
            max_port: DEFAULT_MAX_PORT,
            progress_interval_secs: 10,
            workers: None,
            task_timeout_secs: None,
            max_hosts_per_target: DEFAULT_MAX_HOSTS_PER_TARGET,
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default settings file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let settings = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let file = Paths::discover()?.settings_file();
                if file.exists() {
                    Self::load_from(&file)?
                } else {
                    Self::default()
                }
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Reject values the scan pipeline cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port_steps == 0 {
            return Err(ConfigError::InvalidValue(
                "port_steps must be greater than zero".to_string(),
            ));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidValue(
                "workers must be greater than zero".to_string(),
            ));
        }
        if self.progress_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "progress_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn partition_config(&self) -> PartitionConfig {
        PartitionConfig::new(self.port_steps, self.max_port)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}
