//! Settings loaded from `labelsync.toml`.
//!
//! Values missing from the file fall back to defaults. The environment
//! variables `LABELSYNC_SERVER` and `LABELSYNC_TOKEN` take precedence over
//! the file. The token is only written back when `remember_login` is set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub const CONFIG_FILE: &str = "labelsync.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the labeling platform.
    #[serde(default = "default_server")]
    pub server: String,

    /// API token. Overridden by `LABELSYNC_TOKEN`.
    #[serde(default)]
    pub token: String,

    /// Platform user id driving this session.
    #[serde(default)]
    pub user_id: u64,

    /// Team the session works in.
    #[serde(default)]
    pub team_id: u64,

    /// Root directory for cached item payloads.
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,

    /// Persist the token to the config file on store.
    #[serde(default)]
    pub remember_login: bool,

    /// Save every segment regardless of its viewer status.
    #[serde(default = "default_true")]
    pub ignore_segment_status_on_save: bool,

    /// Save the current item when switching to another one.
    #[serde(default = "default_true")]
    pub autosave_on_volume_change: bool,

    /// Save all dirty items when submitting the job for review.
    #[serde(default)]
    pub autosave_on_submit: bool,

    /// Restart reopens only reviewer-rejected items.
    #[serde(default)]
    pub restart_with_rejected_only: bool,
}

fn default_server() -> String {
    "https://app.labeling.example".to_string()
}

fn default_working_directory() -> PathBuf {
    PathBuf::from("labelsync-cache")
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: default_server(),
            token: String::new(),
            user_id: 0,
            team_id: 0,
            working_directory: default_working_directory(),
            remember_login: false,
            ignore_segment_status_on_save: default_true(),
            autosave_on_volume_change: default_true(),
            autosave_on_submit: false,
            restart_with_rejected_only: false,
        }
    }
}

impl Settings {
    /// Load settings from `labelsync.toml` in the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load settings from a specific file, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<Settings>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(server) = std::env::var("LABELSYNC_SERVER")
            && !server.is_empty()
        {
            settings.server = server;
        }
        if let Ok(token) = std::env::var("LABELSYNC_TOKEN")
            && !token.is_empty()
        {
            settings.token = token;
        }

        Ok(settings)
    }

    /// Reject settings a session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() {
            return Err(SyncError::Config("server URL is empty".into()));
        }
        if self.token.is_empty() {
            return Err(SyncError::Config(
                "no API token; set LABELSYNC_TOKEN or add it to labelsync.toml".into(),
            ));
        }
        if self.user_id == 0 || self.team_id == 0 {
            return Err(SyncError::Config(
                "user_id and team_id must be set in labelsync.toml".into(),
            ));
        }
        Ok(())
    }

    /// Write settings back to a file. The token is dropped from the output
    /// unless `remember_login` is set.
    pub fn store_to(&self, path: &Path) -> Result<()> {
        let mut out = self.clone();
        if !out.remember_login {
            out.token = String::new();
        }
        let contents =
            toml::to_string_pretty(&out).map_err(|e| SyncError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
