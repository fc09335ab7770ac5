use serde::Deserialize;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::time::Duration;

/// One folder kept in sync with a hosted repository.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProjectCfg {
    /// Local folder to push
    pub folder_path: PathBuf,
    /// Repository name on the hosting provider
    pub repo_name: String,
    /// Sync interval in minutes
    pub interval: NonZeroU64,
    /// Create the remote as private (default false)
    #[serde(default)]
    pub private: bool,
}

impl ProjectCfg {
    /// `None` when the interval in minutes does not fit a `Duration`.
    pub fn period(&self) -> Option<Duration> {
        self.interval.get().checked_mul(60).map(Duration::from_secs)
    }
}
