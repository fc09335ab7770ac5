pub mod config;
pub mod errors;
pub mod genai;
pub mod git_ops;
pub mod github;
pub mod repo_config;
pub mod scheduler;
pub mod sync;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use errors::{Result, SyncError};
pub use repo_config::ProjectCfg;
pub use sync::Collaborators;
pub use watcher::{Daemon, ReloadPolicy};
