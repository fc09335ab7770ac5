use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("git command failed: {command} - {stderr}")]
    GitCommandFailed { command: String, stderr: String },
    #[error("config error: could not load config file '{path}' - {source}")]
    Config { path: String, source: std::io::Error },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} api returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
