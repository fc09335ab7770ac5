use super::errors::{Result, SyncError};
use super::repo_config::ProjectCfg;
use serde::Deserialize;
use std::path::Path;

fn default_model() -> String { "gemini-2.0-flash".to_string() }

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub github_user: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub google_api_key: Option<String>,
    /// Model used to write commit messages
    #[serde(default = "default_model")]
    pub gemini_model: String,
    #[serde(default)]
    pub projects: Vec<ProjectCfg>,
}

impl Config {
    /// Load the whole document. `.toml` files are read as TOML, anything else as JSON.
    pub fn load_config(path: &Path) -> Result<Config> {
        let file_text = std::fs::read_to_string(path).map_err(|source| SyncError::Config {
            path: path.display().to_string(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config: Config = if is_toml {
            toml::from_str(&file_text)?
        } else {
            serde_json::from_str(&file_text)?
        };
        Ok(config)
    }
}
