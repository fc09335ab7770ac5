//! In-memory collaborators for exercising setup, cycles and reloads.

use super::errors::{Result, SyncError};
use super::genai::CommitMessageGenerator;
use super::git_ops::{RemoteStatus, VersionControl};
use super::github::RepoHost;
use super::repo_config::ProjectCfg;
use super::sync::Collaborators;
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub(crate) fn project(folder: &str, name: &str, interval: u64) -> ProjectCfg {
    serde_json::from_value(serde_json::json!({
        "folder_path": folder,
        "repo_name": name,
        "interval": interval
    }))
    .unwrap()
}

pub(crate) struct RepoState {
    pub has_metadata: bool,
    pub origin: Option<String>,
    pub remote: RemoteStatus,
    /// Changes not yet staged
    pub worktree: String,
    pub staged: String,
    pub commits: Vec<String>,
    /// How many of `commits` reached the remote
    pub pushed: usize,
    /// Operation names that should fail
    pub failing: Vec<&'static str>,
}

impl Default for RepoState {
    fn default() -> Self {
        Self {
            has_metadata: false,
            origin: None,
            remote: RemoteStatus::Exists,
            worktree: String::new(),
            staged: String::new(),
            commits: Vec::new(),
            pushed: 0,
            failing: Vec::new(),
        }
    }
}

#[derive(Default)]
pub(crate) struct HostState {
    pub user: Option<String>,
    pub token: Option<String>,
    pub fail_create: bool,
}

pub(crate) struct GeneratorState {
    pub api_key: Option<String>,
    pub model: String,
    pub reply: Option<String>,
    pub calls: usize,
}

type CallLog = Arc<Mutex<Vec<String>>>;

struct FakeVcs {
    calls: CallLog,
    state: Arc<Mutex<RepoState>>,
}

impl FakeVcs {
    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.state.lock().unwrap().failing.contains(&op) {
            return Err(SyncError::GitCommandFailed {
                command: format!("git {op}"),
                stderr: "simulated failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn has_metadata(&self, _dir: &Path) -> bool {
        self.calls.lock().unwrap().push("has_metadata".into());
        self.state.lock().unwrap().has_metadata
    }

    async fn init(&self, _dir: &Path) -> Result<()> {
        self.record("init")?;
        self.state.lock().unwrap().has_metadata = true;
        Ok(())
    }

    async fn configure_pull_rebase(&self, _dir: &Path) -> Result<()> {
        self.record("configure_pull_rebase")
    }

    async fn probe_remote(&self, _dir: &Path, _url: &str) -> RemoteStatus {
        self.calls.lock().unwrap().push("probe_remote".into());
        self.state.lock().unwrap().remote.clone()
    }

    async fn origin_url(&self, _dir: &Path) -> Result<Option<String>> {
        self.record("origin_url")?;
        Ok(self.state.lock().unwrap().origin.clone())
    }

    async fn add_origin(&self, _dir: &Path, url: &str) -> Result<()> {
        self.record("add_origin")?;
        self.state.lock().unwrap().origin = Some(url.to_string());
        Ok(())
    }

    async fn add_all(&self, _dir: &Path) -> Result<()> {
        self.record("add_all")?;
        let mut state = self.state.lock().unwrap();
        let pending = std::mem::take(&mut state.worktree);
        state.staged.push_str(&pending);
        Ok(())
    }

    async fn staged_diff(&self, _dir: &Path) -> Result<String> {
        self.record("staged_diff")?;
        Ok(self.state.lock().unwrap().staged.clone())
    }

    async fn commit(&self, _dir: &Path, message: &str) -> Result<()> {
        self.record("commit")?;
        let mut state = self.state.lock().unwrap();
        state.staged.clear();
        state.commits.push(message.to_string());
        Ok(())
    }

    async fn pull(&self, _dir: &Path) -> Result<()> {
        self.record("pull")
    }

    async fn push(&self, _dir: &Path) -> Result<()> {
        self.record("push")?;
        let mut state = self.state.lock().unwrap();
        state.pushed = state.commits.len();
        Ok(())
    }
}

struct FakeHost {
    calls: CallLog,
    state: Arc<Mutex<HostState>>,
}

#[async_trait]
impl RepoHost for FakeHost {
    fn configure(&mut self, user: Option<String>, token: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.user = user;
        state.token = token;
    }

    fn remote_url(&self, repo_name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        let user = state.user.as_deref()?;
        Some(format!("https://example.test/{user}/{repo_name}.git"))
    }

    async fn create_repo(&self, repo_name: &str, private: bool) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("create_repo {repo_name} private={private}"));
        if self.state.lock().unwrap().fail_create {
            return Err(SyncError::Api { service: "github", status: 500, body: String::new() });
        }
        Ok(())
    }
}

struct FakeGenerator {
    state: Arc<Mutex<GeneratorState>>,
}

#[async_trait]
impl CommitMessageGenerator for FakeGenerator {
    fn configure(&mut self, api_key: Option<String>, model: String) {
        let mut state = self.state.lock().unwrap();
        state.api_key = api_key;
        state.model = model;
    }

    async fn generate_commit_message(&self, _diff: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.reply.clone().ok_or(SyncError::NotConfigured("google api key"))
    }
}

/// Shared handles to the fake collaborators' state.
pub(crate) struct Fakes {
    vcs_calls: CallLog,
    host_calls: CallLog,
    repo: Arc<Mutex<RepoState>>,
    host: Arc<Mutex<HostState>>,
    generator: Arc<Mutex<GeneratorState>>,
}

impl Fakes {
    /// Host already holds credentials for user `octo`.
    pub fn new() -> Self {
        let fakes = Self::unconfigured();
        fakes.host.lock().unwrap().user = Some("octo".into());
        fakes
    }

    pub fn unconfigured() -> Self {
        Self {
            vcs_calls: CallLog::default(),
            host_calls: CallLog::default(),
            repo: Arc::new(Mutex::new(RepoState::default())),
            host: Arc::new(Mutex::new(HostState::default())),
            generator: Arc::new(Mutex::new(GeneratorState {
                api_key: None,
                model: String::new(),
                reply: Some("Add hello".into()),
                calls: 0,
            })),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            vcs: Box::new(FakeVcs { calls: self.vcs_calls.clone(), state: self.repo.clone() }),
            host: Box::new(FakeHost { calls: self.host_calls.clone(), state: self.host.clone() }),
            generator: Box::new(FakeGenerator { state: self.generator.clone() }),
        }
    }

    pub fn repo<R>(&self, f: impl FnOnce(&mut RepoState) -> R) -> R {
        f(&mut self.repo.lock().unwrap())
    }

    pub fn host<R>(&self, f: impl FnOnce(&HostState) -> R) -> R {
        f(&self.host.lock().unwrap())
    }

    pub fn generator<R>(&self, f: impl FnOnce(&GeneratorState) -> R) -> R {
        f(&self.generator.lock().unwrap())
    }

    pub fn fail_create(&self) {
        self.host.lock().unwrap().fail_create = true;
    }

    pub fn reply(&self, reply: Option<&str>) {
        self.generator.lock().unwrap().reply = reply.map(str::to_owned);
    }

    pub fn vcs_calls(&self) -> Vec<String> {
        self.vcs_calls.lock().unwrap().clone()
    }

    pub fn host_calls(&self) -> Vec<String> {
        self.host_calls.lock().unwrap().clone()
    }

    pub fn generator_calls(&self) -> usize {
        self.generator.lock().unwrap().calls
    }

    pub fn clear_calls(&self) {
        self.vcs_calls.lock().unwrap().clear();
        self.host_calls.lock().unwrap().clear();
    }
}
