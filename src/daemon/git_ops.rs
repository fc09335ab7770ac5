use super::errors::{Result, SyncError};
use async_trait::async_trait;
use git2::{Commit, ConfigLevel, DiffFormat, ErrorCode, IndexAddOption, Repository};
use log::debug;
use std::path::Path;
use tokio::process::Command;

/// What probing a remote URL told us about the hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Exists,
    Absent,
    /// The probe failed for some other reason (network, auth, ...)
    Unknown(String),
}

/// Version-control operations the synchronizer needs, all run inside a
/// project folder.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn has_metadata(&self, dir: &Path) -> bool;
    async fn init(&self, dir: &Path) -> Result<()>;
    async fn configure_pull_rebase(&self, dir: &Path) -> Result<()>;
    async fn probe_remote(&self, dir: &Path, url: &str) -> RemoteStatus;
    async fn origin_url(&self, dir: &Path) -> Result<Option<String>>;
    async fn add_origin(&self, dir: &Path, url: &str) -> Result<()>;
    async fn add_all(&self, dir: &Path) -> Result<()>;
    /// Patch text of the staged changes; empty when nothing is staged.
    async fn staged_diff(&self, dir: &Path) -> Result<String>;
    async fn commit(&self, dir: &Path, message: &str) -> Result<()>;
    async fn pull(&self, dir: &Path) -> Result<()>;
    async fn push(&self, dir: &Path) -> Result<()>;
}

/// Local work goes through libgit2, anything touching the network goes
/// through the `git` binary so the user's credential setup applies.
#[derive(Debug, Default, Clone)]
pub struct Git;

#[async_trait]
impl VersionControl for Git {
    async fn has_metadata(&self, dir: &Path) -> bool {
        dir.join(".git").exists()
    }

    async fn init(&self, dir: &Path) -> Result<()> {
        Repository::init(dir)?;
        Ok(())
    }

    async fn configure_pull_rebase(&self, dir: &Path) -> Result<()> {
        let repository = Repository::open(dir)?;
        let mut config = repository.config()?.open_level(ConfigLevel::Local)?;
        config.set_bool("pull.rebase", true)?;
        Ok(())
    }

    async fn probe_remote(&self, dir: &Path, url: &str) -> RemoteStatus {
        let output = Command::new("git")
            .args(["ls-remote", url])
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await;

        match output {
            Ok(output) => {
                classify_probe(output.status.success(), &String::from_utf8_lossy(&output.stderr))
            }
            Err(error) => RemoteStatus::Unknown(error.to_string()),
        }
    }

    async fn origin_url(&self, dir: &Path) -> Result<Option<String>> {
        let repository = Repository::open(dir)?;
        let url = match repository.find_remote("origin") {
            Ok(remote) => remote.url().map(str::to_owned),
            Err(error) if error.code() == ErrorCode::NotFound => None,
            Err(error) => return Err(error.into()),
        };
        Ok(url)
    }

    async fn add_origin(&self, dir: &Path, url: &str) -> Result<()> {
        let repository = Repository::open(dir)?;
        repository.remote("origin", url)?;
        Ok(())
    }

    async fn add_all(&self, dir: &Path) -> Result<()> {
        let repository = Repository::open(dir)?;
        let mut index = repository.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        // picks up deletions, which add_all leaves alone
        index.update_all(["*"], None)?;
        index.write()?;
        Ok(())
    }

    async fn staged_diff(&self, dir: &Path) -> Result<String> {
        let repository = Repository::open(dir)?;
        let head_tree = match head_commit(&repository)? {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };
        let index = repository.index()?;
        let diff = repository.diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(patch)
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        let repository = Repository::open(dir)?;
        let signature = repository.signature()?;
        let mut index = repository.index()?;
        let tree = repository.find_tree(index.write_tree()?)?;
        let parent = head_commit(&repository)?;
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = repository.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!("Created commit {oid} in {}", dir.display());
        Ok(())
    }

    async fn pull(&self, dir: &Path) -> Result<()> {
        let branch = current_branch(dir)?;

        let heads = run_git(dir, &["ls-remote", "--heads", "origin", &branch]).await?;
        if heads.trim().is_empty() {
            debug!("Remote has no '{branch}' yet, nothing to pull for {}", dir.display());
            return Ok(());
        }

        run_git(dir, &["pull", "--rebase", "origin", &branch]).await?;
        Ok(())
    }

    async fn push(&self, dir: &Path) -> Result<()> {
        let branch = current_branch(dir)?;
        run_git(dir, &["push", "-u", "origin", &branch]).await?;
        Ok(())
    }
}

fn head_commit(repository: &Repository) -> Result<Option<Commit<'_>>> {
    match repository.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(error) if matches!(error.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            Ok(None)
        }
        Err(error) => Err(error.into()),
    }
}

/// Branch HEAD points at, even before the first commit exists.
fn current_branch(dir: &Path) -> Result<String> {
    let repository = Repository::open(dir)?;
    let head = repository.find_reference("HEAD")?;
    let target = head
        .symbolic_target()
        .ok_or_else(|| git2::Error::from_str("HEAD is detached"))?;
    Ok(target.trim_start_matches("refs/heads/").to_string())
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await?;

    if !output.status.success() {
        return Err(SyncError::GitCommandFailed {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(crate) fn classify_probe(success: bool, stderr: &str) -> RemoteStatus {
    if success {
        return RemoteStatus::Exists;
    }

    let lowered = stderr.to_lowercase();
    let absent = ["not found", "does not exist", "does not appear to be a git repository"];
    if absent.iter().any(|marker| lowered.contains(marker)) {
        RemoteStatus::Absent
    } else {
        RemoteStatus::Unknown(stderr.trim().to_string())
    }
}
